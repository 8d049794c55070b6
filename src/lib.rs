//! # drop-relay
//!
//! Store-and-forward relay server for the Drop collaboration plugin.
//!
//! This crate implements a relay server that:
//! - Accepts signed, encrypted artifacts from anonymous senders
//! - Authenticates requests purely from detached OpenPGP signatures
//! - Validates public keys against a VKS keyserver with a TTL cache
//! - Buffers messages per recipient until polled (or expired)
//! - Never sees plaintext (payloads are opaque encrypted blobs)
//!
//! ## Architecture
//!
//! ```text
//! Sender ──┐                          ┌── Recipient
//!          │  POST /api/v1/send       │  POST /api/v1/poll
//!          ├─────────────────────────►│
//!          │                          │
//!      ┌───┴──────────────────────────┴───┐
//!      │           drop-relay             │
//!      │  ┌────────────┐  ┌────────────┐  │      ┌─────────────┐
//!      │  │  SQLite    │  │ key cache  │──┼─────►│  keyserver  │
//!      │  │ (mailboxes)│  │ (TTL 600s) │  │ VKS  │ (read-only) │
//!      │  └────────────┘  └────────────┘  │      └─────────────┘
//!      └──────────────────────────────────┘
//! ```
//!
//! ## Trust model
//!
//! There are no accounts. A mailbox belongs to whoever can produce a valid
//! detached signature with the matching private key; the relay derives the
//! sender identity from the signature's own issuer fingerprint and never
//! trusts a client-asserted sender.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod clock;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod http;
pub mod identity;
pub mod keycache;
pub mod keyserver;
pub mod server;
pub mod storage;
pub mod sweeper;

#[cfg(test)]
pub(crate) mod testkeys;
