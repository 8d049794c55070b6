//! Shared PGP fixtures for tests.
//!
//! Real material generated with GnuPG (Ed25519, no passphrases): three keys
//! and detached signatures over the exact strings the protocol signs. Carol's
//! key carries a revocation certificate. Tests pin the clock to [`NOW`] so
//! the fixtures never expire.

pub const NOW: i64 = 1_700_000_000;

pub const ALICE_FPR: &str = "8ACA2A0F8D4CDA797D41DA9C6C1BA214095D82B4";
pub const BOB_FPR: &str = "FF35B8CB021F0D0602A42C2C48F87D9DCB480A10";
pub const CAROL_FPR: &str = "52C467F2D25903664033A01722B701F44FBEFE58";

pub const ALICE_PUB: &str = include_str!("../testdata/alice_pub.asc");
pub const BOB_PUB: &str = include_str!("../testdata/bob_pub.asc");
pub const CAROL_PUB: &str = include_str!("../testdata/carol_pub.asc");

/// The string a poll request signs: the stringified timestamp.
pub const POLL_DATA: &str = "1700000000";
/// Alice's detached signature over [`POLL_DATA`].
pub const POLL_SIG_ALICE: &str = include_str!("../testdata/poll_alice.sig.asc");
/// Bob's detached signature over [`POLL_DATA`].
pub const POLL_SIG_BOB: &str = include_str!("../testdata/poll_bob.sig.asc");
/// Carol's (revoked key) detached signature over [`POLL_DATA`].
pub const POLL_SIG_CAROL: &str = include_str!("../testdata/poll_carol.sig.asc");

/// Payload used by the send fixtures.
pub const SEND_PAYLOAD: &str = "test-encrypted-payload";
/// Alice's detached signature over `{BOB_FPR}|{SEND_PAYLOAD}|{NOW}`.
pub const SEND_SIG_ALICE: &str = include_str!("../testdata/send_alice.sig.asc");
