//! Prometheus metrics endpoint.

use crate::server::RelayService;
use axum::{http::header::CONTENT_TYPE, response::IntoResponse, Extension};
use std::sync::atomic::Ordering;
use std::sync::Arc;

/// Prometheus metrics handler.
///
/// Returns metrics in Prometheus text format.
/// Includes both gauges (current state) and counters (monotonic since startup).
pub async fn metrics_handler(Extension(relay): Extension<Arc<RelayService>>) -> impl IntoResponse {
    let m = relay.metrics();

    // Counters — monotonic since startup
    let sends = m.sends_total.load(Ordering::Relaxed);
    let polls = m.polls_total.load(Ordering::Relaxed);
    let delivered = m.messages_delivered.load(Ordering::Relaxed);
    let auth_failures = m.auth_failures.load(Ordering::Relaxed);
    let errors = m.errors_total.load(Ordering::Relaxed);

    // Storage stats (async query — best effort)
    let pending = relay.storage().pending_messages().await.unwrap_or(0);

    let body = format!(
        r#"# HELP drop_relay_info Server information
# TYPE drop_relay_info gauge
drop_relay_info{{version="{version}"}} 1

# HELP drop_relay_sends_total Total messages accepted
# TYPE drop_relay_sends_total counter
drop_relay_sends_total {sends}

# HELP drop_relay_polls_total Total poll requests answered
# TYPE drop_relay_polls_total counter
drop_relay_polls_total {polls}

# HELP drop_relay_messages_delivered_total Total messages handed out by polls
# TYPE drop_relay_messages_delivered_total counter
drop_relay_messages_delivered_total {delivered}

# HELP drop_relay_auth_failures_total Total signature or timestamp rejections
# TYPE drop_relay_auth_failures_total counter
drop_relay_auth_failures_total {auth_failures}

# HELP drop_relay_errors_total Total storage and upstream failures
# TYPE drop_relay_errors_total counter
drop_relay_errors_total {errors}

# HELP drop_relay_pending_messages Messages currently queued in mailboxes
# TYPE drop_relay_pending_messages gauge
drop_relay_pending_messages {pending}
"#,
        version = env!("CARGO_PKG_VERSION"),
    );

    (
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        body,
    )
}
