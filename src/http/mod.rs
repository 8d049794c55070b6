//! HTTP endpoints for drop-relay.
//!
//! Provides the send and poll protocol endpoints plus health and metrics.

pub mod health;
mod metrics;
mod poll;
mod send;

use crate::error::ApiError;
use crate::server::RelayService;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde::Serialize;
use std::sync::Arc;

pub use health::HealthStatus;
pub use poll::MessageResponse;

/// Build the HTTP router with all endpoints.
pub fn build_router(relay: Arc<RelayService>) -> Router {
    Router::new()
        .route("/api/v1/send", post(send::send_handler))
        .route("/api/v1/poll", post(poll::poll_handler))
        .route("/health", get(health::health_handler))
        .route("/metrics", get(metrics::metrics_handler))
        .layer(Extension(relay))
}

/// The `{"error": ...}` body every failure answers with.
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(ErrorResponse {
            error: self.to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::config::Config;
    use crate::keyserver::MockKeyserver;
    use crate::storage::SqliteStorage;
    use crate::testkeys;
    use axum::body::Body;
    use axum::http::{header::CONTENT_TYPE, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::util::ServiceExt;

    async fn test_relay() -> Arc<RelayService> {
        let clock = Arc::new(FixedClock::new(testkeys::NOW));
        let storage = Arc::new(SqliteStorage::in_memory(clock.clone()).await.unwrap());
        let keyserver = MockKeyserver::new();
        keyserver.publish(testkeys::ALICE_FPR, testkeys::ALICE_PUB);
        keyserver.publish(testkeys::BOB_FPR, testkeys::BOB_PUB);
        keyserver.publish(testkeys::CAROL_FPR, testkeys::CAROL_PUB);
        Arc::new(RelayService::new(
            Config::default(),
            storage,
            Arc::new(keyserver),
            clock,
        ))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn send_request() -> Value {
        json!({
            "to_public_key": testkeys::BOB_FPR,
            "encrypted_data": testkeys::SEND_PAYLOAD,
            "timestamp": testkeys::NOW,
            "signature": testkeys::SEND_SIG_ALICE,
        })
    }

    #[tokio::test]
    async fn send_returns_created_with_empty_body() {
        let app = build_router(test_relay().await);

        let response = app
            .oneshot(post_json("/api/v1/send", send_request()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::CREATED);
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert!(bytes.is_empty());
    }

    #[tokio::test]
    async fn send_missing_field_returns_400() {
        let app = build_router(test_relay().await);

        let response = app
            .oneshot(post_json(
                "/api/v1/send",
                json!({ "to_public_key": testkeys::BOB_FPR }),
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn send_malformed_json_returns_400() {
        let app = build_router(test_relay().await);

        let response = app
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/api/v1/send")
                    .header(CONTENT_TYPE, "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn send_bad_fingerprint_returns_400() {
        let app = build_router(test_relay().await);
        let mut request = send_request();
        request["to_public_key"] = json!("ZZ35B8CB021F0D0602A42C2C48F87D9DCB480A10");

        let response = app.oneshot(post_json("/api/v1/send", request)).await.unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid fingerprint format");
    }

    #[tokio::test]
    async fn send_bad_signature_returns_401() {
        let app = build_router(test_relay().await);
        let mut request = send_request();
        request["encrypted_data"] = json!("tampered");

        let response = app.oneshot(post_json("/api/v1/send", request)).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Invalid signature or timestamp");
    }

    #[tokio::test]
    async fn send_to_unknown_recipient_returns_404() {
        // Only the sender's key is published upstream.
        let clock = Arc::new(FixedClock::new(testkeys::NOW));
        let storage = Arc::new(SqliteStorage::in_memory(clock.clone()).await.unwrap());
        let keyserver = MockKeyserver::new();
        keyserver.publish(testkeys::ALICE_FPR, testkeys::ALICE_PUB);
        let relay = Arc::new(RelayService::new(
            Config::default(),
            storage,
            Arc::new(keyserver),
            clock,
        ));
        let app = build_router(relay);

        let response = app
            .oneshot(post_json("/api/v1/send", send_request()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Recipient public key not valid");
    }

    #[tokio::test]
    async fn poll_returns_queued_messages_then_empty() {
        let relay = test_relay().await;
        let app = build_router(relay.clone());

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/send", send_request()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);

        let poll = json!({ "timestamp": testkeys::NOW, "signature": testkeys::POLL_SIG_BOB });

        let response = app
            .clone()
            .oneshot(post_json("/api/v1/poll", poll.clone()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        let messages = body.as_array().unwrap();
        assert_eq!(messages.len(), 1);
        assert_eq!(messages[0]["from_public_key"], testkeys::ALICE_FPR);
        assert_eq!(messages[0]["encrypted_data"], testkeys::SEND_PAYLOAD);
        assert!(messages[0]["id"].is_i64());
        assert!(messages[0]["created_at"].is_i64());

        // Collected messages are gone.
        let response = app.oneshot(post_json("/api/v1/poll", poll)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body.as_array().unwrap().len(), 0);
    }

    #[tokio::test]
    async fn poll_with_revoked_key_returns_404() {
        let app = build_router(test_relay().await);
        let poll = json!({ "timestamp": testkeys::NOW, "signature": testkeys::POLL_SIG_CAROL });

        let response = app.oneshot(post_json("/api/v1/poll", poll)).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["error"], "Public key not valid");
    }

    #[tokio::test]
    async fn poll_missing_field_returns_400() {
        let app = build_router(test_relay().await);

        let response = app
            .oneshot(post_json("/api/v1/poll", json!({ "timestamp": testkeys::NOW })))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn health_endpoint_returns_ok() {
        let app = build_router(test_relay().await);

        let response = app
            .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert_eq!(body["status"], "healthy");
    }

    #[tokio::test]
    async fn metrics_endpoint_returns_ok() {
        let app = build_router(test_relay().await);

        let response = app
            .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
