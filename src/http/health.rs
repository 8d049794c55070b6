//! Health check endpoint.

use crate::server::RelayService;
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::Serialize;
use std::sync::Arc;

/// Health status response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthStatus {
    /// Overall status: `healthy` or `unhealthy`.
    pub status: String,
    /// Failure description, present only when unhealthy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Health check handler. Round-trips the storage backend.
pub async fn health_handler(
    Extension(relay): Extension<Arc<RelayService>>,
) -> (StatusCode, Json<HealthStatus>) {
    match relay.health().await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthStatus {
                status: "healthy".to_string(),
                error: None,
            }),
        ),
        Err(e) => {
            tracing::error!("Health check failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(HealthStatus {
                    status: "unhealthy".to_string(),
                    error: Some("Database connection failed".to_string()),
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn healthy_status_omits_error_field() {
        let status = HealthStatus {
            status: "healthy".to_string(),
            error: None,
        };

        let json = serde_json::to_string(&status).unwrap();
        assert_eq!(json, r#"{"status":"healthy"}"#);
    }

    #[test]
    fn unhealthy_status_serializes_error() {
        let status = HealthStatus {
            status: "unhealthy".to_string(),
            error: Some("Database connection failed".to_string()),
        };

        let json = serde_json::to_string(&status).unwrap();
        assert!(json.contains("\"status\":\"unhealthy\""));
        assert!(json.contains("\"error\":\"Database connection failed\""));
    }
}
