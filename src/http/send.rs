//! Send endpoint.

use crate::error::ApiError;
use crate::server::RelayService;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;
use std::sync::Arc;

/// Send request body.
#[derive(Debug, Deserialize)]
pub struct SendRequest {
    /// Recipient fingerprint (40 hex characters).
    pub to_public_key: String,
    /// Opaque encrypted payload.
    pub encrypted_data: String,
    /// Unix timestamp the sender signed.
    pub timestamp: i64,
    /// Armored detached signature over `to_public_key|encrypted_data|timestamp`.
    pub signature: String,
}

/// Send handler. Responds 201 with an empty body on success.
pub async fn send_handler(
    Extension(relay): Extension<Arc<RelayService>>,
    body: Result<Json<SendRequest>, JsonRejection>,
) -> Response {
    // Any deserialization failure (absent field, wrong type, bad JSON) is
    // indistinguishable to the client.
    let Ok(Json(request)) = body else {
        return ApiError::MissingFields.into_response();
    };

    match relay
        .send(
            &request.to_public_key,
            &request.encrypted_data,
            request.timestamp,
            &request.signature,
        )
        .await
    {
        Ok(_id) => StatusCode::CREATED.into_response(),
        Err(e) => e.into_response(),
    }
}
