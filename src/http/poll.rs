//! Poll endpoint.

use crate::error::ApiError;
use crate::server::RelayService;
use crate::storage::StoredMessage;
use axum::extract::rejection::JsonRejection;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Poll request body.
#[derive(Debug, Deserialize)]
pub struct PollRequest {
    /// Unix timestamp the requester signed (the signed data is its decimal
    /// string form).
    pub timestamp: i64,
    /// Armored detached signature over the stringified timestamp.
    pub signature: String,
}

/// A delivered message as it appears on the wire.
#[derive(Debug, Clone, Serialize)]
pub struct MessageResponse {
    /// Message id.
    pub id: i64,
    /// Verified fingerprint of the sender.
    pub from_public_key: String,
    /// Opaque encrypted payload.
    pub encrypted_data: String,
    /// Unix timestamp the relay stored the message at.
    pub created_at: i64,
}

impl From<StoredMessage> for MessageResponse {
    fn from(message: StoredMessage) -> Self {
        Self {
            id: message.id,
            from_public_key: message.from_fingerprint,
            encrypted_data: message.encrypted_payload,
            created_at: message.created_at,
        }
    }
}

/// Poll handler. Responds 200 with the collected messages as a JSON array;
/// an empty mailbox answers `[]`, never an error.
pub async fn poll_handler(
    Extension(relay): Extension<Arc<RelayService>>,
    body: Result<Json<PollRequest>, JsonRejection>,
) -> Response {
    let Ok(Json(request)) = body else {
        return ApiError::MissingFields.into_response();
    };

    match relay.poll(request.timestamp, &request.signature).await {
        Ok(messages) => {
            let messages: Vec<MessageResponse> =
                messages.into_iter().map(MessageResponse::from).collect();
            Json(messages).into_response()
        }
        Err(e) => e.into_response(),
    }
}
