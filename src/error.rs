//! Error types for drop-relay.

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Key resolution errors (keyserver and key-cache layer).
#[derive(Debug, thiserror::Error)]
pub enum KeyError {
    /// The keyserver answered 429.
    #[error("keyserver rate limit exceeded")]
    RateLimited,

    /// The keyserver was unreachable, timed out, or answered with an
    /// unexpected status.
    #[error("keyserver unavailable: {0}")]
    Upstream(String),

    /// Key material could not be parsed.
    #[error("failed to parse key material: {0}")]
    BadKeyData(String),

    /// Cache read or write failed.
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Identity verification errors.
///
/// The variants are ordered the way the verifier checks them: the key must
/// resolve valid before the cryptographic check runs, and the timestamp
/// window is only checked after a successful cryptographic check. A replayed
/// but expired valid signature therefore surfaces as [`ExpiredTimestamp`],
/// never as [`InvalidSignature`].
///
/// [`ExpiredTimestamp`]: VerifyError::ExpiredTimestamp
/// [`InvalidSignature`]: VerifyError::InvalidSignature
#[derive(Debug, thiserror::Error)]
pub enum VerifyError {
    /// The signer's key is unknown, revoked, or otherwise not valid.
    #[error("unknown or invalid public key")]
    UnknownOrInvalidKey,

    /// The signature is malformed or does not verify over the signed data.
    #[error("signature verification failed")]
    InvalidSignature,

    /// The claimed timestamp is outside the allowed window.
    #[error("timestamp outside allowed window")]
    ExpiredTimestamp,

    /// Key resolution failed upstream.
    #[error(transparent)]
    Key(#[from] KeyError),
}

/// Protocol-level errors surfaced to HTTP clients.
///
/// The `Display` strings are the wire-visible `{"error": ...}` messages and
/// must stay stable; clients match on them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ApiError {
    /// Request body is missing fields or malformed.
    #[error("Missing required fields")]
    MissingFields,

    /// `to_public_key` is not a 40-hex fingerprint.
    #[error("Invalid fingerprint format")]
    InvalidFingerprintFormat,

    /// Encrypted payload exceeds the size limit.
    #[error("Encrypted data exceeds 1MB limit")]
    PayloadTooLarge,

    /// Signature did not verify.
    #[error("Invalid signature or timestamp")]
    InvalidSignature,

    /// Timestamp outside the allowed window.
    #[error("Invalid signature or timestamp")]
    ExpiredTimestamp,

    /// Sender's key is unknown or not valid.
    #[error("Sender public key not valid")]
    SenderKeyInvalid,

    /// Recipient's key is unknown or not valid.
    #[error("Recipient public key not valid")]
    RecipientKeyInvalid,

    /// Polling key is unknown or not valid.
    #[error("Public key not valid")]
    RequesterKeyInvalid,

    /// Storage or upstream failure; details are logged, not leaked.
    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    /// HTTP status code this error maps to.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::MissingFields | Self::InvalidFingerprintFormat | Self::PayloadTooLarge => 400,
            Self::InvalidSignature | Self::ExpiredTimestamp => 401,
            Self::SenderKeyInvalid | Self::RecipientKeyInvalid | Self::RequesterKeyInvalid => 404,
            Self::Internal => 500,
        }
    }
}

/// Result type alias for storage operations.
pub type StorageResult<T> = std::result::Result<T, StorageError>;

/// Result type alias for key resolution.
pub type KeyResult<T> = std::result::Result<T, KeyError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn api_error_status_codes() {
        assert_eq!(ApiError::MissingFields.status_code(), 400);
        assert_eq!(ApiError::PayloadTooLarge.status_code(), 400);
        assert_eq!(ApiError::InvalidSignature.status_code(), 401);
        assert_eq!(ApiError::ExpiredTimestamp.status_code(), 401);
        assert_eq!(ApiError::SenderKeyInvalid.status_code(), 404);
        assert_eq!(ApiError::RecipientKeyInvalid.status_code(), 404);
        assert_eq!(ApiError::RequesterKeyInvalid.status_code(), 404);
        assert_eq!(ApiError::Internal.status_code(), 500);
    }

    #[test]
    fn auth_errors_share_one_wire_message() {
        // Clients cannot distinguish a forged signature from an expired one
        // at the message level; only the server log can.
        assert_eq!(
            ApiError::InvalidSignature.to_string(),
            ApiError::ExpiredTimestamp.to_string()
        );
    }

    #[test]
    fn wire_messages_are_stable() {
        assert_eq!(ApiError::MissingFields.to_string(), "Missing required fields");
        assert_eq!(
            ApiError::PayloadTooLarge.to_string(),
            "Encrypted data exceeds 1MB limit"
        );
        assert_eq!(
            ApiError::RecipientKeyInvalid.to_string(),
            "Recipient public key not valid"
        );
        assert_eq!(ApiError::RequesterKeyInvalid.to_string(), "Public key not valid");
    }
}
