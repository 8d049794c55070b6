//! Anonymous sender identification.
//!
//! A request carries no credential other than a detached OpenPGP signature.
//! The verifier extracts the issuer fingerprint from the signature's own
//! subpackets, resolves that key through the validation cache, checks the
//! signature cryptographically, and only then enforces the timestamp window.
//! The resulting fingerprint is the only sender identity the relay ever
//! trusts.

use crate::clock::Clock;
use crate::error::VerifyError;
use crate::fingerprint::Fingerprint;
use crate::keycache::{KeyStatus, KeyValidationCache};
use pgp::composed::{Deserializable, SignedPublicKey, StandaloneSignature};
use std::sync::Arc;

/// Verifies detached signatures and derives trusted sender fingerprints.
pub struct IdentityVerifier {
    keys: Arc<KeyValidationCache>,
    clock: Arc<dyn Clock>,
    max_skew_secs: i64,
}

impl IdentityVerifier {
    /// Create a verifier over the given key cache.
    pub fn new(keys: Arc<KeyValidationCache>, clock: Arc<dyn Clock>, max_skew_secs: i64) -> Self {
        Self {
            keys,
            clock,
            max_skew_secs,
        }
    }

    /// Verify a detached armored signature over `signed_data` and return the
    /// signer's canonical fingerprint.
    ///
    /// The timestamp window is checked only after the cryptographic check
    /// succeeds, so a replayed-but-expired valid signature surfaces as
    /// [`VerifyError::ExpiredTimestamp`], distinguishable from a forgery.
    pub async fn verify(
        &self,
        signature_armored: &str,
        signed_data: &str,
        claimed_timestamp: i64,
    ) -> Result<Fingerprint, VerifyError> {
        let (signature, _headers) = StandaloneSignature::from_string(signature_armored)
            .map_err(|_| VerifyError::InvalidSignature)?;

        // The signature names its own issuer; no pre-supplied key needed.
        let fingerprint = issuer_fingerprint(&signature).ok_or(VerifyError::InvalidSignature)?;

        let validation = self.keys.resolve(fingerprint.as_str()).await?;
        let key = match (validation.status, validation.key) {
            (KeyStatus::Valid, Some(key)) => key,
            (status, _) => {
                tracing::warn!(%fingerprint, %status, "signer key not valid");
                return Err(VerifyError::UnknownOrInvalidKey);
            }
        };

        verify_with_key(&signature, &key, signed_data.as_bytes())?;

        let now = self.clock.now_unix();
        if (now - claimed_timestamp).abs() > self.max_skew_secs {
            tracing::warn!(%fingerprint, claimed_timestamp, now, "timestamp outside window");
            return Err(VerifyError::ExpiredTimestamp);
        }

        Ok(fingerprint)
    }
}

/// Extract the issuer fingerprint embedded in the signature's subpackets.
fn issuer_fingerprint(signature: &StandaloneSignature) -> Option<Fingerprint> {
    signature
        .signature
        .issuer_fingerprint()
        .into_iter()
        .next()
        .map(|fp| Fingerprint::from_bytes(fp.as_bytes()))
}

/// Cryptographically verify the signature against the primary key, then any
/// subkeys. Verification runs against raw key material only — user-ID
/// self-certifications are never consulted, so keys without identities
/// still verify.
fn verify_with_key(
    signature: &StandaloneSignature,
    key: &SignedPublicKey,
    data: &[u8],
) -> Result<(), VerifyError> {
    if signature.verify(key, data).is_ok() {
        return Ok(());
    }
    for subkey in &key.public_subkeys {
        if signature.verify(subkey, data).is_ok() {
            return Ok(());
        }
    }
    Err(VerifyError::InvalidSignature)
}
