//! Canonical OpenPGP fingerprint type.

use serde::Serialize;
use std::fmt;

/// A public key fingerprint in canonical form: uppercase hex, no `0x` prefix.
///
/// Verified sender identities, mailbox addresses, and key-cache rows all key
/// off this form, so every external input is normalized exactly once at the
/// boundary.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Fingerprint(String);

/// The input is not a well-formed 40-hex fingerprint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid fingerprint format")]
pub struct InvalidFingerprint;

impl Fingerprint {
    /// Normalize arbitrary client input: trim, uppercase, strip a leading
    /// `0x`. Returns `None` when nothing is left.
    ///
    /// This is deliberately lenient — the keyserver decides whether the
    /// result names a key. Use [`parse`](Self::parse) where the wire format
    /// mandates a 40-hex fingerprint.
    pub fn normalize(input: &str) -> Option<Self> {
        let upper = input.trim().to_ascii_uppercase();
        let cleaned = upper.strip_prefix("0X").unwrap_or(&upper);
        if cleaned.is_empty() {
            return None;
        }
        Some(Self(cleaned.to_string()))
    }

    /// Parse a strict 40-hex fingerprint (v4), normalizing case and prefix.
    pub fn parse(input: &str) -> Result<Self, InvalidFingerprint> {
        let normalized = Self::normalize(input).ok_or(InvalidFingerprint)?;
        if normalized.0.len() == 40 && normalized.0.bytes().all(|b| b.is_ascii_hexdigit()) {
            Ok(normalized)
        } else {
            Err(InvalidFingerprint)
        }
    }

    /// Build a fingerprint from raw digest bytes (e.g. an issuer-fingerprint
    /// signature subpacket).
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self(hex::encode_upper(bytes))
    }

    /// The canonical string form.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FP: &str = "8ACA2A0F8D4CDA797D41DA9C6C1BA214095D82B4";

    #[test]
    fn parse_accepts_canonical_form() {
        let fp = Fingerprint::parse(FP).unwrap();
        assert_eq!(fp.as_str(), FP);
    }

    #[test]
    fn parse_normalizes_case_and_prefix() {
        let lower = FP.to_ascii_lowercase();
        assert_eq!(Fingerprint::parse(&lower).unwrap().as_str(), FP);
        assert_eq!(
            Fingerprint::parse(&format!("0x{lower}")).unwrap().as_str(),
            FP
        );
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(Fingerprint::parse("").is_err());
        assert!(Fingerprint::parse("abc123").is_err());
        assert!(Fingerprint::parse(&FP[..39]).is_err());
        assert!(Fingerprint::parse(&format!("{FP}A")).is_err());
        assert!(Fingerprint::parse(&format!("{}ZZ", &FP[..38])).is_err());
    }

    #[test]
    fn normalize_is_lenient() {
        assert!(Fingerprint::normalize("").is_none());
        assert!(Fingerprint::normalize("  ").is_none());
        assert!(Fingerprint::normalize("0x").is_none());
        assert_eq!(Fingerprint::normalize("0xab").unwrap().as_str(), "AB");
    }

    #[test]
    fn from_bytes_encodes_uppercase() {
        let fp = Fingerprint::from_bytes(&[0x8a, 0xca, 0x2a]);
        assert_eq!(fp.as_str(), "8ACA2A");
    }
}
