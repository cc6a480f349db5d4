//! Password-locked transport envelopes
//!
//! An export is an archive blob encrypted under a key derived from the
//! user's passphrase and framed as `salt || nonce || ciphertext || tag`.
//! `Exporter` and `Restorer` walk the export and import state machines; each
//! step they take is logged at debug level.

pub mod export;
pub mod frame;
pub mod restore;

pub use export::{
    gather_records, ExportFlow, ExportRequest, ExportState, ExportedEnvelope, Exporter,
};
pub use frame::{inspect, Envelope, EnvelopeInfo, HEADER_LEN, MIN_ENVELOPE_LEN};
pub use restore::{ImportFlow, ImportState, RestoreReport, Restorer};

use crate::crypto::{derive_key, DerivedKey, KeyDerivationParams, Salt, SecureString};
use crate::error::{CapsuleError, CapsuleResult};

/// Derive the envelope key; parameters are fixed because envelopes don't carry them
pub(crate) fn envelope_key(passphrase: &SecureString, salt: &Salt) -> CapsuleResult<DerivedKey> {
    derive_key(passphrase.as_bytes(), salt, &KeyDerivationParams::new())
}

/// Reject a passphrase shorter than `min_len` characters
pub fn check_passphrase(passphrase: &SecureString, min_len: usize) -> CapsuleResult<()> {
    if passphrase.char_count() < min_len {
        return Err(CapsuleError::Validation(format!(
            "Password must be at least {} characters",
            min_len
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_envelope_key_is_deterministic() {
        let passphrase = SecureString::new("correct-horse-battery");
        let salt = [9u8; 16];
        let a = envelope_key(&passphrase, &salt).unwrap();
        let b = envelope_key(&passphrase, &salt).unwrap();
        assert_eq!(a.as_bytes(), b.as_bytes());

        let other = envelope_key(&passphrase, &[8u8; 16]).unwrap();
        assert_ne!(a.as_bytes(), other.as_bytes());
    }

    #[test]
    fn test_check_passphrase() {
        assert!(check_passphrase(&SecureString::new("1234567"), 8).is_err());
        assert!(check_passphrase(&SecureString::new("12345678"), 8).is_ok());
        // Counted in characters, not bytes
        assert!(check_passphrase(&SecureString::new("ééééééé"), 8).is_err());
    }
}
