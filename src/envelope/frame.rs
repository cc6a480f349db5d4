//! Envelope framing
//!
//! ```text
//! byte[0..16]   salt            (random, fresh per export)
//! byte[16..28]  nonce           (random, fresh per export)
//! byte[28..]    ciphertext||tag (AES-256-GCM, 16-byte tag at the end)
//! ```
//!
//! There is no magic number or version byte; the layout is fixed.

use base64::{engine::general_purpose::STANDARD, Engine};

use crate::crypto::{Nonce, Salt, NONCE_SIZE, SALT_SIZE, TAG_SIZE};
use crate::error::{CapsuleError, CapsuleResult};

/// Length of the salt + nonce header
pub const HEADER_LEN: usize = SALT_SIZE + NONCE_SIZE;

/// Shortest byte sequence that can possibly be an envelope
pub const MIN_ENVELOPE_LEN: usize = HEADER_LEN + TAG_SIZE;

/// A framed, encrypted export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub salt: Salt,
    pub nonce: Nonce,
    /// AEAD output: ciphertext followed by the tag
    pub ciphertext: Vec<u8>,
}

impl Envelope {
    /// Concatenate salt, nonce and ciphertext into the file layout
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.ciphertext.len());
        out.extend_from_slice(&self.salt);
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Split a file back into salt, nonce and ciphertext
    ///
    /// Anything too short to hold the header and a tag is rejected here,
    /// before any key derivation happens.
    pub fn from_bytes(bytes: &[u8]) -> CapsuleResult<Self> {
        if bytes.len() < HEADER_LEN {
            return Err(CapsuleError::MalformedEnvelope(format!(
                "{} bytes is shorter than the {}-byte header",
                bytes.len(),
                HEADER_LEN
            )));
        }
        if bytes.len() < MIN_ENVELOPE_LEN {
            return Err(CapsuleError::MalformedEnvelope(format!(
                "{} bytes leaves no room for the authentication tag",
                bytes.len()
            )));
        }

        let (salt, rest) = bytes.split_at(SALT_SIZE);
        let (nonce, ciphertext) = rest.split_at(NONCE_SIZE);

        let salt: Salt = salt
            .try_into()
            .map_err(|_| CapsuleError::MalformedEnvelope("bad salt length".to_string()))?;
        let nonce: Nonce = nonce
            .try_into()
            .map_err(|_| CapsuleError::MalformedEnvelope("bad nonce length".to_string()))?;

        Ok(Self {
            salt,
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }
}

/// What can be learned about an envelope without the passphrase
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvelopeInfo {
    pub total_len: usize,
    pub salt_b64: String,
    pub nonce_b64: String,
    pub ciphertext_len: usize,
    /// Plaintext size implied by the ciphertext length
    pub payload_len: usize,
}

/// Describe an envelope's framing
pub fn inspect(bytes: &[u8]) -> CapsuleResult<EnvelopeInfo> {
    let envelope = Envelope::from_bytes(bytes)?;
    Ok(EnvelopeInfo {
        total_len: bytes.len(),
        salt_b64: STANDARD.encode(envelope.salt),
        nonce_b64: STANDARD.encode(envelope.nonce),
        ciphertext_len: envelope.ciphertext.len(),
        payload_len: envelope.ciphertext.len() - TAG_SIZE,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Envelope {
        Envelope {
            salt: [1u8; SALT_SIZE],
            nonce: [2u8; NONCE_SIZE],
            ciphertext: vec![3u8; 40],
        }
    }

    #[test]
    fn test_layout() {
        let bytes = sample().to_bytes();
        assert_eq!(bytes.len(), 68);
        assert_eq!(&bytes[0..16], &[1u8; 16]);
        assert_eq!(&bytes[16..28], &[2u8; 12]);
        assert_eq!(&bytes[28..], &[3u8; 40][..]);
    }

    #[test]
    fn test_parse() {
        let envelope = sample();
        let parsed = Envelope::from_bytes(&envelope.to_bytes()).unwrap();
        assert_eq!(parsed, envelope);
    }

    #[test]
    fn test_short_input_rejected() {
        for len in [0, 1, 27] {
            let result = Envelope::from_bytes(&vec![0u8; len]);
            assert!(matches!(result, Err(CapsuleError::MalformedEnvelope(_))));
        }
    }

    #[test]
    fn test_header_without_tag_rejected() {
        for len in [28, 29, 43] {
            let result = Envelope::from_bytes(&vec![0u8; len]);
            assert!(matches!(result, Err(CapsuleError::MalformedEnvelope(_))));
        }
        assert!(Envelope::from_bytes(&[0u8; 44]).is_ok());
    }

    #[test]
    fn test_inspect() {
        let info = inspect(&sample().to_bytes()).unwrap();
        assert_eq!(info.total_len, 68);
        assert_eq!(info.ciphertext_len, 40);
        assert_eq!(info.payload_len, 24);
        assert_eq!(info.salt_b64, STANDARD.encode([1u8; 16]));
    }

    proptest! {
        #[test]
        fn prop_split_matches_offsets(bytes in proptest::collection::vec(any::<u8>(), 44..256)) {
            let envelope = Envelope::from_bytes(&bytes).unwrap();
            prop_assert_eq!(&envelope.salt[..], &bytes[0..16]);
            prop_assert_eq!(&envelope.nonce[..], &bytes[16..28]);
            prop_assert_eq!(&envelope.ciphertext[..], &bytes[28..]);
            prop_assert_eq!(envelope.to_bytes(), bytes);
        }
    }
}
