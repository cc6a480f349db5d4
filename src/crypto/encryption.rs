//! AES-256-GCM encryption/decryption
//!
//! Provides authenticated encryption for archive blobs. The caller supplies a
//! nonce from `generate_nonce`, which must be fresh for every encryption; the
//! 16-byte authentication tag is appended to the ciphertext.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::{
    aead::{Aead, KeyInit, OsRng},
    Aes256Gcm,
};

use crate::error::{CapsuleError, CapsuleResult};

use super::DerivedKey;

/// Size of the AES-GCM nonce in bytes (96 bits)
pub const NONCE_SIZE: usize = 12;

/// Size of the AES-GCM authentication tag in bytes (128 bits)
pub const TAG_SIZE: usize = 16;

/// An AES-GCM nonce
pub type Nonce = [u8; NONCE_SIZE];

/// Generate a fresh random nonce
pub fn generate_nonce() -> Nonce {
    let mut nonce = [0u8; NONCE_SIZE];
    OsRng.fill_bytes(&mut nonce);
    nonce
}

/// Encrypt plaintext with AES-256-GCM
///
/// Returns `ciphertext || tag`.
pub fn encrypt(key: &DerivedKey, nonce: &Nonce, plaintext: &[u8]) -> CapsuleResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CapsuleError::Encryption(format!("Failed to create cipher: {}", e)))?;

    cipher
        .encrypt(aes_gcm::Nonce::from_slice(nonce), plaintext)
        .map_err(|e| CapsuleError::Encryption(format!("Encryption failed: {}", e)))
}

/// Decrypt and verify `ciphertext || tag` with AES-256-GCM
///
/// The tag is checked before any plaintext is returned. A wrong key and a
/// corrupted ciphertext are indistinguishable and both produce
/// `AuthenticationFailure`.
pub fn decrypt(
    key: &DerivedKey,
    nonce: &Nonce,
    ciphertext_with_tag: &[u8],
) -> CapsuleResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| CapsuleError::Encryption(format!("Failed to create cipher: {}", e)))?;

    cipher
        .decrypt(aes_gcm::Nonce::from_slice(nonce), ciphertext_with_tag)
        .map_err(|_| CapsuleError::AuthenticationFailure)
}
