//! Key derivation using PBKDF2-HMAC-SHA256
//!
//! Derives a 256-bit encryption key from a user passphrase and a per-export
//! salt. The salt travels in the envelope, so import re-derives the exact same
//! key from the same passphrase. Derivation never checks whether a passphrase
//! is "right": a wrong guess only shows up later as an authentication failure.

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use pbkdf2::pbkdf2_hmac;
use sha2::Sha256;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::{CapsuleError, CapsuleResult};

/// Salt length in bytes
pub const SALT_SIZE: usize = 16;

/// Derived key length in bytes (AES-256)
pub const KEY_SIZE: usize = 32;

/// Iteration count used for every envelope
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Lowest iteration count the unit will accept
pub const MIN_ITERATIONS: u32 = 100_000;

/// A key derivation salt
pub type Salt = [u8; SALT_SIZE];

/// Hash function driving the PRF
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HashAlgorithm {
    #[default]
    Sha256,
}

/// Parameters for key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyDerivationParams {
    /// PBKDF2 iteration count
    pub iterations: u32,
    /// PRF hash
    pub hash: HashAlgorithm,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            iterations: PBKDF2_ITERATIONS,
            hash: HashAlgorithm::Sha256,
        }
    }
}

impl KeyDerivationParams {
    /// Create the params every envelope is written with
    pub fn new() -> Self {
        Self::default()
    }

    /// Create params with a specific iteration count
    pub fn with_iterations(iterations: u32) -> Self {
        Self {
            iterations,
            ..Default::default()
        }
    }
}

/// Generate a fresh random salt
pub fn generate_salt() -> Salt {
    let mut salt = [0u8; SALT_SIZE];
    OsRng.fill_bytes(&mut salt);
    salt
}

/// A derived encryption key, zeroed when dropped
#[derive(Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: [u8; KEY_SIZE],
}

impl DerivedKey {
    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// Derive an encryption key from a passphrase
///
/// Same passphrase, salt and params always yield the same key.
pub fn derive_key(
    passphrase: &[u8],
    salt: &Salt,
    params: &KeyDerivationParams,
) -> CapsuleResult<DerivedKey> {
    if passphrase.is_empty() {
        return Err(CapsuleError::KeyDerivation(
            "passphrase must not be empty".to_string(),
        ));
    }

    if params.iterations < MIN_ITERATIONS {
        return Err(CapsuleError::KeyDerivation(format!(
            "iteration count {} is below the minimum of {}",
            params.iterations, MIN_ITERATIONS
        )));
    }

    let mut key = [0u8; KEY_SIZE];
    match params.hash {
        HashAlgorithm::Sha256 => {
            pbkdf2_hmac::<Sha256>(passphrase, salt, params.iterations, &mut key)
        }
    }

    let derived = DerivedKey { key };
    key.zeroize();
    Ok(derived)
}
