//! Cryptographic functions for capsule
//!
//! Provides PBKDF2-HMAC-SHA256 key derivation and AES-256-GCM authenticated
//! encryption for password-locked exports.

pub mod encryption;
pub mod key_derivation;
pub mod secure_memory;

pub use encryption::{decrypt, encrypt, generate_nonce, Nonce, NONCE_SIZE, TAG_SIZE};
pub use key_derivation::{
    derive_key, generate_salt, DerivedKey, HashAlgorithm, KeyDerivationParams, Salt, SALT_SIZE,
};
pub use secure_memory::SecureString;
