//! Local media blob store
//!
//! Attachments are stored under the media directory and handed out as
//! time-limited `file://` URLs. The `sig` parameter is an HMAC-SHA256 over
//! the path and expiry, keyed by a secret generated once per install, so a
//! link whose path or expiry was edited fails `verify_url`.

use std::fmt;
use std::fs;
use std::path::{Component, Path, PathBuf};

use aes_gcm::aead::rand_core::RngCore;
use aes_gcm::aead::OsRng;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::error::{CapsuleError, CapsuleResult};

use super::file_io::write_atomic;
use super::BlobStore;

type HmacSha256 = Hmac<Sha256>;

/// Size of the link signing key in bytes
pub const LINK_KEY_SIZE: usize = 32;

/// Blob store rooted at a local directory
#[derive(Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    key: Zeroizing<[u8; LINK_KEY_SIZE]>,
}

impl LocalBlobStore {
    /// Open the store at `root`, loading the signing key from `key_path` or
    /// creating one on first use
    pub fn open(root: PathBuf, key_path: &Path) -> CapsuleResult<Self> {
        let key = if key_path.exists() {
            load_key(key_path)?
        } else {
            let mut key = Zeroizing::new([0u8; LINK_KEY_SIZE]);
            OsRng.fill_bytes(&mut key[..]);
            let encoded = Zeroizing::new(hex::encode(&key[..]));
            write_atomic(key_path, encoded.as_bytes())?;
            key
        };
        Ok(Self { root, key })
    }

    /// Store with an explicit signing key
    pub fn with_key(root: PathBuf, key: [u8; LINK_KEY_SIZE]) -> Self {
        Self {
            root,
            key: Zeroizing::new(key),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Check a URL issued by `signed_url`; returns the blob's file path
    pub fn verify_url(&self, url: &str) -> CapsuleResult<PathBuf> {
        let invalid = || CapsuleError::Validation("Media link signature is invalid".to_string());

        let rest = url.strip_prefix("file://").ok_or_else(invalid)?;
        let (path, query) = rest.rsplit_once('?').ok_or_else(invalid)?;
        let mut expires = None;
        let mut sig = None;
        for pair in query.split('&') {
            match pair.split_once('=') {
                Some(("expires", v)) => expires = v.parse::<i64>().ok(),
                Some(("sig", v)) => sig = hex::decode(v).ok(),
                _ => return Err(invalid()),
            }
        }
        let (expires, sig) = expires.zip(sig).ok_or_else(invalid)?;

        let path = PathBuf::from(path);
        self.mac(&path, expires)?
            .verify_slice(&sig)
            .map_err(|_| invalid())?;

        if expires < Utc::now().timestamp() {
            return Err(CapsuleError::Validation(
                "Media link has expired".to_string(),
            ));
        }
        Ok(path)
    }

    /// Resolve a blob path, refusing anything that escapes the root
    fn resolve(&self, path: &str) -> CapsuleResult<PathBuf> {
        let relative = Path::new(path.trim_start_matches('/'));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir))
        {
            return Err(CapsuleError::Validation(format!(
                "Media path must stay inside the media directory: {}",
                path
            )));
        }

        let full = self.root.join(relative);
        if !full.is_file() {
            return Err(CapsuleError::blob_not_found(path));
        }
        Ok(full)
    }

    fn mac(&self, path: &Path, expires: i64) -> CapsuleResult<HmacSha256> {
        let mut mac = <HmacSha256 as Mac>::new_from_slice(&self.key[..])
            .map_err(|e| CapsuleError::Encryption(format!("Invalid link key: {}", e)))?;
        mac.update(path.to_string_lossy().as_bytes());
        mac.update(b"|");
        mac.update(expires.to_string().as_bytes());
        Ok(mac)
    }
}

impl fmt::Debug for LocalBlobStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LocalBlobStore")
            .field("root", &self.root)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

fn load_key(key_path: &Path) -> CapsuleResult<Zeroizing<[u8; LINK_KEY_SIZE]>> {
    let bad_key = || {
        CapsuleError::Storage(format!(
            "Media link key is corrupt: {}",
            key_path.display()
        ))
    };

    let encoded = Zeroizing::new(fs::read_to_string(key_path).map_err(|e| {
        CapsuleError::Storage(format!("Failed to read {}: {}", key_path.display(), e))
    })?);
    let bytes = Zeroizing::new(hex::decode(encoded.trim()).map_err(|_| bad_key())?);

    let mut key = Zeroizing::new([0u8; LINK_KEY_SIZE]);
    if bytes.len() != LINK_KEY_SIZE {
        return Err(bad_key());
    }
    key.copy_from_slice(&bytes);
    Ok(key)
}

impl BlobStore for LocalBlobStore {
    fn signed_url(&self, path: &str, ttl_secs: u64) -> CapsuleResult<String> {
        let full = self.resolve(path)?;
        let full = full.canonicalize().unwrap_or(full);
        let ttl = i64::try_from(ttl_secs).unwrap_or(i64::MAX);
        let expires = Utc::now().timestamp().saturating_add(ttl);
        let sig = hex::encode(self.mac(&full, expires)?.finalize().into_bytes());

        Ok(format!(
            "file://{}?expires={}&sig={}",
            full.display(),
            expires,
            sig
        ))
    }
}
