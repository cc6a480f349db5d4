//! Local sign-in session
//!
//! Stands in for a hosted auth provider: the signed-in user id is kept in
//! session.json next to the settings.

use std::path::PathBuf;
use std::sync::{RwLock, RwLockReadGuard};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{CapsuleError, CapsuleResult};
use crate::models::UserId;

use super::file_io::{read_json, write_json_atomic};
use super::AuthProvider;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct SessionData {
    user_id: Option<UserId>,
    signed_in_at: Option<DateTime<Utc>>,
}

/// File-backed session
pub struct LocalSession {
    path: PathBuf,
    data: RwLock<SessionData>,
}

impl LocalSession {
    /// Open the session stored at `path` (signed out if the file is absent)
    pub fn open(path: PathBuf) -> CapsuleResult<Self> {
        let data: SessionData = read_json(&path)?;
        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    /// When the current user signed in
    pub fn signed_in_at(&self) -> Option<DateTime<Utc>> {
        self.read_data().signed_in_at
    }

    /// Session data is only ever replaced whole, so a poisoned lock still
    /// holds the last complete session
    fn read_data(&self) -> RwLockReadGuard<'_, SessionData> {
        self.data.read().unwrap_or_else(|poisoned| {
            warn!(
                path = %self.path.display(),
                "session lock poisoned; using last stored session"
            );
            poisoned.into_inner()
        })
    }

    fn replace(&self, next: SessionData) -> CapsuleResult<()> {
        write_json_atomic(&self.path, &next)?;
        let mut data = self.data.write().map_err(|e| {
            CapsuleError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;
        *data = next;
        Ok(())
    }
}

impl AuthProvider for LocalSession {
    fn current_user_id(&self) -> Option<UserId> {
        self.read_data().user_id.clone()
    }

    fn sign_in(&self, user_id: UserId) -> CapsuleResult<()> {
        if user_id.is_empty() {
            return Err(CapsuleError::Validation(
                "User id cannot be empty".to_string(),
            ));
        }
        self.replace(SessionData {
            user_id: Some(user_id),
            signed_in_at: Some(Utc::now()),
        })
    }

    fn sign_out(&self) -> CapsuleResult<()> {
        self.replace(SessionData::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_signed_out_by_default() {
        let temp_dir = TempDir::new().unwrap();
        let session = LocalSession::open(temp_dir.path().join("session.json")).unwrap();
        assert!(session.current_user_id().is_none());
    }

    #[test]
    fn test_sign_in_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("session.json");

        let session = LocalSession::open(path.clone()).unwrap();
        session.sign_in(UserId::from_string("alice")).unwrap();
        assert!(session.signed_in_at().is_some());

        let reopened = LocalSession::open(path).unwrap();
        assert_eq!(reopened.current_user_id(), Some(UserId::from_string("alice")));
    }

    #[test]
    fn test_sign_out() {
        let temp_dir = TempDir::new().unwrap();
        let session = LocalSession::open(temp_dir.path().join("session.json")).unwrap();
        session.sign_in(UserId::from_string("alice")).unwrap();
        session.sign_out().unwrap();
        assert!(session.current_user_id().is_none());
    }

    #[test]
    fn test_poisoned_lock_keeps_user() {
        let temp_dir = TempDir::new().unwrap();
        let session = LocalSession::open(temp_dir.path().join("session.json")).unwrap();
        session.sign_in(UserId::from_string("alice")).unwrap();

        let session = std::sync::Arc::new(session);
        let holder = std::sync::Arc::clone(&session);
        let _ = std::thread::spawn(move || {
            let _guard = holder.data.write().unwrap();
            panic!("writer died holding the lock");
        })
        .join();

        assert!(session.data.is_poisoned());
        assert_eq!(session.current_user_id(), Some(UserId::from_string("alice")));
        assert!(session.signed_in_at().is_some());
    }

    #[test]
    fn test_blank_user_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let session = LocalSession::open(temp_dir.path().join("session.json")).unwrap();
        assert!(session.sign_in(UserId::from_string(" ")).is_err());
    }
}
