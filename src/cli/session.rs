//! Session CLI commands: login, logout, whoami

use crate::error::{CapsuleError, CapsuleResult};
use crate::models::UserId;
use crate::storage::{AuthProvider, RecordFilter, RecordStore, Storage};

/// Sign in as `user_id`
pub fn handle_login(storage: &Storage, user_id: &str) -> CapsuleResult<()> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(CapsuleError::Validation("User id cannot be empty".to_string()));
    }

    storage.session.sign_in(UserId::from_string(user_id))?;
    println!("Signed in as {}", user_id);
    Ok(())
}

/// Sign out
pub fn handle_logout(storage: &Storage) -> CapsuleResult<()> {
    match storage.session.current_user_id() {
        Some(user) => {
            storage.session.sign_out()?;
            println!("Signed out {}", user);
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

/// Show the signed-in user
pub fn handle_whoami(storage: &Storage) -> CapsuleResult<()> {
    let Some(user) = storage.session.current_user_id() else {
        println!("Not signed in.");
        return Ok(());
    };

    let count = storage
        .records
        .query(&RecordFilter::for_user(user.clone()))?
        .len();

    println!("{}", user);
    if let Some(at) = storage.session.signed_in_at() {
        println!("  Signed in: {}", at.format("%Y-%m-%d %H:%M UTC"));
    }
    println!("  Memories:  {}", count);
    Ok(())
}
