//! Passphrase entry
//!
//! A passphrase given on the command line or through `CAPSULE_PASSPHRASE`
//! is used as is; otherwise the user is prompted with hidden input.

use crate::crypto::SecureString;
use crate::error::{CapsuleError, CapsuleResult};

/// Passphrase for a new export; prompts twice and insists on `min_len`
pub fn new_passphrase(given: Option<String>, min_len: usize) -> CapsuleResult<SecureString> {
    if let Some(given) = given {
        return Ok(SecureString::new(given));
    }

    loop {
        let pass1 = prompt_passphrase("Backup password: ")?;

        if pass1.char_count() < min_len {
            println!(
                "Password must be at least {} characters. Please try again.",
                min_len
            );
            continue;
        }

        let pass2 = prompt_passphrase("Confirm password: ")?;

        if pass1.as_str() != pass2.as_str() {
            println!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(pass1);
    }
}

/// Passphrase for opening an existing envelope
pub fn existing_passphrase(given: Option<String>) -> CapsuleResult<SecureString> {
    match given {
        Some(given) => Ok(SecureString::new(given)),
        None => prompt_passphrase("Backup password: "),
    }
}

/// Prompt for a passphrase (hidden input)
fn prompt_passphrase(prompt: &str) -> CapsuleResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::new)
        .map_err(|e| CapsuleError::Io(format!("Failed to read password: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_given_passphrase_skips_prompt() {
        let pass = new_passphrase(Some("correct-horse-battery".into()), 8).unwrap();
        assert_eq!(pass.as_str(), "correct-horse-battery");

        // Length is enforced by the exporter, not here
        let short = new_passphrase(Some("short".into()), 8).unwrap();
        assert_eq!(short.as_str(), "short");

        let existing = existing_passphrase(Some("anything".into())).unwrap();
        assert_eq!(existing.as_str(), "anything");
    }
}
