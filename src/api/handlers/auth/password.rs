//! One-way password hashing.
//!
//! Digests are salted Argon2id PHC strings: hashing the same password twice
//! produces different digests, and verification parses the salt back out of
//! the stored string.

use anyhow::{anyhow, Result};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rand::rngs::OsRng;

/// Hash a plaintext password into a salted PHC string.
///
/// # Errors
/// Returns an error if hashing fails (parameter or salt encoding issues).
pub fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let digest = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!(e.to_string()))?
        .to_string();
    Ok(digest)
}

/// Check a plaintext password against a stored digest.
///
/// Returns `false` for a wrong password or a malformed digest, never an
/// error.
#[must_use]
pub fn verify(password: &str, digest: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(digest) {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_verify_round_trip() {
        let digest = hash("hunter2").unwrap();
        assert!(verify("hunter2", &digest));
        assert!(!verify("hunter3", &digest));
    }

    #[test]
    fn hashing_is_salted() {
        let first = hash("hunter2").unwrap();
        let second = hash("hunter2").unwrap();
        assert_ne!(first, second);
        assert!(verify("hunter2", &first));
        assert!(verify("hunter2", &second));
    }

    #[test]
    fn malformed_digest_is_rejected() {
        assert!(!verify("hunter2", ""));
        assert!(!verify("hunter2", "not-a-phc-string"));
        assert!(!verify("hunter2", "$argon2id$v=19$broken"));
    }
}
