//! Password hashing
//!
//! bcrypt with the library default cost. Verification failures and hash
//! errors are both reported as invalid credentials by the caller.

use bcrypt::{hash, verify, DEFAULT_COST};

/// Hashing errors
#[derive(Debug, thiserror::Error)]
pub enum PasswordError {
    #[error("hashing failed: {0}")]
    Hash(String),
}

/// Hash a plaintext password for storage.
pub fn hash_password(plain: &str) -> Result<String, PasswordError> {
    hash(plain, DEFAULT_COST).map_err(|e| PasswordError::Hash(e.to_string()))
}

/// Check a plaintext password against a stored hash.
pub fn verify_password(plain: &str, stored_hash: &str) -> bool {
    verify(plain, stored_hash).unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash_password("client123").unwrap();
        assert_ne!(hashed, "client123");
        assert!(verify_password("client123", &hashed));
        assert!(!verify_password("wrong-password", &hashed));
    }

    #[test]
    fn test_verify_garbage_hash() {
        assert!(!verify_password("client123", "not-a-bcrypt-hash"));
    }
}
