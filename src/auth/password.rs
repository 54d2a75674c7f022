//! Password hashing for account credentials
//!
//! Argon2id with the crate defaults; stored hashes are PHC strings so
//! parameters can change later without invalidating old accounts.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::types::StartlinkError;

/// Hash a password with a fresh random salt
pub fn hash_password(password: &str) -> Result<String, StartlinkError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| StartlinkError::Auth(format!("Failed to hash password: {e}")))
}

/// Check a password against a stored PHC hash.
///
/// A wrong password is `Ok(false)`; a stored hash that does not parse
/// is an error, since that means the account record is corrupt.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, StartlinkError> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| StartlinkError::Auth(format!("Invalid password hash format: {e}")))?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let hash = hash_password("orchid-mantis-42").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("orchid-mantis-42", &hash).unwrap());
        assert!(!verify_password("orchid-mantis-43", &hash).unwrap());
    }

    #[test]
    fn test_salts_are_unique_per_hash() {
        let a = hash_password("same input").unwrap();
        let b = hash_password("same input").unwrap();
        assert_ne!(a, b);
        assert!(verify_password("same input", &a).unwrap());
        assert!(verify_password("same input", &b).unwrap());
    }

    #[test]
    fn test_corrupt_stored_hash_is_an_error() {
        assert!(verify_password("anything", "plaintext-left-in-db").is_err());
        assert!(verify_password("anything", "").is_err());
    }
}
