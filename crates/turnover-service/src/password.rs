//! Credential hashing for cleaner accounts.

use argon2::password_hash::{SaltString, rand_core::OsRng};
use argon2::{Argon2, PasswordHasher};

use crate::error::{ServiceError, ServiceResult};

/// Shortest password accepted for a cleaner account.
pub const MIN_PASSWORD_LEN: usize = 8;

/// ## Summary
/// Validates a cleaner's new password and returns its Argon2id PHC string,
/// salted per call. Only the hash is stored.
///
/// ## Errors
/// Returns `ValidationError` for a password shorter than
/// [`MIN_PASSWORD_LEN`] characters, or `InvalidConfiguration` if Argon2
/// rejects its input.
pub fn hash_password(password: &str) -> ServiceResult<String> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ServiceError::ValidationError(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|phc| phc.to_string())
        .map_err(|e| ServiceError::InvalidConfiguration(format!("Failed to hash password: {e}")))
}

#[cfg(test)]
mod tests {
    use argon2::{PasswordHash, PasswordVerifier};

    use super::*;

    fn matches(password: &str, phc: &str) -> bool {
        let parsed = PasswordHash::new(phc).unwrap();
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    }

    #[test]
    fn test_hash_is_argon2id_and_verifies() {
        let phc = hash_password("turnover-2024").unwrap();
        assert!(phc.starts_with("$argon2id$"));
        assert!(matches("turnover-2024", &phc));
        assert!(!matches("turnover-2025", &phc));
    }

    #[test]
    fn test_salt_differs_per_hash() {
        let first = hash_password("same password").unwrap();
        let second = hash_password("same password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_length_counts_characters() {
        assert!(matches!(
            hash_password("short"),
            Err(ServiceError::ValidationError(_))
        ));
        assert!(hash_password("çãõéíúàü").is_ok());
    }
}
