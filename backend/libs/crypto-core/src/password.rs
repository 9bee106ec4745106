/// Password hashing and verification using Argon2id
///
/// One scheme, no legacy fallback: every stored credential is an Argon2id
/// PHC string. Hashes from any earlier scheme must be migrated offline.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;
use zxcvbn::zxcvbn;

pub type Result<T> = std::result::Result<T, PasswordError>;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("Password too weak: {0}")]
    WeakPassword(String),

    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// Hash a password with Argon2id and a fresh random salt
///
/// Rejects weak passwords before hashing; see `validate_password_strength`.
pub fn hash_password(password: &str) -> Result<String> {
    validate_password_strength(password)?;

    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    let password_hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();

    Ok(password_hash)
}

/// Verify a password against its stored PHC-formatted hash
///
/// Returns `false` on mismatch; errors only for malformed hashes.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| PasswordError::Hash(format!("Invalid password hash format: {e}")))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(PasswordError::Hash(format!(
            "Password verification failed: {e}"
        ))),
    }
}

/// Minimum bar: 8+ characters, mixed case, digit, special character, and a
/// zxcvbn score of at least 3
fn validate_password_strength(password: &str) -> Result<()> {
    if password.len() < 8 {
        return Err(PasswordError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    let has_uppercase = password.chars().any(|c| c.is_ascii_uppercase());
    let has_lowercase = password.chars().any(|c| c.is_ascii_lowercase());
    let has_digit = password.chars().any(|c| c.is_ascii_digit());
    let has_special = password.chars().any(|c| !c.is_alphanumeric());

    if !has_uppercase {
        return Err(PasswordError::WeakPassword(
            "Password must contain at least one uppercase letter".to_string(),
        ));
    }

    if !has_lowercase {
        return Err(PasswordError::WeakPassword(
            "Password must contain at least one lowercase letter".to_string(),
        ));
    }

    if !has_digit {
        return Err(PasswordError::WeakPassword(
            "Password must contain at least one digit".to_string(),
        ));
    }

    if !has_special {
        return Err(PasswordError::WeakPassword(
            "Password must contain at least one special character".to_string(),
        ));
    }

    let entropy = zxcvbn(password, &[])
        .map_err(|e| PasswordError::Hash(format!("Password entropy calculation failed: {e}")))?;

    if entropy.score() < 3 {
        return Err(PasswordError::WeakPassword(
            "Password is too weak. Please use a stronger password with higher entropy.".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_valid_password() {
        let password = "StrongP@ssw0rd!";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(verify_password(password, &hash).expect("should verify successfully"));
    }

    #[test]
    fn test_verify_wrong_password() {
        let password = "StrongP@ssw0rd!";
        let hash = hash_password(password).expect("should hash password successfully");
        assert!(!verify_password("WrongPassword123!", &hash).expect("verification should succeed"));
    }

    #[test]
    fn test_weak_password_too_short() {
        let result = hash_password("Short1!");
        assert!(matches!(result, Err(PasswordError::WeakPassword(_))));
    }

    #[test]
    fn test_weak_password_no_uppercase() {
        let result = hash_password("weakpassword123!");
        assert!(matches!(result, Err(PasswordError::WeakPassword(_))));
    }

    #[test]
    fn test_weak_password_no_digit() {
        let result = hash_password("StrongPassword!");
        assert!(matches!(result, Err(PasswordError::WeakPassword(_))));
    }

    #[test]
    fn test_weak_password_no_special() {
        let result = hash_password("StrongPassword123");
        assert!(matches!(result, Err(PasswordError::WeakPassword(_))));
    }

    #[test]
    fn test_different_hashes_for_same_password() {
        let password = "StrongP@ssw0rd!";
        let hash1 = hash_password(password).expect("should hash successfully");
        let hash2 = hash_password(password).expect("should hash successfully");
        // Different salts should produce different hashes
        assert_ne!(hash1, hash2);
    }
}
