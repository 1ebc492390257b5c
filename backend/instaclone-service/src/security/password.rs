use crate::error::{AppError, Result};
use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;

/// Hash with Argon2id and a fresh random salt. Policy checks happen on the
/// request models before this is called.
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let password_hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)?
        .to_string();

    Ok(password_hash)
}

/// `Ok(false)` on mismatch, `Err` only if the stored hash is malformed.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| AppError::Internal(format!("Invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(_) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(AppError::Internal(format!(
            "Password verification failed: {}",
            e
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("Hunter2!pass").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("Hunter2!pass", &hash).unwrap());
        assert!(!verify_password("Hunter3!pass", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("Hunter2!pass").unwrap();
        let b = hash_password("Hunter2!pass").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_is_error() {
        assert!(verify_password("Hunter2!pass", "plaintext").is_err());
    }
}
