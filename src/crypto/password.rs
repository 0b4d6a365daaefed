use argon2::Argon2;
use rand::Rng;
use subtle::ConstantTimeEq;

use crate::error::AppError;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Argon2id output plus the salt it was derived with.
pub struct PasswordDigest {
    pub hash: [u8; 32],
    pub salt: [u8; 32],
}

/// Generate a cryptographically secure random salt
pub fn generate_salt() -> [u8; 32] {
    rand::thread_rng().gen()
}

fn derive(password: &str, salt: &[u8]) -> Result<[u8; 32], AppError> {
    let mut hash = [0u8; 32];
    Argon2::default()
        .hash_password_into(password.as_bytes(), salt, &mut hash)
        .map_err(|e| AppError::Crypto(format!("Password hashing failed: {}", e)))?;
    Ok(hash)
}

/// Hash a freshly chosen password under a new random salt.
pub fn hash_password(password: &str) -> Result<PasswordDigest, AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::Validation(format!(
            "Password must be at least {} characters",
            MIN_PASSWORD_LEN
        )));
    }

    let salt = generate_salt();
    let hash = derive(password, &salt)?;
    Ok(PasswordDigest { hash, salt })
}

/// Check a login attempt against the stored digest columns.
pub fn verify_password(password: &str, stored_hash: &[u8], salt: &[u8]) -> Result<bool, AppError> {
    let computed = derive(password, salt)?;
    // Slices of different lengths compare unequal.
    Ok(bool::from(computed.as_slice().ct_eq(stored_hash)))
}
