use crate::error::AppError;
use bcrypt::{hash, verify};

// Work factor for new hashes. Raising it only affects passwords hashed from
// then on; existing hashes keep the cost they were created with.
const BCRYPT_COST: u32 = 12;

/// Hashes a plaintext password for storage.
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, BCRYPT_COST)
        .map_err(|e| AppError::InternalServerError(format!("Password hashing failed: {}", e)))
}

/// Checks a plaintext password against a stored hash. A mismatch is
/// `Ok(false)`; an error means the hash itself could not be processed.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    verify(password, hashed_password)
        .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {}", e)))
}
