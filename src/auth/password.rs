use std::sync::OnceLock;

use crate::utils::AppError;

pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    bcrypt::hash(password, cost).map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Checks `password` against a stored bcrypt hash. A malformed hash is an
/// error, a mismatch is `Ok(false)`.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    bcrypt::verify(password, hash)
        .map_err(|e| AppError::Internal(format!("Password verification error: {}", e)))
}

fn dummy_hash() -> Option<&'static str> {
    static DUMMY: OnceLock<Option<String>> = OnceLock::new();
    DUMMY
        .get_or_init(|| bcrypt::hash("medbot-unknown-user", bcrypt::DEFAULT_COST).ok())
        .as_deref()
}

/// Spends one bcrypt verification on a throwaway hash, so a login for an
/// unknown username takes as long as one with a wrong password.
pub fn verify_against_dummy(password: &str) {
    if let Some(hash) = dummy_hash() {
        let _ = bcrypt::verify(password, hash);
    }
}
