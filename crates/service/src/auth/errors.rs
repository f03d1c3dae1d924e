use thiserror::Error;

use models::errors::ModelError;
use models::user::USERNAME_TAKEN;

/// Failures of register/login/token checks.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("username already taken")]
    Conflict,
    #[error("invalid credentials")]
    Unauthorized,
    #[error("password hashing failed: {0}")]
    HashError(String),
    #[error("token rejected: {0}")]
    TokenError(String),
    #[error("repository error: {0}")]
    Repository(String),
}

impl AuthError {
    /// Stable numeric code for logs
    pub fn code(&self) -> u16 {
        match self {
            AuthError::Validation(_) => 1001,
            AuthError::Conflict => 1002,
            AuthError::Unauthorized => 1004,
            AuthError::HashError(_) => 1101,
            AuthError::TokenError(_) => 1102,
            AuthError::Repository(_) => 1200,
        }
    }
}

impl From<ModelError> for AuthError {
    fn from(e: ModelError) -> Self {
        match e {
            ModelError::Fields(f) if f.get("username").is_some_and(|m| m.iter().any(|s| s == USERNAME_TAKEN)) => {
                AuthError::Conflict
            }
            ModelError::Fields(f) => AuthError::Validation(f.to_string()),
            ModelError::Validation(msg) => AuthError::Validation(msg),
            other => AuthError::Repository(other.to_string()),
        }
    }
}
