use thiserror::Error;

pub type Result<T> = std::result::Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    /// Same error for an unknown email and a wrong password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("Email already in use")]
    EmailConflict,

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Database error: {0}")]
    DatabaseError(#[from] sessionauth_database::DatabaseError),

    #[error("Password hashing error: {0}")]
    PasswordHashError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    /// Failures of the system rather than of the request.
    pub fn is_internal(&self) -> bool {
        matches!(
            self,
            AuthError::DatabaseError(_) | AuthError::PasswordHashError(_) | AuthError::Internal(_)
        )
    }
}

impl From<argon2::password_hash::Error> for AuthError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AuthError::PasswordHashError(err.to_string())
    }
}

impl From<validator::ValidationErrors> for AuthError {
    fn from(err: validator::ValidationErrors) -> Self {
        AuthError::ValidationError(err.to_string())
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(err.to_string())
    }
}
