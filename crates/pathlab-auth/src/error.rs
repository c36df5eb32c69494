//! Authentication error types.

use pathlab_core::error::PortalError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("password too short")]
    PasswordTooShort,

    #[error("session has expired")]
    SessionExpired,

    #[error("invalid session token")]
    SessionInvalid,

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for PortalError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::AccountInactive => {
                PortalError::InvalidCredentials
            }
            AuthError::PasswordTooShort => PortalError::Validation {
                message: err.to_string(),
            },
            AuthError::SessionExpired | AuthError::SessionInvalid => PortalError::NotAuthenticated,
            AuthError::Crypto(msg) => PortalError::Database(format!("crypto: {msg}")),
        }
    }
}
