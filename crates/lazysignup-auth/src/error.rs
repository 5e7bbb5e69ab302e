//! Lazy signup error types.

use lazysignup_core::error::LazySignupError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("account is inactive")]
    AccountInactive,

    #[error("not authenticated")]
    NotAuthenticated,

    #[error("user is not a lazy user")]
    NotLazy,

    #[error("no unique username after {attempts} attempts")]
    UsernameExhausted { attempts: u32 },

    #[error("cryptography error: {0}")]
    Crypto(String),
}

impl From<AuthError> for LazySignupError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredentials | AuthError::AccountInactive => {
                LazySignupError::AuthenticationFailed {
                    reason: err.to_string(),
                }
            }
            AuthError::NotAuthenticated | AuthError::NotLazy => {
                LazySignupError::AuthorizationDenied {
                    reason: err.to_string(),
                }
            }
            AuthError::UsernameExhausted { .. } => {
                LazySignupError::ResourceExhausted(err.to_string())
            }
            AuthError::Crypto(msg) => LazySignupError::Crypto(msg),
        }
    }
}
