//! Authentication error types.

use thiserror::Error;

use crate::api::{ApiError, SignupError};
use crate::stores::SessionError;

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] suturahub_core::EmailError),

    /// Signup form failed validation.
    #[error(transparent)]
    Signup(#[from] SignupError),

    /// The backend rejected the request or could not be reached.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// The returned credentials could not be stored.
    #[error("session error: {0}")]
    Session(#[from] SessionError),

    /// The operation needs a signed-in user.
    #[error("not signed in")]
    NotSignedIn,

    /// The user signed out or switched account while the request was in flight.
    #[error("session changed while the profile was loading")]
    SessionChanged,
}
