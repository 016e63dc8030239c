//! Authentication service.
//!
//! Talks to the backend auth endpoints and only touches the session store
//! once a request has succeeded.

mod error;

pub use error::AuthError;

use secrecy::SecretString;
use tracing::instrument;

use suturahub_core::{Email, Role};

use crate::api::{ApiClient, SignupForm};
use crate::models::session::UserProfile;
use crate::stores::SessionStore;

/// Authentication service.
///
/// Handles login, registration, logout, and profile refresh.
pub struct AuthService<'a> {
    api: &'a ApiClient,
    session: &'a SessionStore,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a SessionStore) -> Self {
        Self { api, session }
    }

    /// Sign in as `role` and store the resulting session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` before any request for a malformed
    /// email, or `AuthError::Api` with the backend's message on failure. The
    /// current session is unchanged on error.
    #[instrument(skip(self, email, password), fields(role = %role))]
    pub async fn login(
        &self,
        role: Role,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;
        let response = self.api.login(role, &email, password).await?;

        let profile = response.user.with_role(role);
        self.session.login(response.token, profile.clone())?;
        Ok(profile)
    }

    /// Register a new account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Signup` if the form is invalid (no request is
    /// sent), or `AuthError::Api` if the backend rejects it.
    #[instrument(skip(self, form), fields(role = %role))]
    pub async fn signup(&self, role: Role, form: &SignupForm) -> Result<String, AuthError> {
        form.validate()?;
        Ok(self.api.signup(role, form).await?)
    }

    /// Sign out. Returns `false` if nobody was signed in.
    pub fn logout(&self) -> bool {
        self.session.logout()
    }

    /// Re-fetch the signed-in user's profile and store it.
    ///
    /// The role and token are kept; only the profile fields change. The result
    /// is dropped if the session moved on to another token or account while
    /// the request was in flight.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` when anonymous, `AuthError::Api` if the
    /// request fails, or `AuthError::SessionChanged` if the profile no longer
    /// belongs to the current session.
    #[instrument(skip(self))]
    pub async fn refresh_profile(&self) -> Result<UserProfile, AuthError> {
        let (Some(token), Some(current)) = (self.session.token(), self.session.user()) else {
            return Err(AuthError::NotSignedIn);
        };

        let record = self.api.profile(&token).await?;
        let profile = record.with_role(current.role);
        if profile.id != current.id || !self.session.update_profile(&token, profile.clone()) {
            tracing::warn!(user_id = %current.id, "Discarding stale profile refresh");
            return Err(AuthError::SessionChanged);
        }
        Ok(profile)
    }
}
