//! Unified error handling with Sentry integration.
//!
//! Each concern has its own error enum; `AppError` folds them together for
//! front ends. Use [`AppError::user_message`] for anything shown to a person,
//! and [`AppError::report`] to send internal failures to Sentry.

use thiserror::Error;

use crate::api::ApiError;
use crate::checkout::CheckoutError;
use crate::config::ConfigError;
use crate::models::{CartError, ListingError};
use crate::services::{AuthError, SubmitError};
use crate::storage::StorageError;

/// Shown in place of internal error details.
const GENERIC_MESSAGE: &str = "Something went wrong. Please try again.";

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    /// Storage could not be opened or written.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// A product could not be added to the cart.
    #[error("Cart error: {0}")]
    Cart(#[from] CartError),

    /// Login, signup, or profile refresh failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Backend request failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Checkout is not possible yet.
    #[error("Checkout error: {0}")]
    Checkout(#[from] CheckoutError),

    /// Seller listing could not be prepared.
    #[error("Listing error: {0}")]
    Listing(#[from] ListingError),

    /// Seller listing could not be published.
    #[error("Listing error: {0}")]
    Submit(#[from] SubmitError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad input from the user.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    /// Text safe to show to the user.
    ///
    /// Storage and decoding failures are replaced with a generic message.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Storage(_) => GENERIC_MESSAGE.to_owned(),
            Self::Api(err)
            | Self::Auth(AuthError::Api(err))
            | Self::Submit(SubmitError::Api(err)) => api_message(err),
            Self::Listing(ListingError::Invalid(messages))
            | Self::Submit(SubmitError::Invalid(ListingError::Invalid(messages))) => {
                messages.join("\n")
            }
            Self::Auth(AuthError::InvalidEmail(_)) => "Invalid email address".to_owned(),
            Self::Auth(AuthError::NotSignedIn) => "Please login first".to_owned(),
            Self::Config(err) => err.to_string(),
            Self::Cart(err) => err.to_string(),
            Self::Auth(err) => err.to_string(),
            Self::Checkout(err) => err.to_string(),
            Self::Listing(err) => err.to_string(),
            Self::Submit(err) => err.to_string(),
            Self::NotFound(what) => format!("{what} was not found"),
            Self::BadRequest(msg) => msg.clone(),
        }
    }

    /// Whether this error points at a defect or an outage rather than user input.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        match self {
            Self::Storage(_) | Self::Config(_) => true,
            Self::Api(err)
            | Self::Auth(AuthError::Api(err))
            | Self::Submit(SubmitError::Api(err)) => {
                !matches!(err, ApiError::Http { .. } | ApiError::Rejected(_))
            }
            _ => false,
        }
    }

    /// Capture internal errors to Sentry. User-input errors are only logged.
    pub fn report(&self) {
        if self.is_internal() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::debug!(error = %self, "Operation rejected");
        }
    }
}

fn api_message(err: &ApiError) -> String {
    match err {
        ApiError::Network(_) => {
            "Unable to connect to server. Please check your connection.".to_owned()
        }
        ApiError::Http { message, .. } | ApiError::Rejected(message) => message.clone(),
        ApiError::Parse(_) | ApiError::InvalidHeader => GENERIC_MESSAGE.to_owned(),
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &str, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_owned()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added to cart", Some(&[("product_id", "123")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_owned()),
        message: Some(message.to_owned()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_owned(),
                serde_json::Value::String((*value).to_owned()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
