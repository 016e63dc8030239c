//! Business logic services for the storefront.
//!
//! Services pair the [`ApiClient`](crate::api::ApiClient) with the stores and
//! only mutate a store after the backend has accepted the request.
//!
//! # Services
//!
//! - `auth` - Login, signup, logout, profile refresh
//! - `listing` - Seller product listings

pub mod auth;
pub mod listing;

pub use auth::{AuthError, AuthService};
pub use listing::{ListingService, SubmitError};
