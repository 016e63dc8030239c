//! Seller listing service.

use thiserror::Error;
use tracing::instrument;

use crate::api::{ApiClient, ApiError};
use crate::binding::Observable;
use crate::models::listing::{ListingError, ListingForm, ListingImage};
use crate::models::session::{SellerAccess, Session};
use crate::stores::SessionStore;

/// Errors that can occur when publishing a listing.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Nobody is signed in.
    #[error("Please login as a seller to list products")]
    LoginRequired,

    /// Signed in as a buyer.
    #[error("A seller account is required to list products")]
    SellerAccountRequired,

    /// The form failed validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ListingError),

    /// The backend rejected the listing.
    #[error("Failed to create product: {0}")]
    Api(#[from] ApiError),
}

/// Publishes seller listings on behalf of the signed-in seller.
pub struct ListingService<'a> {
    api: &'a ApiClient,
    session: &'a SessionStore,
}

impl<'a> ListingService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a SessionStore) -> Self {
        Self { api, session }
    }

    /// Validate and publish `form`. Returns the backend's confirmation message.
    ///
    /// # Errors
    ///
    /// `LoginRequired` / `SellerAccountRequired` unless a seller is signed in,
    /// `Invalid` with every form problem, or `Api` if the request fails.
    #[instrument(skip(self, form, images), fields(title = %form.title))]
    pub async fn submit(
        &self,
        form: &ListingForm,
        images: &[ListingImage],
    ) -> Result<String, SubmitError> {
        let session = self.session.snapshot();
        let auth = match (session.seller_access(), &session) {
            (SellerAccess::Granted, Session::Authenticated(auth)) => auth,
            (SellerAccess::SellerAccountRequired, _) => {
                return Err(SubmitError::SellerAccountRequired);
            }
            _ => return Err(SubmitError::LoginRequired),
        };

        form.validate(images)?;

        let message = self
            .api
            .create_listing(auth.token(), form, &auth.user().id, images)
            .await?;
        tracing::info!("Listing published");
        Ok(message)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use secrecy::SecretString;
    use suturahub_core::Role;

    use super::*;
    use crate::config::StorefrontConfig;
    use crate::models::session::UserRecord;
    use crate::storage::MemoryStorage;

    fn fixtures() -> (ApiClient, SessionStore) {
        let config = StorefrontConfig::for_api_base("http://127.0.0.1:9").unwrap();
        let api = ApiClient::new(&config).unwrap();
        let session = SessionStore::load(Arc::new(MemoryStorage::new()));
        (api, session)
    }

    fn sign_in(session: &SessionStore, role: Role) {
        let user = serde_json::from_value::<UserRecord>(serde_json::json!({
            "id": 8, "email": "seller@example.com",
        }))
        .unwrap()
        .with_role(role);
        session.login(SecretString::from("tok"), user).unwrap();
    }

    #[tokio::test]
    async fn test_requires_login() {
        let (api, session) = fixtures();
        let result = ListingService::new(&api, &session)
            .submit(&ListingForm::default(), &[])
            .await;
        assert!(matches!(result, Err(SubmitError::LoginRequired)));
    }

    #[tokio::test]
    async fn test_buyers_cannot_list() {
        let (api, session) = fixtures();
        sign_in(&session, Role::Buyer);
        let result = ListingService::new(&api, &session)
            .submit(&ListingForm::default(), &[])
            .await;
        assert!(matches!(result, Err(SubmitError::SellerAccountRequired)));
    }

    #[tokio::test]
    async fn test_invalid_form_is_not_sent() {
        let (api, session) = fixtures();
        sign_in(&session, Role::Seller);
        let result = ListingService::new(&api, &session)
            .submit(&ListingForm::default(), &[])
            .await;
        assert!(matches!(
            result,
            Err(SubmitError::Invalid(ListingError::Invalid(_)))
        ));
    }
}
