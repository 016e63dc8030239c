//! Application state shared across views.

use std::sync::Arc;

use crate::api::{ApiClient, ApiError};
use crate::config::StorefrontConfig;
use crate::services::{AuthService, ListingService};
use crate::storage::{FileStorage, Storage, StorageError};
use crate::stores::{CartStore, SessionStore};

/// Error creating the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("could not open storage: {0}")]
    Storage(#[from] StorageError),
    #[error("could not build API client: {0}")]
    Api(#[from] ApiError),
}

/// Application state shared across all views.
///
/// This struct is cheaply cloneable via `Arc`. Every clone sees the same cart
/// and session, so a change made through one view is observed by all others.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    storage: Arc<dyn Storage>,
    cart: CartStore,
    session: SessionStore,
    api: ApiClient,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("config", &self.inner.config)
            .field("cart", &self.inner.cart)
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Create the application state over file-backed storage at
    /// `config.storage_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage file cannot be opened or the HTTP
    /// client cannot be built.
    pub fn new(config: StorefrontConfig) -> Result<Self, StateError> {
        let storage = Arc::new(FileStorage::open(&config.storage_path)?);
        Self::with_storage(config, storage)
    }

    /// Create the application state over an existing storage backend.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_storage(
        config: StorefrontConfig,
        storage: Arc<dyn Storage>,
    ) -> Result<Self, StateError> {
        let api = ApiClient::new(&config)?;
        let cart = CartStore::load(Arc::clone(&storage));
        let session = SessionStore::load(Arc::clone(&storage));

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                storage,
                cart,
                session,
                api,
            }),
        })
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn storage(&self) -> &Arc<dyn Storage> {
        &self.inner.storage
    }

    /// Get a reference to the shared cart.
    #[must_use]
    pub fn cart(&self) -> &CartStore {
        &self.inner.cart
    }

    /// Get a reference to the shared session.
    #[must_use]
    pub fn session(&self) -> &SessionStore {
        &self.inner.session
    }

    /// Get a reference to the backend API client.
    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    /// Authentication service bound to this state.
    #[must_use]
    pub fn auth(&self) -> AuthService<'_> {
        AuthService::new(&self.inner.api, &self.inner.session)
    }

    /// Listing service bound to this state.
    #[must_use]
    pub fn listings(&self) -> ListingService<'_> {
        ListingService::new(&self.inner.api, &self.inner.session)
    }
}
