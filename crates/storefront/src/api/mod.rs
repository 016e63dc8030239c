//! SuturaHub REST API client.
//!
//! Every endpoint lives under `<api_base>/api/`. Failed responses carry a JSON
//! body with a `message` field; when the body has none, the error text is
//! `HTTP error! status: <code>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use suturahub_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config)?;
//! let products = client.products().await?;
//! ```

mod requests;

pub use requests::{LoginResponse, SignupError, SignupForm};

use std::sync::Arc;

use reqwest::header::{AUTHORIZATION, HeaderValue};
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

use suturahub_core::{Email, Role, UserId};

use crate::catalog::CatalogProduct;
use crate::config::StorefrontConfig;
use crate::models::listing::{ListingForm, ListingImage};
use crate::models::session::UserRecord;

/// Errors that can occur when talking to the backend.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request could not be sent or the response could not be read.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("HTTP {status}: {message}")]
    Http { status: u16, message: String },

    /// The backend answered `success: false`.
    #[error("Request rejected: {0}")]
    Rejected(String),

    /// The response body did not have the expected shape.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The bearer token cannot be sent as a header value.
    #[error("Invalid authorization header")]
    InvalidHeader,
}

/// Client for the SuturaHub backend.
///
/// Cheap to clone; clones share one connection pool.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    origin: Url,
    endpoint: Url,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("endpoint", &self.inner.endpoint.as_str())
            .finish_non_exhaustive()
    }
}

#[derive(Deserialize)]
struct MessageBody {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Deserialize)]
struct ProductsBody {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    products: Vec<serde_json::Value>,
}

impl ApiClient {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &StorefrontConfig) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(concat!("suturahub-storefront/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let origin = config.api_base.clone();
        let endpoint = origin
            .join("api/")
            .map_err(|e| ApiError::Parse(format!("invalid API base: {e}")))?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                origin,
                endpoint,
            }),
        })
    }

    /// Backend origin, used to resolve relative image paths.
    #[must_use]
    pub fn origin(&self) -> &Url {
        &self.inner.origin
    }

    // =========================================================================
    // Auth
    // =========================================================================

    /// Sign in as `role`.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` with the backend's message for rejected
    /// credentials, or `ApiError::Parse` if the response lacks a token or user.
    #[instrument(skip(self, password), fields(role = %role))]
    pub async fn login(
        &self,
        role: Role,
        email: &Email,
        password: &SecretString,
    ) -> Result<LoginResponse, ApiError> {
        let body = requests::credentials_body(role, email, password);
        let request = self.inner.client.post(self.url(login_path(role))?).json(&body);
        let response: serde_json::Value = self.send(request).await?;
        LoginResponse::from_value(role, response)
    }

    /// Register a new `role` account. Returns the backend's success message.
    ///
    /// The form is expected to have passed [`SignupForm::validate`].
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` with the backend's message on failure.
    #[instrument(skip(self, form), fields(role = %role))]
    pub async fn signup(&self, role: Role, form: &SignupForm) -> Result<String, ApiError> {
        let request = self
            .inner
            .client
            .post(self.url(signup_path(role))?)
            .json(&form.body(role));
        let response: MessageBody = self.send(request).await?;
        Ok(response
            .message
            .unwrap_or_else(|| "Account created successfully".to_owned()))
    }

    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Http` if the token is rejected.
    #[instrument(skip(self, token))]
    pub async fn profile(&self, token: &SecretString) -> Result<UserRecord, ApiError> {
        let request = self
            .inner
            .client
            .get(self.url("auth/profile")?)
            .header(AUTHORIZATION, bearer(token)?);
        let response: serde_json::Value = self.send(request).await?;
        requests::profile_from_value(response)
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Fetch the full product catalog.
    ///
    /// Products that cannot be decoded are logged and left out; one bad
    /// listing does not hide the rest of the catalog.
    ///
    /// # Errors
    ///
    /// Returns `ApiError::Rejected` if the backend reports `success: false`.
    #[instrument(skip(self))]
    pub async fn products(&self) -> Result<Vec<CatalogProduct>, ApiError> {
        let request = self.inner.client.get(self.url("products")?);
        let body: ProductsBody = self.send(request).await?;
        if !body.success {
            return Err(ApiError::Rejected(
                body.message
                    .unwrap_or_else(|| "Failed to fetch products".to_owned()),
            ));
        }
        let products = decode_products(body.products);
        debug!(count = products.len(), "Fetched products");
        Ok(products)
    }

    /// Publish a seller listing with its images.
    ///
    /// # Errors
    ///
    /// Returns `ApiError` if encoding or the request fails.
    #[instrument(skip(self, token, form, images), fields(seller_id = %seller_id, images = images.len()))]
    pub async fn create_listing(
        &self,
        token: &SecretString,
        form: &ListingForm,
        seller_id: &UserId,
        images: &[ListingImage],
    ) -> Result<String, ApiError> {
        let fields = form
            .multipart_fields(seller_id)
            .map_err(|e| ApiError::Parse(e.to_string()))?;

        let mut multipart = Form::new();
        for (name, value) in fields {
            multipart = multipart.text(name, value);
        }
        for image in images {
            let part = Part::bytes(image.bytes.clone())
                .file_name(image.file_name.clone())
                .mime_str(&image.content_type)?;
            multipart = multipart.part("images", part);
        }

        let request = self
            .inner
            .client
            .post(self.url("products/create")?)
            .header(AUTHORIZATION, bearer(token)?)
            .multipart(multipart);
        let response: MessageBody = self.send(request).await?;
        Ok(response
            .message
            .unwrap_or_else(|| "Product created successfully".to_owned()))
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .endpoint
            .join(path)
            .map_err(|e| ApiError::Parse(format!("invalid endpoint '{path}': {e}")))
    }

    /// Send a request and decode its JSON body.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = error_message(status.as_u16(), &text);
            tracing::warn!(status = %status, message = %message, "Backend returned an error");
            return Err(ApiError::Http {
                status: status.as_u16(),
                message,
            });
        }

        serde_json::from_str(&text).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %text.chars().take(500).collect::<String>(),
                "Failed to parse backend response"
            );
            ApiError::Parse(e.to_string())
        })
    }
}

const fn login_path(role: Role) -> &'static str {
    match role {
        Role::Seller => "auth/login",
        Role::Buyer => "auth/buyer/login",
    }
}

const fn signup_path(role: Role) -> &'static str {
    match role {
        Role::Seller => "auth/signup",
        Role::Buyer => "auth/buyer/signup",
    }
}

fn bearer(token: &SecretString) -> Result<HeaderValue, ApiError> {
    let mut value = HeaderValue::from_str(&format!("Bearer {}", token.expose_secret()))
        .map_err(|_| ApiError::InvalidHeader)?;
    value.set_sensitive(true);
    Ok(value)
}

/// Decode catalog entries one by one, skipping those that do not parse.
fn decode_products(records: Vec<serde_json::Value>) -> Vec<CatalogProduct> {
    records
        .into_iter()
        .enumerate()
        .filter_map(|(index, record)| {
            serde_json::from_value(record)
                .inspect_err(|e| warn!(index, error = %e, "Skipping unreadable product"))
                .ok()
        })
        .collect()
}

/// The user-facing message for a failed response.
fn error_message(status: u16, body: &str) -> String {
    serde_json::from_str::<MessageBody>(body)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.trim().is_empty())
        .unwrap_or_else(|| format!("HTTP error! status: {status}"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_error_message_prefers_backend_text() {
        assert_eq!(
            error_message(401, r#"{"message":"Invalid credentials"}"#),
            "Invalid credentials"
        );
    }

    #[test]
    fn test_error_message_fallback() {
        assert_eq!(error_message(502, "<html>Bad Gateway</html>"), "HTTP error! status: 502");
        assert_eq!(error_message(500, r#"{"error":"boom"}"#), "HTTP error! status: 500");
        assert_eq!(error_message(500, r#"{"message":""}"#), "HTTP error! status: 500");
    }

    #[test]
    fn test_role_paths() {
        assert_eq!(login_path(Role::Seller), "auth/login");
        assert_eq!(login_path(Role::Buyer), "auth/buyer/login");
        assert_eq!(signup_path(Role::Seller), "auth/signup");
        assert_eq!(signup_path(Role::Buyer), "auth/buyer/signup");
    }

    #[test]
    fn test_endpoint_resolution() {
        let config = StorefrontConfig::for_api_base("http://localhost:5000").unwrap();
        let client = ApiClient::new(&config).unwrap();
        assert_eq!(
            client.url(login_path(Role::Buyer)).unwrap().as_str(),
            "http://localhost:5000/api/auth/buyer/login"
        );
        assert_eq!(client.origin().as_str(), "http://localhost:5000/");
    }

    #[test]
    fn test_bearer_is_sensitive() {
        let value = bearer(&SecretString::from("abc")).unwrap();
        assert!(value.is_sensitive());
        assert_eq!(value.to_str().unwrap(), "Bearer abc");

        assert!(matches!(
            bearer(&SecretString::from("bad\ntoken")),
            Err(ApiError::InvalidHeader)
        ));
    }

    #[test]
    fn test_unreadable_products_are_skipped() {
        let records = vec![
            serde_json::json!({ "id": 1, "title": "Kente Wrap", "price": "200" }),
            serde_json::json!({ "id": 2, "title": "No price", "price": null }),
            serde_json::json!({ "id": 3, "title": "Negative", "price": -5 }),
            serde_json::json!("not an object"),
            serde_json::json!({ "id": "4", "name": "Smock", "price": 85 }),
        ];

        let products = decode_products(records);
        let ids: Vec<&str> = products.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["1", "4"]);
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::Http {
            status: 404,
            message: "Product not found".to_owned(),
        };
        assert_eq!(err.to_string(), "HTTP 404: Product not found");
    }
}
