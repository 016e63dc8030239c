//! Session-related types.
//!
//! A session is either fully present (token plus user profile) or fully
//! absent. There is no representation for a token without a user or a user
//! without a token.

use secrecy::{ExposeSecret, SecretString};
use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use suturahub_core::{Email, Role, UserId};

/// A user as returned by the backend's auth endpoints.
///
/// Seller and buyer payloads name their fields differently and some send the
/// same field under several names. Each field is read from the first non-null
/// of its names, in the order listed in `ID_KEYS`, `NAME_KEYS` and
/// `EMAIL_KEYS`; the other names are dropped. Fields the client does not model are kept in `extra` so
/// they survive a persistence round-trip. A `userType` field is dropped, since
/// the role always comes from how the user authenticated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>")]
pub struct UserRecord {
    /// Account id.
    pub id: UserId,
    /// Display name.
    pub name: String,
    /// Account email.
    pub email: Email,
    /// Remaining profile fields (phone, location, ...).
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Names the account id arrives under, most preferred first.
const ID_KEYS: [&str; 4] = ["id", "_id", "sellerId", "buyerId"];
/// Names the display name arrives under, most preferred first.
const NAME_KEYS: [&str; 3] = ["name", "seller_name", "buyer_name"];
/// Names the email arrives under, most preferred first.
const EMAIL_KEYS: [&str; 3] = ["email", "seller_email", "buyer_email"];

impl TryFrom<Map<String, Value>> for UserRecord {
    type Error = serde_json::Error;

    fn try_from(mut fields: Map<String, Value>) -> Result<Self, Self::Error> {
        let id = take_first(&mut fields, &ID_KEYS)
            .ok_or_else(|| serde_json::Error::missing_field("id"))?;
        let name = take_first(&mut fields, &NAME_KEYS);
        let email = take_first(&mut fields, &EMAIL_KEYS)
            .ok_or_else(|| serde_json::Error::missing_field("email"))?;
        fields.remove("userType");

        Ok(Self {
            id: serde_json::from_value(id)?,
            name: name.map(serde_json::from_value).transpose()?.unwrap_or_default(),
            email: serde_json::from_value(email)?,
            extra: fields,
        })
    }
}

/// Remove every key in `keys` and return the first non-null value.
fn take_first(fields: &mut Map<String, Value>, keys: &[&str]) -> Option<Value> {
    keys.iter()
        .filter_map(|key| fields.remove(*key))
        .fold(None, |found, value| found.or_else(|| (!value.is_null()).then_some(value)))
}

impl UserRecord {
    /// Attach the role the caller authenticated as.
    #[must_use]
    pub fn with_role(self, role: Role) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name,
            email: self.email,
            role,
            extra: self.extra,
        }
    }
}

/// A user profile with an explicit role, as held by an authenticated session.
///
/// Persisted under the role's storage slot with the role written as `userType`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    /// Account id.
    pub id: UserId,
    /// Display name.
    #[serde(default)]
    pub name: String,
    /// Account email.
    pub email: Email,
    /// Buyer or seller.
    #[serde(rename = "userType")]
    pub role: Role,
    /// Remaining profile fields.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Token and profile of a signed-in account.
#[derive(Debug, Clone)]
pub struct AuthenticatedSession {
    token: SecretString,
    user: UserProfile,
}

impl AuthenticatedSession {
    pub(crate) const fn new(token: SecretString, user: UserProfile) -> Self {
        Self { token, user }
    }

    /// Bearer credential for API calls.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// The signed-in user.
    #[must_use]
    pub const fn user(&self) -> &UserProfile {
        &self.user
    }
}

/// The current authentication identity, if any.
#[derive(Debug, Clone, Default)]
pub enum Session {
    /// Nobody is signed in.
    #[default]
    Anonymous,
    /// A buyer or seller is signed in.
    Authenticated(AuthenticatedSession),
}

impl Session {
    /// True when signed in with a non-empty token.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self, Self::Authenticated(auth) if !auth.token.expose_secret().is_empty())
    }

    /// The signed-in user, if any.
    #[must_use]
    pub const fn user(&self) -> Option<&UserProfile> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(auth) => Some(&auth.user),
        }
    }

    /// The bearer token, if any.
    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        match self {
            Self::Anonymous => None,
            Self::Authenticated(auth) => Some(&auth.token),
        }
    }

    /// Role of the signed-in user, if any.
    #[must_use]
    pub fn role(&self) -> Option<Role> {
        self.user().map(|user| user.role)
    }

    /// Signed in as a seller.
    #[must_use]
    pub fn is_seller(&self) -> bool {
        self.is_authenticated() && self.role() == Some(Role::Seller)
    }

    /// Signed in as a buyer.
    #[must_use]
    pub fn is_buyer(&self) -> bool {
        self.is_authenticated() && self.role() == Some(Role::Buyer)
    }

    /// Whether seller-only screens may be shown.
    #[must_use]
    pub fn seller_access(&self) -> SellerAccess {
        if !self.is_authenticated() {
            SellerAccess::LoginRequired
        } else if self.is_seller() {
            SellerAccess::Granted
        } else {
            SellerAccess::SellerAccountRequired
        }
    }
}

/// Outcome of gating a seller-only screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SellerAccess {
    /// Signed in as a seller.
    Granted,
    /// Nobody is signed in; prompt for seller login or registration.
    LoginRequired,
    /// Signed in as a buyer; a seller account is needed.
    SellerAccountRequired,
}
