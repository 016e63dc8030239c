//! Account roles.

use core::fmt;

use serde::{Deserialize, Serialize};

/// The identity type of an authenticated account.
///
/// Buyers and sellers authenticate against different backend endpoints and
/// are persisted under different storage slots. The role is always supplied
/// explicitly; it is never inferred from which fields a profile happens to carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A shopper.
    Buyer,
    /// A merchant listing products.
    Seller,
}

impl Role {
    /// Both roles, in a stable order.
    pub const ALL: [Self; 2] = [Self::Buyer, Self::Seller];

    /// Lowercase name, also used as the JSON field prefix (`seller_email`).
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Buyer => "buyer",
            Self::Seller => "seller",
        }
    }

    /// The other role.
    #[must_use]
    pub const fn other(self) -> Self {
        match self {
            Self::Buyer => Self::Seller,
            Self::Seller => Self::Buyer,
        }
    }

    /// Prefix a form field with the role name (`email` becomes `buyer_email`).
    #[must_use]
    pub fn field(self, name: &str) -> String {
        format!("{}_{name}", self.as_str())
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = UnknownRole;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "buyer" => Ok(Self::Buyer),
            "seller" => Ok(Self::Seller),
            _ => Err(UnknownRole(s.to_owned())),
        }
    }
}

/// Returned when a string names neither role.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("unknown role '{0}' (expected buyer or seller)")]
pub struct UnknownRole(pub String);
