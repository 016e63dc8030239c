//! Request bodies and response shapes for the auth endpoints.
//!
//! Seller and buyer endpoints take the same fields under role-prefixed names
//! (`seller_email` / `buyer_email`, ...).

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Map, Value, json};
use thiserror::Error;

use suturahub_core::{Email, EmailError, Role};

use super::ApiError;
use crate::models::session::UserRecord;

/// Shortest password accepted at signup.
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// `{<role>_email, <role>_password}`.
pub(super) fn credentials_body(role: Role, email: &Email, password: &SecretString) -> Value {
    let mut body = Map::new();
    body.insert(role.field("email"), json!(email.as_str()));
    body.insert(role.field("password"), json!(password.expose_secret()));
    Value::Object(body)
}

/// Errors in a signup form, caught before any request is sent.
#[derive(Debug, Error)]
pub enum SignupError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("Invalid email address: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("Passwords do not match")]
    PasswordMismatch,

    #[error("Password must be at least {min} characters long")]
    PasswordTooShort { min: usize },
}

/// Account registration details.
#[derive(Debug, Clone)]
pub struct SignupForm {
    pub full_name: String,
    pub email: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub phone: String,
    pub location: String,
}

impl SignupForm {
    /// Check the form, returning the parsed email.
    ///
    /// # Errors
    ///
    /// Returns the first problem found: a blank name, an invalid email,
    /// mismatched passwords, or a password shorter than
    /// [`MIN_PASSWORD_LENGTH`] characters.
    pub fn validate(&self) -> Result<Email, SignupError> {
        if self.full_name.trim().is_empty() {
            return Err(SignupError::MissingField("Full name"));
        }
        let email = Email::parse(&self.email)?;

        let password = self.password.expose_secret();
        if password != self.confirm_password.expose_secret() {
            return Err(SignupError::PasswordMismatch);
        }
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(SignupError::PasswordTooShort {
                min: MIN_PASSWORD_LENGTH,
            });
        }
        Ok(email)
    }

    /// Role-prefixed JSON body for the signup endpoint.
    pub(super) fn body(&self, role: Role) -> Value {
        let mut body = Map::new();
        body.insert(role.field("name"), json!(self.full_name.trim()));
        body.insert(role.field("email"), json!(self.email.trim()));
        body.insert(role.field("password"), json!(self.password.expose_secret()));
        body.insert(role.field("phone"), json!(self.phone.trim()));
        body.insert(role.field("location"), json!(self.location.trim()));
        Value::Object(body)
    }
}

/// A successful login: the bearer token and the account it belongs to.
#[derive(Debug, Clone)]
pub struct LoginResponse {
    pub token: SecretString,
    pub user: UserRecord,
}

impl LoginResponse {
    /// Read `{token, <role>: {...}}`.
    pub(super) fn from_value(role: Role, mut value: Value) -> Result<Self, ApiError> {
        let token = value
            .get("token")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(|t| SecretString::from(t.to_owned()))
            .ok_or_else(|| ApiError::Parse("login response has no token".to_owned()))?;

        let user = value
            .get_mut(role.as_str())
            .map(Value::take)
            .ok_or_else(|| ApiError::Parse(format!("login response has no {role} record")))?;
        let user = serde_json::from_value(user)
            .map_err(|e| ApiError::Parse(format!("invalid {role} record: {e}")))?;

        Ok(Self { token, user })
    }
}

/// Read a profile response: `{user: {...}}`, `{seller: {...}}`,
/// `{buyer: {...}}`, or the bare record.
pub(super) fn profile_from_value(mut value: Value) -> Result<UserRecord, ApiError> {
    let record = ["user", "seller", "buyer"]
        .into_iter()
        .find_map(|key| value.get_mut(key).filter(|v| v.is_object()).map(Value::take))
        .unwrap_or(value);

    serde_json::from_value(record).map_err(|e| ApiError::Parse(format!("invalid profile: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn form(password: &str, confirm: &str) -> SignupForm {
        SignupForm {
            full_name: "Esi Mensah".to_owned(),
            email: "esi@example.com".to_owned(),
            password: SecretString::from(password.to_owned()),
            confirm_password: SecretString::from(confirm.to_owned()),
            phone: "0201234567".to_owned(),
            location: "Accra".to_owned(),
        }
    }

    #[test]
    fn test_credentials_body_is_role_prefixed() {
        let email = Email::parse("kofi@example.com").unwrap();
        let body = credentials_body(Role::Seller, &email, &SecretString::from("pw123456"));
        assert_eq!(
            body,
            json!({"seller_email": "kofi@example.com", "seller_password": "pw123456"})
        );
    }

    #[test]
    fn test_signup_validation() {
        assert!(form("secret1", "secret1").validate().is_ok());
        assert!(matches!(
            form("secret1", "secret2").validate(),
            Err(SignupError::PasswordMismatch)
        ));
        assert!(matches!(
            form("abc", "abc").validate(),
            Err(SignupError::PasswordTooShort { min: 6 })
        ));

        let mut bad_email = form("secret1", "secret1");
        bad_email.email = "nope".to_owned();
        assert!(matches!(
            bad_email.validate(),
            Err(SignupError::InvalidEmail(_))
        ));

        let mut no_name = form("secret1", "secret1");
        no_name.full_name = " ".to_owned();
        assert_eq!(
            no_name.validate().unwrap_err().to_string(),
            "Full name is required"
        );
    }

    #[test]
    fn test_signup_body() {
        let body = form("secret1", "secret1").body(Role::Buyer);
        assert_eq!(body["buyer_name"], "Esi Mensah");
        assert_eq!(body["buyer_location"], "Accra");
        assert!(body.get("seller_name").is_none());
    }

    #[test]
    fn test_login_response_reads_role_key() {
        let response = LoginResponse::from_value(
            Role::Seller,
            json!({
                "token": "jwt-1",
                "seller": {"id": 4, "seller_name": "Abena", "seller_email": "abena@example.com"},
            }),
        )
        .unwrap();

        assert_eq!(response.token.expose_secret(), "jwt-1");
        assert_eq!(response.user.name, "Abena");
    }

    #[test]
    fn test_login_response_requires_token_and_record() {
        let no_token = LoginResponse::from_value(
            Role::Buyer,
            json!({"buyer": {"id": 1, "email": "a@b.co"}}),
        );
        assert!(matches!(no_token, Err(ApiError::Parse(_))));

        let wrong_role = LoginResponse::from_value(
            Role::Buyer,
            json!({"token": "t", "seller": {"id": 1, "email": "a@b.co"}}),
        );
        assert!(matches!(wrong_role, Err(ApiError::Parse(_))));
    }

    #[test]
    fn test_profile_shapes() {
        for value in [
            json!({"user": {"id": 1, "email": "a@b.co"}}),
            json!({"buyer": {"id": 1, "buyer_email": "a@b.co"}}),
            json!({"id": 1, "email": "a@b.co"}),
        ] {
            let record = profile_from_value(value).unwrap();
            assert_eq!(record.id.as_str(), "1");
        }
    }
}
