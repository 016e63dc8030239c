//! Integration tests for session persistence across restarts.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::{Value, json};
use tempfile::TempDir;

use suturahub_core::{Email, Role, UserId};
use suturahub_storefront::binding::Observable;
use suturahub_storefront::models::{SellerAccess, UserProfile};
use suturahub_storefront::storage::{FileStorage, Storage, keys};
use suturahub_storefront::stores::{SessionError, SessionStore};

fn open(dir: &TempDir) -> Arc<dyn Storage> {
    Arc::new(FileStorage::open(dir.path().join("state.json")).unwrap())
}

fn profile(role: Role) -> UserProfile {
    let mut extra = serde_json::Map::new();
    extra.insert("location".to_owned(), json!("Kumasi"));
    UserProfile {
        id: UserId::parse("u-42").unwrap(),
        name: "Ama Owusu".to_owned(),
        email: Email::parse("ama@example.com").unwrap(),
        role,
        extra,
    }
}

fn token(raw: &str) -> SecretString {
    SecretString::from(raw.to_owned())
}

// ============================================================================
// Restore Tests
// ============================================================================

#[test]
fn test_seller_session_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let session = SessionStore::load(open(&dir));
        session.login(token("tok-1"), profile(Role::Seller)).unwrap();
    }

    let session = SessionStore::load(open(&dir));
    assert!(session.is_authenticated());
    assert!(session.is_seller());
    assert_eq!(session.token().unwrap().expose_secret(), "tok-1");

    let user = session.user().unwrap();
    assert_eq!(user, profile(Role::Seller));
    assert_eq!(user.extra["location"], "Kumasi");
}

#[test]
fn test_switching_role_replaces_slot() {
    let dir = TempDir::new().unwrap();
    let storage = open(&dir);
    let session = SessionStore::load(Arc::clone(&storage));

    session.login(token("tok-1"), profile(Role::Seller)).unwrap();
    session.login(token("tok-2"), profile(Role::Buyer)).unwrap();

    assert_eq!(storage.get(keys::SELLER).unwrap(), None);
    let buyer: Value = serde_json::from_str(&storage.get(keys::BUYER).unwrap().unwrap()).unwrap();
    assert_eq!(buyer["userType"], "buyer");

    let restored = SessionStore::load(open(&dir));
    assert!(restored.is_buyer());
    assert_eq!(restored.token().unwrap().expose_secret(), "tok-2");
}

#[test]
fn test_logout_survives_restart() {
    let dir = TempDir::new().unwrap();

    {
        let session = SessionStore::load(open(&dir));
        session.login(token("tok-1"), profile(Role::Buyer)).unwrap();
        assert!(session.logout());
    }

    let storage = open(&dir);
    for key in keys::IDENTITY {
        assert_eq!(storage.get(key).unwrap(), None, "{key} should be gone");
    }
    assert!(!SessionStore::load(storage).is_authenticated());
}

// ============================================================================
// Recovery Tests
// ============================================================================

#[test]
fn test_half_written_session_is_discarded_on_disk() {
    let dir = TempDir::new().unwrap();

    {
        let storage = open(&dir);
        storage.set(keys::TOKEN, "tok-1").unwrap();
        storage.set(keys::CART, "[]").unwrap();
    }

    let session = SessionStore::load(open(&dir));
    assert!(!session.is_authenticated());

    let storage = open(&dir);
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::CART).unwrap().as_deref(), Some("[]"));
}

#[test]
fn test_slot_decides_role_over_stored_user_type() {
    let dir = TempDir::new().unwrap();
    let storage = open(&dir);
    storage.set(keys::TOKEN, "tok-1").unwrap();
    storage
        .set(
            keys::BUYER,
            &json!({
                "id": "u-42",
                "name": "Ama Owusu",
                "email": "ama@example.com",
                "userType": "seller"
            })
            .to_string(),
        )
        .unwrap();

    let session = SessionStore::load(storage);
    assert!(session.is_buyer());
    assert_eq!(session.snapshot().seller_access(), SellerAccess::SellerAccountRequired);
}

#[test]
fn test_blank_token_keeps_previous_session() {
    let dir = TempDir::new().unwrap();
    let session = SessionStore::load(open(&dir));
    session.login(token("tok-1"), profile(Role::Seller)).unwrap();

    let err = session.login(token("  "), profile(Role::Buyer)).unwrap_err();
    assert!(matches!(err, SessionError::EmptyToken));

    let restored = SessionStore::load(open(&dir));
    assert!(restored.is_seller());
}
