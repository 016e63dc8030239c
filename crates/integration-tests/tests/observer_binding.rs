//! Integration tests for view bindings over the application state.
//!
//! A "view" here is any closure subscribed to a store; the tests record what
//! each one receives.

#![allow(clippy::unwrap_used)]

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use secrecy::SecretString;

use suturahub_core::{Email, ProductId, Role, UserId};
use suturahub_storefront::binding::Observable;
use suturahub_storefront::config::StorefrontConfig;
use suturahub_storefront::models::{NoticeKind, ProductInput, UserProfile};
use suturahub_storefront::state::AppState;
use suturahub_storefront::storage::MemoryStorage;

fn state() -> AppState {
    let config = StorefrontConfig::for_api_base("http://127.0.0.1:9").unwrap();
    AppState::with_storage(config, Arc::new(MemoryStorage::new())).unwrap()
}

fn product(id: &str, price: &str) -> ProductInput {
    ProductInput::new(id, format!("Item {id}"), price.parse::<Decimal>().unwrap())
}

fn seller() -> UserProfile {
    UserProfile {
        id: UserId::parse("s-1").unwrap(),
        name: "Kofi".to_owned(),
        email: Email::parse("kofi@example.com").unwrap(),
        role: Role::Seller,
        extra: serde_json::Map::new(),
    }
}

#[test]
fn test_cart_badge_tracks_item_count() {
    let state = state();
    let badge = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&badge);
    state
        .cart()
        .subscribe(move |cart| sink.lock().unwrap().push(cart.item_count()));

    state.cart().add_item(product("p1", "10")).unwrap();
    state.cart().add_item(product("p1", "10")).unwrap();
    state
        .cart()
        .set_quantity(&ProductId::parse("p1").unwrap(), 5);
    state.cart().clear();

    assert_eq!(*badge.lock().unwrap(), vec![0, 1, 2, 5, 0]);
}

#[test]
fn test_views_on_cloned_state_share_one_cart() {
    let state = state();
    let other = state.clone();
    let seen = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&seen);
    other
        .cart()
        .subscribe(move |cart| sink.lock().unwrap().push(cart.total()));

    state.cart().add_item(product("p1", "12.50")).unwrap();

    assert_eq!(
        *seen.lock().unwrap(),
        vec![Decimal::ZERO, "12.50".parse::<Decimal>().unwrap()]
    );
}

#[test]
fn test_unsubscribed_view_stops_receiving() {
    let state = state();
    let calls = Arc::new(Mutex::new(0_u32));

    let sink = Arc::clone(&calls);
    let id = state
        .cart()
        .subscribe(move |_| *sink.lock().unwrap() += 1);
    state.cart().add_item(product("p1", "1")).unwrap();
    assert!(state.cart().unsubscribe(id));
    state.cart().add_item(product("p2", "1")).unwrap();

    assert_eq!(*calls.lock().unwrap(), 2);
    assert!(!state.cart().unsubscribe(id));
}

#[test]
fn test_panicking_view_does_not_starve_others() {
    let state = state();
    let seen = Arc::new(Mutex::new(Vec::new()));

    state.cart().subscribe(|cart| {
        assert!(cart.is_empty(), "view failed to render");
    });
    let sink = Arc::clone(&seen);
    state
        .cart()
        .subscribe(move |cart| sink.lock().unwrap().push(cart.distinct_lines()));

    state.cart().add_item(product("p1", "3")).unwrap();

    assert_eq!(*seen.lock().unwrap(), vec![0, 1]);
    assert_eq!(state.cart().item_count(), 1);
}

#[test]
fn test_header_follows_session_changes() {
    let state = state();
    let header = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&header);
    state.session().subscribe(move |session| {
        let label = session
            .user()
            .map_or_else(|| "Login".to_owned(), |user| user.name.clone());
        sink.lock().unwrap().push(label);
    });

    state
        .session()
        .login(SecretString::from("tok".to_owned()), seller())
        .unwrap();
    assert!(state.session().logout());
    assert!(!state.session().logout());

    assert_eq!(*header.lock().unwrap(), ["Login", "Kofi", "Login"]);
}

#[test]
fn test_notices_accompany_cart_changes() {
    let state = state();
    let kinds = Arc::new(Mutex::new(Vec::new()));

    let sink = Arc::clone(&kinds);
    state
        .cart()
        .subscribe_notices(move |notice| sink.lock().unwrap().push(notice.kind));

    state.cart().add_item(product("p1", "4")).unwrap();
    state.cart().add_item(product("p1", "4")).unwrap();
    state.cart().remove_item(&ProductId::parse("p1").unwrap());
    state.cart().clear();

    assert_eq!(
        *kinds.lock().unwrap(),
        vec![
            NoticeKind::Added,
            NoticeKind::QuantityUpdated,
            NoticeKind::Removed,
            NoticeKind::Cleared
        ]
    );
}

#[test]
fn test_view_that_edits_cart_leaves_other_views_current() {
    let state = state();
    let badge = Arc::new(Mutex::new(Vec::new()));

    // A "minimum order" view that bumps any single unit to two.
    let editor = state.clone();
    state.cart().subscribe(move |cart| {
        let p1 = ProductId::parse("p1").unwrap();
        if cart.get(&p1).is_some_and(|line| line.quantity == 1) {
            editor.cart().set_quantity(&p1, 2);
        }
    });
    let sink = Arc::clone(&badge);
    state
        .cart()
        .subscribe(move |cart| sink.lock().unwrap().push(cart.item_count()));

    state.cart().add_item(product("p1", "10")).unwrap();

    assert_eq!(*badge.lock().unwrap(), vec![0, 1, 2]);
    assert_eq!(badge.lock().unwrap().last().copied(), Some(state.cart().item_count()));
}
