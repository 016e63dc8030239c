//! SuturaHub storefront client library.
//!
//! The client-side state engine behind the SuturaHub marketplace: a persisted,
//! observable shopping cart and authentication session, plus the catalog,
//! checkout, and seller-listing logic and the REST client they talk to.
//!
//! Front ends build one [`state::AppState`] and hand clones of it to every
//! view.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod binding;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod state;
pub mod storage;
pub mod stores;
