//! SuturaHub Core - Shared domain types.
//!
//! This crate provides the types shared by the storefront client and its
//! command-line front end:
//! - `storefront` - Cart and session state engine, API client
//! - `cli` - Terminal front end over the storefront engine
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no storage access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, prices, emails, and account roles

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
