//! Integration tests for the SuturaHub client.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p suturahub-integration-tests
//! ```
//!
//! No external services are needed. Tests that talk to the backend start a
//! fake API on a random local port.
//!
//! # Test Categories
//!
//! - `cart_persistence` - Cart store over file storage, reloads, legacy documents
//! - `session_lifecycle` - Login, restore, corruption recovery, logout
//! - `observer_binding` - Subscriber delivery across both stores
//! - `api_services` - Auth, catalog and listing flows against the fake backend

#![cfg_attr(not(test), forbid(unsafe_code))]
