//! Shared, observable application state.
//!
//! Each store owns one piece of state, writes it through to [`Storage`] on
//! every change, and notifies subscribers afterwards.
//!
//! [`Storage`]: crate::storage::Storage

pub mod cart;
pub mod session;

pub use cart::CartStore;
pub use session::{SessionError, SessionStore};
