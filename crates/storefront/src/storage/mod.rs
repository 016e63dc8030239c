//! Persistence capability.
//!
//! Both stores persist through the [`Storage`] trait: a tiny string key-value
//! interface modelled on the browser's origin-scoped storage. Values are
//! JSON-encoded by the stores; the storage layer never interprets them.
//!
//! # Backends
//!
//! - [`MemoryStorage`] - in-process map, optional byte quota (tests, ephemeral sessions)
//! - [`FileStorage`] - one JSON document on disk, written through on every change

mod file;
mod memory;

pub use file::FileStorage;
pub use memory::MemoryStorage;

use thiserror::Error;

/// Errors raised by a storage backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading or writing the backing file failed.
    #[error("storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The backing document could not be encoded.
    #[error("storage encoding error: {0}")]
    Serialize(#[from] serde_json::Error),

    /// Writing the value would exceed the backend's capacity.
    #[error("storage quota exceeded writing '{key}' ({needed} bytes needed, {quota} allowed)")]
    QuotaExceeded {
        /// Key being written.
        key: String,
        /// Total bytes the namespace would occupy after the write.
        needed: usize,
        /// Configured capacity in bytes.
        quota: usize,
    },

    /// A previous writer panicked while holding the storage lock.
    #[error("storage lock poisoned")]
    Poisoned,
}

/// A string key-value store scoped to one namespace.
///
/// Each call is atomic from the caller's point of view: a failed `set` leaves
/// the previous value in place.
pub trait Storage: Send + Sync {
    /// Read the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be read.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the write fails or exceeds the quota.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Delete `key`. Removing an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the backend cannot be written.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Persistence keys shared by the stores.
pub mod keys {
    /// JSON array of cart lines.
    pub const CART: &str = "cart";

    /// Bearer credential of the authenticated account.
    pub const TOKEN: &str = "token";

    /// Seller profile, present only while a seller is signed in.
    pub const SELLER: &str = "seller";

    /// Buyer profile, present only while a buyer is signed in.
    pub const BUYER: &str = "buyer";

    /// Every key that carries identity data.
    pub const IDENTITY: [&str; 3] = [TOKEN, SELLER, BUYER];
}
