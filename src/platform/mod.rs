//! Platform abstraction layer
//!
//! Handles browser/native differences for the storage medium:
//! - `localStorage` / `sessionStorage` on wasm32
//! - no medium at all on native targets, unless one is injected

pub mod storage;

use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::error::StorageError;

pub use storage::MemoryStorage;
#[cfg(target_arch = "wasm32")]
pub use storage::BrowserStorage;

/// Which storage medium a persistent store targets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum StorageScope {
    /// Survives restarts (`localStorage`)
    #[default]
    Durable,
    /// Lives as long as the session (`sessionStorage`)
    Session,
}

impl StorageScope {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageScope::Durable => "durable",
            StorageScope::Session => "session",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "durable" | "local" => Some(StorageScope::Durable),
            "session" => Some(StorageScope::Session),
            _ => None,
        }
    }
}

/// Synchronous key/value store a persistent store reads from and writes to.
pub trait StorageMedium {
    /// `Ok(None)` when nothing is stored under `key`.
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError>;

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError>;

    fn remove_item(&self, key: &str) -> Result<(), StorageError>;
}

impl<S: StorageMedium + ?Sized> StorageMedium for Rc<S> {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        (**self).get_item(key)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        (**self).set_item(key, value)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        (**self).remove_item(key)
    }
}

/// Storage medium detected for `scope` (WASM only)
#[cfg(target_arch = "wasm32")]
pub fn default_storage(scope: StorageScope) -> Option<Rc<dyn StorageMedium>> {
    let storage = BrowserStorage::open(scope)?;
    Some(Rc::new(storage))
}

/// Native targets have no ambient storage medium
#[cfg(not(target_arch = "wasm32"))]
pub fn default_storage(_scope: StorageScope) -> Option<Rc<dyn StorageMedium>> {
    None
}
