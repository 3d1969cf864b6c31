//! Storage medium implementations

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::StorageMedium;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct MemoryInner {
    entries: BTreeMap<String, String>,
    /// Byte budget for keys plus values, like the browser's per-origin quota
    quota: Option<usize>,
    disabled: bool,
    writes: usize,
}

impl MemoryInner {
    fn used_without(&self, key: &str) -> usize {
        self.entries
            .iter()
            .filter(|(k, _)| k.as_str() != key)
            .map(|(k, v)| k.len() + v.len())
            .sum()
    }
}

/// In-memory storage medium.
///
/// Clones share the same entries, so a test can keep one handle for
/// inspection and hand another to the store under test.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    inner: Rc<RefCell<MemoryInner>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    /// Medium that rejects writes once keys plus values exceed `bytes`
    pub fn with_quota(bytes: usize) -> Self {
        let storage = Self::new();
        storage.inner.borrow_mut().quota = Some(bytes);
        storage
    }

    /// A disabled medium fails every call, like storage blocked by the host.
    pub fn set_enabled(&self, enabled: bool) {
        self.inner.borrow_mut().disabled = !enabled;
    }

    /// Number of successful `set_item` calls so far
    pub fn writes(&self) -> usize {
        self.inner.borrow().writes
    }

    pub fn len(&self) -> usize {
        self.inner.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.borrow().entries.is_empty()
    }
}

impl StorageMedium for MemoryStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        let inner = self.inner.borrow();
        if inner.disabled {
            return Err(StorageError::Unavailable);
        }
        Ok(inner.entries.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.disabled {
            return Err(StorageError::Unavailable);
        }
        if let Some(quota) = inner.quota {
            let needed = inner.used_without(key) + key.len() + value.len();
            if needed > quota {
                return Err(StorageError::QuotaExceeded {
                    key: key.to_string(),
                    needed,
                    quota,
                });
            }
        }
        inner.entries.insert(key.to_string(), value.to_string());
        inner.writes += 1;
        Ok(())
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        let mut inner = self.inner.borrow_mut();
        if inner.disabled {
            return Err(StorageError::Unavailable);
        }
        inner.entries.remove(key);
        Ok(())
    }
}

/// `localStorage` / `sessionStorage` (WASM only)
#[cfg(target_arch = "wasm32")]
pub struct BrowserStorage {
    storage: web_sys::Storage,
}

#[cfg(target_arch = "wasm32")]
impl BrowserStorage {
    /// Open the storage for `scope`. `None` outside a window context or when
    /// the host blocks access.
    pub fn open(scope: super::StorageScope) -> Option<Self> {
        let window = web_sys::window()?;
        let storage = match scope {
            super::StorageScope::Durable => window.local_storage(),
            super::StorageScope::Session => window.session_storage(),
        };
        storage.ok().flatten().map(|storage| Self { storage })
    }
}

#[cfg(target_arch = "wasm32")]
fn host_error(err: wasm_bindgen::JsValue) -> StorageError {
    StorageError::Host {
        message: format!("{:?}", err),
    }
}

#[cfg(target_arch = "wasm32")]
impl StorageMedium for BrowserStorage {
    fn get_item(&self, key: &str) -> Result<Option<String>, StorageError> {
        self.storage.get_item(key).map_err(host_error)
    }

    fn set_item(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.storage.set_item(key, value).map_err(host_error)
    }

    fn remove_item(&self, key: &str) -> Result<(), StorageError> {
        self.storage.remove_item(key).map_err(host_error)
    }
}
