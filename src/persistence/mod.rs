//! Store values mirrored into a storage medium
//!
//! A [`PersistentStore`] is a [`Store`] plus a storage slot. Lifecycle:
//! - Until the first [`sync`](PersistentStore::sync) nothing is written, so
//!   a transient initial value can never clobber what is already stored.
//! - The first `sync` restores the stored value, or writes the current value
//!   out as the baseline when the slot is empty.
//! - After that, every update is saved.
//!
//! Storage faults (no medium, quota, bad data) never surface: the affected
//! call degrades to a no-op.

pub mod codec;
pub mod options;

use std::cell::Cell;
use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{Result, StorageError};
use crate::platform::{self, StorageMedium, StorageScope};
use crate::store::{Store, Subscription, UpdateCallback};

pub use codec::{Codec, FnCodec, JsonCodec};
pub use options::{PersistOptions, RestoreContext};

struct PersistState<T> {
    key: String,
    scope: StorageScope,
    storage: Option<Rc<dyn StorageMedium>>,
    codec: Rc<dyn Codec<T>>,
    restore_context: RestoreContext,
    synced: Cell<bool>,
}

impl<T: Clone + 'static> PersistState<T> {
    fn medium(&self) -> Result<&dyn StorageMedium> {
        Ok(self.storage.as_deref().ok_or(StorageError::Unavailable)?)
    }

    fn read(&self, store: &Store<T>) -> Result<Option<T>> {
        let Some(raw) = self.medium()?.get_item(&self.key)? else {
            return Ok(None);
        };
        let current = match self.restore_context {
            RestoreContext::Current => Some(store.get_value()),
            RestoreContext::Detached => None,
        };
        Ok(Some(self.codec.decode(&raw, current.as_ref())?))
    }

    fn write(&self, store: &Store<T>) -> Result<()> {
        let medium = self.medium()?;
        let raw = store.with_value(|value| self.codec.encode(value))?;
        medium.set_item(&self.key, &raw)?;
        Ok(())
    }

    fn save(&self, store: &Store<T>) {
        if !self.synced.get() {
            return;
        }
        if let Err(err) = self.write(store) {
            log::trace!("save of '{}' skipped: {}", self.key, err);
        }
    }
}

/// Store whose value survives restarts through a storage medium.
///
/// Clones share the value, subscribers and sync state.
pub struct PersistentStore<T> {
    store: Store<T>,
    state: Rc<PersistState<T>>,
}

impl<T> Clone for PersistentStore<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            state: Rc::clone(&self.state),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for PersistentStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistentStore")
            .field("store", &self.store)
            .field("key", &self.state.key)
            .field("scope", &self.state.scope)
            .field("synced", &self.state.synced.get())
            .finish()
    }
}

impl<T: Serialize + DeserializeOwned + Clone + 'static> PersistentStore<T> {
    /// Persistent store for `key` in durable storage, encoded as JSON.
    ///
    /// ```
    /// use stash_store::PersistentStore;
    ///
    /// let counter = PersistentStore::new(0, "counter");
    /// counter.sync();
    /// counter.set_value(1);
    /// ```
    pub fn new(value: T, key: impl Into<String>) -> Self {
        Self::with_options(value, key, PersistOptions::default())
    }
}

impl<T: Clone + 'static> PersistentStore<T> {
    pub fn with_options(value: T, key: impl Into<String>, options: PersistOptions<T>) -> Self {
        Self::attach(Store::new(value), key, options)
    }

    /// Add persistence to an existing store. The returned handle shares the
    /// store with every other clone of it.
    pub fn attach(store: Store<T>, key: impl Into<String>, options: PersistOptions<T>) -> Self {
        let PersistOptions {
            scope,
            storage,
            codec,
            restore_context,
        } = options;
        let storage = storage.or_else(|| platform::default_storage(scope));

        let state = Rc::new(PersistState {
            key: key.into(),
            scope,
            storage,
            codec,
            restore_context,
            synced: Cell::new(false),
        });

        // The weak handle keeps the store from owning itself through its own
        // callback list.
        let weak = store.downgrade();
        let saver = Rc::clone(&state);
        store.on_update(move |_, _| {
            if !saver.synced.get() {
                return;
            }
            if let Some(store) = weak.upgrade() {
                saver.save(&store);
            }
        });

        Self { store, state }
    }

    /// Reconcile with storage.
    ///
    /// A stored value replaces the current one. An empty slot, a missing
    /// medium or undecodable data count as "not found". On the first call,
    /// "not found" writes the current value out; later calls leave storage
    /// alone.
    pub fn sync(&self) {
        let key = &self.state.key;
        let restored = match self.state.read(&self.store) {
            Ok(found) => found,
            Err(err) => {
                log::trace!("sync of '{}' found nothing usable: {}", key, err);
                None
            }
        };
        let found = restored.is_some();

        if let Some(value) = restored {
            self.store.set_value(value);
            log::debug!("restored '{}' from {} storage", key, self.state.scope.as_str());
        }

        let was_synced = self.state.synced.replace(true);
        if !was_synced && !found {
            self.save();
            log::debug!("wrote baseline for '{}'", key);
        }
    }

    /// [`sync`](Self::sync) unless a sync already happened.
    pub fn sync_once(&self) {
        if !self.state.synced.get() {
            self.sync();
        }
    }

    /// Write the current value out. No-op before the first sync or without a
    /// medium; write errors are swallowed.
    pub fn save(&self) {
        self.state.save(&self.store);
    }

    /// Remove the stored entry. The in-memory value and sync state are kept,
    /// so the next update writes it again.
    pub fn clear(&self) {
        let removed = self
            .state
            .medium()
            .and_then(|medium| medium.remove_item(&self.state.key).map_err(Into::into));
        if let Err(err) = removed {
            log::trace!("clear of '{}' skipped: {}", self.state.key, err);
        }
    }

    pub fn is_synced(&self) -> bool {
        self.state.synced.get()
    }

    pub fn storage_key(&self) -> &str {
        &self.state.key
    }

    pub fn scope(&self) -> StorageScope {
        self.state.scope
    }

    /// The underlying container, for code that only needs the base contract
    pub fn store(&self) -> &Store<T> {
        &self.store
    }

    pub fn get_value(&self) -> T {
        self.store.get_value()
    }

    pub fn with_value<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.store.with_value(f)
    }

    pub fn set_value(&self, next: T) {
        self.store.set_value(next);
    }

    pub fn update_value(&self, f: impl FnOnce(&T) -> T) {
        self.store.update_value(f);
    }

    pub fn on_update(&self, callback: impl Fn(&T, &T) + 'static) -> Subscription {
        self.store.on_update(callback)
    }

    pub fn on_update_rc(&self, callback: Rc<UpdateCallback<T>>) -> Subscription {
        self.store.on_update_rc(callback)
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// Includes the internal auto-save subscriber.
    pub fn subscriber_count(&self) -> usize {
        self.store.subscriber_count()
    }
}

/// Make an existing store persistent under `key`, encoded as JSON in the
/// platform storage for `scope`.
///
/// The store itself is shared, not copied: updates through either handle
/// are saved once the returned handle has been synced.
pub fn persist<T>(store: &Store<T>, key: impl Into<String>, scope: StorageScope) -> PersistentStore<T>
where
    T: Serialize + DeserializeOwned + Clone + 'static,
{
    PersistentStore::attach(store.clone(), key, PersistOptions::default().scope(scope))
}
