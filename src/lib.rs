//! Stash Store - reactive values that can outlive the page
//!
//! Core modules:
//! - `store`: Reactive value container with ordered, synchronous subscribers
//! - `persistence`: Storage sync for a store (first-sync baseline, auto-save)
//! - `platform`: Storage media (browser local/session storage, in-memory)
//! - `contract`: Container traits and structural capability checks
//! - `error`: Storage and codec errors, swallowed at the persistence boundary

pub mod contract;
pub mod error;
pub mod persistence;
pub mod platform;
pub mod store;

pub use contract::{Members, Probe, SyncContainer, ValueContainer, is_persistent_store, is_store};
pub use error::{CodecError, PersistError, StorageError};
pub use persistence::{
    Codec, FnCodec, JsonCodec, PersistOptions, PersistentStore, RestoreContext, persist,
};
pub use platform::{MemoryStorage, StorageMedium, StorageScope, default_storage};
pub use store::{Store, Subscription, UpdateCallback};
