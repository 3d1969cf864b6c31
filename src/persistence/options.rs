//! Persistent store configuration

use std::rc::Rc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use super::codec::{Codec, JsonCodec};
use crate::platform::{StorageMedium, StorageScope};

/// Whether the decoder sees the in-memory value when restoring
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RestoreContext {
    /// Pass the current value, for codecs that merge partial records
    #[default]
    Current,
    /// Decode the stored text on its own
    Detached,
}

/// Options for [`PersistentStore`](super::PersistentStore).
///
/// `Default` is available for serde types and uses [`JsonCodec`]; other
/// types start from [`PersistOptions::with_codec`].
pub struct PersistOptions<T> {
    pub(crate) scope: StorageScope,
    pub(crate) storage: Option<Rc<dyn StorageMedium>>,
    pub(crate) codec: Rc<dyn Codec<T>>,
    pub(crate) restore_context: RestoreContext,
}

impl<T: Serialize + DeserializeOwned + 'static> Default for PersistOptions<T> {
    fn default() -> Self {
        Self::with_codec(JsonCodec)
    }
}

impl<T> PersistOptions<T> {
    pub fn with_codec(codec: impl Codec<T> + 'static) -> Self {
        Self {
            scope: StorageScope::Durable,
            storage: None,
            codec: Rc::new(codec),
            restore_context: RestoreContext::Current,
        }
    }

    pub fn scope(mut self, scope: StorageScope) -> Self {
        self.scope = scope;
        self
    }

    /// Shorthand for `scope(StorageScope::Session)`
    pub fn session(self) -> Self {
        self.scope(StorageScope::Session)
    }

    /// Use `storage` instead of the platform medium for the scope.
    pub fn storage(mut self, storage: impl StorageMedium + 'static) -> Self {
        self.storage = Some(Rc::new(storage));
        self
    }

    pub fn codec(mut self, codec: impl Codec<T> + 'static) -> Self {
        self.codec = Rc::new(codec);
        self
    }

    pub fn restore_context(mut self, restore_context: RestoreContext) -> Self {
        self.restore_context = restore_context;
        self
    }
}

impl<T> std::fmt::Debug for PersistOptions<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistOptions")
            .field("scope", &self.scope)
            .field("storage", &self.storage.is_some())
            .field("restore_context", &self.restore_context)
            .finish_non_exhaustive()
    }
}
