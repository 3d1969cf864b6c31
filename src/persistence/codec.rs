//! Pluggable encoding between a store value and its stored text

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CodecError;

/// Turns a value into the text kept in storage and back.
///
/// `decode` gets the in-memory value as `current` when the store is
/// configured with [`RestoreContext::Current`](super::RestoreContext::Current),
/// so it can merge a partial record into it.
pub trait Codec<T> {
    fn encode(&self, value: &T) -> Result<String, CodecError>;

    fn decode(&self, raw: &str, current: Option<&T>) -> Result<T, CodecError>;
}

/// Default codec: serde_json in both directions, ignoring `current`.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl<T: Serialize + DeserializeOwned> Codec<T> for JsonCodec {
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        Ok(serde_json::to_string(value)?)
    }

    fn decode(&self, raw: &str, _current: Option<&T>) -> Result<T, CodecError> {
        Ok(serde_json::from_str(raw)?)
    }
}

type EncodeFn<T> = dyn Fn(&T) -> Result<String, CodecError>;
type DecodeFn<T> = dyn Fn(&str, Option<&T>) -> Result<T, CodecError>;

/// Codec built from a pair of closures
pub struct FnCodec<T> {
    encode: Box<EncodeFn<T>>,
    decode: Box<DecodeFn<T>>,
}

impl<T> FnCodec<T> {
    pub fn new(
        encode: impl Fn(&T) -> Result<String, CodecError> + 'static,
        decode: impl Fn(&str, Option<&T>) -> Result<T, CodecError> + 'static,
    ) -> Self {
        Self {
            encode: Box::new(encode),
            decode: Box::new(decode),
        }
    }
}

impl<T> Codec<T> for FnCodec<T> {
    fn encode(&self, value: &T) -> Result<String, CodecError> {
        (self.encode)(value)
    }

    fn decode(&self, raw: &str, current: Option<&T>) -> Result<T, CodecError> {
        (self.decode)(raw, current)
    }
}

impl<T> std::fmt::Debug for FnCodec<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnCodec").finish_non_exhaustive()
    }
}
