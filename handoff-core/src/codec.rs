//! Pluggable value serialization.
//!
//! A value handed through the exchange crosses an execution-context boundary,
//! so it travels as encoded bytes: the giver encodes, the broker moves the
//! bytes without interpreting them, and the taker decodes. The
//! [`MessageCodec`] trait lets callers pick the format per handle;
//! [`JsonCodec`] is the default and is convenient to debug.

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

/// Error produced while encoding or decoding an exchanged value.
#[derive(Debug, Error)]
pub enum CodecError {
    /// The value could not be encoded to bytes.
    #[error("value encode failed: {0}")]
    Encode(Box<dyn std::error::Error + Send + Sync>),

    /// The bytes could not be decoded to the expected type.
    #[error("value decode failed: {0}")]
    Decode(Box<dyn std::error::Error + Send + Sync>),
}

/// Serialization format for exchanged values.
///
/// `Clone + Send + 'static` so a codec can live inside client handles and be
/// captured by background tasks. Types exchanged through a codec must
/// implement serde's `Serialize`/`DeserializeOwned`.
pub trait MessageCodec: Clone + Send + 'static {
    /// Encode a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Encode`] when serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes back into a value.
    ///
    /// # Errors
    ///
    /// Returns [`CodecError::Decode`] when the bytes do not parse as `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;
}

/// JSON codec backed by `serde_json`; the default for client handles.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonCodec;

impl MessageCodec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        serde_json::to_vec(value).map_err(|e| CodecError::Encode(Box::new(e)))
    }

    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        serde_json::from_slice(bytes).map_err(|e| CodecError::Decode(Box::new(e)))
    }
}
