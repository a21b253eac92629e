//! Codec module - serialization/deserialization for payload blocks.
//!
//! The engine never chooses a wire encoding on its own. A [`Codec`] is
//! injected through [`EngineBuilder::codec`](crate::EngineBuilder::codec)
//! and is used for every payload block and for the batch envelope:
//!
//! - [`MsgPackCodec`] - MessagePack using `rmp-serde` (`to_vec_named`, struct-as-map)
//! - [`JsonCodec`] - JSON using `serde_json`
//!
//! # Design
//!
//! Codecs are zero-sized marker structs implementing a trait with generic
//! methods. The engine is generic over its codec, so every handler binding
//! is monomorphized for the concrete codec at registration time.
//!
//! # Example
//!
//! ```
//! use crudp::codec::{Codec, JsonCodec, MsgPackCodec};
//!
//! let encoded = MsgPackCodec.encode(&"hello").unwrap();
//! let decoded: String = MsgPackCodec.decode(&encoded).unwrap();
//! assert_eq!(decoded, "hello");
//!
//! let json = JsonCodec.encode(&vec![1, 2, 3]).unwrap();
//! assert_eq!(json, b"[1,2,3]");
//! ```

mod json;
mod msgpack;

use bytes::Bytes;
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::CodecError;

pub use json::JsonCodec;
pub use msgpack::MsgPackCodec;

/// Encode/decode contract for payload blocks.
pub trait Codec: Send + Sync + 'static {
    /// Encode a value to bytes.
    ///
    /// # Errors
    ///
    /// Returns error if the value cannot be serialized.
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes into a fresh value of type `T`.
    ///
    /// # Errors
    ///
    /// Returns error if the bytes cannot be deserialized to type `T`.
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError>;

    /// Encode a value into a payload block.
    fn encode_bytes<T: Serialize + ?Sized>(&self, value: &T) -> Result<Bytes, CodecError> {
        self.encode(value).map(Bytes::from)
    }
}
