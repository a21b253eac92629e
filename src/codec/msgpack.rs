//! MsgPack codec using `rmp-serde`.
//!
//! **Always** `to_vec_named`, never `to_vec`: structs travel as maps keyed by
//! field name, which keeps payloads readable by non-Rust peers and tolerant
//! of field reordering.
//!
//! # Example
//!
//! ```
//! use crudp::codec::{Codec, MsgPackCodec};
//! use serde::{Serialize, Deserialize};
//!
//! #[derive(Serialize, Deserialize, PartialEq, Debug)]
//! struct User {
//!     id: u32,
//!     name: String,
//! }
//!
//! let user = User { id: 42, name: "Alice".to_string() };
//! let encoded = MsgPackCodec.encode(&user).unwrap();
//! let decoded: User = MsgPackCodec.decode(&encoded).unwrap();
//! assert_eq!(decoded, user);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Codec;
use crate::error::CodecError;

/// MessagePack codec for structured data.
///
/// Uses `rmp_serde::to_vec_named` so structs are serialized as maps
/// (with field names) rather than arrays (positional).
#[derive(Debug, Clone, Copy, Default)]
pub struct MsgPackCodec;

impl Codec for MsgPackCodec {
    #[inline]
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        // to_vec_named, NOT to_vec
        Ok(rmp_serde::to_vec_named(value)?)
    }

    #[inline]
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(rmp_serde::from_slice(bytes)?)
    }
}
