//! JSON codec using `serde_json`.

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::Codec;
use crate::error::CodecError;

/// JSON codec for structured data.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl Codec for JsonCodec {
    #[inline]
    fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(value)?)
    }

    #[inline]
    fn decode<T: DeserializeOwned>(&self, bytes: &[u8]) -> Result<T, CodecError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Serialize, Deserialize, PartialEq, Debug)]
    struct Patient {
        id: u32,
        name: String,
        age: u8,
    }

    #[test]
    fn test_encode_decode_struct() {
        let original = Patient {
            id: 7,
            name: "Ana".to_string(),
            age: 40,
        };

        let encoded = JsonCodec.encode(&original).unwrap();
        assert_eq!(
            std::str::from_utf8(&encoded).unwrap(),
            r#"{"id":7,"name":"Ana","age":40}"#
        );

        let decoded: Patient = JsonCodec.decode(&encoded).unwrap();
        assert_eq!(decoded, original);
    }

    #[test]
    fn test_decode_error_is_json_variant() {
        let result: Result<Patient, CodecError> = JsonCodec.decode(b"{not json");
        assert!(matches!(result, Err(CodecError::Json(_))));
    }
}
