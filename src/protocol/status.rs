//! Result status codes carried by packet results and single responses.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// User-facing status of a result.
///
/// Serialized as its numeric code: normal=0, info=1, error=2, warning=3,
/// success=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
#[repr(u8)]
pub enum Status {
    /// Plain message.
    #[default]
    Normal = 0,
    /// Informational message.
    Info = 1,
    /// The operation failed.
    Error = 2,
    /// The operation succeeded with a caveat.
    Warning = 3,
    /// The operation succeeded.
    Success = 4,
}

/// A status code outside 0..=4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("invalid status code: {0}")]
pub struct InvalidStatus(pub u8);

impl Status {
    /// Numeric wire code.
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }
}

impl From<Status> for u8 {
    fn from(status: Status) -> Self {
        status.code()
    }
}

impl TryFrom<u8> for Status {
    type Error = InvalidStatus;

    fn try_from(code: u8) -> Result<Self, InvalidStatus> {
        match code {
            0 => Ok(Status::Normal),
            1 => Ok(Status::Info),
            2 => Ok(Status::Error),
            3 => Ok(Status::Warning),
            4 => Ok(Status::Success),
            other => Err(InvalidStatus(other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes() {
        assert_eq!(Status::Normal.code(), 0);
        assert_eq!(Status::Info.code(), 1);
        assert_eq!(Status::Error.code(), 2);
        assert_eq!(Status::Warning.code(), 3);
        assert_eq!(Status::Success.code(), 4);
    }

    #[test]
    fn test_try_from_rejects_unknown() {
        assert_eq!(Status::try_from(4), Ok(Status::Success));
        assert_eq!(Status::try_from(9), Err(InvalidStatus(9)));
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&Status::Error).unwrap();
        assert_eq!(json, "2");
        let back: Status = serde_json::from_str("3").unwrap();
        assert_eq!(back, Status::Warning);
        assert!(serde_json::from_str::<Status>("7").is_err());
    }

    #[test]
    fn test_every_code_round_trips() {
        for code in 0u8..=4 {
            let status = Status::try_from(code).unwrap();
            assert_eq!(u8::from(status), code);
        }
        assert_eq!(Status::try_from(2), Ok(Status::Error));
    }
}
