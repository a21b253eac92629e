//! Wire envelopes: packets, batches and the single-operation envelope.
//!
//! Payload blocks are opaque `bytes::Bytes` produced by the configured
//! codec. A [`PacketResult`] embeds the originating [`Packet`] so that a
//! response mirrors the request it answers.
//!
//! # Example
//!
//! ```
//! use crudp::protocol::{Action, BatchRequest, Packet};
//!
//! let batch = BatchRequest::new(vec![
//!     Packet::new(Action::Read, 0, "r-1"),
//!     Packet::new(Action::Delete, 0, "d-1"),
//! ]);
//! assert_eq!(batch.len(), 2);
//! assert_eq!(batch.packets[0].action, b'r');
//! ```

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::{Action, Status};

/// Message attached to a successful result.
pub const OK_MESSAGE: &str = "OK";

/// One CRUD request unit.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Packet {
    /// Action code (`c`, `r`, `u`, `d`). Kept raw so unknown codes survive decoding.
    pub action: u8,
    /// Target handler id.
    pub handler_id: u8,
    /// Correlation token echoed in the result.
    pub req_id: String,
    /// Encoded arguments, one block per item.
    #[serde(default)]
    pub data: Vec<Bytes>,
}

impl Packet {
    /// Create a packet without payload.
    pub fn new(action: Action, handler_id: u8, req_id: impl Into<String>) -> Self {
        Self {
            action: action.code(),
            handler_id,
            req_id: req_id.into(),
            data: Vec::new(),
        }
    }

    /// Attach payload blocks.
    pub fn with_data(mut self, data: Vec<Bytes>) -> Self {
        self.data = data;
        self
    }

    /// Parsed action, if the code is known.
    #[inline]
    pub fn parsed_action(&self) -> Option<Action> {
        Action::from_code(self.action)
    }

    /// Copy of the routing fields with an empty payload.
    pub(crate) fn header(&self) -> Self {
        Self {
            action: self.action,
            handler_id: self.handler_id,
            req_id: self.req_id.clone(),
            data: Vec::new(),
        }
    }
}

/// Ordered list of packets. Result order matches request order.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Packets in submission order.
    pub packets: Vec<Packet>,
}

impl BatchRequest {
    /// Create a batch from packets.
    pub fn new(packets: Vec<Packet>) -> Self {
        Self { packets }
    }

    /// Number of packets.
    pub fn len(&self) -> usize {
        self.packets.len()
    }

    /// Check if the batch is empty.
    pub fn is_empty(&self) -> bool {
        self.packets.is_empty()
    }
}

/// A packet plus its outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PacketResult {
    /// The answered packet; `data` holds the encoded result.
    #[serde(flatten)]
    pub packet: Packet,
    /// Outcome status.
    pub message_type: Status,
    /// Human-readable message, non-empty on error.
    pub message: String,
}

impl PacketResult {
    /// Successful result carrying encoded data.
    pub fn success(request: &Packet, data: Vec<Bytes>) -> Self {
        Self {
            packet: request.header().with_data(data),
            message_type: Status::Success,
            message: OK_MESSAGE.to_string(),
        }
    }

    /// Failed result without data.
    pub fn error(request: &Packet, message: impl Into<String>) -> Self {
        Self {
            packet: request.header(),
            message_type: Status::Error,
            message: message.into(),
        }
    }

    /// Echoed correlation token.
    #[inline]
    pub fn req_id(&self) -> &str {
        &self.packet.req_id
    }

    /// Encoded result blocks.
    #[inline]
    pub fn data(&self) -> &[Bytes] {
        &self.packet.data
    }

    /// Check if the status is success.
    #[inline]
    pub fn is_success(&self) -> bool {
        self.message_type == Status::Success
    }

    /// Check if the status is error.
    #[inline]
    pub fn is_error(&self) -> bool {
        self.message_type == Status::Error
    }
}

/// Ordered results, same length and order as the originating request.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Results in request order.
    pub results: Vec<PacketResult>,
}

impl BatchResponse {
    /// Number of results.
    pub fn len(&self) -> usize {
        self.results.len()
    }

    /// Check if the response is empty.
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

/// Single-operation request (non-batch).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Request {
    /// Correlation token.
    pub req_id: String,
    /// Encoded arguments.
    #[serde(default)]
    pub data: Vec<Bytes>,
}

/// Single-operation response (non-batch).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Response {
    /// Echoed correlation token.
    pub req_id: String,
    /// Encoded result blocks.
    #[serde(default)]
    pub data: Vec<Bytes>,
    /// Outcome status.
    pub message_type: Status,
    /// Human-readable message.
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_packet_new() {
        let packet = Packet::new(Action::Update, 3, "u-1")
            .with_data(vec![Bytes::from_static(b"abc")]);

        assert_eq!(packet.action, b'u');
        assert_eq!(packet.parsed_action(), Some(Action::Update));
        assert_eq!(packet.handler_id, 3);
        assert_eq!(packet.data.len(), 1);
    }

    #[test]
    fn test_unknown_action_code_survives() {
        let packet = Packet {
            action: b'x',
            ..Packet::default()
        };
        assert_eq!(packet.parsed_action(), None);
    }

    #[test]
    fn test_error_result_drops_data() {
        let packet = Packet::new(Action::Create, 0, "c-1")
            .with_data(vec![Bytes::from_static(b"payload")]);
        let result = PacketResult::error(&packet, "boom");

        assert!(result.is_error());
        assert_eq!(result.req_id(), "c-1");
        assert!(result.data().is_empty());
        assert_eq!(result.message, "boom");
    }

    #[test]
    fn test_success_result() {
        let packet = Packet::new(Action::Read, 1, "r-1");
        let result = PacketResult::success(
            &packet,
            vec![Bytes::from_static(b"a"), Bytes::from_static(b"b")],
        );

        assert!(result.is_success());
        assert_eq!(result.message, OK_MESSAGE);
        assert_eq!(result.data().len(), 2);
        assert_eq!(result.packet.action, b'r');
    }

    #[test]
    fn test_packet_result_json_shape() {
        let packet = Packet::new(Action::Create, 2, "c-9");
        let result = PacketResult::error(&packet, "nope");
        let json: serde_json::Value = serde_json::to_value(&result).unwrap();

        assert_eq!(json["action"], b'c');
        assert_eq!(json["handler_id"], 2);
        assert_eq!(json["req_id"], "c-9");
        assert_eq!(json["message_type"], 2);
        assert_eq!(json["message"], "nope");
    }
}
