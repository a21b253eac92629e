//! Error types for crudp.
//!
//! Two taxonomies are kept apart:
//!
//! - [`RegistrationError`] is fatal to startup. Registration fails closed and
//!   the previously installed handler table stays live.
//! - [`CallError`] is scoped to one call or one packet. Inside a batch it
//!   becomes an error status on that packet only.

use thiserror::Error;

use crate::handler::HandlerError;
use crate::protocol::Action;

/// Serialization failure raised by a [`Codec`](crate::codec::Codec).
#[derive(Debug, Error)]
pub enum CodecError {
    /// MsgPack serialization error.
    #[error("MsgPack encode error: {0}")]
    MsgPackEncode(#[from] rmp_serde::encode::Error),

    /// MsgPack deserialization error.
    #[error("MsgPack decode error: {0}")]
    MsgPackDecode(#[from] rmp_serde::decode::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors raised while building the handler table.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistrationError {
    /// The handler declares nothing at all.
    #[error("handler {index} is empty")]
    EmptyHandler {
        /// Position in the registration list.
        index: usize,
    },

    /// A handler with bound capabilities has no name.
    #[error("missing handler name for handler at index {index}")]
    MissingName {
        /// Position in the registration list.
        index: usize,
    },

    /// Two handlers share a name.
    #[error("duplicate handler name '{name}' at index {index}")]
    DuplicateName {
        /// The repeated name.
        name: String,
        /// Position of the second occurrence.
        index: usize,
    },

    /// A handler with bound capabilities has no validator.
    #[error("missing validator for handler: {name}")]
    MissingValidator {
        /// Handler name.
        name: String,
    },

    /// No access provider and neither dev mode nor an external check.
    #[error("missing access provider (allowed roles or minimum level) for handler: {name}")]
    MissingAccess {
        /// Handler name.
        name: String,
    },

    /// Both a role provider and a level provider were declared.
    #[error("handler {name} declares both allowed roles and a minimum level")]
    ConflictingAccess {
        /// Handler name.
        name: String,
    },

    /// The access provider yields nothing for an implemented action.
    #[error("empty access policy for action '{action}' on handler: {name}")]
    EmptyAccess {
        /// Handler name.
        name: String,
        /// The implemented action without a policy.
        action: Action,
    },

    /// Access metadata exists but nothing identifies the caller.
    #[error("security: handler {name} enforces access but no caller {model} extractor or access check is configured")]
    NoCallerIdentity {
        /// First offending handler.
        name: String,
        /// Access model the handler uses (`roles` or `level`).
        model: &'static str,
    },

    /// Handler ids are a single byte on the wire.
    #[error("too many handlers: {count} (maximum {max})")]
    TooManyHandlers {
        /// Number of handlers submitted.
        count: usize,
        /// Largest supported table.
        max: usize,
    },
}

/// Errors raised while dispatching a single call or packet.
#[derive(Debug, Error)]
pub enum CallError {
    /// No handler is registered under this id.
    #[error("no handler found for id: {0}")]
    UnknownHandler(u8),

    /// The action code is not one of `c`, `r`, `u`, `d`.
    #[error("unknown action '{}' for handler: {handler}", code_char(.code))]
    UnknownAction {
        /// Raw action code.
        code: u8,
        /// Handler name.
        handler: String,
    },

    /// The handler does not bind this capability.
    #[error("action '{action}' not implemented for handler: {handler}")]
    NotImplemented {
        /// Requested action.
        action: Action,
        /// Handler name.
        handler: String,
    },

    /// The access policy rejected the caller.
    #[error("access denied")]
    AccessDenied,

    /// The handler validator rejected the arguments.
    #[error("{0}")]
    Validation(HandlerError),

    /// The handler reported failure in its reply.
    #[error("{0}")]
    Handler(HandlerError),

    /// An argument did not have the handler's argument type.
    #[error("argument {index} for handler {handler} is not a {expected}")]
    ArgumentType {
        /// Handler name.
        handler: String,
        /// Position among the payload items.
        index: usize,
        /// Expected Rust type.
        expected: &'static str,
    },

    /// A reply value did not have the handler's reply type.
    #[error("result is not a {expected}")]
    ResultType {
        /// Expected Rust type.
        expected: &'static str,
    },

    /// A payload block could not be decoded.
    #[error("decode error: {0}")]
    Decode(#[source] CodecError),

    /// A result could not be encoded.
    #[error("encode error: {0}")]
    Encode(#[source] CodecError),

    /// Payload conversion was needed but no codec was configured.
    #[error("{0} function not configured")]
    CodecNotConfigured(&'static str),
}

fn code_char(code: &u8) -> char {
    char::from(*code)
}

/// Main error type for crudp operations.
#[derive(Debug, Error)]
pub enum CrudpError {
    /// Handler table could not be built.
    #[error(transparent)]
    Registration(#[from] RegistrationError),

    /// A call failed.
    #[error(transparent)]
    Call(#[from] CallError),

    /// Envelope encoding or decoding failed.
    #[error(transparent)]
    Codec(#[from] CodecError),

    /// The batch envelope itself is unusable.
    #[error("malformed batch request: {0}")]
    MalformedBatch(String),
}

/// Result type alias using CrudpError.
pub type Result<T> = std::result::Result<T, CrudpError>;
