//! Handler replies and the erased dispatch output.
//!
//! Capability functions return a [`Reply`]: nothing, one value, an ordered
//! collection, or an in-band failure. The dispatcher turns it into
//! `Result<Option<Output>, CallError>`, so a `Reply::Failed` surfaces as the
//! call's error and never as an empty success.

use std::any::Any;
use std::fmt;

use thiserror::Error;

use super::args::Value;

/// Failure reported by handler code (validation or in-band reply error).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct HandlerError {
    message: String,
}

impl HandlerError {
    /// Create an error with a message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The message.
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<&str> for HandlerError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for HandlerError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

/// Result-or-error union returned by capability functions.
#[derive(Debug, Clone, PartialEq)]
pub enum Reply<R> {
    /// No data. Valid, not an error.
    Empty,
    /// A single value, encoded into one block.
    One(R),
    /// An ordered collection, each element encoded into its own block.
    Many(Vec<R>),
    /// In-band failure, re-surfaced as the call's error.
    Failed(HandlerError),
}

impl<R> Reply<R> {
    /// Shorthand for an in-band failure.
    pub fn fail(message: impl Into<String>) -> Self {
        Reply::Failed(HandlerError::new(message))
    }

    /// Check if this reply is a failure.
    pub fn is_failed(&self) -> bool {
        matches!(self, Reply::Failed(_))
    }
}

impl<R> From<Option<R>> for Reply<R> {
    fn from(value: Option<R>) -> Self {
        value.map_or(Reply::Empty, Reply::One)
    }
}

impl<R> From<Vec<R>> for Reply<R> {
    fn from(values: Vec<R>) -> Self {
        Reply::Many(values)
    }
}

impl<R> From<Result<R, HandlerError>> for Reply<R> {
    fn from(result: Result<R, HandlerError>) -> Self {
        match result {
            Ok(value) => Reply::One(value),
            Err(error) => Reply::Failed(error),
        }
    }
}

/// Successful dispatch result with its concrete type erased.
pub enum Output {
    /// A single value.
    One(Value),
    /// An ordered collection.
    Many(Vec<Value>),
}

impl Output {
    /// Number of values (and of encoded blocks).
    pub fn len(&self) -> usize {
        match self {
            Output::One(_) => 1,
            Output::Many(values) => values.len(),
        }
    }

    /// Check if this is an empty collection.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Borrow a single value as `T`.
    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        match self {
            Output::One(value) => value.downcast_ref::<T>(),
            Output::Many(_) => None,
        }
    }

    /// Iterate the values that are a `T`, in order.
    pub fn iter_as<T: Any>(&self) -> impl Iterator<Item = &T> {
        let values: &[Value] = match self {
            Output::One(value) => std::slice::from_ref(value),
            Output::Many(values) => values,
        };
        values.iter().filter_map(|value| value.downcast_ref::<T>())
    }

    /// Take a single value as `T`.
    pub fn into_one<T: Any>(self) -> Option<T> {
        match self {
            Output::One(value) => value.downcast::<T>().ok().map(|boxed| *boxed),
            Output::Many(_) => None,
        }
    }

    /// Take every value as `T`; `None` if any value has another type.
    pub fn into_many<T: Any>(self) -> Option<Vec<T>> {
        let values = match self {
            Output::One(value) => vec![value],
            Output::Many(values) => values,
        };
        values
            .into_iter()
            .map(|value| value.downcast::<T>().ok().map(|boxed| *boxed))
            .collect()
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Output::One(_) => f.write_str("Output::One(..)"),
            Output::Many(values) => write!(f, "Output::Many(len={})", values.len()),
        }
    }
}
