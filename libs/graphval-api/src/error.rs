use std::fmt;

use crate::types::{TypeId, display_tags};

/// Category of a conversion failure. Lets callers branch on the kind
/// without matching on message text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Null value where a non-nullable decode was requested.
    NullValue,
    /// Engine tag outside the requested host type's accepted set.
    TypeMismatch,
    /// No mapping between a host type and an engine type (either direction).
    UnsupportedType,
    /// Zero-element list, struct or map on encode.
    EmptyCollection,
    /// Collection elements resolved to different engine types.
    HeterogeneousType,
    /// Any other negative engine status.
    ConversionFailed,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ErrorKind::NullValue => f.write_str("null value"),
            ErrorKind::TypeMismatch => f.write_str("type mismatch"),
            ErrorKind::UnsupportedType => f.write_str("unsupported type"),
            ErrorKind::EmptyCollection => f.write_str("empty collection"),
            ErrorKind::HeterogeneousType => f.write_str("heterogeneous type"),
            ErrorKind::ConversionFailed => f.write_str("conversion failed"),
        }
    }
}

/// Collection shape named by `EmptyCollection`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionKind {
    List,
    Struct,
    Map,
}

impl fmt::Display for CollectionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CollectionKind::List => f.write_str("list"),
            CollectionKind::Struct => f.write_str("struct"),
            CollectionKind::Map => f.write_str("map"),
        }
    }
}

/// Failure status reported by the engine for a create/get/execute call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("engine status {code}: {message}")]
pub struct EngineStatus {
    pub code: i32,
    pub message: String,
}

impl EngineStatus {
    pub const ERROR: i32 = 1;

    pub fn new(message: impl Into<String>) -> Self {
        Self { code: Self::ERROR, message: message.into() }
    }
}

/// Error returned by every encode and decode routine.
///
/// Exactly one kind per failure; there are no partial results.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ConversionError {
    #[error("value is null")]
    NullValue,

    #[error("received {actual} type when expecting {}", display_tags(.expected))]
    TypeMismatch { expected: Vec<TypeId>, actual: TypeId },

    #[error("unsupported type: {0}")]
    UnsupportedType(String),

    #[error("cannot construct an engine {0} from zero elements")]
    EmptyCollection(CollectionKind),

    #[error("{0}")]
    HeterogeneousType(String),

    #[error("{0}")]
    ConversionFailed(String),
}

impl ConversionError {
    pub fn type_mismatch(expected: &[TypeId], actual: TypeId) -> Self {
        Self::TypeMismatch { expected: expected.to_vec(), actual }
    }

    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::UnsupportedType(msg.into())
    }

    pub fn failed(msg: impl Into<String>) -> Self {
        Self::ConversionFailed(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConversionError::NullValue => ErrorKind::NullValue,
            ConversionError::TypeMismatch { .. } => ErrorKind::TypeMismatch,
            ConversionError::UnsupportedType(_) => ErrorKind::UnsupportedType,
            ConversionError::EmptyCollection(_) => ErrorKind::EmptyCollection,
            ConversionError::HeterogeneousType(_) => ErrorKind::HeterogeneousType,
            ConversionError::ConversionFailed(_) => ErrorKind::ConversionFailed,
        }
    }

    /// Add context to message-carrying kinds, preserving the kind.
    ///
    /// Produces: `"context: original message"`. Structured kinds are returned as-is.
    pub fn with_context(self, ctx: impl fmt::Display) -> Self {
        match self {
            ConversionError::UnsupportedType(msg) => {
                ConversionError::UnsupportedType(format!("{ctx}: {msg}"))
            }
            ConversionError::HeterogeneousType(msg) => {
                ConversionError::HeterogeneousType(format!("{ctx}: {msg}"))
            }
            ConversionError::ConversionFailed(msg) => {
                ConversionError::ConversionFailed(format!("{ctx}: {msg}"))
            }
            other => other,
        }
    }
}

// ---------------------------------------------------------------------------
// From impls: engine and parse errors → ConversionFailed
// ---------------------------------------------------------------------------

impl From<EngineStatus> for ConversionError {
    fn from(e: EngineStatus) -> Self {
        Self::ConversionFailed(e.to_string())
    }
}

impl From<uuid::Error> for ConversionError {
    fn from(e: uuid::Error) -> Self {
        Self::ConversionFailed(format!("invalid uuid: {e}"))
    }
}

impl From<bigdecimal::ParseBigDecimalError> for ConversionError {
    fn from(e: bigdecimal::ParseBigDecimalError) -> Self {
        Self::ConversionFailed(format!("invalid decimal: {e}"))
    }
}

pub type Result<T, E = ConversionError> = std::result::Result<T, E>;
