//! Error types for ClassLedger.
//!
//! All errors are strongly typed using thiserror so callers can match on
//! specific conditions (a colliding ID vs. a missing one vs. a broken store)
//! instead of parsing messages.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors raised by the record store contract.
#[derive(Debug, Error)]
pub enum ContractError {
    /// A create targeted an ID that is already stored.
    #[error("the asset {id} already exists")]
    AlreadyExists {
        /// The colliding ID.
        id: String,
    },

    /// The ID has no record.
    #[error("the asset {id} does not exist")]
    NotFound {
        /// The missing ID.
        id: String,
    },

    /// A stored value is not a valid asset document.
    #[error("failed to decode asset stored under '{key}': {message}")]
    Decode {
        /// Key the value was read from.
        key: String,
        /// Decoder message.
        message: String,
    },

    /// An asset could not be serialized.
    #[error("failed to encode asset: {message}")]
    Encode {
        /// Encoder message.
        message: String,
    },

    /// The world state failed.
    #[error("failed to access world state: {0}")]
    Store(#[from] StorageError),
}

impl ContractError {
    pub(crate) fn already_exists(id: &str) -> Self {
        Self::AlreadyExists { id: id.to_string() }
    }

    pub(crate) fn not_found(id: &str) -> Self {
        Self::NotFound { id: id.to_string() }
    }
}

/// Errors raised while turning a named invocation into an operation.
///
/// These are local validation failures: nothing has touched the world state.
#[derive(Debug, Error)]
pub enum InvocationError {
    /// No operation has this name.
    #[error("unknown function '{function}'")]
    UnknownFunction {
        /// The name as given.
        function: String,
    },

    /// Wrong number of positional arguments.
    #[error("{function} expects {expected} argument(s), got {actual}")]
    Arity {
        /// Operation name.
        function: String,
        /// Arguments the operation takes.
        expected: usize,
        /// Arguments supplied.
        actual: usize,
    },

    /// An integer argument did not parse.
    #[error("argument '{argument}' must be an integer, got '{value}'")]
    InvalidInteger {
        /// Parameter name.
        argument: &'static str,
        /// The text supplied.
        value: String,
    },

    /// An argument exceeds the per-argument size limit.
    #[error("argument '{argument}' is {size} bytes, limit is {max}")]
    ArgumentTooLarge {
        /// Parameter name.
        argument: &'static str,
        /// Size supplied, in bytes.
        size: usize,
        /// Largest accepted size, in bytes.
        max: usize,
    },

    /// A result could not be serialized.
    #[error("failed to encode result: {message}")]
    Encode {
        /// Encoder message.
        message: String,
    },
}

/// Top-level error type for ClassLedger.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A contract operation failed.
    #[error("Contract error: {0}")]
    Contract(#[from] ContractError),

    /// An invocation was rejected before it ran.
    #[error("Invocation error: {0}")]
    Invocation(#[from] InvocationError),

    /// Opening or operating the store failed.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Configuration is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// What is wrong with it.
        message: String,
    },
}

impl LedgerError {
    /// Creates a configuration error.
    #[must_use]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Returns true if the operation failed because the ID was absent.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Contract(ContractError::NotFound { .. }))
    }

    /// Returns true if a create collided with an existing ID.
    #[must_use]
    pub const fn is_already_exists(&self) -> bool {
        matches!(self, Self::Contract(ContractError::AlreadyExists { .. }))
    }

    /// Returns true if the failure is a stored value that could not be decoded.
    #[must_use]
    pub const fn is_decode(&self) -> bool {
        matches!(self, Self::Contract(ContractError::Decode { .. }))
    }

    /// Returns true if the failure came from the underlying store rather than
    /// from a violated precondition.
    #[must_use]
    pub const fn is_store_failure(&self) -> bool {
        matches!(
            self,
            Self::Storage(_) | Self::Contract(ContractError::Store(_))
        )
    }

    /// Returns true if the failure was detected locally, before or instead
    /// of a store fault: precondition, decode, and argument errors.
    #[must_use]
    pub const fn is_local(&self) -> bool {
        match self {
            Self::Contract(e) => !matches!(e, ContractError::Store(_)),
            Self::Invocation(_) | Self::Config { .. } => true,
            Self::Storage(_) => false,
        }
    }
}

/// Result type alias for ClassLedger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
