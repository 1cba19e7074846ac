//! Error types for shelfdb.

use crate::key::{Key, KeyKind};
use std::io;
use thiserror::Error;

/// Result type for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in shelfdb operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The configuration is missing or names an invalid value.
    #[error("invalid configuration: {message}")]
    Configuration {
        /// Description of the configuration problem, naming the offending key.
        message: String,
    },

    /// A record shape declares more than one identity field.
    #[error("entity `{entity}` declares more than one identity field")]
    AmbiguousIdentity {
        /// Name of the record type.
        entity: &'static str,
    },

    /// A record shape's identity kind does not satisfy the chosen codec.
    #[error("entity `{entity}` requires a {expected} identity for this backend")]
    InvalidIdentityType {
        /// Name of the record type.
        entity: &'static str,
        /// The identity kind the codec requires.
        expected: KeyKind,
    },

    /// An `add` targeted a key that is already present.
    #[error("duplicate key: {key}")]
    DuplicateKey {
        /// The conflicting key.
        key: Key,
    },

    /// The same record type was registered twice in one context.
    #[error("entity type `{entity}` is already registered in this context")]
    DuplicateEntityType {
        /// Name of the record type.
        entity: &'static str,
    },

    /// A `find` or `update` targeted a key that is not present.
    #[error("key not found: {key}")]
    NotFound {
        /// The missing key.
        key: Key,
    },

    /// Durable data could not be decoded on load.
    #[error("decode error: {message}")]
    Decode {
        /// Description of the malformed data, naming the source line or file.
        message: String,
    },

    /// Another context holds the storage directory lock.
    #[error("storage directory locked: another context has exclusive access")]
    DirectoryLocked,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl StoreError {
    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Creates a configuration error naming a missing key.
    pub fn missing_key(key: &str) -> Self {
        Self::Configuration {
            message: format!("missing required key `{key}`"),
        }
    }

    /// Creates a decode error.
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Creates a duplicate-key error.
    pub fn duplicate_key(key: Key) -> Self {
        Self::DuplicateKey { key }
    }

    /// Creates a not-found error.
    pub fn not_found(key: Key) -> Self {
        Self::NotFound { key }
    }
}
