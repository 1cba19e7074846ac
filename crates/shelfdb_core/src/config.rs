//! Context configuration.

use crate::error::{StoreError, StoreResult};
use std::path::{Path, PathBuf};

/// Connection-string key for the backend selector.
pub const PROVIDER_KEY: &str = "provider";
/// Connection-string key for the storage directory.
pub const PATH_KEY: &str = "path";

/// The closed set of backend strategies.
///
/// Selection is an explicit tagged choice; there is no string-based type
/// lookup beyond parsing the `provider` configuration value into this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    /// In-process dictionary, no persistence.
    Memory,
    /// One newline-delimited JSON file per collection.
    LineFile,
    /// One CBOR file per record, named by its identity.
    KeyedFile,
}

impl Provider {
    fn parse(value: &str) -> StoreResult<Self> {
        match value {
            "memory" => Ok(Provider::Memory),
            "line" => Ok(Provider::LineFile),
            "keyed" => Ok(Provider::KeyedFile),
            other => Err(StoreError::configuration(format!(
                "unknown `{PROVIDER_KEY}` value `{other}` (expected memory, line, or keyed)"
            ))),
        }
    }
}

/// Configuration for building a [`Context`](crate::Context).
#[derive(Debug, Clone)]
pub struct Config {
    /// The backend strategy.
    pub provider: Provider,
    /// Storage directory; required by the file providers.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Creates a memory-backed configuration.
    #[must_use]
    pub fn memory() -> Self {
        Self {
            provider: Provider::Memory,
            path: None,
        }
    }

    /// Creates a line-file configuration rooted at `path`.
    pub fn line_file(path: impl Into<PathBuf>) -> Self {
        Self {
            provider: Provider::LineFile,
            path: Some(path.into()),
        }
    }

    /// Creates a keyed-file configuration rooted at `path`.
    pub fn keyed_file(path: impl Into<PathBuf>) -> Self {
        Self {
            provider: Provider::KeyedFile,
            path: Some(path.into()),
        }
    }

    /// Parses a `key=value;key=value` connection string.
    ///
    /// Keys are case-insensitive and surrounding whitespace is trimmed.
    /// Unknown keys are ignored. A missing `provider` segment fails with a
    /// configuration error naming the key.
    ///
    /// # Example
    ///
    /// ```rust
    /// use shelfdb_core::{Config, Provider};
    ///
    /// let config = Config::from_connection_string("provider=line;path=/tmp/db").unwrap();
    /// assert_eq!(config.provider, Provider::LineFile);
    /// ```
    pub fn from_connection_string(connection: &str) -> StoreResult<Self> {
        let mut provider = None;
        let mut path = None;

        for segment in connection.split(';') {
            if segment.trim().is_empty() {
                continue;
            }
            let (key, value) = segment
                .split_once('=')
                .ok_or_else(|| {
                    StoreError::configuration(format!("malformed segment `{segment}`"))
                })?;
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                PROVIDER_KEY => provider = Some(Provider::parse(value)?),
                PATH_KEY => path = Some(PathBuf::from(value)),
                _ => {} // unknown keys are ignored
            }
        }

        let provider = provider.ok_or_else(|| StoreError::missing_key(PROVIDER_KEY))?;
        Ok(Self { provider, path })
    }

    /// Returns the storage directory, failing when the configuration does
    /// not carry one.
    pub fn require_path(&self) -> StoreResult<&Path> {
        self.path
            .as_deref()
            .ok_or_else(|| StoreError::missing_key(PATH_KEY))
    }
}
