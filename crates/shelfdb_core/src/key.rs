//! Record keys.

use std::fmt;
use uuid::Uuid;

/// The runtime value of a record's logical key.
///
/// Keys are either extracted from a record's declared identity field or
/// generated as surrogates (a fresh [`Key::Uuid`]) when the shape declares
/// no identity. The closed set of kinds keeps key handling explicit: a
/// backend that needs an addressable key (the keyed-file codec) can demand
/// a specific [`KeyKind`] at construction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Key {
    /// A 128-bit universally-unique value.
    Uuid(Uuid),
    /// A string key.
    Text(String),
    /// A signed integer key.
    Int(i64),
}

impl Key {
    /// Returns the kind of this key.
    #[must_use]
    pub fn kind(&self) -> KeyKind {
        match self {
            Key::Uuid(_) => KeyKind::Uuid,
            Key::Text(_) => KeyKind::Text,
            Key::Int(_) => KeyKind::Int,
        }
    }

    /// Generates a fresh surrogate key.
    ///
    /// Surrogates are random UUIDs used only for in-process de-duplication
    /// of records whose shape declares no identity; they are never persisted
    /// as file names.
    #[must_use]
    pub fn surrogate() -> Self {
        Key::Uuid(Uuid::new_v4())
    }

    /// Returns the inner UUID if this is a [`Key::Uuid`].
    #[must_use]
    pub fn as_uuid(&self) -> Option<Uuid> {
        match self {
            Key::Uuid(id) => Some(*id),
            _ => None,
        }
    }
}

/// The type-level descriptor of a key, used to validate an identity's
/// declared value type before a codec accepts the record type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyKind {
    /// 128-bit universally-unique value.
    Uuid,
    /// String.
    Text,
    /// Signed integer.
    Int,
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Uuid(id) => write!(f, "{id}"),
            Key::Text(text) => write!(f, "{text}"),
            Key::Int(value) => write!(f, "{value}"),
        }
    }
}

impl fmt::Display for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Uuid => write!(f, "uuid"),
            KeyKind::Text => write!(f, "text"),
            KeyKind::Int => write!(f, "integer"),
        }
    }
}

impl From<Uuid> for Key {
    fn from(id: Uuid) -> Self {
        Key::Uuid(id)
    }
}

impl From<&str> for Key {
    fn from(text: &str) -> Self {
        Key::Text(text.to_string())
    }
}

impl From<String> for Key {
    fn from(text: String) -> Self {
        Key::Text(text)
    }
}

impl From<i64> for Key {
    fn from(value: i64) -> Self {
        Key::Int(value)
    }
}
