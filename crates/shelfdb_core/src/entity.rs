//! The record capability: collection naming and identity resolution.
//!
//! A record type opts into storage by implementing [`Entity`]: it names its
//! collection and declares which of its fields, if any, carries the logical
//! key. Identity is a plain declarative list of extractor functions rather
//! than runtime shape inspection, so an ambiguous shape (two declared
//! identity fields) is a construction-time error, detected once per store.

use crate::error::{StoreError, StoreResult};
use crate::key::{Key, KeyKind};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// One declared identity field of a record shape.
pub struct IdentityField<T> {
    /// Field name, used in diagnostics.
    pub name: &'static str,
    /// The declared value kind of the field.
    pub kind: KeyKind,
    /// Extracts the field's runtime value from a record.
    pub get: fn(&T) -> Key,
}

/// A record type storable by shelfdb.
///
/// Types must be serde-serializable (the codecs own the concrete formats)
/// and cheaply cloneable, since reads hand out detached copies.
///
/// # Example
///
/// ```rust
/// use serde::{Deserialize, Serialize};
/// use shelfdb_core::{Entity, IdentityField, Key, KeyKind};
/// use uuid::Uuid;
///
/// #[derive(Debug, Clone, Serialize, Deserialize)]
/// struct Movie {
///     id: Uuid,
///     title: String,
/// }
///
/// impl Entity for Movie {
///     fn collection() -> &'static str {
///         "movies"
///     }
///
///     fn identity_fields() -> &'static [IdentityField<Self>] {
///         const FIELDS: &[IdentityField<Movie>] = &[IdentityField {
///             name: "id",
///             kind: KeyKind::Uuid,
///             get: |movie| Key::Uuid(movie.id),
///         }];
///         FIELDS
///     }
/// }
/// ```
pub trait Entity: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// The stable collection name, used for file and directory names.
    fn collection() -> &'static str;

    /// The declared identity fields of this shape.
    ///
    /// An empty slice means the shape has no identity and stores will
    /// assign surrogate keys. Declaring more than one field is a
    /// configuration error surfaced at store construction.
    fn identity_fields() -> &'static [IdentityField<Self>];
}

/// Resolves the identity value of a record instance.
///
/// Returns `Ok(None)` when the shape declares no identity field (the caller
/// falls back to a surrogate key) and fails with
/// [`StoreError::AmbiguousIdentity`] when more than one field is declared.
pub fn resolve_identity<T: Entity>(record: &T) -> StoreResult<Option<Key>> {
    match T::identity_fields() {
        [] => Ok(None),
        [field] => Ok(Some((field.get)(record))),
        _ => Err(StoreError::AmbiguousIdentity {
            entity: std::any::type_name::<T>(),
        }),
    }
}

/// Resolves the declared identity kind of a record type.
///
/// The type-level companion of [`resolve_identity`], used by codecs that
/// restrict the key type (the keyed-file codec requires [`KeyKind::Uuid`])
/// to reject a shape before any file I/O occurs.
pub fn identity_kind<T: Entity>() -> StoreResult<Option<KeyKind>> {
    match T::identity_fields() {
        [] => Ok(None),
        [field] => Ok(Some(field.kind)),
        _ => Err(StoreError::AmbiguousIdentity {
            entity: std::any::type_name::<T>(),
        }),
    }
}

/// Resolves a record's key, substituting a fresh surrogate when the shape
/// declares no identity.
pub fn resolve_key<T: Entity>(record: &T) -> StoreResult<Key> {
    Ok(resolve_identity(record)?.unwrap_or_else(Key::surrogate))
}
