//! Content-addressed CBOR codec.
//!
//! Each record is one file in `<dir>/<collection>/`, named by the string
//! form of its identity value plus the `.cbor` extension. Every mutation
//! maps to a single-file operation, so identities must be addressable:
//! only record shapes with a UUID identity are accepted.

use crate::dir::{ensure_dir, sync_parent_dir};
use crate::entity::{identity_kind, resolve_identity, Entity};
use crate::error::{StoreError, StoreResult};
use crate::key::{Key, KeyKind};
use crate::store::FileCodec;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "cbor";

/// Codec persisting one CBOR file per record under
/// `<dir>/<collection>/<uuid>.cbor`.
pub struct KeyedCodec {
    dir: PathBuf,
}

impl KeyedCodec {
    /// Creates a codec for `collection` rooted at `dir`.
    pub fn new(dir: &Path, collection: &str) -> Self {
        Self {
            dir: dir.join(collection),
        }
    }

    /// The collection directory.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_path(&self, key: &Key) -> PathBuf {
        self.dir.join(format!("{key}.{EXTENSION}"))
    }

    fn encode<T: Entity>(item: &T) -> StoreResult<Vec<u8>> {
        let mut buffer = Vec::new();
        ciborium::ser::into_writer(item, &mut buffer)
            .map_err(|err| StoreError::decode(format!("encode record: {err}")))?;
        Ok(buffer)
    }

    /// Writes the record atomically: temp file, fsync, rename over the
    /// target, fsync the directory. An interrupted write can never leave a
    /// torn `.cbor` behind, only a stale `.tmp` that load ignores.
    fn write_record<T: Entity>(&self, key: &Key, item: &T) -> StoreResult<()> {
        let buffer = Self::encode(item)?;
        let path = self.file_path(key);
        let temp = self.dir.join(format!("{key}.{EXTENSION}.tmp"));

        let mut file = std::fs::File::create(&temp)?;
        file.write_all(&buffer)?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp, &path)?;
        sync_parent_dir(&path)?;
        Ok(())
    }

    fn matching_files(&self) -> StoreResult<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in std::fs::read_dir(&self.dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == EXTENSION) {
                files.push(path);
            }
        }
        Ok(files)
    }
}

fn ignore_absent(result: std::io::Result<()>) -> StoreResult<()> {
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(err) => Err(err.into()),
    }
}

impl<T: Entity> FileCodec<T> for KeyedCodec {
    fn validate(&self) -> StoreResult<()> {
        match identity_kind::<T>()? {
            Some(KeyKind::Uuid) => Ok(()),
            _ => Err(StoreError::InvalidIdentityType {
                entity: std::any::type_name::<T>(),
                expected: KeyKind::Uuid,
            }),
        }
    }

    fn prepare(&self) -> StoreResult<()> {
        ensure_dir(&self.dir)?;
        Ok(())
    }

    fn load(&self) -> StoreResult<Vec<T>> {
        let mut records = Vec::new();
        for path in self.matching_files()? {
            let bytes = std::fs::read(&path)?;
            let record: T = ciborium::de::from_reader(bytes.as_slice())
                .map_err(|err| StoreError::decode(format!("{}: {err}", path.display())))?;

            // Identity presence was validated at construction; a record
            // that still resolves to nothing is malformed durable data.
            if resolve_identity(&record)?.is_none() {
                return Err(StoreError::decode(format!(
                    "{}: record has no identity value",
                    path.display()
                )));
            }
            records.push(record);
        }
        Ok(records)
    }

    fn insert(&self, batch: &[(Key, T)]) -> StoreResult<()> {
        for (key, item) in batch {
            self.write_record(key, item)?;
        }
        Ok(())
    }

    fn update(&self, key: &Key, item: &T, _all: &HashMap<Key, T>) -> StoreResult<()> {
        self.write_record(key, item)
    }

    fn remove(&self, keys: &[Key], _remaining: &HashMap<Key, T>) -> StoreResult<()> {
        for key in keys {
            ignore_absent(std::fs::remove_file(self.file_path(key)))?;
        }
        Ok(())
    }

    fn clear(&self) -> StoreResult<()> {
        for path in self.matching_files()? {
            ignore_absent(std::fs::remove_file(path))?;
        }
        Ok(())
    }
}
