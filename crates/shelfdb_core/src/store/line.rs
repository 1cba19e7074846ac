//! Line-delimited JSON codec.
//!
//! The whole collection lives in one UTF-8 file, one JSON object per line,
//! no array wrapper. Inserts append serialized lines without reading the
//! rest of the file; update, remove, and clear serialize the entire
//! collection and atomically replace the file. Cheap inserts, expensive
//! point mutations - the tradeoff is deliberate.

use crate::dir::{ensure_dir, ensure_file, sync_parent_dir};
use crate::entity::{identity_kind, Entity};
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::store::FileCodec;
use std::collections::HashMap;
use std::io::Write;
use std::path::{Path, PathBuf};

const EXTENSION: &str = "json";

/// Codec persisting a collection as one newline-delimited JSON file at
/// `<dir>/<collection>.json`.
pub struct LineCodec {
    path: PathBuf,
}

impl LineCodec {
    /// Creates a codec for `collection` rooted at `dir`.
    pub fn new(dir: &Path, collection: &str) -> Self {
        Self {
            path: dir.join(format!("{collection}.{EXTENSION}")),
        }
    }

    /// The collection file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension(format!("{EXTENSION}.tmp"))
    }

    fn render<'a, T, I>(records: I) -> StoreResult<String>
    where
        T: Entity + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        let mut buffer = String::new();
        for record in records {
            let line = serde_json::to_string(record)
                .map_err(|err| StoreError::decode(format!("encode record: {err}")))?;
            buffer.push_str(&line);
            buffer.push('\n');
        }
        Ok(buffer)
    }

    /// Atomically replaces the file contents: write a temp file, sync it,
    /// rename it over the original, then sync the directory entry.
    fn rewrite(&self, buffer: &str) -> StoreResult<()> {
        let temp = self.temp_path();

        let mut file = std::fs::File::create(&temp)?;
        file.write_all(buffer.as_bytes())?;
        file.sync_all()?;
        drop(file);

        std::fs::rename(&temp, &self.path)?;
        sync_parent_dir(&self.path)?;
        Ok(())
    }
}

impl<T: Entity> FileCodec<T> for LineCodec {
    fn validate(&self) -> StoreResult<()> {
        // Any key kind works for a line file; only shape ambiguity rejects.
        identity_kind::<T>().map(|_| ())
    }

    fn prepare(&self) -> StoreResult<()> {
        if let Some(parent) = self.path.parent() {
            ensure_dir(parent)?;
        }
        ensure_file(&self.path)?;
        Ok(())
    }

    fn load(&self) -> StoreResult<Vec<T>> {
        let contents = std::fs::read_to_string(&self.path)?;
        let mut records = Vec::new();

        for (index, line) in contents.lines().enumerate() {
            if line.is_empty() {
                continue;
            }
            let record: T = serde_json::from_str(line).map_err(|err| {
                StoreError::decode(format!(
                    "{}:{}: {err}",
                    self.path.display(),
                    index + 1
                ))
            })?;
            records.push(record);
        }

        Ok(records)
    }

    fn insert(&self, batch: &[(Key, T)]) -> StoreResult<()> {
        let buffer = Self::render(batch.iter().map(|(_, item)| item))?;

        let mut file = std::fs::OpenOptions::new().append(true).open(&self.path)?;
        file.write_all(buffer.as_bytes())?;
        file.sync_all()?;
        Ok(())
    }

    fn update(&self, _key: &Key, _item: &T, all: &HashMap<Key, T>) -> StoreResult<()> {
        self.rewrite(&Self::render(all.values())?)
    }

    fn remove(&self, _keys: &[Key], remaining: &HashMap<Key, T>) -> StoreResult<()> {
        self.rewrite(&Self::render(remaining.values())?)
    }

    fn clear(&self) -> StoreResult<()> {
        self.rewrite("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::IdentityField;
    use crate::key::KeyKind;
    use crate::store::{FileStore, Store};
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
        value: String,
    }

    impl Entity for Item {
        fn collection() -> &'static str {
            "items"
        }

        fn identity_fields() -> &'static [IdentityField<Self>] {
            const FIELDS: &[IdentityField<Item>] = &[IdentityField {
                name: "id",
                kind: KeyKind::Text,
                get: |i| Key::Text(i.id.clone()),
            }];
            FIELDS
        }
    }

    fn item(id: &str, value: &str) -> Item {
        Item {
            id: id.into(),
            value: value.into(),
        }
    }

    #[test]
    fn prepare_creates_empty_file() {
        let temp = tempdir().unwrap();
        let codec = LineCodec::new(temp.path(), "items");

        <LineCodec as FileCodec<Item>>::prepare(&codec).unwrap();
        assert_eq!(std::fs::read(codec.path()).unwrap(), b"");
    }

    #[test]
    fn file_holds_one_json_object_per_line() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(LineCodec::new(temp.path(), "items")).unwrap();

        store.add(item("a", "x")).unwrap();
        store.add(item("b", "y")).unwrap();

        let contents = std::fs::read_to_string(temp.path().join("items.json")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        for line in lines {
            assert!(line.starts_with('{') && line.ends_with('}'));
            serde_json::from_str::<Item>(line).unwrap();
        }
        assert!(!contents.contains('['));
    }

    #[test]
    fn remove_rewrites_the_file() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(LineCodec::new(temp.path(), "items")).unwrap();

        store.add(item("a", "x")).unwrap();
        store.add(item("b", "y")).unwrap();
        store.remove(&item("a", "x")).unwrap();

        let contents = std::fs::read_to_string(temp.path().join("items.json")).unwrap();
        assert_eq!(contents.lines().count(), 1);
        assert!(contents.contains("\"b\""));
    }

    #[test]
    fn malformed_line_fails_the_whole_load() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("items.json");
        std::fs::write(&path, "{\"id\":\"a\",\"value\":\"x\"}\nnot json\n").unwrap();

        let err = FileStore::<Item, _>::open(LineCodec::new(temp.path(), "items"))
            .err()
            .expect("load should fail");
        match err {
            StoreError::Decode { message } => assert!(message.contains(":2")),
            other => panic!("expected decode error, got {other:?}"),
        }
    }

    #[test]
    fn clear_truncates_durably() {
        let temp = tempdir().unwrap();
        let store = FileStore::open(LineCodec::new(temp.path(), "items")).unwrap();

        store.add(item("a", "x")).unwrap();
        store.clear().unwrap();
        store.clear().unwrap(); // idempotent

        assert_eq!(
            std::fs::read(temp.path().join("items.json")).unwrap(),
            b""
        );
        assert!(store.is_empty());
    }

    #[test]
    fn reconstructing_over_the_same_directory_round_trips() {
        let temp = tempdir().unwrap();

        {
            let store = FileStore::open(LineCodec::new(temp.path(), "items")).unwrap();
            store.add(item("a", "x")).unwrap();
        }

        let store = FileStore::<Item, _>::open(LineCodec::new(temp.path(), "items")).unwrap();
        assert_eq!(store.find(&Key::from("a")).unwrap(), item("a", "x"));
    }

    #[test]
    fn duplicate_keys_in_durable_data_fail_open() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("items.json");
        std::fs::write(
            &path,
            "{\"id\":\"a\",\"value\":\"x\"}\n{\"id\":\"a\",\"value\":\"y\"}\n",
        )
        .unwrap();

        let result = FileStore::<Item, _>::open(LineCodec::new(temp.path(), "items"));
        assert!(matches!(result, Err(StoreError::DuplicateKey { .. })));
    }
}
