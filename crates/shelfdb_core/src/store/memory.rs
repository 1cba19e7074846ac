//! In-memory backend.

use crate::entity::{identity_kind, resolve_key, Entity};
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::store::{validate_batch_keys, Store};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// A store with no persistence: a dictionary keyed by resolved identity,
/// guarded by the same reader/writer discipline as the file backends but
/// with no I/O step. Used for tests and ephemeral contexts.
pub struct MemoryStore<T: Entity> {
    items: RwLock<HashMap<Key, T>>,
}

impl<T: Entity> MemoryStore<T> {
    /// Creates an empty store.
    ///
    /// Fails with [`StoreError::AmbiguousIdentity`] when the record shape
    /// declares more than one identity field.
    pub fn new() -> StoreResult<Self> {
        identity_kind::<T>()?;
        Ok(Self {
            items: RwLock::new(HashMap::new()),
        })
    }
}

// The mutation logic is shared between the blocking and async forms; only
// the lock acquisition differs.
impl<T: Entity> MemoryStore<T> {
    fn do_find(items: &HashMap<Key, T>, key: &Key) -> StoreResult<T> {
        items
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key.clone()))
    }

    fn do_add(items: &mut HashMap<Key, T>, item: T) -> StoreResult<()> {
        let key = resolve_key(&item)?;
        if items.contains_key(&key) {
            return Err(StoreError::duplicate_key(key));
        }
        items.insert(key, item);
        Ok(())
    }

    fn do_add_many(items: &mut HashMap<Key, T>, batch: Vec<T>) -> StoreResult<()> {
        let keys = validate_batch_keys(&batch, items)?;
        items.extend(keys.into_iter().zip(batch));
        Ok(())
    }

    fn do_update(items: &mut HashMap<Key, T>, item: T) -> StoreResult<T> {
        let key = resolve_key(&item)?;
        if !items.contains_key(&key) {
            return Err(StoreError::not_found(key));
        }
        items.insert(key, item.clone());
        Ok(item)
    }

    fn do_remove(items: &mut HashMap<Key, T>, item: &T) -> StoreResult<()> {
        let key = resolve_key(item)?;
        items.remove(&key);
        Ok(())
    }

    fn do_remove_many(items: &mut HashMap<Key, T>, batch: &[T]) -> StoreResult<()> {
        for item in batch {
            let key = resolve_key(item)?;
            items.remove(&key);
        }
        Ok(())
    }
}

impl<T: Entity> Store<T> for MemoryStore<T> {
    fn find(&self, key: &Key) -> StoreResult<T> {
        Self::do_find(&self.items.blocking_read(), key)
    }

    fn all(&self) -> StoreResult<Vec<T>> {
        Ok(self.items.blocking_read().values().cloned().collect())
    }

    fn add(&self, item: T) -> StoreResult<()> {
        Self::do_add(&mut self.items.blocking_write(), item)
    }

    fn add_many(&self, items: Vec<T>) -> StoreResult<()> {
        Self::do_add_many(&mut self.items.blocking_write(), items)
    }

    fn update(&self, item: T) -> StoreResult<T> {
        Self::do_update(&mut self.items.blocking_write(), item)
    }

    fn remove(&self, item: &T) -> StoreResult<()> {
        Self::do_remove(&mut self.items.blocking_write(), item)
    }

    fn remove_many(&self, items: &[T]) -> StoreResult<()> {
        Self::do_remove_many(&mut self.items.blocking_write(), items)
    }

    fn clear(&self) -> StoreResult<()> {
        self.items.blocking_write().clear();
        Ok(())
    }

    fn len(&self) -> usize {
        self.items.blocking_read().len()
    }

    async fn find_async(&self, key: &Key) -> StoreResult<T> {
        Self::do_find(&*self.items.read().await, key)
    }

    async fn all_async(&self) -> StoreResult<Vec<T>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn add_async(&self, item: T) -> StoreResult<()> {
        Self::do_add(&mut *self.items.write().await, item)
    }

    async fn add_many_async(&self, items: Vec<T>) -> StoreResult<()> {
        Self::do_add_many(&mut *self.items.write().await, items)
    }

    async fn update_async(&self, item: T) -> StoreResult<T> {
        Self::do_update(&mut *self.items.write().await, item)
    }

    async fn remove_async(&self, item: &T) -> StoreResult<()> {
        Self::do_remove(&mut *self.items.write().await, item)
    }

    async fn remove_many_async(&self, items: &[T]) -> StoreResult<()> {
        Self::do_remove_many(&mut *self.items.write().await, items)
    }

    async fn clear_async(&self) -> StoreResult<()> {
        self.items.write().await.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::IdentityField;
    use crate::key::KeyKind;
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Widget {
        sku: String,
        name: String,
    }

    impl Entity for Widget {
        fn collection() -> &'static str {
            "widgets"
        }

        fn identity_fields() -> &'static [IdentityField<Self>] {
            const FIELDS: &[IdentityField<Widget>] = &[IdentityField {
                name: "sku",
                kind: KeyKind::Text,
                get: |w| Key::Text(w.sku.clone()),
            }];
            FIELDS
        }
    }

    fn widget(sku: &str) -> Widget {
        Widget {
            sku: sku.into(),
            name: format!("widget {sku}"),
        }
    }

    #[test]
    fn add_and_find() {
        let store = MemoryStore::new().unwrap();
        store.add(widget("001")).unwrap();

        let found = store.find(&Key::from("001")).unwrap();
        assert_eq!(found.sku, "001");
    }

    #[test]
    fn find_absent_fails() {
        let store = MemoryStore::<Widget>::new().unwrap();
        assert!(matches!(
            store.find(&Key::from("missing")),
            Err(StoreError::NotFound { .. })
        ));
    }

    #[test]
    fn duplicate_add_fails_and_leaves_one() {
        let store = MemoryStore::new().unwrap();
        store.add(widget("k")).unwrap();

        let err = store.add(widget("k")).unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn add_many_rejects_intra_batch_duplicates_without_effect() {
        let store = MemoryStore::new().unwrap();
        let batch = vec![widget("a"), widget("b"), widget("a")];

        assert!(store.add_many(batch).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn update_replaces_in_place() {
        let store = MemoryStore::new().unwrap();
        store.add(widget("001")).unwrap();

        let mut changed = widget("001");
        changed.name = "renamed".into();
        store.update(changed).unwrap();

        assert_eq!(store.find(&Key::from("001")).unwrap().name, "renamed");
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_absent_fails_without_inserting() {
        let store = MemoryStore::new().unwrap();
        let err = store.update(widget("ghost")).unwrap_err();

        assert!(matches!(err, StoreError::NotFound { .. }));
        assert!(store.is_empty());
    }

    #[test]
    fn remove_many_removes_present_and_skips_absent() {
        let store = MemoryStore::new().unwrap();
        store
            .add_many(vec![widget("a"), widget("b"), widget("c")])
            .unwrap();

        store
            .remove_many(&[widget("a"), widget("ghost"), widget("c")])
            .unwrap();

        assert_eq!(store.len(), 1);
        assert!(store.find(&Key::from("b")).is_ok());
    }

    #[test]
    fn remove_absent_is_noop() {
        let store = MemoryStore::new().unwrap();
        store.add(widget("a")).unwrap();

        store.remove(&widget("ghost")).unwrap();
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn snapshots_are_detached() {
        let store = MemoryStore::new().unwrap();
        store.add(widget("a")).unwrap();

        let before = store.all().unwrap();
        store.add(widget("b")).unwrap();

        assert_eq!(before.len(), 1);
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn async_forms_share_semantics() {
        let store = MemoryStore::new().unwrap();
        store.add_async(widget("001")).await.unwrap();

        let err = store.add_async(widget("001")).await.unwrap_err();
        assert!(matches!(err, StoreError::DuplicateKey { .. }));

        let found = store.find_async(&Key::from("001")).await.unwrap();
        assert_eq!(found.sku, "001");

        store.clear_async().await.unwrap();
        assert!(store.all_async().await.unwrap().is_empty());
    }
}
