//! File-backed store: an in-memory dictionary caching a durable
//! representation on disk.
//!
//! `FileStore` owns the locking discipline; the physical read/write
//! strategy is delegated to a [`FileCodec`]. Map and file are mutated under
//! one exclusive acquisition: durable writes happen inside the writer
//! critical section, and when a durable write fails the map change is
//! rolled back before the lock is released, so the public contract never
//! observes the pair out of step.
//!
//! The async forms hand the write guard and the codec call to a dedicated
//! blocking task and await its completion. A caller that drops the future
//! (a timeout, a select arm) abandons only the join: once the critical
//! section has begun, the durable write and the map commit still run to
//! completion, so cancellation can never leave the file holding a record
//! the dictionary does not.

use crate::entity::{resolve_key, Entity};
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use crate::store::{validate_batch_keys, Store};
use std::collections::HashMap;
use std::io;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// The physical serialization strategy of a [`FileStore`].
///
/// Codecs own their on-disk location. Mutation methods receive the
/// post-mutation dictionary so whole-collection strategies (the line codec)
/// can rewrite it, while per-record strategies (the keyed codec) use only
/// the keys and items handed to them.
pub trait FileCodec<T: Entity>: Send + Sync + 'static {
    /// Validates the record shape against the codec's requirements.
    ///
    /// Called before any file I/O; identity ambiguity and key-kind
    /// mismatches surface here.
    fn validate(&self) -> StoreResult<()>;

    /// Creates the durable representation when absent. Idempotent.
    fn prepare(&self) -> StoreResult<()>;

    /// Reads the whole durable representation.
    fn load(&self) -> StoreResult<Vec<T>>;

    /// Persists a batch of freshly added records.
    fn insert(&self, batch: &[(Key, T)]) -> StoreResult<()>;

    /// Persists a replacement of the record at `key`; `all` already
    /// contains the replacement.
    fn update(&self, key: &Key, item: &T, all: &HashMap<Key, T>) -> StoreResult<()>;

    /// Persists the removal of `keys`; `remaining` no longer contains them.
    fn remove(&self, keys: &[Key], remaining: &HashMap<Key, T>) -> StoreResult<()>;

    /// Replaces the durable representation with an empty one.
    fn clear(&self) -> StoreResult<()>;
}

/// A store whose dictionary caches a durable on-disk representation.
pub struct FileStore<T: Entity, C: FileCodec<T>> {
    codec: Arc<C>,
    items: Arc<RwLock<HashMap<Key, T>>>,
}

impl<T: Entity, C: FileCodec<T>> FileStore<T, C> {
    /// Opens the store, creating the durable representation when absent
    /// and loading it eagerly and synchronously.
    ///
    /// Identity validation runs before any file I/O. A duplicate key in
    /// the durable data fails the open; the store refuses to come into
    /// existence over an ambiguous cache.
    pub fn open(codec: C) -> StoreResult<Self> {
        codec.validate()?;
        codec.prepare()?;

        let records = codec.load()?;
        let mut items = HashMap::with_capacity(records.len());
        for record in records {
            let key = resolve_key(&record)?;
            if items.insert(key.clone(), record).is_some() {
                return Err(StoreError::duplicate_key(key));
            }
        }

        debug!(
            collection = T::collection(),
            count = items.len(),
            "loaded collection"
        );

        Ok(Self {
            codec: Arc::new(codec),
            items: Arc::new(RwLock::new(items)),
        })
    }
}

// The full mutation steps, shared by the blocking forms (called under a
// `blocking_write` guard) and the async forms (called on the blocking pool
// under an owned guard). Each performs the durable write and commits or
// rolls back the map before returning.
impl<T: Entity, C: FileCodec<T>> FileStore<T, C> {
    fn commit_add(codec: &C, items: &mut HashMap<Key, T>, item: T) -> StoreResult<()> {
        let key = resolve_key(&item)?;
        if items.contains_key(&key) {
            return Err(StoreError::duplicate_key(key));
        }

        let batch = [(key, item)];
        codec.insert(&batch)?;
        let [(key, item)] = batch;
        items.insert(key, item);
        Ok(())
    }

    fn commit_add_many(codec: &C, items: &mut HashMap<Key, T>, batch: Vec<T>) -> StoreResult<()> {
        let keys = validate_batch_keys(&batch, items)?;

        let batch: Vec<(Key, T)> = keys.into_iter().zip(batch).collect();
        codec.insert(&batch)?;
        items.extend(batch);
        Ok(())
    }

    fn commit_update(codec: &C, items: &mut HashMap<Key, T>, item: T) -> StoreResult<T> {
        let key = resolve_key(&item)?;
        let prev = match items.insert(key.clone(), item.clone()) {
            Some(prev) => prev,
            None => {
                items.remove(&key);
                return Err(StoreError::not_found(key));
            }
        };

        if let Err(err) = codec.update(&key, &item, items) {
            items.insert(key, prev);
            return Err(err);
        }
        Ok(item)
    }

    fn commit_remove_many(codec: &C, items: &mut HashMap<Key, T>, batch: &[T]) -> StoreResult<()> {
        let mut removed = Vec::new();
        for item in batch {
            let key = resolve_key(item)?;
            if let Some(prev) = items.remove(&key) {
                removed.push((key, prev));
            }
        }
        if removed.is_empty() {
            return Ok(());
        }

        let keys: Vec<Key> = removed.iter().map(|(key, _)| key.clone()).collect();
        if let Err(err) = codec.remove(&keys, items) {
            items.extend(removed);
            return Err(err);
        }
        Ok(())
    }

    fn commit_clear(codec: &C, items: &mut HashMap<Key, T>) -> StoreResult<()> {
        codec.clear()?;
        items.clear();
        debug!(collection = T::collection(), "cleared collection");
        Ok(())
    }

    /// Acquires the write lock, then runs `op` on the blocking pool.
    ///
    /// The guard and codec move into the spawned task, which tokio runs to
    /// completion even when the returned future is dropped; the join error
    /// only surfaces if the task panicked.
    async fn mutate_async<R>(
        &self,
        op: impl FnOnce(&C, &mut HashMap<Key, T>) -> StoreResult<R> + Send + 'static,
    ) -> StoreResult<R>
    where
        R: Send + 'static,
    {
        let mut items = Arc::clone(&self.items).write_owned().await;
        let codec = Arc::clone(&self.codec);
        tokio::task::spawn_blocking(move || op(&codec, &mut items))
            .await
            .map_err(|err| StoreError::Io(io::Error::other(err)))?
    }
}

impl<T: Entity, C: FileCodec<T>> Store<T> for FileStore<T, C> {
    fn find(&self, key: &Key) -> StoreResult<T> {
        self.items
            .blocking_read()
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key.clone()))
    }

    fn all(&self) -> StoreResult<Vec<T>> {
        Ok(self.items.blocking_read().values().cloned().collect())
    }

    fn add(&self, item: T) -> StoreResult<()> {
        Self::commit_add(&self.codec, &mut self.items.blocking_write(), item)
    }

    fn add_many(&self, batch: Vec<T>) -> StoreResult<()> {
        Self::commit_add_many(&self.codec, &mut self.items.blocking_write(), batch)
    }

    fn update(&self, item: T) -> StoreResult<T> {
        Self::commit_update(&self.codec, &mut self.items.blocking_write(), item)
    }

    fn remove(&self, item: &T) -> StoreResult<()> {
        self.remove_many(std::slice::from_ref(item))
    }

    fn remove_many(&self, batch: &[T]) -> StoreResult<()> {
        Self::commit_remove_many(&self.codec, &mut self.items.blocking_write(), batch)
    }

    fn clear(&self) -> StoreResult<()> {
        Self::commit_clear(&self.codec, &mut self.items.blocking_write())
    }

    fn len(&self) -> usize {
        self.items.blocking_read().len()
    }

    async fn find_async(&self, key: &Key) -> StoreResult<T> {
        self.items
            .read()
            .await
            .get(key)
            .cloned()
            .ok_or_else(|| StoreError::not_found(key.clone()))
    }

    async fn all_async(&self) -> StoreResult<Vec<T>> {
        Ok(self.items.read().await.values().cloned().collect())
    }

    async fn add_async(&self, item: T) -> StoreResult<()> {
        self.mutate_async(move |codec, items| Self::commit_add(codec, items, item))
            .await
    }

    async fn add_many_async(&self, batch: Vec<T>) -> StoreResult<()> {
        self.mutate_async(move |codec, items| Self::commit_add_many(codec, items, batch))
            .await
    }

    async fn update_async(&self, item: T) -> StoreResult<T> {
        self.mutate_async(move |codec, items| Self::commit_update(codec, items, item))
            .await
    }

    async fn remove_async(&self, item: &T) -> StoreResult<()> {
        let item = item.clone();
        self.mutate_async(move |codec, items| {
            Self::commit_remove_many(codec, items, std::slice::from_ref(&item))
        })
        .await
    }

    async fn remove_many_async(&self, batch: &[T]) -> StoreResult<()> {
        let batch = batch.to_vec();
        self.mutate_async(move |codec, items| Self::commit_remove_many(codec, items, &batch))
            .await
    }

    async fn clear_async(&self) -> StoreResult<()> {
        self.mutate_async(Self::commit_clear).await
    }
}
