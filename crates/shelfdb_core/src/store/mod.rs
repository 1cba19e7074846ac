//! Store contract and backend implementations.
//!
//! [`Store`] is the keyed collection contract; every operation has a
//! blocking form and an async twin with identical semantics. The three
//! implementations are a closed set, selected through [`Backend`]:
//!
//! - [`MemoryStore`] - in-process dictionary, no persistence
//! - [`FileStore`] with [`LineCodec`] - one newline-delimited JSON file
//! - [`FileStore`] with [`KeyedCodec`] - one CBOR file per record

mod file;
mod keyed;
mod line;
mod memory;

pub use file::{FileCodec, FileStore};
pub use keyed::KeyedCodec;
pub use line::LineCodec;
pub use memory::MemoryStore;

use crate::entity::{resolve_key, Entity};
use crate::error::{StoreError, StoreResult};
use crate::key::Key;
use std::collections::{HashMap, HashSet};

/// The keyed, lockable collection contract.
///
/// Reads return detached snapshots: a sequence obtained before a mutation
/// is never affected by it. Writers hold exclusive access for the whole
/// mutation, including the durable-write step of file-backed stores, so the
/// in-memory dictionary and the durable representation are never observed
/// out of step.
///
/// The blocking forms must not be called from async contexts; use the
/// `_async` twins there. Dropping an async mutation's future cancels it
/// only while it waits for the lock: once the critical section has begun,
/// the mutation runs to completion and the next acquisition observes
/// either all of it or none of it.
#[allow(async_fn_in_trait)]
pub trait Store<T: Entity> {
    /// Looks up the record stored under `key`.
    ///
    /// Fails with [`StoreError::NotFound`] when the key is absent.
    fn find(&self, key: &Key) -> StoreResult<T>;

    /// Returns a detached snapshot of every record.
    fn all(&self) -> StoreResult<Vec<T>>;

    /// Adds one record.
    ///
    /// Fails with [`StoreError::DuplicateKey`] when its key is already
    /// present; the store is unchanged on failure.
    fn add(&self, item: T) -> StoreResult<()>;

    /// Adds a batch of records atomically.
    ///
    /// Every key is validated (against the store and within the batch)
    /// before anything is written; a duplicate fails the whole batch with
    /// no effect, naming the conflicting key.
    fn add_many(&self, items: Vec<T>) -> StoreResult<()>;

    /// Replaces the record stored under the item's key and returns the
    /// stored value.
    ///
    /// Fails with [`StoreError::NotFound`] when the key is absent; absent
    /// keys are never inserted by `update`.
    fn update(&self, item: T) -> StoreResult<T>;

    /// Removes the record sharing `item`'s key. A no-op when absent.
    fn remove(&self, item: &T) -> StoreResult<()>;

    /// Removes every record sharing a key with `items`. Absent keys are
    /// skipped.
    fn remove_many(&self, items: &[T]) -> StoreResult<()>;

    /// Removes every record. Unconditional, durable, and idempotent.
    fn clear(&self) -> StoreResult<()>;

    /// Returns the number of records.
    fn len(&self) -> usize;

    /// Returns `true` when the store holds no records.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Async form of [`Store::find`].
    async fn find_async(&self, key: &Key) -> StoreResult<T>;

    /// Async form of [`Store::all`].
    async fn all_async(&self) -> StoreResult<Vec<T>>;

    /// Async form of [`Store::add`].
    async fn add_async(&self, item: T) -> StoreResult<()>;

    /// Async form of [`Store::add_many`].
    async fn add_many_async(&self, items: Vec<T>) -> StoreResult<()>;

    /// Async form of [`Store::update`].
    async fn update_async(&self, item: T) -> StoreResult<T>;

    /// Async form of [`Store::remove`].
    async fn remove_async(&self, item: &T) -> StoreResult<()>;

    /// Async form of [`Store::remove_many`].
    async fn remove_many_async(&self, items: &[T]) -> StoreResult<()>;

    /// Async form of [`Store::clear`].
    async fn clear_async(&self) -> StoreResult<()>;
}

/// A store selected from the closed backend set.
///
/// Contexts hold their stores through this enum so that provider selection
/// stays an explicit tagged choice rather than late-bound type lookup.
pub enum Backend<T: Entity> {
    /// In-memory dictionary.
    Memory(MemoryStore<T>),
    /// Line-delimited JSON file.
    Line(FileStore<T, LineCodec>),
    /// One CBOR file per record.
    Keyed(FileStore<T, KeyedCodec>),
}

macro_rules! delegate {
    ($self:ident, $store:ident => $call:expr) => {
        match $self {
            Backend::Memory($store) => $call,
            Backend::Line($store) => $call,
            Backend::Keyed($store) => $call,
        }
    };
}

impl<T: Entity> Store<T> for Backend<T> {
    fn find(&self, key: &Key) -> StoreResult<T> {
        delegate!(self, s => s.find(key))
    }

    fn all(&self) -> StoreResult<Vec<T>> {
        delegate!(self, s => s.all())
    }

    fn add(&self, item: T) -> StoreResult<()> {
        delegate!(self, s => s.add(item))
    }

    fn add_many(&self, items: Vec<T>) -> StoreResult<()> {
        delegate!(self, s => s.add_many(items))
    }

    fn update(&self, item: T) -> StoreResult<T> {
        delegate!(self, s => s.update(item))
    }

    fn remove(&self, item: &T) -> StoreResult<()> {
        delegate!(self, s => s.remove(item))
    }

    fn remove_many(&self, items: &[T]) -> StoreResult<()> {
        delegate!(self, s => s.remove_many(items))
    }

    fn clear(&self) -> StoreResult<()> {
        delegate!(self, s => s.clear())
    }

    fn len(&self) -> usize {
        delegate!(self, s => s.len())
    }

    async fn find_async(&self, key: &Key) -> StoreResult<T> {
        delegate!(self, s => s.find_async(key).await)
    }

    async fn all_async(&self) -> StoreResult<Vec<T>> {
        delegate!(self, s => s.all_async().await)
    }

    async fn add_async(&self, item: T) -> StoreResult<()> {
        delegate!(self, s => s.add_async(item).await)
    }

    async fn add_many_async(&self, items: Vec<T>) -> StoreResult<()> {
        delegate!(self, s => s.add_many_async(items).await)
    }

    async fn update_async(&self, item: T) -> StoreResult<T> {
        delegate!(self, s => s.update_async(item).await)
    }

    async fn remove_async(&self, item: &T) -> StoreResult<()> {
        delegate!(self, s => s.remove_async(item).await)
    }

    async fn remove_many_async(&self, items: &[T]) -> StoreResult<()> {
        delegate!(self, s => s.remove_many_async(items).await)
    }

    async fn clear_async(&self) -> StoreResult<()> {
        delegate!(self, s => s.clear_async().await)
    }
}

/// Resolves and validates the keys of a batch insert.
///
/// Checks each key against the existing dictionary and against the batch
/// itself, so the caller can fail before committing any effect.
pub(crate) fn validate_batch_keys<T: Entity>(
    items: &[T],
    existing: &HashMap<Key, T>,
) -> StoreResult<Vec<Key>> {
    let mut keys = Vec::with_capacity(items.len());
    let mut seen = HashSet::with_capacity(items.len());

    for item in items {
        let key = resolve_key(item)?;
        if existing.contains_key(&key) || !seen.insert(key.clone()) {
            return Err(StoreError::duplicate_key(key));
        }
        keys.push(key);
    }

    Ok(keys)
}
