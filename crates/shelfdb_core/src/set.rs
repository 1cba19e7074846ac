//! Typed collection façade.
//!
//! `EntitySet<T>` is the user-facing handle bound to one store. It adds
//! pre-mutation hook points and language-native querying: filtering is
//! done with plain iterator adapters over a detached snapshot, not a DSL.
//!
//! ```rust,ignore
//! let widgets = context.set::<Widget>().unwrap();
//! let cheap: Vec<Widget> = widgets.iter()?.filter(|w| w.price < 10).collect();
//! ```

use crate::entity::Entity;
use crate::error::StoreResult;
use crate::key::Key;
use crate::store::{Backend, Store};

/// A fallible pre-mutation callback. Returning an error vetoes the
/// mutation before the store is touched.
pub type Hook<T> = Box<dyn Fn(&T) -> StoreResult<()> + Send + Sync>;

/// Pre-mutation hook points for an [`EntitySet`].
///
/// Hooks run for both the blocking and async forms, before the store lock
/// is taken. Batch operations invoke the hook once per record.
pub struct Hooks<T> {
    before_add: Option<Hook<T>>,
    before_update: Option<Hook<T>>,
    before_remove: Option<Hook<T>>,
}

impl<T> Default for Hooks<T> {
    fn default() -> Self {
        Self {
            before_add: None,
            before_update: None,
            before_remove: None,
        }
    }
}

impl<T> Hooks<T> {
    /// Creates an empty hook set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the hook run before every add.
    #[must_use]
    pub fn before_add(mut self, hook: impl Fn(&T) -> StoreResult<()> + Send + Sync + 'static) -> Self {
        self.before_add = Some(Box::new(hook));
        self
    }

    /// Sets the hook run before every update.
    #[must_use]
    pub fn before_update(
        mut self,
        hook: impl Fn(&T) -> StoreResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.before_update = Some(Box::new(hook));
        self
    }

    /// Sets the hook run before every remove.
    #[must_use]
    pub fn before_remove(
        mut self,
        hook: impl Fn(&T) -> StoreResult<()> + Send + Sync + 'static,
    ) -> Self {
        self.before_remove = Some(Box::new(hook));
        self
    }
}

fn run<T>(hook: &Option<Hook<T>>, item: &T) -> StoreResult<()> {
    match hook {
        Some(hook) => hook(item),
        None => Ok(()),
    }
}

fn run_each<'a, T: 'a>(
    hook: &Option<Hook<T>>,
    items: impl IntoIterator<Item = &'a T>,
) -> StoreResult<()> {
    if let Some(hook) = hook {
        for item in items {
            hook(item)?;
        }
    }
    Ok(())
}

/// The typed collection handle bound to one store instance.
pub struct EntitySet<T: Entity> {
    store: Backend<T>,
    hooks: Hooks<T>,
}

impl<T: Entity> EntitySet<T> {
    /// Creates a set over `store` with the given hooks.
    pub fn new(store: Backend<T>, hooks: Hooks<T>) -> Self {
        Self { store, hooks }
    }

    /// Looks up the record stored under `key`.
    pub fn find(&self, key: impl Into<Key>) -> StoreResult<T> {
        self.store.find(&key.into())
    }

    /// Returns a detached snapshot of every record.
    pub fn all(&self) -> StoreResult<Vec<T>> {
        self.store.all()
    }

    /// Returns a detached, filterable iterator over the collection.
    ///
    /// The snapshot is materialized before the iterator is handed out, so
    /// later mutations never affect it.
    pub fn iter(&self) -> StoreResult<std::vec::IntoIter<T>> {
        Ok(self.all()?.into_iter())
    }

    /// Alias for [`EntitySet::iter`], for query-style call sites.
    pub fn query(&self) -> StoreResult<std::vec::IntoIter<T>> {
        self.iter()
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// Returns `true` when the collection is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Adds one record. See [`Store::add`].
    pub fn add(&self, item: T) -> StoreResult<()> {
        run(&self.hooks.before_add, &item)?;
        self.store.add(item)
    }

    /// Adds a batch of records atomically. See [`Store::add_many`].
    pub fn add_many(&self, items: Vec<T>) -> StoreResult<()> {
        run_each(&self.hooks.before_add, &items)?;
        self.store.add_many(items)
    }

    /// Replaces the record stored under the item's key. See
    /// [`Store::update`].
    pub fn update(&self, item: T) -> StoreResult<T> {
        run(&self.hooks.before_update, &item)?;
        self.store.update(item)
    }

    /// Removes the record sharing `item`'s key. See [`Store::remove`].
    pub fn remove(&self, item: &T) -> StoreResult<()> {
        run(&self.hooks.before_remove, item)?;
        self.store.remove(item)
    }

    /// Removes every record sharing a key with `items`. See
    /// [`Store::remove_many`].
    pub fn remove_many(&self, items: &[T]) -> StoreResult<()> {
        run_each(&self.hooks.before_remove, items)?;
        self.store.remove_many(items)
    }

    /// Removes every record. See [`Store::clear`].
    pub fn clear(&self) -> StoreResult<()> {
        self.store.clear()
    }

    /// Async form of [`EntitySet::find`].
    pub async fn find_async(&self, key: impl Into<Key>) -> StoreResult<T> {
        self.store.find_async(&key.into()).await
    }

    /// Async form of [`EntitySet::all`].
    pub async fn all_async(&self) -> StoreResult<Vec<T>> {
        self.store.all_async().await
    }

    /// Async form of [`EntitySet::add`].
    pub async fn add_async(&self, item: T) -> StoreResult<()> {
        run(&self.hooks.before_add, &item)?;
        self.store.add_async(item).await
    }

    /// Async form of [`EntitySet::add_many`].
    pub async fn add_many_async(&self, items: Vec<T>) -> StoreResult<()> {
        run_each(&self.hooks.before_add, &items)?;
        self.store.add_many_async(items).await
    }

    /// Async form of [`EntitySet::update`].
    pub async fn update_async(&self, item: T) -> StoreResult<T> {
        run(&self.hooks.before_update, &item)?;
        self.store.update_async(item).await
    }

    /// Async form of [`EntitySet::remove`].
    pub async fn remove_async(&self, item: &T) -> StoreResult<()> {
        run(&self.hooks.before_remove, item)?;
        self.store.remove_async(item).await
    }

    /// Async form of [`EntitySet::remove_many`].
    pub async fn remove_many_async(&self, items: &[T]) -> StoreResult<()> {
        run_each(&self.hooks.before_remove, items)?;
        self.store.remove_many_async(items).await
    }

    /// Async form of [`EntitySet::clear`].
    pub async fn clear_async(&self) -> StoreResult<()> {
        self.store.clear_async().await
    }
}
