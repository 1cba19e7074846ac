//! Context: the registry binding record types to stores.

use crate::config::{Config, Provider};
use crate::dir::DirLock;
use crate::entity::Entity;
use crate::error::{StoreError, StoreResult};
use crate::set::{EntitySet, Hooks};
use crate::store::{Backend, FileStore, KeyedCodec, LineCodec, MemoryStore};
use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// A logical database: one store per declared record type, all sharing one
/// configuration.
///
/// A context is constructed once, eagerly: every declared collection is
/// validated and loaded before [`ContextBuilder::build`] returns. Stores
/// live as long as the context and are never implicitly recreated; to see
/// files changed from outside, build a new context.
///
/// # Example
///
/// ```rust,ignore
/// let context = Context::builder(Config::line_file("./data"))
///     .entity::<Movie>()
///     .entity::<Actor>()
///     .build()?;
///
/// let movies = context.set::<Movie>().expect("declared above");
/// movies.add(Movie { id, title: "Heat".into() })?;
/// ```
pub struct Context {
    provider: Provider,
    sets: HashMap<TypeId, Box<dyn Any + Send + Sync>>,
    // Held for the lifetime of the context; one context per directory.
    _lock: Option<DirLock>,
}

impl Context {
    /// Starts building a context over `config`.
    #[must_use]
    pub fn builder(config: Config) -> ContextBuilder {
        ContextBuilder {
            config,
            registrations: Vec::new(),
        }
    }

    /// Returns the typed set for `T`, or `None` when `T` was never
    /// declared on the builder.
    #[must_use]
    pub fn set<T: Entity>(&self) -> Option<Arc<EntitySet<T>>> {
        self.sets
            .get(&TypeId::of::<T>())?
            .downcast_ref::<Arc<EntitySet<T>>>()
            .cloned()
    }

    /// The backend strategy this context was built with.
    #[must_use]
    pub fn provider(&self) -> Provider {
        self.provider
    }

    /// The number of declared record types.
    #[must_use]
    pub fn set_count(&self) -> usize {
        self.sets.len()
    }
}

struct Registration {
    type_id: TypeId,
    entity: &'static str,
    build: Box<dyn FnOnce(&Config) -> StoreResult<Box<dyn Any + Send + Sync>>>,
}

/// Declarative registration of record types, run eagerly at
/// [`ContextBuilder::build`].
pub struct ContextBuilder {
    config: Config,
    registrations: Vec<Registration>,
}

impl ContextBuilder {
    /// Declares a record type slot.
    #[must_use]
    pub fn entity<T: Entity>(self) -> Self {
        self.entity_with::<T>(Hooks::new())
    }

    /// Declares a record type slot with pre-mutation hooks.
    #[must_use]
    pub fn entity_with<T: Entity>(mut self, hooks: Hooks<T>) -> Self {
        self.registrations.push(Registration {
            type_id: TypeId::of::<T>(),
            entity: std::any::type_name::<T>(),
            build: Box::new(move |config| {
                let backend = match config.provider {
                    Provider::Memory => Backend::Memory(MemoryStore::new()?),
                    Provider::LineFile => {
                        let dir = config.require_path()?;
                        Backend::Line(FileStore::open(LineCodec::new(dir, T::collection()))?)
                    }
                    Provider::KeyedFile => {
                        let dir = config.require_path()?;
                        Backend::Keyed(FileStore::open(KeyedCodec::new(dir, T::collection()))?)
                    }
                };
                Ok(Box::new(Arc::new(EntitySet::new(backend, hooks))))
            }),
        });
        self
    }

    /// Builds the context: acquires the storage directory (file providers
    /// only), then constructs exactly one store per declared type.
    ///
    /// Fails with [`StoreError::DuplicateEntityType`] when a type was
    /// declared twice, and propagates every store-construction error
    /// (configuration, identity validation, load failures) synchronously.
    pub fn build(self) -> StoreResult<Context> {
        let lock = match self.config.provider {
            Provider::Memory => None,
            Provider::LineFile | Provider::KeyedFile => {
                Some(DirLock::acquire(self.config.require_path()?)?)
            }
        };

        let mut sets: HashMap<TypeId, Box<dyn Any + Send + Sync>> = HashMap::new();
        for registration in self.registrations {
            if sets.contains_key(&registration.type_id) {
                return Err(StoreError::DuplicateEntityType {
                    entity: registration.entity,
                });
            }
            let set = (registration.build)(&self.config)?;
            sets.insert(registration.type_id, set);
        }

        debug!(
            provider = ?self.config.provider,
            sets = sets.len(),
            "context built"
        );

        Ok(Context {
            provider: self.config.provider,
            sets,
            _lock: lock,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::IdentityField;
    use crate::key::{Key, KeyKind};
    use serde::{Deserialize, Serialize};
    use tempfile::tempdir;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Movie {
        id: String,
        title: String,
    }

    impl Entity for Movie {
        fn collection() -> &'static str {
            "movies"
        }

        fn identity_fields() -> &'static [IdentityField<Self>] {
            const FIELDS: &[IdentityField<Movie>] = &[IdentityField {
                name: "id",
                kind: KeyKind::Text,
                get: |m| Key::Text(m.id.clone()),
            }];
            FIELDS
        }
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Actor {
        id: String,
    }

    impl Entity for Actor {
        fn collection() -> &'static str {
            "actors"
        }

        fn identity_fields() -> &'static [IdentityField<Self>] {
            const FIELDS: &[IdentityField<Actor>] = &[IdentityField {
                name: "id",
                kind: KeyKind::Text,
                get: |a| Key::Text(a.id.clone()),
            }];
            FIELDS
        }
    }

    #[test]
    fn declared_types_get_distinct_sets() {
        let context = Context::builder(Config::memory())
            .entity::<Movie>()
            .entity::<Actor>()
            .build()
            .unwrap();

        assert!(context.set::<Movie>().is_some());
        assert!(context.set::<Actor>().is_some());
        assert_eq!(context.set_count(), 2);
    }

    #[test]
    fn undeclared_type_returns_none() {
        let context = Context::builder(Config::memory()).build().unwrap();
        assert!(context.set::<Movie>().is_none());
    }

    #[test]
    fn duplicate_registration_fails() {
        let result = Context::builder(Config::memory())
            .entity::<Movie>()
            .entity::<Movie>()
            .build();

        assert!(matches!(
            result,
            Err(StoreError::DuplicateEntityType { .. })
        ));
    }

    #[test]
    fn file_provider_without_path_fails_naming_the_key() {
        let config = Config {
            provider: Provider::LineFile,
            path: None,
        };
        let err = Context::builder(config)
            .entity::<Movie>()
            .build()
            .err()
            .expect("build should fail");
        assert!(err.to_string().contains("`path`"));
    }

    #[test]
    fn second_context_on_same_directory_is_rejected() {
        let temp = tempdir().unwrap();

        let _held = Context::builder(Config::line_file(temp.path()))
            .entity::<Movie>()
            .build()
            .unwrap();

        let second = Context::builder(Config::line_file(temp.path()))
            .entity::<Movie>()
            .build();
        assert!(matches!(second, Err(StoreError::DirectoryLocked)));
    }

    #[test]
    fn line_context_persists_across_rebuilds() {
        let temp = tempdir().unwrap();

        {
            let context = Context::builder(Config::line_file(temp.path()))
                .entity::<Movie>()
                .build()
                .unwrap();
            let movies = context.set::<Movie>().unwrap();
            movies
                .add(Movie {
                    id: "m1".into(),
                    title: "Heat".into(),
                })
                .unwrap();
        }

        let context = Context::builder(Config::line_file(temp.path()))
            .entity::<Movie>()
            .build()
            .unwrap();
        let movies = context.set::<Movie>().unwrap();
        assert_eq!(movies.find("m1").unwrap().title, "Heat");
    }

    #[test]
    fn connection_string_builds_a_context() {
        let temp = tempdir().unwrap();
        let connection = format!("provider=line;path={}", temp.path().display());

        let config = Config::from_connection_string(&connection).unwrap();
        let context = Context::builder(config).entity::<Movie>().build().unwrap();
        assert_eq!(context.provider(), Provider::LineFile);
    }
}
