//! Fixture record shapes and context helpers.

use serde::{Deserialize, Serialize};
use shelfdb_core::{
    Config, Context, Entity, EntitySet, IdentityField, Key, KeyKind,
};
use std::sync::Arc;
use tempfile::TempDir;
use uuid::Uuid;

/// A record with a text identity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Widget {
    /// Stock-keeping unit; the identity.
    pub sku: String,
    /// Display name.
    pub name: String,
    /// Price in cents.
    pub price: u32,
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

/// A record with a UUID identity, usable with every backend including
/// the keyed-file codec.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// The identity.
    pub id: Uuid,
    /// Body text.
    pub body: String,
}

impl Entity for Document {
    fn collection() -> &'static str {
        "documents"
    }

    fn identity_fields() -> &'static [IdentityField<Self>] {
        const FIELDS: &[IdentityField<Document>] = &[IdentityField {
            name: "id",
            kind: KeyKind::Uuid,
            get: |d| Key::Uuid(d.id),
        }];
        FIELDS
    }
}

/// A record with no declared identity; stores assign surrogate keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tally {
    /// Arbitrary payload.
    pub count: u32,
}

impl Entity for Tally {
    fn collection() -> &'static str {
        "tallies"
    }

    fn identity_fields() -> &'static [IdentityField<Self>] {
        &[]
    }
}

/// A deliberately broken shape declaring two identity fields; store
/// construction over it must fail with an ambiguous-identity error.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collision {
    /// First claimed identity.
    pub first: String,
    /// Second claimed identity.
    pub second: String,
}

impl Entity for Collision {
    fn collection() -> &'static str {
        "collisions"
    }

    fn identity_fields() -> &'static [IdentityField<Self>] {
        const FIELDS: &[IdentityField<Collision>] = &[
            IdentityField {
                name: "first",
                kind: KeyKind::Text,
                get: |c| Key::Text(c.first.clone()),
            },
            IdentityField {
                name: "second",
                kind: KeyKind::Text,
                get: |c| Key::Text(c.second.clone()),
            },
        ];
        FIELDS
    }
}

/// Builds a widget.
#[must_use]
pub fn widget(sku: &str, price: u32) -> Widget {
    Widget {
        sku: sku.into(),
        name: format!("widget {sku}"),
        price,
    }
}

/// Builds a document with a fresh UUID.
#[must_use]
pub fn document(body: &str) -> Document {
    Document {
        id: Uuid::new_v4(),
        body: body.into(),
    }
}

/// A test context with automatic cleanup.
///
/// Memory and line-file contexts declare [`Widget`], [`Document`], and
/// [`Tally`]; keyed-file contexts declare only [`Document`], since the
/// keyed codec requires a UUID identity.
pub struct TestContext {
    /// The context under test.
    pub context: Context,
    /// The temporary directory, kept alive until the context drops.
    temp_dir: Option<TempDir>,
}

impl TestContext {
    /// Creates a memory-backed test context.
    #[must_use]
    pub fn memory() -> Self {
        Self::build(Config::memory(), None)
    }

    /// Creates a line-file test context over a fresh temporary directory.
    #[must_use]
    pub fn line_file() -> Self {
        let temp = TempDir::new().expect("create temp directory");
        Self::build(Config::line_file(temp.path()), Some(temp))
    }

    /// Creates a keyed-file test context over a fresh temporary directory.
    #[must_use]
    pub fn keyed_file() -> Self {
        let temp = TempDir::new().expect("create temp directory");
        let context = Context::builder(Config::keyed_file(temp.path()))
            .entity::<Document>()
            .build()
            .expect("build test context");
        Self {
            context,
            temp_dir: Some(temp),
        }
    }

    fn build(config: Config, temp_dir: Option<TempDir>) -> Self {
        let context = Context::builder(config)
            .entity::<Widget>()
            .entity::<Document>()
            .entity::<Tally>()
            .build()
            .expect("build test context");
        Self {
            context,
            temp_dir,
        }
    }

    /// The widget set.
    #[must_use]
    pub fn widgets(&self) -> Arc<EntitySet<Widget>> {
        self.context.set::<Widget>().expect("widgets declared")
    }

    /// The document set.
    #[must_use]
    pub fn documents(&self) -> Arc<EntitySet<Document>> {
        self.context.set::<Document>().expect("documents declared")
    }

    /// The tally set.
    #[must_use]
    pub fn tallies(&self) -> Arc<EntitySet<Tally>> {
        self.context.set::<Tally>().expect("tallies declared")
    }

    /// The storage directory, `None` for memory contexts.
    #[must_use]
    pub fn path(&self) -> Option<&std::path::Path> {
        self.temp_dir.as_ref().map(TempDir::path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_backend_builds() {
        for ctx in [TestContext::memory(), TestContext::line_file()] {
            assert!(ctx.widgets().is_empty());
            assert!(ctx.documents().is_empty());
            assert!(ctx.tallies().is_empty());
        }
        assert!(TestContext::keyed_file().documents().is_empty());
    }

    #[test]
    fn keyed_context_omits_text_keyed_sets() {
        let ctx = TestContext::keyed_file();
        assert!(ctx.context.set::<Widget>().is_none());
    }

    #[test]
    fn fixture_builders_fill_fields() {
        let w = widget("001", 250);
        assert_eq!(w.sku, "001");
        assert_eq!(w.price, 250);
        let a = document("alpha");
        let b = document("alpha");
        assert_ne!(a.id, b.id);
    }
}
