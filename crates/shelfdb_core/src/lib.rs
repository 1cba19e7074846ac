//! # shelfdb
//!
//! A lightweight, embeddable persistence layer that keeps typed record
//! collections simultaneously in memory and on durable storage, under
//! concurrent access.
//!
//! Every mutation is durable before the call returns (or before the
//! returned future resolves); readers get detached snapshots and never
//! observe a torn write. Three backends share one contract:
//!
//! - **memory** - in-process dictionary, no persistence
//! - **line** - one newline-delimited JSON file per collection; cheap
//!   appends, whole-file rewrites on point mutations
//! - **keyed** - one CBOR file per record, named by its UUID identity
//!
//! Filtering is language-native: iterate a detached snapshot with plain
//! iterator adapters. There is no query DSL, no transaction log, and no
//! cross-process coordination beyond refusing to share a directory.
//!
//! ## Example
//!
//! ```rust
//! use serde::{Deserialize, Serialize};
//! use shelfdb_core::{Config, Context, Entity, IdentityField, Key, KeyKind};
//!
//! #[derive(Debug, Clone, Serialize, Deserialize)]
//! struct Widget {
//!     sku: String,
//!     price: u32,
//! }
//!
//! impl Entity for Widget {
//!     fn collection() -> &'static str {
//!         "widgets"
//!     }
//!
//!     fn identity_fields() -> &'static [IdentityField<Self>] {
//!         const FIELDS: &[IdentityField<Widget>] = &[IdentityField {
//!             name: "sku",
//!             kind: KeyKind::Text,
//!             get: |w| Key::Text(w.sku.clone()),
//!         }];
//!         FIELDS
//!     }
//! }
//!
//! # fn main() -> shelfdb_core::StoreResult<()> {
//! let context = Context::builder(Config::memory())
//!     .entity::<Widget>()
//!     .build()?;
//!
//! let widgets = context.set::<Widget>().expect("declared above");
//! widgets.add(Widget { sku: "001".into(), price: 200 })?;
//!
//! let cheap: Vec<Widget> = widgets.iter()?.filter(|w| w.price < 500).collect();
//! assert_eq!(cheap.len(), 1);
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod context;
mod dir;
mod entity;
mod error;
mod key;
mod set;
pub mod store;

pub use config::{Config, Provider, PATH_KEY, PROVIDER_KEY};
pub use context::{Context, ContextBuilder};
pub use dir::{ensure_dir, ensure_file, DirLock};
pub use entity::{identity_kind, resolve_identity, resolve_key, Entity, IdentityField};
pub use error::{StoreError, StoreResult};
pub use key::{Key, KeyKind};
pub use set::{EntitySet, Hook, Hooks};
pub use store::{Backend, FileCodec, FileStore, KeyedCodec, LineCodec, MemoryStore, Store};
