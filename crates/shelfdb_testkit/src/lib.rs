//! # shelfdb testkit
//!
//! Test utilities for shelfdb:
//!
//! - Fixture record shapes covering every identity case (text, uuid,
//!   none, ambiguous)
//! - Temporary-context helpers with automatic cleanup
//! - Property-based generators using proptest
//!
//! ## Usage
//!
//! ```rust
//! use shelfdb_testkit::fixtures::{widget, TestContext};
//!
//! let ctx = TestContext::line_file();
//! let widgets = ctx.widgets();
//! widgets.add(widget("001", 200)).unwrap();
//! assert_eq!(widgets.len(), 1);
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;

pub use fixtures::*;
pub use generators::*;
