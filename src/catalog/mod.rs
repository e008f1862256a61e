//! Catalog artifact handling
//!
//! This module owns everything about the produced catalog: the data
//! model, crash-safe persistence, the freshness cache over previous
//! runs, and the name normalization shared with the artifact's readers.

mod cache;
mod model;
mod names;
mod store;

pub use cache::{path_key, CacheIndex};
pub use model::{CatalogSnapshot, Category, Product, Subcategory};
pub use names::{canonical_key, slugify};
pub use store::{checkpoint_path, SnapshotStore};
