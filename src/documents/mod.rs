//! Article documents on local storage.
//!
//! - **Document**: one JSON article with required `title`/`content` fields and
//!   optional per-generator augmentation fields
//! - **Guard**: decides whether a generator already augmented a document
//! - **Store**: enumerates a directory tree and loads/persists documents atomically
//! - **Coverage**: read-only per-generator progress over a tree

pub mod coverage;
pub mod document;
pub mod guard;
pub mod store;

pub use coverage::CoverageReport;
pub use document::{
    is_reserved_field, normalize_key, Document, CONTENT_FIELD, METADATA_FIELDS, TITLE_FIELD,
};
pub use guard::already_done;
pub use store::{DocumentStore, DEFAULT_EXTENSION};
