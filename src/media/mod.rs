//! Media catalog
//!
//! Classifies remote files by extension and builds the flat, traversal
//! ordered list the review works through.

mod catalog;
mod kind;

pub use catalog::{build_catalog, filter, DisplayFlags, MediaEntry};
pub use kind::{MediaKind, IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};
