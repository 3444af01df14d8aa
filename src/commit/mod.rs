//! Bulk commit of queued deletions

mod committer;

pub use committer::{BulkCommitter, CommitReport};
