//! Review session: keep/delete/undo over the filtered catalog, and the
//! deferred commit of queued deletions.

mod engine;
mod machine;

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub use engine::{CommitResolution, CommitStart, ReviewEngine};
pub use machine::{Checkpoint, ReviewMachine, ReviewPhase, Step, UndoOutcome};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReviewError {
    #[error("No item to review (index {index} of {len})")]
    NoCurrentItem { index: usize, len: usize },

    #[error("Cannot {operation} while {phase:?}")]
    WrongPhase {
        operation: &'static str,
        phase: ReviewPhase,
    },
}

/// Paths queued for deletion, in queue order, without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct PendingDeletes(Vec<String>);

impl PendingDeletes {
    /// `false` if the path was already queued
    pub fn insert(&mut self, path: String) -> bool {
        if self.contains(&path) {
            return false;
        }
        self.0.push(path);
        true
    }

    /// `false` if the path was not queued
    pub fn remove(&mut self, path: &str) -> bool {
        match self.0.iter().position(|p| p == path) {
            Some(idx) => {
                self.0.remove(idx);
                true
            }
            None => false,
        }
    }

    pub fn contains(&self, path: &str) -> bool {
        self.0.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.clone()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }
}

/// Duplicates in a persisted queue collapse onto their first occurrence
impl From<Vec<String>> for PendingDeletes {
    fn from(paths: Vec<String>) -> Self {
        let mut pending = Self::default();
        for path in paths {
            pending.insert(path);
        }
        pending
    }
}

impl From<PendingDeletes> for Vec<String> {
    fn from(pending: PendingDeletes) -> Self {
        pending.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_deletes_is_an_ordered_set() {
        let mut pending = PendingDeletes::default();
        assert!(pending.insert("/b.jpg".into()));
        assert!(pending.insert("/a.jpg".into()));
        assert!(!pending.insert("/b.jpg".into()));
        assert_eq!(pending.to_vec(), vec!["/b.jpg", "/a.jpg"]);

        assert!(pending.remove("/b.jpg"));
        assert!(!pending.remove("/b.jpg"));
        assert_eq!(pending.iter().collect::<Vec<_>>(), vec!["/a.jpg"]);
    }

    #[test]
    fn test_pending_deletes_serde_dedupes() {
        let pending: PendingDeletes =
            serde_json::from_str(r#"["/x.jpg", "/y.mp4", "/x.jpg"]"#).unwrap();
        assert_eq!(pending.len(), 2);
        assert_eq!(
            serde_json::to_string(&pending).unwrap(),
            r#"["/x.jpg","/y.mp4"]"#
        );
    }

    #[test]
    fn test_review_error_messages() {
        let err = ReviewError::WrongPhase {
            operation: "undo",
            phase: ReviewPhase::Committing,
        };
        assert_eq!(err.to_string(), "Cannot undo while Committing");
    }
}
