//! Review state machine
//!
//! Pure: no I/O, no persistence. [`super::ReviewEngine`] drives it and
//! saves after every mutation.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{PendingDeletes, ReviewError};
use crate::media::MediaEntry;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReviewPhase {
    /// An item is on screen
    Browsing,
    /// Index has run past the last item; the commit flow is due
    AtEnd,
    /// Commit dialog open; navigation is locked
    Committing,
}

/// Result of keep/delete
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Advanced { index: usize },
    ReachedEnd,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UndoOutcome {
    /// Already at the first item; callers usually just beep
    NothingToUndo,
    Undone {
        index: usize,
        /// Path taken back out of the pending-delete queue, if it was queued
        unqueued: Option<String>,
    },
}

/// Position, queue and phase at one moment, for rolling back a step
/// whose save failed. The entry list is not included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    index: usize,
    pending: PendingDeletes,
    phase: ReviewPhase,
}

#[derive(Debug, Clone)]
pub struct ReviewMachine {
    entries: Vec<MediaEntry>,
    index: usize,
    pending: PendingDeletes,
    phase: ReviewPhase,
}

impl ReviewMachine {
    /// Resume over `entries` at `min(index, len - 1)`
    pub fn resume(entries: Vec<MediaEntry>, index: usize, pending: PendingDeletes) -> Self {
        let mut machine = Self {
            entries,
            index: 0,
            pending,
            phase: ReviewPhase::Browsing,
        };
        machine.index = machine.clamped(index);
        machine
    }

    pub fn entries(&self) -> &[MediaEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn phase(&self) -> ReviewPhase {
        self.phase
    }

    pub fn pending(&self) -> &PendingDeletes {
        &self.pending
    }

    /// Item under review; `None` at the end or on an empty list
    pub fn current(&self) -> Option<&MediaEntry> {
        match self.phase {
            ReviewPhase::Browsing => self.entries.get(self.index),
            _ => None,
        }
    }

    pub fn keep(&mut self) -> Result<Step, ReviewError> {
        self.require_current("keep")?;
        self.index += 1;

        if self.index == self.entries.len() {
            self.phase = ReviewPhase::AtEnd;
            debug!("Reached end of {} items", self.entries.len());
            Ok(Step::ReachedEnd)
        } else {
            Ok(Step::Advanced { index: self.index })
        }
    }

    /// Queue the current item (once) and advance
    pub fn delete_current(&mut self) -> Result<Step, ReviewError> {
        let path = self.require_current("delete")?.remote_path.clone();
        if !self.pending.insert(path.clone()) {
            debug!("{} already queued", path);
        }
        self.keep()
    }

    /// Step back one item and un-queue it if it was queued.
    /// Allowed from Browsing and AtEnd.
    pub fn undo(&mut self) -> Result<UndoOutcome, ReviewError> {
        if self.phase == ReviewPhase::Committing {
            return Err(ReviewError::WrongPhase {
                operation: "undo",
                phase: self.phase,
            });
        }
        if self.index == 0 {
            return Ok(UndoOutcome::NothingToUndo);
        }

        self.index -= 1;
        self.phase = ReviewPhase::Browsing;
        let path = &self.entries[self.index].remote_path;
        let unqueued = self.pending.remove(path).then(|| path.clone());

        Ok(UndoOutcome::Undone {
            index: self.index,
            unqueued,
        })
    }

    /// Enter Committing; returns the queue snapshot to commit
    pub fn begin_commit(&mut self) -> Result<Vec<String>, ReviewError> {
        if self.phase == ReviewPhase::Committing {
            return Err(ReviewError::WrongPhase {
                operation: "begin_commit",
                phase: self.phase,
            });
        }
        self.phase = ReviewPhase::Committing;
        Ok(self.pending.to_vec())
    }

    /// Leave Committing without deleting. Queue is untouched; an index past
    /// the end is pulled back onto the last item.
    pub fn cancel_commit(&mut self) -> Result<(), ReviewError> {
        self.require_phase("cancel_commit", ReviewPhase::Committing)?;
        self.index = self.clamped(self.index);
        self.phase = ReviewPhase::Browsing;
        Ok(())
    }

    /// Commit confirmed: clear the queue and restart at 0 over `entries`
    pub fn complete_commit(&mut self, entries: Vec<MediaEntry>) -> Result<(), ReviewError> {
        self.require_phase("complete_commit", ReviewPhase::Committing)?;
        self.entries = entries;
        self.pending.clear();
        self.index = 0;
        self.phase = ReviewPhase::Browsing;
        Ok(())
    }

    /// Swap in a new filtered list (refresh, display flag change). The queue
    /// is kept; the index is clamped onto the new list.
    pub fn replace_entries(&mut self, entries: Vec<MediaEntry>) -> Result<(), ReviewError> {
        if self.phase == ReviewPhase::Committing {
            return Err(ReviewError::WrongPhase {
                operation: "replace_entries",
                phase: self.phase,
            });
        }
        self.entries = entries;
        self.index = self.clamped(self.index);
        self.phase = ReviewPhase::Browsing;
        Ok(())
    }

    pub fn checkpoint(&self) -> Checkpoint {
        Checkpoint {
            index: self.index,
            pending: self.pending.clone(),
            phase: self.phase,
        }
    }

    /// Roll back to `checkpoint`. Only valid over the same entry list.
    pub fn restore(&mut self, checkpoint: Checkpoint) {
        self.index = self.clamped_to_end(checkpoint.index);
        self.pending = checkpoint.pending;
        self.phase = checkpoint.phase;
    }

    fn clamped_to_end(&self, index: usize) -> usize {
        index.min(self.entries.len())
    }

    fn clamped(&self, index: usize) -> usize {
        index.min(self.entries.len().saturating_sub(1))
    }

    fn require_phase(&self, operation: &'static str, phase: ReviewPhase) -> Result<(), ReviewError> {
        if self.phase == phase {
            Ok(())
        } else {
            Err(ReviewError::WrongPhase {
                operation,
                phase: self.phase,
            })
        }
    }

    fn require_current(&self, operation: &'static str) -> Result<&MediaEntry, ReviewError> {
        self.require_phase(operation, ReviewPhase::Browsing)?;
        self.entries.get(self.index).ok_or(ReviewError::NoCurrentItem {
            index: self.index,
            len: self.entries.len(),
        })
    }
}
