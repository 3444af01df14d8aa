//! Review engine
//!
//! Owns the catalog, the review machine and the persisted state, and runs
//! the remote side effects (catalog rebuild, commit, cache clear, import)
//! through the shared [`RemoteFs`]. State is saved after every mutation.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use super::{Checkpoint, PendingDeletes, ReviewError, ReviewMachine, ReviewPhase, Step, UndoOutcome};
use crate::commit::{BulkCommitter, CommitReport};
use crate::config::{AppConfig, ConfigStorage, Keychain};
use crate::error::EngineResult;
use crate::maintenance::{self, CacheClearReport, ImportReport};
use crate::media::{build_catalog, filter, DisplayFlags, MediaEntry};
use crate::remote::RemoteFs;

/// What the caller should show when a commit is requested
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitStart {
    /// Commit dialog is open over these paths
    Ready { paths: Vec<String> },
    /// Early commit asked for with an empty queue; nothing changed
    NothingQueued,
}

/// Result of a confirmed commit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitResolution {
    pub report: CommitReport,
    /// `false` when the post-commit rebuild failed and the previous catalog
    /// was pruned locally instead
    pub catalog_refreshed: bool,
    /// Set when the deletes ran but the new state could not be saved. The
    /// in-memory state has moved on regardless.
    pub persist_error: Option<String>,
}

pub struct ReviewEngine {
    fs: Arc<dyn RemoteFs>,
    storage: ConfigStorage,
    config: AppConfig,
    catalog: Vec<MediaEntry>,
    machine: ReviewMachine,
}

impl ReviewEngine {
    /// Build the catalog under `originals_root` and resume at the persisted
    /// position with the persisted queue. `fs` must already be connected.
    pub async fn open(
        fs: Arc<dyn RemoteFs>,
        storage: ConfigStorage,
        config: AppConfig,
    ) -> EngineResult<Self> {
        let catalog = build_catalog(fs.as_ref(), &config.originals_root).await?;
        let entries = filter(&catalog, config.display_flags());
        let pending = PendingDeletes::from(config.pending_deletes.clone());
        let machine = ReviewMachine::resume(entries, config.last_index, pending);

        info!(
            "Review resumed at {} of {} ({} queued)",
            machine.index(),
            machine.len(),
            machine.pending().len()
        );

        Ok(Self {
            fs,
            storage,
            config,
            catalog,
            machine,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn fs(&self) -> &dyn RemoteFs {
        self.fs.as_ref()
    }

    /// Full, unfiltered catalog
    pub fn catalog(&self) -> &[MediaEntry] {
        &self.catalog
    }

    /// Filtered list under review
    pub fn entries(&self) -> &[MediaEntry] {
        self.machine.entries()
    }

    pub fn current(&self) -> Option<&MediaEntry> {
        self.machine.current()
    }

    pub fn index(&self) -> usize {
        self.machine.index()
    }

    pub fn len(&self) -> usize {
        self.machine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.machine.is_empty()
    }

    pub fn phase(&self) -> ReviewPhase {
        self.machine.phase()
    }

    pub fn pending(&self) -> &PendingDeletes {
        self.machine.pending()
    }

    pub async fn keep(&mut self) -> EngineResult<Step> {
        let checkpoint = self.machine.checkpoint();
        let step = self.machine.keep()?;
        self.persist_or_restore(checkpoint).await?;
        Ok(step)
    }

    pub async fn delete_current(&mut self) -> EngineResult<Step> {
        let checkpoint = self.machine.checkpoint();
        let step = self.machine.delete_current()?;
        self.persist_or_restore(checkpoint).await?;
        Ok(step)
    }

    pub async fn undo(&mut self) -> EngineResult<UndoOutcome> {
        let checkpoint = self.machine.checkpoint();
        let outcome = self.machine.undo()?;
        if outcome != UndoOutcome::NothingToUndo {
            self.persist_or_restore(checkpoint).await?;
        }
        Ok(outcome)
    }

    /// Open the commit flow after reaching the end. Offered even when
    /// nothing is queued.
    pub fn begin_commit(&mut self) -> EngineResult<CommitStart> {
        if self.machine.phase() != ReviewPhase::AtEnd {
            return Err(ReviewError::WrongPhase {
                operation: "begin_commit",
                phase: self.machine.phase(),
            }
            .into());
        }
        let paths = self.machine.begin_commit()?;
        Ok(CommitStart::Ready { paths })
    }

    /// Open the commit flow early, before reaching the end
    pub fn bulk_commit_now(&mut self) -> EngineResult<CommitStart> {
        if self.machine.pending().is_empty() {
            info!("Bulk commit requested with an empty queue");
            return Ok(CommitStart::NothingQueued);
        }
        let paths = self.machine.begin_commit()?;
        Ok(CommitStart::Ready { paths })
    }

    /// Delete every queued path, then clear the queue, rebuild the catalog
    /// and restart at index 0.
    ///
    /// An `Err` means nothing was deleted and the dialog is still open, so
    /// the caller may retry or cancel. Once deletes have run the resolution
    /// is always returned; a failed save shows up in `persist_error`.
    pub async fn confirm_commit(&mut self, backup_dir: Option<&Path>) -> EngineResult<CommitResolution> {
        if self.machine.phase() != ReviewPhase::Committing {
            return Err(ReviewError::WrongPhase {
                operation: "confirm_commit",
                phase: self.machine.phase(),
            }
            .into());
        }

        let paths = self.machine.pending().to_vec();
        let report = BulkCommitter::new(self.fs.as_ref())
            .with_backup(backup_dir)
            .commit(&paths)
            .await?;

        let catalog_refreshed = match build_catalog(self.fs.as_ref(), &self.config.originals_root).await {
            Ok(catalog) => {
                self.catalog = catalog;
                true
            }
            Err(e) => {
                warn!("Catalog rebuild after commit failed, pruning locally: {}", e);
                let deleted: Vec<&String> = paths.iter().filter(|p| !report.failed.contains(p)).collect();
                self.catalog.retain(|entry| !deleted.contains(&&entry.remote_path));
                false
            }
        };

        self.machine
            .complete_commit(filter(&self.catalog, self.config.display_flags()))?;
        let persist_error = match self.persist().await {
            Ok(()) => None,
            Err(e) => {
                warn!("Commit finished but state was not saved: {}", e);
                Some(e.to_string())
            }
        };

        Ok(CommitResolution {
            report,
            catalog_refreshed,
            persist_error,
        })
    }

    /// Close the commit flow without deleting anything
    pub async fn cancel_commit(&mut self) -> EngineResult<()> {
        let checkpoint = self.machine.checkpoint();
        self.machine.cancel_commit()?;
        info!("Commit cancelled, {} still queued", self.machine.pending().len());
        self.persist_or_restore(checkpoint).await
    }

    /// Persist new flags and re-filter the current catalog
    pub async fn apply_display_flags(&mut self, flags: DisplayFlags) -> EngineResult<()> {
        self.machine
            .replace_entries(filter(&self.catalog, flags))?;
        self.config.set_display_flags(flags);
        self.persist().await
    }

    /// Rebuild the catalog from the remote root, keeping position and queue
    pub async fn refresh(&mut self) -> EngineResult<()> {
        let catalog = build_catalog(self.fs.as_ref(), &self.config.originals_root).await?;
        self.machine
            .replace_entries(filter(&catalog, self.config.display_flags()))?;
        self.catalog = catalog;
        self.persist().await
    }

    pub async fn save_progress(&mut self) -> EngineResult<()> {
        self.persist().await
    }

    pub async fn clear_cache(&self) -> EngineResult<CacheClearReport> {
        maintenance::clear_cache(self.fs.as_ref(), &self.config.cache_root).await
    }

    /// Upload into the import folder. Call [`Self::refresh`] to review the
    /// new files.
    pub async fn import_files(&self, local_paths: &[PathBuf]) -> EngineResult<ImportReport> {
        maintenance::import_files(self.fs.as_ref(), local_paths, &self.config.import_root).await
    }

    /// Disconnect and forget everything: the state file and the stored
    /// password.
    pub async fn logout(self, keychain: &Keychain) -> EngineResult<()> {
        self.fs.disconnect().await;
        self.storage.erase().await?;
        if let Some(id) = &self.config.password_keychain_id {
            keychain.delete(id)?;
        }
        info!("Logged out");
        Ok(())
    }

    async fn persist(&mut self) -> EngineResult<()> {
        self.sync_config();
        self.storage.save(&self.config).await?;
        Ok(())
    }

    /// Save, or put the machine back where it was and return the error
    async fn persist_or_restore(&mut self, checkpoint: Checkpoint) -> EngineResult<()> {
        if let Err(e) = self.persist().await {
            warn!("Save failed, step rolled back: {}", e);
            self.machine.restore(checkpoint);
            self.sync_config();
            return Err(e);
        }
        Ok(())
    }

    fn sync_config(&mut self) {
        self.config.last_index = self.machine.index();
        self.config.pending_deletes = self.machine.pending().to_vec();
    }
}
