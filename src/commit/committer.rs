use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::remote::RemoteFs;
use crate::sftp::path_utils::remote_file_name;

/// Outcome of one bulk commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommitReport {
    /// Number of paths deleted
    pub succeeded: usize,
    /// Paths whose delete failed, in commit order
    pub failed: Vec<String>,
    /// Paths whose local backup failed (the delete was still attempted)
    pub backup_failed: Vec<String>,
}

impl CommitReport {
    /// Base names of the failed paths, for display
    pub fn failed_names(&self) -> Vec<&str> {
        self.failed.iter().map(|p| remote_file_name(p)).collect()
    }
}

/// Deletes queued paths one at a time, optionally downloading each to a
/// local backup directory first. Per-file failures are collected, never
/// raised.
pub struct BulkCommitter<'a> {
    fs: &'a dyn RemoteFs,
    backup_dir: Option<&'a Path>,
}

impl<'a> BulkCommitter<'a> {
    pub fn new(fs: &'a dyn RemoteFs) -> Self {
        Self {
            fs,
            backup_dir: None,
        }
    }

    pub fn with_backup(mut self, dir: Option<&'a Path>) -> Self {
        self.backup_dir = dir;
        self
    }

    /// Commit `paths` in order.
    ///
    /// Returns `EngineError::NotConnected` only when the session is gone for
    /// every path, i.e. nothing could be attempted at all.
    pub async fn commit(&self, paths: &[String]) -> EngineResult<CommitReport> {
        let mut report = CommitReport::default();
        let mut offline = 0usize;
        info!(
            "Committing {} deletes (backup: {:?})",
            paths.len(),
            self.backup_dir
        );

        for path in paths {
            if let Some(dir) = self.backup_dir {
                let local = dir.join(remote_file_name(path));
                if let Err(e) = self.fs.download(path, &local).await {
                    warn!("Backup of {} failed: {}", path, e);
                    report.backup_failed.push(path.clone());
                }
            }

            match self.fs.remove_file(path).await {
                Ok(()) => report.succeeded += 1,
                Err(e) => {
                    if matches!(e, EngineError::NotConnected) {
                        offline += 1;
                    }
                    warn!("Delete of {} failed: {}", path, e);
                    report.failed.push(path.clone());
                }
            }
        }

        if !paths.is_empty() && offline == paths.len() {
            return Err(EngineError::NotConnected);
        }

        info!(
            "Commit finished: {} deleted, {} failed, {} backups failed",
            report.succeeded,
            report.failed.len(),
            report.backup_failed.len()
        );
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryFs;

    fn paths(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| p.to_string()).collect()
    }

    #[tokio::test]
    async fn test_commit_continues_past_failures() {
        let fs = MemoryFs::with_files(&["/p/a.jpg", "/p/b.mp4", "/p/c.png"]);
        fs.fail_remove_of("/p/b.mp4");
        let queue = paths(&["/p/a.jpg", "/p/b.mp4", "/p/c.png"]);

        let report = BulkCommitter::new(&fs).commit(&queue).await.unwrap();

        assert_eq!(report.succeeded, 2);
        assert_eq!(report.failed, vec!["/p/b.mp4"]);
        assert_eq!(report.succeeded + report.failed.len(), queue.len());
        assert_eq!(report.failed_names(), vec!["b.mp4"]);
        assert!(!fs.contains("/p/a.jpg"));
        assert!(fs.contains("/p/b.mp4"));
        assert!(!fs.contains("/p/c.png"));
    }

    #[tokio::test]
    async fn test_missing_file_is_a_per_file_failure() {
        let fs = MemoryFs::with_files(&["/p/a.jpg"]);
        let queue = paths(&["/p/gone.jpg", "/p/a.jpg"]);

        let report = BulkCommitter::new(&fs).commit(&queue).await.unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.failed, vec!["/p/gone.jpg"]);
    }

    #[tokio::test]
    async fn test_empty_queue() {
        let fs = MemoryFs::new();
        let report = BulkCommitter::new(&fs).commit(&[]).await.unwrap();
        assert_eq!(report, CommitReport::default());
    }

    #[tokio::test]
    async fn test_backup_before_delete() {
        let temp = tempfile::tempdir().unwrap();
        let fs = MemoryFs::new();
        fs.add_file("/p/2021/a.jpg", b"alpha");
        fs.add_file("/p/b.mp4", b"bravo");
        let queue = paths(&["/p/2021/a.jpg", "/p/b.mp4"]);

        let report = BulkCommitter::new(&fs)
            .with_backup(Some(temp.path()))
            .commit(&queue)
            .await
            .unwrap();

        assert_eq!(report.succeeded, 2);
        assert!(report.backup_failed.is_empty());
        assert_eq!(std::fs::read(temp.path().join("a.jpg")).unwrap(), b"alpha");
        assert_eq!(std::fs::read(temp.path().join("b.mp4")).unwrap(), b"bravo");
        assert_eq!(
            fs.calls(),
            vec![
                "download /p/2021/a.jpg",
                "remove_file /p/2021/a.jpg",
                "download /p/b.mp4",
                "remove_file /p/b.mp4",
            ]
        );
    }

    #[tokio::test]
    async fn test_failed_backup_still_deletes() {
        let temp = tempfile::tempdir().unwrap();
        let fs = MemoryFs::with_files(&["/p/a.jpg"]);
        fs.fail_download_of("/p/a.jpg");

        let report = BulkCommitter::new(&fs)
            .with_backup(Some(temp.path()))
            .commit(&paths(&["/p/a.jpg"]))
            .await
            .unwrap();

        assert_eq!(report.succeeded, 1);
        assert_eq!(report.backup_failed, vec!["/p/a.jpg"]);
        assert!(!fs.contains("/p/a.jpg"));
    }

    #[tokio::test]
    async fn test_offline_commit_is_not_connected() {
        let fs = MemoryFs::with_files(&["/p/a.jpg"]);
        fs.set_connected(false);

        let result = BulkCommitter::new(&fs).commit(&paths(&["/p/a.jpg"])).await;
        assert!(matches!(result, Err(EngineError::NotConnected)));
    }
}
