use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{EngineError, EngineResult};
use crate::remote::RemoteFs;
use crate::sftp::FileType;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheClearReport {
    pub files_deleted: u64,
    pub dirs_deleted: u64,
}

/// Empty `cache_root`, children before parents. The root itself stays.
pub async fn clear_cache(fs: &dyn RemoteFs, cache_root: &str) -> EngineResult<CacheClearReport> {
    if !fs.exists(cache_root).await? {
        return Err(EngineError::Path(cache_root.to_string()));
    }
    info!("Clearing cache under {}", cache_root);

    let mut report = CacheClearReport::default();
    clear_dir(fs, cache_root, &mut report).await?;

    info!(
        "Cache cleared: {} files, {} directories",
        report.files_deleted, report.dirs_deleted
    );
    Ok(report)
}

async fn clear_dir(fs: &dyn RemoteFs, dir: &str, report: &mut CacheClearReport) -> EngineResult<()> {
    for entry in fs.list_dir(dir).await? {
        if entry.name == "." || entry.name == ".." {
            continue;
        }
        if entry.file_type == FileType::Directory {
            Box::pin(clear_dir(fs, &entry.path, report)).await?;
            fs.remove_dir(&entry.path).await?;
            report.dirs_deleted += 1;
        } else {
            fs.remove_file(&entry.path).await?;
            report.files_deleted += 1;
        }
        debug!("Removed {}", entry.path);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryFs;

    fn cache() -> MemoryFs {
        let fs = MemoryFs::new();
        fs.add_file("/cache/thumbs/a/1.jpg", b"1");
        fs.add_file("/cache/thumbs/a/2.jpg", b"2");
        fs.add_file("/cache/thumbs/b.jpg", b"3");
        fs.add_dir("/cache/empty");
        fs.add_file("/cache/index.db", b"4");
        fs.add_file("/originals/keep.jpg", b"5");
        fs
    }

    #[tokio::test]
    async fn test_clear_cache_removes_children_before_parents() {
        let fs = cache();
        let report = clear_cache(&fs, "/cache").await.unwrap();

        assert_eq!(
            report,
            CacheClearReport {
                files_deleted: 4,
                dirs_deleted: 3
            }
        );
        assert!(fs.contains("/cache"));
        assert!(fs.paths_under("/cache").is_empty());
        assert!(fs.contains("/originals/keep.jpg"));

        let calls = fs.calls();
        let pos = |c: &str| calls.iter().position(|x| x == c).unwrap();
        assert!(pos("remove_file /cache/thumbs/a/1.jpg") < pos("remove_dir /cache/thumbs/a"));
        assert!(pos("remove_dir /cache/thumbs/a") < pos("remove_dir /cache/thumbs"));
    }

    #[tokio::test]
    async fn test_clear_cache_twice_is_trivial() {
        let fs = cache();
        clear_cache(&fs, "/cache").await.unwrap();
        let second = clear_cache(&fs, "/cache").await.unwrap();
        assert_eq!(second, CacheClearReport::default());
    }

    #[tokio::test]
    async fn test_clear_cache_missing_root() {
        let fs = MemoryFs::new();
        assert!(matches!(
            clear_cache(&fs, "/cache").await,
            Err(EngineError::Path(_))
        ));
    }

    #[tokio::test]
    async fn test_clear_cache_stops_on_remote_failure() {
        let fs = cache();
        fs.fail_remove_of("/cache/thumbs/b.jpg");
        assert!(matches!(
            clear_cache(&fs, "/cache").await,
            Err(EngineError::Remote(_))
        ));
    }
}
