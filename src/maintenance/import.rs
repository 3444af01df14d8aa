use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{EngineError, EngineResult};
use crate::remote::RemoteFs;
use crate::sftp::path_utils::join_remote_path;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportFailure {
    pub local_path: PathBuf,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    /// Remote paths written
    pub uploaded: Vec<String>,
    pub failed: Vec<ImportFailure>,
}

/// Upload each local file into `remote_dir` under its base name.
///
/// An existing remote file with the same name is overwritten. The catalog
/// is not touched; refresh it to review imported files.
pub async fn import_files(
    fs: &dyn RemoteFs,
    local_paths: &[PathBuf],
    remote_dir: &str,
) -> EngineResult<ImportReport> {
    if !fs.exists(remote_dir).await? {
        return Err(EngineError::Path(remote_dir.to_string()));
    }

    let mut report = ImportReport::default();
    for local in local_paths {
        match upload_one(fs, local, remote_dir).await {
            Ok(remote) => report.uploaded.push(remote),
            Err(e) => {
                warn!("Import of {:?} failed: {}", local, e);
                report.failed.push(ImportFailure {
                    local_path: local.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    info!(
        "Imported {} of {} files into {}",
        report.uploaded.len(),
        local_paths.len(),
        remote_dir
    );
    Ok(report)
}

async fn upload_one(fs: &dyn RemoteFs, local: &Path, remote_dir: &str) -> EngineResult<String> {
    let name = local
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| EngineError::Remote(format!("No usable file name: {:?}", local)))?;
    let remote = join_remote_path(remote_dir, name);
    fs.upload(local, &remote).await?;
    Ok(remote)
}
