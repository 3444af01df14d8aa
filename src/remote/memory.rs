//! In-memory [`RemoteFs`] for tests, with per-path failure injection

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::RemoteFs;
use crate::error::{EngineError, EngineResult};
use crate::sftp::path_utils::{join_remote_path, remote_file_name};
use crate::sftp::{FileInfo, FileType};

#[derive(Debug, Clone)]
enum Node {
    Dir,
    File(Vec<u8>),
}

#[derive(Default)]
struct State {
    connected: bool,
    nodes: BTreeMap<String, Node>,
    fail_remove: HashSet<String>,
    fail_download: HashSet<String>,
    fail_upload: HashSet<String>,
    calls: Vec<String>,
}

pub struct MemoryFs {
    state: Mutex<State>,
}

impl MemoryFs {
    pub fn new() -> Self {
        let mut state = State {
            connected: true,
            ..Default::default()
        };
        state.nodes.insert("/".to_string(), Node::Dir);
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with_files(paths: &[&str]) -> Self {
        let fs = Self::new();
        for path in paths {
            fs.add_file(path, path.as_bytes());
        }
        fs
    }

    pub fn add_dir(&self, path: &str) {
        let mut state = self.state.lock();
        insert_parents(&mut state.nodes, path);
        state.nodes.insert(path.to_string(), Node::Dir);
    }

    pub fn add_file(&self, path: &str, content: &[u8]) {
        let mut state = self.state.lock();
        insert_parents(&mut state.nodes, path);
        state
            .nodes
            .insert(path.to_string(), Node::File(content.to_vec()));
    }

    pub fn set_connected(&self, connected: bool) {
        self.state.lock().connected = connected;
    }

    pub fn fail_remove_of(&self, path: &str) {
        self.state.lock().fail_remove.insert(path.to_string());
    }

    pub fn fail_download_of(&self, path: &str) {
        self.state.lock().fail_download.insert(path.to_string());
    }

    pub fn fail_upload_of(&self, path: &str) {
        self.state.lock().fail_upload.insert(path.to_string());
    }

    pub fn contains(&self, path: &str) -> bool {
        self.state.lock().nodes.contains_key(path)
    }

    pub fn file_content(&self, path: &str) -> Option<Vec<u8>> {
        match self.state.lock().nodes.get(path) {
            Some(Node::File(bytes)) => Some(bytes.clone()),
            _ => None,
        }
    }

    /// Every path under `root` (excluding `root`)
    pub fn paths_under(&self, root: &str) -> Vec<String> {
        let prefix = join_remote_path(root, "");
        self.state
            .lock()
            .nodes
            .keys()
            .filter(|p| p.starts_with(&prefix))
            .cloned()
            .collect()
    }

    /// Mutating calls in the order they were made, e.g. `remove_file /a.jpg`
    pub fn calls(&self) -> Vec<String> {
        self.state.lock().calls.clone()
    }

    fn check_connected(state: &State) -> EngineResult<()> {
        if state.connected {
            Ok(())
        } else {
            Err(EngineError::NotConnected)
        }
    }
}

impl Default for MemoryFs {
    fn default() -> Self {
        Self::new()
    }
}

fn parent_of(path: &str) -> Option<&str> {
    let trimmed = path.trim_end_matches('/');
    match trimmed.rfind('/') {
        Some(0) if trimmed.len() > 1 => Some("/"),
        Some(0) | None => None,
        Some(idx) => Some(&trimmed[..idx]),
    }
}

fn insert_parents(nodes: &mut BTreeMap<String, Node>, path: &str) {
    let mut current = parent_of(path);
    while let Some(dir) = current {
        nodes.entry(dir.to_string()).or_insert(Node::Dir);
        current = parent_of(dir);
    }
}

#[async_trait]
impl RemoteFs for MemoryFs {
    async fn list_dir(&self, path: &str) -> EngineResult<Vec<FileInfo>> {
        let dir = if path == "/" { path } else { path.trim_end_matches('/') };
        let state = self.state.lock();
        Self::check_connected(&state)?;
        match state.nodes.get(dir) {
            Some(Node::Dir) => {}
            Some(Node::File(_)) => {
                return Err(EngineError::Remote(format!("Not a directory: {}", path)))
            }
            None => return Err(EngineError::Path(path.to_string())),
        }

        let entries = state
            .nodes
            .iter()
            .filter(|(p, _)| parent_of(p) == Some(dir))
            .map(|(p, node)| FileInfo {
                name: remote_file_name(p).to_string(),
                path: p.clone(),
                file_type: match node {
                    Node::Dir => FileType::Directory,
                    Node::File(_) => FileType::File,
                },
            })
            .collect();
        Ok(entries)
    }

    async fn exists(&self, path: &str) -> EngineResult<bool> {
        let state = self.state.lock();
        Self::check_connected(&state)?;
        Ok(state.nodes.contains_key(path))
    }

    async fn read_file(&self, path: &str) -> EngineResult<Vec<u8>> {
        let state = self.state.lock();
        Self::check_connected(&state)?;
        if state.fail_download.contains(path) {
            return Err(EngineError::Remote(format!("read failed: {}", path)));
        }
        match state.nodes.get(path) {
            Some(Node::File(bytes)) => Ok(bytes.clone()),
            _ => Err(EngineError::Path(path.to_string())),
        }
    }

    async fn download(&self, remote: &str, local: &Path) -> EngineResult<u64> {
        let bytes = self.read_file(remote).await?;
        std::fs::write(local, &bytes).map_err(|e| EngineError::Remote(e.to_string()))?;
        self.state.lock().calls.push(format!("download {}", remote));
        Ok(bytes.len() as u64)
    }

    async fn upload(&self, local: &Path, remote: &str) -> EngineResult<u64> {
        let bytes = std::fs::read(local).map_err(|e| EngineError::Remote(e.to_string()))?;
        let mut state = self.state.lock();
        Self::check_connected(&state)?;
        if state.fail_upload.contains(remote) {
            return Err(EngineError::Remote(format!("upload failed: {}", remote)));
        }
        let parent_is_dir = parent_of(remote)
            .and_then(|p| state.nodes.get(p))
            .is_some_and(|n| matches!(n, Node::Dir));
        if !parent_is_dir {
            return Err(EngineError::Path(remote.to_string()));
        }
        let len = bytes.len() as u64;
        state.nodes.insert(remote.to_string(), Node::File(bytes));
        state.calls.push(format!("upload {}", remote));
        Ok(len)
    }

    async fn remove_file(&self, path: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        Self::check_connected(&state)?;
        if state.fail_remove.contains(path) {
            return Err(EngineError::Remote(format!("Permission denied: {}", path)));
        }
        match state.nodes.get(path).map(|n| matches!(n, Node::Dir)) {
            Some(false) => {
                state.nodes.remove(path);
                state.calls.push(format!("remove_file {}", path));
                Ok(())
            }
            Some(true) => Err(EngineError::Remote(format!("Is a directory: {}", path))),
            None => Err(EngineError::Path(path.to_string())),
        }
    }

    async fn remove_dir(&self, path: &str) -> EngineResult<()> {
        let mut state = self.state.lock();
        Self::check_connected(&state)?;
        if state.fail_remove.contains(path) {
            return Err(EngineError::Remote(format!("Permission denied: {}", path)));
        }
        let prefix = join_remote_path(path, "");
        if state.nodes.keys().any(|p| p.starts_with(&prefix)) {
            return Err(EngineError::Remote(format!("Directory not empty: {}", path)));
        }
        match state.nodes.get(path).map(|n| matches!(n, Node::Dir)) {
            Some(true) => {
                state.nodes.remove(path);
                state.calls.push(format!("remove_dir {}", path));
                Ok(())
            }
            Some(false) => Err(EngineError::Remote(format!("Not a directory: {}", path))),
            None => Err(EngineError::Path(path.to_string())),
        }
    }

    async fn disconnect(&self) {
        self.state.lock().connected = false;
    }
}
