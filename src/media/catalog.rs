use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::kind::MediaKind;
use crate::error::{EngineError, EngineResult};
use crate::remote::RemoteFs;
use crate::sftp::FileType;

/// One reviewable file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaEntry {
    pub remote_path: String,
    pub kind: MediaKind,
}

impl MediaEntry {
    pub fn new(remote_path: impl Into<String>, kind: MediaKind) -> Self {
        Self {
            remote_path: remote_path.into(),
            kind,
        }
    }

    /// Classify a path; `None` for non-media files
    pub fn classify(remote_path: impl Into<String>) -> Option<Self> {
        let remote_path = remote_path.into();
        MediaKind::classify(&remote_path).map(|kind| Self { remote_path, kind })
    }
}

/// Which kinds are shown during review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DisplayFlags {
    pub show_images: bool,
    pub show_videos: bool,
}

impl DisplayFlags {
    pub fn shows(&self, kind: MediaKind) -> bool {
        match kind {
            MediaKind::Image => self.show_images,
            MediaKind::Video => self.show_videos,
        }
    }
}

impl Default for DisplayFlags {
    fn default() -> Self {
        Self {
            show_images: true,
            show_videos: true,
        }
    }
}

/// Walk `root` depth-first and return every media file found, in the order
/// the server listed them. Subdirectories are descended into as soon as they
/// are encountered. Symlinks are classified like files and never followed.
pub async fn build_catalog(fs: &dyn RemoteFs, root: &str) -> EngineResult<Vec<MediaEntry>> {
    if !fs.exists(root).await? {
        return Err(EngineError::Path(root.to_string()));
    }

    let mut entries = Vec::new();
    walk(fs, root, &mut entries).await?;

    info!("Catalog of {} built with {} media entries", root, entries.len());
    Ok(entries)
}

async fn walk(fs: &dyn RemoteFs, dir: &str, out: &mut Vec<MediaEntry>) -> EngineResult<()> {
    let listing = fs.list_dir(dir).await?;
    debug!("{}: {} entries", dir, listing.len());

    for info in listing {
        if info.name == "." || info.name == ".." {
            continue;
        }
        match info.file_type {
            FileType::Directory => Box::pin(walk(fs, &info.path, out)).await?,
            FileType::File | FileType::Symlink => {
                if let Some(entry) = MediaEntry::classify(info.path) {
                    out.push(entry);
                }
            }
            FileType::Unknown => {}
        }
    }
    Ok(())
}

/// Entries whose kind is enabled, in catalog order
pub fn filter(catalog: &[MediaEntry], flags: DisplayFlags) -> Vec<MediaEntry> {
    catalog
        .iter()
        .filter(|entry| flags.shows(entry.kind))
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::memory::MemoryFs;

    fn paths(entries: &[MediaEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.remote_path.as_str()).collect()
    }

    fn sample() -> Vec<MediaEntry> {
        ["a.jpg", "b.mp4", "c.png", "d.avi", "e.gif"]
            .iter()
            .filter_map(|p| MediaEntry::classify(format!("/photos/{}", p)))
            .collect()
    }

    #[test]
    fn test_filter_both_kinds_keeps_everything_in_order() {
        let catalog = sample();
        let filtered = filter(&catalog, DisplayFlags::default());
        assert_eq!(filtered, catalog);
    }

    #[test]
    fn test_filter_preserves_relative_order() {
        let catalog = sample();
        let flags = [(true, false), (false, true), (false, false), (true, true)];

        for (show_images, show_videos) in flags {
            let flags = DisplayFlags {
                show_images,
                show_videos,
            };
            let filtered = filter(&catalog, flags);

            assert!(filtered.iter().all(|e| flags.shows(e.kind)));
            let expected: Vec<_> = catalog.iter().filter(|e| flags.shows(e.kind)).collect();
            assert_eq!(filtered.iter().collect::<Vec<_>>(), expected);
        }

        let images_only = filter(
            &catalog,
            DisplayFlags {
                show_images: true,
                show_videos: false,
            },
        );
        assert_eq!(
            paths(&images_only),
            vec!["/photos/a.jpg", "/photos/c.png", "/photos/e.gif"]
        );
    }

    #[tokio::test]
    async fn test_build_catalog_recurses_depth_first() {
        let fs = MemoryFs::new();
        fs.add_file("/photos/2021/beach.JPG", b"1");
        fs.add_file("/photos/2021/trip/clip.mov", b"2");
        fs.add_file("/photos/2021/notes.txt", b"3");
        fs.add_file("/photos/a.png", b"4");
        fs.add_dir("/photos/empty");
        fs.add_file("/photos/z.mkv", b"5");
        fs.add_file("/elsewhere/x.jpg", b"6");

        let catalog = build_catalog(&fs, "/photos").await.unwrap();

        assert_eq!(
            paths(&catalog),
            vec![
                "/photos/2021/beach.JPG",
                "/photos/2021/trip/clip.mov",
                "/photos/a.png",
                "/photos/z.mkv",
            ]
        );
        assert_eq!(catalog[1].kind, MediaKind::Video);
    }

    #[tokio::test]
    async fn test_build_catalog_empty_root() {
        let fs = MemoryFs::new();
        fs.add_dir("/photos");
        assert!(build_catalog(&fs, "/photos").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_build_catalog_missing_root_is_path_error() {
        let fs = MemoryFs::new();
        let err = build_catalog(&fs, "/nope").await.unwrap_err();
        assert!(matches!(err, EngineError::Path(p) if p == "/nope"));
    }

    #[tokio::test]
    async fn test_build_catalog_requires_connection() {
        let fs = MemoryFs::with_files(&["/photos/a.jpg"]);
        fs.set_connected(false);
        assert!(matches!(
            build_catalog(&fs, "/photos").await,
            Err(EngineError::NotConnected)
        ));
    }
}
