use serde::{Deserialize, Serialize};

use crate::sftp::path_utils::remote_extension;

/// Image extensions, lowercase, without the dot
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "bmp", "tif", "tiff", "heic"];

/// Video extensions, lowercase, without the dot
pub const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mov", "avi", "mkv", "wmv", "flv", "webm"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    /// Classify a path by its extension, case-insensitively.
    /// `None` means the file is not media and never enters the catalog.
    pub fn classify(path: &str) -> Option<Self> {
        let ext = remote_extension(path)?;
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(MediaKind::Video)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_is_case_insensitive() {
        assert_eq!(MediaKind::classify("/p/IMG_0001.JPG"), Some(MediaKind::Image));
        assert_eq!(MediaKind::classify("/p/scan.TiFf"), Some(MediaKind::Image));
        assert_eq!(MediaKind::classify("/p/live.HEIC"), Some(MediaKind::Image));
        assert_eq!(MediaKind::classify("/p/clip.MoV"), Some(MediaKind::Video));
        assert_eq!(MediaKind::classify("/p/clip.webm"), Some(MediaKind::Video));
        assert_eq!(MediaKind::classify("/p/.jpg"), Some(MediaKind::Image));
    }

    #[test]
    fn test_classify_excludes_everything_else() {
        assert_eq!(MediaKind::classify("/p/notes.txt"), None);
        assert_eq!(MediaKind::classify("/p/IMG_0001.jpg.xmp"), None);
        assert_eq!(MediaKind::classify("/p/raw.cr2"), None);
        assert_eq!(MediaKind::classify("/p/noext"), None);
    }

    #[test]
    fn test_tables_are_disjoint() {
        for ext in IMAGE_EXTENSIONS {
            assert!(!VIDEO_EXTENSIONS.contains(ext));
        }
    }
}
