//! Path helpers for remote SFTP paths
//!
//! Remote paths always use `/` as separator, whatever the local OS.

/// Join remote SFTP path components using `/` separator.
pub fn join_remote_path(base: &str, component: &str) -> String {
    if base.ends_with('/') {
        format!("{}{}", base, component)
    } else {
        format!("{}/{}", base, component)
    }
}

/// Last component of a remote path (`/a/b/c.jpg` -> `c.jpg`)
pub fn remote_file_name(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    trimmed.rsplit('/').next().unwrap_or(trimmed)
}

/// Lowercased text after the last dot of the file name, if any.
/// A dot-file such as `.jpg` counts as having extension `jpg`.
pub fn remote_extension(path: &str) -> Option<String> {
    let name = remote_file_name(path);
    name.rfind('.')
        .map(|idx| &name[idx + 1..])
        .filter(|ext| !ext.is_empty())
        .map(str::to_ascii_lowercase)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_remote_path() {
        assert_eq!(join_remote_path("/import", "x.jpg"), "/import/x.jpg");
        assert_eq!(join_remote_path("/import/", "x.jpg"), "/import/x.jpg");
        assert_eq!(join_remote_path("/", "x.jpg"), "/x.jpg");
    }

    #[test]
    fn test_remote_file_name() {
        assert_eq!(remote_file_name("/a/b/c.jpg"), "c.jpg");
        assert_eq!(remote_file_name("c.jpg"), "c.jpg");
        assert_eq!(remote_file_name("/a/b/"), "b");
    }

    #[test]
    fn test_remote_extension() {
        assert_eq!(remote_extension("/a/IMG_001.JPG").as_deref(), Some("jpg"));
        assert_eq!(remote_extension("/a/clip.tar.webm").as_deref(), Some("webm"));
        assert_eq!(remote_extension("/a/.hidden").as_deref(), Some("hidden"));
        assert_eq!(remote_extension("/a/trailing."), None);
        assert_eq!(remote_extension("/a/README"), None);
        assert_eq!(remote_extension("/a.d/README"), None);
    }
}
