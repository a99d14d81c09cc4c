// src/watch/path_utils.rs

//! Utility functions for path handling in the watcher.

use std::path::{Path, PathBuf};

/// Express `path` relative to `root`.
///
/// - First we try a direct `strip_prefix(root)`.
/// - If that fails (e.g. due to symlinks or different absolute prefixes),
///   we canonicalize both paths and try again.
/// - Only if both attempts fail do we give up.
///
/// Returns `None` if the path cannot be reasonably related to `root`.
pub fn relative_path(root: &Path, path: &Path) -> Option<PathBuf> {
    if let Ok(rel) = path.strip_prefix(root) {
        return Some(rel.to_path_buf());
    }

    // Notably macOS reports events under /private/var/... for a root the
    // user passed as /var/...
    if let (Ok(root_canon), Ok(path_canon)) = (root.canonicalize(), path.canonicalize()) {
        if let Ok(rel) = path_canon.strip_prefix(&root_canon) {
            return Some(rel.to_path_buf());
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_root_prefix() {
        let rel = relative_path(Path::new("/project"), Path::new("/project/src/main.py"));
        assert_eq!(rel, Some(PathBuf::from("src/main.py")));
    }

    #[test]
    fn unrelated_path_is_none() {
        assert_eq!(
            relative_path(Path::new("/project"), Path::new("/elsewhere/x.py")),
            None
        );
    }
}
