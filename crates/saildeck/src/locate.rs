//! Recognized mod payload extensions and payload discovery
//!
//! The game loads `.otr` and `.o2r` files. Each has a paired "disabled"
//! extension (`.disabled` / `.di2abled`) so a file can be parked without
//! deleting it. Anything else under the library root is ignored.

use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Extensions the game loads directly
pub const ENABLED_EXTENSIONS: [&str; 2] = ["otr", "o2r"];
/// Paired extensions the game ignores
pub const DISABLED_EXTENSIONS: [&str; 2] = ["disabled", "di2abled"];

/// Lowercased extension of a path, if any
fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// True for files the game would load as-is
pub fn is_payload_file(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| ENABLED_EXTENSIONS.contains(&ext.as_str()))
        .unwrap_or(false)
}

/// True for payload files and their disabled counterparts
pub fn is_recognized_file(path: &Path) -> bool {
    extension_of(path)
        .map(|ext| {
            ENABLED_EXTENSIONS.contains(&ext.as_str())
                || DISABLED_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

/// Recursively find every enabled payload file under `directory`.
///
/// Freshly extracted archives are expected to contain only enabled-state
/// files; disabled markers are a library-level concept applied after
/// installation. Order follows the directory walk and is deterministic for a
/// fixed filesystem state, but not sorted.
pub fn find_mod_files(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_payload_file(path))
        .collect()
}

/// Recursively find every recognized file (enabled or disabled) under
/// `directory`. Used by the folder toggle and the library view.
pub fn find_recognized_files(directory: &Path) -> Vec<PathBuf> {
    WalkDir::new(directory)
        .follow_links(false)
        .into_iter()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .filter(|path| is_recognized_file(path))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"x").unwrap();
    }

    #[test]
    fn finds_payload_files_recursively() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("a.otr"));
        touch(&dir.path().join("nested/deeper/b.o2r"));
        touch(&dir.path().join("nested/readme.txt"));
        touch(&dir.path().join("parked.disabled"));

        let mut found = find_mod_files(dir.path());
        found.sort();
        assert_eq!(
            found,
            vec![
                dir.path().join("a.otr"),
                dir.path().join("nested/deeper/b.o2r"),
            ]
        );
    }

    #[test]
    fn extension_match_is_case_insensitive() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("SHOUTY.OTR"));
        assert_eq!(find_mod_files(dir.path()).len(), 1);
    }

    #[test]
    fn recognized_includes_disabled_markers() {
        let dir = tempdir().unwrap();
        touch(&dir.path().join("on.otr"));
        touch(&dir.path().join("off.disabled"));
        touch(&dir.path().join("off2.di2abled"));
        touch(&dir.path().join("other.zip"));

        assert_eq!(find_recognized_files(dir.path()).len(), 3);
        assert_eq!(find_mod_files(dir.path()).len(), 1);
    }

    #[test]
    fn empty_directory_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(find_mod_files(dir.path()).is_empty());
    }
}
