//! View over an installed mod library on disk
//!
//! A library is a `mods/` directory tree holding payload files and their
//! disabled counterparts, usually one subfolder per installed mod.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FileOperation, InstallError, Result};
use crate::locate::find_recognized_files;
use crate::toggle::is_disabled;

/// One installed mod file and its current state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub path: PathBuf,
    pub enabled: bool,
}

/// Enumerate every mod file under `mods_dir`, recursively.
pub fn load_mods(mods_dir: &Path) -> Vec<LibraryEntry> {
    find_recognized_files(mods_dir)
        .into_iter()
        .map(|path| {
            let enabled = !is_disabled(&path);
            LibraryEntry { path, enabled }
        })
        .collect()
}

/// Walk up from `path` to the enclosing directory named `mods`.
///
/// Falls back to `path`'s parent when no ancestor carries that name, so a
/// caller pointing at a loose file still gets a usable root.
pub fn find_mods_root(path: &Path) -> PathBuf {
    let mut current = path;
    loop {
        if current
            .file_name()
            .is_some_and(|name| name.eq_ignore_ascii_case("mods"))
        {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) if parent != current => current = parent,
            _ => break,
        }
    }
    path.parent().unwrap_or(path).to_path_buf()
}

/// The entry's path relative to the library root, for display.
pub fn relative_to_root(root: &Path, path: &Path) -> PathBuf {
    path.strip_prefix(root)
        .map(Path::to_path_buf)
        .unwrap_or_else(|_| path.to_path_buf())
}

/// Remove a mod file, or a whole mod folder with everything in it.
pub fn delete_mod(path: &Path) -> Result<()> {
    let meta =
        fs::symlink_metadata(path).map_err(InstallError::fs(path, FileOperation::Metadata))?;
    if meta.is_dir() {
        fs::remove_dir_all(path).map_err(InstallError::fs(path, FileOperation::Delete))?;
    } else {
        fs::remove_file(path).map_err(InstallError::fs(path, FileOperation::Delete))?;
    }
    debug!("deleted {}", path.display());
    Ok(())
}

/// Human-readable file size: bytes up to 1 KiB, then one decimal for
/// KB/MB and two for GB.
pub fn format_size(size_bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = 1024 * 1024;
    const GB: u64 = 1024 * 1024 * 1024;
    if size_bytes < KB {
        format!("{size_bytes} B")
    } else if size_bytes < MB {
        format!("{:.1} KB", size_bytes as f64 / KB as f64)
    } else if size_bytes < GB {
        format!("{:.1} MB", size_bytes as f64 / MB as f64)
    } else {
        format!("{:.2} GB", size_bytes as f64 / GB as f64)
    }
}
