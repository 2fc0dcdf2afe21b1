//! Enable/disable state toggling for installed mods
//!
//! State lives in the file extension: `.otr` pairs with `.disabled` and
//! `.o2r` pairs with `.di2abled`. Toggling renames the file in place; stem and
//! directory never change. Paths with unrecognized extensions are left
//! alone.

use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{FileOperation, InstallError, Result};
use crate::locate::find_recognized_files;

/// The paired extension for a recognized extension, `None` otherwise
fn toggled_extension(ext: &str) -> Option<&'static str> {
    match ext {
        "otr" => Some("disabled"),
        "disabled" => Some("otr"),
        "o2r" => Some("di2abled"),
        "di2abled" => Some("o2r"),
        _ => None,
    }
}

fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

/// True when the file's extension marks it disabled
pub fn is_disabled(path: &Path) -> bool {
    matches!(extension_of(path).as_deref(), Some("disabled") | Some("di2abled"))
}

fn rename_to_extension(path: &Path, new_ext: &str) -> Result<PathBuf> {
    let new_path = path.with_extension(new_ext);
    fs::rename(path, &new_path).map_err(InstallError::fs(path, FileOperation::Move))?;
    debug!("renamed {} -> {}", path.display(), new_path.display());
    Ok(new_path)
}

/// Flip a single file between enabled and disabled. Returns the new path,
/// or `None` when the extension is not recognized (a no-op, not an error).
pub fn toggle_state(path: &Path) -> Result<Option<PathBuf>> {
    let Some(ext) = extension_of(path) else {
        return Ok(None);
    };
    let Some(new_ext) = toggled_extension(&ext) else {
        return Ok(None);
    };
    rename_to_extension(path, new_ext).map(Some)
}

/// Force a file into the given state. Files already in that state, and
/// files with unrecognized extensions, are left untouched.
pub fn set_enabled(path: &Path, enabled: bool) -> Result<Option<PathBuf>> {
    let Some(ext) = extension_of(path) else {
        return Ok(None);
    };
    let new_ext = match (ext.as_str(), enabled) {
        ("disabled", true) => "otr",
        ("di2abled", true) => "o2r",
        ("otr", false) => "disabled",
        ("o2r", false) => "di2abled",
        _ => return Ok(None),
    };
    rename_to_extension(path, new_ext).map(Some)
}

/// Group toggle over every recognized file under `folder`, recursively.
///
/// If at least one file is disabled, every disabled file is enabled and
/// already-enabled files stay as they are. If none are disabled, every file
/// is disabled instead. Errors when the folder holds no recognized files.
pub fn toggle_folder(folder: &Path) -> Result<Vec<PathBuf>> {
    let files = find_recognized_files(folder);
    if files.is_empty() {
        return Err(InstallError::NoModsInFolder {
            path: folder.to_path_buf(),
        });
    }

    let enable = files.iter().any(|file| is_disabled(file));
    debug!(
        "toggling {} file(s) under {} -> {}",
        files.len(),
        folder.display(),
        if enable { "enabled" } else { "disabled" }
    );

    let mut changed = Vec::new();
    for file in files {
        if let Some(new_path) = set_enabled(&file, enable)? {
            changed.push(new_path);
        }
    }
    Ok(changed)
}
