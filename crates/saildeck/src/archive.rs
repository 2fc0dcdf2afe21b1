//! Archive extraction with path-traversal protection
//!
//! ZIP and 7z are supported; RAR is acknowledged and refused. Unrecognized
//! extensions are tried as ZIP before being reported as unknown. Every member
//! path is checked against the destination directory before anything is
//! written; a single escaping entry aborts the whole extraction.

use std::fs::{self, File};
use std::io;
use std::path::{Component, Path, PathBuf};
use tracing::{debug, warn};
use zip::ZipArchive;

use crate::error::{FileOperation, InstallError, Result};

/// Resolve an archive member name against the destination directory.
///
/// Returns the output path when the member stays inside `dest`, `None` when
/// it would escape via `..` segments, an absolute path, or a drive prefix.
/// Purely lexical; nothing is touched on disk.
fn safe_entry_path(dest: &Path, name: &str) -> Option<PathBuf> {
    let mut out = dest.to_path_buf();
    let mut depth = 0usize;
    for component in Path::new(name).components() {
        match component {
            Component::Normal(part) => {
                out.push(part);
                depth += 1;
            }
            Component::CurDir => {}
            Component::ParentDir => {
                if depth == 0 {
                    return None;
                }
                out.pop();
                depth -= 1;
            }
            Component::Prefix(_) | Component::RootDir => return None,
        }
    }
    Some(out)
}

/// Extract an archive into `dest`, dispatching on the file extension.
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let filename = archive_path
        .file_name()
        .map(|n| n.to_string_lossy().to_ascii_lowercase())
        .unwrap_or_default();

    if filename.ends_with(".zip") {
        extract_zip(archive_path, dest)
    } else if filename.ends_with(".7z") {
        extract_7z(archive_path, dest)
    } else if filename.ends_with(".rar") {
        warn!("refusing RAR archive: {}", archive_path.display());
        Err(InstallError::RarUnsupported {
            path: archive_path.to_path_buf(),
        })
    } else {
        // Unknown extension: try it as a zip before giving up
        debug!(
            "unrecognized extension on {}, trying as zip",
            archive_path.display()
        );
        match extract_zip(archive_path, dest) {
            Err(InstallError::Archive { path, source }) => {
                debug!("zip fallback failed for {}: {}", path.display(), source);
                Err(InstallError::UnknownFormat { path })
            }
            other => other,
        }
    }
}

fn extract_zip(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .map_err(InstallError::fs(archive_path, FileOperation::Read))?;
    let mut archive = ZipArchive::new(file).map_err(|source| InstallError::Archive {
        path: archive_path.to_path_buf(),
        source,
    })?;

    // Reject the whole archive before writing anything if any member escapes
    if let Some(entry) = archive
        .file_names()
        .find(|name| safe_entry_path(dest, name).is_none())
        .map(String::from)
    {
        warn!("path traversal attempt in {}: {}", archive_path.display(), entry);
        return Err(InstallError::PathTraversal { entry });
    }

    for index in 0..archive.len() {
        let mut entry = archive
            .by_index(index)
            .map_err(|source| InstallError::Archive {
                path: archive_path.to_path_buf(),
                source,
            })?;
        let name = entry.name().to_string();
        let out_path = safe_entry_path(dest, &name)
            .ok_or(InstallError::PathTraversal { entry: name })?;

        if entry.is_dir() {
            fs::create_dir_all(&out_path)
                .map_err(InstallError::fs(&out_path, FileOperation::CreateDir))?;
            continue;
        }

        if let Some(parent) = out_path.parent() {
            fs::create_dir_all(parent)
                .map_err(InstallError::fs(parent, FileOperation::CreateDir))?;
        }

        let mut out_file = File::create(&out_path)
            .map_err(InstallError::fs(&out_path, FileOperation::Create))?;
        io::copy(&mut entry, &mut out_file)
            .map_err(InstallError::fs(&out_path, FileOperation::Write))?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            if let Some(mode) = entry.unix_mode() {
                let _ = fs::set_permissions(&out_path, fs::Permissions::from_mode(mode));
            }
        }
    }

    debug!(
        "extracted {} into {}",
        archive_path.display(),
        dest.display()
    );
    Ok(())
}

fn extract_7z(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)
        .map_err(InstallError::fs(archive_path, FileOperation::Read))?;

    // The guard runs inside the entry callback, before the entry is written.
    let mut blocked: Option<String> = None;
    let result = sevenz_rust::decompress_with_extract_fn(file, dest, |entry, reader, out_path| {
        if safe_entry_path(dest, entry.name()).is_none() {
            blocked = Some(entry.name().to_string());
            return Err(sevenz_rust::Error::other("blocked unsafe entry path"));
        }
        sevenz_rust::default_entry_extract_fn(entry, reader, out_path)
    });

    match result {
        Ok(()) => {
            debug!(
                "extracted {} into {}",
                archive_path.display(),
                dest.display()
            );
            Ok(())
        }
        Err(source) => {
            if let Some(entry) = blocked {
                warn!(
                    "path traversal attempt in {}: {}",
                    archive_path.display(),
                    entry
                );
                return Err(InstallError::PathTraversal { entry });
            }
            Err(InstallError::SevenZip {
                path: archive_path.to_path_buf(),
                source,
            })
        }
    }
}
