//! The install pipeline: download, verify, extract, locate, place
//!
//! Each install attempt is one independent unit of work suitable for a
//! background task. Steps run strictly sequentially; every intermediate
//! artifact lives in a scratch workspace that is removed on every exit path.
//! The attempt always resolves to an `InstallOutcome`, never a propagated
//! error.

use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::archive::extract_archive;
use crate::catalog::ModFile;
use crate::checksum::verify_md5;
use crate::config::InstallConfig;
use crate::download::HttpClient;
use crate::error::{FileOperation, InstallError, Result};
use crate::locate::{find_mod_files, is_payload_file};
use crate::progress::{emit, InstallCallback, InstallEvent};

/// The unit of work for the installer: which mod, which of its files, and
/// where the library lives.
#[derive(Debug, Clone)]
pub struct InstallRequest {
    /// Display name of the mod; only used to derive the destination folder
    pub mod_name: String,
    /// The file descriptor chosen by the caller
    pub file: ModFile,
    /// Library root the mod folder is created under
    pub library_root: PathBuf,
}

impl InstallRequest {
    pub fn new(
        mod_name: impl Into<String>,
        file: ModFile,
        library_root: impl Into<PathBuf>,
    ) -> Self {
        Self {
            mod_name: mod_name.into(),
            file,
            library_root: library_root.into(),
        }
    }
}

/// Final result of an install attempt
#[derive(Debug)]
pub struct InstallOutcome {
    pub success: bool,
    pub message: String,
    /// Destination folder, present on success
    pub folder: Option<PathBuf>,
}

/// Create a safe folder name from a mod's display name: strip characters
/// illegal in filesystem names, trim surrounding dots and spaces, cap the
/// length, and fall back to `"mod"` when nothing is left.
pub fn sanitize_folder_name(name: &str, limit: usize) -> String {
    let stripped: String = name
        .chars()
        .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*'))
        .collect();
    let mut result: String = stripped.trim_matches(|c| c == '.' || c == ' ').to_string();
    if result.chars().count() > limit {
        result = result.chars().take(limit).collect();
        result = result.trim_end().to_string();
    }
    if result.is_empty() {
        "mod".to_string()
    } else {
        result
    }
}

/// Drives the download, verify, extract, locate, place sequence
pub struct Installer {
    http: HttpClient,
    config: InstallConfig,
}

impl Installer {
    pub fn new(config: InstallConfig) -> Result<Self> {
        let http = HttpClient::new(&config)?;
        Ok(Self { http, config })
    }

    /// Run one install attempt. All side effects are reported through
    /// `callback`; the returned outcome mirrors the final `Complete` event.
    pub async fn install(
        &self,
        request: &InstallRequest,
        callback: Option<InstallCallback>,
    ) -> InstallOutcome {
        let cb = callback.as_ref();
        match self.run(request, cb).await {
            Ok((message, folder)) => {
                emit(
                    cb,
                    InstallEvent::Status {
                        message: message.clone(),
                    },
                );
                emit(
                    cb,
                    InstallEvent::Complete {
                        success: true,
                        message: message.clone(),
                    },
                );
                InstallOutcome {
                    success: true,
                    message,
                    folder: Some(folder),
                }
            }
            Err(err) => {
                warn!("install of '{}' failed ({}): {}", request.mod_name, err.category(), err);
                let message = err.user_message();
                emit(
                    cb,
                    InstallEvent::Error {
                        message: message.clone(),
                    },
                );
                emit(
                    cb,
                    InstallEvent::Complete {
                        success: false,
                        message: message.clone(),
                    },
                );
                InstallOutcome {
                    success: false,
                    message,
                    folder: None,
                }
            }
        }
    }

    async fn run(
        &self,
        request: &InstallRequest,
        cb: Option<&InstallCallback>,
    ) -> Result<(String, PathBuf)> {
        let file = &request.file;

        // Policy vetoes come before any I/O
        if file.download_url.is_empty() {
            return Err(InstallError::MissingDownloadUrl);
        }
        if let Some(reason) = file.safety_veto() {
            return Err(InstallError::UnsafeFile { reason });
        }

        let folder_name = self
            .destination_folder_name(&request.mod_name, &request.library_root)
            .await;
        let mod_folder = request.library_root.join(&folder_name);

        // Scratch workspace; TempDir removal on drop covers every exit path
        let scratch = tempfile::Builder::new()
            .prefix("saildeck_")
            .tempdir()
            .map_err(InstallError::fs(
                std::env::temp_dir(),
                FileOperation::CreateDir,
            ))?;

        let filename = download_filename(file);
        let archive_path = scratch.path().join(&filename);

        emit(
            cb,
            InstallEvent::Status {
                message: "Downloading...".to_string(),
            },
        );
        self.http
            .download_to_file(
                &file.download_url,
                &archive_path,
                Some(file.filesize).filter(|&s| s > 0),
                cb,
            )
            .await?;

        if !file.md5.is_empty() {
            emit(
                cb,
                InstallEvent::Status {
                    message: "Verifying checksum...".to_string(),
                },
            );
            if !verify_md5(&archive_path, &file.md5).await? {
                return Err(InstallError::ChecksumMismatch {
                    file: archive_path.clone(),
                    expected: file.md5.clone(),
                });
            }
        }

        // A bare payload file needs no extraction at all
        if is_payload_file(Path::new(&filename)) {
            emit(
                cb,
                InstallEvent::Status {
                    message: "Installing...".to_string(),
                },
            );
            fs::create_dir_all(&mod_folder)
                .await
                .map_err(InstallError::fs(&mod_folder, FileOperation::CreateDir))?;
            let dest = unique_destination(&mod_folder, &filename).await;
            move_file(&archive_path, &dest).await?;
            let message = format!("Installed: {}/{}", folder_name, filename);
            return Ok((message, mod_folder));
        }

        emit(
            cb,
            InstallEvent::Status {
                message: "Extracting...".to_string(),
            },
        );
        let extract_dir = scratch.path().join("extracted");
        fs::create_dir_all(&extract_dir)
            .await
            .map_err(InstallError::fs(&extract_dir, FileOperation::CreateDir))?;
        {
            let archive_path = archive_path.clone();
            let extract_dir = extract_dir.clone();
            tokio::task::spawn_blocking(move || extract_archive(&archive_path, &extract_dir))
                .await
                .map_err(|e| InstallError::Task {
                    reason: e.to_string(),
                })??;
        }

        emit(
            cb,
            InstallEvent::Status {
                message: "Finding mod files...".to_string(),
            },
        );
        let found = {
            let extract_dir = extract_dir.clone();
            tokio::task::spawn_blocking(move || find_mod_files(&extract_dir))
                .await
                .map_err(|e| InstallError::Task {
                    reason: e.to_string(),
                })?
        };
        if found.is_empty() {
            return Err(InstallError::NoModFiles);
        }
        debug!("located {} payload file(s) in archive", found.len());

        emit(
            cb,
            InstallEvent::Status {
                message: "Installing...".to_string(),
            },
        );
        fs::create_dir_all(&mod_folder)
            .await
            .map_err(InstallError::fs(&mod_folder, FileOperation::CreateDir))?;

        let mut installed = Vec::new();
        for source in found {
            let name = source
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "mod_file".to_string());
            let dest = unique_destination(&mod_folder, &name).await;
            move_file(&source, &dest).await?;
            installed.push(
                dest.file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or(name),
            );
        }

        let message = if installed.len() == 1 {
            format!("Installed: {}/{}", folder_name, installed[0])
        } else {
            format!("Installed {} files to {}/", installed.len(), folder_name)
        };
        Ok((message, mod_folder))
    }

    /// Sanitized folder name, disambiguated with a short unique suffix when
    /// a folder of that name already exists. Check-then-create: two racing
    /// installs of identically named mods get distinct uuid suffixes.
    async fn destination_folder_name(&self, mod_name: &str, library_root: &Path) -> String {
        let base = sanitize_folder_name(mod_name, self.config.folder_name_limit);
        if fs::try_exists(library_root.join(&base))
            .await
            .unwrap_or(false)
        {
            let id = Uuid::new_v4().simple().to_string();
            format!("{}_{}", base, &id[..8])
        } else {
            base
        }
    }
}

/// Filename for the downloaded artifact: the descriptor's filename reduced
/// to its final component, the URL's last path segment as a fallback, and a
/// generic name when both are unusable.
fn download_filename(file: &ModFile) -> String {
    if let Some(name) = Path::new(&file.filename).file_name() {
        let name = name.to_string_lossy();
        if !name.is_empty() {
            return name.to_string();
        }
    }
    if let Ok(parsed) = url::Url::parse(&file.download_url) {
        if let Some(segment) = parsed
            .path_segments()
            .and_then(|segments| segments.last())
            .filter(|segment| !segment.is_empty())
        {
            return segment.to_string();
        }
    }
    "mod_download".to_string()
}

/// Destination path inside `folder` that does not collide with an existing
/// file, appending `_1`, `_2`, ... before the extension as needed.
async fn unique_destination(folder: &Path, filename: &str) -> PathBuf {
    let candidate = folder.join(filename);
    if !fs::try_exists(&candidate).await.unwrap_or(false) {
        return candidate;
    }

    let (stem, ext) = match filename.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), Some(ext.to_string())),
        _ => (filename.to_string(), None),
    };
    let mut counter = 1u32;
    loop {
        let name = match &ext {
            Some(ext) => format!("{}_{}.{}", stem, counter, ext),
            None => format!("{}_{}", stem, counter),
        };
        let candidate = folder.join(name);
        if !fs::try_exists(&candidate).await.unwrap_or(false) {
            return candidate;
        }
        counter += 1;
    }
}

/// Move a file, falling back to copy + remove when rename crosses devices
/// (the scratch workspace usually lives on a different filesystem than the
/// library root).
async fn move_file(source: &Path, dest: &Path) -> Result<()> {
    if fs::rename(source, dest).await.is_ok() {
        return Ok(());
    }
    fs::copy(source, dest)
        .await
        .map_err(InstallError::fs(dest, FileOperation::Move))?;
    fs::remove_file(source)
        .await
        .map_err(InstallError::fs(source, FileOperation::Delete))?;
    Ok(())
}
