//! Error types for the install pipeline with context and user-facing messages

use std::path::PathBuf;
use thiserror::Error;

/// Errors produced anywhere in the acquisition/installation pipeline
#[derive(Error, Debug)]
pub enum InstallError {
    /// HTTP transport errors with the URL that failed
    #[error("HTTP request to '{url}' failed")]
    HttpRequest {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx responses
    #[error("server returned {status} for '{url}'")]
    HttpStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// File system I/O errors with file context
    #[error("file operation failed while {operation} '{path}'")]
    FileSystem {
        path: PathBuf,
        operation: FileOperation,
        #[source]
        source: std::io::Error,
    },

    /// Downloaded bytes do not match the catalog's published checksum
    #[error("checksum mismatch for '{file}': expected {expected}")]
    ChecksumMismatch { file: PathBuf, expected: String },

    /// An archive member would resolve outside the extraction directory
    #[error("archive entry escapes extraction directory: '{entry}'")]
    PathTraversal { entry: String },

    /// ZIP container could not be read
    #[error("failed to read archive '{path}'")]
    Archive {
        path: PathBuf,
        #[source]
        source: zip::result::ZipError,
    },

    /// 7z container could not be read
    #[error("failed to read 7z archive '{path}'")]
    SevenZip {
        path: PathBuf,
        #[source]
        source: sevenz_rust::Error,
    },

    /// Extension unrecognized and the ZIP fallback failed to parse
    #[error("unknown archive format: '{path}'")]
    UnknownFormat { path: PathBuf },

    /// RAR is acknowledged but deliberately not implemented
    #[error("RAR archives are not supported: '{path}'")]
    RarUnsupported { path: PathBuf },

    /// Archive was valid but contained nothing installable
    #[error("no .otr/.o2r files found in archive")]
    NoModFiles,

    /// File descriptor carries no usable download URL
    #[error("file descriptor has no download URL")]
    MissingDownloadUrl,

    /// Catalog analysis flagged the file; reason carries the analysis string
    #[error("{reason}")]
    UnsafeFile { reason: String },

    /// Folder-level toggle found nothing it recognizes
    #[error("no mods found to enable/disable in '{path}'")]
    NoModsInFolder { path: PathBuf },

    /// Background task (blocking extraction/hash) panicked or was cancelled
    #[error("background task failed: {reason}")]
    Task { reason: String },
}

/// Types of file operations for error context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileOperation {
    Read,
    Write,
    Create,
    CreateDir,
    Move,
    Delete,
    Metadata,
}

impl std::fmt::Display for FileOperation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileOperation::Read => write!(f, "reading"),
            FileOperation::Write => write!(f, "writing"),
            FileOperation::Create => write!(f, "creating"),
            FileOperation::CreateDir => write!(f, "creating directory"),
            FileOperation::Move => write!(f, "moving"),
            FileOperation::Delete => write!(f, "deleting"),
            FileOperation::Metadata => write!(f, "reading metadata"),
        }
    }
}

pub type Result<T> = std::result::Result<T, InstallError>;

impl InstallError {
    /// Build a `FileSystem` error mapper for `map_err` call sites
    pub(crate) fn fs(
        path: impl Into<PathBuf>,
        operation: FileOperation,
    ) -> impl FnOnce(std::io::Error) -> InstallError {
        let path = path.into();
        move |source| InstallError::FileSystem {
            path,
            operation,
            source,
        }
    }

    /// The short message shown to the user when this error terminates an
    /// install attempt. Phrasing is part of the UI contract.
    pub fn user_message(&self) -> String {
        match self {
            InstallError::MissingDownloadUrl => "No download URL".to_string(),
            InstallError::UnsafeFile { reason } => reason.clone(),
            InstallError::HttpRequest { .. } | InstallError::HttpStatus { .. } => {
                "Download failed".to_string()
            }
            InstallError::ChecksumMismatch { .. } => {
                "Checksum verification failed - file may be corrupted".to_string()
            }
            InstallError::RarUnsupported { .. } => {
                "RAR files not supported. Please extract manually.".to_string()
            }
            InstallError::PathTraversal { .. }
            | InstallError::Archive { .. }
            | InstallError::SevenZip { .. }
            | InstallError::UnknownFormat { .. } => "Failed to extract archive".to_string(),
            InstallError::NoModFiles => "No .otr/.o2r files found in archive".to_string(),
            other => other.to_string(),
        }
    }

    /// Error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            InstallError::HttpRequest { .. } | InstallError::HttpStatus { .. } => "transport",
            InstallError::ChecksumMismatch { .. } => "integrity",
            InstallError::PathTraversal { .. } => "security",
            InstallError::Archive { .. }
            | InstallError::SevenZip { .. }
            | InstallError::UnknownFormat { .. }
            | InstallError::RarUnsupported { .. } => "format",
            InstallError::NoModFiles => "content",
            InstallError::UnsafeFile { .. } | InstallError::MissingDownloadUrl => "policy",
            InstallError::FileSystem { .. } => "file_system",
            InstallError::NoModsInFolder { .. } => "toggle",
            InstallError::Task { .. } => "internal",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_messages_match_ui_contract() {
        assert_eq!(
            InstallError::MissingDownloadUrl.user_message(),
            "No download URL"
        );
        assert_eq!(
            InstallError::NoModFiles.user_message(),
            "No .otr/.o2r files found in archive"
        );
        assert_eq!(
            InstallError::ChecksumMismatch {
                file: PathBuf::from("a.zip"),
                expected: "aa".into(),
            }
            .user_message(),
            "Checksum verification failed - file may be corrupted"
        );
        assert_eq!(
            InstallError::RarUnsupported {
                path: PathBuf::from("m.rar")
            }
            .user_message(),
            "RAR files not supported. Please extract manually."
        );
    }

    #[test]
    fn traversal_is_categorized_as_security() {
        let err = InstallError::PathTraversal {
            entry: "../evil".into(),
        };
        assert_eq!(err.category(), "security");
        // but surfaces to the user as an extraction failure
        assert_eq!(err.user_message(), "Failed to extract archive");
    }
}
