//! Streaming HTTP download to disk
//!
//! One client handles mod archive transfers: generous timeout, redirects
//! followed, body streamed to the destination in chunks with a progress
//! event after each chunk. Failures are terminal for the attempt; there is
//! no automatic retry.

use futures::StreamExt;
use reqwest::Client;
use std::path::Path;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::config::InstallConfig;
use crate::error::{FileOperation, InstallError, Result};
use crate::progress::{emit, InstallCallback, InstallEvent};

/// HTTP client for binary transfers
pub struct HttpClient {
    client: Client,
}

impl HttpClient {
    /// Build a client from the install configuration
    pub fn new(config: &InstallConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.download_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|source| InstallError::HttpRequest {
                url: String::new(),
                source,
            })?;
        Ok(Self { client })
    }

    /// Download `url` to `dest_path`, creating or overwriting it.
    ///
    /// When `expected_size` is known and a file of exactly that size already
    /// exists at `dest_path`, the transfer is skipped and the existing file
    /// is kept. Returns the number of bytes on disk.
    pub async fn download_to_file(
        &self,
        url: &str,
        dest_path: &Path,
        expected_size: Option<u64>,
        callback: Option<&InstallCallback>,
    ) -> Result<u64> {
        if let Some(expected) = expected_size.filter(|&s| s > 0) {
            if let Ok(meta) = fs::metadata(dest_path).await {
                if meta.len() == expected {
                    debug!(
                        "{} already present with expected size {}, skipping download",
                        dest_path.display(),
                        expected
                    );
                    emit(
                        callback,
                        InstallEvent::Progress {
                            downloaded: expected,
                            total: Some(expected),
                        },
                    );
                    return Ok(expected);
                }
            }
        }

        debug!("downloading {} to {}", url, dest_path.display());

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| InstallError::HttpRequest {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::HttpStatus {
                url: url.to_string(),
                status,
            });
        }

        let total = expected_size.filter(|&s| s > 0).or(response.content_length());

        let mut file = fs::File::create(dest_path)
            .await
            .map_err(InstallError::fs(dest_path, FileOperation::Create))?;

        let mut downloaded = 0u64;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|source| InstallError::HttpRequest {
                url: url.to_string(),
                source,
            })?;
            file.write_all(&chunk)
                .await
                .map_err(InstallError::fs(dest_path, FileOperation::Write))?;
            downloaded += chunk.len() as u64;
            emit(callback, InstallEvent::Progress { downloaded, total });
        }

        file.flush()
            .await
            .map_err(InstallError::fs(dest_path, FileOperation::Write))?;

        debug!("downloaded {} bytes from {}", downloaded, url);
        Ok(downloaded)
    }
}
