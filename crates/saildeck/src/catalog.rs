//! GameBanana v11 catalog client
//!
//! Browse and search the Ship of Harkinian mod feed and list the downloadable
//! files of a mod. Raw API records are deserialized into typed structs and
//! then flattened into `ModRecord`/`ModFile`, so missing fields surface here
//! instead of deep inside the installer.

use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::config::InstallConfig;
use crate::error::{InstallError, Result};

/// GameBanana game id for Ship of Harkinian
pub const SOH_GAME_ID: &str = "16121";

const API_V11_BASE: &str = "https://gamebanana.com/apiv11";

/// Analysis strings that veto a download
const UNSAFE_INDICATORS: [&str; 5] = ["malware", "suspicious", "infected", "virus", "trojan"];

/// A remotely catalogued mod. Immutable once fetched; the installer only
/// uses `name` to derive a destination folder.
#[derive(Debug, Clone)]
pub struct ModRecord {
    pub id: u64,
    pub name: String,
    pub author: String,
    pub image_url: Option<String>,
    pub category: String,
    pub view_count: u64,
    pub like_count: u64,
    pub profile_url: String,
    pub date_added: Option<i64>,
    pub date_updated: Option<i64>,
    pub has_files: bool,
}

/// One downloadable file offered for a mod
#[derive(Debug, Clone, Default)]
pub struct ModFile {
    pub file_id: u64,
    pub filename: String,
    pub filesize: u64,
    pub download_url: String,
    pub download_count: u64,
    pub md5: String,
    pub analysis_result: String,
}

impl ModFile {
    /// Reason this file must not be downloaded, if the catalog's analysis
    /// flagged it. `None` means no veto.
    pub fn safety_veto(&self) -> Option<String> {
        if self.analysis_result.is_empty() {
            return None;
        }
        let lowered = self.analysis_result.to_lowercase();
        UNSAFE_INDICATORS
            .iter()
            .find(|indicator| lowered.contains(*indicator))
            .map(|_| {
                format!(
                    "File flagged as potentially unsafe: {}",
                    self.analysis_result
                )
            })
    }
}

/// One page of catalog results
#[derive(Debug)]
pub struct ModPage {
    pub records: Vec<ModRecord>,
    pub total_count: u64,
    pub has_more: bool,
}

// ---- raw wire records -------------------------------------------------------

fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct RawFeed {
    #[serde(rename = "_aMetadata", default)]
    metadata: RawMetadata,
    #[serde(rename = "_aRecords", default)]
    records: Vec<RawRecord>,
}

#[derive(Debug, Deserialize)]
struct RawMetadata {
    #[serde(rename = "_nRecordCount", default)]
    record_count: u64,
    #[serde(rename = "_bIsComplete", default = "default_true")]
    is_complete: bool,
}

impl Default for RawMetadata {
    fn default() -> Self {
        Self {
            record_count: 0,
            is_complete: default_true(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct RawRecord {
    #[serde(rename = "_idRow")]
    id: u64,
    #[serde(rename = "_sName")]
    name: Option<String>,
    #[serde(rename = "_sProfileUrl")]
    profile_url: Option<String>,
    #[serde(rename = "_nViewCount", default)]
    view_count: u64,
    #[serde(rename = "_nLikeCount", default)]
    like_count: u64,
    #[serde(rename = "_tsDateAdded")]
    date_added: Option<i64>,
    #[serde(rename = "_tsDateUpdated")]
    date_updated: Option<i64>,
    #[serde(rename = "_bHasFiles", default)]
    has_files: bool,
    #[serde(rename = "_aSubmitter")]
    submitter: Option<RawSubmitter>,
    #[serde(rename = "_aRootCategory")]
    root_category: Option<RawCategory>,
    #[serde(rename = "_aPreviewMedia")]
    preview_media: Option<RawPreviewMedia>,
}

#[derive(Debug, Deserialize)]
struct RawSubmitter {
    #[serde(rename = "_sName")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawCategory {
    #[serde(rename = "_sName")]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawPreviewMedia {
    #[serde(rename = "_aImages", default)]
    images: Vec<RawImage>,
}

#[derive(Debug, Deserialize)]
struct RawImage {
    #[serde(rename = "_sBaseUrl")]
    base_url: Option<String>,
    #[serde(rename = "_sFile220")]
    file_220: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawFile {
    #[serde(rename = "_idRow")]
    id: u64,
    #[serde(rename = "_sFile")]
    filename: Option<String>,
    #[serde(rename = "_nFilesize", default)]
    filesize: u64,
    #[serde(rename = "_sDownloadUrl")]
    download_url: Option<String>,
    #[serde(rename = "_nDownloadCount", default)]
    download_count: u64,
    #[serde(rename = "_sMd5Checksum")]
    md5: Option<String>,
    #[serde(rename = "_sAnalysisResult")]
    analysis_result: Option<String>,
}

impl RawRecord {
    fn into_mod(self) -> ModRecord {
        let image_url = self.preview_media.and_then(|media| {
            media.images.into_iter().next().and_then(|img| {
                match (img.base_url, img.file_220) {
                    (Some(base), Some(file)) if !base.is_empty() && !file.is_empty() => {
                        Some(format!("{}/{}", base, file))
                    }
                    _ => None,
                }
            })
        });

        let id = self.id;
        ModRecord {
            id,
            name: self.name.unwrap_or_else(|| format!("Mod #{}", id)),
            author: self
                .submitter
                .and_then(|s| s.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            image_url,
            category: self
                .root_category
                .and_then(|c| c.name)
                .unwrap_or_else(|| "Unknown".to_string()),
            view_count: self.view_count,
            like_count: self.like_count,
            profile_url: self
                .profile_url
                .unwrap_or_else(|| format!("https://gamebanana.com/mods/{}", id)),
            date_added: self.date_added,
            date_updated: self.date_updated,
            has_files: self.has_files,
        }
    }
}

impl RawFile {
    fn into_file(self) -> ModFile {
        ModFile {
            file_id: self.id,
            filename: self.filename.unwrap_or_default(),
            filesize: self.filesize,
            download_url: self.download_url.unwrap_or_default(),
            download_count: self.download_count,
            md5: self.md5.unwrap_or_default(),
            analysis_result: self.analysis_result.unwrap_or_default(),
        }
    }
}

// ---- client ----------------------------------------------------------------

/// Client for the catalog API. Metadata calls use short timeouts, distinct
/// from the download client's.
pub struct CatalogClient {
    client: Client,
    base_url: String,
    game_id: String,
    files_timeout: std::time::Duration,
}

impl CatalogClient {
    pub fn new(config: &InstallConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.api_timeout)
            .user_agent(&config.user_agent)
            .build()
            .map_err(|source| InstallError::HttpRequest {
                url: String::new(),
                source,
            })?;
        Ok(Self {
            client,
            base_url: API_V11_BASE.to_string(),
            game_id: SOH_GAME_ID.to_string(),
            files_timeout: config.files_timeout,
        })
    }

    /// Point the client at a different API root (tests)
    pub fn with_base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Browse the mod subfeed. `sort` is `new` or `updated`; pages are
    /// 1-indexed.
    pub async fn browse(&self, page: u32, per_page: u32, sort: &str) -> Result<ModPage> {
        let url = format!("{}/Game/{}/Subfeed", self.base_url, self.game_id);
        debug!("browsing catalog page {} ({} per page)", page, per_page);
        let feed: RawFeed = self
            .get_json(
                &url,
                &[
                    ("_nPage", page.to_string()),
                    ("_nPerpage", per_page.to_string()),
                    ("_sSort", sort.to_string()),
                    ("_aFilters[Generic_Category]", "Mod".to_string()),
                ],
            )
            .await?;
        Ok(Self::into_page(feed))
    }

    /// Full-text search within the game's mods
    pub async fn search(&self, term: &str, page: u32, per_page: u32) -> Result<ModPage> {
        let url = format!("{}/Util/Search/Results", self.base_url);
        debug!("searching catalog for '{}'", term);
        let feed: RawFeed = self
            .get_json(
                &url,
                &[
                    ("_sSearchString", term.to_string()),
                    ("_nPage", page.to_string()),
                    ("_nPerpage", per_page.to_string()),
                    ("_idGameRow", self.game_id.clone()),
                ],
            )
            .await?;
        Ok(Self::into_page(feed))
    }

    /// List the downloadable files of a mod
    pub async fn mod_files(&self, mod_id: u64) -> Result<Vec<ModFile>> {
        let url = format!("{}/Mod/{}/Files", self.base_url, mod_id);
        let response = self
            .client
            .get(&url)
            .timeout(self.files_timeout)
            .send()
            .await
            .map_err(|source| InstallError::HttpRequest {
                url: url.clone(),
                source,
            })?;
        let status = response.status();
        if !status.is_success() {
            return Err(InstallError::HttpStatus { url, status });
        }
        let raw: Vec<RawFile> =
            response
                .json()
                .await
                .map_err(|source| InstallError::HttpRequest { url, source })?;
        Ok(raw.into_iter().map(RawFile::into_file).collect())
    }

    async fn get_json(&self, url: &str, query: &[(&str, String)]) -> Result<RawFeed> {
        let response = self
            .client
            .get(url)
            .query(query)
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
        response
            .json()
            .await
            .map_err(|source| InstallError::HttpRequest {
                url: url.to_string(),
                source,
            })
    }

    fn into_page(feed: RawFeed) -> ModPage {
        ModPage {
            records: feed.records.into_iter().map(RawRecord::into_mod).collect(),
            total_count: feed.metadata.record_count,
            has_more: !feed.metadata.is_complete,
        }
    }
}
