//! Saildeck Core
//!
//! Mod management core for Ship of Harkinian: browse and search the
//! GameBanana catalog, download mod archives with checksum verification,
//! extract them safely, install the payload files into a mods library,
//! and toggle installed mods on or off.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use saildeck::{
//!     CatalogClient, InstallCallback, InstallConfig, InstallEvent, InstallRequest, Installer,
//! };
//! use std::path::PathBuf;
//! use std::sync::Arc;
//!
//! # async fn example() -> saildeck::Result<()> {
//! let config = InstallConfig::default();
//!
//! // Find a mod and pick one of its downloadable files
//! let catalog = CatalogClient::new(&config)?;
//! let page = catalog.search("hd textures", 1, 15).await?;
//! let record = &page.records[0];
//! let files = catalog.mod_files(record.id).await?;
//!
//! // Install it into the mods library
//! let installer = Installer::new(config)?;
//! let request = InstallRequest::new(
//!     &record.name,
//!     files[0].clone(),
//!     PathBuf::from("/path/to/soh/mods"),
//! );
//! let callback: InstallCallback = Arc::new(|event: InstallEvent| {
//!     if let InstallEvent::Status { message } = event {
//!         println!("{message}");
//!     }
//! });
//! let outcome = installer.install(&request, Some(callback)).await;
//! println!("{}", outcome.message);
//! # Ok(())
//! # }
//! ```
//!
//! # Features
//!
//! - **Catalog access**: GameBanana apiv11 browse, search, and per-mod file listings
//! - **Streaming downloads**: chunked transfers with per-chunk progress events
//! - **Integrity checking**: MD5 verification against the catalog's published checksum
//! - **Safe extraction**: ZIP and 7z with per-entry path containment
//! - **Collision-safe install**: unique mod folders and numbered file suffixes
//! - **State toggling**: enable/disable installed mods by extension renaming
//! - **Async/await**: full async support on the Tokio runtime

pub mod archive;
pub mod catalog;
pub mod checksum;
pub mod config;
pub mod download;
pub mod error;
pub mod install;
pub mod library;
pub mod locate;
pub mod progress;
pub mod toggle;

// Re-export commonly used types for convenience
pub use archive::extract_archive;
pub use catalog::{CatalogClient, ModFile, ModPage, ModRecord, SOH_GAME_ID};
pub use checksum::{compute_md5, verify_md5};
pub use config::InstallConfig;
pub use download::HttpClient;
pub use error::{FileOperation, InstallError, Result};
pub use install::{sanitize_folder_name, InstallOutcome, InstallRequest, Installer};
pub use library::{
    delete_mod, find_mods_root, format_size, load_mods, relative_to_root, LibraryEntry,
};
pub use locate::{find_mod_files, find_recognized_files, is_payload_file, is_recognized_file};
pub use progress::{
    ConsoleReporter, InstallCallback, InstallEvent, InstallReporter, IntoInstallCallback,
    NullReporter,
};
pub use toggle::{set_enabled, toggle_folder, toggle_state};
