//! Configuration for the install pipeline and catalog client

use std::time::Duration;

/// Explicit configuration passed into the core at call time.
///
/// Binary transfers get a generous timeout; metadata calls against the
/// catalog API use short ones.
#[derive(Debug, Clone)]
pub struct InstallConfig {
    /// Timeout for mod archive downloads
    pub download_timeout: Duration,
    /// Timeout for catalog browse/search calls
    pub api_timeout: Duration,
    /// Timeout for per-mod file listing calls
    pub files_timeout: Duration,
    /// User agent sent with every request
    pub user_agent: String,
    /// Maximum length of a sanitized destination folder name
    pub folder_name_limit: usize,
}

impl Default for InstallConfig {
    fn default() -> Self {
        Self {
            download_timeout: Duration::from_secs(120),
            api_timeout: Duration::from_secs(15),
            files_timeout: Duration::from_secs(10),
            user_agent: "Saildeck/1.0 (Ship of Harkinian Mod Manager)".to_string(),
            folder_name_limit: 50,
        }
    }
}

impl InstallConfig {
    pub fn with_download_timeout(mut self, timeout: Duration) -> Self {
        self.download_timeout = timeout;
        self
    }

    pub fn with_user_agent<S: Into<String>>(mut self, user_agent: S) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
