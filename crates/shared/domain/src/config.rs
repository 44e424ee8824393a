use serde::Deserialize;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::sync::Arc;

/// Two gibibytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: &str =
    "jpg,jpeg,png,gif,pdf,doc,docx,xls,xlsx,txt,zip,rar,mp4,avi,mp3,wav";

/// Top-level application configuration.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DepotConfigInner {
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Thin Arc-wrapped config for inexpensive cloning into subsystems.
#[derive(Default, Debug, Clone, Deserialize)]
#[serde(transparent)]
pub struct DepotConfig {
    inner: Arc<DepotConfigInner>,
}

impl Deref for DepotConfig {
    type Target = DepotConfigInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl DerefMut for DepotConfig {
    fn deref_mut(&mut self) -> &mut DepotConfigInner {
        Arc::make_mut(&mut self.inner)
    }
}

/// Upload storage settings handed to the storage engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Flat directory holding every stored upload.
    pub upload_dir: PathBuf,
    /// Largest accepted upload in bytes.
    pub max_file_size: u64,
    /// Comma-separated extension allow-list, e.g. `"pdf,png,zip"`.
    pub allowed_extensions: String,
    /// Uploader recorded when the caller supplies none.
    pub default_user: String,
    /// Prefix of the display-facing download URL.
    pub download_prefix: String,
}

impl StorageConfig {
    /// The allow-list split on commas, trimmed, lower-cased, without empty items.
    #[must_use]
    pub fn allowed_extension_list(&self) -> Vec<String> {
        self.allowed_extensions
            .split(',')
            .map(str::trim)
            .filter(|ext| !ext.is_empty())
            .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    /// Directory for rolling log files; console only when unset.
    pub path: Option<PathBuf>,
    pub json: bool,
}

// --- Default ---

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            upload_dir: PathBuf::from("uploads"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.to_owned(),
            default_user: "system".to_owned(),
            download_prefix: "/download/".to_owned(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: "info".to_owned(), path: None, json: false }
    }
}
