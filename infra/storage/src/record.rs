use crate::category::Category;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Metadata describing one stored upload.
///
/// Identity (`stored_name`) never changes after creation. Records handed out by the store
/// are snapshots; mutating one has no effect on the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub(crate) stored_name: String,
    pub(crate) original_name: String,
    pub(crate) size_bytes: u64,
    pub(crate) content_type: String,
    pub(crate) category: Category,
    pub(crate) extension: String,
    pub(crate) upload_time: DateTime<Utc>,
    pub(crate) upload_user: String,
    pub(crate) file_path: PathBuf,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) download_url: Option<String>,
}

impl FileRecord {
    /// Unique on-disk name; the identity of the record.
    #[must_use]
    pub fn stored_name(&self) -> &str {
        &self.stored_name
    }

    /// Name supplied by the client, kept for display and downloads.
    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    #[must_use]
    pub const fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// [`FileRecord::size_bytes`] rendered as `B`/`KB`/`MB`/`GB`.
    #[must_use]
    pub fn formatted_size(&self) -> String {
        format_size(self.size_bytes)
    }

    #[must_use]
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    #[must_use]
    pub const fn category(&self) -> Category {
        self.category
    }

    /// Lower-case extension without the dot, empty when the name has none.
    #[must_use]
    pub fn extension(&self) -> &str {
        &self.extension
    }

    #[must_use]
    pub const fn upload_time(&self) -> DateTime<Utc> {
        self.upload_time
    }

    #[must_use]
    pub fn upload_user(&self) -> &str {
        &self.upload_user
    }

    /// Absolute location inside the storage root.
    #[must_use]
    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    /// Display-facing download link, present when the store has a download prefix.
    #[must_use]
    pub fn download_url(&self) -> Option<&str> {
        self.download_url.as_deref()
    }
}

/// An incoming file: client name plus content and optional hints.
#[derive(Debug, Clone)]
pub struct Upload {
    pub(crate) original_name: String,
    pub(crate) data: Vec<u8>,
    pub(crate) declared_size: Option<u64>,
    pub(crate) content_type: Option<String>,
    pub(crate) category: Option<Category>,
    pub(crate) user: Option<String>,
}

impl Upload {
    #[must_use]
    pub fn new(original_name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            data: data.into(),
            declared_size: None,
            content_type: None,
            category: None,
            user: None,
        }
    }

    /// Size announced by the client; the larger of this and the real length is validated.
    #[must_use]
    pub const fn declared_size(mut self, size: u64) -> Self {
        self.declared_size = Some(size);
        self
    }

    /// Client-supplied content type; guessed from the name when absent or blank.
    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Overrides the category that would otherwise be inferred from the extension.
    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.category = Some(category);
        self
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.user = Some(user.into());
        self
    }

    #[must_use]
    pub fn original_name(&self) -> &str {
        &self.original_name
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// One window of a filtered listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page {
    pub items: Vec<FileRecord>,
    /// Matching records before windowing.
    pub total: usize,
    pub offset: usize,
    pub limit: usize,
}

impl Page {
    #[must_use]
    pub fn has_more(&self) -> bool {
        self.offset.saturating_add(self.items.len()) < self.total
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageInfo {
    pub root: PathBuf,
    pub total_files: usize,
    pub total_bytes: u64,
    pub cached_entries: usize,
    /// Capacity of the volume holding the root.
    pub total_bytes_on_volume: u64,
    pub free_bytes: u64,
    /// Free bytes usable by this process; may be less than `free_bytes` under quotas.
    pub available_bytes: u64,
}

/// An open stored file together with its metadata.
#[derive(Debug)]
pub struct Download {
    pub(crate) record: FileRecord,
    pub(crate) file: tokio::fs::File,
}

impl Download {
    #[must_use]
    pub const fn record(&self) -> &FileRecord {
        &self.record
    }

    /// Filename to present to the client.
    #[must_use]
    pub fn file_name(&self) -> &str {
        self.record.original_name()
    }

    #[must_use]
    pub fn into_parts(self) -> (FileRecord, tokio::fs::File) {
        (self.record, self.file)
    }

    /// Reads the whole content into memory.
    ///
    /// # Errors
    /// Any I/O error raised while reading.
    pub async fn into_bytes(mut self) -> std::io::Result<Vec<u8>> {
        use tokio::io::AsyncReadExt;

        let capacity = usize::try_from(self.record.size_bytes).unwrap_or_default();
        let mut buf = Vec::with_capacity(capacity);
        self.file.read_to_end(&mut buf).await?;
        Ok(buf)
    }
}

/// Human-readable byte count: `512 B`, `1.5 KB`, `2.0 GB`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    match bytes {
        b if b < KB => format!("{b} B"),
        b if b < MB => format!("{:.1} KB", b as f64 / KB as f64),
        b if b < GB => format!("{:.1} MB", b as f64 / MB as f64),
        b => format!("{:.1} GB", b as f64 / GB as f64),
    }
}
