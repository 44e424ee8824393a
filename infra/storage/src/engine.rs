//! The [`FileStore`] handle: validated uploads, reconciled listings and safe deletes over one
//! flat directory.

use crate::builder::FileStoreBuilder;
use crate::cache::MetadataCache;
use crate::category::Category;
use crate::error::StorageError;
use crate::maintenance;
use crate::naming::{self, NameScheme, TMP_PREFIX};
use crate::record::{Download, FileRecord, Page, StorageInfo, Upload, format_size};
use crate::security;
use chrono::{DateTime, Utc};
use fxhash::FxHashSet;
use std::collections::BTreeMap;
use std::fs::Metadata;
use std::io::ErrorKind;
use std::ops::Deref;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing::{debug, error, info, warn};

const OCTET_STREAM: &str = "application/octet-stream";

/// Shared state behind a [`FileStore`].
#[derive(Debug)]
pub struct FileStoreInner {
    /// Canonical upload root.
    pub(crate) root: PathBuf,
    pub(crate) max_file_size: u64,
    /// Lower-case extensions without the dot.
    pub(crate) allowed_extensions: FxHashSet<String>,
    pub(crate) default_user: String,
    pub(crate) download_prefix: Option<String>,
    pub(crate) cache: MetadataCache,
    pub(crate) namer: Arc<dyn NameScheme>,
    /// Disambiguates temp files of concurrent writes.
    pub(crate) tmp_counter: AtomicU64,
}

/// Thread-safe handle to the upload store.
///
/// Cheap to clone; clones share the root, settings and [`MetadataCache`]. Every operation
/// may run concurrently with every other.
///
/// # Example
///
/// ```rust
/// use depot_storage::{Category, FileStore, StorageError, Upload};
///
/// #[tokio::main]
/// async fn main() -> Result<(), StorageError> {
///     # let tmp = tempfile::tempdir().unwrap();
///     # let root = tmp.path().join("uploads");
///     let store = FileStore::builder()
///         .root(&root)
///         .download_prefix("/download/")
///         .connect()
///         .await?;
///
///     let record = store.store(Upload::new("report.pdf", b"%PDF-1.7".to_vec()).user("alice")).await?;
///     assert_eq!(record.category(), Category::Document);
///     assert!(record.stored_name().ends_with("_report.pdf"));
///
///     let listed = store.list(Some(Category::Document)).await?;
///     assert_eq!(listed.len(), 1);
///
///     assert!(store.delete(record.stored_name()).await?);
///     assert!(store.get(record.stored_name()).await?.is_none());
///     Ok(())
/// }
/// ```
#[derive(Debug, Clone)]
pub struct FileStore {
    pub(crate) inner: Arc<FileStoreInner>,
}

impl Deref for FileStore {
    type Target = FileStoreInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FileStore {
    #[must_use = "The store is not initialized until you call .connect()"]
    pub fn builder() -> FileStoreBuilder {
        FileStoreBuilder::new()
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    #[must_use]
    pub fn max_file_size(&self) -> u64 {
        self.inner.max_file_size
    }

    #[must_use]
    pub fn is_extension_allowed(&self, extension: &str) -> bool {
        self.allowed_extensions.contains(&extension.trim_start_matches('.').to_lowercase())
    }

    #[must_use]
    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Validates and persists one upload.
    ///
    /// Checks run in a fixed order: name, emptiness, size (larger of declared and actual),
    /// extension allow-list. Nothing is written unless all pass. The content reaches its
    /// final name through a synced temp file and a rename, so readers never see a partial
    /// upload.
    ///
    /// # Errors
    /// * [`StorageError::InvalidName`], [`StorageError::EmptyFile`],
    ///   [`StorageError::FileTooLarge`], [`StorageError::UnsupportedType`] for rejected input.
    /// * [`StorageError::StorageWrite`] when the content could not be persisted.
    pub async fn store(&self, upload: Upload) -> Result<FileRecord, StorageError> {
        let original = upload.original_name.clone();
        self.store_inner(upload).await.inspect_err(|e| {
            if e.is_client_error() {
                debug!(file = %original, reason = %e, "Upload rejected");
            } else {
                error!(file = %original, error = %e, "Upload failed");
            }
        })
    }

    async fn store_inner(&self, upload: Upload) -> Result<FileRecord, StorageError> {
        let Upload { original_name, data, declared_size, content_type, category, user } = upload;

        let sanitized = naming::sanitize_name(&original_name)?;

        if data.is_empty() {
            return Err(StorageError::EmptyFile { message: "File cannot be empty".into(), context: None });
        }

        let size = u64::try_from(data.len()).unwrap_or(u64::MAX);
        if declared_size.unwrap_or(size).max(size) > self.max_file_size {
            return Err(StorageError::FileTooLarge {
                message: format!("File size cannot exceed {}", format_size(self.max_file_size)).into(),
                context: None,
            });
        }

        let extension = naming::extension_of(&sanitized).map(str::to_lowercase).unwrap_or_default();
        if !self.allowed_extensions.contains(&extension) {
            let shown = if extension.is_empty() { "(none)" } else { extension.as_str() };
            return Err(StorageError::UnsupportedType {
                message: format!("Unsupported file type: {shown}").into(),
                context: None,
            });
        }

        let stored_name = self.namer.stored_name(&sanitized);
        let target = security::resolve_stored(&self.root, &stored_name)?;
        self.write_atomic(&target.path, &data).await?;

        let content_type = content_type
            .map(|ct| ct.trim().to_owned())
            .filter(|ct| !ct.is_empty())
            .unwrap_or_else(|| guess_content_type(&sanitized));
        let upload_user = user
            .map(|u| u.trim().to_owned())
            .filter(|u| !u.is_empty())
            .unwrap_or_else(|| self.default_user.clone());

        let record = FileRecord {
            download_url: self.download_url(&target.name),
            stored_name: target.name,
            original_name,
            size_bytes: size,
            content_type,
            category: category.unwrap_or_else(|| Category::from_extension(&extension)),
            extension,
            upload_time: Utc::now(),
            upload_user,
            file_path: target.path,
        };

        self.cache.put(record.clone());
        // A delete may have run between the rename and the insert.
        let vanished = matches!(
            fs::symlink_metadata(&record.file_path).await,
            Err(e) if e.kind() == ErrorKind::NotFound
        );
        if vanished {
            self.cache.remove(&record.stored_name);
        }
        info!(
            file = %record.stored_name,
            size = record.size_bytes,
            category = %record.category,
            user = %record.upload_user,
            "File stored"
        );

        Ok(record)
    }

    /// Stores each upload independently; one failure never aborts the rest.
    ///
    /// Results are returned in input order.
    pub async fn store_batch(
        &self,
        uploads: impl IntoIterator<Item = Upload>,
    ) -> Vec<Result<FileRecord, StorageError>> {
        let mut results = Vec::new();
        for upload in uploads {
            results.push(self.store(upload).await);
        }

        let stored = results.iter().filter(|r| r.is_ok()).count();
        debug!(stored, failed = results.len() - stored, "Batch upload finished");
        results
    }

    /// All stored files, newest first, optionally restricted to one category.
    ///
    /// The directory is authoritative: files dropped into the root by other means show up
    /// with reconstructed metadata, and cache entries whose file vanished are evicted.
    /// Unreadable entries are skipped with a warning.
    ///
    /// # Errors
    /// [`StorageError::Io`] when the root itself cannot be read.
    pub async fn list(&self, filter: Option<Category>) -> Result<Vec<FileRecord>, StorageError> {
        let mut records = self.scan().await?;
        if let Some(category) = filter {
            records.retain(|r| r.category == category);
        }
        Ok(records)
    }

    /// [`FileStore::list`] with a textual filter; blank or unknown names list everything.
    ///
    /// # Errors
    /// See [`FileStore::list`].
    pub async fn list_filtered(&self, filter: Option<&str>) -> Result<Vec<FileRecord>, StorageError> {
        self.list(Category::parse_filter(filter)).await
    }

    /// A window of [`FileStore::list`] plus the total number of matches.
    ///
    /// # Errors
    /// See [`FileStore::list`].
    pub async fn page(
        &self,
        filter: Option<Category>,
        offset: usize,
        limit: usize,
    ) -> Result<Page, StorageError> {
        let records = self.list(filter).await?;
        let total = records.len();
        let items = records.into_iter().skip(offset).take(limit).collect();
        Ok(Page { items, total, offset, limit })
    }

    /// Looks up one record by stored name.
    ///
    /// Returns `Ok(None)` when the file does not exist, evicting any stale cache entry.
    /// Files that were never cached get reconstructed metadata.
    ///
    /// # Errors
    /// * [`StorageError::PathSecurity`] when the name does not address a direct child of the root.
    /// * [`StorageError::Io`] when the file exists but cannot be inspected.
    pub async fn get(&self, stored_name: &str) -> Result<Option<FileRecord>, StorageError> {
        let target = security::resolve_stored(&self.root, stored_name)?;
        if target.name.starts_with(TMP_PREFIX) {
            return Ok(None);
        }

        match self.observe(&target.name, &target.path).await {
            Ok(Some(record)) => Ok(Some(record)),
            Ok(None) => {
                if self.cache.remove(&target.name).is_some() {
                    debug!(file = %target.name, "Evicted cache entry for missing file");
                }
                Ok(None)
            },
            Err(e) => Err(StorageError::Io {
                source: e,
                context: Some(format!("Failed to inspect {}", target.name).into()),
            }),
        }
    }

    /// Opens a stored file for download.
    ///
    /// # Errors
    /// See [`FileStore::get`]; also [`StorageError::Io`] when the file cannot be opened.
    pub async fn open(&self, stored_name: &str) -> Result<Option<Download>, StorageError> {
        let Some(record) = self.get(stored_name).await? else {
            return Ok(None);
        };

        match fs::File::open(&record.file_path).await {
            Ok(file) => Ok(Some(Download { record, file })),
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.cache.remove(&record.stored_name);
                Ok(None)
            },
            Err(e) => Err(StorageError::Io {
                source: e,
                context: Some(format!("Failed to open {}", record.stored_name).into()),
            }),
        }
    }

    /// Reads a stored file completely.
    ///
    /// # Errors
    /// See [`FileStore::open`].
    pub async fn read(&self, stored_name: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let Some(download) = self.open(stored_name).await? else {
            return Ok(None);
        };

        download.into_bytes().await.map(Some).map_err(|e| StorageError::Io {
            source: e,
            context: Some(format!("Failed to read {stored_name}").into()),
        })
    }

    /// Removes a stored file and its cache entry.
    ///
    /// Returns `Ok(false)` when nothing existed under that name. In-flight temp files are
    /// never addressable and are left alone.
    ///
    /// # Errors
    /// * [`StorageError::PathSecurity`] for names that do not address a direct child of the root.
    /// * [`StorageError::StorageDelete`] when the file exists but cannot be removed.
    pub async fn delete(&self, stored_name: &str) -> Result<bool, StorageError> {
        let target = security::resolve_stored(&self.root, stored_name).inspect_err(|e| {
            warn!(name = %stored_name, error = %e, "Rejected delete outside the upload root");
        })?;
        if target.name.starts_with(TMP_PREFIX) {
            debug!(file = %target.name, "Refused delete of in-flight temp file");
            return Ok(false);
        }

        let removed = match fs::remove_file(&target.path).await {
            Ok(()) => true,
            Err(e) if e.kind() == ErrorKind::NotFound => false,
            Err(source) => {
                error!(file = %target.name, error = %source, "Failed to delete file");
                return Err(StorageError::StorageDelete {
                    source,
                    context: Some(target.name.into()),
                });
            },
        };

        self.cache.remove(&target.name);
        if removed {
            info!(file = %target.name, "File deleted");
        } else {
            debug!(file = %target.name, "Delete requested for missing file");
        }

        Ok(removed)
    }

    /// Number of stored files per category; categories without files are omitted.
    ///
    /// # Errors
    /// See [`FileStore::list`].
    pub async fn category_statistics(&self) -> Result<BTreeMap<Category, usize>, StorageError> {
        let mut stats = BTreeMap::new();
        for record in self.list(None).await? {
            *stats.entry(record.category).or_insert(0) += 1;
        }
        Ok(stats)
    }

    /// Stored files grouped by category, each group newest first.
    ///
    /// # Errors
    /// See [`FileStore::list`].
    pub async fn group_by_category(
        &self,
    ) -> Result<BTreeMap<Category, Vec<FileRecord>>, StorageError> {
        let mut groups: BTreeMap<Category, Vec<FileRecord>> = BTreeMap::new();
        for record in self.list(None).await? {
            groups.entry(record.category).or_default().push(record);
        }
        Ok(groups)
    }

    /// Totals for the stored files plus the capacity of the volume holding the root.
    ///
    /// # Errors
    /// See [`FileStore::list`]; also [`StorageError::Io`] when the volume cannot be queried.
    pub async fn storage_info(&self) -> Result<StorageInfo, StorageError> {
        let records = self.list(None).await?;
        let (total_bytes_on_volume, free_bytes, available_bytes) = self.volume_space().await?;
        Ok(StorageInfo {
            root: self.root.clone(),
            total_files: records.len(),
            total_bytes: records.iter().map(|r| r.size_bytes).sum(),
            cached_entries: self.cache.len(),
            total_bytes_on_volume,
            free_bytes,
            available_bytes,
        })
    }

    /// Drops every cached record; the next listing rebuilds them from disk.
    pub fn clear_cache(&self) {
        self.cache.clear();
        debug!("Metadata cache cleared");
    }

    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Removes abandoned temp files and returns how many were deleted.
    pub async fn purge_tmp(&self) -> usize {
        maintenance::purge_tmp(&self.root).await
    }

    async fn scan(&self) -> Result<Vec<FileRecord>, StorageError> {
        let mut entries = match fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.root.display(), "Upload root is missing");
                return Ok(Vec::new());
            },
            Err(e) => {
                return Err(StorageError::Io {
                    source: e,
                    context: Some(format!("Failed to list {}", self.root.display()).into()),
                });
            },
        };

        let mut seen = FxHashSet::default();
        let mut records = Vec::new();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!(path = %self.root.display(), error = %e, "Directory scan interrupted");
                    break;
                },
            };

            let path = entry.path();
            let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
                warn!(path = %path.display(), "Skipping file with a non UTF-8 name");
                continue;
            };
            if name.starts_with(TMP_PREFIX) {
                continue;
            }

            match self.observe(&name, &path).await {
                Ok(Some(record)) => {
                    seen.insert(name);
                    records.push(record);
                },
                Ok(None) => {},
                Err(e) => warn!(file = %name, error = %e, "Skipping unreadable file"),
            }
        }

        self.prune(&seen).await;
        sort_newest_first(&mut records);
        Ok(records)
    }

    /// Current record for a direct child of the root, or `None` if it is not a regular file.
    async fn observe(&self, name: &str, path: &Path) -> std::io::Result<Option<FileRecord>> {
        let meta = match fs::symlink_metadata(path).await {
            Ok(meta) => meta,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e),
        };
        if !meta.is_file() {
            return Ok(None);
        }

        if let Some(record) = self.cache.get(name) {
            return Ok(Some(record));
        }

        let record = self.reconstruct(name, path, &meta)?;
        debug!(file = %name, "Reconstructed metadata for uncached file");
        Ok(Some(self.cache.fill(record)))
    }

    fn reconstruct(&self, name: &str, path: &Path, meta: &Metadata) -> std::io::Result<FileRecord> {
        let original_name = self.namer.original_name(name);
        let extension =
            naming::extension_of(&original_name).map(str::to_lowercase).unwrap_or_default();

        Ok(FileRecord {
            stored_name: name.to_owned(),
            content_type: guess_content_type(&original_name),
            category: Category::from_extension(&extension),
            extension,
            original_name,
            size_bytes: meta.len(),
            upload_time: DateTime::<Utc>::from(meta.modified()?),
            upload_user: self.default_user.clone(),
            file_path: path.to_path_buf(),
            download_url: self.download_url(name),
        })
    }

    /// Evicts cache entries whose file is gone. Entries missed by the scan but still present
    /// on disk belong to uploads that finished mid-scan and are kept.
    async fn prune(&self, seen: &FxHashSet<String>) {
        for name in self.cache.names() {
            if seen.contains(&name) {
                continue;
            }
            match fs::symlink_metadata(self.root.join(&name)).await {
                Ok(meta) if meta.is_file() => {},
                Err(e) if e.kind() != ErrorKind::NotFound => {},
                _ => {
                    self.cache.remove(&name);
                    debug!(file = %name, "Evicted cache entry for missing file");
                },
            }
        }
    }

    /// `(total, free, available to this process)` in bytes.
    async fn volume_space(&self) -> Result<(u64, u64, u64), StorageError> {
        let root = self.root.clone();
        let result = tokio::task::spawn_blocking(move || -> std::io::Result<(u64, u64, u64)> {
            Ok((fs4::total_space(&root)?, fs4::free_space(&root)?, fs4::available_space(&root)?))
        })
        .await
        .unwrap_or_else(|e| Err(std::io::Error::other(e)));

        result.map_err(|source| StorageError::Io {
            source,
            context: Some(format!("Failed to query volume of {}", self.root.display()).into()),
        })
    }

    fn download_url(&self, stored_name: &str) -> Option<String> {
        self.download_prefix.as_ref().map(|prefix| format!("{prefix}{stored_name}"))
    }

    async fn write_atomic(&self, target: &Path, data: &[u8]) -> Result<(), StorageError> {
        let temp = self.tmp_path();

        if let Err(source) = write_and_swap(&temp, target, data).await {
            match fs::remove_file(&temp).await {
                Err(e) if e.kind() != ErrorKind::NotFound => {
                    warn!(path = %temp.display(), error = %e, "Failed to remove temp file");
                },
                _ => {},
            }
            return Err(StorageError::StorageWrite {
                source,
                context: Some(format!("Target: {}", target.display()).into()),
            });
        }

        sync_dir(&self.root).await;
        debug!(path = %target.display(), "File saved atomically");
        Ok(())
    }

    fn tmp_path(&self) -> PathBuf {
        let counter = self.tmp_counter.fetch_add(1, Ordering::Relaxed);
        self.root.join(format!("{TMP_PREFIX}{counter}.{}", naming::tmp_token()))
    }
}

async fn write_and_swap(temp: &Path, target: &Path, data: &[u8]) -> std::io::Result<()> {
    {
        let mut file = fs::OpenOptions::new().create_new(true).write(true).open(temp).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
    }

    match fs::rename(temp, target).await {
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {
            fs::remove_file(target).await?;
            fs::rename(temp, target).await
        },
        other => other,
    }
}

async fn sync_dir(path: &Path) {
    match fs::File::open(path).await {
        Ok(dir) => {
            if let Err(err) = dir.sync_all().await {
                debug!(path = %path.display(), error = %err, "Directory sync failed");
            }
        },
        Err(err) => {
            debug!(path = %path.display(), error = %err, "Directory open failed");
        },
    }
}

fn guess_content_type(name: &str) -> String {
    mime_guess::from_path(name).first().map_or_else(|| OCTET_STREAM.to_owned(), |m| m.essence_str().to_owned())
}

fn sort_newest_first(records: &mut [FileRecord]) {
    records.sort_by(|a, b| {
        b.upload_time.cmp(&a.upload_time).then_with(|| b.stored_name.cmp(&a.stored_name))
    });
}
