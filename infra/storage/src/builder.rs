use crate::cache::MetadataCache;
use crate::engine::{FileStore, FileStoreInner};
use crate::error::{StorageError, StorageErrorExt};
use crate::maintenance;
use crate::naming::{NameScheme, TimestampNamer};
use fxhash::FxHashSet;
use private::Sealed;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio::fs;
use tracing::{debug, info};

/// Two gibibytes.
pub const DEFAULT_MAX_FILE_SIZE: u64 = 2 * 1024 * 1024 * 1024;

pub const DEFAULT_ALLOWED_EXTENSIONS: &[&str] = &[
    "jpg", "jpeg", "png", "gif", "pdf", "doc", "docx", "xls", "xlsx", "txt", "zip", "rar", "mp4",
    "avi", "mp3", "wav",
];

pub const DEFAULT_USER: &str = "system";

#[derive(Debug)]
struct StoreSettings {
    create: bool,
    max_file_size: u64,
    allowed_extensions: FxHashSet<String>,
    default_user: String,
    download_prefix: Option<String>,
    cache: Option<MetadataCache>,
    namer: Option<Arc<dyn NameScheme>>,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            create: true,
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            allowed_extensions: DEFAULT_ALLOWED_EXTENSIONS.iter().map(|ext| (*ext).to_owned()).collect(),
            default_user: DEFAULT_USER.to_owned(),
            download_prefix: None,
            cache: None,
            namer: None,
        }
    }
}

#[derive(Debug, Default)]
pub struct NoRoot;
#[derive(Debug)]
pub struct WithRoot(PathBuf);

mod private {
    pub(super) trait Sealed {}
}
impl Sealed for NoRoot {}
impl Sealed for WithRoot {}

/// Typestate builder for [`FileStore`]; [`FileStoreBuilder::connect`] unlocks once a root is set.
#[allow(private_bounds)]
#[derive(Debug, Default)]
pub struct FileStoreBuilder<S: Sealed = NoRoot> {
    state: S,
    settings: StoreSettings,
}

#[allow(private_bounds)]
impl<S: Sealed> FileStoreBuilder<S> {
    #[must_use = "Sets whether the upload root should be created if it does not exist"]
    pub const fn create(mut self, enable: bool) -> Self {
        self.settings.create = enable;
        self
    }

    #[must_use = "Sets the largest accepted upload in bytes"]
    pub const fn max_file_size(mut self, bytes: u64) -> Self {
        self.settings.max_file_size = bytes;
        self
    }

    /// Replaces the extension allow-list. Entries are trimmed, lower-cased and may carry a
    /// leading dot.
    #[must_use = "Sets the accepted file extensions"]
    pub fn allowed_extensions<I, E>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = E>,
        E: AsRef<str>,
    {
        self.settings.allowed_extensions = extensions
            .into_iter()
            .map(|ext| ext.as_ref().trim().trim_start_matches('.').to_lowercase())
            .filter(|ext| !ext.is_empty())
            .collect();
        self
    }

    #[must_use = "Sets the uploader recorded when none is supplied"]
    pub fn default_user(mut self, user: impl Into<String>) -> Self {
        self.settings.default_user = user.into();
        self
    }

    /// Records get `download_url = prefix + stored_name`. Blank prefixes are ignored.
    #[must_use = "Sets the download URL prefix"]
    pub fn download_prefix(mut self, prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        self.settings.download_prefix = (!prefix.trim().is_empty()).then_some(prefix);
        self
    }

    /// Shares an existing cache instead of starting with an empty one.
    #[must_use = "Sets the metadata cache"]
    pub fn cache(mut self, cache: MetadataCache) -> Self {
        self.settings.cache = Some(cache);
        self
    }

    #[must_use = "Sets the stored-name strategy"]
    pub fn namer(mut self, namer: impl NameScheme + 'static) -> Self {
        self.settings.namer = Some(Arc::new(namer));
        self
    }

    fn transition<N: Sealed>(self, state: N) -> FileStoreBuilder<N> {
        FileStoreBuilder { state, settings: self.settings }
    }
}

impl FileStoreBuilder<NoRoot> {
    #[must_use = "Creates a new store builder with default configuration"]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use = "Sets the flat directory that holds every upload"]
    pub fn root(self, path: impl Into<PathBuf>) -> FileStoreBuilder<WithRoot> {
        self.transition(WithRoot(path.into()))
    }
}

impl FileStoreBuilder<WithRoot> {
    /// Prepares the root and returns a ready [`FileStore`].
    ///
    /// 1. Creates the root when `create(true)` (the default) is set.
    /// 2. Canonicalizes it so traversal checks compare physical paths.
    /// 3. Removes abandoned atomic-write fragments left by a previous crash.
    ///
    /// # Errors
    /// [`StorageError::Io`] when the root cannot be created or resolved, or is not a directory.
    pub async fn connect(self) -> Result<FileStore, StorageError> {
        let FileStoreBuilder { state: WithRoot(root), settings } = self;

        if settings.create {
            fs::create_dir_all(&root)
                .await
                .context(format!("Failed to bootstrap upload root: {}", root.display()))?;
            debug!(path = %root.display(), "Upload root ready");
        }

        let canonical = fs::canonicalize(&root)
            .await
            .context(format!("Failed to resolve upload root: {}", root.display()))?;

        let meta = fs::metadata(&canonical)
            .await
            .context(format!("Failed to inspect upload root: {}", canonical.display()))?;
        if !meta.is_dir() {
            return Err(StorageError::Io {
                source: std::io::Error::new(std::io::ErrorKind::NotADirectory, "not a directory"),
                context: Some(format!("Upload root: {}", canonical.display()).into()),
            });
        }

        let store = FileStore {
            inner: Arc::new(FileStoreInner {
                root: canonical,
                max_file_size: settings.max_file_size,
                allowed_extensions: settings.allowed_extensions,
                default_user: settings.default_user,
                download_prefix: settings.download_prefix,
                cache: settings.cache.unwrap_or_default(),
                namer: settings.namer.unwrap_or_else(|| Arc::new(TimestampNamer)),
                tmp_counter: AtomicU64::new(1),
            }),
        };

        maintenance::purge_tmp(&store.root).await;

        info!(
            path = %store.root.display(),
            max_file_size = store.max_file_size,
            extensions = store.allowed_extensions.len(),
            "File store connected"
        );

        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allow_list_is_normalized() {
        let builder = FileStoreBuilder::new().allowed_extensions([" PDF", ".png", "", "Zip "]);
        let mut list: Vec<_> = builder.settings.allowed_extensions.iter().cloned().collect();
        list.sort();
        assert_eq!(list, ["pdf", "png", "zip"]);
    }

    #[test]
    fn blank_download_prefix_is_ignored() {
        let builder = FileStoreBuilder::new().download_prefix("  ");
        assert!(builder.settings.download_prefix.is_none());
        let builder = builder.download_prefix("/download/");
        assert_eq!(builder.settings.download_prefix.as_deref(), Some("/download/"));
    }

    #[test]
    fn defaults() {
        let builder = FileStoreBuilder::new();
        assert!(builder.settings.create);
        assert_eq!(builder.settings.max_file_size, DEFAULT_MAX_FILE_SIZE);
        assert_eq!(builder.settings.allowed_extensions.len(), DEFAULT_ALLOWED_EXTENSIONS.len());
        assert_eq!(builder.settings.default_user, DEFAULT_USER);
    }

    #[tokio::test]
    async fn connect_rejects_missing_root_without_create() {
        let tmp = tempfile::tempdir().unwrap();
        let err = FileStoreBuilder::new()
            .create(false)
            .root(tmp.path().join("missing"))
            .connect()
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }

    #[tokio::test]
    async fn connect_rejects_file_root() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("plain.txt");
        std::fs::write(&file, b"x").unwrap();
        let err = FileStoreBuilder::new().root(&file).connect().await.unwrap_err();
        assert!(matches!(err, StorageError::Io { .. }));
    }
}
