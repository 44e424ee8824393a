//! Upload storage over a single flat directory.
//!
//! Clients hand in a filename and bytes; the store validates them, gives the file a
//! collision-free name, classifies it and remembers its metadata. The directory stays the
//! source of truth: files placed there by other means are picked up on the next listing,
//! and cache entries for files that disappeared are dropped.
//!
//! # Core Features
//!
//! - **Name Hygiene**: Client names are reduced to one safe path segment before use.
//! - **Unique Names**: `<millis>_<token>_<name>` keeps concurrent uploads of the same file apart.
//! - **Categories**: Extension-driven classification into documents, images, video, etc.
//! - **Atomic Writes**: Content lands under its final name only after a synced temp write.
//! - **Traversal Protection**: Lookups and deletes cannot address anything but direct
//!   children of the canonical root.
//!
//! # Examples
//!
//! ```rust
//! use depot_storage::{FileStore, StorageError, Upload};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), StorageError> {
//!     # let tmp = tempfile::tempdir().unwrap();
//!     # let root = tmp.path().join("uploads");
//!     let store = FileStore::builder()
//!         .root(&root)
//!         .max_file_size(10 * 1024 * 1024)
//!         .allowed_extensions(["pdf", "png", "txt"])
//!         .connect()
//!         .await?;
//!
//!     let results = store
//!         .store_batch([
//!             Upload::new("notes.txt", b"hello".to_vec()),
//!             Upload::new("script.exe", b"MZ".to_vec()),
//!         ])
//!         .await;
//!     assert!(results[0].is_ok());
//!     assert!(results[1].as_ref().is_err_and(StorageError::is_client_error));
//!
//!     let stats = store.category_statistics().await?;
//!     assert_eq!(stats.values().sum::<usize>(), 1);
//!     Ok(())
//! }
//! ```

mod builder;
mod cache;
mod category;
mod engine;
mod error;
mod maintenance;
mod naming;
mod record;
mod security;

pub use builder::{
    DEFAULT_ALLOWED_EXTENSIONS, DEFAULT_MAX_FILE_SIZE, DEFAULT_USER, FileStoreBuilder, NoRoot,
    WithRoot,
};
pub use cache::MetadataCache;
pub use category::{Category, UnknownCategory};
pub use engine::FileStore;
pub use error::{StorageError, StorageErrorExt};
pub use naming::{MAX_NAME_LEN, NameScheme, TimestampNamer, extension_of, sanitize_name};
pub use record::{Download, FileRecord, Page, StorageInfo, Upload, format_size};
