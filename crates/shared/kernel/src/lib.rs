//! Kernel utilities shared by the FileDepot applications.
//! Keep this crate lightweight: it owns configuration loading and re-exports the domain models.
//!
//! ```rust,no_run
//! use depot_kernel::config::load_config_or_default;
//! use depot_kernel::domain::config::DepotConfig;
//!
//! let cfg: DepotConfig = load_config_or_default(Some("depot")).unwrap();
//! println!("storing uploads in {}", cfg.storage.upload_dir.display());
//! ```

pub mod config;

pub use depot_domain as domain;
