use config::{Config, Environment, File};
use serde::de::DeserializeOwned;
use std::borrow::Cow;
use std::path::{Path, PathBuf};
use tracing::info;

/// Prefix of environment overrides, e.g. `DEPOT__STORAGE__MAX_FILE_SIZE`.
pub const ENV_PREFIX: &str = "DEPOT";
const DEFAULT_CONFIG_FILE: &str = "depot";

#[depot_derive::depot_error]
pub enum ConfigError {
    #[error("Config error{}: {source}", format_context(.context))]
    Config { source: config::ConfigError, context: Option<Cow<'static, str>> },
}

/// Loads `T` from a configuration file layered with environment overrides.
///
/// 1. **Base File**: `path` (format inferred from the extension; `depot` in the working
///    directory when `None`). The file is required.
/// 2. **Environment Overrides**: variables prefixed with `DEPOT__`, nested with `__`
///    (`DEPOT__STORAGE__UPLOAD_DIR` maps to `storage.upload_dir`).
///
/// # Errors
/// Fails when the file is missing or unreadable, or when the merged values do not
/// deserialize into `T`.
pub fn load_config<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load(path, true)
}

/// Same as [`load_config`], but a missing file is not an error: defaults of `T` are
/// used and environment overrides still apply.
///
/// # Errors
/// Fails when a present file is malformed or values do not deserialize into `T`.
pub fn load_config_or_default<T>(path: Option<impl AsRef<Path>>) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    load(path, false)
}

fn load<T>(path: Option<impl AsRef<Path>>, required: bool) -> Result<T, ConfigError>
where
    T: DeserializeOwned,
{
    let effective_path =
        path.map_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE), |p| p.as_ref().to_path_buf());

    let builder = Config::builder()
        .add_source(File::from(effective_path.as_path()).required(required))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true)
                .convert_case(config::Case::Snake),
        );

    info!(path = %effective_path.display(), required, "Loading configuration");

    let config = builder
        .build()
        .context("Failed to build config")?
        .try_deserialize::<T>()
        .context("Failed to deserialize config")?;

    Ok(config)
}
