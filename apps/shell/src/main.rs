mod args;
mod commands;
mod output;

use crate::args::Cli;
use anyhow::Context;
use clap::Parser;
use depot_kernel::config::load_config_or_default;
use depot_kernel::domain::config::{DepotConfig, LoggingConfig, StorageConfig};
use depot_logger::{LevelFilter, Logger, parse_level};
use depot_storage::FileStore;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut cfg: DepotConfig = load_config_or_default(cli.config.as_deref())
        .context("Critical: Configuration is malformed")?;
    if let Some(root) = &cli.root {
        cfg.storage.upload_dir.clone_from(root);
    }

    let _log = init_logging(&cfg.logging, cli.verbose)?;
    let store = open_store(&cfg.storage).await?;

    commands::run(&store, cli.command).await
}

fn init_logging(cfg: &LoggingConfig, verbose: bool) -> anyhow::Result<Logger> {
    let level = if verbose { LevelFilter::DEBUG } else { parse_level(&cfg.level)? };
    let builder = Logger::builder().name(env!("CARGO_BIN_NAME")).level(level);

    let logger = match &cfg.path {
        Some(path) => builder.path(path).json(cfg.json).init()?,
        None => builder.init()?,
    };
    Ok(logger)
}

async fn open_store(cfg: &StorageConfig) -> anyhow::Result<FileStore> {
    FileStore::builder()
        .root(&cfg.upload_dir)
        .max_file_size(cfg.max_file_size)
        .allowed_extensions(cfg.allowed_extension_list())
        .default_user(&cfg.default_user)
        .download_prefix(&cfg.download_prefix)
        .connect()
        .await
        .with_context(|| format!("Cannot open upload directory {}", cfg.upload_dir.display()))
}
