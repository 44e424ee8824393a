//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "depot")]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Store, browse and retrieve uploaded files")]
pub(crate) struct Cli {
    /// Configuration file (`depot.toml` etc. in the working directory by default)
    #[arg(short, long, global = true)]
    pub(crate) config: Option<PathBuf>,

    /// Upload directory, overriding the configuration
    #[arg(short, long, global = true)]
    pub(crate) root: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    pub(crate) verbose: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Upload one or more files
    Upload {
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Uploader recorded with each file
        #[arg(short, long)]
        user: Option<String>,
        /// Category override (DOCUMENT, IMAGE, VIDEO, AUDIO, ARCHIVE, CODE, EXECUTABLE, OTHER)
        #[arg(long)]
        category: Option<String>,
        /// Content type recorded instead of the guessed one
        #[arg(long)]
        content_type: Option<String>,
        /// Print records as JSON
        #[arg(long)]
        json: bool,
    },
    /// List stored files, newest first
    #[command(alias = "ls")]
    List {
        /// Only this category; unknown names list everything
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 0)]
        offset: usize,
        #[arg(long)]
        limit: Option<usize>,
        #[arg(long)]
        json: bool,
    },
    /// Show the metadata of one stored file
    Info {
        stored_name: String,
        #[arg(long)]
        json: bool,
    },
    /// Copy a stored file out of the store
    Download {
        stored_name: String,
        /// Destination file (the original name in the working directory by default)
        #[arg(short, long)]
        out: Option<PathBuf>,
        /// Replace an existing destination
        #[arg(short, long)]
        force: bool,
    },
    /// Delete a stored file
    #[command(alias = "rm")]
    Delete { stored_name: String },
    /// File count per category
    Stats {
        #[arg(long)]
        json: bool,
    },
    /// Summary of the upload directory
    Storage {
        #[arg(long)]
        json: bool,
    },
}
