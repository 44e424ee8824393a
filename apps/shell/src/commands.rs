use crate::args::Command;
use crate::output;
use anyhow::{Context, bail};
use depot_storage::{Category, FileRecord, FileStore, StorageError, Upload, sanitize_name};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub(crate) async fn run(store: &FileStore, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Upload { files, user, category, content_type, json } => {
            upload(store, files, user, category, content_type, json).await
        },
        Command::List { category, offset, limit, json } => {
            list(store, category.as_deref(), offset, limit, json).await
        },
        Command::Info { stored_name, json } => info(store, &stored_name, json).await,
        Command::Download { stored_name, out, force } => {
            download(store, &stored_name, out, force).await
        },
        Command::Delete { stored_name } => delete(store, &stored_name).await,
        Command::Stats { json } => {
            let stats = store.category_statistics().await?;
            if json {
                output::print_json(&stats)
            } else {
                output::render_stats(&stats);
                Ok(())
            }
        },
        Command::Storage { json } => {
            let info = store.storage_info().await?;
            if json {
                output::print_json(&info)
            } else {
                output::render_info(&info, store.max_file_size());
                Ok(())
            }
        },
    }
}

async fn upload(
    store: &FileStore,
    files: Vec<PathBuf>,
    user: Option<String>,
    category: Option<String>,
    content_type: Option<String>,
    json: bool,
) -> anyhow::Result<()> {
    let category = category
        .map(|raw| raw.parse::<Category>())
        .transpose()
        .context("Invalid --category")?;

    let mut uploads = Vec::with_capacity(files.len());
    let mut failures = Vec::new();
    for path in &files {
        match read_upload(path).await {
            Ok(mut upload) => {
                if let Some(user) = &user {
                    upload = upload.user(user);
                }
                if let Some(category) = category {
                    upload = upload.category(category);
                }
                if let Some(content_type) = &content_type {
                    upload = upload.content_type(content_type);
                }
                uploads.push(upload);
            },
            Err(e) => failures.push(format!("{}: {e:#}", path.display())),
        }
    }

    let names: Vec<String> = uploads.iter().map(|u| u.original_name().to_owned()).collect();
    let mut stored: Vec<FileRecord> = Vec::new();
    for (name, result) in names.iter().zip(store.store_batch(uploads).await) {
        match result {
            Ok(record) => stored.push(record),
            Err(e) => failures.push(format!("{name}: {}", describe_failure(&e))),
        }
    }

    if json {
        output::print_json(&stored)?;
    } else {
        for record in &stored {
            println!("Stored {} as {} ({})", record.original_name(), record.stored_name(), record.formatted_size());
        }
    }
    for failure in &failures {
        eprintln!("Rejected {failure}");
    }

    if failures.is_empty() {
        Ok(())
    } else {
        bail!("{} of {} uploads failed", failures.len(), files.len())
    }
}

async fn read_upload(path: &Path) -> anyhow::Result<Upload> {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .with_context(|| format!("{} does not name a file", path.display()))?;
    let data = fs::read(path).await.with_context(|| format!("Cannot read {}", path.display()))?;
    debug!(file = %name, bytes = data.len(), "Read upload source");
    Ok(Upload::new(name, data))
}

fn describe_failure(error: &StorageError) -> String {
    if error.is_client_error() { error.to_string() } else { format!("storage failure: {error}") }
}

async fn list(
    store: &FileStore,
    category: Option<&str>,
    offset: usize,
    limit: Option<usize>,
    json: bool,
) -> anyhow::Result<()> {
    let filter = Category::parse_filter(category);
    let page = store.page(filter, offset, limit.unwrap_or(usize::MAX)).await?;

    if json {
        return output::print_json(&page);
    }

    output::render_records(&page.items);
    println!("\n{} of {} file(s)", page.items.len(), page.total);
    Ok(())
}

async fn info(store: &FileStore, stored_name: &str, json: bool) -> anyhow::Result<()> {
    let Some(record) = store.get(stored_name).await? else {
        bail!("No stored file named {stored_name}");
    };

    if json {
        output::print_json(&record)
    } else {
        output::render_record(&record);
        Ok(())
    }
}

async fn download(
    store: &FileStore,
    stored_name: &str,
    out: Option<PathBuf>,
    force: bool,
) -> anyhow::Result<()> {
    let Some(download) = store.open(stored_name).await? else {
        bail!("No stored file named {stored_name}");
    };

    let destination = match out {
        Some(path) => path,
        None => PathBuf::from(
            sanitize_name(download.file_name()).unwrap_or_else(|_| stored_name.to_owned()),
        ),
    };
    if !force && fs::try_exists(&destination).await.unwrap_or(false) {
        bail!("{} already exists; pass --force to replace it", destination.display());
    }

    let (record, mut source) = download.into_parts();
    let mut target = fs::File::create(&destination)
        .await
        .with_context(|| format!("Cannot create {}", destination.display()))?;
    let copied = tokio::io::copy(&mut source, &mut target).await.context("Download failed")?;
    target.sync_all().await?;

    println!(
        "Saved {} to {} ({}, {})",
        record.stored_name(),
        destination.display(),
        record.content_type(),
        depot_storage::format_size(copied),
    );
    Ok(())
}

async fn delete(store: &FileStore, stored_name: &str) -> anyhow::Result<()> {
    if store.delete(stored_name).await? {
        println!("Deleted {stored_name}");
    } else {
        println!("Nothing stored under {stored_name}");
    }
    Ok(())
}
