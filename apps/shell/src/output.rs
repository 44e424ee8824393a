use depot_storage::{Category, FileRecord, StorageInfo, format_size};
use serde::Serialize;
use std::collections::BTreeMap;

pub(crate) fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn render_records(records: &[FileRecord]) {
    println!("{:<48} {:<32} {:>10} {:<11} {:<20} {}", "Stored Name", "Original", "Size", "Category", "Uploaded", "User");
    println!("{:-<132}", "");
    for record in records {
        println!(
            "{:<48} {:<32} {:>10} {:<11} {:<20} {}",
            record.stored_name(),
            record.original_name(),
            record.formatted_size(),
            record.category(),
            record.upload_time().format("%Y-%m-%d %H:%M:%S"),
            record.upload_user(),
        );
    }
}

pub(crate) fn render_record(record: &FileRecord) {
    println!("Stored name:   {}", record.stored_name());
    println!("Original name: {}", record.original_name());
    println!("Size:          {} ({} bytes)", record.formatted_size(), record.size_bytes());
    println!("Content type:  {}", record.content_type());
    println!("Category:      {} ({})", record.category().display_name(), record.category());
    println!("Extension:     {}", record.extension());
    println!("Uploaded:      {}", record.upload_time().to_rfc3339());
    println!("Uploaded by:   {}", record.upload_user());
    println!("Path:          {}", record.file_path().display());
    if let Some(url) = record.download_url() {
        println!("Download URL:  {url}");
    }
}

pub(crate) fn render_stats(stats: &BTreeMap<Category, usize>) {
    println!("{:<12} {:<8} {:>6}", "Category", "Color", "Files");
    println!("{:-<28}", "");
    for (category, count) in stats {
        println!("{:<12} {:<8} {:>6}", category.display_name(), category.color(), count);
    }
}

pub(crate) fn render_info(info: &StorageInfo, max_file_size: u64) {
    println!("Root:           {}", info.root.display());
    println!("Files:          {}", info.total_files);
    println!("Total size:     {}", format_size(info.total_bytes));
    println!("Cached entries: {}", info.cached_entries);
    println!("Upload limit:   {}", format_size(max_file_size));
    println!("Volume size:    {}", format_size(info.total_bytes_on_volume));
    println!("Volume free:    {}", format_size(info.free_bytes));
    println!("Available:      {}", format_size(info.available_bytes));
}
