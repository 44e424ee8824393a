use crate::naming::TMP_PREFIX;
use std::path::Path;
use std::time::{Duration, SystemTime};
use tracing::{error, info, warn};
use walkdir::{DirEntry, WalkDir};

/// Age after which an in-flight write is considered abandoned.
const STALE_AFTER: Duration = Duration::from_secs(300);

/// Removes abandoned atomic-write leftovers from the top level of the root.
pub(crate) async fn purge_tmp(root: &Path) -> usize {
    let root = root.to_path_buf();
    let now = SystemTime::now();

    match tokio::task::spawn_blocking(move || remove_stale(&root, now, STALE_AFTER)).await {
        Ok((removed, failed)) => {
            if removed > 0 || failed > 0 {
                info!(removed, failed, "Cleaned up abandoned upload fragments");
            }
            removed
        },
        Err(e) => {
            error!(error = %e, "Temp file cleanup task panicked");
            0
        },
    }
}

fn remove_stale(root: &Path, now: SystemTime, threshold: Duration) -> (usize, usize) {
    let mut removed = 0;
    let mut failed = 0;

    WalkDir::new(root)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .flatten()
        .filter(|entry| is_tmp(entry) && is_stale(entry, now, threshold))
        .for_each(|entry| {
            let path = entry.path();
            match std::fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    warn!(path = %path.display(), error = %e, "Failed to remove temp file");
                    failed += 1;
                },
            }
        });

    (removed, failed)
}

fn is_tmp(entry: &DirEntry) -> bool {
    entry.file_type().is_file() && entry.file_name().to_str().is_some_and(|name| name.starts_with(TMP_PREFIX))
}

fn is_stale(entry: &DirEntry, now: SystemTime, threshold: Duration) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_none_or(|age| age > threshold)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn only_stale_fragments_are_removed() {
        let tmp = tempdir().unwrap();
        let root = tmp.path();
        std::fs::write(root.join(format!("{TMP_PREFIX}1.1_abc_a.txt")), b"partial").unwrap();
        std::fs::write(root.join("1_abc_a.txt"), b"kept").unwrap();
        std::fs::create_dir(root.join("nested")).unwrap();
        std::fs::write(root.join("nested").join(format!("{TMP_PREFIX}2.x")), b"deep").unwrap();

        let fresh = remove_stale(root, SystemTime::now(), STALE_AFTER);
        assert_eq!(fresh, (0, 0));

        let later = SystemTime::now() + Duration::from_secs(600);
        let (removed, failed) = remove_stale(root, later, STALE_AFTER);
        assert_eq!((removed, failed), (1, 0));
        assert!(root.join("1_abc_a.txt").exists());
        assert!(root.join("nested").join(format!("{TMP_PREFIX}2.x")).exists());
    }
}
