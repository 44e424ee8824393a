use crate::error::StorageError;
use std::path::{Component, Path, PathBuf};

/// A caller-supplied stored name that is proven to address a direct child of the root.
#[derive(Debug)]
pub(crate) struct Resolved {
    pub(crate) name: String,
    pub(crate) path: PathBuf,
}

/// Collapses `.` / `..` lexically and insists on exactly one remaining segment.
///
/// The root is flat, so anything that resolves to the root itself or to a nested path is
/// rejected just like an escape.
fn normalize_flat(raw: &str) -> Result<String, StorageError> {
    let path = Path::new(raw);
    let mut out = PathBuf::new();

    for c in path.components() {
        match c {
            Component::CurDir => {},
            Component::Normal(seg) => out.push(seg),
            Component::ParentDir => {
                if !out.pop() {
                    return Err(violation(raw, "Path attempted to escape the storage root via '..'"));
                }
            },
            Component::RootDir | Component::Prefix(_) => {
                return Err(violation(raw, "Absolute paths are not allowed"));
            },
        }
    }

    let mut components = out.components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(seg)), None) => seg
            .to_str()
            .map(str::to_owned)
            .ok_or_else(|| violation(raw, "Stored name is not valid UTF-8")),
        (None, _) => Err(violation(raw, "Path does not name a file")),
        _ => Err(violation(raw, "Nested paths are not allowed in the flat storage root")),
    }
}

/// Joins a stored name to the canonical root and verifies it cannot leave it.
///
/// Existing targets are canonicalized so a symlink pointing outside the root is caught.
pub(crate) fn resolve_stored(root: &Path, raw: &str) -> Result<Resolved, StorageError> {
    let name = normalize_flat(raw)?;
    let joined = root.join(&name);

    match joined.canonicalize() {
        Ok(canonical) if canonical.starts_with(root) => Ok(Resolved { name, path: joined }),
        Ok(canonical) => Err(StorageError::PathSecurity {
            message: canonical.display().to_string().into(),
            context: Some("Resolved path lies outside the storage root".into()),
        }),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Resolved { name, path: joined }),
        Err(e) => Err(StorageError::Io {
            source: e,
            context: Some(format!("Failed to verify {}", joined.display()).into()),
        }),
    }
}

fn violation(raw: &str, reason: &'static str) -> StorageError {
    StorageError::PathSecurity { message: raw.to_owned().into(), context: Some(reason.into()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn direct_children_resolve() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();

        let resolved = resolve_stored(&root, "1_abc_report.pdf").unwrap();
        assert_eq!(resolved.name, "1_abc_report.pdf");
        assert_eq!(resolved.path, root.join("1_abc_report.pdf"));

        let resolved = resolve_stored(&root, "./x.txt").unwrap();
        assert_eq!(resolved.name, "x.txt");

        let resolved = resolve_stored(&root, "sub/../y.txt").unwrap();
        assert_eq!(resolved.name, "y.txt");
    }

    #[test]
    fn escapes_and_nesting_are_rejected() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().canonicalize().unwrap();

        for raw in ["../outside.txt", "sub/../../etc/passwd", "/etc/passwd", "a/b.txt", "", ".", "x/.."] {
            let err = resolve_stored(&root, raw).unwrap_err();
            assert!(err.is_security_violation(), "{raw:?} should be a security violation");
        }
    }

    #[cfg(unix)]
    #[test]
    fn symlink_out_of_root_is_rejected() {
        let tmp = tempdir().unwrap();
        let root = tmp.path().join("root");
        std::fs::create_dir(&root).unwrap();
        let root = root.canonicalize().unwrap();
        let secret = tmp.path().join("secret.txt");
        std::fs::write(&secret, b"s").unwrap();
        std::os::unix::fs::symlink(&secret, root.join("link.txt")).unwrap();

        let err = resolve_stored(&root, "link.txt").unwrap_err();
        assert!(err.is_security_violation());
    }
}
