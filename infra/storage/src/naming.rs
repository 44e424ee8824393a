//! Client filename hygiene and collision-free stored names.

use crate::error::StorageError;
use std::fmt;

/// Prefix of in-flight atomic writes inside the storage root.
///
/// Stored names always start with a timestamp digit, so nothing the namer produces can
/// collide with it.
pub(crate) const TMP_PREFIX: &str = ".depottmp.";

// Token alphabet: 2-9, A-Z (minus I, O), a-z (minus l). Never contains the `_` separator.
const TOKEN_ALPHABET: &[char; 55] = &[
    '2', '3', '4', '5', '6', '7', '8', '9', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'J', 'K', 'L',
    'M', 'N', 'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'a', 'b', 'c', 'd', 'e', 'f',
    'g', 'h', 'j', 'k', 'm', 'n', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];
const TOKEN_LEN: usize = 8;

/// Longest single path segment most filesystems accept.
const NAME_MAX: usize = 255;

/// Bytes [`TimestampNamer`] puts in front of the client name: 13 digits of millis, the
/// token and two separators.
const STORED_PREFIX_LEN: usize = 13 + TOKEN_LEN + 2;

/// Longest sanitized filename, in UTF-8 bytes, that still fits a stored name.
pub const MAX_NAME_LEN: usize = NAME_MAX - STORED_PREFIX_LEN;

/// Reduces a client-supplied filename to a single safe path segment.
///
/// Backslashes are treated as separators, empty and `.` segments are dropped. Anything that
/// still names more than one segment, walks upward with `..`, or carries control characters
/// is rejected, as is a name longer than [`MAX_NAME_LEN`] bytes.
///
/// # Errors
/// [`StorageError::InvalidName`] with a human-readable reason.
pub fn sanitize_name(raw: &str) -> Result<String, StorageError> {
    if raw.trim().is_empty() {
        return Err(invalid("Filename cannot be empty"));
    }
    if raw.chars().any(char::is_control) {
        return Err(invalid("Filename cannot contain control characters"));
    }

    let normalized = raw.replace('\\', "/");
    let mut segments = normalized.split('/').filter(|seg| !seg.is_empty() && *seg != ".");

    let Some(name) = segments.next() else {
        return Err(invalid("Filename cannot be empty"));
    };
    if name == ".." || segments.clone().any(|seg| seg == "..") {
        return Err(invalid(format!("Filename contains invalid path sequence {raw}")));
    }
    if segments.next().is_some() {
        return Err(invalid(format!("Filename must not contain directories {raw}")));
    }
    if name.trim().is_empty() {
        return Err(invalid("Filename cannot be empty"));
    }
    if name.len() > MAX_NAME_LEN {
        return Err(invalid(format!("Filename is too long ({} bytes, at most {MAX_NAME_LEN})", name.len())));
    }

    Ok(name.to_owned())
}

/// The text after the last `.`, when there is at least one character on each side of it.
///
/// Case is preserved; callers lower-case for comparisons.
#[must_use]
pub fn extension_of(name: &str) -> Option<&str> {
    match name.rfind('.') {
        Some(idx) if idx > 0 && idx + 1 < name.len() => Some(&name[idx + 1..]),
        _ => None,
    }
}

/// Strategy that turns a sanitized name into a unique stored name and back.
///
/// `original_name(&stored_name(n)) == n` must hold for every sanitized `n`.
pub trait NameScheme: Send + Sync + fmt::Debug {
    fn stored_name(&self, sanitized: &str) -> String;

    /// Best-effort recovery of the client name from a stored name.
    ///
    /// Also applied to files that were placed in the root by something other than the store.
    fn original_name(&self, stored: &str) -> String;
}

/// `<unix-millis>_<random token>_<sanitized name>`.
///
/// The token keeps names unique when many uploads of the same file land within one
/// millisecond. Neither prefix part contains `_`, so the client name is recovered exactly by
/// splitting on the first two underscores.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimestampNamer;

impl NameScheme for TimestampNamer {
    fn stored_name(&self, sanitized: &str) -> String {
        let millis = chrono::Utc::now().timestamp_millis();
        let token = nanoid::nanoid!(TOKEN_LEN, TOKEN_ALPHABET);
        format!("{millis}_{token}_{sanitized}")
    }

    fn original_name(&self, stored: &str) -> String {
        let mut parts = stored.splitn(3, '_');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(_), Some(_), Some(rest)) if !rest.is_empty() => rest.to_owned(),
            _ => stored.to_owned(),
        }
    }
}

/// Short random suffix for temp files; keeps them well below [`NAME_MAX`].
pub(crate) fn tmp_token() -> String {
    nanoid::nanoid!(TOKEN_LEN, TOKEN_ALPHABET)
}

fn invalid(message: impl Into<std::borrow::Cow<'static, str>>) -> StorageError {
    StorageError::InvalidName { message: message.into(), context: None }
}
