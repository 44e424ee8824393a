use std::borrow::Cow;

/// Errors raised by the upload store.
///
/// The first four variants are client-correctable validation failures whose message is a
/// human-readable reason. `StorageWrite`/`StorageDelete`/`Io` are server-side I/O failures.
/// `PathSecurity` is a rejected traversal attempt.
#[depot_derive::depot_error]
pub enum StorageError {
    #[error("{message}{}", format_context(.context))]
    InvalidName { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}{}", format_context(.context))]
    EmptyFile { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}{}", format_context(.context))]
    FileTooLarge { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("{message}{}", format_context(.context))]
    UnsupportedType { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[no_from]
    #[error("Failed to store file{}: {source}", format_context(.context))]
    StorageWrite { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[no_from]
    #[error("Failed to delete file{}: {source}", format_context(.context))]
    StorageDelete { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Path traversal security violation{}: {message}", format_context(.context))]
    PathSecurity { message: Cow<'static, str>, context: Option<Cow<'static, str>> },

    #[error("Storage I/O failure{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },
}

impl StorageError {
    /// `true` for validation failures the uploader can fix by changing the request.
    #[must_use]
    pub const fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidName { .. }
                | Self::EmptyFile { .. }
                | Self::FileTooLarge { .. }
                | Self::UnsupportedType { .. }
        )
    }

    #[must_use]
    pub const fn is_security_violation(&self) -> bool {
        matches!(self, Self::PathSecurity { .. })
    }
}
