use depot_derive::depot_error;
use std::borrow::Cow;

#[depot_error]
pub enum DemoError {
    #[error("IO error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[no_from]
    #[error("Write failed{}: {source}", format_context(.context))]
    Write { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[no_from]
    #[error("Delete failed{}: {source}", format_context(.context))]
    Delete { source: std::io::Error, context: Option<Cow<'static, str>> },
}

fn main() {
    let io = std::io::Error::other("disk");
    let default: DemoError = io.into();
    assert!(matches!(default, DemoError::Io { .. }));

    let write = DemoError::Write { source: std::io::Error::other("full"), context: None };
    let write: Result<(), DemoError> = Err(write);
    let write = write.context("Saving upload").unwrap_err();
    assert_eq!(write.to_string(), "Write failed (Saving upload): full");

    let _ = DemoError::Delete { source: std::io::Error::other("perm"), context: None };
}
