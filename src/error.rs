//! Error types for a multipart upload run.
//!
//! Every variant is terminal for the run. The orchestrator decides which of
//! them still owe the store an abort.

use std::path::PathBuf;

/// A rejected or malformed response from the object store.
#[derive(Debug, thiserror::Error)]
#[error("{operation} failed: {message}")]
pub struct StoreError {
    pub operation: &'static str,
    pub message: String,
}

impl StoreError {
    pub fn new(operation: &'static str, message: impl Into<String>) -> Self {
        Self {
            operation,
            message: message.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("{path}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("{path}: {source}")]
    LocalIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("create multipart upload: {0}")]
    Session(#[source] StoreError),

    #[error("part {part_number}: {source}")]
    Transfer {
        part_number: i32,
        #[source]
        source: StoreError,
    },

    #[error("complete multipart upload: {0}")]
    Completion(#[source] StoreError),
}

impl Error {
    /// Human-readable name of the phase that failed.
    pub fn phase(&self) -> &'static str {
        match self {
            Error::Config { .. } => "reading config",
            Error::LocalIo { .. } => "reading local file",
            Error::Session(_) => "creating multipart upload",
            Error::Transfer { .. } => "uploading part",
            Error::Completion(_) => "completing multipart upload",
        }
    }

    pub(crate) fn local_io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::LocalIo {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transfer_error_names_the_part() {
        let err = Error::Transfer {
            part_number: 5,
            source: StoreError::new("UploadPart", "AccessDenied"),
        };
        assert_eq!(err.to_string(), "part 5: UploadPart failed: AccessDenied");
        assert_eq!(err.phase(), "uploading part");
    }

    #[test]
    fn config_error_names_the_file_once() {
        let err = Error::Config {
            path: PathBuf::from("config.json"),
            reason: "BucketName must not be empty".into(),
        };
        assert_eq!(
            format!("{}: {err}", err.phase()),
            "reading config: config.json: BucketName must not be empty"
        );
    }

    #[test]
    fn local_io_keeps_the_path() {
        let err = Error::local_io(
            "/tmp/missing.bin",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert!(err.to_string().starts_with("/tmp/missing.bin: "));
        assert_eq!(err.phase(), "reading local file");
    }
}
