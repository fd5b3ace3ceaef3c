//! Error types for zipkit-core

use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use thiserror::Error;
use zip::result::ZipError;

/// Failure classes reported to callers in a [`crate::Response`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Archive file, source path or member does not exist
    NotFound,
    /// Target archive exists and overwrite was not requested
    AlreadyExists,
    /// Checksum or header mismatch on a member
    Corrupt,
    /// Caller-supplied paths that cannot be mapped into or out of an archive
    InvalidInput,
    /// Any other I/O or format failure
    Unexpected,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::NotFound => "not found",
            ErrorKind::AlreadyExists => "already exists",
            ErrorKind::Corrupt => "corrupt",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::Unexpected => "unexpected",
        };
        f.write_str(name)
    }
}

/// Core error types for the zipkit library
///
/// The display text of each variant is the message handed back to callers,
/// so wrapped library errors print their own text unchanged.
#[derive(Error, Debug)]
pub enum Error {
    /// The archive itself could not be opened because it does not exist
    #[error("{} {}", os_reason(.source), .path)]
    ArchiveNotFound {
        path: String,
        #[source]
        source: io::Error,
    },

    /// A declared source path does not exist
    #[error("File not found: {0}")]
    SourceNotFound(String),

    /// A requested member is not stored in the archive
    #[error("There is no item named '{0}' in the archive")]
    MemberNotFound(String),

    /// Target archive already exists
    #[error("File exists: {0}")]
    FileExists(String),

    /// First member that failed CRC or header validation
    #[error("{0}")]
    Corrupt(String),

    /// Member data that failed decompression or its CRC while being read
    #[error("{member}: {source}")]
    CorruptMember {
        member: String,
        #[source]
        source: io::Error,
    },

    /// Path that cannot be mapped to a safe archive or destination name
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Caller input that is unusable for another reason
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration-related error
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O operation failed
    #[error("{0}")]
    Io(#[from] io::Error),

    /// ZIP reader or writer failed
    #[error("{0}")]
    Zip(#[from] ZipError),

    /// Directory traversal failed
    #[error("{0}")]
    Walk(#[from] walkdir::Error),
}

impl Error {
    /// Classify this error into the caller-facing taxonomy.
    ///
    /// This is the only place where underlying library failures are mapped
    /// to an [`ErrorKind`].
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ArchiveNotFound { .. } | Error::SourceNotFound(_) | Error::MemberNotFound(_) => {
                ErrorKind::NotFound
            }
            Error::FileExists(_) => ErrorKind::AlreadyExists,
            Error::Corrupt(_) | Error::CorruptMember { .. } => ErrorKind::Corrupt,
            Error::InvalidPath(_) | Error::InvalidInput(_) => ErrorKind::InvalidInput,
            Error::Config(_) => ErrorKind::Unexpected,
            Error::Io(err) => classify_io(err),
            Error::Zip(ZipError::Io(err)) => classify_io(err),
            Error::Zip(ZipError::FileNotFound) => ErrorKind::NotFound,
            Error::Zip(_) => ErrorKind::Unexpected,
            Error::Walk(err) => err
                .io_error()
                .map(classify_io)
                .unwrap_or(ErrorKind::Unexpected),
        }
    }

    /// Wrap a failure to open `path` as an archive, keeping the OS reason
    /// when the file is missing.
    pub(crate) fn opening(path: &str, err: io::Error) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            Error::ArchiveNotFound {
                path: path.to_string(),
                source: err,
            }
        } else {
            Error::Io(err)
        }
    }
}

fn classify_io(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::AlreadyExists => ErrorKind::AlreadyExists,
        _ => ErrorKind::Unexpected,
    }
}

/// OS error text without the trailing `(os error N)` marker.
fn os_reason(err: &io::Error) -> String {
    let text = err.to_string();
    match text.rfind(" (os error ") {
        Some(idx) => text[..idx].to_string(),
        None => text,
    }
}

pub type Result<T> = std::result::Result<T, Error>;
