//! zipkit - ZIP archive service layer
//!
//! This library lists, creates, extracts and verifies ZIP archives.
//! Every public archive operation returns a [`Response`] instead of an
//! error, so callers only ever branch on its status.

pub mod archive;
pub mod config;
pub mod error;
pub mod response;

pub use error::{Error, ErrorKind, Result};
pub use response::{Response, Status};

// Re-export commonly used types
pub use archive::{
    create, create_with_options, extract, extract_all, list, test, ArchiveEntry, CreateOptions,
    SourceSpec, Timestamp,
};
