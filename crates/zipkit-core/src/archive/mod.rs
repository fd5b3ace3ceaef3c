//! Archive operations module
//!
//! Each public function here is one stateless operation: it opens the
//! archive, acts, closes it and reports a [`Response`]. Failures never
//! escape as `Err`.
//!
//! Two calls targeting the same archive file at the same time are not
//! coordinated; serializing them is up to the caller.

mod paths;
mod reader;
mod writer;

pub use paths::SourceSpec;

use crate::Response;
use serde::de::{self, Deserializer};
use serde::ser::Serializer;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::info;

/// Archive entry information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveEntry {
    /// Member name within the archive
    #[serde(rename = "filename")]
    pub relative_path: String,
    /// Original size in bytes
    #[serde(rename = "filesize")]
    pub uncompressed_size: u64,
    /// Stored size in bytes
    #[serde(rename = "compress_size")]
    pub compressed_size: u64,
    /// Modification time as recorded in the archive
    pub modified: Timestamp,
}

/// DOS date/time of an archive member
///
/// Formats as `Y-M-D h:m:s` without zero padding, e.g. `2024-3-7 9:5:0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
}

impl Default for Timestamp {
    // Earliest DOS date, used when an entry carries no timestamp
    fn default() -> Self {
        Self {
            year: 1980,
            month: 1,
            day: 1,
            hour: 0,
            minute: 0,
            second: 0,
        }
    }
}

impl From<zip::DateTime> for Timestamp {
    fn from(dt: zip::DateTime) -> Self {
        Self {
            year: dt.year(),
            month: dt.month(),
            day: dt.day(),
            hour: dt.hour(),
            minute: dt.minute(),
            second: dt.second(),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{} {}:{}:{}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

impl FromStr for Timestamp {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || format!("Invalid timestamp: {}", s);
        let (date, time) = s.trim().split_once(' ').ok_or_else(invalid)?;

        let date: Vec<&str> = date.split('-').collect();
        let time: Vec<&str> = time.split(':').collect();
        if date.len() != 3 || time.len() != 3 {
            return Err(invalid());
        }

        let num = |part: &str| part.parse::<u8>().map_err(|_| invalid());
        Ok(Self {
            year: date[0].parse().map_err(|_| invalid())?,
            month: num(date[1])?,
            day: num(date[2])?,
            hour: num(time[0])?,
            minute: num(time[1])?,
            second: num(time[2])?,
        })
    }
}

impl Serialize for Timestamp {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Timestamp {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(de::Error::custom)
    }
}

/// Options for archive creation
#[derive(Debug, Clone)]
pub struct CreateOptions {
    /// Deflate level, library default when `None`
    pub compression_level: Option<i64>,
    /// Store unix permission bits of the sources
    pub preserve_permissions: bool,
}

impl Default for CreateOptions {
    fn default() -> Self {
        Self {
            compression_level: None,
            preserve_permissions: true,
        }
    }
}

/// List the members of an archive in their stored order
pub fn list(filename: &str) -> Response<Vec<ArchiveEntry>> {
    let filename = filename.trim();
    info!("Listing ZIP archive: {}", filename);

    Response::from_result("list", reader::read_entries(filename), |entries| {
        Response::ok_with(filename, entries)
    })
}

/// Create an archive from `sources` with default options
///
/// With `overwrite` unset an existing `filename` is left untouched and
/// reported as already existing.
pub fn create(filename: &str, sources: &SourceSpec, root: &str, overwrite: bool) -> Response<()> {
    create_with_options(filename, sources, root, overwrite, &CreateOptions::default())
}

/// Create an archive from `sources` with explicit options
pub fn create_with_options(
    filename: &str,
    sources: &SourceSpec,
    root: &str,
    overwrite: bool,
    options: &CreateOptions,
) -> Response<()> {
    let filename = filename.trim();
    info!(
        "Creating ZIP archive {} from {} source(s) (root: {:?}, overwrite: {})",
        filename,
        sources.len(),
        root,
        overwrite
    );

    let result = writer::create_archive(filename, sources, root, overwrite, options);
    Response::from_result("create", result, |count| {
        info!("Wrote {} files to {}", count, filename);
        Response::ok(format!("{} files written to archive {}", count, filename))
    })
}

/// Extract one member to `dest/<member>`
pub fn extract<P: AsRef<Path>>(filename: &str, member: &str, dest: P) -> Response<()> {
    let filename = filename.trim();
    let dest = dest.as_ref();
    info!("Extracting {} from {} to {:?}", member, filename, dest);

    Response::from_result(
        "extract",
        reader::extract_member(filename, member, dest),
        |_| Response::ok(format!("Extracted {} to {}", member, dest.display())),
    )
}

/// Extract every member below `dest`, keeping stored relative paths
pub fn extract_all<P: AsRef<Path>>(filename: &str, dest: P) -> Response<()> {
    let filename = filename.trim();
    let dest = dest.as_ref();
    info!("Extracting ZIP archive {} to {:?}", filename, dest);

    Response::from_result("extract_all", reader::extract_all(filename, dest), |count| {
        info!("Extracted {} entries", count);
        Response::ok(format!("Extracted {} to {}", filename, dest.display()))
    })
}

/// Check the CRC and headers of every member, stopping at the first bad one
pub fn test(filename: &str) -> Response<()> {
    let filename = filename.trim();
    info!("Testing ZIP archive: {}", filename);

    Response::from_result("test", reader::verify(filename), |_| {
        Response::ok(format!("Test passed for {}", filename))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamp_format_is_not_padded() {
        let ts = Timestamp {
            year: 2024,
            month: 3,
            day: 7,
            hour: 9,
            minute: 5,
            second: 0,
        };
        assert_eq!(ts.to_string(), "2024-3-7 9:5:0");
        assert_eq!("2024-3-7 9:5:0".parse::<Timestamp>().unwrap(), ts);
        assert!("2024-03-07".parse::<Timestamp>().is_err());
    }

    #[test]
    fn test_timestamp_from_zip_datetime() {
        let dt = zip::DateTime::from_date_and_time(2023, 11, 30, 23, 59, 58).unwrap();
        assert_eq!(Timestamp::from(dt).to_string(), "2023-11-30 23:59:58");
        assert_eq!(Timestamp::default().to_string(), "1980-1-1 0:0:0");
    }

    #[test]
    fn test_entry_uses_legacy_field_names() {
        let entry = ArchiveEntry {
            relative_path: "sub/b.txt".to_string(),
            uncompressed_size: 10,
            compressed_size: 8,
            modified: Timestamp::default(),
        };

        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["filename"], "sub/b.txt");
        assert_eq!(json["filesize"], 10);
        assert_eq!(json["compress_size"], 8);
        assert_eq!(json["modified"], "1980-1-1 0:0:0");

        let back: ArchiveEntry = serde_json::from_value(json).unwrap();
        assert_eq!(back, entry);
    }

    #[test]
    fn test_missing_archive_reports_not_found() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let missing = temp_dir.path().join("missing.zip");
        let missing = missing.to_str().unwrap();

        let response = list(missing);
        assert!(!response.is_ok());
        assert_eq!(response.kind, Some(crate::ErrorKind::NotFound));
        assert!(response.message.ends_with(missing));

        assert_eq!(test(missing).kind, Some(crate::ErrorKind::NotFound));
        assert_eq!(
            extract_all(missing, temp_dir.path()).kind,
            Some(crate::ErrorKind::NotFound)
        );
    }
}
