//! Archive creation

use super::paths::{archive_name, SourceSpec};
use super::CreateOptions;
use crate::{Error, Result};
use chrono::{DateTime, Datelike, Local, Timelike};
use std::fs::{self, File, Metadata};
use std::io::{self, Seek, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Write every source into a new archive at `filename`.
///
/// Returns the number of regular files written; directory entries are not
/// counted. Sources, member names and the compression level are validated
/// before anything is written. The archive is built in a temporary file next
/// to `filename` and renamed over it only once complete, so a failure never
/// touches an existing archive.
pub(super) fn create_archive(
    filename: &str,
    sources: &SourceSpec,
    root: &str,
    overwrite: bool,
    options: &CreateOptions,
) -> Result<usize> {
    validate_sources(sources, root)?;
    validate_level(options.compression_level)?;

    let target = Path::new(filename);
    if !overwrite && target.exists() {
        return Err(Error::FileExists(filename.to_string()));
    }

    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let mut staged = NamedTempFile::new_in(dir)?;
    let count = write_sources(staged.as_file_mut(), sources, root, options)?;

    // Temporary files are created owner-only
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        fs::set_permissions(staged.path(), fs::Permissions::from_mode(0o644))?;
    }

    let persisted = if overwrite {
        staged.persist(target)
    } else {
        staged.persist_noclobber(target)
    };
    persisted.map_err(|err| {
        if err.error.kind() == io::ErrorKind::AlreadyExists {
            Error::FileExists(filename.to_string())
        } else {
            Error::Io(err.error)
        }
    })?;

    Ok(count)
}

fn validate_sources(sources: &SourceSpec, root: &str) -> Result<()> {
    if sources.is_empty() {
        return Err(Error::InvalidInput("no source paths given".to_string()));
    }

    for source in sources.paths() {
        if !Path::new(source).exists() {
            return Err(Error::SourceNotFound(source.clone()));
        }
    }

    // Checked after existence so a missing file is reported as such
    for source in sources.paths() {
        if !source.starts_with(root) {
            return Err(Error::InvalidPath(format!(
                "{} does not start with root {}",
                source, root
            )));
        }
        // A directory may be the root itself; its members are named during the walk
        if Path::new(source).is_file() {
            archive_name(source, root)?;
        }
    }

    Ok(())
}

fn validate_level(level: Option<i64>) -> Result<()> {
    match level {
        Some(level) if !(1..=9).contains(&level) => Err(Error::InvalidInput(format!(
            "compression level {} is outside 1-9",
            level
        ))),
        _ => Ok(()),
    }
}

fn write_sources<W: Write + Seek>(
    output: W,
    sources: &SourceSpec,
    root: &str,
    options: &CreateOptions,
) -> Result<usize> {
    let mut zip = ZipWriter::new(output);
    let mut written = 0;

    for source in sources.paths() {
        let path = Path::new(source);
        if path.is_file() {
            add_file(&mut zip, path, &archive_name(source, root)?, options)?;
            written += 1;
        } else {
            written += add_directory_tree(&mut zip, path, root, options)?;
        }
    }

    zip.finish()?;
    Ok(written)
}

/// Walk `dir` in file-name order, adding files and subdirectories below it.
fn add_directory_tree<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    dir: &Path,
    root: &str,
    options: &CreateOptions,
) -> Result<usize> {
    let mut written = 0;

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .follow_links(true)
        .sort_by_file_name()
    {
        let entry = entry?;
        let path = entry.path();
        let text = path
            .to_str()
            .ok_or_else(|| Error::InvalidPath(format!("{:?} is not valid UTF-8", path)))?;
        let name = archive_name(text, root)?;

        if entry.file_type().is_dir() {
            let metadata = entry.metadata()?;
            debug!("Adding directory to ZIP: {}/", name);
            zip.add_directory(format!("{}/", name), directory_options(&metadata, options))?;
        } else if entry.file_type().is_file() {
            add_file(zip, path, &name, options)?;
            written += 1;
        } else {
            warn!("Skipping {:?}: not a regular file or directory", path);
        }
    }

    Ok(written)
}

/// Add a single file, streaming its contents through the deflate encoder
fn add_file<W: Write + Seek>(
    zip: &mut ZipWriter<W>,
    path: &Path,
    name: &str,
    options: &CreateOptions,
) -> Result<()> {
    debug!("Adding file to ZIP: {:?} as {}", path, name);

    let mut file = File::open(path)?;
    let metadata = file.metadata()?;

    zip.start_file(name, entry_options(&metadata, options))?;
    io::copy(&mut file, zip)?;

    Ok(())
}

fn entry_options(metadata: &Metadata, options: &CreateOptions) -> SimpleFileOptions {
    let entry = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(options.compression_level);
    with_metadata(entry, metadata, options)
}

// Directory entries carry no data, so they are stored and take no level
fn directory_options(metadata: &Metadata, options: &CreateOptions) -> SimpleFileOptions {
    let entry = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
    with_metadata(entry, metadata, options)
}

#[cfg_attr(not(unix), allow(unused_variables))]
fn with_metadata(
    entry: SimpleFileOptions,
    metadata: &Metadata,
    options: &CreateOptions,
) -> SimpleFileOptions {
    let entry = entry.last_modified_time(modified_time(metadata));

    #[cfg(unix)]
    let entry = if options.preserve_permissions {
        use std::os::unix::fs::PermissionsExt;
        entry.unix_permissions(metadata.permissions().mode())
    } else {
        entry
    };

    entry
}

/// File mtime in local time, clamped to what a DOS timestamp can hold
fn modified_time(metadata: &Metadata) -> zip::DateTime {
    let Ok(modified) = metadata.modified() else {
        return zip::DateTime::default();
    };

    let local: DateTime<Local> = modified.into();
    let year = u16::try_from(local.year()).unwrap_or(0);
    zip::DateTime::from_date_and_time(
        year,
        local.month() as u8,
        local.day() as u8,
        local.hour() as u8,
        local.minute() as u8,
        local.second() as u8,
    )
    .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use tempfile::TempDir;

    #[test]
    fn test_write_sources_counts_files_only() {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path().to_str().unwrap().to_string();
        fs::create_dir_all(temp_dir.path().join("tree/empty")).unwrap();
        fs::write(temp_dir.path().join("tree/one.txt"), b"one").unwrap();
        fs::write(temp_dir.path().join("top.txt"), b"top").unwrap();

        let sources = SourceSpec::new([format!("{}/top.txt", base), format!("{}/tree", base)]);
        let mut buffer = Cursor::new(Vec::new());
        let count = write_sources(&mut buffer, &sources, &base, &CreateOptions::default()).unwrap();
        assert_eq!(count, 2);

        let archive = zip::ZipArchive::new(Cursor::new(buffer.into_inner())).unwrap();
        let names: Vec<&str> = archive.file_names().collect();
        assert!(names.contains(&"top.txt"));
        assert!(names.contains(&"tree/one.txt"));
        assert!(names.contains(&"tree/empty/"));
        assert_eq!(names.len(), 3);
    }

    #[test]
    fn test_validation_runs_before_opening() {
        let temp_dir = TempDir::new().unwrap();
        let target = temp_dir.path().join("out.zip");
        let target = target.to_str().unwrap();

        let sources = SourceSpec::new(["/definitely/not/here.txt"]);
        let err = create_archive(target, &sources, "/definitely", true, &CreateOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
        assert!(!Path::new(target).exists());

        let err = create_archive(target, &SourceSpec::default(), "", true, &CreateOptions::default())
            .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert!(!Path::new(target).exists());
    }

    #[test]
    fn test_root_mismatch_fails_before_opening() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        fs::write(&source, b"a").unwrap();
        let target = temp_dir.path().join("out.zip");

        let sources = SourceSpec::new([source.to_str().unwrap()]);
        let err = create_archive(
            target.to_str().unwrap(),
            &sources,
            "/some/other/root",
            true,
            &CreateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert!(!target.exists());
    }

    #[test]
    fn test_rejected_create_keeps_existing_archive() {
        let temp_dir = TempDir::new().unwrap();
        let source = temp_dir.path().join("a.txt");
        fs::write(&source, b"a").unwrap();
        let source = source.to_str().unwrap();
        let target = temp_dir.path().join("keep.zip");
        fs::write(&target, b"previous archive").unwrap();

        // The file source is the root itself, leaving no member name
        let err = create_archive(
            target.to_str().unwrap(),
            &SourceSpec::new([source]),
            source,
            true,
            &CreateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
        assert_eq!(fs::read(&target).unwrap(), b"previous archive");

        let options = CreateOptions {
            compression_level: Some(42),
            ..CreateOptions::default()
        };
        let base = temp_dir.path().to_str().unwrap();
        let err = create_archive(
            target.to_str().unwrap(),
            &SourceSpec::new([source]),
            base,
            true,
            &options,
        )
        .unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
        assert_eq!(fs::read(&target).unwrap(), b"previous archive");
    }

    #[test]
    fn test_create_leaves_no_staging_files() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("src")).unwrap();
        fs::write(temp_dir.path().join("src/one.txt"), b"one").unwrap();
        let base = temp_dir.path().to_str().unwrap();
        let target = temp_dir.path().join("out.zip");

        let sources = SourceSpec::new([format!("{}/src", base)]);
        let count = create_archive(
            target.to_str().unwrap(),
            &sources,
            base,
            false,
            &CreateOptions::default(),
        )
        .unwrap();
        assert_eq!(count, 1);

        let mut names: Vec<String> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        assert_eq!(names, ["out.zip", "src"]);

        let err = create_archive(
            target.to_str().unwrap(),
            &sources,
            base,
            false,
            &CreateOptions::default(),
        )
        .unwrap_err();
        assert!(matches!(err, Error::FileExists(_)));
    }
}
