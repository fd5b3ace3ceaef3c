//! Read-side operations: listing, extraction and verification

use super::{ArchiveEntry, Timestamp};
use crate::{Error, Result};
use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use zip::result::ZipError;
use zip::ZipArchive;

fn open_archive(filename: &str) -> Result<ZipArchive<File>> {
    let file = File::open(filename).map_err(|err| Error::opening(filename, err))?;
    Ok(ZipArchive::new(file)?)
}

/// Entries in central-directory order
pub(super) fn read_entries(filename: &str) -> Result<Vec<ArchiveEntry>> {
    let mut archive = open_archive(filename)?;
    let mut entries = Vec::with_capacity(archive.len());

    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        entries.push(ArchiveEntry {
            relative_path: file.name().to_string(),
            uncompressed_size: file.size(),
            compressed_size: file.compressed_size(),
            modified: file.last_modified().map(Timestamp::from).unwrap_or_default(),
        });
    }

    Ok(entries)
}

/// Extract the member named exactly `member` below `dest`
pub(super) fn extract_member(filename: &str, member: &str, dest: &Path) -> Result<PathBuf> {
    let mut archive = open_archive(filename)?;
    let mut file = match archive.by_name(member) {
        Ok(file) => file,
        Err(ZipError::FileNotFound) => return Err(Error::MemberNotFound(member.to_string())),
        Err(err) => return Err(err.into()),
    };

    let relative = file
        .enclosed_name()
        .map(|p| p.to_path_buf())
        .ok_or_else(|| Error::InvalidPath(format!("{} would be written outside {:?}", member, dest)))?;
    let is_dir = file.is_dir();
    let mode = file.unix_mode();

    write_entry(&mut file, member, &relative, is_dir, mode, dest)
}

/// Extract every member below `dest`, returning how many were written
pub(super) fn extract_all(filename: &str, dest: &Path) -> Result<usize> {
    let mut archive = open_archive(filename)?;
    fs::create_dir_all(dest)?;

    let mut extracted = 0;
    for i in 0..archive.len() {
        let mut file = archive.by_index(i)?;
        let Some(relative) = file.enclosed_name().map(|p| p.to_path_buf()) else {
            warn!("Skipping member with unsafe path: {}", file.name());
            continue;
        };
        let name = file.name().to_string();
        let is_dir = file.is_dir();
        let mode = file.unix_mode();

        write_entry(&mut file, &name, &relative, is_dir, mode, dest)?;
        extracted += 1;
    }

    Ok(extracted)
}

/// Reader that remembers whether the archive side of a copy failed
struct TrackedReader<'a, R> {
    inner: &'a mut R,
    failed: bool,
}

impl<R: Read> Read for TrackedReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(n) => Ok(n),
            Err(err) => {
                self.failed = true;
                Err(err)
            }
        }
    }
}

/// Write one member's data to `dest/relative`.
///
/// File data goes to a temporary file next to the target and is renamed
/// into place only after the whole member (and its CRC) has been read.
/// A failure reading the member is reported as corruption of `name`.
fn write_entry<R: Read>(
    reader: &mut R,
    name: &str,
    relative: &Path,
    is_dir: bool,
    mode: Option<u32>,
    dest: &Path,
) -> Result<PathBuf> {
    let target = dest.join(relative);
    debug!("Extracting: {:?}", relative);

    if is_dir {
        fs::create_dir_all(&target)?;
        return Ok(target);
    }

    let parent = target.parent().unwrap_or(dest);
    fs::create_dir_all(parent)?;

    let mut staged = NamedTempFile::new_in(parent)?;
    let mut tracked = TrackedReader {
        inner: reader,
        failed: false,
    };
    if let Err(err) = io::copy(&mut tracked, staged.as_file_mut()) {
        if tracked.failed {
            debug!("Bad data for {}: {}", name, err);
            return Err(Error::CorruptMember {
                member: name.to_string(),
                source: err,
            });
        }
        return Err(err.into());
    }
    staged.persist(&target).map_err(|err| Error::Io(err.error))?;

    // Temporary files are created owner-only; restore the stored mode
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mode = mode.unwrap_or(0o644) & 0o777;
        fs::set_permissions(&target, fs::Permissions::from_mode(mode))?;
    }
    #[cfg(not(unix))]
    let _ = mode;

    Ok(target)
}

/// Read every member to the end so its CRC-32 is checked.
///
/// Stops at the first member whose header or data is bad and reports it by
/// name; later members are not inspected.
pub(super) fn verify(filename: &str) -> Result<()> {
    let mut archive = open_archive(filename)?;
    let names: Vec<String> = archive.file_names().map(str::to_string).collect();

    for (i, name) in names.into_iter().enumerate() {
        let mut file = match archive.by_index(i) {
            Ok(file) => file,
            Err(ZipError::InvalidArchive(reason)) => {
                debug!("Bad header for {}: {}", name, reason);
                return Err(Error::Corrupt(name));
            }
            Err(ZipError::Io(err)) => {
                debug!("Unreadable header for {}: {}", name, err);
                return Err(Error::Corrupt(name));
            }
            Err(err) => return Err(err.into()),
        };

        if let Err(err) = io::copy(&mut file, &mut io::sink()) {
            debug!("Bad data for {}: {}", name, err);
            return Err(Error::Corrupt(name));
        }
    }

    Ok(())
}
