//! Common assertions for zipkit testing

use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Asserts that every regular file below `expected` exists below `actual`
/// with identical content
pub fn assert_files_copied(expected: &Path, actual: &Path) -> Result<()> {
    for relative in collect_files(expected)? {
        let original = std::fs::read(expected.join(&relative))?;
        let copy_path = actual.join(&relative);
        assert!(copy_path.is_file(), "Missing file {:?}", copy_path);

        let copy = std::fs::read(&copy_path)?;
        assert_eq!(original, copy, "Content mismatch for {:?}", relative);
    }

    Ok(())
}

/// Asserts that the file at `path` still holds exactly `expected`
pub fn assert_unchanged(path: &Path, expected: &[u8]) -> Result<()> {
    let current = std::fs::read(path)?;
    assert_eq!(current, expected, "{:?} was modified", path);
    Ok(())
}

/// Regular files below `dir`, relative to it, sorted
pub fn collect_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.path().strip_prefix(dir)?.to_path_buf());
        }
    }

    files.sort();
    Ok(files)
}
