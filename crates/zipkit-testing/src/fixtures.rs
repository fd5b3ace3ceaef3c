//! Common test fixtures for zipkit testing

use crate::TestDir;
use anyhow::Result;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Files created by [`create_source_tree`], relative to the test directory
pub const SOURCE_TREE_FILES: &[&str] = &[
    "data/a.txt",
    "data/sub/b.txt",
    "data/sub/deeper/c.bin",
    "data/image.jpg",
];

/// Creates a `data/` tree with nested directories, including an empty one
pub fn create_source_tree(test_dir: &TestDir) -> Result<()> {
    test_dir.create_file("data/a.txt", b"This is file a.")?;
    test_dir.create_file("data/sub/b.txt", b"This is file b in sub.")?;
    test_dir.create_file("data/sub/deeper/c.bin", &[0u8, 1, 2, 3, 254, 255])?;
    test_dir.create_file("data/image.jpg", &[0xFF, 0xD8, 0xFF, 0xE0])?;
    test_dir.create_dir("data/empty")?;

    Ok(())
}

/// Writes an archive whose members are stored uncompressed, so their data
/// bytes appear verbatim in the file
pub fn create_stored_archive(path: &Path, members: &[(&str, &[u8])]) -> Result<()> {
    let mut zip = ZipWriter::new(File::create(path)?);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);

    for (name, data) in members {
        zip.start_file(*name, options)?;
        zip.write_all(data)?;
    }
    zip.finish()?;

    Ok(())
}

/// Inverts the first byte of the first occurrence of `needle` in `path`
pub fn corrupt_first_occurrence(path: &Path, needle: &[u8]) -> Result<()> {
    let mut bytes = std::fs::read(path)?;
    let offset = bytes
        .windows(needle.len())
        .position(|window| window == needle)
        .ok_or_else(|| anyhow::anyhow!("{:?} not found in {:?}", needle, path))?;

    bytes[offset] ^= 0xFF;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Inverts the byte in the middle of `member`'s compressed data, wherever
/// the archive stores it
pub fn corrupt_member_data(path: &Path, member: &str) -> Result<()> {
    let offset = {
        let mut archive = ZipArchive::new(File::open(path)?)?;
        let file = archive.by_name(member)?;
        anyhow::ensure!(file.compressed_size() > 0, "{} has no data", member);
        file.data_start() + file.compressed_size() / 2
    };

    let mut bytes = std::fs::read(path)?;
    bytes[offset as usize] ^= 0xFF;
    std::fs::write(path, bytes)?;
    Ok(())
}

/// Text that deflates to a few hundred bytes rather than a handful
pub fn compressible_text(lines: usize) -> Vec<u8> {
    (0..lines)
        .map(|i| format!("line {} of the sample with value {}\n", i, i * 7919 % 1000))
        .collect::<String>()
        .into_bytes()
}

