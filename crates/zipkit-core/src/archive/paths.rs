//! Mapping between filesystem paths and archive member names

use crate::{Error, Result};
use std::path::MAIN_SEPARATOR;

/// Ordered list of source paths for archive creation
///
/// Paths stay plain strings: the root prefix is removed textually, so the
/// exact spelling the caller used matters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceSpec {
    paths: Vec<String>,
}

impl SourceSpec {
    /// Build from individual paths. Each path is trimmed and blank ones are dropped.
    pub fn new<I, S>(paths: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            paths: paths
                .into_iter()
                .map(|p| p.as_ref().trim().to_string())
                .filter(|p| !p.is_empty())
                .collect(),
        }
    }

    /// Parse a semicolon-joined list such as `"/data/a.txt; /data/sub"`
    pub fn parse(joined: &str) -> Self {
        Self::new(joined.split(';'))
    }

    pub fn paths(&self) -> &[String] {
        &self.paths
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }
}

/// Archive member name for `path`: `root` removed from the front, then
/// normalized to a relative, `/`-separated name.
pub(crate) fn archive_name(path: &str, root: &str) -> Result<String> {
    let stripped = path.strip_prefix(root).ok_or_else(|| {
        Error::InvalidPath(format!("{} does not start with root {}", path, root))
    })?;

    normalize_name(stripped)
        .ok_or_else(|| Error::InvalidPath(format!("{} has no usable archive name below root {}", path, root)))
}

/// Normalize a raw name into ZIP form. Returns `None` for names that are
/// empty after normalization or that climb out with `..`.
fn normalize_name(raw: &str) -> Option<String> {
    let unified = if MAIN_SEPARATOR == '/' {
        raw.to_string()
    } else {
        raw.replace(MAIN_SEPARATOR, "/")
    };

    let mut parts = Vec::new();
    for part in unified.split('/') {
        match part {
            "" | "." => continue,
            ".." => return None,
            part => parts.push(part),
        }
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("/"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_semicolon_list() {
        let spec = SourceSpec::parse(" /data/a.txt ;/data/sub; ;");
        assert_eq!(spec.paths(), &["/data/a.txt", "/data/sub"]);
        assert_eq!(spec.len(), 2);

        assert!(SourceSpec::parse("  ").is_empty());
    }

    #[test]
    fn test_root_is_stripped() {
        assert_eq!(archive_name("/data/a.txt", "/data").unwrap(), "a.txt");
        assert_eq!(archive_name("/data/sub/b.txt", "/data").unwrap(), "sub/b.txt");
        assert_eq!(archive_name("/data/sub/b.txt", "/data/").unwrap(), "sub/b.txt");
    }

    #[test]
    fn test_strip_is_textual() {
        // Not a path-component match: "/dat" is a plain string prefix of "/data"
        assert_eq!(archive_name("/data/a.txt", "/dat").unwrap(), "a/a.txt");
        // Only the leading occurrence is removed
        assert_eq!(archive_name("/x/y/x/z.txt", "/x").unwrap(), "y/x/z.txt");
    }

    #[test]
    fn test_empty_root_keeps_relative_path() {
        assert_eq!(archive_name("/data/a.txt", "").unwrap(), "data/a.txt");
        assert_eq!(archive_name("./notes/a.txt", "").unwrap(), "notes/a.txt");
    }

    #[test]
    fn test_root_mismatch_is_rejected() {
        let err = archive_name("/other/a.txt", "/data").unwrap_err();
        assert!(matches!(err, Error::InvalidPath(_)));
    }

    #[test]
    fn test_unusable_names_are_rejected() {
        assert!(archive_name("/data", "/data").is_err());
        assert!(archive_name("/data/", "/data").is_err());
        assert!(archive_name("/data/../etc/passwd", "/data").is_err());
    }
}
