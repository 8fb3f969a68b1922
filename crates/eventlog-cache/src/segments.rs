//! Cache directory layout.
//!
//! A cache directory holds finalised segments named `<stem>-<index>.gz`, with
//! the index zero-padded to eight digits, plus any number of in-progress
//! files named `.<stem>-<random>.tmp`. Segments are replayed in index order.

use crate::errors::CacheError;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Default file stem for cache segments.
pub const DEFAULT_FILE_STEM: &str = "cache";

/// Extension of finalised segments.
pub const SEGMENT_EXTENSION: &str = "gz";

/// Suffix of files still being written.
pub const IN_PROGRESS_SUFFIX: &str = ".tmp";

/// File name of segment `index`.
pub fn segment_file_name(stem: &str, index: u32) -> String {
    format!("{}-{:08}.{}", stem, index, SEGMENT_EXTENSION)
}

/// Prefix for temporary files belonging to `stem`.
pub fn in_progress_prefix(stem: &str) -> String {
    format!(".{}-", stem)
}

/// Parses a segment file name back to its index.
pub fn parse_segment_index(stem: &str, file_name: &str) -> Option<u32> {
    let digits = file_name
        .strip_prefix(stem)?
        .strip_prefix('-')?
        .strip_suffix(SEGMENT_EXTENSION)?
        .strip_suffix('.')?;
    if digits.len() != 8 || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

/// Segment files found in a cache directory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SegmentScan {
    /// The contiguous run starting at index 0, in order.
    pub replayable: Vec<PathBuf>,
    /// Segments after the first gap, in index order.
    pub stranded: Vec<PathBuf>,
}

impl SegmentScan {
    /// Index the next segment would take if it followed the replayable run.
    pub fn next_index(&self) -> u32 {
        self.replayable.len() as u32
    }
}

/// Finds every segment of `stem` in `directory`.
///
/// A gap means an earlier segment was deleted, and the segments after it no
/// longer follow on from what precedes them; they are reported as stranded.
/// A missing directory has no segments.
pub fn scan_segments(directory: &Path, stem: &str) -> Result<SegmentScan, CacheError> {
    let mut indices = Vec::new();
    let entries = match fs::read_dir(directory) {
        Ok(entries) => entries,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(SegmentScan::default()),
        Err(e) => return Err(e.into()),
    };
    for entry in entries {
        let entry = entry?;
        if let Some(index) = entry
            .file_name()
            .to_str()
            .and_then(|name| parse_segment_index(stem, name))
        {
            indices.push(index);
        }
    }
    indices.sort_unstable();

    let mut scan = SegmentScan::default();
    for (expected, index) in indices.into_iter().enumerate() {
        let path = directory.join(segment_file_name(stem, index));
        if scan.stranded.is_empty() && expected as u32 == index {
            scan.replayable.push(path);
        } else {
            scan.stranded.push(path);
        }
    }
    Ok(scan)
}

/// Lists the segments that can be replayed, in order.
///
/// Only the contiguous run starting at index 0 is returned; see
/// [`scan_segments`].
pub fn list_segments(directory: &Path, stem: &str) -> Result<Vec<PathBuf>, CacheError> {
    Ok(scan_segments(directory, stem)?.replayable)
}

/// Lists in-progress files left behind by readers that never finished.
pub fn list_in_progress(directory: &Path, stem: &str) -> Result<Vec<PathBuf>, CacheError> {
    let prefix = in_progress_prefix(stem);
    let mut found = Vec::new();
    for entry in fs::read_dir(directory)? {
        let entry = entry?;
        let name = entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if name.starts_with(&prefix) && name.ends_with(IN_PROGRESS_SUFFIX) {
            found.push(entry.path());
        }
    }
    found.sort();
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_segment_names_round_trip() {
        assert_eq!(segment_file_name("cache", 3), "cache-00000003.gz");
        assert_eq!(parse_segment_index("cache", "cache-00000003.gz"), Some(3));
        assert_eq!(parse_segment_index("cache", "cache-3.gz"), None);
        assert_eq!(parse_segment_index("cache", "other-00000003.gz"), None);
        assert_eq!(parse_segment_index("cache", ".cache-abc123.tmp"), None);
    }

    #[test]
    fn test_lists_contiguous_segments_only() {
        let dir = TempDir::new().unwrap();
        for index in [0, 1, 3] {
            fs::write(dir.path().join(segment_file_name("cache", index)), b"").unwrap();
        }
        fs::write(dir.path().join(".cache-x1.tmp"), b"").unwrap();

        let segments = list_segments(dir.path(), "cache").unwrap();
        let names: Vec<_> = segments
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["cache-00000000.gz", "cache-00000001.gz"]);

        let in_progress = list_in_progress(dir.path(), "cache").unwrap();
        assert_eq!(in_progress, vec![dir.path().join(".cache-x1.tmp")]);
    }

    #[test]
    fn test_scan_reports_segments_after_a_gap() {
        let dir = TempDir::new().unwrap();
        for index in [0, 2, 3] {
            fs::write(dir.path().join(segment_file_name("cache", index)), b"").unwrap();
        }

        let scan = scan_segments(dir.path(), "cache").unwrap();
        assert_eq!(scan.replayable, vec![dir.path().join("cache-00000000.gz")]);
        assert_eq!(
            scan.stranded,
            vec![
                dir.path().join("cache-00000002.gz"),
                dir.path().join("cache-00000003.gz")
            ]
        );
        assert_eq!(scan.next_index(), 1);
    }

    #[test]
    fn test_missing_directory_has_no_segments() {
        let dir = TempDir::new().unwrap();
        assert!(list_segments(&dir.path().join("absent"), "cache")
            .unwrap()
            .is_empty());
    }
}
