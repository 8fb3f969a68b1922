//! Clean command implementation.

use crate::commands::verify::decode_all;
use eventlog_cache::{list_in_progress, scan_segments};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn run(directory: String, corrupt: bool, stem: String) -> Result<(), Box<dyn std::error::Error>> {
    let directory = Path::new(&directory);
    if !directory.is_dir() {
        return Err(format!("Not a cache directory: {}", directory.display()).into());
    }

    let mut removed = 0;
    for path in list_in_progress(directory, &stem)? {
        if remove(&path)? {
            debug!(path = %path.display(), "removed in-progress cache file");
            removed += 1;
        }
    }
    println!("Removed {} in-progress file(s)", removed);

    if corrupt {
        let mut removed = 0;
        for path in unusable_segments(directory, &stem)? {
            if remove(&path)? {
                debug!(path = %path.display(), "removed cache segment");
                removed += 1;
            }
        }
        println!("Removed {} segment(s)", removed);
    }

    Ok(())
}

/// Segments a caching reader can never replay: the first one that fails to
/// decode, everything after it, and everything after a gap.
fn unusable_segments(directory: &Path, stem: &str) -> Result<Vec<PathBuf>, Box<dyn std::error::Error>> {
    let scan = scan_segments(directory, stem)?;
    let first_bad = scan.replayable.iter().position(|segment| match decode_all(segment) {
        Ok(_) => false,
        Err((records, e)) => {
            warn!(path = %segment.display(), records, error = %e, "segment fails to decode");
            true
        }
    });

    let mut unusable = match first_bad {
        Some(index) => scan.replayable[index..].to_vec(),
        None => Vec::new(),
    };
    unusable.extend(scan.stranded);
    Ok(unusable)
}

/// Removes `path`, returning false if it was already gone.
fn remove(path: &Path) -> Result<bool, String> {
    match fs::remove_file(path) {
        Ok(()) => Ok(true),
        // Another process finished or cleaned it first.
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(format!("Failed to remove {}: {}", path.display(), e)),
    }
}
