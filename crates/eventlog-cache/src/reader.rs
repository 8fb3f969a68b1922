//! Cache file reader.

use crate::errors::CacheError;
use crate::format::{read_record, CachedRecord};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

/// Sequential reader over one gzip-compressed cache file.
///
/// # Example
///
/// ```rust,no_run
/// use eventlog_cache::CacheFileReader;
///
/// let mut reader = CacheFileReader::open("cache/cache-00000000.gz")?;
/// while let Some(cached) = reader.read_record()? {
///     println!("{} {}", cached.position, cached.record.event_type);
/// }
/// # Ok::<(), eventlog_cache::CacheError>(())
/// ```
pub struct CacheFileReader {
    input: GzDecoder<BufReader<File>>,
    path: PathBuf,
    records_read: u64,
}

impl CacheFileReader {
    /// Opens a cache file for reading.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CacheError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        Ok(Self {
            input: GzDecoder::new(BufReader::new(file)),
            path,
            records_read: 0,
        })
    }

    /// Reads the next record, or `None` at a clean end of file.
    ///
    /// # Errors
    ///
    /// Returns [`CacheError::Truncated`] if the file ends inside a record and
    /// [`CacheError::Io`] if the gzip stream itself is damaged.
    pub fn read_record(&mut self) -> Result<Option<CachedRecord>, CacheError> {
        let record = read_record(&mut self.input)?;
        if record.is_some() {
            self.records_read += 1;
        }
        Ok(record)
    }

    /// Path of the file being read.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of records returned so far.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }
}
