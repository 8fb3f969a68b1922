//! Cache file writer.

use crate::errors::CacheError;
use crate::format::write_record;
use crate::segments::{in_progress_prefix, IN_PROGRESS_SUFFIX};
use eventlog_api::EventRecord;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::{BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::info;

/// Options for cache file writing.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Gzip compression level (default: flate2's default level).
    pub compression: Compression,
    /// Whether to fsync before the file is moved into place (default: false).
    pub sync: bool,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compression: Compression::default(),
            sync: false,
        }
    }
}

/// How [`CacheFileWriter::finish`] left the destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FinishOutcome {
    /// This writer created the destination file.
    Persisted(PathBuf),
    /// Another writer created the destination first; this writer's output
    /// was discarded.
    AlreadyPresent(PathBuf),
}

/// Writes one cache file under a temporary name, then moves it into place.
///
/// The temporary file lives in the destination's directory so the final
/// move is an atomic rename. An existing destination is never replaced:
/// the first writer to finish wins. A writer dropped before
/// [`finish`](Self::finish) deletes its temporary file.
pub struct CacheFileWriter {
    output: GzEncoder<BufWriter<NamedTempFile>>,
    destination: PathBuf,
    records_written: u64,
    sync: bool,
}

impl CacheFileWriter {
    /// Starts writing the cache file that will become `destination`.
    ///
    /// `stem` names the temporary file so directory listings can tell it
    /// apart from other caches sharing the directory.
    pub fn create<P: AsRef<Path>>(
        destination: P,
        stem: &str,
        options: &WriteOptions,
    ) -> Result<Self, CacheError> {
        let destination = destination.as_ref().to_path_buf();
        let directory = match destination.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&directory)?;
        let prefix = in_progress_prefix(stem);
        let temp = tempfile::Builder::new()
            .prefix(&prefix)
            .suffix(IN_PROGRESS_SUFFIX)
            .tempfile_in(&directory)?;

        Ok(Self {
            output: GzEncoder::new(BufWriter::new(temp), options.compression),
            destination,
            records_written: 0,
            sync: options.sync,
        })
    }

    /// Appends one record.
    pub fn append(&mut self, position: &str, record: &EventRecord) -> Result<(), CacheError> {
        write_record(&mut self.output, position, record)?;
        self.records_written += 1;
        Ok(())
    }

    /// Number of records appended so far.
    pub fn records_written(&self) -> u64 {
        self.records_written
    }

    /// Final path of the file being written.
    pub fn destination(&self) -> &Path {
        &self.destination
    }

    /// Completes the file and moves it into place unless the destination
    /// already exists.
    pub fn finish(self) -> Result<FinishOutcome, CacheError> {
        let mut buffered = self.output.finish()?;
        buffered.flush()?;
        let temp = buffered.into_inner().map_err(|e| e.into_error())?;
        if self.sync {
            temp.as_file().sync_all()?;
        }

        match temp.persist_noclobber(&self.destination) {
            Ok(_) => Ok(FinishOutcome::Persisted(self.destination)),
            Err(e) if e.error.kind() == ErrorKind::AlreadyExists => {
                info!(
                    path = %self.destination.display(),
                    records = self.records_written,
                    "cache file already written by another reader, discarding ours"
                );
                Ok(FinishOutcome::AlreadyPresent(self.destination))
            }
            Err(e) => Err(CacheError::Io(e.error)),
        }
    }
}
