//! Local disk cache for event readers.
//!
//! This crate provides:
//! - A sequential binary record format, gzip-compressed on disk
//! - [`CacheFileReader`] / [`CacheFileWriter`] for single cache files, with
//!   first-writer-wins finalisation
//! - [`CachingEventReader`], which replays cached segments before reading the
//!   rest of the log from the underlying reader
//!
//! ## Quick Start
//!
//! ```rust
//! use eventlog_api::{EventReader, EventStreamWriter, NewEvent, StreamId};
//! use eventlog_cache::{CacheOptions, CachingEventReader};
//! use eventlog_memory::InMemoryEventStore;
//!
//! let dir = tempfile::tempdir()?;
//! let store = InMemoryEventStore::new();
//! store.write(&StreamId::new("orders", "1")?, &[NewEvent::without_metadata("Placed", "{}")], -1)?;
//!
//! let reader = CachingEventReader::new(&store, CacheOptions::new(dir.path()));
//! assert_eq!(reader.read_all_forwards()?.count(), 1);
//!
//! // A fresh reader over an empty store still sees the cached event.
//! let empty = InMemoryEventStore::new();
//! let reader = CachingEventReader::new(&empty, CacheOptions::new(dir.path()));
//! assert_eq!(reader.read_all_forwards()?.count(), 1);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![deny(missing_docs)]

/// The caching reader.
pub mod caching;
/// Error types for cache files.
pub mod errors;
/// Binary record encoding.
pub mod format;
/// Cache file reader.
pub mod reader;
/// Cache directory layout.
pub mod segments;
/// Cache file writer.
pub mod writer;

pub use caching::{CacheMode, CacheOptions, CachingEventReader};
pub use errors::CacheError;
pub use format::{read_record, write_record, CachedRecord, MAX_STRING_LEN};
pub use reader::CacheFileReader;
pub use segments::{
    list_in_progress, list_segments, parse_segment_index, scan_segments, segment_file_name,
    SegmentScan, DEFAULT_FILE_STEM,
};
pub use writer::{CacheFileWriter, FinishOutcome, WriteOptions};
