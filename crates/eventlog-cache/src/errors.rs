//! Error types for cache files.

use eventlog_api::EventStoreError;
use thiserror::Error;

/// Errors that can occur while reading or writing cache files.
#[derive(Error, Debug)]
pub enum CacheError {
    /// I/O error during read or write.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// The file ended part-way through a record.
    #[error("cache file truncated while reading {field}")]
    Truncated {
        /// Field being read when the data ran out.
        field: &'static str,
    },
    /// A field is too long for its length prefix.
    #[error("{field} is {len} bytes, maximum is {max}")]
    FieldTooLarge {
        /// Field being written.
        field: &'static str,
        /// Actual length.
        len: usize,
        /// Largest encodable length.
        max: usize,
    },
    /// A byte-array length prefix is negative.
    #[error("negative length {len} for {field}")]
    NegativeLength {
        /// Field being read.
        field: &'static str,
        /// Decoded length.
        len: i32,
    },
    /// A string field is not valid UTF-8.
    #[error("invalid UTF-8 in {field}")]
    InvalidUtf8 {
        /// Field being read.
        field: &'static str,
    },
    /// A timestamp is outside the representable range.
    #[error("timestamp {0} ms is out of range")]
    InvalidTimestamp(i64),
    /// A stored stream id is not a valid stream id.
    #[error("invalid stream id in cache: {0}")]
    InvalidStreamId(String),
    /// A stored position could not be decoded by the reader's codec.
    #[error("undecodable position {position:?}: {reason}")]
    Position {
        /// The serialized position.
        position: String,
        /// Codec's reason for rejecting it.
        reason: String,
    },
}

impl From<CacheError> for EventStoreError {
    fn from(error: CacheError) -> Self {
        EventStoreError::backend(error)
    }
}
