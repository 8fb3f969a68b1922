//! Error types for event store operations.

use crate::event::{EventRecord, NewEvent};
use crate::stream_id::StreamId;
use std::fmt;
use thiserror::Error;

/// Errors reported by readers, writers and position codecs.
#[derive(Error, Debug)]
pub enum EventStoreError {
    /// A stream was read before anything was ever written to it.
    #[error("stream does not exist: {0}")]
    NoSuchStream(StreamId),
    /// The writer's expected version differs from the stream's current version.
    #[error("current version: {current}, expected version: {expected}")]
    WrongExpectedVersion {
        /// Event number of the last event actually in the stream.
        current: i64,
        /// Event number the caller expected to be last.
        expected: i64,
    },
    /// An idempotent write found an existing event that differs from the new one.
    #[error("at position {position}: {reason}")]
    IncompatibleWrite {
        /// Serialized stream position of the conflicting existing event.
        position: String,
        /// Description of the difference.
        reason: String,
        /// The event already in the stream.
        current: Box<EventRecord>,
        /// The event the caller tried to write.
        new: Box<NewEvent>,
    },
    /// The operation is not offered by this reader, writer or codec.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(String),
    /// A position string or position value cannot be interpreted.
    #[error("invalid position: {0}")]
    InvalidPosition(String),
    /// The component was asked to do something its current state forbids.
    #[error("illegal state: {0}")]
    IllegalState(String),
    /// A stream identifier was rejected.
    #[error("invalid stream id (category {category:?}): {reason}")]
    InvalidStreamId {
        /// The offending category.
        category: String,
        /// Reason for rejection.
        reason: String,
    },
    /// One or more requests of a batch failed their expected-version check.
    #[error("wrong expected version in batch: {}", format_conflicts(.0))]
    BatchWriteConflict(Vec<StreamConflict>),
    /// An idempotent write gave up after racing other writers too many times.
    #[error("gave up writing to {stream_id} after {attempts} attempts")]
    RetriesExhausted {
        /// Stream being written.
        stream_id: StreamId,
        /// Number of write attempts made.
        attempts: u32,
    },
    /// I/O error from a file-backed component.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Failure reported by a concrete backend.
    #[error("backend error: {0}")]
    Backend(#[from] Box<dyn std::error::Error + Send + Sync>),
}

impl EventStoreError {
    /// Returns true for [`EventStoreError::WrongExpectedVersion`].
    pub fn is_wrong_expected_version(&self) -> bool {
        matches!(self, EventStoreError::WrongExpectedVersion { .. })
    }

    /// Wraps any backend error.
    pub fn backend<E>(error: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        EventStoreError::Backend(Box::new(error))
    }
}

/// A single failed request inside a batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConflict {
    /// Stream whose request failed.
    pub stream_id: StreamId,
    /// Current version reported by the backend.
    pub current: i64,
    /// Version the request expected.
    pub expected: i64,
}

impl fmt::Display for StreamConflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: current version: {}, expected version: {}",
            self.stream_id, self.current, self.expected
        )
    }
}

fn format_conflicts(conflicts: &[StreamConflict]) -> String {
    conflicts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
