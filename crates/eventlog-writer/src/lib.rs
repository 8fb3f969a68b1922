//! Idempotent stream writes.
//!
//! [`IdempotentEventStreamWriter`] wraps a writer and a reader of the same
//! store. Before writing it compares the batch with whatever the stream
//! already holds past the expected version, skips the events that are
//! already there and writes only the remainder. Repeating a write is
//! therefore harmless, which is what at-least-once producers need.
//!
//! ```rust
//! use eventlog_api::{EventStreamReader, EventStreamWriter, NewEvent, StreamId};
//! use eventlog_memory::InMemoryEventStore;
//! use eventlog_writer::IdempotentEventStreamWriter;
//!
//! let store = InMemoryEventStore::new();
//! let writer = IdempotentEventStreamWriter::idempotent(&store, &store);
//! let stream = StreamId::new("orders", "1")?;
//! let batch = [NewEvent::without_metadata("Placed", "{}")];
//!
//! writer.write(&stream, &batch, -1)?;
//! writer.write(&stream, &batch, -1)?;
//! assert_eq!(store.read_stream_forwards(&stream)?.count(), 1);
//! # Ok::<(), eventlog_api::EventStoreError>(())
//! ```

#![deny(missing_docs)]

/// Compatibility predicates.
pub mod compatibility;
/// The idempotent writer.
pub mod idempotent;

pub use compatibility::{
    by_comparing_data, by_comparing_event_type, by_comparing_metadata, And, Basic, ByData,
    ByEventType, ByMetadata, ComparingData, ComparingEventType, ComparingMetadata, IsCompatible,
    WithMetadata, BASIC, WITH_METADATA,
};
pub use idempotent::{IdempotentEventStreamWriter, IdempotentOptions};
