//! Backend-independent contract for event-sourced storage.
//!
//! This crate provides:
//! - Immutable event values (`StreamId`, `NewEvent`, `EventRecord`, `ResolvedEvent`)
//! - Opaque per-scope positions and the codecs that serialize and order them
//! - The four capability ports every backend or decorator implements
//! - A typed error covering every failure a port may report
//!
//! ## Quick Start
//!
//! ```rust
//! use eventlog_api::{EmptyEventSource, EventReader, PositionCodec};
//!
//! let source = EmptyEventSource;
//! let codec = source.store_position_codec();
//! let empty = source.empty_store_position();
//! assert_eq!(codec.serialize_position(&empty), "Empty");
//!
//! let mut events = source.read_all_forwards()?;
//! assert!(events.next().is_none());
//! # Ok::<(), eventlog_api::EventStoreError>(())
//! ```
//!
//! ## Key Types
//!
//! - [`EventReader`] - Read the whole store as one global log
//! - [`EventCategoryReader`] - Read every stream of one category
//! - [`EventStreamReader`] - Read a single stream by event number
//! - [`EventStreamWriter`] - Append with optimistic concurrency
//! - [`PositionCodec`] / [`OrderedPositionCodec`] - Serialize and compare positions

#![deny(missing_docs)]

/// Empty event source.
pub mod empty;
/// Error types for event store operations.
pub mod errors;
/// Event value types.
pub mod event;
/// Reader and writer ports.
pub mod ports;
/// Positions and position codecs.
pub mod position;
/// Stream identity.
pub mod stream_id;

pub use empty::{EmptyEventSource, EmptyPosition, EmptyPositionCodec};
pub use errors::{EventStoreError, StreamConflict};
pub use event::{EventRecord, NewEvent, ResolvedEvent};
pub use ports::{
    EventCategoryReader, EventReader, EventStream, EventStreamReader, EventStreamWriter,
    StreamWriteRequest, EMPTY_STREAM_EVENT_NUMBER,
};
pub use position::{OrderedPositionCodec, Position, PositionCodec};
pub use stream_id::{StreamId, CATEGORY_SEPARATOR};
