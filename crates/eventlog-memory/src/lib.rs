//! In-memory event store.
//!
//! [`InMemoryEventStore`] implements every reader and writer port over a
//! single append-only list. It is the behavioural baseline the other
//! backends are measured against and the fixture most decorator tests run on.
//!
//! ```rust
//! use eventlog_api::{EventReader, EventStreamWriter, NewEvent, StreamId, EMPTY_STREAM_EVENT_NUMBER};
//! use eventlog_memory::InMemoryEventStore;
//!
//! let store = InMemoryEventStore::new();
//! let stream = StreamId::new("orders", "1")?;
//! store.write(&stream, &[NewEvent::without_metadata("Placed", "{}")], EMPTY_STREAM_EVENT_NUMBER)?;
//!
//! let events: Vec<_> = store.read_all_forwards()?.collect::<Result<_, _>>()?;
//! assert_eq!(events.len(), 1);
//! assert_eq!(events[0].event_record.event_number, 0);
//! # Ok::<(), eventlog_api::EventStoreError>(())
//! ```

#![deny(missing_docs)]

/// Store positions and their codec.
pub mod position;
/// The in-memory store.
pub mod store;

pub use position::{InMemoryPosition, InMemoryPositionCodec};
pub use store::InMemoryEventStore;
