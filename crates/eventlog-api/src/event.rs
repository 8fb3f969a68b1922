//! Event value types.
//!
//! Every type here is an immutable value compared by content. Producers build
//! [`NewEvent`]s; backends turn them into [`EventRecord`]s when they assign a
//! stream and event number; readers yield [`ResolvedEvent`]s, which pair a
//! record with the position it was read at.

use crate::stream_id::StreamId;
use chrono::{DateTime, Utc};

/// An event supplied by a producer, not yet assigned to a stream slot.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NewEvent {
    /// Event type name.
    pub event_type: String,
    /// Opaque payload.
    pub data: Vec<u8>,
    /// Opaque metadata.
    pub metadata: Vec<u8>,
}

impl NewEvent {
    /// Creates an event with data and metadata.
    pub fn new(
        event_type: impl Into<String>,
        data: impl Into<Vec<u8>>,
        metadata: impl Into<Vec<u8>>,
    ) -> Self {
        Self {
            event_type: event_type.into(),
            data: data.into(),
            metadata: metadata.into(),
        }
    }

    /// Creates an event with empty metadata.
    pub fn without_metadata(event_type: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self::new(event_type, data, Vec::new())
    }
}

/// An event as stored by a backend.
///
/// `event_number` is zero-based and gapless within `stream_id`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct EventRecord {
    /// When the backend accepted the event.
    pub timestamp: DateTime<Utc>,
    /// Stream the event belongs to.
    pub stream_id: StreamId,
    /// Zero-based sequence number within the stream.
    pub event_number: i64,
    /// Event type name.
    pub event_type: String,
    /// Opaque payload.
    pub data: Vec<u8>,
    /// Opaque metadata.
    pub metadata: Vec<u8>,
}

impl EventRecord {
    /// Builds the record a backend stores for `event` at `event_number`.
    pub fn from_new_event(
        timestamp: DateTime<Utc>,
        stream_id: StreamId,
        event_number: i64,
        event: &NewEvent,
    ) -> Self {
        Self {
            timestamp,
            stream_id,
            event_number,
            event_type: event.event_type.clone(),
            data: event.data.clone(),
            metadata: event.metadata.clone(),
        }
    }
}

/// A record together with the position it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResolvedEvent<P> {
    /// Cursor of this event within the scope it was read from.
    pub position: P,
    /// The stored event.
    pub event_record: EventRecord,
}

impl<P> ResolvedEvent<P> {
    /// Pairs a record with its position.
    pub fn new(position: P, event_record: EventRecord) -> Self {
        Self {
            position,
            event_record,
        }
    }

    /// Replaces the position, keeping the record.
    pub fn map_position<Q>(self, f: impl FnOnce(P) -> Q) -> ResolvedEvent<Q> {
        ResolvedEvent {
            position: f(self.position),
            event_record: self.event_record,
        }
    }
}
