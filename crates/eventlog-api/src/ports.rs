//! Reader and writer ports.
//!
//! Backends and decorators implement the same four traits. Reads return lazy
//! [`EventStream`]s: nothing is fetched until `next()` is called, and dropping
//! the stream releases whatever it holds.

use crate::errors::{EventStoreError, StreamConflict};
use crate::event::{NewEvent, ResolvedEvent};
use crate::position::{Position, PositionCodec};
use crate::stream_id::StreamId;
use std::collections::HashSet;
use std::sync::Arc;

/// Event number meaning "the stream has no events yet".
pub const EMPTY_STREAM_EVENT_NUMBER: i64 = -1;

/// A lazy, forward-only sequence of events.
pub type EventStream<'a, P> =
    Box<dyn Iterator<Item = Result<ResolvedEvent<P>, EventStoreError>> + 'a>;

fn backwards_unsupported() -> EventStoreError {
    EventStoreError::UnsupportedOperation("reading backwards is not yet supported".to_string())
}

/// Reads the whole store as a single global log.
pub trait EventReader {
    /// Store-scope position.
    type Position: Position;
    /// Codec for store-scope positions.
    type Codec: PositionCodec<Position = Self::Position>;

    /// Reads every event after `position_exclusive`, oldest first.
    fn read_all_forwards_from(
        &self,
        position_exclusive: &Self::Position,
    ) -> Result<EventStream<'_, Self::Position>, EventStoreError>;

    /// Reads every event from the beginning of the store.
    fn read_all_forwards(&self) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        let empty = self.empty_store_position();
        self.read_all_forwards_from(&empty)
    }

    /// Reads every event, newest first.
    fn read_all_backwards(&self) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        Err(backwards_unsupported())
    }

    /// Reads every event before `position_exclusive`, newest first.
    fn read_all_backwards_from(
        &self,
        _position_exclusive: &Self::Position,
    ) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        Err(backwards_unsupported())
    }

    /// Returns the newest event in the store, if any.
    fn read_last_event(&self) -> Result<Option<ResolvedEvent<Self::Position>>, EventStoreError> {
        self.read_all_backwards()?.next().transpose()
    }

    /// Position preceding the first event.
    fn empty_store_position(&self) -> Self::Position;

    /// Codec for positions returned by this reader.
    fn store_position_codec(&self) -> Self::Codec;
}

/// Reads all streams of one category, interleaved in store order.
pub trait EventCategoryReader {
    /// Category-scope position.
    type CategoryPosition: Position;
    /// Codec for category-scope positions.
    type CategoryCodec: PositionCodec<Position = Self::CategoryPosition>;

    /// Reads the category's events after `position_exclusive`, oldest first.
    fn read_category_forwards_from(
        &self,
        category: &str,
        position_exclusive: &Self::CategoryPosition,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError>;

    /// Reads the category from its beginning.
    fn read_category_forwards(
        &self,
        category: &str,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        let empty = self.empty_category_position(category);
        self.read_category_forwards_from(category, &empty)
    }

    /// Reads the category newest first.
    fn read_category_backwards(
        &self,
        _category: &str,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        Err(backwards_unsupported())
    }

    /// Reads the category's events before `position_exclusive`, newest first.
    fn read_category_backwards_from(
        &self,
        _category: &str,
        _position_exclusive: &Self::CategoryPosition,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        Err(backwards_unsupported())
    }

    /// Returns the newest event in the category, if any.
    fn read_last_event_in_category(
        &self,
        category: &str,
    ) -> Result<Option<ResolvedEvent<Self::CategoryPosition>>, EventStoreError> {
        self.read_category_backwards(category)?.next().transpose()
    }

    /// Position preceding the category's first event.
    fn empty_category_position(&self, category: &str) -> Self::CategoryPosition;

    /// Codec for positions returned when reading `category`.
    fn category_position_codec(&self, category: &str) -> Self::CategoryCodec;
}

/// Reads one stream by event number.
pub trait EventStreamReader {
    /// Position attached to events read from a stream.
    type StreamPosition: Position;
    /// Codec for stream-scope positions.
    type StreamCodec: PositionCodec<Position = Self::StreamPosition>;

    /// Reads the stream's events numbered above `event_number_exclusive`.
    ///
    /// Fails with [`EventStoreError::NoSuchStream`] before returning if the
    /// stream was never written.
    fn read_stream_forwards_from(
        &self,
        stream_id: &StreamId,
        event_number_exclusive: i64,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError>;

    /// Reads the whole stream.
    fn read_stream_forwards(
        &self,
        stream_id: &StreamId,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        self.read_stream_forwards_from(stream_id, EMPTY_STREAM_EVENT_NUMBER)
    }

    /// Reads the whole stream, newest first.
    fn read_stream_backwards(
        &self,
        _stream_id: &StreamId,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        Err(backwards_unsupported())
    }

    /// Reads the stream's events numbered below `event_number_exclusive`, newest first.
    fn read_stream_backwards_from(
        &self,
        _stream_id: &StreamId,
        _event_number_exclusive: i64,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        Err(backwards_unsupported())
    }

    /// Returns the newest event of the stream.
    fn read_last_event_in_stream(
        &self,
        stream_id: &StreamId,
    ) -> Result<Option<ResolvedEvent<Self::StreamPosition>>, EventStoreError> {
        self.read_stream_backwards(stream_id)?.next().transpose()
    }

    /// Codec for positions returned by stream reads.
    fn stream_position_codec(&self) -> Self::StreamCodec;
}

/// One stream's part of a batch write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamWriteRequest {
    /// Target stream.
    pub stream_id: StreamId,
    /// Events to append.
    pub events: Vec<NewEvent>,
    /// Required current version, or `None` to append unconditionally.
    pub expected_version: Option<i64>,
}

impl StreamWriteRequest {
    /// A request checked against `expected_version`.
    pub fn new(stream_id: StreamId, events: Vec<NewEvent>, expected_version: i64) -> Self {
        Self {
            stream_id,
            events,
            expected_version: Some(expected_version),
        }
    }

    /// A request appended at whatever the current version is.
    pub fn unconditional(stream_id: StreamId, events: Vec<NewEvent>) -> Self {
        Self {
            stream_id,
            events,
            expected_version: None,
        }
    }
}

/// Appends events to streams under optimistic concurrency.
pub trait EventStreamWriter {
    /// Appends `events` if the stream's last event number equals `expected_version`.
    ///
    /// Use [`EMPTY_STREAM_EVENT_NUMBER`] to require that the stream does not
    /// exist yet. All events are appended with consecutive numbers, or none
    /// are.
    ///
    /// # Errors
    ///
    /// Returns [`EventStoreError::WrongExpectedVersion`] carrying both versions
    /// when they differ.
    fn write(
        &self,
        stream_id: &StreamId,
        events: &[NewEvent],
        expected_version: i64,
    ) -> Result<(), EventStoreError>;

    /// Appends `events` after whatever the stream currently holds.
    fn append(&self, stream_id: &StreamId, events: &[NewEvent]) -> Result<(), EventStoreError>;

    /// Applies several single-stream writes in order.
    ///
    /// A stream may appear at most once. Expected-version failures do not stop
    /// the batch; they are collected and reported together as
    /// [`EventStoreError::BatchWriteConflict`]. Any other failure aborts the
    /// remaining requests.
    fn execute(&self, requests: &[StreamWriteRequest]) -> Result<(), EventStoreError> {
        let mut seen = HashSet::new();
        for request in requests {
            if !seen.insert(&request.stream_id) {
                return Err(EventStoreError::IllegalState(format!(
                    "duplicate stream id in write request: {}",
                    request.stream_id
                )));
            }
        }

        let mut conflicts = Vec::new();
        for request in requests {
            let result = match request.expected_version {
                Some(expected) => self.write(&request.stream_id, &request.events, expected),
                None => self.append(&request.stream_id, &request.events),
            };
            match result {
                Ok(()) => {}
                Err(EventStoreError::WrongExpectedVersion { current, expected }) => {
                    conflicts.push(StreamConflict {
                        stream_id: request.stream_id.clone(),
                        current,
                        expected,
                    })
                }
                Err(e) => return Err(e),
            }
        }

        if conflicts.is_empty() {
            Ok(())
        } else {
            Err(EventStoreError::BatchWriteConflict(conflicts))
        }
    }
}

impl<T: EventReader + ?Sized> EventReader for &T {
    type Position = T::Position;
    type Codec = T::Codec;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &Self::Position,
    ) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        (**self).read_all_forwards_from(position_exclusive)
    }

    fn read_all_backwards(&self) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        (**self).read_all_backwards()
    }

    fn read_all_backwards_from(
        &self,
        position_exclusive: &Self::Position,
    ) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        (**self).read_all_backwards_from(position_exclusive)
    }

    fn empty_store_position(&self) -> Self::Position {
        (**self).empty_store_position()
    }

    fn store_position_codec(&self) -> Self::Codec {
        (**self).store_position_codec()
    }
}

impl<T: EventReader + ?Sized> EventReader for Arc<T> {
    type Position = T::Position;
    type Codec = T::Codec;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &Self::Position,
    ) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        (**self).read_all_forwards_from(position_exclusive)
    }

    fn read_all_backwards(&self) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        (**self).read_all_backwards()
    }

    fn read_all_backwards_from(
        &self,
        position_exclusive: &Self::Position,
    ) -> Result<EventStream<'_, Self::Position>, EventStoreError> {
        (**self).read_all_backwards_from(position_exclusive)
    }

    fn empty_store_position(&self) -> Self::Position {
        (**self).empty_store_position()
    }

    fn store_position_codec(&self) -> Self::Codec {
        (**self).store_position_codec()
    }
}

impl<T: EventCategoryReader + ?Sized> EventCategoryReader for &T {
    type CategoryPosition = T::CategoryPosition;
    type CategoryCodec = T::CategoryCodec;

    fn read_category_forwards_from(
        &self,
        category: &str,
        position_exclusive: &Self::CategoryPosition,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        (**self).read_category_forwards_from(category, position_exclusive)
    }

    fn read_category_backwards(
        &self,
        category: &str,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        (**self).read_category_backwards(category)
    }

    fn read_category_backwards_from(
        &self,
        category: &str,
        position_exclusive: &Self::CategoryPosition,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        (**self).read_category_backwards_from(category, position_exclusive)
    }

    fn empty_category_position(&self, category: &str) -> Self::CategoryPosition {
        (**self).empty_category_position(category)
    }

    fn category_position_codec(&self, category: &str) -> Self::CategoryCodec {
        (**self).category_position_codec(category)
    }
}

impl<T: EventCategoryReader + ?Sized> EventCategoryReader for Arc<T> {
    type CategoryPosition = T::CategoryPosition;
    type CategoryCodec = T::CategoryCodec;

    fn read_category_forwards_from(
        &self,
        category: &str,
        position_exclusive: &Self::CategoryPosition,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        (**self).read_category_forwards_from(category, position_exclusive)
    }

    fn read_category_backwards(
        &self,
        category: &str,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        (**self).read_category_backwards(category)
    }

    fn read_category_backwards_from(
        &self,
        category: &str,
        position_exclusive: &Self::CategoryPosition,
    ) -> Result<EventStream<'_, Self::CategoryPosition>, EventStoreError> {
        (**self).read_category_backwards_from(category, position_exclusive)
    }

    fn empty_category_position(&self, category: &str) -> Self::CategoryPosition {
        (**self).empty_category_position(category)
    }

    fn category_position_codec(&self, category: &str) -> Self::CategoryCodec {
        (**self).category_position_codec(category)
    }
}

impl<T: EventStreamReader + ?Sized> EventStreamReader for &T {
    type StreamPosition = T::StreamPosition;
    type StreamCodec = T::StreamCodec;

    fn read_stream_forwards_from(
        &self,
        stream_id: &StreamId,
        event_number_exclusive: i64,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        (**self).read_stream_forwards_from(stream_id, event_number_exclusive)
    }

    fn read_stream_backwards(
        &self,
        stream_id: &StreamId,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        (**self).read_stream_backwards(stream_id)
    }

    fn read_stream_backwards_from(
        &self,
        stream_id: &StreamId,
        event_number_exclusive: i64,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        (**self).read_stream_backwards_from(stream_id, event_number_exclusive)
    }

    fn stream_position_codec(&self) -> Self::StreamCodec {
        (**self).stream_position_codec()
    }
}

impl<T: EventStreamReader + ?Sized> EventStreamReader for Arc<T> {
    type StreamPosition = T::StreamPosition;
    type StreamCodec = T::StreamCodec;

    fn read_stream_forwards_from(
        &self,
        stream_id: &StreamId,
        event_number_exclusive: i64,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        (**self).read_stream_forwards_from(stream_id, event_number_exclusive)
    }

    fn read_stream_backwards(
        &self,
        stream_id: &StreamId,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        (**self).read_stream_backwards(stream_id)
    }

    fn read_stream_backwards_from(
        &self,
        stream_id: &StreamId,
        event_number_exclusive: i64,
    ) -> Result<EventStream<'_, Self::StreamPosition>, EventStoreError> {
        (**self).read_stream_backwards_from(stream_id, event_number_exclusive)
    }

    fn stream_position_codec(&self) -> Self::StreamCodec {
        (**self).stream_position_codec()
    }
}

impl<T: EventStreamWriter + ?Sized> EventStreamWriter for &T {
    fn write(
        &self,
        stream_id: &StreamId,
        events: &[NewEvent],
        expected_version: i64,
    ) -> Result<(), EventStoreError> {
        (**self).write(stream_id, events, expected_version)
    }

    fn append(&self, stream_id: &StreamId, events: &[NewEvent]) -> Result<(), EventStoreError> {
        (**self).append(stream_id, events)
    }

    fn execute(&self, requests: &[StreamWriteRequest]) -> Result<(), EventStoreError> {
        (**self).execute(requests)
    }
}

impl<T: EventStreamWriter + ?Sized> EventStreamWriter for Arc<T> {
    fn write(
        &self,
        stream_id: &StreamId,
        events: &[NewEvent],
        expected_version: i64,
    ) -> Result<(), EventStoreError> {
        (**self).write(stream_id, events, expected_version)
    }

    fn append(&self, stream_id: &StreamId, events: &[NewEvent]) -> Result<(), EventStoreError> {
        (**self).append(stream_id, events)
    }

    fn execute(&self, requests: &[StreamWriteRequest]) -> Result<(), EventStoreError> {
        (**self).execute(requests)
    }
}
