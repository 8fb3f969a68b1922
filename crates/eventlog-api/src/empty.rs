//! An event source that never yields events.

use crate::errors::EventStoreError;
use crate::event::NewEvent;
use crate::ports::{EventCategoryReader, EventReader, EventStream, EventStreamReader, EventStreamWriter};
use crate::position::{OrderedPositionCodec, PositionCodec};
use crate::stream_id::StreamId;
use std::cmp::Ordering;
use std::iter;

/// The only position of an [`EmptyEventSource`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct EmptyPosition;

/// Codec for [`EmptyPosition`]; every string decodes to the single position.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyPositionCodec;

impl EmptyPositionCodec {
    /// Wire form of [`EmptyPosition`].
    pub const SERIALIZED: &'static str = "Empty";
}

impl PositionCodec for EmptyPositionCodec {
    type Position = EmptyPosition;

    fn serialize_position(&self, _position: &EmptyPosition) -> String {
        Self::SERIALIZED.to_string()
    }

    fn deserialize_position(&self, _serialized: &str) -> Result<EmptyPosition, EventStoreError> {
        Ok(EmptyPosition)
    }
}

impl OrderedPositionCodec for EmptyPositionCodec {
    fn compare_positions(
        &self,
        _left: &EmptyPosition,
        _right: &EmptyPosition,
    ) -> Result<Ordering, EventStoreError> {
        Ok(Ordering::Equal)
    }
}

/// A source with no events in any scope. Writes are refused.
///
/// Useful as the backfill side of a stitched source when there is no history
/// to migrate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyEventSource;

fn nothing<'a>() -> EventStream<'a, EmptyPosition> {
    Box::new(iter::empty())
}

impl EventReader for EmptyEventSource {
    type Position = EmptyPosition;
    type Codec = EmptyPositionCodec;

    fn read_all_forwards_from(
        &self,
        _position_exclusive: &EmptyPosition,
    ) -> Result<EventStream<'_, EmptyPosition>, EventStoreError> {
        Ok(nothing())
    }

    fn empty_store_position(&self) -> EmptyPosition {
        EmptyPosition
    }

    fn store_position_codec(&self) -> EmptyPositionCodec {
        EmptyPositionCodec
    }
}

impl EventCategoryReader for EmptyEventSource {
    type CategoryPosition = EmptyPosition;
    type CategoryCodec = EmptyPositionCodec;

    fn read_category_forwards_from(
        &self,
        _category: &str,
        _position_exclusive: &EmptyPosition,
    ) -> Result<EventStream<'_, EmptyPosition>, EventStoreError> {
        Ok(nothing())
    }

    fn empty_category_position(&self, _category: &str) -> EmptyPosition {
        EmptyPosition
    }

    fn category_position_codec(&self, _category: &str) -> EmptyPositionCodec {
        EmptyPositionCodec
    }
}

impl EventStreamReader for EmptyEventSource {
    type StreamPosition = EmptyPosition;
    type StreamCodec = EmptyPositionCodec;

    fn read_stream_forwards_from(
        &self,
        _stream_id: &StreamId,
        _event_number_exclusive: i64,
    ) -> Result<EventStream<'_, EmptyPosition>, EventStoreError> {
        Ok(nothing())
    }

    fn stream_position_codec(&self) -> EmptyPositionCodec {
        EmptyPositionCodec
    }
}

impl EventStreamWriter for EmptyEventSource {
    fn write(
        &self,
        stream_id: &StreamId,
        _events: &[NewEvent],
        _expected_version: i64,
    ) -> Result<(), EventStoreError> {
        Err(EventStoreError::UnsupportedOperation(format!(
            "cannot write {} to an empty event source",
            stream_id
        )))
    }

    fn append(&self, stream_id: &StreamId, events: &[NewEvent]) -> Result<(), EventStoreError> {
        self.write(stream_id, events, crate::EMPTY_STREAM_EVENT_NUMBER)
    }
}
