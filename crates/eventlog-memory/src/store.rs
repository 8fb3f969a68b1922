//! The in-memory store.

use crate::position::{InMemoryPosition, InMemoryPositionCodec};
use chrono::{DateTime, SubsecRound, Utc};
use eventlog_api::{
    EventCategoryReader, EventReader, EventRecord, EventStoreError, EventStream,
    EventStreamReader, EventStreamWriter, NewEvent, ResolvedEvent, StreamId,
    EMPTY_STREAM_EVENT_NUMBER,
};
use parking_lot::RwLock;
use std::collections::HashMap;
use tracing::debug;

type Clock = Box<dyn Fn() -> DateTime<Utc> + Send + Sync>;

#[derive(Default)]
struct Log {
    events: Vec<ResolvedEvent<InMemoryPosition>>,
    versions: HashMap<StreamId, i64>,
}

impl Log {
    fn current_version(&self, stream_id: &StreamId) -> i64 {
        self.versions
            .get(stream_id)
            .copied()
            .unwrap_or(EMPTY_STREAM_EVENT_NUMBER)
    }

    fn append(&mut self, stream_id: &StreamId, events: &[NewEvent], timestamp: DateTime<Utc>) {
        let mut event_number = self.current_version(stream_id);
        for event in events {
            event_number += 1;
            let position = InMemoryPosition(self.events.len() as u64 + 1);
            let record =
                EventRecord::from_new_event(timestamp, stream_id.clone(), event_number, event);
            self.events.push(ResolvedEvent::new(position, record));
        }
        if !events.is_empty() {
            self.versions.insert(stream_id.clone(), event_number);
        }
    }
}

/// Which events of the log a read yields.
#[derive(Clone)]
enum Selection {
    All,
    Category(String),
    Stream { stream_id: StreamId, after: i64 },
    StreamBefore { stream_id: StreamId, before: i64 },
}

impl Selection {
    fn matches(&self, record: &EventRecord) -> bool {
        match self {
            Selection::All => true,
            Selection::Category(category) => record.stream_id.category() == category,
            Selection::Stream { stream_id, after } => {
                &record.stream_id == stream_id && record.event_number > *after
            }
            Selection::StreamBefore { stream_id, before } => {
                &record.stream_id == stream_id && record.event_number < *before
            }
        }
    }
}

/// Event store held entirely in memory.
///
/// One lock guards the event list and the per-stream versions. A write
/// appends its whole batch under the write lock, so readers never see part of
/// a batch. Reads take the read lock once per `next()`, so a forward read
/// that has not finished observes events appended after it started.
///
/// Positions are shared by the store, category and stream scopes.
pub struct InMemoryEventStore {
    log: RwLock<Log>,
    clock: Clock,
}

impl InMemoryEventStore {
    /// Creates an empty store stamping events with the current time.
    ///
    /// Timestamps are truncated to whole milliseconds.
    pub fn new() -> Self {
        Self::with_clock(|| Utc::now().trunc_subsecs(3))
    }

    /// Creates an empty store that stamps events using `clock`.
    pub fn with_clock<F>(clock: F) -> Self
    where
        F: Fn() -> DateTime<Utc> + Send + Sync + 'static,
    {
        Self {
            log: RwLock::new(Log::default()),
            clock: Box::new(clock),
        }
    }

    /// Number of events in the store.
    pub fn len(&self) -> usize {
        self.log.read().events.len()
    }

    /// Returns true if nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn forwards(&self, from_index: usize, selection: Selection) -> EventStream<'_, InMemoryPosition> {
        Box::new(ForwardEvents {
            log: &self.log,
            next_index: from_index,
            selection,
        })
    }

    fn backwards(&self, before_index: usize, selection: Selection) -> EventStream<'_, InMemoryPosition> {
        Box::new(BackwardEvents {
            log: &self.log,
            remaining: before_index,
            selection,
        })
    }

    fn require_stream(&self, stream_id: &StreamId) -> Result<(), EventStoreError> {
        if self.log.read().versions.contains_key(stream_id) {
            Ok(())
        } else {
            Err(EventStoreError::NoSuchStream(stream_id.clone()))
        }
    }
}

impl Default for InMemoryEventStore {
    fn default() -> Self {
        Self::new()
    }
}

struct ForwardEvents<'a> {
    log: &'a RwLock<Log>,
    next_index: usize,
    selection: Selection,
}

impl Iterator for ForwardEvents<'_> {
    type Item = Result<ResolvedEvent<InMemoryPosition>, EventStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let log = self.log.read();
        while let Some(event) = log.events.get(self.next_index) {
            self.next_index += 1;
            if self.selection.matches(&event.event_record) {
                return Some(Ok(event.clone()));
            }
        }
        None
    }
}

struct BackwardEvents<'a> {
    log: &'a RwLock<Log>,
    remaining: usize,
    selection: Selection,
}

impl Iterator for BackwardEvents<'_> {
    type Item = Result<ResolvedEvent<InMemoryPosition>, EventStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        let log = self.log.read();
        while self.remaining > 0 {
            self.remaining -= 1;
            let event = &log.events[self.remaining];
            if self.selection.matches(&event.event_record) {
                return Some(Ok(event.clone()));
            }
        }
        None
    }
}

// Position n is the event at index n - 1. Positions beyond `usize` read as
// past the end of the log.
fn index_after(position: &InMemoryPosition) -> usize {
    usize::try_from(position.0).unwrap_or(usize::MAX)
}

fn index_before(position: &InMemoryPosition) -> usize {
    usize::try_from(position.0.saturating_sub(1)).unwrap_or(usize::MAX)
}

impl EventReader for InMemoryEventStore {
    type Position = InMemoryPosition;
    type Codec = InMemoryPositionCodec;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &InMemoryPosition,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        Ok(self.forwards(index_after(position_exclusive), Selection::All))
    }

    fn read_all_backwards(&self) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        Ok(self.backwards(self.len(), Selection::All))
    }

    fn read_all_backwards_from(
        &self,
        position_exclusive: &InMemoryPosition,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        Ok(self.backwards(index_before(position_exclusive).min(self.len()), Selection::All))
    }

    fn empty_store_position(&self) -> InMemoryPosition {
        InMemoryPosition::EMPTY
    }

    fn store_position_codec(&self) -> InMemoryPositionCodec {
        InMemoryPositionCodec
    }
}

impl EventCategoryReader for InMemoryEventStore {
    type CategoryPosition = InMemoryPosition;
    type CategoryCodec = InMemoryPositionCodec;

    fn read_category_forwards_from(
        &self,
        category: &str,
        position_exclusive: &InMemoryPosition,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        Ok(self.forwards(
            index_after(position_exclusive),
            Selection::Category(category.to_string()),
        ))
    }

    fn read_category_backwards(
        &self,
        category: &str,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        Ok(self.backwards(self.len(), Selection::Category(category.to_string())))
    }

    fn read_category_backwards_from(
        &self,
        category: &str,
        position_exclusive: &InMemoryPosition,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        Ok(self.backwards(
            index_before(position_exclusive).min(self.len()),
            Selection::Category(category.to_string()),
        ))
    }

    fn empty_category_position(&self, _category: &str) -> InMemoryPosition {
        InMemoryPosition::EMPTY
    }

    fn category_position_codec(&self, _category: &str) -> InMemoryPositionCodec {
        InMemoryPositionCodec
    }
}

impl EventStreamReader for InMemoryEventStore {
    type StreamPosition = InMemoryPosition;
    type StreamCodec = InMemoryPositionCodec;

    fn read_stream_forwards_from(
        &self,
        stream_id: &StreamId,
        event_number_exclusive: i64,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        self.require_stream(stream_id)?;
        Ok(self.forwards(
            0,
            Selection::Stream {
                stream_id: stream_id.clone(),
                after: event_number_exclusive,
            },
        ))
    }

    fn read_stream_backwards(
        &self,
        stream_id: &StreamId,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        self.read_stream_backwards_from(stream_id, i64::MAX)
    }

    fn read_stream_backwards_from(
        &self,
        stream_id: &StreamId,
        event_number_exclusive: i64,
    ) -> Result<EventStream<'_, InMemoryPosition>, EventStoreError> {
        self.require_stream(stream_id)?;
        Ok(self.backwards(
            self.len(),
            Selection::StreamBefore {
                stream_id: stream_id.clone(),
                before: event_number_exclusive,
            },
        ))
    }

    fn stream_position_codec(&self) -> InMemoryPositionCodec {
        InMemoryPositionCodec
    }
}

impl EventStreamWriter for InMemoryEventStore {
    fn write(
        &self,
        stream_id: &StreamId,
        events: &[NewEvent],
        expected_version: i64,
    ) -> Result<(), EventStoreError> {
        let mut log = self.log.write();
        let current = log.current_version(stream_id);
        if current != expected_version {
            return Err(EventStoreError::WrongExpectedVersion {
                current,
                expected: expected_version,
            });
        }
        log.append(stream_id, events, (self.clock)());
        debug!(stream = %stream_id, count = events.len(), version = current, "appended events");
        Ok(())
    }

    fn append(&self, stream_id: &StreamId, events: &[NewEvent]) -> Result<(), EventStoreError> {
        let mut log = self.log.write();
        log.append(stream_id, events, (self.clock)());
        debug!(stream = %stream_id, count = events.len(), "appended events unconditionally");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stream(id: &str) -> StreamId {
        StreamId::new("test", id).unwrap()
    }

    #[test]
    fn test_positions_count_from_one() {
        let store = InMemoryEventStore::new();
        store
            .write(&stream("1"), &[NewEvent::without_metadata("A", "a")], -1)
            .unwrap();
        store
            .write(&stream("2"), &[NewEvent::without_metadata("B", "b")], -1)
            .unwrap();
        let positions: Vec<u64> = store
            .read_all_forwards()
            .unwrap()
            .map(|e| e.unwrap().position.0)
            .collect();
        assert_eq!(positions, vec![1, 2]);
    }

    #[test]
    fn test_positions_past_the_end_read_nothing_forwards() {
        let store = InMemoryEventStore::new();
        store
            .write(&stream("1"), &[NewEvent::without_metadata("A", "a")], -1)
            .unwrap();
        assert_eq!(
            store.read_all_forwards_from(&InMemoryPosition(u64::MAX)).unwrap().count(),
            0
        );

        let backwards: Vec<u64> = store
            .read_all_backwards_from(&InMemoryPosition(u64::MAX))
            .unwrap()
            .map(|e| e.unwrap().position.0)
            .collect();
        assert_eq!(backwards, vec![1]);
    }

    #[test]
    fn test_empty_batch_does_not_create_stream() {
        let store = InMemoryEventStore::new();
        store.write(&stream("1"), &[], -1).unwrap();
        assert!(store.is_empty());
        assert!(matches!(
            store.read_stream_forwards(&stream("1")),
            Err(EventStoreError::NoSuchStream(_))
        ));
    }

    #[test]
    fn test_forward_read_sees_later_appends() {
        let store = InMemoryEventStore::new();
        store
            .write(&stream("1"), &[NewEvent::without_metadata("A", "a")], -1)
            .unwrap();
        let mut events = store.read_all_forwards().unwrap();
        assert!(events.next().is_some());
        assert!(events.next().is_none());
        store
            .write(&stream("1"), &[NewEvent::without_metadata("A", "b")], 0)
            .unwrap();
        assert_eq!(events.next().unwrap().unwrap().event_record.data, b"b".to_vec());
    }
}
