//! Tests for the default behaviour of the port traits.

use eventlog_api::{
    EventStoreError, EventStreamWriter, NewEvent, StreamId, StreamWriteRequest,
};
use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::HashMap;

/// Writer that tracks only stream versions.
#[derive(Default)]
struct VersionOnlyWriter {
    versions: RefCell<HashMap<StreamId, i64>>,
}

impl VersionOnlyWriter {
    fn version(&self, stream_id: &StreamId) -> i64 {
        *self.versions.borrow().get(stream_id).unwrap_or(&-1)
    }
}

impl EventStreamWriter for VersionOnlyWriter {
    fn write(
        &self,
        stream_id: &StreamId,
        events: &[NewEvent],
        expected_version: i64,
    ) -> Result<(), EventStoreError> {
        let current = self.version(stream_id);
        if current != expected_version {
            return Err(EventStoreError::WrongExpectedVersion {
                current,
                expected: expected_version,
            });
        }
        self.versions
            .borrow_mut()
            .insert(stream_id.clone(), current + events.len() as i64);
        Ok(())
    }

    fn append(&self, stream_id: &StreamId, events: &[NewEvent]) -> Result<(), EventStoreError> {
        let current = self.version(stream_id);
        self.write(stream_id, events, current)
    }
}

fn stream(category: &str, id: &str) -> StreamId {
    StreamId::new(category, id).unwrap()
}

fn events(n: usize) -> Vec<NewEvent> {
    (0..n)
        .map(|i| NewEvent::without_metadata("Tested", format!("{{\"n\":{}}}", i)))
        .collect()
}

#[test]
fn test_execute_applies_every_request() {
    let writer = VersionOnlyWriter::default();
    writer
        .execute(&[
            StreamWriteRequest::new(stream("a", "1"), events(2), -1),
            StreamWriteRequest::unconditional(stream("b", "1"), events(3)),
        ])
        .unwrap();

    assert_eq!(writer.version(&stream("a", "1")), 1);
    assert_eq!(writer.version(&stream("b", "1")), 2);
}

#[test]
fn test_execute_rejects_duplicate_streams_before_writing() {
    let writer = VersionOnlyWriter::default();
    let err = writer
        .execute(&[
            StreamWriteRequest::new(stream("a", "1"), events(1), -1),
            StreamWriteRequest::new(stream("a", "1"), events(1), 0),
        ])
        .unwrap_err();

    assert!(matches!(err, EventStoreError::IllegalState(_)));
    assert_eq!(writer.version(&stream("a", "1")), -1);
}

#[test]
fn test_execute_collects_version_conflicts() {
    let writer = VersionOnlyWriter::default();
    writer.write(&stream("a", "1"), &events(1), -1).unwrap();
    writer.write(&stream("c", "1"), &events(2), -1).unwrap();

    let err = writer
        .execute(&[
            StreamWriteRequest::new(stream("a", "1"), events(1), 5),
            StreamWriteRequest::new(stream("b", "1"), events(1), -1),
            StreamWriteRequest::new(stream("c", "1"), events(1), -1),
        ])
        .unwrap_err();

    match err {
        EventStoreError::BatchWriteConflict(conflicts) => {
            assert_eq!(conflicts.len(), 2);
            assert_eq!(conflicts[0].stream_id, stream("a", "1"));
            assert_eq!((conflicts[0].current, conflicts[0].expected), (0, 5));
            assert_eq!(conflicts[1].stream_id, stream("c", "1"));
            assert_eq!((conflicts[1].current, conflicts[1].expected), (1, -1));
        }
        other => panic!("unexpected error: {other}"),
    }
    // The request between the two conflicts was still applied.
    assert_eq!(writer.version(&stream("b", "1")), 0);
}

proptest! {
    #[test]
    fn prop_stream_id_display_parses_back(category in "[a-zA-Z0-9_]{1,12}", id in "[a-zA-Z0-9_-]{0,20}") {
        let stream_id = StreamId::new(category, id).unwrap();
        let parsed: StreamId = stream_id.to_string().parse().unwrap();
        prop_assert_eq!(parsed, stream_id);
    }
}
