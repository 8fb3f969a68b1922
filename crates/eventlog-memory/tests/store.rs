//! Behavioural tests every event store is expected to pass, run against the
//! in-memory store.

use chrono::{TimeZone, Utc};
use eventlog_api::{
    EventCategoryReader, EventReader, EventStoreError, EventStreamReader, EventStreamWriter,
    NewEvent, PositionCodec, ResolvedEvent, StreamId, EMPTY_STREAM_EVENT_NUMBER,
};
use eventlog_memory::{InMemoryEventStore, InMemoryPosition};

fn stream(category: &str, id: &str) -> StreamId {
    StreamId::new(category, id).unwrap()
}

fn event(event_type: &str, data: &str) -> NewEvent {
    NewEvent::new(event_type, data, "{\"meta\":true}")
}

fn collect(
    events: Result<eventlog_api::EventStream<'_, InMemoryPosition>, EventStoreError>,
) -> Vec<ResolvedEvent<InMemoryPosition>> {
    events.unwrap().collect::<Result<_, _>>().unwrap()
}

fn fixed_clock_store() -> InMemoryEventStore {
    InMemoryEventStore::with_clock(|| Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
}

#[test]
fn test_can_read_written_events() {
    let store = fixed_clock_store();
    let s = stream("stream", "1");
    store
        .write(&s, &[event("type-A", "data-A"), event("type-B", "data-B")], EMPTY_STREAM_EVENT_NUMBER)
        .unwrap();

    let records: Vec<_> = collect(store.read_stream_forwards(&s))
        .into_iter()
        .map(|e| e.event_record)
        .collect();

    assert_eq!(records.len(), 2);
    assert_eq!(records[0].event_number, 0);
    assert_eq!(records[0].event_type, "type-A");
    assert_eq!(records[0].data, b"data-A".to_vec());
    assert_eq!(records[0].metadata, b"{\"meta\":true}".to_vec());
    assert_eq!(records[1].event_number, 1);
    assert_eq!(records[1].stream_id, s);
    assert_eq!(records[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap());
}

#[test]
fn test_streams_are_independent() {
    let store = InMemoryEventStore::new();
    store.write(&stream("stream", "1"), &[event("A", "1")], -1).unwrap();
    store.write(&stream("stream", "2"), &[event("B", "2")], -1).unwrap();

    let first = collect(store.read_stream_forwards(&stream("stream", "1")));
    let second = collect(store.read_stream_forwards(&stream("stream", "2")));

    assert_eq!(first.len(), 1);
    assert_eq!(first[0].event_record.event_type, "A");
    assert_eq!(first[0].event_record.event_number, 0);
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].event_record.event_type, "B");
    assert_eq!(second[0].event_record.event_number, 0);
}

#[test]
fn test_reads_stream_from_event_number() {
    let store = InMemoryEventStore::new();
    let s = stream("stream", "1");
    store
        .write(&s, &[event("A", "1"), event("B", "2"), event("C", "3")], -1)
        .unwrap();

    let types: Vec<_> = collect(store.read_stream_forwards_from(&s, 0))
        .into_iter()
        .map(|e| e.event_record.event_type)
        .collect();
    assert_eq!(types, vec!["B", "C"]);
    assert!(collect(store.read_stream_forwards_from(&s, 2)).is_empty());
}

#[test]
fn test_reading_unknown_stream_fails_before_iteration() {
    let store = InMemoryEventStore::new();
    match store.read_stream_forwards(&stream("stream", "missing")) {
        Err(EventStoreError::NoSuchStream(id)) => assert_eq!(id, stream("stream", "missing")),
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("expected NoSuchStream"),
    };
}

#[test]
fn test_read_all_in_write_order() {
    let store = InMemoryEventStore::new();
    store.write(&stream("a", "1"), &[event("A1", "")], -1).unwrap();
    store.write(&stream("b", "1"), &[event("B1", "")], -1).unwrap();
    store.write(&stream("a", "1"), &[event("A2", "")], 0).unwrap();

    let types: Vec<_> = collect(store.read_all_forwards())
        .into_iter()
        .map(|e| e.event_record.event_type)
        .collect();
    assert_eq!(types, vec!["A1", "B1", "A2"]);
}

#[test]
fn test_read_all_continues_from_position() {
    let store = InMemoryEventStore::new();
    store.write(&stream("a", "1"), &[event("A1", ""), event("A2", "")], -1).unwrap();

    let first = collect(store.read_all_forwards());
    store.write(&stream("b", "1"), &[event("B1", "")], -1).unwrap();

    let rest = collect(store.read_all_forwards_from(&first[0].position));
    let types: Vec<_> = rest.iter().map(|e| e.event_record.event_type.as_str()).collect();
    assert_eq!(types, vec!["A2", "B1"]);

    let last = &rest[rest.len() - 1].position;
    assert!(collect(store.read_all_forwards_from(last)).is_empty());
}

#[test]
fn test_positions_survive_codec() {
    let store = InMemoryEventStore::new();
    store.write(&stream("a", "1"), &[event("A1", ""), event("A2", "")], -1).unwrap();
    let codec = store.store_position_codec();

    let events = collect(store.read_all_forwards());
    let serialized = codec.serialize_position(&events[0].position);
    let restored = codec.deserialize_position(&serialized).unwrap();

    let rest = collect(store.read_all_forwards_from(&restored));
    assert_eq!(rest, events[1..].to_vec());
}

#[test]
fn test_wrong_expected_version_when_not_reached() {
    let store = InMemoryEventStore::new();
    let s = stream("stream", "1");
    store.write(&s, &[event("A", "")], -1).unwrap();

    let err = store.write(&s, &[event("B", "")], 3).unwrap_err();
    assert!(matches!(
        err,
        EventStoreError::WrongExpectedVersion { current: 0, expected: 3 }
    ));
}

#[test]
fn test_wrong_expected_version_when_already_passed() {
    let store = InMemoryEventStore::new();
    let s = stream("stream", "1");
    store.write(&s, &[event("A", ""), event("B", ""), event("C", "")], -1).unwrap();

    let err = store.write(&s, &[event("D", "")], 0).unwrap_err();
    assert!(matches!(
        err,
        EventStoreError::WrongExpectedVersion { current: 2, expected: 0 }
    ));
    assert_eq!(collect(store.read_stream_forwards(&s)).len(), 3);
}

#[test]
fn test_write_succeeds_at_expected_version() {
    let store = InMemoryEventStore::new();
    let s = stream("stream", "1");
    store.write(&s, &[event("A", "")], -1).unwrap();
    store.write(&s, &[event("B", "")], 0).unwrap();

    let numbers: Vec<_> = collect(store.read_stream_forwards(&s))
        .into_iter()
        .map(|e| e.event_record.event_number)
        .collect();
    assert_eq!(numbers, vec![0, 1]);
}

#[test]
fn test_expecting_empty_stream_fails_once_written() {
    let store = InMemoryEventStore::new();
    let s = stream("stream", "1");
    store.write(&s, &[event("A", "")], EMPTY_STREAM_EVENT_NUMBER).unwrap();
    assert!(store
        .write(&s, &[event("B", "")], EMPTY_STREAM_EVENT_NUMBER)
        .unwrap_err()
        .is_wrong_expected_version());
}

#[test]
fn test_append_ignores_version() {
    let store = InMemoryEventStore::new();
    let s = stream("stream", "1");
    store.append(&s, &[event("A", "")]).unwrap();
    store.append(&s, &[event("B", "")]).unwrap();

    let last = store.read_last_event_in_stream(&s).unwrap().unwrap();
    assert_eq!(last.event_record.event_number, 1);
    assert_eq!(last.event_record.event_type, "B");
}

#[test]
fn test_reads_category() {
    let store = InMemoryEventStore::new();
    store.write(&stream("alpha", "1"), &[event("A1", "")], -1).unwrap();
    store.write(&stream("beta", "1"), &[event("B1", "")], -1).unwrap();
    store.write(&stream("alpha", "2"), &[event("A2", "")], -1).unwrap();

    let alpha = collect(store.read_category_forwards("alpha"));
    let types: Vec<_> = alpha.iter().map(|e| e.event_record.event_type.as_str()).collect();
    assert_eq!(types, vec!["A1", "A2"]);

    let rest = collect(store.read_category_forwards_from("alpha", &alpha[0].position));
    assert_eq!(rest.len(), 1);
    assert_eq!(rest[0].event_record.event_type, "A2");
}

#[test]
fn test_reads_backwards() {
    let store = InMemoryEventStore::new();
    store.write(&stream("alpha", "1"), &[event("A1", ""), event("A2", "")], -1).unwrap();
    store.write(&stream("beta", "1"), &[event("B1", "")], -1).unwrap();

    let types: Vec<_> = collect(store.read_all_backwards())
        .into_iter()
        .map(|e| e.event_record.event_type)
        .collect();
    assert_eq!(types, vec!["B1", "A2", "A1"]);

    let before = collect(store.read_all_backwards_from(&InMemoryPosition(3)));
    assert_eq!(before.len(), 2);
    assert_eq!(before[0].event_record.event_type, "A2");

    let last_alpha = store.read_last_event_in_category("alpha").unwrap().unwrap();
    assert_eq!(last_alpha.event_record.event_type, "A2");
    assert_eq!(store.read_last_event().unwrap().unwrap().position, InMemoryPosition(3));

    let earlier = collect(store.read_stream_backwards_from(&stream("alpha", "1"), 1));
    assert_eq!(earlier.len(), 1);
    assert_eq!(earlier[0].event_record.event_number, 0);
}

#[test]
fn test_concurrent_writers_never_lose_events() {
    let store = std::sync::Arc::new(InMemoryEventStore::new());
    let handles: Vec<_> = (0..4)
        .map(|t| {
            let store = store.clone();
            std::thread::spawn(move || {
                let s = StreamId::new("thread", t.to_string()).unwrap();
                for i in 0..50 {
                    store.write(&s, &[NewEvent::without_metadata("N", i.to_string())], i - 1).unwrap();
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().unwrap();
    }

    let all = collect(store.read_all_forwards());
    assert_eq!(all.len(), 200);
    for (i, e) in all.iter().enumerate() {
        assert_eq!(e.position, InMemoryPosition(i as u64 + 1));
    }
}
