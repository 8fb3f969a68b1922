//! Integration tests for the caching reader.

use eventlog_api::{
    EventReader, EventStreamWriter, NewEvent, PositionCodec, ResolvedEvent, StreamId,
};
use eventlog_cache::{
    list_segments, segment_file_name, write_record, CacheFileReader, CacheOptions,
    CachingEventReader,
};
use eventlog_memory::{InMemoryEventStore, InMemoryPosition};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::TempDir;

fn write_events(store: &InMemoryEventStore, id: &str, names: &[&str]) {
    let stream_id = StreamId::new("cached", id).unwrap();
    let events: Vec<_> = names
        .iter()
        .map(|name| NewEvent::new("Happened", *name, format!("meta-{}", name)))
        .collect();
    store.append(&stream_id, &events).unwrap();
}

fn read_all<R: EventReader<Position = InMemoryPosition>>(reader: &R) -> Vec<ResolvedEvent<InMemoryPosition>> {
    reader
        .read_all_forwards()
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap()
}

fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<_> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

#[test]
fn test_empty_store_and_empty_cache_yield_nothing() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    let reader = CachingEventReader::new(&store, CacheOptions::new(dir.path()));

    assert!(read_all(&reader).is_empty());
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_fresh_reader_over_empty_store_replays_cache() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b"]);
    write_events(&store, "2", &["c"]);

    let original = read_all(&store);
    let first = read_all(&CachingEventReader::new(&store, CacheOptions::new(dir.path())));
    assert_eq!(first, original);
    assert_eq!(file_names(dir.path()), vec!["cache-00000000.gz"]);

    let empty = InMemoryEventStore::new();
    let replayed = read_all(&CachingEventReader::new(&empty, CacheOptions::new(dir.path())));
    assert_eq!(replayed, original);
}

#[test]
fn test_non_empty_start_bypasses_cache() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b", "c"]);
    read_all(&CachingEventReader::new(&store, CacheOptions::new(dir.path())));

    let empty = InMemoryEventStore::new();
    let reader = CachingEventReader::new(&empty, CacheOptions::new(dir.path()));
    let from_first = reader
        .read_all_forwards_from(&InMemoryPosition(1))
        .unwrap()
        .count();
    assert_eq!(from_first, 0);

    let from_store = CachingEventReader::new(&store, CacheOptions::new(dir.path()))
        .read_all_forwards_from(&InMemoryPosition(1))
        .unwrap()
        .count();
    assert_eq!(from_store, 2);
    assert_eq!(file_names(dir.path()), vec!["cache-00000000.gz"]);
}

#[test]
fn test_tail_is_added_as_next_segment() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b"]);
    read_all(&CachingEventReader::new(&store, CacheOptions::new(dir.path())));

    write_events(&store, "1", &["c"]);
    let second = read_all(&CachingEventReader::new(&store, CacheOptions::new(dir.path())));
    assert_eq!(second, read_all(&store));
    assert_eq!(
        file_names(dir.path()),
        vec!["cache-00000000.gz", "cache-00000001.gz"]
    );

    let mut tail_segment = CacheFileReader::open(dir.path().join(segment_file_name("cache", 1))).unwrap();
    assert_eq!(tail_segment.read_record().unwrap().unwrap().position, "3");
    assert!(tail_segment.read_record().unwrap().is_none());

    let empty = InMemoryEventStore::new();
    let replayed = read_all(&CachingEventReader::new(&empty, CacheOptions::new(dir.path())));
    assert_eq!(replayed, read_all(&store));
}

#[test]
fn test_read_only_mode_never_writes() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a"]);

    let reader = CachingEventReader::new(&store, CacheOptions::new(dir.path()).read_only());
    assert_eq!(read_all(&reader).len(), 1);
    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_abandoned_read_leaves_nothing_behind() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b", "c"]);

    let reader = CachingEventReader::new(&store, CacheOptions::new(dir.path()));
    let first_two: Vec<_> = reader.read_all_forwards().unwrap().take(2).collect();
    assert_eq!(first_two.len(), 2);

    assert!(file_names(dir.path()).is_empty());
}

#[test]
fn test_corrupt_segment_falls_back_to_underlying() {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("cache-00000000.gz"), b"not gzip at all").unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b"]);

    let events = read_all(&CachingEventReader::new(&store, CacheOptions::new(dir.path())));
    assert_eq!(events, read_all(&store));
    // The broken segment is left alone and nothing is stacked on top of it.
    assert_eq!(file_names(dir.path()), vec!["cache-00000000.gz"]);
}

#[test]
fn test_truncated_segment_resumes_after_last_good_record() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b", "c"]);
    let all = read_all(&store);
    let codec = store.store_position_codec();

    let mut raw = Vec::new();
    for event in &all[..2] {
        write_record(&mut raw, &codec.serialize_position(&event.position), &event.event_record).unwrap();
    }
    raw.truncate(raw.len() - 3);
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(&raw).unwrap();
    fs::write(dir.path().join("cache-00000000.gz"), encoder.finish().unwrap()).unwrap();

    let events = read_all(&CachingEventReader::new(&store, CacheOptions::new(dir.path())));
    assert_eq!(events, all);
}

#[test]
fn test_racing_readers_keep_first_segment() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b"]);

    let first = CachingEventReader::new(&store, CacheOptions::new(dir.path()));
    let second = CachingEventReader::new(&store, CacheOptions::new(dir.path()));
    let mut a = first.read_all_forwards().unwrap();
    let mut b = second.read_all_forwards().unwrap();

    assert!(a.next().is_some());
    assert!(b.next().is_some());
    assert!(b.next().is_some());
    assert!(b.next().is_none());
    assert!(a.next().is_some());
    assert!(a.next().is_none());

    assert_eq!(list_segments(dir.path(), "cache").unwrap().len(), 1);
    assert_eq!(file_names(dir.path()), vec!["cache-00000000.gz"]);
}

#[test]
fn test_custom_stem_is_respected() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a"]);

    let mut options = CacheOptions::new(dir.path().join("nested"));
    options.file_stem = "orders".to_string();
    read_all(&CachingEventReader::new(&store, options));

    assert_eq!(file_names(&dir.path().join("nested")), vec!["orders-00000000.gz"]);
}

#[test]
fn test_gap_in_segments_is_not_refilled() {
    let dir = TempDir::new().unwrap();
    let store = InMemoryEventStore::new();
    for name in ["a", "b", "c"] {
        write_events(&store, "1", &[name]);
        read_all(&CachingEventReader::new(&store, CacheOptions::new(dir.path())));
    }
    assert_eq!(list_segments(dir.path(), "cache").unwrap().len(), 3);

    fs::remove_file(dir.path().join(segment_file_name("cache", 1))).unwrap();
    write_events(&store, "1", &["d"]);

    let expected: Vec<u64> = vec![1, 2, 3, 4];
    for _ in 0..2 {
        let reader = CachingEventReader::new(&store, CacheOptions::new(dir.path()));
        let positions: Vec<u64> = read_all(&reader).into_iter().map(|e| e.position.0).collect();
        assert_eq!(positions, expected);
    }
    assert_eq!(
        file_names(dir.path()),
        vec!["cache-00000000.gz", "cache-00000002.gz"]
    );
}

#[test]
fn test_unwritable_cache_still_yields_every_event() {
    let dir = TempDir::new().unwrap();
    let not_a_directory = dir.path().join("cache-dir");
    fs::write(&not_a_directory, b"plain file").unwrap();
    let store = InMemoryEventStore::new();
    write_events(&store, "1", &["a", "b"]);
    write_events(&store, "2", &["c"]);

    let reader = CachingEventReader::new(&store, CacheOptions::new(&not_a_directory));
    assert_eq!(read_all(&reader), read_all(&store));
    assert_eq!(read_all(&reader), read_all(&store));

    assert_eq!(fs::read(&not_a_directory).unwrap(), b"plain file".to_vec());
    assert_eq!(file_names(dir.path()), vec!["cache-dir"]);
}
