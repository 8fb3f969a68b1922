//! Caching decorator for [`EventReader`]s.

use crate::errors::CacheError;
use crate::reader::CacheFileReader;
use crate::segments::{scan_segments, segment_file_name, SegmentScan, DEFAULT_FILE_STEM};
use crate::writer::{CacheFileWriter, FinishOutcome, WriteOptions};
use eventlog_api::{EventReader, EventStoreError, EventStream, PositionCodec, ResolvedEvent};
use flate2::Compression;
use std::collections::VecDeque;
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Whether reads add to the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CacheMode {
    /// Replay the cache, then write the underlying tail through to a new segment.
    #[default]
    ReadWrite,
    /// Replay the cache, then read the tail without caching it.
    ReadOnly,
}

/// Configuration for a [`CachingEventReader`].
#[derive(Debug, Clone)]
pub struct CacheOptions {
    /// Directory holding the cache segments.
    pub directory: PathBuf,
    /// File stem of segment names (default: `cache`).
    pub file_stem: String,
    /// Read-write or read-only (default: read-write).
    pub mode: CacheMode,
    /// Gzip level for new segments.
    pub compression: Compression,
    /// Whether to fsync new segments before moving them into place (default: false).
    pub sync: bool,
}

impl CacheOptions {
    /// Read-write cache in `directory` with default settings.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            file_stem: DEFAULT_FILE_STEM.to_string(),
            mode: CacheMode::ReadWrite,
            compression: Compression::default(),
            sync: false,
        }
    }

    /// Same options in read-only mode.
    pub fn read_only(mut self) -> Self {
        self.mode = CacheMode::ReadOnly;
        self
    }

    fn write_options(&self) -> WriteOptions {
        WriteOptions {
            compression: self.compression,
            sync: self.sync,
        }
    }
}

/// Reader that keeps a local copy of everything it has read from the start.
///
/// A read from the empty store position first replays the cache segments,
/// then continues from the underlying reader just after the last cached
/// position. In [`CacheMode::ReadWrite`] the events of that tail are written
/// to a new segment as they are yielded; when the tail is exhausted the
/// segment is moved into place unless another reader already wrote it.
///
/// A read from any other position goes straight to the underlying reader.
///
/// A damaged or undecodable segment is never fatal: it is logged, the
/// remaining segments are skipped, and the underlying reader takes over from
/// the last event that was read successfully. Nothing is written through
/// during such a read.
pub struct CachingEventReader<R> {
    underlying: R,
    options: CacheOptions,
}

impl<R: EventReader> CachingEventReader<R> {
    /// Wraps `underlying` with the cache described by `options`.
    pub fn new(underlying: R, options: CacheOptions) -> Self {
        Self {
            underlying,
            options,
        }
    }

    /// The wrapped reader.
    pub fn underlying(&self) -> &R {
        &self.underlying
    }

    /// The cache configuration.
    pub fn options(&self) -> &CacheOptions {
        &self.options
    }

    fn read_through_cache(&self) -> EventStream<'_, R::Position> {
        let directory = &self.options.directory;
        let scan = match scan_segments(directory, &self.options.file_stem) {
            Ok(scan) => scan,
            Err(e) => {
                warn!(
                    directory = %directory.display(),
                    error = %e,
                    "cannot list cache segments, reading without cache"
                );
                SegmentScan::default()
            }
        };
        let mut writing = self.options.mode == CacheMode::ReadWrite;
        if writing && !scan.stranded.is_empty() {
            // The next index must never fall inside a gap with segments beyond it.
            warn!(
                directory = %directory.display(),
                stranded = scan.stranded.len(),
                "cache segments after a gap, not writing through"
            );
            writing = false;
        }
        debug!(
            directory = %directory.display(),
            segments = scan.replayable.len(),
            "reading through cache"
        );

        Box::new(CachedEvents {
            owner: self,
            codec: self.underlying.store_position_codec(),
            next_segment_index: scan.next_index(),
            segments: scan.replayable.into(),
            current: None,
            last_position: self.underlying.empty_store_position(),
            writing,
            phase: Phase::Cache,
            sink: None,
        })
    }
}

impl<R: EventReader> EventReader for CachingEventReader<R> {
    type Position = R::Position;
    type Codec = R::Codec;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &R::Position,
    ) -> Result<EventStream<'_, R::Position>, EventStoreError> {
        if *position_exclusive == self.underlying.empty_store_position() {
            Ok(self.read_through_cache())
        } else {
            self.underlying.read_all_forwards_from(position_exclusive)
        }
    }

    fn empty_store_position(&self) -> R::Position {
        self.underlying.empty_store_position()
    }

    fn store_position_codec(&self) -> R::Codec {
        self.underlying.store_position_codec()
    }
}

enum Phase<'a, P> {
    Cache,
    Tail(EventStream<'a, P>),
    Done,
}

struct CachedEvents<'a, R: EventReader> {
    owner: &'a CachingEventReader<R>,
    codec: R::Codec,
    segments: VecDeque<PathBuf>,
    next_segment_index: u32,
    current: Option<CacheFileReader>,
    last_position: R::Position,
    writing: bool,
    phase: Phase<'a, R::Position>,
    sink: Option<CacheFileWriter>,
}

impl<'a, R: EventReader> CachedEvents<'a, R> {
    /// Next event from the cache segments, or `None` once they are used up.
    fn next_cached(&mut self) -> Option<ResolvedEvent<R::Position>> {
        loop {
            if self.current.is_none() {
                let path = self.segments.pop_front()?;
                match CacheFileReader::open(&path) {
                    Ok(reader) => self.current = Some(reader),
                    Err(e) => {
                        self.abandon_cache(&path, e);
                        return None;
                    }
                }
            }
            let reader = self.current.as_mut()?;
            match reader.read_record() {
                Ok(Some(cached)) => match self.codec.deserialize_position(&cached.position) {
                    Ok(position) => {
                        self.last_position = position.clone();
                        return Some(ResolvedEvent::new(position, cached.record));
                    }
                    Err(e) => {
                        let path = reader.path().to_path_buf();
                        self.abandon_cache(
                            &path,
                            CacheError::Position {
                                position: cached.position,
                                reason: e.to_string(),
                            },
                        );
                        return None;
                    }
                },
                Ok(None) => {
                    debug!(
                        path = %reader.path().display(),
                        records = reader.records_read(),
                        "cache segment exhausted"
                    );
                    self.current = None;
                }
                Err(e) => {
                    let path = reader.path().to_path_buf();
                    self.abandon_cache(&path, e);
                    return None;
                }
            }
        }
    }

    fn abandon_cache(&mut self, path: &std::path::Path, error: CacheError) {
        warn!(
            path = %path.display(),
            error = %error,
            "unreadable cache segment, continuing from underlying reader"
        );
        self.current = None;
        self.segments.clear();
        self.writing = false;
    }

    fn cache_event(&mut self, event: &ResolvedEvent<R::Position>) {
        if !self.writing {
            return;
        }
        if self.sink.is_none() {
            let options = &self.owner.options;
            let destination = options
                .directory
                .join(segment_file_name(&options.file_stem, self.next_segment_index));
            match CacheFileWriter::create(&destination, &options.file_stem, &options.write_options()) {
                Ok(sink) => self.sink = Some(sink),
                Err(e) => {
                    self.stop_writing(e);
                    return;
                }
            }
        }
        let position = self.codec.serialize_position(&event.position);
        if let Some(sink) = self.sink.as_mut() {
            if let Err(e) = sink.append(&position, &event.event_record) {
                self.stop_writing(e);
            }
        }
    }

    fn stop_writing(&mut self, error: CacheError) {
        warn!(
            directory = %self.owner.options.directory.display(),
            error = %error,
            "cannot write cache segment, continuing without caching"
        );
        self.sink = None;
        self.writing = false;
    }

    fn finish_segment(&mut self) {
        let Some(sink) = self.sink.take() else { return };
        let records = sink.records_written();
        match sink.finish() {
            Ok(FinishOutcome::Persisted(path)) => {
                info!(path = %path.display(), records, "cache segment written");
            }
            Ok(FinishOutcome::AlreadyPresent(_)) => {}
            Err(e) => warn!(error = %e, "cannot finish cache segment"),
        }
    }
}

impl<'a, R: EventReader> Iterator for CachedEvents<'a, R> {
    type Item = Result<ResolvedEvent<R::Position>, EventStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Phase::Cache = self.phase {
            if let Some(event) = self.next_cached() {
                return Some(Ok(event));
            }
            debug!(
                position = %self.codec.serialize_position(&self.last_position),
                "cache exhausted, reading from underlying reader"
            );
            match self.owner.underlying.read_all_forwards_from(&self.last_position) {
                Ok(tail) => self.phase = Phase::Tail(tail),
                Err(e) => {
                    self.phase = Phase::Done;
                    return Some(Err(e));
                }
            }
        }

        let Phase::Tail(tail) = &mut self.phase else {
            return None;
        };
        match tail.next() {
            Some(Ok(event)) => {
                self.cache_event(&event);
                Some(Ok(event))
            }
            Some(Err(e)) => {
                // The tail may skip events after an error; do not cache it.
                self.sink = None;
                self.writing = false;
                Some(Err(e))
            }
            None => {
                self.phase = Phase::Done;
                self.finish_segment();
                None
            }
        }
    }
}
