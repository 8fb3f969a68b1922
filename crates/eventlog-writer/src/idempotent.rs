//! The idempotent writer.

use crate::compatibility::{Basic, IsCompatible, WithMetadata, BASIC, WITH_METADATA};
use eventlog_api::{
    EventStoreError, EventStreamReader, EventStreamWriter, NewEvent, PositionCodec, StreamId,
    EMPTY_STREAM_EVENT_NUMBER,
};
use tracing::debug;

/// Options for idempotent writing.
#[derive(Debug, Clone, Default)]
pub struct IdempotentOptions {
    /// Give up after this many conflicting write attempts (default: unlimited).
    pub max_attempts: Option<u32>,
}

/// Writer that skips events already present in the stream.
///
/// For each write it reads the stream after `expected_version`, pairs the
/// existing events with the new batch in order and checks every pair with
/// its [`IsCompatible`] predicate. Paired events are considered written; the
/// rest of the batch is written at the advanced version. If another writer
/// got there first the whole procedure repeats from the advanced version, so
/// the racing writer's events are either absorbed or rejected.
///
/// A conflict whose current version is behind the expectation is not a race
/// and is returned to the caller unchanged.
pub struct IdempotentEventStreamWriter<W, R, C = Basic> {
    underlying: W,
    reader: R,
    is_compatible: C,
    options: IdempotentOptions,
}

impl<W, R> IdempotentEventStreamWriter<W, R, Basic> {
    /// Compares event type and data; metadata may differ.
    pub fn idempotent(underlying: W, reader: R) -> Self {
        Self::idempotent_with(underlying, reader, BASIC)
    }
}

impl<W, R> IdempotentEventStreamWriter<W, R, WithMetadata> {
    /// Compares event type, data and metadata.
    pub fn idempotent_with_metadata_check(underlying: W, reader: R) -> Self {
        Self::idempotent_with(underlying, reader, WITH_METADATA)
    }
}

impl<W, R, C> IdempotentEventStreamWriter<W, R, C> {
    /// Uses a caller-supplied compatibility predicate.
    pub fn idempotent_with(underlying: W, reader: R, is_compatible: C) -> Self {
        Self {
            underlying,
            reader,
            is_compatible,
            options: IdempotentOptions::default(),
        }
    }

    /// Replaces the retry options.
    pub fn with_options(mut self, options: IdempotentOptions) -> Self {
        self.options = options;
        self
    }
}

impl<W, R, C> IdempotentEventStreamWriter<W, R, C>
where
    R: EventStreamReader,
    C: IsCompatible,
{
    /// Counts how many leading events of `events` are already in the stream.
    fn already_written(
        &self,
        stream_id: &StreamId,
        events: &[NewEvent],
        expected_version: i64,
    ) -> Result<usize, EventStoreError> {
        let existing = match self.reader.read_stream_forwards_from(stream_id, expected_version) {
            Ok(existing) => existing,
            Err(EventStoreError::NoSuchStream(_)) => return Ok(0),
            Err(e) => return Err(e),
        };

        let mut paired = 0;
        for (new, current) in events.iter().zip(existing) {
            let current = current?;
            if let Err(reason) = self.is_compatible.check(&current.event_record, new) {
                let codec = self.reader.stream_position_codec();
                return Err(EventStoreError::IncompatibleWrite {
                    position: codec.serialize_position(&current.position),
                    reason,
                    current: Box::new(current.event_record),
                    new: Box::new(new.clone()),
                });
            }
            paired += 1;
        }
        Ok(paired)
    }
}

impl<W, R, C> EventStreamWriter for IdempotentEventStreamWriter<W, R, C>
where
    W: EventStreamWriter,
    R: EventStreamReader,
    C: IsCompatible,
{
    fn write(
        &self,
        stream_id: &StreamId,
        events: &[NewEvent],
        expected_version: i64,
    ) -> Result<(), EventStoreError> {
        let mut remaining = events;
        let mut expected = expected_version;
        let mut attempts = 0u32;

        loop {
            let paired = self.already_written(stream_id, remaining, expected)?;
            remaining = &remaining[paired..];
            expected += paired as i64;
            if remaining.is_empty() {
                return Ok(());
            }

            attempts += 1;
            match self.underlying.write(stream_id, remaining, expected) {
                Ok(()) => return Ok(()),
                Err(EventStoreError::WrongExpectedVersion { current, expected: tried })
                    if current > tried =>
                {
                    if let Some(max) = self.options.max_attempts {
                        if attempts >= max {
                            return Err(EventStoreError::RetriesExhausted {
                                stream_id: stream_id.clone(),
                                attempts,
                            });
                        }
                    }
                    debug!(
                        stream = %stream_id,
                        current,
                        expected = tried,
                        attempts,
                        "stream moved on during write, retrying"
                    );
                }
                Err(e) => return Err(e),
            }
        }
    }

    fn append(&self, stream_id: &StreamId, events: &[NewEvent]) -> Result<(), EventStoreError> {
        self.write(stream_id, events, EMPTY_STREAM_EVENT_NUMBER)
    }
}
