//! Binary record encoding.
//!
//! Each record is, in order:
//!
//! | Field | Encoding |
//! |-------|----------|
//! | position | string |
//! | timestamp | i64, milliseconds since the Unix epoch |
//! | category | string |
//! | stream id | string |
//! | event number | i64 |
//! | event type | string |
//! | data | i32 length + bytes |
//! | metadata | i32 length + bytes |
//!
//! Strings are a u16 byte length followed by UTF-8. All integers are
//! big-endian. Records follow each other with no framing or index; a file is
//! read front to back until it ends cleanly at a record boundary.

use crate::errors::CacheError;
use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use chrono::{TimeZone, Utc};
use eventlog_api::{EventRecord, StreamId};
use std::io::{self, Read, Write};

/// Longest string a record can hold, in bytes.
pub const MAX_STRING_LEN: usize = u16::MAX as usize;

/// A decoded record whose position is still in serialized form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CachedRecord {
    /// Serialized position, decoded by the reader's codec.
    pub position: String,
    /// The stored event.
    pub record: EventRecord,
}

/// Appends one record to `output`.
pub fn write_record<W: Write>(
    output: &mut W,
    position: &str,
    record: &EventRecord,
) -> Result<(), CacheError> {
    write_string(output, "position", position)?;
    output.write_i64::<BigEndian>(record.timestamp.timestamp_millis())?;
    write_string(output, "category", record.stream_id.category())?;
    write_string(output, "stream id", record.stream_id.id())?;
    output.write_i64::<BigEndian>(record.event_number)?;
    write_string(output, "event type", &record.event_type)?;
    write_bytes(output, "data", &record.data)?;
    write_bytes(output, "metadata", &record.metadata)?;
    Ok(())
}

/// Reads the next record from `input`.
///
/// Returns `Ok(None)` when the input ends exactly at a record boundary and
/// [`CacheError::Truncated`] when it ends inside a record.
pub fn read_record<R: Read>(input: &mut R) -> Result<Option<CachedRecord>, CacheError> {
    let mut prefix = [0u8; 2];
    if !fill_or_eof(input, &mut prefix)? {
        return Ok(None);
    }
    let position = read_string_body(input, "position", u16::from_be_bytes(prefix))?;

    let millis = read_i64(input, "timestamp")?;
    let timestamp = Utc
        .timestamp_millis_opt(millis)
        .single()
        .ok_or(CacheError::InvalidTimestamp(millis))?;
    let category = read_string(input, "category")?;
    let id = read_string(input, "stream id")?;
    let stream_id =
        StreamId::new(category, id).map_err(|e| CacheError::InvalidStreamId(e.to_string()))?;
    let event_number = read_i64(input, "event number")?;
    let event_type = read_string(input, "event type")?;
    let data = read_bytes(input, "data")?;
    let metadata = read_bytes(input, "metadata")?;

    Ok(Some(CachedRecord {
        position,
        record: EventRecord {
            timestamp,
            stream_id,
            event_number,
            event_type,
            data,
            metadata,
        },
    }))
}

/// Fills `buf`, or returns `false` if the input was already at its end.
fn fill_or_eof<R: Read>(input: &mut R, buf: &mut [u8]) -> Result<bool, CacheError> {
    let mut filled = 0;
    while filled < buf.len() {
        match input.read(&mut buf[filled..]) {
            Ok(0) if filled == 0 => return Ok(false),
            Ok(0) => return Err(CacheError::Truncated { field: "position" }),
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e.into()),
        }
    }
    Ok(true)
}

fn truncated(field: &'static str) -> impl FnOnce(io::Error) -> CacheError {
    move |e| {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            CacheError::Truncated { field }
        } else {
            CacheError::Io(e)
        }
    }
}

fn write_string<W: Write>(output: &mut W, field: &'static str, value: &str) -> Result<(), CacheError> {
    let len = u16::try_from(value.len()).map_err(|_| CacheError::FieldTooLarge {
        field,
        len: value.len(),
        max: MAX_STRING_LEN,
    })?;
    output.write_u16::<BigEndian>(len)?;
    output.write_all(value.as_bytes())?;
    Ok(())
}

fn write_bytes<W: Write>(output: &mut W, field: &'static str, value: &[u8]) -> Result<(), CacheError> {
    let len = i32::try_from(value.len()).map_err(|_| CacheError::FieldTooLarge {
        field,
        len: value.len(),
        max: i32::MAX as usize,
    })?;
    output.write_i32::<BigEndian>(len)?;
    output.write_all(value)?;
    Ok(())
}

fn read_i64<R: Read>(input: &mut R, field: &'static str) -> Result<i64, CacheError> {
    input.read_i64::<BigEndian>().map_err(truncated(field))
}

fn read_string<R: Read>(input: &mut R, field: &'static str) -> Result<String, CacheError> {
    let len = input.read_u16::<BigEndian>().map_err(truncated(field))?;
    read_string_body(input, field, len)
}

fn read_string_body<R: Read>(input: &mut R, field: &'static str, len: u16) -> Result<String, CacheError> {
    let mut buf = vec![0u8; len as usize];
    input.read_exact(&mut buf).map_err(truncated(field))?;
    String::from_utf8(buf).map_err(|_| CacheError::InvalidUtf8 { field })
}

fn read_bytes<R: Read>(input: &mut R, field: &'static str) -> Result<Vec<u8>, CacheError> {
    let len = input.read_i32::<BigEndian>().map_err(truncated(field))?;
    if len < 0 {
        return Err(CacheError::NegativeLength { field, len });
    }
    // Grow as data arrives rather than trusting the prefix for the allocation.
    let mut buf = Vec::new();
    input.take(len as u64).read_to_end(&mut buf)?;
    if buf.len() != len as usize {
        return Err(CacheError::Truncated { field });
    }
    Ok(buf)
}
