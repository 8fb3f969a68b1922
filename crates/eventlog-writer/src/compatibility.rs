//! Compatibility predicates.
//!
//! A predicate decides whether an event already in a stream and a new event
//! being written at the same slot are the same logical event. It returns
//! `Err(reason)` when they differ.

use eventlog_api::{EventRecord, NewEvent};

/// Judges whether an existing event and a new event are the same.
pub trait IsCompatible {
    /// Returns `Err` with a human-readable reason if the events differ.
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String>;

    /// Requires both `self` and `other` to accept a pair.
    fn and<O: IsCompatible>(self, other: O) -> And<Self, O>
    where
        Self: Sized,
    {
        And(self, other)
    }
}

impl<F> IsCompatible for F
where
    F: Fn(&EventRecord, &NewEvent) -> Result<(), String>,
{
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        self(current, new)
    }
}

/// Both predicates must accept, checked left to right.
#[derive(Debug, Clone, Copy, Default)]
pub struct And<A, B>(pub A, pub B);

impl<A: IsCompatible, B: IsCompatible> IsCompatible for And<A, B> {
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        self.0.check(current, new)?;
        self.1.check(current, new)
    }
}

fn types_differ(current: &EventRecord, new: &NewEvent) -> String {
    format!(
        "Event types don't match -- old: {}, new: {} (bodies old: {}, new {})",
        current.event_type,
        new.event_type,
        String::from_utf8_lossy(&current.data),
        String::from_utf8_lossy(&new.data)
    )
}

fn bodies_differ(current: &EventRecord, new: &NewEvent) -> String {
    format!(
        "Event bodies don't match -- old: {}, new: {} (type {})",
        String::from_utf8_lossy(&current.data),
        String::from_utf8_lossy(&new.data),
        current.event_type
    )
}

fn metadata_differs(current: &EventRecord, new: &NewEvent) -> String {
    format!(
        "Event metadata doesn't match -- old: {}, new: {}",
        String::from_utf8_lossy(&current.metadata),
        String::from_utf8_lossy(&new.metadata)
    )
}

/// Event types must be equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByEventType;

impl IsCompatible for ByEventType {
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        if current.event_type == new.event_type {
            Ok(())
        } else {
            Err(types_differ(current, new))
        }
    }
}

/// Event data must be byte-for-byte equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByData;

impl IsCompatible for ByData {
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        if current.data == new.data {
            Ok(())
        } else {
            Err(bodies_differ(current, new))
        }
    }
}

/// Event metadata must be byte-for-byte equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct ByMetadata;

impl IsCompatible for ByMetadata {
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        if current.metadata == new.metadata {
            Ok(())
        } else {
            Err(metadata_differs(current, new))
        }
    }
}

/// Event types are accepted by a custom comparison `(old, new)`.
#[derive(Debug, Clone, Copy)]
pub struct ComparingEventType<F>(pub F);

impl<F: Fn(&str, &str) -> bool> IsCompatible for ComparingEventType<F> {
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        if (self.0)(&current.event_type, &new.event_type) {
            Ok(())
        } else {
            Err(types_differ(current, new))
        }
    }
}

/// Event data is accepted by a custom comparison `(old, new)`.
#[derive(Debug, Clone, Copy)]
pub struct ComparingData<F>(pub F);

impl<F: Fn(&[u8], &[u8]) -> bool> IsCompatible for ComparingData<F> {
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        if (self.0)(&current.data, &new.data) {
            Ok(())
        } else {
            Err(bodies_differ(current, new))
        }
    }
}

/// Event metadata is accepted by a custom comparison `(old, new)`.
#[derive(Debug, Clone, Copy)]
pub struct ComparingMetadata<F>(pub F);

impl<F: Fn(&[u8], &[u8]) -> bool> IsCompatible for ComparingMetadata<F> {
    fn check(&self, current: &EventRecord, new: &NewEvent) -> Result<(), String> {
        if (self.0)(&current.metadata, &new.metadata) {
            Ok(())
        } else {
            Err(metadata_differs(current, new))
        }
    }
}

/// Compares event types with `compare(old, new)`.
pub fn by_comparing_event_type<F>(compare: F) -> ComparingEventType<F>
where
    F: Fn(&str, &str) -> bool,
{
    ComparingEventType(compare)
}

/// Compares event data with `compare(old, new)`.
pub fn by_comparing_data<F>(compare: F) -> ComparingData<F>
where
    F: Fn(&[u8], &[u8]) -> bool,
{
    ComparingData(compare)
}

/// Compares event metadata with `compare(old, new)`.
pub fn by_comparing_metadata<F>(compare: F) -> ComparingMetadata<F>
where
    F: Fn(&[u8], &[u8]) -> bool,
{
    ComparingMetadata(compare)
}

/// Type and data must match; metadata is ignored.
pub type Basic = And<ByEventType, ByData>;

/// Type, data and metadata must all match.
pub type WithMetadata = And<Basic, ByMetadata>;

/// The default predicate.
pub const BASIC: Basic = And(ByEventType, ByData);

/// The strict predicate.
pub const WITH_METADATA: WithMetadata = And(BASIC, ByMetadata);
