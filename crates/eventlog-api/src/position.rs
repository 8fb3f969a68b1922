//! Positions and position codecs.
//!
//! A position is an opaque cursor chosen by each backend. Nothing about its
//! structure is shared between backends: serialization, parsing and ordering
//! all go through the codec of the scope the position was read from.

use crate::errors::EventStoreError;
use std::cmp::Ordering;
use std::fmt::Debug;

/// Marker for values usable as positions.
pub trait Position: Clone + Eq + Debug + Send + Sync + 'static {}

impl<T> Position for T where T: Clone + Eq + Debug + Send + Sync + 'static {}

/// Converts positions of one scope to and from strings.
///
/// For every position `p` produced by the scope,
/// `deserialize_position(&serialize_position(&p)) == Ok(p)`.
pub trait PositionCodec {
    /// Position type handled by this codec.
    type Position: Position;

    /// Renders a position in the scope's wire format.
    fn serialize_position(&self, position: &Self::Position) -> String;

    /// Parses a position from the scope's wire format.
    fn deserialize_position(&self, serialized: &str) -> Result<Self::Position, EventStoreError>;
}

/// A codec whose positions can also be ordered.
///
/// Ordering is consistent with read order: reading forwards from `p` never
/// yields an event whose position compares less than or equal to `p`.
pub trait OrderedPositionCodec: PositionCodec {
    /// Compares two positions of this scope.
    ///
    /// Implementations may still refuse particular pairs with
    /// [`EventStoreError::UnsupportedOperation`].
    fn compare_positions(
        &self,
        left: &Self::Position,
        right: &Self::Position,
    ) -> Result<Ordering, EventStoreError>;
}
