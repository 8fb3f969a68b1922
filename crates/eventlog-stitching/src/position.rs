//! Stitched positions and their codec.

use eventlog_api::{EventStoreError, OrderedPositionCodec, PositionCodec};
use std::cmp::Ordering;

/// Separator between the two halves of a serialized [`StitchedPosition`].
pub const STITCH_SEPARATOR: &str = "~~~";

/// A position in a stitched source: one component per underlying source.
///
/// While reading the backfill the live component stays at the cutover
/// position; once the backfill is exhausted the backfill component stays at
/// the last backfill event. Positions order by backfill component first.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StitchedPosition<B, L> {
    /// Position within the backfill source.
    pub backfill: B,
    /// Position within the live source.
    pub live: L,
}

impl<B, L: PartialEq> StitchedPosition<B, L> {
    /// Combines a backfill and a live position.
    pub fn new(backfill: B, live: L) -> Self {
        Self { backfill, live }
    }

    /// True while the live component still sits at `live_cutoff_start_position`.
    pub fn is_in_backfill(&self, live_cutoff_start_position: &L) -> bool {
        self.live == *live_cutoff_start_position
    }
}

/// Serializes stitched positions as `<backfill>~~~<live>`.
#[derive(Debug, Clone)]
pub struct StitchedPositionCodec<BC, LC> {
    backfill: BC,
    live: LC,
}

impl<BC, LC> StitchedPositionCodec<BC, LC> {
    /// Combines the codecs of the two sources.
    pub fn new(backfill: BC, live: LC) -> Self {
        Self { backfill, live }
    }

    /// Codec of the backfill component.
    pub fn backfill_codec(&self) -> &BC {
        &self.backfill
    }

    /// Codec of the live component.
    pub fn live_codec(&self) -> &LC {
        &self.live
    }
}

/// Splits a serialized stitched position into its two halves.
pub(crate) fn split_stitched(serialized: &str) -> Result<Option<(&str, &str)>, EventStoreError> {
    let mut parts = serialized.split(STITCH_SEPARATOR);
    match (parts.next(), parts.next(), parts.next()) {
        (Some(_), None, _) => Ok(None),
        (Some(backfill), Some(live), None) => Ok(Some((backfill, live))),
        _ => Err(EventStoreError::InvalidPosition(format!(
            "Cannot handle nested stitch separators for position {}",
            serialized
        ))),
    }
}

impl<BC, LC> PositionCodec for StitchedPositionCodec<BC, LC>
where
    BC: PositionCodec,
    LC: PositionCodec,
{
    type Position = StitchedPosition<BC::Position, LC::Position>;

    fn serialize_position(&self, position: &Self::Position) -> String {
        format!(
            "{}{}{}",
            self.backfill.serialize_position(&position.backfill),
            STITCH_SEPARATOR,
            self.live.serialize_position(&position.live)
        )
    }

    fn deserialize_position(&self, serialized: &str) -> Result<Self::Position, EventStoreError> {
        let (backfill, live) = split_stitched(serialized)?.ok_or_else(|| {
            EventStoreError::InvalidPosition(format!(
                "missing stitch separator in position {}",
                serialized
            ))
        })?;
        Ok(StitchedPosition::new(
            self.backfill.deserialize_position(backfill)?,
            self.live.deserialize_position(live)?,
        ))
    }
}

impl<BC, LC> OrderedPositionCodec for StitchedPositionCodec<BC, LC>
where
    BC: OrderedPositionCodec,
    LC: OrderedPositionCodec,
{
    fn compare_positions(
        &self,
        left: &Self::Position,
        right: &Self::Position,
    ) -> Result<Ordering, EventStoreError> {
        match self.backfill.compare_positions(&left.backfill, &right.backfill)? {
            Ordering::Equal => self.live.compare_positions(&left.live, &right.live),
            ordering => Ok(ordering),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eventlog_memory::{InMemoryPosition, InMemoryPositionCodec};
    use proptest::prelude::*;

    fn codec() -> StitchedPositionCodec<InMemoryPositionCodec, InMemoryPositionCodec> {
        StitchedPositionCodec::new(InMemoryPositionCodec, InMemoryPositionCodec)
    }

    fn pos(backfill: u64, live: u64) -> StitchedPosition<InMemoryPosition, InMemoryPosition> {
        StitchedPosition::new(InMemoryPosition(backfill), InMemoryPosition(live))
    }

    #[test]
    fn test_serializes_with_separator() {
        assert_eq!(codec().serialize_position(&pos(10, 30)), "10~~~30");
        assert_eq!(codec().deserialize_position("10~~~30").unwrap(), pos(10, 30));
    }

    #[test]
    fn test_rejects_nested_and_missing_separators() {
        let nested = codec().deserialize_position("1~~~2~~~3").unwrap_err();
        assert_eq!(
            nested.to_string(),
            "invalid position: Cannot handle nested stitch separators for position 1~~~2~~~3"
        );
        assert!(matches!(
            codec().deserialize_position("30"),
            Err(EventStoreError::InvalidPosition(_))
        ));
    }

    #[test]
    fn test_orders_backfill_first() {
        let c = codec();
        assert_eq!(c.compare_positions(&pos(1, 9), &pos(2, 0)).unwrap(), Ordering::Less);
        assert_eq!(c.compare_positions(&pos(3, 5), &pos(3, 6)).unwrap(), Ordering::Less);
        assert_eq!(c.compare_positions(&pos(3, 6), &pos(3, 6)).unwrap(), Ordering::Equal);
    }

    #[test]
    fn test_in_backfill_when_live_at_cutoff() {
        assert!(pos(3, 20).is_in_backfill(&InMemoryPosition(20)));
        assert!(!pos(3, 21).is_in_backfill(&InMemoryPosition(20)));
    }

    proptest! {
        #[test]
        fn prop_round_trip(b in any::<u64>(), l in any::<u64>()) {
            let c = codec();
            prop_assert_eq!(c.deserialize_position(&c.serialize_position(&pos(b, l))).unwrap(), pos(b, l));
        }
    }
}
