//! Position codecs for moving consumers from a stitched source to its live source.
//!
//! Consumers persist serialized positions. During the expand phase they may
//! hold either stitched positions or plain live positions; during the
//! migrate phase they read the live source directly but may still hold
//! stitched positions saved before the switch.

use crate::position::{split_stitched, StitchedPosition, StitchedPositionCodec};
use crate::source::BackfillStitchingEventSource;
use eventlog_api::{EventReader, EventStoreError, OrderedPositionCodec, PositionCodec};
use std::cmp::Ordering;

/// A codec that accepts both stitched and live positions.
///
/// The phase parameter decides which position type it produces: [`Expand`]
/// produces stitched positions, [`Migrate`] produces live ones. Ordering only
/// looks at the live component.
#[derive(Debug, Clone)]
pub struct BackfillParallelChangeCodec<P> {
    phase: P,
}

impl<P> BackfillParallelChangeCodec<P> {
    /// The current phase and its state.
    pub fn phase(&self) -> &P {
        &self.phase
    }
}

/// Expand phase: still reading the stitched source.
#[derive(Debug, Clone)]
pub struct Expand<BC: PositionCodec, LC: PositionCodec> {
    stitched: StitchedPositionCodec<BC, LC>,
    backfill_end: BC::Position,
    live_cutoff_start_position: LC::Position,
}

impl<BC: PositionCodec, LC: PositionCodec> Expand<BC, LC> {
    /// Backfill position given to plain live positions.
    pub fn backfill_end(&self) -> &BC::Position {
        &self.backfill_end
    }
}

/// Migrate phase: reading the live source directly.
#[derive(Debug, Clone)]
pub struct Migrate<LC: PositionCodec> {
    live: LC,
    live_cutoff_start_position: LC::Position,
}

impl<BC: PositionCodec, LC: PositionCodec> BackfillParallelChangeCodec<Expand<BC, LC>> {
    /// Codec for consumers of `source` that may hold plain live positions.
    ///
    /// `backfill_end` is the position of the last backfill event; plain live
    /// positions are read as if the whole backfill had been consumed.
    pub fn expanding<B, L>(
        source: &BackfillStitchingEventSource<B, L>,
        backfill_end: BC::Position,
    ) -> Self
    where
        B: EventReader<Position = BC::Position, Codec = BC>,
        L: EventReader<Position = LC::Position, Codec = LC>,
    {
        Self {
            phase: Expand {
                stitched: source.store_position_codec(),
                backfill_end,
                live_cutoff_start_position: source.live_cutoff_start_position().clone(),
            },
        }
    }
}

impl<LC: PositionCodec> BackfillParallelChangeCodec<Migrate<LC>> {
    /// Codec for consumers of `live` that may hold stitched positions.
    pub fn migrating<L>(live: &L, live_cutoff_start_position: LC::Position) -> Self
    where
        L: EventReader<Position = LC::Position, Codec = LC>,
    {
        Self {
            phase: Migrate {
                live: live.store_position_codec(),
                live_cutoff_start_position,
            },
        }
    }
}

impl<BC: PositionCodec, LC: PositionCodec> PositionCodec
    for BackfillParallelChangeCodec<Expand<BC, LC>>
{
    type Position = StitchedPosition<BC::Position, LC::Position>;

    fn serialize_position(&self, position: &Self::Position) -> String {
        self.phase.stitched.serialize_position(position)
    }

    fn deserialize_position(&self, serialized: &str) -> Result<Self::Position, EventStoreError> {
        match split_stitched(serialized)? {
            Some(_) => self.phase.stitched.deserialize_position(serialized),
            None => Ok(StitchedPosition::new(
                self.phase.backfill_end.clone(),
                self.phase.stitched.live_codec().deserialize_position(serialized)?,
            )),
        }
    }
}

impl<BC: PositionCodec, LC: OrderedPositionCodec> OrderedPositionCodec
    for BackfillParallelChangeCodec<Expand<BC, LC>>
{
    fn compare_positions(
        &self,
        left: &Self::Position,
        right: &Self::Position,
    ) -> Result<Ordering, EventStoreError> {
        let cutoff = &self.phase.live_cutoff_start_position;
        if left.is_in_backfill(cutoff) && right.is_in_backfill(cutoff) {
            return Err(EventStoreError::UnsupportedOperation(
                "Cannot compare two positions in backfill".to_string(),
            ));
        }
        self.phase.stitched.live_codec().compare_positions(&left.live, &right.live)
    }
}

impl<LC: PositionCodec> PositionCodec for BackfillParallelChangeCodec<Migrate<LC>> {
    type Position = LC::Position;

    fn serialize_position(&self, position: &Self::Position) -> String {
        self.phase.live.serialize_position(position)
    }

    fn deserialize_position(&self, serialized: &str) -> Result<Self::Position, EventStoreError> {
        match split_stitched(serialized)? {
            None => self.phase.live.deserialize_position(serialized),
            Some((_, live)) => {
                let position = self.phase.live.deserialize_position(live)?;
                if position == self.phase.live_cutoff_start_position {
                    return Err(EventStoreError::IllegalState(
                        "Cannot handle positions in the backfill".to_string(),
                    ));
                }
                Ok(position)
            }
        }
    }
}

impl<LC: OrderedPositionCodec> OrderedPositionCodec for BackfillParallelChangeCodec<Migrate<LC>> {
    fn compare_positions(
        &self,
        left: &Self::Position,
        right: &Self::Position,
    ) -> Result<Ordering, EventStoreError> {
        self.phase.live.compare_positions(left, right)
    }
}
