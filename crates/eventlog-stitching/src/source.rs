//! The stitched event source and category reader.

use crate::position::{StitchedPosition, StitchedPositionCodec};
use crate::splice::StitchedEvents;
use eventlog_api::{EventCategoryReader, EventReader, EventStoreError, EventStream};
use tracing::debug;

type StitchedStream<'a, BP, LP> = EventStream<'a, StitchedPosition<BP, LP>>;

/// One logical source built from a frozen backfill and an ongoing live source.
///
/// `live_cutoff_start_position` is the live position after which live events
/// are authoritative. A read that starts in the backfill (live component at
/// the cutoff) yields the rest of the backfill and then every live event
/// after the cutoff. A read that starts past the cutoff only touches the
/// live source.
///
/// Category reads are available when both sources use their store positions
/// for categories too, and share the same cutoff.
///
/// # Example
///
/// ```rust
/// use eventlog_api::{EventReader, EventStreamWriter, NewEvent, StreamId};
/// use eventlog_memory::{InMemoryEventStore, InMemoryPosition};
/// use eventlog_stitching::BackfillStitchingEventSource;
///
/// let backfill = InMemoryEventStore::new();
/// let live = InMemoryEventStore::new();
/// let stream = StreamId::new("orders", "1")?;
/// backfill.append(&stream, &[NewEvent::without_metadata("Old", "")])?;
/// live.append(&stream, &[NewEvent::without_metadata("Copied", "")])?;
/// live.append(&stream, &[NewEvent::without_metadata("New", "")])?;
///
/// let stitched = BackfillStitchingEventSource::new(&backfill, &live, InMemoryPosition(1));
/// let types: Vec<_> = stitched
///     .read_all_forwards()?
///     .map(|e| e.map(|e| e.event_record.event_type))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(types, vec!["Old", "New"]);
/// # Ok::<(), eventlog_api::EventStoreError>(())
/// ```
pub struct BackfillStitchingEventSource<B: EventReader, L: EventReader> {
    backfill: B,
    live: L,
    live_cutoff_start_position: L::Position,
}

impl<B: EventReader, L: EventReader> BackfillStitchingEventSource<B, L> {
    /// Stitches `backfill` and `live` at `live_cutoff_start_position`.
    pub fn new(backfill: B, live: L, live_cutoff_start_position: L::Position) -> Self {
        Self {
            backfill,
            live,
            live_cutoff_start_position,
        }
    }

    /// The backfill source.
    pub fn backfill(&self) -> &B {
        &self.backfill
    }

    /// The live source.
    pub fn live(&self) -> &L {
        &self.live
    }

    /// Live position at which the backfill stops being authoritative.
    pub fn live_cutoff_start_position(&self) -> &L::Position {
        &self.live_cutoff_start_position
    }
}

impl<B: EventReader, L: EventReader> EventReader for BackfillStitchingEventSource<B, L> {
    type Position = StitchedPosition<B::Position, L::Position>;
    type Codec = StitchedPositionCodec<B::Codec, L::Codec>;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &Self::Position,
    ) -> Result<StitchedStream<'_, B::Position, L::Position>, EventStoreError> {
        let backfill = if position_exclusive.is_in_backfill(&self.live_cutoff_start_position) {
            debug!("stitched read starting in backfill");
            Some(self.backfill.read_all_forwards_from(&position_exclusive.backfill)?)
        } else {
            None
        };
        let live = self.live.read_all_forwards_from(&position_exclusive.live)?;
        Ok(StitchedEvents::new(backfill, live, position_exclusive.clone()).boxed())
    }

    fn empty_store_position(&self) -> Self::Position {
        StitchedPosition::new(
            self.backfill.empty_store_position(),
            self.live_cutoff_start_position.clone(),
        )
    }

    fn store_position_codec(&self) -> Self::Codec {
        StitchedPositionCodec::new(
            self.backfill.store_position_codec(),
            self.live.store_position_codec(),
        )
    }
}

impl<B, L> EventCategoryReader for BackfillStitchingEventSource<B, L>
where
    B: EventReader + EventCategoryReader<CategoryPosition = <B as EventReader>::Position>,
    L: EventReader + EventCategoryReader<CategoryPosition = <L as EventReader>::Position>,
{
    type CategoryPosition = StitchedPosition<B::CategoryPosition, L::CategoryPosition>;
    type CategoryCodec = StitchedPositionCodec<B::CategoryCodec, L::CategoryCodec>;

    fn read_category_forwards_from(
        &self,
        category: &str,
        position_exclusive: &Self::CategoryPosition,
    ) -> Result<StitchedStream<'_, B::CategoryPosition, L::CategoryPosition>, EventStoreError> {
        read_category_stitched(
            &self.backfill,
            &self.live,
            &self.live_cutoff_start_position,
            category,
            position_exclusive,
        )
    }

    fn empty_category_position(&self, category: &str) -> Self::CategoryPosition {
        StitchedPosition::new(
            self.backfill.empty_category_position(category),
            self.live_cutoff_start_position.clone(),
        )
    }

    fn category_position_codec(&self, category: &str) -> Self::CategoryCodec {
        StitchedPositionCodec::new(
            self.backfill.category_position_codec(category),
            self.live.category_position_codec(category),
        )
    }
}

/// Category-only stitching with its own cutoff.
///
/// Used when the sources' category positions differ from their store
/// positions, so the cutoff has to be expressed in category terms.
pub struct BackfillStitchingEventCategoryReader<B: EventCategoryReader, L: EventCategoryReader> {
    backfill: B,
    live: L,
    live_cutoff_start_position: L::CategoryPosition,
}

impl<B: EventCategoryReader, L: EventCategoryReader> BackfillStitchingEventCategoryReader<B, L> {
    /// Stitches the category readers at `live_cutoff_start_position`.
    pub fn new(backfill: B, live: L, live_cutoff_start_position: L::CategoryPosition) -> Self {
        Self {
            backfill,
            live,
            live_cutoff_start_position,
        }
    }
}

impl<B: EventCategoryReader, L: EventCategoryReader> EventCategoryReader
    for BackfillStitchingEventCategoryReader<B, L>
{
    type CategoryPosition = StitchedPosition<B::CategoryPosition, L::CategoryPosition>;
    type CategoryCodec = StitchedPositionCodec<B::CategoryCodec, L::CategoryCodec>;

    fn read_category_forwards_from(
        &self,
        category: &str,
        position_exclusive: &Self::CategoryPosition,
    ) -> Result<StitchedStream<'_, B::CategoryPosition, L::CategoryPosition>, EventStoreError> {
        read_category_stitched(
            &self.backfill,
            &self.live,
            &self.live_cutoff_start_position,
            category,
            position_exclusive,
        )
    }

    fn empty_category_position(&self, category: &str) -> Self::CategoryPosition {
        StitchedPosition::new(
            self.backfill.empty_category_position(category),
            self.live_cutoff_start_position.clone(),
        )
    }

    fn category_position_codec(&self, category: &str) -> Self::CategoryCodec {
        StitchedPositionCodec::new(
            self.backfill.category_position_codec(category),
            self.live.category_position_codec(category),
        )
    }
}

fn read_category_stitched<'a, B, L>(
    backfill: &'a B,
    live: &'a L,
    live_cutoff_start_position: &L::CategoryPosition,
    category: &str,
    position_exclusive: &StitchedPosition<B::CategoryPosition, L::CategoryPosition>,
) -> Result<StitchedStream<'a, B::CategoryPosition, L::CategoryPosition>, EventStoreError>
where
    B: EventCategoryReader,
    L: EventCategoryReader,
{
    let backfill_events = if position_exclusive.is_in_backfill(live_cutoff_start_position) {
        debug!(category, "stitched category read starting in backfill");
        Some(backfill.read_category_forwards_from(category, &position_exclusive.backfill)?)
    } else {
        None
    };
    let live_events = live.read_category_forwards_from(category, &position_exclusive.live)?;
    Ok(StitchedEvents::new(backfill_events, live_events, position_exclusive.clone()).boxed())
}
