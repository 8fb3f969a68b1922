//! Backfill/live stitching.
//!
//! A migration from one backend to another leaves two sources: a frozen
//! *backfill* holding history and a *live* source that took over at some
//! cutover position. [`BackfillStitchingEventSource`] presents them as one
//! source with one position space, [`StitchedPosition`], so consumers keep
//! reading across the cutover without noticing it.
//!
//! Moving consumers off the stitched source again is a three-phase change,
//! supported by [`BackfillParallelChangeCodec`]:
//!
//! 1. **Expand**: consumers still read the stitched source but accept both
//!    stitched and plain live positions.
//! 2. **Migrate**: consumers read the live source and still accept stitched
//!    positions written earlier, as long as they are past the cutover.
//! 3. **Contract**: the codec is removed; consumers use the live codec.

#![deny(missing_docs)]

/// Position translation for migrating off a stitched source.
pub mod parallel_change;
/// Stitched positions and their codec.
pub mod position;
/// Filtering and category-narrowing reader decorators.
pub mod readers;
/// The stitched event source and category reader.
pub mod source;
mod splice;

pub use parallel_change::{BackfillParallelChangeCodec, Expand, Migrate};
pub use position::{StitchedPosition, StitchedPositionCodec, STITCH_SEPARATOR};
pub use readers::{
    containing_event_types, FilteringEventReader, MultipleEventCategoryEventReader,
    SingleEventCategoryEventReader,
};
pub use source::{BackfillStitchingEventCategoryReader, BackfillStitchingEventSource};
