//! Reader decorators that narrow what another reader yields.

use eventlog_api::{
    EventCategoryReader, EventReader, EventStoreError, EventStream, ResolvedEvent,
};
use std::collections::{BTreeSet, HashSet};

fn retain<'a, P: 'a>(
    stream: EventStream<'a, P>,
    keep: impl Fn(&ResolvedEvent<P>) -> bool + 'a,
) -> EventStream<'a, P> {
    Box::new(stream.filter(move |item| match item {
        Ok(event) => keep(event),
        Err(_) => true,
    }))
}

/// Yields only the events of `underlying` that `predicate` accepts.
///
/// Positions and codec are those of the underlying reader, so a position
/// saved from the filtered read resumes the underlying read at the same
/// place.
pub struct FilteringEventReader<R, F> {
    underlying: R,
    predicate: F,
}

impl<R, F> FilteringEventReader<R, F>
where
    R: EventReader,
    F: Fn(&ResolvedEvent<R::Position>) -> bool,
{
    /// Filters `underlying` with `predicate`.
    pub fn new(underlying: R, predicate: F) -> Self {
        Self {
            underlying,
            predicate,
        }
    }

    /// The wrapped reader.
    pub fn underlying(&self) -> &R {
        &self.underlying
    }
}

/// Filters `underlying` down to the given event types.
pub fn containing_event_types<R, I, S>(
    underlying: R,
    event_types: I,
) -> FilteringEventReader<R, impl Fn(&ResolvedEvent<R::Position>) -> bool>
where
    R: EventReader,
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let event_types: HashSet<String> = event_types.into_iter().map(Into::into).collect();
    FilteringEventReader::new(underlying, move |event: &ResolvedEvent<R::Position>| {
        event_types.contains(&event.event_record.event_type)
    })
}

impl<R, F> EventReader for FilteringEventReader<R, F>
where
    R: EventReader,
    F: Fn(&ResolvedEvent<R::Position>) -> bool,
{
    type Position = R::Position;
    type Codec = R::Codec;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &R::Position,
    ) -> Result<EventStream<'_, R::Position>, EventStoreError> {
        let events = self.underlying.read_all_forwards_from(position_exclusive)?;
        Ok(retain(events, move |event| (self.predicate)(event)))
    }

    fn read_all_backwards(&self) -> Result<EventStream<'_, R::Position>, EventStoreError> {
        let events = self.underlying.read_all_backwards()?;
        Ok(retain(events, move |event| (self.predicate)(event)))
    }

    fn read_all_backwards_from(
        &self,
        position_exclusive: &R::Position,
    ) -> Result<EventStream<'_, R::Position>, EventStoreError> {
        let events = self.underlying.read_all_backwards_from(position_exclusive)?;
        Ok(retain(events, move |event| (self.predicate)(event)))
    }

    fn empty_store_position(&self) -> R::Position {
        self.underlying.empty_store_position()
    }

    fn store_position_codec(&self) -> R::Codec {
        self.underlying.store_position_codec()
    }
}

/// Presents one category of a category reader as a whole store.
pub struct SingleEventCategoryEventReader<C> {
    underlying: C,
    category: String,
}

impl<C: EventCategoryReader> SingleEventCategoryEventReader<C> {
    /// Reads `category` from `underlying`.
    pub fn new(underlying: C, category: impl Into<String>) -> Self {
        Self {
            underlying,
            category: category.into(),
        }
    }

    /// The category being read.
    pub fn category(&self) -> &str {
        &self.category
    }
}

impl<C: EventCategoryReader> EventReader for SingleEventCategoryEventReader<C> {
    type Position = C::CategoryPosition;
    type Codec = C::CategoryCodec;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &C::CategoryPosition,
    ) -> Result<EventStream<'_, C::CategoryPosition>, EventStoreError> {
        self.underlying
            .read_category_forwards_from(&self.category, position_exclusive)
    }

    fn read_all_backwards(&self) -> Result<EventStream<'_, C::CategoryPosition>, EventStoreError> {
        self.underlying.read_category_backwards(&self.category)
    }

    fn read_all_backwards_from(
        &self,
        position_exclusive: &C::CategoryPosition,
    ) -> Result<EventStream<'_, C::CategoryPosition>, EventStoreError> {
        self.underlying
            .read_category_backwards_from(&self.category, position_exclusive)
    }

    fn empty_store_position(&self) -> C::CategoryPosition {
        self.underlying.empty_category_position(&self.category)
    }

    fn store_position_codec(&self) -> C::CategoryCodec {
        self.underlying.category_position_codec(&self.category)
    }
}

/// Reads the events of several categories, interleaved in store order.
///
/// Uses store positions, so a consumer can later widen or narrow the set of
/// categories and keep its saved position.
pub struct MultipleEventCategoryEventReader<R> {
    underlying: R,
    categories: BTreeSet<String>,
}

impl<R: EventReader> MultipleEventCategoryEventReader<R> {
    /// Reads `categories` from the store read by `underlying`.
    pub fn new<I, S>(underlying: R, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            underlying,
            categories: categories.into_iter().map(Into::into).collect(),
        }
    }

    /// The categories being read, in sorted order.
    pub fn categories(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(String::as_str)
    }

    fn in_categories(&self, event: &ResolvedEvent<R::Position>) -> bool {
        self.categories
            .contains(event.event_record.stream_id.category())
    }
}

impl<R: EventReader> EventReader for MultipleEventCategoryEventReader<R> {
    type Position = R::Position;
    type Codec = R::Codec;

    fn read_all_forwards_from(
        &self,
        position_exclusive: &R::Position,
    ) -> Result<EventStream<'_, R::Position>, EventStoreError> {
        let events = self.underlying.read_all_forwards_from(position_exclusive)?;
        Ok(retain(events, move |event| self.in_categories(event)))
    }

    fn read_all_backwards(&self) -> Result<EventStream<'_, R::Position>, EventStoreError> {
        let events = self.underlying.read_all_backwards()?;
        Ok(retain(events, move |event| self.in_categories(event)))
    }

    fn read_all_backwards_from(
        &self,
        position_exclusive: &R::Position,
    ) -> Result<EventStream<'_, R::Position>, EventStoreError> {
        let events = self.underlying.read_all_backwards_from(position_exclusive)?;
        Ok(retain(events, move |event| self.in_categories(event)))
    }

    fn empty_store_position(&self) -> R::Position {
        self.underlying.empty_store_position()
    }

    fn store_position_codec(&self) -> R::Codec {
        self.underlying.store_position_codec()
    }
}
