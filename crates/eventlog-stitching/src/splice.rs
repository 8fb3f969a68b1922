use crate::position::StitchedPosition;
use eventlog_api::{EventStoreError, EventStream, Position, ResolvedEvent};

/// Emits the remaining backfill events, then the live events.
///
/// Backfill events carry the live component of the starting position; live
/// events carry the last backfill position seen. The backfill stream is
/// dropped as soon as it is exhausted; dropping the splice drops both.
pub(crate) struct StitchedEvents<'a, BP, LP> {
    backfill: Option<EventStream<'a, BP>>,
    live: EventStream<'a, LP>,
    last: StitchedPosition<BP, LP>,
}

impl<'a, BP: Position, LP: Position> StitchedEvents<'a, BP, LP> {
    pub(crate) fn new(
        backfill: Option<EventStream<'a, BP>>,
        live: EventStream<'a, LP>,
        start_exclusive: StitchedPosition<BP, LP>,
    ) -> Self {
        Self {
            backfill,
            live,
            last: start_exclusive,
        }
    }

    pub(crate) fn boxed(self) -> EventStream<'a, StitchedPosition<BP, LP>> {
        Box::new(self)
    }
}

impl<BP: Position, LP: Position> Iterator for StitchedEvents<'_, BP, LP> {
    type Item = Result<ResolvedEvent<StitchedPosition<BP, LP>>, EventStoreError>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(backfill) = self.backfill.as_mut() {
            match backfill.next() {
                Some(Ok(event)) => {
                    self.last.backfill = event.position.clone();
                    let live = self.last.live.clone();
                    return Some(Ok(event.map_position(|b| StitchedPosition::new(b, live))));
                }
                Some(Err(e)) => return Some(Err(e)),
                None => self.backfill = None,
            }
        }

        match self.live.next()? {
            Ok(event) => {
                self.last.live = event.position.clone();
                let backfill = self.last.backfill.clone();
                Some(Ok(event.map_position(|l| StitchedPosition::new(backfill, l))))
            }
            Err(e) => Some(Err(e)),
        }
    }
}
