use eventlog_api::{EventStoreError, OrderedPositionCodec, PositionCodec};
use std::cmp::Ordering;
use std::fmt;

/// One-based count of events in the global log; `0` precedes every event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct InMemoryPosition(pub u64);

impl InMemoryPosition {
    /// Position before the first event.
    pub const EMPTY: InMemoryPosition = InMemoryPosition(0);
}

impl fmt::Display for InMemoryPosition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Decimal codec for [`InMemoryPosition`].
#[derive(Debug, Clone, Copy, Default)]
pub struct InMemoryPositionCodec;

impl PositionCodec for InMemoryPositionCodec {
    type Position = InMemoryPosition;

    fn serialize_position(&self, position: &InMemoryPosition) -> String {
        position.to_string()
    }

    fn deserialize_position(&self, serialized: &str) -> Result<InMemoryPosition, EventStoreError> {
        serialized
            .parse::<u64>()
            .map(InMemoryPosition)
            .map_err(|e| EventStoreError::InvalidPosition(format!("{:?}: {}", serialized, e)))
    }
}

impl OrderedPositionCodec for InMemoryPositionCodec {
    fn compare_positions(
        &self,
        left: &InMemoryPosition,
        right: &InMemoryPosition,
    ) -> Result<Ordering, EventStoreError> {
        Ok(left.cmp(right))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_rejects_non_numeric() {
        let err = InMemoryPositionCodec.deserialize_position("12a").unwrap_err();
        assert!(matches!(err, EventStoreError::InvalidPosition(_)));
    }

    #[test]
    fn test_empty_is_zero() {
        assert_eq!(InMemoryPositionCodec.serialize_position(&InMemoryPosition::EMPTY), "0");
    }

    proptest! {
        #[test]
        fn prop_round_trip(n in any::<u64>()) {
            let codec = InMemoryPositionCodec;
            let position = InMemoryPosition(n);
            prop_assert_eq!(codec.deserialize_position(&codec.serialize_position(&position)).unwrap(), position);
        }

        #[test]
        fn prop_order_matches_numbers(a in any::<u64>(), b in any::<u64>()) {
            let ordering = InMemoryPositionCodec
                .compare_positions(&InMemoryPosition(a), &InMemoryPosition(b))
                .unwrap();
            prop_assert_eq!(ordering, a.cmp(&b));
        }
    }
}
