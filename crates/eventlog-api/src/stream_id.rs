//! Stream identity.

use crate::errors::EventStoreError;
use std::fmt;
use std::str::FromStr;

/// Character reserved as the boundary between category and id.
pub const CATEGORY_SEPARATOR: char = '-';

/// Identifies one stream as `(category, id)`.
///
/// The category may not contain [`CATEGORY_SEPARATOR`], so the display form
/// `category-id` always parses back to the same value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StreamId {
    category: String,
    id: String,
}

impl StreamId {
    /// Creates a stream id, rejecting categories that contain the separator.
    pub fn new(category: impl Into<String>, id: impl Into<String>) -> Result<Self, EventStoreError> {
        let category = category.into();
        if category.contains(CATEGORY_SEPARATOR) {
            return Err(EventStoreError::InvalidStreamId {
                reason: format!("event category cannot contain {}", CATEGORY_SEPARATOR),
                category,
            });
        }
        Ok(Self {
            category,
            id: id.into(),
        })
    }

    /// The grouping component.
    pub fn category(&self) -> &str {
        &self.category
    }

    /// The stream's identifier within its category.
    pub fn id(&self) -> &str {
        &self.id
    }
}

impl fmt::Display for StreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.category, CATEGORY_SEPARATOR, self.id)
    }
}

impl FromStr for StreamId {
    type Err = EventStoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(CATEGORY_SEPARATOR) {
            Some((category, id)) => StreamId::new(category, id),
            None => Err(EventStoreError::InvalidStreamId {
                category: s.to_string(),
                reason: format!("missing {} between category and id", CATEGORY_SEPARATOR),
            }),
        }
    }
}
