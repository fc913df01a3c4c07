//! Star rating values.

use serde::{Deserialize, Serialize};

/// Error returned for a rating outside the 1..=5 star scale.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("rating must be between 1 and 5 stars, got {0}")]
pub struct RatingError(pub i64);

/// A single review score on the 1..=5 star scale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct RatingValue(u8);

impl RatingValue {
    /// Lowest allowed score.
    pub const MIN: u8 = 1;
    /// Highest allowed score.
    pub const MAX: u8 = 5;

    /// Create a rating value.
    ///
    /// # Errors
    ///
    /// Returns `RatingError` if `stars` is outside 1..=5.
    pub fn new(stars: i64) -> Result<Self, RatingError> {
        u8::try_from(stars)
            .ok()
            .filter(|s| (Self::MIN..=Self::MAX).contains(s))
            .map(Self)
            .ok_or(RatingError(stars))
    }

    /// Number of stars.
    #[must_use]
    pub const fn stars(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for RatingValue {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<RatingValue> for u8 {
    fn from(value: RatingValue) -> Self {
        value.0
    }
}

impl From<RatingValue> for f64 {
    fn from(value: RatingValue) -> Self {
        Self::from(value.0)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_bounds() {
        assert!(RatingValue::new(0).is_err());
        assert!(RatingValue::new(6).is_err());
        assert!(RatingValue::new(-1).is_err());
        assert_eq!(RatingValue::new(5).unwrap().stars(), 5);
    }

    #[test]
    fn test_deserialize_validates() {
        assert!(serde_json::from_str::<RatingValue>("4").is_ok());
        let err = serde_json::from_str::<RatingValue>("9").unwrap_err();
        assert!(err.to_string().contains("between 1 and 5"));
    }
}
