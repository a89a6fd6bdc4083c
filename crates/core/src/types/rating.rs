//! Self-reported intoxication ("drunk scale") ratings.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`DrunkScaleRating`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum RatingError {
    /// The value is outside `1..=10`.
    #[error("drunk scale rating must be between {min} and {max} (got {value})")]
    OutOfRange {
        /// The rejected value.
        value: i64,
        /// Smallest accepted value.
        min: u8,
        /// Largest accepted value.
        max: u8,
    },
}

/// A rating on the 1-10 drunk scale.
///
/// Deserialization goes through the same range check, so a snapshot with
/// an out-of-range rating fails to load instead of producing a bad value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct DrunkScaleRating(u8);

impl DrunkScaleRating {
    /// Lowest rating.
    pub const MIN: u8 = 1;
    /// Highest rating.
    pub const MAX: u8 = 10;

    /// Create a rating, validating the range.
    ///
    /// # Errors
    ///
    /// Returns [`RatingError::OutOfRange`] unless `1 <= value <= 10`.
    pub fn new(value: i64) -> Result<Self, RatingError> {
        u8::try_from(value)
            .ok()
            .filter(|v| (Self::MIN..=Self::MAX).contains(v))
            .map(Self)
            .ok_or(RatingError::OutOfRange {
                value,
                min: Self::MIN,
                max: Self::MAX,
            })
    }

    /// The numeric value.
    #[must_use]
    pub const fn value(self) -> u8 {
        self.0
    }

    /// Short label shown next to the slider.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self.0 {
            0..=3 => "Feeling Good",
            4..=6 => "Buzzed",
            7..=8 => "Tipsy",
            _ => "Wasted",
        }
    }
}

impl TryFrom<i64> for DrunkScaleRating {
    type Error = RatingError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DrunkScaleRating> for u8 {
    fn from(rating: DrunkScaleRating) -> Self {
        rating.0
    }
}

impl fmt::Display for DrunkScaleRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Mean of all ratings rounded to one decimal place, `0.0` when empty.
#[must_use]
pub fn average_rating(ratings: &[DrunkScaleRating]) -> f64 {
    if ratings.is_empty() {
        return 0.0;
    }
    let sum: u32 = ratings.iter().map(|r| u32::from(r.0)).sum();
    #[allow(clippy::cast_precision_loss)] // rating history never approaches 2^52 entries
    let mean = f64::from(sum) / ratings.len() as f64;
    (mean * 10.0).round() / 10.0
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn ratings(values: &[i64]) -> Vec<DrunkScaleRating> {
        values
            .iter()
            .map(|v| DrunkScaleRating::new(*v).unwrap())
            .collect()
    }

    #[test]
    fn test_range() {
        assert!(DrunkScaleRating::new(0).is_err());
        assert!(DrunkScaleRating::new(11).is_err());
        assert!(DrunkScaleRating::new(-3).is_err());
        assert_eq!(DrunkScaleRating::new(1).unwrap().value(), 1);
        assert_eq!(DrunkScaleRating::new(10).unwrap().value(), 10);
    }

    #[test]
    fn test_average_empty_is_zero() {
        assert!((average_rating(&[]) - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_average_rounds_to_one_decimal() {
        assert!((average_rating(&ratings(&[2, 4])) - 3.0).abs() < f64::EPSILON);
        assert!((average_rating(&ratings(&[2, 4, 9])) - 5.0).abs() < f64::EPSILON);
        // 7 / 3 = 2.333..
        assert!((average_rating(&ratings(&[1, 2, 4])) - 2.3).abs() < 1e-9);
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: DrunkScaleRating = serde_json::from_str("7").unwrap();
        assert_eq!(ok.value(), 7);
        assert!(serde_json::from_str::<DrunkScaleRating>("12").is_err());
    }

    #[test]
    fn test_labels() {
        assert_eq!(DrunkScaleRating::new(3).unwrap().label(), "Feeling Good");
        assert_eq!(DrunkScaleRating::new(6).unwrap().label(), "Buzzed");
        assert_eq!(DrunkScaleRating::new(8).unwrap().label(), "Tipsy");
        assert_eq!(DrunkScaleRating::new(10).unwrap().label(), "Wasted");
    }
}
