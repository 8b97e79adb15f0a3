use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq)]
#[non_exhaustive]
pub enum PercentError {
    #[error("percentage must be a finite number")]
    NotFinite,

    #[error("percentage {0} is outside 0..=100")]
    OutOfRange(f64),
}

/// A percentage guaranteed to lie within `[0, 100]`.
///
/// Used for completion and quiz scores. Responses carrying an out-of-range
/// value fail to decode instead of leaking an invalid number into state.
#[derive(Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Percent(f64);

impl Percent {
    pub const ZERO: Percent = Percent(0.0);
    pub const FULL: Percent = Percent(100.0);

    /// Creates a validated percentage.
    ///
    /// # Errors
    ///
    /// Returns `PercentError` if the value is NaN, infinite, or outside `[0, 100]`.
    pub fn new(value: f64) -> Result<Self, PercentError> {
        if !value.is_finite() {
            return Err(PercentError::NotFinite);
        }
        if !(0.0..=100.0).contains(&value) {
            return Err(PercentError::OutOfRange(value));
        }
        Ok(Self(value))
    }

    #[must_use]
    pub fn value(self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Percent {
    type Error = PercentError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Percent> for f64 {
    fn from(value: Percent) -> Self {
        value.0
    }
}

impl fmt::Debug for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Percent({})", self.0)
    }
}

impl fmt::Display for Percent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.0}%", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bounds() {
        assert_eq!(Percent::new(0.0).unwrap(), Percent::ZERO);
        assert_eq!(Percent::new(100.0).unwrap(), Percent::FULL);
    }

    #[test]
    fn rejects_out_of_range_and_nan() {
        assert_eq!(Percent::new(100.5), Err(PercentError::OutOfRange(100.5)));
        assert_eq!(Percent::new(-1.0), Err(PercentError::OutOfRange(-1.0)));
        assert_eq!(Percent::new(f64::NAN), Err(PercentError::NotFinite));
    }

    #[test]
    fn decoding_validates() {
        let ok: Percent = serde_json::from_str("87.5").unwrap();
        assert_eq!(ok.value(), 87.5);
        assert!(serde_json::from_str::<Percent>("140").is_err());
    }
}
