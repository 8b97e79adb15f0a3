use chrono::{DateTime, NaiveDateTime, Utc};

/// Deterministic timestamp for tests and fixtures (2023-11-14T22:13:20).
pub const FIXED_TEST_TIMESTAMP: i64 = 1_700_000_000;

/// Returns a deterministic server-style timestamp for tests and fixtures.
///
/// The server reports naive UTC timestamps, so fixtures use the same shape.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> NaiveDateTime {
    DateTime::<Utc>::from_timestamp(FIXED_TEST_TIMESTAMP, 0)
        .expect("fixed timestamp should be valid")
        .naive_utc()
}
