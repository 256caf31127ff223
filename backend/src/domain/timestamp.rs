//! Clock readings at storage precision.
//!
//! PostgreSQL `TIMESTAMPTZ` keeps microseconds. Entities minted with a finer
//! reading would not compare equal to what a later read returns, so services
//! take every timestamp through [`stored_now`].

use chrono::{DateTime, DurationRound, TimeDelta, Utc};
use mockable::Clock;

/// Current time truncated to whole microseconds.
///
/// # Examples
/// ```
/// use chrono::Timelike;
/// use hestia::domain::stored_now;
/// use mockable::DefaultClock;
///
/// assert_eq!(stored_now(&DefaultClock).nanosecond() % 1_000, 0);
/// ```
#[must_use]
pub fn stored_now(clock: &dyn Clock) -> DateTime<Utc> {
    let now = clock.utc();
    now.duration_trunc(TimeDelta::microseconds(1)).unwrap_or(now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::MutableClock;
    use chrono::{TimeZone, Timelike};
    use rstest::rstest;

    #[rstest]
    #[case(0, 0)]
    #[case(999, 0)]
    #[case(1_000, 1_000)]
    #[case(342_068_408, 342_068_000)]
    fn drops_sub_microsecond_digits(#[case] nanos: u32, #[case] expected: u32) {
        let instant = Utc
            .timestamp_opt(1_700_000_000, nanos)
            .single()
            .expect("valid instant");
        let now = stored_now(&MutableClock::new(instant));
        assert_eq!(now.nanosecond(), expected);
        assert_eq!(now.timestamp(), 1_700_000_000);
    }
}
