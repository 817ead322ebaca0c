//! Conversions between `jiff`'s civil/instant types and the integer
//! encodings Parquet's temporal logical types store on disk (§3, §4.1.4).
//!
//! Kept as free functions rather than methods on `ParquetValue` so both the
//! derive macro's generated code and the programmatic builder (§4.1.2) can
//! call the same conversion without needing a `ParquetValue` round-trip in
//! between.

use jiff::civil::{Date, DateTime, Time};
use jiff::{Span, Timestamp};

const MICROS_PER_DAY: i64 = 86_400_000_000;

fn unix_epoch() -> Date {
    jiff::civil::date(1970, 1, 1)
}

/// Days since 1970-01-01, matching Parquet's `DATE` logical type (§3).
pub fn date_to_days(date: Date) -> i32 {
    date.since(unix_epoch())
        .expect("date within jiff's representable range")
        .get_days() as i32
}

pub fn days_to_date(days: i32) -> Date {
    unix_epoch()
        .checked_add(Span::new().days(days as i64))
        .expect("day offset within jiff's representable range")
}

/// Microseconds since midnight.
pub fn time_to_micros(time: Time) -> i64 {
    let h = time.hour() as i64;
    let m = time.minute() as i64;
    let s = time.second() as i64;
    let sub_ns = time.subsec_nanosecond() as i64;
    h * 3_600_000_000 + m * 60_000_000 + s * 1_000_000 + sub_ns / 1_000
}

/// Milliseconds since midnight.
pub fn time_to_millis(time: Time) -> i32 {
    (time_to_micros(time) / 1_000) as i32
}

pub fn micros_to_time(micros: i64) -> Time {
    let total = micros.rem_euclid(MICROS_PER_DAY);
    let h = (total / 3_600_000_000) as i8;
    let rem = total % 3_600_000_000;
    let m = (rem / 60_000_000) as i8;
    let rem = rem % 60_000_000;
    let s = (rem / 1_000_000) as i8;
    let subsec_ns = ((rem % 1_000_000) * 1_000) as i32;
    Time::new(h, m, s, subsec_ns).expect("decomposed components form a valid time of day")
}

pub fn millis_to_time(millis: i32) -> Time {
    micros_to_time(millis as i64 * 1_000)
}

/// Microseconds since 1970-01-01T00:00:00, with no UTC adjustment — the
/// wire value for `LocalTimestamp` (§3).
pub fn datetime_to_micros(dt: DateTime) -> i64 {
    date_to_days(dt.date()) as i64 * MICROS_PER_DAY + time_to_micros(dt.time())
}

pub fn micros_to_datetime(micros: i64) -> DateTime {
    let days = micros.div_euclid(MICROS_PER_DAY);
    let time_micros = micros.rem_euclid(MICROS_PER_DAY);
    DateTime::from_parts(days_to_date(days as i32), micros_to_time(time_micros))
}

/// Microseconds since the Unix epoch — the wire value for
/// `InstantTimestamp` (§3), `is_adjusted_to_utc = true`.
pub fn instant_to_micros(ts: Timestamp) -> i64 {
    ts.as_microsecond()
}

pub fn micros_to_instant(micros: i64) -> Timestamp {
    Timestamp::from_microsecond(micros).expect("microsecond offset within jiff's representable range")
}
