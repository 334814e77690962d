//! Daily reset boundary.

use chrono::{DateTime, Duration, NaiveTime, TimeZone, Utc};

/// Default wall-clock time of the daily wipe: 03:00.
#[must_use]
pub fn default_reset_at() -> NaiveTime {
    NaiveTime::from_hms_opt(3, 0, 0).unwrap_or_default()
}

/// Today's reset instant in `now`'s time zone.
///
/// When `reset_at` falls in a DST gap the first valid instant after the gap
/// is used; when it is ambiguous the earlier one is.
#[must_use]
pub fn reset_boundary<Tz: TimeZone>(now: &DateTime<Tz>, reset_at: NaiveTime) -> DateTime<Utc> {
    let tz = now.timezone();
    let local = now.date_naive().and_time(reset_at);
    (0..=2)
        .find_map(|shift| {
            tz.from_local_datetime(&(local + Duration::hours(shift)))
                .earliest()
        })
        .map_or_else(
            || now.with_timezone(&Utc),
            |boundary| boundary.with_timezone(&Utc),
        )
}

/// A wipe is due once `now` has passed today's boundary and the last save
/// happened before it. Without a previous save there is nothing stale to wipe.
#[must_use]
pub fn reset_due<Tz: TimeZone>(
    now: &DateTime<Tz>,
    last_saved: Option<DateTime<Utc>>,
    reset_at: NaiveTime,
) -> bool {
    let boundary = reset_boundary(now, reset_at);
    let now_utc = now.with_timezone(&Utc);
    now_utc > boundary && last_saved.is_some_and(|saved| saved < boundary)
}
