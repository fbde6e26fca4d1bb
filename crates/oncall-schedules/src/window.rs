use chrono::{DateTime, Datelike, TimeZone};
use oncall_core::types::truncate_to_minute;
use oncall_core::Schedule;

/// Whether `at` falls inside the schedule's active window.
///
/// The weekday and clock time are read in `at`'s own offset, never UTC. The
/// window is built on `at`'s calendar date from the schedule's hour and
/// minute, and both bounds are inclusive: `start <= at <= end`.
pub fn matches<Tz: TimeZone>(schedule: &Schedule, at: &DateTime<Tz>) -> bool {
    if !schedule.is_active_on(at.weekday()) {
        return false;
    }

    let local = at.naive_local();
    let date = local.date();
    let start = date.and_time(truncate_to_minute(schedule.start));
    let end = date.and_time(truncate_to_minute(schedule.end));

    start <= local && local <= end
}
