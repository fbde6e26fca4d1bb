//! Wire formats accepted at the HTTP boundary.
//!
//! - clock times: 12-hour `H:MMAM` / `H:MMPM` (e.g. `9:00AM`, `5:30pm`)
//! - weekdays: full English names, any case
//! - instants: RFC 3339, keeping the caller's offset

use chrono::{DateTime, FixedOffset, NaiveTime, Weekday};

pub const CLOCK_FORMAT: &str = "%I:%M%p";

const WEEKDAY_NAMES: [(Weekday, &str); 7] = [
    (Weekday::Sun, "Sunday"),
    (Weekday::Mon, "Monday"),
    (Weekday::Tue, "Tuesday"),
    (Weekday::Wed, "Wednesday"),
    (Weekday::Thu, "Thursday"),
    (Weekday::Fri, "Friday"),
    (Weekday::Sat, "Saturday"),
];

pub fn parse_clock(s: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(s.trim(), CLOCK_FORMAT).ok()
}

pub fn format_clock(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

pub fn parse_weekday(s: &str) -> Option<Weekday> {
    let s = s.trim();
    WEEKDAY_NAMES
        .iter()
        .find(|(_, name)| name.eq_ignore_ascii_case(s))
        .map(|(day, _)| *day)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    WEEKDAY_NAMES
        .iter()
        .find(|(d, _)| *d == day)
        .map(|(_, name)| *name)
        .unwrap_or("Unknown")
}

/// Parse an RFC 3339 instant. An unencoded `+` in a query string arrives as a
/// space, so `2025-04-28T10:00:00 05:00` is read as `+05:00`.
pub fn parse_instant(s: &str) -> Option<DateTime<FixedOffset>> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .or_else(|_| DateTime::parse_from_rfc3339(&s.replace(' ', "+")))
        .ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn clock_times() {
        assert_eq!(parse_clock("9:00AM"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_clock("5:00PM"), NaiveTime::from_hms_opt(17, 0, 0));
        assert_eq!(parse_clock("11:45pm"), NaiveTime::from_hms_opt(23, 45, 0));
        assert_eq!(parse_clock("12:00AM"), NaiveTime::from_hms_opt(0, 0, 0));
        assert_eq!(parse_clock("12:30PM"), NaiveTime::from_hms_opt(12, 30, 0));
    }

    #[test]
    fn bad_clock_times() {
        for s in ["25:00", "17:00", "invalid", "", "9AM", "13:00PM"] {
            assert!(parse_clock(s).is_none(), "{s:?} parsed");
        }
    }

    #[test]
    fn clock_formats_as_24h() {
        assert_eq!(format_clock(NaiveTime::from_hms_opt(9, 5, 0).unwrap()), "09:05");
    }

    #[test]
    fn weekdays_any_case() {
        assert_eq!(parse_weekday("Monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("monday"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("MONDAY"), Some(Weekday::Mon));
        assert_eq!(parse_weekday("Tuesday"), Some(Weekday::Tue));
        assert_eq!(parse_weekday("Sunday"), Some(Weekday::Sun));
        assert_eq!(parse_weekday("Saturday"), Some(Weekday::Sat));
    }

    #[test]
    fn bad_weekdays() {
        assert_eq!(parse_weekday("InvalidDay"), None);
        assert_eq!(parse_weekday(""), None);
    }

    #[test]
    fn weekday_names_round_trip() {
        for (day, name) in WEEKDAY_NAMES {
            assert_eq!(weekday_name(day), name);
            assert_eq!(parse_weekday(name), Some(day));
        }
    }

    #[test]
    fn instants_keep_their_offset() {
        let t = parse_instant("2025-04-28T10:00:00+05:00").unwrap();
        assert_eq!(t.offset().local_minus_utc(), 5 * 3600);
        assert_eq!(t.hour(), 10);
    }

    #[test]
    fn instant_with_space_for_plus() {
        let t = parse_instant("2025-04-28T10:00:00 05:00").unwrap();
        assert_eq!(t.offset().local_minus_utc(), 5 * 3600);
    }

    #[test]
    fn bad_instants() {
        assert!(parse_instant("invalid-time").is_none());
        assert!(parse_instant("2025-04-28 10:00").is_none());
    }
}
