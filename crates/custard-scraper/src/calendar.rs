//! Date and day-label matching shared by the extractors.

use std::sync::LazyLock;

use chrono::{Datelike, NaiveDate, NaiveTime, TimeZone, Utc, Weekday};
use custard_core::SHOP_TZ;
use regex::Regex;

static DAY_TOKEN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?,?\s*(\d+)\b").expect("valid regex")
});

static MONTH_DAY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([a-z]{3,9})\.?,?\s*(\d{1,2})(?:st|nd|rd|th)?\b").expect("valid regex")
});

static OR_SEPARATOR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)\s*-\s*or\s*-\s*|\s+or\s+").expect("valid regex"));

const MONTHS: [&str; 12] = [
    "jan", "feb", "mar", "apr", "may", "jun", "jul", "aug", "sep", "oct", "nov", "dec",
];

/// `true` when `text` contains a weekday label for `date`'s weekday followed by
/// `date`'s day of month as a whole number.
///
/// The label may be the three-letter abbreviation or any longer prefix of the
/// full name ("Thu", "Thur", "Thurs", "Thursday"). "Thur 10" never matches
/// day 1.
#[must_use]
pub fn day_label_matches(text: &str, date: NaiveDate) -> bool {
    let full = weekday_name(date.weekday());
    let day = date.day();
    DAY_TOKEN.captures_iter(text).any(|caps| {
        let word = caps[1].to_ascii_lowercase();
        let number_matches = caps[2].parse::<u32>().is_ok_and(|n| n == day);
        number_matches && word.len() >= 3 && full.starts_with(&word)
    })
}

/// Abbreviated weekday and day-of-month label, e.g. `"Thu 1"`.
#[must_use]
pub fn day_label(date: NaiveDate) -> String {
    format!("{} {}", date.format("%a"), date.day())
}

fn weekday_name(weekday: Weekday) -> &'static str {
    match weekday {
        Weekday::Mon => "monday",
        Weekday::Tue => "tuesday",
        Weekday::Wed => "wednesday",
        Weekday::Thu => "thursday",
        Weekday::Fri => "friday",
        Weekday::Sat => "saturday",
        Weekday::Sun => "sunday",
    }
}

/// `true` when `text` joins several flavors with an "or" separator.
#[must_use]
pub fn has_or_separator(text: &str) -> bool {
    OR_SEPARATOR.is_match(text)
}

/// Split a calendar cell's text on "-or-" / " or " into flavor names,
/// preserving their order and case.
#[must_use]
pub fn split_flavor_candidates(text: &str) -> Vec<String> {
    OR_SEPARATOR
        .split(text)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Parse the first "Month DD" pair in `text` (e.g. `"Sunday, Jul. 06"` or
/// `"FRIDAY, JULY 11"`) into a date in `year`.
#[must_use]
pub fn parse_month_day(text: &str, year: i32) -> Option<NaiveDate> {
    MONTH_DAY.captures_iter(text).find_map(|caps| {
        let word = caps[1].to_ascii_lowercase();
        let month = MONTHS.iter().position(|m| word.starts_with(m))?;
        let day = caps[2].parse::<u32>().ok()?;
        let month = u32::try_from(month + 1).ok()?;
        NaiveDate::from_ymd_opt(year, month, day)
    })
}

/// Calendar-API range bound: shop-local midnight expressed in UTC, so
/// `05:00Z` under daylight time and `06:00Z` under standard time.
#[must_use]
pub fn api_range_bound(date: NaiveDate) -> String {
    let local = date.and_time(NaiveTime::MIN);
    let midnight = SHOP_TZ
        .from_local_datetime(&local)
        .earliest()
        .map_or_else(|| local.and_utc(), |t| t.with_timezone(&Utc));
    midnight.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thursday_the_first() -> NaiveDate {
        // 2025-05-01 is a Thursday.
        NaiveDate::from_ymd_opt(2025, 5, 1).unwrap()
    }

    #[test]
    fn matching_day_labels() {
        let today = thursday_the_first();
        for label in ["Thu 1", "Thur 1", "Thursday 1", "THURS. 1", "thu, 1", "Thu 01"] {
            assert!(day_label_matches(label, today), "{label} should match");
        }
    }

    #[test]
    fn day_number_must_be_a_whole_token() {
        let today = thursday_the_first();
        for label in ["Thur 10", "Thur 11", "Thur 240", "Thu 21", "Thu 1st"] {
            assert!(!day_label_matches(label, today), "{label} should not match");
        }
    }

    #[test]
    fn weekday_must_match() {
        let today = thursday_the_first();
        for label in ["Tue 1", "Th 1", "Thx 1", "Fri 1"] {
            assert!(!day_label_matches(label, today), "{label} should not match");
        }
    }

    #[test]
    fn matches_inside_longer_cell_text() {
        let today = thursday_the_first();
        assert!(day_label_matches("Wed 30 | Thur 1 | Fri 2", today));
        assert!(!day_label_matches("Wed 30 | Thur 10 | Fri 11", today));
    }

    #[test]
    fn day_label_format() {
        assert_eq!(day_label(thursday_the_first()), "Thu 1");
    }

    #[test]
    fn hyphenated_or_splits_into_two() {
        assert_eq!(
            split_flavor_candidates("LEMON BERRY -or- CHOCOLATE CHIP"),
            vec!["LEMON BERRY".to_string(), "CHOCOLATE CHIP".to_string()]
        );
        assert!(has_or_separator("LEMON BERRY -or- CHOCOLATE CHIP"));
    }

    #[test]
    fn spaced_or_splits_case_insensitively() {
        assert_eq!(
            split_flavor_candidates("Mint Oreo OR Butter Pecan"),
            vec!["Mint Oreo".to_string(), "Butter Pecan".to_string()]
        );
    }

    #[test]
    fn single_flavor_yields_one_candidate() {
        assert_eq!(
            split_flavor_candidates("VANILLA BEAN"),
            vec!["VANILLA BEAN".to_string()]
        );
        assert!(!has_or_separator("VANILLA BEAN"));
    }

    #[test]
    fn or_inside_a_word_is_not_a_separator() {
        assert_eq!(
            split_flavor_candidates("ORANGE ORIOLE"),
            vec!["ORANGE ORIOLE".to_string()]
        );
        assert!(!has_or_separator("ORANGE ORIOLE"));
    }

    #[test]
    fn parses_abbreviated_month_label() {
        assert_eq!(
            parse_month_day("Sunday, Jul. 06", 2025),
            NaiveDate::from_ymd_opt(2025, 7, 6)
        );
    }

    #[test]
    fn parses_full_month_heading() {
        assert_eq!(
            parse_month_day("FRIDAY, JULY 11", 2025),
            NaiveDate::from_ymd_opt(2025, 7, 11)
        );
        assert_eq!(
            parse_month_day("Saturday, August 2nd", 2025),
            NaiveDate::from_ymd_opt(2025, 8, 2)
        );
    }

    #[test]
    fn unparseable_label_is_none() {
        assert_eq!(parse_month_day("Coming soon", 2025), None);
        assert_eq!(parse_month_day("Feb 30", 2025), None);
    }

    #[test]
    fn api_range_bound_format() {
        let date = NaiveDate::from_ymd_opt(2025, 7, 14).unwrap();
        assert_eq!(api_range_bound(date), "2025-07-14T05:00:00.000Z");
    }

    #[test]
    fn api_range_bound_follows_standard_time() {
        let january = NaiveDate::from_ymd_opt(2025, 1, 14).unwrap();
        assert_eq!(api_range_bound(january), "2025-01-14T06:00:00.000Z");
        // Clocks spring forward at 02:00, so that day's midnight is still CST.
        let spring_forward = NaiveDate::from_ymd_opt(2025, 3, 9).unwrap();
        assert_eq!(api_range_bound(spring_forward), "2025-03-09T06:00:00.000Z");
    }
}
