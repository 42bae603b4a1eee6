//! Shop-local time.
//!
//! Every shop on the roster is in the Milwaukee area, so "today" always means
//! the calendar date in US Central time regardless of where the process runs.

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

pub const SHOP_TZ: Tz = chrono_tz::America::Chicago;

#[must_use]
pub fn shop_today() -> NaiveDate {
    shop_date_of(Utc::now())
}

/// Convert an instant to the shop-local calendar date.
#[must_use]
pub fn shop_date_of(instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&SHOP_TZ).date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn shop_today_reads_the_clock_through_shop_date_of() {
        let before = shop_date_of(Utc::now());
        let today = shop_today();
        let after = shop_date_of(Utc::now());
        assert!(today == before || today == after);
    }

    #[test]
    fn late_evening_utc_is_still_previous_day_in_central() {
        // 02:30 UTC on July 16 is 21:30 CDT on July 15.
        let instant = Utc.with_ymd_and_hms(2025, 7, 16, 2, 30, 0).unwrap();
        assert_eq!(
            shop_date_of(instant),
            NaiveDate::from_ymd_opt(2025, 7, 15).unwrap()
        );
    }

    #[test]
    fn winter_offset_is_six_hours() {
        // 05:59 UTC on Jan 10 is 23:59 CST on Jan 9.
        let instant = Utc.with_ymd_and_hms(2025, 1, 10, 5, 59, 0).unwrap();
        assert_eq!(
            shop_date_of(instant),
            NaiveDate::from_ymd_opt(2025, 1, 9).unwrap()
        );
        let instant = Utc.with_ymd_and_hms(2025, 1, 10, 6, 0, 0).unwrap();
        assert_eq!(
            shop_date_of(instant),
            NaiveDate::from_ymd_opt(2025, 1, 10).unwrap()
        );
    }
}
