//! Working-day arithmetic for the daily pages.
//!
//! Day `n` of a placement is the `n`-th weekday counted from the start date,
//! so a placement starting on a Saturday has its first day on the Monday.

use chrono::{Datelike, Locale, NaiveDate, Weekday};

/// Label shown when the placement has no start date.
pub const NO_DATE_LABEL: &str = "Date non définie";

/// Long French date: weekday, day, month, year.
const LABEL_FORMAT: &str = "%A %-d %B %Y";

/// Whether `date` is a Saturday or a Sunday.
#[must_use]
pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// The working day `offset` working days after the first working day at or
/// after `start`.
///
/// Returns `None` when there is no start date, or when the walk runs past
/// the end of the supported calendar.
#[must_use]
pub fn working_day(start: Option<NaiveDate>, offset: usize) -> Option<NaiveDate> {
    let mut date = start?;
    while is_weekend(date) {
        date = date.succ_opt()?;
    }

    let mut counted = 0;
    while counted < offset {
        date = date.succ_opt()?;
        if !is_weekend(date) {
            counted += 1;
        }
    }
    Some(date)
}

/// Format a date the way the daily pages show it, e.g. `lundi 2 septembre 2024`.
#[must_use]
pub fn format_long(date: NaiveDate) -> String {
    date.and_hms_opt(0, 0, 0)
        .map(|midnight| {
            midnight
                .and_utc()
                .format_localized(LABEL_FORMAT, Locale::fr_FR)
                .to_string()
        })
        .unwrap_or_default()
}

/// Label for the day at zero-based `offset`, or [`NO_DATE_LABEL`].
#[must_use]
pub fn working_day_label(start: Option<NaiveDate>, offset: usize) -> String {
    working_day(start, offset).map_or_else(|| NO_DATE_LABEL.to_string(), format_long)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_no_start_date_gives_sentinel() {
        assert_eq!(working_day(None, 3), None);
        assert_eq!(working_day_label(None, 0), NO_DATE_LABEL);
    }

    #[test]
    fn test_offset_zero_on_weekday_is_start() {
        // Wednesday
        let start = ymd(2024, 9, 4);
        assert_eq!(working_day(Some(start), 0), Some(start));
    }

    #[test]
    fn test_weekend_start_moves_to_monday() {
        let saturday = ymd(2024, 9, 7);
        let sunday = ymd(2024, 9, 8);
        let monday = ymd(2024, 9, 9);
        assert_eq!(working_day(Some(saturday), 0), Some(monday));
        assert_eq!(working_day(Some(sunday), 0), Some(monday));
    }

    #[test]
    fn test_tenth_day_from_monday_is_two_weeks_later() {
        let monday = ymd(2024, 9, 2);
        let tenth = working_day(Some(monday), 9).unwrap();
        assert_eq!(tenth, ymd(2024, 9, 13));
        assert_eq!(tenth - monday, Duration::days(11));
        assert_eq!(tenth.weekday(), Weekday::Fri);
    }

    #[test]
    fn test_friday_to_monday() {
        let friday = ymd(2024, 9, 6);
        assert_eq!(working_day(Some(friday), 1), Some(ymd(2024, 9, 9)));
    }

    #[test]
    fn test_never_lands_on_weekend() {
        let first = ymd(2024, 1, 1);
        for start_offset in 0..14 {
            let start = first + Duration::days(start_offset);
            for offset in 0..30 {
                let day = working_day(Some(start), offset).unwrap();
                assert!(!is_weekend(day), "{start} + {offset} landed on {day}");
                assert!(day >= start);
            }
        }
    }

    #[test]
    fn test_consecutive_offsets_are_increasing() {
        let start = ymd(2025, 2, 27);
        let days: Vec<_> = (0..10)
            .map(|offset| working_day(Some(start), offset).unwrap())
            .collect();
        assert!(days.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn test_label_is_long_french_date() {
        let monday = ymd(2024, 9, 2);
        assert_eq!(working_day_label(Some(monday), 0), "lundi 2 septembre 2024");
        assert_eq!(working_day_label(Some(monday), 4), "vendredi 6 septembre 2024");
    }

    #[test]
    fn test_is_weekend() {
        assert!(is_weekend(ymd(2024, 9, 7)));
        assert!(is_weekend(ymd(2024, 9, 8)));
        assert!(!is_weekend(ymd(2024, 9, 9)));
    }
}
