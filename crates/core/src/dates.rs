//! Next-visit date calculation.
//!
//! Clinic visits happen on a fixed weekday; the first slide shows the date of the next
//! one. "Next" is strictly in the future: on a Tuesday the answer is a week away.

use chrono::{Datelike, Days, NaiveDate, Weekday};

/// Date of the next `target` weekday strictly after `today`.
///
/// Returns `None` only if the calendar overflows.
pub fn next_weekday(today: NaiveDate, target: Weekday) -> Option<NaiveDate> {
    let dow = today.weekday().num_days_from_sunday();
    let target = target.num_days_from_sunday();
    let delta = match (target + 7 - dow) % 7 {
        0 => 7,
        d => d,
    };
    today.checked_add_days(Days::new(u64::from(delta)))
}

pub fn next_tuesday(today: NaiveDate) -> Option<NaiveDate> {
    next_weekday(today, Weekday::Tue)
}

/// Format a date the pt-BR way, `DD/MM/YYYY`.
pub fn format_br(date: NaiveDate) -> String {
    date.format("%d/%m/%Y").to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_tuesday_is_strictly_future_for_every_weekday() {
        // 2025-06-01 is a Sunday; walk a full week.
        let sunday = date(2025, 6, 1);
        for offset in 0..7 {
            let today = sunday + Days::new(offset);
            let next = next_tuesday(today).unwrap();
            assert!(next > today, "{next} should be after {today}");
            assert_eq!(next.weekday(), Weekday::Tue);
            assert!((next - today).num_days() <= 7);
        }
    }

    #[test]
    fn tuesday_rolls_over_a_full_week() {
        let tuesday = date(2025, 6, 3);
        assert_eq!(next_tuesday(tuesday), Some(date(2025, 6, 10)));
    }

    #[test]
    fn monday_gives_the_following_day() {
        assert_eq!(next_tuesday(date(2025, 6, 2)), Some(date(2025, 6, 3)));
    }

    #[test]
    fn crosses_year_boundary() {
        // 2025-12-31 is a Wednesday.
        assert_eq!(next_tuesday(date(2025, 12, 31)), Some(date(2026, 1, 6)));
    }

    #[test]
    fn formats_with_zero_padding() {
        assert_eq!(format_br(date(2025, 6, 3)), "03/06/2025");
    }

    #[test]
    fn overflow_yields_none() {
        assert_eq!(next_tuesday(NaiveDate::MAX), None);
    }
}
