use chrono::{Datelike, Days, NaiveDate};
use model::entities::subscription::Frequency;

/// Advance a due date by one recurrence period.
///
/// Monthly and yearly steps keep the day-of-month, clamped to the last
/// day of the target month (Jan 31 -> Feb 28, or Feb 29 in leap years).
pub fn advance_due(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    match frequency {
        Frequency::Weekly => date + Days::new(7),
        Frequency::Monthly => add_months_keep_day(date, 1),
        Frequency::Yearly => add_months_keep_day(date, 12),
    }
}

fn add_months_keep_day(date: NaiveDate, months: u32) -> NaiveDate {
    let zero_based = date.year() * 12 + date.month() as i32 - 1 + months as i32;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month));
    NaiveDate::from_ymd_opt(year, month, day)
        .expect("day is clamped to the target month's length")
}

fn days_in_month(year: i32, month: u32) -> u32 {
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    };
    next.expect("valid month")
        .pred_opt()
        .expect("month start has a predecessor")
        .day()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn weekly_adds_seven_days() {
        assert_eq!(advance_due(d(2026, 1, 28), Frequency::Weekly), d(2026, 2, 4));
    }

    #[test]
    fn monthly_keeps_day_of_month() {
        assert_eq!(advance_due(d(2026, 3, 15), Frequency::Monthly), d(2026, 4, 15));
    }

    #[test]
    fn monthly_clamps_to_month_end() {
        assert_eq!(advance_due(d(2026, 1, 31), Frequency::Monthly), d(2026, 2, 28));
        // 2028 is a leap year.
        assert_eq!(advance_due(d(2028, 1, 31), Frequency::Monthly), d(2028, 2, 29));
        assert_eq!(advance_due(d(2026, 1, 30), Frequency::Monthly), d(2026, 2, 28));
    }

    #[test]
    fn monthly_rolls_over_december() {
        assert_eq!(advance_due(d(2025, 12, 5), Frequency::Monthly), d(2026, 1, 5));
    }

    #[test]
    fn yearly_clamps_leap_day() {
        assert_eq!(advance_due(d(2028, 2, 29), Frequency::Yearly), d(2029, 2, 28));
        assert_eq!(advance_due(d(2026, 6, 1), Frequency::Yearly), d(2027, 6, 1));
    }
}
