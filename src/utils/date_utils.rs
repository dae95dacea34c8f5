use chrono::{Datelike, NaiveDate, Weekday};

pub fn is_weekend(date: NaiveDate) -> bool {
    matches!(date.weekday(), Weekday::Sat | Weekday::Sun)
}

/// Inclusive iterator over `start..=end`.
pub fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start.iter_days().take_while(move |d| *d <= end)
}

pub fn is_holiday(date: NaiveDate, holidays: &[NaiveDate]) -> bool {
    holidays.contains(&date)
}

pub fn is_workday(date: NaiveDate, holidays: &[NaiveDate]) -> bool {
    !is_weekend(date) && !is_holiday(date, holidays)
}

/// Monday to Friday days in `start..=end` that are not holidays.
pub fn working_days(start: NaiveDate, end: NaiveDate, holidays: &[NaiveDate]) -> u32 {
    days_between(start, end).filter(|d| is_workday(*d, holidays)).count() as u32
}

/// First and last day of a month, `None` for an invalid year/month.
pub fn month_bounds(year: i32, month: u32) -> Option<(NaiveDate, NaiveDate)> {
    let start = NaiveDate::from_ymd_opt(year, month, 1)?;
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)?
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)?
    };

    Some((start, next.pred_opt()?))
}
