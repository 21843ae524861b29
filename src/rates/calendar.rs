//! Business-day calendar for settlement and reference-rate resolution.
//!
//! Reference rates are published on Polish business days, so the backward
//! search uses the Polish holiday calendar (weekends, fixed holidays and the
//! Easter-derived movable feasts). Settlement offsets use a simplified
//! venue-agnostic calendar that only skips weekends.

use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Fixed-date Polish public holidays as (month, day)
const FIXED_HOLIDAYS: [(u32, u32); 9] = [
    (1, 1),   // New Year
    (1, 6),   // Epiphany
    (5, 1),   // Labour Day
    (5, 3),   // Constitution Day
    (8, 15),  // Assumption
    (11, 1),  // All Saints' Day
    (11, 11), // Independence Day
    (12, 25), // Christmas Day
    (12, 26), // Second Christmas Day
];

/// US/CA/MX moved from T+2 to T+1 settlement on this date
const T1_CUTOVER: (i32, u32, u32) = (2024, 5, 28);

/// Easter Sunday via the anonymous Gregorian computus
pub fn easter_sunday(year: i32) -> NaiveDate {
    let a = year % 19;
    let b = year / 100;
    let c = year % 100;
    let d = b / 4;
    let e = b % 4;
    let f = (b + 8) / 25;
    let g = (b - f + 1) / 3;
    let h = (19 * a + b - d - g + 15) % 30;
    let i = c / 4;
    let k = c % 4;
    let l = (32 + 2 * e + 2 * i - h - k) % 7;
    let m = (a + 11 * h + 22 * l) / 451;
    let month = (h + l - 7 * m + 114) / 31;
    let day = (h + l - 7 * m + 114) % 31 + 1;
    NaiveDate::from_ymd_opt(year, month as u32, day as u32).expect("computus yields a valid date")
}

fn is_holiday(date: NaiveDate) -> bool {
    let md = (date.month(), date.day());
    if FIXED_HOLIDAYS.contains(&md) {
        return true;
    }

    let easter = easter_sunday(date.year());
    date == easter
        || date == easter + Duration::days(1) // Easter Monday
        || date == easter + Duration::days(49) // Pentecost
        || date == easter + Duration::days(60) // Corpus Christi
}

/// A Polish business day: not a weekend, not a public holiday
pub fn is_business_day(date: NaiveDate) -> bool {
    !matches!(date.weekday(), Weekday::Sat | Weekday::Sun) && !is_holiday(date)
}

/// Last business day strictly before `date`
pub fn previous_business_day(date: NaiveDate) -> NaiveDate {
    let mut candidate = date - Duration::days(1);
    while !is_business_day(candidate) {
        candidate -= Duration::days(1);
    }
    candidate
}

/// Settlement date for a trade under the venue offset rule.
///
/// US/CA/MX venues settle T+1 on or after the 2024-05-28 cutover, everything
/// else T+2. The offset count skips weekends only; the foreign venue's own
/// holiday calendar is deliberately not modeled.
pub fn settlement_date(trade_date: NaiveDate, venue_hint: &str) -> NaiveDate {
    let cutover = NaiveDate::from_ymd_opt(T1_CUTOVER.0, T1_CUTOVER.1, T1_CUTOVER.2)
        .expect("valid cutover date");
    let t1_venue = matches!(venue_hint.to_uppercase().as_str(), "US" | "CA" | "MX");
    let offset = if t1_venue && trade_date >= cutover { 1 } else { 2 };

    let mut settle = trade_date;
    let mut days_added = 0;
    while days_added < offset {
        settle += Duration::days(1);
        if !matches!(settle.weekday(), Weekday::Sat | Weekday::Sun) {
            days_added += 1;
        }
    }
    settle
}
