use chrono::{Datelike, Duration, NaiveDate, Weekday};

/// Target dates for the two prediction horizons, computed from the current
/// UTC calendar date. Both roll forward over weekends: Saturday jumps to
/// Monday (+2), Sunday to Monday (+1). Exchange holidays are not modelled.
pub fn prediction_dates(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    (next_business_day(today), next_business_week(today))
}

pub fn next_business_day(from: NaiveDate) -> NaiveDate {
    roll_forward(from + Duration::days(1))
}

pub fn next_business_week(from: NaiveDate) -> NaiveDate {
    roll_forward(from + Duration::days(7))
}

fn roll_forward(date: NaiveDate) -> NaiveDate {
    match date.weekday() {
        Weekday::Sat => date + Duration::days(2),
        Weekday::Sun => date + Duration::days(1),
        _ => date,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn midweek_day_advances_one() {
        // 2026-08-25 is Tuesday.
        assert_eq!(next_business_day(d(2026, 8, 25)), d(2026, 8, 26));
    }

    #[test]
    fn friday_rolls_to_monday() {
        // 2026-08-28 is Friday; +1 lands on Saturday.
        assert_eq!(next_business_day(d(2026, 8, 28)), d(2026, 8, 31));
    }

    #[test]
    fn saturday_rolls_to_monday() {
        // 2026-08-29 is Saturday; +1 lands on Sunday.
        assert_eq!(next_business_day(d(2026, 8, 29)), d(2026, 8, 31));
    }

    #[test]
    fn week_horizon_uses_same_rollforward() {
        // Saturday + 7 lands on Saturday again, so the week target is the
        // Monday after.
        assert_eq!(next_business_week(d(2026, 8, 29)), d(2026, 9, 7));
        // Tuesday + 7 is a Tuesday, no roll.
        assert_eq!(next_business_week(d(2026, 8, 25)), d(2026, 9, 1));
    }

    #[test]
    fn both_horizons_from_one_date() {
        // 2026-08-28 is Friday.
        let (day, week) = prediction_dates(d(2026, 8, 28));
        assert_eq!(day, d(2026, 8, 31));
        assert_eq!(week, d(2026, 9, 4));
    }
}
