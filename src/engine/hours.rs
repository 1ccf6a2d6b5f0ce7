use chrono::{Datelike, NaiveDate};

use crate::model::{DaySchedule, WeeklySchedule};

/// Working hours in force on `date`.
///
/// No schedule, or no entry for the weekday, resolves to 08:00–18:00.
/// Never fails: missing configuration degrades to the default.
pub fn resolve_day_schedule(schedule: Option<&WeeklySchedule>, date: NaiveDate) -> DaySchedule {
    schedule
        .and_then(|week| week.day(date.weekday()))
        .cloned()
        .unwrap_or_else(DaySchedule::standard)
}

#[cfg(test)]
mod tests {
    use chrono::Weekday;

    use super::*;
    use crate::model::TimeOfDay;

    // 2025-03-03 is a Monday.
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).unwrap()
    }

    #[test]
    fn absent_schedule_defaults() {
        let day = resolve_day_schedule(None, monday());
        assert_eq!(day, DaySchedule::standard());
        assert!(day.enabled);
    }

    #[test]
    fn weekday_lookup() {
        let mut week = WeeklySchedule::default();
        let short = DaySchedule::new(TimeOfDay::new(9, 0).unwrap(), TimeOfDay::new(13, 0).unwrap());
        week.set(Weekday::Mon, short.clone());
        week.set(Weekday::Sun, DaySchedule::closed());

        assert_eq!(resolve_day_schedule(Some(&week), monday()), short);
        let sunday = monday() + chrono::Days::new(6);
        assert!(!resolve_day_schedule(Some(&week), sunday).enabled);
    }

    #[test]
    fn missing_weekday_falls_back_to_default() {
        let mut week = WeeklySchedule::default();
        week.set(Weekday::Mon, DaySchedule::closed());
        let tuesday = monday() + chrono::Days::new(1);
        assert_eq!(resolve_day_schedule(Some(&week), tuesday), DaySchedule::standard());
    }
}
