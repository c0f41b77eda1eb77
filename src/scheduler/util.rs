use crate::model::{ShiftType, WorkDay};
use chrono::{Datelike, Duration, NaiveDate, Timelike};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Durée d'un shift en heures ; `end < start` = passage de minuit.
pub fn shift_duration_hours(shift: &ShiftType) -> f64 {
    let start = minutes_of(shift.start);
    let mut end = minutes_of(shift.end);
    if end < start {
        end += MINUTES_PER_DAY;
    }
    (end - start) as f64 / 60.0
}

/// Nom du jour (`"monday"` ..), `None` le week-end.
pub fn weekday_name(date: NaiveDate) -> Option<&'static str> {
    WorkDay::from_date(date).map(WorkDay::name)
}

/// Lundi de la semaine de `date`.
pub fn week_key(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

pub(super) fn minutes_of(t: chrono::NaiveTime) -> i64 {
    i64::from(t.hour()) * 60 + i64::from(t.minute())
}

pub(super) fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    to.signed_duration_since(from).num_days()
}

/// Dates de `start..=end`.
pub(super) fn date_range(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    start
        .iter_days()
        .take_while(move |d| *d <= end)
}
