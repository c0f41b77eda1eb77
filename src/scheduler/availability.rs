use super::util::minutes_of;
use crate::model::{Absence, Employee, HalfDay, ShiftType, WorkDay};
use chrono::{Duration, NaiveDate};

const NOON: i64 = 12 * 60;

/// Vrai si `employee` peut tenir `shift` le jour `date`.
pub fn is_available(
    employee: &Employee,
    date: NaiveDate,
    shift: &ShiftType,
    absences: &[Absence],
) -> bool {
    if absences
        .iter()
        .any(|a| a.employee_id == employee.id && a.covers(date))
    {
        return false;
    }

    let Some(day) = WorkDay::from_date(date) else {
        return false;
    };

    let start = minutes_of(shift.start);
    let end = minutes_of(shift.end);
    if start < NOON && !employee.is_free(day, HalfDay::Am) {
        return false;
    }
    if (end >= NOON || start >= NOON) && !employee.is_free(day, HalfDay::Pm) {
        return false;
    }

    // débordement de nuit sur la matinée du lendemain
    if shift.is_overnight() && end < NOON {
        let next = date + Duration::days(1);
        if let Some(next_day) = WorkDay::from_date(next) {
            if !employee.is_free(next_day, HalfDay::Am) {
                return false;
            }
        }
    }

    true
}
