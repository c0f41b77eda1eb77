use super::{availability, rules, types::ScheduleOptions};
use crate::model::{Employee, EmployeeId, ShiftAssignment, ShiftType, ShiftTypeId};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{HashMap, HashSet};

pub(super) fn unfilled(shift: &ShiftType, date: NaiveDate, slot: u32, needed: u32) -> String {
    format!(
        "No eligible employee for shift '{}' on {} (slot {}/{})",
        shift.name, date, slot, needed
    )
}

pub(super) fn pairing_blocked(
    employee: &Employee,
    lead: &ShiftType,
    partner: &ShiftType,
    date: NaiveDate,
) -> String {
    format!(
        "Shift '{}' on {}: {} holds '{}' but cannot take the paired shift",
        lead.name, date, employee.name, partner.name
    )
}

pub(super) fn follow_up_blocked(
    employee: &Employee,
    target: &ShiftType,
    date: NaiveDate,
    reason: &str,
) -> String {
    format!(
        "Mandatory follow-up '{}' for {} on {} not placed: {}",
        target.name, employee.name, date, reason
    )
}

pub(super) fn fill_limit(limit: usize, date: NaiveDate) -> String {
    format!("Fill attempt limit ({limit}) reached on {date}; remaining demand left unscheduled")
}

/// Déduplique en gardant l'ordre de première apparition.
pub(super) fn dedup(conflicts: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    conflicts
        .into_iter()
        .filter(|c| seen.insert(c.clone()))
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    /// Deux affectations principales le même jour (hors paire déclarée).
    DoubleBooking,
    /// Même shift deux fois le même jour pour une personne.
    DuplicateShift,
    Unavailable,
    ForbiddenSequence,
}

#[derive(Debug, Clone, Serialize)]
pub struct Violation {
    pub employee: EmployeeId,
    pub date: NaiveDate,
    pub shift_a: ShiftTypeId,
    pub shift_b: Option<ShiftTypeId>,
    pub kind: ViolationKind,
}

/// Contrôle a posteriori d'un plan (affectations figées incluses).
pub fn audit(opts: &ScheduleOptions, assignments: &[ShiftAssignment]) -> Vec<Violation> {
    let employees: HashMap<&EmployeeId, &Employee> =
        opts.employees.iter().map(|e| (&e.id, e)).collect();
    let shifts: HashMap<&ShiftTypeId, &ShiftType> =
        opts.shift_types.iter().map(|s| (&s.id, s)).collect();
    let pairings = super::effective_pairings(opts);
    let mut out = Vec::new();

    for (idx, a) in assignments.iter().enumerate() {
        if let (Some(e), Some(s)) = (employees.get(&a.employee_id), shifts.get(&a.shift_type_id)) {
            if !availability::is_available(e, a.date, s, &opts.absences) {
                out.push(Violation {
                    employee: a.employee_id.clone(),
                    date: a.date,
                    shift_a: a.shift_type_id.clone(),
                    shift_b: None,
                    kind: ViolationKind::Unavailable,
                });
            }
        }

        for b in assignments
            .iter()
            .skip(idx + 1)
            .filter(|b| b.employee_id == a.employee_id)
        {
            let same_day = a.date == b.date;
            if same_day && a.shift_type_id == b.shift_type_id {
                out.push(pair(a, b, ViolationKind::DuplicateShift));
                continue;
            }
            let paired = pairings.iter().any(|p| {
                (p.lead == a.shift_type_id && p.partner == b.shift_type_id)
                    || (p.lead == b.shift_type_id && p.partner == a.shift_type_id)
            });
            if same_day && a.is_primary() && b.is_primary() && !paired {
                out.push(pair(a, b, ViolationKind::DoubleBooking));
            }
            if rules::forbidden_between(
                &opts.rules,
                (&a.shift_type_id, a.date),
                (&b.shift_type_id, b.date),
            ) {
                out.push(pair(a, b, ViolationKind::ForbiddenSequence));
            }
        }
    }

    out
}

fn pair(a: &ShiftAssignment, b: &ShiftAssignment, kind: ViolationKind) -> Violation {
    Violation {
        employee: a.employee_id.clone(),
        date: a.date,
        shift_a: a.shift_type_id.clone(),
        shift_b: Some(b.shift_type_id.clone()),
        kind,
    }
}
