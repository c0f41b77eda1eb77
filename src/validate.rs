//! Contrôle de cohérence des entrées, en dehors du moteur.
//!
//! Le moteur ignore silencieusement les références pendantes ; ce module
//! les remonte pour que l'appelant puisse les corriger.

use crate::model::{EmployeeId, RuleId, ShiftRule, ShiftTypeId, TeamId};
use crate::scheduler::ScheduleOptions;
use chrono::NaiveDate;
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigIssue {
    #[error("invalid date range: end {end} is before start {start}")]
    InvertedDateRange { start: NaiveDate, end: NaiveDate },
    #[error("rule {rule} references unknown shift type {shift}")]
    RuleUnknownShift { rule: RuleId, shift: ShiftTypeId },
    #[error("employee {employee} references unknown team {team}")]
    EmployeeUnknownTeam { employee: EmployeeId, team: TeamId },
    #[error("employee {employee} is allowed on unknown shift type {shift}")]
    EmployeeUnknownShift {
        employee: EmployeeId,
        shift: ShiftTypeId,
    },
    #[error("absence references unknown employee {0}")]
    AbsenceUnknownEmployee(EmployeeId),
    #[error("absence of {employee} ends ({end}) before it starts ({start})")]
    AbsenceInverted {
        employee: EmployeeId,
        start: NaiveDate,
        end: NaiveDate,
    },
    #[error("existing assignment references unknown employee {0}")]
    AssignmentUnknownEmployee(EmployeeId),
    #[error("existing assignment references unknown shift type {0}")]
    AssignmentUnknownShift(ShiftTypeId),
    #[error("team targets sum to {0}%, above 100%")]
    TeamTargetsAbove100(f64),
    #[error("pairing references unknown shift type {0}")]
    PairingUnknownShift(ShiftTypeId),
    #[error("follow-up exemption references unknown shift type {0}")]
    ExemptionUnknownShift(ShiftTypeId),
    #[error("mandatory follow-up cycle: {}", .0.join(" -> "))]
    FollowUpCycle(Vec<String>),
}

impl ConfigIssue {
    /// Seule une plage de dates inversée empêche `schedule` de tourner.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConfigIssue::InvertedDateRange { .. })
    }
}

/// Liste les incohérences de `opts` ; ne modifie rien.
pub fn validate(opts: &ScheduleOptions) -> Vec<ConfigIssue> {
    let mut issues = Vec::new();

    if opts.end < opts.start {
        issues.push(ConfigIssue::InvertedDateRange {
            start: opts.start,
            end: opts.end,
        });
    }

    let shifts: HashSet<&ShiftTypeId> = opts.shift_types.iter().map(|s| &s.id).collect();
    let teams: HashSet<&TeamId> = opts.teams.iter().map(|t| &t.id).collect();
    let employees: HashSet<&EmployeeId> = opts.employees.iter().map(|e| &e.id).collect();

    for rule in &opts.rules {
        let referenced: Vec<&ShiftTypeId> = match rule {
            ShiftRule::ForbiddenSequence { from, to, .. } => {
                std::iter::once(from).chain(to.iter()).collect()
            }
            ShiftRule::MandatoryFollowUp { from, to, .. } => vec![from, to],
        };
        for shift in referenced.into_iter().filter(|s| !shifts.contains(s)) {
            issues.push(ConfigIssue::RuleUnknownShift {
                rule: rule.id().clone(),
                shift: shift.clone(),
            });
        }
    }

    for e in &opts.employees {
        if let Some(team) = e.team_id.as_ref().filter(|t| !teams.contains(t)) {
            issues.push(ConfigIssue::EmployeeUnknownTeam {
                employee: e.id.clone(),
                team: team.clone(),
            });
        }
        for shift in e.allowed_shifts.iter().filter(|s| !shifts.contains(s)) {
            issues.push(ConfigIssue::EmployeeUnknownShift {
                employee: e.id.clone(),
                shift: shift.clone(),
            });
        }
    }

    for a in &opts.absences {
        if !employees.contains(&a.employee_id) {
            issues.push(ConfigIssue::AbsenceUnknownEmployee(a.employee_id.clone()));
        }
        if a.end < a.start {
            issues.push(ConfigIssue::AbsenceInverted {
                employee: a.employee_id.clone(),
                start: a.start,
                end: a.end,
            });
        }
    }

    for a in &opts.existing_assignments {
        if !employees.contains(&a.employee_id) {
            issues.push(ConfigIssue::AssignmentUnknownEmployee(a.employee_id.clone()));
        }
        if !shifts.contains(&a.shift_type_id) {
            issues.push(ConfigIssue::AssignmentUnknownShift(a.shift_type_id.clone()));
        }
    }

    let total: f64 = opts.teams.iter().map(|t| t.target_percentage).sum();
    if total > 100.0 {
        issues.push(ConfigIssue::TeamTargetsAbove100(total));
    }

    for p in &opts.pairings {
        for id in [&p.lead, &p.partner] {
            if !shifts.contains(id) {
                issues.push(ConfigIssue::PairingUnknownShift(id.clone()));
            }
        }
    }
    for x in &opts.exemptions {
        for id in [&x.from, &x.to] {
            if !shifts.contains(id) {
                issues.push(ConfigIssue::ExemptionUnknownShift(id.clone()));
            }
        }
    }

    issues.extend(follow_up_cycles(opts).into_iter().map(ConfigIssue::FollowUpCycle));
    issues
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Mark {
    Active,
    Done,
}

/// Cycles du graphe `from -> to` des suivis obligatoires (noms de shifts).
fn follow_up_cycles(opts: &ScheduleOptions) -> Vec<Vec<String>> {
    let mut edges: BTreeMap<&ShiftTypeId, Vec<&ShiftTypeId>> = BTreeMap::new();
    for rule in &opts.rules {
        if let ShiftRule::MandatoryFollowUp { from, to, .. } = rule {
            edges.entry(from).or_default().push(to);
        }
    }

    let label = |id: &ShiftTypeId| {
        opts.shift_types
            .iter()
            .find(|s| &s.id == id)
            .map_or_else(|| id.to_string(), |s| s.name.clone())
    };

    let mut marks: BTreeMap<&ShiftTypeId, Mark> = BTreeMap::new();
    let mut cycles: Vec<Vec<String>> = Vec::new();
    let starts: Vec<&ShiftTypeId> = edges.keys().copied().collect();
    for start in starts {
        let mut stack = Vec::new();
        visit(start, &edges, &mut marks, &mut stack, &mut |path| {
            cycles.push(path.iter().map(|id| label(*id)).collect());
        });
    }
    cycles
}

fn visit<'s>(
    node: &'s ShiftTypeId,
    edges: &BTreeMap<&'s ShiftTypeId, Vec<&'s ShiftTypeId>>,
    marks: &mut BTreeMap<&'s ShiftTypeId, Mark>,
    stack: &mut Vec<&'s ShiftTypeId>,
    report: &mut dyn FnMut(&[&ShiftTypeId]),
) {
    if marks.contains_key(node) {
        return;
    }
    marks.insert(node, Mark::Active);
    stack.push(node);

    for &next in edges.get(node).map(Vec::as_slice).unwrap_or_default() {
        match marks.get(next) {
            Some(Mark::Active) => {
                let from = stack.iter().position(|n| *n == next).unwrap_or(0);
                let mut path: Vec<&ShiftTypeId> = stack[from..].to_vec();
                path.push(next);
                report(&path);
            }
            Some(Mark::Done) => {}
            None => visit(next, edges, marks, stack, report),
        }
    }

    stack.pop();
    marks.insert(node, Mark::Done);
}
