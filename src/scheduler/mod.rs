mod assignment;
mod availability;
mod conflicts;
mod rotation;
mod rules;
mod types;
mod util;
mod workload;

pub use availability::is_available;
pub use conflicts::{audit, Violation, ViolationKind};
pub use types::{
    EngineConfig, RotationMode, SchedError, ScheduleOptions, ScheduleResult, Statistics,
    WorkloadStats,
};
pub use util::{shift_duration_hours, week_key, weekday_name};

use crate::model::{
    Employee, EmployeeId, ShiftAssignment, ShiftPairing, ShiftRule, ShiftType, ShiftTypeId,
    WorkDay,
};
use chrono::NaiveDate;
use rotation::RotationTracker;
use std::collections::HashMap;
use tracing::{info, warn};
use workload::WorkloadTracker;

/// Génère un plan complet pour `opts`.
pub fn schedule(opts: &ScheduleOptions) -> Result<ScheduleResult, SchedError> {
    let mut scheduler = Scheduler::new(opts)?;
    scheduler.run();
    Ok(scheduler.finish())
}

/// Paires déclarées, ou à défaut déduites des noms `"0."` / `"1. VM"`.
pub fn effective_pairings(opts: &ScheduleOptions) -> Vec<ShiftPairing> {
    if opts.pairings.is_empty() {
        ShiftPairing::from_names(&opts.shift_types)
    } else {
        opts.pairings.clone()
    }
}

/// Contexte d'une exécution : tous les compteurs mutables d'un appel.
#[derive(Debug)]
pub struct Scheduler<'a> {
    opts: &'a ScheduleOptions,
    employees: HashMap<&'a EmployeeId, &'a Employee>,
    shifts: HashMap<&'a ShiftTypeId, &'a ShiftType>,
    durations: HashMap<&'a ShiftTypeId, f64>,
    pairings: Vec<ShiftPairing>,
    assignments: Vec<ShiftAssignment>,
    conflicts: Vec<String>,
    workload: WorkloadTracker,
    rotation: RotationTracker,
    fill_attempts: usize,
}

impl<'a> Scheduler<'a> {
    /// Initialise les index, les cibles d'équipe et les compteurs à partir
    /// des affectations existantes.
    pub fn new(opts: &'a ScheduleOptions) -> Result<Self, SchedError> {
        if opts.end < opts.start {
            return Err(SchedError::InvalidDateRange {
                start: opts.start,
                end: opts.end,
            });
        }

        let employees = opts.employees.iter().map(|e| (&e.id, e)).collect();
        let shifts: HashMap<_, _> = opts.shift_types.iter().map(|s| (&s.id, s)).collect();
        let durations = opts
            .shift_types
            .iter()
            .map(|s| (&s.id, shift_duration_hours(s)))
            .collect();

        for rule in &opts.rules {
            let dangling = match rule {
                ShiftRule::ForbiddenSequence { from, to, .. } => std::iter::once(from)
                    .chain(to.iter())
                    .find(|id| !shifts.contains_key(id)),
                ShiftRule::MandatoryFollowUp { from, to, .. } => {
                    [from, to].into_iter().find(|id| !shifts.contains_key(id))
                }
            };
            if let Some(id) = dangling {
                warn!(rule = %rule.id(), shift = %id, "rule references unknown shift type");
            }
        }

        let total_slots = util::date_range(opts.start, opts.end)
            .filter_map(WorkDay::from_date)
            .map(|day| {
                opts.shift_types
                    .iter()
                    .map(|s| s.weekly_needs.for_day(day))
                    .sum::<u32>()
            })
            .sum();

        let mut scheduler = Self {
            opts,
            employees,
            shifts,
            durations,
            pairings: effective_pairings(opts),
            assignments: Vec::with_capacity(opts.existing_assignments.len()),
            conflicts: Vec::new(),
            workload: WorkloadTracker::new(&opts.employees, &opts.teams, total_slots),
            rotation: RotationTracker::new(&opts.employees, opts.config.rotation),
            fill_attempts: 0,
        };

        for existing in &opts.existing_assignments {
            if scheduler.employee(&existing.employee_id).is_none()
                || scheduler.shift(&existing.shift_type_id).is_none()
            {
                warn!(
                    employee = %existing.employee_id,
                    shift = %existing.shift_type_id,
                    "existing assignment references unknown entity, kept without counters"
                );
            }
            scheduler.commit(existing.clone());
        }

        Ok(scheduler)
    }

    pub fn run(&mut self) {
        info!(
            start = %self.opts.start,
            end = %self.opts.end,
            employees = self.opts.employees.len(),
            shift_types = self.opts.shift_types.len(),
            "scheduling run started"
        );
        assignment::run(self);
    }

    pub fn finish(self) -> ScheduleResult {
        let conflicts = conflicts::dedup(self.conflicts);
        let (employee_workloads, team_workloads) = self.workload.into_parts();
        info!(
            assignments = self.assignments.len(),
            conflicts = conflicts.len(),
            "scheduling run finished"
        );
        ScheduleResult {
            statistics: Statistics {
                total_assignments: self.assignments.len(),
                unassigned_shifts: conflicts.len(),
                employee_workloads,
                team_workloads,
            },
            assignments: self.assignments,
            conflicts,
        }
    }

    pub fn assignments(&self) -> &[ShiftAssignment] {
        &self.assignments
    }

    pub fn conflicts(&self) -> &[String] {
        &self.conflicts
    }

    /// Évaluation de disponibilité avec les absences de l'appel.
    pub fn is_available(&self, employee: &Employee, date: NaiveDate, shift: &ShiftType) -> bool {
        availability::is_available(employee, date, shift, &self.opts.absences)
    }

    /// Enregistre une affectation et met à jour les compteurs.
    pub fn commit(&mut self, assignment: ShiftAssignment) {
        let employee = self.employee(&assignment.employee_id);
        let hours = self.durations.get(&assignment.shift_type_id).copied();
        if let (Some(e), Some(h)) = (employee, hours) {
            self.workload.record(e, assignment.date, h);
            self.rotation.record_use(e, &assignment.shift_type_id);
        }
        self.assignments.push(assignment);
    }

    fn employee(&self, id: &EmployeeId) -> Option<&'a Employee> {
        self.employees.get(id).copied()
    }

    fn shift(&self, id: &ShiftTypeId) -> Option<&'a ShiftType> {
        self.shifts.get(id).copied()
    }

    fn has_primary_on(&self, employee: &EmployeeId, date: NaiveDate) -> bool {
        self.assignments
            .iter()
            .any(|a| &a.employee_id == employee && a.date == date && a.is_primary())
    }

    fn holds(&self, employee: &EmployeeId, date: NaiveDate, shift: &ShiftTypeId) -> bool {
        self.assignments.iter().any(|a| {
            &a.employee_id == employee && a.date == date && &a.shift_type_id == shift
        })
    }

    fn assigned_count(&self, date: NaiveDate, shift: &ShiftTypeId) -> u32 {
        self.assignments
            .iter()
            .filter(|a| a.date == date && &a.shift_type_id == shift)
            .count() as u32
    }

    fn paired(&self, a: &ShiftTypeId, b: &ShiftTypeId) -> bool {
        self.pairings.iter().any(|p| {
            (&p.lead == a && &p.partner == b) || (&p.lead == b && &p.partner == a)
        })
    }
}
