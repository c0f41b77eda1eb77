use super::types::WorkloadStats;
use crate::model::{Employee, EmployeeId, ShiftTypeId, Team, TeamId};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use tracing::warn;

#[derive(Debug, Clone, Copy, Default)]
struct TeamLoad {
    assigned: u32,
    target: u32,
}

/// Compteurs d'heures par personne et de créneaux par équipe.
#[derive(Debug, Default)]
pub(super) struct WorkloadTracker {
    employees: BTreeMap<EmployeeId, WorkloadStats>,
    teams: BTreeMap<TeamId, TeamLoad>,
}

impl WorkloadTracker {
    pub(super) fn new(employees: &[Employee], teams: &[Team], total_slots: u32) -> Self {
        let team_loads: BTreeMap<TeamId, TeamLoad> = teams
            .iter()
            .map(|t| {
                let target = (t.target_percentage / 100.0 * f64::from(total_slots)).round();
                let load = TeamLoad {
                    assigned: 0,
                    target: target.max(0.0) as u32,
                };
                (t.id.clone(), load)
            })
            .collect();

        let stats = employees
            .iter()
            .map(|e| {
                let team_target = e
                    .team_id
                    .as_ref()
                    .and_then(|id| teams.iter().find(|t| &t.id == id))
                    .map(|t| t.target_percentage);
                if let Some(team) = &e.team_id {
                    if team_target.is_none() {
                        warn!(employee = %e.id, team = %team, "employee references unknown team");
                    }
                }
                let target_percentage = e.percentage_override.or(team_target).unwrap_or(e.grade);
                let s = WorkloadStats {
                    target_percentage,
                    ..WorkloadStats::default()
                };
                (e.id.clone(), s)
            })
            .collect();

        Self {
            employees: stats,
            teams: team_loads,
        }
    }

    pub(super) fn record(&mut self, employee: &Employee, date: NaiveDate, hours: f64) {
        let stats = self.employees.entry(employee.id.clone()).or_default();
        stats.hours += hours;
        stats.shift_count += 1;
        stats.worked_dates.insert(date);

        if let Some(load) = employee.team_id.as_ref().and_then(|t| self.teams.get_mut(t)) {
            load.assigned += 1;
        }
    }

    pub(super) fn hours(&self, id: &EmployeeId) -> f64 {
        self.employees.get(id).map_or(0.0, |s| s.hours)
    }

    /// assigned/target de l'équipe ; sans équipe ou cible nulle : +inf.
    pub(super) fn fill_ratio(&self, employee: &Employee) -> f64 {
        match employee.team_id.as_ref().and_then(|t| self.teams.get(t)) {
            Some(load) if load.target > 0 => f64::from(load.assigned) / f64::from(load.target),
            _ => f64::INFINITY,
        }
    }

    /// Tri stable : ratio d'équipe, heures cumulées, puis aptitude décroissante.
    pub(super) fn rank(&self, candidates: &mut [&Employee], shift: &ShiftTypeId) {
        candidates.sort_by(|a, b| {
            self.fill_ratio(a)
                .total_cmp(&self.fill_ratio(b))
                .then_with(|| self.hours(&a.id).total_cmp(&self.hours(&b.id)))
                .then_with(|| b.suitability_for(shift).cmp(&a.suitability_for(shift)))
        });
    }

    pub(super) fn into_parts(self) -> (BTreeMap<EmployeeId, WorkloadStats>, BTreeMap<TeamId, u32>) {
        let teams = self
            .teams
            .into_iter()
            .map(|(id, load)| (id, load.assigned))
            .collect();
        (self.employees, teams)
    }
}
