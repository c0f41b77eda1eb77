use crate::model::{
    Absence, Employee, EmployeeId, FollowUpExemption, ShiftAssignment, ShiftPairing, ShiftRule,
    ShiftType, Team, TeamId,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use thiserror::Error;

/// Stratégie de rotation entre apprentis d'une même année.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationMode {
    /// Préféré = membre suivant, change chaque semaine.
    Weekly,
    /// Préféré = membre le moins utilisé sur ce shift, rotation hebdo en départage.
    #[default]
    LeastUsed,
}

/// Réglages du moteur
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub rotation: RotationMode,
    /// Ne crée pas de suivi si le besoin du shift cible est déjà couvert.
    pub follow_up_capacity_check: bool,
    pub max_follow_up_depth: u8,
    pub max_fill_attempts: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            rotation: RotationMode::LeastUsed,
            follow_up_capacity_check: true,
            max_follow_up_depth: 4,
            max_fill_attempts: 100_000,
        }
    }
}

/// Entrée complète d'un appel à `schedule`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduleOptions {
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(default)]
    pub employees: Vec<Employee>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub shift_types: Vec<ShiftType>,
    #[serde(default)]
    pub rules: Vec<ShiftRule>,
    #[serde(default)]
    pub absences: Vec<Absence>,
    #[serde(default)]
    pub existing_assignments: Vec<ShiftAssignment>,
    /// Vide : déduit des noms `"0."` / `"1. VM"`.
    #[serde(default)]
    pub pairings: Vec<ShiftPairing>,
    #[serde(default)]
    pub exemptions: Vec<FollowUpExemption>,
    #[serde(default)]
    pub config: EngineConfig,
}

impl ScheduleOptions {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            start,
            end,
            employees: Vec::new(),
            teams: Vec::new(),
            shift_types: Vec::new(),
            rules: Vec::new(),
            absences: Vec::new(),
            existing_assignments: Vec::new(),
            pairings: Vec::new(),
            exemptions: Vec::new(),
            config: EngineConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WorkloadStats {
    pub hours: f64,
    pub shift_count: u32,
    pub target_percentage: f64,
    pub worked_dates: BTreeSet<NaiveDate>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Statistics {
    pub total_assignments: usize,
    /// Toujours égal à `conflicts.len()`.
    pub unassigned_shifts: usize,
    pub employee_workloads: BTreeMap<EmployeeId, WorkloadStats>,
    pub team_workloads: BTreeMap<TeamId, u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScheduleResult {
    pub assignments: Vec<ShiftAssignment>,
    pub conflicts: Vec<String>,
    pub statistics: Statistics,
}

#[derive(Error, Debug)]
pub enum SchedError {
    #[error("invalid date range: end {end} is before start {start}")]
    InvalidDateRange { start: NaiveDate, end: NaiveDate },
    #[error("unknown employee: {0}")]
    UnknownEmployee(String),
    #[error("unknown shift type: {0}")]
    UnknownShiftType(String),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}
