#![forbid(unsafe_code)]
//! Shiftplan — moteur d'affectation de shifts récurrents (sans BD).
//!
//! - Un seul passage glouton par créneau, déterministe.
//! - Règles : séquences interdites, suivis obligatoires, paires de shifts.
//! - Équilibrage par quotas d'équipe, heures cumulées et rotation des apprentis.
//! - La demande non couverte est rendue sous forme de conflits, jamais d'erreur.

pub mod io;
pub mod model;
pub mod scheduler;
pub mod validate;

pub use model::{
    Absence, Employee, EmployeeId, EmploymentCategory, FollowUpExemption, HalfDay, RuleId,
    ShiftAssignment, ShiftPairing, ShiftRule, ShiftType, ShiftTypeId, Team, TeamId, WeeklyNeeds,
    WorkDay,
};
pub use scheduler::{
    audit, is_available, schedule, EngineConfig, RotationMode, SchedError, ScheduleOptions,
    ScheduleResult, Scheduler, Statistics, Violation, ViolationKind, WorkloadStats,
};
pub use validate::{validate, ConfigIssue};
