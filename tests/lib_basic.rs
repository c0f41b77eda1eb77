#![forbid(unsafe_code)]
use chrono::NaiveDate;
use shiftplan::{
    model::{HalfDay, WeeklyNeeds, WorkDay},
    schedule, Employee, EmploymentCategory, RotationMode, SchedError, ScheduleOptions,
    ShiftAssignment, ShiftRule, ShiftType, RuleId,
};

fn day(d: u32) -> NaiveDate {
    // janvier 2024 : le 1er est un lundi
    NaiveDate::from_ymd_opt(2024, 1, d).unwrap()
}

fn monday_only(n: u32) -> WeeklyNeeds {
    let mut needs = WeeklyNeeds::default();
    needs.set(WorkDay::Monday, n);
    needs
}

fn early() -> ShiftType {
    ShiftType::parse("Early", "06:00", "14:00")
        .unwrap()
        .with_needs(monday_only(1))
}

#[test]
fn single_employee_gets_monday_early() {
    let shift = early();
    let ana = Employee::new("Ana", EmploymentCategory::FullyQualified)
        .allow(&shift.id)
        .available_all_week();

    let mut opts = ScheduleOptions::new(day(1), day(5));
    opts.employees = vec![ana.clone()];
    opts.shift_types = vec![shift.clone()];

    let result = schedule(&opts).unwrap();
    assert_eq!(result.assignments.len(), 1);
    let a = &result.assignments[0];
    assert_eq!(a.employee_id, ana.id);
    assert_eq!(a.shift_type_id, shift.id);
    assert_eq!(a.date, day(1));
    assert!(!a.is_follow_up);
    assert!(result.conflicts.is_empty());
    assert_eq!(result.statistics.total_assignments, 1);
    assert_eq!(result.statistics.unassigned_shifts, 0);
    assert_eq!(result.statistics.employee_workloads[&ana.id].hours, 8.0);
}

#[test]
fn unavailable_morning_yields_conflict() {
    let shift = early();
    let mut ana = Employee::new("Ana", EmploymentCategory::FullyQualified)
        .allow(&shift.id)
        .available_all_week();
    ana.set_available(WorkDay::Monday, HalfDay::Am, false);

    let mut opts = ScheduleOptions::new(day(1), day(5));
    opts.employees = vec![ana];
    opts.shift_types = vec![shift];

    let result = schedule(&opts).unwrap();
    assert!(result.assignments.is_empty());
    assert_eq!(result.statistics.unassigned_shifts, 1);
    insta::assert_snapshot!(
        result.conflicts.join("\n"),
        @"No eligible employee for shift 'Early' on 2024-01-01 (slot 1/1)"
    );
}

#[test]
fn same_day_forbidden_sequence_leaves_slot_open() {
    let a = ShiftType::parse("A", "07:00", "11:00").unwrap().with_needs(monday_only(1));
    let b = ShiftType::parse("B", "13:00", "17:00").unwrap().with_needs(monday_only(1));
    let ana = Employee::new("Ana", EmploymentCategory::FullyQualified)
        .allow(&a.id)
        .allow(&b.id)
        .available_all_week();

    let mut opts = ScheduleOptions::new(day(1), day(5));
    opts.employees = vec![ana.clone()];
    opts.shift_types = vec![a.clone(), b.clone()];
    opts.rules = vec![ShiftRule::ForbiddenSequence {
        id: RuleId::new("a-then-b"),
        from: a.id.clone(),
        to: vec![b.id.clone()],
        same_day: true,
    }];

    let result = schedule(&opts).unwrap();
    assert_eq!(result.assignments.len(), 1);
    assert_eq!(result.assignments[0].shift_type_id, a.id);
    assert_eq!(result.conflicts.len(), 1);
    assert!(result.conflicts[0].contains("'B'"));
    assert!(result.conflicts[0].contains("2024-01-01"));
}

#[test]
fn mandatory_follow_up_is_created_same_day() {
    let a = ShiftType::parse("A", "07:00", "11:00").unwrap().with_needs(monday_only(1));
    let b = ShiftType::parse("B", "13:00", "17:00").unwrap().with_needs(monday_only(1));
    let ana = Employee::new("Ana", EmploymentCategory::FullyQualified)
        .allow(&a.id)
        .allow(&b.id)
        .available_all_week();

    let mut opts = ScheduleOptions::new(day(1), day(5));
    opts.employees = vec![ana.clone()];
    opts.shift_types = vec![a.clone(), b.clone()];
    opts.rules = vec![ShiftRule::MandatoryFollowUp {
        id: RuleId::new("a-needs-b"),
        from: a.id.clone(),
        to: b.id.clone(),
        same_day: true,
    }];

    let result = schedule(&opts).unwrap();
    assert!(result.conflicts.is_empty(), "{:?}", result.conflicts);
    assert_eq!(result.assignments.len(), 2);
    let follow = result
        .assignments
        .iter()
        .find(|x| x.shift_type_id == b.id)
        .unwrap();
    assert_eq!(follow.employee_id, ana.id);
    assert_eq!(follow.date, day(1));
    assert!(follow.is_follow_up);
    assert_eq!(result.statistics.employee_workloads[&ana.id].shift_count, 2);
}

fn cohort_plan(mode: RotationMode) -> (ScheduleOptions, Employee, Employee, ShiftType) {
    let c = ShiftType::parse("C", "08:00", "16:00")
        .unwrap()
        .with_needs(WeeklyNeeds::every_day(1));
    let lea = Employee::apprentice("Lea", 2).allow(&c.id).available_all_week();
    let tom = Employee::apprentice("Tom", 2).allow(&c.id).available_all_week();

    let mut opts = ScheduleOptions::new(day(1), day(12));
    opts.employees = vec![lea.clone(), tom.clone()];
    opts.shift_types = vec![c.clone()];
    opts.config.rotation = mode;
    (opts, lea, tom, c)
}

fn count(assignments: &[ShiftAssignment], who: &Employee, from: u32, to: u32) -> usize {
    assignments
        .iter()
        .filter(|a| a.employee_id == who.id && a.date >= day(from) && a.date <= day(to))
        .count()
}

#[test]
fn weekly_rotation_alternates_preferred_apprentice() {
    let (opts, lea, tom, _) = cohort_plan(RotationMode::Weekly);
    let result = schedule(&opts).unwrap();
    assert!(result.conflicts.is_empty());

    let week1 = (count(&result.assignments, &lea, 1, 5), count(&result.assignments, &tom, 1, 5));
    let week2 = (count(&result.assignments, &lea, 8, 12), count(&result.assignments, &tom, 8, 12));
    assert_eq!(week1, (5, 0));
    assert_eq!(week2, (0, 5));
}

#[test]
fn least_used_rotation_balances_usage() {
    let (opts, lea, tom, _) = cohort_plan(RotationMode::LeastUsed);
    let result = schedule(&opts).unwrap();
    assert!(result.conflicts.is_empty());
    assert_eq!(count(&result.assignments, &lea, 1, 12), 5);
    assert_eq!(count(&result.assignments, &tom, 1, 12), 5);
}

#[test]
fn every_slot_ends_assigned_or_in_conflict() {
    let early = ShiftType::parse("Early", "06:00", "14:00")
        .unwrap()
        .with_needs(WeeklyNeeds::every_day(2));
    let late = ShiftType::parse("Late", "14:00", "22:00")
        .unwrap()
        .with_needs(WeeklyNeeds::every_day(1));
    let ana = Employee::new("Ana", EmploymentCategory::FullyQualified)
        .allow(&early.id)
        .allow(&late.id)
        .available_all_week();
    let mut ben = Employee::new("Ben", EmploymentCategory::FullyQualified)
        .allow(&early.id)
        .available_all_week();
    ben.set_available(WorkDay::Wednesday, HalfDay::Am, false);

    let mut opts = ScheduleOptions::new(day(1), day(12));
    opts.employees = vec![ana, ben];
    opts.shift_types = vec![early, late];

    let result = schedule(&opts).unwrap();
    let demand = 10 * (2 + 1);
    assert_eq!(
        result.statistics.total_assignments + result.statistics.unassigned_shifts,
        demand
    );
    assert_eq!(result.statistics.unassigned_shifts, result.conflicts.len());
}

#[test]
fn inverted_range_fails_fast() {
    let opts = ScheduleOptions::new(day(5), day(1));
    let err = schedule(&opts).unwrap_err();
    assert!(matches!(err, SchedError::InvalidDateRange { .. }));
}

#[test]
fn weekend_days_carry_no_demand() {
    let shift = ShiftType::parse("Early", "06:00", "14:00")
        .unwrap()
        .with_needs(WeeklyNeeds::every_day(1));
    let ana = Employee::new("Ana", EmploymentCategory::FullyQualified)
        .allow(&shift.id)
        .available_all_week();

    // samedi 6 -> dimanche 7
    let mut opts = ScheduleOptions::new(day(6), day(7));
    opts.employees = vec![ana];
    opts.shift_types = vec![shift];

    let result = schedule(&opts).unwrap();
    assert!(result.assignments.is_empty());
    assert!(result.conflicts.is_empty());
}
