use super::{conflicts, util, SchedError, Scheduler};
use crate::model::{Employee, EmployeeId, ShiftAssignment, ShiftRule, ShiftType, ShiftTypeId, WorkDay};
use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

/// Vrai si une règle `forbidden_sequence` relie les deux affectations,
/// dans un sens ou dans l'autre.
pub(super) fn forbidden_between(
    rules: &[ShiftRule],
    a: (&ShiftTypeId, NaiveDate),
    b: (&ShiftTypeId, NaiveDate),
) -> bool {
    rules.iter().any(|rule| {
        let ShiftRule::ForbiddenSequence {
            from, to, same_day, ..
        } = rule
        else {
            return false;
        };
        let gap = if *same_day { 0 } else { 1 };
        let forward = a.0 == from && to.contains(b.0) && util::days_between(a.1, b.1) == gap;
        let backward = b.0 == from && to.contains(a.0) && util::days_between(b.1, a.1) == gap;
        forward || backward
    })
}

enum FollowUp {
    Place,
    Skip,
    Blocked(&'static str),
}

impl<'a> Scheduler<'a> {
    /// Vrai dès qu'une affectation existante de `employee` forme une
    /// séquence interdite avec `shift` le jour `date`.
    pub fn violates_forbidden_sequence(
        &self,
        employee: &EmployeeId,
        date: NaiveDate,
        shift: &ShiftTypeId,
    ) -> bool {
        self.assignments
            .iter()
            .filter(|a| &a.employee_id == employee)
            .any(|a| forbidden_between(&self.opts.rules, (&a.shift_type_id, a.date), (shift, date)))
    }

    /// Applique les suivis obligatoires déclenchés par `shift` ; renvoie le
    /// nombre d'affectations créées. Idempotent.
    pub fn apply_mandatory_follow_ups(
        &mut self,
        employee: &EmployeeId,
        date: NaiveDate,
        shift: &ShiftTypeId,
    ) -> Result<usize, SchedError> {
        let emp = self
            .employee(employee)
            .ok_or_else(|| SchedError::UnknownEmployee(employee.to_string()))?;
        if self.shift(shift).is_none() {
            return Err(SchedError::UnknownShiftType(shift.to_string()));
        }
        Ok(self.follow_ups_from(emp, date, shift, 0))
    }

    pub(super) fn follow_ups_from(
        &mut self,
        employee: &'a Employee,
        date: NaiveDate,
        trigger: &ShiftTypeId,
        depth: u8,
    ) -> usize {
        let opts = self.opts;
        let mut created = 0;

        for rule in &opts.rules {
            let ShiftRule::MandatoryFollowUp {
                id, from, to, same_day,
            } = rule
            else {
                continue;
            };
            if from != trigger {
                continue;
            }
            let Some(target) = self.shift(to) else {
                debug!(rule = %id, shift = %to, "follow-up rule targets unknown shift type, skipped");
                continue;
            };
            if depth >= opts.config.max_follow_up_depth {
                warn!(rule = %id, depth, employee = %employee.id, "follow-up chain depth cap reached");
                continue;
            }

            let follow_date = if *same_day {
                date
            } else {
                date + Duration::days(1)
            };

            match self.check_follow_up(employee, (trigger, date), target, follow_date) {
                FollowUp::Place => {
                    debug!(employee = %employee.id, shift = %target.name, date = %follow_date, "follow-up placed");
                    self.commit(ShiftAssignment {
                        employee_id: employee.id.clone(),
                        shift_type_id: target.id.clone(),
                        date: follow_date,
                        locked: false,
                        is_follow_up: true,
                    });
                    created += 1;
                    created += self.follow_ups_from(employee, follow_date, &target.id, depth + 1);
                }
                FollowUp::Skip => {}
                FollowUp::Blocked(reason) => {
                    self.conflicts
                        .push(conflicts::follow_up_blocked(employee, target, follow_date, reason));
                }
            }
        }

        created
    }

    fn check_follow_up(
        &self,
        employee: &Employee,
        trigger: (&ShiftTypeId, NaiveDate),
        target: &ShiftType,
        date: NaiveDate,
    ) -> FollowUp {
        let exempt = self.opts.exemptions.iter().any(|x| {
            &x.from == trigger.0
                && x.to == target.id
                && employee.is_apprentice()
                && employee.cohort_year == Some(x.cohort_year)
        });
        if exempt {
            return FollowUp::Skip;
        }
        if self.holds(&employee.id, date, &target.id) {
            return FollowUp::Skip;
        }
        if self.opts.config.follow_up_capacity_check {
            let needed = WorkDay::from_date(date).map_or(0, |d| target.weekly_needs.for_day(d));
            if self.assigned_count(date, &target.id) >= needed {
                return FollowUp::Skip;
            }
        }
        if !employee.can_work(&target.id) {
            return FollowUp::Blocked("not permitted on this shift");
        }
        if !self.is_available(employee, date, target) {
            return FollowUp::Blocked("employee unavailable");
        }
        let other_primary = self.assignments.iter().any(|a| {
            a.employee_id == employee.id
                && a.date == date
                && a.is_primary()
                && !(a.date == trigger.1
                    && (&a.shift_type_id == trigger.0 || self.paired(trigger.0, &a.shift_type_id)))
        });
        if other_primary {
            return FollowUp::Blocked("already assigned that day");
        }
        if self.violates_forbidden_sequence(&employee.id, date, &target.id) {
            return FollowUp::Blocked("forbidden sequence");
        }
        FollowUp::Place
    }
}
