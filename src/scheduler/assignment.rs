use super::{conflicts, util, Scheduler};
use crate::model::{Employee, ShiftAssignment, ShiftPairing, ShiftType, WorkDay};
use chrono::{Duration, NaiveDate};
use tracing::{debug, warn};

/// Rang de priorité d'après le préfixe du nom.
fn priority_rank(name: &str) -> u8 {
    match name.trim_start().chars().next() {
        Some('3' | '4') => 0,
        Some('2') => 1,
        Some('0' | '1') => 2,
        _ => 3,
    }
}

/// Groupes de shifts dans l'ordre de résolution. Dans un groupe : ordre
/// alphabétique, le partenaire d'une paire passe juste avant son shift lié.
pub(super) fn priority_groups<'s>(
    shift_types: &'s [ShiftType],
    pairings: &[ShiftPairing],
) -> Vec<Vec<&'s ShiftType>> {
    let mut groups: [Vec<&ShiftType>; 4] = Default::default();
    for s in shift_types {
        groups[usize::from(priority_rank(&s.name))].push(s);
    }

    for group in &mut groups {
        group.sort_by(|a, b| a.name.cmp(&b.name));
        for p in pairings {
            let lead = group.iter().position(|s| s.id == p.lead);
            let partner = group.iter().position(|s| s.id == p.partner);
            if let (Some(li), Some(pi)) = (lead, partner) {
                if pi > li {
                    let moved = group.remove(pi);
                    group.insert(li, moved);
                }
            }
        }
    }

    groups.into_iter().filter(|g| !g.is_empty()).collect()
}

pub(super) fn run(scheduler: &mut Scheduler<'_>) {
    let opts = scheduler.opts;
    let groups = priority_groups(&opts.shift_types, &scheduler.pairings);

    let mut week = util::week_key(opts.start);
    let mut first_week = true;

    'weeks: while week <= opts.end {
        if !first_week {
            scheduler.rotation.advance_week();
        }
        first_week = false;

        let days: Vec<NaiveDate> = (0..5)
            .map(|offset| week + Duration::days(offset))
            .filter(|d| *d >= opts.start && *d <= opts.end)
            .collect();

        for group in &groups {
            for &date in &days {
                for &shift in group {
                    if !scheduler.fill_shift(shift, date) {
                        break 'weeks;
                    }
                }
            }
        }

        week += Duration::days(7);
    }
}

impl<'a> Scheduler<'a> {
    /// Remplit la demande restante de `shift` pour `date`. Faux si la borne
    /// de tentatives est atteinte.
    fn fill_shift(&mut self, shift: &'a ShiftType, date: NaiveDate) -> bool {
        let Some(day) = WorkDay::from_date(date) else {
            return true;
        };
        let needed = shift.weekly_needs.for_day(day);
        let already = self.assigned_count(date, &shift.id);

        for slot in already..needed {
            self.fill_attempts += 1;
            let limit = self.opts.config.max_fill_attempts;
            if self.fill_attempts > limit {
                warn!(limit, date = %date, "fill attempt limit reached, stopping");
                self.conflicts.push(conflicts::fill_limit(limit, date));
                return false;
            }

            match self.pick(shift, date) {
                Some(employee) => {
                    debug!(employee = %employee.id, shift = %shift.name, date = %date, "assigned");
                    self.commit(ShiftAssignment::new(
                        employee.id.clone(),
                        shift.id.clone(),
                        date,
                    ));
                    self.follow_ups_from(employee, date, &shift.id, 0);
                }
                None => {
                    debug!(shift = %shift.name, date = %date, "slot left unfilled");
                    self.conflicts
                        .push(conflicts::unfilled(shift, date, slot + 1, needed));
                }
            }
        }
        true
    }

    fn pick(&mut self, shift: &'a ShiftType, date: NaiveDate) -> Option<&'a Employee> {
        if let Some(e) = self.paired_candidate(shift, date) {
            return Some(e);
        }
        self.ranked_candidate(shift, date)
    }

    /// La personne qui tient le partenaire ce jour-là reprend le shift lié.
    fn paired_candidate(&mut self, shift: &'a ShiftType, date: NaiveDate) -> Option<&'a Employee> {
        let partner_id = self
            .pairings
            .iter()
            .find(|p| p.lead == shift.id)
            .map(|p| p.partner.clone())?;
        let partner = self.shift(&partner_id)?;

        let holders: Vec<&'a Employee> = self
            .assignments
            .iter()
            .filter(|a| a.date == date && a.shift_type_id == partner_id && a.is_primary())
            .filter_map(|a| self.employee(&a.employee_id))
            .collect();

        for e in holders {
            if !e.can_work(&shift.id) || self.holds(&e.id, date, &shift.id) {
                continue;
            }
            if self.is_available(e, date, shift)
                && !self.violates_forbidden_sequence(&e.id, date, &shift.id)
            {
                return Some(e);
            }
            warn!(employee = %e.id, shift = %shift.name, date = %date, "paired shift blocked");
            self.conflicts
                .push(conflicts::pairing_blocked(e, shift, partner, date));
        }
        None
    }

    /// Libre ce jour-là et pas déjà sur ce shift.
    fn open_for(&self, e: &Employee, shift: &ShiftType, date: NaiveDate) -> bool {
        e.can_work(&shift.id) && !self.has_primary_on(&e.id, date) && !self.holds(&e.id, date, &shift.id)
    }

    fn passes_constraints(&self, e: &Employee, shift: &ShiftType, date: NaiveDate) -> bool {
        self.is_available(e, date, shift) && !self.violates_forbidden_sequence(&e.id, date, &shift.id)
    }

    /// Tous les éligibles sont classés : une équipe au-dessus de sa cible
    /// passe derrière, sans être écartée.
    fn ranked_candidate(&self, shift: &'a ShiftType, date: NaiveDate) -> Option<&'a Employee> {
        let mut ranked: Vec<&'a Employee> = self
            .opts
            .employees
            .iter()
            .filter(|e| self.open_for(e, shift, date))
            .collect();
        self.workload.rank(&mut ranked, &shift.id);
        self.rotation.reorder(&mut ranked, &shift.id);
        ranked
            .into_iter()
            .find(|e| self.passes_constraints(e, shift, date))
    }
}
