use super::types::RotationMode;
use crate::model::{Employee, EmployeeId, ShiftTypeId};
use std::collections::BTreeMap;

/// Rotation des apprentis d'une même année d'apprentissage.
#[derive(Debug)]
pub(super) struct RotationTracker {
    mode: RotationMode,
    cohorts: BTreeMap<u8, Vec<EmployeeId>>,
    week_index: usize,
    usage: BTreeMap<(u8, ShiftTypeId, EmployeeId), u32>,
}

impl RotationTracker {
    pub(super) fn new(employees: &[Employee], mode: RotationMode) -> Self {
        let mut cohorts: BTreeMap<u8, Vec<EmployeeId>> = BTreeMap::new();
        for e in employees.iter().filter(|e| e.is_apprentice()) {
            if let Some(year) = e.cohort_year {
                cohorts.entry(year).or_default().push(e.id.clone());
            }
        }
        Self {
            mode,
            cohorts,
            week_index: 0,
            usage: BTreeMap::new(),
        }
    }

    pub(super) fn advance_week(&mut self) {
        self.week_index += 1;
    }

    pub(super) fn record_use(&mut self, employee: &Employee, shift: &ShiftTypeId) {
        let Some(year) = self.cohort_of(employee) else {
            return;
        };
        *self
            .usage
            .entry((year, shift.clone(), employee.id.clone()))
            .or_insert(0) += 1;
    }

    pub(super) fn usage(&self, year: u8, shift: &ShiftTypeId, employee: &EmployeeId) -> u32 {
        self.usage
            .get(&(year, shift.clone(), employee.clone()))
            .copied()
            .unwrap_or(0)
    }

    fn cohort_of(&self, employee: &Employee) -> Option<u8> {
        if !employee.is_apprentice() {
            return None;
        }
        let year = employee.cohort_year?;
        self.cohorts
            .get(&year)
            .filter(|members| members.contains(&employee.id))
            .map(|_| year)
    }

    /// Position dans l'ordre de rotation de la semaine courante (0 = préféré).
    fn rotation_rank(&self, members: &[EmployeeId], id: &EmployeeId) -> usize {
        let len = members.len();
        let idx = members.iter().position(|m| m == id).unwrap_or(0);
        (idx + len - self.week_index % len) % len
    }

    /// Réordonne les apprentis d'une même cohorte entre les places qu'ils
    /// occupent déjà dans `ranked` ; les autres candidats ne bougent pas.
    pub(super) fn reorder(&self, ranked: &mut [&Employee], shift: &ShiftTypeId) {
        for (year, members) in &self.cohorts {
            if members.len() < 2 {
                continue;
            }
            let positions: Vec<usize> = ranked
                .iter()
                .enumerate()
                .filter(|(_, e)| e.is_apprentice() && members.contains(&e.id))
                .map(|(i, _)| i)
                .collect();
            if positions.len() < 2 {
                continue;
            }

            let mut group: Vec<&Employee> = positions.iter().map(|&i| ranked[i]).collect();
            match self.mode {
                RotationMode::Weekly => {
                    group.sort_by_key(|e| self.rotation_rank(members, &e.id));
                }
                RotationMode::LeastUsed => {
                    group.sort_by_key(|e| {
                        (
                            self.usage(*year, shift, &e.id),
                            self.rotation_rank(members, &e.id),
                        )
                    });
                }
            }
            for (slot, e) in positions.into_iter().zip(group) {
                ranked[slot] = e;
            }
        }
    }
}
