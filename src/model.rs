use chrono::{Datelike, NaiveDate, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use uuid::Uuid;

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        pub struct $name(String);

        impl $name {
            pub fn new<S: AsRef<str>>(s: S) -> Self {
                Self(s.as_ref().to_owned())
            }
            pub fn random() -> Self {
                Self(Uuid::new_v4().to_string())
            }
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(
    /// Identifiant fort pour Employee
    EmployeeId
);
string_id!(
    /// Identifiant fort pour Team
    TeamId
);
string_id!(
    /// Identifiant fort pour ShiftType
    ShiftTypeId
);
string_id!(RuleId);

/// Jour ouvré (seuls lundi..vendredi sont planifiables).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkDay {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
}

impl WorkDay {
    pub const ALL: [WorkDay; 5] = [
        WorkDay::Monday,
        WorkDay::Tuesday,
        WorkDay::Wednesday,
        WorkDay::Thursday,
        WorkDay::Friday,
    ];

    /// `None` pour samedi/dimanche : pas un jour de planification.
    pub fn from_date(date: NaiveDate) -> Option<Self> {
        match date.weekday() {
            Weekday::Mon => Some(WorkDay::Monday),
            Weekday::Tue => Some(WorkDay::Tuesday),
            Weekday::Wed => Some(WorkDay::Wednesday),
            Weekday::Thu => Some(WorkDay::Thursday),
            Weekday::Fri => Some(WorkDay::Friday),
            Weekday::Sat | Weekday::Sun => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            WorkDay::Monday => "monday",
            WorkDay::Tuesday => "tuesday",
            WorkDay::Wednesday => "wednesday",
            WorkDay::Thursday => "thursday",
            WorkDay::Friday => "friday",
        }
    }
}

impl fmt::Display for WorkDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Demi-journée de disponibilité.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalfDay {
    Am,
    Pm,
}

impl HalfDay {
    pub fn suffix(self) -> &'static str {
        match self {
            HalfDay::Am => "AM",
            HalfDay::Pm => "PM",
        }
    }
}

/// Clé de la carte de disponibilité : `"{weekday}_{AM|PM}"`.
pub fn availability_key(day: WorkDay, half: HalfDay) -> String {
    format!("{}_{}", day.name(), half.suffix())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EmploymentCategory {
    FullyQualified,
    Apprentice,
}

/// Collaborateur planifiable (lu seulement par le moteur).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Employee {
    pub id: EmployeeId,
    pub name: String,
    pub category: EmploymentCategory,
    /// Année d'apprentissage (apprentis uniquement).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cohort_year: Option<u8>,
    /// Taux d'activité de base, en pourcent.
    #[serde(default = "full_grade")]
    pub grade: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub percentage_override: Option<f64>,
    #[serde(default)]
    pub allowed_shifts: BTreeSet<ShiftTypeId>,
    /// Aptitude 0..=5 par type de shift, départage le classement.
    #[serde(default)]
    pub suitability: BTreeMap<ShiftTypeId, u8>,
    /// `"monday_AM" -> true` ; clé absente = indisponible.
    #[serde(default)]
    pub availability: BTreeMap<String, bool>,
}

fn full_grade() -> f64 {
    100.0
}

impl Employee {
    pub fn new<N: Into<String>>(name: N, category: EmploymentCategory) -> Self {
        Self {
            id: EmployeeId::random(),
            name: name.into(),
            category,
            cohort_year: None,
            grade: full_grade(),
            team_id: None,
            percentage_override: None,
            allowed_shifts: BTreeSet::new(),
            suitability: BTreeMap::new(),
            availability: BTreeMap::new(),
        }
    }

    pub fn apprentice<N: Into<String>>(name: N, cohort_year: u8) -> Self {
        let mut e = Self::new(name, EmploymentCategory::Apprentice);
        e.cohort_year = Some(cohort_year);
        e
    }

    pub fn allow(mut self, shift: &ShiftTypeId) -> Self {
        self.allowed_shifts.insert(shift.clone());
        self
    }

    pub fn in_team(mut self, team: &TeamId) -> Self {
        self.team_id = Some(team.clone());
        self
    }

    /// Disponible matin et après-midi du lundi au vendredi.
    pub fn available_all_week(mut self) -> Self {
        for day in WorkDay::ALL {
            self.set_available(day, HalfDay::Am, true);
            self.set_available(day, HalfDay::Pm, true);
        }
        self
    }

    pub fn set_available(&mut self, day: WorkDay, half: HalfDay, value: bool) {
        self.availability.insert(availability_key(day, half), value);
    }

    pub fn is_free(&self, day: WorkDay, half: HalfDay) -> bool {
        self.availability
            .get(&availability_key(day, half))
            .copied()
            .unwrap_or(false)
    }

    pub fn can_work(&self, shift: &ShiftTypeId) -> bool {
        self.allowed_shifts.contains(shift)
    }

    pub fn suitability_for(&self, shift: &ShiftTypeId) -> u8 {
        self.suitability.get(shift).copied().unwrap_or(0).min(5)
    }

    pub fn is_apprentice(&self) -> bool {
        self.category == EmploymentCategory::Apprentice
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    /// Part cible (en pourcent) de l'ensemble des créneaux.
    pub target_percentage: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leader: Option<EmployeeId>,
}

impl Team {
    pub fn new<N: Into<String>>(name: N, target_percentage: f64) -> Self {
        Self {
            id: TeamId::random(),
            name: name.into(),
            target_percentage,
            leader: None,
        }
    }
}

/// Besoin (nombre de personnes) par jour ouvré.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WeeklyNeeds {
    pub monday: u32,
    pub tuesday: u32,
    pub wednesday: u32,
    pub thursday: u32,
    pub friday: u32,
}

impl WeeklyNeeds {
    pub fn every_day(n: u32) -> Self {
        Self {
            monday: n,
            tuesday: n,
            wednesday: n,
            thursday: n,
            friday: n,
        }
    }

    pub fn for_day(&self, day: WorkDay) -> u32 {
        match day {
            WorkDay::Monday => self.monday,
            WorkDay::Tuesday => self.tuesday,
            WorkDay::Wednesday => self.wednesday,
            WorkDay::Thursday => self.thursday,
            WorkDay::Friday => self.friday,
        }
    }

    pub fn set(&mut self, day: WorkDay, n: u32) {
        match day {
            WorkDay::Monday => self.monday = n,
            WorkDay::Tuesday => self.tuesday = n,
            WorkDay::Wednesday => self.wednesday = n,
            WorkDay::Thursday => self.thursday = n,
            WorkDay::Friday => self.friday = n,
        }
    }
}

/// Type de shift récurrent. `end < start` désigne un shift de nuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShiftType {
    pub id: ShiftTypeId,
    pub name: String,
    #[serde(with = "hhmm")]
    pub start: NaiveTime,
    #[serde(with = "hhmm")]
    pub end: NaiveTime,
    #[serde(default)]
    pub weekly_needs: WeeklyNeeds,
}

impl ShiftType {
    pub fn new<N: Into<String>>(name: N, start: NaiveTime, end: NaiveTime) -> Self {
        Self {
            id: ShiftTypeId::random(),
            name: name.into(),
            start,
            end,
            weekly_needs: WeeklyNeeds::default(),
        }
    }

    /// Construit depuis des heures `HH:MM`.
    pub fn parse<N: Into<String>>(name: N, start: &str, end: &str) -> Result<Self, String> {
        let start = hhmm::parse(start)?;
        let end = hhmm::parse(end)?;
        Ok(Self::new(name, start, end))
    }

    pub fn with_needs(mut self, needs: WeeklyNeeds) -> Self {
        self.weekly_needs = needs;
        self
    }

    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }
}

/// Règle de séquence, discriminée par `kind`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ShiftRule {
    /// Interdit `from` suivi d'un des `to` (même jour ou lendemain).
    ForbiddenSequence {
        id: RuleId,
        from: ShiftTypeId,
        to: Vec<ShiftTypeId>,
        #[serde(default)]
        same_day: bool,
    },
    /// Impose `to` après `from` (même jour ou lendemain).
    MandatoryFollowUp {
        id: RuleId,
        from: ShiftTypeId,
        to: ShiftTypeId,
        #[serde(default)]
        same_day: bool,
    },
}

impl ShiftRule {
    pub fn id(&self) -> &RuleId {
        match self {
            ShiftRule::ForbiddenSequence { id, .. } | ShiftRule::MandatoryFollowUp { id, .. } => id,
        }
    }

    pub fn from_shift(&self) -> &ShiftTypeId {
        match self {
            ShiftRule::ForbiddenSequence { from, .. } | ShiftRule::MandatoryFollowUp { from, .. } => {
                from
            }
        }
    }
}

/// Absence d'un collaborateur, bornes incluses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Absence {
    pub employee_id: EmployeeId,
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl Absence {
    pub fn covers(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftAssignment {
    pub employee_id: EmployeeId,
    pub shift_type_id: ShiftTypeId,
    pub date: NaiveDate,
    /// Protège l'affectation lors d'une régénération.
    #[serde(default)]
    pub locked: bool,
    /// Créée automatiquement par une règle de suivi obligatoire.
    #[serde(default)]
    pub is_follow_up: bool,
}

impl ShiftAssignment {
    pub fn new(employee_id: EmployeeId, shift_type_id: ShiftTypeId, date: NaiveDate) -> Self {
        Self {
            employee_id,
            shift_type_id,
            date,
            locked: false,
            is_follow_up: false,
        }
    }

    pub fn is_primary(&self) -> bool {
        !self.is_follow_up
    }

    /// Ne garde que les affectations verrouillées (régénération incrémentale).
    pub fn retain_locked(assignments: &mut Vec<ShiftAssignment>) {
        assignments.retain(|a| a.locked);
    }
}

/// Paire de shifts tenue par la même personne le même jour
/// (historiquement `"0."` adossé à `"1. VM"`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShiftPairing {
    pub lead: ShiftTypeId,
    pub partner: ShiftTypeId,
}

impl ShiftPairing {
    pub const LEAD_NAME: &'static str = "0.";
    pub const PARTNER_NAME: &'static str = "1. VM";

    /// Paire historique, reconnue par le nom des shifts.
    pub fn from_names(shifts: &[ShiftType]) -> Vec<ShiftPairing> {
        let find = |name: &str| shifts.iter().find(|s| s.name.trim() == name);
        match (find(Self::LEAD_NAME), find(Self::PARTNER_NAME)) {
            (Some(lead), Some(partner)) => vec![ShiftPairing {
                lead: lead.id.clone(),
                partner: partner.id.clone(),
            }],
            _ => Vec::new(),
        }
    }
}

/// Suivi obligatoire `from -> to` non appliqué à une année d'apprentissage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FollowUpExemption {
    pub from: ShiftTypeId,
    pub to: ShiftTypeId,
    pub cohort_year: u8,
}

/// (De)sérialisation `HH:MM`.
pub mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn parse(raw: &str) -> Result<NaiveTime, String> {
        NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| format!("invalid time {raw}: {e}"))
    }

    pub fn serialize<S: Serializer>(t: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&t.format("%H:%M").to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).map_err(serde::de::Error::custom)
    }
}
