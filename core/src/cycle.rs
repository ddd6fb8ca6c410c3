use std::fmt;

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{PlanError, PlanResult};

pub const DEFAULT_CYCLE_LENGTH: u32 = 28;
pub const MIN_CYCLE_LENGTH: u32 = 15;
pub const MAX_CYCLE_LENGTH: u32 = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleProfile {
    pub user_id: String,
    pub last_period_start_date: NaiveDate,
    pub cycle_length_days: u32,
    #[serde(default)]
    pub updated_at: String,
}

impl CycleProfile {
    #[must_use]
    pub fn new(user_id: &str, last_period_start_date: NaiveDate, cycle_length_days: u32) -> Self {
        Self {
            user_id: user_id.to_string(),
            last_period_start_date,
            cycle_length_days,
            updated_at: String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

impl Phase {
    /// Phase for a 1-based day within the cycle.
    #[must_use]
    pub fn from_cycle_day(day: u32) -> Self {
        match day {
            0..=5 => Self::Menstrual,
            6..=14 => Self::Follicular,
            15..=17 => Self::Ovulatory,
            _ => Self::Luteal,
        }
    }

    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Menstrual => "Menstrual",
            Self::Follicular => "Follicular",
            Self::Ovulatory => "Ovulatory",
            Self::Luteal => "Luteal",
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub fn validate_cycle_length(days: u32) -> PlanResult<u32> {
    if (MIN_CYCLE_LENGTH..=MAX_CYCLE_LENGTH).contains(&days) {
        Ok(days)
    } else {
        Err(PlanError::validation(format!(
            "cycleLength must be between {MIN_CYCLE_LENGTH} and {MAX_CYCLE_LENGTH} days (got {days})"
        )))
    }
}

/// Day of the cycle (1..=cycle length) that `date` falls on. Dates before
/// the recorded start wrap backwards into the previous cycle.
#[must_use]
pub fn cycle_day(cycle: &CycleProfile, date: NaiveDate) -> u32 {
    let len = i64::from(cycle.cycle_length_days.max(1));
    let day_in_cycle = (date - cycle.last_period_start_date).num_days() + 1;
    let normalized = (day_in_cycle - 1).rem_euclid(len) + 1;
    u32::try_from(normalized).unwrap_or(1)
}

/// Total over every date. Without a tracked cycle the follicular phase is
/// assumed.
#[must_use]
pub fn phase_for(cycle: Option<&CycleProfile>, date: NaiveDate) -> Phase {
    match cycle {
        Some(cycle) => Phase::from_cycle_day(cycle_day(cycle, date)),
        None => Phase::Follicular,
    }
}

/// First date on or after `date` that starts a new cycle.
#[must_use]
pub fn next_period_start(cycle: &CycleProfile, date: NaiveDate) -> NaiveDate {
    let day = cycle_day(cycle, date);
    if day == 1 {
        return date;
    }
    let len = cycle.cycle_length_days.max(1);
    date + Duration::days(i64::from(len - day + 1))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseGuidance {
    pub workout_focus: &'static str,
    pub nutrition_focus: &'static str,
}

impl PhaseGuidance {
    #[must_use]
    pub fn for_phase(phase: Phase) -> Self {
        match phase {
            Phase::Menstrual => Self {
                workout_focus: "Light movement: walking, yoga, mobility work",
                nutrition_focus: "Iron-rich foods, warm meals, steady hydration",
            },
            Phase::Follicular => Self {
                workout_focus: "Build intensity: strength training and intervals",
                nutrition_focus: "Lean protein, complex carbs, fresh vegetables",
            },
            Phase::Ovulatory => Self {
                workout_focus: "Peak effort: heavy lifts and high-intensity sessions",
                nutrition_focus: "Fiber, antioxidants and plenty of fluids",
            },
            Phase::Luteal => Self {
                workout_focus: "Moderate steady-state cardio and pilates",
                nutrition_focus: "Magnesium-rich foods, healthy fats, stable blood sugar",
            },
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseReport {
    pub date: NaiveDate,
    pub phase: Phase,
    pub tracked: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_day: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cycle_length_days: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_period_start: Option<NaiveDate>,
    pub guidance: PhaseGuidance,
}

impl PhaseReport {
    #[must_use]
    pub fn build(cycle: Option<&CycleProfile>, date: NaiveDate) -> Self {
        let phase = phase_for(cycle, date);
        Self {
            date,
            phase,
            tracked: cycle.is_some(),
            cycle_day: cycle.map(|c| cycle_day(c, date)),
            cycle_length_days: cycle.map(|c| c.cycle_length_days),
            next_period_start: cycle.map(|c| next_period_start(c, date)),
            guidance: PhaseGuidance::for_phase(phase),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn profile() -> CycleProfile {
        CycleProfile::new("u1", date(2024, 3, 1), 28)
    }

    #[test]
    fn test_phase_scenario() {
        let cycle = profile();
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 1)), Phase::Menstrual);
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 5)), Phase::Menstrual);
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 6)), Phase::Follicular);
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 10)), Phase::Follicular);
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 16)), Phase::Ovulatory);
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 18)), Phase::Luteal);
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 25)), Phase::Luteal);
        assert_eq!(phase_for(Some(&cycle), date(2024, 3, 29)), Phase::Menstrual);
    }

    #[test]
    fn test_dates_before_start_wrap() {
        let cycle = profile();
        assert_eq!(cycle_day(&cycle, date(2024, 2, 29)), 28);
        assert_eq!(phase_for(Some(&cycle), date(2024, 2, 29)), Phase::Luteal);
        assert_eq!(cycle_day(&cycle, date(2024, 2, 2)), 1);
    }

    #[test]
    fn test_phase_is_periodic() {
        let cycle = CycleProfile::new("u1", date(2024, 3, 1), 31);
        let mut d = date(2023, 11, 1);
        while d < date(2024, 6, 1) {
            let later = d + Duration::days(31);
            assert_eq!(phase_for(Some(&cycle), d), phase_for(Some(&cycle), later));
            let day = cycle_day(&cycle, d);
            assert!((1..=31).contains(&day));
            d += Duration::days(1);
        }
    }

    #[test]
    fn test_untracked_defaults_to_follicular() {
        assert_eq!(phase_for(None, date(2024, 3, 1)), Phase::Follicular);
        let report = PhaseReport::build(None, date(2024, 3, 1));
        assert!(!report.tracked);
        assert!(report.cycle_day.is_none());
        assert_eq!(report.guidance, PhaseGuidance::for_phase(Phase::Follicular));
    }

    #[test]
    fn test_zero_length_does_not_panic() {
        let cycle = CycleProfile::new("u1", date(2024, 3, 1), 0);
        assert_eq!(cycle_day(&cycle, date(2024, 3, 20)), 1);
    }

    #[test]
    fn test_next_period_start() {
        let cycle = profile();
        assert_eq!(next_period_start(&cycle, date(2024, 3, 1)), date(2024, 3, 1));
        assert_eq!(next_period_start(&cycle, date(2024, 3, 2)), date(2024, 3, 29));
        assert_eq!(next_period_start(&cycle, date(2024, 3, 28)), date(2024, 3, 29));
        assert_eq!(next_period_start(&cycle, date(2024, 2, 29)), date(2024, 3, 1));
    }

    #[test]
    fn test_validate_cycle_length() {
        assert_eq!(validate_cycle_length(28).unwrap(), 28);
        assert!(validate_cycle_length(15).is_ok());
        assert!(validate_cycle_length(60).is_ok());
        assert!(validate_cycle_length(14).is_err());
        assert!(validate_cycle_length(61).is_err());
    }

    #[test]
    fn test_report_json() {
        let report = PhaseReport::build(Some(&profile()), date(2024, 3, 16));
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["phase"], "Ovulatory");
        assert_eq!(json["cycleDay"], 16);
        assert_eq!(json["nextPeriodStart"], "2024-03-29");
        assert!(json["guidance"]["workoutFocus"].is_string());
    }
}
