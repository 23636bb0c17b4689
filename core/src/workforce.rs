//! Workforce records: the per-employee state carried from year to year.

use crate::{
    rng::{RngBank, StepSlot},
    types::{EmployeeId, SimYear},
};
use serde::{Deserialize, Serialize};

/// Highest job level. Promotions stop here.
pub const MAX_LEVEL: i64 = 5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EmploymentStatus {
    Active,
    Terminated,
}

impl EmploymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active     => "active",
            Self::Terminated => "terminated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active"     => Some(Self::Active),
            "terminated" => Some(Self::Terminated),
            _ => None,
        }
    }
}

/// How an employee arrived at their end-of-year status.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DetailedStatus {
    ContinuousActive,
    ExperiencedTermination,
    NewHireActive,
    NewHireTermination,
}

impl DetailedStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContinuousActive       => "continuous_active",
            Self::ExperiencedTermination => "experienced_termination",
            Self::NewHireActive          => "new_hire_active",
            Self::NewHireTermination     => "new_hire_termination",
        }
    }

    pub fn status(&self) -> EmploymentStatus {
        match self {
            Self::ContinuousActive | Self::NewHireActive => EmploymentStatus::Active,
            Self::ExperiencedTermination | Self::NewHireTermination => {
                EmploymentStatus::Terminated
            }
        }
    }
}

/// An active employee at the start of a simulation year.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EmployeeState {
    pub employee_id:          EmployeeId,
    pub current_compensation: f64,
    pub current_age:          i64,
    pub current_tenure:       i64,
    pub level:                i64,
}

impl EmployeeState {
    pub fn new(
        employee_id: &str,
        current_compensation: f64,
        current_age: i64,
        current_tenure: i64,
        level: i64,
    ) -> Self {
        Self {
            employee_id: employee_id.to_string(),
            current_compensation,
            current_age,
            current_tenure,
            level,
        }
    }
}

/// One row of the end-of-year workforce snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WorkforceSnapshotRow {
    pub simulation_year:      SimYear,
    pub employee_id:          EmployeeId,
    pub employment_status:    EmploymentStatus,
    pub current_compensation: f64,
    pub current_age:          i64,
    pub current_tenure:       i64,
    pub level:                i64,
    pub detailed_status:      DetailedStatus,
}

/// Generate a deterministic baseline ("year zero") population.
///
/// Used by the runner's `--baseline` option and by tests; a production
/// baseline is loaded from HR census data by an external step.
pub fn generate_baseline(size: usize, seed: u64, year: SimYear) -> Vec<EmployeeState> {
    let mut rng = RngBank::new(seed).for_step(StepSlot::Baseline, year);
    (0..size)
        .map(|i| {
            let level = 1 + rng.next_u64_below(MAX_LEVEL as u64) as i64;
            let tenure = rng.next_u64_below(20) as i64;
            let age = 22 + tenure + rng.next_u64_below(20) as i64;
            // Level bands: ~55k at level 1, +25k per level, ±10%.
            let band = 55_000.0 + 25_000.0 * (level - 1) as f64;
            let compensation = (band * rng.uniform(0.9, 1.1)).round();
            EmployeeState::new(&format!("EMP_{i:06}"), compensation, age, tenure, level)
        })
        .collect()
}
