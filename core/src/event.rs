//! Ledger event types.
//!
//! RULE: Events are produced only by transformation steps.
//! The orchestrator reads and deletes them; it never edits one in place.

use crate::types::{EmployeeId, SimYear};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Hire,
    Promotion,
    Termination,
    Merit,
}

impl EventType {
    /// Stable string stored in the `event_type` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Hire        => "hire",
            Self::Promotion   => "promotion",
            Self::Termination => "termination",
            Self::Merit       => "merit",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "hire"        => Some(Self::Hire),
            "promotion"   => Some(Self::Promotion),
            "termination" => Some(Self::Termination),
            "merit"       => Some(Self::Merit),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EventCategory {
    NewHire,
    Promotion,
    MeritRaise,
    ExperiencedTermination,
    NewHireTermination,
}

impl EventCategory {
    /// Stable string stored in the `event_category` column.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NewHire                => "new_hire",
            Self::Promotion              => "promotion",
            Self::MeritRaise             => "merit_raise",
            Self::ExperiencedTermination => "experienced_termination",
            Self::NewHireTermination     => "new_hire_termination",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "new_hire"                => Some(Self::NewHire),
            "promotion"               => Some(Self::Promotion),
            "merit_raise"             => Some(Self::MeritRaise),
            "experienced_termination" => Some(Self::ExperiencedTermination),
            "new_hire_termination"    => Some(Self::NewHireTermination),
            _ => None,
        }
    }
}

/// One workforce event as persisted to the ledger.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub simulation_year: SimYear,
    pub employee_id:     EmployeeId,
    pub event_type:      EventType,
    pub event_category:  EventCategory,
    pub effective_date:  NaiveDate,
    pub old_value:       Option<f64>,
    pub new_value:       Option<f64>,
    pub employee_age:    Option<i64>,
    pub employee_level:  Option<i64>,
}

impl EventRecord {
    pub fn new(
        simulation_year: SimYear,
        employee_id:     EmployeeId,
        event_type:      EventType,
        event_category:  EventCategory,
        effective_date:  NaiveDate,
    ) -> Self {
        Self {
            simulation_year,
            employee_id,
            event_type,
            event_category,
            effective_date,
            old_value:      None,
            new_value:      None,
            employee_age:   None,
            employee_level: None,
        }
    }

    pub fn with_values(mut self, old_value: Option<f64>, new_value: Option<f64>) -> Self {
        self.old_value = old_value;
        self.new_value = new_value;
        self
    }

    pub fn with_profile(mut self, age: i64, level: i64) -> Self {
        self.employee_age = Some(age);
        self.employee_level = Some(level);
        self
    }
}

/// Ledger counts for one year, by the categories the validator reports.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventCounts {
    pub hires:                    i64,
    pub experienced_terminations: i64,
    pub new_hire_terminations:    i64,
    pub promotions:               i64,
    pub merits:                   i64,
}

impl EventCounts {
    pub fn total_terminations(&self) -> i64 {
        self.experienced_terminations + self.new_hire_terminations
    }
}
