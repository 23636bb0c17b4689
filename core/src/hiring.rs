//! Closed-form hiring requirement.
//!
//! Termination replacement and growth are summed BEFORE inflating for
//! new-hire attrition. Inflating each component separately under-hires
//! badly (5036 employees: 807 hires instead of 1009). Keep the order of
//! operations and the rounding functions exactly as below.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HiringRequirement {
    pub starting_active:                i64,
    pub experienced_terminations:       i64,
    pub growth_amount:                  f64,
    pub replacement_hires:              i64,
    pub growth_hires:                   i64,
    pub total_hires_needed:             i64,
    pub expected_new_hire_terminations: i64,
    pub net_hiring_impact:              i64,
}

/// Hires needed to reach `growth_rate` from `starting_active`.
///
/// Expected new-hire terminations round half away from zero.
/// `new_hire_termination_rate` must be below 1.0 (enforced by config
/// validation).
pub fn calculate_hiring_requirement(
    starting_active: i64,
    growth_rate: f64,
    termination_rate: f64,
    new_hire_termination_rate: f64,
) -> HiringRequirement {
    let active = starting_active as f64;

    let experienced_terminations = (active * termination_rate).ceil() as i64;
    let growth_amount = active * growth_rate;
    let net_hires_needed = experienced_terminations as f64 + growth_amount;
    let total_hires_needed = (net_hires_needed / (1.0 - new_hire_termination_rate)).ceil() as i64;
    let expected_new_hire_terminations =
        (total_hires_needed as f64 * new_hire_termination_rate).round() as i64;

    HiringRequirement {
        starting_active,
        experienced_terminations,
        growth_amount,
        replacement_hires: experienced_terminations,
        growth_hires: total_hires_needed - experienced_terminations,
        total_hires_needed,
        expected_new_hire_terminations,
        net_hiring_impact: total_hires_needed - expected_new_hire_terminations,
    }
}

impl HiringRequirement {
    /// Headcount expected at year end if every target is met exactly.
    pub fn expected_ending_headcount(&self) -> i64 {
        self.starting_active - self.experienced_terminations + self.net_hiring_impact
    }

    pub fn log(&self, year: crate::types::SimYear) {
        log::info!(
            "year={year} hiring: start={} exp_terms={} growth={:.2} total_hires={} \
             (replacement={} growth={}) nh_terms={} net={}",
            self.starting_active,
            self.experienced_terminations,
            self.growth_amount,
            self.total_hires_needed,
            self.replacement_hires,
            self.growth_hires,
            self.expected_new_hire_terminations,
            self.net_hiring_impact,
        );
    }
}
