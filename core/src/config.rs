//! Run configuration: one typed, validated struct per run.
//!
//! Loaded once at the boundary (`SimConfig::load`) and passed by reference
//! everywhere else. Nothing inside the library reads configuration from a
//! loose key-value map.

use crate::{
    error::{SimError, SimResult},
    types::SimYear,
};
use serde::{Deserialize, Serialize};

/// Default absolute tolerance (in employees) for the growth-variance check.
pub const DEFAULT_GROWTH_TOLERANCE: i64 = 2;

/// What the multi-year loop does after a year fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Attempt every remaining year; later years usually fail their own
    /// dependency check, so the result list shows the full cascade.
    #[default]
    ContinueOnFailure,
    /// Stop attempting years after the first failure. Remaining years are
    /// still reported, as skipped failures.
    FailFast,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimConfig {
    pub start_year:                SimYear,
    pub end_year:                  SimYear,
    pub target_growth_rate:        f64,
    pub total_termination_rate:    f64,
    pub new_hire_termination_rate: f64,
    pub random_seed:               u64,
    #[serde(default)]
    pub full_refresh:              bool,
    /// The year whose "before" headcount is the baseline workforce.
    /// Defaults to `start_year`; set it lower when resuming mid-range.
    #[serde(default)]
    pub first_simulation_year:     Option<SimYear>,
    #[serde(default)]
    pub failure_policy:            FailurePolicy,
    #[serde(default = "default_growth_tolerance")]
    pub growth_tolerance:          i64,
}

fn default_growth_tolerance() -> i64 {
    DEFAULT_GROWTH_TOLERANCE
}

impl SimConfig {
    /// Load from a JSON file and validate.
    pub fn load(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Cannot read {path}: {e}"))?;
        let config: SimConfig = serde_json::from_str(&content)
            .map_err(|e| anyhow::anyhow!("Cannot parse {path}: {e}"))?;
        config.validate()?;
        Ok(config)
    }

    /// Config with hardcoded defaults for use in tests: a three-year run
    /// at 3% growth, 12% experienced attrition, 25% new-hire attrition.
    pub fn default_test() -> Self {
        Self {
            start_year:                2025,
            end_year:                  2027,
            target_growth_rate:        0.03,
            total_termination_rate:    0.12,
            new_hire_termination_rate: 0.25,
            random_seed:               42,
            full_refresh:              false,
            first_simulation_year:     None,
            failure_policy:            FailurePolicy::ContinueOnFailure,
            growth_tolerance:          DEFAULT_GROWTH_TOLERANCE,
        }
    }

    /// The canonical first simulation year.
    pub fn first_year(&self) -> SimYear {
        self.first_simulation_year.unwrap_or(self.start_year)
    }

    /// Every requested year, in processing order.
    pub fn years(&self) -> Vec<SimYear> {
        (self.start_year..=self.end_year).collect()
    }

    /// Hard checks reject the config. The attrition ordering check is
    /// warning-only: a lower new-hire rate is unusual but still computable.
    pub fn validate(&self) -> SimResult<()> {
        if self.end_year < self.start_year {
            return Err(SimError::InvalidConfig(format!(
                "end_year ({}) must not be before start_year ({})",
                self.end_year, self.start_year
            )));
        }
        if self.first_year() > self.start_year {
            return Err(SimError::InvalidConfig(format!(
                "first_simulation_year ({}) must not be after start_year ({})",
                self.first_year(),
                self.start_year
            )));
        }

        for (name, rate) in [
            ("target_growth_rate", self.target_growth_rate),
            ("total_termination_rate", self.total_termination_rate),
            ("new_hire_termination_rate", self.new_hire_termination_rate),
        ] {
            if !(0.0..=1.0).contains(&rate) {
                return Err(SimError::InvalidConfig(format!(
                    "{name} must be in [0, 1], got {rate}"
                )));
            }
        }
        if self.new_hire_termination_rate >= 1.0 {
            return Err(SimError::InvalidConfig(
                "new_hire_termination_rate must be below 1.0".into(),
            ));
        }
        if self.growth_tolerance < 0 {
            return Err(SimError::InvalidConfig(format!(
                "growth_tolerance must be non-negative, got {}",
                self.growth_tolerance
            )));
        }

        if self.new_hire_termination_rate < self.total_termination_rate {
            log::warn!(
                "config: new_hire_termination_rate ({:.3}) is below total_termination_rate ({:.3}); \
                 new hires usually leave faster than tenured staff",
                self.new_hire_termination_rate,
                self.total_termination_rate
            );
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_test_config_is_valid() {
        let config = SimConfig::default_test();
        assert!(config.validate().is_ok());
        assert_eq!(config.years(), vec![2025, 2026, 2027]);
        assert_eq!(config.first_year(), 2025);
    }

    #[test]
    fn rejects_inverted_year_range() {
        let mut config = SimConfig::default_test();
        config.end_year = 2024;
        assert!(matches!(config.validate(), Err(SimError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_out_of_range_rates() {
        let mut config = SimConfig::default_test();
        config.total_termination_rate = 1.2;
        assert!(config.validate().is_err());

        let mut config = SimConfig::default_test();
        config.new_hire_termination_rate = 1.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn low_new_hire_attrition_only_warns() {
        let mut config = SimConfig::default_test();
        config.new_hire_termination_rate = 0.05;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn optional_fields_take_defaults_from_json() {
        let json = r#"{
            "start_year": 2025,
            "end_year": 2029,
            "target_growth_rate": 0.03,
            "total_termination_rate": 0.12,
            "new_hire_termination_rate": 0.25,
            "random_seed": 7
        }"#;
        let config: SimConfig = serde_json::from_str(json).unwrap();
        assert!(!config.full_refresh);
        assert_eq!(config.failure_policy, FailurePolicy::ContinueOnFailure);
        assert_eq!(config.growth_tolerance, DEFAULT_GROWTH_TOLERANCE);
        assert_eq!(config.first_year(), 2025);
    }

    #[test]
    fn first_year_after_start_is_rejected() {
        let mut config = SimConfig::default_test();
        config.first_simulation_year = Some(2026);
        assert!(config.validate().is_err());
    }
}
