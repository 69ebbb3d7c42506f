//! Roster input aggregate module
//!
//! The fully parsed and validated input of one roster run. Entities are
//! immutable for the duration of the run.

use serde::{Deserialize, Serialize};

use super::constraint_catalog::ConstraintCatalog;
use super::demand::DemandItem;
use super::employee::Employee;
use super::horizon::PlanningHorizon;
use super::shift::ShiftDefinition;

/// Schema version this engine reads and writes.
pub const SCHEMA_VERSION: &str = "0.95";

/// Default solve wall-time limit in seconds.
pub const DEFAULT_TIME_LIMIT_SECONDS: f64 = 300.0;

/// Solve engine configuration from the input document
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SolverConfig {
    #[serde(default = "default_time_limit")]
    pub time_limit_seconds: f64,
    /// Engine seed; the default keeps runs reproducible without one
    #[serde(default)]
    pub seed: u64,
    /// Run-level rotation adherence ratio; requirements may override
    #[serde(default = "default_strict_ratio")]
    pub strict_adherence_ratio: f64,
    /// Worker-thread count; defaults from the problem size when absent
    #[serde(default)]
    pub worker_threads: Option<usize>,
}

fn default_time_limit() -> f64 {
    DEFAULT_TIME_LIMIT_SECONDS
}

fn default_strict_ratio() -> f64 {
    1.0
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            time_limit_seconds: DEFAULT_TIME_LIMIT_SECONDS,
            seed: 0,
            strict_adherence_ratio: 1.0,
            worker_threads: None,
        }
    }
}

/// The complete, validated input of one roster run
#[derive(Debug, Clone, PartialEq)]
pub struct RosterInput {
    pub horizon: PlanningHorizon,
    pub shifts: Vec<ShiftDefinition>,
    pub employees: Vec<Employee>,
    pub demand_items: Vec<DemandItem>,
    pub catalog: ConstraintCatalog,
    pub solver_config: SolverConfig,
}

impl RosterInput {
    pub fn shift_by_code(&self, code: &str) -> Option<&ShiftDefinition> {
        self.shifts.iter().find(|s| s.code == code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_solver_config_defaults() {
        let config: SolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.time_limit_seconds, 300.0);
        assert_eq!(config.seed, 0);
        assert_eq!(config.strict_adherence_ratio, 1.0);
        assert!(config.worker_threads.is_none());
    }

    #[test]
    fn test_solver_config_overrides() {
        let config: SolverConfig =
            serde_json::from_str(r#"{"timeLimitSeconds": 60, "seed": 42}"#).unwrap();
        assert_eq!(config.time_limit_seconds, 60.0);
        assert_eq!(config.seed, 42);
    }
}
