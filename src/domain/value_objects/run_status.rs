//! Run and solve status value objects

use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle status of a roster generation run
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
    Failed,
    Cancelled,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunStatus::Queued => "QUEUED",
            RunStatus::InProgress => "IN_PROGRESS",
            RunStatus::Completed => "COMPLETED",
            RunStatus::Failed => "FAILED",
            RunStatus::Cancelled => "CANCELLED",
        };
        write!(f, "{}", s)
    }
}

/// Terminal status reported by the solve engine
///
/// A timed-out solve that found at least one complete assignment reports
/// `Feasible`; infeasibility is not an error at the run level, the output
/// document is still produced with UNASSIGNED rows.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SolveStatus {
    Optimal,
    Feasible,
    Infeasible,
    Unknown,
}

impl SolveStatus {
    /// Whether any usable assignment set was produced
    ///
    /// # Returns
    ///
    /// `true` for every status except `Unknown`
    pub fn has_solution(&self) -> bool {
        !matches!(self, SolveStatus::Unknown)
    }
}

impl fmt::Display for SolveStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SolveStatus::Optimal => "OPTIMAL",
            SolveStatus::Feasible => "FEASIBLE",
            SolveStatus::Infeasible => "INFEASIBLE",
            SolveStatus::Unknown => "UNKNOWN",
        };
        write!(f, "{}", s)
    }
}
