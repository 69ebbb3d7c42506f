pub mod roster_output;

pub use roster_output::{
    DailyStatusOutput, EmployeeRosterOutput, MonthlyTotalsOutput, RosterOutput, ScoreOutput,
    SolverRunOutput,
};
