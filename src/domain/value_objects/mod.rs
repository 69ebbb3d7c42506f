pub mod hour_breakdown;
pub mod run_status;
pub mod scheme;

pub use hour_breakdown::HourBreakdown;
pub use run_status::{RunStatus, SolveStatus};
pub use scheme::{Gender, Scheme, SchemeParseError};
