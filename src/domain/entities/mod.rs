pub mod assignment;
pub mod constraint_catalog;
pub mod demand;
pub mod employee;
pub mod horizon;
pub mod roster_input;
pub mod shift;
pub mod work_pattern;

pub use assignment::{Assignment, AssignmentStatus, Slot};
pub use constraint_catalog::{
    ConstraintCatalog, ConstraintId, ConstraintRecord, Enforcement, MonthlyHourLimits,
    OtCalculationMethod, OverrideRule, SchemeOverride,
};
pub use demand::{DemandItem, GenderPolicy, Requirement, RosteringBasis};
pub use employee::{Employee, Qualification};
pub use horizon::{DateRange, PlanningHorizon};
pub use roster_input::{RosterInput, SolverConfig, SCHEMA_VERSION};
pub use shift::ShiftDefinition;
pub use work_pattern::{PatternSlot, WorkPattern, WorkPatternError};
