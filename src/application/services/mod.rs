pub mod capacity_planner;
pub mod constraint_resolver;
pub mod constraints;
pub mod hour_accountant;
pub mod hour_calculator;
pub mod slot_builder;
pub mod template_replicator;

pub use capacity_planner::{CapacityPlan, CapacityPlanner};
pub use constraint_resolver::{ConstraintResolver, EmployeeLimits};
pub use hour_accountant::HourAccountant;
pub use hour_calculator::{HourParams, HourPolicy, HourState};
pub use slot_builder::SlotBuilder;
pub use template_replicator::TemplateReplicator;
