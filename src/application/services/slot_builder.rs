//! Slot builder service module
//!
//! Enumerates the atomic coverage needs of demand-based mode: for every
//! date of a demand item's range, one slot per referenced shift per
//! headcount position. The work pattern governs which days each rotating
//! employee can serve, not the booking's calendar: a requirement for one
//! day guard and one night guard needs both covered every single day
//! while its cohort rotates through the pattern. Iteration order and
//! slot ids are deterministic for identical input.

use tracing::warn;

use crate::domain::entities::{DemandItem, PlanningHorizon, Requirement, Slot};

/// Service enumerating slots for demand-based requirements
pub struct SlotBuilder;

impl SlotBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Builds the slots for one requirement of a demand item
    ///
    /// Dates outside the planning horizon are skipped with a warning.
    ///
    /// # Arguments
    ///
    /// * `horizon` - The planning horizon of the run
    /// * `demand` - The demand item owning the requirement
    /// * `requirement` - The requirement to enumerate coverage for
    ///
    /// # Returns
    ///
    /// One slot per (date, shift, position) in enumeration order
    pub fn build_for_requirement(
        &self,
        horizon: &PlanningHorizon,
        demand: &DemandItem,
        requirement: &Requirement,
    ) -> Vec<Slot> {
        let mut slots = Vec::new();
        for date in demand.range.iter_dates() {
            if !horizon.contains(date) {
                warn!(
                    demand = %demand.id,
                    requirement = %requirement.id,
                    %date,
                    "demand date outside planning horizon, skipping"
                );
                continue;
            }
            for shift_code in &requirement.shift_codes {
                for position in 0..requirement.headcount {
                    slots.push(Slot::new(
                        &demand.id,
                        &requirement.id,
                        date,
                        shift_code,
                        position,
                    ));
                }
            }
        }
        slots
    }

    /// Builds the slots for every requirement of the given demand items
    ///
    /// Demand items and requirements are visited in input order; the
    /// resulting list is sorted by (date, shift code, slot id) so the
    /// downstream pipeline iterates deterministically.
    ///
    /// # Arguments
    ///
    /// * `horizon` - The planning horizon of the run
    /// * `demands` - Every demand item of the run
    ///
    /// # Returns
    ///
    /// The sorted slot list for all demand-based coverage
    pub fn build(&self, horizon: &PlanningHorizon, demands: &[DemandItem]) -> Vec<Slot> {
        let mut slots = Vec::new();
        for demand in demands {
            for requirement in &demand.requirements {
                slots.extend(self.build_for_requirement(horizon, demand, requirement));
            }
        }
        slots.sort_by(|a, b| {
            (a.date, &a.shift_code, &a.id).cmp(&(b.date, &b.shift_code, &b.id))
        });
        slots
    }
}

impl Default for SlotBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{DateRange, WorkPattern};
    use crate::domain::value_objects::Scheme;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn demand_with(shift_codes: &[&str], headcount: usize) -> DemandItem {
        let requirement = Requirement::new(
            "R1",
            shift_codes.iter().map(|s| s.to_string()).collect(),
            WorkPattern::from_codes(&["D", "D", "O"]).unwrap(),
            headcount,
            Scheme::A,
        );
        DemandItem::new(
            "DM1",
            "OU1",
            DateRange::new(date(2026, 3, 1), date(2026, 3, 6)),
        )
        .with_requirement(requirement)
    }

    #[test]
    fn test_every_demand_date_is_covered() {
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31));
        let slots = SlotBuilder::new().build(&horizon, &[demand_with(&["D"], 1)]);
        // Six days, one shift, headcount one.
        assert_eq!(slots.len(), 6);
        assert!(slots.iter().all(|s| s.shift_code == "D"));
    }

    #[test]
    fn test_multiple_shifts_per_day() {
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31));
        let slots = SlotBuilder::new().build(&horizon, &[demand_with(&["D", "N"], 1)]);
        assert_eq!(slots.len(), 12);
        let first_day: Vec<_> = slots.iter().filter(|s| s.date == date(2026, 3, 1)).collect();
        assert_eq!(first_day.len(), 2);
        assert_eq!(first_day[0].shift_code, "D");
        assert_eq!(first_day[1].shift_code, "N");
    }

    #[test]
    fn test_headcount_multiplies_positions() {
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31));
        let slots = SlotBuilder::new().build(&horizon, &[demand_with(&["D"], 3)]);
        assert_eq!(slots.len(), 18);
        let first_day: Vec<_> = slots.iter().filter(|s| s.date == date(2026, 3, 1)).collect();
        assert_eq!(first_day.len(), 3);
        assert_eq!(first_day[0].position_index, 0);
        assert_eq!(first_day[2].position_index, 2);
    }

    #[test]
    fn test_slots_are_stable_and_ordered() {
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 31));
        let builder = SlotBuilder::new();
        let first = builder.build(&horizon, &[demand_with(&["D"], 2)]);
        let second = builder.build(&horizon, &[demand_with(&["D"], 2)]);
        assert_eq!(first, second);
        for pair in first.windows(2) {
            assert!(pair[0].date <= pair[1].date);
        }
    }

    #[test]
    fn test_dates_outside_horizon_are_skipped() {
        let horizon = PlanningHorizon::new(date(2026, 3, 1), date(2026, 3, 3));
        let slots = SlotBuilder::new().build(&horizon, &[demand_with(&["D"], 1)]);
        assert_eq!(slots.len(), 3);
    }
}
