//! Demand entity module
//!
//! A demand item is one business booking: an organisational unit, a date
//! range within the planning horizon and one or more requirements. Each
//! requirement names the shifts it covers, the work pattern, the headcount
//! per shift and the eligibility filters applied to the employee pool.

use serde::{Deserialize, Serialize};

use super::horizon::DateRange;
use super::work_pattern::WorkPattern;
use crate::domain::value_objects::scheme::{Gender, Scheme};

/// Default ICPMP buffer percentage when a requirement does not set one.
pub const DEFAULT_ICPMP_BUFFER_PERCENTAGE: f64 = 20.0;

/// Requirement-level gender filter
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum GenderPolicy {
    #[default]
    All,
    Male,
    Female,
    /// At least one employee of each gender per covered date
    Mix,
}

impl GenderPolicy {
    /// Whether a single employee's gender satisfies this filter
    ///
    /// `Mix` cannot be decided per employee; it admits everyone here and
    /// is audited at roster level.
    pub fn admits(&self, gender: Gender) -> bool {
        match self {
            GenderPolicy::All | GenderPolicy::Mix => true,
            GenderPolicy::Male => matches!(gender, Gender::Male | Gender::Any),
            GenderPolicy::Female => matches!(gender, Gender::Female | Gender::Any),
        }
    }
}

/// How a requirement is rostered
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub enum RosteringBasis {
    /// Explicit slot × employee decision matrix
    #[default]
    DemandBased,
    /// Solve one template employee, replicate under rotation offsets
    OutcomeBased,
}

/// One coverage requirement inside a demand item
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Requirement {
    pub id: String,
    /// Codes of the shift definitions this requirement references
    pub shift_codes: Vec<String>,
    pub pattern: WorkPattern,
    /// Employees needed per prescribed shift per day
    pub headcount: usize,
    /// Ranks admitted; empty means unrestricted
    #[serde(default)]
    pub ranks: Vec<String>,
    /// Product types admitted; empty means unrestricted
    #[serde(default)]
    pub product_types: Vec<String>,
    pub scheme: Scheme,
    #[serde(default)]
    pub gender_policy: GenderPolicy,
    /// Names of the qualifications every assignee must hold
    #[serde(default)]
    pub required_qualifications: Vec<String>,
    /// When present, only these employee ids may be assigned
    #[serde(default)]
    pub team_whitelist: Option<Vec<String>>,
    #[serde(default)]
    pub enable_ot_aware_icpmp: bool,
    #[serde(default = "default_buffer")]
    pub icpmp_buffer_percentage: f64,
    /// Overrides the run-level rostering basis when present
    #[serde(default)]
    pub rostering_basis: Option<RosteringBasis>,
    /// Overrides the run-level strict adherence ratio when present
    #[serde(default)]
    pub strict_adherence_ratio: Option<f64>,
}

fn default_buffer() -> f64 {
    DEFAULT_ICPMP_BUFFER_PERCENTAGE
}

impl Requirement {
    pub fn new(
        id: impl Into<String>,
        shift_codes: Vec<String>,
        pattern: WorkPattern,
        headcount: usize,
        scheme: Scheme,
    ) -> Self {
        Self {
            id: id.into(),
            shift_codes,
            pattern,
            headcount,
            ranks: Vec::new(),
            product_types: Vec::new(),
            scheme,
            gender_policy: GenderPolicy::All,
            required_qualifications: Vec::new(),
            team_whitelist: None,
            enable_ot_aware_icpmp: false,
            icpmp_buffer_percentage: DEFAULT_ICPMP_BUFFER_PERCENTAGE,
            rostering_basis: None,
            strict_adherence_ratio: None,
        }
    }

    pub fn admits_rank(&self, rank: &str) -> bool {
        self.ranks.is_empty() || self.ranks.iter().any(|r| r == rank)
    }

    pub fn admits_product(&self, product_type: &str) -> bool {
        self.product_types.is_empty() || self.product_types.iter().any(|p| p == product_type)
    }

    pub fn whitelists(&self, employee_id: &str) -> bool {
        match &self.team_whitelist {
            None => true,
            Some(ids) => ids.iter().any(|id| id == employee_id),
        }
    }
}

/// One business booking covering a date range with requirements
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DemandItem {
    pub id: String,
    pub org_unit: String,
    pub range: DateRange,
    pub requirements: Vec<Requirement>,
}

impl DemandItem {
    pub fn new(id: impl Into<String>, org_unit: impl Into<String>, range: DateRange) -> Self {
        Self {
            id: id.into(),
            org_unit: org_unit.into(),
            range,
            requirements: Vec::new(),
        }
    }

    pub fn with_requirement(mut self, requirement: Requirement) -> Self {
        self.requirements.push(requirement);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn requirement() -> Requirement {
        Requirement::new(
            "R1",
            vec!["D".to_string()],
            WorkPattern::from_codes(&["D", "D", "O"]).unwrap(),
            2,
            Scheme::A,
        )
    }

    #[test]
    fn test_empty_filters_admit_everything() {
        let req = requirement();
        assert!(req.admits_rank("SGT"));
        assert!(req.admits_product("APO"));
        assert!(req.whitelists("E99"));
    }

    #[test]
    fn test_whitelist_restricts() {
        let mut req = requirement();
        req.team_whitelist = Some(vec!["E1".to_string(), "E2".to_string()]);
        assert!(req.whitelists("E1"));
        assert!(!req.whitelists("E3"));
    }

    #[test]
    fn test_gender_policy_admission() {
        assert!(GenderPolicy::All.admits(Gender::Male));
        assert!(GenderPolicy::Male.admits(Gender::Male));
        assert!(!GenderPolicy::Male.admits(Gender::Female));
        assert!(GenderPolicy::Female.admits(Gender::Any));
        assert!(GenderPolicy::Mix.admits(Gender::Male));
    }

    #[test]
    fn test_default_buffer_percentage() {
        assert_eq!(requirement().icpmp_buffer_percentage, 20.0);
    }
}
