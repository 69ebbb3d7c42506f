//! Wire models for the schema-0.95 input document
//!
//! These structs mirror the JSON document one-to-one; the parser
//! converts and validates them into domain entities. Keeping the wire
//! shape separate from the domain keeps deprecations (like the ignored
//! `enableAPGD-D10` flag) out of the core types.

use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDocument {
    pub schema_version: String,
    pub planning_horizon: InputDateRange,
    #[serde(default)]
    pub public_holidays: Vec<String>,
    pub shifts: Vec<InputShift>,
    pub employees: Vec<InputEmployee>,
    pub demand_items: Vec<InputDemandItem>,
    #[serde(default)]
    pub constraint_list: Vec<InputConstraintRecord>,
    #[serde(default)]
    pub monthly_hour_limits: Option<InputMonthlyHourLimits>,
    #[serde(default)]
    pub solver_config: Option<InputSolverConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDateRange {
    pub start_date: String,
    pub end_date: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputShift {
    pub code: String,
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub ranks: Vec<String>,
    #[serde(default)]
    pub product_types: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputEmployee {
    pub id: String,
    pub scheme: String,
    pub product_type: String,
    pub rank: String,
    #[serde(default)]
    pub gender: Option<String>,
    pub org_unit: String,
    #[serde(default)]
    pub rotation_offset: usize,
    #[serde(default)]
    pub is_local: Option<bool>,
    #[serde(default)]
    pub qualifications: Vec<InputQualification>,
    #[serde(default)]
    pub leave_ranges: Vec<InputDateRange>,
    #[serde(default)]
    pub override_approvals: Vec<String>,
    /// Deprecated: APGD-D10 qualification is derived from scheme and
    /// product type; this flag is read and ignored.
    #[serde(default, rename = "enableAPGD-D10")]
    pub enable_apgd_d10: Option<bool>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputQualification {
    pub name: String,
    pub valid_from: String,
    pub valid_to: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputDemandItem {
    pub id: String,
    pub org_unit: String,
    pub date_range: InputDateRange,
    pub requirements: Vec<InputRequirement>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputRequirement {
    pub id: String,
    pub shift_codes: Vec<String>,
    pub work_pattern: Vec<String>,
    pub headcount: usize,
    #[serde(default)]
    pub ranks: Vec<String>,
    #[serde(default)]
    pub product_types: Vec<String>,
    pub scheme: String,
    #[serde(default)]
    pub gender_policy: Option<String>,
    #[serde(default)]
    pub required_qualifications: Vec<String>,
    #[serde(default)]
    pub team_whitelist: Option<Vec<String>>,
    #[serde(default)]
    pub enable_ot_aware_icpmp: Option<bool>,
    #[serde(default)]
    pub icpmp_buffer_percentage: Option<f64>,
    #[serde(default)]
    pub rostering_basis: Option<String>,
    #[serde(default)]
    pub strict_adherence_ratio: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputConstraintRecord {
    pub id: String,
    #[serde(default)]
    pub enforcement: Option<String>,
    pub default_value: f64,
    #[serde(default)]
    pub scheme_overrides: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputMonthlyHourLimits {
    #[serde(default)]
    pub calculation_method: Option<String>,
    #[serde(default)]
    pub contractual: BTreeMap<String, f64>,
    #[serde(default)]
    pub ot_cap: BTreeMap<String, f64>,
    #[serde(default)]
    pub apgd_d10_ot_cap: BTreeMap<String, f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputSolverConfig {
    #[serde(default)]
    pub time_limit_seconds: Option<f64>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub strict_adherence_ratio: Option<f64>,
    #[serde(default)]
    pub worker_threads: Option<usize>,
}
