//! Constraint catalog entity module
//!
//! The constraint catalog carries the labour-law rule configuration of a
//! run: one record per constraint id with an enforcement level, a default
//! value and optional per-scheme overrides, plus monthly hour limits keyed
//! by calendar month length.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::domain::value_objects::Scheme;

/// Identifier of a rule in the constraint library
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintId {
    /// C1 daily hours cap
    C1,
    /// C2 weekly normal cap
    C2,
    /// C3 consecutive working days
    C3,
    /// C4 minimum inter-shift rest
    C4,
    /// C5 off-days per week
    C5,
    /// C6 part-timer weekly cap
    C6,
    /// C7 qualification validity
    C7,
    /// C8 qualification validity (companion id, same rule family as C7)
    C8,
    /// C9 gender balance
    C9,
    /// C11 rank/product match
    C11,
    /// C12 team whitelist
    C12,
    /// C15 override approvals
    C15,
    /// C16 one shift per day
    C16,
    /// C17 monthly OT cap
    C17,
    /// Rotation-pattern adherence
    RotationAdherence,
}

impl ConstraintId {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "C1" => Some(ConstraintId::C1),
            "C2" => Some(ConstraintId::C2),
            "C3" => Some(ConstraintId::C3),
            "C4" => Some(ConstraintId::C4),
            "C5" => Some(ConstraintId::C5),
            "C6" => Some(ConstraintId::C6),
            "C7" => Some(ConstraintId::C7),
            "C8" => Some(ConstraintId::C8),
            "C9" => Some(ConstraintId::C9),
            "C11" => Some(ConstraintId::C11),
            "C12" => Some(ConstraintId::C12),
            "C15" => Some(ConstraintId::C15),
            "C16" => Some(ConstraintId::C16),
            "C17" => Some(ConstraintId::C17),
            "ROTATION" | "ROTATION_ADHERENCE" => Some(ConstraintId::RotationAdherence),
            _ => None,
        }
    }
}

impl fmt::Display for ConstraintId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConstraintId::C1 => "C1",
            ConstraintId::C2 => "C2",
            ConstraintId::C3 => "C3",
            ConstraintId::C4 => "C4",
            ConstraintId::C5 => "C5",
            ConstraintId::C6 => "C6",
            ConstraintId::C7 => "C7",
            ConstraintId::C8 => "C8",
            ConstraintId::C9 => "C9",
            ConstraintId::C11 => "C11",
            ConstraintId::C12 => "C12",
            ConstraintId::C15 => "C15",
            ConstraintId::C16 => "C16",
            ConstraintId::C17 => "C17",
            ConstraintId::RotationAdherence => "ROTATION",
        };
        write!(f, "{}", s)
    }
}

/// Enforcement level of a catalog record
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Enforcement {
    Hard,
    Soft,
}

/// One ordered override rule with optional product/rank filters
///
/// Rules are evaluated in catalog order; the first rule whose filters all
/// match the employee wins.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OverrideRule {
    #[serde(default)]
    pub product_types: Option<Vec<String>>,
    #[serde(default)]
    pub ranks: Option<Vec<String>>,
    pub value: f64,
}

impl OverrideRule {
    pub fn matches(&self, product_type: &str, rank: &str) -> bool {
        let product_ok = match &self.product_types {
            None => true,
            Some(products) => products.iter().any(|p| p == product_type),
        };
        let rank_ok = match &self.ranks {
            None => true,
            Some(ranks) => ranks.iter().any(|r| r == rank),
        };
        product_ok && rank_ok
    }
}

/// Per-scheme override: a scalar for the whole scheme, or an ordered rule
/// list filtered by product type and rank
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum SchemeOverride {
    Scalar(f64),
    Rules(Vec<OverrideRule>),
}

/// One catalog record
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintRecord {
    pub id: ConstraintId,
    pub enforcement: Enforcement,
    pub default_value: f64,
    #[serde(default)]
    pub scheme_overrides: BTreeMap<Scheme, SchemeOverride>,
}

/// How scheme-B SO monthly contractual hours are split into normal/OT
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OtCalculationMethod {
    #[default]
    Cumulative,
    Daily,
}

/// Monthly hour limits keyed by calendar month length (28/29/30/31)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MonthlyHourLimits {
    #[serde(default)]
    pub calculation_method: OtCalculationMethod,
    /// Minimum contractual normal hours per month length
    #[serde(default)]
    pub contractual: BTreeMap<u32, f64>,
    /// Monthly overtime cap per month length
    #[serde(default)]
    pub ot_cap: BTreeMap<u32, f64>,
    /// Monthly overtime cap per month length for APGD-D10 employees
    #[serde(default)]
    pub apgd_d10_ot_cap: BTreeMap<u32, f64>,
}

/// The full labour-law rule configuration of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintCatalog {
    #[serde(default)]
    pub records: Vec<ConstraintRecord>,
    #[serde(default)]
    pub monthly_hour_limits: MonthlyHourLimits,
}

impl ConstraintCatalog {
    pub fn record(&self, id: ConstraintId) -> Option<&ConstraintRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Enforcement for a constraint id; records default to hard
    pub fn enforcement(&self, id: ConstraintId) -> Enforcement {
        self.record(id)
            .map(|r| r.enforcement)
            .unwrap_or(Enforcement::Hard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constraint_id_parse_roundtrip() {
        assert_eq!(ConstraintId::parse("C4"), Some(ConstraintId::C4));
        assert_eq!(ConstraintId::parse("c17"), Some(ConstraintId::C17));
        assert_eq!(
            ConstraintId::parse("ROTATION"),
            Some(ConstraintId::RotationAdherence)
        );
        assert_eq!(ConstraintId::parse("C10"), None);
        assert_eq!(ConstraintId::C11.to_string(), "C11");
    }

    #[test]
    fn test_override_rule_first_match_semantics() {
        let rule = OverrideRule {
            product_types: Some(vec!["APO".to_string()]),
            ranks: None,
            value: 8.0,
        };
        assert!(rule.matches("APO", "SGT"));
        assert!(!rule.matches("SO", "SGT"));

        let rank_rule = OverrideRule {
            product_types: None,
            ranks: Some(vec!["CPL".to_string()]),
            value: 10.0,
        };
        assert!(rank_rule.matches("APO", "CPL"));
        assert!(!rank_rule.matches("APO", "SGT"));
    }

    #[test]
    fn test_catalog_lookup_defaults_to_hard() {
        let catalog = ConstraintCatalog::default();
        assert!(catalog.record(ConstraintId::C1).is_none());
        assert_eq!(catalog.enforcement(ConstraintId::C1), Enforcement::Hard);
    }

    #[test]
    fn test_scheme_override_deserializes_scalar_and_rules() {
        let scalar: SchemeOverride = serde_json::from_str("8.0").unwrap();
        assert_eq!(scalar, SchemeOverride::Scalar(8.0));

        let rules: SchemeOverride =
            serde_json::from_str(r#"[{"productTypes":["APO"],"value":8.0}]"#).unwrap();
        match rules {
            SchemeOverride::Rules(rules) => assert_eq!(rules.len(), 1),
            _ => panic!("expected rules variant"),
        }
    }
}
