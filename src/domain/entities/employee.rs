//! Employee entity module
//!
//! This module defines the Employee entity: a member of the guarding
//! workforce with the attributes the roster engine filters and constrains
//! on. Employees are immutable for the duration of a run.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::horizon::DateRange;
use crate::domain::value_objects::scheme::{Gender, Scheme, APO_PRODUCT_TYPE};

/// A qualification record with a validity range
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Qualification {
    pub name: String,
    pub valid_from: NaiveDate,
    pub valid_to: NaiveDate,
}

impl Qualification {
    /// Checks the qualification's validity on a date
    ///
    /// # Arguments
    ///
    /// * `date` - The date to check
    ///
    /// # Returns
    ///
    /// `true` if the date falls inside the validity range
    pub fn is_valid_on(&self, date: NaiveDate) -> bool {
        date >= self.valid_from && date <= self.valid_to
    }
}

/// A member of the guarding workforce
///
/// The rotation offset modulates where in a work pattern the employee
/// starts; the capacity preprocessor may re-tag it to balance coverage
/// across a cycle. Leave ranges make the employee unavailable; override
/// approvals grant explicit per-date exceptions to qualification rules.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    /// Unique free-form identifier
    pub id: String,
    pub scheme: Scheme,
    pub product_type: String,
    pub rank: String,
    #[serde(default = "default_gender")]
    pub gender: Gender,
    /// Organisational-unit identifier
    pub org_unit: String,
    /// Non-negative rotation offset into the work pattern cycle
    #[serde(default)]
    pub rotation_offset: usize,
    /// Local (true) vs foreign (false) hire
    #[serde(default = "default_local")]
    pub is_local: bool,
    #[serde(default)]
    pub qualifications: Vec<Qualification>,
    /// Leave and other unavailability ranges
    #[serde(default)]
    pub leave_ranges: Vec<DateRange>,
    /// Dates with explicitly approved qualification overrides
    #[serde(default)]
    pub override_approvals: Vec<NaiveDate>,
}

fn default_gender() -> Gender {
    Gender::Any
}

fn default_local() -> bool {
    true
}

impl Employee {
    /// Creates a new Employee with minimal required fields
    ///
    /// # Arguments
    ///
    /// * `id` - Unique free-form identifier
    /// * `scheme` - Normalized labour-law scheme
    /// * `product_type` - Product-type identifier (e.g. `APO`, `SO`)
    /// * `rank` - Rank identifier
    /// * `org_unit` - Organisational-unit identifier
    ///
    /// # Returns
    ///
    /// A new Employee instance with default values for optional fields
    pub fn new(
        id: impl Into<String>,
        scheme: Scheme,
        product_type: impl Into<String>,
        rank: impl Into<String>,
        org_unit: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            scheme,
            product_type: product_type.into(),
            rank: rank.into(),
            gender: Gender::Any,
            org_unit: org_unit.into(),
            rotation_offset: 0,
            is_local: true,
            qualifications: Vec::new(),
            leave_ranges: Vec::new(),
            override_approvals: Vec::new(),
        }
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_rotation_offset(mut self, offset: usize) -> Self {
        self.rotation_offset = offset;
        self
    }

    pub fn with_qualification(mut self, qualification: Qualification) -> Self {
        self.qualifications.push(qualification);
        self
    }

    pub fn with_leave(mut self, range: DateRange) -> Self {
        self.leave_ranges.push(range);
        self
    }

    /// Whether the employee qualifies for the APGD-D10 exemption
    ///
    /// Qualification is automatic for scheme A with the APO product type.
    /// Any `enableAPGD-D10` flag in the input is ignored (deprecated).
    ///
    /// # Returns
    ///
    /// `true` iff scheme is A and the product type is APO
    pub fn is_apgd_d10(&self) -> bool {
        self.scheme == Scheme::A && self.product_type == APO_PRODUCT_TYPE
    }

    /// Whether the employee is on leave / unavailable on the given date
    ///
    /// # Arguments
    ///
    /// * `date` - The date to check
    ///
    /// # Returns
    ///
    /// `true` if any leave range contains the date
    pub fn is_on_leave(&self, date: NaiveDate) -> bool {
        self.leave_ranges.iter().any(|r| r.contains(date))
    }

    /// Whether the named qualification is valid on the given date
    ///
    /// # Arguments
    ///
    /// * `name` - Qualification name to look up
    /// * `date` - Assignment date the qualification must cover
    ///
    /// # Returns
    ///
    /// `true` if a matching qualification record is valid on the date
    pub fn holds_qualification(&self, name: &str, date: NaiveDate) -> bool {
        self.qualifications
            .iter()
            .any(|q| q.name == name && q.is_valid_on(date))
    }

    /// Whether a per-date override approval exists for the given date
    ///
    /// # Arguments
    ///
    /// * `date` - The date to check
    ///
    /// # Returns
    ///
    /// `true` if an explicit exception was granted for the date
    pub fn has_override_approval(&self, date: NaiveDate) -> bool {
        self.override_approvals.contains(&date)
    }
}
