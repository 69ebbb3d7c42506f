//! Schema-0.95 JSON input parser
//!
//! Parses and validates the input document into domain entities.
//! Input errors fail fast with the offending JSON path; everything that
//! survives parsing is structurally sound for the pipeline.

use chrono::{NaiveDate, NaiveTime};
use std::collections::BTreeSet;
use std::fs;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

use super::input_models::*;
use crate::domain::entities::{
    ConstraintCatalog, ConstraintId, ConstraintRecord, DateRange, DemandItem, Employee,
    Enforcement, GenderPolicy, MonthlyHourLimits, OtCalculationMethod, PlanningHorizon,
    Qualification, Requirement, RosterInput, RosteringBasis, SchemeOverride, ShiftDefinition,
    SolverConfig, WorkPattern, SCHEMA_VERSION,
};
use crate::domain::value_objects::{Gender, Scheme};

/// Structured input error carrying the offending document path
#[derive(Debug, Error)]
pub enum RosterError {
    #[error("unsupported schema version '{found}' at schemaVersion (expected {SCHEMA_VERSION})")]
    SchemaVersion { found: String },
    #[error("invalid value at {path}: {message}")]
    InvalidField { path: String, message: String },
    #[error("malformed input document: {0}")]
    Malformed(#[from] serde_json::Error),
    #[error("cannot read input file: {0}")]
    Io(#[from] std::io::Error),
}

impl RosterError {
    fn field(path: impl Into<String>, message: impl Into<String>) -> Self {
        RosterError::InvalidField {
            path: path.into(),
            message: message.into(),
        }
    }
}

/// Parser for schema-0.95 roster input documents
pub struct RosterInputParser;

impl RosterInputParser {
    pub fn new() -> Self {
        Self
    }

    /// Parses an input document from disk
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the schema-0.95 JSON document
    ///
    /// # Returns
    ///
    /// The validated RosterInput
    ///
    /// # Errors
    ///
    /// Returns a RosterError when the file cannot be read, the JSON is
    /// malformed, or any field fails validation.
    pub fn parse_file<P: AsRef<Path>>(&self, path: P) -> Result<RosterInput, RosterError> {
        let content = fs::read_to_string(path)?;
        self.parse_str(&content)
    }

    /// Parses an input document from a JSON string
    ///
    /// # Arguments
    ///
    /// * `content` - The JSON text of the document
    ///
    /// # Returns
    ///
    /// The validated RosterInput
    ///
    /// # Errors
    ///
    /// Returns a RosterError naming the offending path when validation
    /// fails.
    pub fn parse_str(&self, content: &str) -> Result<RosterInput, RosterError> {
        let document: InputDocument = serde_json::from_str(content)?;
        self.convert(document)
    }

    fn convert(&self, document: InputDocument) -> Result<RosterInput, RosterError> {
        if document.schema_version != SCHEMA_VERSION {
            return Err(RosterError::SchemaVersion {
                found: document.schema_version,
            });
        }

        let start = parse_date(&document.planning_horizon.start_date, "planningHorizon.startDate")?;
        let end = parse_date(&document.planning_horizon.end_date, "planningHorizon.endDate")?;
        if end < start {
            return Err(RosterError::field(
                "planningHorizon",
                "endDate precedes startDate",
            ));
        }
        let mut horizon = PlanningHorizon::new(start, end);
        for (idx, holiday) in document.public_holidays.iter().enumerate() {
            let date = parse_date(holiday, &format!("publicHolidays[{idx}]"))?;
            horizon.public_holidays.insert(date);
        }

        let shifts = self.convert_shifts(&document)?;
        let shift_codes: BTreeSet<&str> = shifts.iter().map(|s| s.code.as_str()).collect();
        let employees = self.convert_employees(&document)?;
        let demand_items = self.convert_demands(&document, &horizon, &shift_codes)?;
        let catalog = self.convert_catalog(&document)?;
        let solver_config = self.convert_solver_config(&document)?;

        Ok(RosterInput {
            horizon,
            shifts,
            employees,
            demand_items,
            catalog,
            solver_config,
        })
    }

    fn convert_shifts(&self, document: &InputDocument) -> Result<Vec<ShiftDefinition>, RosterError> {
        let mut shifts = Vec::new();
        let mut seen = BTreeSet::new();
        for (idx, shift) in document.shifts.iter().enumerate() {
            let path = format!("shifts[{idx}]");
            if !seen.insert(shift.code.clone()) {
                return Err(RosterError::field(path, format!("duplicate shift code '{}'", shift.code)));
            }
            shifts.push(ShiftDefinition {
                code: shift.code.clone(),
                start_time: parse_time(&shift.start_time, &format!("{path}.startTime"))?,
                end_time: parse_time(&shift.end_time, &format!("{path}.endTime"))?,
                ranks: shift.ranks.clone(),
                product_types: shift.product_types.clone(),
            });
        }
        if shifts.is_empty() {
            return Err(RosterError::field("shifts", "at least one shift definition is required"));
        }
        Ok(shifts)
    }

    fn convert_employees(&self, document: &InputDocument) -> Result<Vec<Employee>, RosterError> {
        let mut employees = Vec::new();
        let mut seen = BTreeSet::new();
        for (idx, wire) in document.employees.iter().enumerate() {
            let path = format!("employees[{idx}]");
            if !seen.insert(wire.id.clone()) {
                return Err(RosterError::field(path, format!("duplicate employee id '{}'", wire.id)));
            }
            if wire.enable_apgd_d10.is_some() {
                info!(
                    employee = %wire.id,
                    "ignoring deprecated enableAPGD-D10 flag; qualification is derived from scheme and product type"
                );
            }
            let scheme = Scheme::parse(&wire.scheme)
                .map_err(|e| RosterError::field(format!("{path}.scheme"), e.to_string()))?;
            let gender = match &wire.gender {
                None => Gender::Any,
                Some(raw) => Gender::parse(raw).ok_or_else(|| {
                    RosterError::field(format!("{path}.gender"), format!("unknown gender '{raw}'"))
                })?,
            };
            let mut employee = Employee::new(
                wire.id.clone(),
                scheme,
                wire.product_type.clone(),
                wire.rank.clone(),
                wire.org_unit.clone(),
            )
            .with_gender(gender)
            .with_rotation_offset(wire.rotation_offset);
            employee.is_local = wire.is_local.unwrap_or(true);
            for (q_idx, qualification) in wire.qualifications.iter().enumerate() {
                let q_path = format!("{path}.qualifications[{q_idx}]");
                employee.qualifications.push(Qualification {
                    name: qualification.name.clone(),
                    valid_from: parse_date(&qualification.valid_from, &format!("{q_path}.validFrom"))?,
                    valid_to: parse_date(&qualification.valid_to, &format!("{q_path}.validTo"))?,
                });
            }
            for (l_idx, leave) in wire.leave_ranges.iter().enumerate() {
                let l_path = format!("{path}.leaveRanges[{l_idx}]");
                employee.leave_ranges.push(DateRange::new(
                    parse_date(&leave.start_date, &format!("{l_path}.startDate"))?,
                    parse_date(&leave.end_date, &format!("{l_path}.endDate"))?,
                ));
            }
            for (o_idx, approval) in wire.override_approvals.iter().enumerate() {
                employee.override_approvals.push(parse_date(
                    approval,
                    &format!("{path}.overrideApprovals[{o_idx}]"),
                )?);
            }
            employees.push(employee);
        }
        Ok(employees)
    }

    fn convert_demands(
        &self,
        document: &InputDocument,
        horizon: &PlanningHorizon,
        shift_codes: &BTreeSet<&str>,
    ) -> Result<Vec<DemandItem>, RosterError> {
        let mut demands = Vec::new();
        for (idx, wire) in document.demand_items.iter().enumerate() {
            let path = format!("demandItems[{idx}]");
            let start = parse_date(&wire.date_range.start_date, &format!("{path}.dateRange.startDate"))?;
            let end = parse_date(&wire.date_range.end_date, &format!("{path}.dateRange.endDate"))?;
            if !horizon.contains(start) || !horizon.contains(end) || end < start {
                return Err(RosterError::field(
                    format!("{path}.dateRange"),
                    "demand date range must lie inside the planning horizon",
                ));
            }
            let mut demand = DemandItem::new(wire.id.clone(), wire.org_unit.clone(), DateRange::new(start, end));
            for (r_idx, requirement) in wire.requirements.iter().enumerate() {
                let r_path = format!("{path}.requirements[{r_idx}]");
                demand
                    .requirements
                    .push(self.convert_requirement(requirement, &r_path, shift_codes)?);
            }
            demands.push(demand);
        }
        Ok(demands)
    }

    fn convert_requirement(
        &self,
        wire: &InputRequirement,
        path: &str,
        shift_codes: &BTreeSet<&str>,
    ) -> Result<Requirement, RosterError> {
        if wire.headcount == 0 {
            return Err(RosterError::field(
                format!("{path}.headcount"),
                "headcount must be at least 1",
            ));
        }
        for code in &wire.shift_codes {
            if !shift_codes.contains(code.as_str()) {
                return Err(RosterError::field(
                    format!("{path}.shiftCodes"),
                    format!("unknown shift code '{code}'"),
                ));
            }
        }
        for code in &wire.work_pattern {
            if code != "O" && !shift_codes.contains(code.as_str()) {
                return Err(RosterError::field(
                    format!("{path}.workPattern"),
                    format!("unknown shift code '{code}' in pattern"),
                ));
            }
        }
        let pattern = WorkPattern::from_codes(&wire.work_pattern)
            .map_err(|e| RosterError::field(format!("{path}.workPattern"), e.to_string()))?;
        let scheme = Scheme::parse(&wire.scheme)
            .map_err(|e| RosterError::field(format!("{path}.scheme"), e.to_string()))?;
        let gender_policy = match wire.gender_policy.as_deref() {
            None | Some("All") => GenderPolicy::All,
            Some("Male") => GenderPolicy::Male,
            Some("Female") => GenderPolicy::Female,
            Some("Mix") => GenderPolicy::Mix,
            Some(other) => {
                return Err(RosterError::field(
                    format!("{path}.genderPolicy"),
                    format!("unknown gender policy '{other}'"),
                ))
            }
        };
        let rostering_basis = match wire.rostering_basis.as_deref() {
            None => None,
            Some("demandBased") => Some(RosteringBasis::DemandBased),
            Some("outcomeBased") => Some(RosteringBasis::OutcomeBased),
            Some(other) => {
                return Err(RosterError::field(
                    format!("{path}.rosteringBasis"),
                    format!("unknown rostering basis '{other}'"),
                ))
            }
        };
        if let Some(buffer) = wire.icpmp_buffer_percentage {
            if !(0.0..=100.0).contains(&buffer) {
                return Err(RosterError::field(
                    format!("{path}.icpmpBufferPercentage"),
                    "buffer percentage must be between 0 and 100",
                ));
            }
        }
        let mut requirement = Requirement::new(
            wire.id.clone(),
            wire.shift_codes.clone(),
            pattern,
            wire.headcount,
            scheme,
        );
        requirement.ranks = wire.ranks.clone();
        requirement.product_types = wire.product_types.clone();
        requirement.gender_policy = gender_policy;
        requirement.required_qualifications = wire.required_qualifications.clone();
        requirement.team_whitelist = wire.team_whitelist.clone();
        requirement.enable_ot_aware_icpmp = wire.enable_ot_aware_icpmp.unwrap_or(false);
        if let Some(buffer) = wire.icpmp_buffer_percentage {
            requirement.icpmp_buffer_percentage = buffer;
        }
        requirement.rostering_basis = rostering_basis;
        requirement.strict_adherence_ratio = wire.strict_adherence_ratio;
        Ok(requirement)
    }

    fn convert_catalog(&self, document: &InputDocument) -> Result<ConstraintCatalog, RosterError> {
        let mut catalog = ConstraintCatalog::default();
        for (idx, wire) in document.constraint_list.iter().enumerate() {
            let path = format!("constraintList[{idx}]");
            let Some(id) = ConstraintId::parse(&wire.id) else {
                warn!(constraint = %wire.id, "unknown constraint id in catalog, skipping");
                continue;
            };
            let enforcement = match wire.enforcement.as_deref() {
                None | Some("hard") => Enforcement::Hard,
                Some("soft") => Enforcement::Soft,
                Some(other) => {
                    return Err(RosterError::field(
                        format!("{path}.enforcement"),
                        format!("unknown enforcement '{other}'"),
                    ))
                }
            };
            let mut record = ConstraintRecord {
                id,
                enforcement,
                default_value: wire.default_value,
                scheme_overrides: Default::default(),
            };
            for (scheme_key, value) in &wire.scheme_overrides {
                let scheme = Scheme::parse(scheme_key).map_err(|e| {
                    RosterError::field(format!("{path}.schemeOverrides"), e.to_string())
                })?;
                let override_value: SchemeOverride =
                    serde_json::from_value(value.clone()).map_err(|e| {
                        RosterError::field(
                            format!("{path}.schemeOverrides.{scheme_key}"),
                            e.to_string(),
                        )
                    })?;
                record.scheme_overrides.insert(scheme, override_value);
            }
            catalog.records.push(record);
        }
        if let Some(limits) = &document.monthly_hour_limits {
            catalog.monthly_hour_limits = self.convert_monthly_limits(limits)?;
        }
        Ok(catalog)
    }

    fn convert_monthly_limits(
        &self,
        wire: &InputMonthlyHourLimits,
    ) -> Result<MonthlyHourLimits, RosterError> {
        let calculation_method = match wire.calculation_method.as_deref() {
            None | Some("cumulative") => OtCalculationMethod::Cumulative,
            Some("daily") => OtCalculationMethod::Daily,
            Some(other) => {
                return Err(RosterError::field(
                    "monthlyHourLimits.calculationMethod",
                    format!("unknown calculation method '{other}'"),
                ))
            }
        };
        let mut limits = MonthlyHourLimits {
            calculation_method,
            ..Default::default()
        };
        for (table, source) in [
            (&mut limits.contractual, &wire.contractual),
            (&mut limits.ot_cap, &wire.ot_cap),
            (&mut limits.apgd_d10_ot_cap, &wire.apgd_d10_ot_cap),
        ] {
            for (key, value) in source {
                let month_len: u32 = key.parse().map_err(|_| {
                    RosterError::field(
                        "monthlyHourLimits",
                        format!("month length key '{key}' is not a number"),
                    )
                })?;
                if !(28..=31).contains(&month_len) {
                    return Err(RosterError::field(
                        "monthlyHourLimits",
                        format!("month length {month_len} out of range 28-31"),
                    ));
                }
                table.insert(month_len, *value);
            }
        }
        Ok(limits)
    }

    fn convert_solver_config(&self, document: &InputDocument) -> Result<SolverConfig, RosterError> {
        let mut config = SolverConfig::default();
        if let Some(wire) = &document.solver_config {
            if let Some(limit) = wire.time_limit_seconds {
                if limit <= 0.0 {
                    return Err(RosterError::field(
                        "solverConfig.timeLimitSeconds",
                        "time limit must be positive",
                    ));
                }
                config.time_limit_seconds = limit;
            }
            if let Some(seed) = wire.seed {
                config.seed = seed;
            }
            if let Some(ratio) = wire.strict_adherence_ratio {
                if !(0.0..=1.0).contains(&ratio) {
                    return Err(RosterError::field(
                        "solverConfig.strictAdherenceRatio",
                        "strict adherence ratio must be between 0 and 1",
                    ));
                }
                config.strict_adherence_ratio = ratio;
            }
            config.worker_threads = wire.worker_threads;
        }
        Ok(config)
    }
}

impl Default for RosterInputParser {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_date(raw: &str, path: &str) -> Result<NaiveDate, RosterError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| RosterError::field(path, format!("'{raw}' is not a YYYY-MM-DD date")))
}

fn parse_time(raw: &str, path: &str) -> Result<NaiveTime, RosterError> {
    let trimmed = raw.trim();
    NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
        .map_err(|_| RosterError::field(path, format!("'{raw}' is not a HH:MM time")))
}
