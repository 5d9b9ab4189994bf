// crates/suitegen-contract/src/validator.rs
// ============================================================================
// Module: Contract Validator
// Description: Structural and semantic checks with a 0-100 health score.
// Purpose: Report contract problems without mutating or rejecting the document.
// Dependencies: serde, serde_json, tracing
// ============================================================================

//! ## Overview
//! Validation is a set of independent, side-effect-free checks over the info
//! block, paths, operations, components, and security requirements. Each
//! check returns a [`CheckReport`]; [`validate`] folds them into a
//! [`ValidationResult`] whose score starts at 100 and is reduced by each
//! report's penalty, floored at 0.
//!
//! Errors carry penalties and make the document invalid. Warnings are
//! advisory and never affect the score.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::model::ContractDocument;
use crate::model::DiagnosticScope;
use crate::model::ParameterLocation;
use crate::model::SecurityRequirement;
use crate::model::template_parameters;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Score of a contract with no findings.
const MAX_SCORE: u32 = 100;
/// Penalty for a missing `info` block.
const PENALTY_MISSING_INFO: u32 = 20;
/// Penalty for a missing `info.title` or `info.version`.
const PENALTY_MISSING_INFO_FIELD: u32 = 5;
/// Penalty for an empty path table.
const PENALTY_EMPTY_PATHS: u32 = 30;
/// Penalty for each malformed path or operation.
const PENALTY_MALFORMED: u32 = 2;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Single validation finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationIssue {
    /// Dotted field path or JSON pointer of the finding.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

impl ValidationIssue {
    /// Builds an issue.
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Output of a single check.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckReport {
    /// Findings that make the contract invalid.
    pub errors: Vec<ValidationIssue>,
    /// Advisory findings.
    pub warnings: Vec<ValidationIssue>,
    /// Score reduction contributed by this check.
    pub penalty: u32,
}

impl CheckReport {
    /// Records an error with its penalty.
    fn error(&mut self, issue: ValidationIssue, penalty: u32) {
        self.errors.push(issue);
        self.penalty = self.penalty.saturating_add(penalty);
    }

    /// Records a warning.
    fn warn(&mut self, issue: ValidationIssue) {
        self.warnings.push(issue);
    }

    /// Returns true when the check found no errors.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Per-area pass flags.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationChecks {
    /// The info block is complete.
    pub schema: bool,
    /// No path errors.
    pub paths: bool,
    /// No operation errors.
    pub operations: bool,
    /// Every operation declares responses.
    pub responses: bool,
}

/// Aggregate validation outcome.
///
/// # Invariants
/// - `is_valid` is true exactly when `errors` is empty.
/// - `score` is within `0 ..= 100`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    /// True when no errors were found.
    pub is_valid: bool,
    /// All errors in check order.
    pub errors: Vec<ValidationIssue>,
    /// All warnings in check order.
    pub warnings: Vec<ValidationIssue>,
    /// Health score.
    pub score: u8,
    /// Per-area pass flags.
    pub checks: ValidationChecks,
}

// ============================================================================
// SECTION: Validation
// ============================================================================

/// Runs every check and folds the reports into a result.
#[must_use]
pub fn validate(document: &ContractDocument) -> ValidationResult {
    let info = check_info(document);
    let paths = check_paths(document);
    let operations = check_operations(document);
    let components = check_components(document);
    let security = check_security(document);

    let checks = ValidationChecks {
        schema: info.passed(),
        paths: paths.passed(),
        operations: operations.passed(),
        responses: document.operations.iter().all(|operation| operation.declares_responses),
    };
    let reports = [info, paths, operations, components, security];
    let penalty = reports.iter().fold(0_u32, |total, report| total.saturating_add(report.penalty));
    let score = u8::try_from(MAX_SCORE.saturating_sub(penalty)).unwrap_or(0);
    let mut errors = Vec::new();
    let mut warnings = Vec::new();
    for report in reports {
        errors.extend(report.errors);
        warnings.extend(report.warnings);
    }
    debug!(score, errors = errors.len(), warnings = warnings.len(), "contract validated");
    ValidationResult {
        is_valid: errors.is_empty(),
        errors,
        warnings,
        score,
        checks,
    }
}

/// Checks the `info` block.
#[must_use]
pub fn check_info(document: &ContractDocument) -> CheckReport {
    let mut report = CheckReport::default();
    let Some(info) = &document.info else {
        report.error(ValidationIssue::new("info", "info block is missing"), PENALTY_MISSING_INFO);
        return report;
    };
    if info.title.as_deref().is_none_or(str::is_empty) {
        report.error(ValidationIssue::new("info.title", "info.title is missing"), PENALTY_MISSING_INFO_FIELD);
    }
    if info.version.as_deref().is_none_or(str::is_empty) {
        report
            .error(ValidationIssue::new("info.version", "info.version is missing"), PENALTY_MISSING_INFO_FIELD);
    }
    report
}

/// Checks the path table.
#[must_use]
pub fn check_paths(document: &ContractDocument) -> CheckReport {
    let mut report = CheckReport::default();
    if document.paths.is_empty() {
        report.error(ValidationIssue::new("paths", "contract declares no paths"), PENALTY_EMPTY_PATHS);
        return report;
    }
    for entry in &document.paths {
        if !entry.path.starts_with('/') {
            report.error(
                ValidationIssue::new(format!("paths.{}", entry.path), "path must start with '/'"),
                PENALTY_MALFORMED,
            );
        }
    }
    for diagnostic in document.diagnostics.iter().filter(|diag| diag.scope == DiagnosticScope::Path) {
        report.error(ValidationIssue::new(diagnostic.pointer.clone(), diagnostic.message.clone()), PENALTY_MALFORMED);
    }
    report
}

/// Checks individual operations.
#[must_use]
pub fn check_operations(document: &ContractDocument) -> CheckReport {
    let mut report = CheckReport::default();
    for diagnostic in document.diagnostics.iter().filter(|diag| diag.scope == DiagnosticScope::Operation) {
        report.error(ValidationIssue::new(diagnostic.pointer.clone(), diagnostic.message.clone()), PENALTY_MALFORMED);
    }
    let mut seen_ids: BTreeMap<&str, String> = BTreeMap::new();
    for operation in &document.operations {
        let key = operation.key();
        if let Some(id) = operation.operation_id.as_deref() {
            if let Some(first) = seen_ids.get(id) {
                report.error(
                    ValidationIssue::new(
                        format!("{key}.operationId"),
                        format!("operationId {id} duplicates {first}"),
                    ),
                    PENALTY_MALFORMED,
                );
            } else {
                seen_ids.insert(id, key.clone());
            }
        }
        if !operation.declares_responses {
            report.error(
                ValidationIssue::new(format!("{key}.responses"), "operation declares no responses"),
                PENALTY_MALFORMED,
            );
        } else if operation.success_responses().is_empty() {
            report.warn(ValidationIssue::new(format!("{key}.responses"), "operation declares no 2xx response"));
        }
        match template_parameters(&operation.path) {
            None => report.error(
                ValidationIssue::new(format!("{key}.path"), "path template braces are unbalanced"),
                PENALTY_MALFORMED,
            ),
            Some(names) => {
                for name in names {
                    let declared = operation
                        .parameters_in(ParameterLocation::Path)
                        .any(|parameter| parameter.name == name);
                    if !declared {
                        report.error(
                            ValidationIssue::new(
                                format!("{key}.parameters"),
                                format!("path parameter {name} is not declared"),
                            ),
                            PENALTY_MALFORMED,
                        );
                    }
                }
            }
        }
    }
    report
}

/// Checks component references.
#[must_use]
pub fn check_components(document: &ContractDocument) -> CheckReport {
    let mut report = CheckReport::default();
    for diagnostic in document.diagnostics.iter().filter(|diag| diag.scope == DiagnosticScope::Component) {
        report.warn(ValidationIssue::new(diagnostic.pointer.clone(), diagnostic.message.clone()));
    }
    let mut references = Vec::new();
    collect_refs(&document.raw, String::new(), &mut references);
    for (pointer, reference) in references {
        if document.resolve_ref(reference).is_none() {
            report.warn(ValidationIssue::new(pointer, format!("reference {reference} cannot be resolved")));
        }
    }
    report
}

/// Checks that security requirements name defined schemes.
#[must_use]
pub fn check_security(document: &ContractDocument) -> CheckReport {
    let mut report = CheckReport::default();
    check_requirements(document, "security", &document.security, &mut report);
    for operation in &document.operations {
        if let Some(requirements) = &operation.security {
            check_requirements(document, &format!("{}.security", operation.key()), requirements, &mut report);
        }
    }
    report
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Warns for each requirement naming an undefined scheme.
fn check_requirements(
    document: &ContractDocument,
    field: &str,
    requirements: &[SecurityRequirement],
    report: &mut CheckReport,
) {
    for requirement in requirements {
        for (name, _) in &requirement.schemes {
            if document.security_scheme(name).is_none() {
                report.warn(ValidationIssue::new(field, format!("security scheme {name} is not defined")));
            }
        }
    }
}

/// Collects every `$ref` string with the JSON pointer of its owner.
fn collect_refs<'a>(value: &'a Value, pointer: String, out: &mut Vec<(String, &'a str)>) {
    match value {
        Value::Object(map) => {
            if let Some(reference) = map.get("$ref").and_then(Value::as_str) {
                out.push((pointer.clone(), reference));
            }
            for (key, child) in map {
                let escaped = key.replace('~', "~0").replace('/', "~1");
                collect_refs(child, format!("{pointer}/{escaped}"), out);
            }
        }
        Value::Array(items) => {
            for (index, child) in items.iter().enumerate() {
                collect_refs(child, format!("{pointer}/{index}"), out);
            }
        }
        _ => {}
    }
}
