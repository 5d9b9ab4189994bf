// crates/suitegen-core/src/planner.rs
// ============================================================================
// Module: Scenario Planner
// Description: Maps operations to ordered test scenarios, rules, and data needs.
// Purpose: Deterministic per-operation scenario plans for code synthesis.
// Dependencies: suitegen-contract, suitegen-config, serde_json, url
// ============================================================================

//! ## Overview
//! The planner turns one [`Operation`] into a [`ScenarioPlan`]. Scenarios are
//! emitted in a fixed category order (success, error, edge, security,
//! performance) and numbered per category, so identical contracts and
//! options always yield identical plans.
//!
//! Validation rules and data requirements are computed once per operation and
//! shared by every scenario of the plan through [`Arc`].
//!
//! The module also hosts the grouping and dependency-ordering heuristics used
//! to lay out generated files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::cmp::Reverse;
use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::collections::BinaryHeap;
use std::sync::Arc;

use serde_json::Map;
use serde_json::Value;
use suitegen_config::GenerationOptions;
use suitegen_config::GroupingStrategy;
use suitegen_config::SynthesisMode;
use suitegen_contract::ApiKeyLocation;
use suitegen_contract::ContractDocument;
use suitegen_contract::HttpMethod;
use suitegen_contract::Operation;
use suitegen_contract::Parameter;
use suitegen_contract::ParameterLocation;
use suitegen_contract::ResponseSpec;
use suitegen_contract::SecuritySchemeKind;
use suitegen_contract::template_parameters;
use url::Url;

use crate::error::GenerationError;
use crate::synth::DataSynthesizer;
use crate::synth::required_names;
use crate::synth::schema_type;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status expected by security scenarios.
pub const UNAUTHORIZED_STATUS: u16 = 401;
/// Depth limit when walking request bodies for edge fields.
const MAX_EDGE_DEPTH: usize = 4;
/// Placeholder base used to percent-encode rendered paths.
const PATH_BASE: &str = "http://suitegen.invalid/";
/// Group used when an operation has neither tags nor literal path segments.
pub const ROOT_GROUP: &str = "root";
/// Headers the generated client sets itself.
const RESERVED_HEADERS: [&str; 4] = ["authorization", "content-type", "accept", "cookie"];

// ============================================================================
// SECTION: Scenario Types
// ============================================================================

/// Scenario intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ScenarioCategory {
    /// Declared success responses.
    Success,
    /// Declared error responses and invalid payloads.
    Error,
    /// Boundary values of constrained fields.
    Edge,
    /// Missing and malformed credentials.
    Security,
    /// Latency threshold checks.
    Performance,
}

impl ScenarioCategory {
    /// Returns a stable label used in scenario ids.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Edge => "edge",
            Self::Security => "security",
            Self::Performance => "performance",
        }
    }

    /// Returns the scenario priority (1 is highest).
    #[must_use]
    pub const fn priority(self) -> u8 {
        match self {
            Self::Success | Self::Security => 1,
            Self::Error => 2,
            Self::Edge => 3,
            Self::Performance => 4,
        }
    }

    /// Position in the fixed category order.
    const fn slot(self) -> usize {
        match self {
            Self::Success => 0,
            Self::Error => 1,
            Self::Edge => 2,
            Self::Security => 3,
            Self::Performance => 4,
        }
    }
}

/// Credential placement derived from a security scheme.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// `Authorization: Bearer <token>`.
    Bearer,
    /// `Authorization: Basic <token>`.
    Basic,
    /// Named API key.
    ApiKey {
        /// Header, query, or cookie name.
        name: String,
        /// Where the key is sent.
        location: ApiKeyLocation,
    },
}

/// Credential handling of one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthMode {
    /// No credential required.
    None,
    /// Send a valid credential.
    Valid(Credential),
    /// Omit the credential.
    Missing(Credential),
    /// Send a syntactically broken credential.
    Malformed(Credential),
}

impl AuthMode {
    /// Returns true when the request reads the configured token.
    #[must_use]
    pub const fn needs_token(&self) -> bool {
        matches!(self, Self::Valid(_))
    }
}

/// Request body.
#[derive(Debug, Clone, PartialEq)]
pub enum RequestPayload {
    /// JSON document.
    Json(Value),
    /// URL-encoded form fields.
    Form(Vec<(String, Value)>),
}

/// Concrete request of a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestTemplate {
    /// HTTP method.
    pub method: HttpMethod,
    /// Path with template parameters replaced and percent-encoded.
    pub path: String,
    /// Query parameters.
    pub query: Vec<(String, Value)>,
    /// Header parameters.
    pub headers: Vec<(String, Value)>,
    /// Cookie parameters.
    pub cookies: Vec<(String, Value)>,
    /// Request body.
    pub body: Option<RequestPayload>,
    /// Credential handling.
    pub auth: AuthMode,
}

/// Expected response of a scenario.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpectedResponse {
    /// Expected status code.
    pub status: u16,
    /// Component schema name of the response body.
    pub schema_ref: Option<String>,
    /// Top-level fields the body must carry.
    pub required_fields: Vec<String>,
    /// Synthesized body matching the response schema.
    pub example_body: Option<Value>,
    /// True when the body is JSON.
    pub json: bool,
}

/// Check performed on the response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assertion {
    /// Status equals the value.
    Status(u16),
    /// Body parses as JSON.
    JsonBody,
    /// Top-level JSON field is present.
    RequiredField(String),
    /// Round trip completes within the threshold.
    MaxLatencyMs(u64),
}

/// Validation rule kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleKind {
    /// Field must be present.
    Required,
    /// Field must have the declared type.
    Type,
    /// Field must match the declared format.
    Format,
    /// Field must be within numeric or length bounds.
    Range,
    /// Field must match the declared pattern.
    Pattern,
    /// Field must be one of the declared values.
    Enum,
}

/// Constraint derived from a parameter or body schema.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidationRule {
    /// Dotted field path (`query.limit`, `body.name`).
    pub field: String,
    /// Rule kind.
    pub kind: RuleKind,
    /// Constraint value.
    pub constraint: Value,
    /// Human-readable description.
    pub message: String,
}

/// Data needed to exercise one input of an operation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataRequirement {
    /// Parameter name (`body` for the request body).
    pub name: String,
    /// Parameter location label.
    pub location: String,
    /// Declared type.
    pub value_type: Option<String>,
    /// Declared constraint keywords.
    pub constraints: Map<String, Value>,
    /// Example values in preference order.
    pub examples: Vec<Value>,
}

/// One concrete test case.
#[derive(Debug, Clone, PartialEq)]
pub struct TestScenario {
    /// Identifier (`<operation>_<category>_<n>`), usable as a function name.
    pub id: String,
    /// Human-readable description.
    pub name: String,
    /// Scenario intent.
    pub category: ScenarioCategory,
    /// Priority (1 is highest).
    pub priority: u8,
    /// Request to send.
    pub request: RequestTemplate,
    /// Expected response.
    pub expected: ExpectedResponse,
    /// Checks to perform.
    pub assertions: Vec<Assertion>,
    /// Shared validation rules of the operation.
    pub rules: Arc<[ValidationRule]>,
    /// Shared data requirements of the operation.
    pub requirements: Arc<[DataRequirement]>,
}

/// Full plan of one operation.
///
/// # Invariants
/// - Scenarios are in fixed category order, numbered from 1 within each category.
/// - Every scenario's `rules` and `requirements` point at the plan's allocations.
#[derive(Debug, Clone, PartialEq)]
pub struct ScenarioPlan {
    /// Operation declaration index.
    pub operation_index: usize,
    /// Operation key (`METHOD path`).
    pub operation_key: String,
    /// Identifier stem of the operation.
    pub operation_ident: String,
    /// File group.
    pub group: String,
    /// Ordered scenarios.
    pub scenarios: Vec<TestScenario>,
    /// Validation rules.
    pub rules: Arc<[ValidationRule]>,
    /// Data requirements.
    pub requirements: Arc<[DataRequirement]>,
}

impl ScenarioPlan {
    /// Returns true when any scenario sends a valid credential.
    #[must_use]
    pub fn needs_auth(&self) -> bool {
        self.scenarios.iter().any(|scenario| scenario.request.auth.needs_token())
    }

    /// Returns the component schemas referenced by expected responses.
    #[must_use]
    pub fn schema_refs(&self) -> BTreeSet<&str> {
        self.scenarios.iter().filter_map(|scenario| scenario.expected.schema_ref.as_deref()).collect()
    }
}

// ============================================================================
// SECTION: Planner
// ============================================================================

/// Request inputs before path rendering.
#[derive(Debug, Clone)]
struct Inputs {
    /// Values of template parameters.
    path_values: Vec<(String, Value)>,
    /// Query parameters.
    query: Vec<(String, Value)>,
    /// Header parameters.
    headers: Vec<(String, Value)>,
    /// Cookie parameters.
    cookies: Vec<(String, Value)>,
    /// Request body.
    body: Option<RequestPayload>,
}

/// Field with boundary constraints.
struct EdgeField<'s> {
    /// Where the field lives.
    target: EdgeTarget,
    /// Field schema.
    schema: &'s Value,
}

/// Location of an edge field.
enum EdgeTarget {
    /// Parameter at a location.
    Parameter(ParameterLocation, String),
    /// Nested body property.
    Body(Vec<String>),
}

impl EdgeTarget {
    /// Returns the dotted label of the field.
    fn label(&self) -> String {
        match self {
            Self::Parameter(location, name) => format!("{}.{name}", location.as_str()),
            Self::Body(path) => format!("body.{}", path.join(".")),
        }
    }
}

/// Plans scenarios for the operations of one contract.
#[derive(Debug, Clone)]
pub struct ScenarioPlanner<'a> {
    /// Contract being planned.
    document: &'a ContractDocument,
    /// Generation options.
    options: &'a GenerationOptions,
    /// Value generator.
    synth: DataSynthesizer<'a>,
    /// Operation identifiers, disambiguated across the contract.
    idents: Vec<String>,
}

impl<'a> ScenarioPlanner<'a> {
    /// Builds a planner for a contract.
    #[must_use]
    pub fn new(document: &'a ContractDocument, options: &'a GenerationOptions) -> Self {
        let raw: Vec<String> = document.operations.iter().map(operation_ident).collect();
        let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
        for ident in &raw {
            *counts.entry(ident.as_str()).or_insert(0) += 1;
        }
        let mut used: BTreeSet<String> = counts
            .iter()
            .filter(|(_, count)| **count == 1)
            .map(|(ident, _)| (*ident).to_string())
            .collect();
        let mut idents = Vec::with_capacity(raw.len());
        for (index, ident) in raw.iter().enumerate() {
            if counts.get(ident.as_str()).copied().unwrap_or(0) == 1 {
                idents.push(ident.clone());
                continue;
            }
            let mut suffix = index;
            let mut candidate = format!("{ident}_{suffix}");
            while used.contains(&candidate) {
                suffix += 1;
                candidate = format!("{ident}_{suffix}");
            }
            used.insert(candidate.clone());
            idents.push(candidate);
        }
        Self {
            document,
            options,
            synth: DataSynthesizer::new(document, options.synthesis_mode, options.include_examples),
            idents,
        }
    }

    /// Returns the synthesizer bound to this planner.
    #[must_use]
    pub const fn synthesizer(&self) -> &DataSynthesizer<'a> {
        &self.synth
    }

    /// Plans one operation.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Generation`] when the path template is
    /// malformed or cannot be rendered.
    pub fn plan(&self, operation: &Operation) -> Result<ScenarioPlan, GenerationError> {
        let key = operation.key();
        let names = template_parameters(&operation.path).ok_or_else(|| {
            GenerationError::Generation(format!("operation {key} has a malformed path template"))
        })?;
        let ident = self
            .idents
            .get(operation.index)
            .cloned()
            .unwrap_or_else(|| operation_ident(operation));
        let rules: Arc<[ValidationRule]> = self.rules(operation).into();
        let requirements: Arc<[DataRequirement]> = self.requirements(operation).into();
        let base = self.base_inputs(operation, &names);
        let credential = self.credential(operation);
        let valid_auth = credential.clone().map_or(AuthMode::None, AuthMode::Valid);
        let fallback = self.options.error_status_fallback.first().copied().unwrap_or(400);

        let mut builder = PlanBuilder {
            operation,
            ident: &ident,
            counters: [0; 5],
            scenarios: Vec::new(),
            rules: Arc::clone(&rules),
            requirements: Arc::clone(&requirements),
        };

        // success
        let success_status = operation.primary_success_status();
        let successes = operation.success_responses();
        if successes.is_empty() {
            let expected = self.expected(success_status, None);
            builder.push(
                ScenarioCategory::Success,
                format!("{key} succeeds with {success_status}"),
                &base,
                valid_auth.clone(),
                expected,
                None,
            )?;
        }
        for response in &successes {
            let status = response.status.code().unwrap_or(success_status);
            let expected = self.expected(status, Some(response));
            builder.push(
                ScenarioCategory::Success,
                format!("{key} returns {status}"),
                &base,
                valid_auth.clone(),
                expected,
                None,
            )?;
        }

        // error
        let body_schema = operation
            .request_body
            .as_ref()
            .map(|body| &body.schema)
            .filter(|schema| !self.document.resolve_schema(schema).is_null());
        let invalid_status =
            self.options.error_status_fallback.iter().copied().find(|code| operation.declares_status(*code));
        let invalid_inputs = body_schema.map(|schema| {
            let mut inputs = base.clone();
            inputs.body = Some(RequestPayload::Json(self.synth.invalid(schema)));
            inputs
        });
        for response in operation.error_responses() {
            let Some(status) = response.status.code() else {
                continue;
            };
            let expected = self.expected(status, Some(response));
            match &invalid_inputs {
                Some(inputs) if invalid_status == Some(status) => builder.push(
                    ScenarioCategory::Error,
                    format!("{key} rejects an invalid payload with {status}"),
                    inputs,
                    valid_auth.clone(),
                    expected,
                    None,
                )?,
                _ => builder.push(
                    ScenarioCategory::Error,
                    format!("{key} returns {status}"),
                    &base,
                    valid_auth.clone(),
                    expected,
                    None,
                )?,
            }
        }
        if let Some(inputs) = &invalid_inputs
            && invalid_status.is_none()
        {
            builder.push(
                ScenarioCategory::Error,
                format!("{key} rejects an invalid payload with {fallback}"),
                inputs,
                valid_auth.clone(),
                self.expected(fallback, None),
                None,
            )?;
        }

        // edge
        let rejection_status = operation
            .error_responses()
            .iter()
            .filter_map(|response| response.status.code())
            .find(|code| (400 .. 500).contains(code))
            .unwrap_or(fallback);
        let success_response = successes.first().copied();
        for field in self.edge_fields(operation) {
            let label = field.target.label();
            for boundary in self.synth.boundaries(field.schema) {
                let at = with_value(&base, &field.target, boundary.at.clone());
                builder.push(
                    ScenarioCategory::Edge,
                    format!("{key} accepts {label} at {}", boundary.constraint),
                    &at,
                    valid_auth.clone(),
                    self.expected(success_status, success_response),
                    None,
                )?;
                let past = with_value(&base, &field.target, boundary.past.clone());
                let rejection = operation
                    .error_responses()
                    .into_iter()
                    .find(|response| response.status.code() == Some(rejection_status));
                builder.push(
                    ScenarioCategory::Edge,
                    format!("{key} rejects {label} past {}", boundary.constraint),
                    &past,
                    valid_auth.clone(),
                    self.expected(rejection_status, rejection),
                    None,
                )?;
            }
        }

        // security
        if let Some(credential) = credential {
            builder.push(
                ScenarioCategory::Security,
                format!("{key} rejects missing credentials"),
                &base,
                AuthMode::Missing(credential.clone()),
                self.expected(UNAUTHORIZED_STATUS, None),
                None,
            )?;
            builder.push(
                ScenarioCategory::Security,
                format!("{key} rejects malformed credentials"),
                &base,
                AuthMode::Malformed(credential),
                self.expected(UNAUTHORIZED_STATUS, None),
                None,
            )?;
        }

        // performance
        if self.options.include_performance {
            let threshold = self.options.performance_threshold_ms;
            builder.push(
                ScenarioCategory::Performance,
                format!("{key} responds within {threshold} ms"),
                &base,
                valid_auth,
                self.expected(success_status, None),
                Some(threshold),
            )?;
        }

        let scenarios = builder.scenarios;
        Ok(ScenarioPlan {
            operation_index: operation.index,
            operation_key: key,
            operation_ident: ident,
            group: group_name(operation, self.options.grouping),
            scenarios,
            rules,
            requirements,
        })
    }

    /// Builds the expected response for a status.
    fn expected(&self, status: u16, response: Option<&ResponseSpec>) -> ExpectedResponse {
        let schema = response.and_then(|response| response.schema.as_ref());
        let json = schema.is_some()
            && response
                .and_then(|response| response.content_type.as_deref())
                .is_some_and(|media| media.contains("json"));
        let resolved = schema.map(|schema| self.document.resolve_schema(schema));
        ExpectedResponse {
            status,
            schema_ref: schema.and_then(ContractDocument::schema_ref_name).map(str::to_string),
            required_fields: if json {
                resolved.map(|schema| required_names(schema).into_iter().map(str::to_string).collect()).unwrap_or_default()
            } else {
                Vec::new()
            },
            example_body: if json { schema.map(|schema| self.synth.valid(schema)) } else { None },
            json,
        }
    }

    /// Synthesizes the valid inputs shared by most scenarios.
    fn base_inputs(&self, operation: &Operation, names: &[&str]) -> Inputs {
        let include_optional = self.options.synthesis_mode == SynthesisMode::Maximal;
        let path_values = names
            .iter()
            .map(|name| {
                let value = operation
                    .parameters_in(ParameterLocation::Path)
                    .find(|parameter| parameter.name == *name)
                    .map_or_else(|| Value::from(1), |parameter| self.parameter_value(parameter));
                ((*name).to_string(), value)
            })
            .collect();
        let collect = |location: ParameterLocation| -> Vec<(String, Value)> {
            operation
                .parameters_in(location)
                .filter(|parameter| parameter.required || include_optional)
                .filter(|parameter| {
                    location != ParameterLocation::Header
                        || !RESERVED_HEADERS.contains(&parameter.name.to_ascii_lowercase().as_str())
                })
                .map(|parameter| (parameter.name.clone(), self.parameter_value(parameter)))
                .collect()
        };
        let form = collect(ParameterLocation::Form);
        let body = match &operation.request_body {
            Some(body) if !self.document.resolve_schema(&body.schema).is_null() => {
                Some(RequestPayload::Json(self.synth.valid(&body.schema)))
            }
            Some(body) if body.required => Some(RequestPayload::Json(Value::Object(Map::new()))),
            _ if !form.is_empty() => Some(RequestPayload::Form(form)),
            _ => None,
        };
        Inputs {
            path_values,
            query: collect(ParameterLocation::Query),
            headers: collect(ParameterLocation::Header),
            cookies: collect(ParameterLocation::Cookie),
            body,
        }
    }

    /// Returns a scalar value for a parameter.
    fn parameter_value(&self, parameter: &Parameter) -> Value {
        if self.options.include_examples
            && let Some(example) = &parameter.example
        {
            return example.clone();
        }
        match self.synth.valid(&parameter.schema) {
            scalar @ (Value::String(_) | Value::Number(_) | Value::Bool(_)) => scalar,
            _ => Value::from(1),
        }
    }

    /// Resolves the credential placement of the effective security requirement.
    fn credential(&self, operation: &Operation) -> Option<Credential> {
        self.document
            .effective_security(operation)
            .iter()
            .flat_map(|requirement| requirement.schemes.iter())
            .find_map(|(name, _)| {
                let scheme = self.document.security_scheme(name)?;
                match &scheme.kind {
                    SecuritySchemeKind::Bearer | SecuritySchemeKind::OAuth2 | SecuritySchemeKind::OpenIdConnect => {
                        Some(Credential::Bearer)
                    }
                    SecuritySchemeKind::Basic => Some(Credential::Basic),
                    SecuritySchemeKind::ApiKey {
                        name,
                        location,
                    } => Some(Credential::ApiKey {
                        name: name.clone().unwrap_or_else(|| self.options.api_key_header.clone()),
                        location: *location,
                    }),
                    SecuritySchemeKind::Other {
                        ..
                    } => None,
                }
            })
    }

    /// Collects parameters and body properties with boundary constraints.
    fn edge_fields<'o>(&self, operation: &'o Operation) -> Vec<EdgeField<'o>>
    where
        'a: 'o,
    {
        let document: &'o ContractDocument = self.document;
        let mut fields = Vec::new();
        for parameter in &operation.parameters {
            if parameter.location == ParameterLocation::Form {
                continue;
            }
            let schema = document.resolve_schema(&parameter.schema);
            if !self.synth.boundaries(schema).is_empty() {
                fields.push(EdgeField {
                    target: EdgeTarget::Parameter(parameter.location, parameter.name.clone()),
                    schema,
                });
            }
        }
        if let Some(body) = &operation.request_body {
            self.body_edge_fields(&body.schema, &mut Vec::new(), 0, &mut fields);
        }
        fields
    }

    /// Walks body properties recursively.
    fn body_edge_fields<'o>(
        &self,
        schema: &'o Value,
        prefix: &mut Vec<String>,
        depth: usize,
        out: &mut Vec<EdgeField<'o>>,
    ) where
        'a: 'o,
    {
        let document: &'o ContractDocument = self.document;
        if depth > MAX_EDGE_DEPTH {
            return;
        }
        let resolved = document.resolve_schema(schema);
        let Some(properties) = resolved.get("properties").and_then(Value::as_object) else {
            return;
        };
        for (name, property) in properties {
            prefix.push(name.clone());
            let property = document.resolve_schema(property);
            if schema_type(property) == Some("object") {
                self.body_edge_fields(property, prefix, depth + 1, out);
            } else if !self.synth.boundaries(property).is_empty() {
                out.push(EdgeField {
                    target: EdgeTarget::Body(prefix.clone()),
                    schema: property,
                });
            }
            prefix.pop();
        }
    }

    /// Derives validation rules from parameters and the request body.
    fn rules(&self, operation: &Operation) -> Vec<ValidationRule> {
        let mut rules = Vec::new();
        for parameter in &operation.parameters {
            let field = format!("{}.{}", parameter.location.as_str(), parameter.name);
            if parameter.required {
                rules.push(ValidationRule {
                    field: field.clone(),
                    kind: RuleKind::Required,
                    constraint: Value::Bool(true),
                    message: format!("{field} is required"),
                });
            }
            schema_rules(&field, self.document.resolve_schema(&parameter.schema), &mut rules);
        }
        if let Some(body) = &operation.request_body {
            let resolved = self.document.resolve_schema(&body.schema);
            if body.required {
                rules.push(ValidationRule {
                    field: "body".to_string(),
                    kind: RuleKind::Required,
                    constraint: Value::Bool(true),
                    message: "request body is required".to_string(),
                });
            }
            let required = required_names(resolved);
            if let Some(properties) = resolved.get("properties").and_then(Value::as_object) {
                for (name, property) in properties {
                    let field = format!("body.{name}");
                    if required.contains(&name.as_str()) {
                        rules.push(ValidationRule {
                            field: field.clone(),
                            kind: RuleKind::Required,
                            constraint: Value::Bool(true),
                            message: format!("{field} is required"),
                        });
                    }
                    schema_rules(&field, self.document.resolve_schema(property), &mut rules);
                }
            }
        }
        rules
    }

    /// Derives data requirements from parameters and the request body.
    fn requirements(&self, operation: &Operation) -> Vec<DataRequirement> {
        let mut requirements: Vec<DataRequirement> = operation
            .parameters
            .iter()
            .map(|parameter| {
                let resolved = self.document.resolve_schema(&parameter.schema);
                let mut examples = Vec::new();
                if let Some(example) = &parameter.example {
                    examples.push(example.clone());
                }
                let synthesized = self.parameter_value(parameter);
                if !examples.contains(&synthesized) {
                    examples.push(synthesized);
                }
                DataRequirement {
                    name: parameter.name.clone(),
                    location: parameter.location.as_str().to_string(),
                    value_type: schema_type(resolved).map(str::to_string),
                    constraints: constraint_keywords(resolved),
                    examples,
                }
            })
            .collect();
        if let Some(body) = &operation.request_body {
            let resolved = self.document.resolve_schema(&body.schema);
            requirements.push(DataRequirement {
                name: "body".to_string(),
                location: "body".to_string(),
                value_type: schema_type(resolved).map(str::to_string),
                constraints: constraint_keywords(resolved),
                examples: vec![self.synth.valid(&body.schema)],
            });
        }
        requirements
    }
}

/// Accumulates numbered scenarios for one plan.
struct PlanBuilder<'p> {
    /// Operation being planned.
    operation: &'p Operation,
    /// Identifier stem.
    ident: &'p str,
    /// Per-category counters.
    counters: [usize; 5],
    /// Scenarios so far.
    scenarios: Vec<TestScenario>,
    /// Shared rules.
    rules: Arc<[ValidationRule]>,
    /// Shared requirements.
    requirements: Arc<[DataRequirement]>,
}

impl PlanBuilder<'_> {
    /// Appends a scenario.
    fn push(
        &mut self,
        category: ScenarioCategory,
        name: String,
        inputs: &Inputs,
        auth: AuthMode,
        expected: ExpectedResponse,
        latency_ms: Option<u64>,
    ) -> Result<(), GenerationError> {
        let counter = &mut self.counters[category.slot()];
        *counter += 1;
        let id = format!("{}_{}_{}", self.ident, category.as_str(), counter);
        let request = RequestTemplate {
            method: self.operation.method,
            path: render_path(&self.operation.path, &inputs.path_values)?,
            query: inputs.query.clone(),
            headers: inputs.headers.clone(),
            cookies: inputs.cookies.clone(),
            body: inputs.body.clone(),
            auth,
        };
        let mut assertions = vec![Assertion::Status(expected.status)];
        if expected.json {
            assertions.push(Assertion::JsonBody);
            assertions.extend(expected.required_fields.iter().cloned().map(Assertion::RequiredField));
        }
        if let Some(threshold) = latency_ms {
            assertions.push(Assertion::MaxLatencyMs(threshold));
        }
        self.scenarios.push(TestScenario {
            id,
            name,
            category,
            priority: category.priority(),
            request,
            expected,
            assertions,
            rules: Arc::clone(&self.rules),
            requirements: Arc::clone(&self.requirements),
        });
        Ok(())
    }
}

// ============================================================================
// SECTION: Grouping and Ordering
// ============================================================================

/// Returns the file group of an operation.
#[must_use]
pub fn group_name(operation: &Operation, strategy: GroupingStrategy) -> String {
    let segment = operation.path.split('/').find(|segment| !segment.is_empty() && !segment.starts_with('{'));
    let raw = match strategy {
        GroupingStrategy::Tag => operation.tags.first().map(String::as_str).or(segment),
        GroupingStrategy::PathSegment => segment,
    };
    let name = raw.map(snake_case).unwrap_or_default();
    if name.is_empty() { ROOT_GROUP.to_string() } else { name }
}

/// Returns the identifier stem of an operation.
#[must_use]
pub fn operation_ident(operation: &Operation) -> String {
    let raw = operation
        .operation_id
        .clone()
        .unwrap_or_else(|| format!("{} {}", operation.method.as_str(), operation.path));
    let ident = snake_case(&raw);
    if ident.is_empty() { format!("operation_{}", operation.index) } else { ident }
}

/// Converts arbitrary text into a lowercase snake-case identifier.
#[must_use]
pub fn snake_case(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    let mut previous_lower = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if ch.is_ascii_uppercase() && previous_lower && !out.ends_with('_') {
                out.push('_');
            }
            previous_lower = ch.is_ascii_lowercase() || ch.is_ascii_digit();
            out.push(ch.to_ascii_lowercase());
        } else {
            previous_lower = false;
            if !out.is_empty() && !out.ends_with('_') {
                out.push('_');
            }
        }
    }
    while out.ends_with('_') {
        out.pop();
    }
    if out.starts_with(|ch: char| ch.is_ascii_digit()) {
        out.insert_str(0, "n_");
    }
    out
}

/// Returns provider-to-consumer edges of the dependency heuristic.
///
/// An edge `(p, c)` means a success response of `p` exposes a field named
/// like a path parameter of `c`.
#[must_use]
pub fn dependencies(document: &ContractDocument) -> Vec<(usize, usize)> {
    let provided: Vec<BTreeSet<&str>> =
        document.operations.iter().map(|operation| provided_fields(document, operation)).collect();
    let mut edges = Vec::new();
    for (consumer, operation) in document.operations.iter().enumerate() {
        let consumed = template_parameters(&operation.path).unwrap_or_default();
        if consumed.is_empty() {
            continue;
        }
        for (provider, fields) in provided.iter().enumerate() {
            if provider != consumer && consumed.iter().any(|name| fields.contains(name)) {
                edges.push((provider, consumer));
            }
        }
    }
    edges
}

/// Orders operations so providers precede consumers.
///
/// Ties keep declaration order; operations on a cycle keep declaration order
/// after every acyclic operation.
#[must_use]
pub fn dependency_order(document: &ContractDocument) -> Vec<usize> {
    let count = document.operations.len();
    let mut indegree = vec![0_usize; count];
    let mut outgoing: Vec<Vec<usize>> = vec![Vec::new(); count];
    for (provider, consumer) in dependencies(document) {
        outgoing[provider].push(consumer);
        indegree[consumer] += 1;
    }
    let mut ready: BinaryHeap<Reverse<usize>> =
        (0 .. count).filter(|index| indegree[*index] == 0).map(Reverse).collect();
    let mut order = Vec::with_capacity(count);
    let mut placed = vec![false; count];
    while let Some(Reverse(index)) = ready.pop() {
        order.push(index);
        placed[index] = true;
        for &next in &outgoing[index] {
            indegree[next] -= 1;
            if indegree[next] == 0 {
                ready.push(Reverse(next));
            }
        }
    }
    order.extend((0 .. count).filter(|index| !placed[*index]));
    order
}

/// Field names exposed by an operation's success responses.
fn provided_fields<'d>(document: &'d ContractDocument, operation: &'d Operation) -> BTreeSet<&'d str> {
    let mut fields = BTreeSet::new();
    for response in operation.success_responses() {
        let Some(schema) = &response.schema else {
            continue;
        };
        let mut resolved = document.resolve_schema(schema);
        if schema_type(resolved) == Some("array")
            && let Some(items) = resolved.get("items")
        {
            resolved = document.resolve_schema(items);
        }
        if let Some(properties) = resolved.get("properties").and_then(Value::as_object) {
            fields.extend(properties.keys().map(String::as_str));
        }
    }
    fields
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Renders a JSON value as request text.
#[must_use]
pub fn value_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

/// Substitutes template parameters and percent-encodes each segment.
fn render_path(template: &str, values: &[(String, Value)]) -> Result<String, GenerationError> {
    let trimmed = template.strip_prefix('/').unwrap_or(template);
    if trimmed.is_empty() {
        return Ok("/".to_string());
    }
    let mut url = Url::parse(PATH_BASE).map_err(|err| GenerationError::Generation(err.to_string()))?;
    {
        let mut segments = url
            .path_segments_mut()
            .map_err(|()| GenerationError::Generation("path base cannot hold segments".to_string()))?;
        segments.clear();
        for segment in trimmed.split('/') {
            let mut rendered = String::with_capacity(segment.len());
            let mut rest = segment;
            while let Some(open) = rest.find('{') {
                rendered.push_str(&rest[.. open]);
                let after = &rest[open + 1 ..];
                let close = after.find('}').ok_or_else(|| {
                    GenerationError::Generation(format!("unbalanced template in {template}"))
                })?;
                let name = &after[.. close];
                let value = values
                    .iter()
                    .find(|(candidate, _)| candidate == name)
                    .map_or_else(|| "1".to_string(), |(_, value)| value_text(value));
                rendered.push_str(&value);
                rest = &after[close + 1 ..];
            }
            rendered.push_str(rest);
            segments.push(&rendered);
        }
    }
    Ok(url.path().to_string())
}

/// Returns a copy of the inputs with one field replaced.
fn with_value(base: &Inputs, target: &EdgeTarget, value: Value) -> Inputs {
    let mut inputs = base.clone();
    match target {
        EdgeTarget::Parameter(location, name) => match location {
            ParameterLocation::Path => upsert(&mut inputs.path_values, name, value),
            ParameterLocation::Query => upsert(&mut inputs.query, name, value),
            ParameterLocation::Header => upsert(&mut inputs.headers, name, value),
            ParameterLocation::Cookie => upsert(&mut inputs.cookies, name, value),
            ParameterLocation::Form => {
                let mut fields = match inputs.body.take() {
                    Some(RequestPayload::Form(fields)) => fields,
                    _ => Vec::new(),
                };
                upsert(&mut fields, name, value);
                inputs.body = Some(RequestPayload::Form(fields));
            }
        },
        EdgeTarget::Body(path) => {
            if !matches!(inputs.body, Some(RequestPayload::Json(_))) {
                inputs.body = Some(RequestPayload::Json(Value::Object(Map::new())));
            }
            if let Some(RequestPayload::Json(body)) = &mut inputs.body {
                insert_at(body, path, value);
            }
        }
    }
    inputs
}

/// Replaces a named value or appends it.
fn upsert(list: &mut Vec<(String, Value)>, name: &str, value: Value) {
    match list.iter_mut().find(|(candidate, _)| candidate == name) {
        Some(entry) => entry.1 = value,
        None => list.push((name.to_string(), value)),
    }
}

/// Writes a value at a nested object path, creating objects on the way.
fn insert_at(target: &mut Value, path: &[String], value: Value) {
    let Some((head, rest)) = path.split_first() else {
        *target = value;
        return;
    };
    if !target.is_object() {
        *target = Value::Object(Map::new());
    }
    if let Value::Object(map) = target {
        insert_at(map.entry(head.clone()).or_insert(Value::Null), rest, value);
    }
}

/// Appends rules derived from a schema's constraint keywords.
fn schema_rules(field: &str, schema: &Value, rules: &mut Vec<ValidationRule>) {
    if let Some(kind) = schema_type(schema) {
        rules.push(ValidationRule {
            field: field.to_string(),
            kind: RuleKind::Type,
            constraint: Value::from(kind),
            message: format!("{field} must be of type {kind}"),
        });
    }
    if let Some(format) = schema.get("format").and_then(Value::as_str) {
        rules.push(ValidationRule {
            field: field.to_string(),
            kind: RuleKind::Format,
            constraint: Value::from(format),
            message: format!("{field} must be formatted as {format}"),
        });
    }
    let mut range = Map::new();
    for keyword in ["minimum", "maximum", "minLength", "maxLength"] {
        if let Some(value) = schema.get(keyword) {
            range.insert(keyword.to_string(), value.clone());
        }
    }
    if !range.is_empty() {
        rules.push(ValidationRule {
            field: field.to_string(),
            kind: RuleKind::Range,
            constraint: Value::Object(range),
            message: format!("{field} must stay within its declared bounds"),
        });
    }
    if let Some(pattern) = schema.get("pattern").and_then(Value::as_str) {
        rules.push(ValidationRule {
            field: field.to_string(),
            kind: RuleKind::Pattern,
            constraint: Value::from(pattern),
            message: format!("{field} must match {pattern}"),
        });
    }
    if let Some(values) = schema.get("enum").filter(|values| values.is_array()) {
        rules.push(ValidationRule {
            field: field.to_string(),
            kind: RuleKind::Enum,
            constraint: values.clone(),
            message: format!("{field} must be one of the declared values"),
        });
    }
}

/// Copies constraint keywords of a schema.
fn constraint_keywords(schema: &Value) -> Map<String, Value> {
    let mut out = Map::new();
    for keyword in ["minimum", "maximum", "minLength", "maxLength", "pattern", "enum", "format", "required"] {
        if let Some(value) = schema.get(keyword) {
            out.insert(keyword.to_string(), value.clone());
        }
    }
    out
}

#[cfg(test)]
mod tests;
