// crates/suitegen-codegen/src/lower.rs
// ============================================================================
// Module: Scenario Lowering
// Description: Neutral statement lists shared by every emission strategy.
// Purpose: Make tree and template output differ only in rendering.
// Dependencies: suitegen-core, suitegen-contract, suitegen-config
// ============================================================================

//! ## Overview
//! A [`ScenarioPlan`] is lowered into [`LoweredOperation`]: mock constants and
//! one [`TestFunction`] per scenario, each a flat list of [`Statement`]s. The
//! lowering decides every literal value; emitters only print.
//!
//! # Invariants
//! - Function and constant names are valid, non-keyword Rust identifiers.
//! - Statement order mirrors request construction, dispatch, then assertions.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use suitegen_config::GenerationOptions;
use suitegen_contract::ApiKeyLocation;
use suitegen_contract::HttpMethod;
use suitegen_core::Assertion;
use suitegen_core::AuthMode;
use suitegen_core::Credential;
use suitegen_core::GenerationError;
use suitegen_core::RequestPayload;
use suitegen_core::ScenarioCategory;
use suitegen_core::ScenarioPlan;
use suitegen_core::TestScenario;
use suitegen_core::planner::snake_case;
use suitegen_core::value_text;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Environment variable overriding the embedded base URL.
pub const BASE_URL_ENV_VAR: &str = "SUITEGEN_BASE_URL";
/// Authorization value sent by malformed bearer scenarios.
const MALFORMED_BEARER: &str = "Bearer not.a.valid-token";
/// Authorization value sent by malformed basic scenarios.
const MALFORMED_BASIC: &str = "Basic !!not-base64!!";
/// Key sent by malformed API key scenarios.
const MALFORMED_API_KEY: &str = "invalid-api-key";
/// Panic message when a request cannot be sent.
pub const SEND_FAILURE: &str = "request is sent";
/// Panic message when an embedded request body is not JSON.
pub const PAYLOAD_FAILURE: &str = "request body is valid JSON";
/// Panic message when a response body is not JSON.
pub const BODY_FAILURE: &str = "response body is JSON";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Rendering switches taken from generation options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderSettings {
    /// Emit `#[tokio::test] async fn` with the async client.
    pub async_mode: bool,
    /// Emit mock constants for success scenarios.
    pub generate_mocks: bool,
}

impl RenderSettings {
    /// Extracts settings from generation options.
    #[must_use]
    pub const fn from_options(options: &GenerationOptions) -> Self {
        Self {
            async_mode: options.async_mode,
            generate_mocks: options.generate_mocks,
        }
    }
}

/// Expression producing a string value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValueExpr {
    /// String literal.
    Literal(String),
    /// `auth_token()` with an optional literal prefix.
    Token {
        /// Literal text before the token.
        prefix: String,
    },
}

/// One statement of a generated test body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Statement {
    /// `let client = ...Client::new();`
    Client,
    /// `let url = format!("{}{}", base_url(), path);`
    Url {
        /// Rendered request path.
        path: String,
    },
    /// `let [mut] request = client.request(Method, &url);`
    Request {
        /// HTTP method.
        method: HttpMethod,
        /// True when later statements modify the request.
        mutable: bool,
    },
    /// `request = request.query(&[(name, value)]);`
    Query {
        /// Parameter name.
        name: String,
        /// Parameter value.
        value: ValueExpr,
    },
    /// `request = request.header(name, value);`
    Header {
        /// Header name.
        name: String,
        /// Header value.
        value: ValueExpr,
    },
    /// Parses a JSON literal and attaches it with `request.json`.
    JsonBody {
        /// Compact JSON text.
        json: String,
    },
    /// `request = request.form(&[...]);`
    FormBody {
        /// Field pairs.
        fields: Vec<(String, String)>,
    },
    /// `let started = std::time::Instant::now();`
    StartTimer,
    /// `let response = request.send()...;`
    Send,
    /// `assert_eq!(response.status().as_u16(), status);`
    AssertStatus(u16),
    /// `let body: serde_json::Value = response.json()...;`
    ParseJson {
        /// True when later statements read the body.
        used: bool,
    },
    /// `assert!(body.get(field).is_some(), ...);`
    AssertField(String),
    /// `assert!(started.elapsed() <= Duration::from_millis(ms));`
    AssertElapsed(u64),
}

/// One generated test function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestFunction {
    /// Function name.
    pub name: String,
    /// Doc line.
    pub doc: String,
    /// Body statements.
    pub statements: Vec<Statement>,
}

/// Mock response constant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConst {
    /// Constant name.
    pub name: String,
    /// Compact JSON body.
    pub json: String,
}

/// Lowered items of one operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoweredOperation {
    /// Mock constants.
    pub mocks: Vec<MockConst>,
    /// Test functions in scenario order.
    pub tests: Vec<TestFunction>,
}

// ============================================================================
// SECTION: Lowering
// ============================================================================

/// Lowers a plan into mock constants and test functions.
///
/// # Errors
///
/// Returns [`GenerationError::Generation`] when a scenario id is not a valid
/// identifier.
pub fn lower_plan(plan: &ScenarioPlan, settings: RenderSettings) -> Result<LoweredOperation, GenerationError> {
    let mut lowered = LoweredOperation::default();
    for scenario in &plan.scenarios {
        let name = crate::verify::checked_ident(&scenario.id)?.to_string();
        if settings.generate_mocks
            && scenario.category == ScenarioCategory::Success
            && let Some(body) = &scenario.expected.example_body
        {
            lowered.mocks.push(MockConst {
                name: format!("{}_MOCK", name.to_ascii_uppercase()),
                json: body.to_string(),
            });
        }
        lowered.tests.push(TestFunction {
            name,
            doc: format!(" {}", scenario.name.replace(['\r', '\n'], " ")),
            statements: lower_scenario(scenario),
        });
    }
    Ok(lowered)
}

/// Lowers one scenario into statements.
fn lower_scenario(scenario: &TestScenario) -> Vec<Statement> {
    let request = &scenario.request;
    let mut setup = Vec::new();
    for (name, value) in &request.query {
        setup.push(Statement::Query {
            name: name.clone(),
            value: ValueExpr::Literal(value_text(value)),
        });
    }
    for (name, value) in &request.headers {
        setup.push(Statement::Header {
            name: name.clone(),
            value: ValueExpr::Literal(value_text(value)),
        });
    }
    let mut cookie_parts: Vec<String> =
        request.cookies.iter().map(|(name, value)| format!("{name}={}", value_text(value))).collect();
    let mut cookie_token: Option<String> = None;
    match &request.auth {
        AuthMode::None
        | AuthMode::Missing(_) => {}
        AuthMode::Valid(credential) => match credential {
            Credential::Bearer => setup.push(authorization(ValueExpr::Token {
                prefix: "Bearer ".to_string(),
            })),
            Credential::Basic => setup.push(authorization(ValueExpr::Token {
                prefix: "Basic ".to_string(),
            })),
            Credential::ApiKey {
                name,
                location,
            } => match location {
                ApiKeyLocation::Header => setup.push(Statement::Header {
                    name: name.clone(),
                    value: ValueExpr::Token {
                        prefix: String::new(),
                    },
                }),
                ApiKeyLocation::Query => setup.push(Statement::Query {
                    name: name.clone(),
                    value: ValueExpr::Token {
                        prefix: String::new(),
                    },
                }),
                ApiKeyLocation::Cookie => cookie_token = Some(name.clone()),
            },
        },
        AuthMode::Malformed(credential) => match credential {
            Credential::Bearer => setup.push(authorization(ValueExpr::Literal(MALFORMED_BEARER.to_string()))),
            Credential::Basic => setup.push(authorization(ValueExpr::Literal(MALFORMED_BASIC.to_string()))),
            Credential::ApiKey {
                name,
                location,
            } => match location {
                ApiKeyLocation::Header => setup.push(Statement::Header {
                    name: name.clone(),
                    value: ValueExpr::Literal(MALFORMED_API_KEY.to_string()),
                }),
                ApiKeyLocation::Query => setup.push(Statement::Query {
                    name: name.clone(),
                    value: ValueExpr::Literal(MALFORMED_API_KEY.to_string()),
                }),
                ApiKeyLocation::Cookie => cookie_parts.push(format!("{name}={MALFORMED_API_KEY}")),
            },
        },
    }
    match cookie_token {
        Some(name) => {
            let mut prefix = cookie_parts.join("; ");
            if !prefix.is_empty() {
                prefix.push_str("; ");
            }
            prefix.push_str(&name);
            prefix.push('=');
            setup.push(Statement::Header {
                name: "Cookie".to_string(),
                value: ValueExpr::Token {
                    prefix,
                },
            });
        }
        None if !cookie_parts.is_empty() => setup.push(Statement::Header {
            name: "Cookie".to_string(),
            value: ValueExpr::Literal(cookie_parts.join("; ")),
        }),
        None => {}
    }
    match &request.body {
        Some(RequestPayload::Json(body)) => setup.push(Statement::JsonBody {
            json: body.to_string(),
        }),
        Some(RequestPayload::Form(fields)) if !fields.is_empty() => setup.push(Statement::FormBody {
            fields: fields.iter().map(|(name, value)| (name.clone(), value_text(value))).collect(),
        }),
        Some(RequestPayload::Form(_)) | None => {}
    }

    let mut statements = vec![
        Statement::Client,
        Statement::Url {
            path: request.path.clone(),
        },
        Statement::Request {
            method: request.method,
            mutable: !setup.is_empty(),
        },
    ];
    statements.extend(setup);
    let timed = scenario.assertions.iter().any(|assertion| matches!(assertion, Assertion::MaxLatencyMs(_)));
    if timed {
        statements.push(Statement::StartTimer);
    }
    statements.push(Statement::Send);
    let reads_body = scenario.assertions.iter().any(|assertion| matches!(assertion, Assertion::RequiredField(_)));
    for assertion in &scenario.assertions {
        statements.push(match assertion {
            Assertion::Status(status) => Statement::AssertStatus(*status),
            Assertion::JsonBody => Statement::ParseJson {
                used: reads_body,
            },
            Assertion::RequiredField(field) => Statement::AssertField(field.clone()),
            Assertion::MaxLatencyMs(threshold) => Statement::AssertElapsed(*threshold),
        });
    }
    statements
}

/// Builds an `Authorization` header statement.
fn authorization(value: ValueExpr) -> Statement {
    Statement::Header {
        name: "Authorization".to_string(),
        value,
    }
}

/// Returns the inner doc lines of a generated file.
#[must_use]
pub fn file_doc_lines(group: &str) -> [String; 2] {
    [format!(" Generated tests for the `{group}` group."), " @generated by suitegen; edits are overwritten.".to_string()]
}

/// Returns the assertion message of a missing response field.
#[must_use]
pub fn missing_field_message(field: &str) -> String {
    format!("response is missing field {field}")
}

/// Returns the assertion message of a slow response.
#[must_use]
pub fn latency_message(threshold_ms: u64) -> String {
    format!("response exceeded {threshold_ms} ms")
}

/// Returns `(constant name, JSON)` pairs for embedded component schemas.
///
/// Names are unique; a collision or an empty stem falls back to the position.
#[must_use]
pub fn schema_constants(schemas: &[(String, String)]) -> Vec<(String, &str)> {
    let mut seen = BTreeSet::new();
    schemas
        .iter()
        .enumerate()
        .map(|(position, (name, json))| {
            let stem = snake_case(name).to_ascii_uppercase();
            let constant = if stem.is_empty() || seen.contains(&stem) { format!("SCHEMA_{position}") } else { stem };
            seen.insert(constant.clone());
            (constant, json.as_str())
        })
        .collect()
}

#[cfg(test)]
mod tests;
