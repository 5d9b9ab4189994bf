// crates/suitegen-codegen/src/lower/tests.rs
// ============================================================================
// Module: Scenario Lowering Unit Tests
// Description: Statement sequences for credentials, bodies, and assertions.
// Purpose: Pin the shared lowering both emitters render.
// Dependencies: suitegen-codegen, suitegen-core, serde_json
// ============================================================================

//! ## Overview
//! Lowers plans of small contracts and checks the resulting statements.

// ============================================================================
// SECTION: Lint Configuration
// ============================================================================

#![allow(
    clippy::panic,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::missing_docs_in_private_items,
    reason = "Test-only assertions and helpers are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Value;
use serde_json::json;
use suitegen_config::GenerationOptions;
use suitegen_contract::ContractDocument;
use suitegen_contract::FormatHint;
use suitegen_contract::HttpMethod;
use suitegen_contract::parse;
use suitegen_core::ScenarioPlan;
use suitegen_core::ScenarioPlanner;

use super::LoweredOperation;
use super::RenderSettings;
use super::Statement;
use super::TestFunction;
use super::ValueExpr;
use super::lower_plan;
use super::schema_constants;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn document(security: &Value) -> ContractDocument {
    let contract = json!({
        "openapi": "3.0.0",
        "info": {"title": "Pets", "version": "1"},
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {"id": {"type": "integer"}, "name": {"type": "string"}}
                }
            },
            "securitySchemes": {"auth": security}
        },
        "security": [{"auth": []}],
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}}}}}
                },
                "post": {
                    "operationId": "createPet",
                    "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}},
                    "responses": {"201": {"description": "created", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}}}
                }
            }
        }
    });
    parse(contract.to_string().as_bytes(), FormatHint::Json).expect("fixture parses")
}

fn bearer() -> ContractDocument {
    document(&json!({"type": "http", "scheme": "bearer"}))
}

fn plan(document: &ContractDocument, options: &GenerationOptions, index: usize) -> ScenarioPlan {
    ScenarioPlanner::new(document, options).plan(&document.operations[index]).expect("plan")
}

fn lower_operation(document: &ContractDocument, options: &GenerationOptions, index: usize) -> LoweredOperation {
    lower_plan(&plan(document, options, index), RenderSettings::from_options(options)).expect("lowering")
}

fn find_test<'a>(lowered: &'a LoweredOperation, name: &str) -> &'a TestFunction {
    lowered.tests.iter().find(|test| test.name == name).expect("test present")
}

fn token(prefix: &str) -> ValueExpr {
    ValueExpr::Token {
        prefix: prefix.to_string(),
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn success_with_body_and_credentials_lowers_in_request_order() {
    let document = bearer();
    let lowered = lower_operation(&document, &GenerationOptions::default(), 1);
    let success = find_test(&lowered, "create_pet_success_1");
    assert_eq!(success.statements[.. 3], [
        Statement::Client,
        Statement::Url {
            path: "/pets".to_string(),
        },
        Statement::Request {
            method: HttpMethod::Post,
            mutable: true,
        },
    ]);
    assert_eq!(success.statements[3], Statement::Header {
        name: "Authorization".to_string(),
        value: token("Bearer "),
    });
    assert!(matches!(&success.statements[4], Statement::JsonBody { json } if json.contains("\"id\"")));
    assert_eq!(success.statements[5 ..], [
        Statement::Send,
        Statement::AssertStatus(201),
        Statement::ParseJson {
            used: true,
        },
        Statement::AssertField("id".to_string()),
        Statement::AssertField("name".to_string()),
    ]);
}

#[test]
fn body_binding_is_unused_without_required_fields() {
    let document = bearer();
    let lowered = lower_operation(&document, &GenerationOptions::default(), 0);
    let success = find_test(&lowered, "list_pets_success_1");
    assert!(success.statements.contains(&Statement::ParseJson {
        used: false
    }));
    assert!(!success.statements.iter().any(|statement| matches!(statement, Statement::AssertField(_))));
}

#[test]
fn security_variants_omit_or_break_the_credential() {
    let document = bearer();
    let lowered = lower_operation(&document, &GenerationOptions::default(), 0);
    let missing = find_test(&lowered, "list_pets_security_1");
    assert!(!missing.statements.iter().any(|statement| matches!(statement, Statement::Header { .. })));
    assert!(missing.statements.contains(&Statement::Request {
        method: HttpMethod::Get,
        mutable: false,
    }));
    assert!(missing.statements.contains(&Statement::AssertStatus(401)));
    let malformed = find_test(&lowered, "list_pets_security_2");
    assert!(malformed.statements.contains(&Statement::Header {
        name: "Authorization".to_string(),
        value: ValueExpr::Literal("Bearer not.a.valid-token".to_string()),
    }));
}

#[test]
fn basic_scheme_uses_basic_prefix() {
    let document = document(&json!({"type": "http", "scheme": "basic"}));
    let lowered = lower_operation(&document, &GenerationOptions::default(), 0);
    assert!(find_test(&lowered, "list_pets_success_1").statements.contains(&Statement::Header {
        name: "Authorization".to_string(),
        value: token("Basic "),
    }));
}

#[test]
fn api_keys_follow_their_declared_location() {
    let header = document(&json!({"type": "apiKey", "in": "header", "name": "X-Key"}));
    let lowered_header = lower_operation(&header, &GenerationOptions::default(), 0);
    assert!(find_test(&lowered_header, "list_pets_success_1").statements.contains(&Statement::Header {
        name: "X-Key".to_string(),
        value: token(""),
    }));

    let query = document(&json!({"type": "apiKey", "in": "query", "name": "key"}));
    let lowered_query = lower_operation(&query, &GenerationOptions::default(), 0);
    assert!(find_test(&lowered_query, "list_pets_success_1").statements.contains(&Statement::Query {
        name: "key".to_string(),
        value: token(""),
    }));

    let cookie = document(&json!({"type": "apiKey", "in": "cookie", "name": "session"}));
    let lowered_cookie = lower_operation(&cookie, &GenerationOptions::default(), 0);
    assert!(find_test(&lowered_cookie, "list_pets_success_1").statements.contains(&Statement::Header {
        name: "Cookie".to_string(),
        value: token("session="),
    }));
    assert!(find_test(&lowered_cookie, "list_pets_security_2").statements.contains(&Statement::Header {
        name: "Cookie".to_string(),
        value: ValueExpr::Literal("session=invalid-api-key".to_string()),
    }));
}

#[test]
fn mocks_are_emitted_only_when_enabled() {
    let document = bearer();
    let mut options = GenerationOptions::default();
    assert!(lower_operation(&document, &options, 1).mocks.is_empty());
    options.generate_mocks = true;
    let lowered = lower_operation(&document, &options, 1);
    assert_eq!(lowered.mocks.len(), 1);
    assert_eq!(lowered.mocks[0].name, "CREATE_PET_SUCCESS_1_MOCK");
    let mock: Value = serde_json::from_str(&lowered.mocks[0].json).unwrap();
    assert!(mock.get("id").is_some());
}

#[test]
fn performance_scenarios_time_the_request() {
    let document = bearer();
    let mut options = GenerationOptions::default();
    options.include_performance = true;
    let lowered = lower_operation(&document, &options, 0);
    let performance = lowered.tests.last().unwrap();
    let timer = performance.statements.iter().position(|statement| *statement == Statement::StartTimer).unwrap();
    let send = performance.statements.iter().position(|statement| *statement == Statement::Send).unwrap();
    assert_eq!(timer + 1, send);
    assert_eq!(
        performance.statements.last(),
        Some(&Statement::AssertElapsed(options.performance_threshold_ms))
    );
}

#[test]
fn test_docs_are_single_line() {
    let document = bearer();
    let lowered = lower_operation(&document, &GenerationOptions::default(), 1);
    assert!(lowered.tests.iter().all(|test| test.doc.starts_with(' ') && !test.doc.contains('\n')));
}

#[test]
fn schema_constants_are_unique() {
    let schemas = vec![
        ("Pet".to_string(), "{}".to_string()),
        ("pet".to_string(), "{}".to_string()),
        ("--".to_string(), "{}".to_string()),
        ("OrderLine".to_string(), "{\"type\":\"object\"}".to_string()),
    ];
    let names: Vec<String> = schema_constants(&schemas).into_iter().map(|(name, _)| name).collect();
    assert_eq!(names, vec!["PET", "SCHEMA_1", "SCHEMA_2", "ORDER_LINE"]);
}
