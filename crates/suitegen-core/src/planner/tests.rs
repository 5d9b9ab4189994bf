// crates/suitegen-core/src/planner/tests.rs
// ============================================================================
// Module: Scenario Planner Unit Tests
// Description: Category coverage, ordering, and request rendering.
// Purpose: Pin the scenario mapping of representative operations.
// Dependencies: suitegen-core, serde_json
// ============================================================================

//! ## Overview
//! Unit coverage for scenario planning, grouping, and dependency ordering.

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

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::Value;
use serde_json::json;
use suitegen_config::GenerationOptions;
use suitegen_config::GroupingStrategy;
use suitegen_contract::ContractDocument;
use suitegen_contract::FormatHint;
use suitegen_contract::ParameterLocation;
use suitegen_contract::parse;

use super::Assertion;
use super::AuthMode;
use super::Credential;
use super::EdgeTarget;
use super::Inputs;
use super::RequestPayload;
use super::RuleKind;
use super::ScenarioCategory;
use super::ScenarioPlanner;
use super::dependency_order;
use super::group_name;
use super::snake_case;
use super::with_value;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn document(contract: &Value) -> ContractDocument {
    parse(contract.to_string().as_bytes(), FormatHint::Json).expect("fixture parses")
}

fn with_paths(paths: Value) -> ContractDocument {
    document(&json!({
        "openapi": "3.0.0",
        "info": {"title": "T", "version": "1"},
        "paths": paths
    }))
}

fn pets() -> ContractDocument {
    document(&json!({
        "openapi": "3.0.0",
        "info": {"title": "Pets", "version": "1"},
        "components": {
            "schemas": {
                "Pet": {
                    "type": "object",
                    "required": ["id", "name"],
                    "properties": {
                        "id": {"type": "integer"},
                        "name": {"type": "string", "maxLength": 20}
                    }
                }
            },
            "securitySchemes": {"bearer": {"type": "http", "scheme": "bearer"}}
        },
        "security": [{"bearer": []}],
        "paths": {
            "/pets": {
                "get": {
                    "operationId": "listPets",
                    "tags": ["pets"],
                    "parameters": [{"name": "limit", "in": "query", "required": true, "schema": {"type": "integer", "minimum": 1, "maximum": 100}}],
                    "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"type": "array", "items": {"$ref": "#/components/schemas/Pet"}}}}}}
                },
                "post": {
                    "operationId": "createPet",
                    "tags": ["pets"],
                    "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}},
                    "responses": {
                        "201": {"description": "created", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Pet"}}}},
                        "422": {"description": "invalid"},
                        "404": {"description": "missing"}
                    }
                }
            },
            "/pets/{id}": {
                "get": {
                    "operationId": "getPet",
                    "security": [],
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "string"}, "example": "a b"}],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }
    }))
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn bare_get_yields_single_success_scenario() {
    let document = with_paths(json!({"/x": {"get": {"responses": {"200": {"description": "ok"}}}}}));
    let options = GenerationOptions::default();
    let planner = ScenarioPlanner::new(&document, &options);
    let plan = planner.plan(&document.operations[0]).unwrap();
    assert_eq!(plan.scenarios.len(), 1);
    let scenario = &plan.scenarios[0];
    assert_eq!(scenario.category, ScenarioCategory::Success);
    assert_eq!(scenario.expected.status, 200);
    assert_eq!(scenario.request.path, "/x");
    assert_eq!(scenario.id, "get_x_success_1");
    assert_eq!(scenario.request.auth, AuthMode::None);
    assert_eq!(scenario.assertions, vec![Assertion::Status(200)]);
}

#[test]
fn body_without_declared_outcomes_gets_default_success_and_fallback_error() {
    let document = with_paths(json!({
        "/items": {"post": {
            "requestBody": {"content": {"application/json": {"schema": {"type": "object", "properties": {"a": {"type": "string"}}}}}},
            "responses": {"default": {"description": "any"}}
        }}
    }));
    let options = GenerationOptions::default();
    let plan = ScenarioPlanner::new(&document, &options).plan(&document.operations[0]).unwrap();
    let success: Vec<_> =
        plan.scenarios.iter().filter(|scenario| scenario.category == ScenarioCategory::Success).collect();
    let errors: Vec<_> = plan.scenarios.iter().filter(|scenario| scenario.category == ScenarioCategory::Error).collect();
    assert_eq!(success.len(), 1);
    assert_eq!(success[0].expected.status, 201);
    assert_eq!(errors.len(), 1);
    assert!(options.error_status_fallback.contains(&errors[0].expected.status));
}

#[test]
fn declared_fallback_status_receives_invalid_payload() {
    let document = pets();
    let options = GenerationOptions::default();
    let plan = ScenarioPlanner::new(&document, &options).plan(&document.operations[1]).unwrap();
    let errors: Vec<_> = plan.scenarios.iter().filter(|scenario| scenario.category == ScenarioCategory::Error).collect();
    assert_eq!(errors.iter().map(|scenario| scenario.expected.status).collect::<Vec<_>>(), vec![404, 422]);
    let Some(RequestPayload::Json(invalid)) = &errors[1].request.body else {
        panic!("expected a json body");
    };
    assert!(invalid.get("id").is_none());
    let Some(RequestPayload::Json(valid)) = &errors[0].request.body else {
        panic!("expected a json body");
    };
    assert!(valid.get("id").is_some());
}

#[test]
fn scenarios_follow_category_order() {
    let mut options = GenerationOptions::default();
    options.include_performance = true;
    let document = pets();
    let plan = ScenarioPlanner::new(&document, &options).plan(&document.operations[0]).unwrap();
    let categories: Vec<ScenarioCategory> = plan.scenarios.iter().map(|scenario| scenario.category).collect();
    let mut sorted = categories.clone();
    sorted.sort();
    assert_eq!(categories, sorted);
    assert_eq!(categories.first(), Some(&ScenarioCategory::Success));
    assert_eq!(categories.last(), Some(&ScenarioCategory::Performance));
    let performance = plan.scenarios.last().unwrap();
    assert!(performance.assertions.contains(&Assertion::MaxLatencyMs(options.performance_threshold_ms)));
}

#[test]
fn edge_scenarios_cover_both_sides_of_each_bound() {
    let document = pets();
    let options = GenerationOptions::default();
    let plan = ScenarioPlanner::new(&document, &options).plan(&document.operations[0]).unwrap();
    let edges: Vec<_> = plan.scenarios.iter().filter(|scenario| scenario.category == ScenarioCategory::Edge).collect();
    assert_eq!(edges.len(), 4);
    assert_eq!(edges[0].request.query, vec![("limit".to_string(), json!(1))]);
    assert_eq!(edges[0].expected.status, 200);
    assert_eq!(edges[1].request.query, vec![("limit".to_string(), json!(0))]);
    assert_eq!(edges[1].expected.status, 400);
    assert_eq!(edges[3].request.query, vec![("limit".to_string(), json!(101))]);
    assert_eq!(edges[3].id, "list_pets_edge_4");
}

#[test]
fn body_edge_past_bound_expects_lowest_declared_client_error() {
    let document = pets();
    let options = GenerationOptions::default();
    let plan = ScenarioPlanner::new(&document, &options).plan(&document.operations[1]).unwrap();
    let edges: Vec<_> = plan.scenarios.iter().filter(|scenario| scenario.category == ScenarioCategory::Edge).collect();
    assert_eq!(edges.len(), 2);
    assert_eq!(edges[1].expected.status, 404);
    let Some(RequestPayload::Json(body)) = &edges[1].request.body else {
        panic!("expected a json body");
    };
    assert_eq!(body.get("name").and_then(Value::as_str).map(str::len), Some(21));
}

#[test]
fn secured_operations_get_missing_and_malformed_credentials() {
    let document = pets();
    let options = GenerationOptions::default();
    let planner = ScenarioPlanner::new(&document, &options);
    let plan = planner.plan(&document.operations[0]).unwrap();
    let security: Vec<_> =
        plan.scenarios.iter().filter(|scenario| scenario.category == ScenarioCategory::Security).collect();
    assert_eq!(security.len(), 2);
    assert_eq!(security[0].request.auth, AuthMode::Missing(Credential::Bearer));
    assert_eq!(security[1].request.auth, AuthMode::Malformed(Credential::Bearer));
    assert!(security.iter().all(|scenario| scenario.expected.status == 401));
    assert!(plan.needs_auth());

    let open = planner.plan(&document.operations[2]).unwrap();
    assert!(open.scenarios.iter().all(|scenario| scenario.category != ScenarioCategory::Security));
    assert!(!open.needs_auth());
}

#[test]
fn path_values_are_substituted_and_encoded() {
    let mut options = GenerationOptions::default();
    options.include_examples = true;
    let document = pets();
    let plan = ScenarioPlanner::new(&document, &options).plan(&document.operations[2]).unwrap();
    assert_eq!(plan.scenarios[0].request.path, "/pets/a%20b");
}

#[test]
fn malformed_template_is_a_generation_error() {
    let document = with_paths(json!({"/a/{b": {"get": {"responses": {"200": {"description": "ok"}}}}}));
    let options = GenerationOptions::default();
    let result = ScenarioPlanner::new(&document, &options).plan(&document.operations[0]);
    assert!(matches!(result, Err(crate::GenerationError::Generation(_))));
}

#[test]
fn rules_and_requirements_are_shared_across_scenarios() {
    let document = pets();
    let options = GenerationOptions::default();
    let plan = ScenarioPlanner::new(&document, &options).plan(&document.operations[1]).unwrap();
    assert!(plan.scenarios.iter().all(|scenario| Arc::ptr_eq(&scenario.rules, &plan.rules)));
    assert!(plan.scenarios.iter().all(|scenario| Arc::ptr_eq(&scenario.requirements, &plan.requirements)));
    assert!(plan.rules.iter().any(|rule| rule.field == "body.id" && rule.kind == RuleKind::Required));
    assert!(plan.rules.iter().any(|rule| rule.field == "body.name" && rule.kind == RuleKind::Range));
    assert_eq!(plan.requirements.last().map(|requirement| requirement.name.as_str()), Some("body"));
}

#[test]
fn planning_is_deterministic() {
    let document = pets();
    let options = GenerationOptions::default();
    let planner = ScenarioPlanner::new(&document, &options);
    for operation in &document.operations {
        assert_eq!(planner.plan(operation).unwrap(), planner.plan(operation).unwrap());
    }
}

#[test]
fn duplicate_operation_ids_are_disambiguated() {
    let document = with_paths(json!({
        "/a": {"get": {"operationId": "dup", "responses": {"200": {"description": "ok"}}}},
        "/b": {"get": {"operationId": "dup", "responses": {"200": {"description": "ok"}}}}
    }));
    let options = GenerationOptions::default();
    let planner = ScenarioPlanner::new(&document, &options);
    let first = planner.plan(&document.operations[0]).unwrap();
    let second = planner.plan(&document.operations[1]).unwrap();
    assert_ne!(first.operation_ident, second.operation_ident);
}

#[test]
fn disambiguated_idents_never_collide_with_declared_ones() {
    let document = with_paths(json!({
        "/a": {"get": {"operationId": "getX", "responses": {"200": {"description": "ok"}}}},
        "/b": {"get": {"operationId": "getX", "responses": {"200": {"description": "ok"}}}},
        "/c": {"get": {"operationId": "get_x_0", "responses": {"200": {"description": "ok"}}}},
        "/d": {"get": {"operationId": "get_x_1", "responses": {"200": {"description": "ok"}}}}
    }));
    let options = GenerationOptions::default();
    let planner = ScenarioPlanner::new(&document, &options);
    let idents: Vec<String> =
        document.operations.iter().map(|operation| planner.plan(operation).unwrap().operation_ident).collect();
    let unique: BTreeSet<&str> = idents.iter().map(String::as_str).collect();
    assert_eq!(unique.len(), idents.len());
    assert!(unique.contains("get_x_0"));
    assert!(unique.contains("get_x_1"));
}

#[test]
fn form_values_land_in_the_form_body() {
    let base = Inputs {
        path_values: Vec::new(),
        query: Vec::new(),
        headers: Vec::new(),
        cookies: Vec::new(),
        body: Some(RequestPayload::Form(vec![("name".to_string(), json!("rex"))])),
    };
    let replaced = with_value(&base, &EdgeTarget::Parameter(ParameterLocation::Form, "name".to_string()), json!("a"));
    assert!(replaced.cookies.is_empty());
    assert_eq!(replaced.body, Some(RequestPayload::Form(vec![("name".to_string(), json!("a"))])));

    let empty = Inputs {
        body: None,
        ..base.clone()
    };
    let added = with_value(&empty, &EdgeTarget::Parameter(ParameterLocation::Form, "age".to_string()), json!(3));
    assert!(added.cookies.is_empty());
    assert_eq!(added.body, Some(RequestPayload::Form(vec![("age".to_string(), json!(3))])));

    let cookie = with_value(&base, &EdgeTarget::Parameter(ParameterLocation::Cookie, "session".to_string()), json!("s"));
    assert_eq!(cookie.cookies, vec![("session".to_string(), json!("s"))]);
    assert_eq!(cookie.body, base.body);
}

#[test]
fn grouping_prefers_tags_then_segments() {
    let document = pets();
    assert_eq!(group_name(&document.operations[0], GroupingStrategy::Tag), "pets");
    assert_eq!(group_name(&document.operations[2], GroupingStrategy::Tag), "pets");
    let root = with_paths(json!({"/{id}": {"get": {"responses": {"200": {"description": "ok"}}}}}));
    assert_eq!(group_name(&root.operations[0], GroupingStrategy::PathSegment), "root");
}

#[test]
fn snake_case_normalizes_identifiers() {
    assert_eq!(snake_case("listPets"), "list_pets");
    assert_eq!(snake_case("GET /pets/{petId}"), "get_pets_pet_id");
    assert_eq!(snake_case("--"), "");
    assert_eq!(snake_case("2fa"), "n_2fa");
}

#[test]
fn dependency_order_places_providers_first() {
    let document = with_paths(json!({
        "/orders/{petId}": {"get": {"responses": {"200": {"description": "ok"}}}},
        "/pets": {"post": {"responses": {"201": {"description": "ok", "content": {"application/json": {"schema": {"type": "object", "properties": {"petId": {"type": "string"}}}}}}}}}
    }));
    assert_eq!(dependency_order(&document), vec![1, 0]);
}

#[test]
fn dependency_order_survives_cycles() {
    let provides = |field: &str| json!({"200": {"description": "ok", "content": {"application/json": {"schema": {"type": "object", "properties": {field: {"type": "string"}}}}}}});
    let document = with_paths(json!({
        "/a/{b}": {"get": {"responses": provides("a")}},
        "/b/{a}": {"get": {"responses": provides("b")}},
        "/c": {"get": {"responses": provides("c")}}
    }));
    let order = dependency_order(&document);
    assert_eq!(order, vec![2, 0, 1]);
}
