// crates/suitegen-codegen/src/tree/tests.rs
// ============================================================================
// Module: Syntax Tree Emitter Unit Tests
// Description: Fragment and file rendering through token trees.
// Purpose: Ensure tree output parses and carries the expected items.
// Dependencies: suitegen-codegen, suitegen-core, syn
// ============================================================================

//! ## Overview
//! Renders small plans and inspects the parsed files.

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

use serde_json::json;
use suitegen_config::GenerationOptions;
use suitegen_contract::ContractDocument;
use suitegen_contract::FormatHint;
use suitegen_contract::parse;
use suitegen_core::CodeEmitter;
use suitegen_core::FileContext;
use suitegen_core::GenerationError;
use suitegen_core::ScenarioPlan;
use suitegen_core::ScenarioPlanner;

use super::TreeEmitter;
use crate::lower::RenderSettings;
use crate::verify::checked_ident;
use crate::verify::verify_source;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn document() -> ContractDocument {
    let contract = json!({
        "openapi": "3.0.0",
        "info": {"title": "Store", "version": "1"},
        "servers": [{"url": "https://store.example.com/v1"}],
        "components": {
            "schemas": {
                "Order": {"type": "object", "required": ["id"], "properties": {"id": {"type": "string", "format": "uuid"}}}
            },
            "securitySchemes": {"bearer": {"type": "http", "scheme": "bearer"}}
        },
        "paths": {
            "/orders": {
                "post": {
                    "operationId": "createOrder",
                    "security": [{"bearer": []}],
                    "requestBody": {"content": {"application/json": {"schema": {"$ref": "#/components/schemas/Order"}}}},
                    "responses": {"201": {"description": "created", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Order"}}}}}
                }
            },
            "/health": {
                "get": {"operationId": "health", "responses": {"204": {"description": "up"}}}
            }
        }
    });
    parse(contract.to_string().as_bytes(), FormatHint::Json).expect("fixture parses")
}

fn plans(document: &ContractDocument, options: &GenerationOptions) -> Vec<ScenarioPlan> {
    let planner = ScenarioPlanner::new(document, options);
    document.operations.iter().map(|operation| planner.plan(operation).expect("plan")).collect()
}

fn render(options: &GenerationOptions, index: usize) -> String {
    let document = document();
    let plans = plans(&document, options);
    let plan = &plans[index];
    let context = FileContext::for_plans(&plan.group, &document, options, &[plan]);
    TreeEmitter::new(RenderSettings::from_options(options)).synthesize_file(&context, &[plan]).expect("file")
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn fragments_are_item_token_streams() {
    let document = document();
    let options = GenerationOptions::default();
    let plans = plans(&document, &options);
    let fragment = TreeEmitter::default().emit_operation(&plans[0]).unwrap();
    let file = syn::parse_file(&fragment).unwrap();
    assert!(!file.items.is_empty());
    assert!(file.items.iter().all(|item| matches!(item, syn::Item::Fn(_))));
}

#[test]
fn assembled_file_carries_header_helpers_and_tests() {
    let source = render(&GenerationOptions::default(), 0);
    verify_source(&source).unwrap();
    assert!(source.starts_with("//! Generated tests for the `orders` group."));
    assert!(source.contains("#![allow(dead_code)]"));
    assert!(source.contains("const BASE_URL: &str = \"https://store.example.com/v1\";"));
    assert!(source.contains("SUITEGEN_BASE_URL"));
    assert!(source.contains("fn auth_token() -> String"));
    assert!(source.contains("SUITEGEN_AUTH_TOKEN"));
    assert!(source.contains("#[test]\nfn create_order_success_1()"));
    assert!(source.contains("reqwest::blocking::Client::new()"));
    assert!(source.contains("reqwest::Method::POST"));
    assert!(source.contains("response.status().as_u16(), 201"));
}

#[test]
fn unauthenticated_files_have_no_token_helper() {
    let source = render(&GenerationOptions::default(), 1);
    assert!(!source.contains("auth_token"));
    assert!(source.contains("fn health_success_1()"));
    assert!(source.contains("response.status().as_u16(), 204"));
}

#[test]
fn async_mode_uses_tokio_and_await() {
    let mut options = GenerationOptions::default();
    options.async_mode = true;
    let source = render(&options, 0);
    assert!(source.contains("#[tokio::test]\nasync fn create_order_success_1()"));
    assert!(source.contains("reqwest::Client::new()"));
    assert!(source.contains(".send().await"));
    assert!(!source.contains("blocking"));
}

#[test]
fn types_and_mocks_become_constants() {
    let mut options = GenerationOptions::default();
    options.include_types = true;
    options.generate_mocks = true;
    let source = render(&options, 0);
    assert!(source.contains("mod schemas {"));
    assert!(source.contains("pub const ORDER: &str"));
    assert!(source.contains("const CREATE_ORDER_SUCCESS_1_MOCK: &str"));
}

#[test]
fn unparseable_fragment_is_a_generation_error() {
    let document = document();
    let options = GenerationOptions::default();
    let plans = plans(&document, &options);
    let context = FileContext::for_plans("orders", &document, &options, &[&plans[0]]);
    let result = TreeEmitter::default().assemble_file(&context, &["fn broken( {".to_string()]);
    assert!(matches!(result, Err(GenerationError::Generation(_))));
}

#[test]
fn keywords_are_not_identifiers() {
    assert!(checked_ident("match").is_err());
    assert!(checked_ident("1abc").is_err());
    assert_eq!(checked_ident("list_pets_success_1").unwrap().to_string(), "list_pets_success_1");
}
