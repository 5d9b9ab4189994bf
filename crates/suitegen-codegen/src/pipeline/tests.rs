// crates/suitegen-codegen/src/pipeline/tests.rs
// ============================================================================
// Module: Generation Pipeline Unit Tests
// Description: End-to-end runs over small contracts.
// Purpose: Pin grouping, recovery, caching, and strict-mode behavior.
// Dependencies: suitegen-codegen, suitegen-core, serde_json
// ============================================================================

//! ## Overview
//! Drives [`SuiteGenerator`] with in-memory contracts and inspects the
//! produced files, metrics, and error report.

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

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use serde_json::json;
use suitegen_config::EmitterStrategy;
use suitegen_config::GenerationOptions;
use suitegen_contract::FormatHint;
use suitegen_core::CodeEmitter;
use suitegen_core::ErrorCategory;
use suitegen_core::FileContext;
use suitegen_core::GenerationError;
use suitegen_core::RecoveryOutcome;
use suitegen_core::ScenarioPlan;
use suitegen_core::Stage;

use super::SuiteGenerator;
use crate::lower::RenderSettings;
use crate::template::TemplateEmitter;
use crate::tree::TreeEmitter;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

fn contract() -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "Shop", "version": "1.0.0"},
        "components": {
            "schemas": {
                "User": {"type": "object", "required": ["id"], "properties": {"id": {"type": "integer"}}},
                "Order": {"type": "object", "required": ["id", "userId"], "properties": {"id": {"type": "integer"}, "userId": {"type": "integer"}}}
            }
        },
        "paths": {
            "/users": {
                "post": {
                    "operationId": "createUser",
                    "tags": ["users"],
                    "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}},
                    "responses": {"201": {"description": "created", "content": {"application/json": {"schema": {"$ref": "#/components/schemas/User"}}}}}
                }
            },
            "/orders": {
                "get": {
                    "operationId": "listOrders",
                    "tags": ["orders"],
                    "responses": {"200": {"description": "ok", "content": {"application/json": {"schema": {"type": "array", "items": {"$ref": "#/components/schemas/Order"}}}}}}
                },
                "post": {
                    "operationId": "createOrder",
                    "tags": ["orders"],
                    "requestBody": {"required": true, "content": {"application/json": {"schema": {"$ref": "#/components/schemas/Order"}}}},
                    "responses": {"201": {"description": "created"}, "400": {"description": "bad"}}
                }
            }
        }
    })
}

fn bytes(contract: &Value) -> Vec<u8> {
    contract.to_string().into_bytes()
}

fn generator(options: GenerationOptions) -> SuiteGenerator {
    SuiteGenerator::new(options).expect("options are valid")
}

/// Emitter whose file assembly always fails.
struct BrokenAssembly {
    inner: TreeEmitter,
}

impl CodeEmitter for BrokenAssembly {
    fn strategy(&self) -> EmitterStrategy {
        EmitterStrategy::Tree
    }

    fn emit_operation(&self, plan: &ScenarioPlan) -> Result<String, GenerationError> {
        self.inner.emit_operation(plan)
    }

    fn assemble_file(&self, _context: &FileContext, _fragments: &[String]) -> Result<String, GenerationError> {
        Err(GenerationError::Generation("assembly unavailable".to_string()))
    }
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn files_are_grouped_in_declaration_order() {
    let output = generator(GenerationOptions::default()).generate(&bytes(&contract()), FormatHint::Json);
    assert!(output.result.success);
    let paths: Vec<PathBuf> = output.files.iter().map(|file| file.relative_path.clone()).collect();
    assert_eq!(paths, vec![PathBuf::from("tests/users.rs"), PathBuf::from("tests/orders.rs")]);
    assert_eq!(output.result.files_generated, 2);
    assert_eq!(output.result.tests_generated, output.files.iter().map(|file| file.tests).sum::<usize>());
    assert!(output.files.iter().all(|file| syn::parse_file(&file.contents).is_ok()));
    assert_eq!(output.result.output_dir, "generated-tests");
    assert_eq!(output.summary.as_ref().map(|summary| summary.operation_count), Some(3));
    assert_eq!(output.errors.total_errors, 0);
}

#[test]
fn tests_within_a_file_keep_declaration_order() {
    let contract = json!({
        "openapi": "3.0.0",
        "info": {"title": "Items", "version": "1"},
        "paths": {
            "/items/{itemId}": {
                "get": {
                    "operationId": "getItem",
                    "tags": ["items"],
                    "parameters": [{"name": "itemId", "in": "path", "required": true, "schema": {"type": "integer"}}],
                    "responses": {"200": {"description": "ok"}}
                }
            },
            "/items": {
                "post": {
                    "operationId": "createItem",
                    "tags": ["items"],
                    "responses": {"201": {"description": "created", "content": {"application/json": {"schema": {"type": "object", "properties": {"itemId": {"type": "integer"}}}}}}}
                }
            }
        }
    });
    let output = generator(GenerationOptions::default()).generate(&bytes(&contract), FormatHint::Json);
    assert!(output.result.success);
    assert_eq!(output.files.len(), 1);
    let contents = &output.files[0].contents;
    let get = contents.find("fn get_item_success_1").unwrap();
    let create = contents.find("fn create_item_success_1").unwrap();
    assert!(get < create);
}

#[test]
fn provider_files_come_before_consumer_files() {
    let contract = json!({
        "openapi": "3.0.0",
        "info": {"title": "Shop", "version": "1"},
        "paths": {
            "/carts/{userId}": {
                "get": {
                    "operationId": "getCart",
                    "tags": ["carts"],
                    "parameters": [{"name": "userId", "in": "path", "required": true, "schema": {"type": "integer"}}],
                    "responses": {"200": {"description": "ok"}}
                }
            },
            "/users": {
                "post": {
                    "operationId": "createUser",
                    "tags": ["users"],
                    "responses": {"201": {"description": "created", "content": {"application/json": {"schema": {"type": "object", "properties": {"userId": {"type": "integer"}}}}}}}
                }
            }
        }
    });
    let output = generator(GenerationOptions::default()).generate(&bytes(&contract), FormatHint::Json);
    assert!(output.result.success);
    let groups: Vec<&str> = output.files.iter().map(|file| file.group.as_str()).collect();
    assert_eq!(groups, vec!["users", "carts"]);
}

#[test]
fn repeated_runs_are_byte_identical_and_cached() {
    let mut generator = generator(GenerationOptions::default());
    let input = bytes(&contract());
    let first = generator.generate(&input, FormatHint::Json);
    let second = generator.generate(&input, FormatHint::Json);
    assert_eq!(first.files, second.files);
    assert!(!first.result.batch_metrics.is_empty());
    assert!(first.result.batch_metrics.iter().all(|metrics| !metrics.cache_hit));
    assert!(second.result.batch_metrics.iter().all(|metrics| metrics.cache_hit));
}

#[test]
fn streaming_mode_produces_the_same_files() {
    let input = bytes(&contract());
    let batched = generator(GenerationOptions::default()).generate(&input, FormatHint::Json);
    let mut options = GenerationOptions::default();
    options.concurrency.streaming = true;
    options.concurrency.chunk_size = 1;
    options.concurrency.batch_size = 1;
    let streamed = generator(options).generate(&input, FormatHint::Json);
    assert!(streamed.result.success);
    assert_eq!(batched.files, streamed.files);
}

#[test]
fn template_strategy_matches_tree_after_formatting() {
    let input = bytes(&contract());
    let tree = generator(GenerationOptions::default()).generate(&input, FormatHint::Json);
    let mut options = GenerationOptions::default();
    options.emitter = EmitterStrategy::Template;
    let template = generator(options).generate(&input, FormatHint::Json);
    assert_eq!(tree.files.len(), template.files.len());
    for (tree_file, template_file) in tree.files.iter().zip(&template.files) {
        let normalized = prettyplease::unparse(&syn::parse_file(&template_file.contents).unwrap());
        assert_eq!(normalized, tree_file.contents);
    }
}

#[test]
fn failed_assembly_falls_back_to_templates() {
    let options = GenerationOptions::default();
    let settings = RenderSettings::from_options(&options);
    let primary: Arc<dyn CodeEmitter> = Arc::new(BrokenAssembly {
        inner: TreeEmitter::new(settings),
    });
    let fallback: Arc<dyn CodeEmitter> = Arc::new(TemplateEmitter::new(settings));
    let mut generator = SuiteGenerator::with_emitters(options, primary, Some(fallback)).unwrap();
    let output = generator.generate(&bytes(&contract()), FormatHint::Json);
    assert!(output.result.success);
    assert_eq!(output.files.len(), 2);
    assert!(output.files.iter().all(|file| syn::parse_file(&file.contents).is_ok()));
    assert_eq!(output.errors.records.len(), 2);
    assert!(output.errors.records.iter().all(|record| {
        record.category == ErrorCategory::Generation
            && record.outcome == RecoveryOutcome::FellBack
            && record.context.stage == Stage::Synthesize
    }));
}

#[test]
fn failed_assembly_without_fallback_drops_files() {
    let options = GenerationOptions::default();
    let primary: Arc<dyn CodeEmitter> = Arc::new(BrokenAssembly {
        inner: TreeEmitter::new(RenderSettings::from_options(&options)),
    });
    let mut generator = SuiteGenerator::with_emitters(options, primary, None).unwrap();
    let output = generator.generate(&bytes(&contract()), FormatHint::Json);
    assert!(!output.result.success);
    assert!(output.files.is_empty());
    assert!(output.errors.records.iter().all(|record| record.outcome == RecoveryOutcome::Skipped));
}

#[test]
fn unreadable_contract_aborts_with_a_specification_record() {
    let output = generator(GenerationOptions::default()).generate(b"{not json", FormatHint::Json);
    assert!(!output.result.success);
    assert!(output.files.is_empty());
    assert!(output.validation.is_none());
    assert!(output.errors.aborted);
    assert_eq!(output.errors.records[0].category, ErrorCategory::Specification);
    assert_eq!(output.errors.records[0].context.stage, Stage::Parse);
}

#[test]
fn validation_errors_are_recorded_but_not_fatal() {
    let mut contract = contract();
    contract["info"].as_object_mut().unwrap().remove("version");
    let output = generator(GenerationOptions::default()).generate(&bytes(&contract), FormatHint::Json);
    assert!(output.result.success);
    assert!(!output.validation.as_ref().unwrap().is_valid);
    assert_eq!(output.errors.records.len(), 1);
    assert_eq!(output.errors.records[0].category, ErrorCategory::Validation);
    assert_eq!(output.errors.records[0].outcome, RecoveryOutcome::Skipped);
}

#[test]
fn strict_mode_stops_on_validation_errors() {
    let mut contract = contract();
    contract["info"].as_object_mut().unwrap().remove("version");
    let mut options = GenerationOptions::default();
    options.strict_mode = true;
    let output = generator(options).generate(&bytes(&contract), FormatHint::Json);
    assert!(!output.result.success);
    assert!(output.files.is_empty());
    assert!(output.errors.aborted);
    assert_eq!(output.errors.records[0].outcome, RecoveryOutcome::Aborted);
}

#[test]
fn contract_without_paths_produces_nothing() {
    let contract = json!({"openapi": "3.0.0", "info": {"title": "Empty", "version": "1"}, "paths": {}});
    let output = generator(GenerationOptions::default()).generate(&bytes(&contract), FormatHint::Json);
    assert!(!output.result.success);
    assert_eq!(output.result.files_generated, 0);
    assert!(!output.validation.unwrap().is_valid);
}

#[test]
fn invalid_options_are_rejected_at_construction() {
    let mut options = GenerationOptions::default();
    options.concurrency.batch_size = 0;
    assert!(matches!(SuiteGenerator::new(options), Err(GenerationError::Validation(_))));
}
