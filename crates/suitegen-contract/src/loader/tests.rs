// crates/suitegen-contract/src/loader/tests.rs
// ============================================================================
// Module: Contract Loader Unit Tests
// Description: Format sniffing, version whitelisting, and normalization checks.
// Purpose: Pin loader behavior for JSON, YAML, and Swagger 2.0 inputs.
// Dependencies: suitegen-contract, serde_json
// ============================================================================

//! ## Overview
//! Exercises the loader against small inline contracts.

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

use super::FormatHint;
use super::MAX_CONTRACT_BYTES;
use super::Sniffed;
use super::parse;
use super::sniff;
use crate::ContractError;
use crate::model::DiagnosticScope;
use crate::model::HttpMethod;
use crate::model::ParameterLocation;
use crate::model::ResponseStatus;
use crate::model::SecuritySchemeKind;
use crate::model::SpecFamily;

type TestResult = Result<(), String>;

// ============================================================================
// SECTION: Fixtures
// ============================================================================

const PETSTORE_YAML: &str = r"openapi: 3.0.3
info:
  title: Pets
  version: '1.0'
servers:
  - url: https://api.example.com/v1/
paths:
  /pets/{petId}:
    parameters:
      - name: petId
        in: path
        schema:
          type: integer
    get:
      operationId: getPet
      tags: [pets]
      responses:
        200:
          description: ok
          content:
            application/json:
              schema:
                $ref: '#/components/schemas/Pet'
        4XX:
          description: client error
components:
  schemas:
    Pet:
      type: object
      required: [id]
      properties:
        id:
          type: integer
  securitySchemes:
    bearerAuth:
      type: http
      scheme: bearer
";

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn sniff_distinguishes_braces_and_markers() {
    assert_eq!(sniff("  {\"openapi\": \"3.0.0\"}\n"), Sniffed::Json);
    assert_eq!(sniff("openapi: 3.0.0\ninfo: {}\n"), Sniffed::Yaml);
    assert_eq!(sniff("# comment only\n"), Sniffed::Ambiguous);
}

#[test]
fn yaml_contract_normalizes_operations_and_servers() -> TestResult {
    let document = parse(PETSTORE_YAML.as_bytes(), FormatHint::Auto).map_err(|err| err.to_string())?;
    assert_eq!(document.version.family, SpecFamily::OpenApi30);
    assert_eq!(document.primary_server(), "https://api.example.com/v1");
    assert_eq!(document.operations.len(), 1);
    let operation = &document.operations[0];
    assert_eq!(operation.method, HttpMethod::Get);
    assert_eq!(operation.key(), "GET /pets/{petId}");
    assert_eq!(operation.operation_id.as_deref(), Some("getPet"));
    let path_param = operation.parameters_in(ParameterLocation::Path).next().ok_or("missing path param")?;
    assert!(path_param.required);
    assert_eq!(operation.primary_success_status(), 200);
    assert!(operation.responses.iter().any(|response| response.status == ResponseStatus::Range(400)));
    assert!(document.summary.schema_names.contains("Pet"));
    assert_eq!(document.security_schemes[0].kind, SecuritySchemeKind::Bearer);
    Ok(())
}

#[test]
fn swagger2_body_parameter_becomes_request_body() -> TestResult {
    let contract = json!({
        "swagger": "2.0",
        "info": {"title": "Legacy", "version": "1"},
        "host": "legacy.example.com",
        "basePath": "/api",
        "schemes": ["http"],
        "paths": {
            "/items": {
                "post": {
                    "parameters": [
                        {"name": "item", "in": "body", "required": true, "schema": {"$ref": "#/definitions/Item"}},
                        {"name": "limit", "in": "query", "type": "integer", "maximum": 50}
                    ],
                    "responses": {"201": {"description": "created"}}
                }
            }
        },
        "definitions": {"Item": {"type": "object"}},
        "securityDefinitions": {"key": {"type": "apiKey", "name": "X-Key", "in": "header"}}
    });
    let document = parse(contract.to_string().as_bytes(), FormatHint::Json).map_err(|err| err.to_string())?;
    assert_eq!(document.version.family, SpecFamily::Swagger2);
    assert_eq!(document.primary_server(), "http://legacy.example.com/api");
    let operation = &document.operations[0];
    let body = operation.request_body.as_ref().ok_or("missing body")?;
    assert!(body.required);
    assert_eq!(body.schema, json!({"$ref": "#/definitions/Item"}));
    let limit = &operation.parameters[0];
    assert_eq!(limit.name, "limit");
    assert_eq!(limit.schema, json!({"type": "integer", "maximum": 50}));
    assert!(document.schemas.contains_key("Item"));
    assert!(matches!(document.security_schemes[0].kind, SecuritySchemeKind::ApiKey { .. }));
    Ok(())
}

#[test]
fn unsupported_version_lists_whitelist() {
    let contract = json!({"openapi": "4.0.0", "paths": {}});
    let err = parse(contract.to_string().as_bytes(), FormatHint::Auto).unwrap_err();
    match err {
        ContractError::UnsupportedVersion {
            found,
            supported,
        } => {
            assert_eq!(found, "4.0.0");
            assert!(supported.contains("3.1.0"));
            assert!(supported.contains("2.0"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn missing_version_marker_is_invalid() {
    let err = parse(b"{\"info\": {}}", FormatHint::Auto).unwrap_err();
    assert!(matches!(err, ContractError::Invalid(_)));
}

#[test]
fn non_utf8_input_is_unreadable() {
    let err = parse(&[0xff, 0xfe, 0x00], FormatHint::Auto).unwrap_err();
    assert!(matches!(err, ContractError::Unreadable(_)));
}

#[test]
fn oversized_input_is_rejected() {
    let size = usize::try_from(MAX_CONTRACT_BYTES).unwrap() + 1;
    let input = vec![b' '; size];
    let err = parse(&input, FormatHint::Auto).unwrap_err();
    assert!(matches!(err, ContractError::Unreadable(_)));
}

#[test]
fn garbage_is_a_parse_error() {
    let err = parse(b"{not json", FormatHint::Json).unwrap_err();
    assert!(matches!(err, ContractError::Parse(_)));
}

#[test]
fn malformed_entries_are_recorded_as_diagnostics() -> TestResult {
    let contract = json!({
        "openapi": "3.1.0",
        "info": {"title": "T", "version": "1"},
        "paths": {
            "/broken": "not an object",
            "/ok": {
                "get": 42,
                "post": {"parameters": [{"in": "query"}], "responses": {"200": {}}}
            }
        }
    });
    let document = parse(contract.to_string().as_bytes(), FormatHint::Auto).map_err(|err| err.to_string())?;
    assert_eq!(document.paths.len(), 2);
    assert_eq!(document.operations.len(), 1);
    let scopes: Vec<DiagnosticScope> = document.diagnostics.iter().map(|diag| diag.scope).collect();
    assert!(scopes.contains(&DiagnosticScope::Path));
    assert_eq!(scopes.iter().filter(|scope| **scope == DiagnosticScope::Operation).count(), 2);
    assert!(document.diagnostics.iter().any(|diag| diag.pointer == "/paths/~1broken"));
    Ok(())
}

#[test]
fn operation_parameters_override_path_parameters() -> TestResult {
    let contract = json!({
        "openapi": "3.0.0",
        "paths": {
            "/things": {
                "parameters": [{"name": "q", "in": "query", "schema": {"type": "string"}}],
                "get": {
                    "parameters": [{"name": "q", "in": "query", "required": true, "schema": {"type": "integer"}}],
                    "responses": {"200": {"description": "ok"}}
                }
            }
        }
    });
    let document = parse(contract.to_string().as_bytes(), FormatHint::Auto).map_err(|err| err.to_string())?;
    let operation = &document.operations[0];
    assert_eq!(operation.parameters.len(), 1);
    assert!(operation.parameters[0].required);
    assert_eq!(operation.parameters[0].schema, json!({"type": "integer"}));
    Ok(())
}
