//! End-to-end suite generation tests for suitegen-codegen.
// crates/suitegen-codegen/tests/generate_suite.rs
// =============================================================================
// Module: Suite Generation Tests
// Description: Full runs over realistic and fuzzed contracts.
// Purpose: Ensure generated files always parse and runs are deterministic.
// =============================================================================

use proptest::prelude::*;
use serde_json::Map;
use serde_json::Value;
use serde_json::json;
use suitegen_codegen::GenerationOutput;
use suitegen_codegen::SuiteGenerator;
use suitegen_config::EmitterStrategy;
use suitegen_config::GenerationOptions;
use suitegen_config::SynthesisMode;
use suitegen_contract::FormatHint;

type TestResult = Result<(), String>;

const PETSTORE_YAML: &str = r##"
swagger: "2.0"
info:
  title: Petstore
  version: "1.0"
host: petstore.example.com
basePath: /v2
schemes: [https]
securityDefinitions:
  api_key:
    type: apiKey
    in: header
    name: api_key
paths:
  /pet:
    post:
      operationId: addPet
      tags: [pet]
      security:
        - api_key: []
      parameters:
        - name: body
          in: body
          required: true
          schema:
            $ref: "#/definitions/Pet"
      responses:
        "200":
          description: ok
          schema:
            $ref: "#/definitions/Pet"
        "405":
          description: invalid input
  /pet/{petId}:
    get:
      operationId: getPetById
      tags: [pet]
      parameters:
        - name: petId
          in: path
          required: true
          type: integer
          minimum: 1
      responses:
        "200":
          description: ok
          schema:
            $ref: "#/definitions/Pet"
        "404":
          description: not found
  /store/inventory:
    get:
      operationId: getInventory
      tags: [store]
      responses:
        "200":
          description: ok
definitions:
  Pet:
    type: object
    required: [name, photoUrls]
    properties:
      id:
        type: integer
        format: int64
      name:
        type: string
        example: doggie
      photoUrls:
        type: array
        items:
          type: string
      status:
        type: string
        enum: [available, pending, sold]
"##;

fn run(input: &[u8], options: GenerationOptions) -> Result<GenerationOutput, String> {
    let mut generator = SuiteGenerator::new(options).map_err(|err| err.to_string())?;
    Ok(generator.generate(input, FormatHint::Auto))
}

fn all_options() -> GenerationOptions {
    let mut options = GenerationOptions::default();
    options.include_types = true;
    options.generate_mocks = true;
    options.include_examples = true;
    options.include_performance = true;
    options.synthesis_mode = SynthesisMode::Maximal;
    options
}

fn ensure_parses(output: &GenerationOutput) -> TestResult {
    for file in &output.files {
        syn::parse_file(&file.contents)
            .map_err(|err| format!("{} does not parse: {err}", file.relative_path.display()))?;
    }
    Ok(())
}

#[test]
fn swagger_yaml_generates_a_parseable_suite() -> TestResult {
    let output = run(PETSTORE_YAML.as_bytes(), GenerationOptions::default())?;
    if !output.result.success {
        return Err(format!("generation failed: {}", output.errors.total_errors));
    }
    let groups: Vec<&str> = output.files.iter().map(|file| file.group.as_str()).collect();
    if groups != ["pet", "store"] {
        return Err(format!("unexpected groups: {}", groups.join(", ")));
    }
    ensure_parses(&output)?;
    let pet = &output.files[0].contents;
    if !pet.contains("https://petstore.example.com/v2") {
        return Err("server url missing from pet file".to_string());
    }
    if !pet.contains("\"api_key\"") || !pet.contains("auth_token()") {
        return Err("api key credential missing from pet file".to_string());
    }
    if !pet.contains("fn get_pet_by_id_success_1()") {
        return Err("success test missing".to_string());
    }
    Ok(())
}

#[test]
fn every_option_combination_still_parses() -> TestResult {
    for emitter in [EmitterStrategy::Tree, EmitterStrategy::Template] {
        for async_mode in [false, true] {
            let mut options = all_options();
            options.emitter = emitter;
            options.async_mode = async_mode;
            let output = run(PETSTORE_YAML.as_bytes(), options)?;
            if !output.result.success || output.files.is_empty() {
                return Err(format!("generation failed for {}", emitter.as_str()));
            }
            ensure_parses(&output)?;
        }
    }
    Ok(())
}

#[test]
fn generation_is_byte_identical_across_generators() -> TestResult {
    let first = run(PETSTORE_YAML.as_bytes(), all_options())?;
    let mut options = all_options();
    options.concurrency.max_workers = 1;
    let second = run(PETSTORE_YAML.as_bytes(), options)?;
    if first.files != second.files {
        return Err("files differ between runs".to_string());
    }
    Ok(())
}

#[test]
fn large_contracts_are_batched_across_workers() -> TestResult {
    let mut paths = Map::new();
    for index in 0 .. 120 {
        paths.insert(
            format!("/widgets{}/w{index}", index % 4),
            json!({"get": {"operationId": format!("getWidget{index}"), "responses": {"200": {"description": "ok"}}}}),
        );
    }
    let contract = json!({"openapi": "3.0.3", "info": {"title": "Widgets", "version": "1"}, "paths": paths});
    let mut options = GenerationOptions::default();
    options.concurrency.batch_size = 16;
    options.concurrency.max_workers = 4;
    let output = run(contract.to_string().as_bytes(), options)?;
    if output.files.len() != 4 {
        return Err(format!("expected 4 files, got {}", output.files.len()));
    }
    if output.result.batch_metrics.len() < 2 {
        return Err("expected several batches".to_string());
    }
    let tests: usize = output.files.iter().map(|file| file.tests).sum();
    if tests < 120 {
        return Err(format!("expected a test per operation, got {tests}"));
    }
    ensure_parses(&output)
}

// =============================================================================
// SECTION: Properties
// =============================================================================

fn schema_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(json!({"type": "string"})),
        Just(json!({"type": "string", "format": "date-time"})),
        Just(json!({"type": "string", "minLength": 2, "maxLength": 5})),
        Just(json!({"type": "integer", "minimum": -3, "maximum": 40})),
        Just(json!({"type": "number"})),
        Just(json!({"type": "boolean"})),
        Just(json!({"type": "string", "enum": ["a\"b", "c\\d", "{e}"]})),
        Just(json!({"$ref": "#/components/schemas/Node"})),
    ];
    leaf.prop_recursive(5, 40, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|items| json!({"type": "array", "items": items})),
            proptest::collection::vec(inner, 1 .. 4).prop_map(|fields| {
                let mut properties = Map::new();
                let mut required = Vec::new();
                for (index, field) in fields.into_iter().enumerate() {
                    properties.insert(format!("field-{index}"), field);
                    required.push(Value::from(format!("field-{index}")));
                }
                json!({"type": "object", "required": required, "properties": properties})
            }),
        ]
    })
}

fn fuzzed_contract(body: &Value, response: &Value) -> Value {
    json!({
        "openapi": "3.0.0",
        "info": {"title": "Fuzz", "version": "1"},
        "components": {
            "schemas": {"Node": {"type": "object", "properties": {"next": {"$ref": "#/components/schemas/Node"}}}},
            "securitySchemes": {"bearer": {"type": "http", "scheme": "bearer"}}
        },
        "security": [{"bearer": []}],
        "paths": {
            "/things/{id}": {
                "put": {
                    "operationId": "putThing",
                    "parameters": [{"name": "id", "in": "path", "required": true, "schema": {"type": "integer", "minimum": 1}}],
                    "requestBody": {"required": true, "content": {"application/json": {"schema": body}}},
                    "responses": {
                        "200": {"description": "ok", "content": {"application/json": {"schema": response}}},
                        "422": {"description": "invalid"}
                    }
                }
            }
        }
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn fuzzed_schemas_always_yield_parseable_suites(body in schema_strategy(), response in schema_strategy()) {
        let contract = fuzzed_contract(&body, &response);
        let output = run(contract.to_string().as_bytes(), all_options()).map_err(TestCaseError::fail)?;
        prop_assert!(output.result.success);
        for file in &output.files {
            prop_assert!(syn::parse_file(&file.contents).is_ok(), "unparseable file:\n{}", file.contents);
        }
    }
}
