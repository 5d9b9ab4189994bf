// crates/suitegen-core/src/synth.rs
// ============================================================================
// Module: Data Synthesizer
// Description: Schema-driven generation of valid, invalid, and boundary values.
// Purpose: Produce deterministic request and response payloads for scenarios.
// Dependencies: suitegen-contract, suitegen-config, serde_json
// ============================================================================

//! ## Overview
//! Synthesis is recursive and total: every schema fragment, including
//! malformed or dangling ones, yields a value. Output depends only on the
//! schema and the synthesizer settings, so identical inputs always produce
//! identical payloads.
//!
//! # Invariants
//! - [`DataSynthesizer::valid`] never panics and never recurses deeper than [`MAX_DEPTH`].
//! - [`DataSynthesizer::invalid`] violates exactly one constraint of the top-level schema.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde_json::Map;
use serde_json::Value;
use suitegen_config::SynthesisMode;
use suitegen_contract::ContractDocument;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum schema nesting followed during synthesis.
pub const MAX_DEPTH: usize = 8;
/// Placeholder string value.
const PLACEHOLDER: &str = "example";
/// Length of [`PLACEHOLDER`].
const PLACEHOLDER_LENGTH: u64 = 7;
/// Longest string a boundary variant will materialize.
const MAX_BOUNDARY_LENGTH: u64 = 4_096;

// ============================================================================
// SECTION: Types
// ============================================================================

/// One boundary of a constrained field.
#[derive(Debug, Clone, PartialEq)]
pub struct Boundary {
    /// Constraint keyword (`minimum`, `maximum`, `minLength`, `maxLength`).
    pub constraint: &'static str,
    /// Value sitting exactly on the boundary.
    pub at: Value,
    /// Value one step past the boundary.
    pub past: Value,
}

/// Schema-driven value generator bound to one contract.
#[derive(Debug, Clone, Copy)]
pub struct DataSynthesizer<'a> {
    /// Contract used for `$ref` resolution.
    document: &'a ContractDocument,
    /// Payload depth.
    mode: SynthesisMode,
    /// Prefer schema `example`/`default` values.
    include_examples: bool,
}

impl<'a> DataSynthesizer<'a> {
    /// Builds a synthesizer.
    #[must_use]
    pub const fn new(document: &'a ContractDocument, mode: SynthesisMode, include_examples: bool) -> Self {
        Self {
            document,
            mode,
            include_examples,
        }
    }

    /// Resolves `$ref` chains on a fragment.
    #[must_use]
    pub fn resolve(&self, schema: &'a Value) -> &'a Value {
        self.document.resolve_schema(schema)
    }

    /// Generates a value satisfying the schema.
    #[must_use]
    pub fn valid(&self, schema: &Value) -> Value {
        self.generate(schema, 0)
    }

    /// Generates a value violating exactly one constraint of the schema.
    ///
    /// Objects with required properties lose their first required property;
    /// everything else gets a value of the wrong type.
    #[must_use]
    pub fn invalid(&self, schema: &Value) -> Value {
        let resolved = self.document.resolve_schema(schema);
        if let Some(first) = required_names(resolved).first() {
            let mut value = self.generate(resolved, 0);
            if let Value::Object(map) = &mut value {
                map.remove(*first);
                return value;
            }
        }
        match schema_type(resolved) {
            Some("string") => Value::from(12_345),
            Some("integer" | "number") => Value::from("not-a-number"),
            Some("boolean") => Value::from("not-a-boolean"),
            Some("array") => Value::from("not-an-array"),
            Some("object") => Value::from("not-an-object"),
            _ => Value::Null,
        }
    }

    /// Returns the boundary variants of a scalar schema.
    #[must_use]
    pub fn boundaries(&self, schema: &Value) -> Vec<Boundary> {
        let resolved = self.document.resolve_schema(schema);
        let mut out = Vec::new();
        match schema_type(resolved) {
            Some(kind @ ("integer" | "number")) => {
                let integer = kind == "integer";
                if let Some(min) = resolved.get("minimum").filter(|value| value.is_number())
                    && let Some(past) = step(min, -1.0, integer)
                {
                    out.push(Boundary {
                        constraint: "minimum",
                        at: min.clone(),
                        past,
                    });
                }
                if let Some(max) = resolved.get("maximum").filter(|value| value.is_number())
                    && let Some(past) = step(max, 1.0, integer)
                {
                    out.push(Boundary {
                        constraint: "maximum",
                        at: max.clone(),
                        past,
                    });
                }
            }
            Some("string") => {
                if let Some(min) = resolved.get("minLength").and_then(Value::as_u64)
                    && min > 0
                    && min <= MAX_BOUNDARY_LENGTH
                {
                    out.push(Boundary {
                        constraint: "minLength",
                        at: Value::String(fit_length(min)),
                        past: Value::String(fit_length(min - 1)),
                    });
                }
                if let Some(max) = resolved.get("maxLength").and_then(Value::as_u64)
                    && max < MAX_BOUNDARY_LENGTH
                {
                    out.push(Boundary {
                        constraint: "maxLength",
                        at: Value::String(fit_length(max)),
                        past: Value::String(fit_length(max + 1)),
                    });
                }
            }
            _ => {}
        }
        out
    }

    /// Recursive generator.
    fn generate(&self, schema: &Value, depth: usize) -> Value {
        if depth > MAX_DEPTH {
            return Value::Object(Map::new());
        }
        let schema = self.document.resolve_schema(schema);
        let Some(object) = schema.as_object() else {
            return Value::Object(Map::new());
        };
        if self.include_examples {
            if let Some(example) = object.get("example") {
                return example.clone();
            }
            if let Some(default) = object.get("default") {
                return default.clone();
            }
        }
        if let Some(constant) = object.get("const") {
            return constant.clone();
        }
        if let Some(first) = object.get("enum").and_then(Value::as_array).and_then(|values| values.first()) {
            return first.clone();
        }
        if let Some(branches) = object.get("allOf").and_then(Value::as_array) {
            let merged = self.merge_all_of(schema, branches);
            return self.generate(&merged, depth + 1);
        }
        for keyword in ["oneOf", "anyOf"] {
            if let Some(first) = object.get(keyword).and_then(Value::as_array).and_then(|branches| branches.first()) {
                return self.generate(first, depth + 1);
            }
        }
        match schema_type(schema) {
            Some("object") => self.generate_object(object, depth),
            Some("array") => {
                if self.mode == SynthesisMode::Minimal {
                    return Value::Array(Vec::new());
                }
                let items = object.get("items").unwrap_or(&Value::Null);
                Value::Array(vec![self.generate(items, depth + 1)])
            }
            Some("string") => generate_string(object),
            Some("integer") => generate_number(object, Value::from(1)),
            Some("number") => generate_number(object, Value::from(1.5)),
            Some("boolean") => Value::Bool(true),
            Some("null") => Value::Null,
            _ => Value::Object(Map::new()),
        }
    }

    /// Generates an object from declared properties.
    fn generate_object(&self, object: &Map<String, Value>, depth: usize) -> Value {
        let required = object
            .get("required")
            .and_then(Value::as_array)
            .map(|names| names.iter().filter_map(Value::as_str).collect::<Vec<_>>())
            .unwrap_or_default();
        let mut out = Map::new();
        if let Some(properties) = object.get("properties").and_then(Value::as_object) {
            for (name, property) in properties {
                let include = self.mode == SynthesisMode::Maximal || required.contains(&name.as_str());
                if include {
                    out.insert(name.clone(), self.generate(property, depth + 1));
                }
            }
        }
        Value::Object(out)
    }

    /// Merges `allOf` branches into one object schema.
    fn merge_all_of(&self, schema: &Value, branches: &[Value]) -> Value {
        let mut properties = Map::new();
        let mut required: Vec<Value> = Vec::new();
        let mut sources: Vec<&Value> = branches.iter().map(|branch| self.document.resolve_schema(branch)).collect();
        sources.push(schema);
        for source in sources {
            if let Some(props) = source.get("properties").and_then(Value::as_object) {
                for (name, property) in props {
                    properties.entry(name.clone()).or_insert_with(|| property.clone());
                }
            }
            if let Some(names) = source.get("required").and_then(Value::as_array) {
                for name in names {
                    if !required.contains(name) {
                        required.push(name.clone());
                    }
                }
            }
        }
        let mut merged = Map::new();
        merged.insert("type".to_string(), Value::from("object"));
        merged.insert("properties".to_string(), Value::Object(properties));
        merged.insert("required".to_string(), Value::Array(required));
        Value::Object(merged)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Returns the effective `type` keyword (first non-null entry of a type list).
///
/// Schemas without `type` are inferred from `properties` or `items`.
#[must_use]
pub fn schema_type(schema: &Value) -> Option<&str> {
    match schema.get("type") {
        Some(Value::String(kind)) => Some(kind.as_str()),
        Some(Value::Array(kinds)) => {
            kinds.iter().filter_map(Value::as_str).find(|kind| *kind != "null").or(Some("null"))
        }
        _ => {
            if schema.get("properties").is_some() {
                Some("object")
            } else if schema.get("items").is_some() {
                Some("array")
            } else {
                None
            }
        }
    }
}

/// Returns the required property names of an object schema.
#[must_use]
pub fn required_names(schema: &Value) -> Vec<&str> {
    schema
        .get("required")
        .and_then(Value::as_array)
        .map(|names| names.iter().filter_map(Value::as_str).collect())
        .unwrap_or_default()
}

/// Generates a string honoring `format` and length bounds.
fn generate_string(object: &Map<String, Value>) -> Value {
    let format = object.get("format").and_then(Value::as_str).unwrap_or_default();
    let canonical = match format {
        "email" => Some("user@example.com"),
        "date-time" => Some("2024-01-01T00:00:00Z"),
        "date" => Some("2024-01-01"),
        "uuid" => Some("123e4567-e89b-12d3-a456-426614174000"),
        "uri" | "url" => Some("https://example.com/resource"),
        "ipv4" => Some("192.0.2.1"),
        "hostname" => Some("example.com"),
        _ => None,
    };
    if let Some(value) = canonical {
        return Value::from(value);
    }
    let min = object.get("minLength").and_then(Value::as_u64).unwrap_or(0).min(MAX_BOUNDARY_LENGTH);
    let max = object.get("maxLength").and_then(Value::as_u64);
    let base = PLACEHOLDER_LENGTH;
    let target = match max {
        Some(max) if max < base => max.max(min),
        _ => base.max(min),
    };
    Value::String(fit_length(target))
}

/// Generates a number from `minimum`, else the placeholder, clamped to `maximum`.
fn generate_number(object: &Map<String, Value>, placeholder: Value) -> Value {
    let candidate = object.get("minimum").filter(|value| value.is_number()).cloned().unwrap_or(placeholder);
    match (candidate.as_f64(), object.get("maximum").filter(|value| value.is_number())) {
        (Some(value), Some(max)) if max.as_f64().is_some_and(|max| value > max) => max.clone(),
        _ => candidate,
    }
}

/// Builds a placeholder string of an exact length.
fn fit_length(length: u64) -> String {
    let length = usize::try_from(length).unwrap_or(0);
    PLACEHOLDER.chars().chain(std::iter::repeat('x')).take(length).collect()
}

/// Offsets a numeric value by `delta`, keeping integers integral.
fn step(value: &Value, delta: f64, integer: bool) -> Option<Value> {
    if integer && let Some(whole) = value.as_i64() {
        let offset = if delta < 0.0 { whole.checked_sub(1) } else { whole.checked_add(1) };
        return offset.map(Value::from);
    }
    value.as_f64().and_then(|number| serde_json::Number::from_f64(number + delta)).map(Value::Number)
}
