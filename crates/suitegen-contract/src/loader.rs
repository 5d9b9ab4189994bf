// crates/suitegen-contract/src/loader.rs
// ============================================================================
// Module: Contract Loader
// Description: Format sniffing, decoding, and normalization of contract bytes.
// Purpose: Build the immutable contract model from untrusted JSON or YAML.
// Dependencies: serde_json, serde_yaml, tracing
// ============================================================================

//! ## Overview
//! Loading happens in three steps: the bytes are size-checked and decoded as
//! UTF-8, the text is decoded as JSON or YAML (sniffed when no hint is
//! given), and the resulting tree is normalized into a [`ContractDocument`].
//! Swagger 2.0 and `OpenAPI` 3.x documents normalize to the same model.
//!
//! Document-level problems (unreadable input, missing or unsupported version)
//! fail closed. Problems inside individual paths or operations are recorded
//! as [`Diagnostic`] entries for the validator.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::io::Read;
use std::path::Path;

use serde_json::Map;
use serde_json::Value;
use tracing::debug;

use crate::ContractError;
use crate::model::ApiKeyLocation;
use crate::model::ContractDocument;
use crate::model::ContractSummary;
use crate::model::Diagnostic;
use crate::model::DiagnosticScope;
use crate::model::HttpMethod;
use crate::model::Info;
use crate::model::Operation;
use crate::model::Parameter;
use crate::model::ParameterLocation;
use crate::model::PathEntry;
use crate::model::RequestBody;
use crate::model::ResponseSpec;
use crate::model::ResponseStatus;
use crate::model::SecurityRequirement;
use crate::model::SecurityScheme;
use crate::model::SecuritySchemeKind;
use crate::model::SpecFamily;
use crate::model::SpecVersion;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum contract size accepted by the loader.
pub const MAX_CONTRACT_BYTES: u64 = 16 * 1024 * 1024;

/// Specification versions accepted by the loader.
pub const SUPPORTED_VERSIONS: &[&str] = &["2.0", "3.0.0", "3.0.1", "3.0.2", "3.0.3", "3.1.0", "3.1.1"];

/// Media type preferred when a body or response declares several.
const JSON_MEDIA_TYPE: &str = "application/json";

// ============================================================================
// SECTION: Format Detection
// ============================================================================

/// Caller-supplied hint about the contract encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormatHint {
    /// Sniff the content.
    #[default]
    Auto,
    /// Decode as JSON only.
    Json,
    /// Decode as YAML only.
    Yaml,
}

impl FormatHint {
    /// Derives a hint from a file extension.
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::Json,
            Some("yaml" | "yml") => Self::Yaml,
            _ => Self::Auto,
        }
    }
}

/// Result of content sniffing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sniffed {
    /// Braced text.
    Json,
    /// Text carrying a line-leading version marker.
    Yaml,
    /// Neither signal is conclusive.
    Ambiguous,
}

/// Classifies text by its leading/trailing braces or version-marker keys.
fn sniff(text: &str) -> Sniffed {
    let trimmed = text.trim();
    if trimmed.starts_with('{') && trimmed.ends_with('}') {
        return Sniffed::Json;
    }
    let has_marker = trimmed.lines().any(|line| {
        let line = line.trim_start_matches('\u{feff}');
        line.starts_with("openapi:") || line.starts_with("swagger:")
    });
    if has_marker { Sniffed::Yaml } else { Sniffed::Ambiguous }
}

// ============================================================================
// SECTION: Public API
// ============================================================================

/// Reads and parses a contract file, using the extension as the format hint.
///
/// # Errors
///
/// Returns [`ContractError`] when the file cannot be read, exceeds
/// [`MAX_CONTRACT_BYTES`], or fails to parse.
pub fn load_contract(path: &Path) -> Result<ContractDocument, ContractError> {
    let file = fs::File::open(path).map_err(|err| ContractError::Io(err.to_string()))?;
    let metadata = file.metadata().map_err(|err| ContractError::Io(err.to_string()))?;
    if metadata.len() > MAX_CONTRACT_BYTES {
        return Err(ContractError::Unreadable(format!(
            "contract input exceeds {MAX_CONTRACT_BYTES} bytes"
        )));
    }
    let mut bytes = Vec::new();
    let mut limited = file.take(MAX_CONTRACT_BYTES + 1);
    limited.read_to_end(&mut bytes).map_err(|err| ContractError::Io(err.to_string()))?;
    parse(&bytes, FormatHint::from_path(path))
}

/// Parses contract bytes into a validated, enriched document.
///
/// # Errors
///
/// Returns [`ContractError`] when the input is oversized, not UTF-8, not
/// decodable, lacks a version marker, or declares an unsupported version.
pub fn parse(input: &[u8], hint: FormatHint) -> Result<ContractDocument, ContractError> {
    let size = u64::try_from(input.len())
        .map_err(|_| ContractError::Unreadable("contract size exceeds addressable memory".to_string()))?;
    if size > MAX_CONTRACT_BYTES {
        return Err(ContractError::Unreadable(format!(
            "contract input exceeds {MAX_CONTRACT_BYTES} bytes"
        )));
    }
    let text = std::str::from_utf8(input)
        .map_err(|_| ContractError::Unreadable("contract input must be utf-8".to_string()))?;
    let raw = decode(text, hint)?;
    let document = build_document(raw)?;
    debug!(
        version = %document.version.raw,
        paths = document.summary.path_count,
        operations = document.summary.operation_count,
        diagnostics = document.diagnostics.len(),
        "contract parsed"
    );
    Ok(document)
}

// ============================================================================
// SECTION: Decoding
// ============================================================================

/// Decodes text according to the hint, sniffing when the hint is `Auto`.
fn decode(text: &str, hint: FormatHint) -> Result<Value, ContractError> {
    match hint {
        FormatHint::Json => decode_json(text),
        FormatHint::Yaml => decode_yaml(text),
        FormatHint::Auto => match sniff(text) {
            Sniffed::Json => decode_json(text),
            Sniffed::Yaml => decode_yaml(text),
            Sniffed::Ambiguous => decode_json(text).or_else(|json_err| {
                decode_yaml(text).map_err(|yaml_err| {
                    ContractError::Parse(format!("not json ({json_err}) and not yaml ({yaml_err})"))
                })
            }),
        },
    }
}

/// Decodes JSON text.
fn decode_json(text: &str) -> Result<Value, ContractError> {
    serde_json::from_str(text).map_err(|err| ContractError::Parse(format!("json: {err}")))
}

/// Decodes YAML text into a JSON tree with string keys.
fn decode_yaml(text: &str) -> Result<Value, ContractError> {
    let value: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|err| ContractError::Parse(format!("yaml: {err}")))?;
    Ok(yaml_to_json(value))
}

/// Converts a YAML tree into JSON, stringifying non-string mapping keys.
fn yaml_to_json(value: serde_yaml::Value) -> Value {
    match value {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(flag) => Value::Bool(flag),
        serde_yaml::Value::Number(number) => yaml_number(&number),
        serde_yaml::Value::String(text) => Value::String(text),
        serde_yaml::Value::Sequence(items) => {
            Value::Array(items.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(mapping) => {
            let mut object = Map::new();
            for (key, value) in mapping {
                object.insert(yaml_key(key), yaml_to_json(value));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// Converts a YAML number into a JSON number.
fn yaml_number(number: &serde_yaml::Number) -> Value {
    if let Some(value) = number.as_i64() {
        return Value::from(value);
    }
    if let Some(value) = number.as_u64() {
        return Value::from(value);
    }
    number
        .as_f64()
        .and_then(serde_json::Number::from_f64)
        .map_or(Value::Null, Value::Number)
}

/// Renders a YAML mapping key as a JSON object key.
fn yaml_key(key: serde_yaml::Value) -> String {
    match key {
        serde_yaml::Value::String(text) => text,
        serde_yaml::Value::Null => "null".to_string(),
        serde_yaml::Value::Bool(flag) => flag.to_string(),
        serde_yaml::Value::Number(number) => number.to_string(),
        other => yaml_to_json(other).to_string(),
    }
}

// ============================================================================
// SECTION: Normalization
// ============================================================================

/// Builds the contract model from a decoded tree.
fn build_document(raw: Value) -> Result<ContractDocument, ContractError> {
    let root = raw
        .as_object()
        .ok_or_else(|| ContractError::Invalid("contract root must be an object".to_string()))?;
    let version = read_version(root)?;
    let mut builder = DocumentBuilder {
        raw: &raw,
        family: version.family,
        diagnostics: Vec::new(),
    };
    let info = root.get("info").and_then(Value::as_object).map(|info| Info {
        title: scalar_string(info.get("title")),
        version: scalar_string(info.get("version")),
    });
    let servers = builder.servers(root);
    let schemas = builder.schema_table(root);
    let security_schemes = builder.security_schemes(root);
    let security = root.get("security").map(parse_security).unwrap_or_default();
    let (paths, operations) = builder.paths(root);
    let diagnostics = builder.diagnostics;

    let mut document = ContractDocument {
        version,
        info,
        servers,
        paths,
        operations,
        schemas,
        security_schemes,
        security,
        diagnostics,
        summary: ContractSummary::default(),
        raw: Value::Null,
    };
    document.summary = enrich(&document);
    document.raw = raw;
    Ok(document)
}

/// Reads and whitelists the declared specification version.
fn read_version(root: &Map<String, Value>) -> Result<SpecVersion, ContractError> {
    let raw = scalar_string(root.get("openapi"))
        .or_else(|| scalar_string(root.get("swagger")))
        .ok_or_else(|| {
            ContractError::Invalid("missing openapi or swagger version marker".to_string())
        })?;
    let family = match raw.as_str() {
        "2.0" => SpecFamily::Swagger2,
        "3.0.0" | "3.0.1" | "3.0.2" | "3.0.3" => SpecFamily::OpenApi30,
        "3.1.0" | "3.1.1" => SpecFamily::OpenApi31,
        _ => {
            return Err(ContractError::UnsupportedVersion {
                found: raw,
                supported: SUPPORTED_VERSIONS.join(", "),
            });
        }
    };
    Ok(SpecVersion {
        raw,
        family,
    })
}

/// Computes aggregate metadata for planning and reporting.
#[must_use]
pub fn enrich(document: &ContractDocument) -> ContractSummary {
    ContractSummary {
        path_count: document.paths.len(),
        operation_count: document.operations.len(),
        methods: document.operations.iter().map(|operation| operation.method).collect(),
        tags: document.operations.iter().flat_map(|operation| operation.tags.iter().cloned()).collect(),
        schema_names: document.schemas.keys().cloned().collect(),
        security_schemes: document.security_schemes.iter().map(|scheme| scheme.name.clone()).collect(),
    }
}

/// Accumulates diagnostics while walking the raw document.
struct DocumentBuilder<'a> {
    /// Raw document used for `$ref` resolution.
    raw: &'a Value,
    /// Specification family controlling table locations.
    family: SpecFamily,
    /// Diagnostics collected so far.
    diagnostics: Vec<Diagnostic>,
}

impl DocumentBuilder<'_> {
    /// Records a diagnostic.
    fn diagnose(&mut self, scope: DiagnosticScope, pointer: String, message: impl Into<String>) {
        self.diagnostics.push(Diagnostic {
            scope,
            pointer,
            message: message.into(),
        });
    }

    /// Collects server base URLs.
    fn servers(&self, root: &Map<String, Value>) -> Vec<String> {
        if self.family == SpecFamily::Swagger2 {
            let Some(host) = root.get("host").and_then(Value::as_str) else {
                return Vec::new();
            };
            let scheme = root
                .get("schemes")
                .and_then(Value::as_array)
                .and_then(|schemes| schemes.first())
                .and_then(Value::as_str)
                .unwrap_or("https");
            let base_path = root.get("basePath").and_then(Value::as_str).unwrap_or("");
            return vec![format!("{scheme}://{host}{}", base_path.trim_end_matches('/'))];
        }
        root.get("servers")
            .and_then(Value::as_array)
            .map(|servers| {
                servers
                    .iter()
                    .filter_map(|server| server.get("url").and_then(Value::as_str))
                    .map(|url| url.trim_end_matches('/').to_string())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Returns the component schema table.
    fn schema_table(&self, root: &Map<String, Value>) -> Map<String, Value> {
        let table = if self.family == SpecFamily::Swagger2 {
            root.get("definitions")
        } else {
            root.get("components").and_then(|components| components.get("schemas"))
        };
        table.and_then(Value::as_object).cloned().unwrap_or_default()
    }

    /// Parses the security scheme table.
    fn security_schemes(&mut self, root: &Map<String, Value>) -> Vec<SecurityScheme> {
        let (table, pointer) = if self.family == SpecFamily::Swagger2 {
            (root.get("securityDefinitions"), "/securityDefinitions")
        } else {
            (
                root.get("components").and_then(|components| components.get("securitySchemes")),
                "/components/securitySchemes",
            )
        };
        let Some(table) = table.and_then(Value::as_object) else {
            return Vec::new();
        };
        let mut schemes = Vec::with_capacity(table.len());
        for (name, value) in table {
            match value.as_object() {
                Some(scheme) => schemes.push(SecurityScheme {
                    name: name.clone(),
                    kind: scheme_kind(scheme),
                }),
                None => self.diagnose(
                    DiagnosticScope::Component,
                    format!("{pointer}/{}", escape_pointer(name)),
                    "security scheme must be an object",
                ),
            }
        }
        schemes
    }

    /// Walks the path table into path entries and operations.
    fn paths(&mut self, root: &Map<String, Value>) -> (Vec<PathEntry>, Vec<Operation>) {
        let mut entries = Vec::new();
        let mut operations = Vec::new();
        let Some(paths) = root.get("paths").and_then(Value::as_object) else {
            return (entries, operations);
        };
        for (path, item) in paths {
            let pointer = format!("/paths/{}", escape_pointer(path));
            let mut entry = PathEntry {
                path: path.clone(),
                operations: Vec::new(),
            };
            let Some(item) = item.as_object() else {
                self.diagnose(DiagnosticScope::Path, pointer, "path item must be an object");
                entries.push(entry);
                continue;
            };
            let shared = self.parameters(item.get("parameters"), &pointer);
            for (key, value) in item {
                let Some(method) = HttpMethod::from_key(key) else {
                    continue;
                };
                let op_pointer = format!("{pointer}/{key}");
                let Some(body) = value.as_object() else {
                    self.diagnose(DiagnosticScope::Operation, op_pointer, "operation must be an object");
                    continue;
                };
                let index = operations.len();
                let operation = self.operation(index, method, path, body, &shared, &op_pointer);
                entry.operations.push(index);
                operations.push(operation);
            }
            entries.push(entry);
        }
        (entries, operations)
    }

    /// Builds a single operation.
    fn operation(
        &mut self,
        index: usize,
        method: HttpMethod,
        path: &str,
        body: &Map<String, Value>,
        shared: &[ParsedParameter],
        pointer: &str,
    ) -> Operation {
        let own = self.parameters(body.get("parameters"), pointer);
        let mut merged: Vec<ParsedParameter> = Vec::with_capacity(shared.len() + own.len());
        for parameter in shared.iter().chain(own.iter()) {
            merged.retain(|existing| !existing.same_slot(parameter));
            merged.push(parameter.clone());
        }
        let mut parameters = Vec::new();
        let mut request_body = None;
        for parsed in merged {
            match parsed {
                ParsedParameter::Regular(parameter) => parameters.push(parameter),
                ParsedParameter::Body(body) => request_body = Some(body),
            }
        }
        if self.family != SpecFamily::Swagger2
            && let Some(value) = body.get("requestBody")
        {
            request_body = self.request_body(value, &format!("{pointer}/requestBody"));
        }
        let declares_responses = body.contains_key("responses");
        let responses = body
            .get("responses")
            .map(|value| self.responses(value, &format!("{pointer}/responses")))
            .unwrap_or_default();
        Operation {
            index,
            method,
            path: path.to_string(),
            operation_id: body.get("operationId").and_then(Value::as_str).map(str::to_string),
            summary: body.get("summary").and_then(Value::as_str).map(str::to_string),
            tags: body
                .get("tags")
                .and_then(Value::as_array)
                .map(|tags| tags.iter().filter_map(Value::as_str).map(str::to_string).collect())
                .unwrap_or_default(),
            parameters,
            request_body,
            responses,
            security: body.get("security").map(parse_security),
            declares_responses,
        }
    }

    /// Parses a parameter list.
    fn parameters(&mut self, value: Option<&Value>, pointer: &str) -> Vec<ParsedParameter> {
        let Some(items) = value.and_then(Value::as_array) else {
            return Vec::new();
        };
        let mut parsed = Vec::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            let item_pointer = format!("{pointer}/parameters/{position}");
            let Some(item) = deref(self.raw, item).and_then(Value::as_object) else {
                self.diagnose(DiagnosticScope::Operation, item_pointer, "parameter cannot be resolved");
                continue;
            };
            let name = item.get("name").and_then(Value::as_str);
            let location = item.get("in").and_then(Value::as_str);
            let (Some(name), Some(location)) = (name, location) else {
                self.diagnose(DiagnosticScope::Operation, item_pointer, "parameter missing name or location");
                continue;
            };
            let required = item.get("required").and_then(Value::as_bool).unwrap_or(false);
            if location == "body" {
                parsed.push(ParsedParameter::Body(RequestBody {
                    required,
                    content_type: JSON_MEDIA_TYPE.to_string(),
                    schema: item.get("schema").cloned().unwrap_or(Value::Null),
                }));
                continue;
            }
            let Some(location) = ParameterLocation::from_key(location) else {
                self.diagnose(
                    DiagnosticScope::Operation,
                    item_pointer,
                    format!("unknown parameter location {location}"),
                );
                continue;
            };
            let schema = item
                .get("schema")
                .cloned()
                .or_else(|| item.get("content").and_then(first_media_schema).cloned())
                .unwrap_or_else(|| inline_parameter_schema(item));
            parsed.push(ParsedParameter::Regular(Parameter {
                name: name.to_string(),
                location,
                required: required || location == ParameterLocation::Path,
                schema,
                example: item.get("example").cloned(),
            }));
        }
        parsed
    }

    /// Parses an `OpenAPI` 3 request body.
    fn request_body(&mut self, value: &Value, pointer: &str) -> Option<RequestBody> {
        let Some(body) = deref(self.raw, value).and_then(Value::as_object) else {
            self.diagnose(DiagnosticScope::Operation, pointer.to_string(), "request body cannot be resolved");
            return None;
        };
        let content = body.get("content").and_then(Value::as_object);
        let (content_type, schema) = content
            .and_then(pick_media)
            .map(|(media, entry)| {
                (media.to_string(), entry.get("schema").cloned().unwrap_or(Value::Null))
            })
            .unwrap_or_else(|| (JSON_MEDIA_TYPE.to_string(), Value::Null));
        Some(RequestBody {
            required: body.get("required").and_then(Value::as_bool).unwrap_or(false),
            content_type,
            schema,
        })
    }

    /// Parses a response table.
    fn responses(&mut self, value: &Value, pointer: &str) -> Vec<ResponseSpec> {
        let Some(table) = value.as_object() else {
            self.diagnose(DiagnosticScope::Operation, pointer.to_string(), "responses must be an object");
            return Vec::new();
        };
        let mut responses = Vec::with_capacity(table.len());
        for (key, entry) in table {
            let entry_pointer = format!("{pointer}/{}", escape_pointer(key));
            let Some(status) = ResponseStatus::from_key(key) else {
                if !key.starts_with("x-") {
                    self.diagnose(DiagnosticScope::Operation, entry_pointer, format!("unrecognized response key {key}"));
                }
                continue;
            };
            let Some(entry) = deref(self.raw, entry).and_then(Value::as_object) else {
                self.diagnose(DiagnosticScope::Operation, entry_pointer, "response cannot be resolved");
                continue;
            };
            let (content_type, schema) = if self.family == SpecFamily::Swagger2 {
                let schema = entry.get("schema").cloned();
                (schema.as_ref().map(|_| JSON_MEDIA_TYPE.to_string()), schema)
            } else {
                entry
                    .get("content")
                    .and_then(Value::as_object)
                    .and_then(pick_media)
                    .map_or((None, None), |(media, media_entry)| {
                        (Some(media.to_string()), media_entry.get("schema").cloned())
                    })
            };
            responses.push(ResponseSpec {
                status,
                description: entry.get("description").and_then(Value::as_str).map(str::to_string),
                content_type,
                schema,
            });
        }
        responses
    }
}

/// Parameter entry before body extraction.
#[derive(Debug, Clone)]
enum ParsedParameter {
    /// Regular parameter.
    Regular(Parameter),
    /// Swagger 2.0 `in: body` parameter.
    Body(RequestBody),
}

impl ParsedParameter {
    /// Returns true when both entries occupy the same `(name, location)` slot.
    fn same_slot(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Regular(lhs), Self::Regular(rhs)) => {
                lhs.name == rhs.name && lhs.location == rhs.location
            }
            (Self::Body(_), Self::Body(_)) => true,
            _ => false,
        }
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Reads a string or number scalar as text.
fn scalar_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

/// Follows a local `$ref` on a non-schema object (parameters, bodies, responses).
fn deref<'v>(raw: &'v Value, value: &'v Value) -> Option<&'v Value> {
    let mut current = value;
    for _ in 0 .. 8 {
        match current.get("$ref").and_then(Value::as_str) {
            Some(reference) => {
                current = reference.strip_prefix('#').and_then(|ptr| raw.pointer(ptr))?;
            }
            None => return Some(current),
        }
    }
    None
}

/// Escapes a key for use inside a JSON pointer.
fn escape_pointer(key: &str) -> String {
    key.replace('~', "~0").replace('/', "~1")
}

/// Chooses the JSON media entry of a content table, else the first entry.
fn pick_media(content: &Map<String, Value>) -> Option<(&str, &Value)> {
    content
        .get_key_value(JSON_MEDIA_TYPE)
        .or_else(|| content.iter().find(|(media, _)| media.contains("json")))
        .or_else(|| content.iter().next())
        .map(|(media, entry)| (media.as_str(), entry))
}

/// Returns the schema of the preferred media entry.
fn first_media_schema(content: &Value) -> Option<&Value> {
    content.as_object().and_then(pick_media).and_then(|(_, entry)| entry.get("schema"))
}

/// Builds a schema from a Swagger 2.0 inline parameter definition.
fn inline_parameter_schema(item: &Map<String, Value>) -> Value {
    let mut schema = Map::new();
    for (key, value) in item {
        if !matches!(key.as_str(), "name" | "in" | "required" | "description" | "example") {
            schema.insert(key.clone(), value.clone());
        }
    }
    Value::Object(schema)
}

/// Parses a security requirement list.
fn parse_security(value: &Value) -> Vec<SecurityRequirement> {
    value
        .as_array()
        .map(|alternatives| {
            alternatives
                .iter()
                .filter_map(Value::as_object)
                .map(|alternative| SecurityRequirement {
                    schemes: alternative
                        .iter()
                        .map(|(name, scopes)| {
                            let scopes = scopes
                                .as_array()
                                .map(|scopes| scopes.iter().filter_map(Value::as_str).map(str::to_string).collect())
                                .unwrap_or_default();
                            (name.clone(), scopes)
                        })
                        .collect(),
                })
                .collect()
        })
        .unwrap_or_default()
}

/// Classifies a security scheme definition.
fn scheme_kind(scheme: &Map<String, Value>) -> SecuritySchemeKind {
    let declared = scheme.get("type").and_then(Value::as_str).unwrap_or_default();
    match declared {
        "http" => {
            let http = scheme.get("scheme").and_then(Value::as_str).unwrap_or_default();
            if http.eq_ignore_ascii_case("bearer") {
                SecuritySchemeKind::Bearer
            } else if http.eq_ignore_ascii_case("basic") {
                SecuritySchemeKind::Basic
            } else {
                SecuritySchemeKind::Other {
                    declared: format!("http/{http}"),
                }
            }
        }
        "basic" => SecuritySchemeKind::Basic,
        "apiKey" => {
            let location = match scheme.get("in").and_then(Value::as_str) {
                Some("query") => ApiKeyLocation::Query,
                Some("cookie") => ApiKeyLocation::Cookie,
                _ => ApiKeyLocation::Header,
            };
            SecuritySchemeKind::ApiKey {
                name: scheme.get("name").and_then(Value::as_str).map(str::to_string),
                location,
            }
        }
        "oauth2" => SecuritySchemeKind::OAuth2,
        "openIdConnect" => SecuritySchemeKind::OpenIdConnect,
        other => SecuritySchemeKind::Other {
            declared: other.to_string(),
        },
    }
}

#[cfg(test)]
mod tests;
