// crates/suitegen-contract/src/model.rs
// ============================================================================
// Module: Contract Model
// Description: Immutable in-memory model of an API contract document.
// Purpose: Give planning and synthesis a typed, order-preserving view.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! The contract model is produced once by the loader and never mutated
//! afterwards. Declaration order of paths, methods, responses, and schema
//! properties is preserved so downstream output is diff-stable.
//!
//! Schemas stay as raw JSON fragments; `$ref` pointers are resolved lazily
//! against the raw document through [`ContractDocument::resolve_schema`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;
use std::fmt;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Server URL used when the contract declares none.
pub const DEFAULT_SERVER_URL: &str = "http://localhost";

/// Maximum `$ref` hops followed before a reference is treated as dangling.
const MAX_REF_HOPS: usize = 16;

/// Empty schema returned for dangling or cyclic references.
static EMPTY_SCHEMA: Value = Value::Null;

// ============================================================================
// SECTION: HTTP Methods
// ============================================================================

/// HTTP methods an operation can be declared under.
///
/// # Invariants
/// - Variants map one-to-one onto the lowercase path-item keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HttpMethod {
    /// `GET`.
    Get,
    /// `PUT`.
    Put,
    /// `POST`.
    Post,
    /// `DELETE`.
    Delete,
    /// `OPTIONS`.
    Options,
    /// `HEAD`.
    Head,
    /// `PATCH`.
    Patch,
    /// `TRACE`.
    Trace,
}

impl HttpMethod {
    /// Parses a path-item key into a method (returns `None` for non-method keys).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "get" => Some(Self::Get),
            "put" => Some(Self::Put),
            "post" => Some(Self::Post),
            "delete" => Some(Self::Delete),
            "options" => Some(Self::Options),
            "head" => Some(Self::Head),
            "patch" => Some(Self::Patch),
            "trace" => Some(Self::Trace),
            _ => None,
        }
    }

    /// Returns the lowercase path-item key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Put => "put",
            Self::Post => "post",
            Self::Delete => "delete",
            Self::Options => "options",
            Self::Head => "head",
            Self::Patch => "patch",
            Self::Trace => "trace",
        }
    }

    /// Returns the uppercase wire name.
    #[must_use]
    pub const fn as_upper(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
            Self::Options => "OPTIONS",
            Self::Head => "HEAD",
            Self::Patch => "PATCH",
            Self::Trace => "TRACE",
        }
    }

    /// Success status assumed when the contract declares no 2xx response.
    #[must_use]
    pub const fn default_success_status(self) -> u16 {
        match self {
            Self::Post => 201,
            Self::Delete => 204,
            Self::Get | Self::Put | Self::Patch | Self::Head | Self::Options | Self::Trace => 200,
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_upper())
    }
}

// ============================================================================
// SECTION: Document Metadata
// ============================================================================

/// Contract specification family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecFamily {
    /// Swagger 2.0.
    Swagger2,
    /// `OpenAPI` 3.0.x.
    OpenApi30,
    /// `OpenAPI` 3.1.x.
    OpenApi31,
}

/// Declared contract version.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpecVersion {
    /// Version string exactly as declared.
    pub raw: String,
    /// Specification family derived from the version.
    pub family: SpecFamily,
}

/// The `info` block of a contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Info {
    /// API title.
    pub title: Option<String>,
    /// API version (not the specification version).
    pub version: Option<String>,
}

/// Scope of a lenient-parse diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticScope {
    /// A path item could not be interpreted.
    Path,
    /// An operation could not be interpreted.
    Operation,
    /// A component entry could not be interpreted.
    Component,
}

/// Structural problem recorded by the lenient parser.
///
/// # Invariants
/// - `pointer` is a JSON pointer into the raw document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Part of the document the problem belongs to.
    pub scope: DiagnosticScope,
    /// JSON pointer to the offending node.
    pub pointer: String,
    /// Human-readable description.
    pub message: String,
}

// ============================================================================
// SECTION: Operations
// ============================================================================

/// Location of an operation parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParameterLocation {
    /// Templated path segment.
    Path,
    /// Query string.
    Query,
    /// Request header.
    Header,
    /// Cookie.
    Cookie,
    /// Form field (Swagger 2.0 `formData`).
    Form,
}

impl ParameterLocation {
    /// Parses an `in` value.
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        match key {
            "path" => Some(Self::Path),
            "query" => Some(Self::Query),
            "header" => Some(Self::Header),
            "cookie" => Some(Self::Cookie),
            "formData" => Some(Self::Form),
            _ => None,
        }
    }

    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Path => "path",
            Self::Query => "query",
            Self::Header => "header",
            Self::Cookie => "cookie",
            Self::Form => "form",
        }
    }
}

/// Operation parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameter {
    /// Parameter name.
    pub name: String,
    /// Parameter location.
    pub location: ParameterLocation,
    /// True when the parameter must be supplied.
    pub required: bool,
    /// Schema fragment (may be `$ref`).
    pub schema: Value,
    /// Parameter-level example, when declared.
    pub example: Option<Value>,
}

/// Operation request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequestBody {
    /// True when the body must be supplied.
    pub required: bool,
    /// Media type the schema was taken from.
    pub content_type: String,
    /// Body schema fragment (may be `$ref`).
    pub schema: Value,
}

/// Response key of a declared response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "value")]
pub enum ResponseStatus {
    /// Concrete status code.
    Code(u16),
    /// Status range (`4XX`), stored as its lowest code.
    Range(u16),
    /// The `default` response.
    Default,
}

impl ResponseStatus {
    /// Parses a response key (returns `None` for unrecognized keys).
    #[must_use]
    pub fn from_key(key: &str) -> Option<Self> {
        if key == "default" {
            return Some(Self::Default);
        }
        let upper = key.to_ascii_uppercase();
        if let Some(prefix) = upper.strip_suffix("XX")
            && let Ok(class) = prefix.parse::<u16>()
            && (1 ..= 5).contains(&class)
        {
            return Some(Self::Range(class * 100));
        }
        match key.parse::<u16>() {
            Ok(code) if (100 ..= 599).contains(&code) => Some(Self::Code(code)),
            _ => None,
        }
    }

    /// Returns the representative status code (`None` for `default`).
    #[must_use]
    pub const fn code(self) -> Option<u16> {
        match self {
            Self::Code(code) | Self::Range(code) => Some(code),
            Self::Default => None,
        }
    }

    /// Returns true for 2xx statuses.
    #[must_use]
    pub const fn is_success(self) -> bool {
        matches!(self.code(), Some(200 ..= 299))
    }
}

/// Declared response of an operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseSpec {
    /// Parsed response key.
    pub status: ResponseStatus,
    /// Response description.
    pub description: Option<String>,
    /// Media type the schema was taken from.
    pub content_type: Option<String>,
    /// Response schema fragment (may be `$ref`).
    pub schema: Option<Value>,
}

/// One alternative of a security requirement list.
///
/// # Invariants
/// - All listed schemes must be satisfied together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityRequirement {
    /// Scheme names with required scopes, in declaration order.
    pub schemes: Vec<(String, Vec<String>)>,
}

/// API key location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiKeyLocation {
    /// Request header.
    Header,
    /// Query string.
    Query,
    /// Cookie.
    Cookie,
}

/// Security scheme type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "type")]
pub enum SecuritySchemeKind {
    /// HTTP bearer authentication.
    Bearer,
    /// HTTP basic authentication.
    Basic,
    /// API key sent in a header, query parameter, or cookie.
    ApiKey {
        /// Parameter name, when declared.
        name: Option<String>,
        /// Parameter location.
        location: ApiKeyLocation,
    },
    /// `OAuth2` flows (bearer tokens on the wire).
    OAuth2,
    /// `OpenID` Connect (bearer tokens on the wire).
    OpenIdConnect,
    /// Unrecognized scheme type.
    Other {
        /// Declared type string.
        declared: String,
    },
}

/// Named security scheme.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityScheme {
    /// Scheme name as referenced by requirements.
    pub name: String,
    /// Scheme type.
    pub kind: SecuritySchemeKind,
}

/// One `(method, path)` unit of the contract.
///
/// # Invariants
/// - `index` is the position in [`ContractDocument::operations`] (declaration order).
/// - `security` is `None` when the operation inherits the document requirement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Operation {
    /// Declaration index.
    pub index: usize,
    /// HTTP method.
    pub method: HttpMethod,
    /// Path template.
    pub path: String,
    /// Declared `operationId`.
    pub operation_id: Option<String>,
    /// Declared summary.
    pub summary: Option<String>,
    /// Declared tags.
    pub tags: Vec<String>,
    /// Path-level and operation-level parameters (operation overrides path).
    pub parameters: Vec<Parameter>,
    /// Request body, when declared.
    pub request_body: Option<RequestBody>,
    /// Declared responses in declaration order.
    pub responses: Vec<ResponseSpec>,
    /// Operation-level security override.
    pub security: Option<Vec<SecurityRequirement>>,
    /// True when the `responses` key was present.
    pub declares_responses: bool,
}

impl Operation {
    /// Returns the stable `METHOD path` key.
    #[must_use]
    pub fn key(&self) -> String {
        format!("{} {}", self.method.as_upper(), self.path)
    }

    /// Returns declared 2xx responses ordered by status code.
    #[must_use]
    pub fn success_responses(&self) -> Vec<&ResponseSpec> {
        let mut responses: Vec<&ResponseSpec> =
            self.responses.iter().filter(|response| response.status.is_success()).collect();
        responses.sort_by_key(|response| response.status.code());
        responses
    }

    /// Returns declared non-2xx responses with a status code, ordered by code.
    #[must_use]
    pub fn error_responses(&self) -> Vec<&ResponseSpec> {
        let mut responses: Vec<&ResponseSpec> = self
            .responses
            .iter()
            .filter(|response| response.status.code().is_some() && !response.status.is_success())
            .collect();
        responses.sort_by_key(|response| response.status.code());
        responses
    }

    /// Returns the lowest declared 2xx status, falling back to the method default.
    #[must_use]
    pub fn primary_success_status(&self) -> u16 {
        self.success_responses()
            .first()
            .and_then(|response| response.status.code())
            .unwrap_or_else(|| self.method.default_success_status())
    }

    /// Returns true when the given status is declared.
    #[must_use]
    pub fn declares_status(&self, status: u16) -> bool {
        self.responses.iter().any(|response| response.status.code() == Some(status))
    }

    /// Returns the parameters declared at the given location.
    pub fn parameters_in(&self, location: ParameterLocation) -> impl Iterator<Item = &Parameter> {
        self.parameters.iter().filter(move |parameter| parameter.location == location)
    }
}

/// Returns the `{name}` template parameters of a path in order.
///
/// Returns `None` when braces are unbalanced, nested, or enclose an empty name.
#[must_use]
pub fn template_parameters(path: &str) -> Option<Vec<&str>> {
    let mut names = Vec::new();
    let mut rest = path;
    while let Some(open) = rest.find(['{', '}']) {
        if rest[open ..].starts_with('}') {
            return None;
        }
        let after = &rest[open + 1 ..];
        let close = after.find(['{', '}'])?;
        if after[close ..].starts_with('{') || close == 0 {
            return None;
        }
        names.push(&after[.. close]);
        rest = &after[close + 1 ..];
    }
    Some(names)
}

// ============================================================================
// SECTION: Document
// ============================================================================

/// Declared path with the operations it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathEntry {
    /// Path template.
    pub path: String,
    /// Indices into [`ContractDocument::operations`].
    pub operations: Vec<usize>,
}

/// Aggregate metadata computed by the enrichment pass.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractSummary {
    /// Number of declared paths.
    pub path_count: usize,
    /// Number of parsed operations.
    pub operation_count: usize,
    /// Methods in use.
    pub methods: BTreeSet<HttpMethod>,
    /// Tags in use.
    pub tags: BTreeSet<String>,
    /// Component schema names.
    pub schema_names: BTreeSet<String>,
    /// Security scheme names.
    pub security_schemes: BTreeSet<String>,
}

/// Validated, enriched in-memory contract.
///
/// # Invariants
/// - `version` is within the supported whitelist.
/// - Built once per run; read-only afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractDocument {
    /// Declared specification version.
    pub version: SpecVersion,
    /// `info` block; `None` when missing or not an object.
    pub info: Option<Info>,
    /// Server base URLs in declaration order.
    pub servers: Vec<String>,
    /// Declared paths in declaration order.
    pub paths: Vec<PathEntry>,
    /// All operations in declaration order.
    pub operations: Vec<Operation>,
    /// Component schemas keyed by name (declaration order).
    pub schemas: Map<String, Value>,
    /// Security schemes in declaration order.
    pub security_schemes: Vec<SecurityScheme>,
    /// Document-level security requirement.
    pub security: Vec<SecurityRequirement>,
    /// Lenient-parse diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Enrichment metadata.
    pub summary: ContractSummary,
    /// Raw document used for `$ref` resolution.
    pub raw: Value,
}

impl ContractDocument {
    /// Returns the first declared server URL or [`DEFAULT_SERVER_URL`].
    #[must_use]
    pub fn primary_server(&self) -> &str {
        self.servers.first().map_or(DEFAULT_SERVER_URL, String::as_str)
    }

    /// Resolves a local `$ref` pointer against the raw document.
    #[must_use]
    pub fn resolve_ref(&self, reference: &str) -> Option<&Value> {
        let pointer = reference.strip_prefix('#')?;
        self.raw.pointer(pointer)
    }

    /// Follows `$ref` chains; dangling or cyclic references yield `null`.
    #[must_use]
    pub fn resolve_schema<'a>(&'a self, schema: &'a Value) -> &'a Value {
        let mut current = schema;
        for _ in 0 .. MAX_REF_HOPS {
            match current.get("$ref").and_then(Value::as_str) {
                Some(reference) => match self.resolve_ref(reference) {
                    Some(target) => current = target,
                    None => return &EMPTY_SCHEMA,
                },
                None => return current,
            }
        }
        &EMPTY_SCHEMA
    }

    /// Returns the component name a `$ref` points at, when it targets a schema table.
    #[must_use]
    pub fn schema_ref_name(schema: &Value) -> Option<&str> {
        let reference = schema.get("$ref")?.as_str()?;
        reference
            .strip_prefix("#/components/schemas/")
            .or_else(|| reference.strip_prefix("#/definitions/"))
    }

    /// Returns the security requirement in force for an operation.
    #[must_use]
    pub fn effective_security<'a>(&'a self, operation: &'a Operation) -> &'a [SecurityRequirement] {
        operation.security.as_deref().unwrap_or(&self.security)
    }

    /// Looks up a security scheme by name.
    #[must_use]
    pub fn security_scheme(&self, name: &str) -> Option<&SecurityScheme> {
        self.security_schemes.iter().find(|scheme| scheme.name == name)
    }
}
