// crates/suitegen-config/src/options.rs
// ============================================================================
// Module: Generation Options
// Description: Options model, TOML loading, and fail-closed validation.
// Purpose: Provide strict option parsing with hard limits.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! Options are loaded from a TOML file with strict size and path limits.
//! Every field has a default, so an empty file is a valid configuration.
//! Invalid values fail closed with [`ConfigError::Invalid`].

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;
use serde::Serialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default options filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "suitegen.toml";
/// Environment variable used to override the options path.
pub const CONFIG_ENV_VAR: &str = "SUITEGEN_CONFIG";
/// Maximum options file size in bytes.
pub const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum worker count.
pub const MAX_WORKERS: usize = 64;
/// Maximum retry attempts for retryable failures.
pub const MAX_RETRY_ATTEMPTS: u32 = 10;
/// Maximum length of an auth profile name.
const MAX_PROFILE_LENGTH: usize = 64;

// ============================================================================
// SECTION: Enumerations
// ============================================================================

/// Test framework the generated suite targets.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestFramework {
    /// Rust integration tests driving `reqwest`.
    #[default]
    Reqwest,
}

/// Depth of synthesized example payloads.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisMode {
    /// Required fields only, empty arrays.
    Minimal,
    /// Required fields only, one-element arrays.
    #[default]
    Typical,
    /// Every declared field, one-element arrays.
    Maximal,
}

impl SynthesisMode {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Minimal => "minimal",
            Self::Typical => "typical",
            Self::Maximal => "maximal",
        }
    }
}

/// How operations are grouped into files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingStrategy {
    /// First declared tag, falling back to the first path segment.
    #[default]
    Tag,
    /// First literal path segment.
    PathSegment,
}

/// Code synthesis strategy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmitterStrategy {
    /// Token-tree construction printed through a formatter.
    #[default]
    Tree,
    /// String templating.
    Template,
}

impl EmitterStrategy {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Template => "template",
        }
    }
}

// ============================================================================
// SECTION: Options
// ============================================================================

/// Options for one generation run.
///
/// # Invariants
/// - A value returned by [`GenerationOptions::load`] has passed [`GenerationOptions::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationOptions {
    /// Target test framework.
    #[serde(default)]
    pub framework: TestFramework,
    /// Directory generated files are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// Embed referenced component schemas as constants.
    #[serde(default)]
    pub include_types: bool,
    /// Embed synthesized response bodies as mock constants.
    #[serde(default)]
    pub generate_mocks: bool,
    /// Prefer schema `example`/`default` values over synthesized ones.
    #[serde(default)]
    pub include_examples: bool,
    /// Abort before synthesis when validation fails.
    #[serde(default)]
    pub strict_mode: bool,
    /// Emit async tests.
    #[serde(default)]
    pub async_mode: bool,
    /// Emit performance scenarios.
    #[serde(default)]
    pub include_performance: bool,
    /// Latency threshold copied into performance scenarios.
    #[serde(default = "default_performance_threshold_ms")]
    pub performance_threshold_ms: u64,
    /// Statuses used for undeclared error scenarios, in preference order.
    #[serde(default = "default_error_status_fallback")]
    pub error_status_fallback: Vec<u16>,
    /// Payload synthesis depth.
    #[serde(default)]
    pub synthesis_mode: SynthesisMode,
    /// File grouping strategy.
    #[serde(default)]
    pub grouping: GroupingStrategy,
    /// Preferred code synthesis strategy.
    #[serde(default)]
    pub emitter: EmitterStrategy,
    /// Base URL override for generated files.
    #[serde(default)]
    pub server_url: Option<String>,
    /// Auth profile whose token variable generated tests read.
    #[serde(default)]
    pub auth_profile: Option<String>,
    /// Header used for API keys that declare no name.
    #[serde(default = "default_api_key_header")]
    pub api_key_header: String,
    /// Scheduler knobs.
    #[serde(default)]
    pub concurrency: ConcurrencyOptions,
    /// Recovery knobs.
    #[serde(default)]
    pub recovery: RecoveryOptions,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            framework: TestFramework::default(),
            output_dir: default_output_dir(),
            include_types: false,
            generate_mocks: false,
            include_examples: false,
            strict_mode: false,
            async_mode: false,
            include_performance: false,
            performance_threshold_ms: default_performance_threshold_ms(),
            error_status_fallback: default_error_status_fallback(),
            synthesis_mode: SynthesisMode::default(),
            grouping: GroupingStrategy::default(),
            emitter: EmitterStrategy::default(),
            server_url: None,
            auth_profile: None,
            api_key_header: default_api_key_header(),
            concurrency: ConcurrencyOptions::default(),
            recovery: RecoveryOptions::default(),
        }
    }
}

impl GenerationOptions {
    /// Loads options from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let resolved = resolve_path(path)?;
        validate_path(&resolved)?;
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::from_toml(content)
    }

    /// Parses and validates options from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let options: Self = toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        options.validate()?;
        Ok(options)
    }

    /// Validates the options for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when options are invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_path_string("output_dir", &self.output_dir.to_string_lossy())?;
        if self.performance_threshold_ms == 0 {
            return Err(ConfigError::Invalid(
                "performance_threshold_ms must be at least 1".to_string(),
            ));
        }
        if self.error_status_fallback.is_empty() {
            return Err(ConfigError::Invalid("error_status_fallback must be non-empty".to_string()));
        }
        if let Some(code) = self.error_status_fallback.iter().find(|code| !(100 ..= 599).contains(*code)) {
            return Err(ConfigError::Invalid(format!(
                "error_status_fallback code {code} must be within 100-599"
            )));
        }
        if let Some(url) = &self.server_url
            && !(url.starts_with("http://") || url.starts_with("https://"))
        {
            return Err(ConfigError::Invalid("server_url must use http or https".to_string()));
        }
        if let Some(profile) = &self.auth_profile {
            validate_profile(profile)?;
        }
        validate_header_name(&self.api_key_header)?;
        self.concurrency.validate()?;
        self.recovery.validate()?;
        Ok(())
    }

    /// Returns the environment variable generated tests read credentials from.
    #[must_use]
    pub fn auth_env_var(&self) -> String {
        self.auth_profile.as_deref().map_or_else(
            || "SUITEGEN_AUTH_TOKEN".to_string(),
            |profile| {
                let normalized: String = profile
                    .chars()
                    .map(|ch| if ch == '-' { '_' } else { ch.to_ascii_uppercase() })
                    .collect();
                format!("SUITEGEN_{normalized}_TOKEN")
            },
        )
    }
}

/// Scheduler configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConcurrencyOptions {
    /// Worker thread count.
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    /// Upper bound on operations per batch.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Memory budget in megabytes.
    #[serde(default = "default_memory_threshold_mb")]
    pub memory_threshold_mb: u64,
    /// Operations per streaming chunk.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    /// Per-batch timeout in milliseconds.
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Estimated memory per operation in kilobytes.
    #[serde(default = "default_per_operation_memory_kb")]
    pub per_operation_memory_kb: u64,
    /// Flush results chunk by chunk.
    #[serde(default)]
    pub streaming: bool,
    /// Reuse results of identical batches.
    #[serde(default = "default_cache_enabled")]
    pub cache_enabled: bool,
    /// Contracts with at most this many operations bypass the worker pool.
    #[serde(default = "default_direct_threshold")]
    pub direct_threshold: usize,
}

impl Default for ConcurrencyOptions {
    fn default() -> Self {
        Self {
            max_workers: default_max_workers(),
            batch_size: default_batch_size(),
            memory_threshold_mb: default_memory_threshold_mb(),
            chunk_size: default_chunk_size(),
            timeout_ms: default_timeout_ms(),
            per_operation_memory_kb: default_per_operation_memory_kb(),
            streaming: false,
            cache_enabled: default_cache_enabled(),
            direct_threshold: default_direct_threshold(),
        }
    }
}

impl ConcurrencyOptions {
    /// Validates scheduler configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 || self.max_workers > MAX_WORKERS {
            return Err(ConfigError::Invalid(format!(
                "concurrency.max_workers must be within 1-{MAX_WORKERS}"
            )));
        }
        if self.batch_size == 0 {
            return Err(ConfigError::Invalid("concurrency.batch_size must be at least 1".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(ConfigError::Invalid("concurrency.chunk_size must be at least 1".to_string()));
        }
        if self.timeout_ms == 0 {
            return Err(ConfigError::Invalid("concurrency.timeout_ms must be at least 1".to_string()));
        }
        if self.memory_threshold_mb == 0 {
            return Err(ConfigError::Invalid(
                "concurrency.memory_threshold_mb must be at least 1".to_string(),
            ));
        }
        if self.per_operation_memory_kb == 0 {
            return Err(ConfigError::Invalid(
                "concurrency.per_operation_memory_kb must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Returns the memory budget in bytes.
    #[must_use]
    pub const fn memory_budget_bytes(&self) -> u64 {
        self.memory_threshold_mb.saturating_mul(1024 * 1024)
    }
}

/// Recovery configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RecoveryOptions {
    /// Attempts for retryable categories.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
    /// Delay between retries in milliseconds.
    #[serde(default = "default_retry_delay_ms")]
    pub retry_delay_ms: u64,
}

impl Default for RecoveryOptions {
    fn default() -> Self {
        Self {
            retry_attempts: default_retry_attempts(),
            retry_delay_ms: default_retry_delay_ms(),
        }
    }
}

impl RecoveryOptions {
    /// Validates recovery configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.retry_attempts > MAX_RETRY_ATTEMPTS {
            return Err(ConfigError::Invalid(format!(
                "recovery.retry_attempts must be at most {MAX_RETRY_ATTEMPTS}"
            )));
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Options loading or validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// I/O failure while reading options.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid option values.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the options path from the caller or environment defaults.
fn resolve_path(path: Option<&Path>) -> Result<PathBuf, ConfigError> {
    if let Some(path) = path {
        return Ok(path.to_path_buf());
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR) {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok(PathBuf::from(env_path));
    }
    Ok(PathBuf::from(DEFAULT_CONFIG_NAME))
}

/// Validates the resolved path against length limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path-valued option against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates an auth profile name.
fn validate_profile(profile: &str) -> Result<(), ConfigError> {
    if profile.is_empty() || profile.len() > MAX_PROFILE_LENGTH {
        return Err(ConfigError::Invalid(format!(
            "auth_profile must be 1-{MAX_PROFILE_LENGTH} characters"
        )));
    }
    if !profile.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
        return Err(ConfigError::Invalid(
            "auth_profile may only contain ascii letters, digits, '_' and '-'".to_string(),
        ));
    }
    Ok(())
}

/// Validates an HTTP header name (RFC 9110 token).
fn validate_header_name(name: &str) -> Result<(), ConfigError> {
    let valid = !name.is_empty()
        && name.bytes().all(|byte| byte.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&byte));
    if valid {
        Ok(())
    } else {
        Err(ConfigError::Invalid("api_key_header must be a valid header name".to_string()))
    }
}

/// Default output directory.
fn default_output_dir() -> PathBuf {
    PathBuf::from("generated-tests")
}

/// Default performance threshold.
const fn default_performance_threshold_ms() -> u64 {
    1_000
}

/// Default fallback statuses for undeclared error scenarios.
fn default_error_status_fallback() -> Vec<u16> {
    vec![400, 401, 422, 500]
}

/// Default API key header.
fn default_api_key_header() -> String {
    "X-API-Key".to_string()
}

/// Default worker count.
const fn default_max_workers() -> usize {
    4
}

/// Default batch size.
const fn default_batch_size() -> usize {
    10
}

/// Default memory budget.
const fn default_memory_threshold_mb() -> u64 {
    512
}

/// Default streaming chunk size.
const fn default_chunk_size() -> usize {
    100
}

/// Default batch timeout.
const fn default_timeout_ms() -> u64 {
    30_000
}

/// Default per-operation memory estimate.
const fn default_per_operation_memory_kb() -> u64 {
    1_024
}

/// Default cache toggle.
const fn default_cache_enabled() -> bool {
    true
}

/// Default direct-processing threshold.
const fn default_direct_threshold() -> usize {
    50
}

/// Default retry attempts.
const fn default_retry_attempts() -> u32 {
    3
}

/// Default retry delay.
const fn default_retry_delay_ms() -> u64 {
    100
}
