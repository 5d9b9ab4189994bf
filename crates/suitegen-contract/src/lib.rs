// crates/suitegen-contract/src/lib.rs
// ============================================================================
// Module: Suitegen Contract Library
// Description: Contract parsing, validation, and enrichment for API documents.
// Purpose: Provide the immutable contract model consumed by test synthesis.
// Dependencies: serde, serde_json, serde_yaml, thiserror, tracing
// ============================================================================

//! ## Overview
//! `suitegen-contract` turns raw `OpenAPI` 3.x or Swagger 2.0 bytes into a
//! [`ContractDocument`]: an immutable, order-preserving model of paths,
//! operations, schemas, and security schemes. The document is built once per
//! run and shared read-only by every later stage.
//!
//! Security posture: contract documents are untrusted input. The loader
//! enforces a hard size limit and fails closed on unreadable input or
//! unsupported versions; everything below the document level is parsed
//! leniently and reported through diagnostics instead.
//!
//! ## Index
//! - Loading: [`parse`], [`load_contract`], [`FormatHint`]
//! - Validation: [`validate`], [`ValidationResult`]
//! - Model: [`ContractDocument`], [`Operation`], [`HttpMethod`]

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod loader;
pub mod model;
pub mod validator;

// ============================================================================
// SECTION: Errors
// ============================================================================

use thiserror::Error;

/// Errors raised while loading a contract document.
///
/// # Invariants
/// - Variant meanings are stable for recovery classification and tests.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContractError {
    /// IO failure while reading the contract.
    #[error("io error: {0}")]
    Io(String),
    /// Input exceeds the accepted size or is not UTF-8.
    #[error("unreadable contract: {0}")]
    Unreadable(String),
    /// Input is neither valid JSON nor valid YAML.
    #[error("parse error: {0}")]
    Parse(String),
    /// Document is missing a version marker or is not an object.
    #[error("invalid contract: {0}")]
    Invalid(String),
    /// Document declares a version outside the supported whitelist.
    #[error("unsupported contract version {found}; supported versions: {supported}")]
    UnsupportedVersion {
        /// Version string found in the document.
        found: String,
        /// Comma-separated supported versions.
        supported: String,
    },
}

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use loader::FormatHint;
pub use loader::MAX_CONTRACT_BYTES;
pub use loader::SUPPORTED_VERSIONS;
pub use loader::enrich;
pub use loader::load_contract;
pub use loader::parse;
pub use model::ApiKeyLocation;
pub use model::ContractDocument;
pub use model::ContractSummary;
pub use model::Diagnostic;
pub use model::HttpMethod;
pub use model::Info;
pub use model::Operation;
pub use model::Parameter;
pub use model::ParameterLocation;
pub use model::RequestBody;
pub use model::ResponseSpec;
pub use model::ResponseStatus;
pub use model::SecurityRequirement;
pub use model::SecurityScheme;
pub use model::SecuritySchemeKind;
pub use model::SpecFamily;
pub use model::SpecVersion;
pub use model::template_parameters;
pub use validator::CheckReport;
pub use validator::ValidationChecks;
pub use validator::ValidationIssue;
pub use validator::ValidationResult;
pub use validator::check_components;
pub use validator::check_info;
pub use validator::check_operations;
pub use validator::check_paths;
pub use validator::check_security;
pub use validator::validate;
