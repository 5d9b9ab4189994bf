// crates/suitegen-core/src/error.rs
// ============================================================================
// Module: Generation Errors
// Description: Error taxonomy shared by every pipeline stage.
// Purpose: Classify failures so recovery can pick an action list.
// Dependencies: suitegen-contract, suitegen-config, serde, thiserror
// ============================================================================

//! ## Overview
//! Every failure in the pipeline is expressed as a [`GenerationError`] whose
//! variant is its [`ErrorCategory`]. Crate-specific errors convert into it
//! with `?` so stage boundaries never lose the classification.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;
use suitegen_config::ConfigError;
use suitegen_contract::ContractError;
use thiserror::Error;

// ============================================================================
// SECTION: Taxonomy
// ============================================================================

/// Failure category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Unreadable contract or unsupported version.
    Specification,
    /// Contract validation failure.
    Validation,
    /// Planning or code synthesis failure.
    Generation,
    /// Filesystem failure.
    Io,
    /// Network failure.
    Network,
    /// Batch exceeded its time budget.
    Timeout,
    /// Memory budget exceeded.
    Memory,
    /// Missing collaborator or component.
    Dependency,
    /// Anything else, including worker panics.
    Unknown,
}

impl ErrorCategory {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Specification => "specification",
            Self::Validation => "validation",
            Self::Generation => "generation",
            Self::Io => "io",
            Self::Network => "network",
            Self::Timeout => "timeout",
            Self::Memory => "memory",
            Self::Dependency => "dependency",
            Self::Unknown => "unknown",
        }
    }
}

/// Error severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Advisory.
    Low,
    /// Unit-level failure.
    Medium,
    /// Run-level degradation.
    High,
    /// Run cannot produce usable output.
    Critical,
}

/// Pipeline stage an error was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Contract decoding.
    Parse,
    /// Contract validation.
    Validate,
    /// Scenario planning.
    Plan,
    /// Code synthesis.
    Synthesize,
    /// Batch scheduling.
    Schedule,
    /// Output writing.
    Write,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Classified pipeline error.
///
/// # Invariants
/// - The variant is the error's category; payloads carry technical detail only.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    /// Contract could not be read or is unsupported.
    #[error("specification error: {0}")]
    Specification(String),
    /// Contract failed validation.
    #[error("validation error: {0}")]
    Validation(String),
    /// Planning or synthesis failed.
    #[error("generation error: {0}")]
    Generation(String),
    /// Filesystem failure.
    #[error("io error: {0}")]
    Io(String),
    /// Network failure.
    #[error("network error: {0}")]
    Network(String),
    /// Time budget exceeded.
    #[error("timeout: {0}")]
    Timeout(String),
    /// Memory budget exceeded.
    #[error("memory error: {0}")]
    Memory(String),
    /// Missing collaborator.
    #[error("dependency error: {0}")]
    Dependency(String),
    /// Unclassified failure.
    #[error("unknown error: {0}")]
    Unknown(String),
}

impl GenerationError {
    /// Returns the error category.
    #[must_use]
    pub const fn category(&self) -> ErrorCategory {
        match self {
            Self::Specification(_) => ErrorCategory::Specification,
            Self::Validation(_) => ErrorCategory::Validation,
            Self::Generation(_) => ErrorCategory::Generation,
            Self::Io(_) => ErrorCategory::Io,
            Self::Network(_) => ErrorCategory::Network,
            Self::Timeout(_) => ErrorCategory::Timeout,
            Self::Memory(_) => ErrorCategory::Memory,
            Self::Dependency(_) => ErrorCategory::Dependency,
            Self::Unknown(_) => ErrorCategory::Unknown,
        }
    }
}

impl From<ContractError> for GenerationError {
    fn from(err: ContractError) -> Self {
        match err {
            ContractError::Io(_) => Self::Io(err.to_string()),
            ContractError::Unreadable(_)
            | ContractError::Parse(_)
            | ContractError::Invalid(_)
            | ContractError::UnsupportedVersion {
                ..
            } => Self::Specification(err.to_string()),
        }
    }
}

impl From<ConfigError> for GenerationError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::Io(_) => Self::Io(err.to_string()),
            ConfigError::Parse(_) | ConfigError::Invalid(_) => Self::Validation(err.to_string()),
        }
    }
}
