// crates/suitegen-core/src/interfaces.rs
// ============================================================================
// Module: Pipeline Interfaces
// Description: Seams between planning, code synthesis, and scheduling.
// Purpose: Keep strategy and resource choices at construction time.
// Dependencies: suitegen-contract, suitegen-config, serde_json
// ============================================================================

//! ## Overview
//! Traits that let the scheduler and pipeline stay agnostic of the concrete
//! code-emission strategy, per-batch processing, and memory accounting.
//!
//! Implementations must be deterministic: identical inputs produce identical
//! fragments and files.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeSet;

use suitegen_config::EmitterStrategy;
use suitegen_config::GenerationOptions;
use suitegen_contract::ContractDocument;
use suitegen_contract::Operation;

use crate::error::GenerationError;
use crate::planner::ScenarioPlan;
use crate::recovery::ErrorRecord;

// ============================================================================
// SECTION: Code Emission
// ============================================================================

/// File-level inputs shared by every operation of one group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContext {
    /// Group name (also the file stem).
    pub group: String,
    /// Base URL embedded as the default server.
    pub server_url: String,
    /// True when any scenario of the file sends a credential.
    pub needs_auth: bool,
    /// Environment variable holding the credential.
    pub auth_env_var: String,
    /// Component schemas as `(name, compact JSON)` when type output is enabled.
    pub schemas: Vec<(String, String)>,
}

impl FileContext {
    /// Builds the context of a group from its plans.
    #[must_use]
    pub fn for_plans(
        group: &str,
        document: &ContractDocument,
        options: &GenerationOptions,
        plans: &[&ScenarioPlan],
    ) -> Self {
        let schema_refs: BTreeSet<&str> = plans.iter().flat_map(|plan| plan.schema_refs()).collect();
        let needs_auth = plans.iter().any(|plan| plan.needs_auth());
        Self::for_group(group, document, options, needs_auth, &schema_refs)
    }

    /// Builds the context of a group from precomputed plan facts.
    #[must_use]
    pub fn for_group(
        group: &str,
        document: &ContractDocument,
        options: &GenerationOptions,
        needs_auth: bool,
        schema_refs: &BTreeSet<&str>,
    ) -> Self {
        let schemas = if options.include_types {
            schema_refs
                .iter()
                .filter_map(|name| {
                    let schema = document.schemas.get(*name)?;
                    Some(((*name).to_string(), schema.to_string()))
                })
                .collect()
        } else {
            Vec::new()
        };
        Self {
            group: group.to_string(),
            server_url: options.server_url.clone().unwrap_or_else(|| document.primary_server().to_string()),
            needs_auth,
            auth_env_var: options.auth_env_var(),
            schemas,
        }
    }
}

/// One code synthesis strategy.
///
/// Strategies are chosen at construction; both must produce semantically
/// equivalent, parseable output for the same plans.
pub trait CodeEmitter: Send + Sync {
    /// Returns the strategy label.
    fn strategy(&self) -> EmitterStrategy;

    /// Renders the items (test functions and mock constants) of one operation.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Generation`] when the plan cannot be rendered.
    fn emit_operation(&self, plan: &ScenarioPlan) -> Result<String, GenerationError>;

    /// Assembles a complete file from operation fragments in order.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Generation`] when the assembled file does not parse.
    fn assemble_file(&self, context: &FileContext, fragments: &[String]) -> Result<String, GenerationError>;

    /// Renders a complete file for a group.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Generation`] when any plan or the file fails.
    fn synthesize_file(&self, context: &FileContext, plans: &[&ScenarioPlan]) -> Result<String, GenerationError> {
        let fragments = plans.iter().map(|plan| self.emit_operation(plan)).collect::<Result<Vec<_>, _>>()?;
        self.assemble_file(context, &fragments)
    }
}

// ============================================================================
// SECTION: Batch Processing
// ============================================================================

/// Result of planning and rendering one operation.
#[derive(Debug, Clone, PartialEq)]
pub struct OperationArtifact {
    /// Operation declaration index.
    pub index: usize,
    /// Operation key (`METHOD path`).
    pub key: String,
    /// File group.
    pub group: String,
    /// Scenario plan.
    pub plan: ScenarioPlan,
    /// Rendered items of the operation.
    pub fragment: String,
    /// Strategy that rendered the fragment.
    pub strategy: EmitterStrategy,
}

impl OperationArtifact {
    /// Estimates retained bytes for memory accounting.
    #[must_use]
    pub fn estimated_bytes(&self) -> u64 {
        let scenarios = self.plan.scenarios.len().saturating_mul(512);
        let bytes = self.fragment.len().saturating_add(self.key.len()).saturating_add(scenarios);
        u64::try_from(bytes).unwrap_or(u64::MAX)
    }
}

/// Output of one batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BatchOutput {
    /// Artifacts in input order.
    pub artifacts: Vec<OperationArtifact>,
    /// Draft error records for operations that failed or recovered.
    pub errors: Vec<ErrorRecord>,
}

impl BatchOutput {
    /// Estimates retained bytes for memory accounting.
    #[must_use]
    pub fn estimated_bytes(&self) -> u64 {
        self.artifacts.iter().map(OperationArtifact::estimated_bytes).fold(0, u64::saturating_add)
    }
}

/// Per-batch work run on scheduler workers.
///
/// Implementations own only read-only shared state; every batch result is
/// returned to the coordinating thread.
pub trait BatchProcessor: Send + Sync + 'static {
    /// Returns a stable digest of the options that influence output.
    fn fingerprint(&self) -> String;

    /// Processes a contiguous slice of operations.
    fn process(&self, batch_id: usize, operations: &[Operation]) -> BatchOutput;
}

// ============================================================================
// SECTION: Memory Accounting
// ============================================================================

/// Memory sampling hook used by streaming mode.
pub trait MemoryProbe: Send {
    /// Returns the current footprint in bytes given the scheduler's own accounting.
    fn sample(&mut self, accounted_bytes: u64) -> u64;

    /// Hints that retained memory should be released.
    fn release_hint(&mut self) {}
}

/// Probe that reports the scheduler's accounted bytes unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct AccountedMemoryProbe;

impl MemoryProbe for AccountedMemoryProbe {
    fn sample(&mut self, accounted_bytes: u64) -> u64 {
        accounted_bytes
    }
}
