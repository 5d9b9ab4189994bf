// crates/suitegen-core/src/processor.rs
// ============================================================================
// Module: Synthesis Processor
// Description: Per-batch planning and rendering with strategy fallback.
// Purpose: The unit of work the batch scheduler runs on its workers.
// Dependencies: suitegen-contract, suitegen-config, tracing
// ============================================================================

//! ## Overview
//! [`SynthesisProcessor`] plans each operation of a batch and renders it with
//! the primary [`CodeEmitter`]. Failures go through the recovery policy, which
//! may retry, drop to the fallback emitter, or skip the operation; the
//! resulting draft error records travel back with the batch output.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::sync::Arc;

use suitegen_config::GenerationOptions;
use suitegen_contract::ContractDocument;
use suitegen_contract::Operation;
use tracing::debug;

use crate::error::GenerationError;
use crate::error::Stage;
use crate::hashing::options_fingerprint;
use crate::interfaces::BatchOutput;
use crate::interfaces::BatchProcessor;
use crate::interfaces::CodeEmitter;
use crate::interfaces::OperationArtifact;
use crate::planner::ScenarioPlanner;
use crate::recovery::ErrorContext;
use crate::recovery::RecoveryPolicy;

// ============================================================================
// SECTION: Processor
// ============================================================================

/// Plans and renders batches of operations.
pub struct SynthesisProcessor {
    /// Contract shared read-only with every worker.
    document: Arc<ContractDocument>,
    /// Generation options.
    options: Arc<GenerationOptions>,
    /// Preferred emitter.
    primary: Arc<dyn CodeEmitter>,
    /// Emitter used by the fallback recovery action.
    fallback: Option<Arc<dyn CodeEmitter>>,
    /// Recovery policy applied per operation.
    policy: RecoveryPolicy,
    /// Cache fingerprint.
    fingerprint: String,
}

impl SynthesisProcessor {
    /// Builds a processor.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Generation`] when the options cannot be fingerprinted.
    pub fn new(
        document: Arc<ContractDocument>,
        options: Arc<GenerationOptions>,
        primary: Arc<dyn CodeEmitter>,
        fallback: Option<Arc<dyn CodeEmitter>>,
    ) -> Result<Self, GenerationError> {
        let fingerprint = format!("{}:{}", primary.strategy().as_str(), options_fingerprint(&options)?);
        let policy = RecoveryPolicy::new(&options.recovery);
        Ok(Self {
            document,
            options,
            primary,
            fallback,
            policy,
            fingerprint,
        })
    }

    /// Plans and renders one operation with an emitter.
    fn render(
        &self,
        planner: &ScenarioPlanner<'_>,
        operation: &Operation,
        emitter: &dyn CodeEmitter,
    ) -> Result<OperationArtifact, GenerationError> {
        let plan = planner.plan(operation)?;
        let fragment = emitter.emit_operation(&plan)?;
        Ok(OperationArtifact {
            index: operation.index,
            key: plan.operation_key.clone(),
            group: plan.group.clone(),
            plan,
            fragment,
            strategy: emitter.strategy(),
        })
    }
}

impl BatchProcessor for SynthesisProcessor {
    fn fingerprint(&self) -> String {
        self.fingerprint.clone()
    }

    fn process(&self, batch_id: usize, operations: &[Operation]) -> BatchOutput {
        let planner = ScenarioPlanner::new(&self.document, &self.options);
        let mut output = BatchOutput::default();
        for operation in operations {
            let context = ErrorContext::stage(Stage::Synthesize).with_operation(operation.key()).with_batch(batch_id);
            let fallback = self.fallback.as_ref().map(|emitter| || self.render(&planner, operation, emitter.as_ref()));
            let recovered =
                self.policy.execute(context, || self.render(&planner, operation, self.primary.as_ref()), fallback);
            if let Some(record) = recovered.record {
                output.errors.push(record);
            }
            if let Some(artifact) = recovered.value {
                debug!(
                    batch_id,
                    operation = artifact.key.as_str(),
                    scenarios = artifact.plan.scenarios.len(),
                    strategy = artifact.strategy.as_str(),
                    "operation rendered"
                );
                output.artifacts.push(artifact);
            }
        }
        output
    }
}
