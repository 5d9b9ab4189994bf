//! Batch processing tests for suitegen-core.
// crates/suitegen-core/tests/processing.rs
// =============================================================================
// Module: Batch Processing Tests
// Description: Planning and rendering through the scheduler with stub emitters.
// Purpose: Ensure per-operation recovery and full coverage of large contracts.
// =============================================================================

use std::sync::Arc;

use serde_json::Map;
use serde_json::json;
use suitegen_config::EmitterStrategy;
use suitegen_config::GenerationOptions;
use suitegen_contract::ContractDocument;
use suitegen_contract::FormatHint;
use suitegen_contract::Operation;
use suitegen_contract::parse;
use suitegen_core::BatchScheduler;
use suitegen_core::CodeEmitter;
use suitegen_core::ErrorCategory;
use suitegen_core::FileContext;
use suitegen_core::GenerationError;
use suitegen_core::RecoveryOutcome;
use suitegen_core::RecoveryPolicy;
use suitegen_core::RunContext;
use suitegen_core::ScenarioPlan;
use suitegen_core::SynthesisProcessor;

type TestResult = Result<(), String>;

/// Emitter that renders scenario ids and fails for one operation key.
struct StubEmitter {
    strategy: EmitterStrategy,
    fail_for: Option<&'static str>,
}

impl CodeEmitter for StubEmitter {
    fn strategy(&self) -> EmitterStrategy {
        self.strategy
    }

    fn emit_operation(&self, plan: &ScenarioPlan) -> Result<String, GenerationError> {
        if self.fail_for == Some(plan.operation_key.as_str()) {
            return Err(GenerationError::Generation(format!("cannot render {}", plan.operation_key)));
        }
        Ok(plan.scenarios.iter().map(|scenario| format!("fn {}() {{}}\n", scenario.id)).collect())
    }

    fn assemble_file(&self, _context: &FileContext, fragments: &[String]) -> Result<String, GenerationError> {
        Ok(fragments.concat())
    }
}

fn document(count: usize) -> Result<ContractDocument, String> {
    let mut paths = Map::new();
    for index in 0 .. count {
        paths.insert(
            format!("/items/r{index}"),
            json!({"get": {"operationId": format!("getItem{index}"), "responses": {"200": {"description": "ok"}}}}),
        );
    }
    let contract = json!({"openapi": "3.0.3", "info": {"title": "T", "version": "1"}, "paths": paths});
    parse(contract.to_string().as_bytes(), FormatHint::Json).map_err(|err| err.to_string())
}

fn run(
    document: ContractDocument,
    options: GenerationOptions,
    primary: StubEmitter,
    fallback: Option<StubEmitter>,
) -> Result<(Vec<String>, RunContext), String> {
    let options = Arc::new(options);
    let operations: Arc<[Operation]> = document.operations.clone().into();
    let fallback: Option<Arc<dyn CodeEmitter>> = fallback.map(|emitter| Arc::new(emitter) as Arc<dyn CodeEmitter>);
    let processor =
        SynthesisProcessor::new(Arc::new(document), Arc::clone(&options), Arc::new(primary), fallback)
            .map_err(|err| err.to_string())?;
    let mut scheduler = BatchScheduler::new(Arc::new(processor), options.concurrency.clone());
    let mut context = RunContext::new(RecoveryPolicy::new(&options.recovery));
    let outcome = scheduler.process(&operations, &mut context);
    Ok((outcome.artifacts.into_iter().map(|artifact| artifact.key).collect(), context))
}

fn quiet_options() -> GenerationOptions {
    let mut options = GenerationOptions::default();
    options.recovery.retry_delay_ms = 0;
    options
}

#[test]
fn failing_primary_falls_back_to_secondary_strategy() -> TestResult {
    let primary = StubEmitter {
        strategy: EmitterStrategy::Tree,
        fail_for: Some("GET /items/r1"),
    };
    let fallback = StubEmitter {
        strategy: EmitterStrategy::Template,
        fail_for: None,
    };
    let (keys, context) = run(document(3)?, quiet_options(), primary, Some(fallback))?;
    if keys != ["GET /items/r0", "GET /items/r1", "GET /items/r2"] {
        return Err(format!("unexpected keys: {}", keys.join(", ")));
    }
    let report = context.recovery.error_report();
    if report.records.len() != 1 || report.records[0].outcome != RecoveryOutcome::FellBack {
        return Err("expected one fell-back record".to_string());
    }
    Ok(())
}

#[test]
fn unrecoverable_operation_is_skipped_without_aborting() -> TestResult {
    let primary = StubEmitter {
        strategy: EmitterStrategy::Tree,
        fail_for: Some("GET /items/r0"),
    };
    let fallback = StubEmitter {
        strategy: EmitterStrategy::Template,
        fail_for: Some("GET /items/r0"),
    };
    let (keys, context) = run(document(3)?, quiet_options(), primary, Some(fallback))?;
    if keys != ["GET /items/r1", "GET /items/r2"] {
        return Err(format!("unexpected keys: {}", keys.join(", ")));
    }
    if context.recovery.registry().count(ErrorCategory::Generation) != 1 {
        return Err("expected one generation error".to_string());
    }
    if context.recovery.aborted() {
        return Err("skip must not abort the run".to_string());
    }
    Ok(())
}

#[test]
fn six_hundred_operations_are_processed_once_each() -> TestResult {
    let mut options = quiet_options();
    options.concurrency.batch_size = 10;
    options.concurrency.max_workers = 4;
    let primary = StubEmitter {
        strategy: EmitterStrategy::Tree,
        fail_for: None,
    };
    let (keys, context) = run(document(600)?, options, primary, None)?;
    let expected: Vec<String> = (0 .. 600).map(|index| format!("GET /items/r{index}")).collect();
    if keys != expected {
        return Err(format!("expected 600 ordered keys, got {}", keys.len()));
    }
    if context.recovery.registry().total() != 0 {
        return Err("expected no errors".to_string());
    }
    Ok(())
}
