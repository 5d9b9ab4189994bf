// crates/suitegen-codegen/src/pipeline.rs
// ============================================================================
// Module: Generation Pipeline
// Description: Contract bytes to a set of parseable test files.
// Purpose: Wire parsing, validation, scheduling, and emission under recovery.
// Dependencies: suitegen-contract, suitegen-config, suitegen-core, serde, tracing
// ============================================================================

//! ## Overview
//! [`SuiteGenerator`] owns the emitters chosen at construction and the batch
//! cache that survives between runs. One run parses the contract, validates
//! it, schedules planning and rendering, and assembles one file per group in
//! dependency order. Every stage reports through the run's
//! [`RecoveryCoordinator`].
//!
//! # Invariants
//! - Identical contract bytes and options yield byte-identical files.
//! - A run succeeds only when it produced files and nothing aborted it.
//! - Files follow the dependency heuristic: a group is emitted at the
//!   position of its earliest operation in provider-first order, ties broken
//!   by group name.
//! - Fragments within a file follow declaration order.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::mem;
use std::path::Path;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use suitegen_config::EmitterStrategy;
use suitegen_config::GenerationOptions;
use suitegen_contract::ContractDocument;
use suitegen_contract::ContractSummary;
use suitegen_contract::FormatHint;
use suitegen_contract::Operation;
use suitegen_contract::ValidationResult;
use suitegen_contract::parse;
use suitegen_contract::validate;
use suitegen_core::BatchCache;
use suitegen_core::BatchMetrics;
use suitegen_core::BatchScheduler;
use suitegen_core::CodeEmitter;
use suitegen_core::ErrorContext;
use suitegen_core::ErrorReport;
use suitegen_core::FileContext;
use suitegen_core::GenerationError;
use suitegen_core::OperationArtifact;
use suitegen_core::RecoveryCoordinator;
use suitegen_core::RecoveryOutcome;
use suitegen_core::RecoveryPolicy;
use suitegen_core::RunContext;
use suitegen_core::Stage;
use suitegen_core::SynthesisProcessor;
use suitegen_core::dependency_order;
use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::lower::RenderSettings;
use crate::output::check_output;
use crate::output::write_output;
use crate::template::TemplateEmitter;
use crate::tree::TreeEmitter;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Directory generated files are placed in, relative to the output root.
pub const TESTS_DIR: &str = "tests";

// ============================================================================
// SECTION: Results
// ============================================================================

/// One generated test file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    /// Operation group.
    pub group: String,
    /// Path relative to the output root (`tests/<group>.rs`).
    pub relative_path: PathBuf,
    /// Source text.
    pub contents: String,
    /// Test functions in the file.
    pub tests: usize,
}

/// Summary of one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationResult {
    /// True when files were produced and nothing aborted the run.
    pub success: bool,
    /// Number of generated files.
    pub files_generated: usize,
    /// Number of generated test functions.
    pub tests_generated: usize,
    /// Configured output root.
    pub output_dir: String,
    /// Wall time of the run.
    pub duration_ms: u64,
    /// Per-batch metrics in batch order.
    pub batch_metrics: Vec<BatchMetrics>,
}

/// Everything a run produced.
#[derive(Debug, Clone)]
pub struct GenerationOutput {
    /// Run summary.
    pub result: GenerationResult,
    /// Generated files ordered by group.
    pub files: Vec<GeneratedFile>,
    /// Validation outcome, when the contract parsed.
    pub validation: Option<ValidationResult>,
    /// Enrichment metadata, when the contract parsed.
    pub summary: Option<ContractSummary>,
    /// Error registry export.
    pub errors: ErrorReport,
}

impl GenerationOutput {
    /// Writes every file under `root` atomically.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Io`] on the first write failure.
    pub fn write(&self, root: &Path) -> Result<(), GenerationError> {
        for file in &self.files {
            let path = root.join(&file.relative_path);
            write_output(&path, &file.contents)?;
            debug!(path = %path.display(), bytes = file.contents.len(), "file written");
        }
        Ok(())
    }

    /// Compares every file against the copy under `root`.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Validation`] on the first drifted file and
    /// [`GenerationError::Io`] when a file cannot be read.
    pub fn check(&self, root: &Path) -> Result<(), GenerationError> {
        for file in &self.files {
            check_output(&root.join(&file.relative_path), &file.contents)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Generator
// ============================================================================

/// Fragments and facts collected for one group.
#[derive(Debug, Default)]
struct GroupParts {
    /// Operation fragments keyed by declaration index.
    fragments: Vec<(usize, String)>,
    /// Scenario count.
    tests: usize,
    /// True when any plan sends credentials.
    needs_auth: bool,
    /// Referenced component schemas.
    schema_refs: BTreeSet<String>,
}

/// End-to-end test suite generator.
pub struct SuiteGenerator {
    /// Validated options.
    options: Arc<GenerationOptions>,
    /// Preferred emitter.
    primary: Arc<dyn CodeEmitter>,
    /// Emitter used by fallback recovery.
    fallback: Option<Arc<dyn CodeEmitter>>,
    /// Batch cache carried between runs.
    cache: BatchCache,
}

impl SuiteGenerator {
    /// Builds a generator; the tree strategy falls back to templates.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Validation`] when the options are invalid.
    pub fn new(options: GenerationOptions) -> Result<Self, GenerationError> {
        let settings = RenderSettings::from_options(&options);
        let tree: Arc<dyn CodeEmitter> = Arc::new(TreeEmitter::new(settings));
        let template: Arc<dyn CodeEmitter> = Arc::new(TemplateEmitter::new(settings));
        let (primary, fallback) = match options.emitter {
            EmitterStrategy::Tree => (tree, Some(template)),
            EmitterStrategy::Template => (template, None),
        };
        Self::with_emitters(options, primary, fallback)
    }

    /// Builds a generator with explicit emitters.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError::Validation`] when the options are invalid.
    pub fn with_emitters(
        options: GenerationOptions,
        primary: Arc<dyn CodeEmitter>,
        fallback: Option<Arc<dyn CodeEmitter>>,
    ) -> Result<Self, GenerationError> {
        options.validate()?;
        Ok(Self {
            options: Arc::new(options),
            primary,
            fallback,
            cache: BatchCache::default(),
        })
    }

    /// Returns the generation options.
    #[must_use]
    pub fn options(&self) -> &GenerationOptions {
        &self.options
    }

    /// Parses contract bytes and generates the suite.
    pub fn generate(&mut self, input: &[u8], hint: FormatHint) -> GenerationOutput {
        let started = Instant::now();
        let mut recovery = RecoveryCoordinator::new(RecoveryPolicy::new(&self.options.recovery));
        let parsed = recovery.run(
            ErrorContext::stage(Stage::Parse),
            || parse(input, hint).map_err(GenerationError::from),
            None::<fn() -> Result<ContractDocument, GenerationError>>,
        );
        match parsed {
            Some(document) => self.run(document, recovery, started),
            None => self.finish(started, recovery, None, None, Vec::new(), Vec::new()),
        }
    }

    /// Generates the suite for an already parsed contract.
    pub fn generate_document(&mut self, document: ContractDocument) -> GenerationOutput {
        let recovery = RecoveryCoordinator::new(RecoveryPolicy::new(&self.options.recovery));
        self.run(document, recovery, Instant::now())
    }

    /// Runs validation, scheduling, and assembly.
    fn run(&mut self, document: ContractDocument, recovery: RecoveryCoordinator, started: Instant) -> GenerationOutput {
        let mut context = RunContext {
            recovery,
            cache: mem::take(&mut self.cache),
        };
        let validation = validate(&document);
        let summary = document.summary.clone();
        info!(
            operations = summary.operation_count,
            paths = summary.path_count,
            score = validation.score,
            valid = validation.is_valid,
            "contract validated"
        );
        if !validation.is_valid {
            let detail = validation
                .errors
                .iter()
                .map(|issue| format!("{}: {}", issue.field, issue.message))
                .collect::<Vec<_>>()
                .join("; ");
            let outcome = if self.options.strict_mode { RecoveryOutcome::Aborted } else { RecoveryOutcome::Skipped };
            context.recovery.report(&GenerationError::Validation(detail), ErrorContext::stage(Stage::Validate), outcome);
            if self.options.strict_mode {
                self.cache = context.cache;
                return self.finish(started, context.recovery, Some(validation), Some(summary), Vec::new(), Vec::new());
            }
        }

        let document = Arc::new(document);
        let operations: Arc<[Operation]> = document.operations.iter().cloned().collect();
        let mut rank = vec![usize::MAX; document.operations.len()];
        for (position, index) in dependency_order(&document).into_iter().enumerate() {
            if let Some(slot) = rank.get_mut(index) {
                *slot = position;
            }
        }
        let processor = match SynthesisProcessor::new(
            Arc::clone(&document),
            Arc::clone(&self.options),
            Arc::clone(&self.primary),
            self.fallback.clone(),
        ) {
            Ok(processor) => processor,
            Err(err) => {
                context.recovery.report(&err, ErrorContext::stage(Stage::Schedule), RecoveryOutcome::Aborted);
                self.cache = context.cache;
                return self.finish(started, context.recovery, Some(validation), Some(summary), Vec::new(), Vec::new());
            }
        };
        let mut scheduler = BatchScheduler::new(Arc::new(processor), self.options.concurrency.clone());
        let mut groups: BTreeMap<String, GroupParts> = BTreeMap::new();
        let metrics = if self.options.concurrency.streaming {
            let outcome = scheduler.process_streaming(&operations, &mut context, |progress, artifacts| {
                info!(
                    processed = progress.processed,
                    total = progress.total,
                    percentage = progress.percentage,
                    "chunk received"
                );
                collect(&mut groups, artifacts);
            });
            outcome.metrics
        } else {
            let outcome = scheduler.process(&operations, &mut context);
            collect(&mut groups, outcome.artifacts);
            outcome.metrics
        };

        let mut ordered: Vec<(String, GroupParts)> = groups.into_iter().collect();
        for (_, parts) in &mut ordered {
            parts.fragments.sort_by_key(|(index, _)| *index);
        }
        // Stable sort keeps group-name order on ties.
        ordered.sort_by_key(|(_, parts)| {
            parts.fragments.iter().map(|(index, _)| rank.get(*index).copied().unwrap_or(usize::MAX)).min()
        });

        let mut files = Vec::with_capacity(ordered.len());
        for (group, parts) in ordered {
            let fragments: Vec<String> = parts.fragments.iter().map(|(_, fragment)| fragment.clone()).collect();
            let schema_refs: BTreeSet<&str> = parts.schema_refs.iter().map(String::as_str).collect();
            let file_context = FileContext::for_group(&group, &document, &self.options, parts.needs_auth, &schema_refs);
            let relative_path = Path::new(TESTS_DIR).join(format!("{group}.rs"));
            let error_context =
                ErrorContext::stage(Stage::Synthesize).with_operation(relative_path.display().to_string());
            let fallback = self
                .fallback
                .as_ref()
                .map(|emitter| || emitter.assemble_file(&file_context, &fragments));
            let assembled = context.recovery.run(
                error_context,
                || self.primary.assemble_file(&file_context, &fragments),
                fallback,
            );
            match assembled {
                Some(contents) => {
                    info!(group = group.as_str(), tests = parts.tests, bytes = contents.len(), "file assembled");
                    files.push(GeneratedFile {
                        group,
                        relative_path,
                        contents,
                        tests: parts.tests,
                    });
                }
                None => warn!(group = group.as_str(), "file dropped"),
            }
        }
        self.cache = context.cache;
        self.finish(started, context.recovery, Some(validation), Some(summary), files, metrics)
    }

    /// Builds the run output.
    fn finish(
        &self,
        started: Instant,
        recovery: RecoveryCoordinator,
        validation: Option<ValidationResult>,
        summary: Option<ContractSummary>,
        files: Vec<GeneratedFile>,
        batch_metrics: Vec<BatchMetrics>,
    ) -> GenerationOutput {
        let tests_generated = files.iter().map(|file| file.tests).sum();
        let result = GenerationResult {
            success: !files.is_empty() && !recovery.aborted(),
            files_generated: files.len(),
            tests_generated,
            output_dir: self.options.output_dir.display().to_string(),
            duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            batch_metrics,
        };
        info!(
            success = result.success,
            files = result.files_generated,
            tests = result.tests_generated,
            errors = recovery.registry().total(),
            duration_ms = result.duration_ms,
            "generation finished"
        );
        GenerationOutput {
            result,
            files,
            validation,
            summary,
            errors: recovery.error_report(),
        }
    }
}

/// Files artifacts into their groups.
fn collect(groups: &mut BTreeMap<String, GroupParts>, artifacts: Vec<OperationArtifact>) {
    for artifact in artifacts {
        let parts = groups.entry(artifact.group.clone()).or_default();
        parts.tests += artifact.plan.scenarios.len();
        parts.needs_auth |= artifact.plan.needs_auth();
        parts.schema_refs.extend(artifact.plan.schema_refs().into_iter().map(str::to_string));
        parts.fragments.push((artifact.index, artifact.fragment));
    }
}

#[cfg(test)]
mod tests;
