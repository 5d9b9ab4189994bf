// crates/suitegen-core/src/recovery.rs
// ============================================================================
// Module: Error Recovery
// Description: Recovery policy, bounded error registry, and coordinator.
// Purpose: Turn classified failures into ordered recovery actions and records.
// Dependencies: serde, tracing
// ============================================================================

//! ## Overview
//! Recovery is split in two:
//! - [`RecoveryPolicy`] is stateless and cheap to clone into worker threads.
//!   It decides severity, user message, and action list per category, and
//!   executes the actions around a fallible unit of work.
//! - [`RecoveryCoordinator`] owns the [`ErrorRegistry`] on the coordinating
//!   thread. Workers never touch it; they return draft [`ErrorRecord`]s that
//!   the coordinator absorbs after aggregation.
//!
//! Actions run in order until one is terminal. A retry that exhausts its
//! attempts carries the last failure forward to the next action.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::thread;
use std::time::Duration;

use serde::Deserialize;
use serde::Serialize;
use suitegen_config::RecoveryOptions;
use tracing::debug;
use tracing::warn;

use crate::error::ErrorCategory;
use crate::error::GenerationError;
use crate::error::Severity;
use crate::error::Stage;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Number of records retained by the registry.
pub const MAX_ERROR_RECORDS: usize = 50;

// ============================================================================
// SECTION: Records
// ============================================================================

/// Recovery action kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum RecoveryAction {
    /// Re-run the unit a bounded number of times.
    Retry {
        /// Attempts after the initial failure.
        max_attempts: u32,
        /// Delay before each attempt in milliseconds.
        delay_ms: u64,
    },
    /// Run the fallback path (for example the templating strategy).
    Fallback,
    /// Abandon the unit and continue with the others.
    Skip,
    /// Operator action required.
    Manual {
        /// What the operator should do.
        instructions: String,
    },
    /// Stop the run.
    Abort,
}

/// Final disposition of a recovered failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecoveryOutcome {
    /// A retry succeeded.
    Recovered,
    /// The fallback path succeeded.
    FellBack,
    /// The unit was abandoned.
    Skipped,
    /// The run was stopped.
    Aborted,
    /// No action resolved the failure.
    Failed,
}

impl RecoveryOutcome {
    /// Returns a stable label.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Recovered => "recovered",
            Self::FellBack => "fell_back",
            Self::Skipped => "skipped",
            Self::Aborted => "aborted",
            Self::Failed => "failed",
        }
    }
}

/// Where an error happened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorContext {
    /// Pipeline stage.
    pub stage: Stage,
    /// Operation key, when the error belongs to one operation.
    pub operation: Option<String>,
    /// Batch id, when the error belongs to one batch.
    pub batch: Option<usize>,
}

impl ErrorContext {
    /// Builds a context for a stage.
    #[must_use]
    pub const fn stage(stage: Stage) -> Self {
        Self {
            stage,
            operation: None,
            batch: None,
        }
    }

    /// Attaches an operation key.
    #[must_use]
    pub fn with_operation(mut self, operation: impl Into<String>) -> Self {
        self.operation = Some(operation.into());
        self
    }

    /// Attaches a batch id.
    #[must_use]
    pub const fn with_batch(mut self, batch: usize) -> Self {
        self.batch = Some(batch);
        self
    }
}

/// Recorded failure.
///
/// # Invariants
/// - `id` is empty until the record is absorbed by an [`ErrorRegistry`].
/// - `user_message` never contains technical detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    /// Registry-assigned identifier.
    pub id: String,
    /// Failure category.
    pub category: ErrorCategory,
    /// Failure severity.
    pub severity: Severity,
    /// Message suitable for end users.
    pub user_message: String,
    /// Technical detail (last failure observed).
    pub technical_message: String,
    /// Where the failure happened.
    pub context: ErrorContext,
    /// Ordered recovery actions.
    pub actions: Vec<RecoveryAction>,
    /// Retry attempts performed.
    pub retry_count: u32,
    /// Final disposition.
    pub outcome: RecoveryOutcome,
}

/// Result of running a unit under recovery.
#[derive(Debug)]
pub struct Recovered<T> {
    /// Produced value, when any path succeeded.
    pub value: Option<T>,
    /// Draft record, when the primary attempt failed.
    pub record: Option<ErrorRecord>,
}

impl<T> Recovered<T> {
    /// Returns true when recovery decided to stop the run.
    #[must_use]
    pub fn aborted(&self) -> bool {
        self.record.as_ref().is_some_and(|record| record.outcome == RecoveryOutcome::Aborted)
    }
}

// ============================================================================
// SECTION: Policy
// ============================================================================

/// Stateless recovery policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecoveryPolicy {
    /// Attempts used by retryable categories.
    retry_attempts: u32,
    /// Delay between retries in milliseconds.
    retry_delay_ms: u64,
}

impl Default for RecoveryPolicy {
    fn default() -> Self {
        Self::new(&RecoveryOptions::default())
    }
}

impl RecoveryPolicy {
    /// Builds a policy from recovery options.
    #[must_use]
    pub const fn new(options: &RecoveryOptions) -> Self {
        Self {
            retry_attempts: options.retry_attempts,
            retry_delay_ms: options.retry_delay_ms,
        }
    }

    /// Returns the severity assigned to a category.
    #[must_use]
    pub const fn severity(category: ErrorCategory) -> Severity {
        match category {
            ErrorCategory::Specification => Severity::Critical,
            ErrorCategory::Io | ErrorCategory::Memory | ErrorCategory::Dependency => Severity::High,
            ErrorCategory::Validation => Severity::Low,
            ErrorCategory::Generation
            | ErrorCategory::Network
            | ErrorCategory::Timeout
            | ErrorCategory::Unknown => Severity::Medium,
        }
    }

    /// Returns the user-facing message for a category.
    #[must_use]
    pub const fn user_message(category: ErrorCategory) -> &'static str {
        match category {
            ErrorCategory::Specification => {
                "The API contract could not be read or uses an unsupported version."
            }
            ErrorCategory::Validation => "The API contract has validation problems.",
            ErrorCategory::Generation => "Tests could not be generated for part of the contract.",
            ErrorCategory::Io => "A file could not be read or written.",
            ErrorCategory::Network => "A network resource could not be reached.",
            ErrorCategory::Timeout => "Part of the contract took too long to process and was skipped.",
            ErrorCategory::Memory => "Processing exceeded the configured memory budget.",
            ErrorCategory::Dependency => "A required component is unavailable.",
            ErrorCategory::Unknown => "An unexpected problem occurred.",
        }
    }

    /// Returns the ordered action list for a category.
    #[must_use]
    pub fn actions(&self, category: ErrorCategory) -> Vec<RecoveryAction> {
        let retry = RecoveryAction::Retry {
            max_attempts: self.retry_attempts,
            delay_ms: self.retry_delay_ms,
        };
        match category {
            ErrorCategory::Specification => vec![RecoveryAction::Abort],
            ErrorCategory::Validation | ErrorCategory::Timeout => vec![RecoveryAction::Skip],
            ErrorCategory::Generation | ErrorCategory::Memory => {
                vec![RecoveryAction::Fallback, RecoveryAction::Skip]
            }
            ErrorCategory::Io => vec![retry, RecoveryAction::Abort],
            ErrorCategory::Network => vec![retry, RecoveryAction::Skip],
            ErrorCategory::Dependency => vec![
                RecoveryAction::Manual {
                    instructions: "restore the missing component and rerun generation".to_string(),
                },
                RecoveryAction::Abort,
            ],
            ErrorCategory::Unknown => vec![
                RecoveryAction::Retry {
                    max_attempts: 1,
                    delay_ms: self.retry_delay_ms,
                },
                RecoveryAction::Skip,
            ],
        }
    }

    /// Builds a draft record for a failure whose actions have not run.
    #[must_use]
    pub fn record(&self, error: &GenerationError, context: ErrorContext) -> ErrorRecord {
        let category = error.category();
        ErrorRecord {
            id: String::new(),
            category,
            severity: Self::severity(category),
            user_message: Self::user_message(category).to_string(),
            technical_message: error.to_string(),
            context,
            actions: self.actions(category),
            retry_count: 0,
            outcome: RecoveryOutcome::Failed,
        }
    }

    /// Builds a draft record with a fixed outcome.
    #[must_use]
    pub fn record_outcome(
        &self,
        error: &GenerationError,
        context: ErrorContext,
        outcome: RecoveryOutcome,
    ) -> ErrorRecord {
        let mut record = self.record(error, context);
        record.outcome = outcome;
        record
    }

    /// Runs `primary`, applying the category's actions when it fails.
    ///
    /// `fallback` is used by [`RecoveryAction::Fallback`]; when absent the
    /// action is a no-op and the next action runs.
    pub fn execute<T, P, F>(&self, context: ErrorContext, mut primary: P, mut fallback: Option<F>) -> Recovered<T>
    where
        P: FnMut() -> Result<T, GenerationError>,
        F: FnMut() -> Result<T, GenerationError>,
    {
        let mut last = match primary() {
            Ok(value) => {
                return Recovered {
                    value: Some(value),
                    record: None,
                };
            }
            Err(err) => err,
        };
        let mut record = self.record(&last, context);
        let actions = record.actions.clone();
        for action in actions {
            match action {
                RecoveryAction::Retry {
                    max_attempts,
                    delay_ms,
                } => {
                    for _ in 0 .. max_attempts {
                        if delay_ms > 0 {
                            thread::sleep(Duration::from_millis(delay_ms));
                        }
                        record.retry_count = record.retry_count.saturating_add(1);
                        match primary() {
                            Ok(value) => {
                                record.outcome = RecoveryOutcome::Recovered;
                                return finish(Some(value), record);
                            }
                            Err(err) => last = err,
                        }
                    }
                    record.technical_message = last.to_string();
                }
                RecoveryAction::Fallback => {
                    if let Some(run) = fallback.as_mut() {
                        match run() {
                            Ok(value) => {
                                record.outcome = RecoveryOutcome::FellBack;
                                return finish(Some(value), record);
                            }
                            Err(err) => {
                                record.technical_message = format!("{}; fallback: {err}", record.technical_message);
                                last = err;
                            }
                        }
                    }
                }
                RecoveryAction::Skip => {
                    record.outcome = RecoveryOutcome::Skipped;
                    return finish(None, record);
                }
                RecoveryAction::Manual {
                    instructions,
                } => {
                    warn!(category = record.category.as_str(), %instructions, "manual recovery required");
                }
                RecoveryAction::Abort => {
                    record.outcome = RecoveryOutcome::Aborted;
                    return finish(None, record);
                }
            }
        }
        record.outcome = RecoveryOutcome::Failed;
        finish(None, record)
    }
}

/// Wraps a value and record into a recovery result.
fn finish<T>(value: Option<T>, record: ErrorRecord) -> Recovered<T> {
    debug!(
        category = record.category.as_str(),
        retries = record.retry_count,
        outcome = record.outcome.as_str(),
        "recovery finished"
    );
    Recovered {
        value,
        record: Some(record),
    }
}

// ============================================================================
// SECTION: Registry
// ============================================================================

/// Bounded registry of the most recent error records.
///
/// # Invariants
/// - Holds at most [`MAX_ERROR_RECORDS`] records; counters cover every record ever absorbed.
#[derive(Debug, Clone, Default)]
pub struct ErrorRegistry {
    /// Most recent records, oldest first.
    records: VecDeque<ErrorRecord>,
    /// Per-category counters.
    by_category: BTreeMap<ErrorCategory, u64>,
    /// Per-severity counters.
    by_severity: BTreeMap<Severity, u64>,
    /// Total absorbed records.
    total: u64,
}

impl ErrorRegistry {
    /// Assigns an id to a draft record and retains it.
    pub fn absorb(&mut self, mut record: ErrorRecord) -> String {
        self.total = self.total.saturating_add(1);
        record.id = format!("err-{:06}", self.total);
        *self.by_category.entry(record.category).or_insert(0) += 1;
        *self.by_severity.entry(record.severity).or_insert(0) += 1;
        let id = record.id.clone();
        self.records.push_back(record);
        while self.records.len() > MAX_ERROR_RECORDS {
            self.records.pop_front();
        }
        id
    }

    /// Returns retained records, oldest first.
    pub fn records(&self) -> impl Iterator<Item = &ErrorRecord> {
        self.records.iter()
    }

    /// Returns the number of records ever absorbed.
    #[must_use]
    pub const fn total(&self) -> u64 {
        self.total
    }

    /// Returns the counter for a category.
    #[must_use]
    pub fn count(&self, category: ErrorCategory) -> u64 {
        self.by_category.get(&category).copied().unwrap_or(0)
    }
}

/// Structured export of the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorReport {
    /// Records ever absorbed.
    pub total_errors: u64,
    /// Per-category counters.
    pub by_category: BTreeMap<ErrorCategory, u64>,
    /// Per-severity counters.
    pub by_severity: BTreeMap<Severity, u64>,
    /// True when any record aborted the run or was critical.
    pub aborted: bool,
    /// Retained records, oldest first.
    pub records: Vec<ErrorRecord>,
}

// ============================================================================
// SECTION: Coordinator
// ============================================================================

/// Owner of the error registry for one run.
#[derive(Debug, Clone, Default)]
pub struct RecoveryCoordinator {
    /// Policy cloned into workers.
    policy: RecoveryPolicy,
    /// Registry mutated only on the coordinating thread.
    registry: ErrorRegistry,
    /// Sticky abort flag.
    aborted: bool,
}

impl RecoveryCoordinator {
    /// Builds a coordinator for a policy.
    #[must_use]
    pub fn new(policy: RecoveryPolicy) -> Self {
        Self {
            policy,
            registry: ErrorRegistry::default(),
            aborted: false,
        }
    }

    /// Returns the policy for cloning into workers.
    #[must_use]
    pub const fn policy(&self) -> &RecoveryPolicy {
        &self.policy
    }

    /// Runs a unit on the coordinating thread and absorbs its record.
    pub fn run<T, P, F>(&mut self, context: ErrorContext, primary: P, fallback: Option<F>) -> Option<T>
    where
        P: FnMut() -> Result<T, GenerationError>,
        F: FnMut() -> Result<T, GenerationError>,
    {
        let recovered = self.policy.execute(context, primary, fallback);
        if let Some(record) = recovered.record {
            self.absorb(record);
        }
        recovered.value
    }

    /// Records a failure without running actions (outcome decided by the caller).
    pub fn report(&mut self, error: &GenerationError, context: ErrorContext, outcome: RecoveryOutcome) -> String {
        let record = self.policy.record_outcome(error, context, outcome);
        self.absorb(record)
    }

    /// Absorbs a draft record (for example one returned by a worker).
    pub fn absorb(&mut self, record: ErrorRecord) -> String {
        if record.outcome == RecoveryOutcome::Aborted || record.severity == Severity::Critical {
            self.aborted = true;
        }
        warn!(
            category = record.category.as_str(),
            operation = record.context.operation.as_deref().unwrap_or("-"),
            batch = record.context.batch,
            detail = %record.technical_message,
            "{}",
            record.user_message
        );
        self.registry.absorb(record)
    }

    /// Returns true when an abort-class or critical error was recorded.
    #[must_use]
    pub const fn aborted(&self) -> bool {
        self.aborted
    }

    /// Returns the registry.
    #[must_use]
    pub const fn registry(&self) -> &ErrorRegistry {
        &self.registry
    }

    /// Exports counters and retained records.
    #[must_use]
    pub fn error_report(&self) -> ErrorReport {
        ErrorReport {
            total_errors: self.registry.total,
            by_category: self.registry.by_category.clone(),
            by_severity: self.registry.by_severity.clone(),
            aborted: self.aborted,
            records: self.registry.records.iter().cloned().collect(),
        }
    }
}
