// crates/suitegen-core/src/lib.rs
// ============================================================================
// Module: Suitegen Core
// Description: Planning, synthesis, scheduling, and recovery for test generation.
// Purpose: Deterministic core shared by every code emission strategy.
// Dependencies: suitegen-contract, suitegen-config, serde, sha2, tracing, url
// ============================================================================

//! ## Overview
//! `suitegen-core` turns a parsed contract into per-operation scenario plans
//! and drives code emitters over them, in-process or through the batch
//! scheduler. Every failure is classified by the shared error taxonomy and
//! routed through the recovery coordinator.
//!
//! The crate never emits source text itself; strategies implement
//! [`CodeEmitter`] in downstream crates.

pub mod error;
pub mod hashing;
pub mod interfaces;
pub mod planner;
pub mod processor;
pub mod recovery;
pub mod scheduler;
pub mod synth;

pub use error::ErrorCategory;
pub use error::GenerationError;
pub use error::Severity;
pub use error::Stage;
pub use hashing::batch_cache_key;
pub use hashing::hash_canonical_json;
pub use hashing::options_fingerprint;
pub use interfaces::AccountedMemoryProbe;
pub use interfaces::BatchOutput;
pub use interfaces::BatchProcessor;
pub use interfaces::CodeEmitter;
pub use interfaces::FileContext;
pub use interfaces::MemoryProbe;
pub use interfaces::OperationArtifact;
pub use planner::Assertion;
pub use planner::AuthMode;
pub use planner::Credential;
pub use planner::DataRequirement;
pub use planner::ExpectedResponse;
pub use planner::RequestPayload;
pub use planner::RequestTemplate;
pub use planner::RuleKind;
pub use planner::ScenarioCategory;
pub use planner::ScenarioPlan;
pub use planner::ScenarioPlanner;
pub use planner::TestScenario;
pub use planner::ValidationRule;
pub use planner::dependencies;
pub use planner::dependency_order;
pub use planner::group_name;
pub use planner::value_text;
pub use processor::SynthesisProcessor;
pub use recovery::ErrorContext;
pub use recovery::ErrorRecord;
pub use recovery::ErrorRegistry;
pub use recovery::ErrorReport;
pub use recovery::RecoveryAction;
pub use recovery::RecoveryCoordinator;
pub use recovery::RecoveryOutcome;
pub use recovery::RecoveryPolicy;
pub use scheduler::BatchCache;
pub use scheduler::BatchMetrics;
pub use scheduler::BatchScheduler;
pub use scheduler::BatchStatus;
pub use scheduler::ChunkProgress;
pub use scheduler::RunContext;
pub use scheduler::ScheduleOutcome;
pub use synth::Boundary;
pub use synth::DataSynthesizer;
