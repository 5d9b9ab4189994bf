// crates/suitegen-codegen/src/lib.rs
// ============================================================================
// Module: Suitegen Codegen
// Description: Code synthesis strategies and the end-to-end generation pipeline.
// Purpose: Turn API contracts into parseable Rust integration-test suites.
// Dependencies: suitegen-core, syn, quote, proc-macro2, prettyplease, tracing
// ============================================================================

//! ## Overview
//! Two [`suitegen_core::CodeEmitter`] strategies render scenario plans into
//! Rust test sources that drive the API with `reqwest`:
//! [`TreeEmitter`] builds token trees and pretty-prints them, and
//! [`TemplateEmitter`] writes text directly. Both consume the same lowering and
//! re-parse every file with `syn` before returning it.
//!
//! [`SuiteGenerator`] runs the whole pipeline and returns a
//! [`GenerationOutput`]; writing to disk is atomic per file.
//!
//! ## Index
//! - Strategies: [`TreeEmitter`], [`TemplateEmitter`]
//! - Pipeline: [`SuiteGenerator`], [`GenerationResult`], [`GeneratedFile`]
//! - Output: [`write_output`], [`check_output`]

pub mod lower;
pub mod output;
pub mod pipeline;
pub mod template;
pub mod tree;
pub mod verify;

pub use lower::RenderSettings;
pub use output::check_output;
pub use output::write_output;
pub use pipeline::GeneratedFile;
pub use pipeline::GenerationOutput;
pub use pipeline::GenerationResult;
pub use pipeline::SuiteGenerator;
pub use pipeline::TESTS_DIR;
pub use template::TemplateEmitter;
pub use tree::TreeEmitter;
pub use verify::verify_source;
