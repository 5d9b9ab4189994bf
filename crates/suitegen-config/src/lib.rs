// crates/suitegen-config/src/lib.rs
// ============================================================================
// Module: Suitegen Config Library
// Description: Canonical generation options, validation, and examples.
// Purpose: Single source of truth for suitegen.toml semantics.
// Dependencies: serde, thiserror, toml
// ============================================================================

//! ## Overview
//! `suitegen-config` defines [`GenerationOptions`], the value every pipeline
//! stage reads its knobs from. Options load from TOML with strict size and
//! path limits and validate fail-closed.
//!
//! Security posture: config inputs are untrusted.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod examples;
pub mod options;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use examples::options_toml_example;
pub use options::*;
