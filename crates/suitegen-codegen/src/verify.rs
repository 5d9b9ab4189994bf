// crates/suitegen-codegen/src/verify.rs
// ============================================================================
// Module: Syntax Verification
// Description: Parse checks for generated identifiers and files.
// Purpose: Reject emitter output that is not valid Rust before it is written.
// Dependencies: syn, proc-macro2
// ============================================================================

//! ## Overview
//! Every file an emitter assembles is parsed back with `syn`; a failure is a
//! [`GenerationError::Generation`] so recovery can try the other strategy.

// ============================================================================
// SECTION: Imports
// ============================================================================

use proc_macro2::TokenStream;
use suitegen_core::GenerationError;
use syn::Ident;

// ============================================================================
// SECTION: Checks
// ============================================================================

/// Parses an identifier, rejecting keywords and invalid characters.
///
/// # Errors
///
/// Returns [`GenerationError::Generation`] when `raw` is not a plain identifier.
pub fn checked_ident(raw: &str) -> Result<Ident, GenerationError> {
    syn::parse_str::<Ident>(raw).map_err(|err| GenerationError::Generation(format!("invalid identifier {raw}: {err}")))
}

/// Parses a complete source file.
///
/// # Errors
///
/// Returns [`GenerationError::Generation`] with the parser message when the
/// source does not parse.
pub fn verify_source(source: &str) -> Result<syn::File, GenerationError> {
    syn::parse_file(source).map_err(|err| GenerationError::Generation(format!("generated source does not parse: {err}")))
}

/// Parses a token stream as a sequence of items.
///
/// # Errors
///
/// Returns [`GenerationError::Generation`] when the tokens are not items.
pub fn verify_items(tokens: TokenStream) -> Result<syn::File, GenerationError> {
    syn::parse2::<syn::File>(tokens)
        .map_err(|err| GenerationError::Generation(format!("generated items do not parse: {err}")))
}
