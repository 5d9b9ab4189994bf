// crates/suitegen-codegen/src/output.rs
// ============================================================================
// Module: Output Writing
// Description: Atomic file writes and drift checks for generated suites.
// Purpose: Never leave a partially written test file behind.
// Dependencies: suitegen-core
// ============================================================================

//! ## Overview
//! Files are written to a uniquely named temporary sibling, synced, and then
//! renamed over the destination. [`check_output`] compares generated contents
//! against files on disk so CI can detect stale suites.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;

use suitegen_core::GenerationError;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Attempts made to allocate a unique temporary file.
const TEMP_ATTEMPTS: usize = 16;
/// Process-wide temporary file counter.
static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

// ============================================================================
// SECTION: Writes
// ============================================================================

/// Writes `contents` to `path` atomically, creating parent directories.
///
/// # Errors
///
/// Returns [`GenerationError::Io`] when any filesystem step fails; the
/// temporary file is removed on failure.
pub fn write_output(path: &Path, contents: &str) -> Result<(), GenerationError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| GenerationError::Io(err.to_string()))?;
    }
    let (temp_path, mut file) = create_temp_output(path)?;
    if let Err(err) = file.write_all(contents.as_bytes()) {
        let _ = fs::remove_file(&temp_path);
        return Err(GenerationError::Io(err.to_string()));
    }
    if let Err(err) = file.sync_all() {
        let _ = fs::remove_file(&temp_path);
        return Err(GenerationError::Io(err.to_string()));
    }
    persist_temp_output(&temp_path, path)
}

/// Compares generated contents against the file at `path`.
///
/// # Errors
///
/// Returns [`GenerationError::Io`] when the file cannot be read and
/// [`GenerationError::Validation`] when it differs.
pub fn check_output(path: &Path, contents: &str) -> Result<(), GenerationError> {
    let existing = fs::read_to_string(path).map_err(|err| GenerationError::Io(format!("{}: {err}", path.display())))?;
    if existing != contents {
        return Err(GenerationError::Validation(format!(
            "generated suite drift detected for {}; run suitegen generate",
            path.display()
        )));
    }
    Ok(())
}

// ============================================================================
// SECTION: Temporary Files
// ============================================================================

/// Creates a unique temporary output file alongside the destination.
fn create_temp_output(path: &Path) -> Result<(PathBuf, fs::File), GenerationError> {
    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| GenerationError::Io("output path does not include a file name".to_string()))?;
    for _ in 0 .. TEMP_ATTEMPTS {
        let attempt = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let temp_path = parent.join(format!(".{file_name}.tmp.{}.{attempt}", std::process::id()));
        match OpenOptions::new().write(true).create_new(true).open(&temp_path) {
            Ok(file) => return Ok((temp_path, file)),
            Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
            Err(err) => return Err(GenerationError::Io(err.to_string())),
        }
    }
    Err(GenerationError::Io("failed to allocate temporary output path".to_string()))
}

/// Renames the temporary file over the destination.
fn persist_temp_output(temp_path: &Path, path: &Path) -> Result<(), GenerationError> {
    match fs::rename(temp_path, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            if path.exists() {
                fs::remove_file(path).map_err(|err| GenerationError::Io(err.to_string()))?;
                fs::rename(temp_path, path).map_err(|err| GenerationError::Io(err.to_string()))?;
                return Ok(());
            }
            let _ = fs::remove_file(temp_path);
            Err(GenerationError::Io(err.to_string()))
        }
    }
}
