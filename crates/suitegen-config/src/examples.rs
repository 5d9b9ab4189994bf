// crates/suitegen-config/src/examples.rs
// ============================================================================
// Module: Options Examples
// Description: Canonical example options payload.
// Purpose: Deterministic example for docs and tests.
// Dependencies: std
// ============================================================================

//! ## Overview
//! Canonical example `suitegen.toml`. The example spells out every default
//! and is kept loadable by the crate tests.

/// Returns a canonical example `suitegen.toml` configuration.
#[must_use]
pub fn options_toml_example() -> String {
    String::from(
        r#"framework = "reqwest"
output_dir = "generated-tests"
include_types = false
generate_mocks = false
include_examples = false
strict_mode = false
async_mode = false
include_performance = false
performance_threshold_ms = 1000
error_status_fallback = [400, 401, 422, 500]
synthesis_mode = "typical"
grouping = "tag"
emitter = "tree"
# server_url = "https://api.example.com"
# auth_profile = "staging"
api_key_header = "X-API-Key"

[concurrency]
max_workers = 4
batch_size = 10
memory_threshold_mb = 512
chunk_size = 100
timeout_ms = 30000
per_operation_memory_kb = 1024
streaming = false
cache_enabled = true
direct_threshold = 50

[recovery]
retry_attempts = 3
retry_delay_ms = 100
"#,
    )
}
