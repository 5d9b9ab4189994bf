// crates/suitegen-codegen/src/template.rs
// ============================================================================
// Module: Template Emitter
// Description: String-template rendering of lowered scenarios.
// Purpose: Fallback code synthesis strategy with hand-laid formatting.
// Dependencies: proc-macro2, syn
// ============================================================================

//! ## Overview
//! [`TemplateEmitter`] writes source text line by line. It renders the same
//! tokens as the tree emitter, so re-formatting its output yields the tree
//! emitter's file, but the text itself keeps its own layout. String literals
//! are produced by `proc_macro2` so escaping matches across strategies.
//!
//! # Invariants
//! - Fragments and assembled files parse with `syn` before they are returned.

// ============================================================================
// SECTION: Imports
// ============================================================================

use proc_macro2::Literal;
use suitegen_config::EmitterStrategy;
use suitegen_core::CodeEmitter;
use suitegen_core::FileContext;
use suitegen_core::GenerationError;
use suitegen_core::ScenarioPlan;

use crate::lower::BASE_URL_ENV_VAR;
use crate::lower::BODY_FAILURE;
use crate::lower::PAYLOAD_FAILURE;
use crate::lower::RenderSettings;
use crate::lower::SEND_FAILURE;
use crate::lower::Statement;
use crate::lower::TestFunction;
use crate::lower::ValueExpr;
use crate::lower::file_doc_lines;
use crate::lower::latency_message;
use crate::lower::lower_plan;
use crate::lower::missing_field_message;
use crate::lower::schema_constants;
use crate::verify::checked_ident;
use crate::verify::verify_source;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Indentation of function bodies.
const INDENT: &str = "    ";

// ============================================================================
// SECTION: Emitter
// ============================================================================

/// String-template code emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEmitter {
    /// Rendering switches.
    settings: RenderSettings,
}

impl TemplateEmitter {
    /// Builds an emitter.
    #[must_use]
    pub const fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
        }
    }

    /// Renders one test function.
    fn render_test(&self, test: &TestFunction, out: &mut String) -> Result<(), GenerationError> {
        let name = checked_ident(&test.name)?;
        out.push_str(&format!("///{}\n", test.doc));
        if self.settings.async_mode {
            out.push_str(&format!("#[tokio::test]\nasync fn {name}() {{\n"));
        } else {
            out.push_str(&format!("#[test]\nfn {name}() {{\n"));
        }
        for statement in &test.statements {
            for line in statement_lines(statement, self.settings.async_mode) {
                out.push_str(INDENT);
                out.push_str(&line);
                out.push('\n');
            }
        }
        out.push_str("}\n");
        Ok(())
    }
}

impl CodeEmitter for TemplateEmitter {
    fn strategy(&self) -> EmitterStrategy {
        EmitterStrategy::Template
    }

    fn emit_operation(&self, plan: &ScenarioPlan) -> Result<String, GenerationError> {
        let lowered = lower_plan(plan, self.settings)?;
        let mut out = String::new();
        for mock in &lowered.mocks {
            let name = checked_ident(&mock.name)?;
            out.push_str(&format!("const {name}: &str = {};\n\n", literal(&mock.json)));
        }
        for (position, test) in lowered.tests.iter().enumerate() {
            if position > 0 {
                out.push('\n');
            }
            self.render_test(test, &mut out)?;
        }
        verify_source(&out)?;
        Ok(out)
    }

    fn assemble_file(&self, context: &FileContext, fragments: &[String]) -> Result<String, GenerationError> {
        let mut out = header_text(context)?;
        for fragment in fragments {
            out.push('\n');
            out.push_str(fragment);
        }
        verify_source(&out)?;
        Ok(out)
    }
}

// ============================================================================
// SECTION: Text
// ============================================================================

/// Renders a Rust string literal.
fn literal(text: &str) -> String {
    Literal::string(text).to_string()
}

/// Renders the file header: docs, lint allowances, and shared helpers.
fn header_text(context: &FileContext) -> Result<String, GenerationError> {
    let mut out = String::new();
    for line in file_doc_lines(&context.group) {
        out.push_str(&format!("//!{line}\n"));
    }
    out.push_str("#![allow(dead_code)]\n\n");
    out.push_str(&format!("const BASE_URL: &str = {};\n\n", literal(&context.server_url)));
    out.push_str("fn base_url() -> String {\n");
    out.push_str(&format!(
        "{INDENT}std::env::var({}).unwrap_or_else(|_| BASE_URL.to_string())\n",
        literal(BASE_URL_ENV_VAR)
    ));
    out.push_str("}\n");
    if context.needs_auth {
        out.push_str("\nfn auth_token() -> String {\n");
        out.push_str(&format!("{INDENT}std::env::var({}).unwrap_or_default()\n", literal(&context.auth_env_var)));
        out.push_str("}\n");
    }
    if !context.schemas.is_empty() {
        out.push_str("\nmod schemas {\n");
        for (name, json) in schema_constants(&context.schemas) {
            let name = checked_ident(&name)?;
            out.push_str(&format!("{INDENT}pub const {name}: &str = {};\n", literal(json)));
        }
        out.push_str("}\n");
    }
    Ok(out)
}

/// Renders one statement as source lines.
fn statement_lines(statement: &Statement, async_mode: bool) -> Vec<String> {
    let wait = if async_mode { ".await" } else { "" };
    match statement {
        Statement::Client => {
            let client = if async_mode { "reqwest::Client" } else { "reqwest::blocking::Client" };
            vec![format!("let client = {client}::new();")]
        }
        Statement::Url {
            path,
        } => vec![format!("let url = format!(\"{{}}{{}}\", base_url(), {});", literal(path))],
        Statement::Request {
            method,
            mutable,
        } => {
            let binding = if *mutable { "let mut request" } else { "let request" };
            vec![format!("{binding} = client.request(reqwest::Method::{}, &url);", method.as_upper())]
        }
        Statement::Query {
            name,
            value,
        } => vec![format!("request = request.query(&[({}, {})]);", literal(name), value_text(value))],
        Statement::Header {
            name,
            value,
        } => vec![format!("request = request.header({}, {});", literal(name), value_text(value))],
        Statement::JsonBody {
            json,
        } => vec![
            format!(
                "let payload: serde_json::Value = serde_json::from_str({}).expect({});",
                literal(json),
                literal(PAYLOAD_FAILURE)
            ),
            "request = request.json(&payload);".to_string(),
        ],
        Statement::FormBody {
            fields,
        } => {
            let pairs: Vec<String> =
                fields.iter().map(|(name, value)| format!("({}, {})", literal(name), literal(value))).collect();
            vec![format!("request = request.form(&[{}]);", pairs.join(", "))]
        }
        Statement::StartTimer => vec!["let started = std::time::Instant::now();".to_string()],
        Statement::Send => vec![format!("let response = request.send(){wait}.expect({});", literal(SEND_FAILURE))],
        Statement::AssertStatus(status) => vec![format!("assert_eq!(response.status().as_u16(), {status});")],
        Statement::ParseJson {
            used,
        } => {
            let binding = if *used { "body" } else { "_body" };
            vec![format!("let {binding}: serde_json::Value = response.json(){wait}.expect({});", literal(BODY_FAILURE))]
        }
        Statement::AssertField(field) => vec![format!(
            "assert!(body.get({}).is_some(), {});",
            literal(field),
            literal(&missing_field_message(field))
        )],
        Statement::AssertElapsed(threshold) => vec![format!(
            "assert!(started.elapsed() <= std::time::Duration::from_millis({threshold}), {});",
            literal(&latency_message(*threshold))
        )],
    }
}

/// Renders a string-valued expression.
fn value_text(value: &ValueExpr) -> String {
    match value {
        ValueExpr::Literal(text) => literal(text),
        ValueExpr::Token {
            prefix,
        } if prefix.is_empty() => "auth_token()".to_string(),
        ValueExpr::Token {
            prefix,
        } => format!("format!(\"{{}}{{}}\", {}, auth_token())", literal(prefix)),
    }
}
