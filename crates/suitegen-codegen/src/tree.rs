// crates/suitegen-codegen/src/tree.rs
// ============================================================================
// Module: Syntax Tree Emitter
// Description: Token-tree rendering of lowered scenarios.
// Purpose: Primary code synthesis strategy with structural output.
// Dependencies: proc-macro2, quote, syn, prettyplease
// ============================================================================

//! ## Overview
//! [`TreeEmitter`] builds every item with `quote!` so generated code is a
//! token tree from the start. Operation fragments are token streams in their
//! textual form; [`CodeEmitter::assemble_file`] re-parses them with the file
//! header and pretty-prints the whole file.
//!
//! # Invariants
//! - Every fragment parses as a sequence of items.
//! - Assembled files are `prettyplease` output and parse with `syn`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use proc_macro2::Literal;
use proc_macro2::TokenStream;
use quote::format_ident;
use quote::quote;
use suitegen_config::EmitterStrategy;
use suitegen_core::CodeEmitter;
use suitegen_core::FileContext;
use suitegen_core::GenerationError;
use suitegen_core::ScenarioPlan;

use crate::lower::BASE_URL_ENV_VAR;
use crate::lower::BODY_FAILURE;
use crate::lower::LoweredOperation;
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
use crate::verify::verify_items;
use crate::verify::verify_source;

// ============================================================================
// SECTION: Emitter
// ============================================================================

/// Token-tree code emitter.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeEmitter {
    /// Rendering switches.
    settings: RenderSettings,
}

impl TreeEmitter {
    /// Builds an emitter.
    #[must_use]
    pub const fn new(settings: RenderSettings) -> Self {
        Self {
            settings,
        }
    }

    /// Renders the items of a lowered operation.
    fn operation_tokens(&self, lowered: &LoweredOperation) -> Result<TokenStream, GenerationError> {
        let mut tokens = TokenStream::new();
        for mock in &lowered.mocks {
            let name = checked_ident(&mock.name)?;
            let json = Literal::string(&mock.json);
            tokens.extend(quote! {
                const #name: &str = #json;
            });
        }
        for test in &lowered.tests {
            tokens.extend(self.test_tokens(test)?);
        }
        Ok(tokens)
    }

    /// Renders one test function.
    fn test_tokens(&self, test: &TestFunction) -> Result<TokenStream, GenerationError> {
        let name = checked_ident(&test.name)?;
        let doc = Literal::string(&test.doc);
        let body: TokenStream =
            test.statements.iter().map(|statement| statement_tokens(statement, self.settings.async_mode)).collect();
        Ok(if self.settings.async_mode {
            quote! {
                #[doc = #doc]
                #[tokio::test]
                async fn #name() {
                    #body
                }
            }
        } else {
            quote! {
                #[doc = #doc]
                #[test]
                fn #name() {
                    #body
                }
            }
        })
    }
}

impl CodeEmitter for TreeEmitter {
    fn strategy(&self) -> EmitterStrategy {
        EmitterStrategy::Tree
    }

    fn emit_operation(&self, plan: &ScenarioPlan) -> Result<String, GenerationError> {
        let lowered = lower_plan(plan, self.settings)?;
        let tokens = self.operation_tokens(&lowered)?;
        verify_items(tokens.clone())?;
        Ok(tokens.to_string())
    }

    fn assemble_file(&self, context: &FileContext, fragments: &[String]) -> Result<String, GenerationError> {
        let mut source = header_tokens(context)?.to_string();
        for fragment in fragments {
            source.push('\n');
            source.push_str(fragment);
        }
        let file = verify_source(&source)?;
        let rendered = prettyplease::unparse(&file);
        verify_source(&rendered)?;
        Ok(rendered)
    }
}

// ============================================================================
// SECTION: Items
// ============================================================================

/// Renders the file header: docs, lint allowances, and shared helpers.
fn header_tokens(context: &FileContext) -> Result<TokenStream, GenerationError> {
    let docs: Vec<Literal> = file_doc_lines(&context.group).iter().map(|line| Literal::string(line)).collect();
    let server = Literal::string(&context.server_url);
    let env_var = Literal::string(BASE_URL_ENV_VAR);
    let mut tokens = quote! {
        #(#![doc = #docs])*
        #![allow(dead_code)]

        const BASE_URL: &str = #server;

        fn base_url() -> String {
            std::env::var(#env_var).unwrap_or_else(|_| BASE_URL.to_string())
        }
    };
    if context.needs_auth {
        let auth_var = Literal::string(&context.auth_env_var);
        tokens.extend(quote! {
            fn auth_token() -> String {
                std::env::var(#auth_var).unwrap_or_default()
            }
        });
    }
    if !context.schemas.is_empty() {
        let mut constants = TokenStream::new();
        for (name, json) in schema_constants(&context.schemas) {
            let name = checked_ident(&name)?;
            let json = Literal::string(json);
            constants.extend(quote! {
                pub const #name: &str = #json;
            });
        }
        tokens.extend(quote! {
            mod schemas {
                #constants
            }
        });
    }
    Ok(tokens)
}

/// Renders one statement.
fn statement_tokens(statement: &Statement, async_mode: bool) -> TokenStream {
    let wait = if async_mode { quote!(.await) } else { TokenStream::new() };
    match statement {
        Statement::Client => {
            if async_mode {
                quote! { let client = reqwest::Client::new(); }
            } else {
                quote! { let client = reqwest::blocking::Client::new(); }
            }
        }
        Statement::Url {
            path,
        } => {
            let path = Literal::string(path);
            quote! { let url = format!("{}{}", base_url(), #path); }
        }
        Statement::Request {
            method,
            mutable,
        } => {
            let method = format_ident!("{}", method.as_upper());
            if *mutable {
                quote! { let mut request = client.request(reqwest::Method::#method, &url); }
            } else {
                quote! { let request = client.request(reqwest::Method::#method, &url); }
            }
        }
        Statement::Query {
            name,
            value,
        } => {
            let name = Literal::string(name);
            let value = value_tokens(value);
            quote! { request = request.query(&[(#name, #value)]); }
        }
        Statement::Header {
            name,
            value,
        } => {
            let name = Literal::string(name);
            let value = value_tokens(value);
            quote! { request = request.header(#name, #value); }
        }
        Statement::JsonBody {
            json,
        } => {
            let json = Literal::string(json);
            let failure = Literal::string(PAYLOAD_FAILURE);
            quote! {
                let payload: serde_json::Value = serde_json::from_str(#json).expect(#failure);
                request = request.json(&payload);
            }
        }
        Statement::FormBody {
            fields,
        } => {
            let pairs = fields.iter().map(|(name, value)| {
                let name = Literal::string(name);
                let value = Literal::string(value);
                quote! { (#name, #value) }
            });
            quote! { request = request.form(&[#(#pairs),*]); }
        }
        Statement::StartTimer => quote! { let started = std::time::Instant::now(); },
        Statement::Send => {
            let failure = Literal::string(SEND_FAILURE);
            quote! { let response = request.send() #wait .expect(#failure); }
        }
        Statement::AssertStatus(status) => {
            let status = Literal::u16_unsuffixed(*status);
            quote! { assert_eq!(response.status().as_u16(), #status); }
        }
        Statement::ParseJson {
            used,
        } => {
            let failure = Literal::string(BODY_FAILURE);
            let binding = if *used { format_ident!("body") } else { format_ident!("_body") };
            quote! { let #binding: serde_json::Value = response.json() #wait .expect(#failure); }
        }
        Statement::AssertField(field) => {
            let message = Literal::string(&missing_field_message(field));
            let field = Literal::string(field);
            quote! { assert!(body.get(#field).is_some(), #message); }
        }
        Statement::AssertElapsed(threshold) => {
            let message = Literal::string(&latency_message(*threshold));
            let threshold = Literal::u64_unsuffixed(*threshold);
            quote! { assert!(started.elapsed() <= std::time::Duration::from_millis(#threshold), #message); }
        }
    }
}

/// Renders a string-valued expression.
fn value_tokens(value: &ValueExpr) -> TokenStream {
    match value {
        ValueExpr::Literal(text) => {
            let text = Literal::string(text);
            quote!(#text)
        }
        ValueExpr::Token {
            prefix,
        } if prefix.is_empty() => quote!(auth_token()),
        ValueExpr::Token {
            prefix,
        } => {
            let prefix = Literal::string(prefix);
            quote!(format!("{}{}", #prefix, auth_token()))
        }
    }
}

#[cfg(test)]
mod tests;
