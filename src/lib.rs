//! CHTL: a templated markup language compiling to HTML, CSS and JavaScript.
//!
//! This crate implements the compiler front-end and code generator (spec.md
//! §1): Unified Scanner → Lexer → Parser → Definition Registry → Expansion &
//! Specialization Engine → Code Generator. [`compile`] runs the whole
//! pipeline over one compilation unit and returns a [`CompileResult`]; each
//! phase is also exposed as its own module for callers that want to drive
//! the pipeline by hand (e.g. to inject resolved `[Import]`s, see
//! [`compile_with_loader`]).

pub mod ast;
pub mod codegen;
pub mod config;
pub mod diagnostics;
pub mod encode;
pub mod expand;
pub mod import;
pub mod lexer;
pub mod parser;
pub mod printer;
pub mod registry;
pub mod scanner;
pub mod token;

pub use config::Config;
pub use diagnostics::{Diagnostic, Diagnostics, Severity};

use diagnostics::Span;
use import::{import_kind_filter, ModuleCache, ModuleLoader};
use registry::Registry;
use std::path::Path;

/// The result of compiling one CHTL source unit (spec.md §6): the emitted
/// HTML and CSS streams plus every diagnostic recorded along the way,
/// already partitioned by severity.
#[derive(Debug, Clone)]
pub struct CompileResult {
    pub html: String,
    pub css: String,
    pub warnings: Vec<Diagnostic>,
    pub errors: Vec<Diagnostic>,
}

impl CompileResult {
    /// Whether the process should exit non-zero for this result (spec.md
    /// §6: "exit code 1 on any error").
    pub fn failed(&self) -> bool {
        !self.errors.is_empty()
    }
}

/// Runs the full pipeline over `source` with no `[Import]` resolution —
/// any `[Import]` directive is recorded as an unresolved reference and its
/// body-site usages fail to resolve. Use [`compile_with_loader`] when the
/// source has imports to satisfy.
#[tracing::instrument(level = "debug", skip_all)]
pub fn compile(source: &str, config: &Config) -> CompileResult {
    compile_with_loader(source, config, None, None)
}

/// Runs the full pipeline, additionally resolving `[Import]` directives
/// through `loader`/`cache` (spec.md §5's cross-unit module cache). Passing
/// `None` for either skips import resolution, matching [`compile`].
#[tracing::instrument(level = "debug", skip_all)]
pub fn compile_with_loader(
    source: &str,
    config: &Config,
    loader: Option<&dyn ModuleLoader>,
    cache: Option<&ModuleCache>,
) -> CompileResult {
    let mut diags = Diagnostics::new();

    tracing::debug!(bytes = source.len(), "starting compilation unit");

    let scanner = scanner::Scanner::new(config);
    let (scanned_text, placeholders) = scanner.scan(source, &mut diags);
    tracing::debug!(placeholders = placeholders.len(), "scan complete");

    let tokens = lexer::Lexer::new(&scanned_text, config).tokenize(&mut diags);
    tracing::debug!(tokens = tokens.len(), "lex complete");

    let program = parser::Parser::new(tokens, &placeholders).parse_program(&mut diags);
    tracing::debug!(
        templates = program.templates.len(),
        customs = program.customs.len(),
        imports = program.imports.len(),
        "parse complete"
    );

    let mut registry = Registry::build(&program, config, &mut diags);

    if let (Some(loader), Some(cache)) = (loader, cache) {
        resolve_imports(&program, &mut registry, loader, cache, config, &mut diags);
    } else if !program.imports.is_empty() {
        diags.push_warning(
            "W-IMPORT-001",
            "[Import] directives present but no module loader was supplied; imported names will not resolve",
            Span::default(),
        );
    }

    let expander = expand::Expander::new(&registry, config);
    let expanded = expander.expand_program(&program, &mut diags);
    tracing::debug!(nodes = expanded.len(), "expansion complete");

    let mut generator = codegen::Generator::new(&placeholders);
    let (html, css) = generator.generate(&expanded, &mut diags);
    tracing::debug!(html_bytes = html.len(), css_bytes = css.len(), "generation complete");

    let (warnings, errors) = diags.into_parts();
    CompileResult { html, css, warnings, errors }
}

fn resolve_imports(
    program: &ast::Program,
    registry: &mut Registry,
    loader: &dyn ModuleLoader,
    cache: &ModuleCache,
    config: &Config,
    diags: &mut Diagnostics,
) {
    for directive in &program.imports {
        let normalized = import::normalize_module_path(&directive.path);
        let path = Path::new(&normalized);
        let Some(module) = cache.load(loader, path, config, diags) else {
            continue;
        };
        let namespace = directive.alias.clone().unwrap_or_default();
        let kind_filter = import_kind_filter(directive);
        let requested = import::single_requested_name(directive);
        let names = requested.as_ref().map(std::slice::from_ref);
        registry.import_from(&module.registry, &namespace, kind_filter, names, diags);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compiles_minimal_element() {
        let result = compile(r#"div { id: "x"; text { "hi" } }"#, &Config::default());
        assert!(!result.failed(), "{:?}", result.errors);
        assert!(result.html.contains(r#"<div id="x">hi</div>"#));
    }

    #[test]
    fn compiles_template_with_inheritance() {
        let src = r#"
            [Template] @Style BaseStyle { color: blue; font-weight: bold; }
            [Template] @Style FullStyle { inherit BaseStyle; font-size: 20px; color: red; }
            div { style { @Style FullStyle; } }
        "#;
        let result = compile(src, &Config::default());
        assert!(!result.failed(), "{:?}", result.errors);
        let style_start = result.html.find("style=\"").unwrap();
        let style_value = &result.html[style_start..];
        let color_blue = style_value.find("color: blue").unwrap();
        let font_weight = style_value.find("font-weight: bold").unwrap();
        let font_size = style_value.find("font-size: 20px").unwrap();
        let color_red = style_value.find("color: red").unwrap();
        assert!(color_blue < font_weight && font_weight < font_size && font_size < color_red);
    }

    #[test]
    fn reports_unresolved_import_as_warning_without_loader() {
        let src = r#"[Import] from ui.kit; div { text { "x" } }"#;
        let result = compile(src, &Config::default());
        assert!(result.warnings.iter().any(|w| w.code == "W-IMPORT-001"));
    }
}
