//! Position tracking, the typed error taxonomy, and the diagnostics sink
//! that every phase reports into instead of terminating the compilation.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// A source location, attached to every token, AST node and diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub line: u32,
    pub column: u32,
}

impl Span {
    pub const fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Unbalanced boundaries or unterminated comments the Scanner finds inside a
/// captured foreign-language range.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("{0}: unbalanced delimiters in {1} fragment starting here")]
    UnbalancedDelimiters(Span, &'static str),
    #[error("{0}: unterminated comment inside captured region")]
    UnterminatedComment(Span),
}

/// Lexer-level failures: these halt tokenization (the lexer emits an EOF
/// token and stops), per spec.md §4.2.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LexError {
    #[error("{0}: unterminated string literal")]
    UnterminatedString(Span),
    #[error("{0}: unterminated block comment")]
    UnterminatedBlockComment(Span),
    #[error("{0}: invalid escape sequence '\\{1}'")]
    InvalidEscape(Span, char),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("{0}: unexpected token {1:?}")]
    UnexpectedToken(Span, String),
    #[error("{0}: expected {1} but found {2:?}")]
    Expected(Span, &'static str, String),
    #[error("{0}: missing terminator {1:?}")]
    MissingTerminator(Span, &'static str),
    #[error("{0}: malformed {1} header")]
    MalformedHeader(Span, &'static str),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResolveError {
    #[error("{0}: unknown {1} '{2}'")]
    UnknownDefinition(Span, &'static str, String),
    #[error("{0}: '{1}' has kind {2} but was used as {3}")]
    KindMismatch(Span, String, &'static str, &'static str),
    #[error("{0}: unknown variable '{1}' in group '{2}'")]
    UnknownVariable(Span, String, String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CycleError {
    #[error("{0}: inheritance cycle detected involving '{1}'")]
    InheritanceCycle(Span, String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SpecError {
    #[error("{0}: specialization target '{1}' does not exist")]
    UnknownTarget(Span, String),
    #[error("{0}: insert {1} references unknown selector '{2}'")]
    UnknownSelector(Span, &'static str, String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("internal invariant violated during emission: {0}")]
    InvariantViolated(String),
    #[error("placeholder '{0}' missing from the scanner's placeholder map")]
    MissingPlaceholder(String),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ImportError {
    #[error("module not found at {0}")]
    NotFound(PathBuf),
    #[error("{0}: malformed module file ({1})")]
    MalformedModule(Span, &'static str),
}

/// The umbrella error, used only for the truly-fatal internal path: an
/// `EmitError` invariant violation. Every other phase error is recorded in
/// a [`Diagnostics`] sink and the corresponding phase recovers.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompileError {
    #[error(transparent)]
    Emit(#[from] EmitError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub severity: Severity,
    pub code: &'static str,
    pub message: String,
    pub file: Option<PathBuf>,
    pub line: u32,
    pub column: u32,
}

impl Diagnostic {
    pub fn warning(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Warning,
            code,
            message: message.into(),
            file: None,
            line: span.line,
            column: span.column,
        }
    }

    pub fn error(code: &'static str, message: impl Into<String>, span: Span) -> Self {
        Self {
            severity: Severity::Error,
            code,
            message: message.into(),
            file: None,
            line: span.line,
            column: span.column,
        }
    }

    pub fn with_file(mut self, file: PathBuf) -> Self {
        self.file = Some(file);
        self
    }
}

/// Accumulates diagnostics across every phase. Passed by `&mut` reference;
/// no phase ever aborts the whole compilation unit because of a recoverable
/// error — it records one here and keeps going (spec.md §7).
#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    records: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        tracing::debug!(code = diagnostic.code, severity = ?diagnostic.severity, "diagnostic recorded");
        self.records.push(diagnostic);
    }

    pub fn push_warning(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::warning(code, message, span));
    }

    pub fn push_error(&mut self, code: &'static str, message: impl Into<String>, span: Span) {
        self.push(Diagnostic::error(code, message, span));
    }

    /// Record a warning, or an error if `strict` is set — the mechanism
    /// `--strict` uses to promote duplicate-definition and missing-variable
    /// warnings (spec.md §7).
    pub fn push_strict(
        &mut self,
        strict: bool,
        code: &'static str,
        message: impl Into<String>,
        span: Span,
    ) {
        if strict {
            self.push_error(code, message, span);
        } else {
            self.push_warning(code, message, span);
        }
    }

    pub fn has_errors(&self) -> bool {
        self.records.iter().any(|d| d.severity == Severity::Error)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| d.severity == Severity::Warning)
    }

    pub fn errors(&self) -> impl Iterator<Item = &Diagnostic> {
        self.records.iter().filter(|d| d.severity == Severity::Error)
    }

    pub fn into_parts(self) -> (Vec<Diagnostic>, Vec<Diagnostic>) {
        let (errors, warnings): (Vec<_>, Vec<_>) = self
            .records
            .into_iter()
            .partition(|d| d.severity == Severity::Error);
        (warnings, errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strict_promotes_warning_to_error() {
        let mut sink = Diagnostics::new();
        sink.push_strict(true, "W001", "duplicate definition", Span::new(1, 1));
        assert!(sink.has_errors());

        let mut sink = Diagnostics::new();
        sink.push_strict(false, "W001", "duplicate definition", Span::new(1, 1));
        assert!(!sink.has_errors());
    }

    #[test]
    fn partitions_warnings_and_errors() {
        let mut sink = Diagnostics::new();
        sink.push_warning("W1", "w", Span::default());
        sink.push_error("E1", "e", Span::default());
        let (warnings, errors) = sink.into_parts();
        assert_eq!(warnings.len(), 1);
        assert_eq!(errors.len(), 1);
    }
}
