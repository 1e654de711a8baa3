//! Compiler-wide configuration, threaded by value into every phase.
//!
//! There is no global mutable state in this crate (see DESIGN.md); every
//! constructor that needs to make a policy decision — strict vs. lenient
//! redeclaration, wide vs. strict scanner judgment, whether to consult the
//! cross-unit module cache, whether inheritance is honored at all, whether
//! to emit verbose tracing — takes a `Config` instead of reading a static.

use std::collections::BTreeMap;

/// Policy knobs shared by the Scanner, Lexer, Parser, Registry and Generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Promote duplicate-definition and missing-variable warnings to errors.
    pub strict: bool,
    /// Scanner fragment-kind judgment: wide (marker anywhere) vs strict
    /// (structural marker only). Defaults to wide per spec.
    pub wide_scan: bool,
    /// Whether `[Import]` resolution consults the cross-unit module cache.
    pub enable_cache: bool,
    /// Whether `inherit` / parent chains are expanded at all. Disabling this
    /// is mainly useful for diagnosing whether a bug lives in inheritance or
    /// elsewhere; template/custom definitions with a parent are expanded as
    /// if the parent were absent when this is `false`.
    pub enable_inheritance: bool,
    /// Raise tracing verbosity to `debug` for every phase.
    pub debug: bool,
    /// Keyword/option renames declared by a `[Configuration]` block, e.g.
    /// mapping `"Style"` to a project-chosen alias. Empty by default.
    pub keyword_aliases: BTreeMap<String, String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            strict: false,
            wide_scan: true,
            enable_cache: true,
            enable_inheritance: true,
            debug: false,
            keyword_aliases: BTreeMap::new(),
        }
    }
}

impl Config {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn strict(mut self, value: bool) -> Self {
        self.strict = value;
        self
    }

    pub fn wide_scan(mut self, value: bool) -> Self {
        self.wide_scan = value;
        self
    }

    pub fn debug(mut self, value: bool) -> Self {
        self.debug = value;
        self
    }

    /// Resolve a canonical keyword name through any `[Configuration]`-declared
    /// alias, falling back to the canonical name itself.
    pub fn resolve_alias<'a>(&'a self, canonical: &'a str) -> &'a str {
        self.keyword_aliases
            .iter()
            .find(|(_, v)| v.as_str() == canonical)
            .map(|(k, _)| k.as_str())
            .unwrap_or(canonical)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_wide_and_lenient() {
        let cfg = Config::default();
        assert!(!cfg.strict);
        assert!(cfg.wide_scan);
        assert!(cfg.enable_cache);
        assert!(cfg.enable_inheritance);
    }

    #[test]
    fn builder_methods_chain() {
        let cfg = Config::new().strict(true).wide_scan(false).debug(true);
        assert!(cfg.strict);
        assert!(!cfg.wide_scan);
        assert!(cfg.debug);
    }
}
