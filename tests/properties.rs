//! Quantified invariants from spec.md §8, exercised as black-box tests
//! against the public API (`chtl::compile`, `chtl::registry::Registry`,
//! `chtl::scanner::Scanner`, `chtl::printer::print_program`).

use chtl::ast::{Program, TemplateDef, UsageKind};
use chtl::config::Config;
use chtl::diagnostics::{Diagnostics, Span};
use chtl::lexer::Lexer;
use chtl::parser::Parser;
use chtl::printer;
use chtl::registry::Registry;
use chtl::scanner::Scanner;

fn parse(src: &str) -> (Program, Diagnostics) {
    let cfg = Config::default();
    let mut diags = Diagnostics::new();
    let scanner = Scanner::new(&cfg);
    let (text, placeholders) = scanner.scan(src, &mut diags);
    let tokens = Lexer::new(&text, &cfg).tokenize(&mut diags);
    let program = Parser::new(tokens, &placeholders).parse_program(&mut diags);
    (program, diags)
}

/// Property 1 (lex-round-trip, subset): a source with no comments and only
/// well-formed strings tokenizes the same way whether read directly or
/// re-tokenized from its own lexeme-joined reconstruction.
#[test]
fn lex_round_trip_subset() {
    let cfg = Config::default();
    let src = r#"div { id: "x"; text { "hi there" } }"#;
    let mut diags = Diagnostics::new();
    let scanner = Scanner::new(&cfg);
    let (scanned, _) = scanner.scan(src, &mut diags);
    let tokens = Lexer::new(&scanned, &cfg).tokenize(&mut diags);
    assert!(!diags.has_errors());

    let reconstructed: String = tokens
        .iter()
        .filter(|t| !t.is_eof())
        .map(|t| match &t.kind {
            chtl::token::TokenKind::StringLiteral(s) => format!("\"{}\" ", s.replace('"', "\\\"")),
            _ => format!("{} ", t.lexeme),
        })
        .collect();

    let mut diags2 = Diagnostics::new();
    let retokens = Lexer::new(&reconstructed, &cfg).tokenize(&mut diags2);
    assert!(!diags2.has_errors());

    let kinds: Vec<_> = tokens.iter().map(|t| format!("{:?}", t.kind)).collect();
    let re_kinds: Vec<_> = retokens.iter().map(|t| format!("{:?}", t.kind)).collect();
    assert_eq!(kinds, re_kinds);
}

/// Property 2 (parse idempotence): printing an AST and reparsing it yields a
/// structurally equivalent AST (spans stripped, since printed source has
/// different positions by construction).
#[test]
fn parse_idempotence() {
    let src = r#"
        [Template] @Style Base { color: "red"; }
        [Custom] @Element Box { span { text { "hi" } } }
        div { id: "x"; style { @Style Base; } text { "ok" } }
    "#;
    let (mut original, diags) = parse(src);
    assert!(!diags.has_errors());
    let printed = printer::print_program(&original);
    let (mut reparsed, diags2) = parse(&printed);
    assert!(!diags2.has_errors(), "{:?}", diags2.errors().collect::<Vec<_>>());

    printer::strip_spans(&mut original);
    printer::strip_spans(&mut reparsed);
    assert_eq!(original.templates, reparsed.templates);
    assert_eq!(original.customs, reparsed.customs);
    assert_eq!(original.body, reparsed.body);
}

/// Property 3 (acyclic registry): after every `register`, a DFS from every
/// node terminates and no node is its own ancestor.
#[test]
fn acyclic_registry_has_no_self_ancestor() {
    let mut program = Program::empty();
    program.templates.push(TemplateDef {
        kind: UsageKind::Style,
        name: "Root".into(),
        parent: None,
        body: Vec::new(),
        span: Span::default(),
    });
    program.templates.push(TemplateDef {
        kind: UsageKind::Style,
        name: "Mid".into(),
        parent: Some("Root".into()),
        body: Vec::new(),
        span: Span::default(),
    });
    program.templates.push(TemplateDef {
        kind: UsageKind::Style,
        name: "Leaf".into(),
        parent: Some("Mid".into()),
        body: Vec::new(),
        span: Span::default(),
    });
    let mut diags = Diagnostics::new();
    let registry = Registry::build(&program, &Config::default(), &mut diags);
    assert!(!diags.has_errors());

    for name in ["Root", "Mid", "Leaf"] {
        let def = registry.lookup(None, UsageKind::Style, name).unwrap().clone();
        let ancestry = registry.ancestry(None, &def);
        assert!(
            !ancestry.iter().any(|d| d.name() == name),
            "'{name}' must not be its own ancestor"
        );
    }
}

/// Property 4 (expansion preserves user order): delete removes by key only;
/// insert at top/bottom places at the extremes; before/after place relative
/// to the matched entry.
#[test]
fn expansion_preserves_order_and_specialization_placement() {
    let src = r#"
        [Template] @Style Base { color: red; font-size: 10px; font-weight: bold; }
        div { style {
            @Style Base {
                delete font-size;
                insert at top { margin: 0; }
                insert after color { text-decoration: underline; }
            }
        } }
    "#;
    let result = chtl::compile(src, &Config::default());
    assert!(!result.failed(), "{:?}", result.errors);
    let style_start = result.html.find("style=\"").unwrap();
    let style_value = &result.html[style_start..];
    let margin = style_value.find("margin: 0").unwrap();
    let color = style_value.find("color: red").unwrap();
    let underline = style_value.find("text-decoration: underline").unwrap();
    let weight = style_value.find("font-weight: bold").unwrap();
    assert!(!style_value.contains("font-size"));
    assert!(margin < color && color < underline && underline < weight);
}

/// Property 5 (variable resolution totality): a resolving VarUsage emits
/// exactly the stored literal, with no interpolation.
#[test]
fn variable_resolution_is_exact_literal() {
    let src = r#"
        [Template] @Var Theme { primary: "#123abc"; }
        div { style { color: Theme(primary); } }
    "#;
    let result = chtl::compile(src, &Config::default());
    assert!(!result.failed(), "{:?}", result.errors);
    assert!(result.html.contains("color: #123abc;"));
}

/// Property 6 (placeholder round-trip): restoring every placeholder the
/// Scanner produced reproduces the original fragment text byte-exactly.
#[test]
fn placeholder_round_trip_is_byte_exact() {
    let cfg = Config::default();
    let scanner = Scanner::new(&cfg);
    let mut diags = Diagnostics::new();
    let body = r#"let x = 1; if (x) { y("a } b"); }"#;
    let src = format!("div {{ script {{ {body} }} }}");
    let (_, map) = scanner.scan(&src, &mut diags);
    let restored: String = map.iter().map(|e| e.text.clone()).collect();
    assert_eq!(restored.trim(), body);
}
