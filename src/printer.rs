//! Canonical pretty-printer (spec.md §8 property 2: "parsing an AST's
//! serialized form ... produces the same AST"). Exists only to support that
//! round-trip property in tests — nothing in the compile pipeline calls it.

use crate::ast::*;

/// Renders `program`'s body (and any template/custom definitions) back into
/// CHTL source text that re-parses to a structurally equivalent AST.
pub fn print_program(program: &Program) -> String {
    let mut out = String::new();
    for t in &program.templates {
        print_def(&mut out, "Template", t.kind, &t.name, t.parent.as_deref(), &t.body);
    }
    for c in &program.customs {
        print_def(&mut out, "Custom", c.kind, &c.name, c.parent.as_deref(), &c.body);
    }
    for node in &program.body {
        print_node(&mut out, node);
    }
    out
}

fn print_def(out: &mut String, header: &str, kind: UsageKind, name: &str, parent: Option<&str>, body: &[Node]) {
    out.push_str("[");
    out.push_str(header);
    out.push_str("] @");
    out.push_str(kind_tag(kind));
    out.push(' ');
    out.push_str(name);
    if let Some(p) = parent {
        out.push_str(" : ");
        out.push_str(p);
    }
    out.push_str(" { ");
    for node in body {
        print_node(out, node);
    }
    out.push_str("} ");
}

fn kind_tag(kind: UsageKind) -> &'static str {
    match kind {
        UsageKind::Style => "Style",
        UsageKind::Element => "Element",
        UsageKind::Var => "Var",
    }
}

fn print_value(out: &mut String, value: &Value) {
    match value {
        Value::Literal(s) => {
            out.push('"');
            out.push_str(&s.replace('\\', "\\\\").replace('"', "\\\""));
            out.push('"');
        }
        Value::VarRef { group, key, .. } => {
            out.push_str(group);
            out.push('(');
            out.push_str(key);
            out.push(')');
        }
    }
}

fn print_node(out: &mut String, node: &Node) {
    match node {
        Node::Element(e) => {
            out.push_str(&e.tag);
            out.push_str(" { ");
            for attr in &e.attributes {
                print_attribute(out, attr);
            }
            for child in &e.children {
                print_node(out, child);
            }
            out.push_str("} ");
        }
        Node::Text(t) => {
            out.push_str("text { ");
            print_value(out, &t.value);
            out.push_str(" } ");
        }
        Node::Attribute(a) => print_attribute(out, a),
        Node::StyleBlock(sb) => {
            out.push_str("style { ");
            for entry in &sb.entries {
                print_style_entry(out, entry);
            }
            out.push_str("} ");
        }
        Node::ScriptBlock(sb) => {
            out.push_str("script { ");
            for id in &sb.placeholder_ids {
                out.push_str(id);
                out.push(' ');
            }
            out.push_str("} ");
        }
        Node::Usage(u) => print_usage(out, u),
        Node::Comment(_) => {}
        Node::Origin(o) => {
            out.push_str("[Origin] @");
            out.push_str(match o.kind {
                crate::scanner::FragmentKind::Css => "Style",
                crate::scanner::FragmentKind::Js | crate::scanner::FragmentKind::ChtlJs => "JavaScript",
                crate::scanner::FragmentKind::Html => "Html",
            });
            if let Some(name) = &o.name {
                out.push(' ');
                out.push_str(name);
            }
            out.push_str(" { ");
            out.push_str(&o.placeholder_id);
            out.push_str(" } ");
        }
    }
}

fn print_attribute(out: &mut String, attr: &Attribute) {
    out.push_str(&attr.name);
    out.push_str(": ");
    print_value(out, &attr.value);
    out.push_str("; ");
}

fn print_style_entry(out: &mut String, entry: &StyleEntry) {
    match entry {
        StyleEntry::Property(p) => {
            out.push_str(&p.name);
            out.push_str(": ");
            print_value(out, &p.value);
            out.push_str("; ");
        }
        StyleEntry::Usage(u) => print_usage(out, u),
        StyleEntry::Nested(n) => {
            out.push_str(&n.selector);
            out.push_str(" { ");
            for e in &n.body {
                print_style_entry(out, e);
            }
            out.push_str("} ");
        }
    }
}

fn print_usage(out: &mut String, u: &Usage) {
    out.push('@');
    out.push_str(kind_tag(u.kind));
    out.push(' ');
    out.push_str(&u.name);
    if let Some(ns) = &u.namespace {
        out.push_str(" from ");
        out.push_str(ns);
    }
    if u.specialization.is_empty() {
        out.push_str("; ");
        return;
    }
    out.push_str(" { ");
    for entry in &u.specialization {
        match entry {
            SpecEntry::Delete { selector, .. } => {
                out.push_str("delete ");
                out.push_str(selector);
                out.push_str("; ");
            }
            SpecEntry::InheritFrom { name, .. } => {
                out.push_str("inherit ");
                out.push_str(name);
                out.push_str("; ");
            }
            SpecEntry::Insert { position, selector, nodes, .. } => {
                out.push_str("insert ");
                print_insert_position(out, *position, selector.as_deref());
                out.push_str(" { ");
                for n in nodes {
                    print_node(out, n);
                }
                out.push_str("} ");
            }
        }
    }
    out.push_str("} ");
}

fn print_insert_position(out: &mut String, position: InsertPosition, selector: Option<&str>) {
    match position {
        InsertPosition::Top => out.push_str("at top"),
        InsertPosition::Bottom => out.push_str("at bottom"),
        InsertPosition::Before => {
            out.push_str("before ");
            out.push_str(selector.unwrap_or(""));
        }
        InsertPosition::After => {
            out.push_str("after ");
            out.push_str(selector.unwrap_or(""));
        }
        InsertPosition::Replace => {
            out.push_str("replace ");
            out.push_str(selector.unwrap_or(""));
        }
    }
}

/// Zeroes every [`crate::diagnostics::Span`] in a program so two ASTs parsed
/// from differently-formatted (but semantically identical) source compare
/// equal — used by the parse-idempotence property test, which cares that
/// structure round-trips, not that positions match byte-for-byte.
pub fn strip_spans(program: &mut Program) {
    use crate::diagnostics::Span;
    const ZERO: Span = Span::new(0, 0);

    fn strip_value(v: &mut Value) {
        match v {
            Value::Literal(_) => {}
            Value::VarRef { span, .. } => *span = ZERO,
        }
    }

    fn strip_node(n: &mut Node) {
        match n {
            Node::Element(e) => {
                e.span = ZERO;
                for a in &mut e.attributes {
                    a.span = ZERO;
                    strip_value(&mut a.value);
                }
                for c in &mut e.children {
                    strip_node(c);
                }
            }
            Node::Text(t) => {
                t.span = ZERO;
                strip_value(&mut t.value);
            }
            Node::Attribute(a) => {
                a.span = ZERO;
                strip_value(&mut a.value);
            }
            Node::StyleBlock(sb) => {
                sb.span = ZERO;
                for e in &mut sb.entries {
                    strip_style_entry(e);
                }
            }
            Node::ScriptBlock(sb) => sb.span = ZERO,
            Node::Usage(u) => strip_usage(u),
            Node::Comment(_) => {}
            Node::Origin(o) => o.span = ZERO,
        }
    }

    fn strip_style_entry(e: &mut StyleEntry) {
        match e {
            StyleEntry::Property(p) => {
                p.span = ZERO;
                strip_value(&mut p.value);
            }
            StyleEntry::Usage(u) => strip_usage(u),
            StyleEntry::Nested(n) => {
                n.span = ZERO;
                for e in &mut n.body {
                    strip_style_entry(e);
                }
            }
        }
    }

    fn strip_usage(u: &mut Usage) {
        u.span = ZERO;
        for entry in &mut u.specialization {
            match entry {
                SpecEntry::Delete { span, .. } => *span = ZERO,
                SpecEntry::InheritFrom { span, .. } => *span = ZERO,
                SpecEntry::Insert { span, nodes, .. } => {
                    *span = ZERO;
                    for n in nodes {
                        strip_node(n);
                    }
                }
            }
        }
    }

    for t in &mut program.templates {
        t.span = ZERO;
        for n in &mut t.body {
            strip_node(n);
        }
    }
    for c in &mut program.customs {
        c.span = ZERO;
        for n in &mut c.body {
            strip_node(n);
        }
    }
    for n in &mut program.body {
        strip_node(n);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::diagnostics::Diagnostics;
    use crate::lexer::Lexer;
    use crate::scanner::Scanner;
    use crate::parser::Parser;

    fn parse(src: &str) -> Program {
        let cfg = Config::default();
        let mut diags = Diagnostics::new();
        let scanner = Scanner::new(&cfg);
        let (text, placeholders) = scanner.scan(src, &mut diags);
        let tokens = Lexer::new(&text, &cfg).tokenize(&mut diags);
        assert!(!diags.has_errors(), "{:?}", diags.errors().collect::<Vec<_>>());
        Parser::new(tokens, &placeholders).parse_program(&mut diags)
    }

    #[test]
    fn printed_program_reparses_to_equivalent_ast() {
        let src = r#"
            [Template] @Style Base { color: "red"; }
            div { id: "x"; text { "hi" } style { @Style Base; } }
        "#;
        let mut original = parse(src);
        let printed = print_program(&original);
        let mut reparsed = parse(&printed);
        strip_spans(&mut original);
        strip_spans(&mut reparsed);
        assert_eq!(original.templates, reparsed.templates);
        assert_eq!(original.body, reparsed.body);
    }
}
