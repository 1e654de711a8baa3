//! Code Generator (spec.md §4.6): walks the fully expanded AST emitting HTML
//! to one stream and global CSS to another, then restores Scanner
//! placeholders into their final positions verbatim. By the time a tree
//! reaches here every `Usage` has been replaced and every `Value` resolved
//! to a literal (Expansion & Specialization Engine, expand.rs) — the
//! Generator only ever serializes, it never resolves or specializes.

use crate::ast::*;
use crate::diagnostics::{Diagnostics, EmitError, Span};
use crate::encode;
use crate::scanner::{FragmentKind, PlaceholderMap};
use std::collections::HashMap;
use std::fmt::Write as _;

/// Tags that self-close (`<tag … />`) rather than take a matching close tag
/// — spec.md §4.6's fixed list, a trimmed subset of the teacher's
/// `Element::is_void()` list in `eze-works-toph/src/node.rs` (drops
/// `!DOCTYPE`, which has no CHTL equivalent; `[Origin] @Html` covers
/// verbatim markup instead).
const VOID_ELEMENTS: &[&str] = &[
    "br", "hr", "img", "input", "meta", "link", "area", "base", "col", "embed", "source", "track", "wbr",
];

fn is_void(tag: &str) -> bool {
    VOID_ELEMENTS.contains(&tag)
}

/// Renders a post-expansion `Value`. Every `VarRef` should already have been
/// resolved to a `Literal` by the Expansion Engine; one surviving here is an
/// internal inconsistency, not a user error, so it renders as empty rather
/// than panicking.
fn value_text(value: &Value) -> &str {
    match value {
        Value::Literal(s) => s.as_str(),
        Value::VarRef { .. } => "",
    }
}

pub struct Generator<'a> {
    placeholders: &'a PlaceholderMap,
    class_counters: HashMap<String, u32>,
}

impl<'a> Generator<'a> {
    pub fn new(placeholders: &'a PlaceholderMap) -> Self {
        Self {
            placeholders,
            class_counters: HashMap::new(),
        }
    }

    /// Emits the whole expanded body, returning `(html, css)`.
    pub fn generate(&mut self, body: &[Node], diags: &mut Diagnostics) -> (String, String) {
        let mut html = String::new();
        let mut css = String::new();
        for node in body {
            self.emit_node(node, &mut html, &mut css, diags);
        }
        (html, css)
    }

    fn emit_node(&mut self, node: &Node, html: &mut String, css: &mut String, diags: &mut Diagnostics) {
        match node {
            Node::Element(e) => self.emit_element(e, html, css, diags),
            Node::Text(t) => {
                html.push_str(&encode::html(value_text(&t.value)));
            }
            // A bare Attribute reaching the generator has no element to
            // attach to (it only appears this way inside an unexpanded Var
            // definition body, which never reaches here) — nothing to emit.
            Node::Attribute(_) => {}
            // A StyleBlock is only meaningful as a direct child of an
            // Element, which consumes it in `emit_element` before recursing
            // into the remaining children; one reached standalone (a bare
            // top-level `style { ... }`) has no selector to attach to.
            Node::StyleBlock(_) => {}
            Node::ScriptBlock(sb) => self.emit_script(sb, html, diags),
            // Every Usage should have been replaced during expansion; one
            // surviving here indicates an unresolved reference already
            // reported as a ResolveError, so it is silently dropped.
            Node::Usage(_) => {}
            Node::Comment(_) => {}
            Node::Origin(o) => self.emit_origin(o, html, css, diags),
        }
    }

    fn emit_element(&mut self, e: &Element, html: &mut String, css: &mut String, diags: &mut Diagnostics) {
        let mut inline_props: Vec<&CssProperty> = Vec::new();
        let mut nested_rules: Vec<&NestedRule> = Vec::new();
        for child in &e.children {
            if let Node::StyleBlock(sb) = child {
                for entry in &sb.entries {
                    match entry {
                        StyleEntry::Property(p) => inline_props.push(p),
                        StyleEntry::Nested(n) => nested_rules.push(n),
                        // Expansion already inlined every style Usage into
                        // Property/Nested entries; none should remain.
                        StyleEntry::Usage(_) => {}
                    }
                }
            }
        }

        let auto_class = if nested_rules.is_empty() {
            None
        } else {
            Some(self.next_auto_class(&e.tag))
        };

        self.emit_open_tag(e, &inline_props, auto_class.as_deref(), html);

        if is_void(&e.tag) {
            self.hoist_nested_rules(&nested_rules, auto_class.as_deref(), css);
            return;
        }

        for child in &e.children {
            match child {
                Node::StyleBlock(_) => {}
                other => self.emit_node(other, html, css, diags),
            }
        }

        let _ = write!(html, "</{}>", e.tag);
        self.hoist_nested_rules(&nested_rules, auto_class.as_deref(), css);
    }

    fn emit_open_tag(
        &self,
        e: &Element,
        inline_props: &[&CssProperty],
        auto_class: Option<&str>,
        html: &mut String,
    ) {
        let _ = write!(html, "<{}", e.tag);
        let mut wrote_class = false;
        for attr in &e.attributes {
            if attr.name == "class" {
                wrote_class = true;
                let mut value = value_text(&attr.value).to_string();
                if let Some(auto) = auto_class {
                    value.push(' ');
                    value.push_str(auto);
                }
                let _ = write!(html, " class=\"{}\"", encode::attr(&value));
                continue;
            }
            let _ = write!(html, " {}=\"{}\"", attr.name, encode::attr(value_text(&attr.value)));
        }
        if !wrote_class {
            if let Some(auto) = auto_class {
                let _ = write!(html, " class=\"{}\"", auto);
            }
        }
        if !inline_props.is_empty() {
            let style_value: String = inline_props
                .iter()
                .map(|p| format!("{}: {}; ", p.name, value_text(&p.value)))
                .collect();
            let _ = write!(html, " style=\"{}\"", encode::attr(style_value.trim_end()));
        }
        if is_void(&e.tag) {
            html.push_str(" />");
        } else {
            html.push('>');
        }
    }

    fn next_auto_class(&mut self, tag: &str) -> String {
        let counter = self.class_counters.entry(tag.to_string()).or_insert(0);
        let class = format!("{}-{}", tag, counter);
        *counter += 1;
        class
    }

    /// Hoists every `NestedRule` captured inside this element's style block
    /// into the CSS stream, scoped under `auto_class` — `&` inside a nested
    /// selector substitutes the scoping selector directly (pseudo-class/
    /// pseudo-element attachment); any other selector text is appended as a
    /// descendant combinator (spec.md §4.6 "hoisted... with the enclosing
    /// element's auto-generated class", resolved here per DESIGN.md).
    fn hoist_nested_rules(&self, rules: &[&NestedRule], auto_class: Option<&str>, css: &mut String) {
        let Some(auto_class) = auto_class else { return };
        let scope = format!(".{}", auto_class);
        for rule in rules {
            let selector = combine_selector(&scope, &rule.selector);
            write_css_rule(&selector, &rule.body, css);
        }
    }

    fn emit_script(&mut self, sb: &ScriptBlock, html: &mut String, diags: &mut Diagnostics) {
        html.push_str("<script>");
        for id in &sb.placeholder_ids {
            self.restore_placeholder(id, sb.span, html, diags);
        }
        html.push_str("</script>");
    }

    /// `[Origin]` content restores verbatim into whichever stream matches
    /// its language tag: `@Html` splices directly into the HTML stream,
    /// `@Style` into the CSS stream, `@JavaScript` (and any pass-through
    /// CHTL-JS) wraps in a `<script>` tag like an ordinary script block.
    fn emit_origin(&mut self, o: &OriginBlock, html: &mut String, css: &mut String, diags: &mut Diagnostics) {
        match o.kind {
            FragmentKind::Html => self.restore_placeholder(&o.placeholder_id, o.span, html, diags),
            FragmentKind::Css => self.restore_placeholder(&o.placeholder_id, o.span, css, diags),
            FragmentKind::Js | FragmentKind::ChtlJs => {
                html.push_str("<script>");
                self.restore_placeholder(&o.placeholder_id, o.span, html, diags);
                html.push_str("</script>");
            }
        }
    }

    fn restore_placeholder(&self, id: &str, span: Span, out: &mut String, diags: &mut Diagnostics) {
        match self.placeholders.get(id) {
            Some(entry) => out.push_str(&entry.text),
            None => {
                diags.push_error(
                    "E-EMIT-001",
                    EmitError::MissingPlaceholder(id.to_string()).to_string(),
                    span,
                );
                out.push_str(id);
            }
        }
    }
}

/// Combines a parent selector/scope with a nested selector: `&` substitutes
/// the parent directly (`&:hover` under `.div-0` becomes `.div-0:hover`);
/// anything else is joined with a descendant combinator.
fn combine_selector(parent: &str, child: &str) -> String {
    match child.strip_prefix('&') {
        Some(rest) => format!("{}{}", parent, rest),
        None => format!("{} {}", parent, child),
    }
}

fn write_css_rule(selector: &str, body: &[StyleEntry], css: &mut String) {
    let mut props = String::new();
    let mut nested = Vec::new();
    for entry in body {
        match entry {
            StyleEntry::Property(p) => {
                let _ = write!(props, "{}: {}; ", p.name, value_text(&p.value));
            }
            StyleEntry::Nested(n) => nested.push(n),
            StyleEntry::Usage(_) => {}
        }
    }
    let _ = writeln!(css, "{} {{ {}}}", selector, props.trim_end());
    for n in nested {
        let selector = combine_selector(selector, &n.selector);
        write_css_rule(&selector, &n.body, css);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Span;

    fn literal(s: &str) -> Value {
        Value::Literal(s.to_string())
    }

    #[test]
    fn emits_void_element_self_closed() {
        let placeholders = PlaceholderMap::new();
        let mut gen = Generator::new(&placeholders);
        let mut diags = Diagnostics::new();
        let el = Element {
            tag: "img".to_string(),
            attributes: vec![Attribute { name: "src".to_string(), value: literal("a.png"), span: Span::default() }],
            children: Vec::new(),
            span: Span::default(),
        };
        let (html, _) = gen.generate(&[Node::Element(el)], &mut diags);
        assert_eq!(html, r#"<img src="a.png" />"#);
    }

    #[test]
    fn merges_inline_style_properties_in_order() {
        let placeholders = PlaceholderMap::new();
        let mut gen = Generator::new(&placeholders);
        let mut diags = Diagnostics::new();
        let style = StyleBlock {
            entries: vec![
                StyleEntry::Property(CssProperty { name: "color".to_string(), value: literal("blue"), span: Span::default() }),
                StyleEntry::Property(CssProperty { name: "color".to_string(), value: literal("red"), span: Span::default() }),
            ],
            span: Span::default(),
        };
        let el = Element {
            tag: "div".to_string(),
            attributes: Vec::new(),
            children: vec![Node::StyleBlock(style)],
            span: Span::default(),
        };
        let (html, _) = gen.generate(&[Node::Element(el)], &mut diags);
        assert_eq!(html, r#"<div style="color: blue; color: red;"></div>"#);
    }

    #[test]
    fn hoists_nested_rule_under_auto_class() {
        let placeholders = PlaceholderMap::new();
        let mut gen = Generator::new(&placeholders);
        let mut diags = Diagnostics::new();
        let nested = NestedRule {
            selector: "&:hover".to_string(),
            body: vec![StyleEntry::Property(CssProperty {
                name: "color".to_string(),
                value: literal("green"),
                span: Span::default(),
            })],
            span: Span::default(),
        };
        let style = StyleBlock { entries: vec![StyleEntry::Nested(nested)], span: Span::default() };
        let el = Element {
            tag: "div".to_string(),
            attributes: Vec::new(),
            children: vec![Node::StyleBlock(style)],
            span: Span::default(),
        };
        let (html, css) = gen.generate(&[Node::Element(el)], &mut diags);
        assert!(html.contains(r#"class="div-0""#));
        assert!(css.contains(".div-0:hover { color: green; }"));
    }

    #[test]
    fn escapes_text_content() {
        let placeholders = PlaceholderMap::new();
        let mut gen = Generator::new(&placeholders);
        let mut diags = Diagnostics::new();
        let text = Node::Text(TextNode { value: literal("<b>"), span: Span::default() });
        let (html, _) = gen.generate(&[text], &mut diags);
        assert_eq!(html, "&lt;b&gt;");
    }

    #[test]
    fn restores_script_placeholder_content() {
        let mut placeholders = PlaceholderMap::new();
        let cfg = crate::config::Config::default();
        let scanner = crate::scanner::Scanner::new(&cfg);
        let mut diags = Diagnostics::new();
        let (_, map) = scanner.scan(r#"script { console.log("hi"); }"#, &mut diags);
        placeholders = map;
        let id = placeholders.iter().next().unwrap().identifier();
        let mut gen = Generator::new(&placeholders);
        let sb = Node::ScriptBlock(ScriptBlock { placeholder_ids: vec![id], span: Span::default() });
        let (html, _) = gen.generate(&[sb], &mut diags);
        assert_eq!(html, r#"<script>console.log("hi");</script>"#);
    }

    #[test]
    fn missing_placeholder_reports_emit_error() {
        let placeholders = PlaceholderMap::new();
        let mut gen = Generator::new(&placeholders);
        let mut diags = Diagnostics::new();
        let sb = Node::ScriptBlock(ScriptBlock { placeholder_ids: vec!["__CHTL_PH_9__".to_string()], span: Span::default() });
        let (html, _) = gen.generate(&[sb], &mut diags);
        assert!(diags.has_errors());
        assert!(html.contains("__CHTL_PH_9__"));
    }
}
