//! Expansion & Specialization Engine (spec.md §4.5): replaces every
//! `Usage` node with the expanded body of the template/custom it names,
//! cascading `inherit` chains and applying `delete`/`insert` edits, and
//! resolves every `Value::VarRef` to its literal. The Registry it reads is
//! shared read-only (`Rc`); this engine only ever clones nodes it is about
//! to mutate for one use site, per DESIGN NOTES §9.

use crate::ast::*;
use crate::config::Config;
use crate::diagnostics::{Diagnostics, ResolveError, Span};
use crate::registry::{Definition, Registry};

pub struct Expander<'a> {
    registry: &'a Registry,
    config: &'a Config,
}

impl<'a> Expander<'a> {
    pub fn new(registry: &'a Registry, config: &'a Config) -> Self {
        Self { registry, config }
    }

    pub fn expand_program(&self, program: &Program, diags: &mut Diagnostics) -> Vec<Node> {
        let mut body = Vec::new();
        for node in &program.body {
            body.extend(self.expand_node(node, None, diags));
        }
        for ns in &program.namespaces {
            for node in &ns.body {
                body.extend(self.expand_node(node, Some(ns.name.as_str()), diags));
            }
        }
        body
    }

    /// Expands a single node, which may fan out into zero or more nodes
    /// (a `Usage` splices in its expansion's top-level nodes; a deleted
    /// usage target vanishes entirely).
    fn expand_node(&self, node: &Node, namespace: Option<&str>, diags: &mut Diagnostics) -> Vec<Node> {
        match node {
            Node::Element(e) => vec![Node::Element(self.expand_element(e, namespace, diags))],
            Node::Text(t) => vec![Node::Text(TextNode {
                value: self.resolve_value(&t.value, namespace, diags),
                span: t.span,
            })],
            Node::Attribute(a) => vec![Node::Attribute(Attribute {
                name: a.name.clone(),
                value: self.resolve_value(&a.value, namespace, diags),
                span: a.span,
            })],
            Node::StyleBlock(sb) => vec![Node::StyleBlock(self.expand_style_block(sb, namespace, diags))],
            Node::ScriptBlock(sb) => vec![Node::ScriptBlock(sb.clone())],
            Node::Usage(usage) => self.expand_usage(usage, namespace, diags),
            Node::Comment(c) => vec![Node::Comment(c.clone())],
            Node::Origin(o) => vec![Node::Origin(self.resolve_origin(o, diags))],
        }
    }

    /// Fills in `placeholder_id` for a bare `[Origin] @Kind name;` reference
    /// from the Registry's named-origin table; a fully-bodied origin passes
    /// through unchanged.
    fn resolve_origin(&self, origin: &OriginBlock, diags: &mut Diagnostics) -> OriginBlock {
        if !origin.placeholder_id.is_empty() {
            return origin.clone();
        }
        let Some(name) = &origin.name else { return origin.clone() };
        match self.registry.lookup_origin(name) {
            Some(def) => OriginBlock {
                kind: def.kind,
                name: def.name.clone(),
                placeholder_id: def.placeholder_id.clone(),
                span: origin.span,
            },
            None => {
                diags.push_error(
                    "E-RES-003",
                    ResolveError::UnknownDefinition(origin.span, "origin", name.clone()).to_string(),
                    origin.span,
                );
                origin.clone()
            }
        }
    }

    fn expand_element(&self, e: &Element, namespace: Option<&str>, diags: &mut Diagnostics) -> Element {
        let attributes = e
            .attributes
            .iter()
            .map(|a| Attribute {
                name: a.name.clone(),
                value: self.resolve_value(&a.value, namespace, diags),
                span: a.span,
            })
            .collect();
        let mut children = Vec::new();
        for child in &e.children {
            children.extend(self.expand_node(child, namespace, diags));
        }
        Element {
            tag: e.tag.clone(),
            attributes,
            children,
            span: e.span,
        }
    }

    fn expand_style_block(&self, sb: &StyleBlock, namespace: Option<&str>, diags: &mut Diagnostics) -> StyleBlock {
        let mut entries = Vec::new();
        for entry in &sb.entries {
            self.expand_style_entry(entry, namespace, diags, &mut entries);
        }
        StyleBlock { entries, span: sb.span }
    }

    fn expand_style_entry(
        &self,
        entry: &StyleEntry,
        namespace: Option<&str>,
        diags: &mut Diagnostics,
        out: &mut Vec<StyleEntry>,
    ) {
        match entry {
            StyleEntry::Property(p) => out.push(StyleEntry::Property(CssProperty {
                name: p.name.clone(),
                value: self.resolve_value(&p.value, namespace, diags),
                span: p.span,
            })),
            StyleEntry::Nested(n) => {
                let mut body = Vec::new();
                for e in &n.body {
                    self.expand_style_entry(e, namespace, diags, &mut body);
                }
                out.push(StyleEntry::Nested(NestedRule {
                    selector: n.selector.clone(),
                    body,
                    span: n.span,
                }));
            }
            StyleEntry::Usage(usage) => {
                if usage.kind != UsageKind::Style {
                    diags.push_warning(
                        "W-EXP-001",
                        "only @Style usages are meaningful inside a style block",
                        usage.span,
                    );
                    return;
                }
                let body = self.resolve_def_body(usage, namespace, diags);
                for node in body {
                    if let Node::Attribute(a) = node {
                        out.push(StyleEntry::Property(CssProperty {
                            name: a.name,
                            value: a.value,
                            span: a.span,
                        }));
                    }
                }
            }
        }
    }

    fn expand_usage(&self, usage: &Usage, namespace: Option<&str>, diags: &mut Diagnostics) -> Vec<Node> {
        match usage.kind {
            UsageKind::Element => self.resolve_def_body(usage, namespace, diags),
            UsageKind::Style => {
                // A bare `@Style Name;` directly inside an element body (not
                // a style block) expands to an inline `style { … }` node.
                let body = self.resolve_def_body(usage, namespace, diags);
                let entries = body
                    .into_iter()
                    .filter_map(|n| match n {
                        Node::Attribute(a) => Some(StyleEntry::Property(CssProperty {
                            name: a.name,
                            value: a.value,
                            span: a.span,
                        })),
                        _ => None,
                    })
                    .collect();
                vec![Node::StyleBlock(StyleBlock { entries, span: usage.span })]
            }
            UsageKind::Var => {
                diags.push_warning(
                    "W-EXP-002",
                    "a bare @Var usage has no attribute or property to attach to",
                    usage.span,
                );
                Vec::new()
            }
        }
    }

    /// Resolves `usage` to the flattened, specialization-applied body of
    /// the definition it names: ancestry (root-first) then the definition's
    /// own body, then `usage.specialization` edits applied in order, then
    /// every resulting node itself expanded (so nested usages cascade).
    fn resolve_def_body(&self, usage: &Usage, namespace: Option<&str>, diags: &mut Diagnostics) -> Vec<Node> {
        let Some(def) = self
            .registry
            .require(usage.namespace.as_deref().or(namespace), usage.kind, &usage.name, usage.span, diags)
            .cloned()
        else {
            return Vec::new();
        };

        let mut merged = self.merged_body(&def, namespace, diags);
        merged = self.apply_specialization(merged, &usage.specialization, namespace, diags);

        merged
            .into_iter()
            .flat_map(|n| self.expand_node(&n, namespace, diags))
            .collect()
    }

    fn merged_body(&self, def: &Definition, namespace: Option<&str>, diags: &mut Diagnostics) -> Vec<Node> {
        let mut merged = Vec::new();
        if self.config.enable_inheritance {
            for ancestor in self.registry.ancestry(namespace, def) {
                merged.extend(own_body(&ancestor).iter().cloned());
            }
        }
        merged.extend(own_body(def).iter().cloned());
        let _ = diags;
        merged
    }

    fn apply_specialization(
        &self,
        mut body: Vec<Node>,
        spec: &[SpecEntry],
        namespace: Option<&str>,
        diags: &mut Diagnostics,
    ) -> Vec<Node> {
        for entry in spec {
            match entry {
                SpecEntry::Delete { selector, span } => {
                    let before = body.len();
                    body.retain(|n| node_selector(n) != Some(selector.as_str()));
                    if body.len() == before {
                        diags.push_warning(
                            "W-SPEC-001",
                            format!("delete target '{}' did not match anything", selector),
                            *span,
                        );
                    }
                }
                SpecEntry::InheritFrom { name, span } => {
                    // additional multiple-inheritance beyond the static parent
                    let kind = body
                        .iter()
                        .find_map(|n| match n {
                            Node::Element(_) => Some(UsageKind::Element),
                            Node::Attribute(_) => Some(UsageKind::Style),
                            _ => None,
                        })
                        .unwrap_or(UsageKind::Element);
                    if let Some(def) = self.registry.lookup(namespace, kind, name).cloned() {
                        let mut extra = self.merged_body(&def, namespace, diags);
                        let mut combined = extra.drain(..).collect::<Vec<_>>();
                        combined.extend(body);
                        body = combined;
                    } else {
                        diags.push_error(
                            "E-SPEC-002",
                            ResolveError::UnknownDefinition(*span, "inherited definition", name.clone())
                                .to_string(),
                            *span,
                        );
                    }
                }
                SpecEntry::Insert { position, selector, nodes, span } => {
                    let mut expanded_nodes = Vec::new();
                    for n in nodes {
                        expanded_nodes.extend(self.expand_node(n, namespace, diags));
                    }
                    body = insert_at(body, *position, selector.as_deref(), expanded_nodes, *span, diags);
                }
            }
        }
        body
    }

    fn resolve_value(&self, value: &Value, namespace: Option<&str>, diags: &mut Diagnostics) -> Value {
        match value {
            Value::Literal(_) => value.clone(),
            Value::VarRef { group, key, span } => {
                match self.resolve_var(group, key, namespace, *span, diags) {
                    Some(literal) => Value::Literal(literal),
                    None => Value::Literal(String::new()),
                }
            }
        }
    }

    fn resolve_var(
        &self,
        group: &str,
        key: &str,
        namespace: Option<&str>,
        span: Span,
        diags: &mut Diagnostics,
    ) -> Option<String> {
        let def = self.registry.require(namespace, UsageKind::Var, group, span, diags)?;
        let merged = self.merged_body(def, namespace, diags);
        for node in merged.iter().rev() {
            if let Node::Attribute(a) = node {
                if a.name == key {
                    if let Value::Literal(lit) = &a.value {
                        return Some(lit.clone());
                    }
                }
            }
        }
        diags.push_error(
            "E-RES-002",
            ResolveError::UnknownVariable(span, key.to_string(), group.to_string()).to_string(),
            span,
        );
        None
    }
}

fn own_body(def: &Definition) -> &[Node] {
    match def {
        Definition::Template(t) => &t.body,
        Definition::Custom(c) => &c.body,
    }
}

fn node_selector(node: &Node) -> Option<&str> {
    match node {
        Node::Element(e) => Some(e.tag.as_str()),
        Node::Attribute(a) => Some(a.name.as_str()),
        _ => None,
    }
}

fn insert_at(
    body: Vec<Node>,
    position: InsertPosition,
    selector: Option<&str>,
    nodes: Vec<Node>,
    span: Span,
    diags: &mut Diagnostics,
) -> Vec<Node> {
    match position {
        InsertPosition::Top => {
            let mut out = nodes;
            out.extend(body);
            out
        }
        InsertPosition::Bottom => {
            let mut out = body;
            out.extend(nodes);
            out
        }
        InsertPosition::Before | InsertPosition::After | InsertPosition::Replace => {
            let sel = match selector {
                Some(s) => s,
                None => {
                    diags.push_error("E-SPEC-003", "insert before/after/replace requires a selector", span);
                    return body;
                }
            };
            match body.iter().position(|n| node_selector(n) == Some(sel)) {
                Some(idx) => {
                    let mut out = Vec::with_capacity(body.len() + nodes.len());
                    out.extend_from_slice(&body[..idx]);
                    match position {
                        InsertPosition::Before => {
                            out.extend(nodes);
                            out.push(body[idx].clone());
                        }
                        InsertPosition::After => {
                            out.push(body[idx].clone());
                            out.extend(nodes);
                        }
                        InsertPosition::Replace => {
                            out.extend(nodes);
                        }
                        InsertPosition::Top | InsertPosition::Bottom => unreachable!(),
                    }
                    out.extend_from_slice(&body[idx + 1..]);
                    out
                }
                None => {
                    diags.push_warning(
                        "W-SPEC-004",
                        format!("insert target '{}' did not match anything", sel),
                        span,
                    );
                    body
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::Span;

    fn style_template(name: &str, parent: Option<&str>, props: &[(&str, &str)]) -> TemplateDef {
        TemplateDef {
            kind: UsageKind::Style,
            name: name.to_string(),
            parent: parent.map(|s| s.to_string()),
            body: props
                .iter()
                .map(|(k, v)| {
                    Node::Attribute(Attribute {
                        name: k.to_string(),
                        value: Value::Literal(v.to_string()),
                        span: Span::default(),
                    })
                })
                .collect(),
            span: Span::default(),
        }
    }

    #[test]
    fn expands_style_usage_into_properties() {
        let mut program = Program::empty();
        program.templates.push(style_template("Base", None, &[("color", "red")]));
        let usage = Usage {
            kind: UsageKind::Style,
            name: "Base".to_string(),
            namespace: None,
            specialization: Vec::new(),
            span: Span::default(),
        };
        let mut diags = Diagnostics::new();
        let cfg = Config::default();
        let registry = Registry::build(&program, &cfg, &mut diags);
        let expander = Expander::new(&registry, &cfg);
        let result = expander.expand_usage(&usage, None, &mut diags);
        assert!(!diags.has_errors());
        let Node::StyleBlock(sb) = &result[0] else { panic!() };
        assert_eq!(sb.entries.len(), 1);
    }

    #[test]
    fn inheritance_merges_parent_then_own_properties() {
        let mut program = Program::empty();
        program.templates.push(style_template("Base", None, &[("color", "red")]));
        program.templates.push(style_template("Derived", Some("Base"), &[("font-size", "10px")]));
        let usage = Usage {
            kind: UsageKind::Style,
            name: "Derived".to_string(),
            namespace: None,
            specialization: Vec::new(),
            span: Span::default(),
        };
        let mut diags = Diagnostics::new();
        let cfg = Config::default();
        let registry = Registry::build(&program, &cfg, &mut diags);
        let expander = Expander::new(&registry, &cfg);
        let result = expander.expand_usage(&usage, None, &mut diags);
        let Node::StyleBlock(sb) = &result[0] else { panic!() };
        assert_eq!(sb.entries.len(), 2);
    }

    #[test]
    fn delete_specialization_removes_property() {
        let mut program = Program::empty();
        program.templates.push(style_template("Base", None, &[("color", "red"), ("font-size", "10px")]));
        let usage = Usage {
            kind: UsageKind::Style,
            name: "Base".to_string(),
            namespace: None,
            specialization: vec![SpecEntry::Delete { selector: "color".to_string(), span: Span::default() }],
            span: Span::default(),
        };
        let mut diags = Diagnostics::new();
        let cfg = Config::default();
        let registry = Registry::build(&program, &cfg, &mut diags);
        let expander = Expander::new(&registry, &cfg);
        let result = expander.expand_usage(&usage, None, &mut diags);
        let Node::StyleBlock(sb) = &result[0] else { panic!() };
        assert_eq!(sb.entries.len(), 1);
    }
}
