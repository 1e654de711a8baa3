//! The single tagged-variant AST (spec.md §3, DESIGN NOTES §9) used for
//! every syntactic form CHTL recognizes, in place of a deep trait-object
//! hierarchy: one `Node` enum, matched with `match` at each phase boundary.

use crate::diagnostics::Span;
use crate::scanner::FragmentKind;

#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    pub config: Option<ConfigBlock>,
    pub imports: Vec<ImportDirective>,
    pub namespaces: Vec<Namespace>,
    pub templates: Vec<TemplateDef>,
    pub customs: Vec<CustomDef>,
    pub origins: Vec<OriginBlock>,
    pub body: Vec<Node>,
}

impl Program {
    pub fn empty() -> Self {
        Self {
            config: None,
            imports: Vec::new(),
            namespaces: Vec::new(),
            templates: Vec::new(),
            customs: Vec::new(),
            origins: Vec::new(),
            body: Vec::new(),
        }
    }
}

/// Every syntactic construct the Parser produces, after the grammar has
/// disambiguated it, unified under one tag instead of per-kind types.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(TextNode),
    Attribute(Attribute),
    StyleBlock(StyleBlock),
    ScriptBlock(ScriptBlock),
    Usage(Usage),
    Comment(String),
    Origin(OriginBlock),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    pub tag: String,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextNode {
    pub value: Value,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub name: String,
    pub value: Value,
    pub span: Span,
}

/// An attribute or property value: a literal, or a reference into a
/// variable group (`Var(GroupName, KeyName)`) resolved during expansion.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Literal(String),
    VarRef { group: String, key: String, span: Span },
}

#[derive(Debug, Clone, PartialEq)]
pub struct StyleBlock {
    pub entries: Vec<StyleEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StyleEntry {
    Property(CssProperty),
    Usage(Usage),
    Nested(NestedRule),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CssProperty {
    pub name: String,
    pub value: Value,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NestedRule {
    pub selector: String,
    pub body: Vec<StyleEntry>,
    pub span: Span,
}

/// A `script { … }` body is always an opaque handle: the Scanner already
/// partitioned it into ordered CHTL_JS/JS fragments, and the Parser merely
/// records the sequence of placeholder ids that make up the block.
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptBlock {
    pub placeholder_ids: Vec<String>,
    pub span: Span,
}

/// A `@Style Name`, `@Element Name`, or `@Var Name` usage, optionally
/// followed by a specialization block (`delete`/`insert`/`inherit` entries).
#[derive(Debug, Clone, PartialEq)]
pub struct Usage {
    pub kind: UsageKind,
    pub name: String,
    pub namespace: Option<String>,
    pub specialization: Vec<SpecEntry>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UsageKind {
    Style,
    Element,
    Var,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TemplateDef {
    pub kind: UsageKind,
    pub name: String,
    pub parent: Option<String>,
    pub body: Vec<Node>,
    pub span: Span,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CustomDef {
    pub kind: UsageKind,
    pub name: String,
    pub parent: Option<String>,
    pub body: Vec<Node>,
    pub span: Span,
}

/// Delete/insert/inherit specialization entries applied to a usage site,
/// per spec.md §4.5.
#[derive(Debug, Clone, PartialEq)]
pub enum SpecEntry {
    Delete { selector: String, span: Span },
    Insert { position: InsertPosition, selector: Option<String>, nodes: Vec<Node>, span: Span },
    InheritFrom { name: String, span: Span },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertPosition {
    Top,
    Bottom,
    Before,
    After,
    Replace,
}

/// `[Origin] @Html|@Style|@JavaScript [name] { … }` — opaque content keyed
/// by an optional reusable name (spec.md §6.1 supplement, grounded in
/// `original_source/.../origin_embed.cpp`'s named-origin pattern).
#[derive(Debug, Clone, PartialEq)]
pub struct OriginBlock {
    pub kind: FragmentKind,
    pub name: Option<String>,
    pub placeholder_id: String,
    pub span: Span,
}

/// `[Import] @Kind from path [as alias]`, including wildcard submodule
/// imports (spec.md §6.3 supplement).
#[derive(Debug, Clone, PartialEq)]
pub struct ImportDirective {
    pub kind: ImportKind,
    pub path: String,
    pub alias: Option<String>,
    pub wildcard: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportKind {
    Chtl,
    Style,
    JavaScript,
    Html,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Namespace {
    pub name: String,
    pub body: Vec<Node>,
    pub span: Span,
}

/// `[Configuration] { Name { … } }` — keyword/option aliasing (spec.md
/// §6.2 supplement).
#[derive(Debug, Clone, PartialEq)]
pub struct ConfigBlock {
    pub aliases: Vec<(String, String)>,
    pub span: Span,
}
