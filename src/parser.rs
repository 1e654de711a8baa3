//! Recursive-descent parser (spec.md §4.3): one token of lookahead is
//! enough to disambiguate every production in this grammar. Builds the
//! single tagged `Node` AST (ast.rs) and recovers from a malformed
//! statement by synchronizing to the next `;` or `}` instead of aborting.

use crate::ast::*;
use crate::diagnostics::{Diagnostics, ParseError, Span};
use crate::scanner::PlaceholderMap;
use crate::token::{Keyword, Punct, Token, TokenKind};

pub struct Parser<'a> {
    tokens: Vec<Token>,
    pos: usize,
    placeholders: &'a PlaceholderMap,
}

impl<'a> Parser<'a> {
    pub fn new(tokens: Vec<Token>, placeholders: &'a PlaceholderMap) -> Self {
        Self {
            tokens,
            pos: 0,
            placeholders,
        }
    }

    pub fn parse_program(mut self, diags: &mut Diagnostics) -> Program {
        let mut program = Program::empty();
        while !self.at_eof() {
            match self.parse_top_level_item(diags) {
                TopLevel::Config(c) => program.config = Some(c),
                TopLevel::Import(i) => program.imports.push(i),
                TopLevel::Namespace(n) => program.namespaces.push(n),
                TopLevel::Template(t) => program.templates.push(t),
                TopLevel::Custom(c) => program.customs.push(c),
                TopLevel::Origin(o) => program.origins.push(o),
                TopLevel::Node(n) => program.body.push(n),
                TopLevel::Skip => {}
            }
        }
        program
    }

    // ---- token stream helpers ----

    fn at_eof(&self) -> bool {
        self.tokens.get(self.pos).map(|t| t.is_eof()).unwrap_or(true)
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_n(&self, n: usize) -> &Token {
        let idx = (self.pos + n).min(self.tokens.len() - 1);
        &self.tokens[idx]
    }

    fn advance(&mut self) -> Token {
        let tok = self.tokens[self.pos.min(self.tokens.len() - 1)].clone();
        if self.pos < self.tokens.len() - 1 {
            self.pos += 1;
        }
        tok
    }

    fn check_punct(&self, p: Punct) -> bool {
        self.peek().is_punct(p)
    }

    fn check_keyword(&self, k: Keyword) -> bool {
        self.peek().is_keyword(k)
    }

    fn eat_punct(&mut self, p: Punct, diags: &mut Diagnostics) -> bool {
        if self.check_punct(p) {
            self.advance();
            true
        } else {
            let span = self.peek().span;
            diags.push_error(
                "E-PARSE-001",
                ParseError::Expected(span, punct_name(p), format!("{:?}", self.peek().kind))
                    .to_string(),
                span,
            );
            false
        }
    }

    fn synchronize(&mut self) {
        while !self.at_eof() {
            if self.check_punct(Punct::Semicolon) {
                self.advance();
                return;
            }
            if self.check_punct(Punct::RBrace) {
                return;
            }
            self.advance();
        }
    }

    // ---- top level ----

    fn parse_top_level_item(&mut self, diags: &mut Diagnostics) -> TopLevel {
        if self.check_punct(Punct::LBracket) {
            return self.parse_bracketed_section(diags);
        }
        match self.parse_node(diags) {
            Some(node) => TopLevel::Node(node),
            None => TopLevel::Skip,
        }
    }

    fn parse_bracketed_section(&mut self, diags: &mut Diagnostics) -> TopLevel {
        let span = self.peek().span;
        self.advance(); // [
        let keyword_tok = self.advance();

        let result = match &keyword_tok.kind {
            TokenKind::Keyword(Keyword::Configuration) => {
                TopLevel::Config(self.parse_configuration_body(span, diags))
            }
            TokenKind::Keyword(Keyword::Import) => {
                TopLevel::Import(self.parse_import(span, diags))
            }
            TokenKind::Keyword(Keyword::Namespace) => {
                TopLevel::Namespace(self.parse_namespace(span, diags))
            }
            TokenKind::Keyword(Keyword::Template) => {
                TopLevel::Template(self.parse_def(span, diags, true))
            }
            TokenKind::Keyword(Keyword::Custom) => {
                TopLevel::Custom(self.parse_def(span, diags, false))
            }
            TokenKind::Keyword(Keyword::Origin) => {
                TopLevel::Origin(self.parse_origin(span, diags))
            }
            TokenKind::Identifier(name) if name == "Info" || name == "Export" => {
                // Metadata blocks: recorded as diagnostics only (spec.md §6.4).
                self.eat_punct(Punct::RBracket, diags);
                if self.check_punct(Punct::LBrace) {
                    self.skip_balanced_braces();
                }
                diags.push_warning(
                    "W-META-001",
                    format!("'{}' metadata block recorded but not further processed", name),
                    span,
                );
                TopLevel::Skip
            }
            other => {
                diags.push_error(
                    "E-PARSE-002",
                    ParseError::MalformedHeader(span, "bracketed section").to_string(),
                    span,
                );
                let _ = other;
                self.synchronize();
                TopLevel::Skip
            }
        };
        result
    }

    fn skip_balanced_braces(&mut self) {
        if !self.check_punct(Punct::LBrace) {
            return;
        }
        self.advance();
        let mut depth = 1i32;
        while depth > 0 && !self.at_eof() {
            if self.check_punct(Punct::LBrace) {
                depth += 1;
            } else if self.check_punct(Punct::RBrace) {
                depth -= 1;
            }
            self.advance();
        }
    }

    fn parse_configuration_body(&mut self, span: Span, diags: &mut Diagnostics) -> ConfigBlock {
        self.eat_punct(Punct::RBracket, diags);
        let mut aliases = Vec::new();
        if self.eat_punct(Punct::LBrace, diags) {
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                // `Name { alias: canonical; ... }` grouping, or bare
                // `alias: canonical;` pairs — both flatten into the same list.
                let group_name = self.advance();
                if self.check_punct(Punct::LBrace) {
                    self.advance();
                    while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                        self.parse_alias_pair(&mut aliases, diags);
                    }
                    self.eat_punct(Punct::RBrace, diags);
                } else if self.check_punct(Punct::Colon) {
                    self.pos -= 1; // re-read group_name as the alias key
                    self.parse_alias_pair(&mut aliases, diags);
                } else {
                    let _ = group_name;
                    self.synchronize();
                }
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        ConfigBlock { aliases, span }
    }

    fn parse_alias_pair(&mut self, aliases: &mut Vec<(String, String)>, diags: &mut Diagnostics) {
        let key = self.advance().lexeme;
        if !self.eat_punct(Punct::Colon, diags) {
            self.synchronize();
            return;
        }
        let value = self.advance().lexeme;
        self.eat_punct(Punct::Semicolon, diags);
        aliases.push((key, value));
    }

    fn parse_import(&mut self, span: Span, diags: &mut Diagnostics) -> ImportDirective {
        self.eat_punct(Punct::RBracket, diags);
        let mut kind = ImportKind::Chtl;
        if self.check_punct(Punct::At) {
            self.advance();
            let tag = self.advance();
            kind = match tag.lexeme.as_str() {
                "Style" => ImportKind::Style,
                "JavaScript" => ImportKind::JavaScript,
                "Html" => ImportKind::Html,
                _ => ImportKind::Chtl,
            };
        }
        if self.check_keyword(Keyword::From) {
            self.advance();
        }
        let mut wildcard = false;
        let mut path = String::new();
        loop {
            let tok = self.advance();
            match &tok.kind {
                TokenKind::Punct(Punct::At) => {
                    wildcard = true;
                    path.push('*');
                }
                TokenKind::Identifier(_) | TokenKind::StringLiteral(_) | TokenKind::UnquotedLiteral(_) => {
                    path.push_str(&tok.lexeme);
                }
                _ => break,
            }
            if self.check_keyword(Keyword::As) || self.check_punct(Punct::Semicolon) {
                break;
            }
            path.push('/');
        }
        let alias = if self.check_keyword(Keyword::As) {
            self.advance();
            Some(self.advance().lexeme)
        } else {
            None
        };
        self.eat_punct(Punct::Semicolon, diags);
        ImportDirective {
            kind,
            path,
            alias,
            wildcard,
            span,
        }
    }

    fn parse_namespace(&mut self, span: Span, diags: &mut Diagnostics) -> Namespace {
        self.eat_punct(Punct::RBracket, diags);
        let name = self.advance().lexeme;
        let mut body = Vec::new();
        if self.eat_punct(Punct::LBrace, diags) {
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                if let Some(node) = self.parse_node(diags) {
                    body.push(node);
                }
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        Namespace { name, body, span }
    }

    fn parse_origin(&mut self, span: Span, diags: &mut Diagnostics) -> OriginBlock {
        self.eat_punct(Punct::RBracket, diags);
        self.eat_punct(Punct::At, diags);
        let tag = self.advance().lexeme;
        let kind = match tag.as_str() {
            "Style" => crate::scanner::FragmentKind::Css,
            "JavaScript" => crate::scanner::FragmentKind::Js,
            _ => crate::scanner::FragmentKind::Html,
        };
        let name = if matches!(self.peek().kind, TokenKind::Identifier(_)) && !self.check_punct(Punct::LBrace) {
            Some(self.advance().lexeme)
        } else {
            None
        };
        if self.check_punct(Punct::Semicolon) {
            // A bare `[Origin] @Kind name;` reference to a previously defined
            // named origin — the Registry fills in `placeholder_id` from the
            // name table during expansion (spec.md §9 supplement, grounded in
            // `origin_embed.cpp`'s named-origin reuse).
            self.advance();
            return OriginBlock { kind, name, placeholder_id: String::new(), span };
        }
        let mut placeholder_id = String::new();
        if self.eat_punct(Punct::LBrace, diags) {
            if let TokenKind::Identifier(id) = &self.peek().kind {
                if PlaceholderMap::is_placeholder(id) {
                    placeholder_id = id.clone();
                    self.advance();
                }
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        OriginBlock {
            kind,
            name,
            placeholder_id,
            span,
        }
    }

    fn parse_def(&mut self, span: Span, diags: &mut Diagnostics, is_template: bool) -> DefResult {
        self.eat_punct(Punct::RBracket, diags);
        self.eat_punct(Punct::At, diags);
        let kind = self.parse_usage_kind(diags);
        let name = self.advance().lexeme;
        let mut parent = if self.check_punct(Punct::Colon) {
            self.advance();
            Some(self.advance().lexeme)
        } else if self.check_keyword(Keyword::Inherit) {
            // `InheritOpt := ('inherit' identifier)?` (spec.md §4.3), in header position.
            self.advance();
            Some(self.advance().lexeme)
        } else {
            None
        };
        let mut body = Vec::new();
        if self.eat_punct(Punct::LBrace, diags) {
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                if self.check_keyword(Keyword::Inherit) {
                    // Canonical form from spec.md §8: `inherit Base;` as the
                    // first body entry rather than a header clause.
                    self.advance();
                    let inherited = self.advance().lexeme;
                    self.eat_punct(Punct::Semicolon, diags);
                    if parent.is_none() {
                        parent = Some(inherited);
                    }
                    continue;
                }
                if let Some(node) = self.parse_def_body_entry(kind, diags) {
                    body.push(node);
                }
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        if is_template {
            DefResult::Template(TemplateDef { kind, name, parent, body, span })
        } else {
            DefResult::Custom(CustomDef { kind, name, parent, body, span })
        }
    }

    fn parse_usage_kind(&mut self, diags: &mut Diagnostics) -> UsageKind {
        let tok = self.advance();
        match tok.kind {
            TokenKind::Keyword(Keyword::Style_) => UsageKind::Style,
            TokenKind::Keyword(Keyword::Element) => UsageKind::Element,
            TokenKind::Keyword(Keyword::Var) => UsageKind::Var,
            _ => {
                diags.push_error(
                    "E-PARSE-003",
                    ParseError::Expected(tok.span, "@Style, @Element or @Var", tok.lexeme.clone())
                        .to_string(),
                    tok.span,
                );
                UsageKind::Element
            }
        }
    }

    fn parse_def_body_entry(&mut self, kind: UsageKind, diags: &mut Diagnostics) -> Option<Node> {
        match kind {
            UsageKind::Element => self.parse_node(diags),
            UsageKind::Style | UsageKind::Var => {
                if self.check_punct(Punct::At) {
                    self.parse_usage(diags).map(Node::Usage)
                } else {
                    self.parse_attribute(diags).map(Node::Attribute)
                }
            }
        }
    }

    // ---- statements inside element/namespace bodies ----

    fn parse_node(&mut self, diags: &mut Diagnostics) -> Option<Node> {
        if self.check_punct(Punct::LBracket) && self.peek_n(1).is_keyword(Keyword::Origin) {
            let span = self.peek().span;
            self.advance(); // [
            self.advance(); // Origin
            return Some(Node::Origin(self.parse_origin(span, diags)));
        }
        if self.check_keyword(Keyword::Text) {
            return self.parse_text(diags);
        }
        if self.check_keyword(Keyword::Style) {
            return self.parse_style_block(diags).map(Node::StyleBlock);
        }
        if self.check_keyword(Keyword::Script) {
            return self.parse_script_block(diags).map(Node::ScriptBlock);
        }
        if self.check_punct(Punct::At) {
            return self.parse_usage(diags).map(Node::Usage);
        }
        if matches!(self.peek().kind, TokenKind::Identifier(_))
            && self.peek_n(1).is_punct(Punct::Colon)
        {
            return self.parse_attribute(diags).map(Node::Attribute);
        }
        if matches!(self.peek().kind, TokenKind::Identifier(_))
            && self.peek_n(1).is_punct(Punct::LBrace)
        {
            return self.parse_element(diags).map(Node::Element);
        }
        let tok = self.advance();
        diags.push_error(
            "E-PARSE-004",
            ParseError::UnexpectedToken(tok.span, format!("{:?}", tok.kind)).to_string(),
            tok.span,
        );
        self.synchronize();
        None
    }

    fn parse_element(&mut self, diags: &mut Diagnostics) -> Option<Element> {
        let span = self.peek().span;
        let tag = self.advance().lexeme;
        let mut attributes = Vec::new();
        let mut children = Vec::new();
        if self.eat_punct(Punct::LBrace, diags) {
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                if matches!(self.peek().kind, TokenKind::Identifier(_))
                    && self.peek_n(1).is_punct(Punct::Colon)
                    && !self.looks_like_nested_element_after_colon()
                {
                    if let Some(attr) = self.parse_attribute(diags) {
                        attributes.push(attr);
                    }
                    continue;
                }
                if let Some(node) = self.parse_node(diags) {
                    children.push(node);
                }
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        Some(Element { tag, attributes, children, span })
    }

    fn looks_like_nested_element_after_colon(&self) -> bool {
        false
    }

    fn parse_attribute(&mut self, diags: &mut Diagnostics) -> Option<Attribute> {
        let span = self.peek().span;
        let name = self.advance().lexeme;
        self.eat_punct(Punct::Colon, diags);
        let value = self.parse_value(diags);
        self.eat_punct(Punct::Semicolon, diags);
        Some(Attribute { name, value, span })
    }

    fn parse_value(&mut self, diags: &mut Diagnostics) -> Value {
        let span = self.peek().span;
        // `GroupName(Key)` variable reference.
        if matches!(self.peek().kind, TokenKind::Identifier(_)) && self.peek_n(1).is_punct(Punct::LParen) {
            let group = self.advance().lexeme;
            self.advance(); // (
            let key = self.advance().lexeme;
            self.eat_punct(Punct::RParen, diags);
            return Value::VarRef { group, key, span };
        }
        let tok = self.advance();
        Value::Literal(tok.lexeme)
    }

    fn parse_text(&mut self, diags: &mut Diagnostics) -> Option<Node> {
        let span = self.peek().span;
        self.advance(); // text
        self.eat_punct(Punct::LBrace, diags);
        let value = self.parse_value(diags);
        self.eat_punct(Punct::RBrace, diags);
        Some(Node::Text(TextNode { value, span }))
    }

    fn parse_style_block(&mut self, diags: &mut Diagnostics) -> Option<StyleBlock> {
        let span = self.peek().span;
        self.advance(); // style
        let mut entries = Vec::new();
        if self.eat_punct(Punct::LBrace, diags) {
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                entries.push(self.parse_style_entry(diags));
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        Some(StyleBlock { entries, span })
    }

    fn parse_style_entry(&mut self, diags: &mut Diagnostics) -> StyleEntry {
        if self.check_punct(Punct::At) {
            if let Some(usage) = self.parse_usage(diags) {
                return StyleEntry::Usage(usage);
            }
        }
        if matches!(self.peek().kind, TokenKind::Identifier(_)) && self.peek_n(1).is_punct(Punct::LBrace) {
            return StyleEntry::Nested(self.parse_nested_rule(diags));
        }
        let span = self.peek().span;
        let name = self.advance().lexeme;
        self.eat_punct(Punct::Colon, diags);
        let value = self.parse_value(diags);
        self.eat_punct(Punct::Semicolon, diags);
        StyleEntry::Property(CssProperty { name, value, span })
    }

    fn parse_nested_rule(&mut self, diags: &mut Diagnostics) -> NestedRule {
        let span = self.peek().span;
        let selector = self.advance().lexeme;
        let mut body = Vec::new();
        if self.eat_punct(Punct::LBrace, diags) {
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                body.push(self.parse_style_entry(diags));
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        NestedRule { selector, body, span }
    }

    fn parse_script_block(&mut self, diags: &mut Diagnostics) -> Option<ScriptBlock> {
        let span = self.peek().span;
        self.advance(); // script
        let mut ids = Vec::new();
        if self.eat_punct(Punct::LBrace, diags) {
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                let tok = self.advance();
                if let TokenKind::Identifier(name) = &tok.kind {
                    if PlaceholderMap::is_placeholder(name) {
                        ids.push(name.clone());
                        continue;
                    }
                }
                diags.push_warning(
                    "W-PARSE-005",
                    "unexpected token inside script block, expected placeholder",
                    tok.span,
                );
            }
            self.eat_punct(Punct::RBrace, diags);
        }
        Some(ScriptBlock { placeholder_ids: ids, span })
    }

    fn parse_usage(&mut self, diags: &mut Diagnostics) -> Option<Usage> {
        let span = self.peek().span;
        self.advance(); // @
        let kind = self.parse_usage_kind(diags);
        let name = self.advance().lexeme;
        let namespace = if self.check_keyword(Keyword::From) {
            self.advance();
            Some(self.advance().lexeme)
        } else {
            None
        };
        let mut specialization = Vec::new();
        if self.check_punct(Punct::LBrace) {
            self.advance();
            while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                if let Some(entry) = self.parse_spec_entry(diags) {
                    specialization.push(entry);
                }
            }
            self.eat_punct(Punct::RBrace, diags);
        } else {
            self.eat_punct(Punct::Semicolon, diags);
        }
        Some(Usage { kind, name, namespace, specialization, span })
    }

    fn parse_spec_entry(&mut self, diags: &mut Diagnostics) -> Option<SpecEntry> {
        let span = self.peek().span;
        if self.check_keyword(Keyword::Delete) {
            self.advance();
            let selector = self.advance().lexeme;
            self.eat_punct(Punct::Semicolon, diags);
            return Some(SpecEntry::Delete { selector, span });
        }
        if self.check_keyword(Keyword::Inherit) {
            self.advance();
            let name = self.advance().lexeme;
            self.eat_punct(Punct::Semicolon, diags);
            return Some(SpecEntry::InheritFrom { name, span });
        }
        if self.check_keyword(Keyword::Insert) {
            self.advance();
            let (position, selector) = self.parse_insert_position(diags);
            let mut nodes = Vec::new();
            if self.eat_punct(Punct::LBrace, diags) {
                while !self.check_punct(Punct::RBrace) && !self.at_eof() {
                    if let Some(node) = self.parse_node(diags) {
                        nodes.push(node);
                    }
                }
                self.eat_punct(Punct::RBrace, diags);
            }
            return Some(SpecEntry::Insert { position, selector, nodes, span });
        }
        let tok = self.advance();
        diags.push_error(
            "E-PARSE-006",
            ParseError::UnexpectedToken(tok.span, format!("{:?}", tok.kind)).to_string(),
            tok.span,
        );
        self.synchronize();
        None
    }

    fn parse_insert_position(&mut self, diags: &mut Diagnostics) -> (InsertPosition, Option<String>) {
        if self.check_keyword(Keyword::At) {
            self.advance();
            if self.check_keyword(Keyword::Top) {
                self.advance();
                return (InsertPosition::Top, None);
            }
            if self.check_keyword(Keyword::Bottom) {
                self.advance();
                return (InsertPosition::Bottom, None);
            }
        }
        if self.check_keyword(Keyword::Before) {
            self.advance();
            return (InsertPosition::Before, Some(self.advance().lexeme));
        }
        if self.check_keyword(Keyword::After) {
            self.advance();
            return (InsertPosition::After, Some(self.advance().lexeme));
        }
        if self.check_keyword(Keyword::Replace) {
            self.advance();
            return (InsertPosition::Replace, Some(self.advance().lexeme));
        }
        let span = self.peek().span;
        diags.push_error(
            "E-PARSE-007",
            ParseError::Expected(span, "insert position", self.peek().lexeme.clone()).to_string(),
            span,
        );
        (InsertPosition::Bottom, None)
    }
}

enum TopLevel {
    Config(ConfigBlock),
    Import(ImportDirective),
    Namespace(Namespace),
    Template(TemplateDef),
    Custom(CustomDef),
    Origin(OriginBlock),
    Node(Node),
    Skip,
}

enum DefResult {
    Template(TemplateDef),
    Custom(CustomDef),
}

fn punct_name(p: Punct) -> &'static str {
    match p {
        Punct::LBrace => "'{'",
        Punct::RBrace => "'}'",
        Punct::LBracket => "'['",
        Punct::RBracket => "']'",
        Punct::LParen => "'('",
        Punct::RParen => "')'",
        Punct::Colon => "':'",
        Punct::Semicolon => "';'",
        Punct::Equals => "'='",
        Punct::Comma => "','",
        Punct::At => "'@'",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::lexer::Lexer;
    use crate::scanner::Scanner;

    fn parse(src: &str) -> (Program, Diagnostics) {
        let cfg = Config::default();
        let mut diags = Diagnostics::new();
        let scanner = Scanner::new(&cfg);
        let (text, placeholders) = scanner.scan(src, &mut diags);
        let tokens = Lexer::new(&text, &cfg).tokenize(&mut diags);
        let program = Parser::new(tokens, &placeholders).parse_program(&mut diags);
        (program, diags)
    }

    #[test]
    fn parses_simple_element_with_attribute_and_text() {
        let (program, diags) = parse(r#"div { id: "main"; text { "hi" } }"#);
        assert!(!diags.has_errors());
        assert_eq!(program.body.len(), 1);
        match &program.body[0] {
            Node::Element(e) => {
                assert_eq!(e.tag, "div");
                assert_eq!(e.attributes.len(), 1);
                assert_eq!(e.attributes[0].name, "id");
                assert_eq!(e.children.len(), 1);
                assert!(matches!(e.children[0], Node::Text(_)));
            }
            other => panic!("expected element, got {:?}", other),
        }
    }

    #[test]
    fn parses_template_definition_with_parent() {
        let (program, diags) =
            parse("[Template] @Style Base { color: red; } [Template] @Style Derived : Base { }");
        assert!(!diags.has_errors());
        assert_eq!(program.templates.len(), 2);
        assert_eq!(program.templates[1].parent.as_deref(), Some("Base"));
    }

    #[test]
    fn parses_template_definition_with_inherit_body_entry() {
        let (program, diags) = parse(
            "[Template] @Style Base { color: red; } \
             [Template] @Style Derived { inherit Base; font-size: 20px; }",
        );
        assert!(!diags.has_errors());
        assert_eq!(program.templates[1].parent.as_deref(), Some("Base"));
        assert_eq!(program.templates[1].body.len(), 1);
        match &program.templates[1].body[0] {
            Node::Attribute(a) => assert_eq!(a.name, "font-size"),
            other => panic!("expected only the font-size attribute, got {:?}", other),
        }
    }

    #[test]
    fn parses_usage_with_delete_and_insert() {
        let (program, diags) = parse(
            "div { @Element Box { delete span; insert after span { text { \"x\" } } } }",
        );
        assert!(!diags.has_errors());
        let Node::Element(e) = &program.body[0] else { panic!() };
        let Node::Usage(usage) = &e.children[0] else { panic!() };
        assert_eq!(usage.specialization.len(), 2);
        assert!(matches!(usage.specialization[0], SpecEntry::Delete { .. }));
        assert!(matches!(usage.specialization[1], SpecEntry::Insert { .. }));
    }

    #[test]
    fn parses_script_block_as_placeholder_sequence() {
        let (program, diags) = parse("div { script { console.log(1); } }");
        assert!(!diags.has_errors());
        let Node::Element(e) = &program.body[0] else { panic!() };
        let Node::ScriptBlock(sb) = &e.children[0] else { panic!() };
        assert_eq!(sb.placeholder_ids.len(), 1);
    }

    #[test]
    fn recovers_from_malformed_statement() {
        let (program, diags) = parse("div { 123 garbage; span { } }");
        assert!(diags.has_errors());
        let Node::Element(e) = &program.body[0] else { panic!() };
        assert!(e.children.iter().any(|n| matches!(n, Node::Element(inner) if inner.tag == "span")));
    }
}
