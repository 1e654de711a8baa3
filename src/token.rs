//! Token kinds produced by the Lexer (spec.md §3, §4.2).

use crate::diagnostics::Span;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Keyword {
    Text,
    Style,
    Script,
    Template,
    Custom,
    Style_, // `Style` kind tag used after `@`
    Element,
    Var,
    Delete,
    Insert,
    After,
    Before,
    Replace,
    At,
    Top,
    Bottom,
    Inherit,
    From,
    As,
    Import,
    Origin,
    Namespace,
    Configuration,
    Except,
    Use,
}

impl Keyword {
    /// Resolve a raw identifier to a keyword, honoring any configured
    /// alias (e.g. a `[Configuration]` block renaming `Style` to `style`).
    pub fn lookup(word: &str, aliases: &std::collections::BTreeMap<String, String>) -> Option<Keyword> {
        let canonical = aliases
            .iter()
            .find(|(alias, _)| alias.as_str() == word)
            .map(|(_, canonical)| canonical.as_str())
            .unwrap_or(word);

        Some(match canonical {
            "text" => Keyword::Text,
            "style" => Keyword::Style,
            "script" => Keyword::Script,
            "Template" => Keyword::Template,
            "Custom" => Keyword::Custom,
            "Style" => Keyword::Style_,
            "Element" => Keyword::Element,
            "Var" => Keyword::Var,
            "delete" => Keyword::Delete,
            "insert" => Keyword::Insert,
            "after" => Keyword::After,
            "before" => Keyword::Before,
            "replace" => Keyword::Replace,
            "at" => Keyword::At,
            "top" => Keyword::Top,
            "bottom" => Keyword::Bottom,
            "inherit" => Keyword::Inherit,
            "from" => Keyword::From,
            "as" => Keyword::As,
            "Import" => Keyword::Import,
            "Origin" => Keyword::Origin,
            "Namespace" => Keyword::Namespace,
            "Configuration" => Keyword::Configuration,
            "except" => Keyword::Except,
            "use" => Keyword::Use,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Punct {
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    LParen,
    RParen,
    Colon,
    Semicolon,
    Equals,
    Comma,
    At,
}

impl Punct {
    pub fn from_char(c: char) -> Option<Punct> {
        Some(match c {
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            ':' => Punct::Colon,
            ';' => Punct::Semicolon,
            '=' => Punct::Equals,
            ',' => Punct::Comma,
            '@' => Punct::At,
            _ => return None,
        })
    }

    pub fn as_char(self) -> char {
        match self {
            Punct::LBrace => '{',
            Punct::RBrace => '}',
            Punct::LBracket => '[',
            Punct::RBracket => ']',
            Punct::LParen => '(',
            Punct::RParen => ')',
            Punct::Colon => ':',
            Punct::Semicolon => ';',
            Punct::Equals => '=',
            Punct::Comma => ',',
            Punct::At => '@',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    Identifier(String),
    Keyword(Keyword),
    StringLiteral(String),
    UnquotedLiteral(String),
    Punct(Punct),
    Eof,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub lexeme: String,
    pub span: Span,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            span,
        }
    }

    pub fn is_eof(&self) -> bool {
        matches!(self.kind, TokenKind::Eof)
    }

    pub fn is_punct(&self, p: Punct) -> bool {
        matches!(&self.kind, TokenKind::Punct(k) if *k == p)
    }

    pub fn is_keyword(&self, k: Keyword) -> bool {
        matches!(&self.kind, TokenKind::Keyword(kw) if *kw == k)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}
