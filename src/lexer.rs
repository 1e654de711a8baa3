//! Tokenizer (spec.md §4.2): turns placeholder-carrying CHTL text into a
//! flat token stream. Never sees the content behind a placeholder — it
//! lexes the placeholder identifier like any other identifier and leaves
//! restoration to the Code Generator.

use crate::config::Config;
use crate::diagnostics::{Diagnostics, LexError, Span};
use crate::token::{Keyword, Punct, Token, TokenKind};
use std::iter::Peekable;
use std::str::CharIndices;

pub struct Lexer<'a> {
    source: &'a str,
    chars: Peekable<CharIndices<'a>>,
    line: u32,
    column: u32,
    config: &'a Config,
}

impl<'a> Lexer<'a> {
    pub fn new(source: &'a str, config: &'a Config) -> Self {
        Self {
            source,
            chars: source.char_indices().peekable(),
            line: 1,
            column: 1,
            config,
        }
    }

    /// Tokenizes the entire input, recording any lex-level errors into
    /// `diags` and always terminating with an `Eof` token.
    pub fn tokenize(mut self, diags: &mut Diagnostics) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments(diags);
            let span = self.span();
            let Some(&(start, ch)) = self.chars.peek() else {
                tokens.push(Token::new(TokenKind::Eof, "", span));
                break;
            };

            if ch == '"' || ch == '\'' {
                tokens.push(self.lex_string(ch, diags));
                continue;
            }

            if ch.is_alphabetic() || ch == '_' {
                tokens.push(self.lex_word(span));
                continue;
            }

            if ch.is_ascii_digit() {
                tokens.push(self.lex_unquoted_literal(span));
                continue;
            }

            if let Some(p) = Punct::from_char(ch) {
                self.bump();
                tokens.push(Token::new(TokenKind::Punct(p), ch.to_string(), span));
                continue;
            }

            // Anything else (e.g. `-`, `%`, `#`) not otherwise consumed by an
            // identifier or number is folded into an unquoted literal run so
            // CSS-ish value text (`10px`, `#fff`, `1.5em`) lexes as a whole.
            let _ = start;
            tokens.push(self.lex_unquoted_literal(span));
        }
        tokens
    }

    fn span(&self) -> Span {
        Span::new(self.line, self.column)
    }

    fn bump(&mut self) -> Option<char> {
        let (_, ch) = self.chars.next()?;
        if ch == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace_and_comments(&mut self, diags: &mut Diagnostics) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some(&(_, '/')) => {
                            while !matches!(self.peek_char(), None | Some('\n')) {
                                self.bump();
                            }
                        }
                        Some(&(_, '*')) => {
                            let start_span = self.span();
                            self.bump();
                            self.bump();
                            let mut closed = false;
                            while let Some(c) = self.peek_char() {
                                if c == '*' {
                                    let mut la = self.chars.clone();
                                    la.next();
                                    if let Some(&(_, '/')) = la.peek() {
                                        self.bump();
                                        self.bump();
                                        closed = true;
                                        break;
                                    }
                                }
                                self.bump();
                            }
                            if !closed {
                                diags.push_error(
                                    "E-LEX-002",
                                    LexError::UnterminatedBlockComment(start_span).to_string(),
                                    start_span,
                                );
                            }
                        }
                        _ => return,
                    }
                }
                _ => return,
            }
        }
    }

    fn lex_string(&mut self, quote: char, diags: &mut Diagnostics) -> Token {
        let span = self.span();
        self.bump();
        let mut value = String::new();
        loop {
            match self.peek_char() {
                None => {
                    diags.push_error(
                        "E-LEX-001",
                        LexError::UnterminatedString(span).to_string(),
                        span,
                    );
                    break;
                }
                Some(c) if c == quote => {
                    self.bump();
                    break;
                }
                Some('\\') => {
                    self.bump();
                    match self.bump() {
                        Some(esc) => value.push(match esc {
                            'n' => '\n',
                            't' => '\t',
                            'r' => '\r',
                            '\\' => '\\',
                            '"' => '"',
                            '\'' => '\'',
                            other => {
                                diags.push_error(
                                    "E-LEX-003",
                                    LexError::InvalidEscape(span, other).to_string(),
                                    span,
                                );
                                other
                            }
                        }),
                        None => {
                            diags.push_error(
                                "E-LEX-001",
                                LexError::UnterminatedString(span).to_string(),
                                span,
                            );
                            break;
                        }
                    }
                }
                Some(c) => {
                    value.push(c);
                    self.bump();
                }
            }
        }
        Token::new(TokenKind::StringLiteral(value.clone()), value, span)
    }

    fn lex_word(&mut self, span: Span) -> Token {
        let mut word = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_alphanumeric() || c == '_' || c == '-' {
                word.push(c);
                self.bump();
            } else {
                break;
            }
        }
        match Keyword::lookup(&word, &self.config.keyword_aliases) {
            Some(kw) => Token::new(TokenKind::Keyword(kw), word, span),
            None => Token::new(TokenKind::Identifier(word.clone()), word, span),
        }
    }

    /// A bare value run: digits, units, color hex, dotted decimals, or any
    /// other printable text not otherwise tokenized, up to the next
    /// whitespace or structural punctuator.
    fn lex_unquoted_literal(&mut self, span: Span) -> Token {
        let mut text = String::new();
        while let Some(c) = self.peek_char() {
            if c.is_whitespace() || Punct::from_char(c).is_some() {
                break;
            }
            text.push(c);
            self.bump();
        }
        if text.is_empty() {
            // Guarantee forward progress on an otherwise-unrecognized char.
            if let Some(c) = self.bump() {
                text.push(c);
            }
        }
        Token::new(TokenKind::UnquotedLiteral(text.clone()), text, span)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        let cfg = Config::default();
        let mut diags = Diagnostics::new();
        let tokens = Lexer::new(src, &cfg).tokenize(&mut diags);
        assert!(!diags.has_errors(), "unexpected lex errors: {:?}", diags.errors().collect::<Vec<_>>());
        tokens
    }

    #[test]
    fn lexes_identifiers_and_braces() {
        let tokens = lex("div { }");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(ref s) if s == "div"));
        assert!(tokens[1].is_punct(Punct::LBrace));
        assert!(tokens[2].is_punct(Punct::RBrace));
        assert!(tokens[3].is_eof());
    }

    #[test]
    fn lexes_keywords_through_config_alias() {
        let mut cfg = Config::default();
        cfg.keyword_aliases.insert("tmpl".to_string(), "Template".to_string());
        let mut diags = Diagnostics::new();
        let tokens = Lexer::new("tmpl", &cfg).tokenize(&mut diags);
        assert!(tokens[0].is_keyword(Keyword::Template));
    }

    #[test]
    fn lexes_quoted_string_with_escapes() {
        let tokens = lex(r#""a\"b""#);
        assert!(matches!(&tokens[0].kind, TokenKind::StringLiteral(s) if s == "a\"b"));
    }

    #[test]
    fn skips_line_and_block_comments() {
        let tokens = lex("// c\ndiv /* x */ { }");
        assert!(matches!(tokens[0].kind, TokenKind::Identifier(ref s) if s == "div"));
    }

    #[test]
    fn unterminated_string_reports_lex_error() {
        let cfg = Config::default();
        let mut diags = Diagnostics::new();
        let _ = Lexer::new("\"abc", &cfg).tokenize(&mut diags);
        assert!(diags.has_errors());
    }

    #[test]
    fn lexes_placeholder_identifier_as_identifier() {
        let tokens = lex("__CHTL_PH_0__");
        assert!(matches!(&tokens[0].kind, TokenKind::Identifier(s) if s == "__CHTL_PH_0__"));
    }

    #[test]
    fn lexes_unquoted_css_value() {
        let tokens = lex("10px");
        assert!(matches!(&tokens[0].kind, TokenKind::UnquotedLiteral(s) if s == "10px"));
    }
}
