//! Lexer for Bramble story source.
//!
//! The lexer converts source text into a stream of tokens. Errors are
//! reported as `TokenKind::Error` tokens so the parser can attach a
//! position and the offending source line.

use crate::span::Span;
use crate::token::{Token, TokenKind};

/// Lexer for Bramble source code.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Remaining source text.
    rest: &'src str,
    /// Current byte offset in source.
    position: usize,
    /// Current line number (1-based).
    line: u32,
    /// Current column number (1-based).
    column: u32,
}

impl<'src> Lexer<'src> {
    /// Creates a new lexer for the given source.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        Self {
            source,
            rest: source,
            position: 0,
            line: 1,
            column: 1,
        }
    }

    /// Returns the next token from the source.
    pub fn next_token(&mut self) -> Token {
        self.skip_whitespace();

        let start = self.position;
        let start_line = self.line;
        let start_column = self.column;

        let Some(c) = self.peek_char() else {
            return Token::new(
                TokenKind::Eof,
                Span::new(start, start, start_line, start_column),
            );
        };

        let kind = match c {
            '(' => self.single(TokenKind::LParen),
            ')' => self.single(TokenKind::RParen),
            '[' => self.single(TokenKind::LBracket),
            ']' => self.single(TokenKind::RBracket),
            '{' => self.single(TokenKind::LBrace),
            '}' => self.single(TokenKind::RBrace),
            '.' => self.single(TokenKind::Dot),
            ',' => self.single(TokenKind::Comma),
            ';' => self.single(TokenKind::Semicolon),
            ':' => self.single(TokenKind::Colon),
            '=' => self.single(TokenKind::Equals),
            '/' if self.peek_char_n(1) == Some('/') => self.scan_comment(),
            '"' => self.scan_string(),
            c if c.is_ascii_digit() => self.scan_number(),
            '-' if self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit()) => self.scan_number(),
            c if is_ident_start(c) => self.scan_word(),
            c => {
                self.advance();
                TokenKind::Error(format!("unexpected character: {c}"))
            }
        };

        Token::new(
            kind,
            Span::new(start, self.position, start_line, start_column),
        )
    }

    /// Tokenizes all source and returns a vector of tokens.
    ///
    /// Comments are included in the output.
    #[must_use]
    pub fn tokenize_all(source: &str) -> Vec<Token> {
        let mut lexer = Lexer::new(source);
        let mut tokens = Vec::new();
        loop {
            let token = lexer.next_token();
            let is_eof = token.kind == TokenKind::Eof;
            tokens.push(token);
            if is_eof {
                break;
            }
        }
        tokens
    }

    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    fn peek_char(&self) -> Option<char> {
        self.rest.chars().next()
    }

    fn peek_char_n(&self, n: usize) -> Option<char> {
        self.rest.chars().nth(n)
    }

    /// Advances past the next character, tracking line and column.
    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            let len = c.len_utf8();
            self.rest = &self.rest[len..];
            self.position += len;
            if c == '\n' {
                self.line += 1;
                self.column = 1;
            } else {
                self.column += 1;
            }
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().is_some_and(char::is_whitespace) {
            self.advance();
        }
    }

    /// Scans a `//` comment up to the end of the line.
    fn scan_comment(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(|c| c != '\n') {
            self.advance();
        }
        TokenKind::Comment(self.source[start..self.position].to_string())
    }

    /// Scans a string literal.
    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // opening '"'
        let mut text = String::new();
        loop {
            match self.peek_char() {
                Some('"') => {
                    self.advance();
                    break;
                }
                Some('\\') => {
                    self.advance();
                    let escaped = match self.peek_char() {
                        Some('n') => '\n',
                        Some('t') => '\t',
                        Some('\\') => '\\',
                        Some('"') => '"',
                        Some(c) => {
                            return TokenKind::Error(format!("invalid escape sequence: \\{c}"));
                        }
                        None => {
                            return TokenKind::Error(
                                "unexpected end of input in string escape".into(),
                            );
                        }
                    };
                    self.advance();
                    text.push(escaped);
                }
                Some(c) => {
                    self.advance();
                    text.push(c);
                }
                None => return TokenKind::Error("unterminated string literal".into()),
            }
        }
        TokenKind::String(text)
    }

    /// Scans a number. All story numbers are `f64`.
    fn scan_number(&mut self) -> TokenKind {
        let start = self.position;
        let mut has_dot = false;

        if self.peek_char() == Some('-') {
            self.advance();
        }

        while let Some(c) = self.peek_char() {
            if c.is_ascii_digit() {
                self.advance();
            } else if c == '.'
                && !has_dot
                && self.peek_char_n(1).is_some_and(|c| c.is_ascii_digit())
            {
                has_dot = true;
                self.advance();
            } else {
                break;
            }
        }

        match self.source[start..self.position].parse::<f64>() {
            Ok(n) => TokenKind::Number(n),
            Err(e) => TokenKind::Error(format!("invalid number: {e}")),
        }
    }

    /// Scans an identifier or keyword.
    fn scan_word(&mut self) -> TokenKind {
        let start = self.position;
        while self.peek_char().is_some_and(is_ident_char) {
            self.advance();
        }
        let word = &self.source[start..self.position];
        TokenKind::keyword(word).unwrap_or_else(|| TokenKind::Ident(word.to_string()))
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '$'
}

fn is_ident_char(c: char) -> bool {
    is_ident_start(c) || c.is_ascii_digit()
}
