//! Token types for Bramble story source.

use crate::span::Span;

/// A token from lexical analysis.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// The type and value of this token.
    pub kind: TokenKind,
    /// Source location of this token.
    pub span: Span,
}

impl Token {
    /// Creates a new token.
    #[must_use]
    pub const fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

/// Token types for Bramble story source.
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
    // Delimiters
    /// `(`
    LParen,
    /// `)`
    RParen,
    /// `[`
    LBracket,
    /// `]`
    RBracket,
    /// `{`
    LBrace,
    /// `}`
    RBrace,

    // Punctuation
    /// `.`
    Dot,
    /// `,`
    Comma,
    /// `;`
    Semicolon,
    /// `:`
    Colon,
    /// `=`
    Equals,

    // Keywords
    /// `story`
    Story,
    /// `let`
    Let,
    /// `fun`
    Fun,
    /// `override`
    Override,
    /// `object`
    Object,
    /// `on`
    On,
    /// `if`
    If,
    /// `else`
    Else,
    /// `abstract`
    Abstract,
    /// `true`
    True,
    /// `false`
    False,

    // Literals
    /// Number literal like `3` or `0.5`
    Number(f64),
    /// String literal like `"A small room."`
    String(String),
    /// Identifier like `startingRoom`
    Ident(String),

    // Meta
    /// `//` comment text
    Comment(String),
    /// End of input
    Eof,
    /// Lexer error
    Error(String),
}

impl TokenKind {
    /// Returns true if this token kind should be ignored during parsing.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Comment(_))
    }

    /// Maps a word to its keyword token, if it is reserved.
    #[must_use]
    pub fn keyword(word: &str) -> Option<Self> {
        Some(match word {
            "story" => Self::Story,
            "let" => Self::Let,
            "fun" => Self::Fun,
            "override" => Self::Override,
            "object" => Self::Object,
            "on" => Self::On,
            "if" => Self::If,
            "else" => Self::Else,
            "abstract" => Self::Abstract,
            "true" => Self::True,
            "false" => Self::False,
            _ => return None,
        })
    }

    /// Returns a human-readable name for this token kind.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LParen => "'('",
            Self::RParen => "')'",
            Self::LBracket => "'['",
            Self::RBracket => "']'",
            Self::LBrace => "'{'",
            Self::RBrace => "'}'",
            Self::Dot => "'.'",
            Self::Comma => "','",
            Self::Semicolon => "';'",
            Self::Colon => "':'",
            Self::Equals => "'='",
            Self::Story => "'story'",
            Self::Let => "'let'",
            Self::Fun => "'fun'",
            Self::Override => "'override'",
            Self::Object => "'object'",
            Self::On => "'on'",
            Self::If => "'if'",
            Self::Else => "'else'",
            Self::Abstract => "'abstract'",
            Self::True => "'true'",
            Self::False => "'false'",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Ident(_) => "identifier",
            Self::Comment(_) => "comment",
            Self::Eof => "end of input",
            Self::Error(_) => "error",
        }
    }
}
