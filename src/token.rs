use std::{fmt, ops::Range};

use crate::lexer;

#[derive(Copy, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    lo: usize,
    len: u32,
}

impl Token {
    pub fn new(kind: TokenKind, span: Span) -> Token {
        Token {
            kind,
            len: span.len,
            lo: span.lo,
        }
    }

    /// Returns an EOF token positioned at the end of the provided source.
    pub fn eof_for(src: &str) -> Token {
        Token::new(TokenKind::Eof, Span::new_of_length(src.len(), 0))
    }

    pub fn span(&self) -> Span {
        Span {
            len: self.len,
            lo: self.lo,
        }
    }

    pub fn is_eof(&self) -> bool {
        self.kind == TokenKind::Eof
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Token({:?}, {})", self.kind, self.span())
    }
}

#[derive(Copy, Clone, PartialEq, Eq, Hash, Default)]
pub struct Span {
    pub len: u32,
    pub lo: usize,
}

impl Span {
    pub fn new_of_bounds(Range { start: lo, end: hi }: Range<usize>) -> Span {
        debug_assert!(hi >= lo);
        Self::new_of_length(lo, u32::try_from(hi - lo).unwrap_or(u32::MAX))
    }

    pub fn new_of_length(lo: usize, len: u32) -> Span {
        Span { len, lo }
    }

    pub fn hi(self) -> usize {
        self.lo + self.len as usize
    }

    /// Returns a span that covers both `self` and `other`.
    pub fn to(self, other: Span) -> Span {
        Span::new_of_bounds(self.lo.min(other.lo)..self.hi().max(other.hi()))
    }

    /// Shrinks the span by the given amounts on each side.
    pub fn shrink(self, lo: usize, hi: usize) -> Span {
        let new_lo = (self.lo + lo).min(self.hi());
        let new_hi = self.hi().saturating_sub(hi).max(new_lo);
        Span::new_of_bounds(new_lo..new_hi)
    }

    pub fn substr(self, src: &str) -> &str {
        &src[self.lo..self.hi()]
    }

    pub fn wrap<T>(self, inner: T) -> Spanned<T> {
        Spanned { span: self, inner }
    }
}

impl fmt::Debug for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Span({self}, len: {})", self.len)
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let lo = self.lo;
        let hi = self.hi();
        write!(f, "{lo}..{hi}")
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Spanned<T> {
    pub span: Span,
    pub inner: T,
}

/// The way a string literal was written, which determines how its contents
/// are decoded.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum StringKind {
    /// `"..."`
    Cooked,
    /// `'...'`
    Raw,
    /// `"""..."""`
    IndentedCooked,
    /// `'''...'''`
    IndentedRaw,
}

impl StringKind {
    pub fn delimiter(self) -> &'static str {
        match self {
            StringKind::Cooked => "\"",
            StringKind::Raw => "'",
            StringKind::IndentedCooked => "\"\"\"",
            StringKind::IndentedRaw => "'''",
        }
    }

    pub fn is_cooked(self) -> bool {
        matches!(self, StringKind::Cooked | StringKind::IndentedCooked)
    }

    pub fn is_indented(self) -> bool {
        matches!(self, StringKind::IndentedCooked | StringKind::IndentedRaw)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TokenKind {
    At,
    Colon,
    /// `:=`
    ColonEq,
    Eq,
    /// `==`
    EqEq,
    /// `!=`
    BangEq,
    /// `=~`
    EqTilde,
    Plus,
    Slash,
    Star,
    Dollar,
    Comma,
    /// `&&`
    AmpAmp,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,

    Identifier,
    String(StringKind),
    Backtick {
        indented: bool,
    },
    Comment,

    /// A `#!` line at the very start of the input.
    Shebang,
    Whitespace,
    Eol,

    /// Opens a recipe body. Spans the body's indentation.
    Indent,
    /// Closes a recipe body.
    Dedent,
    /// Literal body text.
    Text,
    /// `{{{{`, a literal `{{` inside a body line.
    EscapedBraces,
    /// `{{`
    InterpolationStart,
    /// `}}`
    InterpolationEnd,

    Eof,
    Error(lexer::Error),
}

impl TokenKind {
    pub fn is_trivia(self) -> bool {
        matches!(self, TokenKind::Whitespace | TokenKind::Shebang)
    }

    pub fn is_error(self) -> bool {
        matches!(self, TokenKind::Error(_))
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use TokenKind::*;
        let s = match self {
            At => "'@'",
            Colon => "':'",
            ColonEq => "':='",
            Eq => "'='",
            EqEq => "'=='",
            BangEq => "'!='",
            EqTilde => "'=~'",
            Plus => "'+'",
            Slash => "'/'",
            Star => "'*'",
            Dollar => "'$'",
            Comma => "','",
            AmpAmp => "'&&'",
            LParen => "'('",
            RParen => "')'",
            LBrace => "'{'",
            RBrace => "'}'",
            LBracket => "'['",
            RBracket => "']'",
            Identifier => "identifier",
            String(_) => "string",
            Backtick { .. } => "backtick",
            Comment => "comment",
            Shebang => "shebang",
            Whitespace => "whitespace",
            Eol => "end of line",
            Indent => "indentation",
            Dedent => "end of recipe body",
            Text => "text",
            EscapedBraces => "'{{{{'",
            InterpolationStart => "'{{'",
            InterpolationEnd => "'}}'",
            Eof => "end of file",
            Error(error) => return write!(f, "{error}"),
        };
        f.write_str(s)
    }
}
