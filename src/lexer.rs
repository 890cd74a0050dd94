use std::{fmt, iter::Peekable};

use crate::token::{Span, StringKind, Token, TokenKind};

pub const SUGGESTED_TOKENS_CAPACITY: usize = 1_024;

/// Lexes the provided (already preprocessed) string, producing the tokens into
/// the provided buffer.
pub fn lex(src: &str, tokens: &mut Vec<Token>) {
    Lexer::new(src, tokens).lex();
}

/// A convenience function that allocates a new buffer per lexed input and
/// returns it.
pub fn lex_in_new(src: &str) -> Vec<Token> {
    let mut tokens = Vec::with_capacity(SUGGESTED_TOKENS_CAPACITY);
    lex(src, &mut tokens);
    tokens
}

/// The justfile lexer.
///
/// Justfiles are layout sensitive: an indented line following a recipe header
/// opens the recipe body, whose lines are lexed as raw text (with embedded
/// interpolations) instead of as item tokens. The lexer handles that layout by
/// emitting [`TokenKind::Indent`] and [`TokenKind::Dedent`] around the body.
struct Lexer<'src, 'tok> {
    src: &'src str,
    iter: Peekable<std::str::Chars<'src>>,
    cursor: usize,
    current_lo: usize,
    tokens: &'tok mut Vec<Token>,
    /// Open `(`, `[` and `{` at item level. Line breaks inside them are plain
    /// whitespace.
    depth: usize,
}

impl<'src> Lexer<'src, '_> {
    /// Scans the source string until the input is exhausted.
    ///
    /// Tokens are written into the provided tokens buffer.
    fn lex(mut self) {
        assert_eq!(self.tokens.len(), 0, "must pass clean tokens buffer");

        if self.rest().starts_with("#!") {
            self.mark();
            self.skip_line();
            self.produce(TokenKind::Shebang);
        }

        loop {
            let mut next = self.scan_token_kind();
            match next {
                TokenKind::LParen | TokenKind::LBracket | TokenKind::LBrace => self.depth += 1,
                TokenKind::RParen | TokenKind::RBracket | TokenKind::RBrace => {
                    self.depth = self.depth.saturating_sub(1);
                }
                TokenKind::Eol if self.depth > 0 => next = TokenKind::Whitespace,
                _ => (),
            }
            self.produce(next);
            match next {
                TokenKind::Eof => break,
                TokenKind::Eol => self.line_start(),
                _ => (),
            }
        }
    }

    /// Tries to scan the current character as an item-level token.
    fn scan_token_kind(&mut self) -> TokenKind {
        use TokenKind::*;
        match self.mark_advance() {
            '\0' => Eof,
            '\n' => Eol,
            '@' => At,
            ':' => match self.peek() {
                '=' => self.advance_with(ColonEq),
                _ => Colon,
            },
            '=' => match self.peek() {
                '=' => self.advance_with(EqEq),
                '~' => self.advance_with(EqTilde),
                _ => Eq,
            },
            '!' => match self.peek() {
                '=' => self.advance_with(BangEq),
                _ => Error(self::Error::UnexpectedChar),
            },
            '&' => match self.peek() {
                '&' => self.advance_with(AmpAmp),
                _ => Error(self::Error::UnexpectedChar),
            },
            '+' => Plus,
            '/' => Slash,
            '*' => Star,
            '$' => Dollar,
            ',' => Comma,
            '(' => LParen,
            ')' => RParen,
            '{' => LBrace,
            '}' => RBrace,
            '[' => LBracket,
            ']' => RBracket,
            '#' => self.comment(),
            '"' => self.string(true),
            '\'' => self.string(false),
            '`' => self.backtick(),
            c if c == '_' || c.is_ascii_alphabetic() => self.identifier(),
            ' ' | '\t' | '\r' => self.whitespace(),
            _ => Error(self::Error::UnexpectedChar),
        }
    }

    /// Called at the start of every item-level line. If the line is indented
    /// (and not blank), it opens a recipe body, which is lexed to its end.
    fn line_start(&mut self) {
        let indent = leading_indent(self.rest());
        if indent.is_empty() || is_blank(self.rest()) {
            return;
        }
        self.mark();
        self.advance_by(indent.len());
        self.produce(TokenKind::Indent);
        self.body(indent);
    }

    fn body(&mut self, indent: &'src str) {
        loop {
            self.body_line();
            if self.peek() != '\n' {
                break;
            }
            self.mark_advance();
            self.produce(TokenKind::Eol);

            // Blank lines only belong to the body if it continues after them.
            let mut lookahead = self.rest();
            let mut blanks = 0;
            while !lookahead.is_empty() && is_blank(lookahead) {
                lookahead = after_line(lookahead);
                blanks += 1;
            }
            let line_indent = leading_indent(lookahead);
            if line_indent.is_empty() {
                break;
            }
            for _ in 0..blanks {
                self.skip_line();
                self.mark_advance();
                self.produce(TokenKind::Eol);
            }
            if lookahead.starts_with(indent) {
                self.advance_by(indent.len());
            } else {
                self.mark();
                self.advance_by(line_indent.len());
                self.produce(TokenKind::Error(Error::InconsistentIndentation));
            }
        }
        self.produce_spanned(TokenKind::Dedent, Span::new_of_length(self.cursor, 0));
    }

    /// Lexes one body line, up to (but excluding) its line break.
    fn body_line(&mut self) {
        self.mark();
        loop {
            match self.peek() {
                '\n' | '\0' => break,
                '{' if self.rest().starts_with("{{{{") => {
                    self.flush_text();
                    self.mark();
                    self.advance_by(4);
                    self.produce(TokenKind::EscapedBraces);
                    self.mark();
                }
                '{' if self.rest().starts_with("{{") => {
                    self.flush_text();
                    self.mark();
                    self.advance_by(2);
                    self.produce(TokenKind::InterpolationStart);
                    self.interpolation();
                    self.mark();
                }
                _ => {
                    self.advance();
                }
            }
        }
        self.flush_text();
    }

    /// Lexes the expression tokens of an interpolation, including its closing
    /// `}}`. Braces opened by the expression itself (conditionals) must be
    /// closed before `}}` is recognized.
    fn interpolation(&mut self) {
        let mut braces = 0_usize;
        loop {
            match self.peek() {
                '\n' | '\0' => {
                    let span = Span::new_of_length(self.cursor, 0);
                    self.produce_spanned(TokenKind::Error(Error::UnclosedInterpolation), span);
                    return;
                }
                '}' if braces == 0 && self.rest().starts_with("}}") => {
                    self.mark();
                    self.advance_by(2);
                    self.produce(TokenKind::InterpolationEnd);
                    return;
                }
                _ => (),
            }
            let kind = self.scan_token_kind();
            match kind {
                TokenKind::LBrace => braces += 1,
                TokenKind::RBrace => braces = braces.saturating_sub(1),
                _ => (),
            }
            self.produce(kind);
        }
    }

    /// Lexes a string token of any of the four kinds. The opening quote has
    /// already been consumed.
    ///
    /// As in the rest of the lexer, escapes are only skipped over here; they
    /// are decoded by [`extract::string`] once the token is known to be used.
    fn string(&mut self, cooked: bool) -> TokenKind {
        let indented = self.rest().starts_with(if cooked { "\"\"" } else { "''" });
        if indented {
            self.advance_by(2);
        }
        let kind = match (cooked, indented) {
            (true, false) => StringKind::Cooked,
            (false, false) => StringKind::Raw,
            (true, true) => StringKind::IndentedCooked,
            (false, true) => StringKind::IndentedRaw,
        };
        let closing = kind.delimiter();
        loop {
            if self.rest().starts_with(closing) {
                self.advance_by(closing.len());
                return TokenKind::String(kind);
            }
            match self.advance() {
                '\0' => return TokenKind::Error(Error::UnclosedString),
                '\\' if cooked => {
                    self.advance();
                }
                _ => (),
            }
        }
    }

    fn backtick(&mut self) -> TokenKind {
        let indented = self.rest().starts_with("``");
        if indented {
            self.advance_by(2);
        }
        let closing = if indented { "```" } else { "`" };
        loop {
            if self.rest().starts_with(closing) {
                self.advance_by(closing.len());
                return TokenKind::Backtick { indented };
            }
            if self.advance() == '\0' {
                return TokenKind::Error(Error::UnclosedBacktick);
            }
        }
    }

    fn comment(&mut self) -> TokenKind {
        if self.peek() == '!' {
            self.skip_line();
            return TokenKind::Error(Error::UnexpectedChar);
        }
        self.skip_line();
        TokenKind::Comment
    }

    fn identifier(&mut self) -> TokenKind {
        let valid_identifier_suffix =
            |c: char| c.is_ascii_alphanumeric() || matches!(c, '_' | '-');
        while valid_identifier_suffix(self.peek()) {
            self.advance();
        }
        TokenKind::Identifier
    }

    fn whitespace(&mut self) -> TokenKind {
        while matches!(self.peek(), ' ' | '\t' | '\r') {
            self.advance();
        }
        TokenKind::Whitespace
    }
}

impl<'src> Lexer<'src, '_> {
    /// Constructs a new lexer with the default state.
    fn new<'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Lexer<'src, 'tok> {
        Lexer {
            src,
            iter: src.chars().peekable(),
            cursor: 0,
            current_lo: 0,
            tokens,
            depth: 0,
        }
    }

    /// Starts a new token "mark" at the cursor.
    fn mark(&mut self) {
        self.current_lo = self.cursor;
    }

    /// Starts a new token "mark" and advances the iterator.
    fn mark_advance(&mut self) -> char {
        self.mark();
        self.advance()
    }

    /// Returns the next char and advances the iterator.
    fn advance(&mut self) -> char {
        self.iter
            .next()
            .inspect(|c| self.cursor += c.len_utf8())
            .unwrap_or('\0')
    }

    /// Advances over the given number of bytes.
    fn advance_by(&mut self, bytes: usize) {
        let target = self.cursor + bytes;
        while self.cursor < target && self.advance() != '\0' {}
    }

    /// Advances and returns the provided value.
    fn advance_with<T>(&mut self, value: T) -> T {
        self.advance();
        value
    }

    /// Advances up to (but excluding) the next line break.
    fn skip_line(&mut self) {
        while !matches!(self.peek(), '\n' | '\0') {
            self.advance();
        }
    }

    /// Returns the next char without advancing the iterator.
    fn peek(&mut self) -> char {
        self.iter.peek().copied().unwrap_or('\0')
    }

    /// Returns the unscanned part of the source.
    fn rest(&self) -> &'src str {
        &self.src[self.cursor..]
    }

    /// Returns the current span.
    fn span(&self) -> Span {
        Span::new_of_bounds(self.current_lo..self.cursor)
    }

    /// Produces a token using the marked bounds.
    fn produce(&mut self, kind: TokenKind) {
        self.produce_spanned(kind, self.span());
    }

    /// Produces a text token for the marked bounds, if they are not empty.
    fn flush_text(&mut self) {
        if self.cursor > self.current_lo {
            self.produce(TokenKind::Text);
        }
    }

    /// Produces a token with the provided span.
    fn produce_spanned(&mut self, kind: TokenKind, span: Span) {
        self.tokens.push(Token::new(kind, span));
    }
}

fn leading_indent(line: &str) -> &str {
    let end = line
        .find(|c: char| !matches!(c, ' ' | '\t'))
        .unwrap_or(line.len());
    &line[..end]
}

fn is_blank(text: &str) -> bool {
    let line = text.split('\n').next().unwrap_or_default();
    line.chars().all(|c| matches!(c, ' ' | '\t' | '\r'))
}

fn after_line(text: &str) -> &str {
    text.find('\n').map_or("", |i| &text[i + 1..])
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedChar,
    UnclosedString,
    UnclosedBacktick,
    UnclosedInterpolation,
    InconsistentIndentation,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Error::UnexpectedChar => "unexpected character",
            Error::UnclosedString => "unterminated string",
            Error::UnclosedBacktick => "unterminated backtick",
            Error::UnclosedInterpolation => "unterminated interpolation",
            Error::InconsistentIndentation => "recipe line has inconsistent leading whitespace",
        })
    }
}

pub mod extract {
    use super::*;

    pub fn ident(token: Token, src: &str) -> Box<str> {
        debug_assert_eq!(token.kind, TokenKind::Identifier);
        token.span().substr(src).into()
    }

    pub fn text(token: Token, src: &str) -> &str {
        debug_assert_eq!(token.kind, TokenKind::Text);
        token.span().substr(src)
    }

    pub fn string(token: Token, src: &str) -> Box<str> {
        let TokenKind::String(kind) = token.kind else {
            debug_assert!(false, "not a string token: {token:?}");
            return Box::default();
        };
        let delimiter = kind.delimiter().len();
        let raw = token.span().shrink(delimiter, delimiter).substr(src);
        let decoded = if kind.is_cooked() {
            perform_escape(raw)
        } else {
            raw.to_owned()
        };
        if kind.is_indented() {
            dedent(&decoded).into_boxed_str()
        } else {
            decoded.into_boxed_str()
        }
    }

    pub fn backtick(token: Token, src: &str) -> Box<str> {
        let TokenKind::Backtick { indented } = token.kind else {
            debug_assert!(false, "not a backtick token: {token:?}");
            return Box::default();
        };
        let delimiter = if indented { 3 } else { 1 };
        let raw = token.span().shrink(delimiter, delimiter).substr(src);
        if indented {
            dedent(raw).into_boxed_str()
        } else {
            raw.into()
        }
    }
}

fn perform_escape(raw: &str) -> String {
    let mut buf = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(char) = chars.next() {
        if char != '\\' {
            buf.push(char);
            continue;
        }
        match chars.next() {
            Some('\\') => buf.push('\\'),
            Some('"') => buf.push('"'),
            Some('n') => buf.push('\n'),
            Some('r') => buf.push('\r'),
            Some('t') => buf.push('\t'),
            // Unknown escapes are kept verbatim.
            Some(other) => {
                buf.push('\\');
                buf.push(other);
            }
            None => buf.push('\\'),
        }
    }
    buf
}

/// Removes the common indentation of an indented string or backtick.
///
/// One leading line break and one of two trailing line breaks are dropped.
/// The indentation is the leading whitespace of the common prefix of all
/// non-blank lines; blank lines are emptied.
pub fn dedent(text: &str) -> String {
    let text = text.strip_prefix('\n').unwrap_or(text);
    let text = if text.ends_with("\n\n") {
        &text[..text.len() - 1]
    } else {
        text
    };

    let lines: Vec<&str> = text.lines().collect();
    let prefix = lines
        .iter()
        .copied()
        .filter(|line| !line.trim().is_empty())
        .reduce(common_prefix)
        .unwrap_or_default();
    let indent = prefix.len() - prefix.trim_start().len();
    if indent == 0 {
        return text.to_owned();
    }

    let mut dedented = lines
        .iter()
        .map(|line| {
            if line.starts_with(prefix) {
                &line[indent..]
            } else {
                ""
            }
        })
        .collect::<Vec<_>>()
        .join("\n");
    dedented.push('\n');
    dedented
}

fn common_prefix<'a>(a: &'a str, b: &'a str) -> &'a str {
    let len = a
        .char_indices()
        .zip(b.chars())
        .take_while(|((_, x), y)| x == y)
        .last()
        .map_or(0, |((i, c), _)| i + c.len_utf8());
    &a[..len]
}
