use log::debug;

use crate::{
    ast::{
        Alias, Assignment, BinaryOperator, Comparison, Condition, Conditional, Dependency, Expr,
        ExprKind, Fragment, Ident, Item, ItemKind, Justfile, Line, LinePrefix, Parameter, Recipe,
        Setting, SettingValue, Variadic, VariadicKind,
    },
    lexer::{self, extract},
    token::{Span, Spanned, Token, TokenKind},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// The value each known setting takes.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SettingKind {
    /// `set NAME` or `set NAME := true|false`
    Bool,
    /// `set NAME := 'string'`
    String,
    /// `set NAME := ['string', ...]`
    List,
}

static SETTINGS: phf::Map<&'static str, SettingKind> = phf::phf_map! {
    "allow-duplicate-recipes" => SettingKind::Bool,
    "dotenv-load" => SettingKind::Bool,
    "export" => SettingKind::Bool,
    "fallback" => SettingKind::Bool,
    "ignore-comments" => SettingKind::Bool,
    "positional-arguments" => SettingKind::Bool,
    "windows-powershell" => SettingKind::Bool,
    "tempdir" => SettingKind::String,
    "shell" => SettingKind::List,
    "windows-shell" => SettingKind::List,
};

/// Parses a whole (already preprocessed) justfile.
///
/// The first syntax error aborts the parse.
pub fn parse_justfile(src: &str, tokens: &mut Vec<Token>) -> Result<Justfile> {
    parse(src, tokens, Parser::parse_justfile)
}

/// Parses a single expression, which must span the whole input.
pub fn parse_expr(src: &str, tokens: &mut Vec<Token>) -> Result<Expr> {
    parse(src, tokens, |p| {
        let expr = p.parse_expr()?;
        p.consume(TokenKind::Eof)?;
        Ok(expr)
    })
}

fn parse<'src, 'tok, T>(
    src: &'src str,
    tokens: &'tok mut Vec<Token>,
    f: impl for<'a> FnOnce(&'a mut Parser<'src, 'tok>) -> Result<T>,
) -> Result<T> {
    assert!(tokens.is_empty());

    lexer::lex(src, tokens);
    debug!("lexed {} tokens", tokens.len());

    let mut p = Parser::new(src, tokens);
    f(&mut p)
}

struct Parser<'src, 'tok> {
    src: &'src str,
    tokens: &'tok mut Vec<Token>,
    cursor: usize,
    /// Span of the last consumed token.
    last: Span,
}

impl Parser<'_, '_> {
    fn parse_justfile(&mut self) -> Result<Justfile> {
        let mut items = Vec::with_capacity(32);
        while self.except([]) {
            items.push(self.parse_item()?);
        }
        self.consume(TokenKind::Eof)?;
        while items.last().is_some_and(|item| item.kind == ItemKind::Blank) {
            items.pop();
        }
        debug!("parsed {} items", items.len());
        Ok(Justfile { items })
    }

    fn parse_item(&mut self) -> Result<Item> {
        let start = self.peek().span();
        let attributes = self.parse_attributes()?;

        let token = self.peek();
        let kind = match token.kind {
            TokenKind::Eol if attributes.is_empty() => {
                self.advance();
                ItemKind::Blank
            }
            TokenKind::Comment if attributes.is_empty() => {
                self.advance();
                let text = token.span().substr(self.src);
                let text = text.trim_start_matches('#').trim();
                self.parse_eol()?;
                ItemKind::Comment(text.into())
            }
            TokenKind::At => ItemKind::Recipe(self.parse_recipe()?),
            TokenKind::Identifier => self.parse_named_item()?,
            TokenKind::Indent => return Err(token.span().wrap(Error::UnexpectedIndent)),
            _ => {
                return Err(self.unexpected_any(
                    token,
                    &[TokenKind::Identifier, TokenKind::At, TokenKind::Comment, TokenKind::Eol],
                ));
            }
        };

        let span = match kind {
            ItemKind::Blank => token.span(),
            _ => start.to(self.last),
        };
        Ok(Item {
            attributes,
            kind,
            span,
        })
    }

    /// Parses `[name, ...]` lines. Blank lines after an attribute are allowed.
    fn parse_attributes(&mut self) -> Result<Vec<Ident>> {
        let mut attributes = Vec::new();
        while self.take(TokenKind::LBracket) {
            let names = self.parse_list(TokenKind::RBracket, TokenKind::Comma, Parser::parse_ident)?;
            self.consume(TokenKind::RBracket)?;
            self.parse_eol()?;
            while self.take(TokenKind::Eol) {}
            attributes.extend(names);
        }
        Ok(attributes)
    }

    /// Distinguishes the items which start with a name. The keywords are
    /// contextual, so `alias`, `export` and `set` remain valid names.
    fn parse_named_item(&mut self) -> Result<ItemKind> {
        let second = self.peek_nth(1).kind;
        let third = self.peek_nth(2).kind;

        if self.is_keyword("alias") && second == TokenKind::Identifier && third == TokenKind::ColonEq {
            self.advance();
            let name = self.parse_ident()?;
            self.consume(TokenKind::ColonEq)?;
            let target = self.parse_ident()?;
            self.parse_eol()?;
            return Ok(ItemKind::Alias(Alias { name, target }));
        }

        if self.is_keyword("export") && second == TokenKind::Identifier && third == TokenKind::ColonEq {
            self.advance();
            return Ok(ItemKind::Export(self.parse_assignment()?));
        }

        if self.is_keyword("set")
            && second == TokenKind::Identifier
            && matches!(
                third,
                TokenKind::ColonEq | TokenKind::Eol | TokenKind::Comment | TokenKind::Eof
            )
        {
            self.advance();
            return Ok(ItemKind::Setting(self.parse_setting()?));
        }

        if second == TokenKind::ColonEq {
            return Ok(ItemKind::Assignment(self.parse_assignment()?));
        }

        Ok(ItemKind::Recipe(self.parse_recipe()?))
    }

    fn parse_assignment(&mut self) -> Result<Assignment> {
        let name = self.parse_ident()?;
        self.consume(TokenKind::ColonEq)?;
        let value = self.parse_expr()?;
        self.parse_eol()?;
        Ok(Assignment { name, value })
    }

    fn parse_setting(&mut self) -> Result<Setting> {
        let name = self.parse_ident()?;
        let Some(&kind) = SETTINGS.get(&*name.name) else {
            return Err(name.span.wrap(Error::UnknownSetting(name.name)));
        };

        let value = match kind {
            SettingKind::Bool => {
                if self.take(TokenKind::ColonEq) {
                    let token = self.advance();
                    match (token.kind, token.span().substr(self.src)) {
                        (TokenKind::Identifier, "true") => SettingValue::Bool(true),
                        (TokenKind::Identifier, "false") => SettingValue::Bool(false),
                        (TokenKind::Error(error), _) => {
                            return Err(token.span().wrap(Error::Lexer(error)));
                        }
                        _ => {
                            let error = Error::InvalidSettingValue(name.name);
                            return Err(token.span().wrap(error));
                        }
                    }
                } else {
                    SettingValue::Bool(true)
                }
            }
            SettingKind::String => {
                self.consume(TokenKind::ColonEq)?;
                SettingValue::String(self.parse_string(&name)?)
            }
            SettingKind::List => {
                self.consume(TokenKind::ColonEq)?;
                self.consume(TokenKind::LBracket)?;
                let list =
                    self.parse_list(TokenKind::RBracket, TokenKind::Comma, |p| p.parse_string(&name))?;
                self.consume(TokenKind::RBracket)?;
                SettingValue::List(list)
            }
        };

        self.parse_eol()?;
        Ok(Setting { name, value })
    }

    fn parse_string(&mut self, setting: &Ident) -> Result<Box<str>> {
        let token = self.peek();
        match token.kind {
            TokenKind::String(_) => {
                self.advance();
                Ok(extract::string(token, self.src))
            }
            TokenKind::Error(error) => Err(token.span().wrap(Error::Lexer(error))),
            _ => Err(token
                .span()
                .wrap(Error::InvalidSettingValue(setting.name.clone()))),
        }
    }

    fn parse_recipe(&mut self) -> Result<Recipe> {
        let quiet = self.take(TokenKind::At);
        let name = self.parse_ident()?;

        let mut parameters: Vec<Parameter> = Vec::new();
        while self.is(TokenKind::Identifier) || self.is(TokenKind::Dollar) {
            let start = self.peek();
            let parameter = self.parse_parameter()?;
            let after_default = parameters.last().is_some_and(|p| p.default.is_some());
            if after_default && parameter.default.is_none() {
                return Err(start.span().to(self.last).wrap(Error::Unexpected {
                    actual: self.peek().kind,
                    expected: TokenKind::Eq,
                }));
            }
            parameters.push(parameter);
        }

        let variadic = match self.peek().kind {
            TokenKind::Star | TokenKind::Plus => {
                let sigil = self.advance();
                let kind = if sigil.kind == TokenKind::Star {
                    VariadicKind::ZeroOrMore
                } else {
                    VariadicKind::OneOrMore
                };
                let param = self.parse_parameter()?;
                if param.default.is_none() && parameters.iter().any(|p| p.default.is_some()) {
                    let span = sigil.span().to(param.name.span);
                    return Err(span.wrap(Error::VariadicAfterDefaults(name.name)));
                }
                Some(Variadic { kind, param })
            }
            _ => None,
        };

        self.consume(TokenKind::Colon)?;

        let mut before = Vec::new();
        while self.is(TokenKind::Identifier) || self.is(TokenKind::LParen) {
            before.push(self.parse_dependency()?);
        }

        let mut after = Vec::new();
        if self.take(TokenKind::AmpAmp) {
            after.push(self.parse_dependency()?);
            while self.is(TokenKind::Identifier) || self.is(TokenKind::LParen) {
                after.push(self.parse_dependency()?);
            }
        }

        self.parse_eol()?;
        let body = if self.is(TokenKind::Indent) {
            self.parse_body()?
        } else {
            Vec::new()
        };

        Ok(Recipe {
            name,
            quiet,
            parameters,
            variadic,
            before,
            after,
            body,
        })
    }

    fn parse_parameter(&mut self) -> Result<Parameter> {
        let export = self.take(TokenKind::Dollar);
        let name = self.parse_ident()?;
        let default = if self.take(TokenKind::Eq) {
            Some(self.parse_value()?)
        } else {
            None
        };
        Ok(Parameter {
            name,
            export,
            default,
        })
    }

    fn parse_dependency(&mut self) -> Result<Dependency> {
        if !self.take(TokenKind::LParen) {
            let name = self.parse_ident()?;
            return Ok(Dependency {
                name,
                args: Vec::new(),
            });
        }
        let name = self.parse_ident()?;
        let mut args = Vec::new();
        while self.except([TokenKind::RParen]) {
            args.push(self.parse_expr()?);
        }
        self.consume(TokenKind::RParen)?;
        Ok(Dependency { name, args })
    }

    fn parse_body(&mut self) -> Result<Vec<Line>> {
        self.consume(TokenKind::Indent)?;
        let mut lines = Vec::new();
        loop {
            match self.peek().kind {
                TokenKind::Dedent => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => break,
                _ => lines.push(self.parse_line()?),
            }
        }
        Ok(lines)
    }

    fn parse_line(&mut self) -> Result<Line> {
        let start = self.peek().span();
        let mut span = Span::new_of_length(start.lo, 0);
        let mut fragments: Vec<Fragment> = Vec::new();

        let push_text = |fragments: &mut Vec<Fragment>, text: &str| match fragments.last_mut() {
            Some(Fragment::Text(last)) => *last = format!("{last}{text}").into_boxed_str(),
            _ => fragments.push(Fragment::Text(text.into())),
        };

        loop {
            let token = self.peek();
            match token.kind {
                TokenKind::Text => {
                    self.advance();
                    push_text(&mut fragments, extract::text(token, self.src));
                }
                TokenKind::EscapedBraces => {
                    self.advance();
                    push_text(&mut fragments, "{{");
                }
                TokenKind::InterpolationStart => {
                    self.advance();
                    let expr = self.parse_expr()?;
                    self.consume(TokenKind::InterpolationEnd)?;
                    fragments.push(Fragment::Interpolation(expr));
                }
                TokenKind::Eol | TokenKind::Dedent | TokenKind::Eof => break,
                _ => {
                    return Err(self.unexpected_any(
                        token,
                        &[TokenKind::Text, TokenKind::InterpolationStart, TokenKind::Eol],
                    ));
                }
            }
            span = start.to(self.last);
        }
        self.take(TokenKind::Eol);

        let prefix = strip_line_prefix(&mut fragments);
        Ok(Line {
            prefix,
            fragments,
            span,
        })
    }

    fn parse_ident(&mut self) -> Result<Ident> {
        let token = self.consume(TokenKind::Identifier)?;
        Ok(Ident {
            name: extract::ident(token, self.src),
            span: token.span(),
        })
    }

    /// Parses the end of an item: an optional comment and a line break.
    fn parse_eol(&mut self) -> Result<()> {
        self.take(TokenKind::Comment);
        if !self.is(TokenKind::Eof) {
            self.consume(TokenKind::Eol)?;
        }
        Ok(())
    }

    pub(crate) fn parse_expr(&mut self) -> Result<Expr> {
        if self.is_keyword("if") {
            return self.parse_conditional();
        }

        // A division without a left operand joins onto an empty string.
        if self.is(TokenKind::Slash) {
            let slash = self.advance();
            let rhs = self.parse_expr()?;
            let lhs = Expr {
                kind: ExprKind::String("".into()),
                span: Span::new_of_length(slash.span().lo, 0),
            };
            return Ok(binary(BinaryOperator::Div, lhs, rhs));
        }

        let lhs = self.parse_value()?;
        let op = match self.peek().kind {
            TokenKind::Slash => BinaryOperator::Div,
            TokenKind::Plus => BinaryOperator::Add,
            _ => return Ok(lhs),
        };
        self.advance();
        let rhs = self.parse_expr()?;
        Ok(binary(op, lhs, rhs))
    }

    fn parse_conditional(&mut self) -> Result<Expr> {
        let if_token = self.advance();

        let lhs = self.parse_expr()?;
        let op = match self
            .consume_any(&[TokenKind::EqEq, TokenKind::BangEq, TokenKind::EqTilde])?
            .kind
        {
            TokenKind::EqEq => Comparison::Eq,
            TokenKind::BangEq => Comparison::Neq,
            TokenKind::EqTilde => Comparison::RegexEq,
            _ => unreachable!(),
        };
        let rhs = self.parse_expr()?;

        self.consume(TokenKind::LBrace)?;
        let then = self.parse_expr()?;
        self.consume(TokenKind::RBrace)?;

        if !self.is_keyword("else") {
            let c = self.peek();
            return Err(self.unexpected(c, TokenKind::Identifier));
        }
        self.advance();

        let otherwise = if self.is_keyword("if") {
            self.parse_conditional()?
        } else {
            self.consume(TokenKind::LBrace)?;
            let otherwise = self.parse_expr()?;
            self.consume(TokenKind::RBrace)?;
            otherwise
        };

        let conditional = Conditional {
            condition: Condition { op, lhs, rhs },
            then,
            otherwise,
        };
        Ok(Expr {
            kind: ExprKind::Conditional(Box::new(conditional)),
            span: if_token.span().to(self.last),
        })
    }

    fn parse_value(&mut self) -> Result<Expr> {
        let token = self.advance();
        let kind = match token.kind {
            TokenKind::Identifier => {
                let name = Ident {
                    name: extract::ident(token, self.src),
                    span: token.span(),
                };
                // Calls need the parenthesis right after the name.
                let next = self.peek();
                if next.kind == TokenKind::LParen && next.span().lo == token.span().hi() {
                    self.advance();
                    let args = self.parse_list(TokenKind::RParen, TokenKind::Comma, Parser::parse_expr)?;
                    self.consume(TokenKind::RParen)?;
                    ExprKind::Call { name, args }
                } else {
                    ExprKind::Variable(name)
                }
            }
            TokenKind::LParen => {
                let mut expr = self.parse_expr()?;
                let end = self.consume(TokenKind::RParen)?;
                expr.span = token.span().to(end.span());
                return Ok(expr);
            }
            TokenKind::String(_) => ExprKind::String(extract::string(token, self.src)),
            TokenKind::Backtick { .. } => ExprKind::Backtick(extract::backtick(token, self.src)),
            TokenKind::Error(error) => return Err(token.span().wrap(Error::Lexer(error))),
            other => {
                return Err(token.span().wrap(Error::UnexpectedTokenInExpr { token: other }));
            }
        };

        Ok(Expr {
            kind,
            span: token.span().to(self.last),
        })
    }

    /// Parses `item (separator item)* separator?` until `end_delim` is found.
    /// Does **NOT** consume the end delimiter.
    fn parse_list<T>(
        &mut self,
        end_delim: TokenKind,
        separator: TokenKind,
        mut parse_item: impl FnMut(&mut Self) -> Result<T>,
    ) -> Result<Vec<T>> {
        debug_assert_ne!(end_delim, separator);

        let mut items = Vec::new();
        while self.except([end_delim]) {
            items.push(parse_item(self)?);
            if !self.take(separator) {
                if self.is(end_delim) {
                    break;
                }
                let c = self.peek();
                return Err(self.unexpected_any(c, &[separator, end_delim]));
            }
        }
        Ok(items)
    }
}

fn binary(op: BinaryOperator, lhs: Expr, rhs: Expr) -> Expr {
    Expr {
        span: lhs.span.to(rhs.span),
        kind: ExprKind::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        },
    }
}

/// Removes the `@`/`-` markers from the start of a body line.
fn strip_line_prefix(fragments: &mut Vec<Fragment>) -> LinePrefix {
    let Some(Fragment::Text(text)) = fragments.first_mut() else {
        return LinePrefix::default();
    };
    let marker = ["@-", "-@", "@", "-"]
        .into_iter()
        .find(|marker| text.starts_with(marker));
    let Some(marker) = marker else {
        return LinePrefix::default();
    };

    let rest = &text[marker.len()..];
    if rest.is_empty() {
        fragments.remove(0);
    } else {
        *text = rest.into();
    }
    LinePrefix {
        toggle_echo: marker.contains('@'),
        ignore_error: marker.contains('-'),
    }
}

impl Parser<'_, '_> {
    fn new<'src, 'tok>(src: &'src str, tokens: &'tok mut Vec<Token>) -> Parser<'src, 'tok> {
        let mut p = Parser {
            src,
            tokens,
            cursor: 0,
            last: Span::default(),
        };
        p.setup();
        p
    }

    /// Setups the parser, skipping any trivia if necessary.
    fn setup(&mut self) {
        while self.peek().kind.is_trivia() {
            self.cursor += 1;
        }
    }

    /// Returns the current token.
    #[inline]
    fn peek(&self) -> Token {
        match self.tokens.get(self.cursor) {
            Some(token) => *token,
            None => Token::eof_for(self.src),
        }
    }

    /// Returns the `n`-th non-trivia token after the current one.
    fn peek_nth(&self, n: usize) -> Token {
        self.tokens[self.cursor.min(self.tokens.len())..]
            .iter()
            .filter(|token| !token.kind.is_trivia())
            .nth(n)
            .copied()
            .unwrap_or_else(|| Token::eof_for(self.src))
    }

    /// Returns the current token and advances. Skips any trivia.
    ///
    /// Layout tokens are not recorded as the last consumed token, so that
    /// item spans end at their last meaningful token.
    fn advance(&mut self) -> Token {
        let c = self.peek(); // Before any advancement
        if !matches!(
            c.kind,
            TokenKind::Eof | TokenKind::Eol | TokenKind::Indent | TokenKind::Dedent
        ) {
            self.last = c.span();
        }
        while {
            self.cursor += 1;
            self.peek().kind.is_trivia()
        } {}
        c
    }

    /// Checks whether the current token matches the given one.
    fn is(&self, expect: TokenKind) -> bool {
        self.peek().kind == expect
    }

    /// Checks whether the current token is the given contextual keyword.
    fn is_keyword(&self, keyword: &str) -> bool {
        let c = self.peek();
        c.kind == TokenKind::Identifier && c.span().substr(self.src) == keyword
    }

    /// Advances if the current token matches the provided one, returning true.
    /// If not, returns false and doesn't advance.
    fn take(&mut self, expect: TokenKind) -> bool {
        if self.is(expect) {
            self.advance();
            true
        } else {
            false
        }
    }

    /// Advances if the current token matches the provided one. If not,
    /// returns an error.
    fn consume(&mut self, expect: TokenKind) -> Result<Token> {
        let c = self.peek();
        if self.is(expect) {
            self.advance();
            Ok(c)
        } else {
            Err(self.unexpected(c, expect))
        }
    }

    /// Advances if the current token matches any of the provided tokens. If
    /// not, returns an error.
    fn consume_any(&mut self, expect: &'static [TokenKind]) -> Result<Token> {
        for t in expect {
            if self.is(*t) {
                return Ok(self.advance());
            }
        }
        let c = self.peek();
        Err(self.unexpected_any(c, expect))
    }

    /// Returns true while the current token does *not* match one of the
    /// provided ones. [`TokenKind::Eof`] is implicitly included in the list.
    ///
    /// This won't advance the cursor.
    fn except(&mut self, except: impl IntoIterator<Item = TokenKind>) -> bool {
        let c = self.peek();
        for e in except {
            if c.kind == e {
                return false;
            }
        }
        c.kind != TokenKind::Eof
    }

    fn unexpected(&self, actual: Token, expected: TokenKind) -> Spanned<Error> {
        let error = match actual.kind {
            TokenKind::Error(error) => Error::Lexer(error),
            kind => Error::Unexpected {
                actual: kind,
                expected,
            },
        };
        actual.span().wrap(error)
    }

    fn unexpected_any(&self, actual: Token, expected: &[TokenKind]) -> Spanned<Error> {
        let error = match actual.kind {
            TokenKind::Error(error) => Error::Lexer(error),
            kind => Error::UnexpectedAny {
                actual: kind,
                expected: Box::from(expected),
            },
        };
        actual.span().wrap(error)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    UnexpectedTokenInExpr {
        token: TokenKind,
    },
    Unexpected {
        actual: TokenKind,
        expected: TokenKind,
    },
    UnexpectedAny {
        actual: TokenKind,
        expected: Box<[TokenKind]>,
    },
    /// An indented line which doesn't belong to a recipe.
    UnexpectedIndent,
    UnknownSetting(Box<str>),
    InvalidSettingValue(Box<str>),
    /// Holds the recipe name.
    VariadicAfterDefaults(Box<str>),
    Lexer(lexer::Error),
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::*;

    pub fn parse_justfile(src: &str) -> Justfile {
        let source = crate::source::Source::new(src);
        super::parse_justfile(source.text(), &mut Vec::with_capacity(512)).expect("failed to parse")
    }

    pub fn parse_expr(src: &str) -> Expr {
        super::parse_expr(src, &mut Vec::with_capacity(64)).expect("failed to parse")
    }
}

#[cfg(test)]
mod tests {
    use crate::util::test_utils::tree_tests;

    tree_tests!(
        use parser;

        fn test_string_literals() {
            let expr = r#""a\tb""#;
            let tree_ok = r#"string "a\tb" (0..6)"#;
        }

        fn test_sum_nests_to_the_right() {
            let expr = "a + 'b' + c";
            let tree_ok = r#"
                binary Add (0..11)
                  variable a (0..1)
                  binary Add (4..11)
                    string "b" (4..7)
                    variable c (10..11)
            "#;
        }

        fn test_division_binds_looser_than_sum() {
            let expr = "a / 'b' + c";
            let tree_ok = r#"
                binary Div (0..11)
                  variable a (0..1)
                  binary Add (4..11)
                    string "b" (4..7)
                    variable c (10..11)
            "#;
        }

        fn test_division_without_left_operand() {
            let expr = "/ 'usr'";
            let tree_ok = r#"
                binary Div (0..7)
                  string "" (0..0)
                  string "usr" (2..7)
            "#;
        }

        fn test_call_and_variable() {
            let expr = "join(a, 'b',) + c";
            let tree_ok = r#"
                binary Add (0..17)
                  call join (0..13)
                    variable a (5..6)
                    string "b" (8..11)
                  variable c (16..17)
            "#;
        }

        fn test_call_requires_adjacent_parenthesis() {
            let expr = "join (c)";
            let expected_errors = &["5..6: expected end of file, but got '('"];
        }

        fn test_conditional() {
            let expr = "if a =~ 'b+' { `x` } else if a != '' { 'y' } else { z }";
            let tree_ok = r#"
                conditional RegexEq (0..55)
                  variable a (3..4)
                  string "b+" (8..12)
                  backtick "x" (15..18)
                  conditional Neq (26..55)
                    variable a (29..30)
                    string "" (34..36)
                    string "y" (39..42)
                    variable z (52..53)
            "#;
        }

        fn test_conditional_requires_else() {
            let expr = "if a == b { c }";
            let expected_errors = &["15..15: expected identifier, but got end of file"];
        }

        fn test_parenthesized_value() {
            let expr = "(a + b)";
            let tree_ok = "
                binary Add (0..7)
                  variable a (1..2)
                  variable b (5..6)
            ";
        }

        fn test_unclosed_string() {
            let expr = "'abc";
            let expected_errors = &["0..4: unterminated string"];
        }

        fn test_unexpected_token_in_expr() {
            let expr = "a + :";
            let expected_errors = &["4..5: unexpected ':' in expression"];
        }

        fn test_assignments_and_settings() {
            let justfile = r#"
                set shell := ["bash", "-c",]
                set export
                set dotenv-load := false
                x := "a" # trailing
                export y := x
            "#;
            let tree_ok = r#"
                setting shell ["bash", "-c"] (0..28)
                setting export true (29..39)
                setting dotenv-load false (40..64)
                assignment x (65..84)
                  string "a" (70..73)
                export y (85..98)
                  variable x (97..98)
            "#;
        }

        fn test_unknown_setting() {
            let justfile = "set colors := true";
            let expected_errors = &["4..10: unknown setting `colors`"];
        }

        fn test_invalid_setting_value() {
            let justfile = "set export := 'yes'";
            let expected_errors = &["14..19: invalid value for setting `export`"];
        }

        fn test_keywords_are_contextual() {
            let justfile = "
                alias := 'a'
                set:
                alias a := set
            ";
            let tree_ok = r#"
                assignment alias (0..12)
                  string "a" (9..12)
                recipe set (13..17)
                alias a -> set (18..32)
            "#;
        }

        fn test_recipe() {
            let justfile = "
                # build it
                [private, no-cd]
                @build $a b='x' +rest=(c / 'd'): lint (fmt 'all' a) && test
                  echo {{a}} {{{{b}}
                  @-rm -rf {{ rest }}

                  exit 1
            ";
            let tree_ok = r#"
                comment "build it" (0..10)
                recipe build (11..140)
                  attributes private, no-cd
                  quiet
                  parameter $a
                  parameter b
                    string "x" (40..43)
                  variadic + rest
                    binary Div (50..59)
                      variable c (51..52)
                      string "d" (55..58)
                  before
                    dependency lint
                    dependency fmt
                      string "all" (71..76)
                      variable a (77..78)
                  after
                    dependency test
                  body
                    line
                      text "echo "
                      interpolation
                        variable a (97..98)
                      text " {{b}}"
                    line @-
                      text "rm -rf "
                      interpolation
                        variable rest (123..127)
                    line
                    line
                      text "exit 1"
            "#;
        }

        fn test_blank_lines_and_comments() {
            let justfile = "
                a:
                  echo a

                # doc

                b:
            ";
            let tree_ok = r#"
                recipe a (0..11)
                  body
                    line
                      text "echo a"
                blank (12..13)
                comment "doc" (13..18)
                blank (19..20)
                recipe b (20..22)
            "#;
        }

        fn test_variadic_after_defaults() {
            let justfile = "a b='x' *c:";
            let expected_errors = &[
                r#"8..10: Variadic following parameters with default values must have default values in "a""#,
            ];
        }

        fn test_plain_parameter_after_default() {
            let justfile = "a b='x' c:";
            let expected_errors = &["8..9: expected '=', but got ':'"];
        }

        fn test_inconsistent_indentation() {
            let justfile = "
                a:
                    echo a
                  echo b
            ";
            let expected_errors = &["14..16: recipe line has inconsistent leading whitespace"];
        }

        fn test_unclosed_interpolation() {
            let justfile = "
                a:
                  echo {{ x
            ";
            let expected_errors = &["14..14: unterminated interpolation"];
        }

        fn test_stray_indentation() {
            let justfile = "
                x := 'a'
                  echo
            ";
            let expected_errors = &["9..11: unexpected indentation outside of a recipe body"];
        }
    );
}
