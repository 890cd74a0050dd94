// justfile    ::= item*
// item        ::= attribute* (recipe | alias | assignment | export | setting | comment | eol)
// attribute   ::= '[' NAME (',' NAME)* ','? ']' eol
// alias       ::= 'alias' NAME ':=' NAME eol
// assignment  ::= NAME ':=' expr eol
// export      ::= 'export' assignment
// setting     ::= 'set' NAME (':=' (boolean | string | '[' string (',' string)* ','? ']'))? eol
// recipe      ::= '@'? NAME param* (('+' | '*') param)? ':' dependency* ('&&' dependency+)? eol body?
// param       ::= '$'? NAME ('=' value)?
// dependency  ::= NAME | '(' NAME expr* ')'
// body        ::= INDENT line+ DEDENT
// line        ::= ('@-' | '-@' | '@' | '-')? (TEXT | '{{{{' | '{{' expr '}}')* eol
//
// expr        ::= 'if' condition '{' expr '}' 'else' (conditional | '{' expr '}')
//               | value? '/' expr
//               | value '+' expr
//               | value
// condition   ::= expr ('==' | '!=' | '=~') expr
// value       ::= NAME '(' (expr (',' expr)* ','?)? ')'
//               | '(' expr ')'
//               | BACKTICK
//               | STRING
//               | NAME

// Precedence
//
// if
// /
// +
// value

use std::fmt;

use crate::token::Span;

#[derive(Debug, PartialEq, Default)]
pub struct Justfile {
    pub items: Vec<Item>,
}

impl Justfile {
    /// Returns all recipes, in source order, along with their items.
    pub fn recipes(&self) -> impl Iterator<Item = (&Item, &Recipe)> {
        self.items.iter().filter_map(|item| match &item.kind {
            ItemKind::Recipe(recipe) => Some((item, recipe)),
            _ => None,
        })
    }

    pub fn aliases(&self) -> impl Iterator<Item = (&Item, &Alias)> {
        self.items.iter().filter_map(|item| match &item.kind {
            ItemKind::Alias(alias) => Some((item, alias)),
            _ => None,
        })
    }
}

#[derive(Debug, PartialEq)]
pub struct Item {
    pub attributes: Vec<Ident>,
    pub kind: ItemKind,
    pub span: Span,
}

impl Item {
    pub fn has_attribute(&self, name: &str) -> bool {
        self.attributes.iter().any(|attr| &*attr.name == name)
    }

    /// Returns the platform attributes, in source order and without repeats.
    pub fn platforms(&self) -> Vec<Platform> {
        let mut platforms = Vec::new();
        for attr in &self.attributes {
            if let Some(platform) = Platform::from_attribute(&attr.name) {
                if !platforms.contains(&platform) {
                    platforms.push(platform);
                }
            }
        }
        platforms
    }

    pub fn is_private(&self) -> bool {
        self.has_attribute("private")
            || match &self.kind {
                ItemKind::Recipe(recipe) => recipe.name.name.starts_with('_'),
                ItemKind::Alias(alias) => alias.name.name.starts_with('_'),
                _ => false,
            }
    }
}

#[derive(Debug, PartialEq)]
pub enum ItemKind {
    Recipe(Recipe),
    Alias(Alias),
    Assignment(Assignment),
    Export(Assignment),
    Setting(Setting),
    /// The comment text, without the `#` and surrounding whitespace.
    Comment(Box<str>),
    Blank,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Platform {
    Linux,
    Macos,
    Unix,
    Windows,
}

impl Platform {
    pub fn from_attribute(name: &str) -> Option<Platform> {
        Some(match name {
            "linux" => Platform::Linux,
            "macos" => Platform::Macos,
            "unix" => Platform::Unix,
            "windows" => Platform::Windows,
            _ => return None,
        })
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::Macos => "macos",
            Platform::Unix => "unix",
            Platform::Windows => "windows",
        }
    }

    /// The builtin which reports the value this platform is compared with.
    pub fn detector(self) -> &'static str {
        match self {
            Platform::Unix => "os_family",
            _ => "os",
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Alias {
    pub name: Ident,
    pub target: Ident,
}

#[derive(Debug, PartialEq)]
pub struct Assignment {
    pub name: Ident,
    pub value: Expr,
}

#[derive(Debug, PartialEq)]
pub struct Setting {
    pub name: Ident,
    pub value: SettingValue,
}

#[derive(Debug, PartialEq, Clone)]
pub enum SettingValue {
    Bool(bool),
    String(Box<str>),
    List(Vec<Box<str>>),
}

#[derive(Debug, PartialEq)]
pub struct Recipe {
    pub name: Ident,
    /// Set by a leading `@`, which stops the lines from being echoed.
    pub quiet: bool,
    pub parameters: Vec<Parameter>,
    pub variadic: Option<Variadic>,
    pub before: Vec<Dependency>,
    pub after: Vec<Dependency>,
    pub body: Vec<Line>,
}

impl Recipe {
    /// Number of leading parameters without a default value.
    pub fn required_parameters(&self) -> usize {
        self.parameters
            .iter()
            .position(|p| p.default.is_some())
            .unwrap_or(self.parameters.len())
    }

    /// Minimum number of arguments an invocation must provide.
    pub fn min_arguments(&self) -> usize {
        let variadic = self.variadic.as_ref().is_some_and(|v| {
            v.kind == VariadicKind::OneOrMore && v.param.default.is_none()
        });
        self.required_parameters() + usize::from(variadic)
    }

    /// Whether the invocation may take more than [`Recipe::min_arguments`].
    pub fn takes_at_least(&self) -> bool {
        self.variadic.is_some() || self.required_parameters() < self.parameters.len()
    }

    /// Whether the body is run as a script through its own `#!` interpreter.
    pub fn is_shebang(&self) -> bool {
        self.body
            .first()
            .and_then(|line| line.fragments.first())
            .is_some_and(|fragment| matches!(fragment, Fragment::Text(text) if text.starts_with("#!")))
    }

    /// Returns every parameter, including the variadic one.
    pub fn all_parameters(&self) -> impl Iterator<Item = &Parameter> {
        self.parameters
            .iter()
            .chain(self.variadic.as_ref().map(|v| &v.param))
    }

    /// Renders the parameter list as it would be written in the header.
    pub fn signature(&self) -> String {
        let mut parts: Vec<String> = self.parameters.iter().map(ToString::to_string).collect();
        if let Some(variadic) = &self.variadic {
            parts.push(format!("{}{}", variadic.kind.sigil(), variadic.param));
        }
        parts.join(" ")
    }
}

#[derive(Debug, PartialEq)]
pub struct Parameter {
    pub name: Ident,
    /// Set by a leading `$`.
    pub export: bool,
    pub default: Option<Expr>,
}

impl fmt::Display for Parameter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.export {
            f.write_str("$")?;
        }
        write!(f, "{}", self.name)?;
        if let Some(default) = &self.default {
            write!(f, "={default}")?;
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq)]
pub struct Variadic {
    pub kind: VariadicKind,
    pub param: Parameter,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum VariadicKind {
    /// `*`
    ZeroOrMore,
    /// `+`
    OneOrMore,
}

impl VariadicKind {
    pub fn sigil(self) -> char {
        match self {
            VariadicKind::ZeroOrMore => '*',
            VariadicKind::OneOrMore => '+',
        }
    }
}

#[derive(Debug, PartialEq)]
pub struct Dependency {
    pub name: Ident,
    pub args: Vec<Expr>,
}

#[derive(Debug, PartialEq)]
pub struct Line {
    pub prefix: LinePrefix,
    pub fragments: Vec<Fragment>,
    pub span: Span,
}

impl Line {
    pub fn interpolations(&self) -> impl Iterator<Item = &Expr> {
        self.fragments.iter().filter_map(|fragment| match fragment {
            Fragment::Interpolation(expr) => Some(expr),
            Fragment::Text(_) => None,
        })
    }
}

/// The `@`/`-` markers at the start of a body line.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
pub struct LinePrefix {
    /// `@` inverts whether the line is echoed.
    pub toggle_echo: bool,
    /// `-` ignores a failure of the line.
    pub ignore_error: bool,
}

#[derive(Debug, PartialEq)]
pub enum Fragment {
    Text(Box<str>),
    Interpolation(Expr),
}

#[derive(Debug, PartialEq)]
pub struct Expr {
    pub kind: ExprKind,
    pub span: Span,
}

#[derive(Debug, PartialEq)]
pub enum ExprKind {
    String(Box<str>),
    Variable(Ident),
    Binary {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    Backtick(Box<str>),
    Conditional(Box<Conditional>),
    Call {
        name: Ident,
        args: Vec<Expr>,
    },
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum BinaryOperator {
    /// `+`, concatenation.
    Add,
    /// `/`, concatenation with a path separator.
    Div,
}

#[derive(Debug, PartialEq)]
pub struct Conditional {
    pub condition: Condition,
    pub then: Expr,
    pub otherwise: Expr,
}

#[derive(Debug, PartialEq)]
pub struct Condition {
    pub op: Comparison,
    pub lhs: Expr,
    pub rhs: Expr,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Comparison {
    Eq,
    Neq,
    RegexEq,
}

impl Comparison {
    pub fn as_str(self) -> &'static str {
        match self {
            Comparison::Eq => "==",
            Comparison::Neq => "!=",
            Comparison::RegexEq => "=~",
        }
    }
}

#[derive(Debug, PartialEq, Clone)]
pub struct Ident {
    pub name: Box<str>,
    pub span: Span,
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Renders the expression back into source form.
///
/// Compound expressions are parenthesized at the top level only, so that a
/// rendered default value can be pasted after a parameter's `=`.
impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_expr(f, self, 0)
    }
}

impl fmt::Display for Conditional {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_conditional(f, self, 1)
    }
}

fn write_expr(f: &mut fmt::Formatter<'_>, expr: &Expr, depth: usize) -> fmt::Result {
    match &expr.kind {
        ExprKind::String(s) => return write_string_literal(f, s),
        ExprKind::Variable(name) => return write!(f, "{name}"),
        ExprKind::Backtick(command) => return write!(f, "`{command}`"),
        ExprKind::Call { name, args } => {
            write!(f, "{name}(")?;
            for (i, arg) in args.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write_expr(f, arg, depth + 1)?;
            }
            return f.write_str(")");
        }
        _ => (),
    }

    if depth == 0 {
        f.write_str("(")?;
        write_expr(f, expr, depth + 1)?;
        return f.write_str(")");
    }

    match &expr.kind {
        ExprKind::Binary { op, lhs, rhs } => {
            let op = match op {
                BinaryOperator::Add => " + ",
                BinaryOperator::Div => " / ",
            };
            // The left operand is a single value in the grammar.
            if matches!(lhs.kind, ExprKind::Binary { .. } | ExprKind::Conditional(_)) {
                write_expr(f, lhs, 0)?;
            } else {
                write_expr(f, lhs, depth + 1)?;
            }
            f.write_str(op)?;
            write_expr(f, rhs, depth + 1)
        }
        ExprKind::Conditional(conditional) => write_conditional(f, conditional, depth),
        _ => unreachable!("simple expressions are written above"),
    }
}

fn write_conditional(f: &mut fmt::Formatter<'_>, c: &Conditional, depth: usize) -> fmt::Result {
    f.write_str("if ")?;
    write_expr(f, &c.condition.lhs, depth + 1)?;
    write!(f, " {} ", c.condition.op.as_str())?;
    write_expr(f, &c.condition.rhs, depth + 1)?;
    f.write_str(" { ")?;
    write_expr(f, &c.then, depth + 1)?;
    f.write_str(" } else { ")?;
    write_expr(f, &c.otherwise, depth + 1)?;
    f.write_str(" }")
}

/// Only the escapes the lexer understands are produced, anything else is
/// written as is.
fn write_string_literal(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    use fmt::Write;
    f.write_char('"')?;
    for c in s.chars() {
        match c {
            '\\' => f.write_str("\\\\")?,
            '"' => f.write_str("\\\"")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => f.write_char(c)?,
        }
    }
    f.write_char('"')
}
