#![allow(clippy::items_after_statements)]

use std::fmt;

use crate::{analysis, parser, token::Spanned};

impl fmt::Display for Spanned<analysis::Error> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use analysis::Error::*;
        match error {
            DuplicateSetting(name) => write!(f, "setting `{name}` has already been set"),
            UnsupportedSetting(name) => {
                write!(f, "setting `{name}` is not supported, windows shells can't be targeted")
            }
            ShellArity => write!(f, "`shell` setting must have at least two elements"),
            DuplicateRecipe { name, first } => {
                write!(f, "recipe `{name}` first defined at {first} is redefined")
            }
            UnknownFunction(name) => write!(f, "call to unknown function `{name}`"),
            FunctionArity {
                name,
                arity,
                actual,
            } => write!(f, "function `{name}` takes {arity} but got {actual}"),
            UndefinedVariable(name) => write!(f, "variable `{name}` not defined"),
            UnknownAliasTarget { alias, target } => {
                write!(f, "alias `{alias}` has an unknown target `{target}`")
            }
            UnknownDependency { recipe, dependency } => {
                write!(f, "recipe `{recipe}` has unknown dependency `{dependency}`")
            }
        }
    }
}

impl fmt::Display for Spanned<parser::Error> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Spanned { span, inner: error } = self;

        if f.alternate() {
            write!(f, "{span}: ")?;
        }

        use parser::Error::*;
        match error {
            UnexpectedTokenInExpr { token } => write!(f, "unexpected {token} in expression"),
            Unexpected { actual, expected } => {
                write!(f, "expected {expected}, but got {actual}")
            }
            UnexpectedAny { actual, expected } => {
                write!(f, "expected one of ")?;
                for (i, kind) in expected.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{kind}")?;
                }
                write!(f, ", but got {actual}")
            }
            UnexpectedIndent => write!(f, "unexpected indentation outside of a recipe body"),
            UnknownSetting(name) => write!(f, "unknown setting `{name}`"),
            InvalidSettingValue(name) => write!(f, "invalid value for setting `{name}`"),
            VariadicAfterDefaults(name) => write!(
                f,
                "Variadic following parameters with default values \
                must have default values in \"{name}\""
            ),
            Lexer(error) => write!(f, "{error}"),
        }
    }
}
