use std::fmt;

use crate::{analysis, parser, source::Source, token::Span, token::Spanned};

/// Why a justfile could not be compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    Parse(Spanned<parser::Error>),
    Analysis(Spanned<analysis::Error>),
}

impl Error {
    pub fn span(&self) -> Span {
        match self {
            Error::Parse(error) => error.span,
            Error::Analysis(error) => error.span,
        }
    }

    /// Renders the error along with its location in `text`, the input the
    /// error was reported for.
    pub fn render(&self, text: &str) -> String {
        let source = Source::new(text);
        let (line, column) = source.location_of(self.span().lo);
        format!("error: {self}\n  --> line {line}, column {column}")
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Parse(error) => write!(f, "{error}"),
            Error::Analysis(error) => write!(f, "{error}"),
        }
    }
}

impl std::error::Error for Error {}
