//! Compiles justfiles into self-contained POSIX sh scripts.
//!
//! The pipeline is linear: the [`source`] is preprocessed, lexed and parsed
//! into an [`ast`], the [`analysis`] validates it and collects what the
//! script needs, and [`codegen`] renders the script.

use chrono::NaiveDate;
use log::debug;

pub mod source;

/// The lexer takes the source input, mapping it into a sequence of tokens.
pub mod lexer;

/// The parser takes a sequence of tokens, mapping it into an AST.
pub mod parser;

/// The analysis validates the AST and derives the tables the code generator
/// works from.
pub mod analysis;

pub mod codegen;

pub mod ast;
pub mod builtins;
pub mod error;
pub mod names;
pub mod token;

pub mod util {
    pub mod fmt;
    #[cfg(test)]
    pub(crate) mod test_utils;
}

pub use error::Error;

/// Knobs that only change cosmetic parts of the generated script.
#[derive(Debug, Clone)]
pub struct Options {
    /// File name the script is referred to by in its banner and usage.
    pub script_name: String,
    /// Date stamped into the banner.
    pub date: NaiveDate,
}

impl Default for Options {
    fn default() -> Options {
        Options {
            script_name: "just.sh".to_owned(),
            date: chrono::Local::now().date_naive(),
        }
    }
}

/// Parses a justfile, without analyzing it.
pub fn parse(text: &str) -> Result<ast::Justfile, Error> {
    let source = source::Source::new(text);
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    parser::parse_justfile(source.text(), &mut tokens).map_err(Error::Parse)
}

/// Compiles a justfile into a shell script.
pub fn compile(text: &str, options: &Options) -> Result<String, Error> {
    let source = source::Source::new(text);
    let mut tokens = Vec::with_capacity(lexer::SUGGESTED_TOKENS_CAPACITY);
    let justfile = parser::parse_justfile(source.text(), &mut tokens).map_err(Error::Parse)?;
    debug!("parsed {} items from {} tokens", justfile.items.len(), tokens.len());

    let analysis = analysis::analyze(&justfile).map_err(Error::Analysis)?;
    let script = codegen::generate(&justfile, &analysis, &source, text, options);
    debug!("generated {} bytes of shell", script.len());
    Ok(script)
}
