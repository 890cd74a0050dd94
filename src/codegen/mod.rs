//! Renders an analyzed justfile as a POSIX sh script.
//!
//! The script is laid out in sections: the internal functions expressions
//! call, the variables, one function per recipe, the helpers behind the
//! built-in flags and finally the command line loop which dispatches to all
//! of the above.

use std::{
    fmt::{Display, Write},
    format_args as f,
};

use crate::{
    analysis::{Analysis, Function},
    ast::{Comparison, Conditional, Justfile},
    builtins,
    names::{Names, ASSIGN_VARIABLES_GUARD},
    source::Source,
    Options,
};

mod cli;
mod evaluate;
mod recipe;

pub use evaluate::quote;

const INDENT_WIDTH: usize = 2;

/// Width of the banner and section headers.
const BORDER_WIDTH: usize = 89;

/// Code that makes the script stop on the first failure. `pipefail` is only
/// enabled where the shell knows it.
const STRICT_MODE: &str = r#"if sh -c "set -o pipefail" > /dev/null 2>&1; then
  set -euo pipefail
else
  set -eu
fi
"#;

const DOTENV: &str = r#"# Source a `.env` file
if [ -f ./.env ]; then
  TEMP_DOTENV="$(mktemp)"
  sed 's/^/export /g' ./.env > "${TEMP_DOTENV}"
  . "${TEMP_DOTENV}"
  rm "${TEMP_DOTENV}"
fi
"#;

const COLORS: &str = r#"# Display colors
SHOW_COLOR='false'
if [ -t 1 ]; then SHOW_COLOR='true'; fi
NOCOLOR="$(test "${SHOW_COLOR}" = 'true' && printf "\033[m" || echo)"
BOLD="$(test "${SHOW_COLOR}" = 'true' && printf "\033[1m" || echo)"
RED="$(test "${SHOW_COLOR}" = 'true' && printf "\033[1m\033[31m" || echo)"
YELLOW="$(test "${SHOW_COLOR}" = 'true' && printf "\033[33m" || echo)"
CYAN="$(test "${SHOW_COLOR}" = 'true' && printf "\033[36m" || echo)"
GREEN="$(test "${SHOW_COLOR}" = 'true' && printf "\033[32m" || echo)"
PINK="$(test "${SHOW_COLOR}" = 'true' && printf "\033[35m" || echo)"
BLUE="$(test "${SHOW_COLOR}" = 'true' && printf "\033[34m" || echo)"
TICK="$(printf '%s' '`')"
DOLLAR="$(printf '%s' '$')"
"#;

/// Generates the script for a justfile which passed the analysis.
///
/// `raw` is the unprocessed input, embedded for `--dump`.
pub fn generate(
    justfile: &Justfile,
    analysis: &Analysis<'_>,
    source: &Source,
    raw: &str,
    options: &Options,
) -> String {
    let mut generator = Generator::new(justfile, analysis, source, raw, options);
    generator.g_script();
    generator.code
}

pub struct Generator<'a> {
    justfile: &'a Justfile,
    analysis: &'a Analysis<'a>,
    source: &'a Source,
    raw: &'a str,
    options: &'a Options,
    names: Names,
    code: String,
    indent: usize,
}

impl<'a> Generator<'a> {
    fn new(
        justfile: &'a Justfile,
        analysis: &'a Analysis<'a>,
        source: &'a Source,
        raw: &'a str,
        options: &'a Options,
    ) -> Generator<'a> {
        Generator {
            justfile,
            analysis,
            source,
            raw,
            options,
            names: Names::new(),
            code: String::with_capacity(32 * 1024),
            indent: 0,
        }
    }

    fn g_script(&mut self) {
        self.out("#!/bin/sh");
        self.out_line();
        self.g_banner();
        self.out_line();
        self.raw(STRICT_MODE);
        self.g_functions();
        self.out_line();
        self.g_variables();
        self.out_line();
        self.g_recipes();
        self.out_line();
        self.g_helpers();
        self.out_line();
        self.g_main();
        self.out_line();
        self.out_line();
        self.g_banner();
    }

    fn g_banner(&mut self) {
        let text = format!(
            "\n\
            This script was auto-generated from a Justfile by justsh.\n\
            \n\
            Generated on {date} with justsh version {version}.\n\
            \n\
            Run `./{name} --dump` to recover the original Justfile.\n\
            \n",
            date = self.options.date.format("%Y-%m-%d"),
            version = env!("CARGO_PKG_VERSION"),
            name = self.options.script_name,
        );
        self.g_header_comment(&text);
    }

    fn g_header_comment(&mut self, text: &str) {
        let border = "#".repeat(BORDER_WIDTH);
        self.out(&border);
        for line in text.lines() {
            self.out(pad_line(&format!("# {line}")));
        }
        self.out(&border);
    }

    fn g_functions(&mut self) {
        let analysis = self.analysis;
        if analysis.functions.is_empty() {
            return;
        }

        self.out_line();
        self.out_line();
        self.g_header_comment("Internal functions");
        for (name, function) in &analysis.functions {
            self.out_line();
            match *function {
                Function::Builtin(builtin) => self.raw(builtin.snippet),
                Function::BacktickError => self.raw(builtins::BACKTICK_ERROR),
                Function::PathJoin => self.raw(builtins::PATH_JOIN),
                Function::Conditional(conditional) => self.g_conditional(name, conditional),
            }
        }
    }

    fn g_conditional(&mut self, name: &str, conditional: &Conditional) {
        let name = self.names.clean("", name);
        let condition = &conditional.condition;
        let lhs = self.evaluate(&condition.lhs);
        let rhs = self.evaluate(&condition.rhs);
        let then = self.evaluate(&conditional.then);
        let otherwise = self.evaluate(&conditional.otherwise);

        self.out(f!("{name}() {{"));
        self.indented(|this| {
            match condition.op {
                Comparison::RegexEq => {
                    this.out(f!("if echo {lhs} \\"));
                    this.out(f!("    | grep -E -e {rhs} > /dev/null; then"));
                }
                Comparison::Eq => this.out(f!("if [ {lhs} = {rhs} ]; then")),
                Comparison::Neq => this.out(f!("if [ {lhs} != {rhs} ]; then")),
            }
            this.indented(|this| {
                this.out(f!("THEN_EXPR={then} || exit \"${{?}}\""));
                this.out("echo \"${THEN_EXPR}\"");
            });
            this.out("else");
            this.indented(|this| {
                this.out(f!("ELSE_EXPR={otherwise} || exit \"${{?}}\""));
                this.out("echo \"${ELSE_EXPR}\"");
            });
            this.out("fi");
        });
        self.out("}");
    }

    fn g_variables(&mut self) {
        self.g_header_comment("Variables");
        let analysis = self.analysis;
        let settings = &analysis.settings;

        if settings.dotenv_load {
            self.out_line();
            self.raw(DOTENV);
        }

        self.out_line();
        self.out("# User-overwritable variables (via CLI)");
        if let Some(dir) = &settings.tempdir {
            self.out(f!("export TMPDIR={}", quote(dir)));
        }
        let (shell, args) = match settings.shell.as_deref().and_then(<[_]>::split_first) {
            Some((shell, args)) => (shell.to_string(), args.join(" ")),
            None => ("sh".to_owned(), "-cu".to_owned()),
        };
        self.out("INVOCATION_DIRECTORY=\"$(pwd)\"");
        self.out(f!("DEFAULT_SHELL={}", quote(&shell)));
        self.out(f!("DEFAULT_SHELL_ARGS={}", quote(&args)));
        self.out("LIST_HEADING='Available recipes:");
        self.out("'");
        self.out("LIST_PREFIX='    '");
        self.out("CHOOSER='fzf'");
        self.out("SORTED='true'");

        self.out_line();
        self.raw(COLORS);
        self.out_line();
        self.g_assign_variables();
    }

    fn g_assign_variables(&mut self) {
        let analysis = self.analysis;
        self.out("assign_variables() {");
        self.indented(|this| {
            this.out(f!("test -z \"${{{ASSIGN_VARIABLES_GUARD}:-}}\" || return 0"));
            this.out_line();
            if analysis.variables.is_empty() {
                this.out("# No user-declared variables");
            }
            for (name, value) in &analysis.variables {
                let var = this.names.var(name);
                let value = this.evaluate(value);
                this.out(f!("{var}={value} || exit \"${{?}}\""));
            }
            this.out_line();
            this.out(f!("{ASSIGN_VARIABLES_GUARD}=\"true\""));
        });
        self.out("}");
    }
}

// Output helpers.
impl Generator<'_> {
    /// Writes an indented line.
    fn out(&mut self, line: impl Display) {
        let start = self.code.len();
        let _ = write!(self.code, "{:width$}{line}", "", width = self.indent * INDENT_WIDTH);
        if self.code[start..].trim().is_empty() {
            self.code.truncate(start);
        }
        self.code.push('\n');
    }

    fn out_line(&mut self) {
        self.code.push('\n');
    }

    /// Writes a block verbatim, ignoring the current indentation.
    fn raw(&mut self, block: &str) {
        self.code.push_str(block);
        if !block.ends_with('\n') {
            self.code.push('\n');
        }
    }

    fn indented<T>(&mut self, f: impl FnOnce(&mut Self) -> T) -> T {
        self.indent += 1;
        let result = f(self);
        self.indent -= 1;
        result
    }
}

/// Pads a banner line so that its closing `#` lines up with the border.
fn pad_line(line: &str) -> String {
    format!("{line:<width$} #", width = BORDER_WIDTH - 2)
}

#[cfg(test)]
pub(crate) mod tests {
    use chrono::NaiveDate;
    use indoc::{formatdoc, indoc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{analysis, parser::test_utils::parse_justfile};

    pub fn test_options() -> Options {
        Options {
            script_name: "just.sh".to_owned(),
            date: NaiveDate::from_ymd_opt(2024, 1, 2).expect("valid date"),
        }
    }

    /// Runs `f` with a generator for the given justfile, with nothing
    /// generated yet.
    pub fn with_generator<T>(src: &str, f: impl FnOnce(&mut Generator<'_>) -> T) -> T {
        let source = Source::new(src);
        let justfile = parse_justfile(src);
        let analysis = analysis::analyze(&justfile).expect("failed to analyze");
        let options = test_options();
        let mut generator = Generator::new(&justfile, &analysis, &source, src, &options);
        f(&mut generator)
    }

    /// Strips the indentation of every line.
    pub fn flat(code: &str) -> String {
        code.lines().map(|line| format!("{}\n", line.trim_start())).collect()
    }

    /// Returns the code written by `f`.
    pub fn generated(src: &str, f: impl FnOnce(&mut Generator<'_>)) -> String {
        with_generator(src, |g| {
            f(g);
            std::mem::take(&mut g.code)
        })
    }

    #[test]
    fn test_banner() {
        let code = generated("", |g| g.g_banner());
        let lines: Vec<_> = code.lines().collect();
        assert_eq!(lines.len(), 9);
        assert!(lines.iter().all(|line| line.len() == BORDER_WIDTH));
        assert_eq!(lines[0], "#".repeat(BORDER_WIDTH));
        assert_eq!(
            lines[4].trim_end_matches(|c| c == ' ' || c == '#'),
            format!(
                "# Generated on 2024-01-02 with justsh version {}.",
                env!("CARGO_PKG_VERSION")
            )
        );
        assert!(lines[6].starts_with("# Run `./just.sh --dump` to recover the original Justfile."));
    }

    #[test]
    fn test_pad_line() {
        let padded = pad_line("# Recipes");
        assert_eq!(padded.len(), BORDER_WIDTH);
        assert!(padded.starts_with("# Recipes "));
        assert!(padded.ends_with(" #"));
    }

    #[test]
    fn test_out_indents_non_blank_lines() {
        let code = generated("", |g| {
            g.out("a() {");
            g.indented(|g| {
                g.out("b");
                g.out("");
                g.indented(|g| g.out("c"));
            });
            g.out("}");
        });
        assert_eq!(code, "a() {\n  b\n\n    c\n}\n");
    }

    #[test]
    fn test_conditional_function() {
        let src = "x := if env_var('A') =~ 'a+' { 'yes' } else { 'no' }\n";
        let code = generated(src, |g| {
            let analysis = g.analysis;
            for (name, function) in &analysis.functions {
                if let Function::Conditional(conditional) = function {
                    g.g_conditional(name, conditional);
                }
            }
        });
        let name = code.split("()").next().unwrap_or_default().to_owned();
        assert!(name.starts_with("if_"));
        assert_eq!(
            code,
            formatdoc! {r#"
                {name}() {{
                  if echo "$(env_var 'A')" \
                      | grep -E -e 'a+' > /dev/null; then
                    THEN_EXPR='yes' || exit "${{?}}"
                    echo "${{THEN_EXPR}}"
                  else
                    ELSE_EXPR='no' || exit "${{?}}"
                    echo "${{ELSE_EXPR}}"
                  fi
                }}
            "#}
        );
    }

    #[test]
    fn test_assign_variables() {
        let src = indoc! {"
            a := 'x'
            b-c := a + 'y'
            a := 'z'
        "};
        let code = generated(src, |g| g.g_assign_variables());
        assert_eq!(
            code,
            indoc! {r#"
                assign_variables() {
                  test -z "${HAS_RUN_assign_variables:-}" || return 0

                  VAR_a='z' || exit "${?}"
                  VAR_b_c="${VAR_a}"'y' || exit "${?}"

                  HAS_RUN_assign_variables="true"
                }
            "#}
        );
    }

    #[test]
    fn test_shell_setting() {
        let src = "set shell := ['bash', '-eu', '-c']\n";
        let code = generated(src, |g| g.g_variables());
        assert!(code.contains("DEFAULT_SHELL='bash'\nDEFAULT_SHELL_ARGS='-eu -c'\n"));

        let code = generated("", |g| g.g_variables());
        assert!(code.contains("DEFAULT_SHELL='sh'\nDEFAULT_SHELL_ARGS='-cu'\n"));
        assert!(!code.contains("TEMP_DOTENV"));
        assert!(!code.contains("TMPDIR"));
    }

    #[test]
    fn test_dotenv_and_tempdir() {
        let src = indoc! {"
            set dotenv-load
            set tempdir := '/var/tmp'
        "};
        let code = generated(src, |g| g.g_variables());
        assert!(code.contains("sed 's/^/export /g' ./.env > \"${TEMP_DOTENV}\""));
        assert!(code.contains("export TMPDIR='/var/tmp'\n"));
    }

    #[test]
    fn test_no_functions_no_section() {
        let code = generated("a:\n  echo a\n", |g| g.g_functions());
        assert_eq!(code, "");

        let code = generated("a:\n  echo {{ uppercase('a') }}\n", |g| g.g_functions());
        assert!(code.contains("# Internal functions"));
        assert!(code.contains("uppercase() {"));
    }
}
