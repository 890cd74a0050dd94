//! The command line interface of the generated script: the helpers behind
//! the built-in flags and the loop which dispatches its arguments.

use std::format_args as f;

use sha2::{Digest, Sha256};

use crate::ast::{Parameter, Recipe, Variadic};

use super::{quote, Generator};

const ECHO: &str = r#"# Sane, portable echo that doesn't escape characters like "\n" behind your back
echo() {
  if [ "${#}" -gt 0 ]; then
    printf "%s\n" "${@}"
  else
    printf "\n"
  fi
}
"#;

const REALPATH: &str = r#"# realpath is a GNU coreutils extension
realpath() {
  if command realpath "${1}" 2> /dev/null; then
    return 0
  elif type python3 > /dev/null 2>&1; then
    python3 -c 'import os.path, sys; print(os.path.realpath(sys.argv[1]))' "${1}"
  elif [ -f "${1}" ] && ! [ -z "$(dirname "${1}")" ]; then
    echo "$(
      cd "$(dirname "${1}")";
      pwd -P
    )/$(
      basename "${1}"
    )"
  elif [ -d "${1}" ]; then
    (
      cd "${1}"
      pwd -P
    )
  else
    echo "${1}"
  fi
}
"#;

const ERRORS: &str = r#"echo_error() {
  echo "${RED}error${NOCOLOR}: ${BOLD}${1}${NOCOLOR}" >&2
}

recipe_error() {
  STATUS="${?}"
  if [ -z "${2:-}" ]; then
    echo_error "Recipe "'`'"${1}"'`'" failed with exit code ${STATUS}"
  else
    echo_error "Recipe "'`'"${1}"'`'" failed on line ${2} with exit code ${STATUS}"
  fi
  exit "${STATUS}"
}

echo_recipe_line() {
  echo "${BOLD}${1}${NOCOLOR}" >&2
}
"#;

const USAGE: &str = r#"${YELLOW}FLAGS:${NOCOLOR}
        ${GREEN}--choose${NOCOLOR}      Select one or more recipes to run using a binary. If ${TICK}--chooser${TICK} is not passed the chooser defaults to ${TICK}fzf${TICK}
        ${GREEN}--dump${NOCOLOR}        Print justfile
        ${GREEN}--evaluate${NOCOLOR}    Evaluate and print all variables. If a variable name is given as an argument, only print that variable's value.
        ${GREEN}--init${NOCOLOR}        Initialize new justfile in project root
    ${GREEN}-l, --list${NOCOLOR}        List available recipes and their arguments
        ${GREEN}--summary${NOCOLOR}     List names of available recipes
    ${GREEN}-u, --unsorted${NOCOLOR}    Return list and summary entries in source order
    ${GREEN}-h, --help${NOCOLOR}        Print help information
    ${GREEN}-V, --version${NOCOLOR}     Print version information

${YELLOW}OPTIONS:${NOCOLOR}
        ${GREEN}--chooser <CHOOSER>${NOCOLOR}           Override binary invoked by ${TICK}--choose${TICK}
        ${GREEN}--list-heading <TEXT>${NOCOLOR}         Print <TEXT> before list
        ${GREEN}--list-prefix <TEXT>${NOCOLOR}          Print <TEXT> before each list item
        ${GREEN}--set <VARIABLE> <VALUE>${NOCOLOR}      Override <VARIABLE> with <VALUE>
        ${GREEN}--shell <SHELL>${NOCOLOR}               Invoke <SHELL> to run recipes
        ${GREEN}--shell-arg <SHELL-ARG>${NOCOLOR}       Invoke shell with <SHELL-ARG> as an argument

${YELLOW}ARGS:${NOCOLOR}
    ${GREEN}<ARGUMENTS>...${NOCOLOR}    Overrides and recipe(s) to run, defaulting to the first recipe in the justfile
EOF
}
"#;

/// Flags handled before `--version`.
const FLAGS: &str = r#"  -l|--list)
    shift
    listfn "$@"
    RUN_DEFAULT="false"
    break
    ;;

  -f|--justfile)
    shift 2
    echo "${YELLOW}warning${NOCOLOR}: ${BOLD}-f/--justfile not implemented by justsh${NOCOLOR}" >&2
    ;;

  --summary)
    shift
    summarizefn "$@"
    RUN_DEFAULT="false"
    break
    ;;

  --list-heading)
    shift
    LIST_HEADING="${1}"
    shift
    ;;

  --list-prefix)
    shift
    LIST_PREFIX="${1}"
    shift
    ;;

  -u|--unsorted)
    SORTED="false"
    shift
    ;;

  --shell)
    shift
    DEFAULT_SHELL="${1}"
    shift
    ;;

  --shell-arg)
    shift
    DEFAULT_SHELL_ARGS="${1}"
    shift
    ;;
"#;

/// Flags handled after `--version`, up to the catch-all cases.
const MORE_FLAGS: &str = r#"  -h|--help)
    shift
    usage
    RUN_DEFAULT="false"
    break
    ;;

  --choose)
    shift
    assign_variables || exit "${?}"
    TARGET="$(choosefn)"
    env "${0}" "${TARGET}" "$@"
    RUN_DEFAULT="false"
    break
    ;;

  --chooser)
    shift
    CHOOSER="${1}"
    shift
    ;;

  *=*)
    assign_variables || exit "${?}"
    NAME="$(
        echo "${1}" | tr '\n' '\r' | sed 's/\([^=]*\)=.*/\1/g' | tr '\r' '\n'
    )"
    VALUE="$(
        echo "${1}" | tr '\n' '\r' | sed 's/[^=]*=\(.*\)/\1/g' | tr '\r' '\n'
    )"
    shift
    set_var "${NAME}" "${VALUE}"
    ;;

  --set)
    shift
    assign_variables || exit "${?}"
    NAME="${1}"
    shift
    VALUE="${1}"
    shift
    set_var "${NAME}" "${VALUE}"
    ;;

  --dump)
    RUN_DEFAULT="false"
    dumpfn "$@"
    break
    ;;

  --evaluate)
    shift
    RUN_DEFAULT="false"
    evaluatefn "$@"
    break
    ;;

  --init)
    shift
    RUN_DEFAULT="false"
    if [ -f "justfile" ]; then
      echo_error "Justfile "'`'"$(realpath "justfile")"'`'" already exists"
      exit 1
    fi
    cat > "justfile" <<EOF
default:
    echo 'Hello, world!'
EOF
    echo 'Wrote justfile to `'"$(realpath "justfile")"'`' 2>&1
    break
    ;;

  -*)
    echo_error "Found argument '${NOCOLOR}${YELLOW}${1}${NOCOLOR}${BOLD}' that wasn't expected, or isn't valid in this context"
    echo >&2
    err_usage
    exit 1
    ;;

  *)
    echo_error 'Justfile does not contain recipe `'"${1}"'`.'
    exit 1
    ;;
"#;

impl Generator<'_> {
    pub(super) fn g_helpers(&mut self) {
        self.g_header_comment("Helper functions");
        self.out_line();
        self.raw(ECHO);
        self.out_line();
        self.raw(REALPATH);
        self.out_line();
        self.raw(ERRORS);
        self.out_line();
        self.g_set_var();
        self.out_line();
        self.g_summarize();
        self.out_line();
        self.g_usage();
        self.out_line();
        self.g_list();
        self.out_line();
        self.g_dump();
        self.out_line();
        self.g_evaluate();
        self.out_line();
        self.g_choose();
    }

    /// Overrides a variable by its justfile name.
    fn g_set_var(&mut self) {
        let analysis = self.analysis;
        self.out("set_var() {");
        self.indented(|this| {
            this.out("case \"${1}\" in");
            for name in analysis.variables.keys() {
                let var = this.names.var(name);
                this.out(f!("{name})"));
                this.out(f!("  {var}=\"${{2}}\""));
                this.out("  ;;");
            }
            this.out("*)");
            this.out(
                "  echo_error 'Variable `'\"${1}\"'` overridden on the command line but not \
                present in justfile'",
            );
            this.out("  exit 1");
            this.out("  ;;");
            this.out("esac");
        });
        self.out("}");
    }

    fn g_summarize(&mut self) {
        let analysis = self.analysis;
        let mut sorted = analysis.listed_recipes.clone();
        sorted.sort_unstable();

        self.out("summarizefn() {");
        self.indented(|this| {
            this.out("while [ \"$#\" -gt 0 ]; do");
            this.out("  case \"${1}\" in");
            this.out("  -u|--unsorted)");
            this.out("    SORTED=\"false\"");
            this.out("    ;;");
            this.out("  esac");
            this.out("  shift");
            this.out("done");
            this.out_line();

            if analysis.listed_recipes.is_empty() {
                this.out("echo 'Justfile contains no recipes.' >&2");
                return;
            }
            this.out("if [ \"${SORTED}\" = \"true\" ]; then");
            this.out(f!("  echo {}", quote(&sorted.join(" "))));
            this.out("else");
            this.out(f!("  echo {}", quote(&analysis.listed_recipes.join(" "))));
            this.out("fi");
        });
        self.out("}");
    }

    fn g_usage(&mut self) {
        let name = &self.options.script_name;
        let version = env!("CARGO_PKG_VERSION");
        let header = format!(
            "usage() {{\n  \
              cat <<EOF\n\
            ${{GREEN}}justsh${{NOCOLOR}} {version}\n    \
                Auto-generated from a Justfile by justsh\n\
            \n\
            ${{YELLOW}}USAGE:${{NOCOLOR}}\n    \
                ./{name} [FLAGS] [OPTIONS] [ARGUMENTS]...\n\
            \n"
        );
        let err_usage = format!(
            "err_usage() {{\n  \
              cat <<EOF >&2\n\
            USAGE:\n    \
                ./{name} [FLAGS] [OPTIONS] [ARGUMENTS]...\n\
            \n\
            For more information try ${{GREEN}}--help${{NOCOLOR}}\n\
            EOF\n\
            }}\n"
        );
        self.raw(&header);
        self.raw(USAGE);
        self.out_line();
        self.raw(&err_usage);
    }

    fn g_list(&mut self) {
        let analysis = self.analysis;
        let private = &analysis.private;

        self.out("listfn() {");
        self.indented(|this| {
            this.out("while [ \"$#\" -gt 0 ]; do");
            this.indented(|this| {
                this.out("case \"${1}\" in");
                this.out("--list-heading)");
                this.out("  shift");
                this.out("  LIST_HEADING=\"${1}\"");
                this.out("  ;;");
                this.out_line();
                this.out("--list-prefix)");
                this.out("  shift");
                this.out("  LIST_PREFIX=\"${1}\"");
                this.out("  ;;");
                this.out_line();
                this.out("-u|--unsorted)");
                this.out("  SORTED=\"false\"");
                this.out("  ;;");
                this.out("esac");
                this.out("shift");
            });
            this.out("done");
            this.out_line();
            this.out("printf \"%s\" \"${LIST_HEADING}\"");

            let sorted = &analysis.sorted_targets;
            let unsorted: Vec<_> = analysis
                .targets
                .iter()
                .filter(|target| !private.contains(*target))
                .collect();

            this.out("if [ \"${SORTED}\" = \"true\" ]; then");
            this.indented(|this| {
                if sorted.is_empty() {
                    this.out("true");
                }
                for target in sorted {
                    let line = this.listed_target(target);
                    this.out(line);
                }
            });
            this.out("else");
            this.indented(|this| {
                if unsorted.is_empty() {
                    this.out("true");
                }
                for target in unsorted {
                    let line = this.listed_target(target);
                    this.out(line);
                }
            });
            this.out("fi");
        });
        self.out("}");
    }

    /// The `echo` which lists a target along with its parameters and its
    /// doc comment.
    fn listed_target(&self, target: &str) -> String {
        let analysis = self.analysis;
        let mut line = format!("echo \"${{LIST_PREFIX}}\"{}", quote(target));
        if let Some(recipe) = analysis.signatures.get(target) {
            for parameter in colored_parameters(recipe) {
                line.push_str("' '");
                line.push_str(&parameter);
            }
        }
        line.push_str("\"${BLUE}\"");
        if let Some(doc) = analysis.docstrings.get(target) {
            line.push_str(&quote(&format!(" # {doc}")));
        }
        line.push_str("\"${NOCOLOR}\"");
        line
    }

    /// The recipe name and its parameters, as shown in a usage message.
    pub(super) fn usage_parameters(&self, recipe: &Recipe) -> String {
        let mut usage = quote(&format!("{} ", recipe.name));
        usage.push_str(&colored_parameters(recipe).join("' '"));
        usage
    }

    fn g_dump(&mut self) {
        let raw = self.raw;
        let digest = format!("{:x}", Sha256::digest(raw.as_bytes()));
        let terminator = &digest[..16];

        self.out("dumpfn() {");
        self.out(f!("  cat <<\"{terminator}\""));
        self.raw(raw);
        self.out(terminator);
        self.out("}");
    }

    fn g_evaluate(&mut self) {
        let analysis = self.analysis;
        let mut names: Vec<&str> = analysis.variables.keys().copied().collect();
        names.sort_unstable();
        let width = names.iter().map(|name| name.len()).max().unwrap_or_default();

        self.out("evaluatefn() {");
        self.indented(|this| {
            this.out("assign_variables || exit \"${?}\"");
            this.out("if [ \"${#}\" = \"0\" ]; then");
            this.indented(|this| {
                if names.is_empty() {
                    this.out("true");
                }
                for name in &names {
                    let var = this.names.var(name);
                    this.out(f!("echo '{name:width$} := \"'\"${{{var}}}\"'\"'"));
                }
            });
            this.out("else");
            this.indented(|this| {
                this.out("case \"${1}\" in");
                if analysis.variables.is_empty() {
                    this.out("# No user-declared variables");
                }
                for name in analysis.variables.keys() {
                    let var = this.names.var(name);
                    this.out(f!("{name})"));
                    this.out(f!("  printf \"%s\" \"${{{var}}}\""));
                    this.out("  ;;");
                }
                this.out("*)");
                this.out("  echo_error 'Justfile does not contain variable `'\"${1}\"'`.'");
                this.out("  exit 1");
                this.out("  ;;");
                this.out("esac");
            });
            this.out("fi");
        });
        self.out("}");
    }

    fn g_choose(&mut self) {
        let analysis = self.analysis;
        let targets: Vec<_> = analysis.targets.iter().map(|target| quote(target)).collect();

        self.out("choosefn() {");
        self.indented(|this| {
            this.out(f!("echo {} \\", targets.join(" ")));
            this.out("  | \"${DEFAULT_SHELL}\" ${DEFAULT_SHELL_ARGS} \"${CHOOSER}\"");
        });
        self.out("}");
    }

    pub(super) fn g_main(&mut self) {
        let analysis = self.analysis;
        self.g_header_comment("Main entrypoint");
        self.out_line();
        self.out("RUN_DEFAULT='true'");
        self.out("while [ \"${#}\" -gt 0 ]; do");
        self.indented(|this| {
            this.out("case \"${1}\" in");
            this.out("# User-defined recipes");
            for target in &analysis.targets {
                this.g_target_case(target);
                this.out_line();
            }
            this.out("# Built-in flags");
        });
        self.raw(FLAGS);
        self.out_line();
        self.indented(|this| {
            this.out("-V|--version)");
            this.indented(|this| {
                this.out("shift");
                this.out(f!("echo \"justsh {}\"", env!("CARGO_PKG_VERSION")));
                this.out("RUN_DEFAULT=\"false\"");
                this.out("break");
                this.out(";;");
            });
        });
        self.out_line();
        self.raw(MORE_FLAGS);
        self.out("  esac");
        self.out("done");
        self.out_line();

        self.out("if [ \"${RUN_DEFAULT}\" = \"true\" ]; then");
        self.indented(|this| this.g_default_call());
        self.out("fi");
    }

    fn g_target_case(&mut self, target: &str) {
        let recipe = self.analysis.signatures.get(target).copied();
        let function = self.names.fun(target);

        self.out(f!("{target})"));
        self.indented(|this| {
            this.out("shift");
            this.out("assign_variables || exit \"${?}\"");
            this.out(f!("{function} \"$@\""));
            this.out("RUN_DEFAULT='false'");
            match recipe {
                Some(recipe) if recipe.variadic.is_some() => this.out("break"),
                Some(recipe) if !recipe.parameters.is_empty() => {
                    this.g_shift(recipe.parameters.len());
                }
                _ => {}
            }
            this.out(";;");
        });
    }

    fn g_default_call(&mut self) {
        let analysis = self.analysis;
        let Some(&default) = analysis.recipes.first() else {
            self.out("echo_error 'Justfile contains no recipes.'");
            self.out("exit 1");
            return;
        };

        let min = analysis
            .signatures
            .get(default)
            .map_or(0, |recipe| recipe.min_arguments());
        if min > 0 {
            let plural = if min == 1 { "" } else { "s" };
            self.out(f!("if [ \"${{#}}\" -lt {min} ]; then"));
            self.out(f!(
                "  echo_error {}",
                quote(&format!(
                    "Recipe `{default}` cannot be used as default recipe since it requires \
                    at least {min} argument{plural}."
                ))
            ));
            self.out("  exit 1");
            self.out("fi");
        }
        let function = self.names.fun(default);
        self.out("assign_variables || exit \"${?}\"");
        self.out(f!("{function} \"$@\""));
    }
}

fn colored_parameters(recipe: &Recipe) -> Vec<String> {
    let mut parameters: Vec<String> = recipe.parameters.iter().map(colored_parameter).collect();
    if let Some(Variadic { kind, param }) = &recipe.variadic {
        let sigil = quote(&kind.sigil().to_string());
        parameters.push(format!("\"${{PINK}}\"{sigil}\"${{NOCOLOR}}\"{}", colored_parameter(param)));
    }
    parameters
}

fn colored_parameter(parameter: &Parameter) -> String {
    let mut colored = String::new();
    if parameter.export {
        colored.push_str("'$'");
    }
    colored.push_str(&format!("\"${{CYAN}}\"{}\"${{NOCOLOR}}\"", quote(&parameter.name.name)));
    if let Some(default) = &parameter.default {
        colored.push_str(&format!(
            "'='\"${{GREEN}}\"{}\"${{NOCOLOR}}\"",
            quote(&default.to_string())
        ));
    }
    colored
}
