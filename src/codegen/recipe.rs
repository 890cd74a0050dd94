use std::{collections::HashSet, format_args as f};

use indexmap::IndexMap;
use log::warn;

use crate::{
    analysis,
    ast::{Dependency, Fragment, Item, ItemKind, Line, Platform, Recipe},
};

use super::{quote, Generator};

/// Attributes which change how a recipe function is generated.
#[derive(Copy, Clone, Debug, Default)]
struct Attributes {
    no_cd: bool,
    no_exit_message: bool,
}

impl Attributes {
    fn of(item: &Item) -> Attributes {
        Attributes {
            no_cd: item.has_attribute("no-cd"),
            no_exit_message: item.has_attribute("no-exit-message"),
        }
    }
}

impl Generator<'_> {
    pub(super) fn g_recipes(&mut self) {
        self.g_header_comment("Recipes");

        let justfile = self.justfile;
        let mut warned = false;
        for item in &justfile.items {
            match &item.kind {
                ItemKind::Recipe(recipe) => {
                    self.out_line();
                    self.g_recipe(item, recipe);
                }
                ItemKind::Comment(comment) => {
                    if !warned {
                        warn!(
                            "Comments may be in unexpected places in the generated script. \
                            They are placed relative to recipes, not variable assignments or \
                            settings, which may be moved around."
                        );
                        warned = true;
                    }
                    self.out_line();
                    self.out(f!("# {comment}"));
                }
                ItemKind::Alias(alias) => {
                    let name = self.names.fun(&alias.name.name);
                    let target = self.names.fun(&alias.target.name);
                    self.out_line();
                    self.out(f!("{name}() {{"));
                    self.indented(|this| this.out(f!("{target} \"$@\"")));
                    self.out("}");
                }
                _ => {}
            }
        }

        let analysis = self.analysis;
        for (recipe, variants) in &analysis.platforms {
            self.out_line();
            self.g_dispatcher(recipe, variants);
        }
    }

    fn g_recipe(&mut self, item: &Item, recipe: &Recipe) {
        let platforms = item.platforms();
        let function = if platforms.is_empty() {
            recipe.name.name.to_string()
        } else {
            analysis::variant_name(&recipe.name.name, &platforms)
        };
        let function = self.names.fun(&function);
        let attributes = Attributes::of(item);

        self.out(f!("{function}() {{"));
        self.indented(|this| {
            this.out("# Recipe setup and pre-recipe dependencies");
            this.g_preamble(recipe);
            if !attributes.no_cd {
                this.out_line();
                this.out("OLD_WD=\"$(pwd)\"");
                this.out("cd \"${INVOCATION_DIRECTORY}\"");
            }

            this.out_line();
            this.out("# Recipe body");
            if recipe.is_shebang() {
                this.g_tempfile_body(recipe, attributes);
            } else {
                this.g_line_body(recipe, attributes);
            }

            this.out_line();
            this.out("# Post-recipe dependencies and teardown");
            this.g_epilogue(recipe, attributes);
        });
        self.out("}");
    }

    fn g_preamble(&mut self, recipe: &Recipe) {
        let has_run = self.names.has_run(&recipe.name.name);
        let force = self.names.force(&recipe.name.name);
        self.out(f!("test -z \"${{{has_run}:-}}\" \\"));
        self.out(f!("  || test \"${{{force}:-}}\" = \"true\" \\"));
        self.out("  || return 0");

        if recipe.all_parameters().next().is_some() {
            self.out_line();
            self.g_arity_check(recipe);
            self.g_parameters(recipe);
        }

        if !recipe.before.is_empty() {
            self.out_line();
            for dependency in &recipe.before {
                let dependency_force = self.names.force(&dependency.name.name);
                let call = self.dependency_call(dependency);
                self.out(f!("if [ \"${{{force}:-}}\" = \"true\" ]; then"));
                self.out(f!("  {dependency_force}=\"true\""));
                self.out("fi");
                self.out(call);
                self.out(f!("if [ \"${{{force}:-}}\" = \"true\" ]; then"));
                self.out(f!("  {dependency_force}="));
                self.out("fi");
            }
        }
    }

    fn g_arity_check(&mut self, recipe: &Recipe) {
        let min = recipe.min_arguments();
        if min == 0 {
            return;
        }

        let at_least = if recipe.takes_at_least() { "at least " } else { "" };
        let caption = quote(&format!("Recipe `{}`", recipe.name));
        let usage = self.usage_parameters(recipe);
        self.out(f!("if [ \"${{#}}\" -lt {min} ]; then"));
        self.indented(|this| {
            this.out("(");
            this.indented(|this| {
                this.out(f!(
                    "echo_error {caption}\" got ${{#}} arguments but takes {at_least}{min}\""
                ));
                this.out("echo \"${BOLD}usage:${NOCOLOR}\"");
                this.out(f!("echo \"    ${{0}} \"{usage}"));
            });
            this.out(") >&2");
            this.out("exit 1");
        });
        self.out("fi");
    }

    fn g_parameters(&mut self, recipe: &Recipe) {
        // Parameters live in the same variables as the justfile variables, so
        // whatever they shadow is put back by the epilogue.
        for parameter in recipe.all_parameters() {
            let saved = self.names.saved(&recipe.name.name, &parameter.name.name);
            let var = self.names.var(&parameter.name.name);
            self.out(f!("{saved}=\"${{{var}:-}}\""));
        }

        for (i, parameter) in recipe.parameters.iter().enumerate() {
            let n = i + 1;
            let var = self.names.var(&parameter.name.name);
            self.out(f!("{var}=\"${{{n}:-}}\""));
            if let Some(default) = &parameter.default {
                let value = self.evaluate(default);
                self.out(f!("if [ \"${{#}}\" -lt {n} ]; then"));
                self.out(f!("  {var}={value}"));
                self.out("fi");
            }
        }

        let Some(variadic) = &recipe.variadic else {
            return;
        };
        let fixed = recipe.parameters.len();
        if fixed > 0 {
            self.g_shift(fixed);
        }
        if let Some(default) = &variadic.param.default {
            let value = self.evaluate(default);
            self.out("if [ \"${#}\" -lt 1 ]; then");
            self.out(f!("  set -- {value}"));
            self.out("fi");
        }
        let var = self.names.var(&variadic.param.name.name);
        self.out(f!("{var}=\"${{*:-}}\""));
    }

    /// Drops up to `n` positional arguments.
    pub(super) fn g_shift(&mut self, n: usize) {
        self.out(f!("if [ \"${{#}}\" -ge {n} ]; then"));
        self.out(f!("  shift {n}"));
        self.out("elif [ \"${#}\" -gt 0 ]; then");
        self.out("  shift \"${#}\"");
        self.out("fi");
    }

    fn g_line_body(&mut self, recipe: &Recipe, attributes: Attributes) {
        let ignore_comments = self.analysis.settings.ignore_comments;
        let name = quote(&recipe.name.name);
        let mut counter = 1;

        for line in &recipe.body {
            if line.fragments.is_empty() {
                continue;
            }
            if ignore_comments
                && matches!(line.fragments.first(), Some(Fragment::Text(text)) if text.starts_with('#'))
            {
                continue;
            }

            let lineno = self.source.line_of(line.span.lo);
            let first = counter;
            for expr in line.interpolations() {
                let value = self.evaluate(expr);
                self.out(f!("INTERP_{counter}={value} || recipe_error {name} {lineno}"));
                counter += 1;
            }

            let command = self.command(line, first, attributes);
            if !recipe.quiet ^ line.prefix.toggle_echo {
                self.out(f!("echo_recipe_line {command}"));
            }
            let positional = self.positional_arguments(recipe, true);
            self.g_env(recipe, "\"${DEFAULT_SHELL}\" ${DEFAULT_SHELL_ARGS} \\");
            self.indented(|this| {
                if line.prefix.ignore_error {
                    this.out(f!("{command}{positional} \\"));
                    this.out("|| true");
                } else if attributes.no_exit_message {
                    this.out(f!("{command}{positional}"));
                } else {
                    this.out(f!("{command}{positional} \\"));
                    this.out(f!("|| recipe_error {name} {lineno}"));
                }
            });
        }
    }

    /// Renders a body line as a single shell word, with interpolations
    /// replaced by the `INTERP_` variables holding their values.
    fn command(&mut self, line: &Line, mut counter: usize, attributes: Attributes) -> String {
        let default_shell = self.analysis.settings.shell.is_none();
        let mut command = String::new();
        for (i, fragment) in line.fragments.iter().enumerate() {
            match fragment {
                Fragment::Text(text) => {
                    let mut text: &str = text;
                    if i == 0 && default_shell && text.starts_with("just ") {
                        command.push_str(if attributes.no_cd {
                            "\"${0}\""
                        } else {
                            "\"./$(basename \"${0}\")\""
                        });
                        text = &text["just".len()..];
                    }
                    command.push_str(&quote(text));
                }
                Fragment::Interpolation(_) => {
                    command.push_str(&format!("\"${{INTERP_{counter}}}\""));
                    counter += 1;
                }
            }
        }
        command
    }

    fn g_tempfile_body(&mut self, recipe: &Recipe, attributes: Attributes) {
        let name = quote(&recipe.name.name);
        self.out("TEMPFILE=\"$(mktemp)\"");
        self.out("touch \"${TEMPFILE}\"");
        self.out("chmod +x \"${TEMPFILE}\"");

        let mut counter = 1;
        for line in &recipe.body {
            let lineno = self.source.line_of(line.span.lo);
            for expr in line.interpolations() {
                let value = self.evaluate(expr);
                self.out(f!("INTERP_{counter}={value} || recipe_error {name} {lineno}"));
                counter += 1;
            }
        }

        let script = tempfile_script(&recipe.body);
        self.out(f!("echo {script} > \"${{TEMPFILE}}\""));
        if recipe.quiet {
            self.out("cat \"${TEMPFILE}\" >&2");
        }

        let positional = self.positional_arguments(recipe, false);
        if attributes.no_exit_message {
            self.g_env(recipe, &format!("\"${{TEMPFILE}}\"{positional}"));
        } else {
            self.g_env(recipe, &format!("\"${{TEMPFILE}}\"{positional} \\"));
            self.out(f!("  || recipe_error {name}"));
        }
        self.out("rm \"${TEMPFILE}\"");
    }

    /// Writes an `env` invocation which passes the exported variables on to
    /// `command`.
    fn g_env(&mut self, recipe: &Recipe, command: &str) {
        let exported = self.exported(recipe);
        if exported.is_empty() {
            self.out(f!("env {command}"));
            return;
        }
        self.out("env \\");
        self.indented(|this| {
            for assignment in &exported {
                this.out(f!("{assignment} \\"));
            }
            this.out(command);
        });
    }

    /// Returns the `NAME=value` words of the variables and parameters the
    /// recipe exports.
    fn exported(&mut self, recipe: &Recipe) -> Vec<String> {
        let analysis = self.analysis;
        let export_all = analysis.settings.export;

        let mut names: Vec<&str> = analysis.exports.clone();
        if export_all {
            names.extend(analysis.variables.keys());
        }
        names.extend(
            recipe
                .all_parameters()
                .filter(|p| p.export || export_all)
                .map(|p| &*p.name.name),
        );

        let mut seen = HashSet::new();
        names
            .into_iter()
            .filter(|name| seen.insert(*name))
            .map(|name| {
                let env_name = self.names.clean("", name);
                let var = self.names.var(name);
                format!("\"{env_name}=${{{var}}}\"")
            })
            .collect()
    }

    /// Arguments passed on to the shell under `positional-arguments`, with a
    /// leading space.
    fn positional_arguments(&mut self, recipe: &Recipe, with_name: bool) -> String {
        if !self.analysis.settings.positional_arguments {
            return String::new();
        }

        let mut args = String::new();
        if with_name {
            args.push(' ');
            args.push_str(&quote(&recipe.name.name));
        }
        for parameter in &recipe.parameters {
            let var = self.names.var(&parameter.name.name);
            args.push_str(&format!(" \"${{{var}}}\""));
        }
        if recipe.variadic.is_some() {
            args.push_str(" \"${@}\"");
        }
        args
    }

    fn g_epilogue(&mut self, recipe: &Recipe, attributes: Attributes) {
        if !attributes.no_cd {
            self.out("cd \"${OLD_WD}\"");
        }

        if !recipe.after.is_empty() {
            self.out_line();
            let mut seen = HashSet::new();
            for dependency in &recipe.after {
                if !seen.insert(&*dependency.name.name) {
                    continue;
                }
                let force = self.names.force(&dependency.name.name);
                let call = self.dependency_call(dependency);
                self.out(f!("{force}=\"true\""));
                self.out(call);
                self.out(f!("{force}="));
            }
            self.out_line();
        }

        for parameter in recipe.all_parameters() {
            let saved = self.names.saved(&recipe.name.name, &parameter.name.name);
            let var = self.names.var(&parameter.name.name);
            self.out(f!("{var}=\"${{{saved}}}\""));
        }

        let has_run = self.names.has_run(&recipe.name.name);
        let force = self.names.force(&recipe.name.name);
        self.out(f!("if [ -z \"${{{force}:-}}\" ]; then"));
        self.out(f!("  {has_run}=\"true\""));
        self.out("fi");
    }

    fn dependency_call(&mut self, dependency: &Dependency) -> String {
        let mut call = self.names.fun(&dependency.name.name);
        for arg in &dependency.args {
            call.push(' ');
            call.push_str(&self.evaluate(arg));
        }
        call
    }

    fn g_dispatcher(&mut self, recipe: &str, variants: &IndexMap<Platform, String>) {
        let function = self.names.fun(recipe);
        self.out(f!("{function}() {{"));
        self.indented(|this| {
            for (i, (platform, variant)) in variants.iter().enumerate() {
                let keyword = if i == 0 { "if" } else { "elif" };
                let detector = platform.detector();
                let platform = quote(platform.as_str());
                let variant = this.names.fun(variant);
                this.out(f!("{keyword} [ \"$({detector})\" = {platform} ]; then"));
                this.out(f!("  {variant} \"$@\""));
            }
            this.out("else");
            this.out(f!(
                "  echo_error \"Justfile does not contain recipe \"{}",
                quote(&format!("`{recipe}`."))
            ));
            this.out("  exit 1");
            this.out("fi");
        });
        self.out("}");
    }
}

/// Concatenates the body lines into one shell word that prints the script.
fn tempfile_script(body: &[Line]) -> String {
    let mut script = String::new();
    let mut text = String::new();
    let mut counter = 1;

    for (i, line) in body.iter().enumerate() {
        if i > 0 {
            text.push('\n');
        }
        if line.prefix.toggle_echo {
            text.push('@');
        }
        if line.prefix.ignore_error {
            text.push('-');
        }
        for fragment in &line.fragments {
            match fragment {
                Fragment::Text(fragment) => text.push_str(fragment),
                Fragment::Interpolation(_) => {
                    if !text.is_empty() {
                        script.push_str(&quote(&text));
                        text.clear();
                    }
                    script.push_str(&format!("\"${{INTERP_{counter}}}\""));
                    counter += 1;
                }
            }
        }
    }
    if !text.is_empty() {
        script.push_str(&quote(&text));
    }
    script
}
