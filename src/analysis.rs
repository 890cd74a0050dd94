//! Semantic analysis.
//!
//! The analysis is an ordered pipeline of small passes over the parsed
//! justfile. Each pass only reads the syntax tree (and the results of the
//! passes before it), so every one of them can be tested on its own.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;
use log::{debug, warn};
use sha2::{Digest, Sha256};

use crate::{
    ast::{
        BinaryOperator, Conditional, Expr, ExprKind, Item, ItemKind, Justfile, Platform, Recipe,
        SettingValue,
    },
    builtins::{self, Arity, Builtin},
    token::{Span, Spanned},
};

type Result<T, E = Spanned<Error>> = std::result::Result<T, E>;

/// Document-wide settings, after validation.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Settings {
    pub allow_duplicate_recipes: bool,
    pub dotenv_load: bool,
    pub export: bool,
    /// Accepted for compatibility. Has no effect on the generated script.
    pub fallback: bool,
    pub ignore_comments: bool,
    pub positional_arguments: bool,
    pub tempdir: Option<Box<str>>,
    pub shell: Option<Vec<Box<str>>>,
}

/// A function definition the generated script must carry.
#[derive(Debug, Clone, Copy)]
pub enum Function<'a> {
    Builtin(&'static Builtin),
    /// Evaluates a conditional expression and prints the chosen branch.
    Conditional(&'a Conditional),
    BacktickError,
    PathJoin,
}

#[derive(Debug)]
pub struct Analysis<'a> {
    pub settings: Settings,
    /// Every variable in declaration order. Later assignments win.
    pub variables: IndexMap<&'a str, &'a Expr>,
    pub exports: Vec<&'a str>,
    /// Functions keyed by their shell name, in order of first use.
    pub functions: IndexMap<String, Function<'a>>,
    /// Private recipes and aliases.
    pub private: HashSet<&'a str>,
    /// Recipe names in source order. Repeats when a recipe is defined more
    /// than once.
    pub recipes: Vec<&'a str>,
    /// Recipe name -> platform -> name of the variant's function.
    pub platforms: IndexMap<&'a str, IndexMap<Platform, String>>,
    pub docstrings: HashMap<&'a str, String>,
    /// The recipe whose parameters a target takes. Aliases share their
    /// target's recipe.
    pub signatures: HashMap<&'a str, &'a Recipe>,
    /// Recipe name -> its aliases.
    pub aliases: HashMap<&'a str, Vec<&'a str>>,
    /// Public recipes, in source order and without repeats.
    pub listed_recipes: Vec<&'a str>,
    /// Everything invocable from the command line, each recipe followed by
    /// its aliases.
    pub targets: Vec<&'a str>,
    /// Public targets, sorted by recipe name.
    pub sorted_targets: Vec<&'a str>,
}

/// Runs every pass, in order. The first error aborts the analysis.
pub fn analyze(justfile: &Justfile) -> Result<Analysis<'_>> {
    let settings = settings(justfile)?;
    debug!("settings: {settings:?}");

    let (variables, exports) = variables(justfile);
    debug!("{} variables, {} exported", variables.len(), exports.len());
    check_variables(justfile, &variables)?;

    let functions = used_functions(justfile)?;
    debug!("used functions: {:?}", functions.keys().collect::<Vec<_>>());

    let private = private_recipes(justfile);
    let recipes = recipe_names(justfile, &settings)?;
    debug!("{} recipes, {} private", recipes.len(), private.len());

    let platforms = platform_variants(justfile);
    let docstrings = docstrings(justfile);
    let mut signatures = signatures(justfile);
    let aliases = aliases(justfile, &recipes, &mut signatures)?;
    check_dependencies(justfile, &recipes, &aliases)?;

    let (listed_recipes, targets) = unique_targets(&recipes, &private, &aliases);
    let sorted_targets = sorted_targets(&recipes, &private, &aliases);
    debug!("targets: {targets:?}");

    Ok(Analysis {
        settings,
        variables,
        exports,
        functions,
        private,
        recipes,
        platforms,
        docstrings,
        signatures,
        aliases,
        listed_recipes,
        targets,
        sorted_targets,
    })
}

pub fn settings(justfile: &Justfile) -> Result<Settings> {
    let mut settings = Settings::default();
    let mut seen = HashSet::new();

    for item in &justfile.items {
        let ItemKind::Setting(setting) = &item.kind else {
            continue;
        };
        let name = &*setting.name.name;
        let span = setting.name.span;
        if !seen.insert(name) {
            return Err(span.wrap(Error::DuplicateSetting(name.into())));
        }

        match (name, &setting.value) {
            ("allow-duplicate-recipes", SettingValue::Bool(b)) => {
                settings.allow_duplicate_recipes = *b;
            }
            ("dotenv-load", SettingValue::Bool(b)) => settings.dotenv_load = *b,
            ("export", SettingValue::Bool(b)) => settings.export = *b,
            ("fallback", SettingValue::Bool(b)) => settings.fallback = *b,
            ("ignore-comments", SettingValue::Bool(b)) => settings.ignore_comments = *b,
            ("positional-arguments", SettingValue::Bool(b)) => {
                settings.positional_arguments = *b;
            }
            ("tempdir", SettingValue::String(dir)) => settings.tempdir = Some(dir.clone()),
            ("shell", SettingValue::List(shell)) => {
                if shell.len() < 2 {
                    return Err(span.wrap(Error::ShellArity));
                }
                settings.shell = Some(shell.clone());
            }
            ("windows-powershell", SettingValue::Bool(false)) => {}
            ("windows-shell", SettingValue::List(shell)) if shell.is_empty() => {}
            ("windows-powershell" | "windows-shell", _) => {
                return Err(span.wrap(Error::UnsupportedSetting(name.into())));
            }
            _ => {}
        }
    }

    Ok(settings)
}

pub fn variables(justfile: &Justfile) -> (IndexMap<&str, &Expr>, Vec<&str>) {
    let mut variables = IndexMap::new();
    let mut exports = Vec::new();
    for item in &justfile.items {
        match &item.kind {
            ItemKind::Assignment(assignment) => {
                variables.insert(&*assignment.name.name, &assignment.value);
            }
            ItemKind::Export(assignment) => {
                exports.push(&*assignment.name.name);
                variables.insert(&*assignment.name.name, &assignment.value);
            }
            _ => {}
        }
    }
    (variables, exports)
}

/// Checks that every variable reference resolves to a variable, or to a
/// parameter of the recipe it appears in.
pub fn check_variables(justfile: &Justfile, variables: &IndexMap<&str, &Expr>) -> Result<()> {
    for item in &justfile.items {
        let recipe = match &item.kind {
            ItemKind::Recipe(recipe) => Some(recipe),
            _ => None,
        };
        let in_scope = |name: &str| {
            variables.contains_key(name)
                || recipe.is_some_and(|r| r.all_parameters().any(|p| &*p.name.name == name))
        };
        for expr in root_expressions(item) {
            walk(expr, &mut |expr| match &expr.kind {
                ExprKind::Variable(name) if !in_scope(&name.name) => {
                    Err(name.span.wrap(Error::UndefinedVariable(name.name.clone())))
                }
                _ => Ok(()),
            })?;
        }
    }
    Ok(())
}

/// Collects the functions the generated script needs: called builtins, one
/// function per distinct conditional, and the internal helpers.
pub fn used_functions(justfile: &Justfile) -> Result<IndexMap<String, Function<'_>>> {
    let mut functions = IndexMap::new();

    for (item, _) in justfile.recipes() {
        let platforms = item.platforms();
        for platform in platforms {
            let builtin = platform.detector();
            if let Some(detector) = builtins::lookup(builtin) {
                functions
                    .entry(builtin.to_owned())
                    .or_insert(Function::Builtin(detector));
            }
        }
    }

    for item in &justfile.items {
        for expr in root_expressions(item) {
            walk(expr, &mut |expr| {
                let (name, function) = match &expr.kind {
                    ExprKind::Backtick(_) => ("backtick_error".to_owned(), Function::BacktickError),
                    ExprKind::Binary {
                        op: BinaryOperator::Div,
                        ..
                    } => ("path_join".to_owned(), Function::PathJoin),
                    ExprKind::Conditional(conditional) => {
                        (conditional_name(conditional), Function::Conditional(conditional))
                    }
                    ExprKind::Call { name, args } => {
                        let Some(builtin) = builtins::lookup(&name.name) else {
                            return Err(name.span.wrap(Error::UnknownFunction(name.name.clone())));
                        };
                        if !builtin.arity.accepts(args.len()) {
                            return Err(expr.span.wrap(Error::FunctionArity {
                                name: name.name.clone(),
                                arity: builtin.arity,
                                actual: args.len(),
                            }));
                        }
                        (builtin.name.to_owned(), Function::Builtin(builtin))
                    }
                    _ => return Ok(()),
                };
                functions.entry(name).or_insert(function);
                Ok(())
            })?;
        }
    }

    Ok(functions)
}

pub fn private_recipes(justfile: &Justfile) -> HashSet<&str> {
    justfile
        .items
        .iter()
        .filter(|item| item.is_private())
        .filter_map(|item| match &item.kind {
            ItemKind::Recipe(recipe) => Some(&*recipe.name.name),
            ItemKind::Alias(alias) => Some(&*alias.name.name),
            _ => None,
        })
        .collect()
}

/// Lists recipe names in source order.
///
/// A name may only repeat when the repeated definition is restricted to
/// some platform, or when `allow-duplicate-recipes` is set.
pub fn recipe_names<'a>(justfile: &'a Justfile, settings: &Settings) -> Result<Vec<&'a str>> {
    let mut recipes = Vec::new();
    let mut first_spans: HashMap<&str, Span> = HashMap::new();
    for (item, recipe) in justfile.recipes() {
        let name = &*recipe.name.name;
        if let Some(&first) = first_spans.get(name) {
            if !settings.allow_duplicate_recipes && item.platforms().is_empty() {
                return Err(recipe.name.span.wrap(Error::DuplicateRecipe {
                    name: name.into(),
                    first,
                }));
            }
        } else {
            first_spans.insert(name, recipe.name.span);
        }
        recipes.push(name);
    }
    Ok(recipes)
}

pub fn platform_variants(justfile: &Justfile) -> IndexMap<&str, IndexMap<Platform, String>> {
    let mut variants: IndexMap<&str, IndexMap<Platform, String>> = IndexMap::new();
    for (item, recipe) in justfile.recipes() {
        let platforms = item.platforms();
        if platforms.is_empty() {
            continue;
        }
        let function = variant_name(&recipe.name.name, &platforms);
        let table = variants.entry(&*recipe.name.name).or_default();
        for platform in platforms {
            table.insert(platform, function.clone());
        }
    }
    variants
}

pub fn docstrings(justfile: &Justfile) -> HashMap<&str, String> {
    let mut docstrings = HashMap::new();
    for (index, item) in justfile.items.iter().enumerate() {
        match &item.kind {
            ItemKind::Recipe(recipe) if !item.is_private() => {
                let previous = index.checked_sub(1).map(|i| &justfile.items[i].kind);
                if let Some(ItemKind::Comment(comment)) = previous {
                    docstrings.insert(&*recipe.name.name, comment.to_string());
                }
            }
            ItemKind::Alias(alias) => {
                docstrings.insert(&*alias.name.name, format!("alias for `{}`", alias.target));
            }
            _ => {}
        }
    }
    docstrings
}

/// Remembers the parameters of each recipe. When a recipe is defined more
/// than once, the last definition wins.
pub fn signatures(justfile: &Justfile) -> HashMap<&str, &Recipe> {
    let mut signatures: HashMap<&str, &Recipe> = HashMap::new();
    for (_, recipe) in justfile.recipes() {
        let name = &*recipe.name.name;
        if let Some(previous) = signatures.get(name) {
            if previous.signature() != recipe.signature() {
                warn!(
                    "Recipe {name} has different parameters than other versions of the same \
                    recipe. Only the parameters of its last definition will be listed."
                );
            }
        }
        signatures.insert(name, recipe);
    }
    signatures
}

/// Groups aliases by their target. Aliases take the parameters of the recipe
/// they point to.
pub fn aliases<'a>(
    justfile: &'a Justfile,
    recipes: &[&str],
    signatures: &mut HashMap<&'a str, &'a Recipe>,
) -> Result<HashMap<&'a str, Vec<&'a str>>> {
    let mut aliases: HashMap<&str, Vec<&str>> = HashMap::new();
    for (_, alias) in justfile.aliases() {
        let target = &*alias.target.name;
        if !recipes.contains(&target) {
            return Err(alias.target.span.wrap(Error::UnknownAliasTarget {
                alias: alias.name.name.clone(),
                target: target.into(),
            }));
        }
        aliases.entry(target).or_default().push(&alias.name.name);
        if let Some(&recipe) = signatures.get(target) {
            signatures.insert(&alias.name.name, recipe);
        }
    }
    Ok(aliases)
}

/// Checks that dependencies name a recipe or an alias.
pub fn check_dependencies(
    justfile: &Justfile,
    recipes: &[&str],
    aliases: &HashMap<&str, Vec<&str>>,
) -> Result<()> {
    let is_alias = |name: &str| aliases.values().flatten().any(|alias| *alias == name);
    for (_, recipe) in justfile.recipes() {
        for dependency in recipe.before.iter().chain(&recipe.after) {
            let name = &*dependency.name.name;
            if !recipes.contains(&name) && !is_alias(name) {
                return Err(dependency.name.span.wrap(Error::UnknownDependency {
                    recipe: recipe.name.name.clone(),
                    dependency: name.into(),
                }));
            }
        }
    }
    Ok(())
}

/// Returns the public recipes and the invocable targets, both in source
/// order. Each recipe is followed by its aliases, sorted.
pub fn unique_targets<'a>(
    recipes: &[&'a str],
    private: &HashSet<&str>,
    aliases: &HashMap<&str, Vec<&'a str>>,
) -> (Vec<&'a str>, Vec<&'a str>) {
    let mut seen = HashSet::new();
    let mut listed = Vec::new();
    let mut targets = Vec::new();
    for &recipe in recipes {
        if !seen.insert(recipe) {
            continue;
        }
        if !private.contains(recipe) {
            listed.push(recipe);
        }
        targets.push(recipe);
        for alias in sorted_aliases(aliases, recipe) {
            if seen.insert(alias) {
                targets.push(alias);
            }
        }
    }
    (listed, targets)
}

/// Returns the public targets sorted by recipe name, each recipe followed by
/// its aliases.
pub fn sorted_targets<'a>(
    recipes: &[&'a str],
    private: &HashSet<&str>,
    aliases: &HashMap<&str, Vec<&'a str>>,
) -> Vec<&'a str> {
    let mut sorted = recipes.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut targets = Vec::new();
    for recipe in sorted {
        if !private.contains(recipe) {
            targets.push(recipe);
        }
        for alias in sorted_aliases(aliases, recipe) {
            if !private.contains(alias) && !targets.contains(&alias) {
                targets.push(alias);
            }
        }
    }
    targets
}

fn sorted_aliases<'a>(aliases: &HashMap<&str, Vec<&'a str>>, recipe: &str) -> Vec<&'a str> {
    let mut names = aliases.get(recipe).cloned().unwrap_or_default();
    names.sort_unstable();
    names
}

/// Name of the function dispatched to for a platform-specific definition.
///
/// The parts are joined by spaces, which no recipe name contains, so a recipe
/// spelled like a variant (`a_linux`) keeps a function of its own once the
/// names are cleaned.
pub fn variant_name(recipe: &str, platforms: &[Platform]) -> String {
    let mut name = recipe.to_owned();
    for platform in platforms {
        name.push(' ');
        name.push_str(platform.as_str());
    }
    name
}

/// Name of the function which evaluates the conditional. Identical
/// conditionals share one function.
pub fn conditional_name(conditional: &Conditional) -> String {
    let digest = Sha256::digest(conditional.to_string().as_bytes());
    let hex = format!("{digest:x}");
    format!("if_{}", &hex[..16])
}

/// Every expression written directly in the item.
fn root_expressions(item: &Item) -> Vec<&Expr> {
    match &item.kind {
        ItemKind::Assignment(assignment) | ItemKind::Export(assignment) => vec![&assignment.value],
        ItemKind::Recipe(recipe) => recipe
            .all_parameters()
            .filter_map(|p| p.default.as_ref())
            .chain(recipe.before.iter().chain(&recipe.after).flat_map(|d| &d.args))
            .chain(recipe.body.iter().flat_map(|line| line.interpolations()))
            .collect(),
        _ => Vec::new(),
    }
}

/// Visits the subexpressions before the expression itself.
fn walk<'a>(expr: &'a Expr, f: &mut impl FnMut(&'a Expr) -> Result<()>) -> Result<()> {
    match &expr.kind {
        ExprKind::String(_) | ExprKind::Variable(_) | ExprKind::Backtick(_) => {}
        ExprKind::Binary { lhs, rhs, .. } => {
            walk(lhs, f)?;
            walk(rhs, f)?;
        }
        ExprKind::Conditional(conditional) => {
            walk(&conditional.condition.lhs, f)?;
            walk(&conditional.condition.rhs, f)?;
            walk(&conditional.then, f)?;
            walk(&conditional.otherwise, f)?;
        }
        ExprKind::Call { args, .. } => {
            for arg in args {
                walk(arg, f)?;
            }
        }
    }
    f(expr)
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Error {
    DuplicateSetting(Box<str>),
    /// Settings for Windows shells.
    UnsupportedSetting(Box<str>),
    ShellArity,
    DuplicateRecipe {
        name: Box<str>,
        first: Span,
    },
    UnknownFunction(Box<str>),
    FunctionArity {
        name: Box<str>,
        arity: Arity,
        actual: usize,
    },
    UndefinedVariable(Box<str>),
    UnknownAliasTarget {
        alias: Box<str>,
        target: Box<str>,
    },
    UnknownDependency {
        recipe: Box<str>,
        dependency: Box<str>,
    },
}

#[cfg(test)]
mod tests {
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{parser::test_utils::parse_justfile, util::test_utils::format_error};

    fn error_of<T: std::fmt::Debug>(result: Result<T>) -> String {
        format_error(&result.expect_err("analysis should fail"))
    }

    #[test]
    fn test_settings() {
        let justfile = parse_justfile(indoc! {r#"
            set export
            set dotenv-load := false
            set shell := ["bash", "-c"]
            set tempdir := "/tmp/x"
        "#});
        let settings = settings(&justfile).unwrap();
        assert_eq!(
            settings,
            Settings {
                export: true,
                shell: Some(vec!["bash".into(), "-c".into()]),
                tempdir: Some("/tmp/x".into()),
                ..Settings::default()
            }
        );
    }

    #[test]
    fn test_settings_errors() {
        let cases = [
            (
                "set export\nset export := false",
                "15..21: setting `export` has already been set",
            ),
            (
                "set windows-powershell",
                "4..22: setting `windows-powershell` is not supported, windows shells can't be targeted",
            ),
            (
                "set shell := ['bash']",
                "4..9: `shell` setting must have at least two elements",
            ),
        ];
        for (input, expected) in cases {
            assert_eq!(error_of(settings(&parse_justfile(input))), expected);
        }
    }

    #[test]
    fn test_variables_last_write_wins() {
        let justfile = parse_justfile(indoc! {"
            a := 'one'
            export b := 'two'
            a := 'three'
        "});
        let (variables, exports) = variables(&justfile);
        let rendered: Vec<_> = variables
            .iter()
            .map(|(name, expr)| format!("{name}={expr}"))
            .collect();
        assert_eq!(rendered, [r#"a="three""#, r#"b="two""#]);
        assert_eq!(exports, ["b"]);
    }

    #[test]
    fn test_undefined_variables() {
        let justfile = parse_justfile(indoc! {"
            a := 'x'
            r p q=p: (dep a p)
              echo {{ p + q + a }}
            dep x y:
        "});
        let (vars, _) = variables(&justfile);
        assert!(check_variables(&justfile, &vars).is_ok());

        let justfile = parse_justfile("a := b");
        let (vars, _) = variables(&justfile);
        assert_eq!(
            error_of(check_variables(&justfile, &vars)),
            "5..6: variable `b` not defined"
        );

        // Parameters are only visible inside their own recipe.
        let justfile = parse_justfile("r p:\ns:\n  echo {{ p }}");
        let (vars, _) = variables(&justfile);
        assert_eq!(
            error_of(check_variables(&justfile, &vars)),
            "18..19: variable `p` not defined"
        );
    }

    #[test]
    fn test_used_functions() {
        let justfile = parse_justfile(indoc! {r#"
            a := uppercase(os()) + `date`
            b := if a == "x" { "y" } else { "z" }

            [unix]
            r:
              echo {{ if a == "x" { "y" } else { "z" } }} {{ a / "b" }}
        "#});
        let functions = used_functions(&justfile).unwrap();
        let names: Vec<_> = functions.keys().map(String::as_str).collect();
        let conditional = names[4];
        assert!(conditional.starts_with("if_") && conditional.len() == 19);
        assert_eq!(
            names,
            ["os_family", "os", "uppercase", "backtick_error", conditional, "path_join"]
        );
    }

    #[test]
    fn test_function_errors() {
        let justfile = parse_justfile("a := nope()");
        assert_eq!(
            error_of(used_functions(&justfile)),
            "5..9: call to unknown function `nope`"
        );

        let justfile = parse_justfile("a := env_var()");
        assert_eq!(
            error_of(used_functions(&justfile)),
            "5..14: function `env_var` takes 1 argument but got 0"
        );
    }

    #[test]
    fn test_conditional_name_depends_on_content_only() {
        let justfile = parse_justfile(indoc! {r#"
            a := if "x" == "y" { "a" } else { "b" }
            b   :=   if "x"=="y" {"a"} else {"b"}
            c := if "x" != "y" { "a" } else { "b" }
        "#});
        let (variables, _) = variables(&justfile);
        let names: Vec<_> = variables
            .values()
            .map(|expr| match &expr.kind {
                ExprKind::Conditional(conditional) => conditional_name(conditional),
                _ => unreachable!(),
            })
            .collect();
        assert_eq!(names[0], names[1]);
        assert_ne!(names[0], names[2]);
    }

    #[test]
    fn test_private_recipes() {
        let justfile = parse_justfile(indoc! {"
            [private]
            a:
            _b:
            c:
            alias _d := c
        "});
        let mut private: Vec<_> = private_recipes(&justfile).into_iter().collect();
        private.sort_unstable();
        assert_eq!(private, ["_b", "_d", "a"]);
    }

    #[test]
    fn test_duplicate_recipes() {
        let justfile = parse_justfile("a:\nb:\na:");
        assert_eq!(
            error_of(recipe_names(&justfile, &Settings::default())),
            "6..7: recipe `a` first defined at 0..1 is redefined"
        );

        let settings = Settings {
            allow_duplicate_recipes: true,
            ..Settings::default()
        };
        assert_eq!(recipe_names(&justfile, &settings).unwrap(), ["a", "b", "a"]);

        let justfile = parse_justfile("[linux]\na:\n[macos]\na:");
        assert_eq!(recipe_names(&justfile, &Settings::default()).unwrap(), ["a", "a"]);
    }

    #[test]
    fn test_platform_variants() {
        let justfile = parse_justfile(indoc! {"
            [macos, linux]
            a:
            [windows]
            a:
            b:
        "});
        let variants = platform_variants(&justfile);
        let table: Vec<_> = variants["a"]
            .iter()
            .map(|(platform, name)| (platform.as_str(), name.as_str()))
            .collect();
        assert_eq!(
            table,
            [("macos", "a macos linux"), ("linux", "a macos linux"), ("windows", "a windows")]
        );
        assert!(!variants.contains_key("b"));
    }

    #[test]
    fn test_docstrings() {
        let justfile = parse_justfile(indoc! {"
            # builds
            build:
            # hidden
            _secret:
            # detached

            test:
            alias t := test
        "});
        let docstrings = docstrings(&justfile);
        assert_eq!(docstrings.len(), 2);
        assert_eq!(docstrings["build"], "builds");
        assert_eq!(docstrings["t"], "alias for `test`");
    }

    #[test]
    fn test_aliases_share_signatures() {
        let justfile = parse_justfile(indoc! {"
            a x:
            a x y:
            alias b := a
            alias c := a
        "});
        let recipes = recipe_names(
            &justfile,
            &Settings {
                allow_duplicate_recipes: true,
                ..Settings::default()
            },
        )
        .unwrap();
        let mut signatures = signatures(&justfile);
        let aliases = aliases(&justfile, &recipes, &mut signatures).unwrap();
        assert_eq!(aliases["a"], ["b", "c"]);
        assert_eq!(signatures["a"].signature(), "x y");
        assert_eq!(signatures["c"].signature(), "x y");
    }

    #[test]
    fn test_unknown_targets() {
        let justfile = parse_justfile("a:\nalias b := c");
        let mut signatures = signatures(&justfile);
        assert_eq!(
            error_of(aliases(&justfile, &["a"], &mut signatures)),
            "14..15: alias `b` has an unknown target `c`"
        );

        let justfile = parse_justfile("a: b && (c 'x')\nb:");
        assert_eq!(
            error_of(check_dependencies(&justfile, &["a", "b"], &HashMap::new())),
            "9..10: recipe `a` has unknown dependency `c`"
        );
    }

    #[test]
    fn test_target_ordering() {
        let justfile = parse_justfile(indoc! {"
            set allow-duplicate-recipes
            zeta:
            alias z := zeta
            alias _hidden := zeta
            alpha:
            _private:
            zeta:
            alias a := alpha
        "});
        let analysis = analyze(&justfile).unwrap();
        assert_eq!(analysis.listed_recipes, ["zeta", "alpha"]);
        assert_eq!(analysis.targets, ["zeta", "_hidden", "z", "alpha", "a", "_private"]);
        assert_eq!(analysis.sorted_targets, ["alpha", "a", "zeta", "z"]);
    }
}
