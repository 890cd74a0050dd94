//! Compiles justfiles and runs the generated scripts with `sh`.

use std::{
    fs,
    os::unix::fs::PermissionsExt,
    process::{Command, Output},
};

use chrono::NaiveDate;
use indoc::indoc;
use justsh::Options;
use pretty_assertions::assert_eq;
use tempfile::TempDir;

fn options() -> Options {
    Options {
        script_name: "just.sh".to_owned(),
        date: NaiveDate::from_ymd_opt(2024, 1, 2).unwrap(),
    }
}

#[track_caller]
fn compile(justfile: &str) -> String {
    match justsh::compile(justfile, &options()) {
        Ok(script) => script,
        Err(error) => panic!("{}", error.render(justfile)),
    }
}

struct Script {
    dir: TempDir,
}

impl Script {
    #[track_caller]
    fn new(justfile: &str) -> Script {
        let script = compile(justfile);

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("just.sh");
        fs::write(&path, script).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        Script { dir }
    }

    fn run(&self, args: &[&str]) -> Output {
        Command::new("sh")
            .arg("./just.sh")
            .args(args)
            .current_dir(self.dir.path())
            .output()
            .unwrap()
    }

    /// Runs the script, expecting it to succeed, and returns its stdout.
    #[track_caller]
    fn stdout(&self, args: &[&str]) -> String {
        let output = self.run(args);
        assert!(
            output.status.success(),
            "script failed with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr)
        );
        String::from_utf8(output.stdout).unwrap()
    }

    /// Runs the script, expecting it to fail, and returns its exit code and
    /// stderr.
    #[track_caller]
    fn failure(&self, args: &[&str]) -> (i32, String) {
        let output = self.run(args);
        assert!(!output.status.success(), "script succeeded");
        let stderr = String::from_utf8(output.stderr).unwrap();
        (output.status.code().unwrap_or_default(), stderr)
    }
}

#[test]
fn test_default_recipe() {
    let script = Script::new(indoc! {"
        default:
          echo hello
        other:
          echo other
    "});
    let output = script.run(&[]);
    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout), "hello\n");
    assert_eq!(String::from_utf8_lossy(&output.stderr), "echo hello\n");
}

#[test]
fn test_dependencies_run_once_in_order() {
    let script = Script::new(indoc! {"
        a: b c && d
          echo a
        b:
          @echo b
        c: b
          @echo c
        d:
          @echo d
    "});
    assert_eq!(script.stdout(&["a"]), "b\nc\na\nd\n");
    assert_eq!(script.stdout(&["b", "b", "c"]), "b\nc\n");
}

#[test]
fn test_dependency_arguments() {
    let script = Script::new(indoc! {"
        a: (greet 'world') && (greet 'again')
        greet who:
          @echo hello {{who}}
    "});
    assert_eq!(script.stdout(&["a"]), "hello world\nhello again\n");
}

#[test]
fn test_parameters() {
    let script = Script::new(indoc! {"
        r a b='d':
          @echo {{a}} {{b}}
        v first +rest:
          @echo {{first}}: {{rest}}
    "});
    assert_eq!(script.stdout(&["r", "x"]), "x d\n");
    assert_eq!(script.stdout(&["r", "x", "y"]), "x y\n");
    assert_eq!(script.stdout(&["r", "x", "y", "r", "z"]), "x y\n");
    assert_eq!(script.stdout(&["v", "1", "2", "3"]), "1: 2 3\n");

    let (code, stderr) = script.failure(&["r"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Recipe `r` got 0 arguments but takes at least 1"));

    let (_, stderr) = script.failure(&["v", "1"]);
    assert!(stderr.contains("Recipe `v` got 1 arguments but takes at least 2"));
}

#[test]
fn test_default_recipe_arity() {
    let script = Script::new("r a:\n  echo {{a}}\n");
    let (code, stderr) = script.failure(&[]);
    assert_eq!(code, 1);
    assert!(stderr.contains(
        "Recipe `r` cannot be used as default recipe since it requires at least 1 argument."
    ));
}

#[test]
fn test_evaluate() {
    let script = Script::new(indoc! {"
        a := 'x'
        longer := a + 'y'
        eq := if a == 'x' { 'yes' } else { 'no' }
        ne := if a != 'x' { 'yes' } else { 'no' }
        re := if 'abc' =~ 'b+' { 'match' } else { 'no match' }
    "});
    assert_eq!(
        script.stdout(&["--evaluate"]),
        indoc! {r#"
            a      := "x"
            eq     := "yes"
            longer := "xy"
            ne     := "no"
            re     := "match"
        "#}
    );
    assert_eq!(script.stdout(&["--evaluate", "longer"]), "xy");

    let (_, stderr) = script.failure(&["--evaluate", "nope"]);
    assert!(stderr.contains("Justfile does not contain variable `nope`."));
}

#[test]
fn test_overrides() {
    let script = Script::new(indoc! {"
        a := 'x'
        r:
          @echo {{a}}
    "});
    assert_eq!(script.stdout(&["a=z", "r"]), "z\n");
    assert_eq!(script.stdout(&["--set", "a", "w", "r"]), "w\n");

    let (_, stderr) = script.failure(&["b=z", "r"]);
    assert!(stderr.contains("Variable `b` overridden on the command line but not present"));
}

#[test]
fn test_paths_and_builtins() {
    let script = Script::new(indoc! {"
        p := 'a' / 'b'
        q := 'a/' / 'b'
        root := / 'etc'
        upper := uppercase('abc') + join('x', 'y', 'z')
        tick := `echo hi`
    "});
    assert_eq!(script.stdout(&["--evaluate", "p"]), "a/b");
    assert_eq!(script.stdout(&["--evaluate", "q"]), "a/b");
    assert_eq!(script.stdout(&["--evaluate", "root"]), "/etc");
    assert_eq!(script.stdout(&["--evaluate", "upper"]), "ABCx/y/z");
    assert_eq!(script.stdout(&["--evaluate", "tick"]), "hi");
}

#[test]
fn test_failing_backtick() {
    let script = Script::new("x := `exit 3`\n");
    let (code, stderr) = script.failure(&["--evaluate"]);
    assert_eq!(code, 3);
    assert!(stderr.contains("Backtick failed with exit code 3"));
}

#[test]
fn test_failing_line() {
    let script = Script::new(indoc! {"
        r:
          @echo before
          false
          echo never
        s:
          -false
          @echo after
    "});
    let (code, stderr) = script.failure(&["r"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Recipe `r` failed on line 3 with exit code 1"));
    assert!(!stderr.contains("never"));

    assert_eq!(script.stdout(&["s"]), "after\n");
}

#[test]
fn test_exports_and_positional_arguments() {
    let script = Script::new(indoc! {"
        set positional-arguments
        export A := 'v'
        r $B c:
          @echo $A $B $1 $2
    "});
    assert_eq!(script.stdout(&["r", "b", "c"]), "v b b c\n");
}

#[test]
fn test_shebang_recipe() {
    let script = Script::new(indoc! {"
        r name:
          #!/bin/sh
          set -eu
          echo \"hello from {{name}}\"
    "});
    assert_eq!(script.stdout(&["r", "script"]), "hello from script\n");
}

#[test]
fn test_aliases() {
    let script = Script::new(indoc! {"
        build x:
          @echo built {{x}}
        alias b := build
    "});
    assert_eq!(script.stdout(&["b", "1", "build", "2"]), "built 1\n");
}

#[test]
fn test_recursive_invocation() {
    let script = Script::new(indoc! {"
        a:
          @just b
        b:
          @echo b
    "});
    assert_eq!(script.stdout(&["a"]), "b\n");
}

#[test]
fn test_platform_recipes() {
    let script = Script::new(indoc! {"
        [unix]
        r:
          @echo unix
        [windows]
        r:
          @echo windows
    "});
    assert_eq!(script.stdout(&["r"]), "unix\n");
}

#[test]
fn test_list_and_summary() {
    let script = Script::new(indoc! {"
        # Build it
        build target='all':
        alias b := build
        _hidden:
        [private]
        secret:
        args +rest:
    "});
    assert_eq!(
        script.stdout(&["--list"]),
        indoc! {r#"
            Available recipes:
                args +rest
                build target="all" # Build it
                b target="all" # alias for `build`
        "#}
    );
    assert_eq!(
        script.stdout(&["--list", "--unsorted", "--list-prefix", "- "]),
        indoc! {r#"
            Available recipes:
            - build target="all" # Build it
            - b target="all" # alias for `build`
            - args +rest
        "#}
    );
    assert_eq!(script.stdout(&["--summary"]), "args build\n");
    assert_eq!(script.stdout(&["--summary", "-u"]), "build args\n");
}

#[test]
fn test_dump() {
    let justfile = "# comment\nx := 'a'  # $HOME `y`\n\nr:\n  echo \"{{x}}\" \\\n    more\n";
    let script = Script::new(justfile);
    assert_eq!(script.stdout(&["--dump"]), justfile);
}

#[test]
fn test_unknown_arguments() {
    let script = Script::new("r:\n");
    let (code, stderr) = script.failure(&["nope"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Justfile does not contain recipe `nope`."));

    let (code, stderr) = script.failure(&["--bogus"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("Found argument '--bogus' that wasn't expected"));
}

#[test]
fn test_version_and_help() {
    let script = Script::new("r:\n");
    assert_eq!(
        script.stdout(&["--version"]),
        format!("justsh {}\n", env!("CARGO_PKG_VERSION"))
    );
    assert!(script.stdout(&["--help"]).contains("./just.sh [FLAGS] [OPTIONS] [ARGUMENTS]..."));
}

#[test]
fn test_compile_errors() {
    let options = Options::default();
    let cases = [
        (
            "a:\na:\n",
            "error: recipe `a` first defined at 0..1 is redefined\n  --> line 2, column 1",
        ),
        (
            "x := nope()\n",
            "error: call to unknown function `nope`\n  --> line 1, column 6",
        ),
        (
            "alias b := c\n",
            "error: alias `b` has an unknown target `c`\n  --> line 1, column 12",
        ),
    ];
    for (justfile, expected) in cases {
        let error = justsh::compile(justfile, &options).unwrap_err();
        assert_eq!(error.render(justfile), expected, "justfile: {justfile:?}");
    }
}

#[test]
fn test_default_dependencies_run_in_order() {
    let script = Script::new(indoc! {"
        default: lint build test
        lint:
          @echo lint
        build:
          @echo build
        test: build
          @echo test
    "});
    assert_eq!(script.stdout(&[]), "lint\nbuild\ntest\n");
}

#[test]
fn test_compile_is_deterministic() {
    let justfile = indoc! {"
        x := if 'a' == 'b' { 'c' } else { uppercase('d') }
        y := x / 'e'
        [linux]
        r a:
          echo {{a}} {{y}}
        [macos]
        r a:
          echo {{x}}
        alias q := r
    "};
    assert_eq!(compile(justfile), compile(justfile));
}

#[test]
fn test_recipes_named_like_internals() {
    let script = Script::new(indoc! {"
        assign_variables:
          @echo ran
        assign-variables:
          @echo dashed
    "});
    assert_eq!(script.stdout(&[]), "ran\n");
    assert_eq!(script.stdout(&["assign_variables"]), "ran\n");
    assert_eq!(script.stdout(&["assign-variables"]), "dashed\n");

    let script = Script::new(indoc! {"
        [unix]
        a:
          @echo variant
        a_unix:
          @echo plain
    "});
    assert_eq!(script.stdout(&["a"]), "variant\n");
    assert_eq!(script.stdout(&["a_unix"]), "plain\n");
}

#[test]
fn test_parameters_do_not_leak() {
    let script = Script::new(indoc! {"
        x := 'global'
        r x:
          @echo r={{x}}
        s:
          @echo s={{x}}
        outer x: (inner 'dep')
          @echo outer={{x}}
        inner x:
          @echo inner={{x}}
    "});
    assert_eq!(script.stdout(&["r", "param", "s"]), "r=param\ns=global\n");
    assert_eq!(script.stdout(&["outer", "mine"]), "inner=dep\nouter=mine\n");
}

#[test]
fn test_init() {
    let script = Script::new("r:\n");
    let output = script.run(&["--init"]);
    assert!(output.status.success());
    assert!(String::from_utf8_lossy(&output.stdout).starts_with("Wrote justfile to `"));
    assert_eq!(
        fs::read_to_string(script.dir.path().join("justfile")).unwrap(),
        "default:\n    echo 'Hello, world!'\n"
    );

    let (code, stderr) = script.failure(&["--init"]);
    assert_eq!(code, 1);
    assert!(stderr.contains("already exists"));
}

#[test]
fn test_choose() {
    let script = Script::new(indoc! {"
        first:
          @echo first
        second:
          @echo second
    "});
    assert_eq!(
        script.stdout(&["--chooser", "cut -d ' ' -f 2", "--choose"]),
        "second\n"
    );
}

#[test]
fn test_shell_flags() {
    let script = Script::new("r:\n  @echo hi\n");
    assert_eq!(
        script.stdout(&["--shell", "echo", "--shell-arg", "wrapped", "r"]),
        "wrapped echo hi\n"
    );
}

#[test]
fn test_list_heading_and_prefix_flags() {
    let script = Script::new("b:\na:\n");
    assert_eq!(
        script.stdout(&["--list-heading", "Recipes:\n", "--list-prefix", "* ", "--list"]),
        "Recipes:\n* a\n* b\n"
    );
    assert_eq!(
        script.stdout(&["--list", "--list-heading", "", "--list-prefix", ""]),
        "a\nb\n"
    );
}
