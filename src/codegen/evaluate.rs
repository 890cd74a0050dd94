use crate::{
    analysis,
    ast::{BinaryOperator, Expr, ExprKind},
};

use super::Generator;

/// Single-quotes a string for the shell.
pub fn quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r#"'"'"'"#))
}

impl Generator<'_> {
    /// Renders the expression as a single shell word which expands to its
    /// value.
    pub(super) fn evaluate(&mut self, expr: &Expr) -> String {
        let substitution = |command: String| format!("\"$({command})\"");

        match &expr.kind {
            ExprKind::String(s) => quote(s),
            ExprKind::Variable(name) => {
                let var = self.names.var(&name.name);
                format!("\"${{{var}}}\"")
            }
            ExprKind::Binary {
                op: BinaryOperator::Add,
                lhs,
                rhs,
            } => {
                let lhs = self.evaluate(lhs);
                let rhs = self.evaluate(rhs);
                lhs + &rhs
            }
            ExprKind::Binary {
                op: BinaryOperator::Div,
                lhs,
                rhs,
            } => {
                let lhs = self.evaluate(lhs);
                let rhs = self.evaluate(rhs);
                substitution(format!("path_join {lhs} {rhs}"))
            }
            ExprKind::Backtick(command) => substitution(format!(
                "env \"${{DEFAULT_SHELL}}\" ${{DEFAULT_SHELL_ARGS}} {} || backtick_error",
                quote(command)
            )),
            ExprKind::Conditional(conditional) => {
                let name = self.names.clean("", &analysis::conditional_name(conditional));
                substitution(name)
            }
            ExprKind::Call { name, args } => {
                let mut command = self.names.clean("", &name.name);
                for arg in args {
                    command.push(' ');
                    command.push_str(&self.evaluate(arg));
                }
                substitution(command)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{codegen::tests::with_generator, parser::test_utils::parse_expr};

    #[test]
    fn test_quote() {
        assert_eq!(quote("abc"), "'abc'");
        assert_eq!(quote(""), "''");
        assert_eq!(quote("it's"), r#"'it'"'"'s'"#);
        assert_eq!(quote("$HOME `x` \"y\""), "'$HOME `x` \"y\"'");
    }

    #[test]
    fn test_evaluate() {
        let cases = [
            ("'a b'", "'a b'"),
            ("x", r#""${VAR_x}""#),
            ("some-var", r#""${VAR_some_var}""#),
            ("'a' + x + 'b'", r#"'a'"${VAR_x}"'b'"#),
            ("x / 'bin'", r#""$(path_join "${VAR_x}" 'bin')""#),
            ("/ 'etc'", r#""$(path_join '' 'etc')""#),
            (
                "`echo 'hi'`",
                r#""$(env "${DEFAULT_SHELL}" ${DEFAULT_SHELL_ARGS} 'echo '"'"'hi'"'"'' || backtick_error)""#,
            ),
            ("uppercase(x)", r#""$(uppercase "${VAR_x}")""#),
            ("join('a', 'b', 'c')", r#""$(join 'a' 'b' 'c')""#),
            ("arch()", r#""$(arch)""#),
        ];
        for (input, expected) in cases {
            let expr = parse_expr(input);
            let actual = with_generator("", |g| g.evaluate(&expr));
            assert_eq!(actual, expected, "input: {input:?}");
        }
    }

    #[test]
    fn test_evaluate_conditional_calls_its_function() {
        let expr = parse_expr("if x == 'a' { 'b' } else { 'c' }");
        let ExprKind::Conditional(conditional) = &expr.kind else {
            panic!("not a conditional");
        };
        let name = analysis::conditional_name(conditional);
        let actual = with_generator("", |g| g.evaluate(&expr));
        assert_eq!(actual, format!("\"$({name})\""));
    }
}
