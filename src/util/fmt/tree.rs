use std::io::Write;

use crate::ast::*;

const INDENT_WIDTH: usize = 2;

pub fn print_justfile_string(justfile: &Justfile) -> String {
    let mut buf = Vec::with_capacity(1024);
    let _ = print_justfile(&mut buf, justfile);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn print_expr_string(expr: &Expr) -> String {
    let mut buf = Vec::with_capacity(512);
    let _ = print_expr(&mut buf, 0, expr);
    String::from_utf8_lossy(&buf).into_owned()
}

pub fn print_justfile(w: &mut impl Write, justfile: &Justfile) -> std::io::Result<()> {
    for item in &justfile.items {
        print_item(w, 0, item)?;
    }
    Ok(())
}

fn print_item(w: &mut impl Write, i: usize, item: &Item) -> std::io::Result<()> {
    let span = item.span;
    sp(w, i)?;
    match &item.kind {
        ItemKind::Setting(Setting { name, value }) => {
            write!(w, "setting {name} ")?;
            match value {
                SettingValue::Bool(value) => write!(w, "{value}")?,
                SettingValue::String(value) => write!(w, "{value:?}")?,
                SettingValue::List(values) => {
                    write!(w, "[")?;
                    for (idx, value) in values.iter().enumerate() {
                        if idx > 0 {
                            write!(w, ", ")?;
                        }
                        write!(w, "{value:?}")?;
                    }
                    write!(w, "]")?;
                }
            }
            writeln!(w, " ({span})")?;
        }
        ItemKind::Assignment(Assignment { name, value }) => {
            writeln!(w, "assignment {name} ({span})")?;
            print_expr(w, i + 1, value)?;
        }
        ItemKind::Export(Assignment { name, value }) => {
            writeln!(w, "export {name} ({span})")?;
            print_expr(w, i + 1, value)?;
        }
        ItemKind::Alias(Alias { name, target }) => {
            writeln!(w, "alias {name} -> {target} ({span})")?;
        }
        ItemKind::Comment(text) => writeln!(w, "comment {text:?} ({span})")?,
        ItemKind::Blank => writeln!(w, "blank ({span})")?,
        ItemKind::Recipe(recipe) => {
            writeln!(w, "recipe {} ({span})", recipe.name)?;
            if !item.attributes.is_empty() {
                sp(w, i + 1)?;
                write!(w, "attributes ")?;
                for (idx, attr) in item.attributes.iter().enumerate() {
                    if idx > 0 {
                        write!(w, ", ")?;
                    }
                    write!(w, "{attr}")?;
                }
                writeln!(w)?;
            }
            print_recipe(w, i + 1, recipe)?;
        }
    }
    Ok(())
}

fn print_recipe(w: &mut impl Write, i: usize, recipe: &Recipe) -> std::io::Result<()> {
    if recipe.quiet {
        sp(w, i)?;
        writeln!(w, "quiet")?;
    }
    for parameter in &recipe.parameters {
        sp(w, i)?;
        write!(w, "parameter ")?;
        print_parameter(w, i, parameter)?;
    }
    if let Some(Variadic { kind, param }) = &recipe.variadic {
        sp(w, i)?;
        write!(w, "variadic {} ", kind.sigil())?;
        print_parameter(w, i, param)?;
    }
    for (label, dependencies) in [("before", &recipe.before), ("after", &recipe.after)] {
        if dependencies.is_empty() {
            continue;
        }
        sp(w, i)?;
        writeln!(w, "{label}")?;
        for Dependency { name, args } in dependencies {
            sp(w, i + 1)?;
            writeln!(w, "dependency {name}")?;
            for arg in args {
                print_expr(w, i + 2, arg)?;
            }
        }
    }
    if !recipe.body.is_empty() {
        sp(w, i)?;
        writeln!(w, "body")?;
        for line in &recipe.body {
            print_line(w, i + 1, line)?;
        }
    }
    Ok(())
}

fn print_parameter(w: &mut impl Write, i: usize, parameter: &Parameter) -> std::io::Result<()> {
    if parameter.export {
        write!(w, "$")?;
    }
    writeln!(w, "{}", parameter.name)?;
    if let Some(default) = &parameter.default {
        print_expr(w, i + 1, default)?;
    }
    Ok(())
}

fn print_line(w: &mut impl Write, i: usize, line: &Line) -> std::io::Result<()> {
    sp(w, i)?;
    write!(w, "line")?;
    let LinePrefix {
        toggle_echo,
        ignore_error,
    } = line.prefix;
    if toggle_echo || ignore_error {
        write!(w, " ")?;
        if toggle_echo {
            write!(w, "@")?;
        }
        if ignore_error {
            write!(w, "-")?;
        }
    }
    writeln!(w)?;

    for fragment in &line.fragments {
        sp(w, i + 1)?;
        match fragment {
            Fragment::Text(text) => writeln!(w, "text {text:?}")?,
            Fragment::Interpolation(expr) => {
                writeln!(w, "interpolation")?;
                print_expr(w, i + 2, expr)?;
            }
        }
    }
    Ok(())
}

pub fn print_expr(w: &mut impl Write, i: usize, expr: &Expr) -> std::io::Result<()> {
    sp(w, i)?;
    let span = expr.span;
    match &expr.kind {
        ExprKind::String(value) => writeln!(w, "string {value:?} ({span})")?,
        ExprKind::Variable(name) => writeln!(w, "variable {name} ({span})")?,
        ExprKind::Backtick(command) => writeln!(w, "backtick {command:?} ({span})")?,
        ExprKind::Binary { op, lhs, rhs } => {
            writeln!(w, "binary {op:?} ({span})")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
        }
        ExprKind::Call { name, args } => {
            writeln!(w, "call {name} ({span})")?;
            for arg in args {
                print_expr(w, i + 1, arg)?;
            }
        }
        ExprKind::Conditional(conditional) => {
            let Conditional {
                condition: Condition { op, lhs, rhs },
                then,
                otherwise,
            } = &**conditional;
            writeln!(w, "conditional {op:?} ({span})")?;
            print_expr(w, i + 1, lhs)?;
            print_expr(w, i + 1, rhs)?;
            print_expr(w, i + 1, then)?;
            print_expr(w, i + 1, otherwise)?;
        }
    }
    Ok(())
}

fn sp(w: &mut impl Write, i: usize) -> std::io::Result<()> {
    write!(w, "{:width$}", "", width = i * INDENT_WIDTH)
}
