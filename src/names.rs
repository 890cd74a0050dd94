use std::collections::{HashMap, HashSet};

/// Flag guarding the one-time evaluation of the justfile variables.
pub const ASSIGN_VARIABLES_GUARD: &str = "HAS_RUN_assign_variables";

/// Identifiers the script defines on its own behalf. User names which clean up
/// to one of them get a suffix instead.
const RESERVED: &[&str] = &[ASSIGN_VARIABLES_GUARD];

/// Maps justfile names onto names that are safe to use as shell variables
/// and functions.
///
/// Characters other than ASCII alphanumerics and `_` become `_`. When two
/// different names clean up to the same identifier, the later one gets a
/// numeric suffix (`_2`, `_3`, ...). Lookups are memoized, so a name always
/// maps to the same identifier for the lifetime of the context.
#[derive(Debug)]
pub struct Names {
    assigned: HashMap<String, String>,
    taken: HashSet<String>,
}

impl Default for Names {
    fn default() -> Names {
        Names::new()
    }
}

impl Names {
    pub fn new() -> Names {
        Names {
            assigned: HashMap::new(),
            taken: RESERVED.iter().map(|&name| name.to_owned()).collect(),
        }
    }

    pub fn clean(&mut self, prefix: &str, name: &str) -> String {
        let full = format!("{prefix}{name}");
        if let Some(cleaned) = self.assigned.get(&full) {
            return cleaned.clone();
        }

        let base: String = full
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
            .collect();
        let mut cleaned = base.clone();
        let mut n = 2;
        while self.taken.contains(&cleaned) {
            cleaned = format!("{base}_{n}");
            n += 1;
        }

        self.taken.insert(cleaned.clone());
        self.assigned.insert(full, cleaned.clone());
        cleaned
    }

    /// Shell variable holding a justfile variable or parameter.
    pub fn var(&mut self, name: &str) -> String {
        self.clean("VAR_", name)
    }

    /// Shell function implementing a recipe or alias.
    pub fn fun(&mut self, name: &str) -> String {
        self.clean("FUN_", name)
    }

    /// Flag set once a recipe ran to completion.
    pub fn has_run(&mut self, name: &str) -> String {
        self.clean("HAS_RUN_", name)
    }

    /// Variable holding the value a parameter of `recipe` shadows while the
    /// recipe runs.
    pub fn saved(&mut self, recipe: &str, parameter: &str) -> String {
        self.clean("SAVED_", &format!("{recipe} {parameter}"))
    }

    /// Flag that makes a recipe run even if it ran before.
    pub fn force(&mut self, name: &str) -> String {
        self.clean("FORCE_", name)
    }
}
