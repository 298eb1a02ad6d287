use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use super::{ExecutionErrorKind, Value};

/// Words that can never name a variable or a constant.
pub const KEYWORDS: [&str; 13] = [
    "and", "or", "not", "if", "else", "while", "for", "null", "del", "done", "CLEAR", "RESET",
    "help",
];

/// The single global store of the interpreter: mutable variables and immutable constants.
#[derive(Debug, Clone)]
pub struct Environment {
    variables: FxHashMap<String, Value>,
    constants: FxHashMap<String, Value>,
    keywords: FxHashSet<&'static str>,
}

impl Default for Environment {
    fn default() -> Self {
        Self::new()
    }
}

impl Environment {
    pub fn new() -> Self {
        Self {
            variables: FxHashMap::default(),
            constants: FxHashMap::default(),
            keywords: KEYWORDS.into_iter().collect(),
        }
    }

    /// Looks a name up among the variables first, then the constants.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.variables
            .get(name)
            .or_else(|| self.constants.get(name))
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    pub fn is_reserved(&self, name: &str) -> bool {
        self.keywords.contains(name)
    }

    /// Checks that `name` may be bound at all: alphabetic only and not a keyword.
    pub fn check_name(&self, name: &str) -> Result<(), ExecutionErrorKind> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(ExecutionErrorKind::InvalidName(name.to_string()));
        }
        if self.is_reserved(name) {
            return Err(ExecutionErrorKind::ReservedName(name.to_string()));
        }
        Ok(())
    }

    /// Checks that `name` may be the target of a plain assignment.
    pub fn check_assignable(&self, name: &str) -> Result<(), ExecutionErrorKind> {
        self.check_name(name)?;
        if self.constants.contains_key(name) {
            return Err(ExecutionErrorKind::ConstantReassignment(name.to_string()));
        }
        Ok(())
    }

    pub fn define_constant(&mut self, name: &str, value: Value) -> Result<(), ExecutionErrorKind> {
        self.check_name(name)?;
        debug!("constant {} = {}", name, value);
        self.constants.insert(name.to_string(), value);
        Ok(())
    }

    pub fn assign_variable(&mut self, name: &str, value: Value) -> Result<(), ExecutionErrorKind> {
        self.check_assignable(name)?;
        debug!("variable {} = {}", name, value);
        self.variables.insert(name.to_string(), value);
        Ok(())
    }

    /// Drops a binding if there is one, variables before constants.
    pub fn null(&mut self, name: &str) -> Option<Value> {
        let removed = self
            .variables
            .remove(name)
            .or_else(|| self.constants.remove(name));
        debug!("null {} (bound: {})", name, removed.is_some());
        removed
    }

    /// Like [`Environment::null`], but the name has to be bound.
    pub fn delete(&mut self, name: &str) -> Result<Value, ExecutionErrorKind> {
        self.null(name)
            .ok_or_else(|| ExecutionErrorKind::NotBound(name.to_string()))
    }

    pub fn reset(&mut self) {
        debug!(
            "reset {} variables and {} constants",
            self.variables.len(),
            self.constants.len()
        );
        self.variables.clear();
        self.constants.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.variables.is_empty() && self.constants.is_empty()
    }
}

#[cfg(test)]
mod test {
    use num_bigint::BigInt;

    use super::*;

    fn int(n: i64) -> Value {
        Value::Integer(BigInt::from(n))
    }

    #[test]
    fn test_variables_shadow_constants() {
        let mut environment = Environment::new();
        environment.define_constant("a", int(1)).unwrap();
        assert_eq!(environment.get("a"), Some(&int(1)));
        assert!(matches!(
            environment.assign_variable("a", int(2)),
            Err(ExecutionErrorKind::ConstantReassignment(_))
        ));
        assert_eq!(environment.variable("a"), None);
    }

    #[test]
    fn test_names() {
        let environment = Environment::new();
        assert!(environment.check_name("abc").is_ok());
        assert!(matches!(
            environment.check_name("a1"),
            Err(ExecutionErrorKind::InvalidName(_))
        ));
        assert!(matches!(
            environment.check_name(""),
            Err(ExecutionErrorKind::InvalidName(_))
        ));
        assert!(matches!(
            environment.check_name("while"),
            Err(ExecutionErrorKind::ReservedName(_))
        ));
        assert!(matches!(
            environment.check_name("RESET"),
            Err(ExecutionErrorKind::ReservedName(_))
        ));
    }

    #[test]
    fn test_null_and_delete() {
        let mut environment = Environment::new();
        environment.assign_variable("a", int(1)).unwrap();
        environment.define_constant("b", int(2)).unwrap();

        assert_eq!(environment.null("a"), Some(int(1)));
        assert_eq!(environment.null("a"), None);
        assert_eq!(environment.delete("b").unwrap(), int(2));
        assert!(matches!(
            environment.delete("b"),
            Err(ExecutionErrorKind::NotBound(_))
        ));
        assert!(environment.is_empty());
    }

    #[test]
    fn test_reset() {
        let mut environment = Environment::new();
        environment.assign_variable("a", int(1)).unwrap();
        environment.define_constant("b", int(2)).unwrap();
        environment.reset();
        assert!(environment.is_empty());
        assert_eq!(environment.get("b"), None);
    }
}
