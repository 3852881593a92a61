//! Named variable store.
//!
//! Variables are captured from responses while comparing (store matchers,
//! regexp captures) or set explicitly, and read back by load matchers and
//! load-token substitution. The store lives as long as its engine and is never
//! cleared implicitly.

use crate::error::VariableError;
use crate::value::{Kind, Value};
use std::collections::HashMap;

/// Check a variable name: one or more ASCII letters or digits.
pub fn is_valid_name(name: &str) -> bool {
    !name.is_empty() && name.bytes().all(|b| b.is_ascii_alphanumeric())
}

/// Render a scalar value for insertion into a string template.
///
/// Floats use the shortest round-trip form unless `precision` fixes the
/// number of decimals. Nulls, sequences and mappings are rejected with their
/// kind.
pub fn stringify(value: &Value, precision: Option<usize>) -> Result<String, Kind> {
    match value {
        Value::Bool(b) => Ok(b.to_string()),
        Value::Int(i) => Ok(i.to_string()),
        Value::Uint(u) => Ok(u.to_string()),
        Value::Float(x) => Ok(match precision {
            Some(precision) => format!("{x:.precision$}"),
            None => x.to_string(),
        }),
        Value::String(s) => Ok(s.clone()),
        other => Err(other.kind()),
    }
}

/// Mutable mapping from variable name to captured value.
#[derive(Debug, Clone, Default)]
pub struct VariableStore {
    values: HashMap<String, Value>,
}

impl VariableStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a value, silently replacing any previous one.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<(), VariableError> {
        if !is_valid_name(name) {
            return Err(VariableError::InvalidName(name.to_string()));
        }
        let value = value.into();
        tracing::debug!(variable = name, kind = %value.kind(), "storing variable");
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Get a string variable, or `""` when absent or not a string.
    pub fn get_string(&self, name: &str) -> &str {
        self.values
            .get(name)
            .and_then(Value::as_str)
            .unwrap_or_default()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn clear(&mut self) {
        self.values.clear();
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Look up a variable and render it for substitution.
    pub fn render(&self, name: &str, precision: Option<usize>) -> Result<String, VariableError> {
        let value = self
            .values
            .get(name)
            .ok_or_else(|| VariableError::Undefined(name.to_string()))?;
        stringify(value, precision).map_err(|kind| VariableError::UnsupportedType {
            name: name.to_string(),
            kind,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_names() {
        assert!(is_valid_name("catid"));
        assert!(is_valid_name("Var2"));
        assert!(is_valid_name("123"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("my var"));
        assert!(!is_valid_name("my_var"));
        assert!(!is_valid_name("v-1"));
    }

    #[test]
    fn test_set_rejects_invalid_name() {
        let mut store = VariableStore::new();
        let err = store.set("my var", "x").unwrap_err();
        assert_eq!(err.to_string(), "invalid variable name my var");
        assert!(store.is_empty());
    }

    #[test]
    fn test_set_overwrites() {
        let mut store = VariableStore::new();
        store.set("a", 1).unwrap();
        store.set("a", "two").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(store.get("a"), Some(&Value::from("two")));
    }

    #[test]
    fn test_remove_clear_and_iter() {
        let mut store = VariableStore::new();
        store.set("a", 1).unwrap();
        store.set("b", "two").unwrap();

        let mut names: Vec<_> = store.iter().map(|(name, _)| name).collect();
        names.sort_unstable();
        assert_eq!(names, ["a", "b"]);

        assert_eq!(store.remove("a"), Some(Value::Int(1)));
        assert_eq!(store.remove("a"), None);
        assert!(!store.contains("a"));
        assert!(store.contains("b"));

        store.clear();
        assert!(store.is_empty());
        assert_eq!(store.iter().count(), 0);
    }

    #[test]
    fn test_get_string_accessor() {
        let mut store = VariableStore::new();
        store.set("name", "John").unwrap();
        store.set("age", 51).unwrap();
        assert_eq!(store.get_string("name"), "John");
        assert_eq!(store.get_string("age"), "");
        assert_eq!(store.get_string("missing"), "");
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_stringify_scalars() {
        assert_eq!(stringify(&Value::Bool(true), None).unwrap(), "true");
        assert_eq!(stringify(&Value::Int(-42), None).unwrap(), "-42");
        assert_eq!(stringify(&Value::Uint(u64::MAX), None).unwrap(), "18446744073709551615");
        assert_eq!(stringify(&Value::Float(10.5), None).unwrap(), "10.5");
        assert_eq!(stringify(&Value::Float(10.0), None).unwrap(), "10");
        assert_eq!(stringify(&Value::Float(10.5), Some(3)).unwrap(), "10.500");
        assert_eq!(stringify(&Value::from("text"), None).unwrap(), "text");
    }

    #[test]
    fn test_stringify_rejects_containers() {
        assert_eq!(stringify(&Value::Null, None), Err(Kind::Null));
        assert_eq!(stringify(&Value::from(vec![1]), None), Err(Kind::Sequence));
        assert_eq!(
            stringify(&Value::Map(Default::default()), None),
            Err(Kind::Mapping)
        );
    }

    #[test]
    fn test_render_errors() {
        let mut store = VariableStore::new();
        store.set("list", vec![1, 2]).unwrap();

        assert_eq!(
            store.render("nope", None).unwrap_err().to_string(),
            "variable nope is not defined"
        );
        assert_eq!(
            store.render("list", None).unwrap_err().to_string(),
            "variable list of type sequence cannot be used inside a string"
        );
    }
}
