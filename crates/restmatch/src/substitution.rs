//! Store and load shortcut tokens.
//!
//! Two token forms are recognised inside strings:
//!
//! - a *store* token (default `$name$`) must be the whole string. In an
//!   expected description it captures the actual value under `name` instead of
//!   comparing against it.
//! - *load* tokens (default `_name_`) may appear anywhere, any number of times.
//!   Each one is replaced with the stringified value of `name` before the
//!   string is used (request path, headers, raw body, expected literals,
//!   regexp patterns).
//!
//! # Example
//!
//! ```
//! use restmatch::{Shortcuts, VariableStore};
//!
//! let mut vars = VariableStore::new();
//! vars.set("catid", "123").unwrap();
//!
//! let shortcuts = Shortcuts::default();
//! assert_eq!(shortcuts.replace("/api/cat/_catid_", &vars).unwrap(), "/api/cat/123");
//! assert_eq!(shortcuts.store_token("$catid$"), Some("catid"));
//! ```

use crate::error::{ShortcutError, VariableError};
use crate::vars::VariableStore;
use regex::Regex;
use serde::{Deserialize, Serialize};

const NAME_PATTERN: &str = "([a-zA-Z0-9]+)";

/// Prefix and suffix delimiting a shortcut token.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ShortcutBounds {
    pub prefix: String,
    pub suffix: String,
}

impl ShortcutBounds {
    pub fn new(prefix: impl Into<String>, suffix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            suffix: suffix.into(),
        }
    }

    /// Default bounds for store tokens: `$name$`.
    pub fn store_default() -> Self {
        Self::new("$", "$")
    }

    /// Default bounds for load tokens: `_name_`.
    pub fn load_default() -> Self {
        Self::new("_", "_")
    }

    /// Build the escaped token pattern, anchored to the whole string or not.
    fn pattern(&self, anchored: bool) -> Result<Regex, ShortcutError> {
        if self.prefix.is_empty() {
            return Err(ShortcutError::EmptyPrefix);
        }
        if self.suffix.is_empty() {
            return Err(ShortcutError::EmptySuffix);
        }
        let body = format!(
            "{}{NAME_PATTERN}{}",
            regex::escape(&self.prefix),
            regex::escape(&self.suffix)
        );
        let pattern = if anchored { format!("^{body}$") } else { body };
        Ok(Regex::new(&pattern)?)
    }
}

/// Compiled store/load token patterns plus float rendering precision.
///
/// Patterns belong to one engine instance; independent engines never share
/// them.
#[derive(Debug, Clone)]
pub struct Shortcuts {
    store: Regex,
    load: Regex,
    float_precision: Option<usize>,
}

impl Shortcuts {
    pub fn new(store: &ShortcutBounds, load: &ShortcutBounds) -> Result<Self, ShortcutError> {
        Ok(Self {
            store: store.pattern(true)?,
            load: load.pattern(false)?,
            float_precision: None,
        })
    }

    pub fn set_store_bounds(&mut self, bounds: &ShortcutBounds) -> Result<(), ShortcutError> {
        self.store = bounds.pattern(true)?;
        Ok(())
    }

    pub fn set_load_bounds(&mut self, bounds: &ShortcutBounds) -> Result<(), ShortcutError> {
        self.load = bounds.pattern(false)?;
        Ok(())
    }

    /// Fixed number of decimals for floats; `None` keeps the shortest form.
    pub fn set_float_precision(&mut self, precision: Option<usize>) {
        self.float_precision = precision;
    }

    pub fn float_precision(&self) -> Option<usize> {
        self.float_precision
    }

    /// Return the variable name if the whole string is a store token.
    pub fn store_token<'s>(&self, candidate: &'s str) -> Option<&'s str> {
        self.store
            .captures(candidate)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
    }

    /// Check if a string contains load tokens.
    pub fn has_load_tokens(&self, s: &str) -> bool {
        self.load.is_match(s)
    }

    /// Replace every load token with the rendered variable value.
    ///
    /// Text outside tokens is kept verbatim. A string without tokens is
    /// returned unchanged.
    pub fn replace(&self, template: &str, vars: &VariableStore) -> Result<String, VariableError> {
        let mut replaced = String::with_capacity(template.len());
        let mut offset = 0;

        for caps in self.load.captures_iter(template) {
            let (Some(token), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let value = vars.render(name.as_str(), self.float_precision)?;
            replaced.push_str(&template[offset..token.start()]);
            replaced.push_str(&value);
            offset = token.end();
        }

        if offset == 0 {
            return Ok(template.to_string());
        }
        replaced.push_str(&template[offset..]);
        Ok(replaced)
    }
}

impl Default for Shortcuts {
    fn default() -> Self {
        Self::new(&ShortcutBounds::store_default(), &ShortcutBounds::load_default())
            .expect("default shortcut bounds are valid")
    }
}
