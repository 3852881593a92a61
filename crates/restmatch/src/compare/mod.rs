//! Structural comparison of an [`Expected`] tree against a decoded [`Value`].
//!
//! The expected side drives the walk. Every node first goes through the null
//! entry rules, then is dispatched on its variant:
//!
//! - literals compare structurally (`scalar`, `collections`)
//! - pattern and tolerance matchers inspect the actual value (`matchers`)
//! - `Not`/`And`/`Or` recurse into their operands (`logical`)
//!
//! Store matchers write into the variable store as a side effect, even when
//! an enclosing matcher later discards the result.

mod collections;
mod dispatch;
mod logical;
mod matchers;
mod scalar;

pub use dispatch::Rule;

use crate::config::{ErrorPolicy, TimeFormat};
use crate::error::{CompareError, VariableError};
use crate::expected::Expected;
use crate::substitution::Shortcuts;
use crate::value::Value;
use crate::vars::VariableStore;
use scalar::Number;
use tracing::trace;

/// Comparison context: the variable store plus the settings of the engine
/// that runs the comparison.
pub struct Comparator<'a> {
    vars: &'a mut VariableStore,
    shortcuts: &'a Shortcuts,
    time_format: &'a TimeFormat,
    policy: ErrorPolicy,
}

impl<'a> Comparator<'a> {
    pub fn new(
        vars: &'a mut VariableStore,
        shortcuts: &'a Shortcuts,
        time_format: &'a TimeFormat,
        policy: ErrorPolicy,
    ) -> Self {
        Self {
            vars,
            shortcuts,
            time_format,
            policy,
        }
    }

    pub fn policy(&self) -> ErrorPolicy {
        self.policy
    }

    pub fn time_format(&self) -> &TimeFormat {
        self.time_format
    }

    pub fn variables(&self) -> &VariableStore {
        &*self.vars
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut *self.vars
    }

    /// Substitute load tokens with stored variables.
    pub fn replace_vars(&self, template: &str) -> Result<String, VariableError> {
        self.shortcuts.replace(template, &*self.vars)
    }

    /// Compare `expected` against `actual`, recursing through nested nodes.
    pub fn compare(&mut self, expected: &Expected, actual: &Value) -> Result<(), CompareError> {
        let rule = Rule::select(expected);
        trace!(rule = rule.name(), actual = %actual.kind(), "comparing");

        if actual.is_null() {
            return match expected {
                Expected::Null => Ok(()),
                _ => Err(CompareError::ExpectedValueGotNil(expected.to_string())),
            };
        }

        match expected {
            Expected::Null => Err(CompareError::ExpectedNilGotValue(actual.to_string())),
            Expected::Bool(b) => scalar::compare_bool(*b, actual),
            Expected::Int(i) => scalar::compare_number(Number::Int(*i), actual),
            Expected::Uint(u) => scalar::compare_number(Number::Uint(*u), actual),
            Expected::Float(x) => scalar::compare_number(Number::Float(*x), actual),
            Expected::String(s) => self.compare_string(s, actual),
            Expected::Seq(items) => self.compare_seq(items, actual),
            Expected::Map(entries) => self.compare_map(entries, actual, false),
            Expected::Ignore => Ok(()),
            Expected::StoreVar(name) => self.store(name, actual),
            Expected::LoadVar(name) => self.load(name, actual),
            Expected::Regex(pattern) => self.compare_regex(pattern, actual),
            Expected::RegexCapture { pattern, vars } => self.capture(pattern, vars, actual),
            Expected::NumberDelta { value, delta } => {
                matchers::compare_number_delta(*value, *delta, actual)
            }
            Expected::TimeDelta {
                instant,
                tolerance,
                format,
            } => self.compare_time_delta(instant, tolerance, format.as_ref(), actual),
            Expected::Unordered(items) => self.compare_unordered(items, actual),
            Expected::Partial(entries) => self.compare_map(entries, actual, true),
            Expected::Not(inner) => self.compare_not(inner, actual),
            Expected::And(items) => self.compare_and(items, actual),
            Expected::Or(items) => self.compare_or(items, actual),
            Expected::Custom(matcher) => matcher.compare(self, actual),
        }
    }

    /// Whole-string store tokens capture the actual value whatever its kind;
    /// other strings are compared after load-token substitution.
    fn compare_string(&mut self, expected: &str, actual: &Value) -> Result<(), CompareError> {
        if let Some(name) = self.shortcuts.store_token(expected) {
            return self.store(name, actual);
        }
        let actual = scalar::expect_string(actual)?;
        let expected = self.replace_vars(expected)?;
        scalar::compare_str(&expected, actual)
    }

    fn store(&mut self, name: &str, actual: &Value) -> Result<(), CompareError> {
        self.vars.set(name, actual.clone())?;
        Ok(())
    }

    fn load(&mut self, name: &str, actual: &Value) -> Result<(), CompareError> {
        let stored = self
            .vars
            .get(name)
            .map_or(Expected::Null, Expected::from);
        self.compare(&stored, actual)
    }
}
