//! Pattern and tolerance matchers.

use super::scalar::{expect_string, NUMBER_KINDS};
use super::Comparator;
use crate::config::TimeFormat;
use crate::error::CompareError;
use crate::expected::format_duration;
use crate::value::Value;
use chrono::{DateTime, Duration, FixedOffset};
use regex::Regex;
use std::collections::BTreeMap;

pub(super) fn compare_number_delta(
    value: f64,
    delta: f64,
    actual: &Value,
) -> Result<(), CompareError> {
    let Some(number) = actual.as_f64() else {
        return Err(CompareError::DifferentKinds {
            expected: NUMBER_KINDS,
            actual: actual.kind(),
        });
    };

    let difference = (value - number).abs();
    if difference <= delta {
        return Ok(());
    }
    Err(CompareError::ToleranceExceeded {
        expected: value.to_string(),
        actual: actual.to_string(),
        tolerance: delta.to_string(),
        difference: difference.to_string(),
    })
}

impl Comparator<'_> {
    /// Load tokens in the pattern are substituted before compiling.
    pub(super) fn compare_regex(&mut self, pattern: &str, actual: &Value) -> Result<(), CompareError> {
        let text = expect_string(actual)?;
        let pattern = self.replace_vars(pattern)?;
        let re = Regex::new(&pattern)?;
        if re.is_match(text) {
            return Ok(());
        }
        Err(CompareError::RegexNoMatch {
            pattern,
            actual: text.to_string(),
        })
    }

    /// Store capture groups in ascending group order. Optional groups that
    /// did not participate are stored as empty strings.
    pub(super) fn capture(
        &mut self,
        pattern: &str,
        vars: &BTreeMap<usize, String>,
        actual: &Value,
    ) -> Result<(), CompareError> {
        let text = expect_string(actual)?;
        let re = Regex::new(pattern)?;
        let Some(caps) = re.captures(text) else {
            return Err(CompareError::RegexNoMatch {
                pattern: pattern.to_string(),
                actual: text.to_string(),
            });
        };

        let groups = caps.len();
        for (&index, name) in vars {
            if index >= groups {
                return Err(CompareError::GroupIndexOverflow { index, groups });
            }
            let captured = caps.get(index).map_or("", |m| m.as_str());
            self.vars.set(name, captured)?;
        }
        Ok(())
    }

    pub(super) fn compare_time_delta(
        &mut self,
        instant: &DateTime<FixedOffset>,
        tolerance: &Duration,
        format: Option<&TimeFormat>,
        actual: &Value,
    ) -> Result<(), CompareError> {
        let text = expect_string(actual)?;
        let format = format.unwrap_or(self.time_format);
        let parsed = format.parse(text).map_err(CompareError::InvalidTime)?;

        let difference = instant.signed_duration_since(parsed);
        if difference >= -*tolerance && difference <= *tolerance {
            return Ok(());
        }
        Err(CompareError::ToleranceExceeded {
            expected: instant.to_rfc3339(),
            actual: parsed.to_rfc3339(),
            tolerance: format_duration(tolerance),
            difference: format_duration(&difference),
        })
    }
}
