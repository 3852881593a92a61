//! Logical combinators: NOT, AND, OR.

use super::Comparator;
use crate::error::CompareError;
use crate::expected::Expected;
use crate::value::Value;

impl Comparator<'_> {
    /// Inverts the inner result. Side effects of the inner comparison stay.
    pub(super) fn compare_not(&mut self, inner: &Expected, actual: &Value) -> Result<(), CompareError> {
        match self.compare(inner, actual) {
            Ok(()) => Err(CompareError::Negation {
                expected: inner.to_string(),
                actual: actual.to_string(),
            }),
            Err(_) => Ok(()),
        }
    }

    /// First failure wins.
    pub(super) fn compare_and(&mut self, items: &[Expected], actual: &Value) -> Result<(), CompareError> {
        for item in items {
            self.compare(item, actual)?;
        }
        Ok(())
    }

    /// Every alternative is evaluated; failures are reported only when none
    /// matched. An empty alternative list never matches.
    pub(super) fn compare_or(&mut self, items: &[Expected], actual: &Value) -> Result<(), CompareError> {
        let mut errors = Vec::with_capacity(items.len());
        for item in items {
            if let Err(err) = self.compare(item, actual) {
                errors.push(err);
            }
        }
        if errors.len() < items.len() {
            return Ok(());
        }
        match errors.len() {
            1 => Err(errors.remove(0)),
            _ => Err(CompareError::Multiple(errors)),
        }
    }
}
