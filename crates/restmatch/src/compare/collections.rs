//! Sequence and mapping comparisons.

use super::Comparator;
use crate::config::ErrorPolicy;
use crate::error::CompareError;
use crate::expected::Expected;
use crate::value::Value;
use std::collections::BTreeMap;

fn expect_seq(actual: &Value) -> Result<&[Value], CompareError> {
    match actual {
        Value::Seq(items) => Ok(items),
        other => Err(CompareError::DifferentKinds {
            expected: "sequence",
            actual: other.kind(),
        }),
    }
}

fn check_len(expected: &[Expected], actual: &[Value]) -> Result<(), CompareError> {
    if expected.len() == actual.len() {
        return Ok(());
    }
    Err(CompareError::DifferentSizes {
        shape: "slice",
        expected: expected.len(),
        actual: actual.len(),
        expected_value: Expected::Seq(expected.to_vec()).to_string(),
        actual_value: Value::Seq(actual.to_vec()).to_string(),
    })
}

impl Comparator<'_> {
    fn fail_fast(&self) -> bool {
        self.policy == ErrorPolicy::FailFast
    }

    pub(super) fn compare_seq(
        &mut self,
        expected: &[Expected],
        actual: &Value,
    ) -> Result<(), CompareError> {
        let items = expect_seq(actual)?;
        check_len(expected, items)?;

        let mut errors = Vec::new();
        for (index, (exp, act)) in expected.iter().zip(items).enumerate() {
            if let Err(source) = self.compare(exp, act) {
                errors.push(CompareError::SliceElementMismatch {
                    index,
                    source: Box::new(source),
                });
                if self.fail_fast() {
                    break;
                }
            }
        }
        CompareError::collect(errors)
    }

    /// Greedy matching: each expected element consumes the first remaining
    /// actual element it matches, scanning in index order.
    pub(super) fn compare_unordered(
        &mut self,
        expected: &[Expected],
        actual: &Value,
    ) -> Result<(), CompareError> {
        let items = expect_seq(actual)?;
        check_len(expected, items)?;

        let mut remaining: Vec<usize> = (0..items.len()).collect();
        let mut errors = Vec::new();

        for (index, exp) in expected.iter().enumerate() {
            let found = remaining
                .iter()
                .position(|&candidate| self.compare(exp, &items[candidate]).is_ok());
            match found {
                Some(position) => {
                    remaining.remove(position);
                }
                None => {
                    errors.push(CompareError::ElementNotFound {
                        element: exp.to_string(),
                        index,
                    });
                    if self.fail_fast() {
                        return CompareError::collect(errors);
                    }
                }
            }
        }

        if !remaining.is_empty() {
            errors.push(CompareError::UnmatchedActualIndexes(remaining));
        }
        CompareError::collect(errors)
    }

    /// Compare mapping entries. Unless `partial`, key counts must match too.
    pub(super) fn compare_map(
        &mut self,
        expected: &BTreeMap<String, Expected>,
        actual: &Value,
        partial: bool,
    ) -> Result<(), CompareError> {
        let Value::Map(entries) = actual else {
            return Err(CompareError::DifferentKinds {
                expected: "mapping",
                actual: actual.kind(),
            });
        };

        if !partial && expected.len() != entries.len() {
            return Err(CompareError::DifferentSizes {
                shape: "map",
                expected: expected.len(),
                actual: entries.len(),
                expected_value: Expected::Map(expected.clone()).to_string(),
                actual_value: actual.to_string(),
            });
        }

        let mut errors = Vec::new();
        for (key, exp) in expected {
            let result = match entries.get(key) {
                None => Err(CompareError::KeyNotFound(key.clone())),
                Some(act) => self.compare(exp, act).map_err(|source| {
                    CompareError::MapElementMismatch {
                        key: key.clone(),
                        source: Box::new(source),
                    }
                }),
            };
            if let Err(err) = result {
                errors.push(err);
                if self.fail_fast() {
                    break;
                }
            }
        }
        CompareError::collect(errors)
    }
}

#[cfg(test)]
mod tests {
    use crate::compare::Comparator;
    use crate::config::{ErrorPolicy, TimeFormat};
    use crate::error::CompareError;
    use crate::expected::Expected;
    use crate::substitution::Shortcuts;
    use crate::value::Value;
    use crate::vars::VariableStore;
    use serde_json::json;

    fn compare_with(
        policy: ErrorPolicy,
        expected: Expected,
        actual: impl Into<Value>,
    ) -> Result<(), CompareError> {
        let mut vars = VariableStore::new();
        let shortcuts = Shortcuts::default();
        let time_format = TimeFormat::default();
        Comparator::new(&mut vars, &shortcuts, &time_format, policy)
            .compare(&expected, &actual.into())
    }

    fn compare(expected: Expected, actual: impl Into<Value>) -> Result<(), CompareError> {
        compare_with(ErrorPolicy::Aggregate, expected, actual)
    }

    #[test]
    fn test_ordered_sequence() {
        assert!(compare(Expected::seq(["A", "B"]), vec!["A", "B"]).is_ok());

        let err = compare(Expected::seq(["A", "B"]), vec!["B", "A"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "slice element 0 does not match. strings do not match. Expected 'A', got 'B'\n\
             slice element 1 does not match. strings do not match. Expected 'B', got 'A'"
        );
    }

    #[test]
    fn test_ordered_sequence_fail_fast() {
        let err =
            compare_with(ErrorPolicy::FailFast, Expected::seq(["A", "B"]), vec!["B", "A"])
                .unwrap_err();
        assert!(matches!(
            err,
            CompareError::SliceElementMismatch { index: 0, .. }
        ));
    }

    #[test]
    fn test_sequence_sizes() {
        let err = compare(Expected::seq([1, 2, 3]), vec![1, 2]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "different slice sizes. Expected 3, got 2. Expected [1, 2, 3] got [1, 2]"
        );
    }

    #[test]
    fn test_sequence_against_mapping() {
        let err = compare(Expected::seq([1]), json!({"a": 1})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "different kinds. Expected sequence, got mapping"
        );
    }

    #[test]
    fn test_unordered_any_permutation() {
        let expected = Expected::unordered([
            Expected::from("Doe"),
            Expected::from(99),
            Expected::from("John"),
        ]);
        assert!(compare(expected.clone(), json!(["John", "Doe", 99])).is_ok());
        assert!(compare(expected.clone(), json!([99, "John", "Doe"])).is_ok());
        assert!(compare(expected, json!(["Doe", 99, "John"])).is_ok());
    }

    #[test]
    fn test_unordered_accumulates_everything() {
        let err = compare(Expected::unordered(["B", "C", "E"]), vec!["A", "B", "C"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected element E at index 2 not found\nactual elements at indexes [0] not found"
        );

        let err = compare(Expected::unordered(["X", "B", "Y"]), vec!["A", "B", "C"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected element X at index 0 not found\n\
             expected element Y at index 2 not found\n\
             actual elements at indexes [0, 2] not found"
        );
    }

    #[test]
    fn test_unordered_fail_fast_returns_first_missing() {
        let err = compare_with(
            ErrorPolicy::FailFast,
            Expected::unordered(["X", "B", "Y"]),
            vec!["A", "B", "C"],
        )
        .unwrap_err();
        assert_eq!(err.to_string(), "expected element X at index 0 not found");
    }

    #[test]
    fn test_unordered_consumes_matched_elements() {
        let err = compare(Expected::unordered(["A", "A"]), vec!["A", "B"]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "expected element A at index 1 not found\nactual elements at indexes [1] not found"
        );
    }

    #[test]
    fn test_partial_mapping_ignores_extra_keys() {
        let actual = json!({"name": "John", "Age": 51});
        assert!(compare(Expected::partial([("name", "John")]), actual.clone()).is_ok());

        let err = compare(Expected::map([("name", "John")]), actual).unwrap_err();
        assert_eq!(
            err.to_string(),
            "different map sizes. Expected 1, got 2. Expected {name: John} got {Age: 51, name: John}"
        );
    }

    #[test]
    fn test_mapping_key_errors() {
        let expected = Expected::map([("a", 1), ("b", 2)]);
        let err = compare(expected, json!({"a": 3, "c": 2})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "map element [a] does not match. integers do not match. Expected 1, got 3\n\
             expected key b not found"
        );
    }

    #[test]
    fn test_mapping_fail_fast() {
        let expected = Expected::partial([("a", 1), ("b", 2)]);
        let err = compare_with(ErrorPolicy::FailFast, expected, json!({"a": 3})).unwrap_err();
        assert!(matches!(err, CompareError::MapElementMismatch { ref key, .. } if key == "a"));
    }

    #[test]
    fn test_nested_path() {
        let expected = Expected::map([(
            "pets",
            Expected::seq([Expected::partial([("name", "Pepper")])]),
        )]);
        let err = compare(expected, json!({"pets": [{"name": "Salt"}]})).unwrap_err();
        assert_eq!(
            err.to_string(),
            "map element [pets] does not match. slice element 0 does not match. \
             map element [name] does not match. strings do not match. Expected 'Pepper', got 'Salt'"
        );
    }
}
