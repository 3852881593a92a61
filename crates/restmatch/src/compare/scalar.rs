//! Scalar literal comparisons.
//!
//! Integers of either signedness compare exactly. As soon as a float is
//! involved on either side, both sides are widened to `f64` and compared with
//! `==`. The mismatch category names the actual kind.

use crate::error::CompareError;
use crate::value::Value;
use std::fmt;

/// Kinds accepted by numeric comparisons.
pub(super) const NUMBER_KINDS: &str = "int, uint or float";

#[derive(Debug, Clone, Copy)]
pub(super) enum Number {
    Int(i64),
    Uint(u64),
    Float(f64),
}

impl Number {
    pub(super) fn from_value(value: &Value) -> Option<Number> {
        match value {
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Uint(u) => Some(Number::Uint(*u)),
            Value::Float(x) => Some(Number::Float(*x)),
            _ => None,
        }
    }

    fn exact(self) -> Option<i128> {
        match self {
            Number::Int(i) => Some(i128::from(i)),
            Number::Uint(u) => Some(i128::from(u)),
            Number::Float(_) => None,
        }
    }

    fn widen(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Uint(u) => u as f64,
            Number::Float(x) => x,
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Number::Int(i) => write!(f, "{i}"),
            Number::Uint(u) => write!(f, "{u}"),
            Number::Float(x) => write!(f, "{x}"),
        }
    }
}

pub(super) fn expect_string(actual: &Value) -> Result<&str, CompareError> {
    actual.as_str().ok_or(CompareError::DifferentKinds {
        expected: "string",
        actual: actual.kind(),
    })
}

pub(super) fn compare_str(expected: &str, actual: &str) -> Result<(), CompareError> {
    if expected == actual {
        return Ok(());
    }
    Err(CompareError::StringMismatch {
        expected: expected.to_string(),
        actual: actual.to_string(),
    })
}

pub(super) fn compare_bool(expected: bool, actual: &Value) -> Result<(), CompareError> {
    match actual {
        Value::Bool(b) if *b == expected => Ok(()),
        Value::Bool(b) => Err(CompareError::BoolMismatch {
            expected,
            actual: *b,
        }),
        other => Err(CompareError::DifferentKinds {
            expected: "bool",
            actual: other.kind(),
        }),
    }
}

pub(super) fn compare_number(expected: Number, actual: &Value) -> Result<(), CompareError> {
    let Some(number) = Number::from_value(actual) else {
        return Err(CompareError::DifferentKinds {
            expected: NUMBER_KINDS,
            actual: actual.kind(),
        });
    };

    let equal = match (expected.exact(), number.exact()) {
        (Some(e), Some(a)) => e == a,
        _ => expected.widen() == number.widen(),
    };
    if equal {
        return Ok(());
    }

    let (expected, actual) = (expected.to_string(), number.to_string());
    Err(match number {
        Number::Int(_) => CompareError::IntegerMismatch { expected, actual },
        Number::Uint(_) => CompareError::UnsignedMismatch { expected, actual },
        Number::Float(_) => CompareError::FloatMismatch { expected, actual },
    })
}
