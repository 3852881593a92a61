//! Expected descriptions.
//!
//! An [`Expected`] tree mirrors the shape of a decoded [`Value`] and may embed
//! matchers at any depth. Literals compare structurally; matchers decide for
//! themselves how (and whether) to inspect the actual value.
//!
//! ```
//! use restmatch::Expected;
//!
//! let body = Expected::map([
//!     ("id", Expected::store("userid")),
//!     ("name", Expected::from("John")),
//!     ("age", Expected::number_delta(50.0, 2.0)),
//!     ("pets", Expected::unordered(["cat", "dog"])),
//! ]);
//! assert_eq!(
//!     body.to_string(),
//!     "{age: <number 50 +/- 2>, id: <store userid>, name: John, pets: <unordered [cat, dog]>}"
//! );
//! ```

use crate::compare::Comparator;
use crate::config::TimeFormat;
use crate::error::CompareError;
use crate::value::{write_joined, Value};
use chrono::{DateTime, Duration, FixedOffset, TimeZone};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// A user-defined comparison.
///
/// Implementors receive the running [`Comparator`], so they can recurse into
/// nested expectations, substitute load tokens or touch the variable store.
pub trait Matcher: fmt::Debug + fmt::Display + Send + Sync {
    fn compare(&self, cmp: &mut Comparator<'_>, actual: &Value) -> Result<(), CompareError>;
}

/// Expected side of a comparison.
#[derive(Debug, Clone)]
pub enum Expected {
    Null,
    Bool(bool),
    Int(i64),
    Uint(u64),
    Float(f64),
    /// Literal string. May be a whole-string store token or contain load
    /// tokens.
    String(String),
    /// Ordered sequence of equal length
    Seq(Vec<Expected>),
    /// Mapping with exactly these keys
    Map(BTreeMap<String, Expected>),

    /// Matches anything
    Ignore,
    /// Matches anything and stores the actual value
    StoreVar(String),
    /// Compares the stored value against the actual value
    LoadVar(String),
    /// Actual string must match; load tokens in the pattern are substituted
    Regex(String),
    /// Actual string must match; group index to variable name
    RegexCapture {
        pattern: String,
        vars: BTreeMap<usize, String>,
    },
    /// Actual number within `delta` of `value`
    NumberDelta { value: f64, delta: f64 },
    /// Actual timestamp string within `tolerance` of `instant`
    TimeDelta {
        instant: DateTime<FixedOffset>,
        tolerance: Duration,
        format: Option<TimeFormat>,
    },
    /// Sequence of equal length, any order
    Unordered(Vec<Expected>),
    /// Mapping containing at least these keys
    Partial(BTreeMap<String, Expected>),
    Not(Box<Expected>),
    And(Vec<Expected>),
    Or(Vec<Expected>),
    Custom(Arc<dyn Matcher>),
}

fn collect_map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> BTreeMap<String, Expected>
where
    K: Into<String>,
    V: Into<Expected>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}

fn collect_seq<T: Into<Expected>>(items: impl IntoIterator<Item = T>) -> Vec<Expected> {
    items.into_iter().map(Into::into).collect()
}

impl Expected {
    pub fn map<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Expected>,
    {
        Expected::Map(collect_map(entries))
    }

    pub fn partial<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Expected>,
    {
        Expected::Partial(collect_map(entries))
    }

    pub fn seq<T: Into<Expected>>(items: impl IntoIterator<Item = T>) -> Self {
        Expected::Seq(collect_seq(items))
    }

    pub fn unordered<T: Into<Expected>>(items: impl IntoIterator<Item = T>) -> Self {
        Expected::Unordered(collect_seq(items))
    }

    pub fn ignore() -> Self {
        Expected::Ignore
    }

    pub fn store(name: impl Into<String>) -> Self {
        Expected::StoreVar(name.into())
    }

    pub fn load(name: impl Into<String>) -> Self {
        Expected::LoadVar(name.into())
    }

    pub fn regex(pattern: impl Into<String>) -> Self {
        Expected::Regex(pattern.into())
    }

    /// Match a regexp and store capture groups. Group 0 is the full match.
    pub fn capture<N: Into<String>>(
        pattern: impl Into<String>,
        vars: impl IntoIterator<Item = (usize, N)>,
    ) -> Self {
        Expected::RegexCapture {
            pattern: pattern.into(),
            vars: vars.into_iter().map(|(i, n)| (i, n.into())).collect(),
        }
    }

    pub fn number_delta(value: f64, delta: f64) -> Self {
        Expected::NumberDelta { value, delta }
    }

    /// Timestamp within `tolerance`, parsed with the engine's time format.
    pub fn time_delta<Tz: TimeZone>(instant: DateTime<Tz>, tolerance: Duration) -> Self {
        Expected::TimeDelta {
            instant: instant.fixed_offset(),
            tolerance,
            format: None,
        }
    }

    pub fn time_delta_with_format<Tz: TimeZone>(
        instant: DateTime<Tz>,
        tolerance: Duration,
        format: TimeFormat,
    ) -> Self {
        Expected::TimeDelta {
            instant: instant.fixed_offset(),
            tolerance,
            format: Some(format),
        }
    }

    pub fn not(inner: impl Into<Expected>) -> Self {
        Expected::Not(Box::new(inner.into()))
    }

    pub fn and<T: Into<Expected>>(items: impl IntoIterator<Item = T>) -> Self {
        Expected::And(collect_seq(items))
    }

    pub fn or<T: Into<Expected>>(items: impl IntoIterator<Item = T>) -> Self {
        Expected::Or(collect_seq(items))
    }

    pub fn custom(matcher: impl Matcher + 'static) -> Self {
        Expected::Custom(Arc::new(matcher))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Expected::Null)
    }
}

/// Render a duration as signed seconds, e.g. `1.5s` or `-0.25s`.
pub(crate) fn format_duration(duration: &Duration) -> String {
    let micros = duration.num_microseconds().unwrap_or(i64::MAX);
    let sign = if micros < 0 { "-" } else { "" };
    let micros = micros.unsigned_abs();
    let (secs, frac) = (micros / 1_000_000, micros % 1_000_000);
    if frac == 0 {
        return format!("{sign}{secs}s");
    }
    let frac = format!("{frac:06}");
    format!("{sign}{secs}.{}s", frac.trim_end_matches('0'))
}

struct Bracketed<'a>(&'a [Expected]);

impl fmt::Display for Bracketed<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        write_joined(f, self.0)?;
        f.write_str("]")
    }
}

struct Braced<'a>(&'a BTreeMap<String, Expected>);

impl fmt::Display for Braced<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        write_joined(f, self.0.iter().map(|(k, v)| format!("{k}: {v}")))?;
        f.write_str("}")
    }
}

impl fmt::Display for Expected {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expected::Null => f.write_str("null"),
            Expected::Bool(b) => write!(f, "{b}"),
            Expected::Int(i) => write!(f, "{i}"),
            Expected::Uint(u) => write!(f, "{u}"),
            Expected::Float(x) => write!(f, "{x}"),
            Expected::String(s) => f.write_str(s),
            Expected::Seq(items) => write!(f, "{}", Bracketed(items)),
            Expected::Map(entries) => write!(f, "{}", Braced(entries)),
            Expected::Ignore => f.write_str("<ignore>"),
            Expected::StoreVar(name) => write!(f, "<store {name}>"),
            Expected::LoadVar(name) => write!(f, "<load {name}>"),
            Expected::Regex(pattern) => write!(f, "<regexp {pattern}>"),
            Expected::RegexCapture { pattern, vars } => {
                write!(f, "<regexp {pattern} capturing ")?;
                write_joined(f, vars.iter().map(|(i, n)| format!("{i}: {n}")))?;
                f.write_str(">")
            }
            Expected::NumberDelta { value, delta } => write!(f, "<number {value} +/- {delta}>"),
            Expected::TimeDelta {
                instant, tolerance, ..
            } => write!(
                f,
                "<time {} +/- {}>",
                instant.to_rfc3339(),
                format_duration(tolerance)
            ),
            Expected::Unordered(items) => write!(f, "<unordered {}>", Bracketed(items)),
            Expected::Partial(entries) => write!(f, "<partial {}>", Braced(entries)),
            Expected::Not(inner) => write!(f, "<not {inner}>"),
            Expected::And(items) => write!(f, "<and {}>", Bracketed(items)),
            Expected::Or(items) => write!(f, "<or {}>", Bracketed(items)),
            Expected::Custom(matcher) => write!(f, "{matcher}"),
        }
    }
}

impl From<Value> for Expected {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => Expected::Null,
            Value::Bool(b) => Expected::Bool(b),
            Value::Int(i) => Expected::Int(i),
            Value::Uint(u) => Expected::Uint(u),
            Value::Float(x) => Expected::Float(x),
            Value::String(s) => Expected::String(s),
            Value::Seq(items) => Expected::Seq(collect_seq(items)),
            Value::Map(entries) => Expected::Map(collect_map(entries)),
        }
    }
}

impl From<&Value> for Expected {
    fn from(value: &Value) -> Self {
        Expected::from(value.clone())
    }
}

impl From<serde_json::Value> for Expected {
    fn from(value: serde_json::Value) -> Self {
        Expected::from(Value::from(value))
    }
}

macro_rules! expected_from_scalar {
    ($variant:ident, $target:ty, $($source:ty),+) => {
        $(
            impl From<$source> for Expected {
                fn from(v: $source) -> Self {
                    Expected::$variant(<$target>::from(v))
                }
            }
        )+
    };
}

expected_from_scalar!(Int, i64, i8, i16, i32, i64);
expected_from_scalar!(Uint, u64, u8, u16, u32, u64);
expected_from_scalar!(Float, f64, f32, f64);

impl From<bool> for Expected {
    fn from(v: bool) -> Self {
        Expected::Bool(v)
    }
}

impl From<&str> for Expected {
    fn from(v: &str) -> Self {
        Expected::String(v.to_string())
    }
}

impl From<String> for Expected {
    fn from(v: String) -> Self {
        Expected::String(v)
    }
}

impl<T: Into<Expected>> From<Vec<T>> for Expected {
    fn from(items: Vec<T>) -> Self {
        Expected::Seq(collect_seq(items))
    }
}

impl<T: Into<Expected>> From<BTreeMap<String, T>> for Expected {
    fn from(entries: BTreeMap<String, T>) -> Self {
        Expected::Map(collect_map(entries))
    }
}

impl<T: Into<Expected>> From<Option<T>> for Expected {
    fn from(v: Option<T>) -> Self {
        v.map_or(Expected::Null, Into::into)
    }
}
