//! Rule selection for expected nodes.

use crate::expected::Expected;

/// Comparison rule applied to one expected node.
///
/// Selection is by variant, so a matcher never falls back to the generic
/// rule of the shape it wraps: `Unordered` is not a `Sequence`, `Partial` is
/// not a `Mapping`, and `StoreVar`/`LoadVar`/`Regex` are not `String`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rule {
    Null,
    Not,
    And,
    Or,
    TimeDelta,
    NumberDelta,
    RegexCapture,
    Unordered,
    Sequence,
    Partial,
    Mapping,
    Ignore,
    StoreVar,
    LoadVar,
    Regex,
    String,
    Bool,
    Number,
    Custom,
}

impl Rule {
    pub fn select(expected: &Expected) -> Rule {
        match expected {
            Expected::Null => Rule::Null,
            Expected::Not(_) => Rule::Not,
            Expected::And(_) => Rule::And,
            Expected::Or(_) => Rule::Or,
            Expected::TimeDelta { .. } => Rule::TimeDelta,
            Expected::NumberDelta { .. } => Rule::NumberDelta,
            Expected::RegexCapture { .. } => Rule::RegexCapture,
            Expected::Unordered(_) => Rule::Unordered,
            Expected::Seq(_) => Rule::Sequence,
            Expected::Partial(_) => Rule::Partial,
            Expected::Map(_) => Rule::Mapping,
            Expected::Ignore => Rule::Ignore,
            Expected::StoreVar(_) => Rule::StoreVar,
            Expected::LoadVar(_) => Rule::LoadVar,
            Expected::Regex(_) => Rule::Regex,
            Expected::String(_) => Rule::String,
            Expected::Bool(_) => Rule::Bool,
            Expected::Int(_) | Expected::Uint(_) | Expected::Float(_) => Rule::Number,
            Expected::Custom(_) => Rule::Custom,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Rule::Null => "null",
            Rule::Not => "not",
            Rule::And => "and",
            Rule::Or => "or",
            Rule::TimeDelta => "time_delta",
            Rule::NumberDelta => "number_delta",
            Rule::RegexCapture => "regexp_capture",
            Rule::Unordered => "unordered_sequence",
            Rule::Sequence => "sequence",
            Rule::Partial => "partial_mapping",
            Rule::Mapping => "mapping",
            Rule::Ignore => "ignore",
            Rule::StoreVar => "store_var",
            Rule::LoadVar => "load_var",
            Rule::Regex => "regexp",
            Rule::String => "string",
            Rule::Bool => "bool",
            Rule::Number => "number",
            Rule::Custom => "custom",
        }
    }
}
