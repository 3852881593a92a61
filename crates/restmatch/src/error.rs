//! Error types for variables, comparison and test case execution.

use crate::value::Kind;
use std::fmt;

/// Errors raised by the variable store and load-token substitution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VariableError {
    #[error("invalid variable name {0}")]
    InvalidName(String),

    #[error("variable {0} is not defined")]
    Undefined(String),

    #[error("variable {name} of type {kind} cannot be used inside a string")]
    UnsupportedType { name: String, kind: Kind },
}

/// Errors raised when reconfiguring the store/load shortcut bounds.
#[derive(Debug, thiserror::Error)]
pub enum ShortcutError {
    #[error("invalid prefix, cannot be empty")]
    EmptyPrefix,

    #[error("invalid suffix, cannot be empty")]
    EmptySuffix,

    #[error(transparent)]
    Regex(#[from] regex::Error),
}

/// A single comparison failure, possibly wrapping nested failures.
///
/// Nested failures carry their position so that the rendered message reads as
/// a path to the mismatch, e.g.
/// `map element [pets] does not match. slice element 0 does not match. ...`.
#[derive(Debug, thiserror::Error)]
pub enum CompareError {
    #[error("expected null but got {0}")]
    ExpectedNilGotValue(String),

    #[error("expected {0} but got null")]
    ExpectedValueGotNil(String),

    #[error("different kinds. Expected {expected}, got {actual}")]
    DifferentKinds { expected: &'static str, actual: Kind },

    #[error(
        "different {shape} sizes. Expected {expected}, got {actual}. Expected {expected_value} got {actual_value}"
    )]
    DifferentSizes {
        shape: &'static str,
        expected: usize,
        actual: usize,
        expected_value: String,
        actual_value: String,
    },

    #[error("expected key {0} not found")]
    KeyNotFound(String),

    #[error("slice element {index} does not match. {source}")]
    SliceElementMismatch {
        index: usize,
        source: Box<CompareError>,
    },

    #[error("map element [{key}] does not match. {source}")]
    MapElementMismatch {
        key: String,
        source: Box<CompareError>,
    },

    #[error("expected element {element} at index {index} not found")]
    ElementNotFound { element: String, index: usize },

    #[error("actual elements at indexes {0:?} not found")]
    UnmatchedActualIndexes(Vec<usize>),

    #[error("strings do not match. Expected '{expected}', got '{actual}'")]
    StringMismatch { expected: String, actual: String },

    #[error("bools do not match. Expected {expected}, got {actual}")]
    BoolMismatch { expected: bool, actual: bool },

    #[error("integers do not match. Expected {expected}, got {actual}")]
    IntegerMismatch { expected: String, actual: String },

    #[error("unsigned integers do not match. Expected {expected}, got {actual}")]
    UnsignedMismatch { expected: String, actual: String },

    #[error("floats do not match. Expected {expected}, got {actual}")]
    FloatMismatch { expected: String, actual: String },

    #[error(transparent)]
    Regex(#[from] regex::Error),

    #[error("regexp '{pattern}' does not match '{actual}'")]
    RegexNoMatch { pattern: String, actual: String },

    #[error("expected variable index {index} overflow regexp group count of {groups}")]
    GroupIndexOverflow { index: usize, groups: usize },

    #[error("invalid time. {0}")]
    InvalidTime(String),

    #[error(
        "max difference between {expected} and {actual} allowed is {tolerance}, but difference was {difference}"
    )]
    ToleranceExceeded {
        expected: String,
        actual: String,
        tolerance: String,
        difference: String,
    },

    #[error("expected not {expected}, got {actual}")]
    Negation { expected: String, actual: String },

    #[error(transparent)]
    Variable(#[from] VariableError),

    /// Failure reported by a user-defined matcher.
    #[error("{0}")]
    Custom(String),

    #[error("{}", join_lines(.0))]
    Multiple(Vec<CompareError>),
}

impl CompareError {
    /// Turn collected child failures into a single result.
    ///
    /// A lone failure is returned as-is; several are wrapped in `Multiple`.
    pub fn collect(mut errors: Vec<CompareError>) -> Result<(), CompareError> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(CompareError::Multiple(errors)),
        }
    }
}

/// Errors raised by body codecs.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error("only string values can be sent raw, got {0}")]
    NotText(Kind),
}

/// Errors raised by a transport while executing a request.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("service error: {0}")]
    Service(String),

    #[error("failed to read response body: {0}")]
    Body(String),
}

/// Top-level error returned when running a test case.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("no transport configured")]
    NilTransport,

    #[error("nil marshaler")]
    NilMarshaler,

    #[error("nil unmarshaler")]
    NilUnmarshaler,

    #[error("incomplete test case. Missing {0}")]
    IncompleteTestCase(&'static str),

    #[error("failed to build HTTP request. {0}")]
    RequestBuild(String),

    #[error("error while replacing variables in {target}. {source}")]
    Substitution {
        target: &'static str,
        source: VariableError,
    },

    #[error("failed to marshal the test case request body. {0}")]
    Marshal(CodecError),

    #[error("transport failed. {0}")]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Shortcut(#[from] ShortcutError),

    #[error("response code does not match. {0}")]
    ResponseCode(CompareError),

    #[error("response headers do not match. {0}")]
    ResponseHeaders(CompareError),

    #[error(transparent)]
    ResponseBody(CompareError),

    #[error("cannot unmarshal response body. {0}")]
    Unmarshal(CodecError),

    /// Every independent check that failed for one test case.
    #[error("{}", join_lines(.0))]
    Failed(Vec<Error>),
}

impl Error {
    /// The individual failures carried by this error.
    pub fn failures(&self) -> &[Error] {
        match self {
            Error::Failed(failures) => failures,
            other => std::slice::from_ref(other),
        }
    }
}

fn join_lines<T: fmt::Display>(items: &[T]) -> String {
    items
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("\n")
}
