//! Declarative test cases.
//!
//! ```
//! use restmatch::{Expected, TestCase, TestRequest, TestResponse};
//!
//! let case = TestCase::new(
//!     TestRequest::get("/api/cat/_catid_").header("Accept", "application/json"),
//!     TestResponse::status(200).body(Expected::partial([("name", "Pepper the cat")])),
//! );
//! assert_eq!(case.request.method, "GET");
//! ```

use crate::codec::{Marshaler, Unmarshaler};
use crate::expected::Expected;
use crate::value::Value;
use bytes::Bytes;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct TestCase {
    pub request: TestRequest,
    pub response: TestResponse,
}

impl TestCase {
    pub fn new(request: TestRequest, response: TestResponse) -> Self {
        Self { request, response }
    }
}

/// Request body as declared in a test case.
#[derive(Debug, Clone, Default)]
pub enum RequestBody {
    #[default]
    Empty,
    /// Encoded with the request marshaler (or the engine default)
    Value(Value),
    /// Sent as-is after load-token substitution
    Text(String),
    /// Sent as-is
    Bytes(Bytes),
}

#[derive(Clone, Default)]
pub struct TestRequest {
    pub method: String,
    pub path: String,
    /// Header name to values. Replaces same-named default headers.
    pub headers: BTreeMap<String, Vec<String>>,
    pub body: RequestBody,
    /// Overrides the engine marshaler for this request
    pub marshaler: Option<Arc<dyn Marshaler>>,
    pub no_path_substitution: bool,
    pub no_header_substitution: bool,
    pub no_body_substitution: bool,
}

impl fmt::Debug for TestRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestRequest")
            .field("method", &self.method)
            .field("path", &self.path)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("marshaler", &self.marshaler.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl TestRequest {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new("GET", path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new("POST", path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new("PUT", path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new("PATCH", path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new("DELETE", path)
    }

    /// Append a header value.
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .entry(name.into())
            .or_default()
            .push(value.into());
        self
    }

    /// Structured body, encoded by the marshaler.
    pub fn json(mut self, body: impl Into<Value>) -> Self {
        self.body = RequestBody::Value(body.into());
        self
    }

    pub fn text(mut self, body: impl Into<String>) -> Self {
        self.body = RequestBody::Text(body.into());
        self
    }

    pub fn bytes(mut self, body: impl Into<Bytes>) -> Self {
        self.body = RequestBody::Bytes(body.into());
        self
    }

    pub fn marshaler(mut self, marshaler: impl Marshaler + 'static) -> Self {
        self.marshaler = Some(Arc::new(marshaler));
        self
    }

    pub fn no_path_substitution(mut self) -> Self {
        self.no_path_substitution = true;
        self
    }

    pub fn no_header_substitution(mut self) -> Self {
        self.no_header_substitution = true;
        self
    }

    pub fn no_body_substitution(mut self) -> Self {
        self.no_body_substitution = true;
        self
    }
}

/// Expected response body.
#[derive(Debug, Clone)]
pub enum ResponseBody {
    /// Decode with the unmarshaler, then compare
    Decoded(Expected),
    /// Compare the body text as a string
    Raw(Expected),
}

impl Default for ResponseBody {
    fn default() -> Self {
        ResponseBody::Decoded(Expected::Null)
    }
}

#[derive(Clone)]
pub struct TestResponse {
    /// Compared against the status code as an integer
    pub code: Expected,
    /// Compared against the response headers as a mapping of lowercase
    /// names to lists of values
    pub headers: Option<Expected>,
    pub body: ResponseBody,
    /// Overrides the engine unmarshaler for this response
    pub unmarshaler: Option<Arc<dyn Unmarshaler>>,
}

impl Default for TestResponse {
    fn default() -> Self {
        Self {
            code: Expected::Ignore,
            headers: None,
            body: ResponseBody::default(),
            unmarshaler: None,
        }
    }
}

impl fmt::Debug for TestResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TestResponse")
            .field("code", &self.code)
            .field("headers", &self.headers)
            .field("body", &self.body)
            .field("unmarshaler", &self.unmarshaler.as_ref().map(|_| "custom"))
            .finish()
    }
}

impl TestResponse {
    pub fn status(code: u16) -> Self {
        Self::code(code)
    }

    /// Status code matched by an arbitrary expectation, e.g.
    /// `Expected::or([200, 201])`.
    pub fn code(code: impl Into<Expected>) -> Self {
        Self {
            code: code.into(),
            ..Default::default()
        }
    }

    /// Accept any status code.
    pub fn any_status() -> Self {
        Self::default()
    }

    pub fn headers(mut self, headers: impl Into<Expected>) -> Self {
        self.headers = Some(headers.into());
        self
    }

    pub fn body(mut self, body: impl Into<Expected>) -> Self {
        self.body = ResponseBody::Decoded(body.into());
        self
    }

    pub fn raw_body(mut self, body: impl Into<Expected>) -> Self {
        self.body = ResponseBody::Raw(body.into());
        self
    }

    pub fn unmarshaler(mut self, unmarshaler: impl Unmarshaler + 'static) -> Self {
        self.unmarshaler = Some(Arc::new(unmarshaler));
        self
    }
}
