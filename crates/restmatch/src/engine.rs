//! Test case execution.
//!
//! [`Engine::test`] builds the request (substituting load tokens), runs it
//! through the transport, then checks the status code, headers and body
//! independently. Every failing check is reported together.

use crate::case::{RequestBody, ResponseBody, TestCase, TestRequest};
use crate::codec::{JsonCodec, Marshaler, Unmarshaler};
use crate::compare::Comparator;
use crate::config::{EngineConfig, ErrorPolicy, TimeFormat};
use crate::error::{CompareError, Error, ShortcutError, VariableError};
use crate::expected::Expected;
use crate::substitution::{ShortcutBounds, Shortcuts};
use crate::transport::{Transport, TransportRequest, TransportResponse};
use crate::value::Value;
use crate::vars::VariableStore;
use bytes::Bytes;
use hyper::header::{HeaderName, HeaderValue};
use hyper::{HeaderMap, Method, Uri};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub struct Engine {
    transport: Option<Box<dyn Transport>>,
    marshaler: Option<Arc<dyn Marshaler>>,
    unmarshaler: Option<Arc<dyn Unmarshaler>>,
    default_headers: HeaderMap,
    variables: VariableStore,
    shortcuts: Shortcuts,
    time_format: TimeFormat,
    error_policy: ErrorPolicy,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            transport: None,
            marshaler: Some(Arc::new(JsonCodec)),
            unmarshaler: Some(Arc::new(JsonCodec)),
            default_headers: HeaderMap::new(),
            variables: VariableStore::new(),
            shortcuts: Shortcuts::default(),
            time_format: TimeFormat::default(),
            error_policy: ErrorPolicy::default(),
        }
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("has_transport", &self.transport.is_some())
            .field("default_headers", &self.default_headers)
            .field("variables", &self.variables)
            .field("time_format", &self.time_format)
            .field("error_policy", &self.error_policy)
            .finish_non_exhaustive()
    }
}

fn header_name(name: &str) -> Result<HeaderName, Error> {
    HeaderName::from_bytes(name.as_bytes())
        .map_err(|e| Error::RequestBuild(format!("invalid header name {name:?}. {e}")))
}

fn header_value(value: &str) -> Result<HeaderValue, Error> {
    HeaderValue::from_str(value)
        .map_err(|e| Error::RequestBuild(format!("invalid header value {value:?}. {e}")))
}

/// Response headers as a mapping of lowercase names to value lists.
fn headers_to_value(headers: &HeaderMap) -> Value {
    let entries = headers
        .keys()
        .map(|name| {
            let values = headers
                .get_all(name)
                .iter()
                .map(|v| Value::String(String::from_utf8_lossy(v.as_bytes()).into_owned()))
                .collect();
            (name.as_str().to_string(), Value::Seq(values))
        })
        .collect();
    Value::Map(entries)
}

/// Lowercase the top-level keys of an expected header mapping, looking
/// through `Not`, `And` and `Or` wrappers.
fn lowercase_header_keys(expected: &Expected) -> Expected {
    let lower = |entries: &BTreeMap<String, Expected>| {
        entries
            .iter()
            .map(|(k, v)| (k.to_ascii_lowercase(), v.clone()))
            .collect()
    };
    let lower_all = |items: &[Expected]| items.iter().map(lowercase_header_keys).collect();
    match expected {
        Expected::Map(entries) => Expected::Map(lower(entries)),
        Expected::Partial(entries) => Expected::Partial(lower(entries)),
        Expected::Not(inner) => Expected::Not(Box::new(lowercase_header_keys(inner))),
        Expected::And(items) => Expected::And(lower_all(items)),
        Expected::Or(items) => Expected::Or(lower_all(items)),
        other => other.clone(),
    }
}

impl Engine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &EngineConfig) -> Result<Self, Error> {
        let mut shortcuts = Shortcuts::new(&config.store_shortcut, &config.load_shortcut)?;
        shortcuts.set_float_precision(config.float_precision);

        let mut engine = Self {
            shortcuts,
            time_format: config.time_format.clone(),
            error_policy: config.error_policy,
            ..Self::default()
        };
        for (name, values) in &config.default_headers {
            for value in values {
                engine.add_default_header(name, value)?;
            }
        }
        Ok(engine)
    }

    pub fn with_transport(mut self, transport: impl Transport + 'static) -> Self {
        self.set_transport(transport);
        self
    }

    pub fn set_transport(&mut self, transport: impl Transport + 'static) {
        self.transport = Some(Box::new(transport));
    }

    /// Engine-wide request body marshaler. `None` makes structured request
    /// bodies fail unless the request brings its own.
    pub fn set_marshaler(&mut self, marshaler: Option<Arc<dyn Marshaler>>) {
        self.marshaler = marshaler;
    }

    /// Engine-wide response body unmarshaler. `None` makes non-empty decoded
    /// bodies fail unless the response brings its own.
    pub fn set_unmarshaler(&mut self, unmarshaler: Option<Arc<dyn Unmarshaler>>) {
        self.unmarshaler = unmarshaler;
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    pub fn set_default_headers(&mut self, headers: HeaderMap) {
        self.default_headers = headers;
    }

    /// First value of a default header, if it is valid text.
    pub fn default_header(&self, name: &str) -> Option<&str> {
        self.default_headers
            .get(name)
            .and_then(|value| value.to_str().ok())
    }

    /// Replace every value of a default header.
    pub fn set_default_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.default_headers
            .insert(header_name(name)?, header_value(value)?);
        Ok(())
    }

    /// Append a value to a default header.
    pub fn add_default_header(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.default_headers
            .append(header_name(name)?, header_value(value)?);
        Ok(())
    }

    pub fn variables(&self) -> &VariableStore {
        &self.variables
    }

    pub fn variables_mut(&mut self) -> &mut VariableStore {
        &mut self.variables
    }

    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// String variable, or `""` when absent or not a string.
    pub fn variable_string(&self, name: &str) -> &str {
        self.variables.get_string(name)
    }

    pub fn set_variable(&mut self, name: &str, value: impl Into<Value>) -> Result<(), VariableError> {
        self.variables.set(name, value)
    }

    /// Substitute load tokens with stored variables.
    pub fn replace_vars(&self, template: &str) -> Result<String, VariableError> {
        self.shortcuts.replace(template, &self.variables)
    }

    pub fn set_store_shortcut_bounds(&mut self, prefix: &str, suffix: &str) -> Result<(), ShortcutError> {
        self.shortcuts
            .set_store_bounds(&ShortcutBounds::new(prefix, suffix))
    }

    pub fn set_load_shortcut_bounds(&mut self, prefix: &str, suffix: &str) -> Result<(), ShortcutError> {
        self.shortcuts
            .set_load_bounds(&ShortcutBounds::new(prefix, suffix))
    }

    /// Decimals used when substituting float variables; `None` for the
    /// shortest representation.
    pub fn set_float_precision(&mut self, precision: Option<usize>) {
        self.shortcuts.set_float_precision(precision);
    }

    pub fn set_time_format(&mut self, format: TimeFormat) {
        self.time_format = format;
    }

    pub fn set_error_policy(&mut self, policy: ErrorPolicy) {
        self.error_policy = policy;
    }

    fn comparator(&mut self) -> Comparator<'_> {
        Comparator::new(
            &mut self.variables,
            &self.shortcuts,
            &self.time_format,
            self.error_policy,
        )
    }

    /// Compare a value against an expectation outside of any request.
    pub fn compare(&mut self, expected: &Expected, actual: &Value) -> Result<(), CompareError> {
        self.comparator().compare(expected, actual)
    }

    /// Run one test case and report every failed check.
    pub fn test(&mut self, case: &TestCase) -> Result<(), Error> {
        let request = self.build_request(&case.request)?;
        debug!(
            method = %request.method,
            path = %request.path,
            headers = request.headers.len(),
            "executing test case"
        );

        let transport = self.transport.as_mut().ok_or(Error::NilTransport)?;
        let response = transport.execute(request)?;
        debug!(
            status = response.status,
            body_bytes = response.body.len(),
            "received response"
        );

        let mut failures = Vec::new();
        if let Err(e) = self.check_code(&case.response.code, &response) {
            failures.push(e);
        }
        if let Some(expected) = &case.response.headers {
            if let Err(e) = self.check_headers(expected, &response) {
                failures.push(e);
            }
        }
        if let Err(e) = self.check_body(case, &response) {
            failures.push(e);
        }

        match failures.len() {
            0 => Ok(()),
            1 => Err(failures.remove(0)),
            _ => Err(Error::Failed(failures)),
        }
    }

    /// Run one test case and panic with the combined failure message.
    #[track_caller]
    pub fn assert(&mut self, case: &TestCase) {
        if let Err(err) = self.test(case) {
            panic!("{err}");
        }
    }

    fn substitute(&self, target: &'static str, text: &str, enabled: bool) -> Result<String, Error> {
        if !enabled {
            return Ok(text.to_string());
        }
        self.replace_vars(text)
            .map_err(|source| Error::Substitution { target, source })
    }

    fn build_request(&self, request: &TestRequest) -> Result<TransportRequest, Error> {
        if request.method.is_empty() {
            return Err(Error::IncompleteTestCase("HTTP method"));
        }
        if request.path.is_empty() {
            return Err(Error::IncompleteTestCase("URL path"));
        }
        let method = Method::from_bytes(request.method.as_bytes())
            .map_err(|e| Error::RequestBuild(format!("invalid method {:?}. {e}", request.method)))?;

        let path = self.substitute("path", &request.path, !request.no_path_substitution)?;
        path.parse::<Uri>()
            .map_err(|e| Error::RequestBuild(format!("invalid path {path:?}. {e}")))?;

        let body = match &request.body {
            RequestBody::Empty => None,
            RequestBody::Value(value) => {
                let marshaler = request
                    .marshaler
                    .as_ref()
                    .or(self.marshaler.as_ref())
                    .ok_or(Error::NilMarshaler)?;
                Some(marshaler.marshal(value).map_err(Error::Marshal)?)
            }
            RequestBody::Text(text) => {
                let text = self.substitute("raw body", text, !request.no_body_substitution)?;
                Some(Bytes::from(text))
            }
            RequestBody::Bytes(bytes) => Some(bytes.clone()),
        };

        let substitute_headers = !request.no_header_substitution;
        let mut headers = self.default_headers.clone();
        for (name, values) in &request.headers {
            let name = self.substitute("header name", name, substitute_headers)?;
            let name = header_name(&name)?;
            headers.remove(&name);
            for value in values {
                let value = self.substitute("header value", value, substitute_headers)?;
                headers.append(name.clone(), header_value(&value)?);
            }
        }

        Ok(TransportRequest {
            method,
            path,
            headers,
            body,
        })
    }

    fn check_code(&mut self, expected: &Expected, response: &TransportResponse) -> Result<(), Error> {
        let status = Value::Int(i64::from(response.status));
        self.compare(expected, &status).map_err(Error::ResponseCode)
    }

    fn check_headers(&mut self, expected: &Expected, response: &TransportResponse) -> Result<(), Error> {
        let expected = lowercase_header_keys(expected);
        let actual = headers_to_value(&response.headers);
        self.compare(&expected, &actual)
            .map_err(Error::ResponseHeaders)
    }

    fn check_body(&mut self, case: &TestCase, response: &TransportResponse) -> Result<(), Error> {
        match &case.response.body {
            ResponseBody::Raw(expected) => {
                let text = Value::String(String::from_utf8_lossy(&response.body).into_owned());
                self.compare(expected, &text).map_err(Error::ResponseBody)
            }
            ResponseBody::Decoded(expected) => {
                let decoded = if response.body.is_empty() {
                    Value::Null
                } else {
                    let unmarshaler = case
                        .response
                        .unmarshaler
                        .as_ref()
                        .or(self.unmarshaler.as_ref())
                        .ok_or(Error::NilUnmarshaler)?;
                    unmarshaler
                        .unmarshal(&response.body)
                        .map_err(Error::Unmarshal)?
                };
                self.compare(expected, &decoded).map_err(Error::ResponseBody)
            }
        }
    }
}
