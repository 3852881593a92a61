//! Declarative assertions for HTTP API responses.
//!
//! A [`TestCase`] pairs a request description with an [`Expected`] response.
//! The [`Engine`] builds the request, substituting previously captured
//! variables, runs it through a [`Transport`], and compares the status code,
//! headers and decoded body against the expectation. Matchers embedded in the
//! expectation can capture values from one response for use in later
//! requests.
//!
//! ```
//! use restmatch::{Engine, Expected, TestCase, TestRequest, TestResponse, TransportRequest, TransportResponse, TransportError};
//!
//! let transport = |req: TransportRequest| -> Result<TransportResponse, TransportError> {
//!     let body = if req.path == "/api/user" { r#"{"id": "42"}"# } else { "{}" };
//!     Ok(TransportResponse { status: 200, body: body.into(), ..Default::default() })
//! };
//! let mut engine = Engine::new().with_transport(transport);
//!
//! engine.assert(&TestCase::new(
//!     TestRequest::get("/api/user"),
//!     TestResponse::status(200).body(Expected::map([("id", "$userid$")])),
//! ));
//! assert_eq!(engine.variable_string("userid"), "42");
//! ```

pub mod case;
pub mod codec;
pub mod compare;
pub mod config;
pub mod engine;
pub mod error;
pub mod expected;
pub mod substitution;
pub mod transport;
pub mod value;
pub mod vars;

pub use case::{RequestBody, ResponseBody, TestCase, TestRequest, TestResponse};
pub use codec::{JsonCodec, Marshaler, RawCodec, Unmarshaler, YamlCodec};
pub use compare::{Comparator, Rule};
pub use config::{EngineConfig, ErrorPolicy, TimeFormat};
pub use engine::Engine;
pub use error::{CodecError, CompareError, Error, ShortcutError, TransportError, VariableError};
pub use expected::{Expected, Matcher};
pub use substitution::{ShortcutBounds, Shortcuts};
pub use transport::{ServiceTransport, Transport, TransportRequest, TransportResponse};
pub use value::{Kind, Value};
pub use vars::VariableStore;
