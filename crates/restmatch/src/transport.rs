//! Request execution.
//!
//! The engine never talks to the network itself. It hands a fully built
//! [`TransportRequest`] to a [`Transport`] and compares whatever comes back.
//! HTTP error statuses are ordinary responses, not transport errors.

use crate::error::TransportError;
use bytes::Bytes;
use http_body_util::{BodyExt, Full};
use hyper::body::Body;
use hyper::{HeaderMap, Method, Request, Response};
use std::fmt;
use tokio::runtime::{Handle, Runtime, RuntimeFlavor};
use tower::{Service, ServiceExt};

/// Request ready to be executed.
#[derive(Debug, Clone)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub headers: HeaderMap,
    pub body: Option<Bytes>,
}

/// Recorded response.
#[derive(Debug, Clone, Default)]
pub struct TransportResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

pub trait Transport {
    fn execute(&mut self, request: TransportRequest) -> Result<TransportResponse, TransportError>;
}

impl<F> Transport for F
where
    F: FnMut(TransportRequest) -> Result<TransportResponse, TransportError>,
{
    fn execute(&mut self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        self(request)
    }
}

/// Drives a `tower` service in-process, one request at a time.
///
/// Any hyper-compatible handler works, for example one built with
/// `tower::service_fn`. No socket is opened. Outside of tokio the service
/// runs on a private current-thread runtime built on first use. Inside a
/// multi-thread runtime it runs on the ambient one; a current-thread runtime
/// cannot be blocked on and yields a [`TransportError::Service`].
pub struct ServiceTransport<S> {
    service: S,
    runtime: Option<Runtime>,
}

impl<S> ServiceTransport<S> {
    pub fn new(service: S) -> Self {
        Self {
            service,
            runtime: None,
        }
    }

    fn private_runtime(&mut self) -> Result<&Runtime, TransportError> {
        if self.runtime.is_none() {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .map_err(|e| TransportError::Service(format!("failed to start runtime: {e}")))?;
            self.runtime = Some(runtime);
        }
        self.runtime
            .as_ref()
            .ok_or_else(|| TransportError::Service("runtime unavailable".to_string()))
    }
}

impl<S> fmt::Debug for ServiceTransport<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceTransport")
            .field("private_runtime", &self.runtime.is_some())
            .finish_non_exhaustive()
    }
}

impl<S, B> Transport for ServiceTransport<S>
where
    S: Service<Request<Full<Bytes>>, Response = Response<B>> + Clone,
    S::Error: fmt::Display,
    B: Body,
    B::Error: fmt::Display,
{
    fn execute(&mut self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let mut req = Request::builder()
            .method(request.method)
            .uri(request.path.as_str())
            .body(Full::new(request.body.unwrap_or_default()))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        *req.headers_mut() = request.headers;

        let service = self.service.clone();
        let call = async move {
            let response = service
                .oneshot(req)
                .await
                .map_err(|e| TransportError::Service(e.to_string()))?;
            let (parts, body) = response.into_parts();
            let body = body
                .collect()
                .await
                .map_err(|e| TransportError::Body(e.to_string()))?
                .to_bytes();
            Ok(TransportResponse {
                status: parts.status.as_u16(),
                headers: parts.headers,
                body,
            })
        };

        match Handle::try_current() {
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| handle.block_on(call))
            }
            Ok(_) => Err(TransportError::Service(
                "cannot drive the service from inside a current-thread runtime".to_string(),
            )),
            Err(_) => self.private_runtime()?.block_on(call),
        }
    }
}
