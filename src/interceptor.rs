use crate::error::ServerError;
use crate::request_id::new_request_id;
use crate::{Request, Response};
use std::any::Any;
use std::fmt::{Display, Formatter};
use std::time::SystemTime;

/// What went wrong while handling one request.
#[derive(Debug)]
pub enum Failure {
    Error(ServerError),
    /// A handler panicked.  Holds the panic message.
    Panic(String),
}
impl Failure {
    /// Extracts the message from a `catch_unwind` payload.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let msg = if let Some(s) = payload.downcast_ref::<&str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "unknown panic".to_string()
        };
        Failure::Panic(msg)
    }
}
impl Display for Failure {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Failure::Error(e) => write!(f, "{e}"),
            Failure::Panic(msg) => write!(f, "handler panicked: {msg}"),
        }
    }
}

/// The request a failure belongs to.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub request_id: String,
    pub method: String,
    pub uri: String,
    pub received: SystemTime,
}
impl RequestContext {
    #[must_use]
    pub fn new(request: &Request) -> Self {
        Self {
            request_id: new_request_id(),
            method: request.method().to_string(),
            uri: request.uri(),
            received: SystemTime::now(),
        }
    }
}

/// Turns any per-request failure into the response the client sees.
///
/// Each provider owns one, set at construction.
/// The failure never reaches the client; only the interceptor's response does.
pub trait ErrorInterceptor: Send + Sync {
    fn intercept(&self, context: &RequestContext, failure: &Failure) -> Response;
}

/// Logs the failure and answers 500 with a fixed plain-text body.
#[derive(Clone, Debug)]
pub struct PlainTextInterceptor {
    body: String,
}
impl PlainTextInterceptor {
    #[must_use]
    pub fn new(body: impl Into<String>) -> Self {
        Self { body: body.into() }
    }

    #[must_use]
    pub fn body(&self) -> &str {
        &self.body
    }
}
impl ErrorInterceptor for PlainTextInterceptor {
    fn intercept(&self, context: &RequestContext, failure: &Failure) -> Response {
        tracing::error!(
            request_id = %context.request_id,
            method = %context.method,
            uri = %context.uri,
            "request failed: {failure}"
        );
        Response::internal_server_error_500(self.body.clone())
    }
}
