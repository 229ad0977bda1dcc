use std::path::PathBuf;

/// Errors surfaced by providers and the [`HttpServer`](crate::HttpServer) facade.
///
/// Startup errors (everything except [`ServerError::RouterNotInitialized`] and
/// [`ServerError::Handler`]) abort `run` or `set_router_from_file` before any
/// request is served.
/// The per-request variants never leave the transport: the provider's
/// [`ErrorInterceptor`](crate::ErrorInterceptor) turns them into a 500 response.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error("HTTP server provider not set")]
    ProviderNotSet,
    #[error("failed to bind {address}: {source}")]
    BindFailure {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("address {address} already in use by another instance")]
    AddressInUse { address: String },
    #[error("routes file does not exist: {path:?}")]
    RoutesFileNotFound { path: PathBuf },
    #[error("invalid route table in {path:?}: {reason}")]
    InvalidRouteTable { path: PathBuf, reason: String },
    #[error("cannot resolve address {address:?}")]
    InvalidAddress { address: String },
    #[error("router not initialized; load routes before serving")]
    RouterNotInitialized,
    #[error("handler failed: {0}")]
    Handler(#[from] HandlerError),
    #[error("runtime error: {0}")]
    Runtime(String),
}
impl ServerError {
    /// Returns true for errors that stop a provider from starting.
    #[must_use]
    pub fn is_startup_error(&self) -> bool {
        !matches!(
            self,
            ServerError::RouterNotInitialized | ServerError::Handler(..)
        )
    }

    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            ServerError::ProviderNotSet => "ProviderNotSet",
            ServerError::BindFailure { .. } => "BindFailure",
            ServerError::AddressInUse { .. } => "AddressInUse",
            ServerError::RoutesFileNotFound { .. } => "RoutesFileNotFound",
            ServerError::InvalidRouteTable { .. } => "InvalidRouteTable",
            ServerError::InvalidAddress { .. } => "InvalidAddress",
            ServerError::RouterNotInitialized => "RouterNotInitialized",
            ServerError::Handler(..) => "Handler",
            ServerError::Runtime(..) => "Runtime",
        }
    }
}

/// A failure returned by a route handler.
///
/// The transport logs it and answers the client with a 500.
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
#[error("{msg}")]
pub struct HandlerError {
    pub msg: String,
}
impl HandlerError {
    #[must_use]
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }

    #[must_use]
    pub fn with_context(self, context: impl Into<String>) -> Self {
        Self {
            msg: format!("{}: {}", context.into(), self.msg),
        }
    }
}
impl From<&'_ str> for HandlerError {
    fn from(value: &'_ str) -> Self {
        Self::new(value)
    }
}
impl From<String> for HandlerError {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}
impl From<std::io::Error> for HandlerError {
    fn from(value: std::io::Error) -> Self {
        Self::new(value.to_string())
    }
}
