use crate::error::ServerError;
use crate::provider::HttpServerProvider;
use crate::router::RouteTableBuilder;
use std::path::{Path, PathBuf};
use std::sync::Arc;

type RegisterFn = Arc<dyn Fn(&mut RouteTableBuilder) + Send + Sync>;

/// Where the facade gets its routes from.
#[derive(Clone)]
pub enum RouteSource {
    File(PathBuf),
    Register(RegisterFn),
}
impl Default for RouteSource {
    fn default() -> Self {
        RouteSource::File(PathBuf::new())
    }
}
impl std::fmt::Debug for RouteSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RouteSource::File(path) => write!(f, "RouteSource::File({path:?})"),
            RouteSource::Register(..) => write!(f, "RouteSource::Register"),
        }
    }
}

/// Runs an application on whichever transport you plug in.
///
/// ```no_run
/// use switchyard::{EventLoopProvider, HttpServer, Request, Response};
/// let mut server = HttpServer::with_provider(EventLoopProvider::default());
/// server.set_routes(|routes| {
///     routes.add("GET", "/", |_req: &Request| Response::text(200, "hello"));
/// });
/// server.run("127.0.0.1:8000").unwrap();
/// ```
#[derive(Default)]
pub struct HttpServer {
    provider: Option<Box<dyn HttpServerProvider>>,
    route_source: RouteSource,
}
impl HttpServer {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_provider(provider: impl HttpServerProvider + 'static) -> Self {
        Self {
            provider: Some(Box::new(provider)),
            route_source: RouteSource::default(),
        }
    }

    /// Swaps in `provider` and returns the previous one.
    /// Stopping the previous provider is up to the caller.
    pub fn set_http_server_provider(
        &mut self,
        provider: impl HttpServerProvider + 'static,
    ) -> Option<Box<dyn HttpServerProvider>> {
        self.provider.replace(Box::new(provider))
    }

    #[must_use]
    pub fn provider(&self) -> Option<&dyn HttpServerProvider> {
        self.provider.as_deref()
    }

    pub fn provider_mut(&mut self) -> Option<&mut (dyn HttpServerProvider + 'static)> {
        self.provider.as_deref_mut()
    }

    #[must_use]
    pub fn route_source(&self) -> &RouteSource {
        &self.route_source
    }

    /// Loads routes from this file when [`run`](HttpServer::run) is called.
    pub fn set_router_from_file(&mut self, path: impl AsRef<Path>) {
        self.route_source = RouteSource::File(path.as_ref().to_path_buf());
    }

    /// Registers routes with `register` when [`run`](HttpServer::run) is called.
    pub fn set_routes(
        &mut self,
        register: impl Fn(&mut RouteTableBuilder) + Send + Sync + 'static,
    ) {
        self.route_source = RouteSource::Register(Arc::new(register));
    }

    /// Loads the routes into the provider, then runs it on `address`.
    ///
    /// # Errors
    /// Returns [`ServerError::ProviderNotSet`] when there is no provider,
    /// and otherwise any error from loading the routes or running the provider.
    pub fn run(&mut self, address: &str) -> Result<(), ServerError> {
        let provider = self.provider.as_deref_mut().ok_or(ServerError::ProviderNotSet)?;
        match &self.route_source {
            RouteSource::File(path) => provider.set_router_from_file(path)?,
            RouteSource::Register(register) => provider.set_routes(register.as_ref()),
        }
        tracing::info!(provider = provider.name(), %address, "starting");
        provider.run(address)
    }
}
