use crate::error::ServerError;
use crate::interceptor::{ErrorInterceptor, Failure, RequestContext};
use crate::router::{RouteTableBuilder, Router};
use crate::routes_file::load_route_table;
use crate::{Request, Response};
use safina::sync::Receiver;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::path::Path;
use std::sync::Arc;

/// An HTTP transport.
///
/// Every provider loads routes the same way and answers requests the same way.
/// Providers differ only in how they accept connections and run handlers,
/// which is [`spawn`](HttpServerProvider::spawn).
pub trait HttpServerProvider: Send {
    /// A short name for logs, like `"event-loop"`.
    fn name(&self) -> &'static str;

    fn router(&self) -> Option<&Arc<dyn Router>>;

    /// Installs `router`, replacing any previous one.
    fn set_router(&mut self, router: Arc<dyn Router>);

    /// Binds `address` and starts serving in the background.
    ///
    /// Returns the bound socket address and a receiver that gets a message
    /// after the transport stops.
    ///
    /// # Errors
    /// Returns an error when:
    /// - no router is loaded
    /// - `address` does not resolve
    /// - another server is already serving `address`
    /// - we fail to bind `address`
    /// - we fail to start the transport's threads
    fn spawn(&mut self, address: &str) -> Result<(SocketAddr, Receiver<()>), ServerError>;

    /// Binds `address` and serves until the transport stops.
    ///
    /// # Errors
    /// Returns the errors of [`spawn`](HttpServerProvider::spawn).
    fn run(&mut self, address: &str) -> Result<(), ServerError> {
        let (_addr, stopped_receiver) = self.spawn(address)?;
        let _ignored = stopped_receiver.recv();
        Ok(())
    }

    /// Runs the router on `request`.
    ///
    /// A router miss returns the fixed 404: `Content-Type: text/plain`, body `Result Not Found`.
    ///
    /// # Errors
    /// Returns an error when no router is loaded or the handler fails.
    fn handle_http_request(&self, request: &Request) -> Result<Response, ServerError> {
        dispatch_request(self.router(), request)
    }

    /// Loads a routes file and installs it.
    /// On error, keeps the router that was loaded before.
    ///
    /// # Errors
    /// Returns an error when the file does not exist or is not a valid routes file.
    fn set_router_from_file(&mut self, path: &Path) -> Result<(), ServerError> {
        let table = load_route_table(path)?;
        tracing::info!(
            provider = self.name(),
            path = %path.display(),
            routes = table.len(),
            "loaded routes"
        );
        self.set_router(Arc::new(table));
        Ok(())
    }

    /// Builds a route table by calling `register` once, and installs it.
    fn set_routes(&mut self, register: &dyn Fn(&mut RouteTableBuilder)) {
        let mut builder = RouteTableBuilder::new();
        register(&mut builder);
        let table = builder.build();
        tracing::info!(provider = self.name(), routes = table.len(), "registered routes");
        self.set_router(Arc::new(table));
    }
}

/// # Errors
/// Returns an error when `router` is `None` or the handler fails.
pub fn dispatch_request(
    router: Option<&Arc<dyn Router>>,
    request: &Request,
) -> Result<Response, ServerError> {
    let router = router.ok_or(ServerError::RouterNotInitialized)?;
    tracing::info!("{} {}", request.method(), request.uri());
    Ok(router
        .dispatch(request)?
        .unwrap_or_else(Response::not_found_404))
}

/// Dispatches `request` and hands any error or panic to `interceptor`.
/// Always produces a response.
pub fn serve_request(
    router: Option<&Arc<dyn Router>>,
    interceptor: &dyn ErrorInterceptor,
    request: &Request,
) -> Response {
    let context = RequestContext::new(request);
    match std::panic::catch_unwind(AssertUnwindSafe(|| dispatch_request(router, request))) {
        Ok(Ok(response)) => response,
        Ok(Err(e)) => interceptor.intercept(&context, &Failure::Error(e)),
        Err(payload) => interceptor.intercept(&context, &Failure::from_panic(payload.as_ref())),
    }
}

/// Prints the notice shown when another instance already serves `address`.
pub(crate) fn print_address_in_use(address: &str) {
    let lines = [
        "ServerError::AddressInUse".to_string(),
        "another server is already listening".to_string(),
        format!("address: {address}"),
    ];
    let width = lines.iter().map(String::len).max().unwrap_or(0);
    let border = format!("+{}+", "-".repeat(width + 2));
    eprintln!("{border}");
    for line in &lines {
        eprintln!("| {line:<width$} |");
    }
    eprintln!("{border}");
}
