use crate::accept::accept_loop;
use crate::error::ServerError;
use crate::http_conn::{HttpConn, handle_http_conn};
use crate::interceptor::{ErrorInterceptor, PlainTextInterceptor};
use crate::probe::{HttpGetProbe, LivenessProbe, ProbeOutcome};
use crate::provider::{HttpServerProvider, print_address_in_use, serve_request};
use crate::router::Router;
use crate::token_set::{Token, TokenSet};
use crate::util::resolve_address;
use crate::{Request, Response};
use permit::Permit;
use safina::executor::Executor;
use safina::sync::Receiver;
use std::net::SocketAddr;
use std::sync::Arc;

pub const EVENT_LOOP_ERROR_BODY: &str = "Internal Server Fatal Error";

/// Builds an [`EventLoopProvider`].
pub struct EventLoopProviderBuilder {
    max_conns: usize,
    small_body_len: usize,
    probe: Arc<dyn LivenessProbe>,
    interceptor: Arc<dyn ErrorInterceptor>,
    permit: Permit,
}
impl EventLoopProviderBuilder {
    /// Makes a new builder with these default settings:
    /// - 100 max connections
    /// - 64 KiB small body length
    /// - probes the address with `GET /` before binding
    /// - answers failures with 500 `Internal Server Fatal Error`
    #[allow(clippy::new_without_default)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            max_conns: 100,
            small_body_len: 64 * 1024,
            probe: Arc::new(HttpGetProbe::default()),
            interceptor: Arc::new(PlainTextInterceptor::new(EVENT_LOOP_ERROR_BODY)),
            permit: Permit::new(),
        }
    }

    /// Sets the maximum number of connections to handle at one time.
    ///
    /// When the server is handling the maximum number of connections,
    /// it waits for a connection to drop before accepting new ones.
    ///
    /// # Panics
    /// Panics when `n` is zero.
    #[must_use]
    pub fn max_conns(mut self, n: usize) -> Self {
        assert!(n > 0, "refusing to set max_conns to zero");
        self.max_conns = n;
        self
    }

    /// Receive request bodies up to length `n`, saving them in memory.
    ///
    /// Reject larger requests with `413 Payload Too Large`.
    #[must_use]
    pub fn small_body_len(mut self, n: usize) -> Self {
        self.small_body_len = n;
        self
    }

    #[must_use]
    pub fn probe(mut self, probe: impl LivenessProbe + 'static) -> Self {
        self.probe = Arc::new(probe);
        self
    }

    #[must_use]
    pub fn interceptor(mut self, interceptor: impl ErrorInterceptor + 'static) -> Self {
        self.interceptor = Arc::new(interceptor);
        self
    }

    /// Sets the permit used by the server.
    ///
    /// Revoke the permit to make the server stop accepting connections.
    #[must_use]
    pub fn permit(mut self, p: Permit) -> Self {
        self.permit = p;
        self
    }

    #[must_use]
    pub fn build(self) -> EventLoopProvider {
        EventLoopProvider {
            router: None,
            max_conns: self.max_conns,
            small_body_len: self.small_body_len,
            probe: self.probe,
            interceptor: self.interceptor,
            permit: self.permit,
            executor: None,
        }
    }
}

/// A transport that serves every connection as a task on one executor thread.
///
/// Handlers run one at a time on the executor's single blocking thread,
/// so a slow handler never stalls reading or writing on other connections.
///
/// Before binding, it probes the address and refuses to start when
/// another server already answers there.
pub struct EventLoopProvider {
    router: Option<Arc<dyn Router>>,
    max_conns: usize,
    small_body_len: usize,
    probe: Arc<dyn LivenessProbe>,
    interceptor: Arc<dyn ErrorInterceptor>,
    permit: Permit,
    executor: Option<Arc<Executor>>,
}
impl EventLoopProvider {
    #[must_use]
    pub fn builder() -> EventLoopProviderBuilder {
        EventLoopProviderBuilder::new()
    }

    fn executor(&mut self) -> Result<Arc<Executor>, ServerError> {
        if let Some(executor) = &self.executor {
            return Ok(Arc::clone(executor));
        }
        let executor = Executor::new(1, 1)
            .map_err(|e| ServerError::Runtime(format!("error starting executor: {e}")))?;
        self.executor = Some(Arc::clone(&executor));
        Ok(executor)
    }
}
impl Default for EventLoopProvider {
    fn default() -> Self {
        Self::builder().build()
    }
}
impl HttpServerProvider for EventLoopProvider {
    fn name(&self) -> &'static str {
        "event-loop"
    }

    fn router(&self) -> Option<&Arc<dyn Router>> {
        self.router.as_ref()
    }

    fn set_router(&mut self, router: Arc<dyn Router>) {
        self.router = Some(router);
    }

    fn spawn(&mut self, address: &str) -> Result<(SocketAddr, Receiver<()>), ServerError> {
        let router = self.router.clone().ok_or(ServerError::RouterNotInitialized)?;
        let addr = resolve_address(address)?;
        safina::timer::start_timer_thread();
        let executor = self.executor()?;
        let address = address.to_string();
        let probe = Arc::clone(&self.probe);
        let interceptor = Arc::clone(&self.interceptor);
        let permit = self.permit.new_sub();
        let max_conns = self.max_conns;
        let small_body_len = self.small_body_len;
        executor.block_on(async move {
            if probe.probe(&address, addr).await == ProbeOutcome::Live {
                print_address_in_use(&address);
                tracing::error!(%address, "another server is already listening");
                return Err(ServerError::AddressInUse { address });
            }
            let bind_failure = |source| ServerError::BindFailure {
                address: address.clone(),
                source,
            };
            let listener = async_net::TcpListener::bind(addr)
                .await
                .map_err(bind_failure)?;
            let local_addr = listener.local_addr().map_err(bind_failure)?;
            println!("HTTP server running at {address}");
            tracing::info!(%address, %local_addr, "event loop serving");
            let conn_handler = move |permit: Permit,
                                     token: Token,
                                     stream: async_net::TcpStream,
                                     remote_addr: SocketAddr| {
                let router = Arc::clone(&router);
                let interceptor = Arc::clone(&interceptor);
                safina::executor::spawn(async move {
                    let _token = token;
                    let request_handler = |req: Request| {
                        let router = Arc::clone(&router);
                        let interceptor = Arc::clone(&interceptor);
                        async move {
                            safina::executor::schedule_blocking(move || {
                                serve_request(Some(&router), interceptor.as_ref(), &req)
                            })
                            .await
                            .unwrap_or_else(|_| {
                                Response::internal_server_error_500(EVENT_LOOP_ERROR_BODY)
                            })
                        }
                    };
                    handle_http_conn(
                        permit,
                        HttpConn::new(remote_addr, stream),
                        small_body_len,
                        request_handler,
                    )
                    .await;
                });
            };
            let (sender, receiver) = safina::sync::oneshot();
            safina::executor::spawn(async move {
                accept_loop(permit, listener, TokenSet::new(max_conns), conn_handler).await;
                tracing::info!("event loop stopped");
                let _ignored = sender.send(());
            });
            Ok((local_addr, receiver))
        })
    }
}
