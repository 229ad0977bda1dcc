use crate::accept::AcceptResult;
use crate::error::ServerError;
use crate::http_conn::{HttpConn, handle_http_conn};
use crate::interceptor::{ErrorInterceptor, PlainTextInterceptor};
use crate::provider::{HttpServerProvider, serve_request};
use crate::router::Router;
use crate::util::resolve_address;
use crate::Request;
use futures_lite::io::AssertAsync;
use permit::Permit;
use safina::sync::Receiver;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::time::Duration;

pub const WORKER_POOL_ERROR_BODY: &str = "Internal Server Error";

/// Builds a [`WorkerPoolProvider`].
pub struct WorkerPoolProviderBuilder {
    workers: usize,
    daemonize: bool,
    small_body_len: usize,
    idle_timeout: Duration,
    interceptor: Arc<dyn ErrorInterceptor>,
    permit: Permit,
}
impl WorkerPoolProviderBuilder {
    /// Makes a new builder with these default settings:
    /// - 4 worker threads
    /// - `run` blocks until the pool stops
    /// - 64 KiB small body length
    /// - closes connections idle for 5 seconds
    /// - answers failures with 500 `Internal Server Error`
    #[allow(clippy::new_without_default)]
    #[must_use]
    pub fn new() -> Self {
        Self {
            workers: 4,
            daemonize: false,
            small_body_len: 64 * 1024,
            idle_timeout: Duration::from_secs(5),
            interceptor: Arc::new(PlainTextInterceptor::new(WORKER_POOL_ERROR_BODY)),
            permit: Permit::new(),
        }
    }

    /// Sets the number of worker threads.
    /// Each one serves one connection at a time.
    ///
    /// # Panics
    /// Panics when `n` is zero.
    #[must_use]
    pub fn workers(mut self, n: usize) -> Self {
        assert!(n > 0, "refusing to set workers to zero");
        self.workers = n;
        self
    }

    /// When true, `run` returns right after the pool starts and the workers keep serving
    /// in background threads.  Dropping the provider drops its permit, which stops them.
    #[must_use]
    pub fn daemonize(mut self, daemonize: bool) -> Self {
        self.daemonize = daemonize;
        self
    }

    #[must_use]
    pub fn small_body_len(mut self, n: usize) -> Self {
        self.small_body_len = n;
        self
    }

    /// How long a worker waits for the next request on a kept-alive connection.
    #[must_use]
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    #[must_use]
    pub fn interceptor(mut self, interceptor: impl ErrorInterceptor + 'static) -> Self {
        self.interceptor = Arc::new(interceptor);
        self
    }

    /// Revoke the permit to make the workers stop.
    #[must_use]
    pub fn permit(mut self, p: Permit) -> Self {
        self.permit = p;
        self
    }

    #[must_use]
    pub fn build(self) -> WorkerPoolProvider {
        WorkerPoolProvider {
            router: None,
            workers: self.workers,
            daemonize: self.daemonize,
            small_body_len: self.small_body_len,
            idle_timeout: self.idle_timeout,
            interceptor: self.interceptor,
            permit: self.permit,
        }
    }
}

/// A transport with a fixed pool of threads.
/// Each thread accepts a connection and serves it to completion with blocking I/O.
///
/// It does not probe before binding.
/// A second instance on the same address fails with [`ServerError::BindFailure`].
pub struct WorkerPoolProvider {
    router: Option<Arc<dyn Router>>,
    workers: usize,
    daemonize: bool,
    small_body_len: usize,
    idle_timeout: Duration,
    interceptor: Arc<dyn ErrorInterceptor>,
    permit: Permit,
}
impl WorkerPoolProvider {
    #[must_use]
    pub fn builder() -> WorkerPoolProviderBuilder {
        WorkerPoolProviderBuilder::new()
    }

    #[must_use]
    pub fn is_daemon(&self) -> bool {
        self.daemonize
    }
}
impl Default for WorkerPoolProvider {
    fn default() -> Self {
        Self::builder().build()
    }
}

struct Worker {
    permit: Permit,
    listener: TcpListener,
    router: Arc<dyn Router>,
    interceptor: Arc<dyn ErrorInterceptor>,
    small_body_len: usize,
    idle_timeout: Duration,
}
impl Worker {
    fn run(self) {
        tracing::debug!("worker started");
        while !self.permit.is_revoked() {
            match AcceptResult::new(self.listener.accept()) {
                // Wake-up connections from `wake_workers` arrive after revocation.
                AcceptResult::Ok(..) if self.permit.is_revoked() => break,
                AcceptResult::Ok(stream, remote_addr) => self.serve(stream, remote_addr),
                AcceptResult::TooManyOpenFiles => {
                    tracing::warn!("too many open files, pausing accept");
                    std::thread::sleep(Duration::from_millis(500));
                }
                AcceptResult::Err(e) => {
                    tracing::error!("error accepting connection: {e}");
                    std::thread::sleep(Duration::from_millis(100));
                }
            }
        }
        tracing::debug!("worker stopped");
    }

    fn serve(&self, stream: TcpStream, remote_addr: SocketAddr) {
        if let Err(e) = stream.set_read_timeout(Some(self.idle_timeout)) {
            tracing::warn!(%remote_addr, "error configuring connection: {e}");
            return;
        }
        let request_handler = |req: Request| {
            std::future::ready(serve_request(
                Some(&self.router),
                self.interceptor.as_ref(),
                &req,
            ))
        };
        futures_lite::future::block_on(handle_http_conn(
            self.permit.new_sub(),
            HttpConn::new(remote_addr, AssertAsync::new(stream)),
            self.small_body_len,
            request_handler,
        ));
    }
}

/// Waits for `permit` to be revoked, then connects once per worker so that
/// every worker blocked in `accept` sees the revocation.
fn wake_workers(permit: Permit, local_addr: SocketAddr, workers: usize) {
    futures_lite::future::block_on(permit);
    let ip = match local_addr.ip() {
        IpAddr::V4(ip) if ip.is_unspecified() => IpAddr::V4(Ipv4Addr::LOCALHOST),
        IpAddr::V6(ip) if ip.is_unspecified() => IpAddr::V6(Ipv6Addr::LOCALHOST),
        ip => ip,
    };
    let wake_addr = SocketAddr::new(ip, local_addr.port());
    for _ in 0..workers {
        if let Err(e) = TcpStream::connect_timeout(&wake_addr, Duration::from_millis(500)) {
            tracing::debug!(%wake_addr, "error waking worker: {e}");
        }
    }
}

impl HttpServerProvider for WorkerPoolProvider {
    fn name(&self) -> &'static str {
        "worker-pool"
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
        let bind_failure = |source| ServerError::BindFailure {
            address: address.to_string(),
            source,
        };
        let listener = TcpListener::bind(addr).map_err(bind_failure)?;
        let local_addr = listener.local_addr().map_err(bind_failure)?;
        // Revoked on drop, which stops any started workers if startup fails below.
        let pool_permit = self.permit.new_sub();
        let wake_permit = pool_permit.new_sub();
        let workers = self.workers;
        std::thread::Builder::new()
            .name("worker-waker".to_string())
            .spawn(move || wake_workers(wake_permit, local_addr, workers))
            .map_err(|e| ServerError::Runtime(format!("error starting waker: {e}")))?;
        let mut handles = Vec::with_capacity(self.workers);
        for n in 0..self.workers {
            let worker = Worker {
                permit: pool_permit.new_sub(),
                listener: listener.try_clone().map_err(bind_failure)?,
                router: Arc::clone(&router),
                interceptor: Arc::clone(&self.interceptor),
                small_body_len: self.small_body_len,
                idle_timeout: self.idle_timeout,
            };
            let handle = std::thread::Builder::new()
                .name(format!("worker-{n}"))
                .spawn(move || worker.run())
                .map_err(|e| ServerError::Runtime(format!("error starting worker: {e}")))?;
            handles.push(handle);
        }
        let (sender, receiver) = safina::sync::oneshot();
        std::thread::Builder::new()
            .name("worker-supervisor".to_string())
            .spawn(move || {
                let _pool_permit = pool_permit;
                for handle in handles {
                    if handle.join().is_err() {
                        tracing::error!("worker thread panicked");
                    }
                }
                tracing::info!("worker pool stopped");
                let _ignored = sender.send(());
            })
            .map_err(|e| ServerError::Runtime(format!("error starting supervisor: {e}")))?;
        println!("Server running at {address}");
        tracing::info!(%address, %local_addr, workers = self.workers, "worker pool serving");
        Ok((local_addr, receiver))
    }

    fn run(&mut self, address: &str) -> Result<(), ServerError> {
        let (_addr, stopped_receiver) = self.spawn(address)?;
        if self.daemonize {
            tracing::info!("worker pool detached");
            return Ok(());
        }
        let _ignored = stopped_receiver.recv();
        Ok(())
    }
}
