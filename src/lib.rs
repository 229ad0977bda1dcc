//! Switchyard
//! ==========
//!
//! Swap an application's HTTP transport without touching the application.
//!
//! Your routes talk to one contract, [`HttpServerProvider`].
//! Two transports implement it:
//! - [`EventLoopProvider`]: every connection is a task on one executor thread.
//!   Before binding, it probes the address and refuses to start a second instance.
//! - [`WorkerPoolProvider`]: a fixed pool of threads, each serving one connection at a time
//!   with blocking I/O.  Optionally detaches from `run`.
//!
//! [`HttpServer`] holds one provider and the route source, so changing transports is a
//! one-line change.
//!
//! # Features
//! - `forbid(unsafe_code)`
//! - Routes from a typed builder or from a JSON routes file
//! - A router miss is always `404` with body `Result Not Found`
//! - Handler errors and panics never reach the client: the provider's
//!   [`ErrorInterceptor`] logs them and answers `500`
//! - Keep-alive, `Expect: 100-continue`, `Content-Length` request bodies
//! - Graceful shutdown with [`permit::Permit`]
//! - Logs with [`tracing`]
//!
//! # Limitations
//! - No `chunked` request bodies.  They get `400 Bad Request`.
//! - No request timeouts.  The worker pool only bounds idle keep-alive connections.
//! - No TLS.
//!
//! # Example
//! ```rust
//! use switchyard::{HttpServer, Request, Response, WorkerPoolProvider};
//! # let permit = permit::Permit::new();
//! # let server_permit = permit.new_sub();
//! # std::thread::spawn(move || {
//! #     std::thread::sleep(std::time::Duration::from_millis(100));
//! #     drop(permit);
//! # });
//!
//! let mut server = HttpServer::with_provider(
//!     WorkerPoolProvider::builder()
//! #       .permit(server_permit)
//!         .workers(8)
//!         .build(),
//! );
//! server.set_routes(|routes| {
//!     routes.add("GET", "/ping", |_req: &Request| Response::text(200, "ok"));
//!     routes.add("POST", "/echo", |req: &Request| {
//!         Ok::<_, switchyard::HandlerError>(Response::text(200, req.body_utf8()?))
//!     });
//! });
//! server.run("127.0.0.1:0").unwrap();
//! ```
#![forbid(unsafe_code)]
mod accept;
mod error;
mod event_loop;
mod head;
mod headers;
mod http_conn;
mod http_error;
mod interceptor;
mod logging;
mod probe;
mod provider;
mod request;
mod request_id;
mod response;
mod router;
mod routes_file;
mod server;
mod token_set;
mod util;
mod worker_pool;

pub use crate::accept::{
    socket_addr_127_0_0_1, socket_addr_127_0_0_1_any_port, socket_addr_all_interfaces,
};
pub use crate::error::{HandlerError, ServerError};
pub use crate::event_loop::{EventLoopProvider, EventLoopProviderBuilder};
pub use crate::headers::{Header, HeaderList};
pub use crate::interceptor::{ErrorInterceptor, Failure, PlainTextInterceptor, RequestContext};
pub use crate::logging::{LogConfig, init_logging};
pub use crate::probe::{
    HttpGetProbe, LivenessProbe, NoProbe, ProbeFuture, ProbeOutcome, TcpConnectProbe,
};
pub use crate::provider::HttpServerProvider;
pub use crate::request::Request;
pub use crate::response::Response;
pub use crate::router::{IntoHandlerResult, RouteKey, RouteTable, RouteTableBuilder, Router};
pub use crate::routes_file::{load_route_table, parse_route_table};
pub use crate::server::{HttpServer, RouteSource};
pub use crate::worker_pool::{WorkerPoolProvider, WorkerPoolProviderBuilder};

/// This part of the library is not covered by the semver guarantees.
/// If you use these in your program, a minor version upgrade could break your build.
///
/// If you use these items in a published library,
/// your library should depend on a specific version of this library.
pub mod internal {
    pub use crate::accept::*;
    pub use crate::event_loop::*;
    pub use crate::head::*;
    pub use crate::http_conn::*;
    pub use crate::http_error::*;
    pub use crate::provider::*;
    pub use crate::request::*;
    pub use crate::request_id::*;
    pub use crate::response::*;
    pub use crate::token_set::*;
    pub use crate::util::*;
    pub use crate::worker_pool::*;
}

pub mod reexport {
    pub use permit;
    pub use safina;
}
