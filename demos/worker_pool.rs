//! Worker Pool Example
//! ===================
//!
//! Registers routes in code and serves them from a detached pool of 8 threads.
//! Stops on Ctrl-C.
//!
//! ```text
//! $ cargo run --example worker_pool
//! Server running at 127.0.0.1:8001
//! $ curl -d 'hello' http://127.0.0.1:8001/echo
//! hello
//! $ curl http://127.0.0.1:8001/fail
//! Internal Server Error
//! ```
#![forbid(unsafe_code)]
use permit::Permit;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use switchyard::{
    HandlerError, HttpServer, LogConfig, Request, Response, WorkerPoolProvider, init_logging,
};

pub fn main() {
    let log_config = LogConfig::default().with_log_file("logs/worker_pool.log");
    let _guard = init_logging(&log_config).unwrap();
    let permit = Permit::new();
    let mut server = HttpServer::with_provider(
        WorkerPoolProvider::builder()
            .workers(8)
            .daemonize(true)
            .permit(permit.new_sub())
            .build(),
    );
    server.set_routes(|routes| {
        routes.add("GET", "/", |_req: &Request| Response::text(200, "ok"));
        routes.add("POST", "/echo", |req: &Request| {
            Ok::<_, HandlerError>(Response::text(200, req.body_utf8()?))
        });
        routes.add("GET", "/fail", |_req: &Request| {
            Err::<Response, _>(HandlerError::new("this route always fails"))
        });
    });
    server.run("127.0.0.1:8001").unwrap();
    Signals::new([SIGTERM, SIGINT]).unwrap().into_iter().next();
    drop(permit);
}
