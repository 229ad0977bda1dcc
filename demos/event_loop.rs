//! Event Loop Example
//! ==================
//!
//! Serves the routes in `demos/routes.json` on the event-loop transport.
//!
//! Start the server:
//! ```text
//! $ cargo run --example event_loop
//! HTTP server running at 127.0.0.1:8000
//! ```
//!
//! Make requests to it:
//! ```text
//! $ curl http://127.0.0.1:8000/
//! ok
//! $ curl http://127.0.0.1:8000/welcome
//! <!DOCTYPE html>
//! ...
//! $ curl http://127.0.0.1:8000/nope
//! Result Not Found
//! ```
//!
//! Start it again in another terminal to see the second instance refuse the address.
#![forbid(unsafe_code)]
use std::path::Path;
use switchyard::{EventLoopProvider, HttpServer, LogConfig, init_logging};

pub fn main() {
    let _guard = init_logging(&LogConfig::default()).unwrap();
    let routes_path = Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("demos")
        .join("routes.json");
    let mut server =
        HttpServer::with_provider(EventLoopProvider::builder().max_conns(1000).build());
    server.set_router_from_file(routes_path);
    if let Err(e) = server.run("127.0.0.1:8000") {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
