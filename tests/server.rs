
use crate::test_util::{exchange, free_port, temp_dir_with, text_response};
use permit::Permit;
use std::path::PathBuf;
use std::time::Duration;
use switchyard::{
    EventLoopProvider, HttpServer, Request, Response, RouteSource, ServerError,
    WorkerPoolProvider,
};

#[test]
fn provider_not_set() {
    let mut server = HttpServer::new();
    assert!(server.provider().is_none());
    assert!(matches!(
        server.run("127.0.0.1:0"),
        Err(ServerError::ProviderNotSet)
    ));
}

#[test]
fn default_route_source() {
    let mut server = HttpServer::with_provider(EventLoopProvider::default());
    assert!(matches!(
        server.route_source(),
        RouteSource::File(path) if path.as_os_str().is_empty()
    ));
    match server.run("127.0.0.1:0") {
        Err(ServerError::RoutesFileNotFound { path }) => assert_eq!(PathBuf::new(), path),
        other => panic!("expected RoutesFileNotFound, got {other:?}"),
    }
}

#[test]
fn invalid_routes_file() {
    let dir = temp_dir_with(&[("routes.json", r#"{"routes": [{"path": "x"}]}"#)]);
    let mut server = HttpServer::with_provider(WorkerPoolProvider::default());
    server.set_router_from_file(dir.child("routes.json"));
    assert!(matches!(
        server.run("127.0.0.1:0"),
        Err(ServerError::InvalidRouteTable { .. })
    ));
}

#[test]
fn swap_provider() {
    let mut server = HttpServer::new();
    assert!(
        server
            .set_http_server_provider(EventLoopProvider::default())
            .is_none()
    );
    assert_eq!("event-loop", server.provider().unwrap().name());
    let old = server
        .set_http_server_provider(WorkerPoolProvider::default())
        .unwrap();
    assert_eq!("event-loop", old.name());
    assert_eq!("worker-pool", server.provider().unwrap().name());
    assert_eq!("worker-pool", server.provider_mut().unwrap().name());
}

fn run_in_background(mut server: HttpServer, address: String) {
    std::thread::spawn(move || {
        if let Err(e) = server.run(&address) {
            panic!("server failed: {e}");
        }
    });
}

fn wait_for_response(address: &str, request: &str) -> String {
    let addr = address.parse().unwrap();
    for _ in 0..50 {
        if let Ok(response) = exchange(addr, request) {
            return response;
        }
        std::thread::sleep(Duration::from_millis(20));
    }
    panic!("server at {address} never answered");
}

#[test]
fn same_routes_on_either_provider() {
    let permit = Permit::new();
    let register = |routes: &mut switchyard::RouteTableBuilder| {
        routes.add("GET", "/", |_req: &Request| Response::text(200, "same"));
    };
    for provider in [
        Box::new(move |p: Permit| {
            let mut server = HttpServer::with_provider(
                EventLoopProvider::builder().permit(p).build(),
            );
            server.set_routes(register);
            server
        }) as Box<dyn Fn(Permit) -> HttpServer>,
        Box::new(move |p: Permit| {
            let mut server = HttpServer::with_provider(
                WorkerPoolProvider::builder().workers(1).permit(p).build(),
            );
            server.set_routes(register);
            server
        }),
    ] {
        let address = format!("127.0.0.1:{}", free_port());
        run_in_background(provider(permit.new_sub()), address.clone());
        assert_eq!(
            text_response("200 OK", "same"),
            wait_for_response(&address, "GET / HTTP/1.1\r\n\r\n")
        );
        assert_eq!(
            text_response("404 Not Found", "Result Not Found"),
            wait_for_response(&address, "GET /other HTTP/1.1\r\n\r\n")
        );
    }
}

#[test]
fn routes_file() {
    let dir = temp_dir_with(&[
        (
            "routes.json",
            r#"{"routes": [{"path": "/", "body_file": "index.html", "headers": [["Content-Type", "text/html"]]}]}"#,
        ),
        ("index.html", "<p>hi</p>"),
    ]);
    let permit = Permit::new();
    let mut server = HttpServer::with_provider(
        WorkerPoolProvider::builder()
            .workers(1)
            .permit(permit.new_sub())
            .build(),
    );
    server.set_router_from_file(dir.child("routes.json"));
    assert!(matches!(server.route_source(), RouteSource::File(..)));
    let address = format!("127.0.0.1:{}", free_port());
    run_in_background(server, address.clone());
    assert_eq!(
        "HTTP/1.1 200 OK\r\nContent-Type: text/html\r\ncontent-length: 9\r\n\r\n<p>hi</p>",
        wait_for_response(&address, "GET / HTTP/1.1\r\n\r\n")
    );
}
