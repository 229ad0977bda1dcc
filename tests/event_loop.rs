
use crate::test_util::{TestServer, check_elapsed, not_found_response, text_response};
use permit::Permit;
use std::io::ErrorKind;
use std::time::{Duration, Instant};
use switchyard::{
    EventLoopProvider, HandlerError, HttpGetProbe, HttpServerProvider, NoProbe, Request,
    Response, RouteTableBuilder, ServerError, TcpConnectProbe,
};

fn routes(routes: &mut RouteTableBuilder) {
    routes.add("GET", "/", |_req: &Request| Response::text(200, "home"));
    routes.add("POST", "/echo", |req: &Request| {
        Ok::<_, HandlerError>(Response::text(200, req.body_utf8()?))
    });
    routes.add("GET", "/fail", |_req: &Request| {
        Err::<Response, _>(HandlerError::new("boom"))
    });
    routes.add("GET", "/panic", |_req: &Request| -> Response {
        panic!("handler panic")
    });
}

fn fatal_error_response() -> String {
    text_response("500 Internal Server Error", "Internal Server Fatal Error")
}

#[test]
fn serves_routes() {
    let server = TestServer::event_loop(routes);
    assert_eq!(
        text_response("200 OK", "home"),
        server.exchange("GET / HTTP/1.1\r\n\r\n").unwrap()
    );
    assert_eq!(
        text_response("200 OK", "abc"),
        server
            .exchange("POST /echo HTTP/1.1\r\ncontent-length: 3\r\n\r\nabc")
            .unwrap()
    );
    assert_eq!(
        not_found_response(),
        server.exchange("GET /missing HTTP/1.1\r\n\r\n").unwrap()
    );
    assert_eq!(
        not_found_response(),
        server.exchange("POST / HTTP/1.1\r\n\r\n").unwrap()
    );
}

#[test]
fn keep_alive() {
    let server = TestServer::event_loop(routes);
    assert_eq!(
        text_response("200 OK", "home") + &not_found_response() + &text_response("200 OK", "home"),
        server
            .exchange("GET / HTTP/1.1\r\n\r\nGET /x HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n")
            .unwrap()
    );
}

#[test]
fn handler_failures() {
    let server = TestServer::event_loop(routes);
    assert_eq!(
        fatal_error_response(),
        server.exchange("GET /fail HTTP/1.1\r\n\r\n").unwrap()
    );
    assert_eq!(
        fatal_error_response(),
        server.exchange("GET /panic HTTP/1.1\r\n\r\n").unwrap()
    );
    // The connection and the server survive.
    assert_eq!(
        fatal_error_response() + &text_response("200 OK", "home"),
        server
            .exchange("GET /panic HTTP/1.1\r\n\r\nGET / HTTP/1.1\r\n\r\n")
            .unwrap()
    );
    assert_eq!(
        text_response("200 OK", "home"),
        server.exchange("GET / HTTP/1.1\r\n\r\n").unwrap()
    );
}

#[test]
fn body_too_long() {
    let permit = Permit::new();
    let provider = EventLoopProvider::builder()
        .small_body_len(4)
        .permit(permit.new_sub())
        .build();
    let server = TestServer::start(permit, provider, &routes);
    assert_eq!(
        text_response("200 OK", "1234"),
        server
            .exchange("POST /echo HTTP/1.1\r\ncontent-length: 4\r\n\r\n1234")
            .unwrap()
    );
    assert_eq!(
        text_response("413 Payload Too Large", "Uploaded data is too big.")
            .replace("\r\n\r\n", "\r\nconnection: close\r\n\r\n"),
        server
            .exchange("POST /echo HTTP/1.1\r\ncontent-length: 5\r\n\r\n")
            .unwrap()
    );
}

#[test]
fn address_in_use() {
    let server = TestServer::event_loop(routes);
    let mut second = EventLoopProvider::default();
    second.set_routes(&routes);
    match second.spawn(&server.address()) {
        Err(ServerError::AddressInUse { address }) => assert_eq!(server.address(), address),
        other => panic!("expected AddressInUse, got {other:?}"),
    }
    // The first server still works.
    assert_eq!(
        text_response("200 OK", "home"),
        server.exchange("GET / HTTP/1.1\r\n\r\n").unwrap()
    );
}

#[test]
fn address_in_use_without_probe() {
    let server = TestServer::event_loop(routes);
    let mut second = EventLoopProvider::builder().probe(NoProbe).build();
    second.set_routes(&routes);
    match second.spawn(&server.address()) {
        Err(ServerError::BindFailure { address, source }) => {
            assert_eq!(server.address(), address);
            assert_eq!(ErrorKind::AddrInUse, source.kind());
        }
        other => panic!("expected BindFailure, got {other:?}"),
    }
}

#[test]
fn non_http_listener() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let address = listener.local_addr().unwrap().to_string();
    let mut provider = EventLoopProvider::builder()
        .probe(HttpGetProbe::new(Duration::from_millis(100)))
        .build();
    provider.set_routes(&routes);
    match provider.spawn(&address) {
        Err(ServerError::BindFailure { source, .. }) => {
            assert_eq!(ErrorKind::AddrInUse, source.kind());
        }
        other => panic!("expected BindFailure, got {other:?}"),
    }
    // Any listener counts for the TCP probe.
    let mut provider = EventLoopProvider::builder()
        .probe(TcpConnectProbe::default())
        .build();
    provider.set_routes(&routes);
    assert!(matches!(
        provider.spawn(&address),
        Err(ServerError::AddressInUse { .. })
    ));
}

#[test]
fn invalid_address() {
    let mut provider = EventLoopProvider::default();
    provider.set_routes(&routes);
    for address in ["", "not an address", "127.0.0.1"] {
        match provider.spawn(address) {
            Err(ServerError::InvalidAddress { address: a }) => assert_eq!(address, a),
            other => panic!("expected InvalidAddress for {address:?}, got {other:?}"),
        }
    }
}

#[test]
fn stops_when_permit_revoked() {
    let mut server = TestServer::event_loop(routes);
    let stopped_receiver = server.opt_stopped_receiver.take().unwrap();
    let before = Instant::now();
    server.opt_permit.take();
    stopped_receiver
        .recv_timeout(Duration::from_secs(2))
        .unwrap();
    check_elapsed(before, 0..1000).unwrap();
    assert!(server.exchange("GET / HTTP/1.1\r\n\r\n").is_err());
}

#[test]
fn max_conns() {
    let permit = Permit::new();
    let provider = EventLoopProvider::builder()
        .max_conns(1)
        .permit(permit.new_sub())
        .build();
    let server = TestServer::start(permit, provider, &routes);
    // Holds the only connection slot open.
    let mut idle = std::net::TcpStream::connect(server.addr).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    let addr = server.addr;
    let (sender, receiver) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let _ignored = sender.send(test_util::exchange(addr, "GET / HTTP/1.1\r\n\r\n"));
    });
    std::thread::sleep(Duration::from_millis(200));
    assert!(receiver.try_recv().is_err());
    std::io::Write::write_all(&mut idle, b"GET / HTTP/1.1\r\nConnection: close\r\n\r\n").unwrap();
    let _ignored = std::io::Read::read_to_end(&mut idle, &mut Vec::new());
    drop(idle);
    assert_eq!(
        text_response("200 OK", "home"),
        receiver
            .recv_timeout(Duration::from_secs(2))
            .unwrap()
            .unwrap()
    );
}

#[test]
fn slow_handler_does_not_stall_other_connections() {
    let server = TestServer::event_loop(|builder| {
        routes(builder);
        builder.add("GET", "/slow", |_req: &Request| {
            std::thread::sleep(Duration::from_millis(1000));
            Response::text(200, "slow")
        });
    });
    let addr = server.addr;
    let slow = std::thread::spawn(move || test_util::exchange(addr, "GET /slow HTTP/1.1\r\n\r\n"));
    std::thread::sleep(Duration::from_millis(100));
    // Parsing and error responses on another connection keep going.
    let before = Instant::now();
    assert_eq!(
        text_response("400 Bad Request", "HttpError::MalformedRequestLine")
            .replace("\r\n\r\n", "\r\nconnection: close\r\n\r\n"),
        server.exchange("GET  HTTP/1.1\r\n\r\n").unwrap()
    );
    check_elapsed(before, 0..500).unwrap();
    // Handlers run one at a time, so this one waits for /slow.
    assert_eq!(
        text_response("200 OK", "home"),
        server.exchange("GET / HTTP/1.1\r\n\r\n").unwrap()
    );
    assert_eq!(
        text_response("200 OK", "slow"),
        slow.join().unwrap().unwrap()
    );
}
