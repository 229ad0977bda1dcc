use switchyard::{HandlerError, Request, Response, RouteKey, RouteTable, RouteTableBuilder, Router};

fn dispatch(table: &RouteTable, method: &str, uri: &str) -> Result<Option<Response>, HandlerError> {
    table.dispatch(&Request::new(method, uri).unwrap())
}

fn body_of(table: &RouteTable, method: &str, uri: &str) -> Option<String> {
    dispatch(table, method, uri)
        .unwrap()
        .map(|response| String::from_utf8(response.body().to_vec()).unwrap())
}

#[test]
fn exact_method_and_path() {
    let table = RouteTable::builder()
        .get("/a", |_req: &Request| Response::text(200, "get a"))
        .post("/a", |_req: &Request| Response::text(200, "post a"))
        .put("/b", |_req: &Request| Response::text(200, "put b"))
        .delete("/b", |_req: &Request| Response::text(200, "delete b"))
        .route("PATCH", "/c", |_req: &Request| Response::text(200, "patch c"))
        .build();
    assert_eq!(Some("get a".to_string()), body_of(&table, "GET", "/a"));
    assert_eq!(Some("post a".to_string()), body_of(&table, "POST", "/a"));
    assert_eq!(Some("put b".to_string()), body_of(&table, "PUT", "/b"));
    assert_eq!(Some("delete b".to_string()), body_of(&table, "DELETE", "/b"));
    assert_eq!(Some("patch c".to_string()), body_of(&table, "PATCH", "/c"));
    // Query strings are ignored.
    assert_eq!(Some("get a".to_string()), body_of(&table, "GET", "/a?x=1"));
    // Method is case-sensitive.
    assert_eq!(None, body_of(&table, "get", "/a"));
    // No prefix or trailing-slash matching.
    assert_eq!(None, body_of(&table, "GET", "/a/"));
    assert_eq!(None, body_of(&table, "GET", "/a/b"));
    assert_eq!(None, body_of(&table, "GET", "/"));
    assert_eq!(None, body_of(&table, "POST", "/b"));
}

#[test]
fn empty_table() {
    let table = RouteTable::builder().build();
    assert!(table.is_empty());
    assert_eq!(0, table.len());
    assert!(!table.has_fallback());
    assert_eq!(None, body_of(&table, "GET", "/"));
}

#[test]
fn fallback() {
    let table = RouteTable::builder()
        .get("/", |_req: &Request| Response::text(200, "home"))
        .fallback(|req: &Request| Response::text(404, format!("no {}", req.path())))
        .build();
    assert!(table.has_fallback());
    assert_eq!(1, table.len());
    assert_eq!(Some("home".to_string()), body_of(&table, "GET", "/"));
    let response = dispatch(&table, "POST", "/x").unwrap().unwrap();
    assert_eq!(404, response.code());
    assert_eq!(b"no /x", response.body());
}

#[test]
fn later_registration_wins() {
    let mut builder = RouteTableBuilder::new();
    builder.add("GET", "/", |_req: &Request| Response::text(200, "first"));
    builder.add("GET", "/", |_req: &Request| Response::text(200, "second"));
    let table = builder.build();
    assert_eq!(1, table.len());
    assert_eq!(Some("second".to_string()), body_of(&table, "GET", "/"));
}

#[test]
fn handler_error() {
    let table = RouteTable::builder()
        .get("/fail", |_req: &Request| {
            Err::<Response, _>(HandlerError::new("boom"))
        })
        .post("/echo", |req: &Request| {
            Ok::<_, HandlerError>(Response::text(200, req.body_utf8()?))
        })
        .build();
    assert_eq!(
        Err(HandlerError::new("boom")),
        dispatch(&table, "GET", "/fail")
    );
    let req = Request::new("POST", "/echo").unwrap().with_body(b"hi".to_vec());
    assert_eq!(b"hi", table.dispatch(&req).unwrap().unwrap().body());
    let req = Request::new("POST", "/echo")
        .unwrap()
        .with_body(vec![0xFF_u8]);
    assert_eq!(
        Err(HandlerError::new("request body is not UTF-8")),
        table.dispatch(&req)
    );
}

#[test]
fn handler_sees_request() {
    let table = RouteTable::builder()
        .post("/r", |req: &Request| {
            Response::text(
                200,
                format!(
                    "{} {} {:?} {:?}",
                    req.method(),
                    req.uri(),
                    req.header("x-a"),
                    req.body_utf8().unwrap()
                ),
            )
        })
        .build();
    let req = Request::new("POST", "/r?q=1")
        .unwrap()
        .with_header("X-A", "1")
        .with_body(b"data".to_vec());
    assert_eq!(
        b"POST /r?q=1 Some(\"1\") \"data\"",
        table.dispatch(&req).unwrap().unwrap().body()
    );
}

#[test]
fn routes_sorted() {
    let table = RouteTable::builder()
        .post("/b", |_req: &Request| Response::new(200))
        .get("/b", |_req: &Request| Response::new(200))
        .get("/a", |_req: &Request| Response::new(200))
        .build();
    let key = |method: &str, path: &str| RouteKey {
        method: method.to_string(),
        path: path.to_string(),
    };
    assert_eq!(
        vec![key("GET", "/a"), key("GET", "/b"), key("POST", "/b")],
        table.routes()
    );
    assert_eq!(
        "RouteTable{[GET /a, GET /b, POST /b]}",
        format!("{table:?}")
    );
}

#[test]
fn new_request_rejects_bad_uri() {
    Request::new("GET", "a").unwrap_err();
    Request::new("GET", "http://h/").unwrap_err();
    Request::new("GET", "/").unwrap();
}
