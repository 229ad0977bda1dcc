
use crate::test_util::temp_dir_with;
use std::path::Path;
use switchyard::{Request, Response, RouteTable, Router, ServerError, load_route_table, parse_route_table};

fn get(table: &RouteTable, method: &str, uri: &str) -> Option<Response> {
    table.dispatch(&Request::new(method, uri).unwrap()).unwrap()
}

fn invalid_reason(contents: &str) -> String {
    match parse_route_table(Path::new("/nonexistent/routes.json"), contents) {
        Err(ServerError::InvalidRouteTable { path, reason }) => {
            assert_eq!(Path::new("/nonexistent/routes.json"), path);
            reason
        }
        other => panic!("expected InvalidRouteTable, got {other:?}"),
    }
}

#[test]
fn load_ok() {
    let dir = temp_dir_with(&[
        (
            "routes.json",
            r#"{
              "routes": [
                { "path": "/", "headers": [["Content-Type", "text/plain"]], "body": "home" },
                { "method": "GET", "path": "/welcome", "body_file": "welcome.html" },
                { "method": "POST", "path": "/ping", "status": 204 }
              ],
              "fallback": { "status": 404, "body": "nothing here" }
            }"#,
        ),
        ("welcome.html", "<h1>Welcome</h1>"),
    ]);
    let table = load_route_table(&dir.child("routes.json")).unwrap();
    assert_eq!(3, table.len());
    assert!(table.has_fallback());

    let home = get(&table, "GET", "/").unwrap();
    assert_eq!(200, home.code());
    assert_eq!(Some("text/plain"), home.header("content-type"));
    assert_eq!(b"home", home.body());

    let welcome = get(&table, "GET", "/welcome").unwrap();
    assert_eq!(200, welcome.code());
    assert_eq!(b"<h1>Welcome</h1>", welcome.body());

    let ping = get(&table, "POST", "/ping").unwrap();
    assert_eq!(204, ping.code());
    assert!(ping.body().is_empty());

    let miss = get(&table, "GET", "/ping").unwrap();
    assert_eq!(404, miss.code());
    assert_eq!(b"nothing here", miss.body());
}

#[test]
fn no_fallback() {
    let table = parse_route_table(
        Path::new("routes.json"),
        r#"{"routes": [{"path": "/a"}]}"#,
    )
    .unwrap();
    assert!(!table.has_fallback());
    assert_eq!(None, get(&table, "GET", "/b"));
    assert_eq!(200, get(&table, "GET", "/a").unwrap().code());
}

#[test]
fn empty_routes() {
    let table = parse_route_table(Path::new("routes.json"), r#"{"routes": []}"#).unwrap();
    assert!(table.is_empty());
}

#[test]
fn not_found() {
    let dir = temp_dir_with(&[]);
    for path in [dir.child("missing.json"), dir.path().to_path_buf(), "".into()] {
        match load_route_table(&path) {
            Err(ServerError::RoutesFileNotFound { path: p }) => assert_eq!(path, p),
            other => panic!("expected RoutesFileNotFound, got {other:?}"),
        }
    }
}

#[test]
fn load_invalid() {
    let dir = temp_dir_with(&[("routes.json", "not json")]);
    let path = dir.child("routes.json");
    match load_route_table(&path) {
        Err(ServerError::InvalidRouteTable { path: p, .. }) => assert_eq!(path, p),
        other => panic!("expected InvalidRouteTable, got {other:?}"),
    }
}

#[test]
fn invalid_documents() {
    invalid_reason("");
    invalid_reason("[]");
    invalid_reason("{}");
    invalid_reason(r#"{"routes": [], "extra": 1}"#);
    invalid_reason(r#"{"routes": [{"path": "/", "colour": "red"}]}"#);
    invalid_reason(r#"{"routes": [{"method": "GET"}]}"#);
    invalid_reason(r#"{"routes": [{"path": "/", "status": "200"}]}"#);
    invalid_reason(r#"{"routes": [{"path": "/", "headers": {"a": "b"}}]}"#);
}

#[test]
fn invalid_routes() {
    assert!(
        invalid_reason(r#"{"routes": [{"method": "G T", "path": "/"}]}"#)
            .contains("invalid method")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"method": "", "path": "/"}]}"#).contains("invalid method")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "a"}]}"#).contains("does not start with '/'")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "/", "status": 99}]}"#).contains("status 99")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "/", "status": 600}]}"#).contains("status 600")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "/", "headers": [["a b", "c"]]}]}"#)
            .contains("invalid header name")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "/", "headers": [["a", "b\r\nc: d"]]}]}"#)
            .contains("line break")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "/", "body": "a", "body_file": "b"}]}"#)
            .contains("both body and body_file")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "/", "body_file": "missing.html"}]}"#)
            .contains("cannot read body_file")
    );
    assert!(
        invalid_reason(r#"{"routes": [{"path": "/"}, {"method": "GET", "path": "/"}]}"#)
            .contains("duplicate route GET /")
    );
    assert!(
        invalid_reason(r#"{"routes": [], "fallback": {"status": 1000}}"#)
            .contains("fallback: status 1000")
    );
}

#[test]
fn same_path_different_methods() {
    let table = parse_route_table(
        Path::new("routes.json"),
        r#"{"routes": [
            {"method": "GET", "path": "/", "body": "get"},
            {"method": "POST", "path": "/", "body": "post"}
        ]}"#,
    )
    .unwrap();
    assert_eq!(b"get", get(&table, "GET", "/").unwrap().body());
    assert_eq!(b"post", get(&table, "POST", "/").unwrap().body());
}
