//! Declarative route tables stored as JSON.
//!
//! ```json
//! {
//!   "routes": [
//!     { "path": "/", "headers": [["Content-Type", "text/html"]], "body": "<h1>Hi</h1>" },
//!     { "method": "GET", "path": "/welcome", "body_file": "welcome.html" },
//!     { "method": "POST", "path": "/ping", "status": 204 }
//!   ],
//!   "fallback": { "status": 404, "body": "nothing here" }
//! }
//! ```
//!
//! `method` defaults to `GET` and `status` to 200.
//! `body_file` paths are relative to the routes file's directory and are read at load time.
//! Without a `fallback`, misses get the provider's fixed 404.
use crate::error::ServerError;
use crate::router::{RouteKey, RouteTable, RouteTableBuilder};
use crate::{Request, Response};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

fn default_method() -> String {
    "GET".to_string()
}

fn default_status() -> u16 {
    200
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoutesDocument {
    routes: Vec<RouteEntry>,
    #[serde(default)]
    fallback: Option<FallbackEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RouteEntry {
    #[serde(default = "default_method")]
    method: String,
    path: String,
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_file: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct FallbackEntry {
    #[serde(default = "default_status")]
    status: u16,
    #[serde(default)]
    headers: Vec<(String, String)>,
    #[serde(default)]
    body: Option<String>,
    #[serde(default)]
    body_file: Option<PathBuf>,
}

fn is_token(s: &str) -> bool {
    // https://datatracker.ietf.org/doc/html/rfc7230#section-3.2.6
    !s.is_empty()
        && s.bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b))
}

struct Loader<'a> {
    path: &'a Path,
    base_dir: &'a Path,
}
impl Loader<'_> {
    fn invalid(&self, reason: impl Into<String>) -> ServerError {
        ServerError::InvalidRouteTable {
            path: self.path.to_path_buf(),
            reason: reason.into(),
        }
    }

    fn response(
        &self,
        what: &str,
        status: u16,
        headers: Vec<(String, String)>,
        body: Option<String>,
        body_file: Option<PathBuf>,
    ) -> Result<Response, ServerError> {
        if !(100..=599).contains(&status) {
            return Err(self.invalid(format!("{what}: status {status} is not in 100..=599")));
        }
        let mut response = Response::new(status);
        for (name, value) in headers {
            if !is_token(&name) {
                return Err(self.invalid(format!("{what}: invalid header name {name:?}")));
            }
            if value.contains(['\r', '\n']) {
                return Err(self.invalid(format!("{what}: header {name} has a line break")));
            }
            response.add_header(name, value);
        }
        match (body, body_file) {
            (Some(_), Some(_)) => {
                return Err(self.invalid(format!("{what}: has both body and body_file")));
            }
            (Some(body), None) => response.set_body(body),
            (None, Some(file)) => {
                let file_path = self.base_dir.join(&file);
                let bytes = std::fs::read(&file_path).map_err(|e| {
                    self.invalid(format!("{what}: cannot read body_file {file_path:?}: {e}"))
                })?;
                response.set_body(bytes);
            }
            (None, None) => {}
        }
        Ok(response)
    }

    fn build(&self, contents: &str) -> Result<RouteTable, ServerError> {
        let doc: RoutesDocument =
            serde_json::from_str(contents).map_err(|e| self.invalid(e.to_string()))?;
        let mut builder = RouteTableBuilder::new();
        let mut seen: HashSet<RouteKey> = HashSet::new();
        for (n, entry) in doc.routes.into_iter().enumerate() {
            let what = format!("route {n}");
            if !is_token(&entry.method) {
                return Err(self.invalid(format!("{what}: invalid method {:?}", entry.method)));
            }
            if !entry.path.starts_with('/') {
                return Err(self.invalid(format!(
                    "{what}: path {:?} does not start with '/'",
                    entry.path
                )));
            }
            let key = RouteKey {
                method: entry.method.clone(),
                path: entry.path.clone(),
            };
            if !seen.insert(key) {
                return Err(self.invalid(format!(
                    "{what}: duplicate route {} {}",
                    entry.method, entry.path
                )));
            }
            let response = self.response(
                &what,
                entry.status,
                entry.headers,
                entry.body,
                entry.body_file,
            )?;
            builder.add(entry.method, entry.path, move |_req: &Request| {
                response.clone()
            });
        }
        if let Some(entry) = doc.fallback {
            let response = self.response(
                "fallback",
                entry.status,
                entry.headers,
                entry.body,
                entry.body_file,
            )?;
            builder.set_fallback(move |_req: &Request| response.clone());
        }
        Ok(builder.build())
    }
}

/// Parses a routes document.
/// `path` names the document in errors, and its directory anchors `body_file` paths.
///
/// # Errors
/// Returns [`ServerError::InvalidRouteTable`] when the document is not valid.
pub fn parse_route_table(path: &Path, contents: &str) -> Result<RouteTable, ServerError> {
    let loader = Loader {
        path,
        base_dir: path.parent().unwrap_or_else(|| Path::new("")),
    };
    loader.build(contents)
}

/// Reads and parses a routes file.
///
/// # Errors
/// Returns an error when:
/// - the file does not exist
/// - we fail to read the file
/// - the file is not a valid routes document
pub fn load_route_table(path: &Path) -> Result<RouteTable, ServerError> {
    if path.as_os_str().is_empty() || !path.is_file() {
        return Err(ServerError::RoutesFileNotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| ServerError::InvalidRouteTable {
        path: path.to_path_buf(),
        reason: format!("cannot read file: {e}"),
    })?;
    let table = parse_route_table(path, &contents)?;
    tracing::debug!(path = %path.display(), routes = table.len(), "loaded route table");
    Ok(table)
}
