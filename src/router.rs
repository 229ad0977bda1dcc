use crate::error::HandlerError;
use crate::{Request, Response};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

/// Maps a request to a response.
///
/// Returns `Ok(None)` when nothing matches.
/// Providers answer that with the fixed 404.
///
/// Routers are shared between connections and threads, read-only.
pub trait Router: Send + Sync {
    /// # Errors
    /// Returns an error when the matched handler fails.
    fn dispatch(&self, request: &Request) -> Result<Option<Response>, HandlerError>;

    /// Number of exact routes, when the router knows it.
    fn route_count(&self) -> Option<usize> {
        None
    }
}

/// What a route handler may return: a [`Response`] or a
/// `Result<Response, HandlerError>`.
pub trait IntoHandlerResult {
    /// # Errors
    /// Returns the handler's error.
    fn into_handler_result(self) -> Result<Response, HandlerError>;
}
impl IntoHandlerResult for Response {
    fn into_handler_result(self) -> Result<Response, HandlerError> {
        Ok(self)
    }
}
impl<E: Into<HandlerError>> IntoHandlerResult for Result<Response, E> {
    fn into_handler_result(self) -> Result<Response, HandlerError> {
        self.map_err(Into::into)
    }
}

type Handler = Arc<dyn Fn(&Request) -> Result<Response, HandlerError> + Send + Sync>;

fn box_handler<R, F>(handler: F) -> Handler
where
    R: IntoHandlerResult,
    F: Fn(&Request) -> R + Send + Sync + 'static,
{
    Arc::new(move |req: &Request| handler(req).into_handler_result())
}

/// A route key: HTTP method and URI path.
#[derive(Clone, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct RouteKey {
    pub method: String,
    pub path: String,
}

/// An immutable table of exact method + path routes.
///
/// Build one with [`RouteTable::builder`]:
/// ```
/// use switchyard::{Request, Response, RouteTable, Router};
/// let table = RouteTable::builder()
///     .get("/", |_req: &Request| Response::text(200, "home"))
///     .build();
/// let req = Request::new("GET", "/?utm=1").unwrap();
/// assert_eq!(b"home", table.dispatch(&req).unwrap().unwrap().body());
/// ```
#[derive(Clone, Default)]
pub struct RouteTable {
    routes: HashMap<RouteKey, Handler>,
    fallback: Option<Handler>,
}
impl RouteTable {
    #[must_use]
    pub fn builder() -> RouteTableBuilder {
        RouteTableBuilder::new()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// The registered routes, sorted by path then method.
    #[must_use]
    pub fn routes(&self) -> Vec<RouteKey> {
        let mut keys: Vec<RouteKey> = self.routes.keys().cloned().collect();
        keys.sort_by(|a, b| (&a.path, &a.method).cmp(&(&b.path, &b.method)));
        keys
    }

    #[must_use]
    pub fn has_fallback(&self) -> bool {
        self.fallback.is_some()
    }
}
impl Router for RouteTable {
    fn dispatch(&self, request: &Request) -> Result<Option<Response>, HandlerError> {
        let key = RouteKey {
            method: request.method().to_string(),
            path: request.path().to_string(),
        };
        match self.routes.get(&key).or(self.fallback.as_ref()) {
            Some(handler) => handler(request).map(Some),
            None => Ok(None),
        }
    }

    fn route_count(&self) -> Option<usize> {
        Some(self.len())
    }
}
impl Debug for RouteTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        let routes: Vec<String> = self
            .routes()
            .iter()
            .map(|k| format!("{} {}", k.method, k.path))
            .collect();
        write!(
            f,
            "RouteTable{{[{}]{}}}",
            routes.join(", "),
            if self.fallback.is_some() {
                ", fallback"
            } else {
                ""
            }
        )
    }
}

/// Collects routes for a [`RouteTable`].
///
/// Registering the same method and path twice keeps the later handler.
#[derive(Default)]
pub struct RouteTableBuilder {
    table: RouteTable,
}
impl RouteTableBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a route.  `method` is matched case-sensitively and `path` exactly,
    /// ignoring the request's query string.
    pub fn add<R, F>(&mut self, method: impl Into<String>, path: impl Into<String>, handler: F)
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        let key = RouteKey {
            method: method.into(),
            path: path.into(),
        };
        self.table.routes.insert(key, box_handler(handler));
    }

    /// Sets the handler for requests that match no route.
    pub fn set_fallback<R, F>(&mut self, handler: F)
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        self.table.fallback = Some(box_handler(handler));
    }

    #[must_use]
    pub fn route<R, F>(
        mut self,
        method: impl Into<String>,
        path: impl Into<String>,
        handler: F,
    ) -> Self
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        self.add(method, path, handler);
        self
    }

    #[must_use]
    pub fn get<R, F>(self, path: impl Into<String>, handler: F) -> Self
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        self.route("GET", path, handler)
    }

    #[must_use]
    pub fn post<R, F>(self, path: impl Into<String>, handler: F) -> Self
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        self.route("POST", path, handler)
    }

    #[must_use]
    pub fn put<R, F>(self, path: impl Into<String>, handler: F) -> Self
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        self.route("PUT", path, handler)
    }

    #[must_use]
    pub fn delete<R, F>(self, path: impl Into<String>, handler: F) -> Self
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        self.route("DELETE", path, handler)
    }

    #[must_use]
    pub fn fallback<R, F>(mut self, handler: F) -> Self
    where
        R: IntoHandlerResult,
        F: Fn(&Request) -> R + Send + Sync + 'static,
    {
        self.set_fallback(handler);
        self
    }

    #[must_use]
    pub fn build(self) -> RouteTable {
        self.table
    }
}
