use crate::error::HandlerError;
use crate::head::read_http_head;
use crate::http_error::HttpError;
use crate::util::escape_and_elide;
use crate::HeaderList;
use fixed_buffer::FixedBuf;
use futures_io::AsyncRead;
use std::fmt::Debug;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use url::Url;

/// An inbound HTTP request.
///
/// Transports build one per request read off the wire.
/// You can also build one directly to dispatch it in-process:
/// ```
/// use switchyard::Request;
/// let req = Request::new("POST", "/items?sort=asc")
///     .unwrap()
///     .with_header("Content-Type", "application/json")
///     .with_body(b"{}".to_vec());
/// assert_eq!("/items", req.path());
/// assert_eq!(Some("sort=asc"), req.query());
/// ```
#[derive(Clone, Eq, PartialEq)]
pub struct Request {
    pub(crate) remote_addr: SocketAddr,
    pub(crate) method: String,
    pub(crate) url: Url,
    pub(crate) headers: HeaderList,
    pub(crate) body: Vec<u8>,
    pub(crate) expect_continue: bool,
    pub(crate) keep_alive: bool,
    pub(crate) content_length: u64,
}
impl Request {
    /// Makes a request with no headers and an empty body.
    ///
    /// `uri` is an origin-form request target like `/a/b?c=d`.
    ///
    /// # Errors
    /// Returns [`HttpError::MalformedPath`] when `uri` does not start with `/`
    /// or is not a valid URL path.
    pub fn new(method: impl Into<String>, uri: impl AsRef<str>) -> Result<Self, HttpError> {
        Ok(Self {
            remote_addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 0),
            method: method.into(),
            url: parse_origin_form(uri.as_ref())?,
            headers: HeaderList::new(),
            body: Vec::new(),
            expect_continue: false,
            keep_alive: true,
            content_length: 0,
        })
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.add(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self.content_length = self.body.len() as u64;
        self
    }

    #[must_use]
    pub fn with_remote_addr(mut self, addr: SocketAddr) -> Self {
        self.remote_addr = addr;
        self
    }

    #[must_use]
    pub fn remote_addr(&self) -> SocketAddr {
        self.remote_addr
    }

    #[must_use]
    pub fn method(&self) -> &str {
        &self.method
    }

    #[must_use]
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The URI path, without the query.
    #[must_use]
    pub fn path(&self) -> &str {
        self.url.path()
    }

    #[must_use]
    pub fn query(&self) -> Option<&str> {
        self.url.query()
    }

    /// The request target as the client sent it: path plus `?query` when present.
    #[must_use]
    pub fn uri(&self) -> String {
        match self.url.query() {
            Some(query) => format!("{}?{}", self.url.path(), query),
            None => self.url.path().to_string(),
        }
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    /// Returns the value of the only header named `name`, ignoring case.
    /// Returns `None` when the header is missing or repeated.
    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers.get_only(name)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    /// # Errors
    /// Returns an error when the body is not valid UTF-8.
    pub fn body_utf8(&self) -> Result<&str, HandlerError> {
        std::str::from_utf8(&self.body).map_err(|_| HandlerError::new("request body is not UTF-8"))
    }

    /// False when the client asked to close the connection after this request.
    #[must_use]
    pub fn keep_alive(&self) -> bool {
        self.keep_alive
    }
}
impl Debug for Request {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(
            f,
            "Request{{{}, {}, {:?}, headers={:?}, body={:?}{}}}",
            self.remote_addr,
            self.method(),
            self.uri(),
            self.headers,
            escape_and_elide(&self.body, 100),
            if self.expect_continue { ", expect" } else { "" },
        )
    }
}

fn parse_origin_form(uri: &str) -> Result<Url, HttpError> {
    if !uri.starts_with('/') {
        return Err(HttpError::MalformedPath);
    }
    let base = Url::parse("http://unknown/").map_err(|_| HttpError::MalformedPath)?;
    Url::options()
        .base_url(Some(&base))
        .parse(uri)
        .map_err(|_| HttpError::MalformedPath)
}

/// Reads a request head and decides how the body is framed.
/// The returned request has an empty body and `content_length` set.
///
/// # Errors
/// Returns an error when:
/// - the connection is closed
/// - we fail to read a full request head
/// - we fail to parse the request head
/// - the request uses any transfer encoding
/// - the request has a missing, repeated or non-numeric content-length
#[allow(clippy::module_name_repetitions)]
pub async fn read_http_request<const BUF_SIZE: usize>(
    remote_addr: SocketAddr,
    buf: &mut FixedBuf<BUF_SIZE>,
    reader: impl AsyncRead + Unpin,
) -> Result<Request, HttpError> {
    buf.shift();
    let head = read_http_head(buf, reader).await?;
    let expect_continue = head
        .headers
        .get_only("expect")
        .is_some_and(|s| s.eq_ignore_ascii_case("100-continue"));
    // https://datatracker.ietf.org/doc/html/rfc7230#section-3.3.1
    if head
        .headers
        .get_all("transfer-encoding")
        .iter()
        .any(|s| !s.trim().is_empty())
    {
        return Err(HttpError::UnsupportedTransferEncoding);
    }
    let content_length = match head.headers.get_all("content-length").as_slice() {
        [] => 0,
        [s] => s
            .trim()
            .parse()
            .map_err(|_| HttpError::InvalidContentLength)?,
        _ => return Err(HttpError::InvalidContentLength),
    };
    let connection = head.headers.get_all("connection");
    let has_token = |token: &str| {
        connection
            .iter()
            .flat_map(|s| s.split(','))
            .any(|s| s.trim().eq_ignore_ascii_case(token))
    };
    let keep_alive = if head.http_1_0 {
        has_token("keep-alive")
    } else {
        !has_token("close")
    };
    Ok(Request {
        remote_addr,
        method: head.method,
        url: head.url,
        headers: head.headers,
        body: Vec::new(),
        expect_continue,
        keep_alive,
        content_length,
    })
}
