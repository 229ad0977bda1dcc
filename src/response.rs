use futures_io::AsyncWrite;
use futures_lite::AsyncWriteExt;

use crate::http_error::HttpError;
use crate::util::escape_and_elide;
use crate::HeaderList;
use std::fmt::Debug;

/// Body of the 404 every transport sends on a router miss.
pub const NOT_FOUND_BODY: &str = "Result Not Found";

/// An outbound HTTP response: status code, ordered headers, and body bytes.
#[derive(Clone, Eq, PartialEq)]
pub struct Response {
    code: u16,
    headers: HeaderList,
    body: Vec<u8>,
}
impl Response {
    #[must_use]
    pub fn new(code: u16) -> Self {
        Self {
            code,
            headers: HeaderList::new(),
            body: Vec::new(),
        }
    }

    #[must_use]
    pub fn html(code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(code)
            .with_header("Content-Type", "text/html; charset=UTF-8")
            .with_body(body)
    }

    #[must_use]
    pub fn text(code: u16, body: impl Into<Vec<u8>>) -> Self {
        Self::new(code)
            .with_header("Content-Type", "text/plain")
            .with_body(body)
    }

    /// The fixed response for a router miss.
    #[must_use]
    pub fn not_found_404() -> Self {
        Self::text(404, NOT_FOUND_BODY)
    }

    #[must_use]
    pub fn payload_too_large_413() -> Self {
        Self::text(413, "Uploaded data is too big.")
    }

    #[must_use]
    pub fn internal_server_error_500(body: impl Into<Vec<u8>>) -> Self {
        Self::text(500, body)
    }

    /// Adds a header.
    ///
    /// You can call this multiple times to add multiple headers with the same name.
    ///
    /// [RFC 7230](https://datatracker.ietf.org/doc/html/rfc7230#section-3.2.4)
    /// limits header values to US-ASCII or ISO-8859-1.
    /// Characters outside ISO-8859-1 are sent as byte 0xFF.
    /// CR and LF are sent as spaces.
    pub fn add_header(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.headers.add(name, value);
    }

    pub fn set_body(&mut self, body: impl Into<Vec<u8>>) {
        self.body = body.into();
    }

    pub fn set_code(&mut self, code: u16) {
        self.code = code;
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.set_body(body);
        self
    }

    #[must_use]
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.add_header(name, value);
        self
    }

    #[must_use]
    pub fn with_status(mut self, code: u16) -> Self {
        self.set_code(code);
        self
    }

    #[must_use]
    pub fn code(&self) -> u16 {
        self.code
    }

    #[must_use]
    pub fn headers(&self) -> &HeaderList {
        &self.headers
    }

    #[must_use]
    pub fn header(&self, name: impl AsRef<str>) -> Option<&str> {
        self.headers.get_only(name)
    }

    #[must_use]
    pub fn body(&self) -> &[u8] {
        &self.body
    }

    #[must_use]
    pub fn is_2xx(&self) -> bool {
        (200..300).contains(&self.code)
    }

    #[must_use]
    pub fn is_4xx(&self) -> bool {
        (400..500).contains(&self.code)
    }

    #[must_use]
    pub fn is_5xx(&self) -> bool {
        (500..600).contains(&self.code)
    }
}
impl Debug for Response {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(
            f,
            "Response({} {}, headers={:?}, body={:?})",
            self.code,
            reason_phrase(self.code),
            self.headers,
            escape_and_elide(&self.body, 100),
        )
    }
}

#[must_use]
pub fn reason_phrase(code: u16) -> &'static str {
    // https://developer.mozilla.org/en-US/docs/Web/HTTP/Status
    match code {
        100 => "Continue",
        101 => "Switching Protocols",
        102 => "Processing",
        103 => "Early Hints",
        200 => "OK",
        201 => "Created",
        202 => "Accepted",
        203 => "Non-Authoritative Information",
        204 => "No Content",
        205 => "Reset Content",
        206 => "Partial Content",
        207 => "Multi-Status",
        208 => "Already Reported",
        226 => "IM Used",
        300 => "Multiple Choice",
        301 => "Moved Permanently",
        302 => "Found",
        303 => "See Other",
        304 => "Not Modified",
        307 => "Temporary Redirect",
        308 => "Permanent Redirect",
        400 => "Bad Request",
        401 => "Unauthorized",
        402 => "Payment Required",
        403 => "Forbidden",
        404 => "Not Found",
        405 => "Method Not Allowed",
        406 => "Not Acceptable",
        407 => "Proxy Authentication Required",
        408 => "Request Timeout",
        409 => "Conflict",
        410 => "Gone",
        411 => "Length Required",
        412 => "Precondition Failed",
        413 => "Payload Too Large",
        414 => "URI Too Long",
        415 => "Unsupported Media Type",
        416 => "Range Not Satisfiable",
        417 => "Expectation Failed",
        418 => "I'm a teapot",
        421 => "Misdirected Request",
        422 => "Unprocessable Entity",
        423 => "Locked",
        424 => "Failed Dependency",
        425 => "Too Early",
        426 => "Upgrade Required",
        428 => "Precondition Required",
        429 => "Too Many Requests",
        431 => "Request Header Fields Too Large",
        451 => "Unavailable For Legal Reasons",
        500 => "Internal Server Error",
        501 => "Not Implemented",
        502 => "Bad Gateway",
        503 => "Service Unavailable",
        504 => "Gateway Timeout",
        505 => "HTTP Version Not Supported",
        506 => "Variant Also Negotiates",
        507 => "Insufficient Storage",
        508 => "Loop Detected",
        510 => "Not Extended",
        511 => "Network Authentication Required",
        _ => "Response",
    }
}

/// # Errors
/// Returns an error when the connection is closed.
pub async fn write_http_continue(mut writer: impl AsyncWrite + Unpin) -> Result<(), HttpError> {
    writer
        .write_all(b"HTTP/1.1 100 Continue\r\n\r\n")
        .await
        .map_err(|_| HttpError::Disconnected)?;
    writer.flush().await.map_err(|_| HttpError::Disconnected)
}

/// Writes `response` as an HTTP/1.1 message.
///
/// Any `content-length` header on the response is replaced with the body's real length.
/// When `close` is true, adds `connection: close`.
///
/// # Errors
/// Returns an error when the connection is closed or we fail to send the response.
#[allow(clippy::module_name_repetitions)]
pub async fn write_http_response(
    mut writer: impl AsyncWrite + Unpin,
    response: &Response,
    close: bool,
) -> Result<(), HttpError> {
    // https://datatracker.ietf.org/doc/html/rfc7230#section-3.1.2
    //     status-line = HTTP-version SP status-code SP reason-phrase CRLF
    //     status-code    = 3DIGIT
    //     reason-phrase  = *( HTAB / SP / VCHAR )
    let mut head_bytes: Vec<u8> = format!(
        "HTTP/1.1 {} {}\r\n",
        response.code(),
        reason_phrase(response.code())
    )
    .into_bytes();
    for header in response.headers() {
        if header.name.eq_ignore_ascii_case("content-length")
            || (close && header.name.eq_ignore_ascii_case("connection"))
        {
            continue;
        }
        // Convert headers from UTF-8 back to ISO-8859-1, with 0xFF for a replacement byte.
        // Line breaks would end the header early, so names drop them and values get spaces.
        head_bytes.extend(header.name.bytes().filter(|b| !matches!(b, b'\r' | b'\n')));
        head_bytes.extend(b": ");
        head_bytes.extend(header.value.chars().map(|c| match c {
            '\r' | '\n' => b' ',
            c => u8::try_from(c).unwrap_or(255),
        }));
        head_bytes.extend(b"\r\n");
    }
    head_bytes.extend(format!("content-length: {}\r\n", response.body().len()).as_bytes());
    if close {
        head_bytes.extend(b"connection: close\r\n");
    }
    head_bytes.extend(b"\r\n");
    writer
        .write_all(head_bytes.as_slice())
        .await
        .map_err(|_| HttpError::Disconnected)?;
    drop(head_bytes);
    if !response.body().is_empty() {
        writer
            .write_all(response.body())
            .await
            .map_err(|_| HttpError::Disconnected)?;
    }
    writer.flush().await.map_err(|_| HttpError::Disconnected)
}
