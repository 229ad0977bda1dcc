use crate::http_error::HttpError;
use crate::util::find_slice;
use crate::{Header, HeaderList};
use fixed_buffer::FixedBuf;
use futures_io::AsyncRead;
use futures_lite::AsyncReadExt;
use safe_regex::{Matcher2, Matcher3, regex};
use url::Url;

fn trim_trailing_cr(bytes: &[u8]) -> &[u8] {
    match bytes.split_last() {
        Some((b'\r', rest)) => rest,
        _ => bytes,
    }
}

fn trim_whitespace(bytes: &[u8]) -> &[u8] {
    let is_ws = |b: &u8| matches!(b, b' ' | b'\t' | b'\r' | b'\n');
    let start = bytes.iter().position(|b| !is_ws(b)).unwrap_or(bytes.len());
    let end = bytes.iter().rposition(|b| !is_ws(b)).map_or(start, |n| n + 1);
    &bytes[start..end]
}

#[allow(clippy::module_name_repetitions)]
#[derive(Copy, Clone, Debug, Eq, Hash, Ord, PartialOrd, PartialEq)]
pub enum HeadError {
    Truncated,
    MissingRequestLine,
    MalformedRequestLine,
    MalformedPath,
    UnsupportedProtocol,
    MalformedHeader,
}

/// The request line and header fields of an HTTP/1.x request.
#[derive(Clone, Eq, PartialEq)]
pub struct Head {
    pub method: String,
    pub url: Url,
    pub http_1_0: bool,
    pub headers: HeaderList,
}
impl Head {
    fn read_head_bytes<const BUF_SIZE: usize>(
        buf: &mut FixedBuf<BUF_SIZE>,
    ) -> Result<&[u8], HeadError> {
        let head_len = find_slice(b"\r\n\r\n", buf.readable()).ok_or(HeadError::Truncated)?;
        let head_bytes_with_delim = buf
            .try_read_exact(head_len + 4)
            .ok_or(HeadError::Truncated)?;
        Ok(&head_bytes_with_delim[0..head_len])
    }

    fn parse_request_line(line: &[u8]) -> Result<(String, Url, bool), HeadError> {
        // https://datatracker.ietf.org/doc/html/rfc7230#section-3.1.1
        //     request-line   = method SP request-target SP HTTP-version CRLF
        //     method         = token
        //     origin-form    = absolute-path [ "?" query ]
        #[allow(clippy::assign_op_pattern)]
        #[allow(clippy::range_plus_one)]
        let matcher: Matcher3<_> =
            regex!(br"([-!#$%&'*+.^_`|~0-9A-Za-z]+) ([^ \t\r\n]+) ([^ \t\r\n]+)");
        let (method_bytes, path_bytes, proto_bytes) = matcher
            .match_slices(line)
            .ok_or(HeadError::MalformedRequestLine)?;
        let method = std::str::from_utf8(method_bytes)
            .map_err(|_| HeadError::MalformedRequestLine)?
            .to_string();
        let url_string = std::str::from_utf8(path_bytes).map_err(|_| HeadError::MalformedPath)?;
        if url_string != "*" && !url_string.starts_with('/') {
            return Err(HeadError::MalformedPath);
        }
        let base = Url::parse("http://unknown/").map_err(|_| HeadError::MalformedPath)?;
        let url = Url::options()
            .base_url(Some(&base))
            .parse(url_string)
            .map_err(|_| HeadError::MalformedPath)?;
        let http_1_0 = match proto_bytes {
            b"HTTP/1.1" => false,
            b"HTTP/1.0" => true,
            _ => return Err(HeadError::UnsupportedProtocol),
        };
        Ok((method, url, http_1_0))
    }

    fn latin1_bytes_to_utf8(bytes: &[u8]) -> String {
        bytes.iter().map(|&b| b as char).collect()
    }

    fn parse_header_line(line: &[u8]) -> Result<Header, HeadError> {
        // https://datatracker.ietf.org/doc/html/rfc7230#section-3.2
        //     header-field   = field-name ":" OWS field-value OWS
        // Values may carry ISO-8859-1 octets (obs-text), which we map char-for-byte.
        #[allow(clippy::range_plus_one)]
        #[allow(clippy::assign_op_pattern)]
        let matcher: Matcher2<_> = regex!(br"([-!#$%&'*+.^_`|~0-9A-Za-z]+):[ \t]*(.*)[ \t]*");
        let (name_bytes, value_bytes) = matcher
            .match_slices(line)
            .ok_or(HeadError::MalformedHeader)?;
        let name = Self::latin1_bytes_to_utf8(name_bytes);
        let value = Self::latin1_bytes_to_utf8(trim_whitespace(value_bytes));
        Ok(Header::new(name, value))
    }

    /// # Errors
    /// Returns an error when:
    /// - the buffer does not contain a full request head, ending in `"\r\n\r\n"`
    /// - we fail to parse the request head
    pub fn try_read<const BUF_SIZE: usize>(
        buf: &mut FixedBuf<BUF_SIZE>,
    ) -> Result<Self, HeadError> {
        let head = Self::read_head_bytes(buf)?;
        let mut lines = head.split(|b| *b == b'\n').map(trim_trailing_cr);
        let request_line = lines.next().ok_or(HeadError::MissingRequestLine)?;
        let (method, url, http_1_0) = Self::parse_request_line(request_line)?;
        let mut headers = HeaderList::new();
        for line in lines {
            headers.push(Self::parse_header_line(line)?);
        }
        Ok(Self {
            method,
            url,
            http_1_0,
            headers,
        })
    }
}
impl core::fmt::Debug for Head {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> Result<(), core::fmt::Error> {
        write!(
            f,
            "Head{{method={:?}, path={:?}, query={:?}, headers={:?}}}",
            self.method,
            self.url.path(),
            self.url.query().unwrap_or(""),
            self.headers
        )
    }
}

/// # Errors
/// Returns an error when:
/// - the connection is closed
/// - we fail to read a request head
/// - the request head is too long
/// - we fail to parse the request head
pub async fn read_http_head<const BUF_SIZE: usize>(
    buf: &mut FixedBuf<BUF_SIZE>,
    mut stream: impl AsyncRead + Unpin,
) -> Result<Head, HttpError> {
    loop {
        match Head::try_read(buf) {
            Ok(head) => return Ok(head),
            Err(HeadError::Truncated) => {}
            Err(e) => return Err(e.into()),
        }
        if buf.writable().is_empty() {
            return Err(HttpError::HeadTooLong);
        }
        match stream.read(buf.writable()).await {
            Err(..) | Ok(0) if buf.is_empty() => return Err(HttpError::Disconnected),
            Err(..) | Ok(0) => return Err(HttpError::Truncated),
            Ok(n) => buf.wrote(n),
        }
    }
}
