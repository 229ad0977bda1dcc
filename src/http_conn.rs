use crate::http_error::HttpError;
use crate::request::read_http_request;
use crate::response::{write_http_continue, write_http_response};
use crate::{Request, Response};
use fixed_buffer::FixedBuf;
use futures_io::{AsyncRead, AsyncWrite};
use futures_lite::io::AssertAsync;
use futures_lite::AsyncReadExt;
use permit::Permit;
use std::future::Future;
use std::net::{Shutdown, SocketAddr};

/// A byte stream a connection can be served over.
///
/// The event loop serves `async_net::TcpStream`.
/// The worker pool serves blocking `std::net::TcpStream` wrapped in `AssertAsync`.
pub trait ConnStream: AsyncRead + AsyncWrite + Unpin + Send {
    fn shutdown_stream(&self, how: Shutdown);
}
impl ConnStream for async_net::TcpStream {
    fn shutdown_stream(&self, how: Shutdown) {
        let _ignored = self.shutdown(how);
    }
}
impl ConnStream for AssertAsync<std::net::TcpStream> {
    fn shutdown_stream(&self, how: Shutdown) {
        let _ignored = self.get_ref().shutdown(how);
    }
}

pub struct HttpConn<S: ConnStream> {
    pub remote_addr: SocketAddr,
    pub buf: FixedBuf<8192>,
    pub stream: S,
}
impl<S: ConnStream> HttpConn<S> {
    #[must_use]
    pub fn new(remote_addr: SocketAddr, stream: S) -> Self {
        Self {
            remote_addr,
            buf: FixedBuf::new(),
            stream,
        }
    }

    pub fn shutdown(&mut self) {
        self.stream.shutdown_stream(Shutdown::Both);
    }

    /// Reads one request, including its body.
    ///
    /// # Errors
    /// Returns an error when:
    /// - the connection is closed
    /// - we fail to read or parse the request head
    /// - the body is longer than `max_body_len`
    /// - the client sends fewer body bytes than it promised
    pub async fn read_request(&mut self, max_body_len: usize) -> Result<Request, HttpError> {
        let mut req = read_http_request(self.remote_addr, &mut self.buf, &mut self.stream).await?;
        if req.content_length == 0 {
            return Ok(req);
        }
        let len = usize::try_from(req.content_length).map_err(|_| HttpError::BodyTooLong)?;
        if len > max_body_len {
            return Err(HttpError::BodyTooLong);
        }
        if req.expect_continue && self.buf.is_empty() {
            write_http_continue(&mut self.stream).await?;
        }
        let mut body = Vec::with_capacity(len);
        AsyncReadExt::take((&mut self.buf).chain(&mut self.stream), req.content_length)
            .read_to_end(&mut body)
            .await
            .map_err(|_| HttpError::Truncated)?;
        if body.len() < len {
            return Err(HttpError::Truncated);
        }
        req.body = body;
        Ok(req)
    }

    /// # Errors
    /// Returns an error when the connection is closed or we fail to send the response.
    pub async fn write_response(
        &mut self,
        response: &Response,
        close: bool,
    ) -> Result<(), HttpError> {
        write_http_response(&mut self.stream, response, close).await
    }
}

/// Serves requests on `http_conn` until the client closes the connection, asks to close it,
/// sends a bad request, or `permit` is revoked.
#[allow(clippy::module_name_repetitions)]
pub async fn handle_http_conn<S, F, Fut>(
    permit: Permit,
    mut http_conn: HttpConn<S>,
    small_body_len: usize,
    request_handler: F,
) where
    S: ConnStream,
    Fut: Future<Output = Response>,
    F: Fn(Request) -> Fut,
{
    while !permit.is_revoked() {
        let req = match http_conn.read_request(small_body_len).await {
            Ok(req) => req,
            Err(HttpError::Disconnected) => return,
            Err(e) => {
                tracing::debug!(
                    remote_addr = %http_conn.remote_addr,
                    "closing connection: {}",
                    e.description()
                );
                if let Some(response) = e.into_response() {
                    let _ignored = http_conn.write_response(&response, true).await;
                }
                http_conn.shutdown();
                return;
            }
        };
        let close = !req.keep_alive();
        let response = request_handler(req).await;
        if http_conn
            .write_response(&response, close || permit.is_revoked())
            .await
            .is_err()
            || close
        {
            http_conn.shutdown();
            return;
        }
    }
}
