use crate::token_set::{Token, TokenSet};
use permit::Permit;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::time::Duration;

#[must_use]
pub fn socket_addr_127_0_0_1_any_port() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 0)
}

#[must_use]
pub fn socket_addr_127_0_0_1(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), port)
}

#[must_use]
pub fn socket_addr_all_interfaces(port: u16) -> SocketAddr {
    SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)
}

#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub enum AcceptResult<S> {
    Ok(S, SocketAddr),
    TooManyOpenFiles,
    Err(std::io::Error),
}
impl<S> AcceptResult<S> {
    #[must_use]
    pub fn new(res: Result<(S, SocketAddr), std::io::Error>) -> Self {
        match res {
            Ok((stream, addr)) => AcceptResult::Ok(stream, addr),
            // On Unix, std translates errno EMFILE (Too many open files) into
            // ErrorKind::Other (stable) or ErrorKind::Uncategorized (unstable).
            // The docs say that we shouldn't use either of these.
            // So we check for the POSIX errno EMFILE value: 24.
            Err(e) if e.raw_os_error() == Some(24) => AcceptResult::TooManyOpenFiles,
            Err(e) => AcceptResult::Err(e),
        }
    }
}

/// Accepts connections and passes them to `conn_handler`, one token per connection.
///
/// Returns when `permit` is revoked.
/// Notices the revocation within 500 ms, even with no incoming connections.
/// Waits and retries when accepting fails with `EMFILE` (Too many open files)
/// or any other error.
#[allow(clippy::module_name_repetitions)]
pub async fn accept_loop<F>(
    permit: Permit,
    listener: async_net::TcpListener,
    mut token_set: TokenSet,
    conn_handler: F,
) where
    F: Fn(Permit, Token, async_net::TcpStream, SocketAddr) + 'static + Send,
{
    loop {
        let Some(token) = token_set.async_wait_token().await else {
            return;
        };
        if permit.is_revoked() {
            return;
        }
        match safina::timer::with_timeout(listener.accept(), Duration::from_millis(500)).await {
            Ok(res) => match AcceptResult::new(res) {
                AcceptResult::Ok(stream, addr) => {
                    conn_handler(permit.new_sub(), token, stream, addr);
                }
                AcceptResult::TooManyOpenFiles => {
                    tracing::warn!("too many open files, pausing accept");
                    safina::timer::sleep_for(Duration::from_millis(500)).await;
                }
                AcceptResult::Err(e) => {
                    tracing::error!("error accepting connection: {e}");
                    safina::timer::sleep_for(Duration::from_millis(100)).await;
                }
            },
            Err(safina::timer::DeadlineExceededError) => {}
        }
    }
}
