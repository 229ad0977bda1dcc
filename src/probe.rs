use futures_lite::{AsyncReadExt, AsyncWriteExt};
use std::future::Future;
use std::net::SocketAddr;
use std::pin::Pin;
use std::time::Duration;

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ProbeOutcome {
    /// Something is already serving the address.
    Live,
    Absent,
}

pub type ProbeFuture<'a> = Pin<Box<dyn Future<Output = ProbeOutcome> + Send + 'a>>;

/// Checks whether another server already answers on an address, before binding it.
pub trait LivenessProbe: Send + Sync {
    /// `address` is the `host:port` string the provider was given.
    /// `addr` is what it resolved to.
    fn probe(&self, address: &str, addr: SocketAddr) -> ProbeFuture<'_>;
}

/// Sends `GET /` and reports [`ProbeOutcome::Live`] when an HTTP response comes back.
#[derive(Clone, Debug)]
pub struct HttpGetProbe {
    pub timeout: Duration,
}
impl HttpGetProbe {
    #[must_use]
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    async fn get(addr: SocketAddr, host: String) -> Result<bool, std::io::Error> {
        let mut stream = async_net::TcpStream::connect(addr).await?;
        let request = format!("GET / HTTP/1.1\r\nHost: {host}\r\nConnection: close\r\n\r\n");
        stream.write_all(request.as_bytes()).await?;
        stream.flush().await?;
        let mut buf = [0_u8; 5];
        let mut len = 0;
        while len < buf.len() {
            match stream.read(&mut buf[len..]).await? {
                0 => break,
                n => len += n,
            }
        }
        Ok(&buf[..len] == b"HTTP/")
    }
}
impl Default for HttpGetProbe {
    fn default() -> Self {
        Self::new(Duration::from_secs(1))
    }
}
impl LivenessProbe for HttpGetProbe {
    fn probe(&self, address: &str, addr: SocketAddr) -> ProbeFuture<'_> {
        let host = address.to_string();
        Box::pin(async move {
            match safina::timer::with_timeout(Self::get(addr, host), self.timeout).await {
                Ok(Ok(true)) => ProbeOutcome::Live,
                Ok(Ok(false) | Err(..)) | Err(safina::timer::DeadlineExceededError) => {
                    ProbeOutcome::Absent
                }
            }
        })
    }
}

/// Reports [`ProbeOutcome::Live`] when a TCP connection succeeds.
#[derive(Clone, Debug)]
pub struct TcpConnectProbe {
    pub timeout: Duration,
}
impl Default for TcpConnectProbe {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
        }
    }
}
impl LivenessProbe for TcpConnectProbe {
    fn probe(&self, _address: &str, addr: SocketAddr) -> ProbeFuture<'_> {
        Box::pin(async move {
            match safina::timer::with_timeout(async_net::TcpStream::connect(addr), self.timeout)
                .await
            {
                Ok(Ok(_stream)) => ProbeOutcome::Live,
                Ok(Err(..)) | Err(safina::timer::DeadlineExceededError) => ProbeOutcome::Absent,
            }
        })
    }
}

/// Never probes.  Bind errors are then the only way to find a running peer.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProbe;
impl LivenessProbe for NoProbe {
    fn probe(&self, _address: &str, _addr: SocketAddr) -> ProbeFuture<'_> {
        Box::pin(async { ProbeOutcome::Absent })
    }
}
