use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::error::{Result, TransportError};
use crate::stream::DaemonStream;

/// Host used when no address is configured.
pub const DEFAULT_HOST: &str = "localhost";

/// Port the daemon listens on by default.
pub const DEFAULT_PORT: u16 = 8888;

/// Connect to the daemon at `host:port` (blocking).
///
/// Every resolved address is tried in order. The returned stream has
/// `TCP_NODELAY` set since the protocol exchanges small request/response
/// headers.
pub fn connect(host: &str, port: u16) -> Result<DaemonStream> {
    connect_inner(host, port, None)
}

/// Connect with an upper bound on each connection attempt.
pub fn connect_timeout(host: &str, port: u16, timeout: Duration) -> Result<DaemonStream> {
    connect_inner(host, port, Some(timeout))
}

fn connect_inner(host: &str, port: u16, timeout: Option<Duration>) -> Result<DaemonStream> {
    let addr = format!("{host}:{port}");
    let candidates: Vec<SocketAddr> = (host, port)
        .to_socket_addrs()
        .map_err(|source| TransportError::Resolve {
            addr: addr.clone(),
            source,
        })?
        .collect();

    let mut last_err = None;
    for candidate in candidates {
        let attempt = match timeout {
            Some(timeout) => TcpStream::connect_timeout(&candidate, timeout),
            None => TcpStream::connect(candidate),
        };
        match attempt {
            Ok(stream) => {
                stream.set_nodelay(true)?;
                debug!(%candidate, "connected to daemon");
                return Ok(DaemonStream::from_tcp(stream));
            }
            Err(err) => {
                debug!(%candidate, error = %err, "connect attempt failed");
                last_err = Some(err);
            }
        }
    }

    Err(TransportError::Connect {
        addr,
        source: last_err.unwrap_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::NotFound, "no addresses resolved")
        }),
    })
}

#[cfg(test)]
mod tests {
    use std::io::{Read, Write};
    use std::net::TcpListener;

    use super::*;

    #[test]
    fn connect_and_exchange() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let handle = std::thread::spawn(move || {
            let (mut server, _) = listener.accept().unwrap();
            let mut buf = [0u8; 5];
            server.read_exact(&mut buf).unwrap();
            server.write_all(&buf).unwrap();
        });

        let mut client = connect("127.0.0.1", port).unwrap();
        client.write_all(b"hello").unwrap();
        let mut buf = [0u8; 5];
        client.read_exact(&mut buf).unwrap();
        assert_eq!(&buf, b"hello");

        handle.join().unwrap();
    }

    #[test]
    fn connect_refused_is_connect_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let result = connect("127.0.0.1", port);
        assert!(matches!(result, Err(TransportError::Connect { .. })));
    }

    #[test]
    fn connect_timeout_succeeds_against_listener() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let client = connect_timeout("127.0.0.1", port, Duration::from_secs(2)).unwrap();
        assert_eq!(client.peer_addr().unwrap().port(), port);
    }
}
