use std::io::ErrorKind;
use std::net::{TcpStream, ToSocketAddrs};
use std::time::Duration;

use tracing::debug;

use crate::config::ConnConfig;
use crate::connection::Connection;
use crate::error::Result;

/// TCP connect budget for [`connect`].
pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Establish a framed connection to a remote listener.
pub fn connect(addr: impl ToSocketAddrs, config: ConnConfig) -> Result<Connection> {
    let mut last_err = None;
    for candidate in addr.to_socket_addrs()? {
        match TcpStream::connect_timeout(&candidate, CONNECT_TIMEOUT) {
            Ok(stream) => {
                debug!(addr = %candidate, "connected");
                return Ok(Connection::open(stream, config.clone())?);
            }
            Err(err) => last_err = Some(err),
        }
    }
    Err(last_err
        .unwrap_or_else(|| {
            std::io::Error::new(ErrorKind::InvalidInput, "address resolved to nothing")
        })
        .into())
}
