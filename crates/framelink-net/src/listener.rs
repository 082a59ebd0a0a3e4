use std::net::{SocketAddr, TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use bytes::Bytes;
use tracing::{debug, info, warn};

use crate::config::{Config, ConnConfig};
use crate::connection::{Connection, KEEPALIVE_PAYLOAD};
use crate::envelope::Request;
use crate::error::NetError;

/// Connections idle longer than this are dropped by the read path.
const IDLE_TIMEOUT: Duration = Duration::from_secs(2 * 60);

/// Poll interval for the per-connection dispatch loop.
const DISPATCH_POLL: Duration = Duration::from_secs(1);

/// Accepts framed TCP connections and serves the command protocol on each.
pub struct Server {
    listener: TcpListener,
    config: Config,
}

impl Server {
    /// Bind the configured listen address.
    pub fn bind(config: &Config) -> std::io::Result<Self> {
        let listener = TcpListener::bind(&config.address)?;
        info!(address = %config.address, "listening");
        Ok(Self {
            listener,
            config: config.clone(),
        })
    }

    /// The bound address; useful when the config asked for port 0.
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever, one handler thread per connection.
    /// Accept failures are logged and the loop continues.
    pub fn serve(&self) -> std::io::Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept() {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(error = %err, "accept failed");
                    continue;
                }
            };
            debug!(%peer, "connection accepted");
            let config = self.config.clone();
            thread::Builder::new()
                .name(format!("conn-{peer}"))
                .spawn(move || handle_connection(stream, &config))?;
        }
    }
}

/// Per-connection handler: wrap the socket in a [`Connection`] and answer
/// command envelopes until the peer goes away. All failures are local to
/// this connection.
fn handle_connection(stream: TcpStream, config: &Config) {
    let peer = stream
        .peer_addr()
        .map(|addr| addr.to_string())
        .unwrap_or_else(|_| "unknown".to_string());
    if let Err(err) = stream.set_read_timeout(Some(IDLE_TIMEOUT)) {
        warn!(%peer, error = %err, "failed to set idle timeout");
        return;
    }
    let conn = match Connection::open(stream, ConnConfig::for_server(config)) {
        Ok(conn) => conn,
        Err(err) => {
            warn!(%peer, error = %err, "failed to set up connection");
            return;
        }
    };

    loop {
        let payload = match conn.recv_timeout(DISPATCH_POLL) {
            Ok(payload) => payload,
            Err(NetError::Timeout(_)) => continue,
            Err(_) => break,
        };
        if payload.as_ref() == KEEPALIVE_PAYLOAD {
            debug!(%peer, "keep-alive received");
            continue;
        }
        let reply = dispatch(&payload);
        if conn.send(reply).is_err() {
            break;
        }
    }
    debug!(%peer, "connection finished");
    conn.close();
}

/// Decode one command envelope and produce the reply payload.
pub fn dispatch(payload: &[u8]) -> Bytes {
    match Request::from_bytes(payload) {
        Ok(req) if req.cmd == "ping" => Bytes::from_static(b"pong"),
        Ok(req) => Bytes::from(format!("unknown command: {}", req.cmd)),
        Err(_) => Bytes::from_static(b"malformed request"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatch_answers_ping() {
        let payload = Request::new("ping", Vec::new())
            .to_bytes()
            .expect("request should serialize");
        assert_eq!(dispatch(&payload).as_ref(), b"pong");
    }

    #[test]
    fn dispatch_rejects_unknown_command() {
        let payload = Request::new("flush", Vec::new())
            .to_bytes()
            .expect("request should serialize");
        assert_eq!(dispatch(&payload).as_ref(), b"unknown command: flush");
    }

    #[test]
    fn dispatch_rejects_garbage() {
        assert_eq!(dispatch(b"\xff\xfe"), Bytes::from_static(b"malformed request"));
    }

    #[test]
    fn bind_reports_bound_address() {
        let config = Config::new("127.0.0.1:0");
        let server = Server::bind(&config).expect("server should bind");
        let addr = server.local_addr().expect("server should have an addr");
        assert_ne!(addr.port(), 0);
    }
}
