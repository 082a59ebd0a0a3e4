//! Framed TCP connections with queued send/receive.
//!
//! A [`Connection`] wraps an established socket and mediates all traffic
//! through two queues so framing, socket I/O, and consumer logic run as
//! independent threads. [`Server`] accepts connections and serves the JSON
//! command protocol; [`connect`] establishes the client side.

pub mod config;
pub mod connection;
pub mod connector;
pub mod envelope;
pub mod error;
pub mod listener;

pub use config::{Config, ConnConfig};
pub use connection::{Connection, State, KEEPALIVE_PAYLOAD};
pub use connector::{connect, CONNECT_TIMEOUT};
pub use envelope::Request;
pub use error::{NetError, Result};
pub use listener::Server;
