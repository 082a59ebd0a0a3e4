use std::time::Duration;

use serde::{Deserialize, Serialize};

use framelink_frame::buffer::DEFAULT_MAX_CAPACITY;

fn default_buf_len() -> usize {
    16 * 1024
}

fn default_buf_max_len() -> usize {
    DEFAULT_MAX_CAPACITY
}

/// Server configuration, supplied once at construction. There is no
/// process-wide mutable configuration; callers own this value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    /// TCP listen address, `host:port`.
    pub address: String,
    /// Initial per-connection receive buffer length in bytes.
    #[serde(default = "default_buf_len")]
    pub buf_len: usize,
    /// Upper bound on per-connection receive buffer growth in bytes.
    #[serde(default = "default_buf_max_len")]
    pub buf_max_len: usize,
}

impl Config {
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            buf_len: default_buf_len(),
            buf_max_len: default_buf_max_len(),
        }
    }
}

/// Per-connection tuning, passed to [`Connection::open`].
///
/// [`Connection::open`]: crate::Connection::open
#[derive(Debug, Clone)]
pub struct ConnConfig {
    /// Initial receive buffer length in bytes.
    pub buf_len: usize,
    /// Upper bound on receive buffer growth in bytes.
    pub buf_max_len: usize,
    /// Depth of the inbound and outbound queues. A full outbound queue
    /// blocks senders (backpressure) instead of growing memory.
    pub queue_depth: usize,
    /// Interval between keep-alive probes. `Duration::ZERO` disables the
    /// keep-alive thread.
    pub keepalive_interval: Duration,
}

impl Default for ConnConfig {
    fn default() -> Self {
        Self {
            buf_len: default_buf_len(),
            buf_max_len: default_buf_max_len(),
            queue_depth: 10,
            keepalive_interval: Duration::from_secs(30),
        }
    }
}

impl ConnConfig {
    /// Derive connection tuning from a server [`Config`]. Server-side
    /// connections answer probes rather than originating them, so the
    /// keep-alive thread stays off.
    pub fn for_server(config: &Config) -> Self {
        Self {
            buf_len: config.buf_len,
            buf_max_len: config.buf_max_len,
            keepalive_interval: Duration::ZERO,
            ..Self::default()
        }
    }
}
