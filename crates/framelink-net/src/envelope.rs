use serde::{Deserialize, Serialize};

/// JSON command envelope carried above the transport: `{"cmd", "params"}`.
///
/// The transport itself is payload-agnostic; this is the encoding the shell
/// and server dispatch layer agree on.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Request {
    pub cmd: String,
    pub params: Vec<String>,
}

impl Request {
    pub fn new(cmd: impl Into<String>, params: Vec<String>) -> Self {
        Self {
            cmd: cmd.into(),
            params,
        }
    }

    /// Serialize for `Connection::send`.
    pub fn to_bytes(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }

    /// Parse a received payload.
    pub fn from_bytes(bytes: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(bytes)
    }
}
