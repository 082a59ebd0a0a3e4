//! Length-prefixed framing over byte streams.
//!
//! TCP has no message boundaries: a single send may arrive split across
//! several reads, and several sends may arrive coalesced into one. This crate
//! restores boundaries with a 4-byte big-endian length header per message and
//! a growable, compacting receive buffer that reassembles complete frames
//! from arbitrary read chunks.

pub mod buffer;
pub mod codec;
pub mod error;

pub use buffer::RecvBuffer;
pub use codec::{encode_frame, extract_frame, peek_header, HEADER_SIZE, MAX_FRAME_PAYLOAD};
pub use error::{FrameError, Result};
