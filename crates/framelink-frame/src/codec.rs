use bytes::{BufMut, Bytes, BytesMut};

use crate::buffer::RecvBuffer;
use crate::error::{FrameError, Result};

/// Frame header: payload length as a big-endian u32. 4 bytes, nothing else:
/// no magic, no version, no checksum.
pub const HEADER_SIZE: usize = 4;

/// Largest payload a 4-byte length header can describe.
pub const MAX_FRAME_PAYLOAD: usize = u32::MAX as usize;

/// Encode a payload into the wire format.
///
/// Wire format:
/// ```text
/// ┌─────────────────┬──────────────────┐
/// │ Length (4B BE)  │ Payload (L bytes)│
/// └─────────────────┴──────────────────┘
/// ```
pub fn encode_frame(payload: &[u8], dst: &mut BytesMut) -> Result<()> {
    if payload.len() > MAX_FRAME_PAYLOAD {
        return Err(FrameError::PayloadTooLarge {
            size: payload.len(),
            max: MAX_FRAME_PAYLOAD,
        });
    }
    dst.reserve(HEADER_SIZE + payload.len());
    dst.put_u32(payload.len() as u32);
    dst.put_slice(payload);
    Ok(())
}

/// Read the payload length from the next frame's header without consuming it.
///
/// Fails with [`FrameError::InsufficientData`] when fewer than
/// [`HEADER_SIZE`] bytes are buffered.
pub fn peek_header(buf: &RecvBuffer) -> Result<u32> {
    let head = buf.peek(HEADER_SIZE)?;
    Ok(u32::from_be_bytes([head[0], head[1], head[2], head[3]]))
}

/// Extract one complete frame payload of `payload_len` bytes, consuming
/// `HEADER_SIZE + payload_len` bytes from the buffer.
///
/// Returns `Ok(None)` and leaves the buffer untouched when the frame is not
/// fully buffered yet.
pub fn extract_frame(buf: &mut RecvBuffer, payload_len: usize) -> Result<Option<Bytes>> {
    if buf.len() < HEADER_SIZE + payload_len {
        return Ok(None);
    }
    let payload = buf.consume(HEADER_SIZE, payload_len)?;
    Ok(Some(Bytes::copy_from_slice(payload)))
}
