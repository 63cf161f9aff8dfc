//! `[opcode][payload]` frames.

use bytes::BufMut;

use crate::error::{DecodeError, EncodeError, LimitKind, WireResult};
use crate::Limits;

/// Size of the little-endian opcode prefix.
pub const OPCODE_SIZE: usize = 2;

/// A decoded frame borrowing its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frame<'a> {
    pub opcode: u16,
    pub payload: &'a [u8],
}

impl<'a> Frame<'a> {
    /// Creates a frame.
    #[must_use]
    pub const fn new(opcode: u16, payload: &'a [u8]) -> Self {
        Self { opcode, payload }
    }

    /// Returns the encoded length of the frame.
    #[must_use]
    pub const fn encoded_len(&self) -> usize {
        OPCODE_SIZE + self.payload.len()
    }

    /// Encodes the frame into a new vector.
    #[must_use]
    pub fn to_vec(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        put_frame(self.opcode, self.payload, &mut out);
        out
    }
}

/// Splits a frame into opcode and payload.
///
/// The payload is not length-prefixed: everything after the opcode belongs to
/// it.
pub fn decode_frame<'a>(bytes: &'a [u8], limits: &Limits) -> WireResult<Frame<'a>> {
    if bytes.len() > limits.max_frame_bytes {
        return Err(DecodeError::LimitsExceeded {
            kind: LimitKind::FrameBytes,
            limit: limits.max_frame_bytes,
            actual: bytes.len(),
        });
    }
    let opcode = frame_opcode(bytes).ok_or(DecodeError::FrameTooShort {
        actual: bytes.len(),
        required: OPCODE_SIZE,
    })?;
    Ok(Frame {
        opcode,
        payload: &bytes[OPCODE_SIZE..],
    })
}

/// Writes `[opcode LE][payload]` into `out`, returning the bytes written.
pub fn encode_frame(
    opcode: u16,
    payload: &[u8],
    limits: &Limits,
    out: &mut impl BufMut,
) -> Result<usize, EncodeError> {
    let length = OPCODE_SIZE + payload.len();
    if length > limits.max_frame_bytes {
        return Err(EncodeError::FrameTooLarge {
            length,
            limit: limits.max_frame_bytes,
        });
    }
    put_frame(opcode, payload, out);
    Ok(length)
}

/// Reads the opcode of a frame without checking limits.
#[must_use]
pub fn frame_opcode(bytes: &[u8]) -> Option<u16> {
    match bytes {
        [lo, hi, ..] => Some(u16::from_le_bytes([*lo, *hi])),
        _ => None,
    }
}

fn put_frame(opcode: u16, payload: &[u8], out: &mut impl BufMut) {
    out.put_u16_le(opcode);
    out.put_slice(payload);
}
