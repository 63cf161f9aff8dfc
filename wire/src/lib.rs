//! Opcode framing for the structwire bridge.
//!
//! A frame is a 2-byte little-endian opcode followed by the message payload.
//! There is no length prefix: the payload encoding is self-delimiting and the
//! transport delivers whole frames. This crate knows nothing about what the
//! payload contains.

mod error;
mod frame;
mod limits;

pub use error::{DecodeError, EncodeError, LimitKind, WireResult};
pub use frame::{decode_frame, encode_frame, frame_opcode, Frame, OPCODE_SIZE};
pub use limits::Limits;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = Limits::default();
        let _ = OPCODE_SIZE;
        let _: WireResult<()> = Ok(());
        let _ = LimitKind::FrameBytes;
    }

    #[test]
    fn roundtrip_through_public_api() {
        let mut out = Vec::new();
        encode_frame(0x0102, b"payload", &Limits::default(), &mut out).unwrap();
        let frame = decode_frame(&out, &Limits::default()).unwrap();
        assert_eq!(frame, Frame::new(0x0102, b"payload"));
    }
}
