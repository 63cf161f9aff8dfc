#![no_main]

use std::sync::{Arc, OnceLock};

use codec::{Codec, CodecLimits, NullSink};
use libfuzzer_sys::fuzz_target;

fn codec() -> &'static Codec {
    static CODEC: OnceLock<Codec> = OnceLock::new();
    CODEC.get_or_init(|| {
        Codec::new(Arc::new(legacy_registry::registry().unwrap()))
            .with_limits(CodecLimits::for_testing())
            .with_wire_limits(wire::Limits::for_testing())
    })
}

fuzz_target!(|data: &[u8]| {
    let codec = codec();
    let Ok(decoded) = codec.decode_frame(data, &mut NullSink) else {
        return;
    };
    let Some(opcode) = wire::frame_opcode(data) else {
        return;
    };
    // A decoded record always re-encodes unless it is the empty record.
    if !decoded.record.is_empty() {
        let _ = codec.encode(opcode, &decoded.record, &mut NullSink);
    }
});
