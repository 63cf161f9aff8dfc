//! The decode and encode entry points.

use std::sync::Arc;

use layout::RecordBuffer;
use schema::{decode_message, Message};
use tracing::debug;
use wire::{Frame, Limits as WireLimits, WireResult};

use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::error::CodecResult;
use crate::limits::CodecLimits;
use crate::registry::OpcodeRegistry;
use crate::walk::{Direction, ToMessage, ToRecord, Walk};

/// A decoded record and the packed size of its bound fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Decoded {
    pub record: RecordBuffer,
    pub size: usize,
}

impl Decoded {
    /// The result for traffic that cannot be bound: an empty record of size 0.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            record: RecordBuffer::empty(),
            size: 0,
        }
    }
}

/// Converts between legacy records and protobuf frames.
///
/// Cheap to clone; clones share the registry.
#[derive(Debug, Clone)]
pub struct Codec {
    registry: Arc<OpcodeRegistry>,
    limits: CodecLimits,
    wire_limits: WireLimits,
}

impl Codec {
    /// Creates a codec with default limits.
    #[must_use]
    pub fn new(registry: Arc<OpcodeRegistry>) -> Self {
        Self {
            registry,
            limits: CodecLimits::default(),
            wire_limits: WireLimits::default(),
        }
    }

    /// Replaces the traversal limits.
    #[must_use]
    pub fn with_limits(mut self, limits: CodecLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Replaces the frame limits.
    #[must_use]
    pub fn with_wire_limits(mut self, limits: WireLimits) -> Self {
        self.wire_limits = limits;
        self
    }

    /// The shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<OpcodeRegistry> {
        &self.registry
    }

    /// The traversal limits.
    #[must_use]
    pub const fn limits(&self) -> &CodecLimits {
        &self.limits
    }

    /// Decodes a payload into a record.
    ///
    /// Never fails: unknown opcodes yield an empty record, and every other
    /// problem is reported to `sink` while the best-effort record is returned.
    pub fn decode(&self, opcode: u16, payload: &[u8], sink: &mut dyn DiagnosticSink) -> Decoded {
        let Some(schema) = self.registry.schema(opcode) else {
            sink.report(Diagnostic::UnknownOpcode {
                opcode,
                flow: ToRecord::FLOW,
            });
            return Decoded::empty();
        };

        let outcome = decode_message(self.registry.schemas(), schema, payload);
        if let Some(error) = outcome.error {
            sink.report(Diagnostic::MalformedPayload { opcode, error });
        }

        match self.bind_message(opcode, &outcome.message, sink) {
            Some(decoded) => {
                debug!(
                    opcode,
                    payload = payload.len(),
                    size = decoded.size,
                    "decoded record"
                );
                decoded
            }
            None => Decoded::empty(),
        }
    }

    /// Splits a frame and decodes its payload.
    pub fn decode_frame(&self, frame: &[u8], sink: &mut dyn DiagnosticSink) -> WireResult<Decoded> {
        let Frame { opcode, payload } = wire::decode_frame(frame, &self.wire_limits)?;
        Ok(self.decode(opcode, payload, sink))
    }

    /// Encodes a record into an `[opcode][payload]` frame.
    ///
    /// Returns `Ok(None)` when the opcode is unknown or the record has the
    /// wrong layout; both are reported to `sink`.
    pub fn encode(
        &self,
        opcode: u16,
        record: &RecordBuffer,
        sink: &mut dyn DiagnosticSink,
    ) -> CodecResult<Option<Vec<u8>>> {
        let Some(message) = self.to_message(opcode, record, sink)? else {
            return Ok(None);
        };

        let payload = schema::to_vec(&message);
        let mut frame = Vec::with_capacity(wire::OPCODE_SIZE + payload.len());
        wire::encode_frame(opcode, &payload, &self.wire_limits, &mut frame)?;
        debug!(opcode, bytes = frame.len(), "encoded frame");
        Ok(Some(frame))
    }

    /// Converts a record into a message without serializing it.
    pub fn to_message(
        &self,
        opcode: u16,
        record: &RecordBuffer,
        sink: &mut dyn DiagnosticSink,
    ) -> CodecResult<Option<Message>> {
        let Some(descriptor) = self.registry.lookup(opcode) else {
            sink.report(Diagnostic::UnknownOpcode {
                opcode,
                flow: ToMessage::FLOW,
            });
            return Ok(None);
        };
        if record.layout_id() != &descriptor.record_layout {
            sink.report(Diagnostic::LayoutMismatch {
                opcode,
                expected: descriptor.record_layout.clone(),
                found: record.layout_id().clone(),
            });
            return Ok(None);
        }
        self.walk(sink).run::<ToMessage>(opcode, record, 0).map(Some)
    }

    /// Converts a message into a record without parsing bytes.
    ///
    /// Unlike `decode`, hard errors are returned rather than reported.
    pub fn from_message(
        &self,
        opcode: u16,
        message: &Message,
        sink: &mut dyn DiagnosticSink,
    ) -> CodecResult<Option<Decoded>> {
        let Some(plan) = self.registry.plan(opcode) else {
            sink.report(Diagnostic::UnknownOpcode {
                opcode,
                flow: ToRecord::FLOW,
            });
            return Ok(None);
        };
        let record = self.walk(sink).run::<ToRecord>(opcode, message, 0)?;
        Ok(Some(Decoded {
            record,
            size: plan.occupied_size(),
        }))
    }

    /// Walks a decoded message into a record, reporting a hard error and
    /// keeping the partial record.
    fn bind_message(
        &self,
        opcode: u16,
        message: &Message,
        sink: &mut dyn DiagnosticSink,
    ) -> Option<Decoded> {
        let size = self.registry.plan(opcode)?.occupied_size();
        let mut record = self.registry.allocate(opcode)?;
        let result = self
            .walk(sink)
            .fill::<ToRecord>(opcode, message, &mut record, 0);
        if let Err(error) = result {
            sink.report(Diagnostic::Aborted { opcode, error });
        }
        Some(Decoded { record, size })
    }

    fn walk<'a>(&'a self, sink: &'a mut dyn DiagnosticSink) -> Walk<'a> {
        Walk {
            registry: &self.registry,
            limits: &self.limits,
            sink,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::{Flow, NullSink};
    use crate::registry::OpcodeDescriptor;
    use layout::{FieldKind, LayoutSet, RecordLayout};
    use schema::{FieldType, MessageSchema, SchemaSet};

    fn codec() -> Codec {
        let layouts = LayoutSet::new(vec![RecordLayout::new("MoneyUpdate")
            .field("platinum", FieldKind::sint(4))
            .field("gold", FieldKind::sint(4))])
        .unwrap();
        let schemas = SchemaSet::new(vec![MessageSchema::new("MoneyUpdate")
            .field("platinum", 1, FieldType::Int32)
            .field("gold", 2, FieldType::Int32)])
        .unwrap();
        let registry = OpcodeRegistry::builder(layouts, schemas)
            .opcode(OpcodeDescriptor::new(0x0100, "MoneyUpdate", "MoneyUpdate"))
            .build()
            .unwrap();
        Codec::new(Arc::new(registry))
    }

    #[test]
    fn encode_prefixes_opcode() {
        let codec = codec();
        let mut record = codec.registry().allocate(0x0100).unwrap();
        record.set_int("platinum", 1).unwrap();
        let frame = codec.encode(0x0100, &record, &mut NullSink).unwrap().unwrap();
        assert_eq!(frame, [0x00, 0x01, 0x08, 0x01]);
    }

    #[test]
    fn decode_reads_fields_and_size() {
        let codec = codec();
        let decoded = codec.decode(0x0100, &[0x08, 0x05, 0x10, 0x07], &mut NullSink);
        assert_eq!(decoded.size, 8);
        assert_eq!(decoded.record.int("platinum").unwrap(), 5);
        assert_eq!(decoded.record.int("gold").unwrap(), 7);
    }

    #[test]
    fn decode_frame_rejects_short_frames() {
        let codec = codec();
        assert!(codec.decode_frame(&[0x01], &mut NullSink).is_err());
        let decoded = codec.decode_frame(&[0x00, 0x01], &mut NullSink).unwrap();
        assert_eq!(decoded.record.int("gold").unwrap(), 0);
    }

    #[test]
    fn unknown_opcode_reports_flow() {
        let codec = codec();
        let mut sink = Vec::new();
        let decoded = codec.decode(0xFFFF, &[], &mut sink);
        assert!(decoded.record.is_empty());
        assert_eq!(decoded.size, 0);
        let record = codec.registry().allocate(0x0100).unwrap();
        assert_eq!(codec.encode(0xFFFF, &record, &mut sink).unwrap(), None);
        assert_eq!(
            sink,
            vec![
                Diagnostic::UnknownOpcode {
                    opcode: 0xFFFF,
                    flow: Flow::Decode
                },
                Diagnostic::UnknownOpcode {
                    opcode: 0xFFFF,
                    flow: Flow::Encode
                },
            ]
        );
    }

    #[test]
    fn codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync + Clone>() {}
        assert_send_sync::<Codec>();
    }
}
