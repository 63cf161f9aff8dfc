//! Protobuf encoding of dynamic messages.
//!
//! Encoding follows proto3: fields are written in schema order, scalar
//! defaults are omitted and a set embedded message is always written, even
//! when empty. Decoding skips unknown fields and is best-effort: on failure
//! the fields read so far are kept alongside the error.

use std::sync::Arc;

use bytes::BufMut;
use prost::encoding::{
    decode_key, decode_varint, encode_key, encode_varint, encoded_len_varint, key_len,
    skip_field, DecodeContext, WireType,
};

use crate::error::{MessageError, MessageResult};
use crate::{FieldType, Message, MessageSchema, SchemaSet, Value};

/// Maximum embedded message depth accepted by `decode_message`.
pub const DEFAULT_RECURSION_LIMIT: u32 = 100;

/// Result of a best-effort decode.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodeOutcome {
    /// Every field decoded before the first error.
    pub message: Message,
    /// The error that stopped decoding, if any.
    pub error: Option<MessageError>,
}

impl DecodeOutcome {
    /// Returns `true` if the whole payload decoded.
    #[must_use]
    pub const fn is_complete(&self) -> bool {
        self.error.is_none()
    }

    /// Converts into a `Result`, discarding partial data on error.
    pub fn into_result(self) -> MessageResult<Message> {
        match self.error {
            None => Ok(self.message),
            Some(err) => Err(err),
        }
    }
}

/// Returns the wire type a field type is encoded with.
#[must_use]
pub const fn wire_type_of(ty: &FieldType) -> WireType {
    match ty {
        FieldType::Int32 | FieldType::Bool => WireType::Varint,
        FieldType::String | FieldType::Message(_) | FieldType::Repeated(_) => {
            WireType::LengthDelimited
        }
    }
}

/// Returns the encoded length of a message body.
#[must_use]
pub fn encoded_len(message: &Message) -> usize {
    let schema = message.schema();
    schema
        .fields
        .iter()
        .zip(message.values())
        .map(|(field, value)| match value {
            Some(value) => value_len(field.number, value),
            None => 0,
        })
        .sum()
}

/// Encodes a message body into `buf`.
pub fn encode(message: &Message, buf: &mut impl BufMut) {
    let schema = message.schema();
    for (field, value) in schema.fields.iter().zip(message.values()) {
        if let Some(value) = value {
            encode_value(field.number, value, buf);
        }
    }
}

/// Encodes a message body into a new vector.
#[must_use]
pub fn to_vec(message: &Message) -> Vec<u8> {
    let mut buf = Vec::with_capacity(encoded_len(message));
    encode(message, &mut buf);
    buf
}

/// Decodes a message of `schema`, resolving embedded schemas through `set`.
#[must_use]
pub fn decode_message(set: &SchemaSet, schema: &Arc<MessageSchema>, bytes: &[u8]) -> DecodeOutcome {
    let mut message = Message::new(Arc::clone(schema));
    let mut buf = bytes;
    let error = merge(set, &mut message, &mut buf, DEFAULT_RECURSION_LIMIT).err();
    DecodeOutcome { message, error }
}

#[allow(clippy::cast_sign_loss)]
fn encode_value(number: u32, value: &Value, buf: &mut impl BufMut) {
    match value {
        Value::Int32(0) | Value::Bool(false) => {}
        Value::Int32(value) => {
            encode_key(number, WireType::Varint, buf);
            encode_varint(i64::from(*value) as u64, buf);
        }
        Value::Bool(_) => {
            encode_key(number, WireType::Varint, buf);
            encode_varint(1, buf);
        }
        Value::String(value) => {
            if !value.is_empty() {
                encode_key(number, WireType::LengthDelimited, buf);
                encode_varint(value.len() as u64, buf);
                buf.put_slice(value.as_bytes());
            }
        }
        Value::Message(message) => encode_nested(number, message, buf),
        Value::List(items) => {
            for item in items {
                encode_nested(number, item, buf);
            }
        }
    }
}

fn encode_nested(number: u32, message: &Message, buf: &mut impl BufMut) {
    encode_key(number, WireType::LengthDelimited, buf);
    encode_varint(encoded_len(message) as u64, buf);
    encode(message, buf);
}

#[allow(clippy::cast_sign_loss)]
fn value_len(number: u32, value: &Value) -> usize {
    match value {
        Value::Int32(0) | Value::Bool(false) => 0,
        Value::Int32(value) => key_len(number) + encoded_len_varint(i64::from(*value) as u64),
        Value::Bool(_) => key_len(number) + 1,
        Value::String(value) if value.is_empty() => 0,
        Value::String(value) => {
            key_len(number) + encoded_len_varint(value.len() as u64) + value.len()
        }
        Value::Message(message) => nested_len(number, message),
        Value::List(items) => items.iter().map(|item| nested_len(number, item)).sum(),
    }
}

fn nested_len(number: u32, message: &Message) -> usize {
    let body = encoded_len(message);
    key_len(number) + encoded_len_varint(body as u64) + body
}

/// Splits a length-delimited body off the front of the buffer.
fn decode_length_delimited<'a>(buf: &mut &'a [u8], field: &str) -> MessageResult<&'a [u8]> {
    let len = decode_varint(buf)?;
    let len = usize::try_from(len)
        .ok()
        .filter(|&len| len <= buf.len())
        .ok_or_else(|| MessageError::Truncated {
            field: field.to_string(),
        })?;
    let (body, rest) = buf.split_at(len);
    *buf = rest;
    Ok(body)
}

#[allow(clippy::cast_possible_truncation)]
fn merge(set: &SchemaSet, message: &mut Message, buf: &mut &[u8], depth: u32) -> MessageResult<()> {
    let schema = Arc::clone(message.schema());
    while !buf.is_empty() {
        let (number, wire_type) = decode_key(buf)?;
        let Some(index) = schema.field_by_number(number) else {
            skip_field(wire_type, number, buf, DecodeContext::default())?;
            continue;
        };
        let field = &schema.fields[index];
        let expected = wire_type_of(&field.ty);
        if wire_type != expected {
            return Err(MessageError::WireTypeMismatch {
                field: field.name.clone(),
                expected,
                found: wire_type,
            });
        }

        let slot = &mut message.values_mut()[index];
        match &field.ty {
            // int32 is truncated from the 64-bit varint, as protobuf does.
            FieldType::Int32 => *slot = Some(Value::Int32(decode_varint(buf)? as i32)),
            FieldType::Bool => *slot = Some(Value::Bool(decode_varint(buf)? != 0)),
            FieldType::String => {
                let body = decode_length_delimited(buf, &field.name)?;
                let text = std::str::from_utf8(body).map_err(|_| MessageError::InvalidUtf8 {
                    field: field.name.clone(),
                })?;
                *slot = Some(Value::String(text.to_string()));
            }
            FieldType::Message(nested) | FieldType::Repeated(nested) => {
                let mut body = decode_length_delimited(buf, &field.name)?;
                if depth == 0 {
                    return Err(MessageError::RecursionLimit {
                        limit: DEFAULT_RECURSION_LIMIT,
                    });
                }
                let Some(nested) = set.get(nested) else {
                    continue;
                };
                let repeated = matches!(field.ty, FieldType::Repeated(_));
                // Singular embedded messages merge into an existing value.
                let mut item = match slot.take() {
                    Some(Value::Message(existing)) if !repeated => *existing,
                    other => {
                        *slot = other;
                        Message::new(Arc::clone(nested))
                    }
                };
                let result = merge(set, &mut item, &mut body, depth - 1);
                match slot {
                    Some(Value::List(items)) if repeated => items.push(item),
                    _ if repeated => *slot = Some(Value::List(vec![item])),
                    _ => *slot = Some(Value::Message(Box::new(item))),
                }
                result?;
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaId;

    fn schemas() -> SchemaSet {
        SchemaSet::builder()
            .schema(
                MessageSchema::new("Tint")
                    .field("blue", 1, FieldType::Int32)
                    .field("name", 2, FieldType::String)
                    .field("use_tint", 3, FieldType::Bool),
            )
            .schema(
                MessageSchema::new("Equip")
                    .field("material", 1, FieldType::Int32)
                    .field("color", 2, FieldType::message("Tint"))
                    .field("extra", 3, FieldType::repeated("Tint")),
            )
            .schema(
                MessageSchema::new("Node").field("children", 1, FieldType::repeated("Node")),
            )
            .build()
            .unwrap()
    }

    fn message(set: &SchemaSet, id: &str) -> Message {
        set.message(&SchemaId::new(id)).unwrap()
    }

    fn decode(set: &SchemaSet, id: &str, bytes: &[u8]) -> DecodeOutcome {
        decode_message(set, set.get(&SchemaId::new(id)).unwrap(), bytes)
    }

    #[test]
    fn golden_scalar_message() {
        let set = schemas();
        let mut tint = message(&set, "Tint");
        tint.set("blue", Value::Int32(5)).unwrap();
        tint.set("name", Value::String("ab".into())).unwrap();
        tint.set("use_tint", Value::Bool(true)).unwrap();
        assert_eq!(
            to_vec(&tint),
            [0x08, 0x05, 0x12, 0x02, b'a', b'b', 0x18, 0x01]
        );
        assert_eq!(encoded_len(&tint), 8);
    }

    #[test]
    fn negative_int32_is_ten_bytes() {
        let set = schemas();
        let mut tint = message(&set, "Tint");
        tint.set("blue", Value::Int32(-1)).unwrap();
        let bytes = to_vec(&tint);
        assert_eq!(
            bytes,
            [0x08, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01]
        );
        let decoded = decode(&set, "Tint", &bytes);
        assert!(decoded.is_complete());
        assert_eq!(decoded.message.int32("blue"), Some(-1));
    }

    #[test]
    fn defaults_are_not_emitted() {
        let set = schemas();
        let mut tint = message(&set, "Tint");
        tint.set("blue", Value::Int32(0)).unwrap();
        tint.set("name", Value::String(String::new())).unwrap();
        tint.set("use_tint", Value::Bool(false)).unwrap();
        assert!(to_vec(&tint).is_empty());
        assert_eq!(encoded_len(&tint), 0);
    }

    #[test]
    fn empty_nested_message_is_emitted() {
        let set = schemas();
        let mut equip = message(&set, "Equip");
        equip
            .set("color", Value::Message(Box::new(message(&set, "Tint"))))
            .unwrap();
        assert_eq!(to_vec(&equip), [0x12, 0x00]);

        let decoded = decode(&set, "Equip", &[0x12, 0x00]);
        assert!(decoded.message.message("color").is_some());
    }

    #[test]
    fn nested_and_repeated_golden() {
        let set = schemas();
        let mut color = message(&set, "Tint");
        color.set("blue", Value::Int32(3)).unwrap();
        let mut equip = message(&set, "Equip");
        equip.set("material", Value::Int32(150)).unwrap();
        equip
            .set("color", Value::Message(Box::new(color.clone())))
            .unwrap();
        equip.push("extra", color.clone()).unwrap();
        equip.push("extra", message(&set, "Tint")).unwrap();

        let bytes = to_vec(&equip);
        assert_eq!(
            bytes,
            [
                0x08, 0x96, 0x01, // material = 150
                0x12, 0x02, 0x08, 0x03, // color { blue = 3 }
                0x1A, 0x02, 0x08, 0x03, // extra { blue = 3 }
                0x1A, 0x00, // extra {}
            ]
        );
        assert_eq!(encoded_len(&equip), bytes.len());

        let decoded = decode(&set, "Equip", &bytes);
        assert!(decoded.is_complete());
        assert_eq!(decoded.message, equip);
    }

    #[test]
    fn unknown_fields_are_skipped() {
        let set = schemas();
        // field 9 varint, field 10 length-delimited, field 11 fixed32, then blue = 7
        let bytes = [
            0x48, 0x01, 0x52, 0x01, 0xAA, 0x5D, 1, 2, 3, 4, 0x08, 0x07,
        ];
        let decoded = decode(&set, "Tint", &bytes);
        assert!(decoded.is_complete());
        assert_eq!(decoded.message.int32("blue"), Some(7));
    }

    #[test]
    fn truncated_payload_keeps_partial_fields() {
        let set = schemas();
        // blue = 5, then name claims 4 bytes but only 1 follows.
        let bytes = [0x08, 0x05, 0x12, 0x04, b'a'];
        let decoded = decode(&set, "Tint", &bytes);
        assert_eq!(decoded.message.int32("blue"), Some(5));
        assert_eq!(
            decoded.error,
            Some(MessageError::Truncated {
                field: "name".into()
            })
        );
    }

    #[test]
    fn wire_type_mismatch_is_reported() {
        let set = schemas();
        let decoded = decode(&set, "Tint", &[0x0A, 0x00]);
        assert!(matches!(
            decoded.error,
            Some(MessageError::WireTypeMismatch { .. })
        ));
    }

    #[test]
    fn invalid_utf8_is_reported() {
        let set = schemas();
        let decoded = decode(&set, "Tint", &[0x12, 0x01, 0xFF]);
        assert_eq!(
            decoded.error,
            Some(MessageError::InvalidUtf8 {
                field: "name".into()
            })
        );
    }

    #[test]
    fn singular_messages_merge() {
        let set = schemas();
        // color { blue = 1 } then color { name = "x" }
        let bytes = [0x12, 0x02, 0x08, 0x01, 0x12, 0x03, 0x12, 0x01, b'x'];
        let decoded = decode(&set, "Equip", &bytes);
        let color = decoded.message.message("color").unwrap();
        assert_eq!(color.int32("blue"), Some(1));
        assert_eq!(color.string("name"), Some("x"));
    }

    #[test]
    fn recursion_limit_is_enforced() {
        let set = schemas();
        let mut bytes = Vec::new();
        for _ in 0..=DEFAULT_RECURSION_LIMIT {
            let mut outer = Vec::new();
            encode_key(1, WireType::LengthDelimited, &mut outer);
            encode_varint(bytes.len() as u64, &mut outer);
            outer.extend_from_slice(&bytes);
            bytes = outer;
        }
        let decoded = decode(&set, "Node", &bytes);
        assert_eq!(
            decoded.error,
            Some(MessageError::RecursionLimit {
                limit: DEFAULT_RECURSION_LIMIT
            })
        );
    }

    #[test]
    fn malformed_varint_is_a_wire_error() {
        let set = schemas();
        // blue = 5, then a key whose varint never terminates.
        let decoded = decode(&set, "Tint", &[0x08, 0x05, 0x80, 0x80]);
        assert_eq!(decoded.message.int32("blue"), Some(5));
        assert!(matches!(decoded.error, Some(MessageError::Wire(_))));
    }

    #[test]
    fn field_number_zero_is_rejected() {
        let set = schemas();
        let decoded = decode(&set, "Tint", &[0x00, 0x01]);
        assert!(matches!(decoded.error, Some(MessageError::Wire(_))));
    }

    #[test]
    fn unknown_fixed64_is_skipped() {
        let set = schemas();
        // field 12 fixed64, then use_tint = true
        let bytes = [0x61, 1, 2, 3, 4, 5, 6, 7, 8, 0x18, 0x01];
        let decoded = decode(&set, "Tint", &bytes);
        assert!(decoded.is_complete());
        assert_eq!(decoded.message.bool("use_tint"), Some(true));
    }

    #[test]
    fn into_result() {
        let set = schemas();
        assert!(decode(&set, "Tint", &[0x08, 0x01]).into_result().is_ok());
        assert!(decode(&set, "Tint", &[0x08]).into_result().is_err());
    }
}
