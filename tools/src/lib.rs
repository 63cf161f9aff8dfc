//! Inspection and conversion helpers for structwire frames.
//!
//! Records are shown as JSON objects keyed by field name. Fixed and owned
//! strings become JSON strings (a null owned string is `null`), embedded
//! records become objects, and fixed arrays and linked lists become arrays.
//! A list node's own link field is left out; the list already orders it.

use anyhow::{anyhow, bail, Context, Result};
use codec::{Codec, Diagnostic, OpcodeRegistry};
use layout::{FieldKind, LayoutSet, RecordBuffer, Slot};
use serde::Serialize;
use serde_json::{Map, Value};

/// What `inspect` prints about one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub opcode: u16,
    pub name: Option<&'static str>,
    pub record_layout: Option<String>,
    pub message_schema: Option<String>,
    pub payload_len: usize,
    pub record_size: Option<usize>,
}

/// What `decode` prints about one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DecodeReport {
    pub opcode: u16,
    pub name: Option<&'static str>,
    pub size: usize,
    pub record: Value,
    pub diagnostics: Vec<String>,
}

/// Describes a frame without decoding its payload.
pub fn inspect_frame(
    registry: &OpcodeRegistry,
    bytes: &[u8],
    limits: &wire::Limits,
) -> Result<InspectReport> {
    let frame = wire::decode_frame(bytes, limits).context("split frame")?;
    let descriptor = registry.lookup(frame.opcode);
    Ok(InspectReport {
        opcode: frame.opcode,
        name: legacy_registry::opcode_name(frame.opcode),
        record_layout: descriptor.map(|d| d.record_layout.to_string()),
        message_schema: descriptor.map(|d| d.message_schema.to_string()),
        payload_len: frame.payload.len(),
        record_size: registry.plan(frame.opcode).map(codec::BindingPlan::occupied_size),
    })
}

/// Decodes a frame and renders the record as JSON.
pub fn decode_frame_json(codec: &Codec, bytes: &[u8]) -> Result<DecodeReport> {
    let mut diagnostics: Vec<Diagnostic> = Vec::new();
    let decoded = codec
        .decode_frame(bytes, &mut diagnostics)
        .context("split frame")?;
    let opcode = wire::frame_opcode(bytes).unwrap_or_default();
    Ok(DecodeReport {
        opcode,
        name: legacy_registry::opcode_name(opcode),
        size: decoded.size,
        record: record_to_json(&decoded.record),
        diagnostics: diagnostics.iter().map(ToString::to_string).collect(),
    })
}

/// Renders a decode report for humans.
pub fn format_decode_pretty(report: &DecodeReport) -> String {
    let mut out = format!(
        "opcode: {:#06x} ({})\nsize: {} bytes\n",
        report.opcode,
        report.name.unwrap_or("unnamed"),
        report.size
    );
    if let Value::Object(fields) = &report.record {
        for (name, value) in fields {
            out.push_str(&format!("  {name}: {value}\n"));
        }
    }
    for diagnostic in &report.diagnostics {
        out.push_str(&format!("warning: {diagnostic}\n"));
    }
    out
}

/// Converts a record into a JSON object.
pub fn record_to_json(record: &RecordBuffer) -> Value {
    let layout = record.layout();
    let link = layout.link_field();
    let mut object = Map::new();
    for (index, (field, slot)) in layout.fields.iter().zip(record.slots()).enumerate() {
        if Some(index) == link {
            continue;
        }
        let value = match slot {
            Slot::Int(value) => Value::from(*value),
            Slot::Bool(value) => Value::Bool(*value),
            Slot::Bytes(bytes) => Value::String(layout::read_c_str(bytes)),
            Slot::Str(text) => text.clone().map_or(Value::Null, Value::String),
            Slot::Record(nested) => record_to_json(nested),
            Slot::Array(items) => Value::Array(items.iter().map(record_to_json).collect()),
            Slot::Link(_) => Value::Array(
                record
                    .list_at(index)
                    .into_iter()
                    .flatten()
                    .map(record_to_json)
                    .collect(),
            ),
        };
        object.insert(field.name.clone(), value);
    }
    Value::Object(object)
}

/// Builds a record of an opcode's layout from a JSON object.
///
/// Fields missing from the object stay zeroed; unknown fields are errors.
pub fn record_from_json(registry: &OpcodeRegistry, opcode: u16, value: &Value) -> Result<RecordBuffer> {
    let mut record = registry
        .allocate(opcode)
        .ok_or_else(|| anyhow!("unknown opcode {opcode:#06x}"))?;
    fill_record(registry.layouts(), &mut record, value)?;
    Ok(record)
}

fn fill_record(layouts: &LayoutSet, record: &mut RecordBuffer, value: &Value) -> Result<()> {
    let Value::Object(object) = value else {
        bail!("expected an object for {}", record.layout_id());
    };
    let layout = record.layout().clone();
    for (name, value) in object {
        let index = layout
            .field_index(name)
            .ok_or_else(|| anyhow!("no field {name} in {}", layout.id))?;
        let context = || format!("field {}.{name}", layout.id);
        match &layout.fields[index].kind {
            FieldKind::ScalarInt { .. } => {
                let number = value
                    .as_i64()
                    .or_else(|| value.as_u64().map(|n| n as i64))
                    .ok_or_else(|| anyhow!("expected an integer"))
                    .with_context(context)?;
                record.set_int(name, number).with_context(context)?;
            }
            FieldKind::ScalarBool => {
                let flag = value
                    .as_bool()
                    .ok_or_else(|| anyhow!("expected a bool"))
                    .with_context(context)?;
                record.set_bool(name, flag).with_context(context)?;
            }
            FieldKind::FixedString { .. } | FieldKind::FixedStringArray { .. } => {
                let text = expect_str(value).with_context(context)?;
                record.set_fixed_str(name, text).with_context(context)?;
            }
            FieldKind::OwnedString => {
                let text = match value {
                    Value::Null => None,
                    other => Some(expect_str(other).with_context(context)?.to_string()),
                };
                record.set_owned_str(name, text).with_context(context)?;
            }
            FieldKind::NestedSingle { .. } => {
                let nested = record.nested_mut(name).with_context(context)?;
                fill_record(layouts, nested, value)?;
            }
            FieldKind::NestedFixedArray { count, .. } => {
                let items = expect_array(value).with_context(context)?;
                if items.len() > *count {
                    bail!("{}: {} elements for {count} slots", context(), items.len());
                }
                let slots = record.array_mut(name).with_context(context)?;
                for (slot, item) in slots.iter_mut().zip(items) {
                    fill_record(layouts, slot, item)?;
                }
            }
            FieldKind::NestedFlexibleList { layout: node } => {
                let items = expect_array(value).with_context(context)?;
                let mut nodes = Vec::with_capacity(items.len());
                for item in items {
                    let mut entry = layouts.allocate(node).with_context(context)?;
                    fill_record(layouts, &mut entry, item)?;
                    nodes.push(entry);
                }
                record.set_list(name, nodes).with_context(context)?;
            }
        }
    }
    Ok(())
}

fn expect_str(value: &Value) -> Result<&str> {
    value.as_str().ok_or_else(|| anyhow!("expected a string"))
}

fn expect_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| anyhow!("expected an array"))
}

/// Parses an opcode given as decimal or `0x`-prefixed hex.
pub fn parse_opcode(text: &str) -> Result<u16> {
    let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => text.parse(),
    };
    parsed.with_context(|| format!("invalid opcode {text}"))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use legacy_registry::{OP_SEND_CHAR_INFO, OP_ZONE_SERVER_INFO};
    use serde_json::json;

    fn codec() -> Codec {
        Codec::new(Arc::new(legacy_registry::registry().unwrap()))
    }

    #[test]
    fn parse_opcode_accepts_hex_and_decimal() {
        assert_eq!(parse_opcode("0x0022").unwrap(), 0x22);
        assert_eq!(parse_opcode("34").unwrap(), 34);
        assert!(parse_opcode("0xZZ").is_err());
        assert!(parse_opcode("70000").is_err());
    }

    #[test]
    fn json_record_round_trip() {
        let codec = codec();
        let input = json!({
            "character_count": 2,
            "characters": [
                { "name": "Firiona", "level": 60, "equip": [{ "material": 3, "color": { "red": 255 } }] },
                { "name": "Lanys", "level": 45 }
            ]
        });
        let record = record_from_json(codec.registry(), OP_SEND_CHAR_INFO, &input).unwrap();
        let output = record_to_json(&record);
        assert_eq!(output["character_count"], json!(2));
        assert_eq!(output["characters"][1]["name"], json!("Lanys"));
        assert_eq!(output["characters"][0]["equip"][0]["color"]["red"], json!(255));
        assert_eq!(output["characters"][0]["equip"].as_array().unwrap().len(), 9);
        assert!(output["characters"][0].get("next").is_none());
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let codec = codec();
        let err = record_from_json(codec.registry(), OP_ZONE_SERVER_INFO, &json!({ "host": "x" }))
            .unwrap_err();
        assert!(err.to_string().contains("host"));
    }

    #[test]
    fn decode_report_for_encoded_frame() {
        let codec = codec();
        let record = record_from_json(
            codec.registry(),
            OP_ZONE_SERVER_INFO,
            &json!({ "ip": "127.0.0.1", "port": 7000 }),
        )
        .unwrap();
        let frame = codec
            .encode(OP_ZONE_SERVER_INFO, &record, &mut codec::NullSink)
            .unwrap()
            .unwrap();

        let report = decode_frame_json(&codec, &frame).unwrap();
        assert_eq!(report.opcode, OP_ZONE_SERVER_INFO);
        assert_eq!(report.name, Some("OP_ZoneServerInfo"));
        assert_eq!(report.size, 130);
        assert_eq!(report.record["port"], json!(7000));
        assert!(report.diagnostics.is_empty());
        assert!(format_decode_pretty(&report).contains("port: 7000"));

        let inspect = inspect_frame(codec.registry(), &frame, &wire::Limits::default()).unwrap();
        assert_eq!(inspect.record_layout.as_deref(), Some("ZoneServerInfo"));
        assert_eq!(inspect.payload_len, frame.len() - 2);
    }

    #[test]
    fn unknown_opcode_decodes_to_empty_object() {
        let codec = codec();
        let report = decode_frame_json(&codec, &[0xFF, 0x7F]).unwrap();
        assert_eq!(report.record, json!({}));
        assert_eq!(report.diagnostics.len(), 1);
    }
}
