//! Deterministic schema fingerprints.

use blake3::Hasher;

use crate::{FieldType, MessageSchema, SchemaSet};

/// Computes a deterministic fingerprint of every schema in a set.
#[must_use]
pub fn schema_fingerprint(set: &SchemaSet) -> u64 {
    let mut hasher = Hasher::new();
    write_schemas(&mut hasher, set);
    finish(&hasher)
}

/// Feeds every schema of a set into an existing hasher.
///
/// Used by callers that fingerprint schemas together with other tables.
#[allow(clippy::cast_possible_truncation)]
pub fn write_schemas(hasher: &mut Hasher, set: &SchemaSet) {
    write_u32(hasher, set.len() as u32);
    for schema in set.iter() {
        write_schema(hasher, schema);
    }
}

/// Truncates a hasher's output to 64 bits.
#[must_use]
pub fn finish(hasher: &Hasher) -> u64 {
    let hash = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&hash.as_bytes()[..8]);
    u64::from_le_bytes(bytes)
}

#[allow(clippy::cast_possible_truncation)]
fn write_schema(hasher: &mut Hasher, schema: &MessageSchema) {
    write_str(hasher, schema.id.as_str());
    write_u32(hasher, schema.fields.len() as u32);
    for field in &schema.fields {
        write_str(hasher, &field.name);
        write_u32(hasher, field.number);
        write_type(hasher, &field.ty);
    }
}

fn write_type(hasher: &mut Hasher, ty: &FieldType) {
    match ty {
        FieldType::Int32 => write_u8(hasher, 0),
        FieldType::Bool => write_u8(hasher, 1),
        FieldType::String => write_u8(hasher, 2),
        FieldType::Message(schema) => {
            write_u8(hasher, 3);
            write_str(hasher, schema.as_str());
        }
        FieldType::Repeated(schema) => {
            write_u8(hasher, 4);
            write_str(hasher, schema.as_str());
        }
    }
}

fn write_u8(hasher: &mut Hasher, value: u8) {
    hasher.update(&[value]);
}

fn write_u32(hasher: &mut Hasher, value: u32) {
    hasher.update(&value.to_le_bytes());
}

/// Writes a length-prefixed string so adjacent names cannot collide.
#[allow(clippy::cast_possible_truncation)]
pub fn write_str(hasher: &mut Hasher, value: &str) {
    write_u32(hasher, value.len() as u32);
    hasher.update(value.as_bytes());
}
