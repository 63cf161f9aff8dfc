//! Message schemas and protobuf encoding for the structwire bridge.
//!
//! This crate defines the modern side of the bridge:
//! - Message schemas with named, numbered, typed fields
//! - Dynamic messages holding optional values per field
//! - Proto3 wire encoding and best-effort decoding
//! - Deterministic schema fingerprints
//!
//! # Design Principles
//!
//! - **Runtime schemas** - Schemas are data, loaded once; no generated code.
//! - **Wire compatible** - Output matches what a protobuf compiler would emit
//!   for the same `.proto` definition.
//! - **Best-effort decoding** - A malformed payload yields the fields read
//!   before the fault, plus the error.

mod error;
mod field;
mod hash;
mod message;
mod proto;
mod schema;

pub use error::{MessageError, MessageResult, SchemaError, SchemaResult};
pub use field::{FieldType, MessageField, SchemaId, MAX_FIELD_NUMBER, RESERVED_FIELD_NUMBERS};
pub use hash::{finish as finish_fingerprint, schema_fingerprint, write_schemas, write_str};
pub use message::{Message, Value};
pub use proto::{
    decode_message, encode, encoded_len, to_vec, wire_type_of, DecodeOutcome,
    DEFAULT_RECURSION_LIMIT,
};
pub use prost::encoding::WireType;
pub use schema::{MessageSchema, SchemaSet, SchemaSetBuilder};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_api_exports() {
        let _ = FieldType::Int32;
        let _ = MessageSchema::new("Zero");
        let _ = SchemaSet::default();
        let _: SchemaResult<()> = Ok(());
        let _: MessageResult<()> = Ok(());
        let _ = DEFAULT_RECURSION_LIMIT;
    }

    #[test]
    fn empty_schema_encodes_to_nothing() {
        let set = SchemaSet::new(vec![MessageSchema::new("Zero")]).unwrap();
        let message = set.message(&SchemaId::new("Zero")).unwrap();
        assert!(to_vec(&message).is_empty());
        let decoded = decode_message(&set, message.schema(), &[]);
        assert!(decoded.is_complete());
    }
}
