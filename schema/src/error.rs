//! Schema validation and message errors.

use std::fmt;

use prost::encoding::WireType;
use prost::DecodeError;

use crate::SchemaId;

/// Result type for schema operations.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Result type for message operations.
pub type MessageResult<T> = Result<T, MessageError>;

/// Errors that can occur when building or validating a schema set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// Schema name is empty.
    EmptySchemaId,

    /// Duplicate schema name in a schema set.
    DuplicateSchema { schema: SchemaId },

    /// Duplicate field name within a schema.
    DuplicateFieldName { schema: SchemaId, field: String },

    /// Duplicate field number within a schema.
    DuplicateFieldNumber { schema: SchemaId, number: u32 },

    /// Field number is zero, too large, or reserved.
    InvalidFieldNumber {
        schema: SchemaId,
        field: String,
        number: u32,
    },

    /// A message field references a schema that is not in the set.
    UnknownSchema { schema: SchemaId },
}

impl fmt::Display for SchemaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptySchemaId => write!(f, "schema name must not be empty"),
            Self::DuplicateSchema { schema } => write!(f, "duplicate schema {schema}"),
            Self::DuplicateFieldName { schema, field } => {
                write!(f, "duplicate field {field} in schema {schema}")
            }
            Self::DuplicateFieldNumber { schema, number } => {
                write!(f, "duplicate field number {number} in schema {schema}")
            }
            Self::InvalidFieldNumber {
                schema,
                field,
                number,
            } => {
                write!(f, "invalid field number {number} for {schema}.{field}")
            }
            Self::UnknownSchema { schema } => write!(f, "unknown schema {schema}"),
        }
    }
}

impl std::error::Error for SchemaError {}

/// Errors that can occur when building or decoding a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageError {
    /// Malformed protobuf framing: a bad varint, key or skipped field.
    Wire(DecodeError),

    /// A known field arrived with the wrong wire type.
    WireTypeMismatch {
        field: String,
        expected: WireType,
        found: WireType,
    },

    /// A string field is not valid UTF-8.
    InvalidUtf8 { field: String },

    /// A length-delimited field runs past the end of the buffer.
    Truncated { field: String },

    /// Embedded messages nest deeper than the recursion limit.
    RecursionLimit { limit: u32 },

    /// No field with this name or index in the schema.
    UnknownField { schema: SchemaId, field: String },

    /// The value does not match the field type.
    TypeMismatch {
        schema: SchemaId,
        field: String,
        expected: String,
    },
}

impl fmt::Display for MessageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Wire(err) => write!(f, "invalid protobuf: {err}"),
            Self::WireTypeMismatch {
                field,
                expected,
                found,
            } => {
                write!(
                    f,
                    "field {field} expected wire type {}, got {}",
                    wire_type_name(*expected),
                    wire_type_name(*found)
                )
            }
            Self::InvalidUtf8 { field } => write!(f, "field {field} is not valid UTF-8"),
            Self::Truncated { field } => write!(f, "field {field} is truncated"),
            Self::RecursionLimit { limit } => {
                write!(f, "message nesting exceeds recursion limit {limit}")
            }
            Self::UnknownField { schema, field } => {
                write!(f, "no field {field} in schema {schema}")
            }
            Self::TypeMismatch {
                schema,
                field,
                expected,
            } => {
                write!(f, "{schema}.{field} expects a {expected} value")
            }
        }
    }
}

impl std::error::Error for MessageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Wire(err) => Some(err),
            _ => None,
        }
    }
}

impl From<DecodeError> for MessageError {
    fn from(err: DecodeError) -> Self {
        Self::Wire(err)
    }
}

const fn wire_type_name(wire_type: WireType) -> &'static str {
    match wire_type {
        WireType::Varint => "varint",
        WireType::SixtyFourBit => "64-bit",
        WireType::LengthDelimited => "length-delimited",
        WireType::StartGroup => "start-group",
        WireType::EndGroup => "end-group",
        WireType::ThirtyTwoBit => "32-bit",
    }
}
