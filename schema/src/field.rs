//! Message field types and descriptors.

use std::fmt;
use std::ops::RangeInclusive;

/// Largest field number allowed by the protobuf encoding.
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

/// Field numbers reserved by the protobuf implementation.
pub const RESERVED_FIELD_NUMBERS: RangeInclusive<u32> = 19_000..=19_999;

/// Name of a message schema.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct SchemaId(String);

impl SchemaId {
    /// Creates a schema id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the schema name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the name is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for SchemaId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SchemaId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The type of a message field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldType {
    /// 32-bit signed integer (varint).
    Int32,

    /// Boolean (varint 0/1).
    Bool,

    /// UTF-8 string.
    String,

    /// Optional embedded message.
    Message(SchemaId),

    /// Repeated embedded message.
    Repeated(SchemaId),
}

impl FieldType {
    /// Creates an embedded message type.
    pub fn message(schema: impl Into<SchemaId>) -> Self {
        Self::Message(schema.into())
    }

    /// Creates a repeated message type.
    pub fn repeated(schema: impl Into<SchemaId>) -> Self {
        Self::Repeated(schema.into())
    }

    /// Returns the schema referenced by a message type.
    #[must_use]
    pub fn message_schema(&self) -> Option<&SchemaId> {
        match self {
            Self::Message(schema) | Self::Repeated(schema) => Some(schema),
            _ => None,
        }
    }

    /// Returns `true` for the scalar types.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(self, Self::Int32 | Self::Bool | Self::String)
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int32 => write!(f, "int32"),
            Self::Bool => write!(f, "bool"),
            Self::String => write!(f, "string"),
            Self::Message(schema) => write!(f, "{schema}"),
            Self::Repeated(schema) => write!(f, "repeated {schema}"),
        }
    }
}

/// A named, numbered field of a message schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageField {
    pub name: String,
    pub number: u32,
    #[cfg_attr(feature = "serde", serde(rename = "type"))]
    pub ty: FieldType,
}

impl MessageField {
    /// Creates a message field.
    pub fn new(name: impl Into<String>, number: u32, ty: FieldType) -> Self {
        Self {
            name: name.into(),
            number,
            ty,
        }
    }
}
