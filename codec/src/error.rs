//! Error types for registry construction and codec operations.

use std::fmt;

use layout::{LayoutError, LayoutId};
use schema::{MessageError, SchemaError, SchemaId};

/// Result type for codec operations.
pub type CodecResult<T> = Result<T, CodecError>;

/// Result type for registry construction.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Hard failures of a decode or encode call.
///
/// Per-field problems are reported as diagnostics instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// A linked list is longer than the configured maximum.
    MalformedList {
        opcode: u16,
        field: String,
        limit: usize,
    },

    /// Nested records go deeper than the configured maximum.
    DepthExceeded { opcode: u16, limit: usize },

    /// A nested binding names an opcode the registry has no plan for.
    MissingPlan { opcode: u16 },

    /// Record access failed.
    Layout(LayoutError),

    /// Message access failed.
    Message(MessageError),

    /// Frame could not be written.
    Frame(wire::EncodeError),
}

impl fmt::Display for CodecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedList {
                opcode,
                field,
                limit,
            } => {
                write!(
                    f,
                    "malformed list {field} in opcode {opcode:#06x}: more than {limit} nodes"
                )
            }
            Self::DepthExceeded { opcode, limit } => {
                write!(f, "opcode {opcode:#06x} nests deeper than {limit} levels")
            }
            Self::MissingPlan { opcode } => write!(f, "no binding plan for opcode {opcode:#06x}"),
            Self::Layout(err) => write!(f, "record error: {err}"),
            Self::Message(err) => write!(f, "message error: {err}"),
            Self::Frame(err) => write!(f, "frame error: {err}"),
        }
    }
}

impl std::error::Error for CodecError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            Self::Message(err) => Some(err),
            Self::Frame(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutError> for CodecError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl From<MessageError> for CodecError {
    fn from(err: MessageError) -> Self {
        Self::Message(err)
    }
}

impl From<wire::EncodeError> for CodecError {
    fn from(err: wire::EncodeError) -> Self {
        Self::Frame(err)
    }
}

/// Errors that can occur when building an opcode registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// Two descriptors use the same opcode.
    DuplicateOpcode { opcode: u16 },

    /// A descriptor references a layout that is not in the layout set.
    MissingLayout { opcode: u16, layout: LayoutId },

    /// A descriptor references a schema that is not in the schema set.
    MissingSchema { opcode: u16, schema: SchemaId },

    /// A bound nested field's layout has no registered opcode.
    MissingNestedOpcode {
        opcode: u16,
        field: String,
        layout: LayoutId,
    },

    /// The repeated field an array or list binds to is not in the schema.
    MissingRepeatedField {
        opcode: u16,
        field: String,
        target: String,
    },

    /// Layout set validation failed.
    Layout(LayoutError),

    /// Schema set validation failed.
    Schema(SchemaError),

    /// Registry configuration could not be parsed.
    Config { message: String },
}

impl fmt::Display for RegistryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateOpcode { opcode } => write!(f, "duplicate opcode {opcode:#06x}"),
            Self::MissingLayout { opcode, layout } => {
                write!(f, "opcode {opcode:#06x} references unknown layout {layout}")
            }
            Self::MissingSchema { opcode, schema } => {
                write!(f, "opcode {opcode:#06x} references unknown schema {schema}")
            }
            Self::MissingNestedOpcode {
                opcode,
                field,
                layout,
            } => {
                write!(
                    f,
                    "field {field} of opcode {opcode:#06x} nests layout {layout}, which has no opcode"
                )
            }
            Self::MissingRepeatedField {
                opcode,
                field,
                target,
            } => {
                write!(
                    f,
                    "field {field} of opcode {opcode:#06x} targets missing repeated field {target}"
                )
            }
            Self::Layout(err) => write!(f, "layout error: {err}"),
            Self::Schema(err) => write!(f, "schema error: {err}"),
            Self::Config { message } => write!(f, "invalid registry config: {message}"),
        }
    }
}

impl std::error::Error for RegistryError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Layout(err) => Some(err),
            Self::Schema(err) => Some(err),
            _ => None,
        }
    }
}

impl From<LayoutError> for RegistryError {
    fn from(err: LayoutError) -> Self {
        Self::Layout(err)
    }
}

impl From<SchemaError> for RegistryError {
    fn from(err: SchemaError) -> Self {
        Self::Schema(err)
    }
}
