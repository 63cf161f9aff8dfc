//! JSON registry configuration.

use layout::{LayoutSet, RecordLayout};
use schema::{MessageSchema, SchemaSet};
use serde::{Deserialize, Serialize};

use crate::error::{RegistryError, RegistryResult};
use crate::registry::{OpcodeDescriptor, OpcodeRegistry};

/// The three inputs of an `OpcodeRegistry`, as loaded from configuration.
///
/// ```json
/// {
///   "layouts": [{ "id": "Tint", "fields": [
///     { "name": "blue", "kind": { "scalar_int": { "width": 1, "signed": false } } }
///   ] }],
///   "schemas": [{ "id": "Tint", "fields": [
///     { "name": "blue", "number": 1, "type": "int32" }
///   ] }],
///   "opcodes": [{ "opcode": 32, "record_layout": "Tint", "message_schema": "Tint" }]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RegistryConfig {
    #[serde(default)]
    pub layouts: Vec<RecordLayout>,
    #[serde(default)]
    pub schemas: Vec<MessageSchema>,
    #[serde(default)]
    pub opcodes: Vec<OpcodeDescriptor>,
}

impl RegistryConfig {
    /// Parses a configuration from JSON.
    pub fn from_json(text: &str) -> RegistryResult<Self> {
        serde_json::from_str(text).map_err(|err| RegistryError::Config {
            message: err.to_string(),
        })
    }

    /// Serializes the configuration as pretty-printed JSON.
    pub fn to_json(&self) -> RegistryResult<String> {
        serde_json::to_string_pretty(self).map_err(|err| RegistryError::Config {
            message: err.to_string(),
        })
    }

    /// Validates the configuration and builds the registry.
    pub fn build(self) -> RegistryResult<OpcodeRegistry> {
        let layouts = LayoutSet::new(self.layouts)?;
        let schemas = SchemaSet::new(self.schemas)?;
        OpcodeRegistry::new(layouts, schemas, self.opcodes)
    }
}
