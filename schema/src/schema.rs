//! Message schema definitions and validation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{SchemaError, SchemaResult};
use crate::{FieldType, Message, MessageField, SchemaId, MAX_FIELD_NUMBER, RESERVED_FIELD_NUMBERS};

/// A message schema consisting of ordered fields.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct MessageSchema {
    pub id: SchemaId,
    pub fields: Vec<MessageField>,
}

impl MessageSchema {
    /// Creates a new schema with no fields.
    pub fn new(id: impl Into<SchemaId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a schema with the provided fields.
    pub fn with_fields(id: impl Into<SchemaId>, fields: Vec<MessageField>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Adds a field to the schema.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, number: u32, ty: FieldType) -> Self {
        self.fields.push(MessageField::new(name, number, ty));
        self
    }

    /// Returns the position of a field by name.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Returns the position of a field by number.
    #[must_use]
    pub fn field_by_number(&self, number: u32) -> Option<usize> {
        self.fields.iter().position(|field| field.number == number)
    }
}

/// A validated set of message schemas.
#[derive(Debug, Clone, Default)]
pub struct SchemaSet {
    schemas: Vec<Arc<MessageSchema>>,
    index: HashMap<SchemaId, usize>,
}

impl SchemaSet {
    /// Creates a schema set after validation.
    pub fn new(schemas: Vec<MessageSchema>) -> SchemaResult<Self> {
        let mut index = HashMap::with_capacity(schemas.len());
        for (position, schema) in schemas.iter().enumerate() {
            if schema.id.is_empty() {
                return Err(SchemaError::EmptySchemaId);
            }
            if index.insert(schema.id.clone(), position).is_some() {
                return Err(SchemaError::DuplicateSchema {
                    schema: schema.id.clone(),
                });
            }
        }

        for schema in &schemas {
            validate_schema(schema, &index)?;
        }

        Ok(Self {
            schemas: schemas.into_iter().map(Arc::new).collect(),
            index,
        })
    }

    /// Creates a schema set builder.
    #[must_use]
    pub fn builder() -> SchemaSetBuilder {
        SchemaSetBuilder::default()
    }

    /// Returns a schema by id.
    #[must_use]
    pub fn get(&self, id: &SchemaId) -> Option<&Arc<MessageSchema>> {
        self.index.get(id).map(|&position| &self.schemas[position])
    }

    /// Returns `true` if the set contains the schema.
    #[must_use]
    pub fn contains(&self, id: &SchemaId) -> bool {
        self.index.contains_key(id)
    }

    /// Creates an empty message of a schema.
    pub fn message(&self, id: &SchemaId) -> SchemaResult<Message> {
        self.get(id)
            .map(|schema| Message::new(Arc::clone(schema)))
            .ok_or_else(|| SchemaError::UnknownSchema { schema: id.clone() })
    }

    /// Iterates schemas in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<MessageSchema>> {
        self.schemas.iter()
    }

    /// Returns the number of schemas.
    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Builder for `SchemaSet`.
#[derive(Debug, Default)]
pub struct SchemaSetBuilder {
    schemas: Vec<MessageSchema>,
}

impl SchemaSetBuilder {
    /// Adds a schema definition.
    #[must_use]
    pub fn schema(mut self, schema: MessageSchema) -> Self {
        self.schemas.push(schema);
        self
    }

    /// Builds the schema set after validation.
    pub fn build(self) -> SchemaResult<SchemaSet> {
        SchemaSet::new(self.schemas)
    }
}

fn validate_schema(schema: &MessageSchema, index: &HashMap<SchemaId, usize>) -> SchemaResult<()> {
    let mut names = HashSet::new();
    let mut numbers = HashSet::new();
    for field in &schema.fields {
        if !names.insert(field.name.as_str()) {
            return Err(SchemaError::DuplicateFieldName {
                schema: schema.id.clone(),
                field: field.name.clone(),
            });
        }
        if field.number == 0
            || field.number > MAX_FIELD_NUMBER
            || RESERVED_FIELD_NUMBERS.contains(&field.number)
        {
            return Err(SchemaError::InvalidFieldNumber {
                schema: schema.id.clone(),
                field: field.name.clone(),
                number: field.number,
            });
        }
        if !numbers.insert(field.number) {
            return Err(SchemaError::DuplicateFieldNumber {
                schema: schema.id.clone(),
                number: field.number,
            });
        }
        if let Some(nested) = field.ty.message_schema() {
            if !index.contains_key(nested) {
                return Err(SchemaError::UnknownSchema {
                    schema: nested.clone(),
                });
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tint() -> MessageSchema {
        MessageSchema::new("Tint")
            .field("blue", 1, FieldType::Int32)
            .field("green", 2, FieldType::Int32)
            .field("red", 3, FieldType::Int32)
    }

    #[test]
    fn schema_set_builder_roundtrip() {
        let set = SchemaSet::builder()
            .schema(tint())
            .schema(MessageSchema::new("Equip").field("color", 1, FieldType::message("Tint")))
            .build()
            .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&SchemaId::new("Equip")));
        assert_eq!(set.get(&SchemaId::new("Tint")).unwrap().fields.len(), 3);
    }

    #[test]
    fn field_lookup_by_name_and_number() {
        let schema = tint();
        assert_eq!(schema.field_index("red"), Some(2));
        assert_eq!(schema.field_by_number(2), Some(1));
        assert_eq!(schema.field_by_number(9), None);
    }

    #[test]
    fn rejects_duplicate_schema() {
        let err = SchemaSet::new(vec![tint(), tint()]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateSchema { .. }));
    }

    #[test]
    fn rejects_duplicate_field_name() {
        let schema = MessageSchema::new("A")
            .field("x", 1, FieldType::Bool)
            .field("x", 2, FieldType::Bool);
        let err = SchemaSet::new(vec![schema]).unwrap_err();
        assert!(matches!(err, SchemaError::DuplicateFieldName { .. }));
    }

    #[test]
    fn rejects_duplicate_field_number() {
        let schema = MessageSchema::new("A")
            .field("x", 1, FieldType::Bool)
            .field("y", 1, FieldType::Bool);
        let err = SchemaSet::new(vec![schema]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::DuplicateFieldNumber {
                schema: SchemaId::new("A"),
                number: 1
            }
        );
    }

    #[test]
    fn rejects_invalid_field_numbers() {
        for number in [0, 19_000, 19_999, MAX_FIELD_NUMBER + 1] {
            let schema = MessageSchema::new("A").field("x", number, FieldType::Int32);
            let err = SchemaSet::new(vec![schema]).unwrap_err();
            assert!(
                matches!(err, SchemaError::InvalidFieldNumber { .. }),
                "number {number}"
            );
        }
        let schema = MessageSchema::new("A").field("x", MAX_FIELD_NUMBER, FieldType::Int32);
        assert!(SchemaSet::new(vec![schema]).is_ok());
    }

    #[test]
    fn rejects_unknown_nested_schema() {
        let schema = MessageSchema::new("A").field("items", 1, FieldType::repeated("Missing"));
        let err = SchemaSet::new(vec![schema]).unwrap_err();
        assert_eq!(
            err,
            SchemaError::UnknownSchema {
                schema: SchemaId::new("Missing")
            }
        );
    }

    #[test]
    fn self_referencing_schema_is_allowed() {
        let schema = MessageSchema::new("Node")
            .field("value", 1, FieldType::Int32)
            .field("children", 2, FieldType::repeated("Node"));
        assert!(SchemaSet::new(vec![schema]).is_ok());
    }

    #[test]
    fn message_factory() {
        let set = SchemaSet::new(vec![tint()]).unwrap();
        let message = set.message(&SchemaId::new("Tint")).unwrap();
        assert_eq!(message.schema_id(), &SchemaId::new("Tint"));
        assert!(set.message(&SchemaId::new("Nope")).is_err());
    }

    #[test]
    fn rejects_empty_schema_name() {
        let err = SchemaSet::new(vec![MessageSchema::new("")]).unwrap_err();
        assert_eq!(err, SchemaError::EmptySchemaId);
    }
}
