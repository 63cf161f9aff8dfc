//! Dynamic messages bound to a schema.

use std::sync::Arc;

use crate::error::{MessageError, MessageResult};
use crate::{FieldType, MessageSchema, SchemaId};

/// A field value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Int32(i32),
    Bool(bool),
    String(String),
    Message(Box<Message>),
    List(Vec<Message>),
}

impl Value {
    /// Returns `true` if the value can be stored in a field of type `ty`.
    #[must_use]
    pub fn matches(&self, ty: &FieldType) -> bool {
        match (self, ty) {
            (Self::Int32(_), FieldType::Int32)
            | (Self::Bool(_), FieldType::Bool)
            | (Self::String(_), FieldType::String) => true,
            (Self::Message(message), FieldType::Message(schema)) => message.schema_id() == schema,
            (Self::List(items), FieldType::Repeated(schema)) => {
                items.iter().all(|item| item.schema_id() == schema)
            }
            _ => false,
        }
    }

    /// Returns `true` for values proto3 does not emit.
    #[must_use]
    pub fn is_default(&self) -> bool {
        match self {
            Self::Int32(value) => *value == 0,
            Self::Bool(value) => !value,
            Self::String(value) => value.is_empty(),
            Self::Message(_) => false,
            Self::List(items) => items.is_empty(),
        }
    }
}

/// A message of one schema with an optional value per field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    schema: Arc<MessageSchema>,
    values: Vec<Option<Value>>,
}

impl Message {
    /// Creates an empty message.
    #[must_use]
    pub fn new(schema: Arc<MessageSchema>) -> Self {
        let values = vec![None; schema.fields.len()];
        Self { schema, values }
    }

    /// Returns the message's schema.
    #[must_use]
    pub fn schema(&self) -> &Arc<MessageSchema> {
        &self.schema
    }

    /// Returns the message's schema id.
    #[must_use]
    pub fn schema_id(&self) -> &SchemaId {
        &self.schema.id
    }

    /// Returns the value of a field by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.get_index(self.schema.field_index(name)?)
    }

    /// Returns the value of a field by index.
    #[must_use]
    pub fn get_index(&self, index: usize) -> Option<&Value> {
        self.values.get(index)?.as_ref()
    }

    /// Returns `true` if a field is set.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Sets a field by name.
    pub fn set(&mut self, name: &str, value: Value) -> MessageResult<()> {
        let index = self.index_of(name)?;
        self.set_index(index, value)
    }

    /// Sets a field by index after checking the value type.
    pub fn set_index(&mut self, index: usize, value: Value) -> MessageResult<()> {
        self.check(index, &value)?;
        self.values[index] = Some(value);
        Ok(())
    }

    /// Clears a field by name.
    pub fn clear(&mut self, name: &str) -> MessageResult<()> {
        let index = self.index_of(name)?;
        self.values[index] = None;
        Ok(())
    }

    /// Appends an element to a repeated field.
    pub fn push_index(&mut self, index: usize, item: Self) -> MessageResult<()> {
        let value = Value::List(vec![item]);
        self.check(index, &value)?;
        match &mut self.values[index] {
            Some(Value::List(items)) => {
                if let Value::List(mut item) = value {
                    items.append(&mut item);
                }
            }
            slot => *slot = Some(value),
        }
        Ok(())
    }

    /// Appends an element to a repeated field by name.
    pub fn push(&mut self, name: &str, item: Self) -> MessageResult<()> {
        let index = self.index_of(name)?;
        self.push_index(index, item)
    }

    /// Returns an `int32` field, if set.
    #[must_use]
    pub fn int32(&self, name: &str) -> Option<i32> {
        match self.get(name)? {
            Value::Int32(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a `bool` field, if set.
    #[must_use]
    pub fn bool(&self, name: &str) -> Option<bool> {
        match self.get(name)? {
            Value::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns a `string` field, if set.
    #[must_use]
    pub fn string(&self, name: &str) -> Option<&str> {
        match self.get(name)? {
            Value::String(value) => Some(value),
            _ => None,
        }
    }

    /// Returns an embedded message field, if set.
    #[must_use]
    pub fn message(&self, name: &str) -> Option<&Self> {
        match self.get(name)? {
            Value::Message(value) => Some(value),
            _ => None,
        }
    }

    /// Returns the elements of a repeated field; empty when unset.
    #[must_use]
    pub fn list(&self, name: &str) -> &[Self] {
        match self.get(name) {
            Some(Value::List(items)) => items,
            _ => &[],
        }
    }

    pub(crate) fn values(&self) -> &[Option<Value>] {
        &self.values
    }

    pub(crate) fn values_mut(&mut self) -> &mut [Option<Value>] {
        &mut self.values
    }

    fn index_of(&self, name: &str) -> MessageResult<usize> {
        self.schema
            .field_index(name)
            .ok_or_else(|| MessageError::UnknownField {
                schema: self.schema.id.clone(),
                field: name.to_string(),
            })
    }

    fn check(&self, index: usize, value: &Value) -> MessageResult<()> {
        let field = self
            .schema
            .fields
            .get(index)
            .ok_or_else(|| MessageError::UnknownField {
                schema: self.schema.id.clone(),
                field: format!("#{index}"),
            })?;
        if value.matches(&field.ty) {
            Ok(())
        } else {
            Err(MessageError::TypeMismatch {
                schema: self.schema.id.clone(),
                field: field.name.clone(),
                expected: field.ty.to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SchemaSet;

    fn schemas() -> SchemaSet {
        SchemaSet::builder()
            .schema(
                MessageSchema::new("Server")
                    .field("name", 1, FieldType::String)
                    .field("online", 2, FieldType::Bool),
            )
            .schema(
                MessageSchema::new("Reply")
                    .field("count", 1, FieldType::Int32)
                    .field("primary", 2, FieldType::message("Server"))
                    .field("servers", 3, FieldType::repeated("Server")),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn new_message_is_unset() {
        let set = schemas();
        let reply = set.message(&SchemaId::new("Reply")).unwrap();
        assert!(!reply.has("count"));
        assert_eq!(reply.int32("count"), None);
        assert!(reply.list("servers").is_empty());
    }

    #[test]
    fn set_and_get_values() {
        let set = schemas();
        let mut server = set.message(&SchemaId::new("Server")).unwrap();
        server.set("name", Value::String("Povar".into())).unwrap();
        server.set("online", Value::Bool(true)).unwrap();

        let mut reply = set.message(&SchemaId::new("Reply")).unwrap();
        reply.set("count", Value::Int32(-3)).unwrap();
        reply
            .set("primary", Value::Message(Box::new(server.clone())))
            .unwrap();
        reply.push("servers", server.clone()).unwrap();
        reply.push("servers", server).unwrap();

        assert_eq!(reply.int32("count"), Some(-3));
        assert_eq!(reply.message("primary").unwrap().string("name"), Some("Povar"));
        assert_eq!(reply.list("servers").len(), 2);
        assert_eq!(reply.list("servers")[1].bool("online"), Some(true));
    }

    #[test]
    fn set_rejects_wrong_type() {
        let set = schemas();
        let mut reply = set.message(&SchemaId::new("Reply")).unwrap();
        let err = reply.set("count", Value::Bool(true)).unwrap_err();
        assert!(matches!(err, MessageError::TypeMismatch { .. }));

        let wrong = set.message(&SchemaId::new("Reply")).unwrap();
        let err = reply.push("servers", wrong).unwrap_err();
        assert!(matches!(err, MessageError::TypeMismatch { .. }));
    }

    #[test]
    fn set_rejects_unknown_field() {
        let set = schemas();
        let mut reply = set.message(&SchemaId::new("Reply")).unwrap();
        let err = reply.set("missing", Value::Int32(1)).unwrap_err();
        assert!(matches!(err, MessageError::UnknownField { .. }));
    }

    #[test]
    fn clear_unsets_field() {
        let set = schemas();
        let mut reply = set.message(&SchemaId::new("Reply")).unwrap();
        reply.set("count", Value::Int32(9)).unwrap();
        reply.clear("count").unwrap();
        assert!(!reply.has("count"));
    }

    #[test]
    fn default_values() {
        assert!(Value::Int32(0).is_default());
        assert!(Value::String(String::new()).is_default());
        assert!(!Value::Bool(true).is_default());
        assert!(Value::List(Vec::new()).is_default());
    }
}
