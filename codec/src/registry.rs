//! The opcode registry.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use blake3::Hasher;
use layout::{FieldKind, LayoutId, LayoutSet, RecordBuffer, RecordLayout};
use schema::{write_schemas, write_str, Message, MessageSchema, SchemaId, SchemaSet};
use tracing::info;

use crate::error::{RegistryError, RegistryResult};
use crate::plan::{compile, BindingPlan, PlanContext};

/// Associates an opcode with a record layout and a message schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OpcodeDescriptor {
    pub opcode: u16,
    pub record_layout: LayoutId,
    pub message_schema: SchemaId,
    /// Set on opcodes whose records are elements of a parent's repeated
    /// field; names that field.
    #[cfg_attr(
        feature = "serde",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub repeated_field_name: Option<String>,
}

impl OpcodeDescriptor {
    /// Creates a descriptor.
    pub fn new(opcode: u16, layout: impl Into<LayoutId>, schema: impl Into<SchemaId>) -> Self {
        Self {
            opcode,
            record_layout: layout.into(),
            message_schema: schema.into(),
            repeated_field_name: None,
        }
    }

    /// Sets the repeated field that elements of this opcode append to.
    #[must_use]
    pub fn repeated(mut self, field: impl Into<String>) -> Self {
        self.repeated_field_name = Some(field.into());
        self
    }
}

/// A 64-bit fingerprint of a registry's layouts, schemas and opcodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegistryFingerprint(pub u64);

impl fmt::Display for RegistryFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// The read-only opcode table.
///
/// Built once from layouts, schemas and descriptors; every binding plan is
/// compiled during construction.
#[derive(Debug)]
pub struct OpcodeRegistry {
    layouts: LayoutSet,
    schemas: SchemaSet,
    descriptors: Vec<OpcodeDescriptor>,
    plans: Vec<BindingPlan>,
    by_opcode: HashMap<u16, usize>,
    by_layout: HashMap<LayoutId, u16>,
    fingerprint: RegistryFingerprint,
}

impl OpcodeRegistry {
    /// Builds a registry, failing on the first configuration error.
    pub fn new(
        layouts: LayoutSet,
        schemas: SchemaSet,
        mut descriptors: Vec<OpcodeDescriptor>,
    ) -> RegistryResult<Self> {
        descriptors.sort_by_key(|descriptor| descriptor.opcode);

        let mut by_opcode = HashMap::with_capacity(descriptors.len());
        for (position, descriptor) in descriptors.iter().enumerate() {
            if by_opcode.insert(descriptor.opcode, position).is_some() {
                return Err(RegistryError::DuplicateOpcode {
                    opcode: descriptor.opcode,
                });
            }
            if !layouts.contains(&descriptor.record_layout) {
                return Err(RegistryError::MissingLayout {
                    opcode: descriptor.opcode,
                    layout: descriptor.record_layout.clone(),
                });
            }
            if !schemas.contains(&descriptor.message_schema) {
                return Err(RegistryError::MissingSchema {
                    opcode: descriptor.opcode,
                    schema: descriptor.message_schema.clone(),
                });
            }
        }

        let by_layout = reverse_map(&descriptors);
        let ctx = PlanContext {
            layouts: &layouts,
            descriptors: &descriptors,
            by_opcode: &by_opcode,
            by_layout: &by_layout,
        };
        let mut plans = Vec::with_capacity(descriptors.len());
        for descriptor in &descriptors {
            let layout = layouts.get(&descriptor.record_layout).ok_or_else(|| {
                RegistryError::MissingLayout {
                    opcode: descriptor.opcode,
                    layout: descriptor.record_layout.clone(),
                }
            })?;
            let schema = schemas.get(&descriptor.message_schema).ok_or_else(|| {
                RegistryError::MissingSchema {
                    opcode: descriptor.opcode,
                    schema: descriptor.message_schema.clone(),
                }
            })?;
            plans.push(compile(&ctx, descriptor, layout, schema)?);
        }

        let fingerprint = fingerprint(&layouts, &schemas, &descriptors);
        info!(
            opcodes = descriptors.len(),
            layouts = layouts.len(),
            schemas = schemas.len(),
            %fingerprint,
            "opcode registry built"
        );

        Ok(Self {
            layouts,
            schemas,
            descriptors,
            plans,
            by_opcode,
            by_layout,
            fingerprint,
        })
    }

    /// Creates a registry builder.
    #[must_use]
    pub fn builder(layouts: LayoutSet, schemas: SchemaSet) -> RegistryBuilder {
        RegistryBuilder {
            layouts,
            schemas,
            descriptors: Vec::new(),
        }
    }

    /// Returns the descriptor of an opcode.
    #[must_use]
    pub fn lookup(&self, opcode: u16) -> Option<&OpcodeDescriptor> {
        self.by_opcode
            .get(&opcode)
            .map(|&position| &self.descriptors[position])
    }

    /// Returns the opcode used for nested records of a layout.
    ///
    /// When several opcodes share a layout, descriptors with a repeated field
    /// name are preferred, then the lowest opcode.
    #[must_use]
    pub fn opcode_for_layout(&self, layout: &LayoutId) -> Option<u16> {
        self.by_layout.get(layout).copied()
    }

    /// Returns the compiled binding plan of an opcode.
    #[must_use]
    pub fn plan(&self, opcode: u16) -> Option<&BindingPlan> {
        self.by_opcode
            .get(&opcode)
            .map(|&position| &self.plans[position])
    }

    /// Returns the record layout bound to an opcode.
    #[must_use]
    pub fn layout(&self, opcode: u16) -> Option<&Arc<RecordLayout>> {
        self.layouts.get(&self.lookup(opcode)?.record_layout)
    }

    /// Returns the message schema bound to an opcode.
    #[must_use]
    pub fn schema(&self, opcode: u16) -> Option<&Arc<MessageSchema>> {
        self.schemas.get(&self.lookup(opcode)?.message_schema)
    }

    /// Allocates a zeroed record for an opcode.
    #[must_use]
    pub fn allocate(&self, opcode: u16) -> Option<RecordBuffer> {
        let descriptor = self.lookup(opcode)?;
        self.layouts.allocate(&descriptor.record_layout).ok()
    }

    /// Creates an empty message for an opcode.
    #[must_use]
    pub fn message(&self, opcode: u16) -> Option<Message> {
        let descriptor = self.lookup(opcode)?;
        self.schemas.message(&descriptor.message_schema).ok()
    }

    /// All descriptors, sorted by opcode.
    #[must_use]
    pub fn descriptors(&self) -> &[OpcodeDescriptor] {
        &self.descriptors
    }

    /// The registry's layouts.
    #[must_use]
    pub const fn layouts(&self) -> &LayoutSet {
        &self.layouts
    }

    /// The registry's schemas.
    #[must_use]
    pub const fn schemas(&self) -> &SchemaSet {
        &self.schemas
    }

    /// Returns the number of opcodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    /// Returns `true` if no opcodes are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Returns the registry fingerprint.
    #[must_use]
    pub const fn fingerprint(&self) -> RegistryFingerprint {
        self.fingerprint
    }
}

/// Builder for `OpcodeRegistry`.
#[derive(Debug)]
pub struct RegistryBuilder {
    layouts: LayoutSet,
    schemas: SchemaSet,
    descriptors: Vec<OpcodeDescriptor>,
}

impl RegistryBuilder {
    /// Adds an opcode descriptor.
    #[must_use]
    pub fn opcode(mut self, descriptor: OpcodeDescriptor) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// Builds the registry.
    pub fn build(self) -> RegistryResult<OpcodeRegistry> {
        OpcodeRegistry::new(self.layouts, self.schemas, self.descriptors)
    }
}

/// Maps each layout to the opcode nested records of that layout use.
///
/// Expects descriptors sorted by opcode.
fn reverse_map(descriptors: &[OpcodeDescriptor]) -> HashMap<LayoutId, u16> {
    let mut by_layout: HashMap<LayoutId, (bool, u16)> = HashMap::new();
    for descriptor in descriptors {
        let repeated = descriptor.repeated_field_name.is_some();
        by_layout
            .entry(descriptor.record_layout.clone())
            .and_modify(|current| {
                if repeated && !current.0 {
                    *current = (repeated, descriptor.opcode);
                }
            })
            .or_insert((repeated, descriptor.opcode));
    }
    by_layout
        .into_iter()
        .map(|(layout, (_, opcode))| (layout, opcode))
        .collect()
}

#[allow(clippy::cast_possible_truncation)]
fn fingerprint(
    layouts: &LayoutSet,
    schemas: &SchemaSet,
    descriptors: &[OpcodeDescriptor],
) -> RegistryFingerprint {
    let mut hasher = Hasher::new();

    hasher.update(&(layouts.len() as u32).to_le_bytes());
    for layout in layouts.iter() {
        write_str(&mut hasher, layout.id.as_str());
        hasher.update(&(layout.fields.len() as u32).to_le_bytes());
        for field in &layout.fields {
            write_str(&mut hasher, &field.name);
            write_kind(&mut hasher, &field.kind);
        }
    }

    write_schemas(&mut hasher, schemas);

    hasher.update(&(descriptors.len() as u32).to_le_bytes());
    for descriptor in descriptors {
        hasher.update(&descriptor.opcode.to_le_bytes());
        write_str(&mut hasher, descriptor.record_layout.as_str());
        write_str(&mut hasher, descriptor.message_schema.as_str());
        write_str(
            &mut hasher,
            descriptor.repeated_field_name.as_deref().unwrap_or(""),
        );
    }

    RegistryFingerprint(schema::finish_fingerprint(&hasher))
}

#[allow(clippy::cast_possible_truncation)]
fn write_kind(hasher: &mut Hasher, kind: &FieldKind) {
    match kind {
        FieldKind::ScalarInt { width, signed } => {
            hasher.update(&[0, *width, u8::from(*signed)]);
        }
        FieldKind::ScalarBool => {
            hasher.update(&[1]);
        }
        FieldKind::FixedString { length } => {
            hasher.update(&[2]);
            hasher.update(&(*length as u64).to_le_bytes());
        }
        FieldKind::OwnedString => {
            hasher.update(&[3]);
        }
        FieldKind::NestedSingle { layout } => {
            hasher.update(&[4]);
            write_str(hasher, layout.as_str());
        }
        FieldKind::NestedFixedArray { layout, count } => {
            hasher.update(&[5]);
            write_str(hasher, layout.as_str());
            hasher.update(&(*count as u64).to_le_bytes());
        }
        FieldKind::NestedFlexibleList { layout } => {
            hasher.update(&[6]);
            write_str(hasher, layout.as_str());
        }
        FieldKind::FixedStringArray { count, length } => {
            hasher.update(&[7]);
            hasher.update(&(*count as u64).to_le_bytes());
            hasher.update(&(*length as u64).to_le_bytes());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use layout::RecordLayout;
    use schema::{FieldType, MessageSchema};

    fn tint_layouts() -> LayoutSet {
        LayoutSet::new(vec![RecordLayout::new("Tint")
            .field("blue", FieldKind::uint(1))
            .field("red", FieldKind::uint(1))])
        .unwrap()
    }

    fn tint_schemas() -> SchemaSet {
        SchemaSet::new(vec![MessageSchema::new("Tint")
            .field("blue", 1, FieldType::Int32)
            .field("red", 2, FieldType::Int32)])
        .unwrap()
    }

    #[test]
    fn lookup_and_reverse_map() {
        let registry = OpcodeRegistry::builder(tint_layouts(), tint_schemas())
            .opcode(OpcodeDescriptor::new(0x0020, "Tint", "Tint"))
            .opcode(OpcodeDescriptor::new(0x0010, "Tint", "Tint"))
            .build()
            .unwrap();
        assert_eq!(registry.len(), 2);
        assert_eq!(
            registry.lookup(0x0010).unwrap().record_layout,
            LayoutId::new("Tint")
        );
        assert!(registry.lookup(0xFFFF).is_none());
        assert_eq!(registry.opcode_for_layout(&LayoutId::new("Tint")), Some(0x0010));
        assert_eq!(registry.descriptors()[0].opcode, 0x0010);
    }

    #[test]
    fn reverse_map_prefers_repeated_descriptors() {
        let registry = OpcodeRegistry::builder(tint_layouts(), tint_schemas())
            .opcode(OpcodeDescriptor::new(0x0010, "Tint", "Tint"))
            .opcode(OpcodeDescriptor::new(0x0030, "Tint", "Tint").repeated("tints"))
            .opcode(OpcodeDescriptor::new(0x0040, "Tint", "Tint").repeated("tints"))
            .build()
            .unwrap();
        assert_eq!(registry.opcode_for_layout(&LayoutId::new("Tint")), Some(0x0030));
    }

    #[test]
    fn rejects_duplicate_opcode() {
        let err = OpcodeRegistry::builder(tint_layouts(), tint_schemas())
            .opcode(OpcodeDescriptor::new(1, "Tint", "Tint"))
            .opcode(OpcodeDescriptor::new(1, "Tint", "Tint"))
            .build()
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateOpcode { opcode: 1 });
    }

    #[test]
    fn rejects_missing_layout_and_schema() {
        let err = OpcodeRegistry::builder(tint_layouts(), tint_schemas())
            .opcode(OpcodeDescriptor::new(1, "Nope", "Tint"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingLayout { opcode: 1, .. }));

        let err = OpcodeRegistry::builder(tint_layouts(), tint_schemas())
            .opcode(OpcodeDescriptor::new(1, "Tint", "Nope"))
            .build()
            .unwrap_err();
        assert!(matches!(err, RegistryError::MissingSchema { opcode: 1, .. }));
    }

    #[test]
    fn allocate_and_message_follow_descriptor() {
        let registry = OpcodeRegistry::builder(tint_layouts(), tint_schemas())
            .opcode(OpcodeDescriptor::new(7, "Tint", "Tint"))
            .build()
            .unwrap();
        let record = registry.allocate(7).unwrap();
        assert_eq!(record.layout_id(), &LayoutId::new("Tint"));
        let message = registry.message(7).unwrap();
        assert_eq!(message.schema_id(), &SchemaId::new("Tint"));
        assert!(registry.allocate(8).is_none());
        assert_eq!(registry.plan(7).unwrap().occupied_size(), 2);
    }

    #[test]
    fn fingerprint_is_stable_and_sensitive() {
        let build = |opcode| {
            OpcodeRegistry::builder(tint_layouts(), tint_schemas())
                .opcode(OpcodeDescriptor::new(opcode, "Tint", "Tint"))
                .build()
                .unwrap()
                .fingerprint()
        };
        assert_eq!(build(1), build(1));
        assert_ne!(build(1), build(2));
        assert_eq!(build(1).to_string().len(), 16);
    }

    #[test]
    fn registry_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<OpcodeRegistry>();
    }
}
