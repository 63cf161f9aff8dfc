//! Record layout definitions and validation.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::{LayoutError, LayoutResult};
use crate::record::RecordBuffer;
use crate::{FieldDescriptor, FieldKind, LayoutId, POINTER_SIZE};

/// An ordered field description of a fixed-size record.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RecordLayout {
    pub id: LayoutId,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordLayout {
    /// Creates a layout with no fields.
    pub fn new(id: impl Into<LayoutId>) -> Self {
        Self {
            id: id.into(),
            fields: Vec::new(),
        }
    }

    /// Creates a layout with the provided fields.
    pub fn with_fields(id: impl Into<LayoutId>, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Adds a field to the layout.
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, kind: FieldKind) -> Self {
        self.fields.push(FieldDescriptor::new(name, kind));
        self
    }

    /// Returns the position of a field by name.
    #[must_use]
    pub fn field_index(&self, name: &str) -> Option<usize> {
        self.fields.iter().position(|field| field.name == name)
    }

    /// Returns a field descriptor by name.
    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|field| field.name == name)
    }

    /// Returns the index of the link field of a list node layout.
    ///
    /// The link is the list field that points back at this layout.
    #[must_use]
    pub fn link_field(&self) -> Option<usize> {
        self.fields.iter().position(|field| match &field.kind {
            FieldKind::NestedFlexibleList { layout } => *layout == self.id,
            _ => false,
        })
    }
}

/// A validated set of record layouts.
///
/// Layouts are shared through `Arc` so record buffers can carry their layout
/// without borrowing the set.
#[derive(Debug, Clone, Default)]
pub struct LayoutSet {
    layouts: Vec<Arc<RecordLayout>>,
    index: HashMap<LayoutId, usize>,
    sizes: HashMap<LayoutId, usize>,
}

impl LayoutSet {
    /// Creates a layout set after validation.
    pub fn new(layouts: Vec<RecordLayout>) -> LayoutResult<Self> {
        let mut index = HashMap::with_capacity(layouts.len());
        for (position, layout) in layouts.iter().enumerate() {
            if layout.id.is_empty() {
                return Err(LayoutError::EmptyLayoutId);
            }
            if index.insert(layout.id.clone(), position).is_some() {
                return Err(LayoutError::DuplicateLayout {
                    layout: layout.id.clone(),
                });
            }
        }

        for layout in &layouts {
            validate_layout(layout, &layouts, &index)?;
        }

        let sizes = compute_sizes(&layouts, &index)?;
        Ok(Self {
            layouts: layouts.into_iter().map(Arc::new).collect(),
            index,
            sizes,
        })
    }

    /// Creates a layout set builder.
    #[must_use]
    pub fn builder() -> LayoutSetBuilder {
        LayoutSetBuilder::default()
    }

    /// Returns a layout by id.
    #[must_use]
    pub fn get(&self, id: &LayoutId) -> Option<&Arc<RecordLayout>> {
        self.index.get(id).map(|&position| &self.layouts[position])
    }

    /// Returns `true` if the set contains the layout.
    #[must_use]
    pub fn contains(&self, id: &LayoutId) -> bool {
        self.index.contains_key(id)
    }

    /// Returns the packed byte size of a layout.
    #[must_use]
    pub fn byte_size(&self, id: &LayoutId) -> Option<usize> {
        self.sizes.get(id).copied()
    }

    /// Iterates layouts in definition order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<RecordLayout>> {
        self.layouts.iter()
    }

    /// Returns the number of layouts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.layouts.len()
    }

    /// Returns `true` if the set is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layouts.is_empty()
    }

    /// Allocates a zeroed record for a layout.
    pub fn allocate(&self, id: &LayoutId) -> LayoutResult<RecordBuffer> {
        let layout = self
            .get(id)
            .ok_or_else(|| LayoutError::UnknownLayout { layout: id.clone() })?;
        RecordBuffer::zeroed(Arc::clone(layout), self)
    }
}

/// Builder for `LayoutSet`.
#[derive(Debug, Default)]
pub struct LayoutSetBuilder {
    layouts: Vec<RecordLayout>,
}

impl LayoutSetBuilder {
    /// Adds a layout definition.
    #[must_use]
    pub fn layout(mut self, layout: RecordLayout) -> Self {
        self.layouts.push(layout);
        self
    }

    /// Builds the layout set after validation.
    pub fn build(self) -> LayoutResult<LayoutSet> {
        LayoutSet::new(self.layouts)
    }
}

fn validate_layout(
    layout: &RecordLayout,
    layouts: &[RecordLayout],
    index: &HashMap<LayoutId, usize>,
) -> LayoutResult<()> {
    let mut names = HashSet::new();
    let mut links = 0usize;
    for field in &layout.fields {
        if !names.insert(field.name.as_str()) {
            return Err(LayoutError::DuplicateField {
                layout: layout.id.clone(),
                field: field.name.clone(),
            });
        }
        match &field.kind {
            FieldKind::ScalarInt { width, .. } => {
                if *width == 0 || *width > 8 {
                    return Err(LayoutError::InvalidIntWidth {
                        layout: layout.id.clone(),
                        field: field.name.clone(),
                        width: *width,
                    });
                }
            }
            FieldKind::FixedString { .. } | FieldKind::FixedStringArray { .. } => {
                if field.kind.text_len() == Some(0) {
                    return Err(LayoutError::InvalidStringLength {
                        layout: layout.id.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            FieldKind::NestedSingle { layout: nested } => {
                ensure_known(nested, index)?;
            }
            FieldKind::NestedFixedArray {
                layout: nested,
                count,
            } => {
                ensure_known(nested, index)?;
                if *count == 0 {
                    return Err(LayoutError::InvalidArrayCount {
                        layout: layout.id.clone(),
                        field: field.name.clone(),
                    });
                }
            }
            FieldKind::NestedFlexibleList { layout: nested } => {
                let node = &layouts[ensure_known(nested, index)?];
                if node.link_field().is_none() {
                    return Err(LayoutError::MissingLinkField {
                        layout: nested.clone(),
                        field: field.name.clone(),
                    });
                }
                if *nested == layout.id {
                    links += 1;
                }
            }
            FieldKind::ScalarBool | FieldKind::OwnedString => {}
        }
    }

    if links > 1 {
        return Err(LayoutError::MultipleLinks {
            layout: layout.id.clone(),
        });
    }
    Ok(())
}

fn ensure_known(id: &LayoutId, index: &HashMap<LayoutId, usize>) -> LayoutResult<usize> {
    index
        .get(id)
        .copied()
        .ok_or_else(|| LayoutError::UnknownLayout { layout: id.clone() })
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    InProgress,
    Done(usize),
}

/// Computes packed sizes, rejecting layouts that contain themselves by value.
fn compute_sizes(
    layouts: &[RecordLayout],
    index: &HashMap<LayoutId, usize>,
) -> LayoutResult<HashMap<LayoutId, usize>> {
    let mut state: Vec<Option<Visit>> = vec![None; layouts.len()];
    for position in 0..layouts.len() {
        size_of_layout(position, layouts, index, &mut state)?;
    }
    Ok(layouts
        .iter()
        .zip(state)
        .filter_map(|(layout, visit)| match visit {
            Some(Visit::Done(size)) => Some((layout.id.clone(), size)),
            _ => None,
        })
        .collect())
}

fn size_of_layout(
    position: usize,
    layouts: &[RecordLayout],
    index: &HashMap<LayoutId, usize>,
    state: &mut [Option<Visit>],
) -> LayoutResult<usize> {
    match state[position] {
        Some(Visit::Done(size)) => return Ok(size),
        Some(Visit::InProgress) => {
            return Err(LayoutError::RecursiveLayout {
                layout: layouts[position].id.clone(),
            });
        }
        None => {}
    }

    state[position] = Some(Visit::InProgress);
    let mut size = 0usize;
    for field in &layouts[position].fields {
        size += match &field.kind {
            FieldKind::ScalarInt { width, .. } => usize::from(*width),
            FieldKind::ScalarBool => 1,
            FieldKind::FixedString { length } => *length,
            FieldKind::FixedStringArray { count, length } => count * length,
            FieldKind::OwnedString | FieldKind::NestedFlexibleList { .. } => POINTER_SIZE,
            FieldKind::NestedSingle { layout } => {
                size_of_layout(ensure_known(layout, index)?, layouts, index, state)?
            }
            FieldKind::NestedFixedArray { layout, count } => {
                count * size_of_layout(ensure_known(layout, index)?, layouts, index, state)?
            }
        };
    }
    state[position] = Some(Visit::Done(size));
    Ok(size)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tint() -> RecordLayout {
        RecordLayout::new("Tint")
            .field("blue", FieldKind::uint(1))
            .field("green", FieldKind::uint(1))
            .field("red", FieldKind::uint(1))
            .field("use_tint", FieldKind::uint(1))
    }

    fn equip() -> RecordLayout {
        RecordLayout::new("CharSelectEquip")
            .field("material", FieldKind::uint(4))
            .field("color", FieldKind::nested("Tint"))
    }

    fn world_server() -> RecordLayout {
        RecordLayout::new("WorldServer")
            .field("long_name", FieldKind::fixed_string(64))
            .field("players_online", FieldKind::uint(4))
            .field("next", FieldKind::list("WorldServer"))
    }

    #[test]
    fn layout_set_builder_roundtrip() {
        let set = LayoutSet::builder()
            .layout(tint())
            .layout(equip())
            .build()
            .unwrap();
        assert_eq!(set.len(), 2);
        assert!(set.contains(&LayoutId::new("Tint")));
    }

    #[test]
    fn byte_size_accounts_for_nesting() {
        let holder = RecordLayout::new("Holder")
            .field("equip", FieldKind::array("CharSelectEquip", 9))
            .field("name", FieldKind::owned_string());
        let set = LayoutSet::new(vec![tint(), equip(), holder]).unwrap();
        assert_eq!(set.byte_size(&LayoutId::new("Tint")), Some(4));
        assert_eq!(set.byte_size(&LayoutId::new("CharSelectEquip")), Some(8));
        assert_eq!(
            set.byte_size(&LayoutId::new("Holder")),
            Some(9 * 8 + POINTER_SIZE)
        );
    }

    #[test]
    fn string_arrays_pack_every_row() {
        let group = RecordLayout::new("Group")
            .field("members", FieldKind::string_array(6, 64))
            .field("leader", FieldKind::uint(1));
        let set = LayoutSet::new(vec![group]).unwrap();
        assert_eq!(set.byte_size(&LayoutId::new("Group")), Some(6 * 64 + 1));

        let mut record = set.allocate(&LayoutId::new("Group")).unwrap();
        assert_eq!(record.fixed_bytes("members").unwrap(), &[0u8; 384][..]);
        record.set_fixed_str("members", "Xanathar").unwrap();
        assert_eq!(record.fixed_str("members").unwrap(), "Xanathar");
    }

    #[test]
    fn link_field_points_at_self() {
        let layout = world_server();
        assert_eq!(layout.link_field(), Some(2));
        assert_eq!(tint().link_field(), None);
    }

    #[test]
    fn self_referential_list_is_allowed() {
        let set = LayoutSet::new(vec![world_server()]).unwrap();
        assert_eq!(
            set.byte_size(&LayoutId::new("WorldServer")),
            Some(64 + 4 + POINTER_SIZE)
        );
    }

    #[test]
    fn rejects_duplicate_layouts() {
        let err = LayoutSet::new(vec![tint(), tint()]).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateLayout { .. }));
    }

    #[test]
    fn rejects_duplicate_fields() {
        let layout = RecordLayout::new("Dup")
            .field("a", FieldKind::bool())
            .field("a", FieldKind::uint(4));
        let err = LayoutSet::new(vec![layout]).unwrap_err();
        assert!(matches!(err, LayoutError::DuplicateField { .. }));
    }

    #[test]
    fn rejects_unknown_nested_layout() {
        let err = LayoutSet::new(vec![equip()]).unwrap_err();
        assert_eq!(
            err,
            LayoutError::UnknownLayout {
                layout: LayoutId::new("Tint")
            }
        );
    }

    #[test]
    fn rejects_by_value_recursion() {
        let a = RecordLayout::new("A").field("b", FieldKind::nested("B"));
        let b = RecordLayout::new("B").field("a", FieldKind::array("A", 2));
        let err = LayoutSet::new(vec![a, b]).unwrap_err();
        assert!(matches!(err, LayoutError::RecursiveLayout { .. }));
    }

    #[test]
    fn rejects_list_without_link() {
        let holder = RecordLayout::new("Holder").field("tints", FieldKind::list("Tint"));
        let err = LayoutSet::new(vec![tint(), holder]).unwrap_err();
        assert!(matches!(err, LayoutError::MissingLinkField { .. }));
    }

    #[test]
    fn rejects_multiple_links() {
        let node = RecordLayout::new("Node")
            .field("next", FieldKind::list("Node"))
            .field("other", FieldKind::list("Node"));
        let err = LayoutSet::new(vec![node]).unwrap_err();
        assert!(matches!(err, LayoutError::MultipleLinks { .. }));
    }

    #[test]
    fn rejects_invalid_widths_and_lengths() {
        let wide = RecordLayout::new("Wide").field("x", FieldKind::uint(16));
        assert!(matches!(
            LayoutSet::new(vec![wide]).unwrap_err(),
            LayoutError::InvalidIntWidth { width: 16, .. }
        ));

        let empty = RecordLayout::new("Empty").field("s", FieldKind::fixed_string(0));
        assert!(matches!(
            LayoutSet::new(vec![empty]).unwrap_err(),
            LayoutError::InvalidStringLength { .. }
        ));

        let flat = RecordLayout::new("Flat").field("rows", FieldKind::string_array(0, 64));
        assert!(matches!(
            LayoutSet::new(vec![flat]).unwrap_err(),
            LayoutError::InvalidStringLength { .. }
        ));

        let none = RecordLayout::new("None").field("t", FieldKind::array("Tint", 0));
        assert!(matches!(
            LayoutSet::new(vec![tint(), none]).unwrap_err(),
            LayoutError::InvalidArrayCount { .. }
        ));
    }

    #[test]
    fn rejects_empty_layout_name() {
        let err = LayoutSet::new(vec![RecordLayout::new("")]).unwrap_err();
        assert_eq!(err, LayoutError::EmptyLayoutId);
    }

    #[test]
    fn allocate_unknown_layout_fails() {
        let set = LayoutSet::new(vec![tint()]).unwrap();
        assert!(set.allocate(&LayoutId::new("Nope")).is_err());
    }
}
