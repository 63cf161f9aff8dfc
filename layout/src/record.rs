//! In-memory legacy records.
//!
//! A `RecordBuffer` holds one slot per layout field. Fixed strings keep their
//! raw bytes so truncation and NUL handling match the packed record, while
//! nested records and list nodes are owned directly.

use std::sync::Arc;

use crate::error::{LayoutError, LayoutResult};
use crate::layout::LayoutSet;
use crate::text::{read_c_str, write_fixed};
use crate::{normalize_int, FieldKind, LayoutId, RecordLayout};

/// Storage for one record field.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Integer value, already wrapped to the field width.
    Int(i64),
    /// Boolean value.
    Bool(bool),
    /// Inline character buffer, exactly `length` bytes.
    Bytes(Vec<u8>),
    /// Heap string; `None` is a null pointer.
    Str(Option<String>),
    /// Embedded record.
    Record(Box<RecordBuffer>),
    /// Embedded fixed array.
    Array(Vec<RecordBuffer>),
    /// Head of a linked list; `None` terminates.
    Link(Option<Box<RecordBuffer>>),
}

impl Slot {
    /// Returns `true` if this slot can occupy a field of `kind`.
    #[must_use]
    pub fn matches(&self, kind: &FieldKind) -> bool {
        match (self, kind) {
            (Self::Int(_), FieldKind::ScalarInt { .. })
            | (Self::Bool(_), FieldKind::ScalarBool)
            | (Self::Str(_), FieldKind::OwnedString) => true,
            (Self::Bytes(bytes), FieldKind::FixedString { .. } | FieldKind::FixedStringArray { .. }) => {
                kind.text_len() == Some(bytes.len())
            }
            (Self::Record(record), FieldKind::NestedSingle { layout }) => {
                record.layout_id() == layout
            }
            (Self::Array(items), FieldKind::NestedFixedArray { layout, count }) => {
                items.len() == *count && items.iter().all(|item| item.layout_id() == layout)
            }
            (Self::Link(head), FieldKind::NestedFlexibleList { layout }) => {
                head.as_ref().map_or(true, |node| node.layout_id() == layout)
            }
            _ => false,
        }
    }

    /// Short name of the slot kind, for error messages.
    #[must_use]
    pub const fn kind_name(&self) -> &'static str {
        match self {
            Self::Int(_) => "integer",
            Self::Bool(_) => "bool",
            Self::Bytes(_) => "fixed string",
            Self::Str(_) => "owned string",
            Self::Record(_) => "record",
            Self::Array(_) => "array",
            Self::Link(_) => "list",
        }
    }
}

/// A legacy record: one slot per field of its layout.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordBuffer {
    layout: Arc<RecordLayout>,
    slots: Vec<Slot>,
}

impl RecordBuffer {
    /// The record produced for unknown opcodes: no layout, no fields.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            layout: Arc::new(RecordLayout::new(LayoutId::default())),
            slots: Vec::new(),
        }
    }

    pub(crate) fn zeroed(layout: Arc<RecordLayout>, set: &LayoutSet) -> LayoutResult<Self> {
        let mut slots = Vec::with_capacity(layout.fields.len());
        for field in &layout.fields {
            let slot = match &field.kind {
                FieldKind::ScalarInt { .. } => Slot::Int(0),
                FieldKind::ScalarBool => Slot::Bool(false),
                FieldKind::FixedString { length } => Slot::Bytes(vec![0; *length]),
                FieldKind::FixedStringArray { count, length } => Slot::Bytes(vec![0; count * length]),
                FieldKind::OwnedString => Slot::Str(None),
                FieldKind::NestedSingle { layout } => Slot::Record(Box::new(set.allocate(layout)?)),
                FieldKind::NestedFixedArray { layout, count } => Slot::Array(
                    (0..*count)
                        .map(|_| set.allocate(layout))
                        .collect::<LayoutResult<_>>()?,
                ),
                FieldKind::NestedFlexibleList { .. } => Slot::Link(None),
            };
            slots.push(slot);
        }
        Ok(Self { layout, slots })
    }

    /// Returns `true` for the layout-less empty record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.layout.id.is_empty() && self.slots.is_empty()
    }

    /// Returns the record's layout.
    #[must_use]
    pub fn layout(&self) -> &Arc<RecordLayout> {
        &self.layout
    }

    /// Returns the record's layout id.
    #[must_use]
    pub fn layout_id(&self) -> &LayoutId {
        &self.layout.id
    }

    /// Returns all slots in field order.
    #[must_use]
    pub fn slots(&self) -> &[Slot] {
        &self.slots
    }

    /// Returns the slot at a field index.
    #[must_use]
    pub fn slot(&self, index: usize) -> Option<&Slot> {
        self.slots.get(index)
    }

    /// Replaces the slot at a field index.
    ///
    /// The slot must match the field kind. Integers are wrapped to the field
    /// width and fixed strings must already be exactly `length` bytes.
    pub fn set_slot(&mut self, index: usize, slot: Slot) -> LayoutResult<()> {
        let field = self
            .layout
            .fields
            .get(index)
            .ok_or_else(|| LayoutError::UnknownField {
                layout: self.layout.id.clone(),
                field: format!("#{index}"),
            })?;
        if !slot.matches(&field.kind) {
            return Err(self.kind_mismatch(index, expected_name(&field.kind)));
        }
        let slot = match (slot, &field.kind) {
            (Slot::Int(value), FieldKind::ScalarInt { width, signed }) => {
                Slot::Int(normalize_int(*width, *signed, value))
            }
            (slot, _) => slot,
        };
        self.slots[index] = slot;
        Ok(())
    }

    /// Returns a mutable embedded record by field index.
    pub fn nested_at_mut(&mut self, index: usize) -> Option<&mut Self> {
        match self.slots.get_mut(index)? {
            Slot::Record(record) => Some(record),
            _ => None,
        }
    }

    /// Returns mutable array elements by field index.
    pub fn array_at_mut(&mut self, index: usize) -> Option<&mut [Self]> {
        match self.slots.get_mut(index)? {
            Slot::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Iterates the list rooted at a field index.
    #[must_use]
    pub fn list_at(&self, index: usize) -> Option<ListIter<'_>> {
        match self.slots.get(index)? {
            Slot::Link(head) => Some(ListIter {
                next: head.as_deref(),
            }),
            _ => None,
        }
    }

    /// Links `nodes` in order and stores the chain at a field index.
    pub fn set_list_at(&mut self, index: usize, nodes: Vec<Self>) -> LayoutResult<()> {
        let expected = match self.layout.fields.get(index).map(|field| &field.kind) {
            Some(FieldKind::NestedFlexibleList { layout }) => layout.clone(),
            Some(_) => return Err(self.kind_mismatch(index, "list")),
            None => {
                return Err(LayoutError::UnknownField {
                    layout: self.layout.id.clone(),
                    field: format!("#{index}"),
                })
            }
        };

        let mut head: Option<Box<Self>> = None;
        for mut node in nodes.into_iter().rev() {
            if node.layout.id != expected {
                return Err(LayoutError::LayoutMismatch {
                    expected,
                    found: node.layout.id.clone(),
                });
            }
            let link = node
                .layout
                .link_field()
                .ok_or_else(|| LayoutError::MissingLinkField {
                    layout: expected.clone(),
                    field: self.layout.fields[index].name.clone(),
                })?;
            node.slots[link] = Slot::Link(head.take());
            head = Some(Box::new(node));
        }
        self.slots[index] = Slot::Link(head);
        Ok(())
    }

    /// Returns the next node when this record is a list node.
    #[must_use]
    pub fn next_node(&self) -> Option<&Self> {
        match self.slots.get(self.layout.link_field()?)? {
            Slot::Link(next) => next.as_deref(),
            _ => None,
        }
    }

    // Name-based accessors.

    /// Reads an integer field.
    pub fn int(&self, name: &str) -> LayoutResult<i64> {
        match self.named(name)? {
            (_, Slot::Int(value)) => Ok(*value),
            (index, _) => Err(self.kind_mismatch(index, "integer")),
        }
    }

    /// Writes an integer field, wrapping to its width.
    pub fn set_int(&mut self, name: &str, value: i64) -> LayoutResult<()> {
        let index = self.index_of(name)?;
        self.set_slot(index, Slot::Int(value))
    }

    /// Reads a boolean field.
    pub fn bool(&self, name: &str) -> LayoutResult<bool> {
        match self.named(name)? {
            (_, Slot::Bool(value)) => Ok(*value),
            (index, _) => Err(self.kind_mismatch(index, "bool")),
        }
    }

    /// Writes a boolean field.
    pub fn set_bool(&mut self, name: &str, value: bool) -> LayoutResult<()> {
        let index = self.index_of(name)?;
        self.set_slot(index, Slot::Bool(value))
    }

    /// Reads a fixed string up to its first NUL.
    pub fn fixed_str(&self, name: &str) -> LayoutResult<String> {
        self.fixed_bytes(name).map(read_c_str)
    }

    /// Returns the raw bytes of a fixed string.
    pub fn fixed_bytes(&self, name: &str) -> LayoutResult<&[u8]> {
        match self.named(name)? {
            (_, Slot::Bytes(bytes)) => Ok(bytes),
            (index, _) => Err(self.kind_mismatch(index, "fixed string")),
        }
    }

    /// Writes a fixed string, truncating to the field length.
    pub fn set_fixed_str(&mut self, name: &str, value: &str) -> LayoutResult<()> {
        let index = self.index_of(name)?;
        match self.layout.fields[index].kind.text_len() {
            Some(length) => {
                let bytes = write_fixed(value, length);
                self.set_slot(index, Slot::Bytes(bytes))
            }
            None => Err(self.kind_mismatch(index, "fixed string")),
        }
    }

    /// Reads an owned string; `None` is a null pointer.
    pub fn owned_str(&self, name: &str) -> LayoutResult<Option<&str>> {
        match self.named(name)? {
            (_, Slot::Str(value)) => Ok(value.as_deref()),
            (index, _) => Err(self.kind_mismatch(index, "owned string")),
        }
    }

    /// Writes an owned string.
    pub fn set_owned_str(&mut self, name: &str, value: Option<String>) -> LayoutResult<()> {
        let index = self.index_of(name)?;
        self.set_slot(index, Slot::Str(value))
    }

    /// Returns an embedded record.
    pub fn nested(&self, name: &str) -> LayoutResult<&Self> {
        match self.named(name)? {
            (_, Slot::Record(record)) => Ok(record),
            (index, _) => Err(self.kind_mismatch(index, "record")),
        }
    }

    /// Returns a mutable embedded record.
    pub fn nested_mut(&mut self, name: &str) -> LayoutResult<&mut Self> {
        let index = self.index_of(name)?;
        let layout = Arc::clone(&self.layout);
        self.nested_at_mut(index)
            .ok_or_else(|| mismatch(&layout, index, "record"))
    }

    /// Returns the elements of an embedded array.
    pub fn array(&self, name: &str) -> LayoutResult<&[Self]> {
        match self.named(name)? {
            (_, Slot::Array(items)) => Ok(items),
            (index, _) => Err(self.kind_mismatch(index, "array")),
        }
    }

    /// Returns the mutable elements of an embedded array.
    pub fn array_mut(&mut self, name: &str) -> LayoutResult<&mut [Self]> {
        let index = self.index_of(name)?;
        let layout = Arc::clone(&self.layout);
        self.array_at_mut(index)
            .ok_or_else(|| mismatch(&layout, index, "array"))
    }

    /// Returns the head of a list field.
    pub fn link(&self, name: &str) -> LayoutResult<Option<&Self>> {
        match self.named(name)? {
            (_, Slot::Link(head)) => Ok(head.as_deref()),
            (index, _) => Err(self.kind_mismatch(index, "list")),
        }
    }

    /// Iterates the nodes of a list field.
    pub fn list(&self, name: &str) -> LayoutResult<ListIter<'_>> {
        self.link(name).map(|next| ListIter { next })
    }

    /// Replaces a list field with `nodes`, linked in order.
    pub fn set_list(&mut self, name: &str, nodes: Vec<Self>) -> LayoutResult<()> {
        let index = self.index_of(name)?;
        self.set_list_at(index, nodes)
    }

    fn index_of(&self, name: &str) -> LayoutResult<usize> {
        self.layout
            .field_index(name)
            .ok_or_else(|| LayoutError::UnknownField {
                layout: self.layout.id.clone(),
                field: name.to_string(),
            })
    }

    fn named(&self, name: &str) -> LayoutResult<(usize, &Slot)> {
        let index = self.index_of(name)?;
        Ok((index, &self.slots[index]))
    }

    fn kind_mismatch(&self, index: usize, expected: &'static str) -> LayoutError {
        mismatch(&self.layout, index, expected)
    }
}

fn mismatch(layout: &RecordLayout, index: usize, expected: &'static str) -> LayoutError {
    LayoutError::SlotKindMismatch {
        layout: layout.id.clone(),
        field: layout
            .fields
            .get(index)
            .map_or_else(|| format!("#{index}"), |field| field.name.clone()),
        expected,
    }
}

impl Drop for RecordBuffer {
    fn drop(&mut self) {
        // Unlink list tails first so long chains drop without recursion.
        let mut pending = Vec::new();
        detach_links(&mut self.slots, &mut pending);
        while let Some(mut node) = pending.pop() {
            detach_links(&mut node.slots, &mut pending);
        }
    }
}

fn detach_links(slots: &mut [Slot], pending: &mut Vec<Box<RecordBuffer>>) {
    for slot in slots {
        if let Slot::Link(head) = slot {
            if let Some(node) = head.take() {
                pending.push(node);
            }
        }
    }
}

const fn expected_name(kind: &FieldKind) -> &'static str {
    match kind {
        FieldKind::ScalarInt { .. } => "integer",
        FieldKind::ScalarBool => "bool",
        FieldKind::FixedString { .. } | FieldKind::FixedStringArray { .. } => "fixed string",
        FieldKind::OwnedString => "owned string",
        FieldKind::NestedSingle { .. } => "record",
        FieldKind::NestedFixedArray { .. } => "array",
        FieldKind::NestedFlexibleList { .. } => "list",
    }
}

/// Iterator over the nodes of a linked list.
#[derive(Debug, Clone)]
pub struct ListIter<'a> {
    next: Option<&'a RecordBuffer>,
}

impl<'a> Iterator for ListIter<'a> {
    type Item = &'a RecordBuffer;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.next?;
        self.next = node.next_node();
        Some(node)
    }
}
