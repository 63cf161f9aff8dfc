//! Binding plans: the per-opcode pairing of message fields to record fields.
//!
//! A plan is compiled once when the registry is built. It lists every field
//! of the message schema in declaration order, either bound to a record field
//! with the operation that converts it, or skipped with a reason.

use std::collections::HashMap;
use std::fmt;

use layout::{FieldKind, LayoutId, LayoutSet, RecordLayout, POINTER_SIZE};
use schema::{FieldType, MessageSchema};

use crate::coerce::Coercion;
use crate::error::{RegistryError, RegistryResult};
use crate::OpcodeDescriptor;

/// Why a message field is not bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// The record layout has no field with this name.
    MissingRecordField,
    /// The record field kind is outside the coercion table.
    UnhandledType,
    /// The record field kind cannot carry the message field type.
    TypeMismatch,
    /// The field is the node's own list link.
    ListLink,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::MissingRecordField => "no record field with this name",
            Self::UnhandledType => "record field type is not handled",
            Self::TypeMismatch => "record and message field types differ",
            Self::ListLink => "field is the list link",
        };
        f.write_str(reason)
    }
}

/// How a bound field converts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindOp {
    /// Scalar conversion through the coercion table.
    Scalar(Coercion),
    /// Embedded record bound to an embedded message.
    Nested { opcode: u16 },
    /// Fixed array bound to the repeated field at `target`.
    Array {
        opcode: u16,
        count: usize,
        target: usize,
    },
    /// Linked list bound to the repeated field at `target`.
    List { opcode: u16, target: usize },
}

/// A message field bound to a record field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BindEntry {
    pub message_index: usize,
    pub record_index: usize,
    pub op: BindOp,
    /// Bytes the field occupies in the packed record.
    pub size: usize,
}

/// A message field left unbound.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Skip {
    pub field: String,
    pub reason: SkipReason,
}

/// One step of a binding plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanItem {
    Bind(BindEntry),
    Skip(Skip),
}

/// The compiled binding plan of one opcode.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BindingPlan {
    items: Vec<PlanItem>,
    occupied: usize,
}

impl BindingPlan {
    /// Plan items in message schema order.
    #[must_use]
    pub fn items(&self) -> &[PlanItem] {
        &self.items
    }

    /// Bound entries in message schema order.
    pub fn bound(&self) -> impl Iterator<Item = &BindEntry> {
        self.items.iter().filter_map(|item| match item {
            PlanItem::Bind(entry) => Some(entry),
            PlanItem::Skip(_) => None,
        })
    }

    /// Skipped fields in message schema order.
    pub fn skipped(&self) -> impl Iterator<Item = &Skip> {
        self.items.iter().filter_map(|item| match item {
            PlanItem::Skip(skip) => Some(skip),
            PlanItem::Bind(_) => None,
        })
    }

    /// Total packed size of the bound record fields.
    #[must_use]
    pub const fn occupied_size(&self) -> usize {
        self.occupied
    }
}

/// The registry tables plan compilation resolves nested layouts against.
pub(crate) struct PlanContext<'a> {
    pub layouts: &'a LayoutSet,
    pub descriptors: &'a [OpcodeDescriptor],
    pub by_opcode: &'a HashMap<u16, usize>,
    pub by_layout: &'a HashMap<LayoutId, u16>,
}

pub(crate) fn compile(
    ctx: &PlanContext<'_>,
    descriptor: &OpcodeDescriptor,
    layout: &RecordLayout,
    schema: &MessageSchema,
) -> RegistryResult<BindingPlan> {
    let mut plan = BindingPlan::default();
    for (message_index, field) in schema.fields.iter().enumerate() {
        let Some(record_index) = layout.field_index(&field.name) else {
            plan.skip(&field.name, SkipReason::MissingRecordField);
            continue;
        };
        let kind = &layout.fields[record_index].kind;

        let bound = match kind {
            FieldKind::NestedFlexibleList { layout: node } if *node == layout.id => {
                Err(SkipReason::ListLink)
            }
            FieldKind::NestedSingle { layout: nested } => {
                let (opcode, nested_descriptor) = resolve_nested(ctx, descriptor, &field.name, nested)?;
                match &field.ty {
                    FieldType::Message(schema_id)
                        if *schema_id == nested_descriptor.message_schema =>
                    {
                        Ok((BindOp::Nested { opcode }, byte_size(ctx, nested)))
                    }
                    _ => Err(SkipReason::TypeMismatch),
                }
            }
            FieldKind::NestedFixedArray {
                layout: nested,
                count,
            } => {
                let (opcode, nested_descriptor) = resolve_nested(ctx, descriptor, &field.name, nested)?;
                resolve_target(descriptor, schema, &field.name, nested_descriptor)?.map(|target| {
                    (
                        BindOp::Array {
                            opcode,
                            count: *count,
                            target,
                        },
                        count * byte_size(ctx, nested),
                    )
                })
            }
            FieldKind::NestedFlexibleList { layout: nested } => {
                let (opcode, nested_descriptor) = resolve_nested(ctx, descriptor, &field.name, nested)?;
                resolve_target(descriptor, schema, &field.name, nested_descriptor)?
                    .map(|target| (BindOp::List { opcode, target }, POINTER_SIZE))
            }
            _ => Coercion::select(kind, &field.ty)
                .map(|coercion| (BindOp::Scalar(coercion), coercion.size())),
        };

        match bound {
            Ok((op, size)) => {
                plan.occupied += size;
                plan.items.push(PlanItem::Bind(BindEntry {
                    message_index,
                    record_index,
                    op,
                    size,
                }));
            }
            Err(reason) => plan.skip(&field.name, reason),
        }
    }
    Ok(plan)
}

impl BindingPlan {
    fn skip(&mut self, field: &str, reason: SkipReason) {
        self.items.push(PlanItem::Skip(Skip {
            field: field.to_string(),
            reason,
        }));
    }
}

fn resolve_nested<'a>(
    ctx: &PlanContext<'a>,
    descriptor: &OpcodeDescriptor,
    field: &str,
    nested: &LayoutId,
) -> RegistryResult<(u16, &'a OpcodeDescriptor)> {
    ctx.by_layout
        .get(nested)
        .and_then(|opcode| {
            let position = *ctx.by_opcode.get(opcode)?;
            Some((*opcode, &ctx.descriptors[position]))
        })
        .ok_or_else(|| RegistryError::MissingNestedOpcode {
            opcode: descriptor.opcode,
            field: field.to_string(),
            layout: nested.clone(),
        })
}

/// Finds the repeated field an array or list appends to.
///
/// The nested opcode's `repeated_field_name` wins over the field's own name.
fn resolve_target(
    descriptor: &OpcodeDescriptor,
    schema: &MessageSchema,
    field: &str,
    nested: &OpcodeDescriptor,
) -> RegistryResult<Result<usize, SkipReason>> {
    let target = nested.repeated_field_name.as_deref().unwrap_or(field);
    let index = schema
        .field_index(target)
        .ok_or_else(|| RegistryError::MissingRepeatedField {
            opcode: descriptor.opcode,
            field: field.to_string(),
            target: target.to_string(),
        })?;
    Ok(match &schema.fields[index].ty {
        FieldType::Repeated(schema_id) if *schema_id == nested.message_schema => Ok(index),
        _ => Err(SkipReason::TypeMismatch),
    })
}

fn byte_size(ctx: &PlanContext<'_>, layout: &LayoutId) -> usize {
    ctx.layouts.byte_size(layout).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skip_reason_display() {
        assert_eq!(
            SkipReason::MissingRecordField.to_string(),
            "no record field with this name"
        );
        assert_eq!(SkipReason::ListLink.to_string(), "field is the list link");
    }

    #[test]
    fn empty_plan() {
        let plan = BindingPlan::default();
        assert_eq!(plan.occupied_size(), 0);
        assert_eq!(plan.bound().count(), 0);
        assert_eq!(plan.skipped().count(), 0);
    }
}
