//! The traversal shared by decoding and encoding.
//!
//! Both directions walk the same binding plan. `Walk::fill` drives the plan
//! and owns depth checks, skip reporting, array bounds and list bounds; a
//! `Direction` supplies the reads and writes for one side.

use std::borrow::Cow;

use layout::{RecordBuffer, Slot};
use schema::{Message, Value};

use crate::coerce::Coercion;
use crate::diagnostics::{Diagnostic, DiagnosticSink, Flow};
use crate::error::{CodecError, CodecResult};
use crate::limits::CodecLimits;
use crate::plan::{BindEntry, BindOp, PlanItem};
use crate::registry::OpcodeRegistry;

/// One side of a conversion.
pub(crate) trait Direction {
    /// What the walk reads.
    type Source: Clone;
    /// What the walk builds.
    type Output;

    const FLOW: Flow;

    /// Whether list sources are followed through links and need the node cap.
    /// A repeated field is already finite, so message sources are not capped.
    const BOUNDED_LISTS: bool;

    /// A zeroed output for an opcode.
    fn allocate(registry: &OpcodeRegistry, opcode: u16) -> Option<Self::Output>;

    /// A source with every field unset, walked in place of a missing child.
    fn blank(registry: &OpcodeRegistry, opcode: u16) -> Option<Self::Source>;

    fn scalar(
        source: &Self::Source,
        output: &mut Self::Output,
        entry: &BindEntry,
        coercion: &Coercion,
    ) -> CodecResult<()>;

    /// The child source of a nested binding, if present.
    fn nested<'s>(source: &'s Self::Source, entry: &BindEntry) -> Option<&'s Self::Source>;

    fn set_nested(output: &mut Self::Output, entry: &BindEntry, child: Self::Output)
        -> CodecResult<()>;

    /// The element sources of an array binding.
    fn elements<'s>(source: &'s Self::Source, entry: &BindEntry, target: usize)
        -> Vec<&'s Self::Source>;

    fn set_elements(
        output: &mut Self::Output,
        entry: &BindEntry,
        target: usize,
        children: Vec<Self::Output>,
    ) -> CodecResult<()>;

    /// The node sources of a list binding, at most `take` of them.
    fn nodes<'s>(
        source: &'s Self::Source,
        entry: &BindEntry,
        target: usize,
        take: usize,
    ) -> Vec<&'s Self::Source>;

    fn set_nodes(
        output: &mut Self::Output,
        entry: &BindEntry,
        target: usize,
        children: Vec<Self::Output>,
    ) -> CodecResult<()>;
}

/// Message to record.
pub(crate) struct ToRecord;

/// Record to message.
pub(crate) struct ToMessage;

impl Direction for ToRecord {
    type Source = Message;
    type Output = RecordBuffer;

    const FLOW: Flow = Flow::Decode;
    const BOUNDED_LISTS: bool = false;

    fn allocate(registry: &OpcodeRegistry, opcode: u16) -> Option<RecordBuffer> {
        registry.allocate(opcode)
    }

    fn blank(registry: &OpcodeRegistry, opcode: u16) -> Option<Message> {
        registry.message(opcode)
    }

    fn scalar(
        source: &Message,
        output: &mut RecordBuffer,
        entry: &BindEntry,
        coercion: &Coercion,
    ) -> CodecResult<()> {
        if let Some(slot) = coercion.to_slot(source.get_index(entry.message_index)) {
            output.set_slot(entry.record_index, slot)?;
        }
        Ok(())
    }

    fn nested<'s>(source: &'s Message, entry: &BindEntry) -> Option<&'s Message> {
        match source.get_index(entry.message_index)? {
            Value::Message(child) => Some(child),
            _ => None,
        }
    }

    fn set_nested(output: &mut RecordBuffer, entry: &BindEntry, child: RecordBuffer) -> CodecResult<()> {
        output.set_slot(entry.record_index, Slot::Record(Box::new(child)))?;
        Ok(())
    }

    fn elements<'s>(source: &'s Message, _entry: &BindEntry, target: usize) -> Vec<&'s Message> {
        repeated(source, target).iter().collect()
    }

    fn set_elements(
        output: &mut RecordBuffer,
        entry: &BindEntry,
        _target: usize,
        children: Vec<RecordBuffer>,
    ) -> CodecResult<()> {
        output.set_slot(entry.record_index, Slot::Array(children))?;
        Ok(())
    }

    fn nodes<'s>(source: &'s Message, _entry: &BindEntry, target: usize, take: usize) -> Vec<&'s Message> {
        repeated(source, target).iter().take(take).collect()
    }

    fn set_nodes(
        output: &mut RecordBuffer,
        entry: &BindEntry,
        _target: usize,
        children: Vec<RecordBuffer>,
    ) -> CodecResult<()> {
        output.set_list_at(entry.record_index, children)?;
        Ok(())
    }
}

fn repeated(message: &Message, index: usize) -> &[Message] {
    match message.get_index(index) {
        Some(Value::List(items)) => items,
        _ => &[],
    }
}

impl Direction for ToMessage {
    type Source = RecordBuffer;
    type Output = Message;

    const FLOW: Flow = Flow::Encode;
    const BOUNDED_LISTS: bool = true;

    fn allocate(registry: &OpcodeRegistry, opcode: u16) -> Option<Message> {
        registry.message(opcode)
    }

    fn blank(registry: &OpcodeRegistry, opcode: u16) -> Option<RecordBuffer> {
        registry.allocate(opcode)
    }

    fn scalar(
        source: &RecordBuffer,
        output: &mut Message,
        entry: &BindEntry,
        coercion: &Coercion,
    ) -> CodecResult<()> {
        let value = source
            .slot(entry.record_index)
            .and_then(|slot| coercion.to_value(slot));
        if let Some(value) = value {
            output.set_index(entry.message_index, value)?;
        }
        Ok(())
    }

    fn nested<'s>(source: &'s RecordBuffer, entry: &BindEntry) -> Option<&'s RecordBuffer> {
        match source.slot(entry.record_index)? {
            Slot::Record(child) => Some(child),
            _ => None,
        }
    }

    fn set_nested(output: &mut Message, entry: &BindEntry, child: Message) -> CodecResult<()> {
        output.set_index(entry.message_index, Value::Message(Box::new(child)))?;
        Ok(())
    }

    fn elements<'s>(source: &'s RecordBuffer, entry: &BindEntry, _target: usize) -> Vec<&'s RecordBuffer> {
        match source.slot(entry.record_index) {
            Some(Slot::Array(items)) => items.iter().collect(),
            _ => Vec::new(),
        }
    }

    fn set_elements(
        output: &mut Message,
        _entry: &BindEntry,
        target: usize,
        children: Vec<Message>,
    ) -> CodecResult<()> {
        push_all(output, target, children)
    }

    fn nodes<'s>(
        source: &'s RecordBuffer,
        entry: &BindEntry,
        _target: usize,
        take: usize,
    ) -> Vec<&'s RecordBuffer> {
        source
            .list_at(entry.record_index)
            .map(|nodes| nodes.take(take).collect())
            .unwrap_or_default()
    }

    fn set_nodes(
        output: &mut Message,
        _entry: &BindEntry,
        target: usize,
        children: Vec<Message>,
    ) -> CodecResult<()> {
        push_all(output, target, children)
    }
}

fn push_all(output: &mut Message, target: usize, children: Vec<Message>) -> CodecResult<()> {
    for child in children {
        output.push_index(target, child)?;
    }
    Ok(())
}

/// A single conversion call: the registry, its limits and the caller's sink.
pub(crate) struct Walk<'a> {
    pub registry: &'a OpcodeRegistry,
    pub limits: &'a CodecLimits,
    pub sink: &'a mut dyn DiagnosticSink,
}

impl Walk<'_> {
    /// Converts `source` into a freshly allocated output.
    pub fn run<D: Direction>(
        &mut self,
        opcode: u16,
        source: &D::Source,
        depth: usize,
    ) -> CodecResult<D::Output> {
        let mut output =
            D::allocate(self.registry, opcode).ok_or(CodecError::MissingPlan { opcode })?;
        self.fill::<D>(opcode, source, &mut output, depth)?;
        Ok(output)
    }

    /// Walks the plan of `opcode`, writing into `output`.
    ///
    /// On a hard error the fields written so far stay in `output`.
    pub fn fill<D: Direction>(
        &mut self,
        opcode: u16,
        source: &D::Source,
        output: &mut D::Output,
        depth: usize,
    ) -> CodecResult<()> {
        if depth > self.limits.max_depth {
            return Err(CodecError::DepthExceeded {
                opcode,
                limit: self.limits.max_depth,
            });
        }
        let registry = self.registry;
        let plan = registry
            .plan(opcode)
            .ok_or(CodecError::MissingPlan { opcode })?;

        for item in plan.items() {
            let entry = match item {
                PlanItem::Bind(entry) => entry,
                PlanItem::Skip(skip) => {
                    self.sink.report(Diagnostic::FieldSkipped {
                        opcode,
                        field: skip.field.clone(),
                        reason: skip.reason,
                    });
                    continue;
                }
            };

            match &entry.op {
                BindOp::Scalar(coercion) => D::scalar(source, output, entry, coercion)?,
                BindOp::Nested { opcode: nested } => {
                    let child = match D::nested(source, entry) {
                        Some(child) => Cow::Borrowed(child),
                        None => Cow::Owned(
                            D::blank(registry, *nested)
                                .ok_or(CodecError::MissingPlan { opcode: *nested })?,
                        ),
                    };
                    let child = self.run::<D>(*nested, &*child, depth + 1)?;
                    D::set_nested(output, entry, child)?;
                }
                BindOp::Array {
                    opcode: nested,
                    count,
                    target,
                } => {
                    let mut elements = D::elements(source, entry, *target);
                    if elements.len() > *count {
                        self.sink.report(Diagnostic::ArrayOverflow {
                            opcode,
                            field: field_name(registry, opcode, entry),
                            capacity: *count,
                            received: elements.len(),
                        });
                        elements.truncate(*count);
                    }
                    let mut children = Vec::with_capacity(*count);
                    for element in elements {
                        children.push(self.run::<D>(*nested, element, depth + 1)?);
                    }
                    while children.len() < *count {
                        children.push(
                            D::allocate(registry, *nested)
                                .ok_or(CodecError::MissingPlan { opcode: *nested })?,
                        );
                    }
                    D::set_elements(output, entry, *target, children)?;
                }
                BindOp::List {
                    opcode: nested,
                    target,
                } => {
                    let limit = self.limits.max_list_nodes;
                    let take = if D::BOUNDED_LISTS {
                        limit.saturating_add(1)
                    } else {
                        usize::MAX
                    };
                    let nodes = D::nodes(source, entry, *target, take);
                    if D::BOUNDED_LISTS && nodes.len() > limit {
                        return Err(CodecError::MalformedList {
                            opcode,
                            field: field_name(registry, opcode, entry),
                            limit,
                        });
                    }
                    let mut children = Vec::with_capacity(nodes.len());
                    for node in nodes {
                        children.push(self.run::<D>(*nested, node, depth + 1)?);
                    }
                    D::set_nodes(output, entry, *target, children)?;
                }
            }
        }
        Ok(())
    }
}

fn field_name(registry: &OpcodeRegistry, opcode: u16, entry: &BindEntry) -> String {
    registry
        .layout(opcode)
        .and_then(|layout| layout.fields.get(entry.record_index))
        .map_or_else(|| format!("#{}", entry.record_index), |field| field.name.clone())
}
