//! Non-fatal conversion diagnostics and the sinks that receive them.

use std::fmt;

use layout::LayoutId;
use schema::MessageError;
use tracing::warn;

use crate::error::CodecError;
use crate::plan::SkipReason;

/// Direction of the conversion a diagnostic was raised in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// Wire bytes to record.
    Decode,
    /// Record to wire bytes.
    Encode,
}

impl fmt::Display for Flow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Decode => f.write_str("decode"),
            Self::Encode => f.write_str("encode"),
        }
    }
}

/// A recovered problem met during a conversion.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Diagnostic {
    /// No descriptor is registered for the opcode.
    UnknownOpcode { opcode: u16, flow: Flow },

    /// The payload is not a valid message; the decoded prefix was kept.
    MalformedPayload { opcode: u16, error: MessageError },

    /// A message field was not converted.
    FieldSkipped {
        opcode: u16,
        field: String,
        reason: SkipReason,
    },

    /// A repeated field held more elements than the fixed array has slots.
    ArrayOverflow {
        opcode: u16,
        field: String,
        capacity: usize,
        received: usize,
    },

    /// The record handed to the encoder has a different layout.
    LayoutMismatch {
        opcode: u16,
        expected: LayoutId,
        found: LayoutId,
    },

    /// A decode stopped early on a hard error; the partial record was kept.
    Aborted { opcode: u16, error: CodecError },
}

impl Diagnostic {
    /// The opcode the diagnostic concerns.
    #[must_use]
    pub const fn opcode(&self) -> u16 {
        match self {
            Self::UnknownOpcode { opcode, .. }
            | Self::MalformedPayload { opcode, .. }
            | Self::FieldSkipped { opcode, .. }
            | Self::ArrayOverflow { opcode, .. }
            | Self::LayoutMismatch { opcode, .. }
            | Self::Aborted { opcode, .. } => *opcode,
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownOpcode { opcode, flow } => {
                write!(f, "{flow}: unknown opcode {opcode:#06x}")
            }
            Self::MalformedPayload { opcode, error } => {
                write!(f, "decode: malformed payload for opcode {opcode:#06x}: {error}")
            }
            Self::FieldSkipped {
                opcode,
                field,
                reason,
            } => {
                write!(f, "opcode {opcode:#06x}: skipped field {field}: {reason}")
            }
            Self::ArrayOverflow {
                opcode,
                field,
                capacity,
                received,
            } => {
                write!(
                    f,
                    "decode: opcode {opcode:#06x} field {field} holds {capacity} elements, dropped {} of {received}",
                    received.saturating_sub(*capacity)
                )
            }
            Self::LayoutMismatch {
                opcode,
                expected,
                found,
            } => {
                write!(
                    f,
                    "encode: opcode {opcode:#06x} expects a {expected} record, got {found}"
                )
            }
            Self::Aborted { opcode, error } => {
                write!(f, "decode: opcode {opcode:#06x} aborted: {error}")
            }
        }
    }
}

/// Receives diagnostics from the codec.
pub trait DiagnosticSink {
    fn report(&mut self, diagnostic: Diagnostic);
}

impl DiagnosticSink for Vec<Diagnostic> {
    fn report(&mut self, diagnostic: Diagnostic) {
        self.push(diagnostic);
    }
}

impl<S: DiagnosticSink + ?Sized> DiagnosticSink for &mut S {
    fn report(&mut self, diagnostic: Diagnostic) {
        (**self).report(diagnostic);
    }
}

/// Emits each diagnostic as a `tracing` warning.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn report(&mut self, diagnostic: Diagnostic) {
        match &diagnostic {
            Diagnostic::FieldSkipped { opcode, field, .. }
            | Diagnostic::ArrayOverflow { opcode, field, .. } => {
                warn!(opcode = *opcode, field = field.as_str(), "{diagnostic}");
            }
            Diagnostic::LayoutMismatch { opcode, found, .. } => {
                warn!(opcode = *opcode, layout = found.as_str(), "{diagnostic}");
            }
            _ => warn!(opcode = diagnostic.opcode(), "{diagnostic}"),
        }
    }
}

/// Discards diagnostics.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn report(&mut self, _diagnostic: Diagnostic) {}
}
