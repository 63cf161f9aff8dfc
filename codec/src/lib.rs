//! Opcode registry and bidirectional codec between legacy records and
//! protobuf messages.
//!
//! An `OpcodeRegistry` pairs each 16-bit opcode with a record layout and a
//! message schema, and compiles a binding plan per opcode when it is built.
//! A `Codec` walks those plans in either direction:
//!
//! - `decode` turns a protobuf payload into a `RecordBuffer`. It never fails;
//!   unknown opcodes, malformed payloads and unbindable fields are reported to
//!   a `DiagnosticSink` and the best-effort record is returned.
//! - `encode` turns a record into an `[opcode][payload]` frame. Over-long lists
//!   and excessive nesting are hard errors.
//!
//! # Design Principles
//!
//! - **Fail at build time** - Nested bindings without an opcode and missing
//!   repeated targets are registry errors, not silent skips.
//! - **One traversal** - Both directions share the plan walk.
//! - **Shared, read-only tables** - The registry is immutable and `Send + Sync`.

mod codec;
mod coerce;
#[cfg(feature = "serde")]
mod config;
mod diagnostics;
mod error;
mod limits;
mod plan;
mod registry;
mod walk;

pub use codec::{Codec, Decoded};
pub use coerce::Coercion;
#[cfg(feature = "serde")]
pub use config::RegistryConfig;
pub use diagnostics::{Diagnostic, DiagnosticSink, Flow, NullSink, TracingSink};
pub use error::{CodecError, CodecResult, RegistryError, RegistryResult};
pub use limits::CodecLimits;
pub use plan::{BindEntry, BindOp, BindingPlan, PlanItem, Skip, SkipReason};
pub use registry::{OpcodeDescriptor, OpcodeRegistry, RegistryBuilder, RegistryFingerprint};
pub use wire::Limits as WireLimits;
