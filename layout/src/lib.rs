//! Fixed record layouts and owned record buffers for the structwire bridge.
//!
//! This crate describes the legacy side of the bridge:
//! - Record layouts: ordered, typed fields with C-style sizes
//! - Layout sets: validated collections that resolve nested layouts
//! - Record buffers: zero-initialized, owned instances of a layout
//!
//! # Design Principles
//!
//! - **Validated up front** - Unknown layouts, bad widths, and by-value cycles
//!   are rejected when the set is built, never while a record is in use.
//! - **Owned records** - Nested records, arrays, and list nodes are owned by
//!   their parent; dropping a record frees the whole tree.
//! - **C semantics at the edges** - Integers wrap to their width and fixed
//!   strings truncate and zero-fill like a `strncpy` into the packed struct.

mod error;
mod field;
mod layout;
mod record;
mod text;

pub use error::{LayoutError, LayoutResult};
pub use field::{normalize_int, FieldDescriptor, FieldKind, LayoutId, POINTER_SIZE};
pub use layout::{LayoutSet, LayoutSetBuilder, RecordLayout};
pub use record::{ListIter, RecordBuffer, Slot};
pub use text::{read_c_str, truncate_at_nul, write_fixed};
