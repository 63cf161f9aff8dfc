//! Scalar coercions between record slots and message values.

use layout::{normalize_int, read_c_str, truncate_at_nul, write_fixed, FieldKind, Slot, POINTER_SIZE};
use schema::{FieldType, Value};

use crate::plan::SkipReason;

/// How a scalar record field converts to and from its message field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coercion {
    /// 1-, 2- or 4-byte integer carried as `int32`.
    Int { width: u8, signed: bool },
    /// One-byte boolean carried as `bool`.
    Bool,
    /// Inline character buffer carried as `string`.
    FixedString { length: usize },
    /// Heap string carried as `string`.
    OwnedString,
}

impl Coercion {
    /// Selects the coercion for a scalar kind and message type.
    ///
    /// Kinds outside the table are `UnhandledType`; a handled kind paired with
    /// the wrong message type is `TypeMismatch`.
    pub fn select(kind: &FieldKind, ty: &FieldType) -> Result<Self, SkipReason> {
        let coercion = match kind {
            FieldKind::ScalarInt {
                width: width @ (1 | 2 | 4),
                signed,
            } => Self::Int {
                width: *width,
                signed: *signed,
            },
            FieldKind::ScalarBool => Self::Bool,
            FieldKind::FixedString { length } => Self::FixedString { length: *length },
            FieldKind::FixedStringArray { count, length } => Self::FixedString {
                length: count * length,
            },
            FieldKind::OwnedString => Self::OwnedString,
            _ => return Err(SkipReason::UnhandledType),
        };
        if coercion.message_type_matches(ty) {
            Ok(coercion)
        } else {
            Err(SkipReason::TypeMismatch)
        }
    }

    /// Bytes the field occupies in the packed record.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Int { width, .. } => *width as usize,
            Self::Bool => 1,
            Self::FixedString { length } => *length,
            Self::OwnedString => POINTER_SIZE,
        }
    }

    /// Converts a record slot into a message value.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn to_value(&self, slot: &Slot) -> Option<Value> {
        let value = match (self, slot) {
            // Unsigned 32-bit values are bit-cast into int32.
            (Self::Int { width, signed }, Slot::Int(value)) => {
                Value::Int32(normalize_int(*width, *signed, *value) as i32)
            }
            (Self::Bool, Slot::Bool(value)) => Value::Bool(*value),
            (Self::FixedString { .. }, Slot::Bytes(bytes)) => Value::String(read_c_str(bytes)),
            (Self::OwnedString, Slot::Str(value)) => Value::String(
                value
                    .as_deref()
                    .map_or_else(String::new, |text| truncate_at_nul(text).to_string()),
            ),
            _ => return None,
        };
        Some(value)
    }

    /// Converts a message value into a record slot.
    ///
    /// An unset field converts from the type's default value.
    #[must_use]
    pub fn to_slot(&self, value: Option<&Value>) -> Option<Slot> {
        let slot = match (self, value) {
            (Self::Int { width, signed }, Some(Value::Int32(value))) => {
                Slot::Int(normalize_int(*width, *signed, i64::from(*value)))
            }
            (Self::Int { .. }, None) => Slot::Int(0),
            (Self::Bool, Some(Value::Bool(value))) => Slot::Bool(*value),
            (Self::Bool, None) => Slot::Bool(false),
            (Self::FixedString { length }, Some(Value::String(text))) => {
                Slot::Bytes(write_fixed(text, *length))
            }
            (Self::FixedString { length }, None) => Slot::Bytes(vec![0; *length]),
            (Self::OwnedString, Some(Value::String(text))) => {
                Slot::Str(Some(truncate_at_nul(text).to_string()))
            }
            (Self::OwnedString, None) => Slot::Str(Some(String::new())),
            _ => return None,
        };
        Some(slot)
    }

    const fn message_type_matches(&self, ty: &FieldType) -> bool {
        matches!(
            (self, ty),
            (Self::Int { .. }, FieldType::Int32)
                | (Self::Bool, FieldType::Bool)
                | (Self::FixedString { .. } | Self::OwnedString, FieldType::String)
        )
    }
}
