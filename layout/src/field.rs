//! Record field kinds and descriptors.

use std::fmt;
use std::mem::size_of;

/// Size of a pointer-sized slot (owned strings, list links).
pub const POINTER_SIZE: usize = size_of::<usize>();

/// Name of a record layout.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct LayoutId(String);

impl LayoutId {
    /// Creates a layout id from a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Returns the layout name.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` for the unnamed layout of an empty record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for LayoutId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for LayoutId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// The semantic kind of a record field.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FieldKind {
    /// Fixed-width integer, `width` in bytes.
    ScalarInt { width: u8, signed: bool },

    /// One-byte boolean.
    ScalarBool,

    /// Inline character buffer of `length` bytes.
    FixedString { length: usize },

    /// Pointer-sized slot referencing a heap string.
    OwnedString,

    /// Inline two-dimensional character buffer, `count` rows of `length`
    /// bytes. Carried as one string read from the start of the buffer.
    FixedStringArray { count: usize, length: usize },

    /// Embedded record of another layout.
    NestedSingle { layout: LayoutId },

    /// Embedded array of `count` records.
    NestedFixedArray { layout: LayoutId, count: usize },

    /// Link to the head of a singly linked list of records.
    NestedFlexibleList { layout: LayoutId },
}

impl FieldKind {
    /// Creates an unsigned integer kind.
    #[must_use]
    pub const fn uint(width: u8) -> Self {
        Self::ScalarInt {
            width,
            signed: false,
        }
    }

    /// Creates a signed integer kind.
    #[must_use]
    pub const fn sint(width: u8) -> Self {
        Self::ScalarInt {
            width,
            signed: true,
        }
    }

    /// Creates a boolean kind.
    #[must_use]
    pub const fn bool() -> Self {
        Self::ScalarBool
    }

    /// Creates a fixed-length string kind.
    #[must_use]
    pub const fn fixed_string(length: usize) -> Self {
        Self::FixedString { length }
    }

    /// Creates a `char[count][length]` kind.
    #[must_use]
    pub const fn string_array(count: usize, length: usize) -> Self {
        Self::FixedStringArray { count, length }
    }

    /// Creates a pointer-referenced string kind.
    #[must_use]
    pub const fn owned_string() -> Self {
        Self::OwnedString
    }

    /// Creates an embedded record kind.
    pub fn nested(layout: impl Into<LayoutId>) -> Self {
        Self::NestedSingle {
            layout: layout.into(),
        }
    }

    /// Creates a fixed array kind.
    pub fn array(layout: impl Into<LayoutId>, count: usize) -> Self {
        Self::NestedFixedArray {
            layout: layout.into(),
            count,
        }
    }

    /// Creates a linked list kind.
    pub fn list(layout: impl Into<LayoutId>) -> Self {
        Self::NestedFlexibleList {
            layout: layout.into(),
        }
    }

    /// Returns the layout referenced by a nested kind.
    #[must_use]
    pub fn nested_layout(&self) -> Option<&LayoutId> {
        match self {
            Self::NestedSingle { layout }
            | Self::NestedFixedArray { layout, .. }
            | Self::NestedFlexibleList { layout } => Some(layout),
            _ => None,
        }
    }

    /// Returns `true` for kinds stored inline in the record.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        matches!(
            self,
            Self::ScalarInt { .. }
                | Self::ScalarBool
                | Self::FixedString { .. }
                | Self::FixedStringArray { .. }
                | Self::OwnedString
        )
    }

    /// Byte length of an inline character buffer.
    #[must_use]
    pub const fn text_len(&self) -> Option<usize> {
        match self {
            Self::FixedString { length } => Some(*length),
            Self::FixedStringArray { count, length } => Some(count.saturating_mul(*length)),
            _ => None,
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ScalarInt { width, signed } => {
                let prefix = if *signed { "int" } else { "uint" };
                write!(f, "{prefix}{}", u32::from(*width) * 8)
            }
            Self::ScalarBool => write!(f, "bool"),
            Self::FixedString { length } => write!(f, "char[{length}]"),
            Self::OwnedString => write!(f, "char*"),
            Self::FixedStringArray { count, length } => write!(f, "char[{count}][{length}]"),
            Self::NestedSingle { layout } => write!(f, "struct {layout}"),
            Self::NestedFixedArray { layout, count } => write!(f, "struct {layout}[{count}]"),
            Self::NestedFlexibleList { layout } => write!(f, "struct {layout}*"),
        }
    }
}

/// A named field within a record layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct FieldDescriptor {
    pub name: String,
    pub kind: FieldKind,
}

impl FieldDescriptor {
    /// Creates a field descriptor.
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Wraps an integer to the range of a `width`-byte field.
///
/// Matches a C assignment into the narrower type. Widths outside 1, 2, 4 and 8
/// leave the value untouched.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn normalize_int(width: u8, signed: bool, value: i64) -> i64 {
    match (width, signed) {
        (1, false) => value as u8 as i64,
        (1, true) => value as i8 as i64,
        (2, false) => value as u16 as i64,
        (2, true) => value as i16 as i64,
        (4, false) => value as u32 as i64,
        (4, true) => value as i32 as i64,
        _ => value,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_kind_constructors() {
        assert!(matches!(
            FieldKind::uint(4),
            FieldKind::ScalarInt {
                width: 4,
                signed: false
            }
        ));
        assert!(matches!(
            FieldKind::sint(1),
            FieldKind::ScalarInt {
                width: 1,
                signed: true
            }
        ));
        assert!(matches!(
            FieldKind::fixed_string(64),
            FieldKind::FixedString { length: 64 }
        ));
        assert_eq!(
            FieldKind::array("Tint", 9).nested_layout(),
            Some(&LayoutId::new("Tint"))
        );
        assert_eq!(FieldKind::owned_string().nested_layout(), None);
    }

    #[test]
    fn field_kind_display_reads_like_c() {
        assert_eq!(FieldKind::uint(4).to_string(), "uint32");
        assert_eq!(FieldKind::sint(2).to_string(), "int16");
        assert_eq!(FieldKind::fixed_string(16).to_string(), "char[16]");
        assert_eq!(FieldKind::list("Node").to_string(), "struct Node*");
        assert_eq!(FieldKind::string_array(6, 64).to_string(), "char[6][64]");
    }

    #[test]
    fn text_len_covers_every_row() {
        assert_eq!(FieldKind::fixed_string(32).text_len(), Some(32));
        assert_eq!(FieldKind::string_array(6, 64).text_len(), Some(384));
        assert_eq!(FieldKind::owned_string().text_len(), None);
        assert!(FieldKind::string_array(2, 2).is_scalar());
    }

    #[test]
    fn normalize_int_wraps_like_c() {
        assert_eq!(normalize_int(1, false, 300), 44);
        assert_eq!(normalize_int(1, true, 200), -56);
        assert_eq!(normalize_int(2, false, -1), 65_535);
        assert_eq!(normalize_int(4, false, -1), 4_294_967_295);
        assert_eq!(normalize_int(4, true, 4_294_967_295), -1);
        assert_eq!(normalize_int(8, true, i64::MIN), i64::MIN);
    }

    #[test]
    fn pointer_size_matches_usize() {
        assert_eq!(POINTER_SIZE, size_of::<usize>());
    }
}
