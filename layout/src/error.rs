//! Layout validation and record access errors.

use std::fmt;

use crate::LayoutId;

/// Result type for layout operations.
pub type LayoutResult<T> = Result<T, LayoutError>;

/// Errors that can occur when building a layout set or accessing a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LayoutError {
    /// Layout name is empty.
    EmptyLayoutId,

    /// Duplicate layout name in a layout set.
    DuplicateLayout { layout: LayoutId },

    /// Duplicate field name within a layout.
    DuplicateField { layout: LayoutId, field: String },

    /// A nested field references a layout that is not in the set.
    UnknownLayout { layout: LayoutId },

    /// Integer width is zero or wider than eight bytes.
    InvalidIntWidth { layout: LayoutId, field: String, width: u8 },

    /// Fixed string with zero length.
    InvalidStringLength { layout: LayoutId, field: String },

    /// Fixed array with zero elements.
    InvalidArrayCount { layout: LayoutId, field: String },

    /// A layout contains itself by value (directly or transitively).
    RecursiveLayout { layout: LayoutId },

    /// A list node layout declares more than one link to itself.
    MultipleLinks { layout: LayoutId },

    /// A list field points at a node layout without a link field.
    MissingLinkField { layout: LayoutId, field: String },

    /// No field with this name in the record's layout.
    UnknownField { layout: LayoutId, field: String },

    /// The slot does not hold the kind of value requested.
    SlotKindMismatch {
        layout: LayoutId,
        field: String,
        expected: &'static str,
    },

    /// A nested record of the wrong layout was supplied.
    LayoutMismatch { expected: LayoutId, found: LayoutId },
}

impl fmt::Display for LayoutError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyLayoutId => write!(f, "layout name must not be empty"),
            Self::DuplicateLayout { layout } => write!(f, "duplicate layout {layout}"),
            Self::DuplicateField { layout, field } => {
                write!(f, "duplicate field {field} in layout {layout}")
            }
            Self::UnknownLayout { layout } => write!(f, "unknown layout {layout}"),
            Self::InvalidIntWidth {
                layout,
                field,
                width,
            } => {
                write!(f, "invalid integer width {width} for {layout}.{field}")
            }
            Self::InvalidStringLength { layout, field } => {
                write!(f, "fixed string {layout}.{field} must have a non-zero length")
            }
            Self::InvalidArrayCount { layout, field } => {
                write!(f, "fixed array {layout}.{field} must have a non-zero count")
            }
            Self::RecursiveLayout { layout } => {
                write!(f, "layout {layout} contains itself by value")
            }
            Self::MultipleLinks { layout } => {
                write!(f, "layout {layout} declares more than one list link")
            }
            Self::MissingLinkField { layout, field } => {
                write!(
                    f,
                    "list field {field} points at {layout}, which has no link field"
                )
            }
            Self::UnknownField { layout, field } => {
                write!(f, "no field {field} in layout {layout}")
            }
            Self::SlotKindMismatch {
                layout,
                field,
                expected,
            } => {
                write!(f, "{layout}.{field} is not a {expected} slot")
            }
            Self::LayoutMismatch { expected, found } => {
                write!(f, "expected a {expected} record, got {found}")
            }
        }
    }
}

impl std::error::Error for LayoutError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_duplicate_field() {
        let err = LayoutError::DuplicateField {
            layout: LayoutId::new("EnterWorld"),
            field: "name".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("EnterWorld"));
        assert!(msg.contains("name"));
    }

    #[test]
    fn error_display_slot_kind() {
        let err = LayoutError::SlotKindMismatch {
            layout: LayoutId::new("Tint"),
            field: "red".to_string(),
            expected: "string",
        };
        assert_eq!(err.to_string(), "Tint.red is not a string slot");
    }

    #[test]
    fn error_is_std_error() {
        fn assert_error<E: std::error::Error>() {}
        assert_error::<LayoutError>();
    }
}
