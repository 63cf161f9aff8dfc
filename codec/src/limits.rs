//! Limits for codec traversal.

/// Codec-specific limits enforced while walking records.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecLimits {
    /// Maximum number of nodes followed in one linked list when encoding.
    pub max_list_nodes: usize,
    /// Maximum nesting depth of records and messages.
    pub max_depth: usize,
}

impl Default for CodecLimits {
    fn default() -> Self {
        Self {
            max_list_nodes: 1024,
            max_depth: 32,
        }
    }
}

impl CodecLimits {
    /// Creates limits suitable for testing with smaller values.
    #[must_use]
    pub const fn for_testing() -> Self {
        Self {
            max_list_nodes: 16,
            max_depth: 8,
        }
    }

    /// Creates limits with no restrictions (use with caution).
    #[must_use]
    pub const fn unlimited() -> Self {
        Self {
            max_list_nodes: usize::MAX,
            max_depth: usize::MAX,
        }
    }
}
