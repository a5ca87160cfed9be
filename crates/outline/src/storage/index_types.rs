//! Arena index types for type-safe indexing.

/// A compact 32-bit index into the node arena.
///
/// The u32::MAX value is reserved for `OptionNodeIndex` and used as an
/// invalid/sentinel value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(transparent)]
pub struct NodeIndex(u32);

impl NodeIndex {
    /// Invalid index sentinel value (u32::MAX).
    pub const INVALID: Self = Self(u32::MAX);

    /// Creates a new NodeIndex from a usize.
    ///
    /// # Panics
    /// Panics if `index >= u32::MAX` (reserved for None sentinel).
    #[inline]
    pub fn new(index: usize) -> Self {
        assert!(
            index < u32::MAX as usize,
            "node index must be less than u32::MAX"
        );
        Self(index as u32)
    }

    /// Returns the index as a usize.
    #[inline]
    pub fn get(&self) -> usize {
        self.0 as usize
    }
}

/// An optional node index using u32::MAX as the None sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(transparent)]
pub struct OptionNodeIndex(u32);

impl OptionNodeIndex {
    #[inline]
    pub fn none() -> Self {
        Self(u32::MAX)
    }

    #[inline]
    pub fn some(index: NodeIndex) -> Self {
        Self(index.0)
    }

    #[inline]
    pub fn from_option(index: Option<NodeIndex>) -> Self {
        index.map_or(Self::none(), Self::some)
    }

    #[inline]
    pub fn to_option(self) -> Option<NodeIndex> {
        if self.0 == u32::MAX {
            None
        } else {
            Some(NodeIndex(self.0))
        }
    }
}

impl Default for OptionNodeIndex {
    fn default() -> Self {
        Self::none()
    }
}
