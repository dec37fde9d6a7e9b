//! Page identifier type.

use std::fmt;

/// Identifies a record slot in a node store.
///
/// Using `u64` means the monotonic allocator can run for the life of any
/// realistic index without wrapping (freed ids are never reclaimed).
///
/// # Well-Known Identifiers
/// The persisted layout reserves two slots:
/// - [`PageId::HEADER`] (0) - the tree header record
/// - [`PageId::ROOT`] (1) - the double-capacity root node
///
/// Ordinary nodes are allocated monotonically starting at id 2.
///
/// # Example
/// ```
/// use stardex::PageId;
///
/// let page_id = PageId::new(42);
/// assert!(page_id.is_valid());
/// assert_eq!(page_id.0, 42);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PageId(pub u64);

impl PageId {
    /// Invalid/sentinel page ID.
    ///
    /// Used to represent "no page" or uninitialized state.
    pub const INVALID: PageId = PageId(u64::MAX);

    /// The tree header record lives in slot 0.
    pub const HEADER: PageId = PageId(0);

    /// The root node lives in slot 1 for the life of the tree.
    pub const ROOT: PageId = PageId(1);

    /// Create a new PageId.
    #[inline]
    pub fn new(id: u64) -> Self {
        PageId(id)
    }

    /// Check if this page ID is valid (not the sentinel value).
    #[inline]
    pub fn is_valid(&self) -> bool {
        *self != Self::INVALID
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if *self == Self::INVALID {
            write!(f, "Page(INVALID)")
        } else {
            write!(f, "Page({})", self.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_id_new() {
        let pid = PageId::new(42);
        assert_eq!(pid.0, 42);
        assert!(pid.is_valid());
    }

    #[test]
    fn test_page_id_invalid() {
        assert!(!PageId::INVALID.is_valid());
        assert_eq!(PageId::INVALID.0, u64::MAX);
    }

    #[test]
    fn test_well_known_ids() {
        assert_eq!(PageId::HEADER.0, 0);
        assert_eq!(PageId::ROOT.0, 1);
        assert!(PageId::HEADER.is_valid());
        assert!(PageId::ROOT.is_valid());
    }

    #[test]
    fn test_page_id_ordering() {
        assert!(PageId::new(1) < PageId::new(2));
        assert!(PageId::new(5) > PageId::new(3));
    }

    #[test]
    fn test_page_id_display() {
        assert_eq!(format!("{}", PageId::new(42)), "Page(42)");
        assert_eq!(format!("{}", PageId::INVALID), "Page(INVALID)");
    }
}
