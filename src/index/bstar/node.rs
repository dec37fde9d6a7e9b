//! In-memory node and header representation.

use crate::common::PageId;

/// A B*-tree node as manipulated by the rebalancing engine.
///
/// Nodes are read out of the store as independent copies, mutated locally,
/// and written back immediately; no node reference survives across a
/// mutating call.
///
/// # Shape Invariants
/// - `keys` is sorted ascending.
/// - A leaf has no children; an internal node has exactly
///   `keys.len() + 1` children.
/// - At rest a non-root node holds between `F` and `m - 1` keys and the
///   root holds at most `2F`; mid-operation a node transiently holds one
///   key past its overflow boundary before rebalancing fires.
///
/// Capacity is enforced by the rebalancing algorithm rather than the
/// container; the record codec caps what can be persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node<K> {
    /// Stable identity for the node's lifetime; never reused after deletion.
    pub id: PageId,
    pub keys: Vec<K>,
    pub children: Vec<PageId>,
}

impl<K: Ord> Node<K> {
    /// Create a new empty leaf with the given identity.
    pub fn new_leaf(id: PageId) -> Self {
        Self {
            id,
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Whether this node is a leaf.
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Number of live keys.
    #[inline]
    pub fn count(&self) -> usize {
        self.keys.len()
    }

    /// Index of the first key greater than or equal to `key`, or
    /// `keys.len()` when every key is smaller.
    ///
    /// Node widths are small by construction, so a linear scan is fine and
    /// matches the descent rule: ties stop at the leftmost equal key.
    pub fn scan(&self, key: &K) -> usize {
        self.keys
            .iter()
            .position(|k| key <= k)
            .unwrap_or(self.keys.len())
    }
}

/// The tree's header record, persisted at [`PageId::HEADER`].
///
/// `page_count` counts every allocated record including the header and root
/// themselves, so it doubles as the monotonic id allocator: the next node to
/// be created takes id `page_count`. Freed ids are never recycled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TreeHeader {
    pub root_id: PageId,
    pub page_count: u64,
}

impl TreeHeader {
    /// Header for a freshly initialized tree: a root at slot 1 and two
    /// allocated records (header + root).
    pub fn new() -> Self {
        Self {
            root_id: PageId::ROOT,
            page_count: 2,
        }
    }

    /// Hand out the next node id and bump the allocator.
    ///
    /// The caller must persist the header immediately so ids stay unique
    /// across reopen.
    pub fn allocate(&mut self) -> PageId {
        let id = PageId::new(self.page_count);
        self.page_count += 1;
        id
    }
}

impl Default for TreeHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_leaf() {
        let node: Node<u32> = Node::new_leaf(PageId::new(7));
        assert_eq!(node.id, PageId::new(7));
        assert!(node.is_leaf());
        assert_eq!(node.count(), 0);
    }

    #[test]
    fn test_scan_finds_first_geq() {
        let mut node: Node<u32> = Node::new_leaf(PageId::ROOT);
        node.keys = vec![10, 20, 20, 30];

        assert_eq!(node.scan(&5), 0);
        assert_eq!(node.scan(&10), 0);
        assert_eq!(node.scan(&15), 1);
        assert_eq!(node.scan(&20), 1); // leftmost of equal run
        assert_eq!(node.scan(&25), 3);
        assert_eq!(node.scan(&99), 4);
    }

    #[test]
    fn test_internal_shape() {
        let mut node: Node<u32> = Node::new_leaf(PageId::ROOT);
        node.keys = vec![10];
        node.children = vec![PageId::new(2), PageId::new(3)];
        assert!(!node.is_leaf());
        assert_eq!(node.children.len(), node.count() + 1);
    }

    #[test]
    fn test_header_allocation_is_monotonic() {
        let mut header = TreeHeader::new();
        assert_eq!(header.root_id, PageId::ROOT);
        assert_eq!(header.page_count, 2);

        assert_eq!(header.allocate(), PageId::new(2));
        assert_eq!(header.allocate(), PageId::new(3));
        assert_eq!(header.page_count, 4);
    }
}
