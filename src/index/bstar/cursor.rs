//! Resumable in-order traversal.
//!
//! A cursor is a `(node id, key index)` position plus an explicit stack of
//! resumption points, one per ancestor whose keys are still pending. The
//! explicit stack replaces recursion so traversal can stop and resume one
//! step at a time, independent of the tree's recursive rebalancing calls.
//! Stack elements are small owned values, not borrowed node references;
//! nodes are re-read from the store on every step.

use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::{PageId, Result};

use super::store::NodeStore;

/// A forward-only position in the tree's in-order key sequence.
///
/// Obtained from `begin`, `find`, or `end` on the tree. `advance` moves one
/// key to the right; `key` reads the key under the cursor. The end
/// sentinel has no position and compares equal to every other end cursor.
///
/// # Staleness
/// The cursor holds ids and indexes, not node contents. Mutating the tree
/// while a cursor is live leaves the recorded positions stale; the cursor
/// must be rebuilt afterwards.
pub struct Cursor<K, S> {
    store: Arc<Mutex<S>>,
    current: Option<(PageId, usize)>,
    stack: Vec<(PageId, usize)>,
    _key: PhantomData<K>,
}

impl<K, S> Cursor<K, S>
where
    K: Clone + Ord,
    S: NodeStore<K>,
{
    pub(crate) fn positioned(
        store: Arc<Mutex<S>>,
        current: Option<(PageId, usize)>,
        stack: Vec<(PageId, usize)>,
    ) -> Self {
        Self {
            store,
            current,
            stack,
            _key: PhantomData,
        }
    }

    pub(crate) fn end(store: Arc<Mutex<S>>) -> Self {
        Self::positioned(store, None, Vec::new())
    }

    /// Whether this is the end sentinel.
    #[inline]
    pub fn is_end(&self) -> bool {
        self.current.is_none()
    }

    /// The `(node id, key index)` pair under the cursor, if any.
    #[inline]
    pub fn position(&self) -> Option<(PageId, usize)> {
        self.current
    }

    /// Read the key under the cursor; `None` at the end sentinel.
    pub fn key(&self) -> Result<Option<K>> {
        let Some((id, idx)) = self.current else {
            return Ok(None);
        };
        let mut store = self.store.lock();
        let node = store.read_node(id)?;
        Ok(Some(node.keys[idx].clone()))
    }

    /// Step to the next key in order. Advancing the end cursor is a no-op.
    pub fn advance(&mut self) -> Result<()> {
        let Some((id, idx)) = self.current else {
            return Ok(());
        };
        let mut store = self.store.lock();
        let node = store.read_node(id)?;

        if !node.is_leaf() {
            // The key's right subtree comes next; remember this node's
            // remaining keys, then dive down its leftmost spine.
            if idx + 1 < node.count() {
                self.stack.push((id, idx + 1));
            }
            let mut child_id = node.children[idx + 1];
            loop {
                let child = store.read_node(child_id)?;
                if child.is_leaf() {
                    self.current = Some((child_id, 0));
                    return Ok(());
                }
                self.stack.push((child_id, 0));
                child_id = child.children[0];
            }
        }

        if idx + 1 < node.count() {
            self.current = Some((id, idx + 1));
        } else {
            // Leaf exhausted: resume at the nearest pending ancestor, or
            // fall off the end.
            self.current = self.stack.pop();
        }
        Ok(())
    }

    pub(crate) fn reset_to_end(&mut self) {
        self.current = None;
        self.stack.clear();
    }
}

impl<K, S> PartialEq for Cursor<K, S> {
    /// Structural position equality; the resumption stack and store handle
    /// do not participate.
    fn eq(&self, other: &Self) -> bool {
        self.current == other.current
    }
}

impl<K, S> Eq for Cursor<K, S> {}

impl<K, S> std::fmt::Debug for Cursor<K, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cursor")
            .field("current", &self.current)
            .field("stack", &self.stack)
            .finish()
    }
}

/// Lazy iterator over the tree's keys in order, driving a [`Cursor`].
///
/// Yields `Result<K>` because every step re-reads nodes from the store; a
/// store failure ends the iteration after surfacing the error once.
pub struct Keys<K, S> {
    cursor: Cursor<K, S>,
}

impl<K, S> Keys<K, S>
where
    K: Clone + Ord,
    S: NodeStore<K>,
{
    pub(crate) fn new(cursor: Cursor<K, S>) -> Self {
        Self { cursor }
    }
}

impl<K, S> Iterator for Keys<K, S>
where
    K: Clone + Ord,
    S: NodeStore<K>,
{
    type Item = Result<K>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor.is_end() {
            return None;
        }
        let key = match self.cursor.key() {
            Ok(Some(key)) => key,
            Ok(None) => return None,
            Err(err) => {
                self.cursor.reset_to_end();
                return Some(Err(err));
            }
        };
        if let Err(err) = self.cursor.advance() {
            self.cursor.reset_to_end();
            return Some(Err(err));
        }
        Some(Ok(key))
    }
}

#[cfg(test)]
mod tests {
    use crate::index::bstar::store::MemoryNodeStore;
    use crate::index::bstar::BStarTree;

    type MemTree = BStarTree<u32, MemoryNodeStore<u32>>;

    fn seeded(values: &[u32]) -> MemTree {
        let tree = MemTree::in_memory(4).unwrap();
        for &v in values {
            tree.insert(v).unwrap();
        }
        tree
    }

    #[test]
    fn test_begin_walks_every_key_in_order() {
        let tree = seeded(&[8, 3, 11, 1, 6, 14, 4, 9, 2, 13, 7]);

        let mut cursor = tree.begin().unwrap();
        let mut seen = Vec::new();
        while let Some(key) = cursor.key().unwrap() {
            seen.push(key);
            cursor.advance().unwrap();
        }
        assert!(cursor.is_end());
        assert_eq!(seen, vec![1, 2, 3, 4, 6, 7, 8, 9, 11, 13, 14]);
    }

    #[test]
    fn test_find_positions_mid_sequence() {
        let tree = seeded(&(0..30).collect::<Vec<_>>());

        let mut cursor = tree.find(&17).unwrap();
        assert_eq!(cursor.key().unwrap(), Some(17));

        // Advancing from a found position continues the in-order walk.
        let mut rest = Vec::new();
        while let Some(key) = cursor.key().unwrap() {
            rest.push(key);
            cursor.advance().unwrap();
        }
        assert_eq!(rest, (17..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_find_missing_is_end() {
        let tree = seeded(&[2, 4, 6]);
        assert!(tree.find(&5).unwrap().is_end());
        assert_eq!(tree.find(&5).unwrap(), tree.end());
    }

    #[test]
    fn test_end_cursors_compare_equal() {
        let tree = seeded(&[1, 2, 3]);
        assert_eq!(tree.end(), tree.end());
        assert!(tree.end().key().unwrap().is_none());

        // Advancing the end sentinel stays at the end.
        let mut cursor = tree.end();
        cursor.advance().unwrap();
        assert!(cursor.is_end());
    }

    #[test]
    fn test_begin_on_empty_tree_is_end() {
        let tree = MemTree::in_memory(4).unwrap();
        assert_eq!(tree.begin().unwrap(), tree.end());
    }

    #[test]
    fn test_keys_iterator_matches_manual_walk() {
        let values: Vec<u32> = (0..100).rev().collect();
        let tree = seeded(&values);

        let keys: Vec<u32> = tree
            .keys()
            .unwrap()
            .collect::<crate::common::Result<Vec<_>>>()
            .unwrap();
        assert_eq!(keys, (0..100).collect::<Vec<_>>());
    }
}
