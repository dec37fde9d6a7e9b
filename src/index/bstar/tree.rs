//! B*-tree: insert, remove, find, and the rebalancing engine.
//!
//! The defining B*-tree trade-offs, versus a plain B-tree:
//! - On insert, an overflowing node first tries to shed a key into a
//!   sibling through the parent separator (rotation); only when both
//!   siblings are full does it split - and the split turns *two* nodes
//!   into three, so the outputs start about two-thirds full.
//! - On delete, an underflowing node borrows from siblings where possible
//!   (including a cascaded double rotation through the next sibling over),
//!   and otherwise merges *three* siblings into two.
//!
//! All node access goes through the [`NodeStore`]: read a copy, mutate it
//! locally, write it back immediately. No node reference survives across a
//! mutating call.

use std::fmt;
use std::io;
use std::marker::PhantomData;
use std::mem;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::common::config::MIN_ORDER;
use crate::common::{Error, PageId, Result};

use super::cursor::{Cursor, Keys};
use super::node::{Node, TreeHeader};
use super::store::NodeStore;

/// Outcome of one level of the insert recursion, threaded up the call
/// stack so the parent can decide between rotation and split.
///
/// Overflow is an expected, frequent outcome - normal control flow, not an
/// error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertStatus {
    Normal,
    Overflow,
}

/// An ordered multiset of keys over an abstract node store.
///
/// The tree owns every node reachable from the root; the store owns the
/// physical medium. The store handle is shared (`Arc<Mutex<_>>`) so that
/// cursors can keep walking it after the call that created them returns -
/// the same shape as the original's reference-counted page manager.
///
/// # Concurrency
/// Single-writer, single-threaded by policy: every public operation locks
/// the store once and runs to completion. The mutex is plumbing for the
/// shared handle, not a concurrency feature - no external writer may touch
/// the same store, and mutating the tree while a cursor is live leaves
/// that cursor holding stale positions.
///
/// # Example
/// ```
/// use stardex::BStarTree;
///
/// let tree = BStarTree::in_memory(4).unwrap();
/// for k in [30u32, 10, 20] {
///     tree.insert(k).unwrap();
/// }
/// assert!(tree.contains(&20).unwrap());
/// assert!(tree.remove(&10).unwrap());
/// assert!(!tree.contains(&10).unwrap());
/// ```
pub struct BStarTree<K, S> {
    store: Arc<Mutex<S>>,
    order: usize,
    _key: PhantomData<K>,
}

impl<K, S> BStarTree<K, S>
where
    K: Clone + Ord,
    S: NodeStore<K>,
{
    /// Construct a tree over `store` with order parameter `order`.
    ///
    /// When the store is empty (first use), writes the initial empty root
    /// and header; otherwise the existing header is read back.
    ///
    /// # Errors
    /// `Error::InvalidOrder` if `order` is below [`MIN_ORDER`]; the
    /// three-way merge arithmetic needs `F >= 2`.
    pub fn new(store: Arc<Mutex<S>>, order: usize) -> Result<Self> {
        if order < MIN_ORDER {
            return Err(Error::InvalidOrder(order));
        }
        {
            let mut guard = store.lock();
            if guard.is_empty() {
                guard.write_node(&Node::new_leaf(PageId::ROOT))?;
                guard.write_header(&TreeHeader::new())?;
            } else {
                // Fail construction, not the first operation, on a bad header.
                guard.read_header()?;
            }
        }
        Ok(Self {
            store,
            order,
            _key: PhantomData,
        })
    }

    /// The order parameter `m`.
    #[inline]
    pub fn order(&self) -> usize {
        self.order
    }

    /// Minimum occupancy target `F = (2m - 2) / 3`.
    ///
    /// Non-root nodes at rest hold at least `F` keys; the root overflows
    /// past `2F`.
    #[inline]
    fn f(&self) -> usize {
        (2 * self.order - 2) / 3
    }

    /// Split boundary `T = 2m / 3`: the key count handed to the rightmost
    /// output of a three-way split.
    #[inline]
    fn t(&self) -> usize {
        (2 * self.order) / 3
    }

    fn allocate_node(
        &self,
        store: &mut S,
        header: &mut TreeHeader,
    ) -> Result<Node<K>> {
        let id = header.allocate();
        // Persist the allocator immediately so ids stay unique across reopen.
        store.write_header(header)?;
        Ok(Node::new_leaf(id))
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert a key. Duplicates are allowed; insertion always succeeds.
    pub fn insert(&self, key: K) -> Result<()> {
        let mut store = self.store.lock();
        let mut header = store.read_header()?;
        let mut root = store.read_node(header.root_id)?;

        self.insert_rec(&mut *store, &mut header, &mut root, key)?;
        if root.count() > 2 * self.f() {
            self.split_root(&mut *store, &mut header, &mut root)?;
        }
        store.write_node(&root)
    }

    fn insert_rec(
        &self,
        store: &mut S,
        header: &mut TreeHeader,
        node: &mut Node<K>,
        key: K,
    ) -> Result<InsertStatus> {
        let pos = node.scan(&key);
        if node.is_leaf() {
            node.keys.insert(pos, key);
            store.write_node(node)?;
        } else {
            let mut child = store.read_node(node.children[pos])?;
            match self.insert_rec(store, header, &mut child, key)? {
                InsertStatus::Normal => store.write_node(node)?,
                InsertStatus::Overflow => {
                    if !self.try_shed_overflow(store, node, pos)? {
                        self.split_child(store, header, node, pos)?;
                    }
                }
            }
        }
        if node.count() == self.order {
            Ok(InsertStatus::Overflow)
        } else {
            Ok(InsertStatus::Normal)
        }
    }

    /// Try to relieve the overflowing child at `pos` by rotating one key
    /// into a sibling with spare capacity: right sibling first, then left.
    fn try_shed_overflow(
        &self,
        store: &mut S,
        parent: &mut Node<K>,
        pos: usize,
    ) -> Result<bool> {
        if pos < parent.count() {
            let right = store.read_node(parent.children[pos + 1])?;
            if right.count() < self.order - 1 {
                self.rotate_right(store, parent, pos)?;
                return Ok(true);
            }
        }
        if pos > 0 {
            let left = store.read_node(parent.children[pos - 1])?;
            if left.count() < self.order - 1 {
                self.rotate_left(store, parent, pos - 1)?;
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Move one key from `children[sep]` to the front of `children[sep + 1]`
    /// through the separator. Keys travel rightward; tree height is
    /// untouched.
    fn rotate_right(&self, store: &mut S, parent: &mut Node<K>, sep: usize) -> Result<()> {
        let mut donor = store.read_node(parent.children[sep])?;
        let mut recv = store.read_node(parent.children[sep + 1])?;

        let last = donor.count() - 1;
        let down = mem::replace(&mut parent.keys[sep], donor.keys.remove(last));
        recv.keys.insert(0, down);
        if !recv.is_leaf() {
            recv.children.insert(0, donor.children.remove(last + 1));
        }

        store.write_node(&donor)?;
        store.write_node(&recv)?;
        store.write_node(parent)
    }

    /// Mirror of [`Self::rotate_right`]: move one key from
    /// `children[sep + 1]` to the back of `children[sep]`.
    fn rotate_left(&self, store: &mut S, parent: &mut Node<K>, sep: usize) -> Result<()> {
        let mut recv = store.read_node(parent.children[sep])?;
        let mut donor = store.read_node(parent.children[sep + 1])?;

        let down = mem::replace(&mut parent.keys[sep], donor.keys.remove(0));
        recv.keys.push(down);
        if !recv.is_leaf() {
            recv.children.push(donor.children.remove(0));
        }

        store.write_node(&recv)?;
        store.write_node(&donor)?;
        store.write_node(parent)
    }

    /// Split the adjacent pair of children bracketing insertion index `idx`
    /// (one of them overflowed to `m` keys, the other is full) into three
    /// nodes, promoting two separators into the parent.
    ///
    /// The combined sequence of both nodes plus their separator is `2m`
    /// keys; outputs are `F`, `2m - F - T - 2`, and `T` keys, each roughly
    /// two-thirds of `m - 1`.
    fn split_child(
        &self,
        store: &mut S,
        header: &mut TreeHeader,
        parent: &mut Node<K>,
        idx: usize,
    ) -> Result<()> {
        let (fidx, sidx) = if idx < parent.count() {
            (idx, idx + 1)
        } else {
            (idx - 1, idx)
        };

        let mut left = store.read_node(parent.children[fidx])?;
        let mut middle = store.read_node(parent.children[sidx])?;
        let mut right = self.allocate_node(store, header)?;

        // Concatenate, then slice back into three nodes and two separators.
        let mut keys = Vec::with_capacity(left.count() + middle.count() + 1);
        keys.append(&mut left.keys);
        keys.push(parent.keys[fidx].clone());
        keys.append(&mut middle.keys);

        let mut kids = Vec::with_capacity(left.children.len() + middle.children.len());
        kids.append(&mut left.children);
        kids.append(&mut middle.children);

        let n = keys.len();
        let (f, t) = (self.f(), self.t());

        let right_keys = keys.split_off(n - t);
        let sep2 = keys.remove(n - t - 1);
        let middle_keys = keys.split_off(f + 1);
        let sep1 = keys.remove(f);
        left.keys = keys;
        middle.keys = middle_keys;
        right.keys = right_keys;

        if !kids.is_empty() {
            let right_kids = kids.split_off(n - t);
            let middle_kids = kids.split_off(f + 1);
            left.children = kids;
            middle.children = middle_kids;
            right.children = right_kids;
        }

        parent.keys[fidx] = sep1;
        parent.keys.insert(sidx, sep2);
        parent.children.insert(sidx + 1, right.id);

        store.write_node(&left)?;
        store.write_node(&middle)?;
        store.write_node(&right)?;
        store.write_node(parent)
    }

    /// Grow the tree by one level: the root keeps its fixed id, its first
    /// and last `F` keys move into two fresh nodes, and only the median
    /// stays behind.
    fn split_root(
        &self,
        store: &mut S,
        header: &mut TreeHeader,
        root: &mut Node<K>,
    ) -> Result<()> {
        let f = self.f();
        let mut left = self.allocate_node(store, header)?;
        let mut right = self.allocate_node(store, header)?;

        right.keys = root.keys.split_off(f + 1);
        let median = root.keys.remove(f);
        left.keys = mem::take(&mut root.keys);
        if !root.children.is_empty() {
            right.children = root.children.split_off(f + 1);
            left.children = mem::take(&mut root.children);
        }

        root.keys = vec![median];
        root.children = vec![left.id, right.id];

        store.write_node(&left)?;
        store.write_node(&right)
    }

    // ========================================================================
    // Remove
    // ========================================================================

    /// Remove one occurrence of `key`. Returns whether it was found.
    ///
    /// Deletion always physically removes from a leaf: a match on an
    /// internal separator is swapped with its in-order predecessor at the
    /// leaf level first, then the leaf slot is removed and the ancestors
    /// rebalance on the way back up.
    pub fn remove(&self, key: &K) -> Result<bool> {
        let mut store = self.store.lock();
        let header = store.read_header()?;
        let mut root = store.read_node(header.root_id)?;

        let mut pending = None;
        let found = self.remove_rec(&mut *store, &mut root, key, &mut pending)?;
        if found {
            store.write_node(&root)?;
        }
        Ok(found)
    }

    fn remove_rec(
        &self,
        store: &mut S,
        node: &mut Node<K>,
        key: &K,
        pending: &mut Option<K>,
    ) -> Result<bool> {
        let mut pos = node.scan(key);

        if node.is_leaf() {
            if pending.is_none() && (pos == node.count() || node.keys[pos] != *key) {
                return Ok(false);
            }
            // With a pending separator swap the descent went left of the
            // separator, so every key here is <= it; the rightmost key is
            // the in-order predecessor.
            if pos == node.count() {
                pos -= 1;
            }
            if let Some(stashed) = pending.as_mut() {
                if *stashed != node.keys[pos] {
                    mem::swap(stashed, &mut node.keys[pos]);
                }
            }
            node.keys.remove(pos);
            store.write_node(node)?;
            return Ok(true);
        }

        // An exact separator match is remembered for the leaf-level swap.
        // A deeper match overwrites a shallower one, so the deepest
        // occurrence on the path is the one removed.
        let stash_here = pos < node.count() && node.keys[pos] == *key;
        if stash_here {
            *pending = Some(node.keys[pos].clone());
        }

        let mut child = store.read_node(node.children[pos])?;
        if !self.remove_rec(store, &mut child, key, pending)? {
            return Ok(false);
        }

        if stash_here {
            if let Some(swapped) = pending.take() {
                node.keys[pos] = swapped;
            }
        }

        store.write_node(&child)?;
        store.write_node(node)?;
        if child.count() < self.f() {
            self.rebalance_after_remove(store, node, pos)?;
        }
        Ok(true)
    }

    /// Restore occupancy of the child at `i`, which fell below `F`.
    ///
    /// Preference order: borrow from a sibling with more than `F` keys
    /// (including a cascaded double rotation through the sibling one
    /// further over when the adjacent one is itself at minimum), else
    /// three-way merge; a root left with a single separator collapses
    /// instead, shrinking the tree by one level.
    fn rebalance_after_remove(
        &self,
        store: &mut S,
        parent: &mut Node<K>,
        i: usize,
    ) -> Result<()> {
        let f = self.f();
        let fanout = parent.children.len();

        if i == 0 {
            if store.read_node(parent.children[1])?.count() > f {
                self.rotate_left(store, parent, 0)
            } else if fanout > 2 && store.read_node(parent.children[2])?.count() > f {
                self.rotate_left(store, parent, 1)?;
                self.rotate_left(store, parent, 0)
            } else if self.is_collapsible_root(parent) {
                self.collapse_root(store, parent)
            } else {
                self.merge_three(store, parent, 0)
            }
        } else if i == fanout - 1 {
            if store.read_node(parent.children[i - 1])?.count() > f {
                self.rotate_right(store, parent, i - 1)
            } else if fanout > 2 && store.read_node(parent.children[i - 2])?.count() > f {
                self.rotate_right(store, parent, i - 2)?;
                self.rotate_right(store, parent, i - 1)
            } else if self.is_collapsible_root(parent) {
                self.collapse_root(store, parent)
            } else {
                self.merge_three(store, parent, i - 2)
            }
        } else {
            if store.read_node(parent.children[i - 1])?.count() > f {
                self.rotate_right(store, parent, i - 1)
            } else if store.read_node(parent.children[i + 1])?.count() > f {
                self.rotate_left(store, parent, i)
            } else {
                self.merge_three(store, parent, i - 1)
            }
        }
    }

    #[inline]
    fn is_collapsible_root(&self, node: &Node<K>) -> bool {
        node.id == PageId::ROOT && node.count() == 1
    }

    /// Merge the three siblings at `li`, `li + 1`, `li + 2` and their two
    /// separators back into two nodes: the left output takes `m - 1` keys,
    /// the key after them survives as the one separator, the middle output
    /// takes the remainder. This is what keeps post-merge occupancy high.
    ///
    /// The third node's record is simply abandoned; ids are never
    /// reclaimed.
    fn merge_three(&self, store: &mut S, parent: &mut Node<K>, li: usize) -> Result<()> {
        let (mi, ri) = (li + 1, li + 2);
        let mut left = store.read_node(parent.children[li])?;
        let mut middle = store.read_node(parent.children[mi])?;
        let mut right = store.read_node(parent.children[ri])?;

        let mut keys =
            Vec::with_capacity(left.count() + middle.count() + right.count() + 2);
        keys.append(&mut left.keys);
        keys.push(parent.keys[li].clone());
        keys.append(&mut middle.keys);
        keys.push(parent.keys[mi].clone());
        keys.append(&mut right.keys);

        let mut kids = Vec::with_capacity(
            left.children.len() + middle.children.len() + right.children.len(),
        );
        kids.append(&mut left.children);
        kids.append(&mut middle.children);
        kids.append(&mut right.children);

        let m = self.order;
        middle.keys = keys.split_off(m);
        let sep = keys.remove(m - 1);
        left.keys = keys;
        if !kids.is_empty() {
            middle.children = kids.split_off(m);
            left.children = kids;
        }

        parent.keys[li] = sep;
        parent.keys.remove(mi);
        parent.children.remove(ri);

        store.write_node(&left)?;
        store.write_node(&middle)?;
        store.write_node(parent)
    }

    /// Root collapse: the root's single separator and both children fold
    /// into the root itself, shrinking the tree by one level. The children
    /// records are abandoned.
    fn collapse_root(&self, store: &mut S, root: &mut Node<K>) -> Result<()> {
        let mut left = store.read_node(root.children[0])?;
        let mut right = store.read_node(root.children[1])?;

        let sep = root.keys.remove(0);
        let mut keys = mem::take(&mut left.keys);
        keys.push(sep);
        keys.append(&mut right.keys);

        let mut kids = mem::take(&mut left.children);
        kids.append(&mut right.children);

        root.keys = keys;
        root.children = kids;
        // The caller persists the root.
        Ok(())
    }

    // ========================================================================
    // Lookup and cursors
    // ========================================================================

    /// Whether at least one occurrence of `key` is present.
    pub fn contains(&self, key: &K) -> Result<bool> {
        Ok(!self.find(key)?.is_end())
    }

    /// Position a cursor at an occurrence of `key`, or at the end if
    /// absent.
    ///
    /// Separator keys in internal nodes are valid hits, and the search
    /// path's resumption points are retained so iteration can continue
    /// past the hit.
    pub fn find(&self, key: &K) -> Result<Cursor<K, S>> {
        let mut store = self.store.lock();
        let header = store.read_header()?;

        let mut stack = Vec::new();
        let mut id = header.root_id;
        loop {
            let node = store.read_node(id)?;
            let pos = node.scan(key);
            if pos < node.count() && node.keys[pos] == *key {
                return Ok(Cursor::positioned(
                    self.store.clone(),
                    Some((id, pos)),
                    stack,
                ));
            }
            if node.is_leaf() {
                return Ok(self.end());
            }
            if pos < node.count() {
                stack.push((id, pos));
            }
            id = node.children[pos];
        }
    }

    /// Position a cursor at the smallest key, or at the end for an empty
    /// tree.
    pub fn begin(&self) -> Result<Cursor<K, S>> {
        let mut store = self.store.lock();
        let header = store.read_header()?;

        let mut stack = Vec::new();
        let mut id = header.root_id;
        loop {
            let node = store.read_node(id)?;
            if node.count() == 0 {
                // Only an empty root has no keys.
                return Ok(self.end());
            }
            if node.is_leaf() {
                return Ok(Cursor::positioned(self.store.clone(), Some((id, 0)), stack));
            }
            stack.push((id, 0));
            id = node.children[0];
        }
    }

    /// The canonical end sentinel.
    pub fn end(&self) -> Cursor<K, S> {
        Cursor::end(self.store.clone())
    }

    /// Lazy in-order sequence of all keys.
    pub fn keys(&self) -> Result<Keys<K, S>> {
        Ok(Keys::new(self.begin()?))
    }

    // ========================================================================
    // Diagnostics
    // ========================================================================

    /// Write every key in order to `out`, with no separators.
    pub fn dump_in_order<W: io::Write>(&self, out: &mut W) -> Result<()>
    where
        K: fmt::Display,
    {
        let mut store = self.store.lock();
        let header = store.read_header()?;
        let root = store.read_node(header.root_id)?;
        self.dump_in_order_rec(&mut *store, &root, out)
    }

    fn dump_in_order_rec<W: io::Write>(
        &self,
        store: &mut S,
        node: &Node<K>,
        out: &mut W,
    ) -> Result<()>
    where
        K: fmt::Display,
    {
        for i in 0..node.count() {
            if !node.is_leaf() {
                let child = store.read_node(node.children[i])?;
                self.dump_in_order_rec(store, &child, out)?;
            }
            write!(out, "{}", node.keys[i])?;
        }
        if !node.is_leaf() {
            let child = store.read_node(node.children[node.count()])?;
            self.dump_in_order_rec(store, &child, out)?;
        }
        Ok(())
    }

    /// Write an indented right-to-left shape dump to `out`, one key per
    /// line, deepest nodes indented the most.
    pub fn dump_tree<W: io::Write>(&self, out: &mut W) -> Result<()>
    where
        K: fmt::Display,
    {
        let mut store = self.store.lock();
        let header = store.read_header()?;
        let root = store.read_node(header.root_id)?;
        self.dump_tree_rec(&mut *store, &root, 0, out)
    }

    fn dump_tree_rec<W: io::Write>(
        &self,
        store: &mut S,
        node: &Node<K>,
        level: usize,
        out: &mut W,
    ) -> Result<()>
    where
        K: fmt::Display,
    {
        for i in (0..node.count()).rev() {
            if !node.is_leaf() {
                let child = store.read_node(node.children[i + 1])?;
                self.dump_tree_rec(store, &child, level + 1, out)?;
            }
            writeln!(out, "{}{}", "    ".repeat(level), node.keys[i])?;
        }
        if !node.is_leaf() {
            let child = store.read_node(node.children[0])?;
            self.dump_tree_rec(store, &child, level + 1, out)?;
        }
        Ok(())
    }

    /// Walk the whole tree checking its structural invariants: key order,
    /// separator bounds, child counts, uniform leaf depth, and at-rest
    /// occupancy (`F..=m-1` for non-root nodes, `1..=2F` for an internal
    /// root). Violations surface as `Error::Corrupted` naming the node.
    pub fn validate(&self) -> Result<()> {
        let mut store = self.store.lock();
        let header = store.read_header()?;
        let root = store.read_node(header.root_id)?;

        if root.count() > 2 * self.f() {
            return Err(Error::Corrupted(root.id));
        }
        if !root.is_leaf() && root.count() == 0 {
            return Err(Error::Corrupted(root.id));
        }

        let mut leaf_depth = None;
        self.validate_rec(&mut *store, &root, None, None, 0, &mut leaf_depth)
    }

    fn validate_rec(
        &self,
        store: &mut S,
        node: &Node<K>,
        lo: Option<&K>,
        hi: Option<&K>,
        depth: usize,
        leaf_depth: &mut Option<usize>,
    ) -> Result<()> {
        let is_root = node.id == PageId::ROOT;
        if !is_root && (node.count() < self.f() || node.count() > self.order - 1) {
            return Err(Error::Corrupted(node.id));
        }
        if !node.is_leaf() && node.children.len() != node.count() + 1 {
            return Err(Error::Corrupted(node.id));
        }

        for pair in node.keys.windows(2) {
            if pair[0] > pair[1] {
                return Err(Error::Corrupted(node.id));
            }
        }
        if let (Some(lo), Some(first)) = (lo, node.keys.first()) {
            if first < lo {
                return Err(Error::Corrupted(node.id));
            }
        }
        if let (Some(hi), Some(last)) = (hi, node.keys.last()) {
            if last > hi {
                return Err(Error::Corrupted(node.id));
            }
        }

        if node.is_leaf() {
            match *leaf_depth {
                None => *leaf_depth = Some(depth),
                Some(expected) if expected != depth => {
                    return Err(Error::Corrupted(node.id))
                }
                _ => {}
            }
            return Ok(());
        }

        for i in 0..node.children.len() {
            let child = store.read_node(node.children[i])?;
            let child_lo = if i == 0 { lo } else { Some(&node.keys[i - 1]) };
            let child_hi = if i == node.count() {
                hi
            } else {
                Some(&node.keys[i])
            };
            self.validate_rec(store, &child, child_lo, child_hi, depth + 1, leaf_depth)?;
        }
        Ok(())
    }
}

// ============================================================================
// Convenience constructors
// ============================================================================

impl<K: Clone + Ord> BStarTree<K, super::store::MemoryNodeStore<K>> {
    /// A transient in-process tree.
    pub fn in_memory(order: usize) -> Result<Self> {
        let store = super::store::MemoryNodeStore::new();
        Self::new(Arc::new(Mutex::new(store)), order)
    }
}

impl<K: super::key::IndexKey> BStarTree<K, super::store::FileNodeStore<K>> {
    /// A tree persisted at `path`, created on first use.
    ///
    /// The order must match across reopens of the same file; a mismatch is
    /// caught by record checksums rather than silently misread.
    pub fn open<P: AsRef<std::path::Path>>(path: P, order: usize) -> Result<Self> {
        let store = super::store::FileNodeStore::open(path, order)?;
        Self::new(Arc::new(Mutex::new(store)), order)
    }

    /// As [`Self::open`], discarding any previous contents of `path`.
    pub fn open_truncated<P: AsRef<std::path::Path>>(path: P, order: usize) -> Result<Self> {
        let store = super::store::FileNodeStore::open_truncated(path, order)?;
        Self::new(Arc::new(Mutex::new(store)), order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::bstar::store::MemoryNodeStore;

    type MemTree = BStarTree<u32, MemoryNodeStore<u32>>;

    fn collect(tree: &MemTree) -> Vec<u32> {
        tree.keys()
            .unwrap()
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    #[test]
    fn test_order_below_minimum_rejected() {
        assert!(matches!(
            MemTree::in_memory(3),
            Err(Error::InvalidOrder(3))
        ));
        assert!(MemTree::in_memory(4).is_ok());
    }

    #[test]
    fn test_empty_tree() {
        let tree = MemTree::in_memory(4).unwrap();
        assert!(!tree.contains(&7).unwrap());
        assert!(!tree.remove(&7).unwrap());
        assert_eq!(tree.begin().unwrap(), tree.end());
        assert!(collect(&tree).is_empty());
        tree.validate().unwrap();
    }

    #[test]
    fn test_insert_sorted_traversal() {
        let tree = MemTree::in_memory(4).unwrap();
        let values = [42u32, 7, 19, 3, 99, 54, 1, 28, 65, 12, 81, 33];
        for v in values {
            tree.insert(v).unwrap();
            tree.validate().unwrap();
        }

        let mut expected = values.to_vec();
        expected.sort_unstable();
        assert_eq!(collect(&tree), expected);
    }

    #[test]
    fn test_insert_ascending_and_descending() {
        for order in [4usize, 5, 7, 16] {
            let tree = MemTree::in_memory(order).unwrap();
            for v in 0..200u32 {
                tree.insert(v).unwrap();
            }
            for v in (200..400u32).rev() {
                tree.insert(v).unwrap();
            }
            tree.validate().unwrap();
            assert_eq!(collect(&tree), (0..400).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_find_round_trip() {
        let tree = MemTree::in_memory(4).unwrap();
        for v in [5u32, 1, 9, 3, 7, 11, 2, 8] {
            tree.insert(v).unwrap();
        }

        for v in [5u32, 1, 9, 3, 7, 11, 2, 8] {
            let cursor = tree.find(&v).unwrap();
            assert_eq!(cursor.key().unwrap(), Some(v));
        }
        assert!(tree.find(&6).unwrap().is_end());
    }

    #[test]
    fn test_duplicates_are_a_multiset() {
        let tree = MemTree::in_memory(4).unwrap();
        for _ in 0..5 {
            tree.insert(20).unwrap();
        }
        tree.insert(10).unwrap();
        tree.insert(30).unwrap();
        tree.validate().unwrap();

        assert_eq!(collect(&tree), vec![10, 20, 20, 20, 20, 20, 30]);

        // Each remove takes exactly one occurrence.
        for remaining in (0..5).rev() {
            assert!(tree.remove(&20).unwrap());
            tree.validate().unwrap();
            let count = collect(&tree).iter().filter(|&&k| k == 20).count();
            assert_eq!(count, remaining);
        }
        assert!(!tree.remove(&20).unwrap());
        assert_eq!(collect(&tree), vec![10, 30]);
    }

    #[test]
    fn test_remove_internal_separator() {
        let tree = MemTree::in_memory(4).unwrap();
        for v in 0..50u32 {
            tree.insert(v).unwrap();
        }

        // Walk the keys in an order that forces separator hits: remove
        // every key, validating as we go.
        let mut expected: Vec<u32> = (0..50).collect();
        for v in [25u32, 10, 40, 0, 49, 33, 17] {
            assert!(tree.remove(&v).unwrap());
            expected.retain(|&k| k != v);
            tree.validate().unwrap();
            assert_eq!(collect(&tree), expected);
        }
    }

    #[test]
    fn test_remove_everything_shrinks_to_empty() {
        let tree = MemTree::in_memory(4).unwrap();
        for v in 0..100u32 {
            tree.insert(v).unwrap();
        }
        for v in 0..100u32 {
            assert!(tree.remove(&v).unwrap(), "key {} missing", v);
            tree.validate().unwrap();
        }
        assert_eq!(tree.begin().unwrap(), tree.end());
        assert!(collect(&tree).is_empty());
    }

    #[test]
    fn test_remove_interleaved_with_insert() {
        let tree = MemTree::in_memory(5).unwrap();
        let mut reference: Vec<u32> = Vec::new();

        // Deterministic pseudo-random walk.
        let mut x = 0x2545_F491u32;
        for _ in 0..600 {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            let key = x % 64;
            if x % 3 == 0 && !reference.is_empty() {
                let present = reference.contains(&key);
                assert_eq!(tree.remove(&key).unwrap(), present);
                if present {
                    let at = reference.iter().position(|&k| k == key).unwrap();
                    reference.remove(at);
                }
            } else {
                tree.insert(key).unwrap();
                reference.push(key);
            }
            tree.validate().unwrap();
        }

        reference.sort_unstable();
        assert_eq!(collect(&tree), reference);
    }

    #[test]
    fn test_cardinality() {
        let tree = MemTree::in_memory(4).unwrap();
        let mut live = 0usize;
        for v in 0..150u32 {
            tree.insert(v % 37).unwrap();
            live += 1;
        }
        for v in 0..20u32 {
            if tree.remove(&v).unwrap() {
                live -= 1;
            }
        }
        assert_eq!(collect(&tree).len(), live);
    }

    #[test]
    fn test_dump_in_order() {
        let tree = BStarTree::<char, MemoryNodeStore<char>>::in_memory(4).unwrap();
        for c in "dcba".chars() {
            tree.insert(c).unwrap();
        }
        let mut out = Vec::new();
        tree.dump_in_order(&mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "abcd");
    }

    #[test]
    fn test_dump_tree_shape() {
        let tree = MemTree::in_memory(4).unwrap();
        for v in 1..=9u32 {
            tree.insert(v).unwrap();
        }
        let mut out = Vec::new();
        tree.dump_tree(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();

        // One line per key, deepest keys indented.
        assert_eq!(text.lines().count(), 9);
        assert!(text.lines().any(|l| l.starts_with("    ")));
    }
}
