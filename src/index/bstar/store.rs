//! Node store - the boundary the rebalancing engine runs against.
//!
//! The tree never touches storage directly; it reads and writes whole nodes
//! through [`NodeStore`]. Two realizations share the one algorithm:
//! - [`MemoryNodeStore`] - an id-indexed in-process table
//! - [`FileNodeStore`] - fixed-size records in a file, via
//!   [`RecordCodec`] and [`Pager`]

use std::path::Path;

use crate::common::config::record_len;
use crate::common::{Error, PageId, Result};
use crate::storage::Pager;

use super::codec::RecordCodec;
use super::key::IndexKey;
use super::node::{Node, TreeHeader};

/// Allocate/read/write of whole nodes keyed by [`PageId`].
///
/// # Contract
/// - `is_empty` is true exactly once, at first use, and flips after the
///   initial header write; the tree uses it to create the root and header.
/// - Every `read_node` yields an independent copy. There is no caching
///   layer and no aliasing between two reads of the same id; the only
///   durable truth is what was last written.
/// - Id assignment is the tree's job (monotonic counter in the header);
///   the store just addresses whatever ids it is given.
/// - Failures of the underlying medium are fatal and propagate untouched.
pub trait NodeStore<K> {
    /// Whether this store has never held a tree.
    fn is_empty(&self) -> bool;

    fn read_header(&mut self) -> Result<TreeHeader>;
    fn write_header(&mut self, header: &TreeHeader) -> Result<()>;

    fn read_node(&mut self, id: PageId) -> Result<Node<K>>;
    fn write_node(&mut self, node: &Node<K>) -> Result<()>;
}

// ============================================================================
// In-memory realization
// ============================================================================

/// An in-process node store: a plain id-indexed table.
///
/// Useful on its own as a fast transient index, and in tests as the
/// reference realization the file store must agree with.
pub struct MemoryNodeStore<K> {
    header: Option<TreeHeader>,
    nodes: Vec<Option<Node<K>>>,
}

impl<K> MemoryNodeStore<K> {
    pub fn new() -> Self {
        Self {
            header: None,
            nodes: Vec::new(),
        }
    }
}

impl<K> Default for MemoryNodeStore<K> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Clone> NodeStore<K> for MemoryNodeStore<K> {
    fn is_empty(&self) -> bool {
        self.header.is_none()
    }

    fn read_header(&mut self) -> Result<TreeHeader> {
        self.header.ok_or(Error::PageNotFound(PageId::HEADER))
    }

    fn write_header(&mut self, header: &TreeHeader) -> Result<()> {
        self.header = Some(*header);
        Ok(())
    }

    fn read_node(&mut self, id: PageId) -> Result<Node<K>> {
        self.nodes
            .get(id.0 as usize)
            .and_then(|slot| slot.clone())
            .ok_or(Error::PageNotFound(id))
    }

    fn write_node(&mut self, node: &Node<K>) -> Result<()> {
        let idx = node.id.0 as usize;
        if idx >= self.nodes.len() {
            self.nodes.resize_with(idx + 1, || None);
        }
        self.nodes[idx] = Some(node.clone());
        Ok(())
    }
}

// ============================================================================
// Persistent realization
// ============================================================================

/// A file-backed node store: every node lives in one fixed-size record.
///
/// Record size is determined entirely by the order parameter and key type,
/// so opening an existing file with a different order or key type will fail
/// checksum verification rather than silently misread.
pub struct FileNodeStore<K> {
    pager: Pager,
    codec: RecordCodec<K>,
}

impl<K: IndexKey> FileNodeStore<K> {
    /// Open (or create) the backing file at `path` for a tree of the given
    /// order.
    pub fn open<P: AsRef<Path>>(path: P, order: usize) -> Result<Self> {
        let pager = Pager::open_or_create(path, record_len(order, K::ENCODED_LEN))?;
        Ok(Self {
            pager,
            codec: RecordCodec::new(order),
        })
    }

    /// Open the backing file, discarding any previous contents.
    pub fn open_truncated<P: AsRef<Path>>(path: P, order: usize) -> Result<Self> {
        let pager = Pager::open_truncated(path, record_len(order, K::ENCODED_LEN))?;
        Ok(Self {
            pager,
            codec: RecordCodec::new(order),
        })
    }

    /// Number of record slots in the backing file.
    pub fn record_count(&self) -> u64 {
        self.pager.record_count()
    }
}

impl<K: IndexKey> NodeStore<K> for FileNodeStore<K> {
    fn is_empty(&self) -> bool {
        self.pager.is_empty()
    }

    fn read_header(&mut self) -> Result<TreeHeader> {
        let buf = self.pager.read_record(PageId::HEADER)?;
        self.codec.decode_header(&buf)
    }

    fn write_header(&mut self, header: &TreeHeader) -> Result<()> {
        let buf = self.codec.encode_header(header);
        self.pager.write_record(PageId::HEADER, &buf)
    }

    fn read_node(&mut self, id: PageId) -> Result<Node<K>> {
        let buf = self.pager.read_record(id)?;
        self.codec.decode_node(id, &buf)
    }

    fn write_node(&mut self, node: &Node<K>) -> Result<()> {
        let buf = self.codec.encode_node(node);
        self.pager.write_record(node.id, &buf)
    }
}
