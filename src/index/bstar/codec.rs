//! Record codec - fixed byte layout for nodes and the tree header.
//!
//! Every record in the backing store shares one uniform length, sized to
//! the largest record (the double-capacity root). Layout:
//!
//! ```text
//! Offset  Size  Field
//! ------  ----  -----
//! 0       4     checksum (CRC32 of everything after it, little-endian)
//! 4       1     tag (1 = header record, 2 = node record)
//! 5       2     key count (little-endian; 0 for header records)
//! 7       ...   payload
//! ```
//!
//! Header payload: `root_id: u64`, `page_count: u64`.
//! Node payload: `count` keys, then `count + 1` child ids as `u64` with
//! 0 meaning "no child" (the header occupies slot 0, so 0 can never be a
//! real child). A node whose child slots are all 0 decodes as a leaf.

use crate::common::config::{record_len, RECORD_OVERHEAD};
use crate::common::{Error, PageId, Result};

use super::key::IndexKey;
use super::node::{Node, TreeHeader};

const TAG_HEADER: u8 = 1;
const TAG_NODE: u8 = 2;

const OFFSET_CHECKSUM: usize = 0;
const OFFSET_TAG: usize = 4;
const OFFSET_COUNT: usize = 5;
const OFFSET_PAYLOAD: usize = RECORD_OVERHEAD;

/// Encoder/decoder for one tree's records.
///
/// The codec is parameterized by the order because record length (and the
/// capacity check on encode) derive from it.
pub struct RecordCodec<K> {
    order: usize,
    record_len: usize,
    _key: std::marker::PhantomData<K>,
}

impl<K: IndexKey> RecordCodec<K> {
    pub fn new(order: usize) -> Self {
        Self {
            order,
            record_len: record_len(order, K::ENCODED_LEN),
            _key: std::marker::PhantomData,
        }
    }

    /// Uniform record length for this order and key type.
    #[inline]
    pub fn record_len(&self) -> usize {
        self.record_len
    }

    /// Most keys any record can hold (the root's transient maximum).
    #[inline]
    fn key_capacity(&self) -> usize {
        2 * self.order + 1
    }

    // ========================================================================
    // Header records
    // ========================================================================

    pub fn encode_header(&self, header: &TreeHeader) -> Vec<u8> {
        let mut buf = vec![0u8; self.record_len];
        buf[OFFSET_TAG] = TAG_HEADER;

        let payload = &mut buf[OFFSET_PAYLOAD..];
        payload[..8].copy_from_slice(&header.root_id.0.to_le_bytes());
        payload[8..16].copy_from_slice(&header.page_count.to_le_bytes());

        seal(&mut buf);
        buf
    }

    pub fn decode_header(&self, buf: &[u8]) -> Result<TreeHeader> {
        verify(buf, PageId::HEADER, TAG_HEADER)?;

        let payload = &buf[OFFSET_PAYLOAD..];
        let root_id = PageId::new(u64_at(payload, 0));
        let page_count = u64_at(payload, 8);

        Ok(TreeHeader {
            root_id,
            page_count,
        })
    }

    // ========================================================================
    // Node records
    // ========================================================================

    /// Encode a node into a fresh record buffer.
    ///
    /// # Panics
    /// Panics if the node exceeds record capacity or its key/child counts
    /// are inconsistent; both indicate a rebalancing bug, not bad input.
    pub fn encode_node(&self, node: &Node<K>) -> Vec<u8> {
        let count = node.keys.len();
        assert!(count <= self.key_capacity(), "node overflows record");
        assert!(
            node.children.is_empty() || node.children.len() == count + 1,
            "internal node must have count + 1 children"
        );

        let mut buf = vec![0u8; self.record_len];
        buf[OFFSET_TAG] = TAG_NODE;
        buf[OFFSET_COUNT..OFFSET_COUNT + 2].copy_from_slice(&(count as u16).to_le_bytes());

        let key_len = K::ENCODED_LEN;
        let mut at = OFFSET_PAYLOAD;
        for key in &node.keys {
            key.encode_into(&mut buf[at..at + key_len]);
            at += key_len;
        }

        // Child slots follow the keys directly; leaves leave all of them
        // zero, which is the "no child" sentinel.
        at = self.children_offset();
        for child in &node.children {
            buf[at..at + 8].copy_from_slice(&child.0.to_le_bytes());
            at += 8;
        }

        seal(&mut buf);
        buf
    }

    /// Decode a node record read from slot `id`.
    pub fn decode_node(&self, id: PageId, buf: &[u8]) -> Result<Node<K>> {
        verify(buf, id, TAG_NODE)?;

        let count =
            u16::from_le_bytes([buf[OFFSET_COUNT], buf[OFFSET_COUNT + 1]]) as usize;
        if count > self.key_capacity() {
            return Err(Error::Corrupted(id));
        }

        let key_len = K::ENCODED_LEN;
        let mut keys = Vec::with_capacity(count);
        let mut at = OFFSET_PAYLOAD;
        for _ in 0..count {
            keys.push(K::decode_from(&buf[at..at + key_len]));
            at += key_len;
        }

        at = self.children_offset();
        let mut children = Vec::with_capacity(count + 1);
        for _ in 0..count + 1 {
            children.push(u64_at(buf, at));
            at += 8;
        }

        // First slot zero marks a leaf; the rest must agree.
        let children = if children[0] == 0 {
            if children.iter().any(|&c| c != 0) {
                return Err(Error::Corrupted(id));
            }
            Vec::new()
        } else {
            if children.iter().any(|&c| c == 0) {
                return Err(Error::Corrupted(id));
            }
            children.into_iter().map(PageId::new).collect()
        };

        Ok(Node { id, keys, children })
    }

    /// Byte offset of the child id area (after the key area at full
    /// capacity, so records of different fill levels stay layout-stable).
    #[inline]
    fn children_offset(&self) -> usize {
        OFFSET_PAYLOAD + self.key_capacity() * K::ENCODED_LEN
    }
}

/// Compute and store the checksum; call after the rest is written.
fn seal(buf: &mut [u8]) {
    let checksum = crc32fast::hash(&buf[OFFSET_TAG..]);
    buf[OFFSET_CHECKSUM..OFFSET_CHECKSUM + 4].copy_from_slice(&checksum.to_le_bytes());
}

/// Verify checksum and tag of a raw record.
fn verify(buf: &[u8], id: PageId, expected_tag: u8) -> Result<()> {
    let stored = u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]]);
    if stored != crc32fast::hash(&buf[OFFSET_TAG..]) {
        return Err(Error::Corrupted(id));
    }
    if buf[OFFSET_TAG] != expected_tag {
        return Err(Error::Corrupted(id));
    }
    Ok(())
}

#[inline]
fn u64_at(buf: &[u8], at: usize) -> u64 {
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&buf[at..at + 8]);
    u64::from_le_bytes(bytes)
}
