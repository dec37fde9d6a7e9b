//! Configuration constants for stardex.

/// Default order parameter `m` for a new tree.
///
/// The order bounds a node's fan-out: a node overflows when its key count
/// reaches `m`, and the minimum occupancy target after rebalancing is
/// `F = (2m - 2) / 3` keys, which is what keeps B*-tree nodes roughly
/// two-thirds full.
///
/// 32 keys per node is a reasonable default for small fixed-width keys;
/// callers indexing through a file should derive the order from their
/// preferred record size instead (see [`order_for_record_len`]).
pub const DEFAULT_ORDER: usize = 32;

/// Smallest supported order parameter.
///
/// The three-way merge used on deletion needs every non-root internal node
/// to have at least three children, which requires `F >= 2` and therefore
/// `m >= 4`. Smaller orders are rejected at construction time.
pub const MIN_ORDER: usize = 4;

/// Per-record overhead in bytes: CRC32 checksum + record tag + key count.
pub const RECORD_OVERHEAD: usize = 4 + 1 + 2;

/// Bytes used by one child id slot in a node record.
pub const CHILD_SLOT_LEN: usize = 8;

/// Compute the uniform record length for a given order and encoded key width.
///
/// Every slot in the backing store has the same length, sized to the largest
/// record: the double-capacity root node, which can transiently hold
/// `2m + 1` keys and `2m + 2` children mid-insert.
pub const fn record_len(order: usize, key_len: usize) -> usize {
    RECORD_OVERHEAD + (2 * order + 1) * key_len + (2 * order + 2) * CHILD_SLOT_LEN
}

/// Largest order whose records fit in `record_len` bytes, or `None` when even
/// the minimum order does not fit.
///
/// This is the inverse of [`record_len`], for callers that pick a page size
/// first (the classic way to size an on-disk index).
pub fn order_for_record_len(record_len: usize, key_len: usize) -> Option<usize> {
    let fixed = RECORD_OVERHEAD + key_len + 2 * CHILD_SLOT_LEN;
    if record_len < fixed {
        return None;
    }
    let order = (record_len - fixed) / (2 * (key_len + CHILD_SLOT_LEN));
    if order >= MIN_ORDER {
        Some(order)
    } else {
        None
    }
}
