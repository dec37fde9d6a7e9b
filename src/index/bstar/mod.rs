//! B*-tree index over an abstract node store.
//!
//! This module contains:
//! - [`BStarTree`] - the tree facade and rebalancing engine
//! - [`Cursor`] / [`Keys`] - resumable in-order traversal
//! - [`NodeStore`] - the allocate/read/write boundary, with
//!   [`MemoryNodeStore`] and [`FileNodeStore`] realizations
//! - [`IndexKey`] - fixed-width key encoding
//! - [`Node`] / [`TreeHeader`] - the in-memory record shapes

mod codec;
mod cursor;
mod key;
mod node;
mod store;
mod tree;

pub use cursor::{Cursor, Keys};
pub use key::IndexKey;
pub use node::{Node, TreeHeader};
pub use store::{FileNodeStore, MemoryNodeStore, NodeStore};
pub use tree::BStarTree;
