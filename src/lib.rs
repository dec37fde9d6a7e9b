//! # Stardex
//!
//! A B*-tree index engine: an ordered multiset of fixed-width keys kept in
//! nodes that stay about two-thirds full, over a pluggable node store.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────┐
//! │                 BStarTree                   │
//! │   insert / remove / find / cursors          │
//! │   rotation-before-split, three-way merge    │
//! └──────────────────────┬──────────────────────┘
//!                        │ NodeStore trait
//!          ┌─────────────┴─────────────┐
//!          ▼                           ▼
//! ┌─────────────────┐        ┌──────────────────┐
//! │ MemoryNodeStore │        │  FileNodeStore   │
//! │ id-indexed table│        │ RecordCodec      │
//! └─────────────────┘        │   + Pager        │
//!                            └────────┬─────────┘
//!                                     ▼
//!                            fixed-size records
//!                            in a single file
//! ```
//!
//! ## Modules
//!
//! - [`index::bstar`] - the tree, its cursors, and both node stores
//! - [`storage`] - the fixed-size-record file pager
//! - [`common`] - page ids, sizing constants, and the error type
//!
//! ## Quick start
//!
//! ```
//! use stardex::BStarTree;
//!
//! # fn main() -> stardex::Result<()> {
//! let tree = BStarTree::in_memory(16)?;
//! for word in ["pear", "apple", "quince", "apple"] {
//!     tree.insert(word.len() as u64)?;
//! }
//!
//! let lengths: Vec<u64> = tree.keys()?.collect::<stardex::Result<_>>()?;
//! assert_eq!(lengths, vec![4, 5, 5, 6]);
//! # Ok(())
//! # }
//! ```
//!
//! The same tree persists to disk by swapping the store:
//!
//! ```no_run
//! use stardex::BStarTree;
//!
//! # fn main() -> stardex::Result<()> {
//! let tree: BStarTree<u64, _> = BStarTree::open("words.idx", 16)?;
//! tree.insert(42)?;
//! # Ok(())
//! # }
//! ```

pub mod common;
pub mod index;
pub mod storage;

pub use common::{config, Error, PageId, Result};
pub use index::bstar::{
    BStarTree, Cursor, FileNodeStore, IndexKey, Keys, MemoryNodeStore, Node, NodeStore,
    TreeHeader,
};
pub use storage::Pager;
