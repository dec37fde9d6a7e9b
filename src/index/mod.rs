//! Index structures.
//!
//! One index lives here today: the B*-tree in [`bstar`].

pub mod bstar;

pub use bstar::{
    BStarTree, Cursor, FileNodeStore, IndexKey, Keys, MemoryNodeStore, Node, NodeStore,
    TreeHeader,
};
