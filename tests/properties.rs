//! Property tests: the tree must agree with a sorted-vector multiset under
//! arbitrary interleavings of inserts and removes, on both stores.

use proptest::prelude::*;
use stardex::{BStarTree, FileNodeStore, MemoryNodeStore, NodeStore, Result};
use tempfile::tempdir;

#[derive(Debug, Clone)]
enum Op {
    Insert(u16),
    Remove(u16),
}

fn op_strategy() -> impl Strategy<Value = Op> {
    // A small key range so removes actually hit and duplicates occur.
    prop_oneof![
        2 => (0u16..64).prop_map(Op::Insert),
        1 => (0u16..64).prop_map(Op::Remove),
    ]
}

/// Drive the ops against the tree and a sorted-vector reference, checking
/// agreement after every step. Panics on divergence; proptest turns the
/// panic into a shrunk counterexample.
fn check_against_reference<S: NodeStore<u16>>(tree: &BStarTree<u16, S>, ops: &[Op]) {
    let mut reference: Vec<u16> = Vec::new();

    for op in ops {
        match *op {
            Op::Insert(key) => {
                tree.insert(key).unwrap();
                let at = reference.partition_point(|&k| k <= key);
                reference.insert(at, key);
            }
            Op::Remove(key) => {
                let removed = tree.remove(&key).unwrap();
                let present = reference.binary_search(&key).is_ok();
                assert_eq!(removed, present, "remove({}) disagreed", key);
                if present {
                    let at = reference.iter().position(|&k| k == key).unwrap();
                    reference.remove(at);
                }
            }
        }
        tree.validate().unwrap();
    }

    let keys: Vec<u16> = tree.keys().unwrap().collect::<Result<_>>().unwrap();
    assert_eq!(keys, reference);
}

proptest! {
    #[test]
    fn prop_memory_tree_matches_reference(
        ops in prop::collection::vec(op_strategy(), 0..300),
        order in 4usize..12,
    ) {
        let tree = BStarTree::<u16, MemoryNodeStore<u16>>::in_memory(order).unwrap();
        check_against_reference(&tree, &ops);
    }

    #[test]
    fn prop_file_tree_matches_reference(
        ops in prop::collection::vec(op_strategy(), 0..150),
        order in 4usize..8,
    ) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("prop.idx");
        let tree = BStarTree::<u16, FileNodeStore<u16>>::open(&path, order).unwrap();
        check_against_reference(&tree, &ops);
    }

    #[test]
    fn prop_file_tree_survives_reopen(
        keys in prop::collection::vec(0u16..256, 1..120),
        order in 4usize..8,
    ) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("reopen.idx");

        {
            let tree = BStarTree::<u16, FileNodeStore<u16>>::open(&path, order).unwrap();
            for &k in &keys {
                tree.insert(k).unwrap();
            }
        }

        let tree = BStarTree::<u16, FileNodeStore<u16>>::open(&path, order).unwrap();
        tree.validate().unwrap();

        let mut expected = keys.clone();
        expected.sort_unstable();
        let seen: Vec<u16> = tree.keys().unwrap().collect::<Result<_>>().unwrap();
        prop_assert_eq!(seen, expected);
    }
}
