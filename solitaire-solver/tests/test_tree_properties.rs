//! Property-based tests for the search tree backends.

use proptest::prelude::*;
use std::collections::BTreeSet;

use solitaire_solver::tree::{AnyTree, SearchTree, TreeKind};

/// Strategy: a sequence of inserts (true) and deletes (false) over a small
/// key range, so that both hit existing keys often.
fn ops_strategy() -> impl Strategy<Value = Vec<(bool, u16)>> {
    prop::collection::vec((any::<bool>(), 0..200u16), 0..400)
}

proptest! {
    // 1. Every backend agrees with an ordered set after any operation sequence
    #[test]
    fn trees_match_ordered_set(ops in ops_strategy()) {
        for kind in TreeKind::ALL {
            let mut tree: AnyTree<u16> = AnyTree::new(kind);
            let mut model = BTreeSet::new();
            for &(insert, key) in &ops {
                if insert {
                    let existing = tree.search_or_insert(key, u16::cmp);
                    prop_assert_eq!(existing.is_some(), !model.insert(key), "{}", kind);
                } else {
                    let removed = tree.delete(&key, u16::cmp);
                    prop_assert_eq!(removed.is_some(), model.remove(&key), "{}", kind);
                }
            }
            prop_assert_eq!(tree.check_invariants(u16::cmp), Ok(()), "{}", kind);
            prop_assert_eq!(tree.len(), model.len());
            prop_assert_eq!(tree.items(), model.iter().copied().collect::<Vec<_>>());
        }
    }

    // 2. Invariants hold after every single step, not only at the end
    #[test]
    fn invariants_hold_at_each_step(
        ops in prop::collection::vec((any::<bool>(), 0..40u16), 0..120)
    ) {
        for kind in TreeKind::ALL {
            let mut tree: AnyTree<u16> = AnyTree::new(kind);
            for &(insert, key) in &ops {
                if insert {
                    tree.search_or_insert(key, u16::cmp);
                } else {
                    tree.delete(&key, u16::cmp);
                }
                prop_assert_eq!(tree.check_invariants(u16::cmp), Ok(()), "{}", kind);
            }
        }
    }

    // 3. A lookup finds exactly the keys that were inserted and not deleted
    #[test]
    fn find_reports_membership(
        keys in prop::collection::vec(0..100u16, 0..100),
        probe in 0..100u16
    ) {
        for kind in TreeKind::ALL {
            let mut tree: AnyTree<u16> = AnyTree::new(kind);
            for &key in &keys {
                tree.search_or_insert(key, u16::cmp);
            }
            prop_assert_eq!(tree.find(&probe, u16::cmp).is_some(), keys.contains(&probe));
        }
    }
}
