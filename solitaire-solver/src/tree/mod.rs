//! Ordered sets used to deduplicate states and interned stacks.
//!
//! Every backend stores small `Copy` handles and receives the comparator on
//! each call, so the comparator can borrow whatever storage the handles point
//! into.

mod arena;
mod avl;
mod avl_rb;
mod glib;
mod rb;

pub use self::avl::AvlTree;
pub use self::avl_rb::AvlRbTree;
pub use self::glib::GlibTree;
pub use self::rb::RbTree;

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("in-order traversal is not strictly increasing")]
    Order,
    #[error("balance factor {0} out of range")]
    Balance(i32),
    #[error("stored balance factor does not match subtree heights")]
    BalanceMismatch,
    #[error("red node has a red child")]
    RedRed,
    #[error("root is red")]
    RedRoot,
    #[error("black height differs between paths")]
    BlackHeight,
    #[error("parent link is broken")]
    ParentLink,
    #[error("node count {found} does not match length {expected}")]
    Count { expected: usize, found: usize },
}

/// Ordered set of distinct items under a three-way comparator.
pub trait SearchTree<T: Copy> {
    /// Returns the stored item equal to `item`, or inserts `item` and returns
    /// `None`.
    fn search_or_insert<F>(&mut self, item: T, cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering;

    fn find<F>(&self, item: &T, cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering;

    fn delete<F>(&mut self, item: &T, cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Items in comparator order.
    fn items(&self) -> Vec<T>;

    /// Verifies ordering and the backend's balance invariant.
    fn check_invariants<F>(&self, cmp: F) -> Result<(), TreeError>
    where
        F: FnMut(&T, &T) -> Ordering;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum TreeKind {
    #[default]
    Avl,
    AvlRb,
    Rb,
    Glib,
}

impl TreeKind {
    pub const ALL: [TreeKind; 4] = [TreeKind::Avl, TreeKind::AvlRb, TreeKind::Rb, TreeKind::Glib];
}

impl FromStr for TreeKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "avl" => Ok(TreeKind::Avl),
            "avl-rb" | "avlrb" => Ok(TreeKind::AvlRb),
            "rb" => Ok(TreeKind::Rb),
            "glib" => Ok(TreeKind::Glib),
            _ => Err(format!("unknown tree backend '{s}'")),
        }
    }
}

impl fmt::Display for TreeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TreeKind::Avl => "avl",
            TreeKind::AvlRb => "avl-rb",
            TreeKind::Rb => "rb",
            TreeKind::Glib => "glib",
        };
        f.write_str(name)
    }
}

/// A tree backend chosen at configuration time.
#[derive(Debug, Clone)]
pub enum AnyTree<T> {
    Avl(AvlTree<T>),
    AvlRb(AvlRbTree<T>),
    Rb(RbTree<T>),
    Glib(GlibTree<T>),
}

impl<T: Copy> AnyTree<T> {
    pub fn new(kind: TreeKind) -> Self {
        match kind {
            TreeKind::Avl => AnyTree::Avl(AvlTree::new()),
            TreeKind::AvlRb => AnyTree::AvlRb(AvlRbTree::new()),
            TreeKind::Rb => AnyTree::Rb(RbTree::new()),
            TreeKind::Glib => AnyTree::Glib(GlibTree::new()),
        }
    }

    pub fn kind(&self) -> TreeKind {
        match self {
            AnyTree::Avl(_) => TreeKind::Avl,
            AnyTree::AvlRb(_) => TreeKind::AvlRb,
            AnyTree::Rb(_) => TreeKind::Rb,
            AnyTree::Glib(_) => TreeKind::Glib,
        }
    }
}

macro_rules! dispatch {
    ($self:ident, $tree:ident => $body:expr) => {
        match $self {
            AnyTree::Avl($tree) => $body,
            AnyTree::AvlRb($tree) => $body,
            AnyTree::Rb($tree) => $body,
            AnyTree::Glib($tree) => $body,
        }
    };
}

impl<T: Copy> SearchTree<T> for AnyTree<T> {
    fn search_or_insert<F>(&mut self, item: T, cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        dispatch!(self, tree => tree.search_or_insert(item, cmp))
    }

    fn find<F>(&self, item: &T, cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        dispatch!(self, tree => tree.find(item, cmp))
    }

    fn delete<F>(&mut self, item: &T, cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        dispatch!(self, tree => tree.delete(item, cmp))
    }

    fn len(&self) -> usize {
        dispatch!(self, tree => tree.len())
    }

    fn items(&self) -> Vec<T> {
        dispatch!(self, tree => tree.items())
    }

    fn check_invariants<F>(&self, cmp: F) -> Result<(), TreeError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        dispatch!(self, tree => tree.check_invariants(cmp))
    }
}

/// Checks that `items` is strictly increasing under `cmp`.
fn check_order<T, F>(items: &[T], mut cmp: F) -> Result<(), TreeError>
where
    F: FnMut(&T, &T) -> Ordering,
{
    if items
        .windows(2)
        .all(|pair| cmp(&pair[0], &pair[1]) == Ordering::Less)
    {
        Ok(())
    } else {
        Err(TreeError::Order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shuffled(n: u32, seed: u32) -> Vec<u32> {
        let mut items: Vec<u32> = (0..n).collect();
        let mut state = seed;
        for i in (1..items.len()).rev() {
            state = state.wrapping_mul(1_103_515_245).wrapping_add(12345);
            let j = (state >> 8) as usize % (i + 1);
            items.swap(i, j);
        }
        items
    }

    #[test]
    fn test_all_backends_insert_find_delete() {
        for kind in TreeKind::ALL {
            let mut tree: AnyTree<u32> = AnyTree::new(kind);
            let items = shuffled(500, 7);
            for &item in &items {
                assert_eq!(tree.search_or_insert(item, u32::cmp), None, "{kind}");
            }
            tree.check_invariants(u32::cmp).unwrap();
            assert_eq!(tree.len(), 500);
            assert_eq!(tree.search_or_insert(42, u32::cmp), Some(42));
            assert_eq!(tree.len(), 500);
            assert_eq!(tree.find(&499, u32::cmp), Some(499));
            assert_eq!(tree.find(&500, u32::cmp), None);

            for &item in items.iter().filter(|&&v| v % 3 == 0) {
                assert_eq!(tree.delete(&item, u32::cmp), Some(item), "{kind}");
                tree.check_invariants(u32::cmp).unwrap();
            }
            assert_eq!(tree.delete(&3, u32::cmp), None);
            assert_eq!(tree.find(&3, u32::cmp), None);
            let expected: Vec<u32> = (0..500).filter(|v| v % 3 != 0).collect();
            assert_eq!(tree.items(), expected, "{kind}");
        }
    }

    #[test]
    fn test_comparator_borrows_external_storage() {
        let storage = ["pear", "apple", "fig", "apple"];
        for kind in TreeKind::ALL {
            let mut tree: AnyTree<usize> = AnyTree::new(kind);
            let cmp = |a: &usize, b: &usize| storage[*a].cmp(storage[*b]);
            assert_eq!(tree.search_or_insert(0, cmp), None);
            assert_eq!(tree.search_or_insert(1, cmp), None);
            assert_eq!(tree.search_or_insert(2, cmp), None);
            assert_eq!(tree.search_or_insert(3, cmp), Some(1));
            assert_eq!(tree.items(), vec![1, 2, 0]);
        }
    }

    #[test]
    fn test_tree_kind_from_str() {
        for kind in TreeKind::ALL {
            assert_eq!(kind.to_string().parse::<TreeKind>(), Ok(kind));
        }
        assert!("splay".parse::<TreeKind>().is_err());
    }
}
