use super::arena::{Arena, NIL};
use super::{SearchTree, TreeError, check_order};

use std::cmp::Ordering;

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    left: u32,
    right: u32,
    /// Height of the right subtree minus height of the left subtree.
    balance: i8,
}

/// Classic AVL tree with single-byte balance factors.
#[derive(Debug, Clone)]
pub struct AvlTree<T> {
    nodes: Arena<Node<T>>,
    root: u32,
    len: usize,
}

impl<T: Copy> Default for AvlTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> AvlTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::default(),
            root: NIL,
            len: 0,
        }
    }

    fn rotate_left(&mut self, x: u32) -> u32 {
        let y = self.nodes[x].right;
        self.nodes[x].right = self.nodes[y].left;
        self.nodes[y].left = x;

        let x_bal = self.nodes[x].balance - 1 - self.nodes[y].balance.max(0);
        self.nodes[x].balance = x_bal;
        self.nodes[y].balance = self.nodes[y].balance - 1 + x_bal.min(0);
        y
    }

    fn rotate_right(&mut self, x: u32) -> u32 {
        let y = self.nodes[x].left;
        self.nodes[x].left = self.nodes[y].right;
        self.nodes[y].right = x;

        let x_bal = self.nodes[x].balance + 1 - self.nodes[y].balance.min(0);
        self.nodes[x].balance = x_bal;
        self.nodes[y].balance = self.nodes[y].balance + 1 + x_bal.max(0);
        y
    }

    /// Restores the AVL property at `x` whose balance is +-2.
    fn rebalance(&mut self, x: u32) -> u32 {
        if self.nodes[x].balance < -1 {
            let left = self.nodes[x].left;
            if self.nodes[left].balance > 0 {
                self.nodes[x].left = self.rotate_left(left);
            }
            self.rotate_right(x)
        } else {
            let right = self.nodes[x].right;
            if self.nodes[right].balance < 0 {
                self.nodes[x].right = self.rotate_right(right);
            }
            self.rotate_left(x)
        }
    }

    /// Returns the new subtree root and whether the subtree grew.
    fn insert_at<F>(&mut self, x: u32, item: T, cmp: &mut F, found: &mut Option<T>) -> (u32, bool)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if x == NIL {
            self.len += 1;
            let leaf = self.nodes.alloc(Node {
                item,
                left: NIL,
                right: NIL,
                balance: 0,
            });
            return (leaf, true);
        }

        let delta = match cmp(&item, &self.nodes[x].item) {
            Ordering::Equal => {
                *found = Some(self.nodes[x].item);
                return (x, false);
            }
            Ordering::Less => {
                let (left, grew) = self.insert_at(self.nodes[x].left, item, cmp, found);
                self.nodes[x].left = left;
                if !grew {
                    return (x, false);
                }
                -1
            }
            Ordering::Greater => {
                let (right, grew) = self.insert_at(self.nodes[x].right, item, cmp, found);
                self.nodes[x].right = right;
                if !grew {
                    return (x, false);
                }
                1
            }
        };

        self.nodes[x].balance += delta;
        match self.nodes[x].balance {
            0 => (x, false),
            -1 | 1 => (x, true),
            _ => (self.rebalance(x), false),
        }
    }

    /// Returns the new subtree root and whether the subtree shrank.
    fn delete_at<F>(
        &mut self,
        x: u32,
        item: &T,
        cmp: &mut F,
        removed: &mut Option<T>,
    ) -> (u32, bool)
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if x == NIL {
            return (NIL, false);
        }

        match cmp(item, &self.nodes[x].item) {
            Ordering::Less => {
                let (left, shrank) = self.delete_at(self.nodes[x].left, item, cmp, removed);
                self.nodes[x].left = left;
                if shrank { self.left_shrank(x) } else { (x, false) }
            }
            Ordering::Greater => {
                let (right, shrank) = self.delete_at(self.nodes[x].right, item, cmp, removed);
                self.nodes[x].right = right;
                if shrank { self.right_shrank(x) } else { (x, false) }
            }
            Ordering::Equal => {
                *removed = Some(self.nodes[x].item);
                let Node { left, right, .. } = self.nodes[x];
                if left == NIL || right == NIL {
                    self.nodes.release(x);
                    self.len -= 1;
                    return (if left == NIL { right } else { left }, true);
                }
                let (right, shrank, successor) = self.remove_min(right);
                self.nodes[x].item = successor;
                self.nodes[x].right = right;
                if shrank { self.right_shrank(x) } else { (x, false) }
            }
        }
    }

    fn remove_min(&mut self, x: u32) -> (u32, bool, T) {
        let left = self.nodes[x].left;
        if left == NIL {
            let Node { item, right, .. } = self.nodes[x];
            self.nodes.release(x);
            self.len -= 1;
            return (right, true, item);
        }
        let (left, shrank, item) = self.remove_min(left);
        self.nodes[x].left = left;
        if shrank {
            let (x, shrank) = self.left_shrank(x);
            (x, shrank, item)
        } else {
            (x, false, item)
        }
    }

    fn left_shrank(&mut self, x: u32) -> (u32, bool) {
        self.nodes[x].balance += 1;
        match self.nodes[x].balance {
            0 => (x, true),
            1 => (x, false),
            _ => {
                let root = self.rebalance(x);
                (root, self.nodes[root].balance == 0)
            }
        }
    }

    fn right_shrank(&mut self, x: u32) -> (u32, bool) {
        self.nodes[x].balance -= 1;
        match self.nodes[x].balance {
            0 => (x, true),
            -1 => (x, false),
            _ => {
                let root = self.rebalance(x);
                (root, self.nodes[root].balance == 0)
            }
        }
    }

    fn collect(&self, x: u32, out: &mut Vec<T>) {
        if x != NIL {
            self.collect(self.nodes[x].left, out);
            out.push(self.nodes[x].item);
            self.collect(self.nodes[x].right, out);
        }
    }

    fn check_heights(&self, x: u32) -> Result<i32, TreeError> {
        if x == NIL {
            return Ok(0);
        }
        let left = self.check_heights(self.nodes[x].left)?;
        let right = self.check_heights(self.nodes[x].right)?;
        let balance = right - left;
        if !(-1..=1).contains(&balance) {
            return Err(TreeError::Balance(balance));
        }
        if balance != self.nodes[x].balance as i32 {
            return Err(TreeError::BalanceMismatch);
        }
        Ok(1 + left.max(right))
    }
}

impl<T: Copy> SearchTree<T> for AvlTree<T> {
    fn search_or_insert<F>(&mut self, item: T, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut found = None;
        let (root, _) = self.insert_at(self.root, item, &mut cmp, &mut found);
        self.root = root;
        found
    }

    fn find<F>(&self, item: &T, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut x = self.root;
        while x != NIL {
            x = match cmp(item, &self.nodes[x].item) {
                Ordering::Equal => return Some(self.nodes[x].item),
                Ordering::Less => self.nodes[x].left,
                Ordering::Greater => self.nodes[x].right,
            };
        }
        None
    }

    fn delete<F>(&mut self, item: &T, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut removed = None;
        let (root, _) = self.delete_at(self.root, item, &mut cmp, &mut removed);
        self.root = root;
        removed
    }

    fn len(&self) -> usize {
        self.len
    }

    fn items(&self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.len);
        self.collect(self.root, &mut out);
        out
    }

    fn check_invariants<F>(&self, cmp: F) -> Result<(), TreeError>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let items = self.items();
        if items.len() != self.len {
            return Err(TreeError::Count {
                expected: self.len,
                found: items.len(),
            });
        }
        check_order(&items, cmp)?;
        self.check_heights(self.root).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascending_inserts_stay_balanced() {
        let mut tree = AvlTree::new();
        for i in 0..1024u32 {
            tree.search_or_insert(i, u32::cmp);
        }
        tree.check_invariants(u32::cmp).unwrap();
        // A perfectly filled AVL tree of 1024 items has height 11.
        assert!(tree.check_heights(tree.root).unwrap() <= 11);
    }

    #[test]
    fn test_delete_root_repeatedly() {
        let mut tree = AvlTree::new();
        for i in 0..100u32 {
            tree.search_or_insert(i, u32::cmp);
        }
        while !tree.is_empty() {
            let root_item = tree.nodes[tree.root].item;
            assert_eq!(tree.delete(&root_item, u32::cmp), Some(root_item));
            tree.check_invariants(u32::cmp).unwrap();
        }
        assert_eq!(tree.root, NIL);
    }
}
