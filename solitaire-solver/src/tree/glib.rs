use super::arena::{Arena, NIL};
use super::{SearchTree, TreeError, check_order};

use std::cmp::Ordering;

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    left: u32,
    right: u32,
    balance: i8,
}

/// Height-balanced tree in the style of the GLib `GTree`.
///
/// Unlike [`super::AvlTree`], growth and shrinkage of a subtree are not
/// returned from the recursion. The caller compares the child's balance
/// factor before and after the call: a child whose balance changed to a
/// non-zero value grew, one whose balance changed to zero shrank.
#[derive(Debug, Clone)]
pub struct GlibTree<T> {
    nodes: Arena<Node<T>>,
    root: u32,
    len: usize,
}

impl<T: Copy> Default for GlibTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> GlibTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::default(),
            root: NIL,
            len: 0,
        }
    }

    fn leaf(&mut self, item: T) -> u32 {
        self.len += 1;
        self.nodes.alloc(Node {
            item,
            left: NIL,
            right: NIL,
            balance: 0,
        })
    }

    fn insert_at<F>(&mut self, x: u32, item: T, cmp: &mut F, found: &mut Option<T>) -> u32
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        match cmp(&item, &self.nodes[x].item) {
            Ordering::Equal => {
                *found = Some(self.nodes[x].item);
                return x;
            }
            Ordering::Less => {
                let left = self.nodes[x].left;
                if left == NIL {
                    self.nodes[x].left = self.leaf(item);
                    self.nodes[x].balance -= 1;
                } else {
                    let old = self.nodes[left].balance;
                    let left = self.insert_at(left, item, cmp, found);
                    self.nodes[x].left = left;
                    let new = self.nodes[left].balance;
                    if old != new && new != 0 {
                        self.nodes[x].balance -= 1;
                    }
                }
            }
            Ordering::Greater => {
                let right = self.nodes[x].right;
                if right == NIL {
                    self.nodes[x].right = self.leaf(item);
                    self.nodes[x].balance += 1;
                } else {
                    let old = self.nodes[right].balance;
                    let right = self.insert_at(right, item, cmp, found);
                    self.nodes[x].right = right;
                    let new = self.nodes[right].balance;
                    if old != new && new != 0 {
                        self.nodes[x].balance += 1;
                    }
                }
            }
        }
        if found.is_none() && !(-1..=1).contains(&self.nodes[x].balance) {
            self.balance(x)
        } else {
            x
        }
    }

    fn balance(&mut self, x: u32) -> u32 {
        let balance = self.nodes[x].balance;
        if balance < -1 {
            let left = self.nodes[x].left;
            if self.nodes[left].balance > 0 {
                self.nodes[x].left = self.rotate_left(left);
            }
            self.rotate_right(x)
        } else if balance > 1 {
            let right = self.nodes[x].right;
            if self.nodes[right].balance < 0 {
                self.nodes[x].right = self.rotate_right(right);
            }
            self.rotate_left(x)
        } else {
            x
        }
    }

    fn rotate_left(&mut self, x: u32) -> u32 {
        let right = self.nodes[x].right;
        self.nodes[x].right = self.nodes[right].left;
        self.nodes[right].left = x;

        let a = self.nodes[x].balance;
        let b = self.nodes[right].balance;
        if b <= 0 {
            self.nodes[right].balance = if a >= 1 { b - 1 } else { a + b - 2 };
            self.nodes[x].balance = a - 1;
        } else {
            self.nodes[right].balance = if a <= b { a - 2 } else { b - 1 };
            self.nodes[x].balance = a - b - 1;
        }
        right
    }

    fn rotate_right(&mut self, x: u32) -> u32 {
        let left = self.nodes[x].left;
        self.nodes[x].left = self.nodes[left].right;
        self.nodes[left].right = x;

        let a = self.nodes[x].balance;
        let b = self.nodes[left].balance;
        if b <= 0 {
            self.nodes[left].balance = if b > a { b + 1 } else { a + 2 };
            self.nodes[x].balance = a - b + 1;
        } else {
            self.nodes[left].balance = if a <= -1 { b + 1 } else { a + b + 2 };
            self.nodes[x].balance = a + 1;
        }
        left
    }

    fn remove_at<F>(&mut self, x: u32, item: &T, cmp: &mut F, removed: &mut Option<T>) -> u32
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if x == NIL {
            return NIL;
        }
        match cmp(item, &self.nodes[x].item) {
            Ordering::Equal => {
                *removed = Some(self.nodes[x].item);
                let Node {
                    left,
                    right,
                    balance,
                    ..
                } = self.nodes[x];
                self.nodes.release(x);
                self.len -= 1;
                if right == NIL {
                    return left;
                }
                let old = self.nodes[right].balance;
                let (right, successor) = self.remove_leftmost(right);
                self.nodes[successor].left = left;
                self.nodes[successor].right = right;
                self.nodes[successor].balance = balance;
                self.restore_right_balance(successor, old)
            }
            Ordering::Less => {
                let left = self.nodes[x].left;
                if left == NIL {
                    return x;
                }
                let old = self.nodes[left].balance;
                self.nodes[x].left = self.remove_at(left, item, cmp, removed);
                self.restore_left_balance(x, old)
            }
            Ordering::Greater => {
                let right = self.nodes[x].right;
                if right == NIL {
                    return x;
                }
                let old = self.nodes[right].balance;
                self.nodes[x].right = self.remove_at(right, item, cmp, removed);
                self.restore_right_balance(x, old)
            }
        }
    }

    /// Unlinks the leftmost node of the subtree at `x`; returns the new
    /// subtree root and the unlinked node.
    fn remove_leftmost(&mut self, x: u32) -> (u32, u32) {
        let left = self.nodes[x].left;
        if left == NIL {
            return (self.nodes[x].right, x);
        }
        let old = self.nodes[left].balance;
        let (left, leftmost) = self.remove_leftmost(left);
        self.nodes[x].left = left;
        (self.restore_left_balance(x, old), leftmost)
    }

    fn restore_left_balance(&mut self, x: u32, old: i8) -> u32 {
        let left = self.nodes[x].left;
        if left == NIL || (self.nodes[left].balance != old && self.nodes[left].balance == 0) {
            self.nodes[x].balance += 1;
        }
        if self.nodes[x].balance > 1 {
            self.balance(x)
        } else {
            x
        }
    }

    fn restore_right_balance(&mut self, x: u32, old: i8) -> u32 {
        let right = self.nodes[x].right;
        if right == NIL || (self.nodes[right].balance != old && self.nodes[right].balance == 0) {
            self.nodes[x].balance -= 1;
        }
        if self.nodes[x].balance < -1 {
            self.balance(x)
        } else {
            x
        }
    }

    fn collect(&self, x: u32, out: &mut Vec<T>) {
        if x != NIL {
            self.collect(self.nodes[x].left, out);
            out.push(self.nodes[x].item);
            self.collect(self.nodes[x].right, out);
        }
    }

    fn height(&self, x: u32) -> Result<i32, TreeError> {
        if x == NIL {
            return Ok(0);
        }
        let left = self.height(self.nodes[x].left)?;
        let right = self.height(self.nodes[x].right)?;
        let balance = right - left;
        if !(-1..=1).contains(&balance) {
            return Err(TreeError::Balance(balance));
        }
        if balance != i32::from(self.nodes[x].balance) {
            return Err(TreeError::BalanceMismatch);
        }
        Ok(1 + left.max(right))
    }
}

impl<T: Copy> SearchTree<T> for GlibTree<T> {
    fn search_or_insert<F>(&mut self, item: T, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        if self.root == NIL {
            self.root = self.leaf(item);
            return None;
        }
        let mut found = None;
        self.root = self.insert_at(self.root, item, &mut cmp, &mut found);
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
        self.root = self.remove_at(self.root, item, &mut cmp, &mut removed);
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
        self.height(self.root).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zigzag_inserts() {
        let mut tree = GlibTree::new();
        for i in 0..256u32 {
            let item = if i % 2 == 0 { i } else { 1000 - i };
            tree.search_or_insert(item, u32::cmp);
            tree.check_invariants(u32::cmp).unwrap();
        }
        assert_eq!(tree.len(), 256);
    }

    #[test]
    fn test_remove_missing_keeps_tree() {
        let mut tree = GlibTree::new();
        for i in [5u32, 3, 8, 1, 4] {
            tree.search_or_insert(i, u32::cmp);
        }
        assert_eq!(tree.delete(&7, u32::cmp), None);
        assert_eq!(tree.delete(&0, u32::cmp), None);
        tree.check_invariants(u32::cmp).unwrap();
        assert_eq!(tree.items(), vec![1, 3, 4, 5, 8]);
    }
}
