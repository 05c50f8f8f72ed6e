use super::arena::{Arena, NIL};
use super::{SearchTree, TreeError, check_order};

use std::cmp::Ordering;

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    parent: u32,
    left: u32,
    right: u32,
    red: bool,
}

/// Red-black tree with parent links, following the textbook fix-up cases.
#[derive(Debug, Clone)]
pub struct RbTree<T> {
    nodes: Arena<Node<T>>,
    root: u32,
    len: usize,
}

impl<T: Copy> Default for RbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> RbTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::default(),
            root: NIL,
            len: 0,
        }
    }

    #[inline]
    fn is_red(&self, x: u32) -> bool {
        x != NIL && self.nodes[x].red
    }

    #[inline]
    fn set_black(&mut self, x: u32) {
        if x != NIL {
            self.nodes[x].red = false;
        }
    }

    fn replace_child(&mut self, parent: u32, old: u32, new: u32) {
        if parent == NIL {
            self.root = new;
        } else if self.nodes[parent].left == old {
            self.nodes[parent].left = new;
        } else {
            self.nodes[parent].right = new;
        }
    }

    fn rotate_left(&mut self, x: u32) {
        let y = self.nodes[x].right;
        let inner = self.nodes[y].left;
        self.nodes[x].right = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, y);
        self.nodes[y].left = x;
        self.nodes[x].parent = y;
    }

    fn rotate_right(&mut self, x: u32) {
        let y = self.nodes[x].left;
        let inner = self.nodes[y].right;
        self.nodes[x].left = inner;
        if inner != NIL {
            self.nodes[inner].parent = x;
        }
        let parent = self.nodes[x].parent;
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, y);
        self.nodes[y].right = x;
        self.nodes[x].parent = y;
    }

    fn insert_fixup(&mut self, mut z: u32) {
        while self.is_red(self.nodes[z].parent) {
            let p = self.nodes[z].parent;
            // A red parent is never the root, so the grandparent exists.
            let g = self.nodes[p].parent;
            if p == self.nodes[g].left {
                let uncle = self.nodes[g].right;
                if self.is_red(uncle) {
                    self.nodes[p].red = false;
                    self.nodes[uncle].red = false;
                    self.nodes[g].red = true;
                    z = g;
                    continue;
                }
                if z == self.nodes[p].right {
                    z = p;
                    self.rotate_left(z);
                }
                let p = self.nodes[z].parent;
                let g = self.nodes[p].parent;
                self.nodes[p].red = false;
                self.nodes[g].red = true;
                self.rotate_right(g);
            } else {
                let uncle = self.nodes[g].left;
                if self.is_red(uncle) {
                    self.nodes[p].red = false;
                    self.nodes[uncle].red = false;
                    self.nodes[g].red = true;
                    z = g;
                    continue;
                }
                if z == self.nodes[p].left {
                    z = p;
                    self.rotate_right(z);
                }
                let p = self.nodes[z].parent;
                let g = self.nodes[p].parent;
                self.nodes[p].red = false;
                self.nodes[g].red = true;
                self.rotate_left(g);
            }
        }
        let root = self.root;
        self.nodes[root].red = false;
    }

    /// Replaces the subtree rooted at `u` with the one rooted at `v`.
    fn transplant(&mut self, u: u32, v: u32) {
        let parent = self.nodes[u].parent;
        self.replace_child(parent, u, v);
        if v != NIL {
            self.nodes[v].parent = parent;
        }
    }

    fn minimum(&self, mut x: u32) -> u32 {
        while self.nodes[x].left != NIL {
            x = self.nodes[x].left;
        }
        x
    }

    /// `x` may be `NIL`, so its parent is tracked separately.
    fn delete_fixup(&mut self, mut x: u32, mut parent: u32) {
        while x != self.root && !self.is_red(x) {
            if x == self.nodes[parent].left {
                let mut w = self.nodes[parent].right;
                if self.is_red(w) {
                    self.nodes[w].red = false;
                    self.nodes[parent].red = true;
                    self.rotate_left(parent);
                    w = self.nodes[parent].right;
                }
                if !self.is_red(self.nodes[w].left) && !self.is_red(self.nodes[w].right) {
                    self.nodes[w].red = true;
                    x = parent;
                    parent = self.nodes[x].parent;
                } else {
                    if !self.is_red(self.nodes[w].right) {
                        let near = self.nodes[w].left;
                        self.set_black(near);
                        self.nodes[w].red = true;
                        self.rotate_right(w);
                        w = self.nodes[parent].right;
                    }
                    self.nodes[w].red = self.nodes[parent].red;
                    self.nodes[parent].red = false;
                    let far = self.nodes[w].right;
                    self.set_black(far);
                    self.rotate_left(parent);
                    x = self.root;
                }
            } else {
                let mut w = self.nodes[parent].left;
                if self.is_red(w) {
                    self.nodes[w].red = false;
                    self.nodes[parent].red = true;
                    self.rotate_right(parent);
                    w = self.nodes[parent].left;
                }
                if !self.is_red(self.nodes[w].right) && !self.is_red(self.nodes[w].left) {
                    self.nodes[w].red = true;
                    x = parent;
                    parent = self.nodes[x].parent;
                } else {
                    if !self.is_red(self.nodes[w].left) {
                        let near = self.nodes[w].right;
                        self.set_black(near);
                        self.nodes[w].red = true;
                        self.rotate_left(w);
                        w = self.nodes[parent].left;
                    }
                    self.nodes[w].red = self.nodes[parent].red;
                    self.nodes[parent].red = false;
                    let far = self.nodes[w].left;
                    self.set_black(far);
                    self.rotate_right(parent);
                    x = self.root;
                }
            }
        }
        self.set_black(x);
    }

    fn collect(&self, x: u32, out: &mut Vec<T>) {
        if x != NIL {
            self.collect(self.nodes[x].left, out);
            out.push(self.nodes[x].item);
            self.collect(self.nodes[x].right, out);
        }
    }

    fn check_node(&self, x: u32, parent: u32) -> Result<usize, TreeError> {
        if x == NIL {
            return Ok(1);
        }
        let node = &self.nodes[x];
        if node.parent != parent {
            return Err(TreeError::ParentLink);
        }
        if node.red && (self.is_red(node.left) || self.is_red(node.right)) {
            return Err(TreeError::RedRed);
        }
        let left = self.check_node(node.left, x)?;
        let right = self.check_node(node.right, x)?;
        if left != right {
            return Err(TreeError::BlackHeight);
        }
        Ok(left + usize::from(!node.red))
    }
}

impl<T: Copy> SearchTree<T> for RbTree<T> {
    fn search_or_insert<F>(&mut self, item: T, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut parent = NIL;
        let mut went_left = false;
        let mut x = self.root;
        while x != NIL {
            parent = x;
            x = match cmp(&item, &self.nodes[x].item) {
                Ordering::Equal => return Some(self.nodes[x].item),
                Ordering::Less => {
                    went_left = true;
                    self.nodes[x].left
                }
                Ordering::Greater => {
                    went_left = false;
                    self.nodes[x].right
                }
            };
        }

        let z = self.nodes.alloc(Node {
            item,
            parent,
            left: NIL,
            right: NIL,
            red: true,
        });
        if parent == NIL {
            self.root = z;
        } else if went_left {
            self.nodes[parent].left = z;
        } else {
            self.nodes[parent].right = z;
        }
        self.len += 1;
        self.insert_fixup(z);
        None
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
        let mut z = self.root;
        while z != NIL {
            z = match cmp(item, &self.nodes[z].item) {
                Ordering::Equal => break,
                Ordering::Less => self.nodes[z].left,
                Ordering::Greater => self.nodes[z].right,
            };
        }
        if z == NIL {
            return None;
        }
        let removed = self.nodes[z].item;

        let Node { left, right, .. } = self.nodes[z];
        let (x, x_parent, removed_red) = if left == NIL {
            let parent = self.nodes[z].parent;
            self.transplant(z, right);
            (right, parent, self.nodes[z].red)
        } else if right == NIL {
            let parent = self.nodes[z].parent;
            self.transplant(z, left);
            (left, parent, self.nodes[z].red)
        } else {
            let y = self.minimum(right);
            let removed_red = self.nodes[y].red;
            let x = self.nodes[y].right;
            let x_parent = if self.nodes[y].parent == z {
                y
            } else {
                let parent = self.nodes[y].parent;
                self.transplant(y, x);
                self.nodes[y].right = right;
                self.nodes[right].parent = y;
                parent
            };
            self.transplant(z, y);
            self.nodes[y].left = left;
            self.nodes[left].parent = y;
            self.nodes[y].red = self.nodes[z].red;
            (x, x_parent, removed_red)
        };

        if !removed_red {
            self.delete_fixup(x, x_parent);
        }
        self.nodes.release(z);
        self.len -= 1;
        Some(removed)
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
        if self.is_red(self.root) {
            return Err(TreeError::RedRoot);
        }
        self.check_node(self.root, NIL).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interleaved_insert_delete() {
        let mut tree = RbTree::new();
        for i in 0..200u32 {
            tree.search_or_insert(i * 7 % 200, u32::cmp);
            if i % 4 == 3 {
                let victim = i * 3 % 200;
                tree.delete(&victim, u32::cmp);
            }
            tree.check_invariants(u32::cmp).unwrap();
        }
        let items = tree.items();
        assert_eq!(items.len(), tree.len());
    }

    #[test]
    fn test_delete_to_empty() {
        let mut tree = RbTree::new();
        for i in 0..64u32 {
            tree.search_or_insert(i, u32::cmp);
        }
        for i in (0..64u32).rev() {
            assert_eq!(tree.delete(&i, u32::cmp), Some(i));
            tree.check_invariants(u32::cmp).unwrap();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.root, NIL);
    }
}
