use super::arena::{Arena, NIL};
use super::{SearchTree, TreeError, check_order};

use smallvec::SmallVec;
use std::cmp::Ordering;

const LEFT: usize = 0;
const RIGHT: usize = 1;

type Path = SmallVec<[(u32, usize); 64]>;

#[derive(Debug, Clone)]
struct Node<T> {
    item: T,
    link: [u32; 2],
    red: bool,
}

/// Red-black tree without parent pointers.
///
/// Insertion and deletion walk down recording an explicit ancestor stack and
/// run the Cormen fix-up cases against that stack. The first stack entry is a
/// pseudo-root (`NIL`) whose left link is the real root.
#[derive(Debug, Clone)]
pub struct AvlRbTree<T> {
    nodes: Arena<Node<T>>,
    root: u32,
    len: usize,
}

impl<T: Copy> Default for AvlRbTree<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy> AvlRbTree<T> {
    pub fn new() -> Self {
        Self {
            nodes: Arena::default(),
            root: NIL,
            len: 0,
        }
    }

    #[inline]
    fn child(&self, parent: u32, dir: usize) -> u32 {
        if parent == NIL {
            self.root
        } else {
            self.nodes[parent].link[dir]
        }
    }

    #[inline]
    fn set_child(&mut self, parent: u32, dir: usize, child: u32) {
        if parent == NIL {
            self.root = child;
        } else {
            self.nodes[parent].link[dir] = child;
        }
    }

    #[inline]
    fn is_red(&self, x: u32) -> bool {
        x != NIL && self.nodes[x].red
    }

    fn insert_fixup(&mut self, path: &mut Path) {
        let mut k = path.len();
        // path[k - 1] is the parent of the new red node.
        while k >= 3 && self.is_red(path[k - 1].0) {
            let (parent, parent_dir) = path[k - 1];
            let (grand, grand_dir) = path[k - 2];
            let side = grand_dir;
            let other = 1 - side;
            let uncle = self.nodes[grand].link[other];
            if self.is_red(uncle) {
                self.nodes[parent].red = false;
                self.nodes[uncle].red = false;
                self.nodes[grand].red = true;
                k -= 2;
                continue;
            }

            let y = if parent_dir == side {
                parent
            } else {
                let x = parent;
                let y = self.nodes[x].link[other];
                self.nodes[x].link[other] = self.nodes[y].link[side];
                self.nodes[y].link[side] = x;
                self.nodes[grand].link[side] = y;
                y
            };
            self.nodes[grand].red = true;
            self.nodes[y].red = false;
            self.nodes[grand].link[side] = self.nodes[y].link[other];
            self.nodes[y].link[other] = grand;
            let (great, great_dir) = path[k - 3];
            self.set_child(great, great_dir, y);
            break;
        }
        let root = self.root;
        self.nodes[root].red = false;
    }

    fn delete_fixup(&mut self, path: &mut Path) {
        let mut k = path.len();
        loop {
            let (parent, dir) = path[k - 1];
            let x = self.child(parent, dir);
            if self.is_red(x) {
                self.nodes[x].red = false;
                break;
            }
            if k < 2 {
                break;
            }

            let other = 1 - dir;
            let mut w = self.nodes[parent].link[other];
            if self.is_red(w) {
                self.nodes[w].red = false;
                self.nodes[parent].red = true;
                self.nodes[parent].link[other] = self.nodes[w].link[dir];
                self.nodes[w].link[dir] = parent;
                let (grand, grand_dir) = path[k - 2];
                self.set_child(grand, grand_dir, w);

                // w now sits between grand and parent on the path.
                path.insert(k - 1, (w, dir));
                k += 1;
                w = self.nodes[parent].link[other];
            }

            let near = self.nodes[w].link[dir];
            let far = self.nodes[w].link[other];
            if !self.is_red(near) && !self.is_red(far) {
                self.nodes[w].red = true;
            } else {
                if !self.is_red(far) {
                    self.nodes[near].red = false;
                    self.nodes[w].red = true;
                    self.nodes[w].link[dir] = self.nodes[near].link[other];
                    self.nodes[near].link[other] = w;
                    self.nodes[parent].link[other] = near;
                    w = near;
                }
                self.nodes[w].red = self.nodes[parent].red;
                self.nodes[parent].red = false;
                let far = self.nodes[w].link[other];
                self.nodes[far].red = false;
                self.nodes[parent].link[other] = self.nodes[w].link[dir];
                self.nodes[w].link[dir] = parent;
                let (grand, grand_dir) = path[k - 2];
                self.set_child(grand, grand_dir, w);
                break;
            }
            k -= 1;
        }
    }

    fn collect(&self, x: u32, out: &mut Vec<T>) {
        if x != NIL {
            self.collect(self.nodes[x].link[LEFT], out);
            out.push(self.nodes[x].item);
            self.collect(self.nodes[x].link[RIGHT], out);
        }
    }

    fn black_height(&self, x: u32) -> Result<usize, TreeError> {
        if x == NIL {
            return Ok(1);
        }
        let node = &self.nodes[x];
        if node.red && (self.is_red(node.link[LEFT]) || self.is_red(node.link[RIGHT])) {
            return Err(TreeError::RedRed);
        }
        let left = self.black_height(node.link[LEFT])?;
        let right = self.black_height(node.link[RIGHT])?;
        if left != right {
            return Err(TreeError::BlackHeight);
        }
        Ok(left + usize::from(!node.red))
    }
}

impl<T: Copy> SearchTree<T> for AvlRbTree<T> {
    fn search_or_insert<F>(&mut self, item: T, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut path = Path::new();
        path.push((NIL, LEFT));
        let mut x = self.root;
        while x != NIL {
            let dir = match cmp(&item, &self.nodes[x].item) {
                Ordering::Equal => return Some(self.nodes[x].item),
                Ordering::Less => LEFT,
                Ordering::Greater => RIGHT,
            };
            path.push((x, dir));
            x = self.nodes[x].link[dir];
        }

        let node = self.nodes.alloc(Node {
            item,
            link: [NIL, NIL],
            red: true,
        });
        let (parent, dir) = path[path.len() - 1];
        self.set_child(parent, dir, node);
        self.len += 1;
        self.insert_fixup(&mut path);
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
                Ordering::Less => self.nodes[x].link[LEFT],
                Ordering::Greater => self.nodes[x].link[RIGHT],
            };
        }
        None
    }

    fn delete<F>(&mut self, item: &T, mut cmp: F) -> Option<T>
    where
        F: FnMut(&T, &T) -> Ordering,
    {
        let mut path = Path::new();
        path.push((NIL, LEFT));
        let mut p = self.root;
        loop {
            if p == NIL {
                return None;
            }
            let dir = match cmp(item, &self.nodes[p].item) {
                Ordering::Equal => break,
                Ordering::Less => LEFT,
                Ordering::Greater => RIGHT,
            };
            path.push((p, dir));
            p = self.nodes[p].link[dir];
        }
        let removed = self.nodes[p].item;

        let (parent, parent_dir) = path[path.len() - 1];
        let r = self.nodes[p].link[RIGHT];
        if r == NIL {
            let left = self.nodes[p].link[LEFT];
            self.set_child(parent, parent_dir, left);
        } else if self.nodes[r].link[LEFT] == NIL {
            self.nodes[r].link[LEFT] = self.nodes[p].link[LEFT];
            let red = self.nodes[r].red;
            self.nodes[r].red = self.nodes[p].red;
            self.nodes[p].red = red;
            self.set_child(parent, parent_dir, r);
            path.push((r, RIGHT));
        } else {
            let j = path.len();
            path.push((NIL, RIGHT));
            let mut r = r;
            let s = loop {
                path.push((r, LEFT));
                let s = self.nodes[r].link[LEFT];
                if self.nodes[s].link[LEFT] == NIL {
                    break s;
                }
                r = s;
            };
            path[j] = (s, RIGHT);
            self.set_child(parent, parent_dir, s);
            self.nodes[s].link[LEFT] = self.nodes[p].link[LEFT];
            self.nodes[r].link[LEFT] = self.nodes[s].link[RIGHT];
            self.nodes[s].link[RIGHT] = self.nodes[p].link[RIGHT];
            let red = self.nodes[s].red;
            self.nodes[s].red = self.nodes[p].red;
            self.nodes[p].red = red;
        }

        if !self.nodes[p].red {
            self.delete_fixup(&mut path);
        }
        self.nodes.release(p);
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
        self.black_height(self.root).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descending_inserts_then_deletes() {
        let mut tree = AvlRbTree::new();
        for i in (0..300u32).rev() {
            assert_eq!(tree.search_or_insert(i, u32::cmp), None);
            tree.check_invariants(u32::cmp).unwrap();
        }
        for i in (0..300u32).step_by(2) {
            assert_eq!(tree.delete(&i, u32::cmp), Some(i));
            tree.check_invariants(u32::cmp).unwrap();
        }
        assert_eq!(tree.len(), 150);
        assert_eq!(tree.items()[0], 1);
    }
}
