use std::ops::{Index, IndexMut};

pub const NIL: u32 = u32::MAX;

/// Node storage shared by the tree backends. Released slots are recycled.
#[derive(Debug, Clone)]
pub struct Arena<N> {
    nodes: Vec<N>,
    free: Vec<u32>,
}

impl<N> Default for Arena<N> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<N> Arena<N> {
    pub fn alloc(&mut self, node: N) -> u32 {
        match self.free.pop() {
            Some(idx) => {
                self.nodes[idx as usize] = node;
                idx
            }
            None => {
                self.nodes.push(node);
                (self.nodes.len() - 1) as u32
            }
        }
    }

    pub fn release(&mut self, idx: u32) {
        debug_assert!(idx != NIL);
        self.free.push(idx);
    }
}

impl<N> Index<u32> for Arena<N> {
    type Output = N;

    #[inline]
    fn index(&self, idx: u32) -> &N {
        &self.nodes[idx as usize]
    }
}

impl<N> IndexMut<u32> for Arena<N> {
    #[inline]
    fn index_mut(&mut self, idx: u32) -> &mut N {
        &mut self.nodes[idx as usize]
    }
}
