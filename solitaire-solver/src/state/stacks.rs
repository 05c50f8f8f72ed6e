use crate::config::StorageBackend;
use crate::tree::{AnyTree, SearchTree};

use rustc_hash::FxHashMap;
use solitaire_common::board::Stack;

#[derive(Debug, Clone)]
enum StackIndex {
    Tree(AnyTree<u32>),
    Hash(FxHashMap<Stack, u32>),
}

/// Interned stack contents shared by all states of the indirect flavor.
///
/// Equal stacks always get the same id, so two states are equal exactly when
/// their id lists are.
#[derive(Debug, Clone)]
pub struct StackTable {
    stacks: Vec<Stack>,
    index: StackIndex,
}

impl StackTable {
    pub fn new(backend: StorageBackend) -> Self {
        let index = match backend.tree_kind() {
            Some(kind) => StackIndex::Tree(AnyTree::new(kind)),
            None => StackIndex::Hash(FxHashMap::default()),
        };
        Self {
            stacks: Vec::new(),
            index,
        }
    }

    pub fn intern(&mut self, stack: &Stack) -> u32 {
        let Self { stacks, index } = self;
        match index {
            StackIndex::Hash(map) => {
                if let Some(&id) = map.get(stack) {
                    return id;
                }
                let id = stacks.len() as u32;
                stacks.push(stack.clone());
                map.insert(stack.clone(), id);
                id
            }
            StackIndex::Tree(tree) => {
                let id = stacks.len() as u32;
                stacks.push(stack.clone());
                let existing = tree.search_or_insert(id, |a, b| {
                    stacks[*a as usize].cmp(&stacks[*b as usize])
                });
                match existing {
                    Some(existing) => {
                        stacks.pop();
                        existing
                    }
                    None => id,
                }
            }
        }
    }

    pub fn get(&self, id: u32) -> &Stack {
        &self.stacks[id as usize]
    }

    pub fn len(&self) -> usize {
        self.stacks.len()
    }
}
