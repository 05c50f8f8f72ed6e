use crate::config::{Limits, SolverConfig};
use crate::moves::MoveStack;
use crate::rules::Candidate;
use crate::state::{Locations, StateData, StateFactory, StateKey};
use crate::tree::{AnyTree, SearchTree};

use log::debug;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

pub type StateId = u32;

pub const VISITED: u8 = 1;
pub const DEAD_END: u8 = 1 << 1;
pub const ON_PATH: u8 = 1 << 2;
pub const IN_SOLUTION: u8 = 1 << 3;
pub const IN_OPTIMIZED: u8 = 1 << 4;

const NODE_CHUNK: usize = 4096;
/// Stands for the key being looked up inside tree comparisons.
const PROBE: StateId = StateId::MAX;

#[derive(Debug, Clone)]
pub struct StateNode {
    pub key: StateKey,
    pub parent: Option<StateId>,
    /// Moves from the parent's canonical form to this state.
    pub moves: MoveStack,
    pub depth: u32,
    pub flags: u8,
    pub locs: Locations,
}

impl StateNode {
    #[inline]
    pub fn has(&self, flag: u8) -> bool {
        self.flags & flag != 0
    }

    #[inline]
    pub fn set(&mut self, flag: u8) {
        self.flags |= flag;
    }

    #[inline]
    pub fn clear(&mut self, flag: u8) {
        self.flags &= !flag;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddResult {
    New(StateId),
    Duplicate(StateId),
    /// The stored-states ceiling is reached; retry after raising it.
    Suspend,
    DepthExceeded,
}

#[derive(Debug, Clone)]
enum StateIndex {
    Tree(AnyTree<StateId>),
    Hash(FxHashMap<u64, SmallVec<[StateId; 1]>>),
}

/// Every state reached so far, deduplicated by canonical key.
#[derive(Debug, Clone)]
pub struct StateStore {
    nodes: Vec<StateNode>,
    index: StateIndex,
    factory: StateFactory,
    limits: Limits,
    checked: u64,
    max_depth: u32,
}

fn key_of<'a>(nodes: &'a [StateNode], probe: &'a StateKey, id: StateId) -> &'a StateKey {
    if id == PROBE {
        probe
    } else {
        &nodes[id as usize].key
    }
}

impl StateStore {
    pub fn new(config: &SolverConfig) -> Self {
        let index = match config.states_backend.tree_kind() {
            Some(kind) => StateIndex::Tree(AnyTree::new(kind)),
            None => StateIndex::Hash(FxHashMap::default()),
        };
        Self {
            nodes: Vec::with_capacity(NODE_CHUNK),
            index,
            factory: StateFactory::new(config),
            limits: config.limits,
            checked: 0,
            max_depth: 0,
        }
    }

    /// Stores the initial state, which has no parent.
    pub fn insert_root(&mut self, mut state: StateData, mut locs: Locations) -> StateId {
        state.canonicalize(&mut locs);
        let key = self.factory.encode(&state, &locs);
        match self.insert(key, None, MoveStack::new(), 0, locs) {
            Ok(id) | Err(id) => id,
        }
    }

    pub fn check_and_add(&mut self, cand: &Candidate, parent: StateId) -> AddResult {
        let (key, locs) = self.canonical_key(cand);
        let depth = self.nodes[parent as usize].depth + 1;
        let blocked = if self
            .limits
            .max_stored_states
            .is_some_and(|max| self.nodes.len() >= max)
        {
            Some(AddResult::Suspend)
        } else if self.limits.max_depth.is_some_and(|max| depth > max) {
            Some(AddResult::DepthExceeded)
        } else {
            None
        };
        if let Some(blocked) = blocked {
            return self.lookup(&key).map_or(blocked, AddResult::Duplicate);
        }
        match self.insert(key, Some(parent), cand.moves.clone(), depth, locs) {
            Ok(id) => AddResult::New(id),
            Err(existing) => AddResult::Duplicate(existing),
        }
    }

    /// Looks up the stored state a candidate canonicalizes to, along with
    /// the locations the candidate would have.
    pub fn find(&mut self, cand: &Candidate) -> (Option<StateId>, Locations) {
        let (key, locs) = self.canonical_key(cand);
        (self.lookup(&key), locs)
    }

    fn canonical_key(&mut self, cand: &Candidate) -> (StateKey, Locations) {
        let mut state = cand.state.clone();
        let mut locs = cand.locs.clone();
        state.canonicalize(&mut locs);
        (self.factory.encode(&state, &locs), locs)
    }

    fn lookup(&self, key: &StateKey) -> Option<StateId> {
        let nodes = &self.nodes;
        match &self.index {
            StateIndex::Tree(tree) => tree.find(&PROBE, |a, b| {
                key_of(nodes, key, *a).cmp(key_of(nodes, key, *b))
            }),
            StateIndex::Hash(map) => map
                .get(&key.digest())?
                .iter()
                .copied()
                .find(|&id| nodes[id as usize].key == *key),
        }
    }

    /// Returns the new id, or the id of the equal state already stored.
    fn insert(
        &mut self,
        key: StateKey,
        parent: Option<StateId>,
        moves: MoveStack,
        depth: u32,
        locs: Locations,
    ) -> Result<StateId, StateId> {
        if self.nodes.len() == self.nodes.capacity() {
            self.nodes.reserve(NODE_CHUNK);
            debug!("State store grown to {} slots", self.nodes.capacity());
        }
        let id = self.nodes.len() as StateId;
        self.nodes.push(StateNode {
            key,
            parent,
            moves,
            depth,
            flags: 0,
            locs,
        });

        let Self { nodes, index, .. } = self;
        let existing = match index {
            StateIndex::Tree(tree) => tree.search_or_insert(id, |a, b| {
                nodes[*a as usize].key.cmp(&nodes[*b as usize].key)
            }),
            StateIndex::Hash(map) => {
                let key = &nodes[id as usize].key;
                let bucket = map.entry(key.digest()).or_default();
                let found = bucket.iter().copied().find(|&other| nodes[other as usize].key == *key);
                if found.is_none() {
                    bucket.push(id);
                }
                found
            }
        };
        match existing {
            Some(existing) => {
                self.nodes.pop();
                Err(existing)
            }
            None => {
                self.max_depth = self.max_depth.max(depth);
                Ok(id)
            }
        }
    }

    /// Rebuilds the canonical state of `id` with its locations.
    pub fn decode(&self, id: StateId) -> (StateData, Locations) {
        let node = &self.nodes[id as usize];
        (self.factory.decode(&node.key), node.locs.clone())
    }

    #[inline]
    pub fn node(&self, id: StateId) -> &StateNode {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn node_mut(&mut self, id: StateId) -> &mut StateNode {
        &mut self.nodes[id as usize]
    }

    pub fn note_checked(&mut self) {
        self.checked += 1;
    }

    pub fn limits_reached(&self) -> bool {
        self.limits.max_iterations.is_some_and(|max| self.checked >= max)
            || self
                .limits
                .max_stored_states
                .is_some_and(|max| self.nodes.len() >= max)
    }

    pub fn set_limits(&mut self, limits: Limits) {
        self.limits = limits;
    }

    pub fn checked(&self) -> u64 {
        self.checked
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn interned_stacks(&self) -> usize {
        self.factory.interned_stacks()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GameConfig, StateFlavor, StorageBackend};
    use crate::moves::Move;
    use solitaire_common::board::Board;

    fn root_state() -> (StateData, Locations) {
        let board = Board::parse(
            "Foundations: H-K C-K D-Q S-Q
Freecells: - -
: QD
: QS
:
",
        )
        .unwrap();
        let state = StateData::from_board(&board);
        (state, Locations::identity(3, 2))
    }

    fn config(backend: StorageBackend, flavor: StateFlavor) -> SolverConfig {
        let game = GameConfig {
            freecells: 2,
            stacks: 3,
            ..Default::default()
        };
        SolverConfig {
            states_backend: backend,
            stacks_backend: backend,
            flavor,
            ..SolverConfig::new(game)
        }
    }

    #[test]
    fn test_dedup_across_backends() {
        for backend in StorageBackend::ALL {
            for flavor in StateFlavor::ALL {
                let mut store = StateStore::new(&config(*backend, *flavor));
                let (state, locs) = root_state();
                let root = store.insert_root(state.clone(), locs.clone());

                // QD in either freecell is the same position once the
                // freecells are sorted.
                let mut a = Candidate::new(&state, &locs);
                a.push(Move::stack_to_freecell(0, 0));
                let a = a.finish();
                let mut same = Candidate::new(&state, &locs);
                same.push(Move::stack_to_freecell(0, 1));
                let same = same.finish();
                let mut b = Candidate::new(&state, &locs);
                b.push(Move::stack_to_freecell(1, 0));
                let b = b.finish();

                let AddResult::New(id) = store.check_and_add(&a, root) else {
                    panic!("{backend} {flavor}");
                };
                assert_eq!(store.check_and_add(&same, root), AddResult::Duplicate(id));
                assert!(matches!(store.check_and_add(&b, root), AddResult::New(_)));
                assert_eq!(store.find(&a).0, Some(id));
                assert_eq!(store.len(), 3);
                assert_eq!(store.node(id).depth, 1);
                assert_eq!(store.node(id).parent, Some(root));

                let (decoded, _) = store.decode(id);
                let mut expected = a.state.clone();
                expected.canonicalize(&mut a.locs.clone());
                assert_eq!(decoded, expected);
            }
        }
    }

    #[test]
    fn test_limits() {
        let mut config = config(StorageBackend::Hash, StateFlavor::Compact);
        config.limits.max_stored_states = Some(2);
        config.limits.max_depth = Some(1);
        let mut store = StateStore::new(&config);
        let (state, locs) = root_state();
        let root = store.insert_root(state.clone(), locs.clone());

        let mut a = Candidate::new(&state, &locs);
        a.push(Move::stack_to_freecell(0, 0));
        let a = a.finish();
        let AddResult::New(child) = store.check_and_add(&a, root) else {
            panic!("first child should be stored");
        };

        let mut deeper = Candidate::new(&a.state, &a.locs);
        deeper.push(Move::stack_to_freecell(1, 1));
        let deeper = deeper.finish();
        assert_eq!(store.check_and_add(&deeper, child), AddResult::Suspend);
        assert!(store.limits_reached());
        // Known states are still recognized at the ceiling.
        assert_eq!(store.check_and_add(&a, root), AddResult::Duplicate(child));

        store.set_limits(Limits {
            max_depth: Some(1),
            ..Default::default()
        });
        assert_eq!(store.check_and_add(&deeper, child), AddResult::DepthExceeded);
        assert!(!store.limits_reached());
        store.note_checked();
        assert_eq!(store.checked(), 1);
    }
}
