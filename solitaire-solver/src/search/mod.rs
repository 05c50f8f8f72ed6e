//! Search strategies over the state graph.
//!
//! Every strategy owns its frontier and works against a shared
//! [`SolverContext`], so a suspended search continues where it stopped when
//! `run` is called again.
mod a_star;
mod bfs;
mod dfs;
mod optimize;
mod soft_dfs;

pub use self::a_star::AStar;
pub use self::bfs::Bfs;
pub use self::dfs::HardDfs;
pub use self::optimize::optimize;
pub use self::soft_dfs::SoftDfs;

use crate::config::{Method, SolverConfig};
use crate::error::SolverError;
use crate::rules::{DerivedStates, RuleSet};
use crate::state::{Locations, StateData};
use crate::store::{StateId, StateStore, VISITED};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchOutcome {
    Solved(StateId),
    Exhausted,
    Suspended,
}

pub trait SearchStrategy: std::fmt::Debug {
    fn run(&mut self, ctx: &mut SolverContext) -> SearchOutcome;
}

/// Everything one search shares between its strategy, the optimizer and the
/// solution extractor.
#[derive(Debug)]
pub struct SolverContext {
    pub config: SolverConfig,
    pub rules: RuleSet,
    pub store: StateStore,
    pub root: StateId,
}

impl SolverContext {
    pub fn new(
        config: SolverConfig,
        state: StateData,
        locs: Locations,
    ) -> Result<Self, SolverError> {
        let rules = RuleSet::new(
            &config.game,
            config.tests_order.as_deref(),
            config.method == Method::RandomDfs,
        )?;
        let mut store = StateStore::new(&config);
        let root = store.insert_root(state, locs);
        Ok(Self {
            config,
            rules,
            store,
            root,
        })
    }

    /// Marks `id` as checked and returns its state.
    pub fn visit(&mut self, id: StateId) -> (StateData, Locations) {
        self.store.note_checked();
        self.store.node_mut(id).set(VISITED);
        self.store.decode(id)
    }

    pub fn expand_group(&self, group: usize, state: &StateData, locs: &Locations) -> DerivedStates {
        self.rules.expand_group(group, state, locs)
    }

    pub fn expand_all(&self, state: &StateData, locs: &Locations) -> DerivedStates {
        self.rules.expand_all(state, locs)
    }
}

pub fn strategy_for(config: &SolverConfig) -> Box<dyn SearchStrategy> {
    match config.method {
        Method::HardDfs => Box::new(HardDfs),
        Method::SoftDfs => Box::new(SoftDfs::new(None)),
        Method::RandomDfs => Box::new(SoftDfs::new(Some(config.seed))),
        Method::Bfs => Box::new(Bfs::default()),
        Method::AStar => Box::new(AStar::new(config.normalized_weights())),
    }
}
