use super::{SearchOutcome, SearchStrategy, SolverContext};
use crate::state::{Locations, StateData};
use crate::store::{AddResult, DEAD_END, ON_PATH, StateId};

/// Recursive depth-first search.
///
/// Nothing survives between runs except the store: a resumed search starts
/// over at the root and descends again through every child that is not yet
/// known to be a dead end.
#[derive(Debug, Default, Clone, Copy)]
pub struct HardDfs;

impl SearchStrategy for HardDfs {
    fn run(&mut self, ctx: &mut SolverContext) -> SearchOutcome {
        let root = ctx.root;
        descend(ctx, root)
    }
}

fn descend(ctx: &mut SolverContext, id: StateId) -> SearchOutcome {
    if ctx.store.limits_reached() {
        return SearchOutcome::Suspended;
    }
    let (state, locs) = ctx.visit(id);
    if state.is_solved() {
        return SearchOutcome::Solved(id);
    }
    ctx.store.node_mut(id).set(ON_PATH);
    let outcome = explore(ctx, id, &state, &locs);
    let node = ctx.store.node_mut(id);
    node.clear(ON_PATH);
    if outcome == SearchOutcome::Exhausted {
        node.set(DEAD_END);
    }
    outcome
}

fn explore(
    ctx: &mut SolverContext,
    id: StateId,
    state: &StateData,
    locs: &Locations,
) -> SearchOutcome {
    for group in 0..ctx.rules.group_count() {
        let derived = ctx.expand_group(group, state, locs);
        for cand in &derived {
            let child = match ctx.store.check_and_add(cand, id) {
                AddResult::New(child) => child,
                AddResult::Duplicate(child) => {
                    let node = ctx.store.node(child);
                    if node.parent != Some(id) || node.has(DEAD_END) || node.has(ON_PATH) {
                        continue;
                    }
                    child
                }
                AddResult::Suspend => return SearchOutcome::Suspended,
                AddResult::DepthExceeded => continue,
            };
            match descend(ctx, child) {
                SearchOutcome::Exhausted => {}
                outcome => return outcome,
            }
        }
    }
    SearchOutcome::Exhausted
}
