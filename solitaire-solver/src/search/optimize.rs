use super::SolverContext;
use crate::store::{IN_OPTIMIZED, IN_SOLUTION, StateId};

use log::debug;
use std::collections::VecDeque;

/// Shortens a found solution with a breadth-first search from the root that
/// only enters states of the current solution path. A path state reached at
/// a lower depth is re-parented onto the shorter route.
///
/// Returns the solved state, whose parent chain now follows the shortest
/// route through the path states.
pub fn optimize(ctx: &mut SolverContext, solved: StateId) -> StateId {
    let mut path_len = 0;
    let mut id = Some(solved);
    while let Some(current) = id {
        let node = ctx.store.node_mut(current);
        node.set(IN_SOLUTION);
        id = node.parent;
        path_len += 1;
    }

    let root = ctx.root;
    ctx.store.node_mut(root).set(IN_OPTIMIZED);
    let mut queue = VecDeque::from([root]);
    let mut expanded = 0usize;
    while let Some(id) = queue.pop_front() {
        if id == solved {
            break;
        }
        expanded += 1;
        let depth = ctx.store.node(id).depth;
        let (state, locs) = ctx.store.decode(id);
        for cand in ctx.expand_all(&state, &locs) {
            let (found, cand_locs) = ctx.store.find(&cand);
            let Some(child) = found else {
                continue;
            };
            let node = ctx.store.node_mut(child);
            if !node.has(IN_SOLUTION) || node.has(IN_OPTIMIZED) {
                continue;
            }
            node.parent = Some(id);
            node.moves = cand.moves;
            node.depth = depth + 1;
            node.locs = cand_locs;
            node.set(IN_OPTIMIZED);
            queue.push_back(child);
        }
    }

    debug!(
        "Optimized a path of {path_len} states to {} after expanding {expanded}",
        ctx.store.node(solved).depth + 1
    );
    solved
}
