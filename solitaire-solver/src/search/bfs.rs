use super::{SearchOutcome, SearchStrategy, SolverContext};
use crate::rules::DerivedStates;
use crate::store::{AddResult, StateId};

use std::collections::VecDeque;

/// Derived states of one visited state that still have to be checked.
#[derive(Debug, Default)]
pub(super) struct Pending {
    pub parent: StateId,
    pub derived: DerivedStates,
    pub next: usize,
}

/// Breadth-first search. States are visited in order of depth, so the first
/// solved state found has the fewest steps from the root.
#[derive(Debug, Default)]
pub struct Bfs {
    queue: VecDeque<StateId>,
    pending: Option<Pending>,
    started: bool,
}

impl SearchStrategy for Bfs {
    fn run(&mut self, ctx: &mut SolverContext) -> SearchOutcome {
        if !self.started {
            self.started = true;
            self.queue.push_back(ctx.root);
        }
        loop {
            if let Some(pending) = self.pending.as_mut() {
                while pending.next < pending.derived.len() {
                    match ctx.store.check_and_add(&pending.derived[pending.next], pending.parent) {
                        AddResult::Suspend => return SearchOutcome::Suspended,
                        AddResult::New(child) => self.queue.push_back(child),
                        AddResult::Duplicate(_) | AddResult::DepthExceeded => {}
                    }
                    pending.next += 1;
                }
                self.pending = None;
            }

            if ctx.store.limits_reached() {
                return SearchOutcome::Suspended;
            }
            let Some(id) = self.queue.pop_front() else {
                return SearchOutcome::Exhausted;
            };
            let (state, locs) = ctx.visit(id);
            if state.is_solved() {
                return SearchOutcome::Solved(id);
            }
            self.pending = Some(Pending {
                parent: id,
                derived: ctx.expand_all(&state, &locs),
                next: 0,
            });
        }
    }
}
