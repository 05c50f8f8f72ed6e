use super::{SearchOutcome, SearchStrategy, SolverContext};
use crate::rules::DerivedStates;
use crate::state::{Locations, StateData};
use crate::store::{AddResult, DEAD_END, StateId};

const FRAME_STEP: usize = 16;

/// The linear congruential generator of the Microsoft C runtime.
#[derive(Debug, Clone)]
pub struct MsRandom {
    seed: u64,
}

impl MsRandom {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    pub fn next(&mut self) -> u32 {
        self.seed = self.seed.wrapping_mul(214013).wrapping_add(2531011);
        ((self.seed >> 16) & 0x7fff) as u32
    }

    /// Fisher-Yates shuffle driven by [`MsRandom::next`].
    pub fn shuffle<T>(&mut self, items: &mut [T]) {
        for i in (1..items.len()).rev() {
            let j = self.next() as usize % (i + 1);
            items.swap(i, j);
        }
    }
}

#[derive(Debug)]
struct Frame {
    id: StateId,
    state: StateData,
    locs: Locations,
    /// Next test group to run.
    group: usize,
    derived: DerivedStates,
    /// Next derived state to check.
    next: usize,
}

/// Iterative depth-first search over an explicit frame stack. With a
/// generator it becomes random DFS: the results of random test groups are
/// shuffled before they are tried.
#[derive(Debug)]
pub struct SoftDfs {
    frames: Vec<Frame>,
    rng: Option<MsRandom>,
    started: bool,
}

impl SoftDfs {
    pub fn new(seed: Option<u64>) -> Self {
        Self {
            frames: Vec::new(),
            rng: seed.map(MsRandom::new),
            started: false,
        }
    }

    /// Visits `id` and pushes its frame. Returns whether it is solved.
    fn enter(&mut self, ctx: &mut SolverContext, id: StateId) -> bool {
        let (state, locs) = ctx.visit(id);
        let solved = state.is_solved();
        if self.frames.len() == self.frames.capacity() {
            self.frames.reserve(FRAME_STEP);
        }
        self.frames.push(Frame {
            id,
            state,
            locs,
            group: 0,
            derived: DerivedStates::new(),
            next: 0,
        });
        solved
    }
}

impl SearchStrategy for SoftDfs {
    fn run(&mut self, ctx: &mut SolverContext) -> SearchOutcome {
        if !self.started {
            self.started = true;
            let root = ctx.root;
            if self.enter(ctx, root) {
                return SearchOutcome::Solved(root);
            }
        }
        loop {
            if ctx.store.limits_reached() {
                return SearchOutcome::Suspended;
            }
            let Some(frame) = self.frames.last_mut() else {
                return SearchOutcome::Exhausted;
            };

            if frame.next < frame.derived.len() {
                match ctx.store.check_and_add(&frame.derived[frame.next], frame.id) {
                    AddResult::Suspend => return SearchOutcome::Suspended,
                    AddResult::New(child) => {
                        frame.next += 1;
                        if self.enter(ctx, child) {
                            return SearchOutcome::Solved(child);
                        }
                    }
                    AddResult::Duplicate(_) | AddResult::DepthExceeded => frame.next += 1,
                }
                continue;
            }

            if frame.group < ctx.rules.group_count() {
                let group = frame.group;
                frame.derived = ctx.expand_group(group, &frame.state, &frame.locs);
                frame.group += 1;
                frame.next = 0;
                if ctx.rules.groups()[group].random
                    && let Some(rng) = self.rng.as_mut()
                {
                    rng.shuffle(&mut frame.derived);
                }
                continue;
            }

            ctx.store.node_mut(frame.id).set(DEAD_END);
            self.frames.pop();
        }
    }
}
