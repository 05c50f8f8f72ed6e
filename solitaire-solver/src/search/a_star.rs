use super::bfs::Pending;
use super::{SearchOutcome, SearchStrategy, SolverContext};
use crate::config::GameConfig;
use crate::rules::{capacity, first_face_up, is_parent, seq_start};
use crate::state::StateData;
use crate::store::{AddResult, StateId};

use solitaire_common::card::CARDS_PER_DECK;
use std::cmp::Ordering;
use std::collections::BinaryHeap;

const DEPTH_HORIZON: u32 = 20_000;
const EXPONENT: f64 = 1.3;
const SCALE: f64 = 1_000_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Entry {
    rating: i64,
    seq: u64,
    id: StateId,
}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rating
            .cmp(&other.rating)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Best-first search. Each stored state is rated by five weighted features
/// and the highest rating is expanded next; equal ratings pop in insertion
/// order.
#[derive(Debug)]
pub struct AStar {
    heap: BinaryHeap<Entry>,
    pending: Option<Pending>,
    weights: [f64; 5],
    seq: u64,
    /// Root values of the features measured against the initial deal.
    initial_under: f64,
    initial_renegades: f64,
    started: bool,
}

impl AStar {
    pub fn new(weights: [f64; 5]) -> Self {
        Self {
            heap: BinaryHeap::new(),
            pending: None,
            weights,
            seq: 0,
            initial_under: 1.0,
            initial_renegades: 1.0,
            started: false,
        }
    }

    fn push(&mut self, id: StateId, rating: i64) {
        self.heap.push(Entry {
            rating,
            seq: self.seq,
            id,
        });
        self.seq += 1;
    }

    fn rate(&self, game: &GameConfig, state: &StateData, depth: u32) -> i64 {
        let total_cards = (game.decks * CARDS_PER_DECK) as f64;
        let cards_out = state.cards_out() as f64 / total_cards;

        let moves = |cells: usize, stacks: usize| (cells as f64 + 1.0) * 2f64.powi(stacks as i32);
        let capacity_ratio = if game.unlimited_sequence_move {
            let free = state.free_freecells() + state.free_stacks();
            free as f64 / (game.freecells + game.stacks) as f64
        } else {
            let now = capacity(game, state.free_freecells(), state.free_stacks()) as f64;
            now / moves(game.freecells, game.stacks)
        };

        let under = 1.0 - cards_under_sequences(game, state) / self.initial_under;
        let renegades = 1.0 - sequences_over_renegades(game, state) / self.initial_renegades;
        let depth = (DEPTH_HORIZON - depth.min(DEPTH_HORIZON)) as f64 / DEPTH_HORIZON as f64;

        let features = [cards_out, capacity_ratio, under, renegades, depth];
        let rating: f64 = features
            .iter()
            .zip(self.weights)
            .map(|(f, w)| f * w)
            .sum();
        (rating * SCALE) as i64
    }
}

/// Cards below the movable sequence of each stack.
fn cards_under_sequences(game: &GameConfig, state: &StateData) -> f64 {
    state
        .stacks
        .iter()
        .map(|stack| (seq_start(game, stack) as f64).powf(EXPONENT))
        .sum()
}

/// Breaks in the face-up part of each stack, where a card does not sit on
/// its parent.
fn sequences_over_renegades(game: &GameConfig, state: &StateData) -> f64 {
    state
        .stacks
        .iter()
        .map(|stack| {
            let first = first_face_up(stack);
            let breaks = (first + 1..stack.len())
                .filter(|&i| !is_parent(game, stack[i - 1], stack[i]))
                .count()
                + first;
            (breaks as f64).powf(EXPONENT)
        })
        .sum()
}

impl SearchStrategy for AStar {
    fn run(&mut self, ctx: &mut SolverContext) -> SearchOutcome {
        if !self.started {
            self.started = true;
            let (state, _) = ctx.store.decode(ctx.root);
            self.initial_under = cards_under_sequences(&ctx.config.game, &state).max(1.0);
            self.initial_renegades = sequences_over_renegades(&ctx.config.game, &state).max(1.0);
            let rating = self.rate(&ctx.config.game, &state, 0);
            self.push(ctx.root, rating);
        }
        loop {
            if let Some(mut pending) = self.pending.take() {
                while pending.next < pending.derived.len() {
                    let cand = &pending.derived[pending.next];
                    match ctx.store.check_and_add(cand, pending.parent) {
                        AddResult::Suspend => {
                            self.pending = Some(pending);
                            return SearchOutcome::Suspended;
                        }
                        AddResult::New(child) => {
                            let depth = ctx.store.node(child).depth;
                            let rating = self.rate(&ctx.config.game, &cand.state, depth);
                            self.push(child, rating);
                        }
                        AddResult::Duplicate(_) | AddResult::DepthExceeded => {}
                    }
                    pending.next += 1;
                }
            }

            if ctx.store.limits_reached() {
                return SearchOutcome::Suspended;
            }
            let Some(entry) = self.heap.pop() else {
                return SearchOutcome::Exhausted;
            };
            let (state, locs) = ctx.visit(entry.id);
            if state.is_solved() {
                return SearchOutcome::Solved(entry.id);
            }
            self.pending = Some(Pending {
                parent: entry.id,
                derived: ctx.expand_all(&state, &locs),
                next: 0,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_order() {
        let mut heap = BinaryHeap::new();
        heap.push(Entry { rating: 5, seq: 0, id: 0 });
        heap.push(Entry { rating: 9, seq: 1, id: 1 });
        heap.push(Entry { rating: 5, seq: 2, id: 2 });
        let order: Vec<_> = std::iter::from_fn(|| heap.pop().map(|e| e.id)).collect();
        assert_eq!(order, [1, 0, 2]);
    }
}
