//! Tests of Simple Simon.
//!
//! Any card may be placed on a card one rank higher (a false parent), but
//! only runs of one suit (built on true parents) move together.
use super::{
    Candidate, DerivedStates, TestContext, TestDef, can_fill_empty, first_empty_stack,
    first_face_up, move_sequence,
};
use crate::config::GameConfig;
use crate::moves::Move;
use crate::state::{Locations, StateData};

use solitaire_common::board::Stack;
use solitaire_common::card::{Card, MAX_RANK, MAX_SUIT};

pub const TESTS: [TestDef; 9] = [
    TestDef {
        id: '0',
        name: "suit run to foundation",
        run: run_to_foundation,
    },
    TestDef {
        id: '1',
        name: "run to a true parent",
        run: run_to_true_parent,
    },
    TestDef {
        id: '2',
        name: "whole run to a false parent",
        run: whole_run_to_false_parent,
    },
    TestDef {
        id: '3',
        name: "buried run to a true parent",
        run: buried_run_to_true_parent,
    },
    TestDef {
        id: '4',
        name: "run to a buried true parent",
        run: run_to_buried_true_parent,
    },
    TestDef {
        id: '5',
        name: "buried run to a buried true parent",
        run: buried_run_to_buried_parent,
    },
    TestDef {
        id: '6',
        name: "bottom run to a false parent",
        run: bottom_run_to_false_parent,
    },
    TestDef {
        id: '7',
        name: "run to a true parent on the same stack",
        run: run_to_same_stack,
    },
    TestDef {
        id: '8',
        name: "run to a false parent or empty stack",
        run: run_to_false_parent_or_empty,
    },
];

fn true_parent(parent: Card, child: Card) -> bool {
    false_parent(parent, child) && parent.suit() == child.suit()
}

fn false_parent(parent: Card, child: Card) -> bool {
    !parent.is_face_down() && !child.is_face_down() && parent.rank() == child.rank() + 1
}

/// Lowest index of the suit run ending at `top`.
fn run_start(stack: &Stack, top: usize) -> Option<usize> {
    if stack[top].is_face_down() {
        return None;
    }
    let mut h = top;
    while h > 0 && true_parent(stack[h - 1], stack[h]) {
        h -= 1;
    }
    Some(h)
}

fn top_run(stack: &Stack) -> Option<usize> {
    stack.len().checked_sub(1).and_then(|top| run_start(stack, top))
}

/// Whether the run containing `e` ends there.
fn run_ends_at(stack: &Stack, e: usize) -> bool {
    e + 1 >= stack.len() || !true_parent(stack[e], stack[e + 1])
}

fn top_is(state: &StateData, stack: usize, test: impl Fn(Card) -> bool) -> bool {
    state.top(stack).is_some_and(test)
}

/// Where a run based on `base` can be parked: a true parent, a false parent
/// or an empty stack, in that order of preference.
fn park_dest(game: &GameConfig, state: &StateData, base: Card, skip: &[usize]) -> Option<usize> {
    let open = |d: &usize| !skip.contains(d);
    let stacks = 0..state.stacks.len();
    stacks
        .clone()
        .filter(open)
        .find(|&d| top_is(state, d, |t| true_parent(t, base)))
        .or_else(|| {
            stacks
                .filter(open)
                .find(|&d| top_is(state, d, |t| false_parent(t, base)))
        })
        .or_else(|| {
            can_fill_empty(game, base)
                .then(|| first_empty_stack(state, skip))
                .flatten()
        })
}

/// Moves the top `count` cards of `stack` away run by run, each within the
/// sequence-move capacity.
fn relocate_runs(
    c: &mut Candidate,
    game: &GameConfig,
    stack: usize,
    count: usize,
    keep: &[usize],
) -> bool {
    let Some(target) = c.state.stack_len(stack).checked_sub(count) else {
        return false;
    };
    let mut skip = keep.to_vec();
    skip.push(stack);
    while c.state.stack_len(stack) > target {
        let len = c.state.stack_len(stack);
        let Some(h) = top_run(&c.state.stacks[stack]) else {
            return false;
        };
        let h = h.max(target);
        let base = c.state.stack_card(stack, h);
        let Some(dest) = park_dest(game, &c.state, base, &skip) else {
            return false;
        };
        if !move_sequence(c, game, stack, dest, len - h) {
            return false;
        }
    }
    true
}

fn run_to_foundation(
    _ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    let full = MAX_RANK as usize;
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        if len < full || top_run(stack).is_none_or(|h| h > len - full) {
            continue;
        }
        let king = stack[len - full];
        if !king.is_king() {
            continue;
        }
        let Some(f) = (king.suit() as usize..state.foundations.len())
            .step_by(MAX_SUIT as usize)
            .find(|&f| state.foundation(f) == 0)
        else {
            continue;
        };
        let mut c = Candidate::new(state, locs);
        c.push(Move::sequence_to_foundation(s, f));
        out.push(c.finish());
    }
}

fn run_to_true_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let Some(h0) = top_run(stack) else {
            continue;
        };
        for h in h0..stack.len() {
            for d in 0..state.stacks.len() {
                if d == s || !top_is(state, d, |t| true_parent(t, stack[h])) {
                    continue;
                }
                let mut c = Candidate::new(state, locs);
                if move_sequence(&mut c, ctx.game, s, d, stack.len() - h) {
                    out.push(c.finish());
                }
            }
        }
    }
}

/// A whole top run onto a false parent, unless it already sits on one.
fn whole_run_to_false_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let Some(h) = top_run(stack) else {
            continue;
        };
        if h > 0 && false_parent(stack[h - 1], stack[h]) {
            continue;
        }
        for d in 0..state.stacks.len() {
            if d == s
                || !top_is(state, d, |t| {
                    false_parent(t, stack[h]) && !true_parent(t, stack[h])
                })
            {
                continue;
            }
            let mut c = Candidate::new(state, locs);
            if move_sequence(&mut c, ctx.game, s, d, stack.len() - h) {
                out.push(c.finish());
            }
        }
    }
}

/// A run covered by other runs moves onto a true parent once the runs above
/// it are parked.
fn buried_run_to_true_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        for e in first_face_up(stack)..len.saturating_sub(1) {
            if !run_ends_at(stack, e) {
                continue;
            }
            let Some(h0) = run_start(stack, e) else {
                continue;
            };
            for h in h0..=e {
                for d in 0..state.stacks.len() {
                    if d == s || !top_is(state, d, |t| true_parent(t, stack[h])) {
                        continue;
                    }
                    let mut c = Candidate::new(state, locs);
                    if relocate_runs(&mut c, ctx.game, s, len - 1 - e, &[d])
                        && move_sequence(&mut c, ctx.game, s, d, e - h + 1)
                    {
                        out.push(c.finish());
                    }
                }
            }
        }
    }
}

fn run_to_buried_true_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let Some(h0) = top_run(stack) else {
            continue;
        };
        for h in h0..stack.len() {
            for (d, dest) in state.stacks.iter().enumerate() {
                if d == s {
                    continue;
                }
                for p in first_face_up(dest)..dest.len().saturating_sub(1) {
                    if !true_parent(dest[p], stack[h]) {
                        continue;
                    }
                    let mut c = Candidate::new(state, locs);
                    if relocate_runs(&mut c, ctx.game, d, dest.len() - 1 - p, &[s])
                        && move_sequence(&mut c, ctx.game, s, d, stack.len() - h)
                    {
                        out.push(c.finish());
                    }
                }
            }
        }
    }
}

fn buried_run_to_buried_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        for e in first_face_up(stack)..len.saturating_sub(1) {
            if !run_ends_at(stack, e) {
                continue;
            }
            let Some(h0) = run_start(stack, e) else {
                continue;
            };
            for h in h0..=e {
                for (d, dest) in state.stacks.iter().enumerate() {
                    if d == s {
                        continue;
                    }
                    for p in first_face_up(dest)..dest.len().saturating_sub(1) {
                        if !true_parent(dest[p], stack[h]) {
                            continue;
                        }
                        let mut c = Candidate::new(state, locs);
                        if relocate_runs(&mut c, ctx.game, s, len - 1 - e, &[d])
                            && relocate_runs(&mut c, ctx.game, d, dest.len() - 1 - p, &[s])
                            && move_sequence(&mut c, ctx.game, s, d, e - h + 1)
                        {
                            out.push(c.finish());
                        }
                    }
                }
            }
        }
    }
}

/// Empties a stack whose bottom is one run by parking the runs above it and
/// moving the bottom run onto a false parent.
fn bottom_run_to_false_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        for e in 0..len.saturating_sub(1) {
            if !run_ends_at(stack, e) || run_start(stack, e) != Some(0) {
                continue;
            }
            for d in 0..state.stacks.len() {
                if d == s || !top_is(state, d, |t| false_parent(t, stack[0])) {
                    continue;
                }
                let mut c = Candidate::new(state, locs);
                if relocate_runs(&mut c, ctx.game, s, len - 1 - e, &[d])
                    && move_sequence(&mut c, ctx.game, s, d, e + 1)
                {
                    out.push(c.finish());
                }
            }
        }
    }
}

fn run_to_same_stack(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    if ctx.free_stacks == 0 {
        return;
    }
    for (s, stack) in state.stacks.iter().enumerate() {
        let Some(h0) = top_run(stack) else {
            continue;
        };
        let len = stack.len();
        for h in h0..len {
            for p in first_face_up(stack)..h.saturating_sub(1) {
                if !true_parent(stack[p], stack[h]) {
                    continue;
                }
                let mut c = Candidate::new(state, locs);
                let Some(park) = first_empty_stack(&c.state, &[s]) else {
                    continue;
                };
                if move_sequence(&mut c, ctx.game, s, park, len - h)
                    && relocate_runs(&mut c, ctx.game, s, h - 1 - p, &[park])
                    && move_sequence(&mut c, ctx.game, park, s, len - h)
                {
                    out.push(c.finish());
                }
            }
        }
    }
}

fn run_to_false_parent_or_empty(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let Some(h) = top_run(stack) else {
            continue;
        };
        let base = stack[h];
        let count = stack.len() - h;
        for d in 0..state.stacks.len() {
            if d == s || !top_is(state, d, |t| false_parent(t, base) && !true_parent(t, base)) {
                continue;
            }
            let mut c = Candidate::new(state, locs);
            if move_sequence(&mut c, ctx.game, s, d, count) {
                out.push(c.finish());
            }
        }
        if h > 0
            && let Some(empty) = first_empty_stack(state, &[])
        {
            let mut c = Candidate::new(state, locs);
            if move_sequence(&mut c, ctx.game, s, empty, count) {
                out.push(c.finish());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{check_candidates, state_of};
    use super::*;
    use crate::moves::MoveKind;

    fn run(test: usize, board: &str) -> DerivedStates {
        run_with(&GameConfig::preset("simple-simon").unwrap(), test, board)
    }

    fn run_with(game: &GameConfig, test: usize, board: &str) -> DerivedStates {
        let (state, locs) = state_of(board);
        let ctx = TestContext {
            game,
            free_cells: state.free_freecells(),
            free_stacks: state.free_stacks(),
        };
        let mut out = DerivedStates::new();
        (TESTS[test].run)(&ctx, &state, &locs, &mut out);
        check_candidates(&state, &out);
        out
    }

    fn kinds(c: &Candidate) -> Vec<MoveKind> {
        c.moves
            .iter()
            .map(|m| m.kind)
            .filter(|k| *k != MoveKind::Canonize)
            .collect()
    }

    #[test]
    fn test_run_to_foundation() {
        let out = run(
            0,
            "Foundations: H-0 C-K D-K S-K
: KH QH JH TH 9H 8H 7H 6H 5H 4H 3H 2H AH
:
",
        );
        assert_eq!(out.len(), 1);
        assert!(out[0].state.is_solved());
        assert!(out[0].state.stacks[0].is_empty());
    }

    const LOOSE: &str = "Foundations: H-0 C-0 D-0 S-0
: 5S 4H
: 5H
: 6C
:
";

    #[test]
    fn test_top_runs() {
        // 4H onto 5H.
        let out = run(1, LOOSE);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.stacks[1].len(), 2);

        // 5H onto 6C; 4H already sits on a false parent.
        let out = run(2, LOOSE);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.stacks[2].len(), 2);

        // 5H onto 6C, and 4H into the empty stack.
        let out = run(8, LOOSE);
        assert_eq!(out.len(), 2);
        assert!(out.iter().any(|c| c.state.free_stacks() == 0));
    }

    #[test]
    fn test_buried_run_to_true_parent() {
        let out = run(
            3,
            "Foundations: H-0 C-0 D-0 S-0
: 6D 5D 9S
: 7D
: TC
",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(kinds(&out[0]), [MoveKind::StackToStack, MoveKind::StackToStack]);
        assert_eq!(out[0].state.stacks[1].len(), 3);
        assert!(out[0].state.stacks[0].is_empty());
    }

    #[test]
    fn test_parked_runs_respect_capacity() {
        // Parking 9S 8S on TC is a two-card move with no free slot.
        let board = "Foundations: H-0 C-0 D-0 S-0
: 5D 9S 8S
: 6D
: TC
";
        let out = run(3, board);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.stacks[2].len(), 3);

        let mut game = GameConfig::preset("simple-simon").unwrap();
        game.unlimited_sequence_move = false;
        assert!(run_with(&game, 3, board).is_empty());
    }

    #[test]
    fn test_run_to_buried_true_parent() {
        let out = run(
            4,
            "Foundations: H-0 C-0 D-0 S-0
: 4C
: 5C 9H
: TD
",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.stacks[1].len(), 2);
        assert_eq!(out[0].state.stacks[2].len(), 2);
    }

    #[test]
    fn test_buried_run_to_buried_parent() {
        let out = run(
            5,
            "Foundations: H-0 C-0 D-0 S-0
: 4C 9H
: 5C 8D
: TS
: 9S
",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(kinds(&out[0]).len(), 3);
        assert!(out[0].state.stacks[0].is_empty());
        assert_eq!(out[0].state.stacks[1].len(), 2);
    }

    #[test]
    fn test_bottom_run_to_false_parent() {
        let out = run(
            6,
            "Foundations: H-0 C-0 D-0 S-0
: 8S 7S 3H
: 9D
: 4D
",
        );
        assert_eq!(out.len(), 1);
        assert!(out[0].state.stacks[0].is_empty());
        assert_eq!(out[0].state.stacks[1].len(), 3);
    }

    #[test]
    fn test_run_to_same_stack() {
        let out = run(
            7,
            "Foundations: H-0 C-0 D-0 S-0
: 6H 9C 5H
:
: TD
",
        );
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].state.stacks[0].len(), 2);
        assert!(out[0].state.stacks[1].is_empty());
        assert_eq!(kinds(&out[0]).len(), 3);
    }
}
