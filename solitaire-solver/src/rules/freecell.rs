//! Tests of the FreeCell family.
use super::{
    Candidate, DerivedStates, TestContext, TestDef, can_fill_empty, capacity, first_empty_stack,
    first_face_up, is_parent, move_sequence, relocate_singles, seq_end, seq_start,
};
use crate::moves::Move;
use crate::state::{Locations, StateData};

pub const TESTS: [TestDef; 10] = [
    TestDef {
        id: '0',
        name: "top card to foundation",
        run: top_card_to_foundation,
    },
    TestDef {
        id: '1',
        name: "freecell to foundation",
        run: freecell_to_foundation,
    },
    TestDef {
        id: '2',
        name: "freecell to parent",
        run: freecell_to_parent,
    },
    TestDef {
        id: '3',
        name: "buried card to foundation",
        run: buried_card_to_foundation,
    },
    TestDef {
        id: '4',
        name: "sequence to a parent on another stack",
        run: sequence_to_other_stack,
    },
    TestDef {
        id: '5',
        name: "sequence to a parent on the same stack",
        run: sequence_to_same_stack,
    },
    TestDef {
        id: '6',
        name: "sequence to empty stack",
        run: sequence_to_empty_stack,
    },
    TestDef {
        id: '7',
        name: "freecell to empty stack",
        run: freecell_to_empty_stack,
    },
    TestDef {
        id: '8',
        name: "sequence to a buried parent",
        run: sequence_to_buried_parent,
    },
    TestDef {
        id: '9',
        name: "whole stack to freecells",
        run: stack_to_freecells,
    },
];

fn top_card_to_foundation(
    _ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for s in 0..state.stacks.len() {
        let Some(card) = state.top(s) else {
            continue;
        };
        if let Some(f) = state.foundation_for(card) {
            let mut c = Candidate::new(state, locs);
            c.push(Move::stack_to_foundation(s, f));
            out.push(c.finish());
        }
    }
}

fn freecell_to_foundation(
    _ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (cell, &card) in state.freecells.iter().enumerate() {
        if let Some(f) = state.foundation_for(card) {
            let mut c = Candidate::new(state, locs);
            c.push(Move::freecell_to_foundation(cell, f));
            out.push(c.finish());
        }
    }
}

fn freecell_to_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (cell, &card) in state.freecells.iter().enumerate() {
        if card.is_empty() {
            continue;
        }
        for s in 0..state.stacks.len() {
            if state.top(s).is_some_and(|top| is_parent(ctx.game, top, card)) {
                let mut c = Candidate::new(state, locs);
                c.push(Move::freecell_to_stack(cell, s));
                out.push(c.finish());
            }
        }
    }
}

/// A card that could go to the foundation once the cards above it are moved
/// to freecells and empty stacks.
fn buried_card_to_foundation(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    let room = ctx.free_cells + ctx.free_stacks;
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        if len < 2 {
            continue;
        }
        for h in first_face_up(stack)..len - 1 {
            let junk = len - 1 - h;
            if junk > room {
                continue;
            }
            let Some(f) = state.foundation_for(stack[h]) else {
                continue;
            };
            let mut c = Candidate::new(state, locs);
            if !relocate_singles(&mut c, ctx.game, s, junk, &[s]) {
                continue;
            }
            c.push(Move::stack_to_foundation(s, f));
            out.push(c.finish());
        }
    }
}

/// A card and the sequence above it onto a parent at the top of another
/// stack. Cards above the sequence are moved out of the way first.
fn sequence_to_other_stack(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    let room = ctx.free_cells + ctx.free_stacks;
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        for h in first_face_up(stack)..len {
            let e = seq_end(ctx.game, stack, h);
            let junk = len - 1 - e;
            if junk > room {
                continue;
            }
            let count = e - h + 1;
            for d in 0..state.stacks.len() {
                if d == s || !state.top(d).is_some_and(|top| is_parent(ctx.game, top, stack[h])) {
                    continue;
                }
                if junk == 0 && count > capacity(ctx.game, ctx.free_cells, ctx.free_stacks) {
                    continue;
                }
                let mut c = Candidate::new(state, locs);
                if !relocate_singles(&mut c, ctx.game, s, junk, &[s, d]) {
                    continue;
                }
                if move_sequence(&mut c, ctx.game, s, d, count) {
                    out.push(c.finish());
                }
            }
        }
    }
}

/// The sequence on top of a stack is parked in an empty stack, the cards
/// between it and a parent lower in the same stack are moved away, and the
/// sequence is put back on the parent.
fn sequence_to_same_stack(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    if ctx.free_stacks == 0 {
        return;
    }
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        let first = first_face_up(stack);
        for h in seq_start(ctx.game, stack)..len {
            let count = len - h;
            for p in first..h.saturating_sub(1) {
                if !is_parent(ctx.game, stack[p], stack[h]) {
                    continue;
                }
                let junk = h - 1 - p;
                let mut c = Candidate::new(state, locs);
                let Some(park) = first_empty_stack(&c.state, &[s]) else {
                    continue;
                };
                if !move_sequence(&mut c, ctx.game, s, park, count)
                    || !relocate_singles(&mut c, ctx.game, s, junk, &[s, park])
                    || !move_sequence(&mut c, ctx.game, park, s, count)
                {
                    continue;
                }
                out.push(c.finish());
            }
        }
    }
}

/// The largest movable sequence that is not a whole stack into an empty
/// stack.
fn sequence_to_empty_stack(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    let Some(empty) = first_empty_stack(state, &[]) else {
        return;
    };
    let max = capacity(ctx.game, ctx.free_cells, ctx.free_stacks - 1);
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        if len == 0 {
            continue;
        }
        let mut h = seq_start(ctx.game, stack).max(len.saturating_sub(max));
        if h == 0 {
            h = 1;
        }
        while h < len && !can_fill_empty(ctx.game, stack[h]) {
            h += 1;
        }
        if h >= len {
            continue;
        }
        let mut c = Candidate::new(state, locs);
        if move_sequence(&mut c, ctx.game, s, empty, len - h) {
            out.push(c.finish());
        }
    }
}

fn freecell_to_empty_stack(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    let Some(empty) = first_empty_stack(state, &[]) else {
        return;
    };
    for (cell, &card) in state.freecells.iter().enumerate() {
        if !card.is_empty() && can_fill_empty(ctx.game, card) {
            let mut c = Candidate::new(state, locs);
            c.push(Move::freecell_to_stack(cell, empty));
            out.push(c.finish());
        }
    }
}

/// A sequence that already sits on a parent moves onto a parent buried in
/// another stack, whose covering cards are moved away first.
fn sequence_to_buried_parent(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    let room = ctx.free_cells + ctx.free_stacks;
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        for h in seq_start(ctx.game, stack) + 1..len {
            let count = len - h;
            for (d, dest) in state.stacks.iter().enumerate() {
                if d == s || dest.len() < 2 {
                    continue;
                }
                for p in first_face_up(dest)..dest.len() - 1 {
                    let junk = dest.len() - 1 - p;
                    if junk > room || !is_parent(ctx.game, dest[p], stack[h]) {
                        continue;
                    }
                    let mut c = Candidate::new(state, locs);
                    if relocate_singles(&mut c, ctx.game, d, junk, &[s, d])
                        && move_sequence(&mut c, ctx.game, s, d, count)
                    {
                        out.push(c.finish());
                    }
                }
            }
        }
    }
}

fn stack_to_freecells(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    for (s, stack) in state.stacks.iter().enumerate() {
        let len = stack.len();
        if len == 0 || len > ctx.free_cells || first_face_up(stack) != 0 {
            continue;
        }
        let mut c = Candidate::new(state, locs);
        for _ in 0..len {
            let Some(cell) = c.state.first_free_freecell() else {
                break;
            };
            c.push(Move::stack_to_freecell(s, cell));
        }
        out.push(c.finish());
    }
}
