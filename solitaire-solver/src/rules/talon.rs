use super::{
    Candidate, DerivedStates, TestContext, TestDef, can_fill_empty, first_empty_stack, is_parent,
};
use crate::config::TalonType;
use crate::moves::Move;
use crate::state::{Locations, StateData};

pub const TEST: TestDef = TestDef {
    id: 'a',
    name: "talon",
    run: talon_moves,
};

fn talon_moves(
    ctx: &TestContext<'_>,
    state: &StateData,
    locs: &Locations,
    out: &mut DerivedStates,
) {
    if state.talon.as_ref().is_none_or(|t| t.cards.is_empty()) {
        return;
    }
    match ctx.game.talon {
        TalonType::Klondike => klondike(ctx, state, locs, out),
        TalonType::Gypsy => gypsy(state, locs, out),
        TalonType::None => {}
    }
}

/// Walks the talon once around from the current position and plays each
/// waste card that fits somewhere. The draws leading to a card are part of
/// the move log.
///
/// After a redeal the cursor lands on different positions when the draw
/// count does not divide the talon, so the walk ends only when it comes
/// back to a position it has already examined.
fn klondike(ctx: &TestContext<'_>, state: &StateData, locs: &Locations, out: &mut DerivedStates) {
    let mut walk = Candidate::new(state, locs);
    let mut seen = vec![false; state.talon.as_ref().map_or(0, |t| t.cards.len()) + 1];
    let mut redealt = false;
    loop {
        let Some(talon) = walk.state.talon.as_ref() else {
            break;
        };
        let (cursor, len, redeals) = (talon.cursor, talon.cards.len(), talon.redeals);
        if std::mem::replace(&mut seen[cursor], true) {
            break;
        }
        if let Some(card) = talon.waste_top() {
            if let Some(f) = walk.state.foundation_for(card) {
                let mut c = walk.clone();
                c.push(Move::talon_to_foundation(f));
                out.push(c.finish());
            }
            for s in 0..walk.state.stacks.len() {
                if walk.state.top(s).is_some_and(|top| is_parent(ctx.game, top, card)) {
                    let mut c = walk.clone();
                    c.push(Move::talon_to_stack(s));
                    out.push(c.finish());
                }
            }
            if can_fill_empty(ctx.game, card)
                && let Some(empty) = first_empty_stack(&walk.state, &[])
            {
                let mut c = walk.clone();
                c.push(Move::talon_to_stack(empty));
                out.push(c.finish());
            }
        }

        if cursor < len {
            walk.push(Move::draw());
        } else if !redealt && ctx.game.max_redeals.is_none_or(|max| redeals < max) {
            walk.push(Move::redeal());
            redealt = true;
        } else {
            break;
        }
    }
}

/// Deals one card from the talon onto every column, in column order.
fn gypsy(state: &StateData, locs: &Locations, out: &mut DerivedStates) {
    let available = state.talon.as_ref().map_or(0, |t| t.cards.len());
    let mut c = Candidate::new(state, locs);
    for column in 0..state.stacks.len().min(available) {
        let Some(s) = locs.stacks.iter().position(|&l| l as usize == column) else {
            continue;
        };
        c.push(Move::gypsy_deal(s));
    }
    out.push(c.finish());
}
