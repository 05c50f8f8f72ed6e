use crate::moves::{Move, MoveKind};
use crate::search::SolverContext;
use crate::state::{Locations, StateData};
use crate::store::StateId;

use solitaire_common::action::Action;

/// Replays the moves leading to `solved` against the initial deal and
/// returns them in the deal's own stack and freecell positions.
pub fn extract(ctx: &SolverContext, initial: &StateData, solved: StateId) -> Vec<Action> {
    let mut logs = Vec::new();
    let mut id = solved;
    while let Some(parent) = ctx.store.node(id).parent {
        logs.push(&ctx.store.node(id).moves);
        id = parent;
    }
    logs.reverse();

    let mut scratch = initial.clone();
    let mut locs = Locations::identity(scratch.stacks.len(), scratch.freecells.len());
    scratch.canonicalize(&mut locs);

    let mut actions = Vec::new();
    let mut dealing = false;
    for &mv in logs.into_iter().flatten() {
        match mv.kind {
            MoveKind::Canonize => {
                scratch.canonicalize(&mut locs);
                dealing = false;
                continue;
            }
            MoveKind::GypsyDeal => {
                if !dealing {
                    actions.push(Action::DealGypsyTalon);
                    dealing = true;
                }
            }
            _ => {
                actions.extend(to_action(mv, &locs));
                dealing = false;
            }
        }
        scratch.apply_move(mv);
    }
    debug_assert!(scratch.is_solved());
    actions
}

fn to_action(mv: Move, locs: &Locations) -> Option<Action> {
    let (src, dest) = (mv.src as usize, mv.dest as usize);
    let action = match mv.kind {
        MoveKind::StackToFoundation => Action::StackToFoundation(locs.stack(src), dest),
        MoveKind::FreecellToFoundation => Action::FreecellToFoundation(locs.freecell(src), dest),
        MoveKind::SequenceToFoundation => Action::SequenceToFoundation(locs.stack(src), dest),
        MoveKind::StackToFreecell => Action::StackToFreecell(locs.stack(src), locs.freecell(dest)),
        MoveKind::FreecellToStack => Action::FreecellToStack(locs.freecell(src), locs.stack(dest)),
        MoveKind::StackToStack => {
            Action::StackToStack(locs.stack(src), locs.stack(dest), mv.count as usize)
        }
        MoveKind::FlipCard => Action::FlipCard(locs.stack(src)),
        MoveKind::Draw => Action::Draw,
        MoveKind::Redeal => Action::Redeal,
        MoveKind::TalonToFoundation => Action::TalonToFoundation(dest),
        MoveKind::TalonToStack => Action::TalonToStack(locs.stack(dest)),
        MoveKind::GypsyDeal => Action::DealGypsyTalon,
        MoveKind::Canonize => return None,
    };
    Some(action)
}
