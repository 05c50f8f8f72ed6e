//! Working representation of one board configuration.
mod encoding;
mod stacks;

pub use self::encoding::{StateFactory, StateKey};
pub use self::stacks::StackTable;

use crate::error::InvalidState;
use crate::moves::{Move, MoveKind};

use smallvec::SmallVec;
use solitaire_common::board::{Board, Stack, Talon};
use solitaire_common::card::{CARDS_PER_DECK, Card, MAX_RANK, MAX_SUIT};

pub type Stacks = SmallVec<[Stack; 10]>;

/// Physical position of every canonical stack and freecell.
///
/// `stacks[i]` is the column of the original deal that canonical stack `i`
/// descends from; canonicalization permutes these maps together with the
/// containers they describe.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Locations {
    pub stacks: SmallVec<[u8; 16]>,
    pub freecells: SmallVec<[u8; 16]>,
}

impl Locations {
    pub fn identity(stacks: usize, freecells: usize) -> Self {
        Self {
            stacks: (0..stacks as u8).collect(),
            freecells: (0..freecells as u8).collect(),
        }
    }

    pub fn stack(&self, idx: usize) -> usize {
        self.stacks[idx] as usize
    }

    pub fn freecell(&self, idx: usize) -> usize {
        self.freecells[idx] as usize
    }
}

/// Stacks, freecells, foundations and talon of one state. Empty freecells
/// hold [`Card::EMPTY`].
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateData {
    pub stacks: Stacks,
    pub freecells: SmallVec<[Card; 8]>,
    pub foundations: SmallVec<[u8; 8]>,
    pub talon: Option<Talon>,
}

impl StateData {
    pub fn from_board(board: &Board) -> Self {
        let mut stacks: Stacks = board.stacks.iter().cloned().collect();
        for stack in stacks.iter_mut() {
            if let Some(top) = stack.last_mut() {
                *top = top.face_up();
            }
        }
        Self {
            stacks,
            freecells: board
                .freecells
                .iter()
                .map(|c| c.unwrap_or(Card::EMPTY))
                .collect(),
            foundations: board.foundations.iter().copied().collect(),
            talon: board.talon.clone(),
        }
    }

    #[inline]
    pub fn stack_len(&self, stack: usize) -> usize {
        self.stacks[stack].len()
    }

    #[inline]
    pub fn stack_card(&self, stack: usize, idx: usize) -> Card {
        self.stacks[stack][idx]
    }

    pub fn set_stack_card(&mut self, stack: usize, idx: usize, card: Card) {
        self.stacks[stack][idx] = card;
    }

    #[inline]
    pub fn top(&self, stack: usize) -> Option<Card> {
        self.stacks[stack].last().copied()
    }

    #[inline]
    pub fn freecell(&self, cell: usize) -> Card {
        self.freecells[cell]
    }

    pub fn set_freecell(&mut self, cell: usize, card: Card) {
        self.freecells[cell] = card;
    }

    #[inline]
    pub fn foundation(&self, idx: usize) -> u8 {
        self.foundations[idx]
    }

    pub fn increment_foundation(&mut self, idx: usize) {
        debug_assert!(self.foundations[idx] < MAX_RANK);
        self.foundations[idx] += 1;
    }

    pub fn push_card(&mut self, stack: usize, card: Card) {
        self.stacks[stack].push(card);
    }

    pub fn pop_card(&mut self, stack: usize) -> Card {
        self.stacks[stack].pop().unwrap_or(Card::EMPTY)
    }

    /// Moves the top `count` cards of `from` onto `to`, keeping their order.
    pub fn move_cards(&mut self, from: usize, to: usize, count: usize) {
        let len = self.stacks[from].len();
        debug_assert!(count <= len && from != to);
        let cards: Stack = self.stacks[from].drain(len - count..).collect();
        self.stacks[to].extend(cards);
    }

    pub fn flip_top(&mut self, stack: usize) {
        if let Some(idx) = self.stack_len(stack).checked_sub(1) {
            let card = self.stack_card(stack, idx);
            self.set_stack_card(stack, idx, card.face_up());
        }
    }

    pub fn free_freecells(&self) -> usize {
        self.freecells.iter().filter(|c| c.is_empty()).count()
    }

    pub fn free_stacks(&self) -> usize {
        self.stacks.iter().filter(|s| s.is_empty()).count()
    }

    pub fn first_free_freecell(&self) -> Option<usize> {
        self.freecells.iter().position(|c| c.is_empty())
    }

    /// Foundation index `card` can be played to.
    pub fn foundation_for(&self, card: Card) -> Option<usize> {
        if card.is_empty() || card.is_face_down() {
            return None;
        }
        let suit = card.suit() as usize;
        (suit..self.foundations.len())
            .step_by(MAX_SUIT as usize)
            .find(|&idx| self.foundations[idx] + 1 == card.rank())
    }

    pub fn is_solved(&self) -> bool {
        self.foundations.iter().all(|&v| v == MAX_RANK)
    }

    pub fn cards_out(&self) -> usize {
        self.foundations.iter().map(|&v| v as usize).sum()
    }

    pub fn card_count(&self) -> usize {
        let in_stacks: usize = self.stacks.iter().map(|s| s.len()).sum();
        let in_cells = self.freecells.iter().filter(|c| !c.is_empty()).count();
        let in_talon = self.talon.as_ref().map_or(0, |t| t.cards.len());
        self.cards_out() + in_stacks + in_cells + in_talon
    }

    /// Applies one move. `Canonize` is a no-op here: the caller owns the
    /// location maps and canonicalizes with them.
    pub fn apply_move(&mut self, mv: Move) {
        let (src, dest) = (mv.src as usize, mv.dest as usize);
        match mv.kind {
            MoveKind::StackToFoundation => {
                self.pop_card(src);
                self.increment_foundation(dest);
            }
            MoveKind::FreecellToFoundation => {
                self.set_freecell(src, Card::EMPTY);
                self.increment_foundation(dest);
            }
            MoveKind::SequenceToFoundation => {
                let len = self.stacks[src].len();
                self.stacks[src].truncate(len - MAX_RANK as usize);
                self.foundations[dest] = MAX_RANK;
            }
            MoveKind::StackToFreecell => {
                let card = self.pop_card(src);
                self.set_freecell(dest, card);
            }
            MoveKind::FreecellToStack => {
                let card = self.freecell(src);
                self.set_freecell(src, Card::EMPTY);
                self.push_card(dest, card);
            }
            MoveKind::StackToStack => self.move_cards(src, dest, mv.count as usize),
            MoveKind::FlipCard => self.flip_top(src),
            MoveKind::Draw => {
                if let Some(talon) = self.talon.as_mut() {
                    talon.draw();
                }
            }
            MoveKind::Redeal => {
                if let Some(talon) = self.talon.as_mut() {
                    talon.redeal();
                }
            }
            MoveKind::TalonToFoundation => {
                if self.take_talon_card().is_some() {
                    self.increment_foundation(dest);
                }
            }
            MoveKind::TalonToStack => {
                if let Some(card) = self.take_talon_card() {
                    self.push_card(dest, card);
                }
            }
            MoveKind::GypsyDeal => {
                if let Some(talon) = self.talon.as_mut()
                    && !talon.cards.is_empty()
                {
                    let card = talon.cards.remove(0);
                    self.push_card(dest, card.face_up());
                }
            }
            MoveKind::Canonize => {}
        }
    }

    fn take_talon_card(&mut self) -> Option<Card> {
        self.talon.as_mut()?.take_waste_top()
    }

    /// Sorts freecells (empty first) and stacks (by content) into canonical
    /// order and applies the same permutation to `locs`.
    ///
    /// Both sorts are stable, so equal stacks keep their previous relative
    /// order and the result is idempotent.
    pub fn canonicalize(&mut self, locs: &mut Locations) {
        let mut order: SmallVec<[usize; 16]> = (0..self.freecells.len()).collect();
        order.sort_by_key(|&i| self.freecells[i]);
        self.freecells = order.iter().map(|&i| self.freecells[i]).collect();
        locs.freecells = order.iter().map(|&i| locs.freecells[i]).collect();

        let mut order: SmallVec<[usize; 16]> = (0..self.stacks.len()).collect();
        order.sort_by(|&a, &b| self.stacks[a].cmp(&self.stacks[b]));
        let mut old = std::mem::take(&mut self.stacks);
        self.stacks = order.iter().map(|&i| std::mem::take(&mut old[i])).collect();
        locs.stacks = order.iter().map(|&i| locs.stacks[i]).collect();
    }

    /// Confirms that every card occurs exactly `decks` times and that no
    /// stack or talon has a gap.
    pub fn check_validity(&self, decks: usize) -> Result<(), InvalidState> {
        let mut counts = [0usize; CARDS_PER_DECK];
        for (idx, stack) in self.stacks.iter().enumerate() {
            for card in stack {
                if card.is_empty() {
                    return Err(InvalidState::EmptySlot(idx));
                }
                counts[card.face_up().id()] += 1;
            }
        }
        for card in self.freecells.iter().filter(|c| !c.is_empty()) {
            counts[card.face_up().id()] += 1;
        }
        if let Some(talon) = &self.talon {
            for card in &talon.cards {
                if card.is_empty() {
                    return Err(InvalidState::EmptyTalonSlot);
                }
                counts[card.face_up().id()] += 1;
            }
        }
        for (idx, &value) in self.foundations.iter().enumerate() {
            let suit = (idx % MAX_SUIT as usize) as u8;
            for rank in 1..=value.min(MAX_RANK) {
                counts[Card::new(rank, suit).id()] += 1;
            }
        }

        for (id, &count) in counts.iter().enumerate() {
            let (rank, suit) = (id % MAX_RANK as usize, id / MAX_RANK as usize);
            let card = Card::new(rank as u8 + 1, suit as u8);
            if count < decks {
                return Err(InvalidState::MissingCard(card));
            }
            if count > decks {
                return Err(InvalidState::ExtraCard(card));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn parse(s: &str) -> StateData {
        StateData::from_board(&Board::parse(s).unwrap())
    }

    const DEAL: &str = "Foundations: H-0 C-0 D-0 S-0
Freecells: - KD - 5C
: 4C 2C 9C 8C QS 4S 2H
: 5H QH 3C AC 3H 4H QD
: QC 9S 6H 9H 3S KS 3D
: 5D 2S JC JH 6D AS
: 2D TH TC TD 8D
: 7H JS KH TS KC 7C
: AH 5S 6S AD 8H JD
: 7S 6C 7D 4D 8S 9D
";

    #[test]
    fn test_canonicalize() {
        let mut state = parse(DEAL);
        let mut locs = Locations::identity(8, 4);
        state.canonicalize(&mut locs);
        assert_eq!(state.freecells[0], Card::EMPTY);
        assert_eq!(state.freecells[1], Card::EMPTY);
        assert_eq!(locs.freecells[2], 3);
        for pair in state.stacks.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
        // Every stack still sits next to the column it came from.
        let original = parse(DEAL);
        for (idx, stack) in state.stacks.iter().enumerate() {
            assert_eq!(stack, &original.stacks[locs.stack(idx)]);
        }
    }

    #[test]
    fn test_check_validity() {
        let state = parse(DEAL);
        assert_eq!(state.check_validity(1), Ok(()));
        assert_eq!(state.card_count(), 52);

        let mut extra = state.clone();
        extra.stacks[0].push(Card::parse("AH").unwrap());
        assert_eq!(
            extra.check_validity(1),
            Err(InvalidState::ExtraCard(Card::parse("AH").unwrap()))
        );

        let mut missing = state.clone();
        missing.freecells[1] = Card::EMPTY;
        assert_eq!(
            missing.check_validity(1),
            Err(InvalidState::MissingCard(Card::parse("KD").unwrap()))
        );

        let mut gap = state.clone();
        gap.stacks[2].insert(1, Card::EMPTY);
        assert_eq!(gap.check_validity(1), Err(InvalidState::EmptySlot(2)));

        let talon = parse(
            "Foundations: H-K C-K D-K S-J
Talon: QS - KS
",
        );
        assert_eq!(talon.check_validity(1), Err(InvalidState::EmptyTalonSlot));
    }

    #[test]
    fn test_apply_moves() {
        let mut state = parse(
            "Foundations: H-K C-K D-K S-J
Freecells: -
: KS QS
",
        );
        assert_eq!(state.card_count(), 52);
        let f = state.foundation_for(Card::parse("QS").unwrap()).unwrap();
        assert_eq!(f, 3);
        state.apply_move(Move::stack_to_foundation(0, f));
        state.apply_move(Move::stack_to_freecell(0, 0));
        assert_eq!(state.free_stacks(), 1);
        state.apply_move(Move::freecell_to_foundation(0, f));
        assert!(state.is_solved());
        assert_eq!(state.card_count(), 52);
    }

    #[test]
    fn test_talon_moves() {
        let mut state = parse(
            "Foundations: H-K C-K D-Q S-J
Talon: QS KD KS
:
",
        );
        assert!(state.talon.as_ref().unwrap().waste_top().is_none());
        state.apply_move(Move::draw());
        state.apply_move(Move::talon_to_foundation(3));
        assert_eq!(state.foundation(3), 12);
        state.apply_move(Move::draw());
        state.apply_move(Move::draw());
        state.apply_move(Move::talon_to_foundation(3));
        state.apply_move(Move::talon_to_foundation(2));
        assert!(state.is_solved());
        assert_eq!(state.talon.as_ref().unwrap().cards.len(), 0);
    }

    fn shuffled_deal(seed: u64, stacks: usize) -> StateData {
        let mut cards: Vec<Card> = (0..CARDS_PER_DECK)
            .map(|id| Card::new((id % 13) as u8 + 1, (id / 13) as u8))
            .collect();
        let mut state = seed;
        for i in (1..cards.len()).rev() {
            state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
            cards.swap(i, (state >> 33) as usize % (i + 1));
        }
        let mut data = StateData {
            stacks: (0..stacks).map(|_| Stack::new()).collect(),
            freecells: SmallVec::from_elem(Card::EMPTY, 4),
            foundations: SmallVec::from_elem(0, 4),
            talon: None,
        };
        for (i, card) in cards.into_iter().enumerate() {
            data.stacks[i % stacks].push(card);
        }
        data
    }

    proptest! {
        #[test]
        fn canonicalize_is_idempotent(seed in any::<u64>(), stacks in 1usize..12) {
            let mut state = shuffled_deal(seed, stacks);
            let mut locs = Locations::identity(stacks, 4);
            state.canonicalize(&mut locs);
            let (once, once_locs) = (state.clone(), locs.clone());
            state.canonicalize(&mut locs);
            prop_assert_eq!(&state, &once);
            prop_assert_eq!(&locs, &once_locs);
            prop_assert_eq!(state.check_validity(1), Ok(()));
        }

        #[test]
        fn canonical_form_ignores_column_order(seed in any::<u64>(), rotate in 0usize..8) {
            let mut a = shuffled_deal(seed, 8);
            let mut b = a.clone();
            b.stacks.rotate_left(rotate);
            a.canonicalize(&mut Locations::identity(8, 4));
            b.canonicalize(&mut Locations::identity(8, 4));
            prop_assert_eq!(a, b);
        }
    }
}
