//! Move generation.
//!
//! A test enumerates the states reachable with one category of move; a
//! [`RuleSet`] runs the tests of a game family in the configured order,
//! optionally grouped so that random DFS can shuffle a group's results.
mod freecell;
mod simple_simon;
mod talon;

use crate::config::{BuildBy, EmptyStacksFill, GameConfig, GameFamily};
use crate::error::SolverError;
use crate::moves::{Move, MoveStack};
use crate::state::{Locations, StateData};

use smallvec::{SmallVec, smallvec};
use solitaire_common::board::Stack;
use solitaire_common::card::Card;
use std::fmt;

pub type DerivedStates = Vec<Candidate>;

/// A derived state before canonicalization, with the moves that lead to it
/// from its parent.
#[derive(Debug, Clone, Default)]
pub struct Candidate {
    pub state: StateData,
    pub locs: Locations,
    pub moves: MoveStack,
}

impl Candidate {
    pub fn new(state: &StateData, locs: &Locations) -> Self {
        Self {
            state: state.clone(),
            locs: locs.clone(),
            moves: MoveStack::new(),
        }
    }

    /// Applies `mv` and records it.
    pub fn push(&mut self, mv: Move) {
        self.state.apply_move(mv);
        self.moves.push(mv);
    }

    /// Turns up newly exposed face-down cards and closes the log.
    pub fn finish(mut self) -> Self {
        for stack in 0..self.state.stacks.len() {
            if self.state.top(stack).is_some_and(|c| c.is_face_down()) {
                self.push(Move::flip(stack));
            }
        }
        self.moves.push(Move::canonize());
        self
    }
}

/// Free-slot counts of the state being expanded.
pub struct TestContext<'a> {
    pub game: &'a GameConfig,
    pub free_cells: usize,
    pub free_stacks: usize,
}

pub type TestFn = fn(&TestContext<'_>, &StateData, &Locations, &mut DerivedStates);

#[derive(Clone, Copy)]
pub struct TestDef {
    pub id: char,
    pub name: &'static str,
    pub run: TestFn,
}

impl fmt::Debug for TestDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.id, self.name)
    }
}

#[derive(Debug, Clone)]
pub struct TestGroup {
    pub tests: SmallVec<[TestDef; 11]>,
    /// Results of a random group are shuffled by random DFS.
    pub random: bool,
}

#[derive(Debug, Clone)]
pub struct RuleSet {
    game: GameConfig,
    groups: Vec<TestGroup>,
}

impl RuleSet {
    /// Builds the rule set of `game`. Without an explicit order every test
    /// forms its own group, or all tests form one random group when
    /// `randomize` is set.
    pub fn new(
        game: &GameConfig,
        order: Option<&str>,
        randomize: bool,
    ) -> Result<Self, SolverError> {
        let available = Self::tests_for(game);
        let groups = match order {
            Some(order) => parse_order(order, &available)?,
            None if randomize => vec![TestGroup {
                tests: available.iter().copied().collect(),
                random: true,
            }],
            None => available
                .iter()
                .map(|&test| TestGroup {
                    tests: smallvec![test],
                    random: false,
                })
                .collect(),
        };
        if groups.is_empty() {
            return Err(SolverError::Config("the tests order selects no tests".into()));
        }
        Ok(Self {
            game: game.clone(),
            groups,
        })
    }

    pub fn tests_for(game: &GameConfig) -> Vec<TestDef> {
        let mut tests = match game.family {
            GameFamily::Freecell => freecell::TESTS.to_vec(),
            GameFamily::SimpleSimon => simple_simon::TESTS.to_vec(),
        };
        if game.has_talon() {
            tests.push(talon::TEST);
        }
        tests
    }

    pub fn groups(&self) -> &[TestGroup] {
        &self.groups
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    pub fn expand_group(&self, group: usize, state: &StateData, locs: &Locations) -> DerivedStates {
        let ctx = self.context(state);
        let mut out = DerivedStates::new();
        for test in &self.groups[group].tests {
            (test.run)(&ctx, state, locs, &mut out);
        }
        out
    }

    pub fn expand_all(&self, state: &StateData, locs: &Locations) -> DerivedStates {
        let ctx = self.context(state);
        let mut out = DerivedStates::new();
        for test in self.groups.iter().flat_map(|g| g.tests.iter()) {
            (test.run)(&ctx, state, locs, &mut out);
        }
        out
    }

    fn context(&self, state: &StateData) -> TestContext<'_> {
        TestContext {
            game: &self.game,
            free_cells: state.free_freecells(),
            free_stacks: state.free_stacks(),
        }
    }
}

/// Parses an order such as `0123[456]789`. Bracketed ids form one random
/// group; every other id is a group of its own.
fn parse_order(order: &str, available: &[TestDef]) -> Result<Vec<TestGroup>, SolverError> {
    let mut groups = Vec::new();
    let mut open: Option<TestGroup> = None;
    for ch in order.chars() {
        match ch {
            ' ' | ',' => {}
            '[' => {
                if open.is_some() {
                    return Err(SolverError::Config(format!(
                        "nested '[' in tests order '{order}'"
                    )));
                }
                open = Some(TestGroup {
                    tests: SmallVec::new(),
                    random: true,
                });
            }
            ']' => match open.take() {
                Some(group) if !group.tests.is_empty() => groups.push(group),
                Some(_) => {}
                None => {
                    return Err(SolverError::Config(format!(
                        "unmatched ']' in tests order '{order}'"
                    )));
                }
            },
            id => {
                let Some(test) = available.iter().find(|t| t.id == id) else {
                    return Err(SolverError::Config(format!(
                        "unknown test '{id}' in tests order '{order}'"
                    )));
                };
                match open.as_mut() {
                    Some(group) => group.tests.push(*test),
                    None => groups.push(TestGroup {
                        tests: smallvec![*test],
                        random: false,
                    }),
                }
            }
        }
    }
    if open.is_some() {
        return Err(SolverError::Config(format!("unclosed '[' in tests order '{order}'")));
    }
    Ok(groups)
}

pub fn is_parent(game: &GameConfig, parent: Card, child: Card) -> bool {
    if parent.is_face_down() || child.is_face_down() || parent.rank() != child.rank() + 1 {
        return false;
    }
    match game.build_by {
        BuildBy::Suit => parent.suit() == child.suit(),
        BuildBy::Rank => true,
        BuildBy::AlternateColor => parent.is_red() != child.is_red(),
    }
}

pub fn first_face_up(stack: &Stack) -> usize {
    stack
        .iter()
        .position(|c| !c.is_face_down())
        .unwrap_or(stack.len())
}

/// Index of the lowest card of the sequence on top of `stack`, or the stack
/// length when nothing can move.
pub fn seq_start(game: &GameConfig, stack: &Stack) -> usize {
    let first = first_face_up(stack);
    if first >= stack.len() {
        return stack.len();
    }
    let mut h = stack.len() - 1;
    while h > first && is_parent(game, stack[h - 1], stack[h]) {
        h -= 1;
    }
    h
}

/// Index of the highest card of the sequence that starts at `h`.
pub fn seq_end(game: &GameConfig, stack: &Stack, h: usize) -> usize {
    let mut e = h;
    while e + 1 < stack.len() && is_parent(game, stack[e], stack[e + 1]) {
        e += 1;
    }
    e
}

/// How many cards may move as one sequence.
pub fn capacity(game: &GameConfig, free_cells: usize, free_stacks: usize) -> usize {
    if game.unlimited_sequence_move {
        return usize::MAX;
    }
    match game.empty_stacks_fill {
        EmptyStacksFill::AnyCard => (free_cells + 1) << free_stacks,
        _ => free_cells + 1,
    }
}

pub fn can_fill_empty(game: &GameConfig, card: Card) -> bool {
    match game.empty_stacks_fill {
        EmptyStacksFill::AnyCard => true,
        EmptyStacksFill::KingsOnly => card.is_king(),
        EmptyStacksFill::None => false,
    }
}

pub fn first_empty_stack(state: &StateData, skip: &[usize]) -> Option<usize> {
    (0..state.stacks.len()).find(|s| state.stacks[*s].is_empty() && !skip.contains(s))
}

/// Moves the top `count` cards of `from` onto `to` as one sequence if the
/// free slots allow it. The caller has checked the destination card.
pub fn move_sequence(
    c: &mut Candidate,
    game: &GameConfig,
    from: usize,
    to: usize,
    count: usize,
) -> bool {
    let len = c.state.stack_len(from);
    if count == 0 || count > len || from == to {
        return false;
    }
    let mut free_stacks = c.state.free_stacks();
    if c.state.stacks[to].is_empty() {
        if !can_fill_empty(game, c.state.stack_card(from, len - count)) {
            return false;
        }
        free_stacks -= 1;
    }
    if count > capacity(game, c.state.free_freecells(), free_stacks) {
        return false;
    }
    c.push(Move::stack_to_stack(from, to, count));
    true
}

/// Moves the top `count` cards of `stack`, one at a time, into free
/// freecells or empty stacks outside `keep`.
pub fn relocate_singles(
    c: &mut Candidate,
    game: &GameConfig,
    stack: usize,
    count: usize,
    keep: &[usize],
) -> bool {
    for _ in 0..count {
        let Some(card) = c.state.top(stack) else {
            return false;
        };
        if card.is_face_down() {
            return false;
        }
        if let Some(cell) = c.state.first_free_freecell() {
            c.push(Move::stack_to_freecell(stack, cell));
            continue;
        }
        if can_fill_empty(game, card)
            && let Some(empty) = first_empty_stack(&c.state, keep)
            && empty != stack
        {
            c.push(Move::stack_to_stack(stack, empty, 1));
            continue;
        }
        return false;
    }
    true
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use solitaire_common::board::Board;

    pub fn state_of(board: &str) -> (StateData, Locations) {
        let board = Board::parse(board).unwrap();
        let state = StateData::from_board(&board);
        let locs = Locations::identity(state.stacks.len(), state.freecells.len());
        (state, locs)
    }

    /// Asserts that every candidate keeps all cards and matches its log.
    pub fn check_candidates(parent: &StateData, derived: &DerivedStates) {
        for cand in derived {
            assert_eq!(cand.state.card_count(), parent.card_count(), "{:?}", cand.moves);
            assert!(cand.moves.last().is_some_and(|m| m.is_canonize()));
            let mut replay = parent.clone();
            for mv in &cand.moves {
                replay.apply_move(*mv);
            }
            assert_eq!(replay, cand.state);
        }
    }

    #[test]
    fn test_parse_order() {
        let game = GameConfig::default();
        let rules = RuleSet::new(&game, Some("01[234]5"), false).unwrap();
        assert_eq!(rules.group_count(), 4);
        assert!(rules.groups()[2].random);
        assert_eq!(rules.groups()[2].tests.len(), 3);
        assert!(!rules.groups()[3].random);

        assert!(RuleSet::new(&game, Some("0[1"), false).is_err());
        assert!(RuleSet::new(&game, Some("0]"), false).is_err());
        assert!(RuleSet::new(&game, Some("0a"), false).is_err());
        assert!(RuleSet::new(&game, Some("[]"), false).is_err());

        let klondike = GameConfig::preset("klondike").unwrap();
        let rules = RuleSet::new(&klondike, None, false).unwrap();
        assert_eq!(rules.group_count(), 11);
        let rules = RuleSet::new(&klondike, None, true).unwrap();
        assert_eq!(rules.group_count(), 1);
        assert_eq!(rules.groups()[0].tests.len(), 11);
    }

    #[test]
    fn test_capacity() {
        let mut game = GameConfig::default();
        assert_eq!(capacity(&game, 2, 1), 6);
        assert_eq!(capacity(&game, 0, 0), 1);
        game.empty_stacks_fill = EmptyStacksFill::KingsOnly;
        assert_eq!(capacity(&game, 2, 1), 3);
        game.unlimited_sequence_move = true;
        assert_eq!(capacity(&game, 0, 0), usize::MAX);
    }

    #[test]
    fn test_sequences() {
        let game = GameConfig::default();
        let (state, _) = state_of(": 5C KD | 9H 8S 7D 6C");
        let stack = &state.stacks[0];
        assert_eq!(first_face_up(stack), 2);
        assert_eq!(seq_start(&game, stack), 2);
        assert_eq!(seq_end(&game, stack, 3), 5);
        assert!(is_parent(&game, stack[2], stack[3]));
        assert!(!is_parent(&game, stack[1], stack[2]));
    }
}
