use crate::action::Action;
use crate::card::{CARDS_PER_DECK, Card, MAX_RANK, MAX_SUIT};

use anyhow::{Context, Result, bail};
use smallvec::SmallVec;

pub const STACK_SIZE: usize = 24;

pub type Stack = SmallVec<[Card; STACK_SIZE]>;

/// A deal as the user sees it: physical columns, freecells, foundations and
/// an optional talon.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Board {
    pub stacks: Vec<Stack>,
    pub freecells: Vec<Option<Card>>,
    /// Foundation heights indexed by `deck * 4 + suit`.
    pub foundations: Vec<u8>,
    pub talon: Option<Talon>,
}

/// Talon cards in deal order. Cards before `cursor` have been drawn into the
/// face-up waiting stack, whose top is `cards[cursor - 1]`.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Talon {
    pub cards: Vec<Card>,
    pub cursor: usize,
    pub redeals: u8,
    pub draw_count: usize,
}

impl Talon {
    pub fn waste_top(&self) -> Option<Card> {
        match self.cursor {
            0 => None,
            n => self.cards.get(n - 1).copied(),
        }
    }

    pub fn draw(&mut self) {
        self.cursor = (self.cursor + self.draw_count.max(1)).min(self.cards.len());
    }

    pub fn redeal(&mut self) {
        self.cursor = 0;
        self.redeals = self.redeals.saturating_add(1);
    }

    pub fn take_waste_top(&mut self) -> Option<Card> {
        let card = self.waste_top()?;
        self.cursor -= 1;
        self.cards.remove(self.cursor);
        Some(card)
    }
}

impl Board {
    pub fn new(stacks: usize, freecells: usize, decks: usize) -> Self {
        Self {
            stacks: vec![Stack::new(); stacks],
            freecells: vec![None; freecells],
            foundations: vec![0; decks * MAX_SUIT as usize],
            talon: None,
        }
    }

    pub fn decks(&self) -> usize {
        (self.foundations.len() / MAX_SUIT as usize).max(1)
    }

    pub fn card_count(&self) -> usize {
        let on_foundations: usize = self.foundations.iter().map(|&v| v as usize).sum();
        let in_stacks: usize = self.stacks.iter().map(|s| s.len()).sum();
        let in_cells = self.freecells.iter().filter(|c| c.is_some()).count();
        let in_talon = self.talon.as_ref().map(|t| t.cards.len()).unwrap_or(0);
        on_foundations + in_stacks + in_cells + in_talon
    }

    pub fn is_solved(&self) -> bool {
        self.foundations.iter().all(|&v| v == MAX_RANK)
            && self.card_count() == self.decks() * CARDS_PER_DECK
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut board = Self {
            foundations: vec![0; MAX_SUIT as usize],
            ..Default::default()
        };
        let mut draw_count = None;

        for line in content
            .split('\n')
            .map(|v| v.trim())
            .filter(|l| !l.is_empty() && !l.starts_with('#'))
        {
            let line_context = || format!("Failed to parse at '{line}'");
            if let Some(rest) = line.strip_prefix("Foundations:") {
                board.foundations = Self::parse_foundations(rest).with_context(line_context)?;
            } else if let Some(rest) = line.strip_prefix("Freecells:") {
                board.freecells = Self::parse_freecells(rest).with_context(line_context)?;
            } else if let Some(rest) = line.strip_prefix("Talon:") {
                let (before, after) = split_bar(rest);
                let drawn = Self::parse_cards(before).with_context(line_context)?;
                let queued = Self::parse_cards(after).with_context(line_context)?;
                let cursor = if after.is_empty() && !rest.contains('|') {
                    0
                } else {
                    drawn.len()
                };
                board.talon = Some(Talon {
                    cards: [drawn, queued].concat(),
                    cursor,
                    redeals: 0,
                    draw_count: 1,
                });
            } else if let Some(rest) = line.strip_prefix("DrawCount:") {
                let value = rest
                    .trim()
                    .parse::<usize>()
                    .context("Invalid DrawCount")
                    .with_context(line_context)?;
                draw_count = Some(value);
            } else {
                let cards_str = line.strip_prefix(':').unwrap_or(line);
                let (before, after) = if cards_str.contains('|') {
                    split_bar(cards_str)
                } else {
                    ("", cards_str)
                };
                let face_down = Self::parse_cards(before).with_context(line_context)?;
                let face_up = Self::parse_cards(after).with_context(line_context)?;
                let mut stack = Stack::new();
                stack.extend(face_down.into_iter().map(Card::face_down));
                stack.extend(face_up);
                board.stacks.push(stack);
            }
        }

        if let (Some(talon), Some(value)) = (board.talon.as_mut(), draw_count) {
            talon.draw_count = value;
        }

        Ok(board)
    }

    fn parse_cards(s: &str) -> Result<Vec<Card>> {
        s.split_whitespace()
            .map(|token| match token {
                "-" => Ok(Card::EMPTY),
                _ => Card::parse(token),
            })
            .collect()
    }

    fn parse_freecells(s: &str) -> Result<Vec<Option<Card>>> {
        s.split_whitespace()
            .map(|token| match token {
                "-" => Ok(None),
                _ => Card::parse(token).map(Some),
            })
            .collect()
    }

    fn parse_foundations(s: &str) -> Result<Vec<u8>> {
        let mut per_suit: [Vec<u8>; MAX_SUIT as usize] = Default::default();
        for token in s.split_whitespace() {
            let Some((suit, value)) = token.split_once('-') else {
                bail!("Invalid foundation '{token}'");
            };
            let suit = match suit.chars().next().map(|c| c.to_ascii_uppercase()) {
                Some('H') => 0,
                Some('C') => 1,
                Some('D') => 2,
                Some('S') => 3,
                _ => bail!("Invalid foundation suit '{token}'"),
            };
            let value = match value.to_ascii_uppercase().as_str() {
                "0" => 0,
                "A" => 1,
                "T" | "10" => 10,
                "J" => 11,
                "Q" => 12,
                "K" => 13,
                v => v
                    .parse::<u8>()
                    .ok()
                    .filter(|v| (2..=9).contains(v))
                    .with_context(|| format!("Invalid foundation value '{token}'"))?,
            };
            per_suit[suit].push(value);
        }
        let decks = per_suit.iter().map(|v| v.len()).max().unwrap_or(0).max(1);
        let mut foundations = vec![0; decks * MAX_SUIT as usize];
        for (suit, values) in per_suit.iter().enumerate() {
            for (deck, &value) in values.iter().enumerate() {
                foundations[deck * MAX_SUIT as usize + suit] = value;
            }
        }
        Ok(foundations)
    }

    pub fn to_pretty_string(&self) -> String {
        let mut output = String::new();

        output.push_str("Foundations:");
        for (idx, &value) in self.foundations.iter().enumerate() {
            let suit = (idx % MAX_SUIT as usize) as u8;
            let value = match value {
                0 => '0',
                v => Card::rank_char(v),
            };
            output.push_str(&format!(" {}-{value}", Card::suit_char(suit)));
        }
        output.push('\n');

        if !self.freecells.is_empty() {
            output.push_str("Freecells:");
            for cell in &self.freecells {
                match cell {
                    Some(card) => output.push_str(&format!(" {card}")),
                    None => output.push_str(" -"),
                }
            }
            output.push('\n');
        }

        if let Some(talon) = &self.talon {
            output.push_str("Talon:");
            for (i, card) in talon.cards.iter().enumerate() {
                if i == talon.cursor && talon.cursor > 0 {
                    output.push_str(" |");
                }
                output.push_str(&format!(" {card}"));
            }
            if talon.cursor > 0 && talon.cursor == talon.cards.len() {
                output.push_str(" |");
            }
            output.push('\n');
            output.push_str(&format!("DrawCount: {}\n", talon.draw_count));
        }

        for stack in &self.stacks {
            output.push(':');
            let face_down = stack.iter().take_while(|c| c.is_face_down()).count();
            for (i, card) in stack.iter().enumerate() {
                if i == face_down && face_down > 0 {
                    output.push_str(" |");
                }
                output.push_str(&format!(" {}", card.face_up()));
            }
            output.push('\n');
        }

        output
    }

    /// Applies one output move, checking that it is legal on this board.
    pub fn apply_action(&mut self, action: &Action) -> Result<()> {
        match *action {
            Action::StackToFoundation(stack, foundation) => {
                let card = self.pop_stack(stack)?;
                self.push_foundation(foundation, card)?;
            }
            Action::FreecellToFoundation(cell, foundation) => {
                let card = self.take_freecell(cell)?;
                self.push_foundation(foundation, card)?;
            }
            Action::SequenceToFoundation(stack, foundation) => {
                for _ in 0..MAX_RANK {
                    let card = self.pop_stack(stack)?;
                    self.push_foundation(foundation, card)?;
                }
            }
            Action::StackToFreecell(stack, cell) => {
                let card = self.pop_stack(stack)?;
                match self.freecells.get_mut(cell) {
                    Some(slot @ None) => *slot = Some(card),
                    _ => bail!("Freecell {cell} is not available"),
                }
            }
            Action::FreecellToStack(cell, stack) => {
                let card = self.take_freecell(cell)?;
                self.stack_mut(stack)?.push(card);
            }
            Action::StackToStack(from, to, count) => {
                let src = self.stack_mut(from)?;
                if count == 0 || count > src.len() {
                    bail!("Stack {from} holds fewer than {count} cards");
                }
                let cards: Stack = src.drain(src.len() - count..).collect();
                if cards.iter().any(|c| c.is_face_down()) {
                    bail!("Cannot move face-down cards from stack {from}");
                }
                self.stack_mut(to)?.extend(cards);
            }
            Action::FlipCard(stack) => {
                let top = self
                    .stack_mut(stack)?
                    .last_mut()
                    .with_context(|| format!("Stack {stack} is empty"))?;
                *top = top.face_up();
            }
            Action::Draw => self.talon_mut()?.draw(),
            Action::Redeal => self.talon_mut()?.redeal(),
            Action::TalonToFoundation(foundation) => {
                let card = self.take_talon()?;
                self.push_foundation(foundation, card)?;
            }
            Action::TalonToStack(stack) => {
                let card = self.take_talon()?;
                self.stack_mut(stack)?.push(card);
            }
            Action::DealGypsyTalon => {
                let stacks = self.stacks.len();
                let talon = self.talon_mut()?;
                let count = stacks.min(talon.cards.len());
                let dealt: Vec<Card> = talon.cards.drain(..count).collect();
                for (stack, card) in self.stacks.iter_mut().zip(dealt) {
                    stack.push(card.face_up());
                }
            }
        }
        Ok(())
    }

    fn stack_mut(&mut self, idx: usize) -> Result<&mut Stack> {
        self.stacks
            .get_mut(idx)
            .with_context(|| format!("Invalid stack index {idx}"))
    }

    fn talon_mut(&mut self) -> Result<&mut Talon> {
        self.talon.as_mut().context("The board has no talon")
    }

    fn pop_stack(&mut self, idx: usize) -> Result<Card> {
        let card = self
            .stack_mut(idx)?
            .pop()
            .with_context(|| format!("Stack {idx} is empty"))?;
        if card.is_face_down() {
            bail!("Top card of stack {idx} is face down");
        }
        Ok(card)
    }

    fn take_freecell(&mut self, idx: usize) -> Result<Card> {
        self.freecells
            .get_mut(idx)
            .and_then(Option::take)
            .with_context(|| format!("Freecell {idx} is empty"))
    }

    fn take_talon(&mut self) -> Result<Card> {
        self.talon_mut()?
            .take_waste_top()
            .context("The talon has no exposed card")
    }

    fn push_foundation(&mut self, idx: usize, card: Card) -> Result<()> {
        let Some(value) = self.foundations.get_mut(idx) else {
            bail!("Invalid foundation index {idx}");
        };
        if idx % MAX_SUIT as usize != card.suit() as usize || *value + 1 != card.rank() {
            bail!("Card {card} cannot go to foundation {idx}");
        }
        *value += 1;
        Ok(())
    }
}

fn split_bar(s: &str) -> (&str, &str) {
    match s.find('|') {
        Some(idx) => (&s[..idx], &s[idx + 1..]),
        None => (s, ""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOARD_STR: &str = "Foundations: H-0 C-0 D-0 S-0
Freecells: - -
: 4C 2C 9C 8C QS 4S 2H
: 5H QH 3C AC 3H 4H QD
: QC 9S 6H 9H 3S KS 3D
: 5D 2S JC 5C JH 6D AS
: 2D KD TH TC TD 8D
: 7H JS KH TS KC 7C
: AH 5S 6S AD 8H JD
: 7S 6C 7D 4D 8S 9D
";

    #[test]
    fn test_parse_board() {
        let board = Board::parse(BOARD_STR).unwrap();
        assert_eq!(board.stacks.len(), 8);
        assert_eq!(board.freecells.len(), 2);
        assert_eq!(board.card_count(), 52);
        assert_eq!(board.stacks[4][2], Card::parse("TH").unwrap());
        assert_eq!(BOARD_STR, board.to_pretty_string());
    }

    #[test]
    fn test_parse_face_down_and_talon() {
        let board = Board::parse(
            "Foundations: H-K C-K D-J S-J
Talon: QD | QS
DrawCount: 3
: KD | KS
",
        )
        .unwrap();
        let talon = board.talon.as_ref().unwrap();
        assert_eq!(talon.cursor, 1);
        assert_eq!(talon.draw_count, 3);
        assert_eq!(talon.waste_top(), Some(Card::parse("QD").unwrap()));
        assert!(board.stacks[0][0].is_face_down());
        assert!(!board.stacks[0][1].is_face_down());
        assert_eq!(board.card_count(), 52);
    }

    #[test]
    fn test_apply_action() {
        let mut board = Board::parse(
            "Foundations: H-K C-K D-K S-J
Freecells: -
: KS QS
",
        )
        .unwrap();
        assert_eq!(board.card_count(), 52);
        assert!(
            board
                .clone()
                .apply_action(&Action::StackToFoundation(0, 0))
                .is_err()
        );
        board.apply_action(&Action::StackToFoundation(0, 3)).unwrap();
        board.apply_action(&Action::StackToFreecell(0, 0)).unwrap();
        board.apply_action(&Action::FreecellToFoundation(0, 3)).unwrap();
        assert!(board.is_solved());
    }

    #[test]
    fn test_parse_invalid() {
        assert!(Board::parse(": AH XX").is_err());
        assert!(Board::parse("Foundations: Z-3").is_err());
    }
}
