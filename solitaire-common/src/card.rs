use anyhow::{Result, bail};
use std::fmt;

pub const MAX_RANK: u8 = 13;
pub const MAX_SUIT: u8 = 4;
pub const CARDS_PER_DECK: usize = (MAX_RANK as usize) * (MAX_SUIT as usize);

const SUITS: [char; 4] = ['H', 'C', 'D', 'S'];
const PRETTY_SUITS: [char; 4] = ['♥', '♣', '♦', '♠'];
const RANKS: [char; 14] = [
    '?', 'A', '2', '3', '4', '5', '6', '7', '8', '9', 'T', 'J', 'Q', 'K',
];

const RANK_MASK: u8 = 0x0f;
const SUIT_SHIFT: u8 = 4;
const FACE_DOWN: u8 = 0x80;

/// A card packed into one byte.
///
/// The low nibble holds the rank (1 = ace, 13 = king), bits 4-5 hold the suit
/// in `H C D S` order and bit 7 marks a face-down card. The zero byte is
/// [`Card::EMPTY`], used for empty slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Card(u8);

impl Card {
    pub const EMPTY: Self = Self(0);

    pub fn new(rank: u8, suit: u8) -> Self {
        debug_assert!((1..=MAX_RANK).contains(&rank) && suit < MAX_SUIT);
        Self((suit << SUIT_SHIFT) | rank)
    }

    pub fn from_byte(byte: u8) -> Self {
        Self(byte)
    }

    pub fn byte(self) -> u8 {
        self.0
    }

    pub fn rank(self) -> u8 {
        self.0 & RANK_MASK
    }

    pub fn suit(self) -> u8 {
        (self.0 >> SUIT_SHIFT) & 0x03
    }

    /// Index of the card inside one deck, `0..CARDS_PER_DECK`.
    pub fn id(self) -> usize {
        self.suit() as usize * MAX_RANK as usize + self.rank() as usize - 1
    }

    pub fn is_empty(self) -> bool {
        self.rank() == 0
    }

    pub fn is_red(self) -> bool {
        self.suit() & 1 == 0
    }

    pub fn is_king(self) -> bool {
        self.rank() == MAX_RANK
    }

    pub fn is_face_down(self) -> bool {
        self.0 & FACE_DOWN != 0
    }

    pub fn face_down(self) -> Self {
        Self(self.0 | FACE_DOWN)
    }

    pub fn face_up(self) -> Self {
        Self(self.0 & !FACE_DOWN)
    }

    /// Parses a token such as `AH`, `TD`, `10D` or `K♠`.
    pub fn parse(token: &str) -> Result<Self> {
        let token = token.trim();
        let mut chars: Vec<char> = token.chars().collect();
        let Some(suit_char) = chars.pop() else {
            bail!("Empty card token");
        };
        let suit = SUITS
            .iter()
            .position(|&s| s == suit_char.to_ascii_uppercase())
            .or_else(|| PRETTY_SUITS.iter().position(|&s| s == suit_char));
        let Some(suit) = suit else {
            bail!("Invalid suit at card {token}");
        };
        let rank_str: String = chars.into_iter().collect();
        let rank = match rank_str.to_ascii_uppercase().as_str() {
            "10" => 10,
            "0" => 10,
            s if s.chars().count() == 1 => {
                let c = s.chars().next().unwrap_or('?');
                match RANKS.iter().skip(1).position(|&r| r == c) {
                    Some(idx) => idx as u8 + 1,
                    None => bail!("Invalid rank at card {token}"),
                }
            }
            _ => bail!("Invalid rank at card {token}"),
        };
        Ok(Card::new(rank, suit as u8))
    }

    pub fn rank_char(rank: u8) -> char {
        RANKS.get(rank as usize).copied().unwrap_or('?')
    }

    pub fn suit_char(suit: u8) -> char {
        SUITS.get(suit as usize).copied().unwrap_or('?')
    }

    pub fn to_pretty_string(&self) -> String {
        if self.is_empty() {
            return "-".into();
        }
        format!(
            "{}{}",
            RANKS[self.rank() as usize],
            PRETTY_SUITS[self.suit() as usize]
        )
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "-");
        }
        write!(
            f,
            "{}{}",
            RANKS[self.rank() as usize],
            SUITS[self.suit() as usize]
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_card() {
        let card = Card::parse("10D").unwrap();
        assert_eq!(card, Card::parse("TD").unwrap());
        assert_eq!(card.rank(), 10);
        assert_eq!(card.suit(), 2);
        assert!(card.is_red());
        assert_eq!(Card::parse("K♠").unwrap().to_string(), "KS");
        assert!(Card::parse("1X").is_err());
        assert!(Card::parse("ZH").is_err());
    }

    #[test]
    fn test_face_flag() {
        let card = Card::new(1, 3);
        let down = card.face_down();
        assert!(down.is_face_down());
        assert_eq!(down.rank(), 1);
        assert_eq!(down.suit(), 3);
        assert_eq!(down.face_up(), card);
        assert_eq!(card.id(), 39);
    }
}
