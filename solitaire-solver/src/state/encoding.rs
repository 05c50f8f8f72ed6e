use super::{Locations, StackTable, StateData};
use crate::config::{SolverConfig, StateFlavor, StorageBackend, TalonType};

use ahash::AHasher;
use smallvec::SmallVec;
use solitaire_common::board::{Stack, Talon};
use solitaire_common::card::Card;
use std::hash::{Hash, Hasher};

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
enum KeyBody {
    Full(Box<StateData>),
    Packed(Box<[u8]>),
    Indirect { stacks: Box<[u32]>, rest: Box<[u8]> },
}

/// Stored identity of a canonical state.
///
/// Keys built by one factory always share a variant, so the derived ordering
/// only ever compares like with like.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StateKey {
    body: KeyBody,
    /// Physical column order, kept for games that deal by column.
    stack_locs: Option<Box<[u8]>>,
}

impl StateKey {
    pub fn digest(&self) -> u64 {
        let mut hasher = AHasher::default();
        self.hash(&mut hasher);
        hasher.finish()
    }
}

/// Encodes canonical states into keys of the configured flavor and back.
#[derive(Debug, Clone)]
pub struct StateFactory {
    flavor: StateFlavor,
    stacks: Option<StackTable>,
    stack_count: usize,
    freecell_count: usize,
    foundation_count: usize,
    talon: bool,
    draw_count: usize,
    keep_locs: bool,
    count_redeals: bool,
}

impl StateFactory {
    pub fn new(config: &SolverConfig) -> Self {
        let game = &config.game;
        let stacks = match config.flavor {
            StateFlavor::Indirect => Some(StackTable::new(config.stacks_backend)),
            _ => None,
        };
        Self {
            flavor: config.flavor,
            stacks,
            stack_count: game.stacks,
            freecell_count: game.freecells,
            foundation_count: game.decks * 4,
            talon: game.has_talon(),
            draw_count: game.draw_count,
            keep_locs: game.talon == TalonType::Gypsy,
            count_redeals: game.max_redeals.is_some(),
        }
    }

    /// Number of distinct stacks interned so far.
    pub fn interned_stacks(&self) -> usize {
        self.stacks.as_ref().map_or(0, StackTable::len)
    }

    /// Encodes an already canonicalized state.
    pub fn encode(&mut self, data: &StateData, locs: &Locations) -> StateKey {
        let body = match self.flavor {
            StateFlavor::Debug => {
                let mut data = data.clone();
                if let Some(talon) = data.talon.as_mut()
                    && !self.count_redeals
                {
                    talon.redeals = 0;
                }
                KeyBody::Full(Box::new(data))
            }
            StateFlavor::Compact => {
                let mut buf = Vec::with_capacity(64);
                for stack in &data.stacks {
                    push_len(&mut buf, stack.len());
                    buf.extend(stack.iter().map(|c| c.byte()));
                }
                self.pack_rest(data, &mut buf);
                KeyBody::Packed(buf.into_boxed_slice())
            }
            StateFlavor::Indirect => {
                let mut rest = Vec::with_capacity(16);
                self.pack_rest(data, &mut rest);
                let table = self
                    .stacks
                    .get_or_insert_with(|| StackTable::new(StorageBackend::Avl));
                let stacks = data.stacks.iter().map(|s| table.intern(s)).collect();
                KeyBody::Indirect {
                    stacks,
                    rest: rest.into_boxed_slice(),
                }
            }
        };
        let stack_locs = self.keep_locs.then(|| locs.stacks.iter().copied().collect());
        StateKey { body, stack_locs }
    }

    /// Rebuilds the canonical state a key was encoded from.
    pub fn decode(&self, key: &StateKey) -> StateData {
        match &key.body {
            KeyBody::Full(data) => data.as_ref().clone(),
            KeyBody::Packed(buf) => {
                let mut pos = 0;
                let mut stacks = SmallVec::with_capacity(self.stack_count);
                for _ in 0..self.stack_count {
                    let len = read_len(&buf[pos..]);
                    pos += 2;
                    let stack: Stack = buf[pos..pos + len]
                        .iter()
                        .map(|&b| Card::from_byte(b))
                        .collect();
                    pos += len;
                    stacks.push(stack);
                }
                let mut data = StateData {
                    stacks,
                    ..Default::default()
                };
                self.unpack_rest(&buf[pos..], &mut data);
                data
            }
            KeyBody::Indirect { stacks, rest } => {
                let mut data = StateData::default();
                if let Some(table) = &self.stacks {
                    data.stacks = stacks.iter().map(|&id| table.get(id).clone()).collect();
                }
                self.unpack_rest(rest, &mut data);
                data
            }
        }
    }

    fn pack_rest(&self, data: &StateData, buf: &mut Vec<u8>) {
        buf.extend(data.freecells.iter().map(|c| c.byte()));
        buf.extend(data.foundations.iter().copied());
        if self.talon {
            let empty = Talon::default();
            let talon = data.talon.as_ref().unwrap_or(&empty);
            push_len(buf, talon.cursor);
            buf.push(if self.count_redeals { talon.redeals } else { 0 });
            push_len(buf, talon.cards.len());
            buf.extend(talon.cards.iter().map(|c| c.byte()));
        }
    }

    fn unpack_rest(&self, buf: &[u8], data: &mut StateData) {
        let (cells, buf) = buf.split_at(self.freecell_count);
        data.freecells = cells.iter().map(|&b| Card::from_byte(b)).collect();
        let (foundations, buf) = buf.split_at(self.foundation_count);
        data.foundations = foundations.iter().copied().collect();
        if self.talon {
            let len = read_len(&buf[3..]);
            data.talon = Some(Talon {
                cards: buf[5..5 + len].iter().map(|&b| Card::from_byte(b)).collect(),
                cursor: read_len(buf),
                redeals: buf[2],
                draw_count: self.draw_count,
            });
        }
    }
}

/// Container lengths take two bytes; eight decks hold 416 cards.
fn push_len(buf: &mut Vec<u8>, len: usize) {
    debug_assert!(len <= u16::MAX as usize);
    buf.extend_from_slice(&(len as u16).to_be_bytes());
}

fn read_len(buf: &[u8]) -> usize {
    u16::from_be_bytes([buf[0], buf[1]]) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use solitaire_common::board::Board;

    fn klondike_state() -> StateData {
        let board = Board::parse(
            "Foundations: H-Q C-K D-Q S-J
Talon: QS | KD
: KS
: KH
",
        )
        .unwrap();
        StateData::from_board(&board)
    }

    #[test]
    fn test_flavors_decode_what_they_encode() {
        let mut game = GameConfig::preset("klondike").unwrap();
        game.stacks = 2;
        let state = klondike_state();
        let locs = Locations::identity(2, 0);
        for flavor in StateFlavor::ALL {
            let config = SolverConfig {
                flavor: *flavor,
                stacks_backend: StorageBackend::Rb,
                ..SolverConfig::new(game.clone())
            };
            let mut factory = StateFactory::new(&config);
            let key = factory.encode(&state, &locs);
            assert_eq!(factory.decode(&key), state, "{flavor}");
            assert_eq!(factory.encode(&state, &locs), key);
        }
    }

    #[test]
    fn test_multi_deck_lengths_survive_encoding() {
        let game = GameConfig {
            stacks: 1,
            freecells: 0,
            decks: 6,
            talon: TalonType::Klondike,
            ..Default::default()
        };
        let deck: Vec<Card> = (0..52u8)
            .map(|id| Card::new(id % 13 + 1, id / 13))
            .collect();
        let cards: Vec<Card> = deck.iter().copied().cycle().take(6 * 52).collect();
        let state = StateData {
            stacks: [cards.iter().copied().collect::<Stack>()].into_iter().collect(),
            foundations: SmallVec::from_elem(0, 24),
            talon: Some(Talon {
                cursor: 300,
                cards: cards.clone(),
                draw_count: 1,
                ..Default::default()
            }),
            ..Default::default()
        };
        let locs = Locations::identity(1, 0);
        for flavor in StateFlavor::ALL {
            let config = SolverConfig {
                flavor: *flavor,
                ..SolverConfig::new(game.clone())
            };
            let mut factory = StateFactory::new(&config);
            let key = factory.encode(&state, &locs);
            let decoded = factory.decode(&key);
            assert_eq!(decoded.stacks[0].len(), 312, "{flavor}");
            assert_eq!(decoded, state, "{flavor}");
        }
    }

    #[test]
    fn test_unlimited_redeals_share_a_key() {
        let mut game = GameConfig::preset("klondike").unwrap();
        game.stacks = 2;
        let config = SolverConfig::new(game);
        let mut factory = StateFactory::new(&config);
        let locs = Locations::identity(2, 0);
        let state = klondike_state();
        let mut redealt = state.clone();
        redealt.talon.as_mut().unwrap().redeals = 3;
        assert_eq!(factory.encode(&state, &locs), factory.encode(&redealt, &locs));

        let mut config = config;
        config.game.max_redeals = Some(5);
        let mut factory = StateFactory::new(&config);
        assert_ne!(factory.encode(&state, &locs), factory.encode(&redealt, &locs));
    }

    #[test]
    fn test_gypsy_keys_keep_columns() {
        let mut game = GameConfig::preset("gypsy").unwrap();
        game.stacks = 2;
        let mut factory = StateFactory::new(&SolverConfig::new(game));
        let state = klondike_state();
        let a = factory.encode(&state, &Locations::identity(2, 0));
        let mut swapped = Locations::identity(2, 0);
        swapped.stacks.swap(0, 1);
        let b = factory.encode(&state, &swapped);
        assert_ne!(a, b);
        assert_ne!(a.digest(), b.digest());
    }
}
