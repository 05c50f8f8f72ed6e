use crate::error::SolverError;
use crate::tree::TreeKind;

use std::fmt;
use std::str::FromStr;

pub const MAX_STACKS: usize = 16;
pub const MAX_FREECELLS: usize = 16;
pub const MAX_DECKS: usize = 8;

/// Default A* weights: cards out, sequence-move capacity, cards under
/// sequences, sequences over renegade cards, depth.
pub const DEFAULT_A_STAR_WEIGHTS: [f64; 5] = [0.5, 0.0, 0.3, 0.0, 0.2];

pub const PRESETS: [&str; 9] = [
    "freecell",
    "bakers-game",
    "eight-off",
    "forecell",
    "seahaven-towers",
    "relaxed-freecell",
    "simple-simon",
    "klondike",
    "gypsy",
];

macro_rules! str_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($variant:ident => $text:literal $(| $alias:literal)*),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text $(| $alias)* => Ok($name::$variant),)+
                    _ => Err(format!("unknown {} '{s}'", stringify!($name))),
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                let text = match self {
                    $($name::$variant => $text,)+
                };
                f.write_str(text)
            }
        }
    };
}

str_enum! {
    /// Which card may be placed on top of another in a stack.
    BuildBy {
        Suit => "suit",
        Rank => "rank",
        AlternateColor => "alternate-color" | "alt-color",
    }
}

str_enum! {
    /// Which cards may be moved into an empty stack.
    EmptyStacksFill {
        AnyCard => "any-card" | "any",
        KingsOnly => "kings-only" | "kings",
        None => "none",
    }
}

str_enum! {
    TalonType {
        None => "none",
        Gypsy => "gypsy",
        Klondike => "klondike",
    }
}

str_enum! {
    /// Selects the battery of tests.
    GameFamily {
        Freecell => "freecell",
        SimpleSimon => "simple-simon",
    }
}

str_enum! {
    Method {
        HardDfs => "hard-dfs" | "dfs",
        SoftDfs => "soft-dfs",
        RandomDfs => "random-dfs",
        Bfs => "bfs",
        AStar => "a-star" | "astar",
    }
}

str_enum! {
    /// Physical layout of stored states.
    StateFlavor {
        Debug => "debug",
        Compact => "compact",
        Indirect => "indirect",
    }
}

str_enum! {
    StorageBackend {
        Avl => "avl",
        AvlRb => "avl-rb" | "avlrb",
        Rb => "rb",
        Glib => "glib",
        Hash => "hash",
    }
}

impl StorageBackend {
    pub fn tree_kind(self) -> Option<TreeKind> {
        match self {
            StorageBackend::Avl => Some(TreeKind::Avl),
            StorageBackend::AvlRb => Some(TreeKind::AvlRb),
            StorageBackend::Rb => Some(TreeKind::Rb),
            StorageBackend::Glib => Some(TreeKind::Glib),
            StorageBackend::Hash => None,
        }
    }
}

/// The rules of one solitaire variant.
#[derive(Debug, Clone, PartialEq)]
pub struct GameConfig {
    pub family: GameFamily,
    pub freecells: usize,
    pub stacks: usize,
    pub decks: usize,
    pub build_by: BuildBy,
    pub unlimited_sequence_move: bool,
    pub empty_stacks_fill: EmptyStacksFill,
    pub talon: TalonType,
    /// Cards turned per draw in Klondike.
    pub draw_count: usize,
    /// `None` allows any number of redeals.
    pub max_redeals: Option<u8>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            family: GameFamily::Freecell,
            freecells: 4,
            stacks: 8,
            decks: 1,
            build_by: BuildBy::AlternateColor,
            unlimited_sequence_move: false,
            empty_stacks_fill: EmptyStacksFill::AnyCard,
            talon: TalonType::None,
            draw_count: 1,
            max_redeals: None,
        }
    }
}

impl GameConfig {
    pub fn preset(name: &str) -> Option<Self> {
        let base = Self::default();
        let game = match name {
            "freecell" => base,
            "bakers-game" => Self {
                build_by: BuildBy::Suit,
                ..base
            },
            "eight-off" => Self {
                freecells: 8,
                build_by: BuildBy::Suit,
                empty_stacks_fill: EmptyStacksFill::KingsOnly,
                ..base
            },
            "forecell" => Self {
                empty_stacks_fill: EmptyStacksFill::KingsOnly,
                ..base
            },
            "seahaven-towers" => Self {
                stacks: 10,
                build_by: BuildBy::Suit,
                empty_stacks_fill: EmptyStacksFill::KingsOnly,
                ..base
            },
            "relaxed-freecell" => Self {
                unlimited_sequence_move: true,
                ..base
            },
            "simple-simon" => Self {
                family: GameFamily::SimpleSimon,
                freecells: 0,
                stacks: 10,
                build_by: BuildBy::Suit,
                unlimited_sequence_move: true,
                ..base
            },
            "klondike" => Self {
                freecells: 0,
                stacks: 7,
                unlimited_sequence_move: true,
                empty_stacks_fill: EmptyStacksFill::KingsOnly,
                talon: TalonType::Klondike,
                ..base
            },
            "gypsy" => Self {
                freecells: 0,
                decks: 2,
                unlimited_sequence_move: true,
                talon: TalonType::Gypsy,
                ..base
            },
            _ => return None,
        };
        Some(game)
    }

    pub fn has_talon(&self) -> bool {
        self.talon != TalonType::None
    }
}

/// Ceilings that suspend or prune the search. `None` means unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Limits {
    /// Maximum number of checked (visited) states.
    pub max_iterations: Option<u64>,
    pub max_depth: Option<u32>,
    pub max_stored_states: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SolverConfig {
    pub game: GameConfig,
    pub method: Method,
    pub flavor: StateFlavor,
    pub states_backend: StorageBackend,
    pub stacks_backend: StorageBackend,
    pub limits: Limits,
    /// Seed of the random DFS generator.
    pub seed: u64,
    pub a_star_weights: [f64; 5],
    /// Test ids in the order they are tried, e.g. `01[23]4`.
    pub tests_order: Option<String>,
    /// Shorten the solution with a BFS restricted to its states.
    pub optimize: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            game: GameConfig::default(),
            method: Method::SoftDfs,
            flavor: StateFlavor::Compact,
            states_backend: StorageBackend::Avl,
            stacks_backend: StorageBackend::Avl,
            limits: Limits::default(),
            seed: 24,
            a_star_weights: DEFAULT_A_STAR_WEIGHTS,
            tests_order: None,
            optimize: false,
        }
    }
}

impl SolverConfig {
    pub fn new(game: GameConfig) -> Self {
        Self {
            game,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<(), SolverError> {
        let game = &self.game;
        if game.stacks == 0 || game.stacks > MAX_STACKS {
            return Err(SolverError::Config(format!(
                "the number of stacks must be between 1 and {MAX_STACKS}"
            )));
        }
        if game.freecells > MAX_FREECELLS {
            return Err(SolverError::Config(format!(
                "at most {MAX_FREECELLS} freecells are supported"
            )));
        }
        if game.decks == 0 || game.decks > MAX_DECKS {
            return Err(SolverError::Config(format!(
                "the number of decks must be between 1 and {MAX_DECKS}"
            )));
        }
        if game.talon == TalonType::Klondike && game.draw_count == 0 {
            return Err(SolverError::Config("draw count must be positive".into()));
        }
        if game.family == GameFamily::SimpleSimon && game.has_talon() {
            return Err(SolverError::Config(
                "Simple Simon games do not have a talon".into(),
            ));
        }
        if self.a_star_weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(SolverError::Config(
                "A* weights must be non-negative numbers".into(),
            ));
        }
        if self.a_star_weights.iter().sum::<f64>() <= 0.0 {
            return Err(SolverError::Config(
                "at least one A* weight must be positive".into(),
            ));
        }
        Ok(())
    }

    /// A* weights scaled to sum to one.
    pub fn normalized_weights(&self) -> [f64; 5] {
        let sum: f64 = self.a_star_weights.iter().sum();
        self.a_star_weights.map(|w| w / sum)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets() {
        for name in PRESETS {
            let game = GameConfig::preset(name).unwrap();
            SolverConfig::new(game).validate().unwrap();
        }
        assert!(GameConfig::preset("spider").is_none());
        let eight_off = GameConfig::preset("eight-off").unwrap();
        assert_eq!(eight_off.freecells, 8);
        assert_eq!(eight_off.empty_stacks_fill, EmptyStacksFill::KingsOnly);
        assert_eq!(GameConfig::preset("gypsy").unwrap().decks, 2);
    }

    #[test]
    fn test_enum_names() {
        for method in Method::ALL {
            assert_eq!(method.to_string().parse::<Method>(), Ok(*method));
        }
        for backend in StorageBackend::ALL {
            assert_eq!(backend.to_string().parse::<StorageBackend>(), Ok(*backend));
        }
        assert_eq!("astar".parse::<Method>(), Ok(Method::AStar));
        assert_eq!(StorageBackend::Hash.tree_kind(), None);
        assert!("kings-or-queens".parse::<EmptyStacksFill>().is_err());
    }

    #[test]
    fn test_validate() {
        let mut config = SolverConfig::default();
        config.a_star_weights = [0.0; 5];
        assert!(matches!(config.validate(), Err(SolverError::Config(_))));

        let mut config = SolverConfig::default();
        config.game.stacks = 0;
        assert!(config.validate().is_err());

        let mut config = SolverConfig::new(GameConfig::preset("simple-simon").unwrap());
        config.game.talon = TalonType::Gypsy;
        assert!(config.validate().is_err());

        let config = SolverConfig {
            a_star_weights: [1.0, 1.0, 2.0, 0.0, 0.0],
            ..Default::default()
        };
        assert_eq!(config.normalized_weights(), [0.25, 0.25, 0.5, 0.0, 0.0]);
    }
}
