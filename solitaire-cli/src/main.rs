mod utils;

use crate::utils::*;

use anyhow::{Context, Result, bail};
use clap::Parser;
use log::LevelFilter;
use solitaire_common::{action::format_actions, board::Board};
use solitaire_solver::{
    BuildBy, EmptyStacksFill, GameConfig, GameFamily, Method, PRESETS, SolverConfig, StateFlavor,
    StorageBackend, TalonType,
};

use std::{
    io::{IsTerminal, Read, stdin},
    path::PathBuf,
};

#[derive(Parser)]
#[command(author, version, about)]
struct Cli {
    /// Game variant whose rules are used
    #[arg(
        short,
        long,
        default_value = "freecell",
        value_parser = clap::builder::PossibleValuesParser::new(PRESETS),
    )]
    game: String,
    /// Number of freecells
    #[arg(long, value_name = "NUM")]
    freecells: Option<usize>,
    /// Number of stacks
    #[arg(long, value_name = "NUM")]
    stacks: Option<usize>,
    /// Number of decks
    #[arg(long, value_name = "NUM")]
    decks: Option<usize>,
    /// Which cards may be built on each other (suit, rank, alternate-color)
    #[arg(long, value_name = "RULE")]
    build_by: Option<BuildBy>,
    /// Move whole sequences regardless of free space
    #[arg(long)]
    unlimited_sequence_move: bool,
    /// Which cards may fill an empty stack (any-card, kings-only, none)
    #[arg(long, value_name = "RULE")]
    empty_stacks_fill: Option<EmptyStacksFill>,
    /// Talon type (none, gypsy, klondike)
    #[arg(long, value_name = "TYPE")]
    talon: Option<TalonType>,
    /// Family of move generators (freecell, simple-simon)
    #[arg(long, value_name = "FAMILY")]
    family: Option<GameFamily>,
    /// Cards drawn per turn in Klondike
    #[arg(short, long, value_name = "NUM")]
    draw: Option<usize>,
    /// Max number of talon redeals
    #[arg(long, value_name = "NUM")]
    max_redeals: Option<u8>,
    /// Search method (hard-dfs, soft-dfs, random-dfs, bfs, a-star)
    #[arg(short, long, default_value = "soft-dfs", value_name = "METHOD")]
    method: Method,
    /// Layout of stored states (debug, compact, indirect)
    #[arg(long, default_value = "compact", value_name = "FLAVOR")]
    flavor: StateFlavor,
    /// Storage of visited states (avl, avl-rb, rb, glib, hash)
    #[arg(long, default_value = "avl", value_name = "BACKEND")]
    states_backend: StorageBackend,
    /// Storage of interned stacks in the indirect flavor
    #[arg(long, default_value = "avl", value_name = "BACKEND")]
    stacks_backend: StorageBackend,
    /// Max states to store
    #[arg(short = 's', long, value_name = "NUM")]
    max_states: Option<usize>,
    /// Max states to check
    #[arg(short = 'i', long, value_name = "NUM")]
    max_iterations: Option<u64>,
    /// Max solution depth
    #[arg(long, value_name = "NUM")]
    max_depth: Option<u32>,
    /// Suspend every NUM checked states and report progress
    #[arg(long, value_name = "NUM")]
    step: Option<u64>,
    /// Seed of the random DFS
    #[arg(long, default_value_t = 24, value_name = "SEED")]
    seed: u64,
    /// A* weights, comma separated (5 numbers)
    #[arg(long, value_delimiter = ',', value_name = "W1,..,W5")]
    weights: Option<Vec<f64>>,
    /// Order of the move tests, e.g. "01[23]4"
    #[arg(short, long, value_name = "ORDER")]
    tests_order: Option<String>,
    /// Shorten the solution once found
    #[arg(short, long)]
    optimize: bool,
    /// Preview initial game state without solving
    #[arg(short, long)]
    preview: bool,
    /// Log more (-v info, -vv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
    /// Path to a game state file to solve
    file: Option<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logger(cli.verbose);

    let board = if let Some(file) = &cli.file {
        let content = std::fs::read_to_string(file)
            .with_context(|| format!("Failed to read '{}'", file.display()))?;
        Board::parse(&content).context("Failed to parse board")?
    } else if !stdin().is_terminal() {
        let mut content = String::new();
        stdin()
            .read_to_string(&mut content)
            .context("Failed to read from stdin")?;
        Board::parse(&content).context("Failed to parse board")?
    } else {
        bail!("No game state `file` provided.");
    };
    if cli.preview {
        println!("{}", board.to_pretty_string());
        return Ok(());
    }

    let config = build_config(&cli, &board)?;
    let actions = do_solve(board, config, cli.step)?;
    println!("{}", format_actions(&actions));

    Ok(())
}

fn init_logger(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new()
        .filter_level(level)
        .parse_default_env()
        .format_timestamp_millis()
        .init();
}

fn build_config(cli: &Cli, board: &Board) -> Result<SolverConfig> {
    let Some(mut game) = GameConfig::preset(&cli.game) else {
        bail!("Unknown game '{}'", cli.game);
    };
    if let Some(freecells) = cli.freecells {
        game.freecells = freecells;
    }
    if let Some(stacks) = cli.stacks {
        game.stacks = stacks;
    }
    if let Some(decks) = cli.decks {
        game.decks = decks;
    }
    if let Some(build_by) = cli.build_by {
        game.build_by = build_by;
    }
    if cli.unlimited_sequence_move {
        game.unlimited_sequence_move = true;
    }
    if let Some(fill) = cli.empty_stacks_fill {
        game.empty_stacks_fill = fill;
    }
    if let Some(talon) = cli.talon {
        game.talon = talon;
    }
    if let Some(family) = cli.family {
        game.family = family;
    }
    if cli.max_redeals.is_some() {
        game.max_redeals = cli.max_redeals;
    }
    // A `DrawCount:` line in the deal applies unless overridden.
    match (cli.draw, &board.talon) {
        (Some(draw_count), _) => game.draw_count = draw_count,
        (None, Some(talon)) => game.draw_count = talon.draw_count,
        _ => {}
    }

    let mut config = SolverConfig {
        method: cli.method,
        flavor: cli.flavor,
        states_backend: cli.states_backend,
        stacks_backend: cli.stacks_backend,
        seed: cli.seed,
        tests_order: cli.tests_order.clone(),
        optimize: cli.optimize,
        ..SolverConfig::new(game)
    };
    config.limits.max_stored_states = cli.max_states;
    config.limits.max_iterations = cli.max_iterations;
    config.limits.max_depth = cli.max_depth;
    if let Some(weights) = &cli.weights {
        config.a_star_weights = weights
            .as_slice()
            .try_into()
            .with_context(|| format!("Expected 5 A* weights, got {}", weights.len()))?;
    }
    Ok(config)
}
