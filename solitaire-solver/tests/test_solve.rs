//! End-to-end solving scenarios.

use solitaire_common::action::{Action, format_actions};
use solitaire_common::board::Board;
use solitaire_common::card::Card;
use solitaire_solver::{
    EmptyStacksFill, GameConfig, Limits, Method, SolverConfig, SolverError, Solver, SolverStatus, StateFlavor,
    StorageBackend, solve,
};

fn game(stacks: usize, freecells: usize) -> GameConfig {
    GameConfig {
        stacks,
        freecells,
        ..Default::default()
    }
}

fn solver_for(board: &str, config: SolverConfig) -> Solver {
    let mut solver = Solver::new(config).unwrap();
    solver.set_board(Board::parse(board).unwrap()).unwrap();
    solver
}

/// Replays the solver's actions on its own copy of the deal.
fn replays_to_solved(solver: &Solver) -> bool {
    let mut board = solver.board().unwrap().clone();
    for action in solver.actions() {
        board.apply_action(action).unwrap();
    }
    board.is_solved()
}

const TWO_SPADES: &str = "Foundations: H-K C-K D-K S-J
Freecells: -
: KS QS
";

const BLOCKED: &str = "Foundations: H-K C-K D-J S-J
: QS KD
: QD KS
";

const THREE_SPADES: &str = "Foundations: H-K C-K D-K S-T
: KS QS JS
";

const KINGS_ON_QUEENS: &str = "Foundations: H-J C-J D-J S-J
: QH KC
: QC KD
: QD KS
: QS KH
";

const SMALL_DEAL: &str = "Foundations: H-6 C-6 D-6 S-6
Freecells: - - - -
: KH 9C 7D
: QS JD 8H
: TC 7S KD
: 9H QD 8S
: JC TH 7C
: KS 9D 8C
: QH JS TD
: KC QC TS 9S JH 8D 7H
";

const FULL_DEAL: &str = "Foundations: H-0 C-0 D-0 S-0
Freecells: - - - -
: JD KD 2S 4C 3S 6D 6S
: 2D KC KS 5C TD 8S 9C
: 9H 9S 9D TS 4S 8D 2H
: JC 5S QD QH TH QS 6H
: 5D AD JS 4H 8H 6C
: 7H QC AS AC 2C 3D
: 7C KH AH 4D JH 8C
: 5H 3H 3C 7S 7D TC
";

#[test]
fn test_two_card_deal() {
    let result = solve(
        Board::parse(TWO_SPADES).unwrap(),
        SolverConfig::new(game(1, 1)),
    )
    .unwrap();
    assert_eq!(
        result.actions,
        [Action::StackToFoundation(0, 3), Action::StackToFoundation(0, 3)]
    );
    let notation = format_actions(&result.actions);
    assert_eq!(notation.split_whitespace().collect::<Vec<_>>(), ["1h", "1h"]);
}

#[test]
fn test_blocked_deal_is_unsolvable() {
    for method in Method::ALL {
        let config = SolverConfig {
            method: *method,
            ..SolverConfig::new(game(2, 0))
        };
        let mut solver = solver_for(BLOCKED, config);
        assert_eq!(solver.solve().unwrap(), SolverStatus::Unsolvable, "{method}");
        assert!(solver.actions().is_empty());
    }
    let err = solve(
        Board::parse(BLOCKED).unwrap(),
        SolverConfig::new(game(2, 0)),
    )
    .unwrap_err();
    assert_eq!(err.to_string(), "No solution found.");
}

#[test]
fn test_suspend_and_resume() {
    for method in Method::ALL {
        let mut config = SolverConfig {
            method: *method,
            ..SolverConfig::new(game(1, 0))
        };
        config.limits.max_iterations = Some(1);
        let mut solver = solver_for(THREE_SPADES, config);
        assert!(matches!(solver.resume(), Err(SolverError::NotSuspended)));
        assert_eq!(solver.solve().unwrap(), SolverStatus::Suspended, "{method}");
        assert_eq!(solver.stats().checked, 1);

        solver.set_limits(Limits::default());
        assert_eq!(solver.resume().unwrap(), SolverStatus::Solved, "{method}");
        assert_eq!(solver.actions().len(), 3);
        assert!(replays_to_solved(&solver));
        assert!(matches!(solver.resume(), Err(SolverError::NotSuspended)));
    }
}

#[test]
fn test_stored_states_ceiling() {
    let mut config = SolverConfig::new(game(4, 2));
    config.limits.max_stored_states = Some(3);
    let mut solver = solver_for(KINGS_ON_QUEENS, config);
    assert_eq!(solver.solve().unwrap(), SolverStatus::Suspended);
    assert!(solver.stats().stored <= 3);
    solver.set_limits(Limits::default());
    assert_eq!(solver.resume().unwrap(), SolverStatus::Solved);
    assert!(replays_to_solved(&solver));
}

#[test]
fn test_a_star_solution_replays() {
    let deal = "Foundations: H-J C-K D-K S-J
Freecells: -
: QS KH
: QH KS
";
    let config = SolverConfig {
        method: Method::AStar,
        ..SolverConfig::new(game(2, 1))
    };
    let result = solve(Board::parse(deal).unwrap(), config).unwrap();
    // KH to the freecell frees QS, then KS, QH and KH follow it home.
    assert_eq!(result.actions.len(), 5);

    let mut board = Board::parse(deal).unwrap();
    for action in &result.actions {
        board.apply_action(action).unwrap();
    }
    assert!(board.is_solved());

    let dfs = solve(Board::parse(deal).unwrap(), SolverConfig::new(game(2, 1))).unwrap();
    assert!(result.actions.len() <= dfs.actions.len());
}

#[test]
fn test_random_dfs_is_reproducible() {
    let run = |seed: u64| {
        let config = SolverConfig {
            method: Method::RandomDfs,
            seed,
            ..SolverConfig::default()
        };
        solve(Board::parse(SMALL_DEAL).unwrap(), config).unwrap()
    };
    let first = run(7);
    let again = run(7);
    assert_eq!(first.actions, again.actions);
    assert_eq!(first.states, again.states);
}

#[test]
fn test_every_method_flavor_and_backend() {
    for method in Method::ALL {
        for flavor in StateFlavor::ALL {
            for backend in StorageBackend::ALL {
                let config = SolverConfig {
                    method: *method,
                    flavor: *flavor,
                    states_backend: *backend,
                    stacks_backend: *backend,
                    ..SolverConfig::new(game(4, 2))
                };
                let mut solver = solver_for(KINGS_ON_QUEENS, config);
                assert_eq!(
                    solver.solve().unwrap(),
                    SolverStatus::Solved,
                    "{method} {flavor} {backend}"
                );
                assert!(replays_to_solved(&solver), "{method} {flavor} {backend}");
            }
        }
    }
}

#[test]
fn test_bfs_finds_the_shallowest_solution() {
    let depth_with = |method: Method, optimize: bool| {
        let config = SolverConfig {
            method,
            optimize,
            ..SolverConfig::new(game(4, 2))
        };
        solve(Board::parse(KINGS_ON_QUEENS).unwrap(), config)
            .unwrap()
            .depth
    };
    let bfs = depth_with(Method::Bfs, false);
    for method in Method::ALL {
        assert!(bfs <= depth_with(*method, false), "{method}");
        assert!(depth_with(*method, true) <= depth_with(*method, false), "{method}");
    }
}

#[test]
fn test_optimize_keeps_a_valid_solution() {
    for method in [Method::SoftDfs, Method::HardDfs, Method::AStar] {
        let config = SolverConfig {
            method,
            optimize: true,
            ..SolverConfig::default()
        };
        let mut solver = solver_for(SMALL_DEAL, config);
        assert_eq!(solver.solve().unwrap(), SolverStatus::Solved, "{method}");
        assert!(replays_to_solved(&solver), "{method}");
        assert!(solver.result().unwrap().optimized);
    }
}

#[test]
fn test_full_deal() {
    let mut config = SolverConfig::default();
    config.limits.max_stored_states = Some(1_000_000);
    let mut solver = solver_for(FULL_DEAL, config);
    assert_eq!(solver.solve().unwrap(), SolverStatus::Solved);
    assert!(replays_to_solved(&solver));
    let stats = solver.stats();
    assert!(stats.checked > 0 && stats.stored >= stats.checked as usize);
}

#[test]
fn test_invalid_deals_are_rejected() {
    let mut solver = Solver::new(SolverConfig::new(game(1, 1))).unwrap();
    assert!(matches!(solver.solve(), Err(SolverError::NoBoard)));

    let missing = "Foundations: H-K C-K D-K S-J
: KS
";
    let err = solver.set_board(Board::parse(missing).unwrap()).unwrap_err();
    assert_eq!(err.to_string(), "Invalid initial board: card QS is missing");

    let too_many = "Foundations: H-K C-K D-K S-J
: KS
: QS
";
    assert!(matches!(
        solver.set_board(Board::parse(too_many).unwrap()),
        Err(SolverError::Config(_))
    ));

    let talon = "Foundations: H-K C-K D-K S-Q
Talon: KS
";
    assert!(matches!(
        solver.set_board(Board::parse(talon).unwrap()),
        Err(SolverError::Config(_))
    ));
}

#[test]
fn test_klondike_deal() {
    let mut game = GameConfig::preset("klondike").unwrap();
    game.stacks = 1;

    let buried = "Foundations: H-J C-K D-K S-Q
Talon: KS
: QH | KH
";
    let mut solver = solver_for(buried, SolverConfig::new(game.clone()));
    assert_eq!(solver.solve().unwrap(), SolverStatus::Unsolvable);

    let deal = "Foundations: H-J C-Q D-K S-Q
Talon: KS KH
: KC | QH
";
    let mut solver = solver_for(deal, SolverConfig::new(game));
    assert_eq!(solver.solve().unwrap(), SolverStatus::Solved);
    assert!(replays_to_solved(&solver));
    assert!(solver.actions().contains(&Action::FlipCard(0)));
}

#[test]
fn test_klondike_draw_three() {
    let mut game = GameConfig::preset("klondike").unwrap();
    game.stacks = 1;
    game.empty_stacks_fill = EmptyStacksFill::None;
    game.draw_count = 3;
    // 7S only shows after a redeal, when draws stop at JS and 7S.
    let deal = "Foundations: H-K C-K D-K S-6
Talon: KS QS JS TS | 9S 7S 8S
:
";
    for method in Method::ALL {
        let config = SolverConfig {
            method: *method,
            ..SolverConfig::new(game.clone())
        };
        let mut solver = solver_for(deal, config);
        assert_eq!(solver.solve().unwrap(), SolverStatus::Solved, "{method}");
        assert!(replays_to_solved(&solver), "{method}");
        assert!(solver.actions().iter().any(|a| a.is_redeal()), "{method}");
    }
}

#[test]
fn test_six_decks_in_one_stack() {
    let game = GameConfig {
        stacks: 1,
        freecells: 0,
        decks: 6,
        ..Default::default()
    };
    let mut board = Board::new(1, 0, 6);
    for rank in (1..=13u8).rev() {
        for suit in 0..4u8 {
            for _ in 0..6 {
                board.stacks[0].push(Card::new(rank, suit));
            }
        }
    }
    for flavor in StateFlavor::ALL {
        let config = SolverConfig {
            flavor: *flavor,
            ..SolverConfig::new(game.clone())
        };
        let mut solver = Solver::new(config).unwrap();
        solver.set_board(board.clone()).unwrap();
        assert_eq!(solver.solve().unwrap(), SolverStatus::Solved, "{flavor}");
        assert_eq!(solver.actions().len(), 312, "{flavor}");
        assert!(replays_to_solved(&solver), "{flavor}");
    }
}

#[test]
fn test_gypsy_deal() {
    let mut game = GameConfig::preset("gypsy").unwrap();
    game.stacks = 2;
    game.decks = 1;
    let board = "Foundations: H-K C-K D-Q S-J
Talon: KD QS
: KS
:
";
    let mut solver = solver_for(board, SolverConfig::new(game));
    assert_eq!(solver.solve().unwrap(), SolverStatus::Solved);
    assert!(replays_to_solved(&solver));
    assert_eq!(solver.actions()[0], Action::DealGypsyTalon);
}

#[test]
fn test_simple_simon_deal() {
    let mut game = GameConfig::preset("simple-simon").unwrap();
    game.stacks = 3;
    let board = "Foundations: H-0 C-K D-K S-K
: KH QH JH TH 9H 8H 7H
: 6H 5H 4H
: 3H 2H AH
";
    let mut solver = solver_for(board, SolverConfig::new(game));
    assert_eq!(solver.solve().unwrap(), SolverStatus::Solved);
    assert!(replays_to_solved(&solver));
    assert_eq!(
        solver.actions().last(),
        Some(&Action::SequenceToFoundation(0, 0))
    );
}
