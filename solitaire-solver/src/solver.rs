use crate::config::{Limits, SolverConfig};
use crate::error::SolverError;
use crate::search::{SearchOutcome, SearchStrategy, SolverContext, optimize, strategy_for};
use crate::solution::extract;
use crate::state::{Locations, StateData};
use crate::store::StateId;

use anyhow::{Result, bail};
use log::{debug, info};
use solitaire_common::action::Action;
use solitaire_common::board::{Board, Stack, Talon};
use solitaire_common::card::MAX_SUIT;
use std::time::{Duration, Instant};

/// Solves `board` with `config` in one go.
pub fn solve(board: Board, config: SolverConfig) -> Result<SolveResult> {
    let mut solver = Solver::new(config)?;
    solver.set_board(board)?;
    match solver.solve()? {
        SolverStatus::Solved => match solver.result() {
            Some(result) => Ok(result),
            None => bail!("No solution found."),
        },
        SolverStatus::Unsolvable => bail!("No solution found."),
        SolverStatus::Suspended | SolverStatus::Unstarted => {
            let stats = solver.stats();
            bail!(
                "Unable to solve the game; reached the search limits after {} states.",
                stats.checked
            )
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SolverStatus {
    Unstarted,
    Solved,
    Unsolvable,
    /// A limit stopped the search; raise it and call [`Solver::resume`].
    Suspended,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub checked: u64,
    pub stored: usize,
    pub max_depth: u32,
    pub elapsed: Duration,
}

#[derive(Debug, Clone)]
pub struct SolveResult {
    pub actions: Vec<Action>,
    pub elapsed: Duration,
    /// States checked.
    pub states: u64,
    pub stored: usize,
    /// Number of states on the solution path after the initial one.
    pub depth: u32,
    pub optimized: bool,
}

/// A solver for one deal.
///
/// `set_board` validates the deal against the configured game, `solve` runs
/// the configured search and `resume` continues a suspended one.
#[derive(Debug)]
pub struct Solver {
    config: SolverConfig,
    board: Option<Board>,
    initial: Option<StateData>,
    ctx: Option<SolverContext>,
    strategy: Option<Box<dyn SearchStrategy>>,
    status: SolverStatus,
    solved: Option<StateId>,
    actions: Vec<Action>,
    elapsed: Duration,
}

impl Solver {
    pub fn new(config: SolverConfig) -> Result<Self, SolverError> {
        config.validate()?;
        Ok(Self {
            config,
            board: None,
            initial: None,
            ctx: None,
            strategy: None,
            status: SolverStatus::Unstarted,
            solved: None,
            actions: Vec::new(),
            elapsed: Duration::ZERO,
        })
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Takes a deal, fills in the containers it leaves out and checks it.
    pub fn set_board(&mut self, mut board: Board) -> Result<(), SolverError> {
        let game = &self.config.game;
        let foundations = game.decks * MAX_SUIT as usize;
        if board.stacks.len() > game.stacks {
            return Err(SolverError::Config(format!(
                "the deal has {} stacks but the game has {}",
                board.stacks.len(),
                game.stacks
            )));
        }
        if board.freecells.len() > game.freecells {
            return Err(SolverError::Config(format!(
                "the deal has {} freecells but the game has {}",
                board.freecells.len(),
                game.freecells
            )));
        }
        if board.foundations.len() > foundations {
            return Err(SolverError::Config(format!(
                "the deal has {} foundations but the game has {foundations}",
                board.foundations.len()
            )));
        }
        board.stacks.resize(game.stacks, Stack::new());
        board.freecells.resize(game.freecells, None);
        board.foundations.resize(foundations, 0);
        match (board.talon.is_some(), game.has_talon()) {
            (true, false) => {
                return Err(SolverError::Config(
                    "the deal has a talon but the game has none".into(),
                ));
            }
            (false, true) => board.talon = Some(Talon::default()),
            _ => {}
        }
        if let Some(talon) = board.talon.as_mut() {
            talon.draw_count = game.draw_count;
        }
        for stack in board.stacks.iter_mut() {
            if let Some(top) = stack.last_mut() {
                *top = top.face_up();
            }
        }

        let state = StateData::from_board(&board);
        state.check_validity(game.decks)?;
        let locs = Locations::identity(state.stacks.len(), state.freecells.len());
        let ctx = SolverContext::new(self.config.clone(), state.clone(), locs)?;

        self.strategy = Some(strategy_for(&self.config));
        self.ctx = Some(ctx);
        self.initial = Some(state);
        self.board = Some(board);
        self.status = SolverStatus::Unstarted;
        self.solved = None;
        self.actions.clear();
        self.elapsed = Duration::ZERO;
        Ok(())
    }

    /// The deal as the solver sees it, with every container of the game.
    pub fn board(&self) -> Option<&Board> {
        self.board.as_ref()
    }

    pub fn solve(&mut self) -> Result<SolverStatus, SolverError> {
        if self.ctx.is_none() {
            return Err(SolverError::NoBoard);
        }
        if self.status != SolverStatus::Unstarted {
            return Ok(self.status);
        }
        info!(
            "Solving with {} ({} states in {}, tests order {})",
            self.config.method,
            self.config.flavor,
            self.config.states_backend,
            self.config.tests_order.as_deref().unwrap_or("default")
        );
        self.run()
    }

    pub fn resume(&mut self) -> Result<SolverStatus, SolverError> {
        if self.status != SolverStatus::Suspended {
            return Err(SolverError::NotSuspended);
        }
        debug!("Resuming after {} checked states", self.stats().checked);
        self.run()
    }

    /// Replaces the search ceilings, typically to raise them before
    /// [`Solver::resume`].
    pub fn set_limits(&mut self, limits: Limits) {
        self.config.limits = limits;
        if let Some(ctx) = self.ctx.as_mut() {
            ctx.config.limits = limits;
            ctx.store.set_limits(limits);
        }
    }

    pub fn status(&self) -> SolverStatus {
        self.status
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn stats(&self) -> Stats {
        let Some(ctx) = self.ctx.as_ref() else {
            return Stats::default();
        };
        Stats {
            checked: ctx.store.checked(),
            stored: ctx.store.len(),
            max_depth: ctx.store.max_depth(),
            elapsed: self.elapsed,
        }
    }

    pub fn result(&self) -> Option<SolveResult> {
        let (ctx, solved) = (self.ctx.as_ref()?, self.solved?);
        Some(SolveResult {
            actions: self.actions.clone(),
            elapsed: self.elapsed,
            states: ctx.store.checked(),
            stored: ctx.store.len(),
            depth: ctx.store.node(solved).depth,
            optimized: self.config.optimize,
        })
    }

    fn run(&mut self) -> Result<SolverStatus, SolverError> {
        let (Some(ctx), Some(strategy), Some(initial)) = (
            self.ctx.as_mut(),
            self.strategy.as_mut(),
            self.initial.as_ref(),
        ) else {
            return Err(SolverError::NoBoard);
        };

        let timer = Instant::now();
        let outcome = strategy.run(ctx);
        self.status = match outcome {
            SearchOutcome::Solved(id) => {
                let id = if self.config.optimize {
                    optimize(ctx, id)
                } else {
                    id
                };
                self.actions = extract(ctx, initial, id);
                self.solved = Some(id);
                SolverStatus::Solved
            }
            SearchOutcome::Exhausted => SolverStatus::Unsolvable,
            SearchOutcome::Suspended => SolverStatus::Suspended,
        };
        self.elapsed += timer.elapsed();

        let (checked, stored) = (ctx.store.checked(), ctx.store.len());
        match self.status {
            SolverStatus::Solved => info!(
                "Solved in {:?}: {} actions, {checked} states checked, {stored} stored",
                self.elapsed,
                self.actions.len()
            ),
            SolverStatus::Unsolvable => {
                info!("No solution after {checked} states checked, {stored} stored")
            }
            _ => info!("Suspended after {checked} states checked, {stored} stored"),
        }
        if ctx.store.interned_stacks() > 0 {
            debug!("{} distinct stacks interned", ctx.store.interned_stacks());
        }
        Ok(self.status)
    }
}
