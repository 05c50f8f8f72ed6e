//! This crate solves FreeCell-like, Simple Simon and talon solitaire games by
//! searching the space of reachable boards.
//!
//! A deal is turned into a canonical root state, a search strategy pulls
//! states from its frontier, a rule set derives the legal successors and the
//! state store drops every successor that was seen before. Once a solved state
//! is reached its parent chain is replayed against the original deal to
//! produce the move list.
mod config;
mod error;
mod moves;
mod rules;
mod search;
mod solution;
mod solver;
mod state;
mod store;

pub mod tree;

pub use crate::config::{
    BuildBy, EmptyStacksFill, GameConfig, GameFamily, Limits, Method, PRESETS, SolverConfig,
    StateFlavor, StorageBackend, TalonType,
};
pub use crate::error::{InvalidState, SolverError};
pub use crate::solver::{SolveResult, Solver, SolverStatus, Stats, solve};
