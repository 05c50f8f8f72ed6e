use anyhow::{Result, bail};
use log::info;
use solitaire_common::{action::Action, board::Board};
use solitaire_solver::{SolveResult, Solver, SolverConfig, SolverStatus};

use std::{
    io::{IsTerminal, Write, stderr},
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

/// Solves `board`, suspending every `step` checked states to report progress
/// when a step is given.
pub fn do_solve(
    board: Board,
    mut config: SolverConfig,
    step: Option<u64>,
) -> Result<Vec<Action>> {
    println!("{}\n", board.to_pretty_string());

    let ceiling = config.limits.max_iterations;
    if let Some(step) = step {
        config.limits.max_iterations = Some(ceiling.map_or(step, |max| max.min(step)));
    }
    let mut solver = Solver::new(config)?;
    solver.set_board(board)?;

    let mut status = with_spinner("Solving the game...", || solver.solve())?;
    while let (SolverStatus::Suspended, Some(step)) = (status, step) {
        let stats = solver.stats();
        if ceiling.is_some_and(|max| stats.checked >= max) {
            break;
        }
        info!(
            "{} states checked, {} stored, depth {}",
            stats.checked, stats.stored, stats.max_depth
        );
        let mut limits = solver.config().limits;
        let next = stats.checked + step;
        limits.max_iterations = Some(ceiling.map_or(next, |max| max.min(next)));
        solver.set_limits(limits);
        status = with_spinner("Solving the game...", || solver.resume())?;
    }

    let result = match (status, solver.result()) {
        (SolverStatus::Solved, Some(result)) => result,
        (SolverStatus::Suspended, _) => bail!(
            "Unable to solve the game; reached the search limits after {} states.",
            solver.stats().checked
        ),
        _ => bail!("No solution found."),
    };
    let SolveResult {
        actions,
        elapsed,
        states,
        stored,
        optimized,
        ..
    } = result;
    let total_moves = actions.iter().filter(|a| a.is_move()).count();
    let redeal_count = actions.iter().filter(|a| a.is_redeal()).count();
    let elapsed_str = format_elapsed(elapsed);
    let mut steps_str = format!("{} Moves", total_moves - redeal_count);
    if redeal_count > 0 {
        steps_str.push_str(&format!(", {redeal_count} Redeal"));
        if redeal_count > 1 {
            steps_str.push('s');
        }
    };
    println!(
        "✓ Solved in {steps_str} (Optimized: {optimized}, Time: {elapsed_str}, \
         States: {states}, Stored: {stored})\n"
    );
    Ok(actions)
}

fn with_spinner<T, F: FnOnce() -> T>(message: &str, f: F) -> T {
    if stderr().is_terminal() {
        let spinning = Arc::new(AtomicBool::new(true));
        let spinning_clone = Arc::clone(&spinning);
        let message = message.to_string();

        let handle = std::thread::spawn(move || {
            let spinner_chars = ['|', '/', '-', '\\'];
            let mut i = 0;
            let mut handle = stderr();

            let _ = write!(handle, "\x1b[?25l"); // hide cursor
            let _ = handle.flush();

            while spinning_clone.load(Ordering::Relaxed) {
                let spinner_char = spinner_chars[i % spinner_chars.len()];
                let _ = write!(handle, "\r{spinner_char} {message}");
                let _ = handle.flush();
                std::thread::sleep(Duration::from_millis(100));
                i += 1;
            }

            let _ = write!(handle, "\r\x1b[2K\r\x1b[?25h"); // clear line and show cursor
            let _ = handle.flush();
        });

        let result = f();
        spinning.store(false, Ordering::Relaxed);
        let _ = handle.join();
        result
    } else {
        f()
    }
}

fn format_elapsed(elapsed: Duration) -> String {
    let secs = elapsed.as_secs();
    if secs < 90 {
        let ms = elapsed.subsec_millis();
        format!("{secs}.{ms:03}s")
    } else {
        let minutes = secs / 60;
        let secs = secs % 60;
        format!("{minutes}m {secs}s")
    }
}
