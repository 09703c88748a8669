pub mod init;
pub mod status;
pub mod tools;

use owo_colors::OwoColorize;

use crate::orchestrator::outcome::{BatchResult, OperationOutcome, UnitState};

pub fn colorize_state(state: UnitState) -> String {
    match state {
        UnitState::Up => state.to_string().green().to_string(),
        UnitState::Down => state.to_string().yellow().to_string(),
        UnitState::Error => state.to_string().red().to_string(),
        UnitState::Unknown => state.to_string().dimmed().to_string(),
    }
}

pub fn print_outcome(outcome: &OperationOutcome, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome).expect("outcome serializes"));
        return;
    }
    match &outcome.message {
        Some(msg) => println!("{:<12} {}  ({})", outcome.unit, colorize_state(outcome.state), msg),
        None => println!("{:<12} {}", outcome.unit, colorize_state(outcome.state)),
    }
}

pub fn print_batch(batch: &BatchResult, json: bool) {
    if json {
        println!("{}", serde_json::to_string_pretty(batch).expect("batch serializes"));
        return;
    }
    for outcome in &batch.outcomes {
        print_outcome(outcome, false);
    }
    println!("{} of {} units succeeded", batch.succeeded, batch.total());
}

/// Exit code mirroring: success when every unit reached the wanted state.
pub fn batch_exit_ok(batch: &BatchResult) -> bool {
    batch.succeeded == batch.total()
}
