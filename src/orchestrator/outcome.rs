use std::fmt;
use std::path::PathBuf;

use serde::Serialize;

/// What a registered unit is, which decides how it is started, stopped,
/// and checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitKind {
    #[serde(rename = "server")]
    ApplicationServer,
    #[serde(rename = "blockchain")]
    BlockchainNetwork,
    Database,
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitKind::ApplicationServer => "server",
            UnitKind::BlockchainNetwork => "blockchain",
            UnitKind::Database => "database",
        };
        f.write_str(s)
    }
}

/// Observed state of a unit. There is no stored state machine behind
/// this; every value comes from a live probe, script run, or log read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum UnitState {
    Up,
    Down,
    Error,
    Unknown,
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            UnitState::Up => "UP",
            UnitState::Down => "DOWN",
            UnitState::Error => "ERROR",
            UnitState::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// An orchestratable unit as resolved from configuration: its stable
/// name, the port it owns, and where its executable lives.
#[derive(Debug, Clone)]
pub struct UnitDescriptor {
    pub name: String,
    pub port: u16,
    pub kind: UnitKind,
    pub executable: PathBuf,
    pub working_dir: PathBuf,
}

/// Result of one lifecycle operation on one unit.
#[derive(Debug, Clone, Serialize)]
pub struct OperationOutcome {
    pub unit: String,
    pub state: UnitState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl OperationOutcome {
    pub fn new(unit: impl Into<String>, state: UnitState) -> Self {
        Self {
            unit: unit.into(),
            state,
            message: None,
        }
    }

    pub fn with_message(
        unit: impl Into<String>,
        state: UnitState,
        message: impl Into<String>,
    ) -> Self {
        Self {
            unit: unit.into(),
            state,
            message: Some(message.into()),
        }
    }

    /// Fold an error into an outcome at the operation boundary. A timed
    /// out unit is simply Down; anything else is an Error carrying the
    /// failure text.
    pub fn from_error(unit: impl Into<String>, error: &OrchestratorError) -> Self {
        let state = match error {
            OrchestratorError::Timeout { .. } => UnitState::Down,
            _ => UnitState::Error,
        };
        Self::with_message(unit, state, error.to_string())
    }
}

/// Aggregate of a multi-unit operation. `succeeded` counts outcomes that
/// landed in the state the operation was driving toward.
#[derive(Debug, Serialize)]
pub struct BatchResult {
    pub succeeded: usize,
    pub outcomes: Vec<OperationOutcome>,
}

impl BatchResult {
    pub fn new() -> Self {
        Self {
            succeeded: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: OperationOutcome, wanted: UnitState) {
        if outcome.state == wanted {
            self.succeeded += 1;
        }
        self.outcomes.push(outcome);
    }

    pub fn total(&self) -> usize {
        self.outcomes.len()
    }
}

impl Default for BatchResult {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, thiserror::Error)]
pub enum OrchestratorError {
    #[error("no unit registered on port {0}")]
    NotFound(u16),

    #[error("executable not found: {0}")]
    MissingExecutable(PathBuf),

    #[error("process exited with code {code:?}: {output}")]
    ProcessFailed { code: Option<i32>, output: String },

    #[error("timed out waiting on {url} after {attempts} attempt(s)")]
    Timeout { url: String, attempts: u32 },

    #[error("request to {url} failed: {source}")]
    RemoteCallFailed {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}
