use std::path::Path;

use crate::orchestrator::launcher::{self, CombinedOutput};
use crate::orchestrator::outcome::OrchestratorError;

// Literal markers emitted by the collaborating scripts. Brittle, but this
// substring contract is the scripts' actual interface and must be
// preserved bit-for-bit.
pub const CHAINCODE_READY_MARKER: &str = "Chaincode initialization is not required";
pub const CHAINCODE_FAILED_MARKER: &str = "Deploying chaincode failed";
pub const CHAIN_STATUS_OK_MARKER: &str = "200";
pub const DATABASE_STARTED_MARKER: &str = "Started";
pub const DATABASE_STOPPED_MARKER: &str = "stop";
pub const DATABASE_HEALTHY_MARKER: &str = "All databases are successfully created";

/// Run `sh <dir>/<script> [args...]` to completion from `dir`, capturing
/// combined output for marker classification. The script must exist; a
/// missing script is reported without spawning anything.
pub async fn run_script(
    dir: &Path,
    script: &str,
    args: &[String],
) -> Result<CombinedOutput, OrchestratorError> {
    let script_path = dir.join(script);
    if !script_path.is_file() {
        return Err(OrchestratorError::MissingExecutable(script_path));
    }

    let mut argv = vec![script_path.to_string_lossy().to_string()];
    argv.extend_from_slice(args);
    launcher::run_blocking("sh", &argv, dir, None).await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_script(dir: &Path, name: &str, body: &str) {
        std::fs::write(dir.join(name), format!("#!/bin/sh\n{body}\n")).unwrap();
    }

    #[tokio::test]
    async fn script_output_is_captured_for_classification() {
        let dir = tempfile::tempdir().unwrap();
        write_script(
            dir.path(),
            "status.sh",
            "echo 'All databases are successfully created'",
        );

        let out = run_script(dir.path(), "status.sh", &[]).await.unwrap();
        assert!(out.contains(DATABASE_HEALTHY_MARKER));
    }

    #[tokio::test]
    async fn script_receives_its_arguments() {
        let dir = tempfile::tempdir().unwrap();
        write_script(dir.path(), "start.sh", "echo \"args:$1:$2\"");

        let out = run_script(
            dir.path(),
            "start.sh",
            &["mychannel".to_string(), "opendid".to_string()],
        )
        .await
        .unwrap();
        assert!(out.contains("args:mychannel:opendid"));
    }

    #[tokio::test]
    async fn missing_script_reports_without_spawning() {
        let dir = tempfile::tempdir().unwrap();
        let err = run_script(dir.path(), "stop.sh", &[]).await.unwrap_err();
        assert!(matches!(err, OrchestratorError::MissingExecutable(_)));
    }
}
