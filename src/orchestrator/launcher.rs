use std::path::Path;
use std::process::{ExitStatus, Stdio};

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use crate::orchestrator::outcome::OrchestratorError;

/// Combined stdout+stderr of a blocking invocation, plus its exit status.
/// Script units classify success by substring matching on `text`.
#[derive(Debug)]
pub struct CombinedOutput {
    pub status: ExitStatus,
    pub text: String,
}

impl CombinedOutput {
    pub fn contains(&self, marker: &str) -> bool {
        self.text.contains(marker)
    }
}

/// Launch a long-running unit detached from our own lifetime.
///
/// The caller composes the full shell line (`nohup ... > log 2>&1 &`) so
/// redirection and backgrounding work uniformly across launch targets.
/// The `sh` wrapper exits as soon as the job is backgrounded; we await it
/// only to reap the wrapper.
pub async fn spawn_detached(command: &str, working_dir: &Path) -> Result<(), OrchestratorError> {
    debug!(dir = %working_dir.display(), "spawning detached: sh -c {:?}", command);

    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .spawn()?;
    child.wait().await?;
    Ok(())
}

/// Run a short-lived process to completion, capturing stdout and stderr
/// into one combined buffer.
///
/// Both streams are drained on independent concurrent tasks and both are
/// awaited before the process is reported finished; draining them
/// sequentially can deadlock the child once its pipe buffer fills.
///
/// When `stdin_line` is given it is written to the child's stdin followed
/// by a newline, then stdin is closed (password piping for tool scripts).
pub async fn run_blocking(
    program: &str,
    args: &[String],
    working_dir: &Path,
    stdin_line: Option<&str>,
) -> Result<CombinedOutput, OrchestratorError> {
    debug!(
        program,
        ?args,
        dir = %working_dir.display(),
        "running blocking process"
    );

    let mut cmd = Command::new(program);
    cmd.args(args)
        .current_dir(working_dir)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if stdin_line.is_some() {
        cmd.stdin(Stdio::piped());
    }

    let mut child = cmd.spawn()?;

    if let Some(line) = stdin_line {
        // Write then drop so the child sees EOF after the single line.
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(line.as_bytes()).await?;
            stdin.write_all(b"\n").await?;
            stdin.flush().await?;
        }
    }

    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    let stdout_handle = tokio::spawn(drain_lines(stdout, false));
    let stderr_handle = tokio::spawn(drain_lines(stderr, true));

    let status = child.wait().await?;

    let stdout_text = stdout_handle.await.unwrap_or_default();
    let stderr_text = stderr_handle.await.unwrap_or_default();

    debug!(code = ?status.code(), "process exited");

    let mut text = stdout_text;
    text.push_str(&stderr_text);
    Ok(CombinedOutput {
        status,
        text: text.trim_end().to_string(),
    })
}

async fn drain_lines<R>(stream: Option<R>, is_stderr: bool) -> String
where
    R: tokio::io::AsyncRead + Unpin,
{
    let mut collected = String::new();
    if let Some(out) = stream {
        let mut reader = BufReader::new(out);
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    debug!(stderr = is_stderr, "[output] {}", line.trim_end());
                    collected.push_str(&line);
                }
                Err(e) => {
                    warn!(stderr = is_stderr, error = %e, "output read error");
                    break;
                }
            }
        }
    }
    collected
}
