use std::io::{Read, Seek, SeekFrom};
use std::path::PathBuf;
use std::time::Duration;

use tracing::{debug, info};

use crate::orchestrator::outcome::OrchestratorError;

/// Default pause between polls, both while waiting for the file to appear
/// and between incremental reads.
pub const POLL_INTERVAL: Duration = Duration::from_secs(3);

/// Terminal classification of a log-tail wait.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchVerdict {
    Success,
    Failure,
}

/// Blocking, offset-based incremental reader of a growing log file.
///
/// Used for units whose startup is itself a multi-step asynchronous
/// external process with no health endpoint during bootstrap: the watcher
/// waits for the file to exist and gain content, then repeatedly reopens
/// it, seeks to the last-read offset, and classifies each complete new
/// line against the terminal markers.
///
/// There is deliberately no upper bound on the wait: the caller blocks
/// until a terminal marker appears. Truncation or rotation mid-tail is
/// undefined beyond the per-cycle reopen.
pub struct LogTailWatcher {
    path: PathBuf,
    success_marker: String,
    failure_marker: String,
    poll_interval: Duration,
}

impl LogTailWatcher {
    pub fn new(
        path: impl Into<PathBuf>,
        success_marker: impl Into<String>,
        failure_marker: impl Into<String>,
    ) -> Self {
        Self {
            path: path.into(),
            success_marker: success_marker.into(),
            failure_marker: failure_marker.into(),
            poll_interval: POLL_INTERVAL,
        }
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    fn classify(&self, line: &str) -> Option<WatchVerdict> {
        if line.contains(&self.success_marker) {
            return Some(WatchVerdict::Success);
        }
        if line.contains(&self.failure_marker) {
            return Some(WatchVerdict::Failure);
        }
        None
    }

    /// Wait for a terminal marker line and return the verdict.
    pub async fn wait(&self) -> Result<WatchVerdict, OrchestratorError> {
        info!(log = %self.path.display(), "monitoring bootstrap log");

        // WaitingForFile: existence and non-zero size.
        loop {
            match std::fs::metadata(&self.path) {
                Ok(meta) if meta.len() > 0 => break,
                _ => {
                    debug!(log = %self.path.display(), "waiting for log file");
                    tokio::time::sleep(self.poll_interval).await;
                }
            }
        }

        // Tailing: reopen each cycle, read complete lines past the offset.
        let mut offset: u64 = 0;
        loop {
            let (lines, new_offset) = self.read_new_lines(offset)?;
            offset = new_offset;

            for line in &lines {
                debug!(log = %self.path.display(), "{line}");
                if let Some(verdict) = self.classify(line) {
                    info!(log = %self.path.display(), ?verdict, "terminal marker observed");
                    return Ok(verdict);
                }
            }

            tokio::time::sleep(self.poll_interval).await;
        }
    }

    /// Read everything appended since `offset`, returning only complete
    /// (newline-terminated) lines. A trailing partial line is left for
    /// the next cycle, so the returned offset stops at the last newline.
    fn read_new_lines(&self, offset: u64) -> Result<(Vec<String>, u64), OrchestratorError> {
        let mut file = std::fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start(offset))?;

        let mut buf = Vec::new();
        file.read_to_end(&mut buf)?;

        let mut lines = Vec::new();
        let mut consumed = 0usize;
        for chunk in buf.split_inclusive(|&b| b == b'\n') {
            if chunk.ends_with(b"\n") {
                consumed += chunk.len();
                lines.push(String::from_utf8_lossy(chunk).trim_end().to_string());
            }
        }

        Ok((lines, offset + consumed as u64))
    }
}
