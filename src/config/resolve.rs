use std::path::{Path, PathBuf};

use anyhow::{bail, Result};

pub const CONFIG_FILENAME: &str = "stackrig.toml";

/// Pick the config file for this invocation. An explicit `-f` path wins
/// and must exist; otherwise the nearest `stackrig.toml` at or above the
/// current directory is used, so any subdirectory of a stack checkout
/// works as a launch point.
pub fn resolve_config(cli_file: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = cli_file {
        if !path.is_file() {
            bail!("Config file not found: {}", path.display());
        }
        return Ok(path.canonicalize()?);
    }

    let cwd = std::env::current_dir()?;
    match nearest_config(&cwd) {
        Some(path) => Ok(path),
        None => bail!(
            "No {} found in {} or any parent directory",
            CONFIG_FILENAME,
            cwd.display()
        ),
    }
}

fn nearest_config(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
}
