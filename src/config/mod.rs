pub mod model;
pub mod resolve;

use std::path::Path;

use anyhow::{Context, Result};

use model::StackConfig;

/// Load and deserialize a stack config. Both failure modes carry the
/// offending path so the error reaching the user names the file.
pub fn load_config(path: &Path) -> Result<StackConfig> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    toml::from_str(&raw).with_context(|| format!("parsing config {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_reports_the_path_on_bad_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackrig.toml");
        std::fs::write(&path, "[servers.tas\nport = 8090").unwrap();

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("stackrig.toml"));
    }

    #[test]
    fn load_reports_the_path_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("stackrig.toml");

        let err = load_config(&path).unwrap_err();
        assert!(format!("{err:#}").contains("reading config"));
    }
}
