use anyhow::{bail, Result};
use std::path::Path;

use crate::config::resolve::CONFIG_FILENAME;

const STARTER_CONFIG: &str = r#"# stackrig configuration
# Paths are relative to this file's directory.

host = "127.0.0.1"

[paths]
jars = "jars"
tools = "tool"

[servers.tas]
port = 8090
jar = "did-ta-server.jar"
dir = "TAS"

[servers.issuer]
port = 8091
jar = "did-issuer-server.jar"
dir = "Issuer"

[blockchain]
port = 7050
channel = "mychannel"
chaincode = "opendid"
path = "shells/Fabric"

[database]
port = 5432
user = "omn"
password = "omn"
name = "omn"
path = "shells/Postgre"
"#;

/// Write a starter config into the current directory. Refuses to
/// overwrite an existing one.
pub fn run() -> Result<()> {
    let path = Path::new(CONFIG_FILENAME);
    if path.exists() {
        bail!("{} already exists, refusing to overwrite", CONFIG_FILENAME);
    }
    std::fs::write(path, STARTER_CONFIG)?;
    println!("Wrote {CONFIG_FILENAME}");
    Ok(())
}
