use serde::Deserialize;
use std::collections::BTreeMap;

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_jars_dir() -> String {
    "jars".to_string()
}

fn default_tools_dir() -> String {
    "tool".to_string()
}

fn default_blockchain_path() -> String {
    "shells/Fabric".to_string()
}

fn default_blockchain_log() -> String {
    "fabric.log".to_string()
}

fn default_database_path() -> String {
    "shells/Postgre".to_string()
}

#[derive(Debug, Clone, Deserialize)]
pub struct StackConfig {
    /// Host the managed servers listen on for health/shutdown/refresh.
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub paths: PathsConfig,
    /// Managed application servers, keyed by name.
    #[serde(default)]
    pub servers: BTreeMap<String, ServerConfig>,
    #[serde(default)]
    pub blockchain: Option<BlockchainConfig>,
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root directory holding one subdirectory per server jar.
    #[serde(default = "default_jars_dir")]
    pub jars: String,
    /// Directory holding the wallet / keys / DID-document scripts.
    #[serde(default = "default_tools_dir")]
    pub tools: String,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            jars: default_jars_dir(),
            tools: default_tools_dir(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    /// Jar file name inside `paths.jars/<dir>/`.
    pub jar: String,
    /// Subdirectory under `paths.jars`; defaults to the server's key.
    #[serde(default)]
    pub dir: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct BlockchainConfig {
    /// Registry identity only -- the bootstrap exposes no health endpoint.
    pub port: u16,
    pub channel: String,
    pub chaincode: String,
    /// Directory holding start.sh / stop.sh / status.sh and the bootstrap log.
    #[serde(default = "default_blockchain_path")]
    pub path: String,
    #[serde(default = "default_blockchain_log")]
    pub log_file: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub port: u16,
    pub user: String,
    pub password: String,
    /// Database name handed to start.sh.
    pub name: String,
    #[serde(default = "default_database_path")]
    pub path: String,
}
