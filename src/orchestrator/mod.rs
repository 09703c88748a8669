pub mod launcher;
pub mod logwatch;
pub mod outcome;
pub mod probe;
pub mod registry;
pub mod remote;
pub mod scripts;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::model::{BlockchainConfig, DatabaseConfig, StackConfig};
use logwatch::{LogTailWatcher, WatchVerdict};
use outcome::{
    BatchResult, OperationOutcome, OrchestratorError, UnitDescriptor, UnitKind, UnitState,
};
use probe::{ReadinessProber, READY_ATTEMPTS, READY_INTERVAL};
use registry::UnitRegistry;

/// Key ids generated for every wallet, in creation order.
const KEY_IDS: [&str; 4] = ["assert", "auth", "keyagree", "invoke"];

/// Façade that sequences launching, probing, and log tailing for every
/// unit kind and folds per-unit results into batch outcomes.
///
/// Holds no mutable orchestration state: the registry is read-only and
/// every operation recomputes unit state from live observation, so the
/// core is safe to share across concurrent requests without locks.
pub struct OrchestrationCore {
    config: StackConfig,
    base_dir: PathBuf,
    registry: UnitRegistry,
    prober: ReadinessProber,
}

impl OrchestrationCore {
    /// Build the core from a loaded config. Relative paths resolve
    /// against `base_dir` (the config file's directory). Fails fast on
    /// duplicate ports.
    pub fn new(config: StackConfig, base_dir: PathBuf) -> Result<Self> {
        let registry =
            UnitRegistry::from_config(&config, &base_dir).context("building unit registry")?;
        let prober = ReadinessProber::new(config.host.clone())?;
        Ok(Self {
            config,
            base_dir,
            registry,
            prober,
        })
    }

    pub fn registry(&self) -> &UnitRegistry {
        &self.registry
    }

    // -----------------------------------------------------------------------
    // Per-unit operations (boundary-caught: these never return Err)
    // -----------------------------------------------------------------------

    /// Start the unit on `port`. Idempotent: an already-Up unit is left
    /// alone and reported Up without a second spawn.
    pub async fn start_unit(&self, port: u16) -> OperationOutcome {
        match self.registry.resolve(port) {
            Ok(unit) => {
                let unit = unit.clone();
                match unit.kind {
                    UnitKind::ApplicationServer => self
                        .start_server(&unit)
                        .await
                        .unwrap_or_else(|e| OperationOutcome::from_error(&unit.name, &e)),
                    UnitKind::BlockchainNetwork => self.start_blockchain().await,
                    UnitKind::Database => self.start_database().await,
                }
            }
            Err(e) => OperationOutcome::from_error(format!("port-{port}"), &e),
        }
    }

    /// Stop the unit on `port`. An already-Down application server is a
    /// no-op: no remote call is made.
    pub async fn stop_unit(&self, port: u16) -> OperationOutcome {
        match self.registry.resolve(port) {
            Ok(unit) => {
                let unit = unit.clone();
                match unit.kind {
                    UnitKind::ApplicationServer => self
                        .stop_server(&unit)
                        .await
                        .unwrap_or_else(|e| OperationOutcome::from_error(&unit.name, &e)),
                    UnitKind::BlockchainNetwork => self.stop_blockchain().await,
                    UnitKind::Database => self.stop_database().await,
                }
            }
            Err(e) => OperationOutcome::from_error(format!("port-{port}"), &e),
        }
    }

    pub async fn health_check(&self, port: u16) -> OperationOutcome {
        match self.registry.resolve(port) {
            Ok(unit) => {
                let unit = unit.clone();
                match unit.kind {
                    UnitKind::ApplicationServer => {
                        OperationOutcome::new(&unit.name, self.prober.probe(port).await)
                    }
                    UnitKind::BlockchainNetwork => self.health_blockchain().await,
                    UnitKind::Database => self.health_database().await,
                }
            }
            Err(e) => OperationOutcome::from_error(format!("port-{port}"), &e),
        }
    }

    /// Ask a running application server to reload its configuration.
    pub async fn refresh(&self, port: u16) -> OperationOutcome {
        match self.registry.resolve(port) {
            Ok(unit) if unit.kind == UnitKind::ApplicationServer => {
                let name = unit.name.clone();
                match remote::post_refresh(&self.config.host, port).await {
                    Ok(()) => OperationOutcome::with_message(name, UnitState::Up, "refreshed"),
                    Err(e) => OperationOutcome::from_error(name, &e),
                }
            }
            Ok(unit) => OperationOutcome::with_message(
                unit.name.clone(),
                UnitState::Error,
                format!("refresh is not supported for {} units", unit.kind),
            ),
            Err(e) => OperationOutcome::from_error(format!("port-{port}"), &e),
        }
    }

    // -----------------------------------------------------------------------
    // Batch operations
    // -----------------------------------------------------------------------

    /// Start every registered unit in port order. Per-unit failures are
    /// isolated: one bad unit never aborts the batch.
    pub async fn start_all(&self) -> BatchResult {
        let mut batch = BatchResult::new();
        for port in self.unit_ports() {
            batch.record(self.start_unit(port).await, UnitState::Up);
        }
        info!(succeeded = batch.succeeded, total = batch.total(), "start-all finished");
        batch
    }

    pub async fn stop_all(&self) -> BatchResult {
        let mut batch = BatchResult::new();
        for port in self.unit_ports() {
            batch.record(self.stop_unit(port).await, UnitState::Down);
        }
        info!(succeeded = batch.succeeded, total = batch.total(), "stop-all finished");
        batch
    }

    pub async fn health_all(&self) -> BatchResult {
        let mut batch = BatchResult::new();
        for port in self.unit_ports() {
            batch.record(self.health_check(port).await, UnitState::Up);
        }
        batch
    }

    fn unit_ports(&self) -> Vec<u16> {
        self.registry.all_units().map(|u| u.port).collect()
    }

    // -----------------------------------------------------------------------
    // Application servers
    // -----------------------------------------------------------------------

    async fn start_server(
        &self,
        unit: &UnitDescriptor,
    ) -> Result<OperationOutcome, OrchestratorError> {
        if self.prober.probe(unit.port).await == UnitState::Up {
            info!(unit = %unit.name, port = unit.port, "already running, skipping startup");
            return Ok(OperationOutcome::with_message(
                &unit.name,
                UnitState::Up,
                "already running",
            ));
        }

        if !unit.executable.is_file() {
            return Err(OrchestratorError::MissingExecutable(unit.executable.clone()));
        }

        let command = format!(
            "nohup java -jar '{}' > server_{}.log 2>&1 &",
            unit.executable.display(),
            unit.port
        );
        launcher::spawn_detached(&command, &unit.working_dir).await?;
        info!(unit = %unit.name, port = unit.port, "spawned, waiting for health check");

        let state = self
            .prober
            .await_ready(unit.port, READY_ATTEMPTS, READY_INTERVAL)
            .await;
        match state {
            UnitState::Up => Ok(OperationOutcome::new(&unit.name, UnitState::Up)),
            _ => {
                warn!(unit = %unit.name, port = unit.port, "did not come up in time");
                Ok(OperationOutcome::with_message(
                    &unit.name,
                    UnitState::Down,
                    format!("no health response after {READY_ATTEMPTS} attempts"),
                ))
            }
        }
    }

    async fn stop_server(
        &self,
        unit: &UnitDescriptor,
    ) -> Result<OperationOutcome, OrchestratorError> {
        if self.prober.probe(unit.port).await == UnitState::Down {
            info!(unit = %unit.name, port = unit.port, "already stopped, skipping shutdown");
            return Ok(OperationOutcome::with_message(
                &unit.name,
                UnitState::Down,
                "already stopped",
            ));
        }

        remote::post_shutdown(&self.config.host, unit.port).await?;

        let state = self
            .prober
            .await_stopped(unit.port, READY_ATTEMPTS, READY_INTERVAL)
            .await;
        match state {
            UnitState::Down => Ok(OperationOutcome::new(&unit.name, UnitState::Down)),
            _ => Ok(OperationOutcome::with_message(
                &unit.name,
                UnitState::Up,
                format!("still answering after {READY_ATTEMPTS} attempts"),
            )),
        }
    }

    // -----------------------------------------------------------------------
    // Blockchain network (script + log-tail flow)
    // -----------------------------------------------------------------------

    /// Launch the network bootstrap detached and block on its log until a
    /// terminal chaincode marker appears, then report via the status
    /// script. The log wait is unbounded by design.
    pub async fn start_blockchain(&self) -> OperationOutcome {
        match self.start_blockchain_inner().await {
            Ok(outcome) => outcome,
            Err(e) => OperationOutcome::from_error("blockchain", &e),
        }
    }

    async fn start_blockchain_inner(&self) -> Result<OperationOutcome, OrchestratorError> {
        let chain = self.blockchain_config()?;
        let dir = self.base_dir.join(&chain.path);
        let start_script = dir.join("start.sh");
        if !start_script.is_file() {
            return Err(OrchestratorError::MissingExecutable(start_script));
        }

        let log_path = dir.join(&chain.log_file);
        let command = format!(
            "nohup '{}' {} {} > '{}' 2>&1 &",
            start_script.display(),
            chain.channel,
            chain.chaincode,
            log_path.display()
        );
        launcher::spawn_detached(&command, &dir).await?;

        let verdict = LogTailWatcher::new(
            log_path,
            scripts::CHAINCODE_READY_MARKER,
            scripts::CHAINCODE_FAILED_MARKER,
        )
        .wait()
        .await?;

        match verdict {
            WatchVerdict::Success => {
                info!("blockchain network is running");
                Ok(self.health_blockchain().await)
            }
            WatchVerdict::Failure => {
                warn!("blockchain bootstrap failed");
                Ok(OperationOutcome::with_message(
                    "blockchain",
                    UnitState::Error,
                    "chaincode deployment failed",
                ))
            }
        }
    }

    pub async fn stop_blockchain(&self) -> OperationOutcome {
        let result = async {
            let chain = self.blockchain_config()?;
            let dir = self.base_dir.join(&chain.path);
            scripts::run_script(&dir, "stop.sh", &[]).await
        }
        .await;

        match result {
            Ok(_) => {
                // The stop script reports nothing useful; the status
                // script is the source of truth.
                let health = self.health_blockchain().await;
                if health.state == UnitState::Up {
                    OperationOutcome::with_message("blockchain", UnitState::Up, "still running")
                } else {
                    OperationOutcome::new("blockchain", UnitState::Down)
                }
            }
            Err(e) => OperationOutcome::from_error("blockchain", &e),
        }
    }

    pub async fn health_blockchain(&self) -> OperationOutcome {
        let result = async {
            let chain = self.blockchain_config()?;
            let dir = self.base_dir.join(&chain.path);
            let args = vec![chain.channel.clone(), chain.chaincode.clone()];
            scripts::run_script(&dir, "status.sh", &args).await
        }
        .await;

        match result {
            Ok(out) if out.contains(scripts::CHAIN_STATUS_OK_MARKER) => {
                OperationOutcome::new("blockchain", UnitState::Up)
            }
            Ok(_) => OperationOutcome::with_message(
                "blockchain",
                UnitState::Error,
                "status script did not report 200",
            ),
            Err(e) => OperationOutcome::from_error("blockchain", &e),
        }
    }

    fn blockchain_config(&self) -> Result<&BlockchainConfig, OrchestratorError> {
        self.config.blockchain.as_ref().ok_or_else(|| {
            OrchestratorError::MissingExecutable(self.base_dir.join("shells/Fabric"))
        })
    }

    // -----------------------------------------------------------------------
    // Database (script flow, classified purely on output markers)
    // -----------------------------------------------------------------------

    pub async fn start_database(&self) -> OperationOutcome {
        let result = async {
            let db = self.database_config()?;
            let dir = self.base_dir.join(&db.path);
            let args = vec![
                db.port.to_string(),
                db.user.clone(),
                db.password.clone(),
                db.name.clone(),
            ];
            scripts::run_script(&dir, "start.sh", &args).await
        }
        .await;

        classify_script_outcome(result, UnitState::Up, scripts::DATABASE_STARTED_MARKER)
    }

    pub async fn stop_database(&self) -> OperationOutcome {
        let result = async {
            let db = self.database_config()?;
            let dir = self.base_dir.join(&db.path);
            scripts::run_script(&dir, "stop.sh", &[]).await
        }
        .await;

        classify_script_outcome(result, UnitState::Down, scripts::DATABASE_STOPPED_MARKER)
    }

    pub async fn health_database(&self) -> OperationOutcome {
        let result = async {
            let db = self.database_config()?;
            let dir = self.base_dir.join(&db.path);
            let args = vec![db.user.clone(), db.password.clone()];
            scripts::run_script(&dir, "status.sh", &args).await
        }
        .await;

        classify_script_outcome(result, UnitState::Up, scripts::DATABASE_HEALTHY_MARKER)
    }

    fn database_config(&self) -> Result<&DatabaseConfig, OrchestratorError> {
        self.config.database.as_ref().ok_or_else(|| {
            OrchestratorError::MissingExecutable(self.base_dir.join("shells/Postgre"))
        })
    }

    // -----------------------------------------------------------------------
    // One-shot tool scripts (wallet / keys / DID document)
    // -----------------------------------------------------------------------

    /// Create a wallet file, piping the password to the script's stdin.
    /// Exit code is the success signal: non-zero fails with the combined
    /// output attached.
    pub async fn create_wallet(
        &self,
        name: &str,
        password: &str,
    ) -> Result<(), OrchestratorError> {
        self.run_tool("create_wallet.sh", &[name.to_string()], password)
            .await
    }

    /// Create the four keypairs for an existing wallet. Fails on the
    /// first key whose script exits non-zero.
    pub async fn create_keys(&self, name: &str, password: &str) -> Result<(), OrchestratorError> {
        for key_id in KEY_IDS {
            self.run_tool(
                "create_keys.sh",
                &[format!("{name}.wallet"), key_id.to_string()],
                password,
            )
            .await?;
            info!(wallet = %name, key = key_id, "keypair created");
        }
        Ok(())
    }

    pub async fn create_did_document(
        &self,
        name: &str,
        did: &str,
        controller: &str,
        password: &str,
    ) -> Result<(), OrchestratorError> {
        self.run_tool(
            "create_did_doc.sh",
            &[
                format!("{name}.wallet"),
                format!("{name}.did"),
                did.to_string(),
                controller.to_string(),
            ],
            password,
        )
        .await
    }

    async fn run_tool(
        &self,
        script: &str,
        args: &[String],
        password: &str,
    ) -> Result<(), OrchestratorError> {
        let dir = self.base_dir.join(&self.config.paths.tools);
        let script_path = dir.join(script);
        if !script_path.is_file() {
            return Err(OrchestratorError::MissingExecutable(script_path));
        }

        let mut argv = vec![script_path.to_string_lossy().to_string()];
        argv.extend_from_slice(args);
        let out = launcher::run_blocking("sh", &argv, &dir, Some(password)).await?;

        if out.status.success() {
            Ok(())
        } else {
            Err(OrchestratorError::ProcessFailed {
                code: out.status.code(),
                output: out.text,
            })
        }
    }
}

/// Map a script run onto an outcome: `ok_state` when the marker is found
/// in the combined output, Error otherwise.
fn classify_script_outcome(
    result: Result<launcher::CombinedOutput, OrchestratorError>,
    ok_state: UnitState,
    marker: &str,
) -> OperationOutcome {
    match result {
        Ok(out) if out.contains(marker) => OperationOutcome::new("database", ok_state),
        Ok(_) => OperationOutcome::with_message(
            "database",
            UnitState::Error,
            format!("script output did not contain '{marker}'"),
        ),
        Err(e) => OperationOutcome::from_error("database", &e),
    }
}
