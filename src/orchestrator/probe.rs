use std::future::Future;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::debug;

use crate::orchestrator::outcome::UnitState;

/// Connect/read timeout for a single health probe.
pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
/// Bounded wait after a start or shutdown: 5 probes, one per second.
pub const READY_ATTEMPTS: u32 = 5;
pub const READY_INTERVAL: Duration = Duration::from_secs(1);

/// Single-shot HTTP health checks against a unit's actuator endpoint.
/// Stateless -- nothing is memoized, every probe hits the wire.
pub struct ReadinessProber {
    client: reqwest::Client,
    host: String,
}

impl ReadinessProber {
    pub fn new(host: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(PROBE_TIMEOUT)
            .timeout(PROBE_TIMEOUT)
            .build()
            .context("building health probe client")?;
        Ok(Self {
            client,
            host: host.into(),
        })
    }

    pub fn health_url(&self, port: u16) -> String {
        format!("http://{}:{}/actuator/health", self.host, port)
    }

    /// One GET against the health endpoint. Up only on HTTP 200; any
    /// connection failure, timeout, or non-200 status is Down.
    pub async fn probe(&self, port: u16) -> UnitState {
        let url = self.health_url(port);
        match self.client.get(&url).send().await {
            Ok(response) if response.status() == reqwest::StatusCode::OK => UnitState::Up,
            Ok(response) => {
                debug!(port, status = %response.status(), "probe returned non-200");
                UnitState::Down
            }
            Err(e) => {
                debug!(port, error = %e, "probe failed");
                UnitState::Down
            }
        }
    }

    /// Poll until the unit reports Up, once per `interval`, at most
    /// `attempts` times. Fixed linear spacing -- the expected startup
    /// window is small and bounded, so no exponential growth.
    pub async fn await_ready(&self, port: u16, attempts: u32, interval: Duration) -> UnitState {
        if poll_until(attempts, interval, UnitState::Up, || self.probe(port)).await {
            UnitState::Up
        } else {
            debug!(port, attempts, "unit did not come up");
            UnitState::Down
        }
    }

    /// Dual of [`await_ready`](Self::await_ready): poll until the unit
    /// reports Down after a shutdown was issued.
    pub async fn await_stopped(&self, port: u16, attempts: u32, interval: Duration) -> UnitState {
        if poll_until(attempts, interval, UnitState::Down, || self.probe(port)).await {
            UnitState::Down
        } else {
            debug!(port, attempts, "unit is still up after shutdown");
            UnitState::Up
        }
    }
}

/// Sleep `interval`, probe, repeat: true as soon as `wanted` is observed,
/// false once `attempts` probes are exhausted.
async fn poll_until<F, Fut>(attempts: u32, interval: Duration, wanted: UnitState, probe: F) -> bool
where
    F: Fn() -> Fut,
    Fut: Future<Output = UnitState>,
{
    for _ in 0..attempts {
        tokio::time::sleep(interval).await;
        if probe().await == wanted {
            return true;
        }
    }
    false
}
