//! Polling a published site until it answers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::error::Result;

pub const DEFAULT_PROBE_TIMEOUT: Duration = Duration::from_secs(10);

/// Result of a single probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeOutcome {
    Live,
    /// The host answered with a non-success status.
    NotReady(u16),
    /// Transport failure: DNS, connect, timeout.
    Unreachable,
}

#[async_trait]
pub trait LivenessProbe: Send + Sync {
    async fn probe(&self, url: &str) -> ProbeOutcome;
}

/// Probes with a plain `GET`.
#[derive(Clone)]
pub struct HttpProbe {
    client: Client,
}

impl HttpProbe {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(request_timeout).build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl LivenessProbe for HttpProbe {
    async fn probe(&self, url: &str) -> ProbeOutcome {
        match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => ProbeOutcome::Live,
            Ok(response) => ProbeOutcome::NotReady(response.status().as_u16()),
            Err(e) => {
                debug!(url, error = %e, "Liveness probe failed");
                ProbeOutcome::Unreachable
            }
        }
    }
}

/// Probes `url` every `poll_interval` until it is live or `timeout` has
/// elapsed since the first probe.
pub async fn wait_until_live(
    probe: &dyn LivenessProbe,
    url: &str,
    timeout: Duration,
    poll_interval: Duration,
) -> bool {
    let start = Instant::now();
    let mut attempts = 0u32;

    while start.elapsed() < timeout {
        attempts += 1;
        match probe.probe(url).await {
            ProbeOutcome::Live => {
                info!(url, attempts, "Site is live");
                return true;
            }
            ProbeOutcome::NotReady(status) => {
                info!(url, status, "Site not ready yet, waiting");
            }
            ProbeOutcome::Unreachable => {
                info!(url, "Site unreachable yet, waiting");
            }
        }

        tokio::time::sleep(poll_interval).await;
    }

    warn!(url, attempts, timeout_secs = timeout.as_secs(), "Timed out waiting for site to go live");
    false
}
