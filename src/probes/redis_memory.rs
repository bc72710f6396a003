//! Memory-pressure probe for a Redis-compatible cache store
//!
//! Runs `INFO memory` and derives `memory_percent = used / max * 100`.
//! A missing or zero `maxmemory` means no configured ceiling and is
//! treated as 0% pressure rather than a failure.

use std::time::Duration;

use tracing::debug;

use super::{bounded, Probe, ProbeError};
use crate::types::{CheckKind, ProbeOutcome, RawMetrics};

pub struct RedisMemoryProbe {
    resource_key: String,
    url: String,
    timeout: Duration,
}

impl RedisMemoryProbe {
    pub fn new(resource_key: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            resource_key: resource_key.into(),
            url: url.into(),
            timeout,
        }
    }

    async fn fetch(&self) -> Result<RawMetrics, ProbeError> {
        let client = redis::Client::open(self.url.as_str())?;
        let mut conn = bounded(self.timeout, client.get_multiplexed_async_connection()).await?;

        let info: String = bounded(
            self.timeout,
            redis::cmd("INFO").arg("memory").query_async(&mut conn),
        )
        .await?;

        Ok(parse_memory_info(&info))
    }
}

#[async_trait::async_trait]
impl Probe for RedisMemoryProbe {
    fn resource_key(&self) -> &str {
        &self.resource_key
    }

    fn kind(&self) -> CheckKind {
        CheckKind::MemoryPressure
    }

    async fn probe(&self) -> ProbeOutcome {
        match self.fetch().await {
            Ok(metrics) => ProbeOutcome::Metrics(metrics),
            Err(e) => {
                debug!(resource = %self.resource_key, error = %e, "redis probe failed");
                ProbeOutcome::Unreachable {
                    reason: e.to_string(),
                }
            }
        }
    }
}

/// Parse the `INFO memory` bulk reply. Missing fields default to 0 — a
/// malformed reply degrades to "fully healthy" instead of failing the tick.
fn parse_memory_info(raw: &str) -> RawMetrics {
    let mut used_memory = 0u64;
    let mut max_memory = 0u64;

    for line in raw.lines() {
        if line.starts_with('#') {
            continue;
        }
        if let Some((key, value)) = line.split_once(':') {
            match key.trim() {
                "used_memory" => used_memory = value.trim().parse().unwrap_or(0),
                "maxmemory" => max_memory = value.trim().parse().unwrap_or(0),
                _ => {}
            }
        }
    }

    let memory_percent = if max_memory > 0 {
        let pct = used_memory as f64 / max_memory as f64 * 100.0;
        (pct * 100.0).round() / 100.0
    } else {
        0.0
    };

    RawMetrics::Memory {
        used_memory,
        max_memory,
        memory_percent,
    }
}
