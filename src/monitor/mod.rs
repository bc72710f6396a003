//! Monitor service — owns probes, dedup state, and the incident sink
//!
//! A single `MonitorService` is constructed at process start and passed
//! explicitly to the scheduler task and the request handlers. All mutable
//! state (the dedup ledger) lives behind one mutex inside it; there is no
//! ambient global state.

pub mod scheduler;

pub use scheduler::run_scheduler;

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::dedup::{DedupLedger, Transition};
use crate::probes::Probe;
use crate::reporter::{IncidentRecord, IncidentSink};
use crate::scoring;
use crate::types::{HealthSample, ProbeOutcome, RawMetrics};

/// Current state of one monitored check, as returned by `GET /status`.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    /// Health score, absent when the resource is unreachable
    pub health: Option<u8>,
    #[serde(flatten)]
    pub metrics: Option<RawMetrics>,
    /// "healthy" | "unhealthy" | "unreachable"
    pub status: &'static str,
    /// Whether the next scheduler tick would open a new incident
    pub will_trigger_incident: bool,
}

/// On-demand snapshot of every configured check.
#[derive(Debug, Serialize)]
pub struct StatusReport {
    pub services: BTreeMap<String, ServiceStatus>,
    pub last_check: DateTime<Utc>,
}

pub struct MonitorService {
    probes: Vec<Box<dyn Probe>>,
    ledger: Mutex<DedupLedger>,
    sink: Arc<dyn IncidentSink>,
    threshold: u8,
}

impl MonitorService {
    pub fn new(probes: Vec<Box<dyn Probe>>, sink: Arc<dyn IncidentSink>, threshold: u8) -> Self {
        Self {
            probes,
            ledger: Mutex::new(DedupLedger::new()),
            sink,
            threshold,
        }
    }

    /// Dedup keys of every registered probe, in probe order.
    pub fn resource_keys(&self) -> Vec<String> {
        self.probes
            .iter()
            .map(|p| p.resource_key().to_string())
            .collect()
    }

    pub fn threshold(&self) -> u8 {
        self.threshold
    }

    /// Run one scheduler tick: probe every resource sequentially, score,
    /// and route each result through the dedup state machine. A probe's
    /// unreachable outcome skips that resource without touching its dedup
    /// entry; the remaining probes still run.
    pub async fn run_tick(&self) {
        for probe in &self.probes {
            let key = probe.resource_key();

            let metrics = match probe.probe().await {
                ProbeOutcome::Metrics(metrics) => metrics,
                ProbeOutcome::Unreachable { reason } => {
                    warn!(resource = key, %reason, "resource unreachable, skipping this tick");
                    continue;
                }
            };

            let sample = HealthSample {
                resource_key: key.to_string(),
                score: scoring::score(&metrics),
                raw_metrics: metrics,
                timestamp: Utc::now(),
            };

            let transition = self
                .ledger
                .lock()
                .await
                .observe(key, sample.score, self.threshold);

            match transition {
                Transition::Opened => {
                    info!(
                        resource = key,
                        score = sample.score,
                        threshold = self.threshold,
                        "health below threshold, opening incident"
                    );
                    let record = IncidentRecord::from_sample(&sample, self.threshold);
                    self.sink.deliver(&record).await;
                }
                Transition::Suppressed => {
                    info!(
                        resource = key,
                        score = sample.score,
                        "still unhealthy, incident already open"
                    );
                }
                Transition::Cleared => {
                    info!(resource = key, score = sample.score, "recovered, incident state cleared");
                }
                Transition::Unchanged => {
                    tracing::debug!(resource = key, score = sample.score, "healthy");
                }
            }
        }
    }

    /// On-demand snapshot: re-run every probe and scorer, bypassing dedup.
    /// Deliberately decoupled from the scheduler's cadence — a status read
    /// blocks on live probes and may momentarily disagree with the last
    /// tick.
    pub async fn status(&self) -> StatusReport {
        let mut services = BTreeMap::new();

        for probe in &self.probes {
            let key = probe.resource_key();

            let entry = match probe.probe().await {
                ProbeOutcome::Metrics(metrics) => {
                    let score = scoring::score(&metrics);
                    let healthy = score >= self.threshold;
                    let open = self.ledger.lock().await.is_open(key);
                    ServiceStatus {
                        health: Some(score),
                        metrics: Some(metrics),
                        status: if healthy { "healthy" } else { "unhealthy" },
                        will_trigger_incident: !healthy && !open,
                    }
                }
                ProbeOutcome::Unreachable { reason } => {
                    warn!(resource = key, %reason, "resource unreachable during status read");
                    ServiceStatus {
                        health: None,
                        metrics: None,
                        status: "unreachable",
                        will_trigger_incident: false,
                    }
                }
            };

            services.insert(key.to_string(), entry);
        }

        StatusReport {
            services,
            last_check: Utc::now(),
        }
    }

    /// Clear one dedup entry. Returns true if an incident was open.
    pub async fn clear(&self, resource_key: &str) -> bool {
        let cleared = self.ledger.lock().await.clear(resource_key);
        if cleared {
            info!(resource = resource_key, "dedup state cleared by request");
        }
        cleared
    }

    /// Clear all dedup entries, returning how many were open.
    pub async fn clear_all(&self) -> usize {
        let count = self.ledger.lock().await.clear_all();
        if count > 0 {
            info!(count, "all dedup state cleared by request");
        }
        count
    }

    /// Number of currently open incidents (diagnostic).
    pub async fn open_incidents(&self) -> usize {
        self.ledger.lock().await.open_count()
    }
}
