//! Scheduler-tick lifecycle tests
//!
//! Drive `MonitorService::run_tick()` with scripted probes and a recording
//! incident sink to verify the hysteresis guarantees: one incident per
//! sustained degradation, re-arm on recovery, and no duplicate when a probe
//! goes unreachable mid-incident.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use healthwatch::monitor::MonitorService;
use healthwatch::probes::Probe;
use healthwatch::reporter::{IncidentRecord, IncidentSink};
use healthwatch::types::{CheckKind, ProbeOutcome, RawMetrics};

const THRESHOLD: u8 = 70;

/// A probe that replays a scripted sequence of outcomes, then repeats the
/// final one.
struct ScriptedProbe {
    key: String,
    outcomes: Mutex<VecDeque<ProbeOutcome>>,
    fallback: ProbeOutcome,
}

impl ScriptedProbe {
    fn new(key: &str, outcomes: Vec<ProbeOutcome>) -> Self {
        Self {
            key: key.to_string(),
            outcomes: Mutex::new(outcomes.into()),
            fallback: healthy(),
        }
    }
}

#[async_trait]
impl Probe for ScriptedProbe {
    fn resource_key(&self) -> &str {
        &self.key
    }

    fn kind(&self) -> CheckKind {
        CheckKind::MemoryPressure
    }

    async fn probe(&self) -> ProbeOutcome {
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone())
    }
}

/// Captures every delivered record for later assertions.
#[derive(Default)]
struct RecordingSink {
    records: Mutex<Vec<IncidentRecord>>,
}

impl RecordingSink {
    fn sources(&self) -> Vec<String> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .map(|r| r.source.clone())
            .collect()
    }

    fn count(&self) -> usize {
        self.records.lock().unwrap().len()
    }
}

#[async_trait]
impl IncidentSink for RecordingSink {
    async fn deliver(&self, record: &IncidentRecord) {
        self.records.lock().unwrap().push(record.clone());
    }
}

/// Memory metrics that score exactly `score` (memory_percent = 100 - score).
fn at_score(score: u8) -> ProbeOutcome {
    let percent = f64::from(100 - score);
    ProbeOutcome::Metrics(RawMetrics::Memory {
        used_memory: u64::from(100 - score) * 10,
        max_memory: 1000,
        memory_percent: percent,
    })
}

fn healthy() -> ProbeOutcome {
    at_score(100)
}

fn unreachable() -> ProbeOutcome {
    ProbeOutcome::Unreachable {
        reason: "connection refused".to_string(),
    }
}

fn service_with(
    probes: Vec<Box<dyn Probe>>,
) -> (Arc<MonitorService>, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    let monitor = Arc::new(MonitorService::new(
        probes,
        Arc::clone(&sink) as Arc<dyn IncidentSink>,
        THRESHOLD,
    ));
    (monitor, sink)
}

#[tokio::test]
async fn test_sustained_unhealthy_reports_exactly_once() {
    let probe = ScriptedProbe::new("cache-primary", vec![at_score(50); 5]);
    let (monitor, sink) = service_with(vec![Box::new(probe)]);

    for _ in 0..5 {
        monitor.run_tick().await;
    }

    assert_eq!(sink.count(), 1);
    assert_eq!(sink.sources(), vec!["cache-primary"]);
    assert_eq!(monitor.open_incidents().await, 1);
}

#[tokio::test]
async fn test_recovery_rearms_reporting() {
    let probe = ScriptedProbe::new(
        "cache-primary",
        vec![at_score(50), at_score(50), at_score(80), at_score(50)],
    );
    let (monitor, sink) = service_with(vec![Box::new(probe)]);

    monitor.run_tick().await;
    assert_eq!(sink.count(), 1);

    monitor.run_tick().await;
    assert_eq!(sink.count(), 1, "duplicate must be suppressed");

    monitor.run_tick().await;
    assert_eq!(monitor.open_incidents().await, 0, "recovery clears state");

    monitor.run_tick().await;
    assert_eq!(sink.count(), 2, "re-degradation re-reports");
}

#[tokio::test]
async fn test_unreachable_mid_sequence_keeps_incident_open() {
    let probe = ScriptedProbe::new(
        "cache-primary",
        vec![at_score(50), unreachable(), at_score(50)],
    );
    let (monitor, sink) = service_with(vec![Box::new(probe)]);

    monitor.run_tick().await;
    monitor.run_tick().await;
    monitor.run_tick().await;

    assert_eq!(sink.count(), 1, "unreachable tick must not close or re-open");
    assert_eq!(monitor.open_incidents().await, 1);
}

#[tokio::test]
async fn test_score_at_threshold_triggers_nothing() {
    let probe = ScriptedProbe::new("cache-primary", vec![at_score(70), at_score(70)]);
    let (monitor, sink) = service_with(vec![Box::new(probe)]);

    monitor.run_tick().await;
    monitor.run_tick().await;

    assert_eq!(sink.count(), 0);
    assert_eq!(monitor.open_incidents().await, 0);
}

#[tokio::test]
async fn test_unreachable_probe_does_not_abort_tick() {
    let dead = ScriptedProbe::new("cache-primary", vec![unreachable()]);
    let degraded = ScriptedProbe::new("db-primary", vec![at_score(30)]);
    let (monitor, sink) = service_with(vec![Box::new(dead), Box::new(degraded)]);

    monitor.run_tick().await;

    // The later probe still ran and reported despite the earlier failure.
    assert_eq!(sink.sources(), vec!["db-primary"]);
}

#[tokio::test]
async fn test_concurrent_degradations_report_independently() {
    let pool = ScriptedProbe::new("db-primary", vec![at_score(30), at_score(30)]);
    let bloat = ScriptedProbe::new("db-primary-bloat", vec![at_score(40), healthy()]);
    let (monitor, sink) = service_with(vec![Box::new(pool), Box::new(bloat)]);

    monitor.run_tick().await;
    assert_eq!(sink.sources(), vec!["db-primary", "db-primary-bloat"]);

    monitor.run_tick().await;
    // Bloat recovered, pool is still suppressed; no new reports.
    assert_eq!(sink.count(), 2);
    assert_eq!(monitor.open_incidents().await, 1);
}

#[tokio::test]
async fn test_explicit_clear_rearms_next_tick() {
    let probe = ScriptedProbe::new("db-primary", vec![at_score(50), at_score(50)]);
    let (monitor, sink) = service_with(vec![Box::new(probe)]);

    monitor.run_tick().await;
    assert_eq!(sink.count(), 1);

    assert!(monitor.clear("db-primary").await);

    monitor.run_tick().await;
    assert_eq!(sink.count(), 2, "clear re-arms reporting while still unhealthy");
}

#[tokio::test]
async fn test_status_predicts_incident_trigger() {
    let probe = ScriptedProbe::new(
        "cache-primary",
        vec![at_score(50), at_score(50), at_score(50)],
    );
    let (monitor, _sink) = service_with(vec![Box::new(probe)]);

    let report = monitor.status().await;
    let service = &report.services["cache-primary"];
    assert_eq!(service.health, Some(50));
    assert_eq!(service.status, "unhealthy");
    assert!(service.will_trigger_incident, "nothing open yet");

    monitor.run_tick().await;

    let report = monitor.status().await;
    let service = &report.services["cache-primary"];
    assert!(
        !service.will_trigger_incident,
        "already open, next tick suppresses"
    );
}

#[tokio::test]
async fn test_status_bypasses_dedup() {
    let probe = ScriptedProbe::new("cache-primary", vec![at_score(50), at_score(50)]);
    let (monitor, sink) = service_with(vec![Box::new(probe)]);

    // Two status reads of an unhealthy resource must not report anything.
    monitor.status().await;
    monitor.status().await;

    assert_eq!(sink.count(), 0);
    assert_eq!(monitor.open_incidents().await, 0);
}
