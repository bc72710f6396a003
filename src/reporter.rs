//! Incident reporter — best-effort delivery to the incident backend
//!
//! Serializes an [`IncidentRecord`] into the backend's wire shape and
//! issues a single POST with a bounded timeout. No retry, no backoff, no
//! queueing. Connection refusal, timeout, and non-201 responses are
//! distinguished in the logs only; none of them roll back the dedup
//! transition that produced the record.

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};

use crate::types::{CheckKind, HealthSample, RawMetrics};

/// A structured incident, created on a CLOSED→OPEN dedup transition and
/// dropped after one delivery attempt.
#[derive(Debug, Clone)]
pub struct IncidentRecord {
    pub message: String,
    pub source: String,
    pub error_logs: Vec<String>,
    pub metrics: RawMetrics,
    pub check: CheckKind,
    pub score: u8,
    pub threshold: u8,
    pub timestamp: DateTime<Utc>,
}

impl IncidentRecord {
    /// Build the record for an unhealthy sample, with per-check message and
    /// log lines.
    pub fn from_sample(sample: &HealthSample, threshold: u8) -> Self {
        let key = &sample.resource_key;
        let score = sample.score;
        let (message, error_logs) = match &sample.raw_metrics {
            RawMetrics::Memory {
                used_memory,
                max_memory,
                memory_percent,
            } => (
                format!("{key} memory exhausted - health {score}%"),
                vec![
                    format!("Memory usage at {memory_percent:.1}%"),
                    format!("Used: {used_memory} bytes / Max: {max_memory} bytes"),
                    "OOM errors likely - cache rejecting commands".to_string(),
                ],
            ),
            RawMetrics::ConnectionPool {
                idle_connections,
                active_connections,
                total_connections,
                max_connections,
            } => (
                format!("{key} connection pool saturated - health {score}%"),
                vec![
                    format!(
                        "{idle_connections} idle connections of {total_connections} total (ceiling {max_connections})"
                    ),
                    format!("{active_connections} connections active"),
                    "New connections may be refused once the ceiling is reached".to_string(),
                ],
            ),
            RawMetrics::TableBloat {
                table,
                live_tuples,
                dead_tuples,
                dead_ratio,
            } => {
                let table = table.as_deref().unwrap_or("(unknown)");
                (
                    format!("{key} table bloat critical - health {score}%"),
                    vec![
                        format!(
                            "Table '{table}' has {dead_tuples} dead tuples ({dead_ratio:.1}% of {live_tuples} live)"
                        ),
                        "Query performance degraded by dead tuple scans".to_string(),
                        "VACUUM ANALYZE recommended".to_string(),
                    ],
                )
            }
        };

        Self {
            message,
            source: sample.resource_key.clone(),
            error_logs,
            metrics: sample.raw_metrics.clone(),
            check: sample.raw_metrics.kind(),
            score,
            threshold,
            timestamp: sample.timestamp,
        }
    }

    /// The backend's expected JSON body. `error_logs` and
    /// `metrics_snapshot` are JSON-encoded strings, not nested objects —
    /// the backend stores them opaquely.
    pub fn wire_body(&self) -> serde_json::Value {
        serde_json::json!({
            "message": self.message,
            "source": self.source,
            "affected_system": self.source,
            "error_logs": serde_json::to_string(&self.error_logs)
                .unwrap_or_else(|_| "[]".to_string()),
            "metrics_snapshot": serde_json::to_string(&self.metrics)
                .unwrap_or_else(|_| "{}".to_string()),
            "incident_type": "real_system",
            "actionable": true,
            "affected_systems": [self.source],
            "remediation_mode": "automated",
            "metadata": {
                "threshold": self.threshold,
                "timestamp": self.timestamp.to_rfc3339(),
                "check": self.check.to_string(),
                "score": self.score,
            },
        })
    }
}

/// Delivery failures, classified for observability only.
#[derive(Debug, thiserror::Error)]
pub enum ReportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("backend returned status {0}")]
    Backend(reqwest::StatusCode),
}

/// Destination for incident records. The HTTP reporter is the production
/// implementation; tests substitute a recording sink.
#[async_trait::async_trait]
pub trait IncidentSink: Send + Sync {
    /// Attempt delivery once. Must not fail the caller — delivery is
    /// fire-and-forget.
    async fn deliver(&self, record: &IncidentRecord);
}

/// POSTs incidents to `{backend_url}/api/v1/incidents`.
pub struct HttpReporter {
    http: reqwest::Client,
    backend_url: String,
}

impl HttpReporter {
    pub fn new(backend_url: &str, timeout: std::time::Duration) -> Result<Self, ReportError> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            backend_url: backend_url.trim_end_matches('/').to_string(),
        })
    }

    async fn send(&self, record: &IncidentRecord) -> Result<String, ReportError> {
        let resp = self
            .http
            .post(format!("{}/api/v1/incidents", self.backend_url))
            .json(&record.wire_body())
            .send()
            .await?;

        match resp.status() {
            reqwest::StatusCode::CREATED => {
                let body: serde_json::Value = resp.json().await?;
                let id = match body.get("id") {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(v) => v.to_string(),
                    None => "unknown".to_string(),
                };
                Ok(id)
            }
            status => Err(ReportError::Backend(status)),
        }
    }
}

#[async_trait::async_trait]
impl IncidentSink for HttpReporter {
    async fn deliver(&self, record: &IncidentRecord) {
        info!(source = %record.source, message = %record.message, "reporting incident");

        match self.send(record).await {
            Ok(id) => {
                info!(source = %record.source, incident_id = %id, "incident created");
            }
            Err(ReportError::Http(e)) if e.is_connect() => {
                error!(backend = %self.backend_url, "cannot connect to incident backend");
            }
            Err(ReportError::Http(e)) if e.is_timeout() => {
                error!(backend = %self.backend_url, "incident backend request timed out");
            }
            Err(ReportError::Backend(status)) => {
                warn!(source = %record.source, %status, "incident backend rejected report");
            }
            Err(e) => {
                error!(source = %record.source, error = %e, "failed to report incident");
            }
        }
        // Delivery is best-effort: the record is dropped here regardless.
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> HealthSample {
        HealthSample {
            resource_key: "cache-primary".to_string(),
            score: 20,
            raw_metrics: RawMetrics::Memory {
                used_memory: 800,
                max_memory: 1000,
                memory_percent: 80.0,
            },
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_wire_body_shape() {
        let record = IncidentRecord::from_sample(&sample(), 70);
        let body = record.wire_body();

        assert_eq!(body["source"], "cache-primary");
        assert_eq!(body["affected_system"], "cache-primary");
        assert_eq!(body["incident_type"], "real_system");
        assert_eq!(body["actionable"], true);
        assert_eq!(body["remediation_mode"], "automated");
        assert_eq!(body["affected_systems"][0], "cache-primary");
        assert_eq!(body["metadata"]["threshold"], 70);
        assert_eq!(body["metadata"]["check"], "memory-pressure");
        assert_eq!(body["metadata"]["score"], 20);
    }

    #[test]
    fn test_error_logs_is_json_encoded_string() {
        let record = IncidentRecord::from_sample(&sample(), 70);
        let body = record.wire_body();

        let logs_field = body["error_logs"].as_str().expect("must be a string");
        let logs: Vec<String> = serde_json::from_str(logs_field).expect("must decode as array");
        assert_eq!(logs.len(), 3);
        assert!(logs[0].contains("80.0%"));
        assert!(logs[1].contains("800 bytes"));
    }

    #[test]
    fn test_metrics_snapshot_is_json_encoded_object() {
        let record = IncidentRecord::from_sample(&sample(), 70);
        let body = record.wire_body();

        let snapshot_field = body["metrics_snapshot"].as_str().expect("must be a string");
        let snapshot: serde_json::Value =
            serde_json::from_str(snapshot_field).expect("must decode as object");
        assert_eq!(snapshot["used_memory"], 800);
        assert_eq!(snapshot["max_memory"], 1000);
    }

    #[test]
    fn test_pool_record_message() {
        let sample = HealthSample {
            resource_key: "db-primary".to_string(),
            score: 30,
            raw_metrics: RawMetrics::ConnectionPool {
                idle_connections: 14,
                active_connections: 2,
                total_connections: 16,
                max_connections: 100,
            },
            timestamp: Utc::now(),
        };
        let record = IncidentRecord::from_sample(&sample, 70);
        assert!(record.message.contains("connection pool saturated"));
        assert!(record.error_logs[0].contains("14 idle connections"));
    }
}
