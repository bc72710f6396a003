//! Core domain types shared across the monitor
//!
//! Raw metric sets are a closed enum: one variant per check kind. A probe
//! produces either a metric set or an `Unreachable` sentinel — transport
//! failures never escape as errors to the scheduler.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The kind of check a probe performs against a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CheckKind {
    /// Cache store memory usage vs configured ceiling
    MemoryPressure,
    /// Relational database connection counts by state
    ConnectionPool,
    /// Dead-tuple ratio of the worst table
    TableBloat,
}

impl std::fmt::Display for CheckKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CheckKind::MemoryPressure => write!(f, "memory-pressure"),
            CheckKind::ConnectionPool => write!(f, "connection-pool"),
            CheckKind::TableBloat => write!(f, "table-bloat"),
        }
    }
}

/// Raw metrics from exactly one probe invocation. Ephemeral — never stored
/// beyond the current tick.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum RawMetrics {
    Memory {
        used_memory: u64,
        max_memory: u64,
        memory_percent: f64,
    },
    ConnectionPool {
        idle_connections: i64,
        active_connections: i64,
        total_connections: i64,
        max_connections: i64,
    },
    TableBloat {
        table: Option<String>,
        live_tuples: i64,
        dead_tuples: i64,
        dead_ratio: f64,
    },
}

impl RawMetrics {
    /// The check kind this metric set belongs to.
    pub fn kind(&self) -> CheckKind {
        match self {
            RawMetrics::Memory { .. } => CheckKind::MemoryPressure,
            RawMetrics::ConnectionPool { .. } => CheckKind::ConnectionPool,
            RawMetrics::TableBloat { .. } => CheckKind::TableBloat,
        }
    }
}

/// Result of a single probe invocation.
#[derive(Debug, Clone)]
pub enum ProbeOutcome {
    /// The resource answered; raw metrics attached.
    Metrics(RawMetrics),
    /// The resource could not be contacted (auth failure, refused, timeout).
    /// A sentinel, not a fault — the scheduler skips this resource for the
    /// current tick.
    Unreachable { reason: String },
}

/// One scored observation of a resource. Immutable, lives for one tick.
#[derive(Debug, Clone, Serialize)]
pub struct HealthSample {
    pub resource_key: String,
    /// Normalized health score, 100 = fully healthy
    pub score: u8,
    pub raw_metrics: RawMetrics,
    pub timestamp: DateTime<Utc>,
}
