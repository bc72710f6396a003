//! Health scorer — pure per-check formulas mapping raw metrics to 0–100
//!
//! Deterministic and side-effect free. Unreachable resources never reach
//! the scorer; the scheduler skips them before scoring.

use crate::types::RawMetrics;

/// Score a metric set on the 0–100 health scale (100 = fully healthy).
pub fn score(metrics: &RawMetrics) -> u8 {
    match metrics {
        RawMetrics::Memory { memory_percent, .. } => memory_score(*memory_percent),
        RawMetrics::ConnectionPool {
            idle_connections, ..
        } => connection_pool_score(*idle_connections),
        RawMetrics::TableBloat { dead_ratio, .. } => table_bloat_score(*dead_ratio),
    }
}

/// `clamp(100 − round(memory_percent), 0, 100)`
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn memory_score(memory_percent: f64) -> u8 {
    (100.0 - memory_percent.round()).clamp(0.0, 100.0) as u8
}

/// Stepped thresholds on the idle connection count (not a ratio — a pile of
/// idle connections is what exhausts the pool ceiling).
fn connection_pool_score(idle: i64) -> u8 {
    if idle > 15 {
        0
    } else if idle > 12 {
        30
    } else if idle > 10 {
        50
    } else if idle > 8 {
        70
    } else {
        100
    }
}

/// Stepped thresholds on the dead-tuple ratio of the worst table.
fn table_bloat_score(dead_ratio: f64) -> u8 {
    if dead_ratio < 20.0 {
        100
    } else if dead_ratio < 40.0 {
        70
    } else if dead_ratio < 60.0 {
        40
    } else {
        0
    }
}
