//! healthwatch — resource health scoring and incident deduplication
//!
//! Periodically probes external stateful services (a Redis-compatible
//! cache store, a PostgreSQL database), converts raw metrics into a
//! normalized 0–100 health score, applies hysteresis so a sustained
//! unhealthy condition produces exactly one open incident until recovery,
//! and forwards structured incident records to an incident-management
//! backend.
//!
//! ## Architecture
//!
//! - **Probes**: per-resource queries (memory pressure, connection pool,
//!   table bloat) behind one capability trait
//! - **Scorer**: pure per-check formulas
//! - **Dedup ledger**: per-key CLOSED/OPEN state machine with hysteresis
//! - **Reporter**: best-effort HTTP delivery, fire-and-forget
//! - **Scheduler**: fixed-interval, sequential, non-overlapping ticks
//! - **API**: axum endpoints for status reads and dedup administration

pub mod api;
pub mod config;
pub mod dedup;
pub mod monitor;
pub mod probes;
pub mod reporter;
pub mod scoring;
pub mod types;

pub use config::MonitorConfig;
pub use dedup::{DedupLedger, Transition};
pub use monitor::{run_scheduler, MonitorService, ServiceStatus, StatusReport};
pub use probes::{PgConnectionPoolProbe, PgTableBloatProbe, Probe, RedisMemoryProbe};
pub use reporter::{HttpReporter, IncidentRecord, IncidentSink};
pub use types::{CheckKind, HealthSample, ProbeOutcome, RawMetrics};
