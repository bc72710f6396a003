//! Probes — protocol-specific queries against monitored resources
//!
//! Each probe is one implementation of the [`Probe`] capability: run a
//! bounded-timeout query against one external resource and return raw
//! metrics, or the `Unreachable` sentinel if the resource cannot be
//! contacted. Probes open and close their own connection per invocation —
//! no pooling — so a wedged resource cannot hold state between ticks.

pub mod pg_bloat;
pub mod pg_connections;
pub mod redis_memory;

pub use pg_bloat::PgTableBloatProbe;
pub use pg_connections::PgConnectionPoolProbe;
pub use redis_memory::RedisMemoryProbe;

use std::time::Duration;

use async_trait::async_trait;

use crate::types::{CheckKind, ProbeOutcome};

/// Transport/query failures internal to a probe. Converted to
/// [`ProbeOutcome::Unreachable`] at the probe boundary — these never
/// propagate to the scheduler.
#[derive(Debug, thiserror::Error)]
pub enum ProbeError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("probe timed out after {0:?}")]
    Timeout(Duration),
}

/// Capability interface for all probe variants.
#[async_trait]
pub trait Probe: Send + Sync {
    /// Dedup key of the resource/check this probe observes.
    fn resource_key(&self) -> &str;

    /// Which check this probe performs.
    fn kind(&self) -> CheckKind;

    /// Execute one probe invocation with a bounded timeout.
    async fn probe(&self) -> ProbeOutcome;
}

/// Run `fut` under the probe's timeout, mapping elapsed time to
/// [`ProbeError::Timeout`].
pub(crate) async fn bounded<T, E>(
    limit: Duration,
    fut: impl std::future::Future<Output = Result<T, E>> + Send,
) -> Result<T, ProbeError>
where
    ProbeError: From<E>,
{
    match tokio::time::timeout(limit, fut).await {
        Ok(result) => result.map_err(ProbeError::from),
        Err(_) => Err(ProbeError::Timeout(limit)),
    }
}
