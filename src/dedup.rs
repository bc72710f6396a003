//! Incident deduplication — per-key CLOSED/OPEN state machine
//!
//! A dedup key is present in the ledger only while its incident is open;
//! absence means never-triggered or already-cleared. Each check kind keeps
//! an independent key (e.g. `db-primary` vs `db-primary-bloat`) so
//! concurrent degradations of one physical resource have independent
//! open/close lifecycles.
//!
//! The ledger is deliberately uncapped: deployments monitor a small fixed
//! resource set, so the entry count is bounded by configuration.

use std::collections::HashSet;

/// Outcome of feeding one scored observation through the state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// CLOSED → OPEN: a new incident must be reported.
    Opened,
    /// OPEN → OPEN: still unhealthy, duplicate suppressed.
    Suppressed,
    /// OPEN → CLOSED: recovered; a future degradation re-triggers.
    Cleared,
    /// CLOSED → CLOSED: healthy and nothing was open.
    Unchanged,
}

/// Tracks which dedup keys currently have an open incident.
#[derive(Debug, Default)]
pub struct DedupLedger {
    open: HashSet<String>,
}

impl DedupLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one score through the state machine for `key`.
    ///
    /// Trigger comparison is strict `<`; `score == threshold` is healthy.
    pub fn observe(&mut self, key: &str, score: u8, threshold: u8) -> Transition {
        if score < threshold {
            if self.open.contains(key) {
                Transition::Suppressed
            } else {
                self.open.insert(key.to_string());
                Transition::Opened
            }
        } else if self.open.remove(key) {
            Transition::Cleared
        } else {
            Transition::Unchanged
        }
    }

    /// Whether `key` currently has an open incident.
    pub fn is_open(&self, key: &str) -> bool {
        self.open.contains(key)
    }

    /// Explicitly clear one entry (admin/fault-injection hook).
    /// Returns true if an open incident was cleared.
    pub fn clear(&mut self, key: &str) -> bool {
        self.open.remove(key)
    }

    /// Clear every entry, returning how many were open.
    pub fn clear_all(&mut self) -> usize {
        let count = self.open.len();
        self.open.clear();
        count
    }

    pub fn open_count(&self) -> usize {
        self.open.len()
    }
}
