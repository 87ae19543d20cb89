//! Counters for the candidate filter and the processing engine.
//!
//! An [`EngineMetrics`] instance is created by whoever assembles the engine and shared by reference counting. There is
//! no global registry.
use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

#[derive(Debug, Default)]
pub struct EngineMetrics {
    pub summaries_seen: AtomicU64,
    pub summaries_prefiltered: AtomicU64,
    pub detail_fetches: AtomicU64,
    pub fetch_failures: AtomicU64,
    pub matches_accepted: AtomicU64,
    pub matches_rejected: AtomicU64,
    pub matches_processed: AtomicU64,
    pub transitions: AtomicU64,
    pub events_published: AtomicU64,
    pub publish_failures: AtomicU64,
    pub persist_failures: AtomicU64,
    pub status_conflicts: AtomicU64,
    pub completions: AtomicU64,
    pub stale_completions: AtomicU64,
    pub duplicate_deliveries: AtomicU64,
    pub duties_assigned: AtomicU64,
    pub notifications_sent: AtomicU64,
    pub stats_recorded: AtomicU64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub summaries_seen: u64,
    pub summaries_prefiltered: u64,
    pub detail_fetches: u64,
    pub fetch_failures: u64,
    pub matches_accepted: u64,
    pub matches_rejected: u64,
    pub matches_processed: u64,
    pub transitions: u64,
    pub events_published: u64,
    pub publish_failures: u64,
    pub persist_failures: u64,
    pub status_conflicts: u64,
    pub completions: u64,
    pub stale_completions: u64,
    pub duplicate_deliveries: u64,
    pub duties_assigned: u64,
    pub notifications_sent: u64,
    pub stats_recorded: u64,
}

impl EngineMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn incr(counter: &AtomicU64) {
        Self::add(counter, 1);
    }

    pub fn add(counter: &AtomicU64, n: u64) {
        counter.fetch_add(n, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        let get = |c: &AtomicU64| c.load(Ordering::Relaxed);
        MetricsSnapshot {
            summaries_seen: get(&self.summaries_seen),
            summaries_prefiltered: get(&self.summaries_prefiltered),
            detail_fetches: get(&self.detail_fetches),
            fetch_failures: get(&self.fetch_failures),
            matches_accepted: get(&self.matches_accepted),
            matches_rejected: get(&self.matches_rejected),
            matches_processed: get(&self.matches_processed),
            transitions: get(&self.transitions),
            events_published: get(&self.events_published),
            publish_failures: get(&self.publish_failures),
            persist_failures: get(&self.persist_failures),
            status_conflicts: get(&self.status_conflicts),
            completions: get(&self.completions),
            stale_completions: get(&self.stale_completions),
            duplicate_deliveries: get(&self.duplicate_deliveries),
            duties_assigned: get(&self.duties_assigned),
            notifications_sent: get(&self.notifications_sent),
            stats_recorded: get(&self.stats_recorded),
        }
    }
}
