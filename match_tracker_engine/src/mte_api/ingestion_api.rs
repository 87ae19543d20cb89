use std::{fmt::Debug, sync::Arc};

use log::*;
use serde::Serialize;

use super::{
    candidate_filter::{CandidateFilter, FilterConfig},
    errors::EngineError,
};
use crate::{
    metrics::EngineMetrics,
    traits::{BookingPlatform, MatchStore},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct IngestionReport {
    pub summaries: usize,
    pub accepted: usize,
    pub upserted: usize,
}

/// `IngestionApi` pulls the current match listing from the booking platform, keeps the club matches and saves them.
pub struct IngestionApi<B, P> {
    store: B,
    platform: P,
    config: FilterConfig,
    metrics: Arc<EngineMetrics>,
}

impl<B, P> Debug for IngestionApi<B, P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "IngestionApi ({:?})", self.config)
    }
}

impl<B, P> IngestionApi<B, P> {
    pub fn new(store: B, platform: P, config: FilterConfig, metrics: Arc<EngineMetrics>) -> Self {
        Self { store, platform, config, metrics }
    }
}

impl<B, P> IngestionApi<B, P>
where
    B: MatchStore,
    P: BookingPlatform,
{
    /// Runs one ingestion cycle: list, filter, then upsert the batch once every detail fetch has finished.
    ///
    /// Failing to list the summaries or read the roster fails the cycle. Individual detail fetches that fail are
    /// logged and skipped.
    pub async fn run_ingestion_cycle(&self) -> Result<IngestionReport, EngineError> {
        let summaries = self.platform.fetch_match_summaries().await?;
        let roster = self.store.roster_ids().await?;
        trace!("🔎️ {} summaries listed, {} roster members", summaries.len(), roster.len());
        let summary_count = summaries.len();
        let batch = CandidateFilter::new(&self.platform, self.config, &self.metrics).filter(summaries, &roster).await;
        let upserted = if batch.is_empty() { 0 } else { self.store.upsert_matches(&batch).await? };
        let report = IngestionReport { summaries: summary_count, accepted: batch.len(), upserted };
        info!("🔎️ Ingestion cycle complete. {report:?}");
        Ok(report)
    }
}
