//! Turns a list of match summaries into the batch of full match records that belong to the club.
//!
//! Summaries whose owner is not a club member are dropped without a network round trip. The rest are fetched
//! concurrently, with at most [`FilterConfig::max_concurrent_fetches`] requests in flight, and checked against the
//! [`ClubMatchPredicate`]. The batch is returned once every fetch has finished.
use std::collections::HashSet;

use futures_util::future::join_all;
use log::*;
use tokio::sync::{Mutex, Semaphore};

use crate::{
    db_types::{Match, MatchSummary},
    metrics::EngineMetrics,
    traits::BookingPlatform,
};

pub const DEFAULT_MAX_CONCURRENT_FETCHES: usize = 50;
pub const DEFAULT_FULL_MATCH_SIZE: usize = 4;
pub const DEFAULT_MIN_KNOWN_MEMBERS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FilterConfig {
    pub max_concurrent_fetches: usize,
    pub predicate: ClubMatchPredicate,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self { max_concurrent_fetches: DEFAULT_MAX_CONCURRENT_FETCHES, predicate: ClubMatchPredicate::default() }
    }
}

/// Decides whether a match is a club match from the number of participants and how many of them are on the roster.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClubMatchPredicate {
    pub full_match_size: usize,
    pub min_known_members: usize,
}

impl Default for ClubMatchPredicate {
    fn default() -> Self {
        Self { full_match_size: DEFAULT_FULL_MATCH_SIZE, min_known_members: DEFAULT_MIN_KNOWN_MEMBERS }
    }
}

impl ClubMatchPredicate {
    /// * A full match needs at least `min_known_members` roster members.
    /// * A partially filled match is only accepted if every participant is a member.
    /// * A match with no participants is never accepted.
    pub fn accepts(&self, total: usize, known: usize) -> bool {
        if total >= self.full_match_size {
            known >= self.min_known_members
        } else if total > 0 {
            known == total
        } else {
            false
        }
    }

    pub fn is_club_match(&self, m: &Match, roster: &HashSet<String>) -> bool {
        let total = m.players().count();
        let known = m.players().filter(|p| roster.contains(&p.id)).count();
        self.accepts(total, known)
    }
}

pub struct CandidateFilter<'a, P> {
    platform: &'a P,
    config: FilterConfig,
    metrics: &'a EngineMetrics,
}

impl<'a, P> CandidateFilter<'a, P>
where P: BookingPlatform
{
    pub fn new(platform: &'a P, config: FilterConfig, metrics: &'a EngineMetrics) -> Self {
        Self { platform, config, metrics }
    }

    pub async fn filter(&self, summaries: Vec<MatchSummary>, roster: &HashSet<String>) -> Vec<Match> {
        EngineMetrics::add(&self.metrics.summaries_seen, summaries.len() as u64);
        let candidates = prefilter(summaries, roster);
        EngineMetrics::add(&self.metrics.summaries_prefiltered, candidates.len() as u64);
        debug!("🔎️ {} summaries have an owner on the roster", candidates.len());

        let semaphore = Semaphore::new(self.config.max_concurrent_fetches.max(1));
        let batch = Mutex::new(Vec::with_capacity(candidates.len()));
        let fetches = candidates.into_iter().map(|summary| {
            let semaphore = &semaphore;
            let batch = &batch;
            async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    return;
                };
                if let Some(m) = self.fetch_and_check(&summary, roster).await {
                    batch.lock().await.push(m);
                }
            }
        });
        join_all(fetches).await;

        let batch = batch.into_inner();
        info!("🔎️ {} club matches found", batch.len());
        batch
    }

    async fn fetch_and_check(&self, summary: &MatchSummary, roster: &HashSet<String>) -> Option<Match> {
        EngineMetrics::incr(&self.metrics.detail_fetches);
        let m = match self.platform.fetch_match(&summary.match_id).await {
            Ok(m) => m,
            Err(e) => {
                EngineMetrics::incr(&self.metrics.fetch_failures);
                warn!("🔎️ Could not fetch match {}. It will be retried next cycle. {e}", summary.match_id);
                return None;
            },
        };
        if self.config.predicate.is_club_match(&m, roster) {
            EngineMetrics::incr(&self.metrics.matches_accepted);
            trace!("🔎️ Match {} is a club match", m.match_id);
            Some(m)
        } else {
            EngineMetrics::incr(&self.metrics.matches_rejected);
            trace!("🔎️ Match {} is not a club match", m.match_id);
            None
        }
    }
}

/// Drops summaries whose owner is unknown or not on the roster.
pub fn prefilter(summaries: Vec<MatchSummary>, roster: &HashSet<String>) -> Vec<MatchSummary> {
    summaries.into_iter().filter(|s| s.owner_id.as_ref().is_some_and(|owner| roster.contains(owner))).collect()
}
