//! `SqliteDatabase` is the SQLite implementation of [`MatchStore`].
use std::{collections::HashSet, fmt::Debug};

use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{
    db::{events, matches, new_pool, roster, stats},
    SqliteDatabaseError,
};
use crate::{
    db_types::{
        DutyAssignment,
        DutyAssignmentResult,
        Match,
        MatchId,
        Player,
        PlayerStats,
        ProcessingStatus,
        RosterMember,
    },
    events::EventKind,
    traits::{MatchStore, MatchStoreError},
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl MatchStore for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    async fn upsert_matches(&self, batch: &[Match]) -> Result<usize, MatchStoreError> {
        let mut tx = self.pool.begin().await?;
        for m in batch {
            matches::upsert_match(m, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Upserted {} matches", batch.len());
        Ok(batch.len())
    }

    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::fetch_match(match_id, &mut conn).await
    }

    async fn fetch_matches_pending_processing(&self) -> Result<Vec<Match>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        let pending = matches::fetch_pending(&mut conn).await?;
        trace!("🗃️ {} matches are pending processing", pending.len());
        Ok(pending)
    }

    async fn update_processing_status(
        &self,
        match_id: &MatchId,
        expected: ProcessingStatus,
        new: ProcessingStatus,
    ) -> Result<(), MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        matches::update_processing_status(match_id, expected, new, &mut conn).await
    }

    async fn upsert_roster_members(&self, players: &[Player]) -> Result<usize, MatchStoreError> {
        let mut tx = self.pool.begin().await?;
        for player in players {
            roster::upsert_member(player, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(players.len())
    }

    async fn roster_ids(&self) -> Result<HashSet<String>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        roster::roster_ids(&mut conn).await
    }

    async fn fetch_roster(&self) -> Result<Vec<RosterMember>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        roster::fetch_roster(&mut conn).await
    }

    /// Runs in a single transaction. The transaction starts with a write to the match row, so SQLite hands out the
    /// write lock before the roster is read, and concurrent assignments queue up behind it.
    async fn assign_duty(
        &self,
        match_id: &MatchId,
        candidates: &[String],
    ) -> Result<DutyAssignmentResult, MatchStoreError> {
        let mut tx = self.pool.begin().await?;
        if !matches::touch_match(match_id, &mut tx).await? {
            return Err(MatchStoreError::MatchNotFound(match_id.clone()));
        }
        if let Some(existing) = matches::fetch_duty(match_id, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Match {match_id} already has {} on duty", existing.player_id);
            return Ok(DutyAssignmentResult::AlreadyAssigned(existing));
        }
        let Some(member) = roster::least_assigned(candidates, &mut tx).await? else {
            tx.commit().await?;
            return Ok(DutyAssignmentResult::NoCandidates);
        };
        let duty = DutyAssignment { player_id: member.player_id, player_name: member.name };
        roster::increment_duty_count(&duty.player_id, &mut tx).await?;
        if !matches::set_duty(match_id, &duty, &mut tx).await? {
            // Only possible if another writer got past the lock on the match row
            tx.rollback().await?;
            return Err(MatchStoreError::DataError(format!("Duty for match {match_id} was set concurrently")));
        }
        tx.commit().await?;
        debug!("🗃️ {} ({}) is on duty for match {match_id}", duty.player_name, duty.player_id);
        Ok(DutyAssignmentResult::Assigned(duty))
    }

    async fn update_player_stats(&self, m: &Match) -> Result<bool, MatchStoreError> {
        let mut tx = self.pool.begin().await?;
        if !stats::log_match(&m.match_id, &mut tx).await? {
            tx.commit().await?;
            debug!("🗃️ Stats for match {} were already recorded", m.match_id);
            return Ok(false);
        }
        let contributions = stats::stats_for_match(m);
        for player_stats in &contributions {
            stats::add_stats(player_stats, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Recorded stats for {} players from match {}", contributions.len(), m.match_id);
        Ok(true)
    }

    async fn fetch_player_stats(&self) -> Result<Vec<PlayerStats>, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        stats::fetch_player_stats(&mut conn).await
    }

    async fn claim_event(
        &self,
        match_id: &MatchId,
        kind: EventKind,
        overdue_before: DateTime<Utc>,
    ) -> Result<bool, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        events::claim_event(match_id, kind, overdue_before, &mut conn).await
    }

    async fn complete_event(&self, match_id: &MatchId, kind: EventKind) -> Result<bool, MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        events::complete_event(match_id, kind, &mut conn).await
    }

    async fn release_event(&self, match_id: &MatchId, kind: EventKind) -> Result<(), MatchStoreError> {
        let mut conn = self.pool.acquire().await?;
        events::release_event(match_id, kind, &mut conn).await
    }
}

impl SqliteDatabase {
    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, SqliteDatabaseError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), SqliteDatabaseError> {
        sqlx::migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}
