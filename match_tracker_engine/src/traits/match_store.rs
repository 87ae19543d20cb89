use std::collections::HashSet;

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::{
    db_types::{DutyAssignmentResult, Match, MatchId, Player, PlayerStats, ProcessingStatus, RosterMember},
    events::EventKind,
};

#[derive(Debug, Clone, Error)]
pub enum MatchStoreError {
    #[error("Internal database error: {0}")]
    DatabaseError(String),
    #[error("Match {0} does not exist")]
    MatchNotFound(MatchId),
    #[error("Match {match_id} is no longer {expected}. Its status is now {actual}")]
    StatusConflict { match_id: MatchId, expected: ProcessingStatus, actual: String },
    #[error("Match {match_id} cannot move from {from} to {to}")]
    IllegalTransition { match_id: MatchId, from: ProcessingStatus, to: ProcessingStatus },
    #[error("Stored data could not be interpreted: {0}")]
    DataError(String),
}

impl From<sqlx::Error> for MatchStoreError {
    fn from(e: sqlx::Error) -> Self {
        MatchStoreError::DatabaseError(e.to_string())
    }
}

impl MatchStoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::StatusConflict { .. })
    }
}

/// Persistent storage for matches, the club roster and player statistics.
///
/// Implementations must guarantee two things:
/// * [`MatchStore::update_processing_status`] is a compare-and-swap: it only succeeds when the stored status equals
///   `expected`, and it never moves a match backwards.
/// * [`MatchStore::assign_duty`] is atomic with respect to concurrent calls, including calls for different matches that
///   share candidates.
#[allow(async_fn_in_trait)]
pub trait MatchStore: Clone {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Inserts new matches with their given processing status, or refreshes the booking platform fields of existing
    /// ones. The processing status and duty of an existing match are never touched.
    ///
    /// Returns the number of rows written.
    async fn upsert_matches(&self, matches: &[Match]) -> Result<usize, MatchStoreError>;

    async fn fetch_match(&self, match_id: &MatchId) -> Result<Option<Match>, MatchStoreError>;

    /// All matches that have not reached [`ProcessingStatus::Completed`], earliest start first.
    async fn fetch_matches_pending_processing(&self) -> Result<Vec<Match>, MatchStoreError>;

    /// Moves the match from `expected` to `new`.
    ///
    /// Fails with [`MatchStoreError::StatusConflict`] if the stored status is not `expected`, and with
    /// [`MatchStoreError::IllegalTransition`] if `new` does not come after `expected`.
    async fn update_processing_status(
        &self,
        match_id: &MatchId,
        expected: ProcessingStatus,
        new: ProcessingStatus,
    ) -> Result<(), MatchStoreError>;

    /// Adds the players to the roster, refreshing names and levels of existing members. Duty counts are preserved.
    async fn upsert_roster_members(&self, players: &[Player]) -> Result<usize, MatchStoreError>;

    async fn roster_ids(&self) -> Result<HashSet<String>, MatchStoreError>;

    async fn fetch_roster(&self) -> Result<Vec<RosterMember>, MatchStoreError>;

    /// Picks the roster member among `candidates` with the fewest duties (lowest id on ties), increments their duty
    /// count and records them as the match's duty. If the match already has a duty, it is returned unchanged.
    async fn assign_duty(&self, match_id: &MatchId, candidates: &[String])
        -> Result<DutyAssignmentResult, MatchStoreError>;

    /// Adds the match's results to the statistics of its players. Returns `false` if the match had already been
    /// recorded, in which case nothing changes.
    async fn update_player_stats(&self, m: &Match) -> Result<bool, MatchStoreError>;

    async fn fetch_player_stats(&self) -> Result<Vec<PlayerStats>, MatchStoreError>;

    /// Records that `kind` is about to be published for the match.
    ///
    /// Returns `false` if the event is already out: it was published after `overdue_before`, or its completion has
    /// already been recorded.
    async fn claim_event(
        &self,
        match_id: &MatchId,
        kind: EventKind,
        overdue_before: DateTime<Utc>,
    ) -> Result<bool, MatchStoreError>;

    /// Records that the side effect of `kind` is being performed for the match. Returns `false` if that has already
    /// happened, so that redelivered events are only acted on once.
    async fn complete_event(&self, match_id: &MatchId, kind: EventKind) -> Result<bool, MatchStoreError>;

    /// Forgets the event, so the next claim or completion for it succeeds.
    async fn release_event(&self, match_id: &MatchId, kind: EventKind) -> Result<(), MatchStoreError>;
}
