//! Bookkeeping for the events published on behalf of a match.
use chrono::{DateTime, Utc};
use log::*;
use sqlx::SqliteConnection;

use crate::{db_types::MatchId, events::EventKind, traits::MatchStoreError};

/// Inserts the event row, or refreshes it if the earlier publication is overdue and was never completed.
pub async fn claim_event(
    match_id: &MatchId,
    kind: EventKind,
    overdue_before: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, MatchStoreError> {
    let result = sqlx::query(
        r#"
            INSERT INTO match_events (match_id, kind, published_at) VALUES ($1, $2, $3)
            ON CONFLICT (match_id, kind) DO UPDATE SET published_at = excluded.published_at
            WHERE match_events.completed_at IS NULL AND match_events.published_at < $4
        "#,
    )
    .bind(match_id.as_str())
    .bind(kind.to_string())
    .bind(Utc::now())
    .bind(overdue_before)
    .execute(conn)
    .await?;
    let claimed = result.rows_affected() == 1;
    trace!("🗃️ {kind} for match {match_id} claimed: {claimed}");
    Ok(claimed)
}

/// Sets `completed_at`, creating the row if the event was published by someone else. Returns false if it was already
/// set.
pub async fn complete_event(
    match_id: &MatchId,
    kind: EventKind,
    conn: &mut SqliteConnection,
) -> Result<bool, MatchStoreError> {
    let now = Utc::now();
    let result = sqlx::query(
        r#"
            INSERT INTO match_events (match_id, kind, published_at, completed_at) VALUES ($1, $2, $3, $3)
            ON CONFLICT (match_id, kind) DO UPDATE SET completed_at = excluded.completed_at
            WHERE match_events.completed_at IS NULL
        "#,
    )
    .bind(match_id.as_str())
    .bind(kind.to_string())
    .bind(now)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn release_event(
    match_id: &MatchId,
    kind: EventKind,
    conn: &mut SqliteConnection,
) -> Result<(), MatchStoreError> {
    sqlx::query("DELETE FROM match_events WHERE match_id = $1 AND kind = $2")
        .bind(match_id.as_str())
        .bind(kind.to_string())
        .execute(conn)
        .await?;
    trace!("🗃️ {kind} for match {match_id} released");
    Ok(())
}
