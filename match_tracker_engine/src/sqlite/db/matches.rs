use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{
        DutyAssignment,
        GameStatus,
        Match,
        MatchId,
        ProcessingStatus,
        ResultsStatus,
        SetResult,
        Team,
        VenueInfo,
    },
    traits::MatchStoreError,
};

/// A row of the `matches` table. Teams and set results are stored as JSON documents.
#[derive(Debug, Clone, FromRow)]
struct MatchRow {
    match_id: String,
    owner_id: Option<String>,
    owner_name: Option<String>,
    start_date: chrono::DateTime<chrono::Utc>,
    end_date: chrono::DateTime<chrono::Utc>,
    created_at: chrono::DateTime<chrono::Utc>,
    teams: String,
    results: String,
    game_status: String,
    results_status: String,
    processing_status: String,
    duty_player_id: Option<String>,
    duty_player_name: Option<String>,
    resource_name: Option<String>,
    price: Option<String>,
    access_code: Option<String>,
    tenant_id: Option<String>,
    tenant_name: Option<String>,
}

impl TryFrom<MatchRow> for Match {
    type Error = MatchStoreError;

    fn try_from(row: MatchRow) -> Result<Self, Self::Error> {
        let data_err = |e: String| MatchStoreError::DataError(format!("match {}: {e}", row.match_id));
        let processing_status =
            row.processing_status.parse::<ProcessingStatus>().map_err(|e| data_err(e.to_string()))?;
        let teams = serde_json::from_str::<Vec<Team>>(&row.teams).map_err(|e| data_err(e.to_string()))?;
        let results = serde_json::from_str::<Vec<SetResult>>(&row.results).map_err(|e| data_err(e.to_string()))?;
        let duty = match (row.duty_player_id, row.duty_player_name) {
            (Some(player_id), name) => Some(DutyAssignment { player_id, player_name: name.unwrap_or_default() }),
            (None, _) => None,
        };
        Ok(Match {
            match_id: MatchId(row.match_id),
            start_date: row.start_date,
            end_date: row.end_date,
            created_at: row.created_at,
            owner_id: row.owner_id,
            owner_name: row.owner_name,
            teams,
            results,
            game_status: GameStatus::from_wire(&row.game_status),
            results_status: ResultsStatus::from_wire(&row.results_status),
            processing_status,
            duty,
            venue: VenueInfo {
                resource_name: row.resource_name,
                price: row.price,
                access_code: row.access_code,
                tenant_id: row.tenant_id,
                tenant_name: row.tenant_name,
            },
        })
    }
}

/// Inserts the match, or refreshes the booking platform fields if it already exists. The processing status and duty
/// columns are only written on insert.
pub async fn upsert_match(m: &Match, conn: &mut SqliteConnection) -> Result<(), MatchStoreError> {
    let teams = serde_json::to_string(&m.teams).map_err(|e| MatchStoreError::DataError(e.to_string()))?;
    let results = serde_json::to_string(&m.results).map_err(|e| MatchStoreError::DataError(e.to_string()))?;
    sqlx::query(
        r#"
            INSERT INTO matches (
                match_id,
                owner_id,
                owner_name,
                start_date,
                end_date,
                created_at,
                teams,
                results,
                game_status,
                results_status,
                processing_status,
                duty_player_id,
                duty_player_name,
                resource_name,
                price,
                access_code,
                tenant_id,
                tenant_name
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18)
            ON CONFLICT(match_id) DO UPDATE SET
                owner_id = excluded.owner_id,
                owner_name = excluded.owner_name,
                start_date = excluded.start_date,
                end_date = excluded.end_date,
                teams = excluded.teams,
                results = excluded.results,
                game_status = excluded.game_status,
                results_status = excluded.results_status,
                resource_name = excluded.resource_name,
                price = excluded.price,
                access_code = excluded.access_code,
                tenant_id = excluded.tenant_id,
                tenant_name = excluded.tenant_name,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(m.match_id.as_str())
    .bind(m.owner_id.as_deref())
    .bind(m.owner_name.as_deref())
    .bind(m.start_date)
    .bind(m.end_date)
    .bind(m.created_at)
    .bind(teams)
    .bind(results)
    .bind(m.game_status.to_string())
    .bind(m.results_status.to_string())
    .bind(m.processing_status.to_string())
    .bind(m.duty.as_ref().map(|d| d.player_id.as_str()))
    .bind(m.duty.as_ref().map(|d| d.player_name.as_str()))
    .bind(m.venue.resource_name.as_deref())
    .bind(m.venue.price.as_deref())
    .bind(m.venue.access_code.as_deref())
    .bind(m.venue.tenant_id.as_deref())
    .bind(m.venue.tenant_name.as_deref())
    .execute(conn)
    .await?;
    trace!("🗃️ Match {} saved", m.match_id);
    Ok(())
}

pub async fn fetch_match(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<Option<Match>, MatchStoreError> {
    let row: Option<MatchRow> = sqlx::query_as("SELECT * FROM matches WHERE match_id = $1")
        .bind(match_id.as_str())
        .fetch_optional(conn)
        .await?;
    row.map(Match::try_from).transpose()
}

/// Matches that are not yet completed. Rows that cannot be interpreted (e.g. an unknown processing status) are logged
/// and skipped, so that one bad row does not stall the whole pass.
pub async fn fetch_pending(conn: &mut SqliteConnection) -> Result<Vec<Match>, MatchStoreError> {
    let rows: Vec<MatchRow> = sqlx::query_as(
        "SELECT * FROM matches WHERE processing_status <> $1 ORDER BY start_date ASC, match_id ASC",
    )
    .bind(ProcessingStatus::Completed.to_string())
    .fetch_all(conn)
    .await?;
    let matches = rows
        .into_iter()
        .filter_map(|row| {
            let id = row.match_id.clone();
            let status = row.processing_status.clone();
            Match::try_from(row)
                .map_err(|e| error!("🗃️ Skipping match {id} (status {status}). {e}"))
                .ok()
        })
        .collect();
    Ok(matches)
}

/// Compare-and-swap on the processing status.
pub async fn update_processing_status(
    match_id: &MatchId,
    expected: ProcessingStatus,
    new: ProcessingStatus,
    conn: &mut SqliteConnection,
) -> Result<(), MatchStoreError> {
    if !expected.can_move_to(new) {
        return Err(MatchStoreError::IllegalTransition { match_id: match_id.clone(), from: expected, to: new });
    }
    let result = sqlx::query(
        "UPDATE matches SET processing_status = $1, updated_at = CURRENT_TIMESTAMP WHERE match_id = $2 AND \
         processing_status = $3",
    )
    .bind(new.to_string())
    .bind(match_id.as_str())
    .bind(expected.to_string())
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 1 {
        trace!("🗃️ Match {match_id} moved from {expected} to {new}");
        return Ok(());
    }
    let actual: Option<String> = sqlx::query_scalar("SELECT processing_status FROM matches WHERE match_id = $1")
        .bind(match_id.as_str())
        .fetch_optional(conn)
        .await?;
    match actual {
        None => Err(MatchStoreError::MatchNotFound(match_id.clone())),
        Some(actual) => Err(MatchStoreError::StatusConflict { match_id: match_id.clone(), expected, actual }),
    }
}

/// Bumps `updated_at` on the match row. Returns false if the match does not exist.
///
/// As the first statement of a transaction, this takes SQLite's write lock before anything is read.
pub async fn touch_match(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<bool, MatchStoreError> {
    let result = sqlx::query("UPDATE matches SET updated_at = CURRENT_TIMESTAMP WHERE match_id = $1")
        .bind(match_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn fetch_duty(
    match_id: &MatchId,
    conn: &mut SqliteConnection,
) -> Result<Option<DutyAssignment>, MatchStoreError> {
    let row: Option<(Option<String>, Option<String>)> =
        sqlx::query_as("SELECT duty_player_id, duty_player_name FROM matches WHERE match_id = $1")
            .bind(match_id.as_str())
            .fetch_optional(conn)
            .await?;
    let duty = match row {
        Some((Some(player_id), name)) => Some(DutyAssignment { player_id, player_name: name.unwrap_or_default() }),
        _ => None,
    };
    Ok(duty)
}

/// Writes the duty columns, but only if no duty has been set yet.
pub async fn set_duty(
    match_id: &MatchId,
    duty: &DutyAssignment,
    conn: &mut SqliteConnection,
) -> Result<bool, MatchStoreError> {
    let result = sqlx::query(
        "UPDATE matches SET duty_player_id = $1, duty_player_name = $2, updated_at = CURRENT_TIMESTAMP WHERE \
         match_id = $3 AND duty_player_id IS NULL",
    )
    .bind(duty.player_id.as_str())
    .bind(duty.player_name.as_str())
    .bind(match_id.as_str())
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}
