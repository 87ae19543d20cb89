use std::collections::HashSet;

use log::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Player, RosterMember},
    traits::MatchStoreError,
};

pub async fn upsert_member(player: &Player, conn: &mut SqliteConnection) -> Result<(), MatchStoreError> {
    sqlx::query(
        r#"
            INSERT INTO roster (player_id, name, level) VALUES ($1, $2, $3)
            ON CONFLICT(player_id) DO UPDATE SET
                name = excluded.name,
                level = COALESCE(excluded.level, roster.level),
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(player.id.as_str())
    .bind(player.name.as_str())
    .bind(player.level)
    .execute(conn)
    .await?;
    trace!("🗃️ Roster member {} saved", player.id);
    Ok(())
}

pub async fn roster_ids(conn: &mut SqliteConnection) -> Result<HashSet<String>, MatchStoreError> {
    let ids: Vec<String> = sqlx::query_scalar("SELECT player_id FROM roster").fetch_all(conn).await?;
    Ok(ids.into_iter().collect())
}

pub async fn fetch_roster(conn: &mut SqliteConnection) -> Result<Vec<RosterMember>, MatchStoreError> {
    let members = sqlx::query_as("SELECT * FROM roster ORDER BY name ASC, player_id ASC").fetch_all(conn).await?;
    Ok(members)
}

/// The roster member among `candidates` with the fewest duties. Ties go to the lowest player id.
pub async fn least_assigned(
    candidates: &[String],
    conn: &mut SqliteConnection,
) -> Result<Option<RosterMember>, MatchStoreError> {
    if candidates.is_empty() {
        return Ok(None);
    }
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM roster WHERE player_id IN (");
    let mut ids = builder.separated(", ");
    for id in candidates {
        ids.push_bind(id.as_str());
    }
    ids.push_unseparated(") ORDER BY duty_count ASC, player_id ASC LIMIT 1");
    let member = builder.build_query_as::<RosterMember>().fetch_optional(conn).await?;
    Ok(member)
}

pub async fn increment_duty_count(player_id: &str, conn: &mut SqliteConnection) -> Result<(), MatchStoreError> {
    sqlx::query("UPDATE roster SET duty_count = duty_count + 1, updated_at = CURRENT_TIMESTAMP WHERE player_id = $1")
        .bind(player_id)
        .execute(conn)
        .await?;
    Ok(())
}
