use log::*;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Match, MatchId, PlayerStats, TeamOutcome},
    traits::MatchStoreError,
};

/// The per-player contribution of a single match to the statistics table.
///
/// Sets are decided by comparing a team's score with the best opposing score. When the platform gives no team outcome,
/// the team that won more sets won the match.
pub fn stats_for_match(m: &Match) -> Vec<PlayerStats> {
    let mut result = Vec::new();
    for team in &m.teams {
        let (mut sets_won, mut sets_lost, mut games_won, mut games_lost) = (0, 0, 0, 0);
        for set in &m.results {
            let own = i64::from(set.scores.get(&team.team_id).copied().unwrap_or(0));
            let opponents = set.scores.iter().filter(|(id, _)| **id != team.team_id).map(|(_, s)| i64::from(*s));
            let best_opponent = opponents.clone().max().unwrap_or(0);
            games_won += own;
            games_lost += opponents.sum::<i64>();
            if own > best_opponent {
                sets_won += 1;
            } else if own < best_opponent {
                sets_lost += 1;
            }
        }
        let outcome = team.outcome.or(match sets_won.cmp(&sets_lost) {
            std::cmp::Ordering::Greater => Some(TeamOutcome::Won),
            std::cmp::Ordering::Less => Some(TeamOutcome::Lost),
            std::cmp::Ordering::Equal => None,
        });
        for player in &team.players {
            result.push(PlayerStats {
                player_id: player.id.clone(),
                name: player.name.clone(),
                matches_played: 1,
                matches_won: i64::from(outcome == Some(TeamOutcome::Won)),
                matches_lost: i64::from(outcome == Some(TeamOutcome::Lost)),
                sets_won,
                sets_lost,
                games_won,
                games_lost,
            });
        }
    }
    result
}

/// Marks the match as recorded. Returns false if it already was.
pub async fn log_match(match_id: &MatchId, conn: &mut SqliteConnection) -> Result<bool, MatchStoreError> {
    let result = sqlx::query("INSERT INTO player_stats_log (match_id) VALUES ($1) ON CONFLICT(match_id) DO NOTHING")
        .bind(match_id.as_str())
        .execute(conn)
        .await?;
    Ok(result.rows_affected() == 1)
}

pub async fn add_stats(stats: &PlayerStats, conn: &mut SqliteConnection) -> Result<(), MatchStoreError> {
    sqlx::query(
        r#"
            INSERT INTO player_stats (
                player_id,
                name,
                matches_played,
                matches_won,
                matches_lost,
                sets_won,
                sets_lost,
                games_won,
                games_lost
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            ON CONFLICT(player_id) DO UPDATE SET
                name = excluded.name,
                matches_played = player_stats.matches_played + excluded.matches_played,
                matches_won = player_stats.matches_won + excluded.matches_won,
                matches_lost = player_stats.matches_lost + excluded.matches_lost,
                sets_won = player_stats.sets_won + excluded.sets_won,
                sets_lost = player_stats.sets_lost + excluded.sets_lost,
                games_won = player_stats.games_won + excluded.games_won,
                games_lost = player_stats.games_lost + excluded.games_lost,
                updated_at = CURRENT_TIMESTAMP;
        "#,
    )
    .bind(stats.player_id.as_str())
    .bind(stats.name.as_str())
    .bind(stats.matches_played)
    .bind(stats.matches_won)
    .bind(stats.matches_lost)
    .bind(stats.sets_won)
    .bind(stats.sets_lost)
    .bind(stats.games_won)
    .bind(stats.games_lost)
    .execute(conn)
    .await?;
    trace!("🗃️ Stats for {} updated", stats.player_id);
    Ok(())
}

pub async fn fetch_player_stats(conn: &mut SqliteConnection) -> Result<Vec<PlayerStats>, MatchStoreError> {
    let stats = sqlx::query_as(
        "SELECT player_id, name, matches_played, matches_won, matches_lost, sets_won, sets_lost, games_won, \
         games_lost FROM player_stats ORDER BY matches_won DESC, matches_played DESC, player_id ASC",
    )
    .fetch_all(conn)
    .await?;
    Ok(stats)
}
