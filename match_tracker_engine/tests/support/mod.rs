#![allow(dead_code)]
use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use chrono::{Duration, Utc};
use match_tracker_engine::{
    db_types::{GameStatus, Match, MatchId, Player, ProcessingStatus, ResultsStatus, SetResult, Team, TeamOutcome},
    traits::{MatchStore, NotificationReceipt, Notifier, NotifierError},
    SqliteDatabase,
};
pub use match_tracker_engine::test_utils::prepare_env::{fresh_database, tear_down};

pub mod mocks;

pub async fn seed_roster(db: &SqliteDatabase, ids: &[&str]) {
    let players = ids.iter().map(|id| Player::new(*id, *id)).collect::<Vec<_>>();
    db.upsert_roster_members(&players).await.expect("Error seeding roster");
}

pub async fn status_of(db: &SqliteDatabase, id: &str) -> ProcessingStatus {
    db.fetch_match(&MatchId::from(id)).await.unwrap().expect("match should exist").processing_status
}

fn teams(players: &[&str]) -> Vec<Team> {
    let half = players.len().div_ceil(2);
    players
        .chunks(half.max(1))
        .enumerate()
        .map(|(i, chunk)| Team {
            team_id: i.to_string(),
            players: chunk.iter().map(|p| Player::new(*p, *p)).collect(),
            outcome: None,
        })
        .collect()
}

/// A match starting tomorrow.
pub fn upcoming(id: &str, players: &[&str]) -> Match {
    let start = Utc::now() + Duration::days(1);
    let mut m = Match::new(id, start, start + Duration::minutes(90));
    m.owner_id = players.first().map(|p| p.to_string());
    m.teams = teams(players);
    m
}

/// A played match with a confirmed result, won 6-3 6-4 by the first team.
pub fn played(id: &str, players: &[&str], ended_ago: Duration) -> Match {
    let end = Utc::now() - ended_ago;
    let mut m = Match::new(id, end - Duration::minutes(90), end);
    m.owner_id = players.first().map(|p| p.to_string());
    m.teams = teams(players);
    m.game_status = GameStatus::Played;
    m.results_status = ResultsStatus::Confirmed;
    if let [first, second] = m.teams.as_mut_slice() {
        first.outcome = Some(TeamOutcome::Won);
        second.outcome = Some(TeamOutcome::Lost);
    }
    m.results = vec![
        SetResult { name: "Set-1".into(), scores: BTreeMap::from([("0".into(), 6), ("1".into(), 3)]) },
        SetResult { name: "Set-2".into(), scores: BTreeMap::from([("0".into(), 6), ("1".into(), 4)]) },
    ];
    m
}

/// Records every notice it is asked to send.
#[derive(Clone, Default)]
pub struct RecordingNotifier {
    pub sent: Arc<Mutex<Vec<(String, MatchId)>>>,
}

impl RecordingNotifier {
    pub fn count(&self, kind: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|(k, _)| k == kind).count()
    }

    fn record(&self, kind: &str, m: &Match, dry_run: bool) -> NotificationReceipt {
        self.sent.lock().unwrap().push((kind.to_string(), m.match_id.clone()));
        if dry_run {
            NotificationReceipt::DryRun { preview: format!("{kind} {}", m.match_id) }
        } else {
            NotificationReceipt::Delivered { channel: "test".into(), message_id: None }
        }
    }
}

impl Notifier for RecordingNotifier {
    async fn send_booking_notification(&self, m: &Match, dry_run: bool) -> Result<NotificationReceipt, NotifierError> {
        Ok(self.record("booking", m, dry_run))
    }

    async fn send_result_notification(&self, m: &Match, dry_run: bool) -> Result<NotificationReceipt, NotifierError> {
        Ok(self.record("result", m, dry_run))
    }
}
