//! Shorthand for building matches in tests.
use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::db_types::{GameStatus, Match, Player, ProcessingStatus, ResultsStatus, SetResult, Team, TeamOutcome};

pub struct MatchBuilder {
    m: Match,
}

impl MatchBuilder {
    /// An upcoming match, starting in a day's time.
    pub fn upcoming(id: &str) -> Self {
        let start = Utc::now() + Duration::days(1);
        Self { m: Match::new(id, start, start + Duration::minutes(90)) }
    }

    /// A played match with a confirmed result that ended `ended_ago` ago.
    pub fn played(id: &str, ended_ago: Duration) -> Self {
        let end = Utc::now() - ended_ago;
        let mut m = Match::new(id, end - Duration::minutes(90), end);
        m.game_status = GameStatus::Played;
        m.results_status = ResultsStatus::Confirmed;
        Self { m }
    }

    pub fn owner(mut self, id: &str) -> Self {
        self.m.owner_id = Some(id.to_string());
        self.m.owner_name = Some(id.to_string());
        self
    }

    /// Adds a team. Player names are the player ids.
    pub fn team(mut self, players: &[&str]) -> Self {
        let team_id = self.m.teams.len().to_string();
        let players = players.iter().map(|p| Player::new(*p, *p)).collect();
        self.m.teams.push(Team { team_id, players, outcome: None });
        self
    }

    /// Two sets, both won by the first team.
    pub fn first_team_wins(mut self) -> Self {
        let outcomes = [TeamOutcome::Won, TeamOutcome::Lost];
        for (team, outcome) in self.m.teams.iter_mut().zip(outcomes) {
            team.outcome = Some(outcome);
        }
        self.m.results = ["Set-1", "Set-2"]
            .into_iter()
            .map(|name| SetResult { name: name.into(), scores: BTreeMap::from([("0".into(), 6), ("1".into(), 3)]) })
            .collect();
        self
    }

    pub fn game_status(mut self, status: GameStatus) -> Self {
        self.m.game_status = status;
        self
    }

    pub fn results_status(mut self, status: ResultsStatus) -> Self {
        self.m.results_status = status;
        self
    }

    pub fn status(mut self, status: ProcessingStatus) -> Self {
        self.m.processing_status = status;
        self
    }

    pub fn end_date(mut self, end: DateTime<Utc>) -> Self {
        self.m.end_date = end;
        self
    }

    pub fn build(self) -> Match {
        self.m
    }
}
