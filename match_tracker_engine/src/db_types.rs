use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Invalid {kind}: {value}")]
pub struct ConversionError {
    pub kind: &'static str,
    pub value: String,
}

impl ConversionError {
    fn new(kind: &'static str, value: &str) -> Self {
        Self { kind, value: value.to_string() }
    }
}

//--------------------------------------        MatchId        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MatchId(pub String);

impl MatchId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for MatchId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for MatchId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Display for MatchId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------    Status enums       ---------------------------------------------------------

/// Implements `Display` and `FromStr` for a status enum using its SCREAMING_SNAKE wire names.
macro_rules! wire_names {
    ($ty:ident, $kind:literal, { $($variant:ident => $name:literal),+ $(,)? }) => {
        impl Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match self {
                    $(Self::$variant => write!(f, $name),)+
                }
            }
        }

        impl FromStr for $ty {
            type Err = ConversionError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($name => Ok(Self::$variant),)+
                    other => Err(ConversionError::new($kind, other)),
                }
            }
        }
    };
}

/// The state of the game itself, as reported by the booking platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum GameStatus {
    Pending,
    Played,
    Canceled,
    Waiting,
    Expired,
    Unknown,
}

wire_names!(GameStatus, "game status", {
    Pending => "PENDING",
    Played => "PLAYED",
    Canceled => "CANCELED",
    Waiting => "WAITING",
    Expired => "EXPIRED",
    Unknown => "UNKNOWN",
});

impl GameStatus {
    /// Values the platform adds after this code was written map to [`GameStatus::Unknown`].
    pub fn from_wire(s: &str) -> Self {
        s.to_ascii_uppercase().parse().unwrap_or(Self::Unknown)
    }
}

/// The state of the reported result, as reported by the booking platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResultsStatus {
    Pending,
    Confirmed,
    Invalid,
    NotAllowed,
    Expired,
    Canceled,
    Waiting,
    Validating,
    Unknown,
}

wire_names!(ResultsStatus, "results status", {
    Pending => "PENDING",
    Confirmed => "CONFIRMED",
    Invalid => "INVALID",
    NotAllowed => "NOT_ALLOWED",
    Expired => "EXPIRED",
    Canceled => "CANCELED",
    Waiting => "WAITING",
    Validating => "VALIDATING",
    Unknown => "UNKNOWN",
});

impl ResultsStatus {
    pub fn from_wire(s: &str) -> Self {
        s.to_ascii_uppercase().parse().unwrap_or(Self::Unknown)
    }
}

/// The match tracker's own progress through the match lifecycle.
///
/// Variants are declared in lifecycle order, so the derived `Ord` is the order in which statuses are visited. A match
/// never moves to a status that compares lower than its current one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProcessingStatus {
    New,
    AssigningDuty,
    DutyAssigned,
    BookingNotified,
    ResultAvailable,
    ResultNotified,
    StatsUpdating,
    Completed,
}

wire_names!(ProcessingStatus, "processing status", {
    New => "NEW",
    AssigningDuty => "ASSIGNING_DUTY",
    DutyAssigned => "DUTY_ASSIGNED",
    BookingNotified => "BOOKING_NOTIFIED",
    ResultAvailable => "RESULT_AVAILABLE",
    ResultNotified => "RESULT_NOTIFIED",
    StatsUpdating => "STATS_UPDATING",
    Completed => "COMPLETED",
});

impl ProcessingStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }

    /// Statuses where the engine hands work off to the event channel and waits for a completion.
    pub fn is_wait_state(&self) -> bool {
        matches!(self, Self::AssigningDuty | Self::StatsUpdating)
    }

    pub fn can_move_to(&self, next: ProcessingStatus) -> bool {
        next > *self
    }
}

//--------------------------------------    Participants       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TeamOutcome {
    Won,
    Lost,
    Tied,
}

wire_names!(TeamOutcome, "team outcome", {
    Won => "WON",
    Lost => "LOST",
    Tied => "TIED",
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub level: Option<f64>,
    /// `None` when the platform does not say.
    pub paid: Option<bool>,
}

impl Player {
    pub fn new<S: Into<String>>(id: S, name: S) -> Self {
        Self { id: id.into(), name: name.into(), level: None, paid: None }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub team_id: String,
    pub players: Vec<Player>,
    pub outcome: Option<TeamOutcome>,
}

/// One set of the match. `scores` maps team id to the number of games that team won in the set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetResult {
    pub name: String,
    pub scores: BTreeMap<String, i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DutyAssignment {
    pub player_id: String,
    pub player_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "result", content = "duty", rename_all = "snake_case")]
pub enum DutyAssignmentResult {
    /// A player was picked and their duty count incremented.
    Assigned(DutyAssignment),
    /// The match already had a duty. Nothing was changed.
    AlreadyAssigned(DutyAssignment),
    /// None of the candidates are in the roster, or no candidates were given.
    NoCandidates,
}

impl DutyAssignmentResult {
    pub fn assignment(&self) -> Option<&DutyAssignment> {
        match self {
            Self::Assigned(d) | Self::AlreadyAssigned(d) => Some(d),
            Self::NoCandidates => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VenueInfo {
    pub resource_name: Option<String>,
    pub price: Option<String>,
    pub access_code: Option<String>,
    pub tenant_id: Option<String>,
    pub tenant_name: Option<String>,
}

//--------------------------------------        Match          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub match_id: MatchId,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub owner_id: Option<String>,
    pub owner_name: Option<String>,
    pub teams: Vec<Team>,
    pub results: Vec<SetResult>,
    pub game_status: GameStatus,
    pub results_status: ResultsStatus,
    pub processing_status: ProcessingStatus,
    pub duty: Option<DutyAssignment>,
    pub venue: VenueInfo,
}

impl Match {
    /// A fresh, unplayed match with no participants. Mostly useful as a starting point for builders and tests.
    pub fn new<I: Into<MatchId>>(match_id: I, start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Self {
        Self {
            match_id: match_id.into(),
            start_date,
            end_date,
            created_at: Utc::now(),
            owner_id: None,
            owner_name: None,
            teams: Vec::new(),
            results: Vec::new(),
            game_status: GameStatus::Pending,
            results_status: ResultsStatus::Pending,
            processing_status: ProcessingStatus::New,
            duty: None,
            venue: VenueInfo::default(),
        }
    }

    pub fn with_status(mut self, status: ProcessingStatus) -> Self {
        self.processing_status = status;
        self
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.teams.iter().flat_map(|t| t.players.iter())
    }

    pub fn player_ids(&self) -> Vec<String> {
        self.players().map(|p| p.id.clone()).collect()
    }

    pub fn is_played(&self) -> bool {
        self.game_status == GameStatus::Played
    }

    pub fn is_result_confirmed(&self) -> bool {
        self.is_played() && self.results_status == ResultsStatus::Confirmed
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub owner_id: Option<String>,
}

//--------------------------------------       Roster          ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct RosterMember {
    pub player_id: String,
    pub name: String,
    pub level: Option<f64>,
    pub duty_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, FromRow, Serialize, Deserialize)]
pub struct PlayerStats {
    pub player_id: String,
    pub name: String,
    pub matches_played: i64,
    pub matches_won: i64,
    pub matches_lost: i64,
    pub sets_won: i64,
    pub sets_lost: i64,
    pub games_won: i64,
    pub games_lost: i64,
}
