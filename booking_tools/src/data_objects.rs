//! Wire format of the booking platform.
//!
//! Statuses are kept as strings here. The platform adds new values from time to time and interpreting them is not
//! this crate's concern.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct MatchSummaryDto {
    pub match_id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MatchDto {
    pub match_id: String,
    #[serde(default)]
    pub owner_id: Option<String>,
    #[serde(default)]
    pub owner_name: Option<String>,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub teams: Vec<TeamDto>,
    #[serde(default)]
    pub results: Vec<SetResultDto>,
    #[serde(default = "unknown_status")]
    pub game_status: String,
    #[serde(default = "unknown_status")]
    pub results_status: String,
    #[serde(default)]
    pub resource_name: Option<String>,
    #[serde(default)]
    pub price: Option<String>,
    #[serde(default)]
    pub access_code: Option<String>,
    #[serde(default)]
    pub tenant: Option<TenantDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TeamDto {
    pub team_id: String,
    #[serde(default)]
    pub players: Vec<PlayerDto>,
    /// "WON", "LOST" or "TIED" once the result is known.
    #[serde(default)]
    pub team_result: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct PlayerDto {
    pub user_id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub level_value: Option<f64>,
    /// "PAID" or "PENDING". Absent for players added by the owner without a booking of their own.
    #[serde(default)]
    pub payment_status: Option<String>,
}

impl PlayerDto {
    pub fn paid(&self) -> Option<bool> {
        self.payment_status.as_deref().map(|s| s.eq_ignore_ascii_case("PAID"))
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct SetResultDto {
    pub name: String,
    #[serde(default)]
    pub scores: Vec<ScoreDto>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ScoreDto {
    pub team_id: String,
    pub score: i32,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct TenantDto {
    pub tenant_id: String,
    #[serde(default)]
    pub tenant_name: String,
}

fn unknown_status() -> String {
    "UNKNOWN".to_string()
}
