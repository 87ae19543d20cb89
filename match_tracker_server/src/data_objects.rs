use std::fmt::Display;

use match_tracker_engine::{db_types::Player, IngestionReport, ProcessingReport};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }
}

/// A club member, as submitted to `POST /roster`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: String,
    pub name: String,
    #[serde(default)]
    pub level: Option<f64>,
}

impl From<RosterEntry> for Player {
    fn from(entry: RosterEntry) -> Self {
        Player { id: entry.player_id, name: entry.name, level: entry.level, paid: None }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct IngestResponse {
    pub ingestion: IngestionReport,
    pub processing: ProcessingReport,
}
