use thiserror::Error;

use crate::db_types::{Match, MatchId, MatchSummary};

#[derive(Debug, Clone, Error)]
pub enum BookingPlatformError {
    #[error("The booking platform could not be reached: {0}")]
    Upstream(String),
    #[error("Match {0} is not known to the booking platform")]
    MatchNotFound(MatchId),
    #[error("The booking platform returned data that could not be used: {0}")]
    InvalidData(String),
}

/// Read-only access to the external booking platform.
#[allow(async_fn_in_trait)]
pub trait BookingPlatform {
    /// Lists the matches that are currently of interest (recent and upcoming).
    async fn fetch_match_summaries(&self) -> Result<Vec<MatchSummary>, BookingPlatformError>;

    /// Fetches the full record of a single match. The returned match has the processing status `NEW`.
    async fn fetch_match(&self, match_id: &MatchId) -> Result<Match, BookingPlatformError>;
}
