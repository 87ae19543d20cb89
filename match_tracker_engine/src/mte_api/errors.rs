use thiserror::Error;

use crate::{
    db_types::{MatchId, ProcessingStatus},
    events::{CodecError, EventKind},
    traits::{BookingPlatformError, MatchStoreError, NotifierError, PublishError},
};

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("Store error: {0}")]
    Store(#[from] MatchStoreError),
    #[error("Booking platform error: {0}")]
    Platform(#[from] BookingPlatformError),
    #[error("Notification failed: {0}")]
    Notification(#[from] NotifierError),
    #[error("{0}")]
    Codec(#[from] CodecError),
    #[error("Could not publish {kind} for match {match_id} ({status}): {source}")]
    Publish { match_id: MatchId, status: ProcessingStatus, kind: EventKind, source: PublishError },
    #[error("Could not add the players of match {match_id} to the roster: {source}")]
    RosterUpdate { match_id: MatchId, source: MatchStoreError },
    #[error("Match {0} does not exist")]
    MatchNotFound(MatchId),
}

impl EngineError {
    /// True for errors caused by the caller's input rather than by the engine or its collaborators.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::Codec(CodecError::Decode(_)))
    }
}
