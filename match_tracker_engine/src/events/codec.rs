//! Binary encoding of matches for the event channel.
//!
//! Matches are encoded as MessagePack maps (field names included), so that brokers and consumers built against an
//! older version of [`Match`] can still read the payload.
use thiserror::Error;

use crate::db_types::Match;

#[derive(Debug, Clone, Error)]
pub enum CodecError {
    #[error("Could not encode match {match_id}: {message}")]
    Encode { match_id: String, message: String },
    #[error("Malformed match payload: {0}")]
    Decode(String),
}

pub fn encode_match(m: &Match) -> Result<Vec<u8>, CodecError> {
    rmp_serde::to_vec_named(m)
        .map_err(|e| CodecError::Encode { match_id: m.match_id.to_string(), message: e.to_string() })
}

pub fn decode_match(bytes: &[u8]) -> Result<Match, CodecError> {
    rmp_serde::from_slice(bytes).map_err(|e| CodecError::Decode(e.to_string()))
}
