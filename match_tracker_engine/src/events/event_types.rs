use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    db_types::Match,
    events::{decode_match, CodecError},
};

/// The kinds of work the processing engine hands off to the event channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EventKind {
    BeginDutyAssignment,
    NotifyBooking,
    NotifyResult,
    UpdatePlayerStats,
}

impl EventKind {
    pub const ALL: [EventKind; 4] = [
        EventKind::BeginDutyAssignment,
        EventKind::NotifyBooking,
        EventKind::NotifyResult,
        EventKind::UpdatePlayerStats,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventKind::BeginDutyAssignment => "begin-duty-assignment",
            EventKind::NotifyBooking => "notify-booking",
            EventKind::NotifyResult => "notify-result",
            EventKind::UpdatePlayerStats => "update-player-stats",
        }
    }
}

impl Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Error)]
#[error("Unknown event kind: {0}")]
pub struct UnknownEventKind(pub String);

impl FromStr for EventKind {
    type Err = UnknownEventKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EventKind::ALL.into_iter().find(|k| k.as_str() == s).ok_or_else(|| UnknownEventKind(s.to_string()))
    }
}

/// An event as it travels through the channel: the kind plus the encoded match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchEvent {
    pub kind: EventKind,
    pub payload: Vec<u8>,
}

impl MatchEvent {
    pub fn new(kind: EventKind, payload: Vec<u8>) -> Self {
        Self { kind, payload }
    }

    pub fn decode(&self) -> Result<Match, CodecError> {
        decode_match(&self.payload)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn kind_names() {
        for kind in EventKind::ALL {
            assert_eq!(kind.to_string().parse::<EventKind>().unwrap(), kind);
        }
        assert_eq!(EventKind::UpdatePlayerStats.to_string(), "update-player-stats");
        assert!("notify_result".parse::<EventKind>().is_err());
    }
}
