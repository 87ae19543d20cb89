//! Match Tracker Engine
//!
//! The engine tracks club matches from an external booking platform and drives each of them through a fixed
//! lifecycle: assign a duty, announce the booking, announce the result and update player statistics.
//!
//! The library is divided into these sections:
//! 1. The collaborator traits ([`mod@traits`]): the match store, the booking platform, the chat notifier and the event
//!    publisher. The engine only talks to the outside world through these.
//! 2. A SQLite implementation of the match store ([`SqliteDatabase`]).
//! 3. The engine API: the [`CandidateFilter`] that decides which matches belong to the club, the [`IngestionApi`] that
//!    feeds them into the store, and the [`ProcessingEngine`] state machine.
//! 4. A simple in-process event channel ([`mod@events`]). The processing engine publishes work to it, and hooks
//!    registered by the server perform the work and report back to the engine.
pub mod db_types;
pub mod events;
pub mod metrics;
mod mte_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::{SqliteDatabase, SqliteDatabaseError};
pub use mte_api::{
    candidate_filter::{prefilter, CandidateFilter, ClubMatchPredicate, FilterConfig},
    errors::EngineError,
    ingestion_api::{IngestionApi, IngestionReport},
    processing_engine::{
        Completion,
        DeliveryReport,
        EngineOptions,
        MatchOutcome,
        ProcessingEngine,
        ProcessingFailure,
        ProcessingReport,
    },
    transitions::{evaluate, simulated_completion, Transition},
};

pub mod constants {
    pub use crate::mte_api::{
        candidate_filter::{DEFAULT_FULL_MATCH_SIZE, DEFAULT_MAX_CONCURRENT_FETCHES, DEFAULT_MIN_KNOWN_MEMBERS},
        processing_engine::{DEFAULT_REPUBLISH_AFTER_MINS, DEFAULT_RESULT_WINDOW_HOURS},
    };
}
