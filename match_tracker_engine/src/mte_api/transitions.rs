//! The transition rules of the match lifecycle, as a pure function of the match and the clock.
use chrono::{DateTime, Duration, Utc};

use crate::{
    db_types::{GameStatus, Match, ProcessingStatus, ResultsStatus},
    events::EventKind,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// Move to the given status without any side effect.
    Advance(ProcessingStatus),
    /// Publish the event. If `next` is given, move there once the event is out, otherwise stay put until a completion
    /// moves the match along.
    Publish { event: EventKind, next: Option<ProcessingStatus> },
    /// Nothing to do until something external changes.
    Wait,
    Terminal,
}

/// Decides the next step for `m`. `result_window` is how long after the end of a match its result is still worth
/// announcing.
pub fn evaluate(m: &Match, now: DateTime<Utc>, result_window: Duration) -> Transition {
    use ProcessingStatus::*;
    match m.processing_status {
        New => evaluate_new(m),
        AssigningDuty => Transition::Wait,
        DutyAssigned => Transition::Publish { event: EventKind::NotifyBooking, next: Some(BookingNotified) },
        BookingNotified if m.is_result_confirmed() => Transition::Advance(ResultAvailable),
        BookingNotified => Transition::Wait,
        ResultAvailable if now - m.end_date <= result_window => {
            Transition::Publish { event: EventKind::NotifyResult, next: None }
        },
        ResultAvailable => Transition::Advance(ResultNotified),
        ResultNotified => Transition::Publish { event: EventKind::UpdatePlayerStats, next: Some(StatsUpdating) },
        StatsUpdating => Transition::Wait,
        Completed => Transition::Terminal,
    }
}

fn evaluate_new(m: &Match) -> Transition {
    use ProcessingStatus::*;
    match (m.game_status, m.results_status) {
        (GameStatus::Played, ResultsStatus::Confirmed) => Transition::Advance(ResultAvailable),
        (GameStatus::Played, ResultsStatus::Expired) => Transition::Advance(Completed),
        // The booking notice would be pointless for a match that has already been played
        (GameStatus::Played, _) => Transition::Advance(BookingNotified),
        (GameStatus::Canceled, _) => Transition::Advance(Completed),
        _ => Transition::Publish { event: EventKind::BeginDutyAssignment, next: Some(AssigningDuty) },
    }
}

/// The status a completion would move the match to, for statuses that wait on one. Used to preview the whole chain in
/// dry-run mode.
pub fn simulated_completion(status: ProcessingStatus) -> Option<ProcessingStatus> {
    use ProcessingStatus::*;
    match status {
        AssigningDuty => Some(DutyAssigned),
        ResultAvailable => Some(ResultNotified),
        StatsUpdating => Some(Completed),
        _ => None,
    }
}
