//! The processing engine drives matches through their lifecycle.
//!
//! Each call to [`ProcessingEngine::process_match`] applies the transition rules in [`super::transitions`] until the
//! match stops moving. Side effects (duty assignment, chat notices, statistics) are never performed by the drive loop.
//! Instead, an event is published and the match waits for the matching completion call, e.g.
//! [`ProcessingEngine::complete_duty_assignment`], which performs the work, moves the match one step and drives it
//! again.
//!
//! Every status write is a compare-and-swap against the status the engine last saw. If another pass got there first,
//! this pass stops for that match. If the write fails for any other reason, the failure is logged and the pass carries
//! on with the new status in memory; the next cycle picks the match up from the stored status.
//!
//! Events are published before the status write that follows them, so a completion may find the match one status
//! behind the one it waits in. Completions accept that earlier status. Notices are sent at most once per match, and a
//! result notice that is already out is not published again until it becomes overdue.
use std::{fmt::Debug, sync::Arc};

use chrono::{Duration, Utc};
use futures_util::future::join_all;
use log::*;
use serde::Serialize;

use super::{
    errors::EngineError,
    transitions::{evaluate, simulated_completion, Transition},
};
use crate::{
    db_types::{DutyAssignmentResult, Match, MatchId, ProcessingStatus, ProcessingStatus::*},
    events::{decode_match, EventKind},
    metrics::EngineMetrics,
    traits::{EventPublisher, MatchStore, NotificationReceipt, Notifier},
};

pub const DEFAULT_RESULT_WINDOW_HOURS: i64 = 24;
pub const DEFAULT_REPUBLISH_AFTER_MINS: i64 = 60;

#[derive(Debug, Clone, Copy)]
pub struct EngineOptions {
    /// Run the transitions in memory only. Nothing is published or persisted, and wait states are treated as if their
    /// completion had arrived, so that a single pass previews the whole chain.
    pub dry_run: bool,
    /// How long after a match ends its result is still announced in the chat.
    pub result_window: Duration,
    /// A result notice that has been out this long without a completion is published again.
    pub republish_after: Duration,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            result_window: Duration::hours(DEFAULT_RESULT_WINDOW_HOURS),
            republish_after: Duration::minutes(DEFAULT_REPUBLISH_AFTER_MINS),
        }
    }
}

/// The path one match took through a single drive loop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MatchOutcome {
    pub match_id: MatchId,
    /// Every status the match held during the pass, starting with the one it came in with.
    pub visited: Vec<ProcessingStatus>,
    pub published: Vec<EventKind>,
    pub final_status: ProcessingStatus,
    /// The pass stopped because another pass had already moved the match.
    pub conflict: bool,
}

impl MatchOutcome {
    fn new(m: &Match) -> Self {
        Self {
            match_id: m.match_id.clone(),
            visited: vec![m.processing_status],
            published: Vec::new(),
            final_status: m.processing_status,
            conflict: false,
        }
    }

    pub fn advanced(&self) -> bool {
        self.visited.len() > 1
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessingFailure {
    pub match_id: MatchId,
    pub status: ProcessingStatus,
    pub error: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProcessingReport {
    pub processed: usize,
    pub advanced: usize,
    pub events_published: usize,
    pub conflicts: usize,
    pub outcomes: Vec<MatchOutcome>,
    pub failures: Vec<ProcessingFailure>,
}

impl ProcessingReport {
    fn add(&mut self, outcome: MatchOutcome) {
        self.processed += 1;
        self.advanced += usize::from(outcome.advanced());
        self.events_published += outcome.published.len();
        self.conflicts += usize::from(outcome.conflict);
        self.outcomes.push(outcome);
    }

    fn add_failure(&mut self, failure: ProcessingFailure) {
        self.processed += 1;
        self.failures.push(failure);
    }
}

/// The result of a completion call.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The side effect was performed. Carries the match as it stands afterwards.
    Applied(Match),
    /// The match was not in a status this completion applies to (a duplicate or late delivery). Nothing was done.
    Stale { match_id: MatchId, status: ProcessingStatus },
}

/// What happened to an inbound event delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeliveryReport {
    pub kind: EventKind,
    pub match_id: MatchId,
    pub applied: bool,
    pub status: ProcessingStatus,
    pub published: Vec<EventKind>,
    /// Set when the completion was applied but driving the match afterwards failed.
    pub error: Option<String>,
}

pub struct ProcessingEngine<B, P, N> {
    store: B,
    publisher: P,
    notifier: N,
    options: EngineOptions,
    metrics: Arc<EngineMetrics>,
}

impl<B, P, N> Debug for ProcessingEngine<B, P, N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ProcessingEngine (dry_run: {})", self.options.dry_run)
    }
}

impl<B, P, N> ProcessingEngine<B, P, N> {
    pub fn new(store: B, publisher: P, notifier: N, options: EngineOptions, metrics: Arc<EngineMetrics>) -> Self {
        Self { store, publisher, notifier, options, metrics }
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    pub fn metrics(&self) -> &EngineMetrics {
        &self.metrics
    }

    pub fn store(&self) -> &B {
        &self.store
    }
}

impl<B, P, N> ProcessingEngine<B, P, N>
where
    B: MatchStore,
    P: EventPublisher,
    N: Notifier,
{
    /// Drives every match that is not yet completed, concurrently.
    pub async fn process_pending(&self) -> Result<ProcessingReport, EngineError> {
        let pending = self.store.fetch_matches_pending_processing().await?;
        debug!("🔄️ {} matches are pending processing", pending.len());
        Ok(self.process_batch(pending).await)
    }

    pub async fn process_batch(&self, batch: Vec<Match>) -> ProcessingReport {
        let passes = batch.into_iter().map(|m| {
            let match_id = m.match_id.clone();
            let status = m.processing_status;
            async move { (match_id, status, self.process_match(m).await) }
        });
        let mut report = ProcessingReport::default();
        for (match_id, status, result) in join_all(passes).await {
            match result {
                Ok(outcome) => report.add(outcome),
                Err(e) => report.add_failure(ProcessingFailure { match_id, status, error: e.to_string() }),
            }
        }
        info!(
            "🔄️ Processed {} matches. {} advanced, {} events published, {} conflicts, {} failures",
            report.processed,
            report.advanced,
            report.events_published,
            report.conflicts,
            report.failures.len()
        );
        report
    }

    /// Applies transitions to `m` until it reaches a wait state, a fixed point or the terminal state.
    ///
    /// Fails if the roster could not be updated for a new match, or an event could not be published. In both cases the
    /// match keeps the status it had reached and is retried on the next pass.
    pub async fn process_match(&self, m: Match) -> Result<MatchOutcome, EngineError> {
        EngineMetrics::incr(&self.metrics.matches_processed);
        let mut current = m;
        let mut outcome = MatchOutcome::new(&current);
        loop {
            let status = current.processing_status;
            if status == New {
                self.upsert_roster(&current).await?;
            }
            let next = match evaluate(&current, Utc::now(), self.options.result_window) {
                Transition::Advance(next) => Some(next),
                Transition::Publish { event, next } => {
                    let awaited = next.is_none();
                    // An event the match waits on is claimed first, so that a second pass does not publish it again
                    if awaited && !self.claim_event(event, &current).await? {
                        trace!("🔄️ {event} for match {} is already out. Waiting for its completion.", current.match_id);
                        None
                    } else {
                        if let Err(e) = self.publish(event, &current).await {
                            if awaited {
                                self.release_event(event, &current).await;
                            }
                            return Err(e);
                        }
                        outcome.published.push(event);
                        next.or_else(|| self.simulate(status))
                    }
                },
                Transition::Wait | Transition::Terminal => self.simulate(status),
            };
            let Some(next) = next else {
                break;
            };
            if !status.can_move_to(next) {
                error!("🔄️ Refusing to move match {} backwards from {status} to {next}", current.match_id);
                break;
            }
            if !self.persist_status(&current, next).await {
                outcome.conflict = true;
                break;
            }
            trace!("🔄️ Match {} moved from {status} to {next}", current.match_id);
            EngineMetrics::incr(&self.metrics.transitions);
            current = current.with_status(next);
            outcome.visited.push(next);
        }
        outcome.final_status = current.processing_status;
        debug!(
            "🔄️ Match {} processed. {} -> {}. Published: {:?}",
            outcome.match_id, outcome.visited[0], outcome.final_status, outcome.published
        );
        Ok(outcome)
    }

    //-----------------------------------------   Completions   --------------------------------------------------------

    /// Decodes an event payload, applies the completion for `kind` and drives the match again.
    pub async fn handle_delivery(&self, kind: EventKind, payload: &[u8]) -> Result<DeliveryReport, EngineError> {
        let m = decode_match(payload)?;
        trace!("🔄️ Received {kind} completion for match {}", m.match_id);
        let completion = self.complete(kind, &m).await?;
        EngineMetrics::incr(&self.metrics.completions);
        let report = match completion {
            Completion::Applied(updated) => {
                let match_id = updated.match_id.clone();
                let status = updated.processing_status;
                match self.process_match(updated).await {
                    Ok(outcome) => DeliveryReport {
                        kind,
                        match_id,
                        applied: true,
                        status: outcome.final_status,
                        published: outcome.published,
                        error: None,
                    },
                    Err(e) => {
                        warn!("🔄️ {kind} completed for match {match_id} ({status}), but driving it further failed. {e}");
                        let error = Some(e.to_string());
                        DeliveryReport { kind, match_id, applied: true, status, published: vec![], error }
                    },
                }
            },
            Completion::Stale { match_id, status } => {
                EngineMetrics::incr(&self.metrics.stale_completions);
                DeliveryReport { kind, match_id, applied: false, status, published: vec![], error: None }
            },
        };
        Ok(report)
    }

    pub async fn complete(&self, kind: EventKind, m: &Match) -> Result<Completion, EngineError> {
        match kind {
            EventKind::BeginDutyAssignment => self.complete_duty_assignment(m).await,
            EventKind::NotifyBooking => self.complete_booking_notification(m).await,
            EventKind::NotifyResult => self.complete_result_notification(m).await,
            EventKind::UpdatePlayerStats => self.complete_stats_update(m).await,
        }
    }

    /// Assigns the duty for the match and moves it to `DUTY_ASSIGNED`.
    ///
    /// The event is published before the drive loop writes `ASSIGNING_DUTY`, so the match may still be `NEW` here. A
    /// match with no roster members among its players still moves on, just without a duty.
    pub async fn complete_duty_assignment(&self, m: &Match) -> Result<Completion, EngineError> {
        let mut current = self.reload(&m.match_id).await?;
        if !self.awaits_duty(&current) {
            return Ok(self.stale(EventKind::BeginDutyAssignment, &current));
        }
        if self.options.dry_run {
            debug!("🔄️ [dry run] Skipping duty assignment for match {}", current.match_id);
        } else {
            let result = self.store.assign_duty(&current.match_id, &current.player_ids()).await?;
            match &result {
                DutyAssignmentResult::Assigned(duty) => {
                    EngineMetrics::incr(&self.metrics.duties_assigned);
                    info!("🔄️ {} ({}) is on duty for match {}", duty.player_name, duty.player_id, current.match_id);
                },
                DutyAssignmentResult::AlreadyAssigned(duty) => {
                    debug!("🔄️ Match {} already had {} on duty", current.match_id, duty.player_id);
                },
                DutyAssignmentResult::NoCandidates => {
                    warn!("🔄️ No roster member is playing in match {}. Moving on without a duty.", current.match_id);
                },
            }
            current.duty = result.assignment().cloned();
        }
        self.settle(EventKind::BeginDutyAssignment, current, &[New, AssigningDuty], DutyAssigned).await
    }

    /// Sends the booking notice, once per match however often the event is delivered. The match moves from
    /// `DUTY_ASSIGNED` to `BOOKING_NOTIFIED` if the drive loop has not already moved it.
    pub async fn complete_booking_notification(&self, m: &Match) -> Result<Completion, EngineError> {
        let current = self.reload(&m.match_id).await?;
        if !matches!(current.processing_status, DutyAssigned | BookingNotified) {
            return Ok(self.stale(EventKind::NotifyBooking, &current));
        }
        if !self.claim_completion(EventKind::NotifyBooking, &current).await? {
            return Ok(self.stale(EventKind::NotifyBooking, &current));
        }
        self.notify(EventKind::NotifyBooking, &current).await?;
        self.settle(EventKind::NotifyBooking, current, &[DutyAssigned], BookingNotified).await
    }

    /// Sends the result notice and moves the match from `RESULT_AVAILABLE` to `RESULT_NOTIFIED`.
    ///
    /// If the notice cannot be sent the event is released, and the next pass publishes it again.
    pub async fn complete_result_notification(&self, m: &Match) -> Result<Completion, EngineError> {
        let current = self.reload(&m.match_id).await?;
        if current.processing_status != ResultAvailable {
            return Ok(self.stale(EventKind::NotifyResult, &current));
        }
        if !self.claim_completion(EventKind::NotifyResult, &current).await? {
            return Ok(self.stale(EventKind::NotifyResult, &current));
        }
        self.notify(EventKind::NotifyResult, &current).await?;
        self.settle(EventKind::NotifyResult, current, &[ResultAvailable], ResultNotified).await
    }

    /// Records the match in the player statistics and moves it to `COMPLETED`.
    ///
    /// Like the duty completion, this can arrive before the drive loop has written `STATS_UPDATING`.
    pub async fn complete_stats_update(&self, m: &Match) -> Result<Completion, EngineError> {
        let current = self.reload(&m.match_id).await?;
        if !matches!(current.processing_status, ResultNotified | StatsUpdating) {
            return Ok(self.stale(EventKind::UpdatePlayerStats, &current));
        }
        if self.options.dry_run {
            debug!("🔄️ [dry run] Skipping stats update for match {}", current.match_id);
        } else if self.store.update_player_stats(&current).await? {
            EngineMetrics::incr(&self.metrics.stats_recorded);
            info!("🔄️ Player stats updated for match {}", current.match_id);
        }
        self.settle(EventKind::UpdatePlayerStats, current, &[ResultNotified, StatsUpdating], Completed).await
    }

    //-----------------------------------------    Internals    --------------------------------------------------------

    fn simulate(&self, status: ProcessingStatus) -> Option<ProcessingStatus> {
        if self.options.dry_run {
            simulated_completion(status)
        } else {
            None
        }
    }

    async fn upsert_roster(&self, m: &Match) -> Result<(), EngineError> {
        if self.options.dry_run {
            return Ok(());
        }
        let players = m.players().cloned().collect::<Vec<_>>();
        self.store.upsert_roster_members(&players).await.map_err(|source| {
            error!("🔄️ Could not add players of match {} ({}) to the roster. {source}", m.match_id, m.processing_status);
            EngineError::RosterUpdate { match_id: m.match_id.clone(), source }
        })?;
        trace!("🔄️ {} players of match {} added to the roster", players.len(), m.match_id);
        Ok(())
    }

    async fn publish(&self, event: EventKind, m: &Match) -> Result<(), EngineError> {
        if self.options.dry_run {
            debug!("🔄️ [dry run] Would publish {event} for match {}", m.match_id);
            return Ok(());
        }
        match self.publisher.publish(event, m).await {
            Ok(()) => {
                EngineMetrics::incr(&self.metrics.events_published);
                debug!("🔄️ Published {event} for match {}", m.match_id);
                Ok(())
            },
            Err(source) => {
                EngineMetrics::incr(&self.metrics.publish_failures);
                error!("🔄️ Could not publish {event} for match {} ({}). {source}", m.match_id, m.processing_status);
                Err(EngineError::Publish {
                    match_id: m.match_id.clone(),
                    status: m.processing_status,
                    kind: event,
                    source,
                })
            },
        }
    }

    /// Writes the status change. Returns false if the pass for this match must stop.
    async fn persist_status(&self, m: &Match, next: ProcessingStatus) -> bool {
        if self.options.dry_run {
            return true;
        }
        match self.store.update_processing_status(&m.match_id, m.processing_status, next).await {
            Ok(()) => true,
            Err(e) if e.is_conflict() => {
                EngineMetrics::incr(&self.metrics.status_conflicts);
                warn!("🔄️ Match {} ({}) was moved by another pass. Stopping. {e}", m.match_id, m.processing_status);
                false
            },
            Err(e) => {
                EngineMetrics::incr(&self.metrics.persist_failures);
                error!(
                    "🔄️ Could not save status {next} for match {} ({}). Carrying on in memory. {e}",
                    m.match_id, m.processing_status
                );
                true
            },
        }
    }

    /// Moves a match whose completion has been performed to `next`.
    ///
    /// A match that is already at or past `next` is left where it is. If another writer moves the match during the
    /// call, it is reloaded and the move retried from the stored status, unless that writer has taken it to `next` or
    /// beyond, in which case that writer drives it on. Statuses only move forward, so the loop ends.
    async fn settle(
        &self,
        kind: EventKind,
        mut current: Match,
        from: &[ProcessingStatus],
        next: ProcessingStatus,
    ) -> Result<Completion, EngineError> {
        if current.processing_status >= next {
            return Ok(Completion::Applied(current));
        }
        loop {
            let status = current.processing_status;
            if !from.contains(&status) {
                return Ok(self.stale(kind, &current));
            }
            if self.persist_status(&current, next).await {
                return Ok(Completion::Applied(current.with_status(next)));
            }
            trace!("🔄️ Match {} moved while completing {kind}. Retrying from the stored status.", current.match_id);
            current = self.reload(&current.match_id).await?;
        }
    }

    /// The duty completion applies to matches waiting on it, and to new matches the drive loop is about to move there.
    fn awaits_duty(&self, m: &Match) -> bool {
        match m.processing_status {
            AssigningDuty => true,
            New => matches!(
                evaluate(m, Utc::now(), self.options.result_window),
                Transition::Publish { event: EventKind::BeginDutyAssignment, .. }
            ),
            _ => false,
        }
    }

    async fn claim_event(&self, event: EventKind, m: &Match) -> Result<bool, EngineError> {
        if self.options.dry_run {
            return Ok(true);
        }
        let overdue_before = Utc::now() - self.options.republish_after;
        Ok(self.store.claim_event(&m.match_id, event, overdue_before).await?)
    }

    async fn claim_completion(&self, event: EventKind, m: &Match) -> Result<bool, EngineError> {
        if self.options.dry_run {
            return Ok(true);
        }
        let claimed = self.store.complete_event(&m.match_id, event).await?;
        if !claimed {
            EngineMetrics::incr(&self.metrics.duplicate_deliveries);
            debug!("🔄️ {event} for match {} ({}) was already handled", m.match_id, m.processing_status);
        }
        Ok(claimed)
    }

    async fn release_event(&self, event: EventKind, m: &Match) {
        if self.options.dry_run {
            return;
        }
        if let Err(e) = self.store.release_event(&m.match_id, event).await {
            error!("🔄️ Could not release {event} for match {} ({}). {e}", m.match_id, m.processing_status);
        }
    }

    /// Sends the notice for `event`. A failed notice releases the event, so that it can be delivered again.
    async fn notify(&self, event: EventKind, m: &Match) -> Result<(), EngineError> {
        let sent = match event {
            EventKind::NotifyResult => self.notifier.send_result_notification(m, self.options.dry_run).await,
            _ => self.notifier.send_booking_notification(m, self.options.dry_run).await,
        };
        match sent {
            Ok(receipt) => {
                self.log_receipt(event, m, &receipt);
                Ok(())
            },
            Err(e) => {
                error!("🔄️ Could not send the {event} notice for match {} ({}). {e}", m.match_id, m.processing_status);
                self.release_event(event, m).await;
                Err(e.into())
            },
        }
    }

    async fn reload(&self, match_id: &MatchId) -> Result<Match, EngineError> {
        self.store.fetch_match(match_id).await?.ok_or_else(|| EngineError::MatchNotFound(match_id.clone()))
    }

    fn stale(&self, kind: EventKind, current: &Match) -> Completion {
        debug!(
            "🔄️ Ignoring {kind} completion for match {}. It is already {}",
            current.match_id, current.processing_status
        );
        Completion::Stale { match_id: current.match_id.clone(), status: current.processing_status }
    }

    fn log_receipt(&self, kind: EventKind, m: &Match, receipt: &NotificationReceipt) {
        match receipt {
            NotificationReceipt::Delivered { channel, message_id } => {
                EngineMetrics::incr(&self.metrics.notifications_sent);
                info!("🔄️ {kind} notice for match {} delivered to {channel} ({message_id:?})", m.match_id);
            },
            NotificationReceipt::DryRun { preview } => {
                info!("🔄️ [dry run] {kind} notice for match {}:\n{preview}", m.match_id);
            },
            NotificationReceipt::Suppressed { reason } => {
                debug!("🔄️ {kind} notice for match {} suppressed. {reason}", m.match_id);
            },
        }
    }
}
