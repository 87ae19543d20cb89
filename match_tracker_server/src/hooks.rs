//! Connects the engine's event channels back to its own completion entry points.
//!
//! Every event is handled on its own task. The hook hands the raw payload to [`ProcessingEngine::handle_delivery`],
//! which performs the work for that event kind and drives the match onwards.
//!
//! [`ProcessingEngine::handle_delivery`]: match_tracker_engine::ProcessingEngine::handle_delivery
use std::sync::Arc;

use futures::future::BoxFuture;
use log::*;
use match_tracker_engine::events::{EventHooks, EventKind, MatchEvent};

use crate::server::TrackerEngine;

/// Builds hooks that deliver every event kind to `engine`.
pub fn completion_hooks(engine: Arc<TrackerEngine>) -> EventHooks {
    let mut hooks = EventHooks::default();
    let e = Arc::clone(&engine);
    hooks.on_begin_duty_assignment(move |ev| deliver(Arc::clone(&e), ev));
    let e = Arc::clone(&engine);
    hooks.on_notify_booking(move |ev| deliver(Arc::clone(&e), ev));
    let e = Arc::clone(&engine);
    hooks.on_notify_result(move |ev| deliver(Arc::clone(&e), ev));
    hooks.on_update_player_stats(move |ev| deliver(Arc::clone(&engine), ev));
    hooks
}

fn deliver(engine: Arc<TrackerEngine>, ev: MatchEvent) -> BoxFuture<'static, ()> {
    Box::pin(async move {
        let kind: EventKind = ev.kind;
        match engine.handle_delivery(kind, &ev.payload).await {
            Ok(report) if report.applied => {
                debug!("📬️ {kind} completed for match {}. Now at {}", report.match_id, report.status);
                if let Some(e) = report.error {
                    warn!("📬️ Match {} ({}) could not be driven after {kind}. {e}", report.match_id, report.status);
                }
            },
            Ok(report) => {
                debug!("📬️ Ignored a stale {kind} event for match {} ({})", report.match_id, report.status);
            },
            Err(e) => error!("📬️ Could not handle {kind} event. {e}"),
        }
    })
}
