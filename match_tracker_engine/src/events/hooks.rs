use std::{future::Future, pin::Pin, sync::Arc};

use log::*;

use crate::{
    db_types::Match,
    events::{encode_match, EventHandler, EventKind, EventProducer, Handler, MatchEvent},
    traits::{EventPublisher, PublishError},
};

/// Producers for each event kind. A kind with no producers cannot be published.
#[derive(Default, Clone)]
pub struct EventProducers {
    pub begin_duty_assignment: Vec<EventProducer<MatchEvent>>,
    pub notify_booking: Vec<EventProducer<MatchEvent>>,
    pub notify_result: Vec<EventProducer<MatchEvent>>,
    pub update_player_stats: Vec<EventProducer<MatchEvent>>,
}

impl EventProducers {
    fn for_kind(&self, kind: EventKind) -> &[EventProducer<MatchEvent>] {
        match kind {
            EventKind::BeginDutyAssignment => &self.begin_duty_assignment,
            EventKind::NotifyBooking => &self.notify_booking,
            EventKind::NotifyResult => &self.notify_result,
            EventKind::UpdatePlayerStats => &self.update_player_stats,
        }
    }
}

impl EventPublisher for EventProducers {
    async fn publish(&self, kind: EventKind, m: &Match) -> Result<(), PublishError> {
        let producers = self.for_kind(kind);
        if producers.is_empty() {
            return Err(PublishError::NoSubscriber(kind));
        }
        let payload = encode_match(m)?;
        for producer in producers {
            producer.publish_event(MatchEvent::new(kind, payload.clone())).await.map_err(|_| {
                warn!("📬️ Could not publish {kind} for match {}. The channel is closed.", m.match_id);
                PublishError::ChannelClosed(kind)
            })?;
        }
        trace!("📬️ Published {kind} for match {}", m.match_id);
        Ok(())
    }
}

/// One channel per event kind.
///
/// Create the handlers first, hand [`EventHandlers::producers`] to whatever publishes events, then attach the hooks
/// with [`EventHandlers::start_handlers`].
pub struct EventHandlers {
    pub begin_duty_assignment: EventHandler<MatchEvent>,
    pub notify_booking: EventHandler<MatchEvent>,
    pub notify_result: EventHandler<MatchEvent>,
    pub update_player_stats: EventHandler<MatchEvent>,
}

impl EventHandlers {
    pub fn new(buffer_size: usize) -> Self {
        Self {
            begin_duty_assignment: EventHandler::new(buffer_size),
            notify_booking: EventHandler::new(buffer_size),
            notify_result: EventHandler::new(buffer_size),
            update_player_stats: EventHandler::new(buffer_size),
        }
    }

    pub fn producers(&self) -> EventProducers {
        EventProducers {
            begin_duty_assignment: vec![self.begin_duty_assignment.subscribe()],
            notify_booking: vec![self.notify_booking.subscribe()],
            notify_result: vec![self.notify_result.subscribe()],
            update_player_stats: vec![self.update_player_stats.subscribe()],
        }
    }

    /// Spawns a handler task for every kind that has a hook. Channels without a hook are closed, so publishing to them
    /// fails.
    pub fn start_handlers(self, hooks: EventHooks) {
        let EventHooks { on_begin_duty_assignment, on_notify_booking, on_notify_result, on_update_player_stats } =
            hooks;
        Self::start(EventKind::BeginDutyAssignment, self.begin_duty_assignment, on_begin_duty_assignment);
        Self::start(EventKind::NotifyBooking, self.notify_booking, on_notify_booking);
        Self::start(EventKind::NotifyResult, self.notify_result, on_notify_result);
        Self::start(EventKind::UpdatePlayerStats, self.update_player_stats, on_update_player_stats);
    }

    fn start(kind: EventKind, handler: EventHandler<MatchEvent>, hook: Option<Handler<MatchEvent>>) {
        match hook {
            Some(hook) => {
                info!("📬️ Starting {kind} event handler");
                tokio::spawn(async move {
                    handler.start_handler(hook).await;
                });
            },
            None => {
                warn!("📬️ No hook registered for {kind} events. Publishing them will fail.");
                drop(handler);
            },
        }
    }
}

#[derive(Default, Clone)]
pub struct EventHooks {
    pub on_begin_duty_assignment: Option<Handler<MatchEvent>>,
    pub on_notify_booking: Option<Handler<MatchEvent>>,
    pub on_notify_result: Option<Handler<MatchEvent>>,
    pub on_update_player_stats: Option<Handler<MatchEvent>>,
}

impl EventHooks {
    pub fn on_begin_duty_assignment<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_begin_duty_assignment = Some(Arc::new(f));
        self
    }

    pub fn on_notify_booking<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notify_booking = Some(Arc::new(f));
        self
    }

    pub fn on_notify_result<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_notify_result = Some(Arc::new(f));
        self
    }

    pub fn on_update_player_stats<F>(&mut self, f: F) -> &mut Self
    where F: (Fn(MatchEvent) -> Pin<Box<dyn Future<Output = ()> + Send>>) + Send + Sync + 'static {
        self.on_update_player_stats = Some(Arc::new(f));
        self
    }
}
