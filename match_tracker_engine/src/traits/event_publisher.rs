use thiserror::Error;

use crate::{
    db_types::Match,
    events::{CodecError, EventKind},
};

#[derive(Debug, Clone, Error)]
pub enum PublishError {
    #[error("Nobody is subscribed to {0} events")]
    NoSubscriber(EventKind),
    #[error("The {0} channel is closed")]
    ChannelClosed(EventKind),
    #[error("{0}")]
    Codec(#[from] CodecError),
}

/// The asynchronous channel that carries side-effecting work out of the processing engine.
#[allow(async_fn_in_trait)]
pub trait EventPublisher {
    async fn publish(&self, kind: EventKind, m: &Match) -> Result<(), PublishError>;
}
