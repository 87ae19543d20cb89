mod channel;
mod codec;
mod event_types;
mod hooks;

pub use channel::{EventHandler, EventProducer, Handler};
pub use codec::{decode_match, encode_match, CodecError};
pub use event_types::{EventKind, MatchEvent, UnknownEventKind};
pub use hooks::{EventHandlers, EventHooks, EventProducers};
