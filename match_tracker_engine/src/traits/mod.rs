//! The seams between the processing engine and the outside world.
//!
//! Backends implement these traits so that the engine can be driven by any store, booking platform, chat service or
//! message broker.
mod booking_platform;
mod event_publisher;
mod match_store;
mod notifier;

pub use booking_platform::{BookingPlatform, BookingPlatformError};
pub use event_publisher::{EventPublisher, PublishError};
pub use match_store::{MatchStore, MatchStoreError};
pub use notifier::{NotificationReceipt, Notifier, NotifierError};
