use serde::Serialize;
use thiserror::Error;

use crate::db_types::Match;

#[derive(Debug, Clone, Error)]
pub enum NotifierError {
    #[error("Could not deliver notification: {0}")]
    Transport(String),
    #[error("The chat service rejected the notification ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("Could not format notification: {0}")]
    Format(String),
}

/// What happened to an outbound notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum NotificationReceipt {
    Delivered { channel: String, message_id: Option<String> },
    /// Dry-run mode. The message was rendered but not sent.
    DryRun { preview: String },
    /// The notifier decided not to send anything, e.g. because no channel is configured.
    Suppressed { reason: String },
}

#[allow(async_fn_in_trait)]
pub trait Notifier {
    async fn send_booking_notification(&self, m: &Match, dry_run: bool)
        -> Result<NotificationReceipt, NotifierError>;

    async fn send_result_notification(&self, m: &Match, dry_run: bool) -> Result<NotificationReceipt, NotifierError>;
}
