use match_tracker_engine::{
    db_types::{Match, MatchId, MatchSummary},
    events::EventKind,
    traits::{
        BookingPlatform,
        BookingPlatformError,
        EventPublisher,
        NotificationReceipt,
        Notifier,
        NotifierError,
        PublishError,
    },
};
use mockall::mock;

mock! {
    pub Publisher {}
    impl EventPublisher for Publisher {
        async fn publish(&self, kind: EventKind, m: &Match) -> Result<(), PublishError>;
    }
}

mock! {
    pub ChatService {}
    impl Notifier for ChatService {
        async fn send_booking_notification(&self, m: &Match, dry_run: bool) -> Result<NotificationReceipt, NotifierError>;
        async fn send_result_notification(&self, m: &Match, dry_run: bool) -> Result<NotificationReceipt, NotifierError>;
    }
}

mock! {
    pub Platform {}
    impl BookingPlatform for Platform {
        async fn fetch_match_summaries(&self) -> Result<Vec<MatchSummary>, BookingPlatformError>;
        async fn fetch_match(&self, match_id: &MatchId) -> Result<Match, BookingPlatformError>;
    }
}
