use actix_web::{http::StatusCode, test::TestRequest, web};
use chrono::Duration;
use match_tracker_engine::{
    db_types::{Player, ProcessingStatus},
    events::{encode_match, EventKind},
    test_utils::{
        builders::MatchBuilder,
        prepare_env::{fresh_database, tear_down},
    },
    traits::{MatchStore, NotificationReceipt},
    SqliteDatabase,
};

use super::{
    helpers::{engine, json, send_request},
    mocks::{MockChatService, MockPublisher},
};
use crate::routes::CallbackRoute;

type Route = CallbackRoute<SqliteDatabase, MockPublisher, MockChatService>;

async fn callback(
    db: &SqliteDatabase,
    path: &str,
    payload: Vec<u8>,
    publisher: MockPublisher,
    notifier: MockChatService,
) -> (StatusCode, String) {
    let api = web::Data::new(engine(db.clone(), publisher, notifier));
    let req = TestRequest::post().uri(path).set_payload(payload);
    send_request(req, move |cfg| {
        cfg.app_data(api).service(Route::new());
    })
    .await
}

#[actix_web::test]
async fn unknown_event_kind() {
    let db = fresh_database().await;
    let payload = encode_match(&MatchBuilder::upcoming("m-1").build()).unwrap();
    let (status, body) =
        callback(&db, "/callbacks/make-coffee", payload, MockPublisher::new(), MockChatService::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(json(&body)["error"].as_str().unwrap().contains("make-coffee"));
    tear_down(db).await;
}

#[actix_web::test]
async fn malformed_payload_is_rejected() {
    let db = fresh_database().await;
    let m = MatchBuilder::upcoming("m-1").status(ProcessingStatus::AssigningDuty).build();
    db.upsert_matches(&[m]).await.unwrap();
    let payload = b"definitely not messagepack".to_vec();
    let (status, _) =
        callback(&db, "/callbacks/begin-duty-assignment", payload, MockPublisher::new(), MockChatService::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let stored = db.fetch_match(&"m-1".into()).await.unwrap().unwrap();
    assert_eq!(stored.processing_status, ProcessingStatus::AssigningDuty);
    assert!(stored.duty.is_none());
    tear_down(db).await;
}

#[actix_web::test]
async fn unknown_match() {
    let db = fresh_database().await;
    let payload = encode_match(&MatchBuilder::upcoming("ghost").build()).unwrap();
    let (status, body) =
        callback(&db, "/callbacks/notify-result", payload, MockPublisher::new(), MockChatService::new()).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body.contains("ghost"));
    tear_down(db).await;
}

#[actix_web::test]
async fn duty_callback_assigns_and_moves_on() {
    let _ = env_logger::try_init();
    let db = fresh_database().await;
    db.upsert_roster_members(&[Player::new("p1", "Alice"), Player::new("p2", "Bob")]).await.unwrap();
    let m =
        MatchBuilder::upcoming("m-1").owner("p1").team(&["p1", "p2"]).status(ProcessingStatus::AssigningDuty).build();
    db.upsert_matches(&[m.clone()]).await.unwrap();
    let mut publisher = MockPublisher::new();
    publisher
        .expect_publish()
        .withf(|kind, m| *kind == EventKind::NotifyBooking && m.duty.is_some())
        .times(1)
        .returning(|_, _| Ok(()));

    let payload = encode_match(&m).unwrap();
    let (status, body) =
        callback(&db, "/callbacks/begin-duty-assignment", payload, publisher, MockChatService::new()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert_eq!(report["applied"], true);
    assert_eq!(report["status"], "BOOKING_NOTIFIED");
    assert_eq!(report["published"], serde_json::json!(["notify-booking"]));
    let stored = db.fetch_match(&"m-1".into()).await.unwrap().unwrap();
    assert_eq!(stored.duty.unwrap().player_id, "p1");
    assert_eq!(stored.processing_status, ProcessingStatus::BookingNotified);
    tear_down(db).await;
}

#[actix_web::test]
async fn booking_callback_sends_the_notice() {
    let db = fresh_database().await;
    let m = MatchBuilder::upcoming("m-2").team(&["p1", "p2"]).status(ProcessingStatus::BookingNotified).build();
    db.upsert_matches(&[m.clone()]).await.unwrap();
    let mut notifier = MockChatService::new();
    notifier
        .expect_send_booking_notification()
        .withf(|m, dry_run| m.match_id.as_str() == "m-2" && !dry_run)
        .times(1)
        .returning(|_, _| Ok(NotificationReceipt::Delivered { channel: "webhook".into(), message_id: None }));

    let payload = encode_match(&m).unwrap();
    let (status, body) = callback(&db, "/callbacks/notify-booking", payload, MockPublisher::new(), notifier).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert_eq!(report["applied"], true);
    assert_eq!(report["status"], "BOOKING_NOTIFIED");
    tear_down(db).await;
}

#[actix_web::test]
async fn late_callback_is_ignored() {
    let db = fresh_database().await;
    let m = MatchBuilder::played("m-3", Duration::hours(2)).team(&["p1"]).status(ProcessingStatus::Completed).build();
    db.upsert_matches(&[m.clone()]).await.unwrap();
    // Neither mock has expectations, so any notice or publication fails the test
    let payload = encode_match(&m).unwrap();
    let (status, body) =
        callback(&db, "/callbacks/notify-result", payload, MockPublisher::new(), MockChatService::new()).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert_eq!(report["applied"], false);
    assert_eq!(report["status"], "COMPLETED");
    tear_down(db).await;
}
