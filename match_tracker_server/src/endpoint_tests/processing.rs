use std::sync::Arc;

use actix_web::{http::StatusCode, test::TestRequest, web};
use match_tracker_engine::{
    db_types::{MatchSummary, Player},
    events::EventKind,
    metrics::EngineMetrics,
    test_utils::{
        builders::MatchBuilder,
        prepare_env::{fresh_database, tear_down},
    },
    traits::{BookingPlatformError, MatchStore},
    FilterConfig,
    IngestionApi,
    SqliteDatabase,
};

use super::{
    helpers::{engine, json, send_request},
    mocks::{MockChatService, MockPlatform, MockPublisher},
};
use crate::routes::{metrics, IngestRoute, PendingMatchesRoute, ProcessRoute};

async fn seeded_database() -> SqliteDatabase {
    let db = fresh_database().await;
    db.upsert_roster_members(&[Player::new("p1", "Alice"), Player::new("p2", "Bob")]).await.unwrap();
    db
}

fn expect_duty_request(publisher: &mut MockPublisher) {
    publisher
        .expect_publish()
        .withf(|kind, m| *kind == EventKind::BeginDutyAssignment && m.match_id.as_str() == "m-1")
        .times(1)
        .returning(|_, _| Ok(()));
}

#[actix_web::test]
async fn process_drives_pending_matches() {
    let _ = env_logger::try_init();
    let db = seeded_database().await;
    let m = MatchBuilder::upcoming("m-1").owner("p1").team(&["p1", "p2"]).build();
    db.upsert_matches(&[m]).await.unwrap();
    let mut publisher = MockPublisher::new();
    expect_duty_request(&mut publisher);
    let api = web::Data::new(engine(db.clone(), publisher, MockChatService::new()));

    let req = TestRequest::post().uri("/process");
    let (status, body) = send_request(req, move |cfg| {
        cfg.app_data(api).service(ProcessRoute::<SqliteDatabase, MockPublisher, MockChatService>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert_eq!(report["processed"], 1);
    assert_eq!(report["events_published"], 1);
    assert_eq!(report["outcomes"][0]["final_status"], "ASSIGNING_DUTY");

    let store = web::Data::new(db.clone());
    let req = TestRequest::get().uri("/matches/pending");
    let (status, body) = send_request(req, move |cfg| {
        cfg.app_data(store).service(PendingMatchesRoute::<SqliteDatabase>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let pending = json(&body);
    assert_eq!(pending[0]["processing_status"], "ASSIGNING_DUTY");
    tear_down(db).await;
}

#[actix_web::test]
async fn ingest_then_process() {
    let db = seeded_database().await;
    let mut platform = MockPlatform::new();
    platform.expect_fetch_match_summaries().times(1).returning(|| {
        Ok(vec![
            MatchSummary { match_id: "m-1".into(), owner_id: Some("p1".into()) },
            MatchSummary { match_id: "m-9".into(), owner_id: Some("stranger".into()) },
        ])
    });
    platform
        .expect_fetch_match()
        .times(1)
        .returning(|_| Ok(MatchBuilder::upcoming("m-1").owner("p1").team(&["p1", "p2"]).build()));
    let mut publisher = MockPublisher::new();
    expect_duty_request(&mut publisher);
    let metrics_ctx = Arc::new(EngineMetrics::new());
    let ingestion = web::Data::new(IngestionApi::new(db.clone(), platform, FilterConfig::default(), metrics_ctx));
    let api = web::Data::new(engine(db.clone(), publisher, MockChatService::new()));

    let req = TestRequest::post().uri("/ingest");
    let (status, body) = send_request(req, move |cfg| {
        cfg.app_data(ingestion)
            .app_data(api)
            .service(IngestRoute::<SqliteDatabase, MockPlatform, MockPublisher, MockChatService>::new());
    })
    .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    let report = json(&body);
    assert_eq!(report["ingestion"]["summaries"], 2);
    assert_eq!(report["ingestion"]["accepted"], 1);
    assert_eq!(report["processing"]["events_published"], 1);
    tear_down(db).await;
}

#[actix_web::test]
async fn failed_listing_is_a_server_error() {
    let db = seeded_database().await;
    let mut platform = MockPlatform::new();
    platform.expect_fetch_match_summaries().returning(|| Err(BookingPlatformError::Upstream("timeout".into())));
    let ingestion =
        web::Data::new(IngestionApi::new(db.clone(), platform, FilterConfig::default(), Arc::new(EngineMetrics::new())));
    let api = web::Data::new(engine(db.clone(), MockPublisher::new(), MockChatService::new()));

    let req = TestRequest::post().uri("/ingest");
    let (status, body) = send_request(req, move |cfg| {
        cfg.app_data(ingestion)
            .app_data(api)
            .service(IngestRoute::<SqliteDatabase, MockPlatform, MockPublisher, MockChatService>::new());
    })
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(json(&body)["error"].as_str().unwrap().contains("timeout"));
    tear_down(db).await;
}

#[actix_web::test]
async fn metrics_snapshot() {
    let counters = Arc::new(EngineMetrics::new());
    EngineMetrics::add(&counters.summaries_seen, 12);
    EngineMetrics::incr(&counters.duties_assigned);
    let data = web::Data::from(counters);
    let req = TestRequest::get().uri("/metrics");
    let (status, body) = send_request(req, move |cfg| {
        cfg.app_data(data).service(metrics);
    })
    .await;
    assert_eq!(status, StatusCode::OK);
    let snapshot = json(&body);
    assert_eq!(snapshot["summaries_seen"], 12);
    assert_eq!(snapshot["duties_assigned"], 1);
    assert_eq!(snapshot["stats_recorded"], 0);
}
