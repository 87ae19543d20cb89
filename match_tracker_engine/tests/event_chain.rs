use std::{future::Future, pin::Pin, sync::Arc, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use match_tracker_engine::{
    db_types::ProcessingStatus,
    events::{EventHandlers, EventHooks, EventKind, EventProducers, MatchEvent},
    metrics::EngineMetrics,
    traits::MatchStore,
    EngineOptions,
    ProcessingEngine,
    SqliteDatabase,
};
use support::{fresh_database, played, seed_roster, status_of, tear_down, upcoming, RecordingNotifier};

mod support;

type Engine = ProcessingEngine<SqliteDatabase, EventProducers, RecordingNotifier>;

type HookFuture = Pin<Box<dyn Future<Output = ()> + Send>>;

fn deliver(engine: &Arc<Engine>, kind: EventKind) -> impl Fn(MatchEvent) -> HookFuture + Send + Sync + 'static {
    let engine = Arc::clone(engine);
    move |ev: MatchEvent| -> HookFuture {
        let engine = Arc::clone(&engine);
        Box::pin(async move {
            match engine.handle_delivery(kind, &ev.payload).await {
                Ok(report) => debug!("🚀️ {kind} delivered: {report:?}"),
                Err(e) => error!("🚀️ {kind} delivery failed: {e}"),
            }
        })
    }
}

async fn wait_for(db: &SqliteDatabase, id: &str, status: ProcessingStatus) {
    for _ in 0..200 {
        if status_of(db, id).await == status {
            return;
        }
        tokio::time::sleep(StdDuration::from_millis(25)).await;
    }
    panic!("match {id} never reached {status}. It is at {}", status_of(db, id).await);
}

/// Waits until every stored match is at `status`. Returns the number of matches that are not.
async fn wait_for_all(db: &SqliteDatabase, ids: &[String], status: ProcessingStatus) -> usize {
    let mut behind = ids.len();
    for _ in 0..400 {
        behind = 0;
        for id in ids {
            behind += usize::from(status_of(db, id).await != status);
        }
        if behind == 0 {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(25)).await;
    }
    behind
}

async fn wait_for_notices(notifier: &RecordingNotifier, kind: &str, count: usize) {
    for _ in 0..200 {
        if notifier.count(kind) >= count {
            break;
        }
        tokio::time::sleep(StdDuration::from_millis(10)).await;
    }
}

fn start_broker(engine: &Arc<Engine>, handlers: EventHandlers) {
    let mut hooks = EventHooks::default();
    hooks
        .on_begin_duty_assignment(deliver(engine, EventKind::BeginDutyAssignment))
        .on_notify_booking(deliver(engine, EventKind::NotifyBooking))
        .on_notify_result(deliver(engine, EventKind::NotifyResult))
        .on_update_player_stats(deliver(engine, EventKind::UpdatePlayerStats));
    handlers.start_handlers(hooks);
}

fn new_engine(db: &SqliteDatabase, handlers: &EventHandlers, notifier: &RecordingNotifier) -> Arc<Engine> {
    Arc::new(ProcessingEngine::new(
        db.clone(),
        handlers.producers(),
        notifier.clone(),
        EngineOptions::default(),
        Arc::new(EngineMetrics::new()),
    ))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn events_drive_a_match_to_completion() {
    let db = fresh_database().await;
    seed_roster(&db, &["p1", "p2", "p3", "p4"]).await;
    let players = ["p1", "p2", "p3", "p4"];
    db.upsert_matches(&[upcoming("m-1", &players)]).await.unwrap();

    let handlers = EventHandlers::new(16);
    let notifier = RecordingNotifier::default();
    let engine = new_engine(&db, &handlers, &notifier);
    start_broker(&engine, handlers);

    let report = engine.process_pending().await.unwrap();
    assert_eq!(report.events_published, 1);
    wait_for(&db, "m-1", ProcessingStatus::BookingNotified).await;
    // The booking notice is sent by its completion handler, which may still be running
    wait_for_notices(&notifier, "booking", 1).await;
    assert_eq!(notifier.count("booking"), 1);
    let m = db.fetch_match(&"m-1".into()).await.unwrap().unwrap();
    assert_eq!(m.duty.map(|d| d.player_id), Some("p1".to_string()));

    // The result comes in on a later ingestion
    db.upsert_matches(&[played("m-1", &players, Duration::hours(1))]).await.unwrap();
    engine.process_pending().await.unwrap();
    wait_for(&db, "m-1", ProcessingStatus::Completed).await;
    assert_eq!(notifier.count("result"), 1);
    assert_eq!(notifier.count("booking"), 1);
    let stats = db.fetch_player_stats().await.unwrap();
    assert_eq!(stats.len(), 4);
    assert!(stats.iter().all(|s| s.matches_played == 1));
    tear_down(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_upcoming_match_gets_its_duty_and_booking_notice() {
    let db = fresh_database().await;
    let players = ["p1", "p2", "p3", "p4"];
    seed_roster(&db, &players).await;
    let ids = (0..30).map(|i| format!("u-{i:02}")).collect::<Vec<_>>();
    let matches = ids.iter().map(|id| upcoming(id, &players)).collect::<Vec<_>>();
    db.upsert_matches(&matches).await.unwrap();

    let handlers = EventHandlers::new(64);
    let notifier = RecordingNotifier::default();
    let engine = new_engine(&db, &handlers, &notifier);
    start_broker(&engine, handlers);

    engine.process_pending().await.unwrap();
    let behind = wait_for_all(&db, &ids, ProcessingStatus::BookingNotified).await;
    assert_eq!(behind, 0, "{behind} matches never got their booking notice");
    wait_for_notices(&notifier, "booking", ids.len()).await;
    assert_eq!(notifier.count("booking"), ids.len());

    // A second pass finds nothing to do
    let report = engine.process_pending().await.unwrap();
    assert_eq!(report.events_published, 0);

    let duties = db.fetch_roster().await.unwrap().iter().map(|m| m.duty_count).collect::<Vec<_>>();
    assert_eq!(duties.iter().sum::<i64>(), 30);
    let (min, max) = (duties.iter().min().unwrap(), duties.iter().max().unwrap());
    assert!(max - min <= 1, "{duties:?}");
    tear_down(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn every_played_match_is_announced_and_counted_once() {
    let db = fresh_database().await;
    let players = ["p1", "p2", "p3", "p4"];
    let ids = (0..20).map(|i| format!("r-{i:02}")).collect::<Vec<_>>();
    let matches = ids.iter().map(|id| played(id, &players, Duration::hours(1))).collect::<Vec<_>>();
    db.upsert_matches(&matches).await.unwrap();

    let handlers = EventHandlers::new(64);
    let notifier = RecordingNotifier::default();
    let engine = new_engine(&db, &handlers, &notifier);
    start_broker(&engine, handlers);

    engine.process_pending().await.unwrap();
    let behind = wait_for_all(&db, &ids, ProcessingStatus::Completed).await;
    assert_eq!(behind, 0, "{behind} matches never completed");
    assert_eq!(notifier.count("result"), ids.len());
    assert_eq!(notifier.count("booking"), 0);
    let stats = db.fetch_player_stats().await.unwrap();
    assert!(stats.iter().all(|s| s.matches_played == 20), "{stats:?}");
    tear_down(db).await;
}

#[tokio::test]
async fn unhooked_events_fail_to_publish() {
    let db = fresh_database().await;
    db.upsert_matches(&[upcoming("m-2", &["p1", "p2"])]).await.unwrap();
    let handlers = EventHandlers::new(4);
    let engine = ProcessingEngine::new(
        db.clone(),
        handlers.producers(),
        RecordingNotifier::default(),
        EngineOptions::default(),
        Arc::new(EngineMetrics::new()),
    );
    handlers.start_handlers(EventHooks::default());
    let report = engine.process_pending().await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(status_of(&db, "m-2").await, ProcessingStatus::New);
    tear_down(db).await;
}
