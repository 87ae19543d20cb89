use std::collections::HashMap;

use futures_util::future::join_all;
use match_tracker_engine::{
    db_types::{DutyAssignmentResult, MatchId},
    traits::{MatchStore, MatchStoreError},
    SqliteDatabase,
};
use support::{fresh_database, seed_roster, tear_down, upcoming};

mod support;

const ROSTER: [&str; 4] = ["p1", "p2", "p3", "p4"];

fn candidates() -> Vec<String> {
    ROSTER.iter().map(|s| s.to_string()).collect()
}

async fn duty_counts(db: &SqliteDatabase) -> HashMap<String, i64> {
    db.fetch_roster().await.unwrap().into_iter().map(|m| (m.player_id, m.duty_count)).collect()
}

async fn seed_matches(db: &SqliteDatabase, n: usize) -> Vec<MatchId> {
    let matches = (0..n).map(|i| upcoming(&format!("m-{i:03}"), &ROSTER)).collect::<Vec<_>>();
    db.upsert_matches(&matches).await.unwrap();
    matches.into_iter().map(|m| m.match_id).collect()
}

#[tokio::test]
async fn serialized_assignments_stay_fair() {
    let db = fresh_database().await;
    seed_roster(&db, &ROSTER).await;
    let ids = seed_matches(&db, 10).await;
    for (i, id) in ids.iter().enumerate() {
        let result = db.assign_duty(id, &candidates()).await.unwrap();
        assert!(matches!(result, DutyAssignmentResult::Assigned(_)));
        let counts = duty_counts(&db).await;
        let max = counts.values().max().unwrap();
        let min = counts.values().min().unwrap();
        assert!(max - min <= 1, "spread too large after {} assignments: {counts:?}", i + 1);
    }
    let counts = duty_counts(&db).await;
    assert_eq!(counts.values().sum::<i64>(), 10);
    tear_down(db).await;
}

#[tokio::test]
async fn ties_go_to_the_lowest_id() {
    let db = fresh_database().await;
    seed_roster(&db, &ROSTER).await;
    let ids = seed_matches(&db, 2).await;
    let reversed = candidates().into_iter().rev().collect::<Vec<_>>();
    let first = db.assign_duty(&ids[0], &reversed).await.unwrap();
    assert_eq!(first.assignment().unwrap().player_id, "p1");
    let second = db.assign_duty(&ids[1], &reversed).await.unwrap();
    assert_eq!(second.assignment().unwrap().player_id, "p2");
    tear_down(db).await;
}

#[tokio::test]
async fn assigning_twice_is_a_no_op() {
    let db = fresh_database().await;
    seed_roster(&db, &ROSTER).await;
    let ids = seed_matches(&db, 1).await;
    let first = db.assign_duty(&ids[0], &candidates()).await.unwrap();
    let second = db.assign_duty(&ids[0], &candidates()).await.unwrap();
    assert!(matches!(first, DutyAssignmentResult::Assigned(_)));
    assert!(matches!(second, DutyAssignmentResult::AlreadyAssigned(_)));
    assert_eq!(first.assignment(), second.assignment());
    assert_eq!(duty_counts(&db).await.values().sum::<i64>(), 1);
    let stored = db.fetch_match(&ids[0]).await.unwrap().unwrap();
    assert_eq!(stored.duty.as_ref(), first.assignment());
    tear_down(db).await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_assignments_are_atomic() {
    let db = fresh_database().await;
    seed_roster(&db, &ROSTER).await;
    let ids = seed_matches(&db, 20).await;
    // Every match is assigned twice, concurrently
    let tasks = ids.iter().chain(ids.iter()).cloned().map(|id| {
        let db = db.clone();
        tokio::spawn(async move { db.assign_duty(&id, &candidates()).await })
    });
    let results = join_all(tasks).await.into_iter().map(|r| r.unwrap().unwrap()).collect::<Vec<_>>();
    let assigned = results.iter().filter(|r| matches!(r, DutyAssignmentResult::Assigned(_))).count();
    assert_eq!(assigned, 20);
    let counts = duty_counts(&db).await;
    assert_eq!(counts.values().sum::<i64>(), 20);
    assert!(counts.values().all(|c| *c == 5), "{counts:?}");
    tear_down(db).await;
}

#[tokio::test]
async fn no_candidates() {
    let db = fresh_database().await;
    seed_roster(&db, &ROSTER).await;
    let ids = seed_matches(&db, 1).await;
    let result = db.assign_duty(&ids[0], &[]).await.unwrap();
    assert_eq!(result, DutyAssignmentResult::NoCandidates);
    let result = db.assign_duty(&ids[0], &["stranger".to_string()]).await.unwrap();
    assert_eq!(result, DutyAssignmentResult::NoCandidates);
    assert!(db.fetch_match(&ids[0]).await.unwrap().unwrap().duty.is_none());
    let err = db.assign_duty(&MatchId::from("nope"), &candidates()).await.unwrap_err();
    assert!(matches!(err, MatchStoreError::MatchNotFound(_)));
    tear_down(db).await;
}
