use actix_web::{
    http::{header::ContentType, StatusCode},
    test::TestRequest,
    web,
};
use match_tracker_engine::{
    test_utils::prepare_env::{fresh_database, tear_down},
    SqliteDatabase,
};
use serde_json::json as json_body;

use super::helpers::{json, send_request};
use crate::routes::{PlayerStatsRoute, RosterRoute, UpdateRosterRoute};

fn configure_roster(store: web::Data<SqliteDatabase>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.app_data(store)
            .service(RosterRoute::<SqliteDatabase>::new())
            .service(UpdateRosterRoute::<SqliteDatabase>::new())
            .service(PlayerStatsRoute::<SqliteDatabase>::new());
    }
}

#[actix_web::test]
async fn roster_bootstrap() {
    let _ = env_logger::try_init();
    let db = fresh_database().await;
    let store = web::Data::new(db.clone());
    let entries = json_body!([
        {"player_id": "p2", "name": "Bob"},
        {"player_id": "p1", "name": "Alice", "level": 3.5},
    ]);
    let req = TestRequest::post().uri("/roster").set_json(entries);
    let (status, body) = send_request(req, configure_roster(store.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(json(&body)["message"], "2 roster members saved");

    let (status, body) = send_request(TestRequest::get().uri("/roster"), configure_roster(store.clone())).await;
    assert_eq!(status, StatusCode::OK);
    let roster = json(&body);
    assert_eq!(roster[0]["name"], "Alice");
    assert_eq!(roster[0]["level"], 3.5);
    assert_eq!(roster[0]["duty_count"], 0);
    assert_eq!(roster[1]["player_id"], "p2");

    let (status, body) = send_request(TestRequest::get().uri("/stats"), configure_roster(store)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, "[]");
    tear_down(db).await;
}

#[actix_web::test]
async fn roster_entries_need_an_id() {
    let db = fresh_database().await;
    let store = web::Data::new(db.clone());
    let req = TestRequest::post().uri("/roster").set_json(json_body!([{"player_id": " ", "name": "Nobody"}]));
    let (status, body) = send_request(req, configure_roster(store.clone())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body.contains("Nobody"));
    let req = TestRequest::post().uri("/roster").insert_header(ContentType::json()).set_payload("not json");
    let (status, _) = send_request(req, configure_roster(store)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    tear_down(db).await;
}
