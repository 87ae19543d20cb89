use std::sync::Arc;

use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web::ServiceConfig, App};
use log::debug;
use match_tracker_engine::{
    metrics::EngineMetrics,
    traits::{EventPublisher, MatchStore, Notifier},
    EngineOptions,
    ProcessingEngine,
};

/// Runs a single request against an app set up by `configure`, returning the status and the body as text.
pub async fn send_request<F>(req: TestRequest, configure: F) -> (StatusCode, String)
where F: FnOnce(&mut ServiceConfig) {
    let app = App::new().configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let res = test::call_service(&service, req.to_request()).await;
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub fn engine<B, P, N>(db: B, publisher: P, notifier: N) -> ProcessingEngine<B, P, N>
where
    B: MatchStore,
    P: EventPublisher,
    N: Notifier,
{
    ProcessingEngine::new(db, publisher, notifier, EngineOptions::default(), Arc::new(EngineMetrics::new()))
}

pub fn json(body: &str) -> serde_json::Value {
    serde_json::from_str(body).unwrap_or_else(|e| panic!("Response is not JSON ({e}): {body}"))
}
