use std::{sync::Arc, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use match_tracker_engine::{
    events::{EventHandlers, EventProducers},
    metrics::EngineMetrics,
    IngestionApi,
    ProcessingEngine,
    SqliteDatabase,
};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    hooks::completion_hooks,
    ingestion_worker::start_ingestion_worker,
    integrations::{booking::BookingPlatformAdapter, chat::ChatNotifier},
    routes::{
        health,
        metrics,
        CallbackRoute,
        IngestRoute,
        PendingMatchesRoute,
        PlayerStatsRoute,
        ProcessRoute,
        RosterRoute,
        UpdateRosterRoute,
    },
};

pub type TrackerEngine = ProcessingEngine<SqliteDatabase, EventProducers, ChatNotifier>;
pub type TrackerIngestion = IngestionApi<SqliteDatabase, BookingPlatformAdapter>;

/// Largest MessagePack payload accepted on the callback route.
const MAX_PAYLOAD_SIZE: usize = 256 * 1024;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, config.db_max_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.migrate().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let engine_metrics = Arc::new(EngineMetrics::new());
    let platform = BookingPlatformAdapter::new(config.booking.clone())
        .map_err(|e| ServerError::ConfigurationError(e.to_string()))?;
    let notifier =
        ChatNotifier::new(config.chat.clone()).map_err(|e| ServerError::ConfigurationError(e.to_string()))?;

    let handlers = EventHandlers::new(config.event_buffer_size);
    let producers = handlers.producers();
    let engine = Arc::new(ProcessingEngine::new(db.clone(), producers, notifier, config.engine, engine_metrics.clone()));
    handlers.start_handlers(completion_hooks(Arc::clone(&engine)));
    let ingestion = Arc::new(IngestionApi::new(db.clone(), platform, config.filter, engine_metrics.clone()));
    if config.ingestion.enabled {
        start_ingestion_worker(Arc::clone(&ingestion), Arc::clone(&engine), config.ingestion.interval);
    } else {
        warn!("🚀️ The ingestion worker is disabled. Use POST /ingest to pull matches from the booking platform.");
    }

    let srv = create_server_instance(config, db, engine, ingestion, engine_metrics)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    engine: Arc<TrackerEngine>,
    ingestion: Arc<TrackerIngestion>,
    engine_metrics: Arc<EngineMetrics>,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("mt::access_log"))
            .app_data(web::PayloadConfig::new(MAX_PAYLOAD_SIZE))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::from(Arc::clone(&engine)))
            .app_data(web::Data::from(Arc::clone(&ingestion)))
            .app_data(web::Data::from(Arc::clone(&engine_metrics)))
            .service(health)
            .service(metrics)
            .service(ProcessRoute::<SqliteDatabase, EventProducers, ChatNotifier>::new())
            .service(IngestRoute::<SqliteDatabase, BookingPlatformAdapter, EventProducers, ChatNotifier>::new())
            .service(PendingMatchesRoute::<SqliteDatabase>::new())
            .service(RosterRoute::<SqliteDatabase>::new())
            .service(UpdateRosterRoute::<SqliteDatabase>::new())
            .service(PlayerStatsRoute::<SqliteDatabase>::new())
            .service(CallbackRoute::<SqliteDatabase, EventProducers, ChatNotifier>::new())
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}
