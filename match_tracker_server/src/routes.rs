//! Request handler definitions
//!
//! Define each route and its handler here. Handlers that are more than a few lines belong in the engine, not here.
//!
//! Handlers run on the actix worker threads, so anything that waits (the store, the booking platform, the event
//! channel) must be awaited rather than blocked on.
use actix_web::{get, web, HttpResponse, Responder};
use log::*;
use match_tracker_engine::{
    db_types::Player,
    events::EventKind,
    metrics::EngineMetrics,
    traits::{BookingPlatform, EventPublisher, MatchStore, Notifier},
    IngestionApi,
    ProcessingEngine,
};

use crate::{
    data_objects::{IngestResponse, JsonResponse, RosterEntry},
    errors::ServerError,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ty),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

//----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   Metrics  ----------------------------------------------------
#[get("/metrics")]
pub async fn metrics(metrics: web::Data<EngineMetrics>) -> impl Responder {
    trace!("💻️ Received metrics request");
    HttpResponse::Ok().json(metrics.snapshot())
}

//----------------------------------------------   Processing  ----------------------------------------------------
route!(process => Post "/process" impl MatchStore, EventPublisher, Notifier);
/// Drives every pending match once and returns the processing report.
pub async fn process<B, P, N>(api: web::Data<ProcessingEngine<B, P, N>>) -> Result<HttpResponse, ServerError>
where
    B: MatchStore,
    P: EventPublisher,
    N: Notifier,
{
    debug!("💻️ Received process request");
    let report = api.process_pending().await?;
    Ok(HttpResponse::Ok().json(report))
}

route!(ingest => Post "/ingest" impl MatchStore, BookingPlatform, EventPublisher, Notifier);
/// Runs an ingestion cycle, then a processing pass.
pub async fn ingest<B, L, P, N>(
    ingestion: web::Data<IngestionApi<B, L>>,
    engine: web::Data<ProcessingEngine<B, P, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: MatchStore,
    L: BookingPlatform,
    P: EventPublisher,
    N: Notifier,
{
    debug!("💻️ Received ingest request");
    let ingestion = ingestion.run_ingestion_cycle().await?;
    let processing = engine.process_pending().await?;
    Ok(HttpResponse::Ok().json(IngestResponse { ingestion, processing }))
}

route!(pending_matches => Get "/matches/pending" impl MatchStore);
pub async fn pending_matches<B: MatchStore>(store: web::Data<B>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received pending matches request");
    let matches = store.fetch_matches_pending_processing().await?;
    Ok(HttpResponse::Ok().json(matches))
}

//----------------------------------------------   Roster  ----------------------------------------------------
route!(roster => Get "/roster" impl MatchStore);
pub async fn roster<B: MatchStore>(store: web::Data<B>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received roster request");
    let roster = store.fetch_roster().await?;
    Ok(HttpResponse::Ok().json(roster))
}

route!(update_roster => Post "/roster" impl MatchStore);
/// Adds club members, or updates the name and level of existing ones. Duty counts are never touched.
pub async fn update_roster<B: MatchStore>(
    store: web::Data<B>,
    body: web::Json<Vec<RosterEntry>>,
) -> Result<HttpResponse, ServerError> {
    let players = body.into_inner().into_iter().map(Player::from).collect::<Vec<_>>();
    if let Some(p) = players.iter().find(|p| p.id.trim().is_empty()) {
        return Err(ServerError::InvalidRequestBody(format!("Roster entry '{}' has no player id", p.name)));
    }
    debug!("💻️ Received roster update with {} members", players.len());
    let count = store.upsert_roster_members(&players).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("{count} roster members saved"))))
}

//----------------------------------------------   Stats  ----------------------------------------------------
route!(player_stats => Get "/stats" impl MatchStore);
pub async fn player_stats<B: MatchStore>(store: web::Data<B>) -> Result<HttpResponse, ServerError> {
    trace!("💻️ Received player stats request");
    let stats = store.fetch_player_stats().await?;
    Ok(HttpResponse::Ok().json(stats))
}

//----------------------------------------------   Callbacks  ----------------------------------------------------
route!(callback => Post "/callbacks/{kind}" impl MatchStore, EventPublisher, Notifier);
/// Entry point for completions delivered by an external broker.
///
/// The path names the event kind (e.g. `notify-booking`) and the body is the MessagePack-encoded match. Unknown kinds
/// and undecodable bodies are rejected with a 400 without touching any state.
pub async fn callback<B, P, N>(
    path: web::Path<String>,
    body: web::Bytes,
    api: web::Data<ProcessingEngine<B, P, N>>,
) -> Result<HttpResponse, ServerError>
where
    B: MatchStore,
    P: EventPublisher,
    N: Notifier,
{
    let kind = path.into_inner().parse::<EventKind>().map_err(|e| {
        debug!("💻️ Callback for an unknown event kind. {e}");
        ServerError::InvalidRequestPath(e.to_string())
    })?;
    debug!("💻️ Received {kind} callback ({} bytes)", body.len());
    let report = api.handle_delivery(kind, &body).await.map_err(|e| {
        warn!("💻️ {kind} callback failed. {e}");
        ServerError::from(e)
    })?;
    Ok(HttpResponse::Ok().json(report))
}
