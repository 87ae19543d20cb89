use std::{sync::Arc, time::Duration};

use log::*;
use tokio::{task::JoinHandle, time::MissedTickBehavior};

use crate::server::{TrackerEngine, TrackerIngestion};

/// Starts the ingestion worker. Do not await the returned JoinHandle, as it will run indefinitely.
///
/// Every `interval` the worker pulls the match listing into the store and then drives every pending match once. A
/// failed cycle is logged and retried at the next tick.
pub fn start_ingestion_worker(
    ingestion: Arc<TrackerIngestion>,
    engine: Arc<TrackerEngine>,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut timer = tokio::time::interval(interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!("🕰️ Ingestion worker started. Running every {}s", interval.as_secs());
        loop {
            timer.tick().await;
            info!("🕰️ Running ingestion cycle");
            match ingestion.run_ingestion_cycle().await {
                Ok(report) => info!(
                    "🕰️ {} summaries listed, {} club matches accepted, {} saved",
                    report.summaries, report.accepted, report.upserted
                ),
                Err(e) => error!("🕰️ Ingestion cycle failed. Pending matches will still be processed. {e}"),
            }
            match engine.process_pending().await {
                Ok(report) => {
                    info!("🕰️ {} matches processed, {} advanced", report.processed, report.advanced);
                    for failure in &report.failures {
                        warn!("🕰️ Match {} ({}) failed: {}", failure.match_id, failure.status, failure.error);
                    }
                },
                Err(e) => error!("🕰️ Could not load pending matches. {e}"),
            }
        }
    })
}
