//! # Match tracker server
//! This crate hosts the server for the club match tracker. It is responsible for:
//! * Periodically pulling the match listing from the booking platform and saving the club matches.
//! * Driving every pending match through its lifecycle with the processing engine.
//! * Performing the work the engine publishes (duty assignment, chat notices, statistics) and reporting back.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `GET /health`: A health check route that returns a 200 OK response.
//! * `GET /metrics`: Counters of the candidate filter and the processing engine.
//! * `POST /process`: Drive every pending match once.
//! * `POST /ingest`: Run an ingestion cycle, then a processing pass.
//! * `GET /matches/pending`: The matches that have not completed their lifecycle.
//! * `GET /roster`, `POST /roster`: List or add club members.
//! * `GET /stats`: Player statistics.
//! * `POST /callbacks/{kind}`: Completions delivered by an external broker, as MessagePack.
pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod hooks;
pub mod ingestion_worker;
pub mod integrations;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
