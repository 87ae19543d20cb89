pub mod candidate_filter;
pub mod errors;
pub mod ingestion_api;
pub mod processing_engine;
pub mod transitions;
