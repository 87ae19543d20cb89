//! A thin REST client for the court booking platform.
//!
//! The client only knows about the platform's wire format ([`MatchDto`] and friends). Converting these objects into
//! the match tracker's domain types is the job of the integration layer in the server.
mod api;
mod config;
mod error;

mod data_objects;

pub use api::BookingApi;
pub use config::BookingConfig;
pub use data_objects::{MatchDto, MatchSummaryDto, PlayerDto, ScoreDto, SetResultDto, TeamDto, TenantDto};
pub use error::BookingApiError;
