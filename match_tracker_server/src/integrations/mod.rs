//! Adapters between the engine's collaborator traits and the services the match tracker talks to.
pub mod booking;
pub mod chat;
