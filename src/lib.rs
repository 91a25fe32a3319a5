// Public API for integration tests and client-side use

pub mod api;
pub mod broadcast;
pub mod config;
pub mod error;
pub mod mask;
pub mod phase;
pub mod protocol;
pub mod reconcile;
pub mod sequencer;
pub mod state;
pub mod types;
pub mod views;
pub mod ws;
