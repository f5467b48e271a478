//! Library crate for the Flashka memory-game kiosk, exposing modules for binaries and tests.

/// Runtime configuration and game variants.
pub mod config;
/// Device-local persistence.
pub mod dao;
mod dto;
mod error;
/// HTTP route trees.
pub mod routes;
/// Game, media and notification services.
pub mod services;
/// Shared application state and the game state machine.
pub mod state;
