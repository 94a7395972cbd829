#![cfg_attr(not(test), deny(clippy::panic))]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::too_many_arguments,
    clippy::too_many_lines
)]

//! # QuipWits Server
//!
//! Authoritative, in-memory room server for QuipWits, a party-style word game
//! for 3-8 players and one host display per room.
//!
//! No database, no cloud services. Run the binary, open the host page, and
//! players join from their own devices with a four-letter room code.

/// Server configuration, loading, and the API-key credential store
pub mod config;

/// Room state, registry, pairing, scoring, timers, and prompt sources
pub mod game;

/// Structured logging configuration
pub mod logging;

/// Local address discovery for join URLs
pub mod network;

/// Wire message protocol definitions
pub mod protocol;

/// Game server orchestration
pub mod server;

/// WebSocket and HTTP endpoint handling
pub mod websocket;
