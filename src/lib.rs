//! Authoritative backend for the LexiParty word-round party game.
//!
//! Each room is owned by a single actor task that serialises every command,
//! runs the round deadline, and fans out snapshots to subscribers. HTTP is
//! the control surface, WebSocket the push surface; clients never advance
//! state themselves.

pub mod config;
pub mod error;
pub mod events;
pub mod http;
pub mod model;
pub mod room;
pub mod rules;
pub mod snapshot;
pub mod telemetry;
pub mod util;
pub mod ws;
