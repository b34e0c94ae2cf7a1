//! RFS Store notification server library.
//!
//! Exposes config, state, error handling, the Telegram bot workflow and the
//! route tree so integration tests and the binary entrypoint share them.

pub mod bot;
pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod response;
pub mod router;
pub mod routes;
pub mod state;
