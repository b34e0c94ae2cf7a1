//! Domain types and pure logic for the RFS Store notification service.
//!
//! This crate has no I/O. Everything here is shared by the persistence
//! layer (`rfs-db`), the delivery layer (`rfs-events`) and the HTTP server
//! (`rfs-api`).

pub mod callback;
pub mod channels;
pub mod error;
pub mod formatting;
pub mod markup;
pub mod phone;
pub mod recipient;
pub mod secret;
pub mod status;
pub mod types;
