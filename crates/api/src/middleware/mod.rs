//! Request extractors guarding internal endpoints.
//!
//! - [`service_auth::ServiceAuth`] -- Requires the shared internal API key as a Bearer token.

pub mod service_auth;
