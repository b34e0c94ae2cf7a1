//! Row models for the records this service reads.
//!
//! Summaries are joined views (order + customer profile + service) carrying
//! exactly the fields message templates need.

pub mod invoice;
pub mod notification_log;
pub mod order;
