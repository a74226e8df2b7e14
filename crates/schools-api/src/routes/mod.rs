//! # API Route Modules
//!
//! - `schools`: school record CRUD and the filtered listing.
//! - `healthcheck`: availability report.

pub mod healthcheck;
pub mod schools;
