//! # schools-core: Domain Types for the School Directory
//!
//! Pure, I/O-free building blocks shared by the API layer:
//!
//! - [`validator`]: field-keyed error accumulator plus predicate helpers.
//! - [`school`]: the [`School`] record and [`validate_school`].
//! - [`filters`]: list query [`Filters`], sort allow-lists, and the
//!   pagination [`Metadata`] summary.
//!
//! ## Crate Policy
//!
//! - Sits at the bottom of the dependency DAG: no database, no HTTP.
//! - Validation never panics; failures accumulate in a [`Validator`].
//! - Internal invariant violations surface as typed errors ([`FilterError`]),
//!   never as panics.

pub mod filters;
pub mod school;
pub mod validator;

pub use filters::{calculate_metadata, validate_filters, FilterError, Filters, Metadata, SortDirection};
pub use school::{validate_school, School};
pub use validator::Validator;
