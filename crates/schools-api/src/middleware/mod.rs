//! # Middleware
//!
//! Layers wrapped around every route, outermost first:
//!
//! - [`tracing_layer`]: one tracing span per request, logged on response.
//! - [`panic`]: turns a handler panic into the standard 500 response.

pub mod panic;
pub mod tracing_layer;
