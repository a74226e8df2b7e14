//! # Application State
//!
//! Shared state handed to every handler. Cheap to clone: the repository sits
//! behind an `Arc` and the PostgreSQL pool inside it is itself a handle.

use std::fmt;
use std::sync::Arc;

use crate::config::Environment;
use crate::db::memory::MemorySchoolRepository;
use crate::db::SchoolRepository;

#[derive(Clone)]
pub struct AppState {
    /// Reported by the healthcheck.
    pub environment: Environment,
    /// Record storage; PostgreSQL in production, in-memory otherwise.
    pub schools: Arc<dyn SchoolRepository>,
}

impl AppState {
    /// Development state on a fresh in-memory store.
    pub fn new() -> Self {
        Self::with_repository(Environment::Development, MemorySchoolRepository::new())
    }

    pub fn with_repository(
        environment: Environment,
        schools: impl SchoolRepository + 'static,
    ) -> Self {
        Self {
            environment,
            schools: Arc::new(schools),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AppState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppState")
            .field("environment", &self.environment)
            .finish_non_exhaustive()
    }
}
