//! [`IncidentStore`] backed by the `SQLite` database.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use switchy_database::Database;
use waysure_route_models::{Route, ScoredIncident};
use waysure_scoring::{IncidentStore, ScoringError};

use crate::{DbError, queries};

/// Serves scorer queries from a shared database handle.
#[derive(Clone)]
pub struct DatabaseStore {
    db: Arc<dyn Database>,
}

impl DatabaseStore {
    /// Wraps a database handle.
    #[must_use]
    pub fn new(db: Arc<dyn Database>) -> Self {
        Self { db }
    }

    /// The underlying handle.
    #[must_use]
    pub fn db(&self) -> &dyn Database {
        self.db.as_ref()
    }
}

impl std::fmt::Debug for DatabaseStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseStore").finish_non_exhaustive()
    }
}

fn store_error(e: DbError) -> ScoringError {
    ScoringError::Store(e.to_string())
}

#[async_trait]
impl IncidentStore for DatabaseStore {
    async fn list_incidents_since(
        &self,
        route_id: i64,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<ScoredIncident>, ScoringError> {
        queries::list_incidents_since(self.db(), route_id, cutoff)
            .await
            .map_err(store_error)
    }

    async fn list_all_routes(&self) -> Result<Vec<Route>, ScoringError> {
        queries::list_routes(self.db()).await.map_err(store_error)
    }

    async fn count_incidents_since(&self, cutoff: DateTime<Utc>) -> Result<u64, ScoringError> {
        queries::count_incidents_since(self.db(), cutoff)
            .await
            .map_err(store_error)
    }
}
