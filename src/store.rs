use std::{future::Future, time::Duration};

use sqlx::{
    postgres::{PgArguments, PgPoolOptions, PgRow},
    query::{Query, QueryAs},
    FromRow, PgPool, Postgres,
};
use thiserror::Error;
use tracing::warn;

use crate::{config::DbConfig, error::ModelError};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),
    #[error(transparent)]
    Driver(#[from] sqlx::Error),
}

/// Connection pool plus the timeout applied to each individual call.
#[derive(Clone)]
pub struct Store {
    pool: PgPool,
    timeout: Duration,
}

impl Store {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    pub async fn connect(cfg: &DbConfig) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(cfg.max_connections)
            .idle_timeout(cfg.max_idle)
            .acquire_timeout(cfg.query_timeout)
            .connect(&cfg.url)
            .await?;
        Ok(Self::new(pool, cfg.query_timeout))
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs a statement and returns the number of rows it affected.
    pub async fn execute<'q>(
        &self,
        query: Query<'q, Postgres, PgArguments>,
    ) -> Result<u64, ModelError> {
        let result = self.bounded(query.execute(&self.pool)).await?;
        Ok(result.rows_affected())
    }

    /// Fetches exactly one row; no row is `ModelError::NotFound`.
    pub async fn fetch_one<'q, O>(
        &self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> Result<O, ModelError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        match self.bounded(query.fetch_one(&self.pool)).await {
            Ok(row) => Ok(row),
            Err(StoreError::Driver(sqlx::Error::RowNotFound)) => Err(ModelError::NotFound),
            Err(e) => Err(e.into()),
        }
    }

    pub async fn fetch_optional<'q, O>(
        &self,
        query: QueryAs<'q, Postgres, O, PgArguments>,
    ) -> Result<Option<O>, ModelError>
    where
        O: Send + Unpin + for<'r> FromRow<'r, PgRow>,
    {
        Ok(self.bounded(query.fetch_optional(&self.pool)).await?)
    }

    async fn bounded<T, F>(&self, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(res) => Ok(res?),
            Err(_) => {
                warn!(timeout = ?self.timeout, "store call timed out");
                Err(StoreError::Timeout(self.timeout))
            }
        }
    }
}
