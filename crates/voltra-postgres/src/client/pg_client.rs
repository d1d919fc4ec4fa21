//! High-level database client managing connections and migrations.

use std::sync::Arc;

use diesel_async::AsyncPgConnection;
use diesel_async::async_connection_wrapper::AsyncConnectionWrapper;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::deadpool::Pool;
use diesel_migrations::MigrationHarness;

use crate::{MIGRATIONS, PgConfig, PgError, PgResult, TRACING_TARGET_CONNECTION};

/// A connection checked out from the pool.
pub type PooledConnection =
    deadpool::managed::Object<AsyncDieselConnectionManager<AsyncPgConnection>>;

/// High-level database client that manages connections and migrations.
///
/// This type is cheap to clone and can be shared across threads.
#[derive(Clone)]
pub struct PgClient {
    inner: Arc<PgClientInner>,
}

struct PgClientInner {
    pool: Pool<AsyncPgConnection>,
    config: PgConfig,
}

impl PgClient {
    /// Creates a new database client with the provided configuration.
    ///
    /// This will establish a connection pool.
    pub fn new(config: PgConfig) -> PgResult<Self> {
        config.validate()?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            database_url = %config.database_url_masked(),
            "Initializing database client"
        );

        let manager =
            AsyncDieselConnectionManager::<AsyncPgConnection>::new(&config.postgres_url);

        let mut builder = Pool::builder(manager)
            .max_size(config.postgres_max_connections as usize)
            .runtime(deadpool::Runtime::Tokio1);

        if let Some(timeout) = config.connection_timeout() {
            builder = builder.wait_timeout(Some(timeout)).create_timeout(Some(timeout));
        }

        if let Some(timeout) = config.idle_timeout() {
            builder = builder.recycle_timeout(Some(timeout));
        }

        let pool = builder.build().map_err(|e| {
            tracing::error!(
                target: TRACING_TARGET_CONNECTION,
                error = %e,
                "Failed to create connection pool"
            );
            PgError::Unexpected(format!("failed to build connection pool: {e}"))
        })?;

        Ok(Self {
            inner: Arc::new(PgClientInner { pool, config }),
        })
    }

    /// Creates a new database client and verifies connectivity.
    pub async fn connect(config: PgConfig) -> PgResult<Self> {
        let client = Self::new(config)?;
        client.get_connection().await?;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            "Database connectivity verified"
        );

        Ok(client)
    }

    /// Checks out a connection from the pool.
    pub async fn get_connection(&self) -> PgResult<PooledConnection> {
        self.inner.pool.get().await.map_err(PgError::from)
    }

    /// Returns the client configuration.
    pub fn config(&self) -> &PgConfig {
        &self.inner.config
    }

    /// Applies all pending embedded migrations.
    ///
    /// Migrations run on a dedicated blocking connection since the diesel
    /// migration harness is synchronous.
    pub async fn run_pending_migrations(&self) -> PgResult<()> {
        let database_url = self.inner.config.postgres_url.clone();

        let applied = tokio::task::spawn_blocking(move || -> PgResult<usize> {
            use diesel::Connection;

            let mut conn =
                AsyncConnectionWrapper::<AsyncPgConnection>::establish(&database_url)
                    .map_err(PgError::Connection)?;

            let versions = conn
                .run_pending_migrations(MIGRATIONS)
                .map_err(PgError::Migration)?;

            Ok(versions.len())
        })
        .await
        .map_err(|e| PgError::Unexpected(format!("migration task panicked: {e}")))??;

        tracing::info!(
            target: TRACING_TARGET_CONNECTION,
            applied = %applied,
            "Applied pending migrations"
        );

        Ok(())
    }
}

impl std::fmt::Debug for PgClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PgClient")
            .field("database_url", &self.inner.config.database_url_masked())
            .finish_non_exhaustive()
    }
}
