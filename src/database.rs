use std::time::Duration;

use sqlx::pool::PoolConnection;
use sqlx::postgres::PgPoolOptions;
use sqlx::{postgres::PgPool, Postgres};

use crate::services::response::ServiceError;

static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("./migrations");

/// Hands out pooled connections scoped to a single store operation.
///
/// The connection goes back to the pool when the returned handle is dropped,
/// whichever way the operation exits.
#[derive(Clone, Debug)]
pub struct DatabaseExecutor {
	pool: PgPool,
}

impl DatabaseExecutor {
	pub fn new(pool: PgPool) -> Self {
		Self { pool }
	}

	pub fn pool(&self) -> &PgPool {
		&self.pool
	}

	pub async fn connection(&self) -> Result<PoolConnection<Postgres>, ServiceError> {
		self.pool.acquire().await.map_err(|err| {
			tracing::error!("Failed to acquire database connection: {:?}", err);
			ServiceError::DatabaseError(Box::new(err))
		})
	}

	pub async fn migrate(&self) -> Result<(), ServiceError> {
		MIGRATOR.run(&self.pool).await?;
		Ok(())
	}
}

impl From<PgPool> for DatabaseExecutor {
	fn from(value: PgPool) -> Self {
		Self::new(value)
	}
}

pub async fn connection_pool(
	url: &str,
	max_connections: u32,
) -> Result<PgPool, ServiceError> {
	PgPoolOptions::new()
		.max_connections(max_connections)
		.acquire_timeout(Duration::from_secs(5))
		.connect(url)
		.await
		.map_err(|err| ServiceError::DatabaseError(Box::new(err)))
}
