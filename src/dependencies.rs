use std::sync::Arc;

use crate::{
	adapters::repositories::{MemoryMessageStore, MessageStore, PgMessageStore},
	config::{Config, StoreBackend},
	database::{connection_pool, DatabaseExecutor},
	services::{response::ServiceError, ChatState},
};

/// Builds the store for the configured backend.
pub async fn message_store(config: &Config) -> Result<Arc<dyn MessageStore>, ServiceError> {
	let store: Arc<dyn MessageStore> = match &config.store_backend {
		StoreBackend::Postgres {
			database_url,
			max_connections,
		} => {
			let executor: DatabaseExecutor = connection_pool(database_url, *max_connections).await?.into();
			executor.migrate().await?;
			tracing::info!("Using postgres store with up to {} connections", max_connections);
			Arc::new(PgMessageStore::new(executor))
		}
		StoreBackend::Memory { seed_users } => {
			tracing::info!("Using in-memory store with {} seeded users", seed_users.len());
			Arc::new(MemoryMessageStore::with_users(seed_users.iter().cloned()))
		}
	};
	Ok(store)
}

pub async fn chat_state(config: &Config) -> Result<ChatState, ServiceError> {
	Ok(ChatState::new(message_store(config).await?)
		.with_encoding(config.encoding)
		.with_identity_header(config.identity_header.clone()))
}
