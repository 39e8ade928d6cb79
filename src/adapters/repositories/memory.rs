use std::{
	collections::{BTreeMap, HashMap},
	sync::atomic::{AtomicI64, Ordering},
};

use async_trait::async_trait;
use chrono::Utc;
use futures::{future, stream::BoxStream, FutureExt, StreamExt};
use tokio::sync::RwLock;

use super::MessageStore;
use crate::{
	domain::chat::{ChatListItem, ExportRow, Message, User},
	services::response::ServiceError,
};

/// Process-local backend. Ids come from a monotonic sequence, so a deleted id is never handed out again.
pub struct MemoryMessageStore {
	users: RwLock<HashMap<String, User>>,
	chats: RwLock<BTreeMap<i64, Message>>,
	sequence: AtomicI64,
}

impl Default for MemoryMessageStore {
	fn default() -> Self {
		Self {
			users: Default::default(),
			chats: Default::default(),
			sequence: AtomicI64::new(1),
		}
	}
}

impl MemoryMessageStore {
	pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
		Self {
			users: RwLock::new(users.into_iter().map(|user| (user.id.clone(), user)).collect()),
			..Default::default()
		}
	}

	#[cfg(test)]
	async fn forget_user(
		&self,
		id: &str,
	) {
		self.users.write().await.remove(id);
	}
}

#[async_trait]
impl MessageStore for MemoryMessageStore {
	async fn list_all(&self) -> Result<Vec<ChatListItem>, ServiceError> {
		let chats = self.chats.read().await;
		let users = self.users.read().await;
		Ok(chats
			.values()
			.map(|message| ChatListItem {
				author_name: users.get(&message.author_id).map(|user| user.username.clone()),
				message: message.clone(),
			})
			.collect())
	}

	/// Joins lazily over a snapshot taken when the stream is first polled.
	fn list_for_export(&self) -> BoxStream<'_, Result<ExportRow, ServiceError>> {
		async move {
			let chats: Vec<Message> = self.chats.read().await.values().cloned().collect();
			let users = self.users.read().await.clone();
			futures::stream::iter(chats).filter_map(move |message| {
				let row = users.get(&message.author_id).map(|user| {
					Ok(ExportRow {
						author_username: user.username.clone(),
						text: message.text,
						created_at: message.created_at,
					})
				});
				future::ready(row)
			})
		}
		.flatten_stream()
		.boxed()
	}

	async fn get(
		&self,
		id: i64,
	) -> Result<Message, ServiceError> {
		self.chats.read().await.get(&id).cloned().ok_or(ServiceError::EntityNotFound)
	}

	async fn create(
		&self,
		author_identity: &str,
		text: &str,
	) -> Result<Message, ServiceError> {
		let author_id = match self.users.read().await.get(author_identity) {
			Some(user) => user.id.clone(),
			None => {
				tracing::warn!("Rejected chat from unknown author `{}`", author_identity);
				return Err(ServiceError::InvalidAuthor(author_identity.to_string()));
			}
		};

		let message = Message {
			id: self.sequence.fetch_add(1, Ordering::SeqCst),
			author_id,
			text: text.to_string(),
			created_at: Utc::now(),
		};
		self.chats.write().await.insert(message.id, message.clone());

		tracing::info!("Created chat {} by `{}`", message.id, message.author_id);
		Ok(message)
	}

	async fn update(
		&self,
		replacement: Message,
	) -> Result<Message, ServiceError> {
		let mut chats = self.chats.write().await;
		let Some(current) = chats.get_mut(&replacement.id) else {
			return Err(ServiceError::EntityNotFound);
		};
		if !self.users.read().await.contains_key(&replacement.author_id) {
			return Err(ServiceError::InvalidAuthor(replacement.author_id));
		}

		*current = replacement;
		tracing::info!("Updated chat {}", current.id);
		Ok(current.clone())
	}

	async fn delete(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		self.chats.write().await.remove(&id).ok_or(ServiceError::EntityNotFound)?;
		tracing::info!("Deleted chat {}", id);
		Ok(())
	}

	async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
		let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
		users.sort_by(|a, b| a.email.cmp(&b.email));
		Ok(users)
	}
}
