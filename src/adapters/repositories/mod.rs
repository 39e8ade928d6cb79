pub mod chat_repository;
pub mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::{
	domain::chat::{ChatListItem, ExportRow, Message, User},
	services::response::ServiceError,
};

pub use chat_repository::PgMessageStore;
pub use memory::MemoryMessageStore;

/// Persistence contract for chat messages.
///
/// Users are only ever read. Every write touches exactly one message record.
#[async_trait]
pub trait MessageStore: Send + Sync {
	/// Every message with its author's display name, in insertion order.
	async fn list_all(&self) -> Result<Vec<ChatListItem>, ServiceError>;

	/// Messages joined with their authors. Messages whose author is gone are skipped.
	fn list_for_export(&self) -> BoxStream<'_, Result<ExportRow, ServiceError>>;

	async fn get(
		&self,
		id: i64,
	) -> Result<Message, ServiceError>;

	/// Stamps authorship and creation time, then persists the message.
	///
	/// Fails with [`ServiceError::InvalidAuthor`] when `author_identity` is not a known user.
	async fn create(
		&self,
		author_identity: &str,
		text: &str,
	) -> Result<Message, ServiceError>;

	/// Overwrites the whole record identified by `replacement.id`.
	///
	/// The caller resubmits author and timestamp too; there is no partial patch and no
	/// concurrency check, so the last writer wins.
	async fn update(
		&self,
		replacement: Message,
	) -> Result<Message, ServiceError>;

	async fn delete(
		&self,
		id: i64,
	) -> Result<(), ServiceError>;

	/// Users ordered by email, for author selection.
	async fn list_users(&self) -> Result<Vec<User>, ServiceError>;
}
