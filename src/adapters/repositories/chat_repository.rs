use async_trait::async_trait;
use chrono::Utc;
use futures::{stream::BoxStream, StreamExt, TryStreamExt};

use super::MessageStore;
use crate::{
	database::DatabaseExecutor,
	domain::chat::{ChatListItem, ExportRow, Message, User},
	services::response::ServiceError,
};

const FOREIGN_KEY_VIOLATION: &str = "23503";

pub struct PgMessageStore {
	executor: DatabaseExecutor,
}

impl PgMessageStore {
	pub fn new(executor: DatabaseExecutor) -> Self {
		Self { executor }
	}
}

#[async_trait]
impl MessageStore for PgMessageStore {
	async fn list_all(&self) -> Result<Vec<ChatListItem>, ServiceError> {
		let mut conn = self.executor.connection().await?;
		let chats = sqlx::query_as::<_, ChatListItem>(
			r#"
				SELECT c.id, c.user_id AS author_id, c.message AS text, c.time_stamp AS created_at, u.user_name AS author_name
				FROM chats c
				LEFT JOIN users u ON u.id = c.user_id
				ORDER BY c.id
			"#,
		)
		.fetch_all(&mut *conn)
		.await?;
		tracing::debug!("Listed {} chats", chats.len());
		Ok(chats)
	}

	fn list_for_export(&self) -> BoxStream<'_, Result<ExportRow, ServiceError>> {
		sqlx::query_as::<_, ExportRow>(
			r#"
				SELECT c.message AS text, c.time_stamp AS created_at, u.user_name AS author_username
				FROM chats c
				INNER JOIN users u ON u.id = c.user_id
				ORDER BY c.id
			"#,
		)
		.fetch(self.executor.pool())
		.map_err(ServiceError::from)
		.boxed()
	}

	async fn get(
		&self,
		id: i64,
	) -> Result<Message, ServiceError> {
		let mut conn = self.executor.connection().await?;
		sqlx::query_as::<_, Message>(
			r#"
				SELECT id, user_id AS author_id, message AS text, time_stamp AS created_at
				FROM chats
				WHERE id = $1
			"#,
		)
		.bind(id)
		.fetch_optional(&mut *conn)
		.await?
		.ok_or(ServiceError::EntityNotFound)
	}

	async fn create(
		&self,
		author_identity: &str,
		text: &str,
	) -> Result<Message, ServiceError> {
		let mut conn = self.executor.connection().await?;

		// Resolving the author and inserting happen in one statement: no user row, no insert.
		let message = sqlx::query_as::<_, Message>(
			r#"
				INSERT INTO chats (user_id, message, time_stamp)
				SELECT u.id, $2, $3 FROM users u WHERE u.id = $1
				RETURNING id, user_id AS author_id, message AS text, time_stamp AS created_at
			"#,
		)
		.bind(author_identity)
		.bind(text)
		.bind(Utc::now())
		.fetch_optional(&mut *conn)
		.await?
		.ok_or_else(|| {
			tracing::warn!("Rejected chat from unknown author `{}`", author_identity);
			ServiceError::InvalidAuthor(author_identity.to_string())
		})?;

		tracing::info!("Created chat {} by `{}`", message.id, message.author_id);
		Ok(message)
	}

	async fn update(
		&self,
		replacement: Message,
	) -> Result<Message, ServiceError> {
		let mut conn = self.executor.connection().await?;
		let message = sqlx::query_as::<_, Message>(
			r#"
				UPDATE chats
				SET user_id = $2, message = $3, time_stamp = $4
				WHERE id = $1
				RETURNING id, user_id AS author_id, message AS text, time_stamp AS created_at
			"#,
		)
		.bind(replacement.id)
		.bind(&replacement.author_id)
		.bind(&replacement.text)
		.bind(replacement.created_at)
		.fetch_optional(&mut *conn)
		.await
		.map_err(|err| match err {
			sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some(FOREIGN_KEY_VIOLATION) => {
				ServiceError::InvalidAuthor(replacement.author_id.clone())
			}
			err => err.into(),
		})?
		.ok_or(ServiceError::EntityNotFound)?;

		tracing::info!("Updated chat {}", message.id);
		Ok(message)
	}

	async fn delete(
		&self,
		id: i64,
	) -> Result<(), ServiceError> {
		let mut conn = self.executor.connection().await?;
		let result = sqlx::query("DELETE FROM chats WHERE id = $1").bind(id).execute(&mut *conn).await?;
		if result.rows_affected() == 0 {
			return Err(ServiceError::EntityNotFound);
		}
		tracing::info!("Deleted chat {}", id);
		Ok(())
	}

	async fn list_users(&self) -> Result<Vec<User>, ServiceError> {
		let mut conn = self.executor.connection().await?;
		let users = sqlx::query_as::<_, User>("SELECT id, user_name AS username, email FROM users ORDER BY email")
			.fetch_all(&mut *conn)
			.await?;
		Ok(users)
	}
}
