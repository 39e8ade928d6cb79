pub mod schemas;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A persisted chat entry.
///
/// `id` and `created_at` are assigned by the store on creation; callers only ever
/// supply them when replacing an existing record.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct Message {
	pub id: i64,
	pub author_id: String,
	pub text: String,
	pub created_at: DateTime<Utc>,
}

/// Account owned by the identity provider. Read-only from this service.
#[derive(Clone, PartialEq, Eq, Debug, Hash, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
	pub id: String,
	pub username: String,
	pub email: String,
}

/// A message paired with its author's display name, `None` when the author no longer resolves.
#[derive(Clone, PartialEq, Eq, Debug, sqlx::FromRow)]
pub struct ChatListItem {
	#[sqlx(flatten)]
	pub message: Message,
	pub author_name: Option<String>,
}

// Keys match the legacy export payload.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize, sqlx::FromRow)]
pub struct ExportRow {
	#[serde(rename = "Message")]
	pub text: String,
	#[serde(rename = "TimeStamp")]
	pub created_at: DateTime<Utc>,
	#[serde(rename = "UserName")]
	pub author_username: String,
}

/// Opaque caller id handed over by the identity provider for a single request.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Identity(pub String);

impl Identity {
	pub fn as_str(&self) -> &str {
		&self.0
	}
}
