use futures::TryStreamExt;
use serde_json::Value;

use super::{
	response::{FieldError, ServiceError},
	ChatState,
};
use crate::domain::chat::{
	schemas::{AjaxChat, ChatForm},
	ExportRow, Identity, Message,
};

/// Rules shared by the HTML and JSON routes, kept apart from axum types.
pub struct ChatHandler;
impl ChatHandler {
	pub async fn export(state: &ChatState) -> Result<Value, ServiceError> {
		let rows: Vec<ExportRow> = state.store.list_for_export().try_collect().await?;
		tracing::debug!("Exporting {} chats with {:?} encoding", rows.len(), state.encoding);
		state.encoding.encode(&rows)
	}

	/// Creates a chat for the calling identity and returns its id.
	///
	/// A blank message saves nothing and yields `0`, the id of the unsaved entity.
	pub async fn post_chat(
		state: &ChatState,
		identity: Option<&Identity>,
		chat: AjaxChat,
	) -> Result<Value, ServiceError> {
		let identity = identity.ok_or(ServiceError::Unauthenticated)?;

		let id = match chat.message {
			Some(text) if !text.trim().is_empty() => state.store.create(identity.as_str(), &text).await?.id,
			_ => {
				tracing::debug!("Ajax chat from `{}` had no message; nothing saved", identity.as_str());
				0
			}
		};
		state.encoding.encode(&id)
	}

	pub async fn submit_create(
		state: &ChatState,
		form: &ChatForm,
	) -> Result<Message, ServiceError> {
		let new_chat = form.validate_create()?;
		state.store.create(&new_chat.author_id, &new_chat.text).await.map_err(author_as_field_error)
	}

	pub async fn submit_edit(
		state: &ChatState,
		id: i64,
		form: &ChatForm,
	) -> Result<Message, ServiceError> {
		let replacement = form.validate_edit(id)?;
		state.store.update(replacement).await.map_err(author_as_field_error)
	}
}

// Forms show an unknown author next to the author picker.
fn author_as_field_error(err: ServiceError) -> ServiceError {
	match err {
		ServiceError::InvalidAuthor(id) => {
			ServiceError::ValidationFailure(vec![FieldError::new("UserID", format!("No user with id '{}' exists.", id))])
		}
		err => err,
	}
}

#[cfg(test)]
mod test {
	use std::sync::Arc;

	use serde_json::{json, Value};

	use super::ChatHandler;
	use crate::{
		adapters::repositories::{MemoryMessageStore, MessageStore},
		domain::chat::{
			schemas::{AjaxChat, ChatForm},
			Identity, User,
		},
		services::{response::ServiceError, ChatState, PayloadEncoding},
	};

	fn chat_state(encoding: PayloadEncoding) -> ChatState {
		let store = MemoryMessageStore::with_users(vec![User {
			id: "u1".into(),
			username: "alice".into(),
			email: "alice@example.com".into(),
		}]);
		ChatState::new(Arc::new(store)).with_encoding(encoding)
	}

	#[tokio::test]
	async fn test_export_single_encoding() {
		let state = chat_state(PayloadEncoding::Single);
		let message = state.store.create("u1", "hello").await.unwrap();

		let exported = ChatHandler::export(&state).await.unwrap();

		assert_eq!(
			exported,
			json!([{ "Message": "hello", "TimeStamp": message.created_at, "UserName": "alice" }])
		);
	}

	#[tokio::test]
	async fn test_export_double_encoding() {
		let state = chat_state(PayloadEncoding::Double);
		state.store.create("u1", "hello").await.unwrap();

		let exported = ChatHandler::export(&state).await.unwrap();

		let Value::String(inner) = &exported else {
			panic!("Expected a JSON string, got {:?}", exported)
		};
		let rows: Value = serde_json::from_str(inner).unwrap();
		assert_eq!(rows[0]["Message"], "hello");
		assert_eq!(rows[0]["UserName"], "alice");
	}

	#[tokio::test]
	async fn test_post_chat() {
		let state = chat_state(PayloadEncoding::Single);
		let identity = Identity("u1".into());

		let id = ChatHandler::post_chat(
			&state,
			Some(&identity),
			AjaxChat {
				message: Some("hello".into()),
			},
		)
		.await
		.unwrap();

		assert_eq!(id, json!(1));
		assert_eq!(state.store.get(1).await.unwrap().author_id, "u1");
	}

	#[tokio::test]
	async fn test_post_blank_chat_saves_nothing() {
		let state = chat_state(PayloadEncoding::Double);
		let identity = Identity("u1".into());

		let id = ChatHandler::post_chat(&state, Some(&identity), AjaxChat { message: Some(" ".into()) })
			.await
			.unwrap();

		assert_eq!(id, json!("0"));
		assert!(state.store.list_all().await.unwrap().is_empty());
	}

	#[tokio::test]
	async fn test_post_chat_requires_identity() {
		let state = chat_state(PayloadEncoding::Single);
		let result = ChatHandler::post_chat(&state, None, AjaxChat::default()).await;
		assert!(matches!(result, Err(ServiceError::Unauthenticated)));
	}

	#[tokio::test]
	async fn test_post_chat_unknown_identity() {
		let state = chat_state(PayloadEncoding::Single);
		let identity = Identity("ghost".into());
		let result = ChatHandler::post_chat(&state, Some(&identity), AjaxChat { message: Some("x".into()) }).await;
		assert!(matches!(result, Err(ServiceError::InvalidAuthor(_))));
	}

	#[tokio::test]
	async fn test_submit_create_unknown_author_is_field_error() {
		let state = chat_state(PayloadEncoding::Single);
		let form = ChatForm {
			user_id: Some("ghost".into()),
			message: Some("x".into()),
			time_stamp: None,
		};

		match ChatHandler::submit_create(&state, &form).await {
			Err(ServiceError::ValidationFailure(errors)) => assert_eq!(errors[0].field, "UserID"),
			other => panic!("Unexpected result {:?}", other),
		}
	}

	#[tokio::test]
	async fn test_submit_edit_missing_chat() {
		let state = chat_state(PayloadEncoding::Single);
		let form = ChatForm {
			user_id: Some("u1".into()),
			message: Some("x".into()),
			time_stamp: Some("2023-05-01T10:30:00Z".into()),
		};

		let result = ChatHandler::submit_edit(&state, 42, &form).await;
		assert!(matches!(result, Err(ServiceError::EntityNotFound)));
	}
}
