pub mod views;

use axum::{
	body::Body,
	extract::{FromRequest, Path, State},
	http::{header, Request, StatusCode},
	middleware,
	response::{Html, IntoResponse, Response},
	routing::get,
	Extension, Form, Json, Router,
};
use serde_json::Value;

use self::views::FormKind;
use crate::{
	common::middleware_identity::set_identity,
	domain::chat::{
		schemas::{AjaxChat, ChatForm},
		Identity,
	},
	services::{
		handlers::ChatHandler,
		response::{FieldError, ServiceError},
		ChatState,
	},
};

pub fn create_routes(state: ChatState) -> Router<(), Body> {
	Router::new()
		.route("/chats", get(list_chats).post(post_chats))
		.route("/chats/export", get(export_chats))
		.route("/chats/create", get(create_chat_form))
		.route("/chats/edit", get(missing_id))
		.route("/chats/edit/:id", get(edit_chat_form).post(edit_chat))
		.route("/chats/delete", get(missing_id))
		.route("/chats/delete/:id", get(delete_chat_form).post(delete_chat))
		.route("/chats/:id", get(chat_details))
		.layer(middleware::from_fn_with_state(state.clone(), set_identity))
		.with_state(state)
}

fn redirect_to_index() -> Response {
	(StatusCode::FOUND, [(header::LOCATION, "/chats")]).into_response()
}

async fn render_form(
	state: &ChatState,
	kind: FormKind,
	form: &ChatForm,
	errors: &[FieldError],
) -> Result<Html<String>, ServiceError> {
	let users = state.store.list_users().await?;
	Ok(views::chat_form(kind, form, errors, &users))
}

async fn missing_id() -> ServiceError {
	ServiceError::BadRequest
}

async fn list_chats(State(state): State<ChatState>) -> Result<Html<String>, ServiceError> {
	let chats = state.store.list_all().await?;
	Ok(views::index(&chats))
}

async fn export_chats(State(state): State<ChatState>) -> Result<Json<Value>, ServiceError> {
	Ok(Json(ChatHandler::export(&state).await?))
}

/// JSON bodies are the ajax create; anything else is the HTML create form.
async fn post_chats(
	State(state): State<ChatState>,
	identity: Option<Extension<Identity>>,
	request: Request<Body>,
) -> Response {
	let is_json = request
		.headers()
		.get(header::CONTENT_TYPE)
		.and_then(|value| value.to_str().ok())
		.map(|value| value.starts_with("application/json"))
		.unwrap_or(false);

	if is_json {
		// A body that does not bind is an unsaved chat, same as a blank message.
		let chat = match Json::<AjaxChat>::from_request(request, &state).await {
			Ok(Json(chat)) => chat,
			Err(rejection) => {
				tracing::debug!("Ajax chat body did not bind: {}", rejection.body_text());
				AjaxChat::default()
			}
		};
		let identity = identity.map(|Extension(identity)| identity);
		return match ChatHandler::post_chat(&state, identity.as_ref(), chat).await {
			Ok(id) => Json(id).into_response(),
			Err(err) => err.into_response(),
		};
	}

	let Form(form) = match Form::<ChatForm>::from_request(request, &state).await {
		Ok(form) => form,
		Err(rejection) => return rejection.into_response(),
	};
	match ChatHandler::submit_create(&state, &form).await {
		Ok(_) => redirect_to_index(),
		Err(ServiceError::ValidationFailure(errors)) => render_form(&state, FormKind::Create, &form, &errors).await.into_response(),
		Err(err) => err.into_response(),
	}
}

async fn chat_details(
	State(state): State<ChatState>,
	Path(id): Path<i64>,
) -> Result<Html<String>, ServiceError> {
	let message = state.store.get(id).await?;
	Ok(views::details(&message))
}

async fn create_chat_form(State(state): State<ChatState>) -> Result<Html<String>, ServiceError> {
	render_form(&state, FormKind::Create, &ChatForm::default(), &[]).await
}

async fn edit_chat_form(
	State(state): State<ChatState>,
	Path(id): Path<i64>,
) -> Result<Html<String>, ServiceError> {
	let message = state.store.get(id).await?;
	render_form(&state, FormKind::Edit(id), &ChatForm::from(&message), &[]).await
}

async fn edit_chat(
	State(state): State<ChatState>,
	Path(id): Path<i64>,
	Form(form): Form<ChatForm>,
) -> Response {
	match ChatHandler::submit_edit(&state, id, &form).await {
		Ok(_) => redirect_to_index(),
		Err(ServiceError::ValidationFailure(errors)) => render_form(&state, FormKind::Edit(id), &form, &errors).await.into_response(),
		Err(err) => err.into_response(),
	}
}

async fn delete_chat_form(
	State(state): State<ChatState>,
	Path(id): Path<i64>,
) -> Result<Html<String>, ServiceError> {
	let message = state.store.get(id).await?;
	Ok(views::delete_confirm(&message))
}

async fn delete_chat(
	State(state): State<ChatState>,
	Path(id): Path<i64>,
) -> Result<Response, ServiceError> {
	state.store.delete(id).await?;
	Ok(redirect_to_index())
}
