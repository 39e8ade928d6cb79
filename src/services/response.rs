use std::fmt::Display;

use axum::{
	http::StatusCode,
	response::{IntoResponse, Response},
	Json,
};
use serde::Serialize;

pub type AnyError = dyn std::error::Error + Send + Sync;

/// A single field-level message surfaced on a re-rendered form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
	pub field: &'static str,
	pub message: String,
}

impl FieldError {
	pub fn new(
		field: &'static str,
		message: impl Into<String>,
	) -> Self {
		Self {
			field,
			message: message.into(),
		}
	}
}

#[derive(Debug)]
pub enum ServiceError {
	EntityNotFound,
	InvalidAuthor(String),
	ValidationFailure(Vec<FieldError>),
	Unauthenticated,
	BadRequest,
	InvalidURL,
	ConfigError(String),
	SerializationError(Box<AnyError>),
	DatabaseError(Box<AnyError>),
	HttpError(Box<AnyError>),
}

impl Display for ServiceError {
	fn fmt(
		&self,
		f: &mut std::fmt::Formatter<'_>,
	) -> std::fmt::Result {
		match self {
			ServiceError::EntityNotFound => write!(f, "EntityNotFound"),
			ServiceError::InvalidAuthor(id) => write!(f, "InvalidAuthor: no user with id `{}`", id),
			ServiceError::ValidationFailure(errors) => {
				write!(f, "ValidationFailure:")?;
				for err in errors {
					write!(f, " {}: {};", err.field, err.message)?;
				}
				Ok(())
			}
			ServiceError::Unauthenticated => write!(f, "Unauthenticated"),
			ServiceError::BadRequest => write!(f, "BadRequest"),
			ServiceError::InvalidURL => write!(f, "InvalidURL"),
			ServiceError::ConfigError(res) => write!(f, "ConfigError: {}", res),
			ServiceError::SerializationError(res) => write!(f, "{}", res),
			ServiceError::DatabaseError(res) => write!(f, "{}", res),
			ServiceError::HttpError(res) => write!(f, "{}", res),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(value: sqlx::Error) -> Self {
		match value {
			sqlx::Error::RowNotFound => ServiceError::EntityNotFound,
			err => ServiceError::DatabaseError(Box::new(err)),
		}
	}
}

impl From<sqlx::migrate::MigrateError> for ServiceError {
	fn from(value: sqlx::migrate::MigrateError) -> Self {
		ServiceError::DatabaseError(Box::new(value))
	}
}

impl From<serde_json::Error> for ServiceError {
	fn from(value: serde_json::Error) -> Self {
		ServiceError::SerializationError(Box::new(value))
	}
}

#[derive(Serialize)]
struct ErrorBody {
	error: String,
	#[serde(skip_serializing_if = "Vec::is_empty")]
	fields: Vec<FieldError>,
}

impl ServiceError {
	pub fn status_code(&self) -> StatusCode {
		match self {
			ServiceError::EntityNotFound => StatusCode::NOT_FOUND,
			ServiceError::InvalidAuthor(_) | ServiceError::ValidationFailure(_) => StatusCode::UNPROCESSABLE_ENTITY,
			ServiceError::Unauthenticated => StatusCode::UNAUTHORIZED,
			ServiceError::BadRequest => StatusCode::BAD_REQUEST,
			_ => StatusCode::INTERNAL_SERVER_ERROR,
		}
	}
}

impl IntoResponse for ServiceError {
	fn into_response(self) -> Response {
		let status = self.status_code();
		if status.is_server_error() {
			tracing::error!("Request failed: {}", self);
		} else {
			tracing::debug!("Request rejected with {}: {}", status, self);
		}

		let fields = match &self {
			ServiceError::ValidationFailure(errors) => errors.clone(),
			_ => Vec::new(),
		};
		// Internal details stay in the log.
		let error = if status.is_server_error() {
			String::from("InternalServerError")
		} else {
			self.to_string()
		};

		(status, Json(ErrorBody { error, fields })).into_response()
	}
}
