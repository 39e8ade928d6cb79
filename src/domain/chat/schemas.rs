use chrono::{DateTime, NaiveDateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::Message;
use crate::services::response::{FieldError, ServiceError};

const NAIVE_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S%.f"];

/// Body of the ajax create call. Only the text is bound; author and time come from the server.
#[derive(Debug, Default, Clone, Deserialize, Serialize)]
pub struct AjaxChat {
	#[serde(rename = "Message", default)]
	pub message: Option<String>,
}

/// Raw create/edit form fields, kept as strings so a bad value re-renders the form
/// instead of rejecting the request.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct ChatForm {
	#[serde(rename = "UserID", default)]
	pub user_id: Option<String>,
	#[serde(rename = "Message", default)]
	pub message: Option<String>,
	#[serde(rename = "TimeStamp", default)]
	pub time_stamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewChat {
	pub author_id: String,
	pub text: String,
}

impl From<&Message> for ChatForm {
	fn from(value: &Message) -> Self {
		Self {
			user_id: Some(value.author_id.clone()),
			message: Some(value.text.clone()),
			time_stamp: Some(value.created_at.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
		}
	}
}

impl ChatForm {
	/// Any submitted `TimeStamp` is ignored: the store stamps new messages itself.
	pub fn validate_create(&self) -> Result<NewChat, ServiceError> {
		let mut errors = Vec::new();
		let author_id = required(&self.user_id, "UserID", &mut errors);
		let text = required(&self.message, "Message", &mut errors);

		match (author_id, text) {
			(Some(author_id), Some(text)) if errors.is_empty() => Ok(NewChat { author_id, text }),
			_ => Err(ServiceError::ValidationFailure(errors)),
		}
	}

	/// Builds the full replacement record for `id`.
	pub fn validate_edit(
		&self,
		id: i64,
	) -> Result<Message, ServiceError> {
		let mut errors = Vec::new();
		let author_id = required(&self.user_id, "UserID", &mut errors);
		let text = required(&self.message, "Message", &mut errors);
		let created_at = required(&self.time_stamp, "TimeStamp", &mut errors).and_then(|raw| {
			let parsed = parse_time_stamp(&raw);
			if parsed.is_none() {
				errors.push(FieldError::new("TimeStamp", format!("The value '{}' is not valid for TimeStamp.", raw)));
			}
			parsed
		});

		match (author_id, text, created_at) {
			(Some(author_id), Some(text), Some(created_at)) if errors.is_empty() => Ok(Message {
				id,
				author_id,
				text,
				created_at,
			}),
			_ => Err(ServiceError::ValidationFailure(errors)),
		}
	}
}

fn required(
	value: &Option<String>,
	field: &'static str,
	errors: &mut Vec<FieldError>,
) -> Option<String> {
	match value {
		Some(value) if !value.trim().is_empty() => Some(value.clone()),
		_ => {
			errors.push(FieldError::new(field, format!("The {} field is required.", field)));
			None
		}
	}
}

/// Accepts RFC 3339, or a zone-less date time which is read as UTC.
pub fn parse_time_stamp(raw: &str) -> Option<DateTime<Utc>> {
	let raw = raw.trim();
	if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
		return Some(parsed.with_timezone(&Utc));
	}
	NAIVE_FORMATS
		.iter()
		.find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
		.map(|naive| naive.and_utc())
}
