//! Server-rendered pages for the chat routes.
//!
//! Every piece of user-controlled text goes through [`escape`] before it is written into markup.

use axum::response::Html;
use chrono::SecondsFormat;

use crate::{
	domain::chat::{schemas::ChatForm, ChatListItem, Message, User},
	services::response::FieldError,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FormKind {
	Create,
	Edit(i64),
}

pub fn escape(raw: &str) -> String {
	let mut escaped = String::with_capacity(raw.len());
	for c in raw.chars() {
		match c {
			'&' => escaped.push_str("&amp;"),
			'<' => escaped.push_str("&lt;"),
			'>' => escaped.push_str("&gt;"),
			'"' => escaped.push_str("&quot;"),
			'\'' => escaped.push_str("&#x27;"),
			c => escaped.push(c),
		}
	}
	escaped
}

fn layout(
	title: &str,
	body: &str,
) -> Html<String> {
	Html(format!(
		"<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{title} - Chats</title></head>\n<body>\n<h2>{title}</h2>\n{body}</body>\n</html>\n",
		title = escape(title),
		body = body
	))
}

fn time_stamp(message: &Message) -> String {
	message.created_at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

pub fn index(chats: &[ChatListItem]) -> Html<String> {
	let mut body = String::from("<p><a href=\"/chats/create\">Create New</a></p>\n<table>\n<tr><th>User</th><th>Message</th><th>TimeStamp</th><th></th></tr>\n");
	for chat in chats {
		let id = chat.message.id;
		body.push_str(&format!(
			"<tr><td>{}</td><td>{}</td><td>{}</td><td><a href=\"/chats/edit/{id}\">Edit</a> | <a href=\"/chats/{id}\">Details</a> | <a href=\"/chats/delete/{id}\">Delete</a></td></tr>",
			escape(chat.author_name.as_deref().unwrap_or("")),
			escape(&chat.message.text),
			time_stamp(&chat.message),
		));
	}
	body.push_str("</table>\n");
	layout("Index", &body)
}

fn message_fields(message: &Message) -> String {
	format!(
		"<dl>\n<dt>UserID</dt><dd>{}</dd>\n<dt>Message</dt><dd>{}</dd>\n<dt>TimeStamp</dt><dd>{}</dd>\n</dl>\n",
		escape(&message.author_id),
		escape(&message.text),
		time_stamp(message),
	)
}

pub fn details(message: &Message) -> Html<String> {
	let body = format!(
		"{}<p><a href=\"/chats/edit/{}\">Edit</a> | <a href=\"/chats\">Back to List</a></p>\n",
		message_fields(message),
		message.id
	);
	layout("Details", &body)
}

pub fn delete_confirm(message: &Message) -> Html<String> {
	let body = format!(
		"<h3>Are you sure you want to delete this?</h3>\n{}<form method=\"post\" action=\"/chats/delete/{}\"><input type=\"submit\" value=\"Delete\"> | <a href=\"/chats\">Back to List</a></form>\n",
		message_fields(message),
		message.id
	);
	layout("Delete", &body)
}

fn field_errors(
	errors: &[FieldError],
	field: &str,
) -> String {
	errors
		.iter()
		.filter(|err| err.field == field)
		.map(|err| format!("<span class=\"field-validation-error\">{}</span>", escape(&err.message)))
		.collect()
}

pub fn chat_form(
	kind: FormKind,
	form: &ChatForm,
	errors: &[FieldError],
	users: &[User],
) -> Html<String> {
	let (title, action) = match kind {
		FormKind::Create => ("Create", String::from("/chats")),
		FormKind::Edit(id) => ("Edit", format!("/chats/edit/{}", id)),
	};
	let selected = form.user_id.as_deref().unwrap_or("");

	let mut body = format!("<form method=\"post\" action=\"{}\">\n", action);

	body.push_str("<div><label for=\"UserID\">UserID</label><select id=\"UserID\" name=\"UserID\">");
	for user in users {
		body.push_str(&format!(
			"<option value=\"{}\"{}>{}</option>",
			escape(&user.id),
			if user.id == selected { " selected" } else { "" },
			escape(&user.email),
		));
	}
	body.push_str(&format!("</select>{}</div>\n", field_errors(errors, "UserID")));

	body.push_str(&format!(
		"<div><label for=\"Message\">Message</label><input id=\"Message\" name=\"Message\" type=\"text\" value=\"{}\">{}</div>\n",
		escape(form.message.as_deref().unwrap_or("")),
		field_errors(errors, "Message"),
	));

	if let FormKind::Edit(_) = kind {
		body.push_str(&format!(
			"<div><label for=\"TimeStamp\">TimeStamp</label><input id=\"TimeStamp\" name=\"TimeStamp\" type=\"text\" value=\"{}\">{}</div>\n",
			escape(form.time_stamp.as_deref().unwrap_or("")),
			field_errors(errors, "TimeStamp"),
		));
	}

	body.push_str(&format!(
		"<input type=\"submit\" value=\"{}\">\n</form>\n",
		if kind == FormKind::Create { "Create" } else { "Save" }
	));
	body.push_str("<p><a href=\"/chats\">Back to List</a></p>\n");
	layout(title, &body)
}

#[cfg(test)]
mod test {
	use chrono::{TimeZone, Utc};

	use super::{chat_form, escape, index, FormKind};
	use crate::{
		domain::chat::{schemas::ChatForm, ChatListItem, Message, User},
		services::response::FieldError,
	};

	#[test]
	fn test_escape() {
		assert_eq!(escape(r#"<b a="x">&'"#), "&lt;b a=&quot;x&quot;&gt;&amp;&#x27;");
	}

	#[test]
	fn test_index_escapes_messages() {
		let chats = vec![ChatListItem {
			message: Message {
				id: 3,
				author_id: "u1".into(),
				text: "<script>".into(),
				created_at: Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 0).unwrap(),
			},
			author_name: Some("alice".into()),
		}];

		let page = index(&chats).0;
		assert!(page.contains("&lt;script&gt;"));
		assert!(!page.contains("<script>"));
		assert!(page.contains("/chats/edit/3"));
		assert!(page.contains("2023-05-01T10:30:00Z"));
	}

	#[test]
	fn test_pages_render_every_row_and_field() {
		let message = Message {
			id: 7,
			author_id: "u1".into(),
			text: "hi".into(),
			created_at: Utc.with_ymd_and_hms(2023, 5, 1, 10, 30, 0).unwrap(),
		};
		let chats = vec![ChatListItem {
			message: message.clone(),
			author_name: None,
		}];

		let page = index(&chats).0;
		assert!(page.contains(
			"<tr><td></td><td>hi</td><td>2023-05-01T10:30:00Z</td><td><a href=\"/chats/edit/7\">Edit</a> | <a href=\"/chats/7\">Details</a> | <a href=\"/chats/delete/7\">Delete</a></td></tr>"
		));

		let form = ChatForm::from(&message);
		let errors = vec![FieldError::new("TimeStamp", "bad")];
		let page = chat_form(FormKind::Edit(7), &form, &errors, &[]).0;
		assert!(page.contains("</select></div>\n"));
		assert!(page.contains("name=\"Message\" type=\"text\" value=\"hi\"></div>\n"));
		assert!(page.contains("value=\"2023-05-01T10:30:00Z\"><span class=\"field-validation-error\">bad</span></div>\n"));
		assert!(page.contains("<input type=\"submit\" value=\"Save\">\n</form>\n"));

		let page = chat_form(FormKind::Create, &ChatForm::default(), &[], &[]).0;
		assert!(page.contains("<input type=\"submit\" value=\"Create\">"));
	}

	#[test]
	fn test_form_renders_errors_and_selection() {
		let users = vec![
			User {
				id: "u1".into(),
				username: "alice".into(),
				email: "alice@example.com".into(),
			},
			User {
				id: "u2".into(),
				username: "bob".into(),
				email: "bob@example.com".into(),
			},
		];
		let form = ChatForm {
			user_id: Some("u2".into()),
			..Default::default()
		};
		let errors = vec![FieldError::new("Message", "The Message field is required.")];

		let page = chat_form(FormKind::Create, &form, &errors, &users).0;
		assert!(page.contains("<option value=\"u2\" selected>bob@example.com</option>"));
		assert!(page.contains("The Message field is required."));
		assert!(!page.contains("name=\"TimeStamp\""));

		let page = chat_form(FormKind::Edit(4), &form, &[], &users).0;
		assert!(page.contains("action=\"/chats/edit/4\""));
		assert!(page.contains("name=\"TimeStamp\""));
	}
}
