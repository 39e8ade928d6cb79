pub mod handlers;
pub mod response;

use std::sync::Arc;

use axum::http::HeaderName;
use serde::Serialize;
use serde_json::Value;

use crate::adapters::repositories::MessageStore;

use self::response::ServiceError;

/// How JSON payloads are put on the wire.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PayloadEncoding {
	#[default]
	Single,
	/// The legacy wire format: the value is serialized to a string and that string is
	/// serialized again, so clients receive a JSON string literal holding escaped JSON.
	Double,
}

impl PayloadEncoding {
	pub fn encode<T: Serialize>(
		&self,
		value: &T,
	) -> Result<Value, ServiceError> {
		match self {
			PayloadEncoding::Single => Ok(serde_json::to_value(value)?),
			PayloadEncoding::Double => Ok(Value::String(serde_json::to_string(value)?)),
		}
	}
}

#[derive(Clone)]
pub struct ChatState {
	pub store: Arc<dyn MessageStore>,
	pub encoding: PayloadEncoding,
	pub identity_header: HeaderName,
}

impl ChatState {
	pub fn new(store: Arc<dyn MessageStore>) -> Self {
		Self {
			store,
			encoding: Default::default(),
			identity_header: HeaderName::from_static(crate::config::DEFAULT_IDENTITY_HEADER),
		}
	}

	pub fn with_encoding(
		mut self,
		encoding: PayloadEncoding,
	) -> Self {
		self.encoding = encoding;
		self
	}

	pub fn with_identity_header(
		mut self,
		identity_header: HeaderName,
	) -> Self {
		self.identity_header = identity_header;
		self
	}
}

#[cfg(test)]
mod test {
	use serde_json::{json, Value};

	use super::PayloadEncoding;

	#[test]
	fn test_single_encoding() {
		assert_eq!(PayloadEncoding::Single.encode(&vec![1, 2]).unwrap(), json!([1, 2]));
		assert_eq!(PayloadEncoding::Single.encode(&5).unwrap(), json!(5));
	}

	#[test]
	fn test_double_encoding() {
		let encoded = PayloadEncoding::Double.encode(&json!([{ "Message": "hi" }])).unwrap();
		assert_eq!(encoded, Value::String(r#"[{"Message":"hi"}]"#.to_string()));
		assert_eq!(serde_json::to_string(&encoded).unwrap(), r#""[{\"Message\":\"hi\"}]""#);
		assert_eq!(PayloadEncoding::Double.encode(&5).unwrap(), json!("5"));
	}
}
