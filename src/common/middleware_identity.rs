use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::{domain::chat::Identity, services::ChatState};

/// Lifts the caller identity from the configured header into a request extension.
///
/// Requests without the header pass through untouched; handlers that need an author decide
/// how to reject them.
pub async fn set_identity<B>(
	State(state): State<ChatState>,
	mut request: Request<B>,
	next: Next<B>,
) -> Response {
	let identity = request
		.headers()
		.get(&state.identity_header)
		.and_then(|value| value.to_str().ok())
		.map(str::trim)
		.filter(|value| !value.is_empty())
		.map(|value| Identity(value.to_owned()));

	if let Some(identity) = identity {
		let extensions = request.extensions_mut();
		extensions.insert(identity);
	}

	next.run(request).await
}
