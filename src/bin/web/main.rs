use std::{net::SocketAddr, str::FromStr};

use axum::http::{header, Method};

use chatter::{config::Config, dependencies::chat_state, routes::create_routes, services::response::ServiceError};
use tower::ServiceBuilder;
use tower_http::{
	cors::{AllowOrigin, CorsLayer},
	trace::TraceLayer,
};

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), ServiceError> {
	let config = Config::new()?;

	// ! Tracing
	let default_filter = format!("chatter={level},web={level},tower_http=debug,axum::rejection=trace", level = config.log_level);
	tracing_subscriber::registry()
		.with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
			// axum logs rejections from built-in extractors with the `axum::rejection`
			// target, at `TRACE` level. `axum::rejection=trace` enables showing those events
			default_filter.into()
		}))
		.with(tracing_subscriber::fmt::layer())
		.init();

	// ! Connection
	tracing::info!("Setting up the message store...");
	let state = chat_state(&config).await?;

	let app = create_routes(state).layer(
		ServiceBuilder::new().layer(TraceLayer::new_for_http()).layer(
			CorsLayer::new()
				.allow_origin(AllowOrigin::list(config.allowed_origins()))
				.allow_methods([Method::GET, Method::POST])
				.allow_headers([header::CONTENT_TYPE, config.identity_header.clone()]),
		),
	);

	let addr = SocketAddr::from_str(&config.server_ip_port).map_err(|_| ServiceError::InvalidURL)?;
	tracing::info!("Start Web Server on {}...", addr);
	axum::Server::bind(&addr)
		.serve(app.into_make_service())
		.await
		.map_err(|err| ServiceError::HttpError(Box::new(err)))
}
