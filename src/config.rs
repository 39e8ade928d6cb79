use axum::http::{HeaderName, HeaderValue};

use crate::{
	domain::chat::User,
	services::{response::ServiceError, PayloadEncoding},
};

pub const DEFAULT_IDENTITY_HEADER: &str = "x-user-id";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
	Postgres { database_url: String, max_connections: u32 },
	/// Seeded users stand in for the identity provider's user table.
	Memory { seed_users: Vec<User> },
}

pub struct Config {
	/// Which errors we want to log
	pub log_level: String,

	/// Port server is listening to
	pub server_ip_port: String,
	pub allow_origins: String,
	pub store_backend: StoreBackend,
	/// Request header carrying the caller identity
	pub identity_header: HeaderName,
	pub encoding: PayloadEncoding,
}

impl Config {
	pub fn new() -> Result<Config, ServiceError> {
		dotenv::dotenv().ok();
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Config, ServiceError> {
		let log_level = lookup("LOG_LEVEL").unwrap_or("info".to_string());
		let server_ip_port = lookup("SERVER_IP_PORT").unwrap_or("0.0.0.0:80".into());
		let allow_origins = lookup("ALLOW_ORIGINS").unwrap_or("http://localhost:3000,http://localhost:3001".to_string());

		let store_backend = match lookup("STORE_BACKEND").as_deref().unwrap_or("postgres") {
			"postgres" => StoreBackend::Postgres {
				database_url: lookup("DATABASE_URL").ok_or_else(|| ServiceError::ConfigError("DATABASE_URL must be set!".into()))?,
				max_connections: match lookup("DATABASE_MAX_CONNECTIONS") {
					Some(raw) => raw
						.parse()
						.map_err(|_| ServiceError::ConfigError(format!("DATABASE_MAX_CONNECTIONS `{}` is not a number", raw)))?,
					None => 30,
				},
			},
			"memory" => StoreBackend::Memory {
				seed_users: parse_seed_users(&lookup("SEED_USERS").unwrap_or_default())?,
			},
			other => return Err(ServiceError::ConfigError(format!("Unknown STORE_BACKEND `{}`", other))),
		};

		let identity_header = lookup("IDENTITY_HEADER").unwrap_or(DEFAULT_IDENTITY_HEADER.into());
		let identity_header = HeaderName::try_from(identity_header.as_str())
			.map_err(|_| ServiceError::ConfigError(format!("IDENTITY_HEADER `{}` is not a valid header name", identity_header)))?;

		let encoding = match lookup("LEGACY_DOUBLE_ENCODING").as_deref().map(str::to_ascii_lowercase).as_deref() {
			None | Some("false") | Some("0") | Some("no") => PayloadEncoding::Single,
			Some("true") | Some("1") | Some("yes") => PayloadEncoding::Double,
			Some(other) => return Err(ServiceError::ConfigError(format!("LEGACY_DOUBLE_ENCODING `{}` is not a boolean", other))),
		};

		Ok(Config {
			log_level,
			server_ip_port,
			allow_origins,
			store_backend,
			identity_header,
			encoding,
		})
	}

	/// Origins that fail to parse are skipped with a warning.
	pub fn allowed_origins(&self) -> Vec<HeaderValue> {
		self.allow_origins
			.split(',')
			.map(str::trim)
			.filter(|origin| !origin.is_empty())
			.filter_map(|origin| match origin.parse::<HeaderValue>() {
				Ok(value) => Some(value),
				Err(_) => {
					tracing::warn!("Ignoring invalid origin `{}`", origin);
					None
				}
			})
			.collect()
	}
}

/// `id:username:email` entries separated by `;`.
fn parse_seed_users(raw: &str) -> Result<Vec<User>, ServiceError> {
	raw.split(';')
		.map(str::trim)
		.filter(|entry| !entry.is_empty())
		.map(|entry| {
			let mut parts = entry.splitn(3, ':').map(str::trim);
			match (parts.next(), parts.next(), parts.next()) {
				(Some(id), Some(username), Some(email)) if !id.is_empty() => Ok(User {
					id: id.to_string(),
					username: username.to_string(),
					email: email.to_string(),
				}),
				_ => Err(ServiceError::ConfigError(format!("SEED_USERS entry `{}` must look like id:username:email", entry))),
			}
		})
		.collect()
}

#[cfg(test)]
mod test {
	use std::collections::HashMap;

	use super::{Config, StoreBackend};
	use crate::services::{response::ServiceError, PayloadEncoding};

	fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ServiceError> {
		let vars: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		Config::from_lookup(|key| vars.get(key).cloned())
	}

	#[test]
	fn test_defaults_with_postgres() {
		let config = config_from(&[("DATABASE_URL", "postgres://localhost/chatter")]).unwrap();

		assert_eq!(config.server_ip_port, "0.0.0.0:80");
		assert_eq!(config.identity_header.as_str(), "x-user-id");
		assert_eq!(config.encoding, PayloadEncoding::Single);
		assert_eq!(
			config.store_backend,
			StoreBackend::Postgres {
				database_url: "postgres://localhost/chatter".into(),
				max_connections: 30,
			}
		);
		assert_eq!(config.allowed_origins().len(), 2);
	}

	#[test]
	fn test_postgres_requires_database_url() {
		assert!(matches!(config_from(&[]), Err(ServiceError::ConfigError(_))));
	}

	#[test]
	fn test_memory_backend_with_seed_users() {
		let config = config_from(&[
			("STORE_BACKEND", "memory"),
			("SEED_USERS", "u1:alice:alice@example.com; u2:bob:bob@example.com"),
			("LEGACY_DOUBLE_ENCODING", "TRUE"),
			("IDENTITY_HEADER", "X-Remote-User"),
		])
		.unwrap();

		let StoreBackend::Memory { seed_users } = config.store_backend else {
			panic!("Expected memory backend");
		};
		assert_eq!(seed_users.len(), 2);
		assert_eq!(seed_users[1].username, "bob");
		assert_eq!(config.encoding, PayloadEncoding::Double);
		assert_eq!(config.identity_header.as_str(), "x-remote-user");
	}

	#[test]
	fn test_rejects_bad_values() {
		assert!(config_from(&[("STORE_BACKEND", "redis")]).is_err());
		assert!(config_from(&[("STORE_BACKEND", "memory"), ("SEED_USERS", "u1-alice")]).is_err());
		assert!(config_from(&[("STORE_BACKEND", "memory"), ("LEGACY_DOUBLE_ENCODING", "maybe")]).is_err());
		assert!(config_from(&[("DATABASE_URL", "postgres://x"), ("DATABASE_MAX_CONNECTIONS", "many")]).is_err());
	}
}
