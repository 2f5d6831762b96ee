pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid request: {message}")]
	InvalidRequest { message: String },
	#[error("Not found: {message}")]
	NotFound { message: String },
	#[error("Conflict: {message}")]
	Conflict { message: String },
	#[error("Policy error: {message}")]
	Policy { message: String },
	#[error("Provider error: {message}")]
	Provider { message: String },
	#[error("Storage error: {message}")]
	Storage { message: String },
	#[error("I/O error: {message}")]
	Io { message: String },
}
impl From<std::io::Error> for Error {
	fn from(err: std::io::Error) -> Self {
		Self::Io { message: err.to_string() }
	}
}

impl From<warden_providers::Error> for Error {
	fn from(err: warden_providers::Error) -> Self {
		Self::Provider { message: err.to_string() }
	}
}

impl From<warden_domain::Error> for Error {
	fn from(err: warden_domain::Error) -> Self {
		match err {
			warden_domain::Error::ReadPolicy { .. } | warden_domain::Error::ParsePolicy { .. } =>
				Self::Policy { message: format!("{err}: {}", error_source(&err)) },
			warden_domain::Error::InvalidMetadata { message } => Self::InvalidRequest { message },
		}
	}
}

impl From<warden_storage::Error> for Error {
	fn from(err: warden_storage::Error) -> Self {
		match err {
			warden_storage::Error::InvalidArgument(message) => Self::InvalidRequest { message },
			warden_storage::Error::NotFound(message) => Self::NotFound { message },
			warden_storage::Error::Conflict(message) => Self::Conflict { message },
			warden_storage::Error::Provider(inner) => inner.into(),
			warden_storage::Error::Domain(inner) => inner.into(),
			warden_storage::Error::Sqlite(inner) => Self::Storage { message: inner.to_string() },
			warden_storage::Error::Json(inner) => Self::Storage { message: inner.to_string() },
			warden_storage::Error::Io(inner) => Self::Storage { message: inner.to_string() },
		}
	}
}

fn error_source(err: &dyn std::error::Error) -> String {
	err.source().map(|source| source.to_string()).unwrap_or_default()
}
