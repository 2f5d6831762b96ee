pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Failed to read access policy at {path:?}.")]
	ReadPolicy { path: std::path::PathBuf, source: std::io::Error },
	#[error("Failed to parse access policy.")]
	ParsePolicy { source: serde_json::Error },
	#[error("{message}")]
	InvalidMetadata { message: String },
}
