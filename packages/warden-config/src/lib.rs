mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, Embedding, INDEX_MODE_EPHEMERAL, INDEX_MODE_PERSISTENT, Index, Policy, Resources,
	Search, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.storage.collection.is_empty() {
		return Err(Error::Validation {
			message: "storage.collection must be non-empty.".to_string(),
		});
	}

	match cfg.storage.index.mode.as_str() {
		INDEX_MODE_EPHEMERAL => {},
		INDEX_MODE_PERSISTENT =>
			if cfg.storage.index.path.is_none() {
				return Err(Error::Validation {
					message: "storage.index.path is required when storage.index.mode is persistent."
						.to_string(),
				});
			},
		_ => {
			return Err(Error::Validation {
				message: "storage.index.mode must be one of ephemeral or persistent.".to_string(),
			});
		},
	}

	if !matches!(cfg.storage.index.metric.as_str(), "l2" | "cosine" | "ip") {
		return Err(Error::Validation {
			message: "storage.index.metric must be one of l2, cosine, or ip.".to_string(),
		});
	}
	if cfg.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.policy.path.as_os_str().is_empty() {
		return Err(Error::Validation { message: "policy.path must be non-empty.".to_string() });
	}
	if cfg.resources.dir.as_os_str().is_empty() {
		return Err(Error::Validation { message: "resources.dir must be non-empty.".to_string() });
	}
	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if !matches!(cfg.search.default_strategy.as_str(), "filter_first" | "query_first") {
		return Err(Error::Validation {
			message: "search.default_strategy must be one of filter_first or query_first."
				.to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for value in [
		&mut cfg.service.log_level,
		&mut cfg.storage.collection,
		&mut cfg.storage.index.mode,
		&mut cfg.storage.index.metric,
		&mut cfg.search.default_strategy,
	] {
		let trimmed = value.trim();

		if trimmed.len() != value.len() {
			*value = trimmed.to_string();
		}
	}

	if let Some(path) = cfg.storage.index.path.as_deref()
		&& path.to_string_lossy().trim().is_empty()
	{
		cfg.storage.index.path = None;
	}
}
