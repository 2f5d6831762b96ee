use std::path::PathBuf;

use serde::Deserialize;

pub const INDEX_MODE_EPHEMERAL: &str = "ephemeral";
pub const INDEX_MODE_PERSISTENT: &str = "persistent";

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub embedding: Embedding,
	pub policy: Policy,
	pub resources: Resources,
	pub search: Search,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Service {
	#[serde(default = "default_log_level")]
	pub log_level: String,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Storage {
	pub collection: String,
	pub index: Index,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Index {
	/// Either "ephemeral" (in-memory, dropped with the handle) or "persistent" (SQLite under
	/// `path`).
	pub mode: String,
	/// Directory holding the persistent index. Two handles opened on the same directory and
	/// collection address the same records.
	pub path: Option<PathBuf>,
	#[serde(default = "default_metric")]
	pub metric: String,
}
impl Index {
	pub fn is_persistent(&self) -> bool {
		self.mode == INDEX_MODE_PERSISTENT
	}
}

#[derive(Clone, Debug, Deserialize)]
pub struct Embedding {
	pub dimensions: u32,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Policy {
	pub path: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Resources {
	pub dir: PathBuf,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Search {
	#[serde(default = "default_limit")]
	pub default_limit: u32,
	#[serde(default = "default_strategy")]
	pub default_strategy: String,
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_metric() -> String {
	"l2".to_string()
}

fn default_limit() -> u32 {
	5
}

fn default_strategy() -> String {
	"filter_first".to_string()
}
