mod error;

pub use error::{Error, Result};

use std::{
	env, fs,
	path::{Path, PathBuf},
};

use serde_json::Value;
use uuid::Uuid;

use warden_config::{
	Config, Embedding, INDEX_MODE_EPHEMERAL, INDEX_MODE_PERSISTENT, Index, Policy, Resources,
	Search, Service, Storage,
};

pub const TEST_DIMENSIONS: u32 = 256;

/// A throwaway directory holding a policy file, a resources directory and an index directory.
/// Everything is removed on drop.
pub struct TestWorkspace {
	root: PathBuf,
	cleaned: bool,
}
impl TestWorkspace {
	pub fn new() -> Result<Self> {
		let root = env::temp_dir().join(format!("warden_test_{}", Uuid::new_v4().simple()));

		fs::create_dir_all(root.join("resources"))?;
		fs::create_dir_all(root.join("config"))?;

		Ok(Self { root, cleaned: false })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn resources_dir(&self) -> PathBuf {
		self.root.join("resources")
	}

	pub fn policy_path(&self) -> PathBuf {
		self.root.join("config").join("acl.json")
	}

	pub fn index_dir(&self) -> PathBuf {
		self.root.join("index")
	}

	/// Policy key for a file under the resources directory, matching the paths directory
	/// ingestion records.
	pub fn resource_key(&self, name: &str) -> String {
		self.resources_dir().join(name).to_string_lossy().into_owned()
	}

	pub fn write_policy(&self, policy: &Value) -> Result<PathBuf> {
		let path = self.policy_path();

		fs::write(&path, serde_json::to_vec_pretty(policy)?)?;

		Ok(path)
	}

	pub fn write_resource(&self, name: &str, content: &str) -> Result<PathBuf> {
		if name.contains(['/', '\\']) {
			return Err(Error::Message(format!("Resource name {name:?} must be a bare file name.")));
		}

		let path = self.resources_dir().join(name);

		fs::write(&path, content)?;

		Ok(path)
	}

	/// Builds a config pointing at this workspace. `persistent` selects the SQLite index under
	/// `index_dir()`.
	pub fn config(&self, persistent: bool) -> Config {
		let (mode, path) = if persistent {
			(INDEX_MODE_PERSISTENT, Some(self.index_dir()))
		} else {
			(INDEX_MODE_EPHEMERAL, None)
		};

		Config {
			service: Service { log_level: "info".to_string() },
			storage: Storage {
				collection: "resources_db".to_string(),
				index: Index { mode: mode.to_string(), path, metric: "l2".to_string() },
			},
			embedding: Embedding { dimensions: TEST_DIMENSIONS },
			policy: Policy { path: self.policy_path() },
			resources: Resources { dir: self.resources_dir() },
			search: Search { default_limit: 5, default_strategy: "filter_first".to_string() },
		}
	}

	pub fn cleanup(mut self) -> Result<()> {
		self.cleanup_inner()
	}

	fn cleanup_inner(&mut self) -> Result<()> {
		if self.cleaned {
			return Ok(());
		}

		fs::remove_dir_all(&self.root)?;

		self.cleaned = true;

		Ok(())
	}
}
impl Drop for TestWorkspace {
	fn drop(&mut self) {
		if let Err(err) = self.cleanup_inner() {
			eprintln!("Test workspace cleanup failed: {err}.");
		}
	}
}
