//! Resource-level access control lists.
//!
//! A policy document maps each resource path to the actions every principal may perform on it,
//! and names the principals the system knows about:
//!
//! ```json
//! {
//!   "resources": { "resources/report.txt": { "user1": ["read", "write"] } },
//!   "users": { "user1": { "name": "User One" } }
//! }
//! ```

use std::{
	collections::{BTreeMap, BTreeSet},
	fs, io,
	path::Path,
};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{Error, Result};

/// Principal to granted actions, for a single resource.
pub type ResourcePermissions = BTreeMap<String, BTreeSet<String>>;

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct PolicyDocument {
	#[serde(default)]
	pub resources: BTreeMap<String, ResourcePermissions>,
	#[serde(default)]
	pub users: BTreeMap<String, Value>,
}

#[derive(Clone, Debug, Default)]
pub struct AccessPolicy {
	document: PolicyDocument,
}
impl AccessPolicy {
	/// Loads the policy at `path`. A missing file yields the empty policy, which grants nothing.
	pub fn load(path: &Path) -> Result<Self> {
		let raw = match fs::read_to_string(path) {
			Ok(raw) => raw,
			Err(err) if err.kind() == io::ErrorKind::NotFound => {
				tracing::warn!(
					path = %path.display(),
					"Access policy file not found. Granting nothing."
				);

				return Ok(Self::empty());
			},
			Err(err) => return Err(Error::ReadPolicy { path: path.to_path_buf(), source: err }),
		};

		Self::from_json_str(&raw)
	}

	pub fn from_json_str(raw: &str) -> Result<Self> {
		let document =
			serde_json::from_str(raw).map_err(|err| Error::ParsePolicy { source: err })?;

		Ok(Self::from_document(document))
	}

	pub fn from_document(document: PolicyDocument) -> Self {
		Self { document }
	}

	pub fn empty() -> Self {
		Self::default()
	}

	/// Returns the grants for `resource`, or an empty mapping when the resource is unknown.
	pub fn get_permissions(&self, resource: &str) -> ResourcePermissions {
		self.document.resources.get(resource).cloned().unwrap_or_default()
	}

	pub fn can_access(&self, principal: &str, resource: &str, action: &str) -> bool {
		self.document
			.resources
			.get(resource)
			.and_then(|grants| grants.get(principal))
			.is_some_and(|actions| actions.contains(action))
	}

	pub fn known_principals(&self) -> BTreeSet<String> {
		self.document.users.keys().cloned().collect()
	}

	pub fn resource_ids(&self) -> impl Iterator<Item = &str> {
		self.document.resources.keys().map(String::as_str)
	}

	pub fn users(&self) -> &BTreeMap<String, Value> {
		&self.document.users
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	const POLICY: &str = r#"{
		"version": "1.0",
		"description": "Test ACL",
		"resources": {
			"test/file1.txt": { "user1": ["read", "write"], "user2": ["read"] },
			"test/file2.txt": { "user3": [] }
		},
		"users": {
			"user1": { "name": "User One" },
			"user2": { "name": "User Two" }
		}
	}"#;

	#[test]
	fn unknown_top_level_keys_are_ignored() {
		let policy = AccessPolicy::from_json_str(POLICY).expect("Failed to parse policy.");

		assert_eq!(
			policy.resource_ids().collect::<Vec<_>>(),
			vec!["test/file1.txt", "test/file2.txt"]
		);
		assert_eq!(policy.users()["user1"]["name"], "User One");
	}

	#[test]
	fn empty_grant_list_is_still_a_key() {
		let policy = AccessPolicy::from_json_str(POLICY).expect("Failed to parse policy.");
		let perms = policy.get_permissions("test/file2.txt");

		assert!(perms.contains_key("user3"));
		assert!(!policy.can_access("user3", "test/file2.txt", "read"));
	}

	#[test]
	fn sections_are_optional() {
		let policy = AccessPolicy::from_json_str("{}").expect("Failed to parse policy.");

		assert!(policy.known_principals().is_empty());
		assert!(policy.get_permissions("anything").is_empty());
	}

	#[test]
	fn malformed_policy_is_an_error() {
		let err = AccessPolicy::from_json_str(r#"{ "resources": [] }"#)
			.expect_err("Expected parse error.");

		assert!(matches!(err, Error::ParsePolicy { .. }));
	}
}
