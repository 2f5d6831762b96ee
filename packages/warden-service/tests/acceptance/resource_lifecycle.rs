use std::{
	collections::{BTreeMap, BTreeSet},
	fs, thread,
	time::Duration,
};

use serde_json::json;

use warden_domain::ResourcePermissions;
use warden_service::{DeleteRequest, Error, ListRequest, UpdateResourceRequest};

use super::{fixture, search_ids};

fn base_policy(workspace: &warden_testkit::TestWorkspace) -> serde_json::Value {
	json!({
		"resources": {
			workspace.resource_key("notes.txt"): { "user1": ["read", "write"] }
		},
		"users": { "user1": {}, "user2": {} }
	})
}

#[test]
fn index_directory_keys_documents_by_filename() {
	let fx =
		fixture(false, &[("notes.txt", "meeting notes"), ("plan.md", "release plan")], base_policy);
	let listed = fx.service.list_documents(ListRequest::default()).expect("List failed.");
	let ids = listed.items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>();

	assert_eq!(ids, vec!["notes.txt", "plan.md"]);

	let plan = listed.items[1].metadata.as_ref().expect("Missing metadata.");

	assert_eq!(plan.content_type, "text/markdown");
	assert!(plan.permissions.is_empty());
	assert_eq!(plan.file_size, "release plan".len() as u64);
}

#[test]
fn strict_update_of_unindexed_file_is_not_found() {
	let fx = fixture(false, &[("notes.txt", "meeting notes")], base_policy);
	let path = fx.workspace.write_resource("late.txt", "late arrival").expect("Failed to write.");
	let err = fx
		.service
		.update_resource(UpdateResourceRequest {
			path: path.to_string_lossy().into_owned(),
			permissions: None,
			upsert_if_missing: false,
		})
		.expect_err("Expected not found.");

	match err {
		Error::NotFound { message } => assert!(message.contains("upsert_if_missing"), "{message}"),
		other => panic!("Unexpected error: {other:?}"),
	}

	let created = fx
		.service
		.update_resource(UpdateResourceRequest {
			path: path.to_string_lossy().into_owned(),
			permissions: None,
			upsert_if_missing: true,
		})
		.expect("Upsert update failed.");

	assert!(created.created);
	assert_eq!(created.id, "late.txt");
}

#[test]
fn update_of_missing_file_is_not_found() {
	let fx = fixture(false, &[("notes.txt", "meeting notes")], base_policy);
	let err = fx
		.service
		.update_resource(UpdateResourceRequest {
			path: fx.workspace.resource_key("ghost.txt"),
			permissions: None,
			upsert_if_missing: true,
		})
		.expect_err("Expected not found.");

	assert!(matches!(err, Error::NotFound { .. }));
}

#[test]
fn update_preserves_created_at_and_applies_new_permissions() {
	let fx = fixture(false, &[("notes.txt", "meeting notes")], base_policy);
	let before = fx.service.list_documents(ListRequest::default()).expect("List failed.").items[0]
		.metadata
		.clone()
		.expect("Missing metadata.");

	thread::sleep(Duration::from_millis(5));
	fs::write(fx.workspace.resources_dir().join("notes.txt"), "revised meeting notes")
		.expect("Failed to rewrite resource.");

	let permissions: ResourcePermissions =
		BTreeMap::from([("user2".to_string(), BTreeSet::from(["read".to_string()]))]);
	let updated = fx
		.service
		.update_resource(UpdateResourceRequest {
			path: fx.workspace.resource_key("notes.txt"),
			permissions: Some(permissions),
			upsert_if_missing: false,
		})
		.expect("Update failed.");

	assert!(!updated.created);
	assert_eq!(updated.created_at, before.created_at);
	assert!(updated.updated_at > before.updated_at);
	assert_eq!(
		search_ids(&fx.service, "revised meeting notes", Some("user2"), 5, "filter_first", None),
		vec!["notes.txt"]
	);
	assert!(
		search_ids(&fx.service, "revised meeting notes", Some("user1"), 5, "filter_first", None)
			.is_empty()
	);
}

#[test]
fn delete_ignores_unknown_ids() {
	let fx = fixture(false, &[("notes.txt", "meeting notes")], base_policy);
	let response = fx
		.service
		.delete_documents(DeleteRequest {
			ids: vec!["notes.txt".to_string(), "ghost.txt".to_string()],
		})
		.expect("Delete failed.");

	assert_eq!(response.deleted, vec!["notes.txt"]);
	assert_eq!(response.remaining, 0);

	let listed = fx
		.service
		.list_documents(ListRequest { ids: Some(vec!["ghost.txt".to_string()]) })
		.expect("List failed.");

	assert!(listed.items.is_empty());
}

#[test]
fn reindexing_is_idempotent() {
	let fx = fixture(false, &[("notes.txt", "meeting notes")], base_policy);
	let report = fx.service.index_directory().expect("Failed to re-index.");

	assert_eq!(report.indexed(), 1);
	assert_eq!(fx.service.store.count().expect("Failed to count."), 1);
}
