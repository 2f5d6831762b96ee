use serde_json::json;

use warden_service::{ListRequest, WardenService};

use super::{fixture, search_ids};

#[test]
fn services_on_the_same_path_share_documents() {
	let fx = fixture(true, &[("shared.txt", "persistent shared document")], |workspace| {
		json!({
			"resources": { workspace.resource_key("shared.txt"): { "user1": ["read"] } },
			"users": { "user1": {} }
		})
	});
	let second = WardenService::open(fx.workspace.config(true)).expect("Failed to open service.");

	assert_eq!(
		search_ids(&second, "persistent shared", Some("user1"), 5, "filter_first", None),
		vec!["shared.txt"]
	);
}

#[test]
fn ephemeral_services_start_empty() {
	let fx = fixture(false, &[("solo.txt", "ephemeral document")], |_| json!({}));
	let second = WardenService::open(fx.workspace.config(false)).expect("Failed to open service.");

	let first_items =
		fx.service.list_documents(ListRequest::default()).expect("List failed.").items;
	let second_items = second.list_documents(ListRequest::default()).expect("List failed.").items;

	assert_eq!(first_items.len(), 1);
	assert!(second_items.is_empty());
}

#[test]
fn missing_policy_indexes_documents_invisible_to_everyone() {
	let fx = fixture(false, &[("orphan.txt", "orphan document")], |_| json!({}));

	std::fs::remove_file(fx.workspace.policy_path()).expect("Failed to remove policy.");

	let service = WardenService::open(fx.workspace.config(false)).expect("Failed to open service.");

	service.index_directory().expect("Failed to index resources.");

	assert!(!service.policy.can_access("user1", &fx.workspace.resource_key("orphan.txt"), "read"));
	assert!(search_ids(&service, "orphan", Some("user1"), 5, "filter_first", None).is_empty());
	assert!(search_ids(&service, "orphan", Some("user1"), 5, "query_first", None).is_empty());
	assert_eq!(search_ids(&service, "orphan", None, 5, "filter_first", None), vec!["orphan.txt"]);
}
