use serde_json::json;

use super::{fixture, search_ids};

const STRATEGIES: [&str; 2] = ["filter_first", "query_first"];

fn two_documents(persistent: bool) -> super::Fixture {
	fixture(
		persistent,
		&[("a.txt", "test"), ("b.txt", "test results summary")],
		|workspace| {
			json!({
				"resources": {
					workspace.resource_key("a.txt"): { "user1": ["read"], "user2": ["read"] },
					workspace.resource_key("b.txt"): { "user2": ["read"] }
				},
				"users": { "user1": {}, "user2": {} }
			})
		},
	)
}

#[test]
fn user1_sees_only_a() {
	let fx = two_documents(false);

	for strategy in STRATEGIES {
		assert_eq!(
			search_ids(&fx.service, "test", Some("user1"), 5, strategy, None),
			vec!["a.txt"],
			"{strategy}"
		);
	}
}

#[test]
fn user2_sees_both_in_distance_order() {
	let fx = two_documents(false);

	for strategy in STRATEGIES {
		assert_eq!(
			search_ids(&fx.service, "test", Some("user2"), 5, strategy, None),
			vec!["a.txt", "b.txt"],
			"{strategy}"
		);
	}
}

#[test]
fn no_principal_sees_everything() {
	let fx = two_documents(false);

	for strategy in STRATEGIES {
		assert_eq!(
			search_ids(&fx.service, "test", None, 5, strategy, None),
			vec!["a.txt", "b.txt"],
			"{strategy}"
		);
	}
}

#[test]
fn unknown_principal_sees_nothing() {
	let fx = two_documents(false);

	for strategy in STRATEGIES {
		assert!(
			search_ids(&fx.service, "test", Some("mallory"), 5, strategy, None).is_empty(),
			"{strategy}"
		);
	}
}

#[test]
fn results_carry_decoded_permissions_and_raw_distance() {
	let fx = two_documents(true);
	let response = fx
		.service
		.search(warden_service::SearchRequest {
			query: "test".to_string(),
			principal: Some("user2".to_string()),
			limit: Some(2),
			strategy: None,
			candidate_k: None,
		})
		.expect("Search failed.");
	let first = &response.items[0];

	assert_eq!(first.filename.as_deref(), Some("a.txt"));
	assert_eq!(first.path, Some(fx.workspace.resource_key("a.txt")));
	assert_eq!(first.content, "test");
	assert!(first.distance < 1e-6);
	assert!(response.items[1].distance > first.distance);

	let expected: warden_domain::ResourcePermissions = serde_json::from_value(json!({
		"user1": ["read"],
		"user2": ["read"]
	}))
	.expect("Failed to build expected permissions.");

	assert_eq!(first.permissions, expected);
}

#[test]
fn filter_first_count_is_min_of_limit_and_accessible() {
	let fx = fixture(
		false,
		&[
			("one.txt", "shared notes one"),
			("two.txt", "shared notes two"),
			("three.txt", "shared notes three"),
			("private.txt", "shared notes private"),
		],
		|workspace| {
			json!({
				"resources": {
					workspace.resource_key("one.txt"): { "user1": ["read"] },
					workspace.resource_key("two.txt"): { "user1": ["read"] },
					workspace.resource_key("three.txt"): { "user1": ["read"] },
					workspace.resource_key("private.txt"): { "user2": ["read"] }
				},
				"users": { "user1": {}, "user2": {} }
			})
		},
	);

	for limit in 1..=5 {
		let ids =
			search_ids(&fx.service, "shared notes", Some("user1"), limit, "filter_first", None);

		assert_eq!(ids.len(), limit.min(3), "limit {limit}");
		assert!(!ids.contains(&"private.txt".to_string()), "limit {limit}");
	}
}

#[test]
fn documents_without_metadata_surface_only_in_unrestricted_search() {
	let fx = two_documents(false);

	fx.service
		.write_documents(
			"upsert",
			&["n1".to_string()],
			&["test results note".to_string()],
			None,
		)
		.expect("Failed to write bare document.");

	for strategy in STRATEGIES {
		let response = fx
			.service
			.search(warden_service::SearchRequest {
				query: "test".to_string(),
				principal: None,
				limit: Some(3),
				strategy: Some(strategy.to_string()),
				candidate_k: None,
			})
			.expect("Search failed.");
		let mut ids = response.items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>();

		ids.sort_unstable();

		assert_eq!(ids, vec!["a.txt", "b.txt", "n1"], "{strategy}");

		let bare = response.items.iter().find(|item| item.id == "n1").expect("Missing n1.");

		assert_eq!(bare.filename, None, "{strategy}");
		assert!(bare.permissions.is_empty(), "{strategy}");

		let mut restricted = search_ids(&fx.service, "test", Some("user2"), 3, strategy, None);

		restricted.sort_unstable();

		assert_eq!(restricted, vec!["a.txt", "b.txt"], "{strategy}");
	}
}
