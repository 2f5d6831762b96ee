use serde_json::{Map, Value, json};

use warden_service::SearchRequest;

use super::{Fixture, fixture, search_ids};

const QUERY: &str = "quarterly revenue report";
const RELEVANT: [&str; 5] = ["r1.txt", "r2.txt", "r3.txt", "r4.txt", "r5.txt"];

fn lossy_fixture() -> Fixture {
	let mut resources = RELEVANT
		.iter()
		.enumerate()
		.map(|(idx, name)| (*name, format!("quarterly revenue report section {idx}")))
		.collect::<Vec<_>>();

	resources.push(("c.txt", "holiday party schedule".to_string()));

	let borrowed =
		resources.iter().map(|(name, content)| (*name, content.as_str())).collect::<Vec<_>>();

	fixture(false, &borrowed, |workspace| {
		let mut grants = Map::new();

		for name in RELEVANT {
			grants.insert(workspace.resource_key(name), json!({ "user2": ["read"] }));
		}

		grants.insert(workspace.resource_key("c.txt"), json!({ "user1": ["read"] }));

		json!({ "resources": Value::Object(grants), "users": { "user1": {}, "user2": {} } })
	})
}

#[test]
fn filter_first_finds_the_only_accessible_document() {
	let fx = lossy_fixture();

	assert_eq!(
		search_ids(&fx.service, QUERY, Some("user1"), 1, "filter_first", None),
		vec!["c.txt"]
	);
}

#[test]
fn query_first_drops_inaccessible_top_hit_without_backfill() {
	let fx = lossy_fixture();

	assert!(search_ids(&fx.service, QUERY, Some("user1"), 1, "query_first", None).is_empty());
}

#[test]
fn candidate_k_recovers_the_accessible_document() {
	let fx = lossy_fixture();

	assert!(search_ids(&fx.service, QUERY, Some("user1"), 1, "query_first", Some(5)).is_empty());
	assert_eq!(
		search_ids(&fx.service, QUERY, Some("user1"), 1, "query_first", Some(6)),
		vec!["c.txt"]
	);
}

#[test]
fn query_first_drops_only_inaccessible_candidates() {
	let fx = lossy_fixture();
	let ids = search_ids(&fx.service, QUERY, Some("user2"), 6, "query_first", None);

	assert_eq!(ids.len(), 5);
	assert!(!ids.contains(&"c.txt".to_string()));
}

#[test]
fn query_first_keeps_distance_order_of_interleaved_survivors() {
	// Token overlap with the query shrinks from d1 to d5, so distances strictly increase.
	let fx = fixture(
		false,
		&[
			("d1.txt", "alpha beta gamma delta"),
			("d2.txt", "alpha beta gamma"),
			("d3.txt", "alpha beta"),
			("d4.txt", "alpha"),
			("d5.txt", "alpha zeta"),
		],
		|workspace| {
			json!({
				"resources": {
					workspace.resource_key("d1.txt"): { "user1": ["read"] },
					workspace.resource_key("d2.txt"): { "user2": ["read"] },
					workspace.resource_key("d3.txt"): { "user1": ["read"] },
					workspace.resource_key("d4.txt"): { "user2": ["read"] },
					workspace.resource_key("d5.txt"): { "user1": ["read"] }
				},
				"users": { "user1": {}, "user2": {} }
			})
		},
	);
	let everything =
		search_ids(&fx.service, "alpha beta gamma delta", None, 5, "query_first", None);

	assert_eq!(everything, vec!["d1.txt", "d2.txt", "d3.txt", "d4.txt", "d5.txt"]);

	let response = fx
		.service
		.search(SearchRequest {
			query: "alpha beta gamma delta".to_string(),
			principal: Some("user1".to_string()),
			limit: Some(5),
			strategy: Some("query_first".to_string()),
			candidate_k: None,
		})
		.expect("Search failed.");
	let ids = response.items.iter().map(|item| item.id.as_str()).collect::<Vec<_>>();

	assert_eq!(ids, vec!["d1.txt", "d3.txt", "d5.txt"]);
	assert!(response.items.windows(2).all(|pair| pair[0].distance <= pair[1].distance));
}
