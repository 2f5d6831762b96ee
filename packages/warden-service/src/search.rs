//! Permission-aware retrieval.
//!
//! `filter_first` restricts the candidate space to documents whose `{principal}_access` flag is
//! set and runs a single bounded query. `query_first` queries the whole collection and drops
//! results whose permission mapping lacks the principal. With the default `candidate_k == limit`
//! the second strategy can return fewer than `limit` results even when more accessible documents
//! exist; raising `candidate_k` over-fetches to compensate.
//!
//! Documents stored without metadata carry no permissions. They surface in unrestricted searches
//! and are invisible to every principal.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use warden_domain::{MetadataRecord, ResourcePermissions, metadata};
use warden_storage::{Condition, DocumentStore, Filter, ScoredRecord};

use crate::{Error, Result};

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
	#[default]
	FilterFirst,
	QueryFirst,
}
impl SearchStrategy {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::FilterFirst => "filter_first",
			Self::QueryFirst => "query_first",
		}
	}
}
impl FromStr for SearchStrategy {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"filter_first" => Ok(Self::FilterFirst),
			"query_first" => Ok(Self::QueryFirst),
			other => Err(Error::InvalidRequest {
				message: format!("Invalid method: {other}. Use 'filter_first' or 'query_first'."),
			}),
		}
	}
}
impl fmt::Display for SearchStrategy {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct SearchRequest {
	pub query: String,
	/// Acting principal. `None` searches without any access restriction.
	pub principal: Option<String>,
	pub limit: Option<usize>,
	pub strategy: Option<String>,
	/// Over-fetch bound for `query_first`. Defaults to `limit`.
	pub candidate_k: Option<usize>,
}

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SearchItem {
	pub id: String,
	pub content: String,
	/// `None` for documents written without metadata.
	pub filename: Option<String>,
	pub path: Option<String>,
	/// Empty for documents written without metadata.
	pub permissions: ResourcePermissions,
	/// Raw index distance. Lower is more similar.
	pub distance: f32,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct SearchResponse {
	pub trace_id: Uuid,
	pub strategy: SearchStrategy,
	pub items: Vec<SearchItem>,
}

#[derive(Clone)]
pub struct RetrievalEngine {
	store: DocumentStore,
	default_limit: usize,
	default_strategy: SearchStrategy,
}
impl RetrievalEngine {
	pub fn new(store: DocumentStore, cfg: &warden_config::Search) -> Result<Self> {
		let default_strategy = cfg.default_strategy.parse()?;

		if cfg.default_limit == 0 {
			return Err(Error::InvalidRequest {
				message: "search.default_limit must be greater than zero.".to_string(),
			});
		}

		Ok(Self { store, default_limit: cfg.default_limit as usize, default_strategy })
	}

	pub fn search(&self, req: &SearchRequest) -> Result<SearchResponse> {
		let trace_id = Uuid::new_v4();
		let span = tracing::info_span!("search", %trace_id);

		span.in_scope(|| -> Result<SearchResponse> {
			let strategy = match req.strategy.as_deref() {
				Some(raw) => raw.trim().parse()?,
				None => self.default_strategy,
			};
			let items = self.search_items(req, strategy)?;

			Ok(SearchResponse { trace_id, strategy, items })
		})
	}

	fn search_items(
		&self,
		req: &SearchRequest,
		strategy: SearchStrategy,
	) -> Result<Vec<SearchItem>> {
		let principal = req.principal.as_deref().map(crate::require_principal).transpose()?;
		let limit = req.limit.unwrap_or(self.default_limit);

		if limit == 0 {
			return Err(Error::InvalidRequest {
				message: "limit must be greater than zero.".to_string(),
			});
		}

		let items = match strategy {
			SearchStrategy::FilterFirst => {
				if req.candidate_k.is_some() {
					return Err(Error::InvalidRequest {
						message: "candidate_k only applies to query_first.".to_string(),
					});
				}

				self.filter_first(&req.query, principal, limit)?
			},
			SearchStrategy::QueryFirst => {
				let candidate_k = req.candidate_k.unwrap_or(limit);

				if candidate_k < limit {
					return Err(Error::InvalidRequest {
						message: "candidate_k must be greater than or equal to limit.".to_string(),
					});
				}

				self.query_first(&req.query, principal, limit, candidate_k)?
			},
		};

		tracing::debug!(
			strategy = strategy.as_str(),
			principal = principal.unwrap_or("-"),
			limit,
			returned = items.len(),
			"Search completed."
		);

		Ok(items)
	}

	fn filter_first(
		&self,
		query: &str,
		principal: Option<&str>,
		limit: usize,
	) -> Result<Vec<SearchItem>> {
		let filter = principal.map(|principal| {
			Filter::must(vec![Condition::matches(metadata::flag_field(principal), true)])
		});
		let hits = self.store.query(query, limit, filter.as_ref())?;

		hits.into_iter().map(|hit| decode_hit(hit).map(|(item, _)| item)).collect()
	}

	fn query_first(
		&self,
		query: &str,
		principal: Option<&str>,
		limit: usize,
		candidate_k: usize,
	) -> Result<Vec<SearchItem>> {
		let hits = self.store.query(query, candidate_k, None)?;
		let fetched = hits.len();
		let mut items = Vec::with_capacity(fetched);

		for hit in hits {
			let (item, record) = decode_hit(hit)?;
			let visible = principal.is_none_or(|principal| {
				record.as_ref().is_some_and(|record| record.is_visible_to(principal))
			});

			if visible {
				items.push(item);
			}
		}

		tracing::debug!(fetched, visible = items.len(), candidate_k, "Post-filtered candidates.");

		items.truncate(limit);

		Ok(items)
	}
}

fn decode_hit(hit: ScoredRecord) -> Result<(SearchItem, Option<MetadataRecord>)> {
	let record = crate::decode_stored(&hit.id, &hit.metadata)?;
	let item = SearchItem {
		id: hit.id,
		content: hit.document,
		filename: record.as_ref().map(|record| record.filename.clone()),
		path: record.as_ref().map(|record| record.path.clone()),
		permissions: record.as_ref().map(|record| record.permissions.clone()).unwrap_or_default(),
		distance: hit.distance,
	};

	Ok((item, record))
}
