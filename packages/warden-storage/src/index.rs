//! The nearest-neighbour index seam.
//!
//! Everything above this module talks to an `Arc<dyn VectorIndex>`. Two backends ship with the
//! crate: [`MemoryIndex`](crate::memory::MemoryIndex) for ephemeral use and
//! [`SqliteIndex`](crate::sqlite::SqliteIndex) for a path-addressed persistent collection.

use std::{cmp::Ordering, collections::BTreeSet, path::PathBuf, str::FromStr, sync::Arc};

use warden_domain::{Metadata, MetadataValue};
use warden_providers::Embedder;

use crate::{Error, Result, memory::MemoryIndex, sqlite::SqliteIndex};

pub trait VectorIndex: Send + Sync {
	/// Inserts every entry. Fails the whole batch when any id already exists.
	fn add(&self, entries: &[IndexEntry]) -> Result<()>;

	/// Overwrites every entry. Fails the whole batch when any id is absent.
	fn update(&self, entries: &[IndexEntry]) -> Result<()>;

	fn upsert(&self, entries: &[IndexEntry]) -> Result<()>;

	/// Removes the given ids. Unknown ids are ignored.
	fn delete(&self, ids: &[String]) -> Result<()>;

	/// Returns all records, or the subset matching `ids`, ordered by id.
	fn get(&self, ids: Option<&[String]>) -> Result<Vec<IndexRecord>>;

	/// Returns at most `limit` records matching `filter`, ordered by ascending distance to `text`.
	fn query(&self, text: &str, limit: usize, filter: Option<&Filter>)
	-> Result<Vec<ScoredRecord>>;

	fn count(&self) -> Result<usize>;
}

#[derive(Clone, Debug)]
pub struct IndexEntry {
	pub id: String,
	pub document: String,
	/// `None` keeps the stored metadata of an existing id and stores an empty map for a new one.
	pub metadata: Option<Metadata>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct IndexRecord {
	pub id: String,
	pub document: String,
	pub metadata: Metadata,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScoredRecord {
	pub id: String,
	pub document: String,
	pub metadata: Metadata,
	pub distance: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Condition {
	pub key: String,
	pub value: MetadataValue,
}
impl Condition {
	pub fn matches(key: impl Into<String>, value: impl Into<MetadataValue>) -> Self {
		Self { key: key.into(), value: value.into() }
	}

	fn accepts(&self, metadata: &Metadata) -> bool {
		metadata.get(&self.key) == Some(&self.value)
	}
}

/// Conjunction of equality conditions.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Filter {
	pub must: Vec<Condition>,
}
impl Filter {
	pub fn must(conditions: Vec<Condition>) -> Self {
		Self { must: conditions }
	}

	pub fn accepts(&self, metadata: &Metadata) -> bool {
		self.must.iter().all(|condition| condition.accepts(metadata))
	}
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum DistanceMetric {
	/// Squared Euclidean distance.
	#[default]
	L2,
	/// `1 - cosine similarity`.
	Cosine,
	/// `1 - dot product`.
	InnerProduct,
}
impl DistanceMetric {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::L2 => "l2",
			Self::Cosine => "cosine",
			Self::InnerProduct => "ip",
		}
	}

	pub fn distance(self, a: &[f32], b: &[f32]) -> f32 {
		match self {
			Self::L2 => a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)).sum(),
			Self::Cosine => {
				let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
				let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();

				if norm_a == 0.0 || norm_b == 0.0 {
					return 1.0;
				}

				1.0 - dot(a, b) / (norm_a * norm_b)
			},
			Self::InnerProduct => 1.0 - dot(a, b),
		}
	}
}
impl FromStr for DistanceMetric {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"l2" => Ok(Self::L2),
			"cosine" => Ok(Self::Cosine),
			"ip" => Ok(Self::InnerProduct),
			other => Err(Error::InvalidArgument(format!(
				"Unknown distance metric: {other}. Use 'l2', 'cosine', or 'ip'."
			))),
		}
	}
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub enum IndexMode {
	Ephemeral,
	Persistent { path: PathBuf },
}
impl IndexMode {
	pub fn from_config(cfg: &warden_config::Index) -> Result<Self> {
		match cfg.mode.as_str() {
			warden_config::INDEX_MODE_EPHEMERAL => Ok(Self::Ephemeral),
			warden_config::INDEX_MODE_PERSISTENT => {
				let path = cfg.path.clone().ok_or_else(|| {
					Error::InvalidArgument("Persistent index mode requires a path.".to_string())
				})?;

				Ok(Self::Persistent { path })
			},
			other => Err(Error::InvalidArgument(format!("Unknown index mode: {other}."))),
		}
	}
}

pub fn open_index(
	cfg: &warden_config::Storage,
	embedder: Arc<dyn Embedder>,
) -> Result<Arc<dyn VectorIndex>> {
	let metric = cfg.index.metric.parse::<DistanceMetric>()?;

	match IndexMode::from_config(&cfg.index)? {
		IndexMode::Ephemeral => {
			tracing::debug!(
				collection = %cfg.collection,
				metric = metric.as_str(),
				"Opening ephemeral index."
			);

			Ok(Arc::new(MemoryIndex::new(embedder, metric)))
		},
		IndexMode::Persistent { path } => {
			tracing::debug!(
				collection = %cfg.collection,
				path = %path.display(),
				metric = metric.as_str(),
				"Opening persistent index."
			);

			Ok(Arc::new(SqliteIndex::open(&path, &cfg.collection, embedder, metric)?))
		},
	}
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum WriteMode {
	Add,
	Update,
	Upsert,
}

pub(crate) fn ensure_unique_ids(entries: &[IndexEntry]) -> Result<()> {
	let mut seen = BTreeSet::new();

	for entry in entries {
		if !seen.insert(entry.id.as_str()) {
			return Err(Error::InvalidArgument(format!("Duplicate id in batch: {}.", entry.id)));
		}
	}

	Ok(())
}

pub(crate) fn ensure_limit(limit: usize) -> Result<()> {
	if limit == 0 {
		return Err(Error::InvalidArgument("Query limit must be greater than zero.".to_string()));
	}

	Ok(())
}

pub(crate) fn embed_entries(
	embedder: &dyn Embedder,
	entries: &[IndexEntry],
) -> Result<Vec<Vec<f32>>> {
	let documents = entries.iter().map(|entry| entry.document.clone()).collect::<Vec<_>>();
	let embeddings = embedder.embed(&documents)?;

	if embeddings.len() != entries.len() {
		return Err(Error::InvalidArgument(format!(
			"Embedder returned {} vectors for {} documents.",
			embeddings.len(),
			entries.len()
		)));
	}

	Ok(embeddings)
}

pub(crate) fn embed_query(embedder: &dyn Embedder, text: &str) -> Result<Vec<f32>> {
	embedder.embed(&[text.to_string()])?.into_iter().next().ok_or_else(|| {
		Error::InvalidArgument("Embedder returned no vector for the query.".to_string())
	})
}

/// Sorts by ascending distance, breaking ties by id, and keeps the first `limit`.
pub(crate) fn rank(mut scored: Vec<ScoredRecord>, limit: usize) -> Vec<ScoredRecord> {
	scored.sort_by(|a, b| match a.distance.total_cmp(&b.distance) {
		Ordering::Equal => a.id.cmp(&b.id),
		other => other,
	});
	scored.truncate(limit);

	scored
}

fn dot(a: &[f32], b: &[f32]) -> f32 {
	a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
	use super::*;

	fn scored(id: &str, distance: f32) -> ScoredRecord {
		ScoredRecord {
			id: id.to_string(),
			document: String::new(),
			metadata: Metadata::new(),
			distance,
		}
	}

	#[test]
	fn rank_orders_by_distance_then_id() {
		let ranked = rank(vec![scored("b", 0.5), scored("c", 0.1), scored("a", 0.5)], 2);
		let ids = ranked.iter().map(|record| record.id.as_str()).collect::<Vec<_>>();

		assert_eq!(ids, vec!["c", "a"]);
	}

	#[test]
	fn metrics_behave_on_unit_vectors() {
		let a = [1.0, 0.0];
		let b = [0.0, 1.0];

		assert_eq!(DistanceMetric::L2.distance(&a, &a), 0.0);
		assert_eq!(DistanceMetric::L2.distance(&a, &b), 2.0);
		assert_eq!(DistanceMetric::Cosine.distance(&a, &b), 1.0);
		assert_eq!(DistanceMetric::InnerProduct.distance(&a, &a), 0.0);
		assert_eq!(DistanceMetric::Cosine.distance(&a, &[0.0, 0.0]), 1.0);
	}

	#[test]
	fn filter_requires_every_condition() {
		let mut metadata = Metadata::new();

		metadata.insert("user1_access".to_string(), MetadataValue::Bool(true));
		metadata.insert("kind".to_string(), MetadataValue::Str("report".to_string()));

		let filter = Filter::must(vec![
			Condition::matches("user1_access", true),
			Condition::matches("kind", "report"),
		]);

		assert!(filter.accepts(&metadata));

		metadata.insert("user1_access".to_string(), MetadataValue::Bool(false));

		assert!(!filter.accepts(&metadata));
		assert!(!Filter::must(vec![Condition::matches("user2_access", true)]).accepts(&metadata));
	}

	#[test]
	fn metric_names_parse() {
		assert_eq!(
			"ip".parse::<DistanceMetric>().expect("Failed to parse."),
			DistanceMetric::InnerProduct
		);
		assert!("manhattan".parse::<DistanceMetric>().is_err());
	}
}
