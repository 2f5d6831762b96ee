use std::{
	collections::{BTreeMap, BTreeSet},
	sync::{Arc, RwLock},
};

use warden_domain::Metadata;
use warden_providers::Embedder;

use crate::{
	Error, Result,
	index::{
		self, DistanceMetric, Filter, IndexEntry, IndexRecord, ScoredRecord, VectorIndex,
		WriteMode,
	},
};

struct StoredEntry {
	document: String,
	metadata: Metadata,
	embedding: Vec<f32>,
}

/// In-process index. Every handle owns its own records, which vanish when the handle drops.
pub struct MemoryIndex {
	embedder: Arc<dyn Embedder>,
	metric: DistanceMetric,
	records: RwLock<BTreeMap<String, StoredEntry>>,
}
impl MemoryIndex {
	pub fn new(embedder: Arc<dyn Embedder>, metric: DistanceMetric) -> Self {
		Self { embedder, metric, records: RwLock::new(BTreeMap::new()) }
	}

	fn write(&self, mode: WriteMode, entries: &[IndexEntry]) -> Result<()> {
		index::ensure_unique_ids(entries)?;

		let embeddings = index::embed_entries(self.embedder.as_ref(), entries)?;
		let mut records = self.records.write().unwrap_or_else(|err| err.into_inner());

		for entry in entries {
			let exists = records.contains_key(&entry.id);

			match mode {
				WriteMode::Add if exists =>
					return Err(Error::Conflict(format!("Document {} already exists.", entry.id))),
				WriteMode::Update if !exists =>
					return Err(Error::NotFound(format!("Document {} does not exist.", entry.id))),
				_ => {},
			}
		}

		for (entry, embedding) in entries.iter().zip(embeddings) {
			let metadata = match (&entry.metadata, records.remove(&entry.id)) {
				(Some(metadata), _) => metadata.clone(),
				(None, Some(previous)) => previous.metadata,
				(None, None) => Metadata::new(),
			};

			records.insert(
				entry.id.clone(),
				StoredEntry { document: entry.document.clone(), metadata, embedding },
			);
		}

		Ok(())
	}
}
impl VectorIndex for MemoryIndex {
	fn add(&self, entries: &[IndexEntry]) -> Result<()> {
		self.write(WriteMode::Add, entries)
	}

	fn update(&self, entries: &[IndexEntry]) -> Result<()> {
		self.write(WriteMode::Update, entries)
	}

	fn upsert(&self, entries: &[IndexEntry]) -> Result<()> {
		self.write(WriteMode::Upsert, entries)
	}

	fn delete(&self, ids: &[String]) -> Result<()> {
		let mut records = self.records.write().unwrap_or_else(|err| err.into_inner());

		for id in ids {
			records.remove(id);
		}

		Ok(())
	}

	fn get(&self, ids: Option<&[String]>) -> Result<Vec<IndexRecord>> {
		let records = self.records.read().unwrap_or_else(|err| err.into_inner());
		let to_record = |(id, entry): (&String, &StoredEntry)| IndexRecord {
			id: id.clone(),
			document: entry.document.clone(),
			metadata: entry.metadata.clone(),
		};

		Ok(match ids {
			None => records.iter().map(to_record).collect(),
			Some(ids) => ids
				.iter()
				.collect::<BTreeSet<_>>()
				.into_iter()
				.filter_map(|id| records.get_key_value(id))
				.map(to_record)
				.collect(),
		})
	}

	fn query(
		&self,
		text: &str,
		limit: usize,
		filter: Option<&Filter>,
	) -> Result<Vec<ScoredRecord>> {
		index::ensure_limit(limit)?;

		let query = index::embed_query(self.embedder.as_ref(), text)?;
		let records = self.records.read().unwrap_or_else(|err| err.into_inner());
		let scored = records
			.iter()
			.filter(|(_, entry)| filter.is_none_or(|filter| filter.accepts(&entry.metadata)))
			.map(|(id, entry)| ScoredRecord {
				id: id.clone(),
				document: entry.document.clone(),
				metadata: entry.metadata.clone(),
				distance: self.metric.distance(&query, &entry.embedding),
			})
			.collect();

		Ok(index::rank(scored, limit))
	}

	fn count(&self) -> Result<usize> {
		Ok(self.records.read().unwrap_or_else(|err| err.into_inner()).len())
	}
}
