use std::{
	collections::BTreeSet,
	fs,
	path::Path,
	sync::{Arc, Mutex},
};

use rusqlite::{Connection, OptionalExtension, Transaction, params};

use warden_domain::Metadata;
use warden_providers::Embedder;

use crate::{
	Error, Result,
	index::{
		self, DistanceMetric, Filter, IndexEntry, IndexRecord, ScoredRecord, VectorIndex,
		WriteMode,
	},
};

pub const INDEX_FILE_NAME: &str = "index.sqlite3";

const SCHEMA: &str = "\
CREATE TABLE IF NOT EXISTS collections (
\tcollection TEXT PRIMARY KEY,
\tembedding_version TEXT NOT NULL,
\tdimensions INTEGER NOT NULL,
\tmetric TEXT NOT NULL
);
CREATE TABLE IF NOT EXISTS records (
\tcollection TEXT NOT NULL,
\tid TEXT NOT NULL,
\tdocument TEXT NOT NULL,
\tmetadata TEXT NOT NULL,
\tembedding TEXT NOT NULL,
\tPRIMARY KEY (collection, id)
);";

/// Persistent index stored in `<dir>/index.sqlite3`. Handles opened on the same directory and
/// collection share records.
pub struct SqliteIndex {
	conn: Mutex<Connection>,
	collection: String,
	embedder: Arc<dyn Embedder>,
	metric: DistanceMetric,
}
impl SqliteIndex {
	pub fn open(
		dir: &Path,
		collection: &str,
		embedder: Arc<dyn Embedder>,
		metric: DistanceMetric,
	) -> Result<Self> {
		fs::create_dir_all(dir)?;

		let conn = Connection::open(dir.join(INDEX_FILE_NAME))?;

		conn.busy_timeout(std::time::Duration::from_secs(5))?;
		conn.execute_batch(SCHEMA)?;

		let index =
			Self { conn: Mutex::new(conn), collection: collection.to_string(), embedder, metric };

		index.register_collection()?;

		Ok(index)
	}

	pub fn collection(&self) -> &str {
		&self.collection
	}

	fn register_collection(&self) -> Result<()> {
		let conn = self.conn.lock().unwrap_or_else(|err| err.into_inner());
		let existing = conn
			.query_row(
				"SELECT embedding_version, dimensions, metric FROM collections WHERE collection = ?1",
				params![self.collection],
				|row| {
					Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?, row.get::<_, String>(2)?))
				},
			)
			.optional()?;
		let version = self.embedder.version();
		let dimensions = self.embedder.dimensions() as i64;
		let metric = self.metric.as_str();

		match existing {
			None => {
				conn.execute(
					"INSERT INTO collections (collection, embedding_version, dimensions, metric) \
					 VALUES (?1, ?2, ?3, ?4)",
					params![self.collection, version, dimensions, metric],
				)?;
			},
			Some((stored_version, stored_dimensions, stored_metric))
				if stored_version != version
					|| stored_dimensions != dimensions
					|| stored_metric != metric =>
			{
				return Err(Error::Conflict(format!(
					"Collection {} was created with {stored_version}/{stored_dimensions}/{stored_metric}, \
					 not {version}/{dimensions}/{metric}.",
					self.collection
				)));
			},
			Some(_) => {},
		}

		Ok(())
	}

	fn with_tx<T>(&self, f: impl FnOnce(&Transaction<'_>) -> Result<T>) -> Result<T> {
		let mut conn = self.conn.lock().unwrap_or_else(|err| err.into_inner());
		let tx = conn.transaction()?;
		let value = f(&tx)?;

		tx.commit()?;

		Ok(value)
	}

	fn write(&self, mode: WriteMode, entries: &[IndexEntry]) -> Result<()> {
		index::ensure_unique_ids(entries)?;

		let embeddings = index::embed_entries(self.embedder.as_ref(), entries)?;

		self.with_tx(|tx| {
			let mut previous = Vec::with_capacity(entries.len());

			for entry in entries {
				let stored = load_metadata(tx, &self.collection, &entry.id)?;

				match mode {
					WriteMode::Add if stored.is_some() =>
						return Err(Error::Conflict(format!(
							"Document {} already exists.",
							entry.id
						))),
					WriteMode::Update if stored.is_none() =>
						return Err(Error::NotFound(format!("Document {} does not exist.", entry.id))),
					_ => {},
				}

				previous.push(stored);
			}

			for ((entry, embedding), stored) in entries.iter().zip(&embeddings).zip(previous) {
				let metadata = match &entry.metadata {
					Some(metadata) => serde_json::to_string(metadata)?,
					None => stored.unwrap_or_else(|| "{}".to_string()),
				};

				tx.execute(
					"INSERT INTO records (collection, id, document, metadata, embedding) \
					 VALUES (?1, ?2, ?3, ?4, ?5) \
					 ON CONFLICT (collection, id) DO UPDATE SET \
					 document = excluded.document, \
					 metadata = excluded.metadata, \
					 embedding = excluded.embedding",
					params![
						self.collection,
						entry.id,
						entry.document,
						metadata,
						serde_json::to_string(embedding)?
					],
				)?;
			}

			Ok(())
		})
	}
}
impl VectorIndex for SqliteIndex {
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
		self.with_tx(|tx| {
			for id in ids {
				tx.execute(
					"DELETE FROM records WHERE collection = ?1 AND id = ?2",
					params![self.collection, id],
				)?;
			}

			Ok(())
		})
	}

	fn get(&self, ids: Option<&[String]>) -> Result<Vec<IndexRecord>> {
		let conn = self.conn.lock().unwrap_or_else(|err| err.into_inner());
		let mut records = Vec::new();

		match ids {
			None => {
				let mut stmt = conn.prepare(
					"SELECT id, document, metadata FROM records WHERE collection = ?1 ORDER BY id",
				)?;
				let rows = stmt.query_map(params![self.collection], |row| {
					Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
				})?;

				for row in rows {
					let (id, document, metadata) = row?;

					records.push(IndexRecord {
						id,
						document,
						metadata: serde_json::from_str(&metadata)?,
					});
				}
			},
			Some(ids) => {
				let mut stmt = conn.prepare(
					"SELECT document, metadata FROM records WHERE collection = ?1 AND id = ?2",
				)?;

				for id in ids.iter().collect::<BTreeSet<_>>() {
					let row = stmt
						.query_row(params![self.collection, id], |row| {
							Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
						})
						.optional()?;

					if let Some((document, metadata)) = row {
						records.push(IndexRecord {
							id: id.clone(),
							document,
							metadata: serde_json::from_str(&metadata)?,
						});
					}
				}
			},
		}

		Ok(records)
	}

	fn query(
		&self,
		text: &str,
		limit: usize,
		filter: Option<&Filter>,
	) -> Result<Vec<ScoredRecord>> {
		index::ensure_limit(limit)?;

		let query = index::embed_query(self.embedder.as_ref(), text)?;
		let conn = self.conn.lock().unwrap_or_else(|err| err.into_inner());
		let mut stmt = conn.prepare(
			"SELECT id, document, metadata, embedding FROM records WHERE collection = ?1",
		)?;
		let rows = stmt.query_map(params![self.collection], |row| {
			Ok((
				row.get::<_, String>(0)?,
				row.get::<_, String>(1)?,
				row.get::<_, String>(2)?,
				row.get::<_, String>(3)?,
			))
		})?;
		let mut scored = Vec::new();

		for row in rows {
			let (id, document, metadata, embedding) = row?;
			let metadata: Metadata = serde_json::from_str(&metadata)?;

			if filter.is_some_and(|filter| !filter.accepts(&metadata)) {
				continue;
			}

			let embedding: Vec<f32> = serde_json::from_str(&embedding)?;
			let distance = self.metric.distance(&query, &embedding);

			scored.push(ScoredRecord { id, document, metadata, distance });
		}

		Ok(index::rank(scored, limit))
	}

	fn count(&self) -> Result<usize> {
		let conn = self.conn.lock().unwrap_or_else(|err| err.into_inner());
		let count: i64 = conn.query_row(
			"SELECT count(*) FROM records WHERE collection = ?1",
			params![self.collection],
			|row| row.get(0),
		)?;

		Ok(count as usize)
	}
}

fn load_metadata(tx: &Transaction<'_>, collection: &str, id: &str) -> Result<Option<String>> {
	let metadata = tx
		.query_row(
			"SELECT metadata FROM records WHERE collection = ?1 AND id = ?2",
			params![collection, id],
			|row| row.get::<_, String>(0),
		)
		.optional()?;

	Ok(metadata)
}
