use std::{str::FromStr, sync::Arc};

use warden_domain::{Metadata, MetadataRecord};

use crate::{Error, Filter, IndexEntry, Result, ScoredRecord, VectorIndex};

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum WriteOperation {
	Add,
	Update,
	#[default]
	Upsert,
}
impl WriteOperation {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Add => "add",
			Self::Update => "update",
			Self::Upsert => "upsert",
		}
	}
}
impl FromStr for WriteOperation {
	type Err = Error;

	fn from_str(s: &str) -> Result<Self> {
		match s {
			"add" => Ok(Self::Add),
			"update" => Ok(Self::Update),
			"upsert" => Ok(Self::Upsert),
			other => Err(Error::InvalidArgument(format!(
				"Invalid operation: {other}. Use 'add', 'update', or 'upsert'."
			))),
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct StoredDocument {
	pub id: String,
	pub content: String,
	pub fields: Metadata,
}
impl StoredDocument {
	/// Decodes the flat fields. Returns `None` for a document stored without metadata.
	pub fn record(&self) -> warden_domain::Result<Option<MetadataRecord>> {
		if self.fields.is_empty() {
			return Ok(None);
		}

		MetadataRecord::from_fields(&self.fields).map(Some)
	}
}

/// Id, content and metadata bookkeeping on top of a shared index handle.
#[derive(Clone)]
pub struct DocumentStore {
	index: Arc<dyn VectorIndex>,
}
impl DocumentStore {
	pub fn new(index: Arc<dyn VectorIndex>) -> Self {
		Self { index }
	}

	pub fn index(&self) -> &Arc<dyn VectorIndex> {
		&self.index
	}

	pub fn add(
		&self,
		ids: &[String],
		documents: &[String],
		metadatas: Option<&[MetadataRecord]>,
	) -> Result<()> {
		self.write(WriteOperation::Add, ids, documents, metadatas)
	}

	pub fn update(
		&self,
		ids: &[String],
		documents: &[String],
		metadatas: Option<&[MetadataRecord]>,
	) -> Result<()> {
		self.write(WriteOperation::Update, ids, documents, metadatas)
	}

	pub fn upsert(
		&self,
		ids: &[String],
		documents: &[String],
		metadatas: Option<&[MetadataRecord]>,
	) -> Result<()> {
		self.write(WriteOperation::Upsert, ids, documents, metadatas)
	}

	pub fn write(
		&self,
		operation: WriteOperation,
		ids: &[String],
		documents: &[String],
		metadatas: Option<&[MetadataRecord]>,
	) -> Result<()> {
		let entries = build_entries(ids, documents, metadatas)?;

		match operation {
			WriteOperation::Add => {
				self.index.add(&entries)?;

				tracing::info!(count = entries.len(), "Added documents.");
			},
			WriteOperation::Update => {
				self.index.update(&entries)?;

				tracing::info!(count = entries.len(), "Updated documents.");
			},
			WriteOperation::Upsert => {
				self.index.upsert(&entries)?;

				tracing::info!(count = entries.len(), "Upserted documents.");
			},
		}

		Ok(())
	}

	pub fn get(&self, ids: Option<&[String]>) -> Result<Vec<StoredDocument>> {
		Ok(self
			.index
			.get(ids)?
			.into_iter()
			.map(|record| StoredDocument {
				id: record.id,
				content: record.document,
				fields: record.metadata,
			})
			.collect())
	}

	pub fn delete(&self, ids: &[String]) -> Result<()> {
		self.index.delete(ids)?;

		tracing::info!(count = ids.len(), "Deleted documents.");

		Ok(())
	}

	pub fn count(&self) -> Result<usize> {
		self.index.count()
	}

	pub fn contains(&self, id: &str) -> Result<bool> {
		let ids = [id.to_string()];

		Ok(!self.index.get(Some(ids.as_slice()))?.is_empty())
	}

	pub fn query(
		&self,
		text: &str,
		limit: usize,
		filter: Option<&Filter>,
	) -> Result<Vec<ScoredRecord>> {
		self.index.query(text, limit, filter)
	}
}

fn build_entries(
	ids: &[String],
	documents: &[String],
	metadatas: Option<&[MetadataRecord]>,
) -> Result<Vec<IndexEntry>> {
	if ids.len() != documents.len() {
		return Err(Error::InvalidArgument(format!(
			"ids and documents must have the same length ({} != {}).",
			ids.len(),
			documents.len()
		)));
	}
	if let Some(metadatas) = metadatas
		&& metadatas.len() != ids.len()
	{
		return Err(Error::InvalidArgument(format!(
			"metadatas must have the same length as ids ({} != {}).",
			metadatas.len(),
			ids.len()
		)));
	}

	let mut entries = Vec::with_capacity(ids.len());

	for (idx, (id, document)) in ids.iter().zip(documents).enumerate() {
		let metadata = match metadatas {
			Some(metadatas) => Some(metadatas[idx].to_fields()?),
			None => None,
		};

		entries.push(IndexEntry { id: id.clone(), document: document.clone(), metadata });
	}

	Ok(entries)
}
