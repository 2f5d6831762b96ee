pub mod access;
pub mod delete;
pub mod ingest;
pub mod list;
pub mod search;
pub mod time_serde;
pub mod update;

mod error;

pub use access::{AccessCheckRequest, AccessCheckResponse};
pub use delete::{DeleteRequest, DeleteResponse};
pub use error::{Error, Result};
pub use ingest::IngestReport;
pub use list::{ListItem, ListMetadata, ListRequest, ListResponse};
pub use search::{RetrievalEngine, SearchItem, SearchRequest, SearchResponse, SearchStrategy};
pub use update::{UpdateResourceRequest, UpdateResourceResponse, WriteReport};

use std::sync::Arc;

use warden_config::Config;
use warden_domain::{AccessPolicy, Metadata, MetadataRecord};
use warden_providers::HashEmbedder;
use warden_storage::{DocumentStore, VectorIndex};

/// Ingestion, retrieval and maintenance over one access policy and one shared index handle.
pub struct WardenService {
	pub cfg: Config,
	pub policy: Arc<AccessPolicy>,
	pub store: DocumentStore,
	pub engine: RetrievalEngine,
}
impl WardenService {
	/// Loads the policy and opens the index described by `cfg`.
	pub fn open(cfg: Config) -> Result<Self> {
		let policy = AccessPolicy::load(&cfg.policy.path)?;
		let embedder = HashEmbedder::from_config(&cfg.embedding)?;
		let index = warden_storage::open_index(&cfg.storage, Arc::new(embedder))?;

		Self::with_index(cfg, policy, index)
	}

	pub fn with_index(
		cfg: Config,
		policy: AccessPolicy,
		index: Arc<dyn VectorIndex>,
	) -> Result<Self> {
		let store = DocumentStore::new(index);
		let engine = RetrievalEngine::new(store.clone(), &cfg.search)?;

		Ok(Self { cfg, policy: Arc::new(policy), store, engine })
	}

	pub fn search(&self, req: SearchRequest) -> Result<SearchResponse> {
		self.engine.search(&req)
	}
}

pub(crate) fn require_principal(principal: &str) -> Result<&str> {
	let trimmed = principal.trim();

	if trimmed.is_empty() {
		return Err(Error::InvalidRequest {
			message: "principal must not be empty when provided.".to_string(),
		});
	}

	Ok(trimmed)
}

/// Decodes stored flat metadata. Empty metadata is `None`; anything else must decode.
pub(crate) fn decode_stored(id: &str, fields: &Metadata) -> Result<Option<MetadataRecord>> {
	if fields.is_empty() {
		return Ok(None);
	}

	MetadataRecord::from_fields(fields).map(Some).map_err(|err| Error::Storage {
		message: format!("Document {id} has undecodable metadata: {err}"),
	})
}
