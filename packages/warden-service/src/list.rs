use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use warden_domain::ResourcePermissions;

use crate::{Result, WardenService};

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ListRequest {
	/// Restrict the listing to these ids. `None` lists everything.
	pub ids: Option<Vec<String>>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListMetadata {
	pub filename: String,
	pub path: String,
	pub permissions: ResourcePermissions,
	pub content_type: String,
	pub file_size: u64,
	pub content_length: u64,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListItem {
	pub id: String,
	pub content: String,
	/// `None` for documents written without metadata.
	pub metadata: Option<ListMetadata>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct ListResponse {
	pub items: Vec<ListItem>,
}

impl WardenService {
	pub fn list_documents(&self, req: ListRequest) -> Result<ListResponse> {
		let docs = self.store.get(req.ids.as_deref())?;
		let mut items = Vec::with_capacity(docs.len());

		for doc in docs {
			let metadata = crate::decode_stored(&doc.id, &doc.fields)?.map(|record| ListMetadata {
				filename: record.filename,
				path: record.path,
				permissions: record.permissions,
				content_type: record.content_type,
				file_size: record.file_size,
				content_length: record.content_length,
				created_at: record.created_at,
				updated_at: record.updated_at,
			});

			items.push(ListItem { id: doc.id, content: doc.content, metadata });
		}

		Ok(ListResponse { items })
	}
}
