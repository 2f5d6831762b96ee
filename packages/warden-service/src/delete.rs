use serde::{Deserialize, Serialize};

use crate::{Result, WardenService};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeleteRequest {
	pub ids: Vec<String>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct DeleteResponse {
	/// Ids that were present before the delete.
	pub deleted: Vec<String>,
	pub remaining: usize,
}

impl WardenService {
	/// Deletes by id. Ids that are not indexed are ignored.
	pub fn delete_documents(&self, req: DeleteRequest) -> Result<DeleteResponse> {
		let deleted =
			self.store.get(Some(req.ids.as_slice()))?.into_iter().map(|doc| doc.id).collect();

		self.store.delete(&req.ids)?;

		Ok(DeleteResponse { deleted, remaining: self.store.count()? })
	}
}
