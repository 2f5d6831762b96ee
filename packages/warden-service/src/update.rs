use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use warden_domain::{BuildRequest, MetadataBuilder, MetadataRecord, ResourcePermissions};
use warden_storage::WriteOperation;

use crate::{Error, Result, WardenService};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UpdateResourceRequest {
	pub path: String,
	/// Replaces the grants configured in the access policy for this resource.
	pub permissions: Option<ResourcePermissions>,
	/// Create the document when it is not indexed yet instead of failing.
	#[serde(default)]
	pub upsert_if_missing: bool,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct UpdateResourceResponse {
	pub id: String,
	pub created: bool,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub updated_at: OffsetDateTime,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct WriteReport {
	pub operation: String,
	pub count: usize,
}

impl WardenService {
	/// Re-reads a resource file and rewrites its document. The stored `created_at` survives.
	pub fn update_resource(&self, req: UpdateResourceRequest) -> Result<UpdateResourceResponse> {
		let path = Path::new(&req.path);

		if !path.is_file() {
			return Err(Error::NotFound { message: format!("File not found: {}.", req.path) });
		}

		let Some(id) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
			return Err(Error::InvalidRequest {
				message: format!("Path {} has no file name.", req.path),
			});
		};
		let existing = self.store.get(Some(std::slice::from_ref(&id)))?.into_iter().next();

		if existing.is_none() && !req.upsert_if_missing {
			return Err(Error::NotFound {
				message: format!(
					"Document '{id}' is not indexed. Set upsert_if_missing to create it."
				),
			});
		}

		let preserve_created_at = match &existing {
			Some(doc) =>
				crate::decode_stored(&doc.id, &doc.fields)?.map(|record| record.created_at),
			None => None,
		};
		let content = fs::read_to_string(path)?;
		let record = MetadataBuilder::new(&self.policy).build(BuildRequest {
			document_id: &id,
			content: Some(&content),
			resource_path: &req.path,
			explicit_permissions: req.permissions,
			preserve_created_at,
		});
		let operation =
			if req.upsert_if_missing { WriteOperation::Upsert } else { WriteOperation::Update };

		self.store.write(
			operation,
			std::slice::from_ref(&id),
			std::slice::from_ref(&content),
			Some(std::slice::from_ref(&record)),
		)?;

		Ok(UpdateResourceResponse {
			id,
			created: existing.is_none(),
			created_at: record.created_at,
			updated_at: record.updated_at,
		})
	}

	/// Batch write with an explicit operation name: `add`, `update`, or `upsert`.
	pub fn write_documents(
		&self,
		operation: &str,
		ids: &[String],
		documents: &[String],
		metadatas: Option<&[MetadataRecord]>,
	) -> Result<WriteReport> {
		let operation = operation.trim().parse::<WriteOperation>()?;

		self.store.write(operation, ids, documents, metadatas)?;

		Ok(WriteReport { operation: operation.as_str().to_string(), count: ids.len() })
	}
}
