use std::{fs, path::PathBuf};

use serde::{Deserialize, Serialize};

use warden_domain::{BuildRequest, MetadataBuilder};

use crate::{Error, Result, WardenService};

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct IngestReport {
	pub dir: PathBuf,
	pub ids: Vec<String>,
}
impl IngestReport {
	pub fn indexed(&self) -> usize {
		self.ids.len()
	}
}

impl WardenService {
	/// Upserts every regular file in `resources.dir`, keyed by file name, with metadata resolved
	/// from the access policy.
	pub fn index_directory(&self) -> Result<IngestReport> {
		let dir = self.cfg.resources.dir.clone();
		let entries = fs::read_dir(&dir).map_err(|err| Error::NotFound {
			message: format!("Resources directory {} is unreadable: {err}.", dir.display()),
		})?;
		let mut files = Vec::new();

		for entry in entries {
			let entry = entry?;

			if entry.file_type()?.is_file() {
				files.push(entry.path());
			}
		}

		files.sort();

		let builder = MetadataBuilder::new(&self.policy);
		let mut ids = Vec::with_capacity(files.len());
		let mut documents = Vec::with_capacity(files.len());
		let mut metadatas = Vec::with_capacity(files.len());

		for path in files {
			let Some(id) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
				continue;
			};
			let content = fs::read_to_string(&path)?;
			let resource_path = path.to_string_lossy().into_owned();
			let record = builder.build(BuildRequest {
				document_id: &id,
				content: Some(&content),
				resource_path: &resource_path,
				explicit_permissions: None,
				preserve_created_at: None,
			});

			ids.push(id);
			documents.push(content);
			metadatas.push(record);
		}

		if !ids.is_empty() {
			self.store.upsert(&ids, &documents, Some(metadatas.as_slice()))?;
		}

		tracing::info!(count = ids.len(), dir = %dir.display(), "Indexed resource directory.");

		Ok(IngestReport { dir, ids })
	}
}
