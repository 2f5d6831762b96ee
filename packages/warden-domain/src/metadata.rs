//! Flat, index-facing document metadata.
//!
//! The backing index only supports scalar metadata values and equality predicates, so each
//! record carries one boolean `{principal}_access` field per known principal alongside the
//! JSON-encoded permission mapping.

use std::{collections::BTreeMap, fs, path::Path};

use serde::{Deserialize, Serialize};
use time::{OffsetDateTime, format_description::well_known::Rfc3339};

use crate::{AccessPolicy, Error, ResourcePermissions, Result, mime};

pub const METADATA_VERSION: &str = "1.0";

const ACCESS_SUFFIX: &str = "_access";
const FIELD_FILENAME: &str = "filename";
const FIELD_PATH: &str = "path";
const FIELD_PERMISSIONS: &str = "permissions";
const FIELD_CREATED_AT: &str = "created_at";
const FIELD_UPDATED_AT: &str = "updated_at";
const FIELD_CONTENT_TYPE: &str = "content_type";
const FIELD_FILE_SIZE: &str = "file_size";
const FIELD_CONTENT_LENGTH: &str = "content_length";
const FIELD_METADATA_VERSION: &str = "metadata_version";

pub type Metadata = BTreeMap<String, MetadataValue>;

#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(untagged)]
pub enum MetadataValue {
	Bool(bool),
	Int(i64),
	Float(f64),
	Str(String),
}
impl MetadataValue {
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(value) => Some(value),
			_ => None,
		}
	}

	pub fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(value) => Some(*value),
			_ => None,
		}
	}

	pub fn as_i64(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			_ => None,
		}
	}
}
impl From<bool> for MetadataValue {
	fn from(value: bool) -> Self {
		Self::Bool(value)
	}
}
impl From<i64> for MetadataValue {
	fn from(value: i64) -> Self {
		Self::Int(value)
	}
}
impl From<f64> for MetadataValue {
	fn from(value: f64) -> Self {
		Self::Float(value)
	}
}
impl From<String> for MetadataValue {
	fn from(value: String) -> Self {
		Self::Str(value)
	}
}
impl From<&str> for MetadataValue {
	fn from(value: &str) -> Self {
		Self::Str(value.to_string())
	}
}

/// Returns the flat field name holding the visibility flag for `principal`.
pub fn flag_field(principal: &str) -> String {
	format!("{principal}{ACCESS_SUFFIX}")
}

#[derive(Clone, Debug, PartialEq)]
pub struct MetadataRecord {
	pub filename: String,
	pub path: String,
	pub permissions: ResourcePermissions,
	pub created_at: OffsetDateTime,
	pub updated_at: OffsetDateTime,
	pub content_type: String,
	pub file_size: u64,
	pub content_length: u64,
	pub metadata_version: String,
	/// Visibility flag per principal, keyed by principal.
	pub access: BTreeMap<String, bool>,
}
impl MetadataRecord {
	pub fn is_visible_to(&self, principal: &str) -> bool {
		self.permissions.contains_key(principal)
	}

	pub fn to_fields(&self) -> Result<Metadata> {
		let permissions = serde_json::to_string(&self.permissions).map_err(|err| {
			Error::InvalidMetadata { message: format!("Failed to encode permissions: {err}.") }
		})?;
		let mut fields = Metadata::new();

		fields.insert(FIELD_FILENAME.to_string(), self.filename.as_str().into());
		fields.insert(FIELD_PATH.to_string(), self.path.as_str().into());
		fields.insert(FIELD_PERMISSIONS.to_string(), permissions.into());
		fields.insert(FIELD_CREATED_AT.to_string(), format_timestamp(self.created_at)?.into());
		fields.insert(FIELD_UPDATED_AT.to_string(), format_timestamp(self.updated_at)?.into());
		fields.insert(FIELD_CONTENT_TYPE.to_string(), self.content_type.as_str().into());
		fields.insert(FIELD_FILE_SIZE.to_string(), to_int(FIELD_FILE_SIZE, self.file_size)?.into());
		fields.insert(
			FIELD_CONTENT_LENGTH.to_string(),
			to_int(FIELD_CONTENT_LENGTH, self.content_length)?.into(),
		);
		fields.insert(FIELD_METADATA_VERSION.to_string(), self.metadata_version.as_str().into());

		for (principal, visible) in &self.access {
			fields.insert(flag_field(principal), (*visible).into());
		}

		Ok(fields)
	}

	pub fn from_fields(fields: &Metadata) -> Result<Self> {
		let permissions_raw = required_str(fields, FIELD_PERMISSIONS)?;
		let permissions = serde_json::from_str(permissions_raw).map_err(|err| {
			Error::InvalidMetadata {
				message: format!("Field permissions is not valid JSON: {err}."),
			}
		})?;
		let mut access = BTreeMap::new();

		for (key, value) in fields {
			if let Some(principal) = key.strip_suffix(ACCESS_SUFFIX)
				&& !principal.is_empty()
				&& let MetadataValue::Bool(visible) = value
			{
				access.insert(principal.to_string(), *visible);
			}
		}

		Ok(Self {
			filename: required_str(fields, FIELD_FILENAME)?.to_string(),
			path: required_str(fields, FIELD_PATH)?.to_string(),
			permissions,
			created_at: required_timestamp(fields, FIELD_CREATED_AT)?,
			updated_at: required_timestamp(fields, FIELD_UPDATED_AT)?,
			content_type: required_str(fields, FIELD_CONTENT_TYPE)?.to_string(),
			file_size: required_size(fields, FIELD_FILE_SIZE)?,
			content_length: required_size(fields, FIELD_CONTENT_LENGTH)?,
			metadata_version: required_str(fields, FIELD_METADATA_VERSION)?.to_string(),
			access,
		})
	}
}

#[derive(Clone, Debug)]
pub struct BuildRequest<'a> {
	pub document_id: &'a str,
	/// Content already in hand. When absent the builder reads `resource_path`.
	pub content: Option<&'a str>,
	pub resource_path: &'a str,
	/// Overrides the grants configured for `resource_path`.
	pub explicit_permissions: Option<ResourcePermissions>,
	pub preserve_created_at: Option<OffsetDateTime>,
}

pub struct MetadataBuilder<'a> {
	policy: &'a AccessPolicy,
}
impl<'a> MetadataBuilder<'a> {
	pub fn new(policy: &'a AccessPolicy) -> Self {
		Self { policy }
	}

	pub fn build(&self, req: BuildRequest<'_>) -> MetadataRecord {
		let now = OffsetDateTime::now_utc();
		let permissions = req
			.explicit_permissions
			.unwrap_or_else(|| self.policy.get_permissions(req.resource_path));
		let access = self
			.policy
			.known_principals()
			.into_iter()
			.map(|principal| {
				let visible = permissions.contains_key(&principal);

				(principal, visible)
			})
			.collect();
		let (file_size, content_length) = match req.content {
			Some(content) => (content.len() as u64, content.chars().count() as u64),
			None => describe_file(req.resource_path),
		};
		let filename = Path::new(req.resource_path)
			.file_name()
			.map(|name| name.to_string_lossy().into_owned())
			.unwrap_or_else(|| req.document_id.to_string());

		MetadataRecord {
			filename,
			path: req.resource_path.to_string(),
			permissions,
			created_at: req.preserve_created_at.unwrap_or(now),
			updated_at: now,
			content_type: mime::guess_content_type(req.resource_path).to_string(),
			file_size,
			content_length,
			metadata_version: METADATA_VERSION.to_string(),
			access,
		}
	}
}

fn describe_file(path: &str) -> (u64, u64) {
	match fs::read(path) {
		Ok(bytes) => {
			let content_length = String::from_utf8_lossy(&bytes).chars().count() as u64;

			(bytes.len() as u64, content_length)
		},
		Err(err) => {
			tracing::debug!(path, error = %err, "Resource is unreadable. Recording zero sizes.");

			(0, 0)
		},
	}
}

fn format_timestamp(value: OffsetDateTime) -> Result<String> {
	value
		.to_offset(time::UtcOffset::UTC)
		.format(&Rfc3339)
		.map_err(|err| Error::InvalidMetadata {
			message: format!("Failed to format timestamp: {err}."),
		})
}

fn to_int(field: &str, value: u64) -> Result<i64> {
	i64::try_from(value)
		.map_err(|_| Error::InvalidMetadata { message: format!("Field {field} is out of range.") })
}

fn required<'a>(fields: &'a Metadata, field: &str) -> Result<&'a MetadataValue> {
	fields
		.get(field)
		.ok_or_else(|| Error::InvalidMetadata { message: format!("Field {field} is missing.") })
}

fn required_str<'a>(fields: &'a Metadata, field: &str) -> Result<&'a str> {
	required(fields, field)?
		.as_str()
		.ok_or_else(|| Error::InvalidMetadata {
			message: format!("Field {field} must be a string."),
		})
}

fn required_timestamp(fields: &Metadata, field: &str) -> Result<OffsetDateTime> {
	OffsetDateTime::parse(required_str(fields, field)?, &Rfc3339).map_err(|err| {
		Error::InvalidMetadata {
			message: format!("Field {field} is not an RFC 3339 timestamp: {err}."),
		}
	})
}

fn required_size(fields: &Metadata, field: &str) -> Result<u64> {
	let value = required(fields, field)?.as_i64().ok_or_else(|| Error::InvalidMetadata {
		message: format!("Field {field} must be an integer."),
	})?;

	u64::try_from(value).map_err(|_| Error::InvalidMetadata {
		message: format!("Field {field} must be non-negative."),
	})
}
