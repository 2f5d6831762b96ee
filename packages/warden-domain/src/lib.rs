pub mod acl;
pub mod metadata;
pub mod mime;

mod error;

pub use acl::{AccessPolicy, PolicyDocument, ResourcePermissions};
pub use error::{Error, Result};
pub use metadata::{
	BuildRequest, METADATA_VERSION, Metadata, MetadataBuilder, MetadataRecord, MetadataValue,
};
