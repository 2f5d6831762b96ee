pub mod documents;
pub mod index;
pub mod memory;
pub mod sqlite;

mod error;

pub use documents::{DocumentStore, StoredDocument, WriteOperation};
pub use error::{Error, Result};
pub use index::{
	Condition, DistanceMetric, Filter, IndexEntry, IndexMode, IndexRecord, ScoredRecord,
	VectorIndex, open_index,
};
