pub mod embedding;

mod error;

pub use embedding::{Embedder, HashEmbedder};
pub use error::{Error, Result};
