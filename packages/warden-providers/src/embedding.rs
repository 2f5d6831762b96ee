use crate::{Error, Result};

const HASH_EMBEDDER_VERSION: &str = "hash-blake3-v1";

/// Turns text into fixed-width vectors. Implementations must be deterministic for a given
/// `version()`; stored vectors are only comparable across identical versions.
pub trait Embedder: Send + Sync {
	fn dimensions(&self) -> usize;

	fn version(&self) -> &str;

	fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

/// Bag-of-tokens embedder. Each lowercased alphanumeric token is hashed into a bucket and the
/// resulting vector is L2 normalized.
#[derive(Clone, Debug)]
pub struct HashEmbedder {
	dimensions: usize,
}
impl HashEmbedder {
	pub fn new(dimensions: usize) -> Result<Self> {
		if dimensions == 0 {
			return Err(Error::InvalidConfig {
				message: "Embedding dimensions must be greater than zero.".to_string(),
			});
		}

		Ok(Self { dimensions })
	}

	pub fn from_config(cfg: &warden_config::Embedding) -> Result<Self> {
		Self::new(cfg.dimensions as usize)
	}

	fn embed_one(&self, text: &str) -> Vec<f32> {
		let mut vec = vec![0.0_f32; self.dimensions];

		for token in tokenize(text) {
			let hash = blake3::hash(token.as_bytes());
			let bytes = hash.as_bytes();
			let bucket = u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) as usize
				% self.dimensions;

			vec[bucket] += 1.0;
		}

		normalize(&mut vec);

		vec
	}
}
impl Embedder for HashEmbedder {
	fn dimensions(&self) -> usize {
		self.dimensions
	}

	fn version(&self) -> &str {
		HASH_EMBEDDER_VERSION
	}

	fn embed(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
		Ok(texts.iter().map(|text| self.embed_one(text)).collect())
	}
}

pub fn tokenize(text: &str) -> Vec<String> {
	text.to_lowercase()
		.split(|c: char| !c.is_alphanumeric())
		.filter(|token| !token.is_empty())
		.map(str::to_string)
		.collect()
}

fn normalize(vec: &mut [f32]) {
	let norm = vec.iter().map(|x| x * x).sum::<f32>().sqrt();

	if norm > 0.0 {
		for value in vec {
			*value /= norm;
		}
	}
}
