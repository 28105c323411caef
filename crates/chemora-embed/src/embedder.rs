//! Text embedders.

use chemora_common::tokenize;
use rayon::prelude::*;

use crate::similarity::l2_normalize;
use crate::{EmbedError, Result};

/// Weight of a whole-token feature relative to its character trigrams.
const TOKEN_WEIGHT: f32 = 1.0;
const TRIGRAM_WEIGHT: f32 = 0.5;

/// Maps text to a fixed-dimension dense vector.
///
/// `id` names the embedding function. Two embedders with the same id must
/// produce identical vectors for identical text; indexes record it so that
/// vectors from different functions are never compared.
pub trait Embedder: Send + Sync {
    fn id(&self) -> String;

    fn dim(&self) -> usize;

    /// Embed one text. Fails on text with nothing to embed.
    fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed many texts; order is preserved.
    fn embed_batch(&self, texts: &[String]) -> Vec<Result<Vec<f32>>> {
        texts.par_iter().map(|t| self.embed(t)).collect()
    }
}

/// Signed feature hashing over word tokens and their character trigrams.
///
/// Deterministic and model-free: the same text always yields the same
/// L2-normalized vector, so indexes can be rebuilt anywhere.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dim: usize,
}

impl HashingEmbedder {
    pub fn new(dim: usize) -> Result<Self> {
        if dim == 0 {
            return Err(EmbedError::InvalidInput("embedding dimension must be positive".into()));
        }
        Ok(Self { dim })
    }

    fn add_feature(&self, v: &mut [f32], feature: &str, weight: f32) {
        let hash = fnv64(feature.as_bytes());
        let slot = (hash % self.dim as u64) as usize;
        let sign = if hash >> 63 == 1 { -1.0 } else { 1.0 };
        v[slot] += sign * weight;
    }
}

impl Embedder for HashingEmbedder {
    fn id(&self) -> String {
        format!("hashing-fnv1a-v1/{}", self.dim)
    }

    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Err(EmbedError::InvalidInput("no embeddable tokens".into()));
        }

        let mut v = vec![0.0f32; self.dim];
        for token in &tokens {
            self.add_feature(&mut v, token, TOKEN_WEIGHT);
            let padded: Vec<char> = format!("^{token}$").chars().collect();
            for gram in padded.windows(3) {
                let gram: String = gram.iter().collect();
                self.add_feature(&mut v, &gram, TRIGRAM_WEIGHT);
            }
        }
        l2_normalize(&mut v);
        Ok(v)
    }
}

/// FNV-1a 64-bit hash.
fn fnv64(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 14695981039346656037;
    for &byte in bytes {
        hash ^= byte as u64;
        hash = hash.wrapping_mul(1099511628211);
    }
    hash
}
