//! Trigram embedding provider using hashed character trigrams.

use crate::embeddings::provider::EmbeddingProvider;
use civic_core::AppResult;
use std::collections::BTreeMap;

/// Model identifier recorded in stores built with this provider.
pub const TRIGRAM_MODEL: &str = "trigram-v1";

const STOP_WORDS: &[&str] = &[
    "the", "is", "at", "which", "on", "a", "an", "as", "are", "was", "were", "for", "to", "of",
    "in", "and", "or", "but", "with", "by", "from", "this", "that", "be", "have", "has", "had",
    "it", "its", "their", "they", "them", "how", "do", "does", "what", "where", "when", "can",
];

/// Trigram-based embedding provider for local, offline operation.
///
/// Deterministic and content-dependent, but not semantic: texts sharing
/// words or word fragments land close together. Suitable for development,
/// demos without a model server, and tests.
#[derive(Debug)]
pub struct TrigramProvider {
    dimensions: usize,
}

impl TrigramProvider {
    /// Create a new trigram provider with specified dimensions.
    pub fn new(dimensions: usize) -> Self {
        Self { dimensions }
    }

    fn embed_text(&self, text: &str) -> Vec<f32> {
        let mut embedding = vec![0.0f32; self.dimensions];
        if self.dimensions == 0 {
            return embedding;
        }

        let lower = text.to_lowercase();
        let mut word_freq: BTreeMap<&str, u32> = BTreeMap::new();
        for word in lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|w| w.chars().count() > 2 && !STOP_WORDS.contains(w))
        {
            *word_freq.entry(word).or_insert(0) += 1;
        }

        for (word, freq) in &word_freq {
            let chars: Vec<char> = word.chars().collect();
            let weight = (*freq as f32).sqrt();

            for window in chars.windows(3) {
                let slot = bucket(window.iter().collect::<String>().as_bytes(), 37, self.dimensions);
                embedding[slot] += weight;
            }

            // Whole-word feature
            embedding[bucket(word.as_bytes(), 31, self.dimensions)] += *freq as f32;
        }

        normalize(&mut embedding);
        embedding
    }
}

fn bucket(bytes: &[u8], multiplier: u64, dimensions: usize) -> usize {
    let hash = bytes
        .iter()
        .fold(0u64, |acc, b| acc.wrapping_mul(multiplier).wrapping_add(*b as u64));
    (hash % dimensions as u64) as usize
}

fn normalize(vector: &mut [f32]) {
    let norm: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for v in vector.iter_mut() {
            *v /= norm;
        }
    }
}

#[async_trait::async_trait]
impl EmbeddingProvider for TrigramProvider {
    fn provider_name(&self) -> &str {
        "trigram"
    }

    fn model_name(&self) -> &str {
        TRIGRAM_MODEL
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn embed_batch(&self, texts: &[String]) -> AppResult<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|text| self.embed_text(text)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    fn dot(a: &[f32], b: &[f32]) -> f32 {
        a.iter().zip(b).map(|(x, y)| x * y).sum()
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_single() {
        let provider = TrigramProvider::new(384);
        let embedding = provider.embed("garbage collection schedule").await.unwrap();

        assert_eq!(embedding.len(), 384);
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }

    #[tokio::test]
    async fn test_trigram_provider_embed_batch() {
        let provider = TrigramProvider::new(384);
        let texts = vec![
            "building permit".to_string(),
            "parking ticket".to_string(),
            "library hours".to_string(),
        ];

        let embeddings = provider.embed_batch(&texts).await.unwrap();
        assert_eq!(embeddings.len(), 3);
        assert!(embeddings.iter().all(|e| e.len() == 384));
    }

    #[tokio::test]
    async fn test_trigram_provider_deterministic() {
        let provider = TrigramProvider::new(384);
        let first = provider.embed("recycling pickup").await.unwrap();
        let second = provider.embed("recycling pickup").await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_colliding_slots_sum_in_a_fixed_order() {
        // Few dimensions force many words into the same slots
        let provider = TrigramProvider::new(8);
        let text = "library parking museum transit recycling permit council \
                    library library museum harbour stadium ferry taxes";

        let expected: Vec<u32> = provider.embed(text).await.unwrap().iter().map(|v| v.to_bits()).collect();
        for _ in 0..20 {
            let again: Vec<u32> = provider.embed(text).await.unwrap().iter().map(|v| v.to_bits()).collect();
            assert_eq!(again, expected);
        }
    }

    #[tokio::test]
    async fn test_shared_words_score_higher() {
        let provider = TrigramProvider::new(512);
        let query = provider.embed("How do I apply for a building permit?").await.unwrap();
        let permit = provider
            .embed("Title: Building Permit\nCategory: permits\nApply online at city hall.")
            .await
            .unwrap();
        let parks = provider
            .embed("Title: Dog Parks\nCategory: parks\nLeashes required on trails.")
            .await
            .unwrap();

        assert!(dot(&query, &permit) > dot(&query, &parks));
    }

    #[tokio::test]
    async fn test_trigram_provider_empty_text() {
        let provider = TrigramProvider::new(64);
        let embedding = provider.embed("").await.unwrap();
        assert_eq!(embedding.len(), 64);
        assert!(embedding.iter().all(|&x| x == 0.0));
    }

    #[tokio::test]
    async fn test_trigram_provider_utf8_safety() {
        let provider = TrigramProvider::new(128);
        let embedding = provider
            .embed("Prefeitura de São Paulo 🏙️ horário de atendimento")
            .await
            .unwrap();
        assert!((norm(&embedding) - 1.0).abs() < 0.001);
    }
}
