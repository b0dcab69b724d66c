//! Semantic memory records and nearest-neighbour lookup.

use serde::{Deserialize, Serialize};

/// A text snippet stored in a named collection, optionally with an embedding
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    /// `{collection}:{key}`, unique per user.
    pub id: String,
    pub collection: String,
    pub key: String,
    pub text: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub external_source_name: Option<String>,
    #[serde(default)]
    pub additional_metadata: Option<String>,
    #[serde(default)]
    pub embedding: Option<Vec<f32>>,
    #[serde(default)]
    pub is_reference: bool,
}

impl MemoryRecord {
    pub fn new(collection: impl Into<String>, key: impl Into<String>, text: impl Into<String>) -> Self {
        let collection = collection.into();
        let key = key.into();
        Self {
            id: Self::record_id(&collection, &key),
            collection,
            key,
            text: text.into(),
            description: None,
            external_source_name: None,
            additional_metadata: None,
            embedding: None,
            is_reference: false,
        }
    }

    pub fn record_id(collection: &str, key: &str) -> String {
        format!("{collection}:{key}")
    }

    pub fn with_embedding(mut self, embedding: Vec<f32>) -> Self {
        self.embedding = Some(embedding);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Cosine similarity of two vectors. Zero when either is empty, all-zero,
/// or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let mut dot = 0.0f32;
    let mut norm_a = 0.0f32;
    let mut norm_b = 0.0f32;
    for (x, y) in a.iter().zip(b) {
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a.sqrt() * norm_b.sqrt())
}

/// The `limit` records most similar to `target` with a score of at least
/// `min_relevance`, best first. Records without an embedding are skipped.
pub fn nearest_matches<'a>(
    records: impl IntoIterator<Item = &'a MemoryRecord>,
    target: &[f32],
    limit: usize,
    min_relevance: f32,
) -> Vec<(&'a MemoryRecord, f32)> {
    let mut scored: Vec<(&MemoryRecord, f32)> = records
        .into_iter()
        .filter_map(|r| {
            let score = cosine_similarity(r.embedding.as_deref()?, target);
            (score >= min_relevance).then_some((r, score))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}

/// Records ranked by how many of the query's words they contain (text and
/// description, case-insensitive), best first. Records matching no word are
/// dropped.
pub fn keyword_matches<'a>(
    records: impl IntoIterator<Item = &'a MemoryRecord>,
    query: &str,
    limit: usize,
) -> Vec<(&'a MemoryRecord, f32)> {
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect();
    if terms.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(&MemoryRecord, f32)> = records
        .into_iter()
        .filter_map(|r| {
            let haystack = match &r.description {
                Some(d) => format!("{} {}", r.text, d).to_lowercase(),
                None => r.text.to_lowercase(),
            };
            let hits = terms.iter().filter(|t| haystack.contains(t.as_str())).count();
            (hits > 0).then(|| (r, hits as f32 / terms.len() as f32))
        })
        .collect();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1));
    scored.truncate(limit);
    scored
}
