//! Local hybrid scoring: BM25 keyword scores fused with vector similarity.
//!
//! Fusion follows Weaviate's relative score fusion: each score list is
//! min-max normalised to `[0, 1]`, then combined as
//! `alpha * vector + (1 - alpha) * keyword`.

use std::collections::{HashMap, HashSet};

/// Term frequency saturation.
const K1: f32 = 1.2;
/// Length normalisation.
const B: f32 = 0.75;

/// Lowercase alphanumeric tokens.
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_lowercase())
        .collect()
}

/// BM25 scores of `query` against every document in `docs`, in input order.
pub fn bm25_scores(query: &str, docs: &[&str]) -> Vec<f32> {
    if docs.is_empty() {
        return Vec::new();
    }

    let query_terms: HashSet<String> = tokenize(query).into_iter().collect();
    if query_terms.is_empty() {
        return vec![0.0; docs.len()];
    }

    let tokenized: Vec<Vec<String>> = docs.iter().map(|d| tokenize(d)).collect();
    let n = docs.len() as f32;
    let avg_len = tokenized.iter().map(|t| t.len()).sum::<usize>() as f32 / n;

    let mut doc_freq: HashMap<&str, usize> = HashMap::new();
    for tokens in &tokenized {
        let unique: HashSet<&str> = tokens.iter().map(|t| t.as_str()).collect();
        for term in unique {
            if query_terms.contains(term) {
                *doc_freq.entry(term).or_insert(0) += 1;
            }
        }
    }

    tokenized
        .iter()
        .map(|tokens| {
            let len = tokens.len() as f32;
            let mut tf: HashMap<&str, usize> = HashMap::new();
            for t in tokens {
                if query_terms.contains(t.as_str()) {
                    *tf.entry(t.as_str()).or_insert(0) += 1;
                }
            }

            tf.iter()
                .map(|(term, &freq)| {
                    let df = doc_freq.get(term).copied().unwrap_or(0) as f32;
                    let idf = ((n - df + 0.5) / (df + 0.5) + 1.0).ln();
                    let freq = freq as f32;
                    let norm = if avg_len > 0.0 { len / avg_len } else { 0.0 };
                    idf * (freq * (K1 + 1.0)) / (freq + K1 * (1.0 - B + B * norm))
                })
                .sum::<f32>()
        })
        .collect()
}

/// Min-max normalise scores into `[0, 1]`.
///
/// A flat list maps to `1.0` when its value is positive and `0.0` otherwise.
pub fn normalize(scores: &[f32]) -> Vec<f32> {
    let min = scores.iter().copied().fold(f32::INFINITY, f32::min);
    let max = scores.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let range = max - min;

    scores
        .iter()
        .map(|&s| {
            if range > f32::EPSILON {
                (s - min) / range
            } else if max > 0.0 {
                1.0
            } else {
                0.0
            }
        })
        .collect()
}

/// Fuse vector and keyword scores with the given weight toward vectors.
pub fn fuse(vector_scores: &[f32], keyword_scores: &[f32], alpha: f32) -> Vec<f32> {
    let vector = normalize(vector_scores);
    let keyword = normalize(keyword_scores);

    vector
        .iter()
        .zip(keyword.iter())
        .map(|(v, k)| alpha * v + (1.0 - alpha) * k)
        .collect()
}
