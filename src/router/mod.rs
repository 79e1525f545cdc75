//! Semantic routing: pick the candidate whose embedding is closest to the
//! query's.
//!
//! [`route`] is the pure selection step over precomputed vectors.
//! [`PromptRouter`] owns a candidate set embedded once at registration and
//! drives an [`Embedder`](crate::embedding::Embedder) for the query.

pub mod prompt;

pub use prompt::{PromptRouter, RouteDecision};

use crate::error::RouteError;
use serde::{Deserialize, Serialize};

/// A labeled prompt template with its precomputed embedding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub label: String,
    pub template: String,
    pub embedding: Vec<f32>,
}

impl Candidate {
    pub fn new(label: impl Into<String>, template: impl Into<String>, embedding: Vec<f32>) -> Self {
        Self {
            label: label.into(),
            template: template.into(),
            embedding,
        }
    }

    /// Fill every `{query}` placeholder in the template.
    pub fn render(&self, query: &str) -> String {
        self.template.replace("{query}", query)
    }
}

/// Cosine similarity of two vectors; 0 when either norm is 0.
///
/// Callers are expected to pass equal-length slices; extra trailing
/// components of the longer slice are ignored.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    dot / (norm_a * norm_b)
}

/// Similarity of the query against every candidate, in input order.
pub fn score(query_embedding: &[f32], candidates: &[Candidate]) -> Result<Vec<f32>, RouteError> {
    check_inputs(query_embedding, candidates)?;
    Ok(candidates
        .iter()
        .map(|c| cosine_similarity(query_embedding, &c.embedding))
        .collect())
}

/// Select the most similar candidate. Ties go to the earliest candidate.
pub fn route<'a>(
    query_embedding: &[f32],
    candidates: &'a [Candidate],
) -> Result<&'a Candidate, RouteError> {
    let (idx, _) = best_match(query_embedding, candidates)?;
    Ok(&candidates[idx])
}

/// Index and similarity of the winning candidate.
pub fn best_match(
    query_embedding: &[f32],
    candidates: &[Candidate],
) -> Result<(usize, f32), RouteError> {
    let scores = score(query_embedding, candidates)?;

    let mut best = (0, scores[0]);
    for (idx, &s) in scores.iter().enumerate().skip(1) {
        // Strict comparison keeps the first of equal scores
        if s > best.1 {
            best = (idx, s);
        }
    }
    Ok(best)
}

fn check_inputs(query_embedding: &[f32], candidates: &[Candidate]) -> Result<(), RouteError> {
    if candidates.is_empty() {
        return Err(RouteError::InvalidInput(
            "candidate set is empty".to_string(),
        ));
    }

    for candidate in candidates {
        if candidate.embedding.len() != query_embedding.len() {
            return Err(RouteError::InvalidInput(format!(
                "candidate '{}' has dimension {} but the query has dimension {}",
                candidate.label,
                candidate.embedding.len(),
                query_embedding.len()
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn physics_and_math() -> Vec<Candidate> {
        vec![
            Candidate::new("physics", "physics: {query}", vec![1.0, 0.0]),
            Candidate::new("math", "math: {query}", vec![0.0, 1.0]),
        ]
    }

    #[test]
    fn picks_most_similar_candidate() {
        let candidates = physics_and_math();
        let chosen = route(&[0.9, 0.1], &candidates).unwrap();
        assert_eq!(chosen.label, "physics");

        let scores = score(&[0.9, 0.1], &candidates).unwrap();
        assert!((scores[0] - 0.994).abs() < 0.001);
        assert!((scores[1] - 0.110).abs() < 0.001);
    }

    #[test]
    fn routing_is_deterministic() {
        let candidates = physics_and_math();
        let first = route(&[0.2, 0.8], &candidates).unwrap().label.clone();
        for _ in 0..10 {
            assert_eq!(route(&[0.2, 0.8], &candidates).unwrap().label, first);
        }
        assert_eq!(first, "math");
    }

    #[test]
    fn ties_go_to_first_candidate() {
        let candidates = vec![
            Candidate::new("first", "", vec![1.0, 1.0]),
            Candidate::new("second", "", vec![2.0, 2.0]),
        ];
        assert_eq!(route(&[3.0, 3.0], &candidates).unwrap().label, "first");
    }

    #[test]
    fn empty_candidate_set_is_invalid_input() {
        let err = route(&[1.0, 0.0], &[]).unwrap_err();
        assert!(matches!(err, RouteError::InvalidInput(_)));
    }

    #[test]
    fn dimension_mismatch_is_invalid_input() {
        let candidates = vec![
            Candidate::new("ok", "", vec![1.0, 0.0]),
            Candidate::new("bad", "", vec![1.0, 0.0, 0.0]),
        ];
        let err = route(&[1.0, 0.0], &candidates).unwrap_err();
        assert!(err.to_string().contains("'bad'"));
    }

    #[test]
    fn zero_query_scores_zero_everywhere_and_picks_first() {
        let candidates = physics_and_math();
        assert_eq!(score(&[0.0, 0.0], &candidates).unwrap(), vec![0.0, 0.0]);
        assert_eq!(route(&[0.0, 0.0], &candidates).unwrap().label, "physics");
    }

    #[test]
    fn cosine_similarity_bounds() {
        assert!((cosine_similarity(&[1.0, 2.0], &[1.0, 2.0]) - 1.0).abs() < 1e-6);
        assert!((cosine_similarity(&[1.0, 0.0], &[-1.0, 0.0]) + 1.0).abs() < 1e-6);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[0.0, 1.0]), 0.0);
    }

    #[test]
    fn render_fills_every_placeholder() {
        let c = Candidate::new("x", "Q: {query}\nAgain: {query}", vec![]);
        assert_eq!(c.render("why?"), "Q: why?\nAgain: why?");
    }
}
