//! Prompt router over a registered candidate set.

use super::{best_match, Candidate};
use crate::config::RouteEntry;
use crate::embedding::Embedder;
use crate::error::RouteError;
use crate::types::Query;
use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{debug, info};

/// Outcome of routing one query.
#[derive(Debug, Clone, Serialize)]
pub struct RouteDecision {
    pub label: String,
    pub score: f32,
    /// The winning template with the query filled in.
    pub prompt: String,
}

/// Routes queries among candidates embedded once at registration.
///
/// The candidate set is fixed after construction; `route` takes `&self` and
/// keeps no state between calls.
#[derive(Debug, Clone)]
pub struct PromptRouter {
    candidates: Vec<Candidate>,
}

impl PromptRouter {
    /// Build from candidates whose embeddings were computed elsewhere.
    pub fn new(candidates: Vec<Candidate>) -> Result<Self, RouteError> {
        if candidates.is_empty() {
            return Err(RouteError::InvalidInput(
                "candidate set is empty".to_string(),
            ));
        }
        Ok(Self { candidates })
    }

    /// Embed every route template once and register the result.
    pub async fn from_templates(embedder: &dyn Embedder, routes: &[RouteEntry]) -> Result<Self> {
        if routes.is_empty() {
            return Err(RouteError::InvalidInput("no routes configured".to_string()).into());
        }

        let templates: Vec<String> = routes.iter().map(|r| r.template.clone()).collect();
        let embeddings = embedder
            .embed_batch(&templates)
            .await
            .context("Failed to embed route templates")?;

        if embeddings.len() != routes.len() {
            return Err(RouteError::InvalidInput(format!(
                "embedder returned {} vectors for {} routes",
                embeddings.len(),
                routes.len()
            ))
            .into());
        }

        let candidates = routes
            .iter()
            .zip(embeddings)
            .map(|(r, e)| Candidate::new(r.label.clone(), r.template.clone(), e))
            .collect();

        debug!(
            "Registered {} routes with model: {}",
            routes.len(),
            embedder.model_name()
        );
        Ok(Self::new(candidates)?)
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Embed the query and select the closest candidate.
    pub async fn route(&self, embedder: &dyn Embedder, query: &Query) -> Result<RouteDecision> {
        let query_embedding = embedder
            .embed(&query.text)
            .await
            .context("Failed to embed query")?;

        Ok(self.route_embedding(&query_embedding, query)?)
    }

    /// Select using an already-computed query embedding.
    pub fn route_embedding(
        &self,
        query_embedding: &[f32],
        query: &Query,
    ) -> Result<RouteDecision, RouteError> {
        let (idx, score) = best_match(query_embedding, &self.candidates)?;
        let chosen = &self.candidates[idx];

        info!("Routed query to '{}' (similarity {:.3})", chosen.label, score);

        Ok(RouteDecision {
            label: chosen.label.clone(),
            score,
            prompt: chosen.render(&query.text),
        })
    }
}
