//! Match orchestrator: the single entry point for scoring a postable against a
//! candidate, and for ranking one side against many records of the other.
//!
//! Flow per pair: reuse stored embeddings → embed whichever side lacks one →
//! cosine × 100 (clamped) → explanation from skill overlap. Any missing or
//! incompatible embedding degrades to the keyword fallback. Nothing here
//! returns an error to the caller.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::embedding::EmbeddingProvider;
use crate::matching::fallback::{self, MAX_SCORE};
use crate::matching::similarity::cosine_similarity;
use crate::matching::skills::{join_or_none, skill_overlap, SkillOverlap};
use crate::models::candidate::Candidate;
use crate::models::postable::{Postable, PostableKind};
use crate::models::StoredEmbedding;
use crate::store::{Document, DocumentStore, Filter, CANDIDATES};

// ────────────────────────────────────────────────────────────────────────────
// Outcomes
// ────────────────────────────────────────────────────────────────────────────

/// Why a pair was scored by keywords instead of embeddings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DegradeReason {
    EmbeddingUnavailable,
    DimensionMismatch,
}

impl fmt::Display for DegradeReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DegradeReason::EmbeddingUnavailable => write!(f, "embedding unavailable"),
            DegradeReason::DimensionMismatch => write!(f, "embedding dimensions differ"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ScoreOutcome {
    /// Cosine similarity of the two embeddings, scaled to [0, 100].
    Semantic { score: f64, explanation: String },
    /// Keyword fallback score.
    Degraded {
        reason: DegradeReason,
        score: f64,
        explanation: String,
    },
    /// The pair could not be scored at all (e.g. a malformed record). Scores 0.
    Failed { reason: String },
}

impl ScoreOutcome {
    pub fn score(&self) -> f64 {
        match self {
            ScoreOutcome::Semantic { score, .. } | ScoreOutcome::Degraded { score, .. } => *score,
            ScoreOutcome::Failed { .. } => 0.0,
        }
    }

    pub fn explanation(&self) -> String {
        match self {
            ScoreOutcome::Semantic { explanation, .. }
            | ScoreOutcome::Degraded { explanation, .. } => explanation.clone(),
            ScoreOutcome::Failed { reason } => {
                format!("An error occurred while computing the match score: {reason}")
            }
        }
    }

    pub fn method(&self) -> MatchMethod {
        match self {
            ScoreOutcome::Semantic { .. } => MatchMethod::Semantic,
            ScoreOutcome::Degraded { .. } => MatchMethod::Keyword,
            ScoreOutcome::Failed { .. } => MatchMethod::Error,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMethod {
    Semantic,
    Keyword,
    Error,
}

/// One row of a ranked list. `id` is the record on the "many" side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RankedMatch {
    pub id: Uuid,
    pub score: f64,
    pub explanation: String,
    pub method: MatchMethod,
}

impl RankedMatch {
    pub fn new(id: Uuid, outcome: &ScoreOutcome) -> Self {
        Self {
            id,
            score: outcome.score(),
            explanation: outcome.explanation(),
            method: outcome.method(),
        }
    }
}

/// Stable descending sort; equal scores keep arrival order.
pub fn sort_ranked(matches: &mut [RankedMatch]) {
    matches.sort_by(|a, b| b.score.total_cmp(&a.score));
}

fn semantic_explanation(score: f64, overlap: &SkillOverlap) -> String {
    format!(
        "Semantic match score: {:.1}%. Matched skills: {}. Missing skills: {}.",
        score,
        join_or_none(&overlap.matched),
        join_or_none(&overlap.missing)
    )
}

// ────────────────────────────────────────────────────────────────────────────
// Orchestrator
// ────────────────────────────────────────────────────────────────────────────

#[derive(Clone)]
pub struct MatchOrchestrator {
    embeddings: Arc<dyn EmbeddingProvider>,
    write_back: Option<Arc<dyn DocumentStore>>,
}

impl MatchOrchestrator {
    pub fn new(embeddings: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            embeddings,
            write_back: None,
        }
    }

    /// Persists every embedding generated while scoring, so a missing or
    /// stale vector costs one provider call per record rather than one per
    /// request.
    pub fn with_write_back(mut self, store: Arc<dyn DocumentStore>) -> Self {
        self.write_back = Some(store);
        self
    }

    /// Scores one postable/candidate pair. Never fails.
    pub async fn score(&self, postable: &Postable, candidate: &Candidate) -> ScoreOutcome {
        let postable_vector = self
            .resolve_embedding(
                postable.kind().collection(),
                postable.id(),
                postable.embedding(),
                || postable.searchable_text(),
            )
            .await;
        let candidate_vector = self
            .resolve_embedding(CANDIDATES, candidate.id, &candidate.embedding, || {
                candidate.searchable_text()
            })
            .await;

        if postable_vector.is_empty() || candidate_vector.is_empty() {
            return self.degrade(DegradeReason::EmbeddingUnavailable, postable, candidate);
        }

        if postable_vector.len() != candidate_vector.len() {
            warn!(
                postable_id = %postable.id(),
                candidate_id = %candidate.id,
                postable_dim = postable_vector.len(),
                candidate_dim = candidate_vector.len(),
                "Embedding dimension mismatch; using keyword fallback"
            );
            return self.degrade(DegradeReason::DimensionMismatch, postable, candidate);
        }

        let similarity = cosine_similarity(&postable_vector, &candidate_vector);
        let score = (similarity * 100.0).clamp(0.0, MAX_SCORE);
        let overlap = skill_overlap(postable.required_skills(), &candidate.skills);

        debug!(
            postable_id = %postable.id(),
            kind = postable.kind().label(),
            candidate_id = %candidate.id,
            similarity,
            score,
            "Semantic match scored"
        );

        ScoreOutcome::Semantic {
            score,
            explanation: semantic_explanation(score, &overlap),
        }
    }

    /// Ranks candidate records against one postable, best first.
    /// Undecodable records are kept as zero-score error rows.
    pub async fn rank_candidates(
        &self,
        postable: &Postable,
        candidates: &[Document],
    ) -> Vec<RankedMatch> {
        let mut ranked = Vec::with_capacity(candidates.len());

        for document in candidates {
            let outcome = match Candidate::from_document(document) {
                Ok(candidate) => self.score(postable, &candidate).await,
                Err(e) => {
                    warn!(candidate_id = %document.id, "Malformed candidate record: {e}");
                    ScoreOutcome::Failed {
                        reason: format!("malformed candidate record: {e}"),
                    }
                }
            };
            ranked.push(RankedMatch::new(document.id, &outcome));
        }

        sort_ranked(&mut ranked);
        ranked
    }

    /// Ranks job or project records against one candidate, best first.
    pub async fn rank_postables(
        &self,
        candidate: &Candidate,
        kind: PostableKind,
        postables: &[Document],
    ) -> Vec<RankedMatch> {
        let mut ranked = Vec::with_capacity(postables.len());

        for document in postables {
            let outcome = match Postable::from_document(kind, document) {
                Ok(postable) => self.score(&postable, candidate).await,
                Err(e) => {
                    warn!(postable_id = %document.id, ?kind, "Malformed postable record: {e}");
                    ScoreOutcome::Failed {
                        reason: format!("malformed {} record: {e}", kind.label()),
                    }
                }
            };
            ranked.push(RankedMatch::new(document.id, &outcome));
        }

        sort_ranked(&mut ranked);
        ranked
    }

    /// Stored vector when it is valid for the active model, otherwise a fresh
    /// embedding of the composed text. Empty text never reaches the provider.
    async fn resolve_embedding<F>(
        &self,
        collection: &str,
        id: Uuid,
        stored: &StoredEmbedding,
        compose: F,
    ) -> Vec<f32>
    where
        F: FnOnce() -> String,
    {
        if let Some(vector) = stored.usable_for(self.embeddings.model()) {
            return vector.to_vec();
        }

        let text = compose();
        if text.is_empty() {
            return Vec::new();
        }
        let vector = self.embeddings.embed(&text).await;
        if !vector.is_empty() {
            self.store_embedding(collection, id, &vector).await;
        }
        vector
    }

    /// Best effort: a failed write only means the next request re-embeds.
    async fn store_embedding(&self, collection: &str, id: Uuid, vector: &[f32]) {
        let Some(store) = &self.write_back else {
            return;
        };
        let patch = StoredEmbedding::generated(vector.to_vec(), self.embeddings.model()).to_patch();
        match store.update_one(collection, &Filter::by_id(id), &patch).await {
            Ok(true) => debug!(%id, collection, "Stored regenerated embedding"),
            Ok(false) => {}
            Err(e) => warn!(%id, collection, "Failed to store regenerated embedding: {e}"),
        }
    }

    fn degrade(
        &self,
        reason: DegradeReason,
        postable: &Postable,
        candidate: &Candidate,
    ) -> ScoreOutcome {
        let result = fallback::score_pair(postable, candidate);
        debug!(
            postable_id = %postable.id(),
            candidate_id = %candidate.id,
            score = result.score,
            %reason,
            "Keyword fallback scored"
        );
        ScoreOutcome::Degraded {
            reason,
            score: result.score,
            explanation: format!(
                "{} Scored by keywords: {reason}.",
                result.detailed_explanation()
            ),
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
