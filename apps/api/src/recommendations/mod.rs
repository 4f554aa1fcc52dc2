//! Recommendation persister: best-effort upsert of high-scoring matches.
//!
//! Records are keyed by `(subject_id, object_id, kind)`. Repeating a call with
//! the same inputs performs no writes; a changed score updates the existing
//! record in place. Records are never deleted here.

use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::matching::orchestrator::RankedMatch;
use crate::models::recommendation::{Recommendation, RecommendationKind};
use crate::store::{Document, DocumentStore, Filter, StoreError, RECOMMENDATIONS};

pub mod handlers;

/// Minimum score (inclusive, 0–100 scale) for a match to be persisted.
pub const RECOMMENDATION_THRESHOLD: f64 = 70.0;

const SCORE_EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertResult {
    Inserted(Uuid),
    Updated(Uuid),
    Unchanged(Uuid),
    BelowThreshold,
}

/// Candidate → postable pairing to persist.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RecommendationPair {
    pub subject_id: Uuid,
    pub object_id: Uuid,
    pub score: f64,
}

impl RecommendationPair {
    /// Pairs for a list of candidates ranked against one postable.
    pub fn for_postable(postable_id: Uuid, ranked: &[RankedMatch]) -> Vec<Self> {
        ranked
            .iter()
            .map(|m| Self {
                subject_id: m.id,
                object_id: postable_id,
                score: m.score,
            })
            .collect()
    }

    /// Pairs for a list of postables ranked against one candidate.
    pub fn for_candidate(candidate_id: Uuid, ranked: &[RankedMatch]) -> Vec<Self> {
        ranked
            .iter()
            .map(|m| Self {
                subject_id: candidate_id,
                object_id: m.id,
                score: m.score,
            })
            .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PersistSummary {
    pub inserted: usize,
    pub updated: usize,
    pub unchanged: usize,
    pub failed: usize,
}

#[derive(Clone)]
pub struct RecommendationPersister {
    store: Arc<dyn DocumentStore>,
}

impl RecommendationPersister {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    /// Upserts every pair at or above the threshold. Store failures are logged
    /// and counted, never returned.
    pub async fn persist(
        &self,
        kind: RecommendationKind,
        pairs: &[RecommendationPair],
    ) -> PersistSummary {
        let mut summary = PersistSummary::default();

        for pair in pairs.iter().filter(|p| p.score >= RECOMMENDATION_THRESHOLD) {
            match self
                .upsert_one(pair.subject_id, pair.object_id, kind, pair.score)
                .await
            {
                Ok(UpsertResult::Inserted(_)) => summary.inserted += 1,
                Ok(UpsertResult::Updated(_)) => summary.updated += 1,
                Ok(UpsertResult::Unchanged(_)) => summary.unchanged += 1,
                Ok(UpsertResult::BelowThreshold) => {}
                Err(e) => {
                    warn!(
                        subject_id = %pair.subject_id,
                        object_id = %pair.object_id,
                        kind = kind.as_str(),
                        "Failed to persist recommendation: {e}"
                    );
                    summary.failed += 1;
                }
            }
        }

        if summary.inserted + summary.updated > 0 {
            info!(
                kind = kind.as_str(),
                inserted = summary.inserted,
                updated = summary.updated,
                "Persisted recommendations"
            );
        }
        summary
    }

    /// Upserts a single recommendation. Scores below the threshold are ignored.
    ///
    /// A concurrent insert of the same key surfaces as `StoreError::Conflict`;
    /// in that case the winner's record is updated instead.
    pub async fn upsert_one(
        &self,
        subject_id: Uuid,
        object_id: Uuid,
        kind: RecommendationKind,
        score: f64,
    ) -> Result<UpsertResult, StoreError> {
        if score < RECOMMENDATION_THRESHOLD {
            return Ok(UpsertResult::BelowThreshold);
        }

        let key = natural_key(subject_id, object_id, kind);

        if let Some(existing) = self.store.find_one(RECOMMENDATIONS, &key).await? {
            return self.update_if_changed(&key, existing, score).await;
        }

        let now = Utc::now();
        let record = Recommendation {
            id: Uuid::new_v4(),
            subject_id,
            object_id,
            kind,
            score,
            created_at: now,
            updated_at: now,
        };

        match self
            .store
            .insert(RECOMMENDATIONS, &Document::from_record(record.id, &record)?)
            .await
        {
            Ok(()) => {
                debug!(%subject_id, %object_id, score, "Inserted recommendation");
                Ok(UpsertResult::Inserted(record.id))
            }
            Err(StoreError::Conflict(_)) => {
                let existing = self
                    .store
                    .find_one(RECOMMENDATIONS, &key)
                    .await?
                    .ok_or_else(|| StoreError::Conflict(RECOMMENDATIONS.to_string()))?;
                self.update_if_changed(&key, existing, score).await
            }
            Err(e) => Err(e),
        }
    }

    /// All recommendations for a candidate, best first.
    pub async fn list_for_subject(
        &self,
        subject_id: Uuid,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let filter = Filter::new().eq("subject_id", subject_id.to_string());
        let mut records = self
            .store
            .find_many(RECOMMENDATIONS, &filter)
            .await?
            .into_iter()
            .map(|doc| serde_json::from_value::<Recommendation>(doc.data))
            .collect::<Result<Vec<_>, _>>()?;

        records.sort_by(|a, b| b.score.total_cmp(&a.score));
        Ok(records)
    }

    async fn update_if_changed(
        &self,
        key: &Filter,
        existing: Document,
        score: f64,
    ) -> Result<UpsertResult, StoreError> {
        let record: Recommendation = serde_json::from_value(existing.data)?;

        if (record.score - score).abs() < SCORE_EPSILON {
            return Ok(UpsertResult::Unchanged(record.id));
        }

        let patch = serde_json::json!({
            "score": score,
            "updated_at": Utc::now(),
        });
        self.store.update_one(RECOMMENDATIONS, key, &patch).await?;
        debug!(id = %record.id, old = record.score, new = score, "Updated recommendation score");
        Ok(UpsertResult::Updated(record.id))
    }
}

fn natural_key(subject_id: Uuid, object_id: Uuid, kind: RecommendationKind) -> Filter {
    Filter::new()
        .eq("subject_id", subject_id.to_string())
        .eq("object_id", object_id.to_string())
        .eq("kind", kind.as_str())
}
