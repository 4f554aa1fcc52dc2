use std::sync::Arc;

use crate::auth::RevocationList;
use crate::config::Config;
use crate::embedding::EmbeddingProvider;
use crate::matching::orchestrator::MatchOrchestrator;
use crate::profiles::ProfileService;
use crate::recommendations::RecommendationPersister;
use crate::search::VectorSearchGateway;
use crate::store::DocumentStore;

/// Shared application state injected into all route handlers via Axum extractors.
/// Every collaborator sits behind a trait so tests can swap in fakes.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
    pub search: Arc<dyn VectorSearchGateway>,
    pub revocations: Arc<dyn RevocationList>,
    pub config: Config,
}

impl AppState {
    pub fn orchestrator(&self) -> MatchOrchestrator {
        MatchOrchestrator::new(self.embeddings.clone()).with_write_back(self.store.clone())
    }

    pub fn recommendations(&self) -> RecommendationPersister {
        RecommendationPersister::new(self.store.clone())
    }

    pub fn profiles(&self) -> ProfileService {
        ProfileService::new(self.store.clone(), self.embeddings.clone())
    }
}

#[cfg(test)]
impl AppState {
    /// In-memory state: unreachable vector search, empty revocation list.
    pub fn for_tests(
        store: Arc<dyn DocumentStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        AppState {
            store,
            embeddings,
            search: Arc::new(crate::search::testing::FailingGateway),
            revocations: Arc::new(crate::auth::testing::MemoryRevocationList::default()),
            config: Config::for_tests(),
        }
    }

    pub fn with_revocations(mut self, revocations: Arc<dyn RevocationList>) -> Self {
        self.revocations = revocations;
        self
    }
}
