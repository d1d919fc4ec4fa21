//! Application state and dependency injection.

mod auth_keys;
mod session_guard;

pub use auth_keys::AuthKeys;
pub use session_guard::{OperationKind, OperationPermit, SessionGuard};

use std::sync::Arc;

use voltra_engine::ingest::CsvIngestor;
use voltra_engine::pipeline::ExecutionPipeline;
use voltra_engine::retrieval::RetrievalOrchestrator;
use voltra_postgres::PgClient;
use voltra_rig::ChatComposer;
use voltra_rig::provider::EmbeddingProvider;
use voltra_rig::router::QueryRouter;
use voltra_sandbox::SandboxClient;
use voltra_vector::VectorStore;

/// Application state.
///
/// Used for the [`State`] extraction (dependency injection).
///
/// [`State`]: axum::extract::State
#[must_use = "state does nothing unless you use it"]
#[derive(Clone)]
pub struct ServiceState {
    // External services:
    pub postgres: PgClient,
    pub vector: Arc<VectorStore>,
    pub sandbox: SandboxClient,

    // Orchestration services:
    pub retrieval: Arc<RetrievalOrchestrator>,
    pub pipeline: Arc<ExecutionPipeline>,
    pub ingestor: Arc<CsvIngestor>,
    pub router: Arc<QueryRouter>,
    pub composer: Arc<ChatComposer>,
    pub embeddings: Arc<EmbeddingProvider>,

    // Internal services:
    pub guard: SessionGuard,
    pub auth: AuthKeys,
}

impl ServiceState {
    /// Assembles application state from its parts.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        postgres: PgClient,
        vector: Arc<VectorStore>,
        sandbox: SandboxClient,
        retrieval: Arc<RetrievalOrchestrator>,
        pipeline: Arc<ExecutionPipeline>,
        ingestor: Arc<CsvIngestor>,
        router: Arc<QueryRouter>,
        composer: Arc<ChatComposer>,
        embeddings: Arc<EmbeddingProvider>,
        auth: AuthKeys,
    ) -> Self {
        Self {
            postgres,
            vector,
            sandbox,
            retrieval,
            pipeline,
            ingestor,
            router,
            composer,
            embeddings,
            guard: SessionGuard::new(),
            auth,
        }
    }
}

macro_rules! impl_di {
    ($($f:ident: $t:ty),+ $(,)?) => {$(
        impl axum::extract::FromRef<ServiceState> for $t {
            fn from_ref(state: &ServiceState) -> Self {
                state.$f.clone()
            }
        }
    )+};
}

impl_di!(postgres: PgClient);
impl_di!(sandbox: SandboxClient);
impl_di!(guard: SessionGuard);
impl_di!(auth: AuthKeys);
