#![forbid(unsafe_code)]
#![cfg_attr(docsrs, feature(doc_cfg))]
#![doc = include_str!("../README.md")]

mod config;
mod server;

use std::process;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use voltra_engine::ingest::CsvIngestor;
use voltra_engine::pipeline::{ExecutionPipeline, PgSourceCatalog};
use voltra_engine::retrieval::{
    RelationalTextStrategy, RelationalVectorStrategy, RetrievalOrchestrator, RetrievalStrategy,
    VectorBackendStrategy,
};
use voltra_postgres::PgClient;
use voltra_rig::ChatComposer;
use voltra_rig::codegen::CodeGenerator;
use voltra_rig::provider::{CompletionProvider, EmbeddingProvider};
use voltra_rig::router::QueryRouter;
use voltra_sandbox::{SandboxClient, SandboxCredentials};
use voltra_server::service::{AuthKeys, ServiceState};
use voltra_vector::{
    EMBEDDING_DIMENSIONS, PgVectorConfig, QdrantConfig, VectorStore, VectorStoreConfig,
};

use crate::config::{Cli, LlmVendor, VectorBackend};

/// Tracing target for server startup.
pub const TRACING_TARGET_STARTUP: &str = "voltra_cli::startup";

/// Tracing target for server shutdown.
pub const TRACING_TARGET_SHUTDOWN: &str = "voltra_cli::shutdown";

#[tokio::main]
async fn main() {
    let Err(error) = run().await else {
        tracing::info!(
            target: TRACING_TARGET_SHUTDOWN,
            "application terminated successfully"
        );
        process::exit(0);
    };

    if tracing::enabled!(tracing::Level::ERROR) {
        tracing::error!(
            target: TRACING_TARGET_SHUTDOWN,
            error = %error,
            "application terminated with error"
        );
    } else {
        eprintln!("Error: {error:#}");
    }

    process::exit(1);
}

/// Main application entry point.
async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing();

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        version = env!("CARGO_PKG_VERSION"),
        bind = %cli.server.bind_address(),
        "Starting voltra server"
    );

    let state = build_service_state(&cli).await?;
    let router = server::build_router(state);

    server::serve(router, &cli.server).await
}

/// Initializes the tracing subscriber.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,voltra=debug"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Connects every external service and assembles the application state.
async fn build_service_state(cli: &Cli) -> anyhow::Result<ServiceState> {
    // Database
    let postgres = PgClient::connect(cli.postgres.clone())
        .await
        .context("failed to connect to postgres")?;
    postgres
        .run_pending_migrations()
        .await
        .context("failed to run migrations")?;

    // Vector store
    let vector_config = match cli.vector.backend {
        VectorBackend::Qdrant => {
            let mut config = QdrantConfig::new(&cli.vector.qdrant_url);
            if let Some(api_key) = &cli.vector.qdrant_api_key {
                config = config.with_api_key(api_key);
            }
            VectorStoreConfig::Qdrant(config)
        }
        VectorBackend::Pgvector => VectorStoreConfig::PgVector(PgVectorConfig::new(
            &cli.postgres.postgres_url,
            EMBEDDING_DIMENSIONS,
        )),
    };
    let vector = Arc::new(
        VectorStore::new(vector_config)
            .await
            .context("failed to initialize vector store")?,
    );

    // Sandbox executor
    let sandbox_config = voltra_sandbox::SandboxConfig::builder()
        .with_base_url(&cli.sandbox.url)
        .map_err(|e| anyhow::anyhow!(e))?
        .with_memory_limit_mb(cli.sandbox.memory_limit_mb)
        .build()
        .map_err(|e| anyhow::anyhow!(e))?;
    let sandbox_credentials = match &cli.sandbox.token {
        Some(token) => SandboxCredentials::bearer_token(token),
        None => SandboxCredentials::none(),
    };
    let sandbox = SandboxClient::new(sandbox_config, sandbox_credentials)
        .context("failed to create sandbox client")?;

    // LLM providers
    let completion = build_completion_provider(cli, &cli.llm.model)?;
    let router_completion = build_completion_provider(cli, &cli.router.model)?;

    let openai_key = cli
        .llm
        .openai_api_key
        .as_deref()
        .context("OPENAI_API_KEY is required for embeddings")?;
    let embeddings = Arc::new(
        EmbeddingProvider::openai(openai_key, voltra_core::emb::DEFAULT_EMBEDDING_MODEL)
            .context("failed to create embedding provider")?,
    );

    // Orchestration services
    let router = Arc::new(QueryRouter::new(
        voltra_rig::router::RouterConfig {
            spellcheck: cli.router.spellcheck,
            use_llm: cli.router.use_llm,
        },
        Some(router_completion),
    ));
    let composer = Arc::new(ChatComposer::new(completion.clone()));
    let generator = CodeGenerator::new(completion);

    let retrieval = Arc::new(RetrievalOrchestrator::new(vec![
        Box::new(VectorBackendStrategy::new(vector.clone())) as Box<dyn RetrievalStrategy>,
        Box::new(RelationalVectorStrategy::new(postgres.clone())),
        Box::new(RelationalTextStrategy::new(postgres.clone())),
    ]));

    let pipeline = Arc::new(ExecutionPipeline::new(
        Box::new(PgSourceCatalog::new(postgres.clone())),
        Box::new(generator),
        Box::new(sandbox.clone()),
    ));

    let ingestor = Arc::new(CsvIngestor::new(
        postgres.clone(),
        vector.clone(),
        embeddings.clone() as Arc<dyn voltra_core::emb::EmbeddingProvider>,
    ));

    let auth = AuthKeys::parse(&cli.api_tokens).map_err(|e| anyhow::anyhow!(e))?;
    anyhow::ensure!(!auth.is_empty(), "at least one API token must be configured");

    tracing::info!(
        target: TRACING_TARGET_STARTUP,
        tokens = auth.len(),
        "Service state assembled"
    );

    Ok(ServiceState::new(
        postgres, vector, sandbox, retrieval, pipeline, ingestor, router, composer, embeddings,
        auth,
    ))
}

/// Builds a completion provider for the configured vendor.
fn build_completion_provider(cli: &Cli, model: &str) -> anyhow::Result<CompletionProvider> {
    match cli.llm.vendor {
        LlmVendor::Openai => {
            let api_key = cli
                .llm
                .openai_api_key
                .as_deref()
                .context("OPENAI_API_KEY is required for the openai provider")?;
            Ok(CompletionProvider::openai(api_key, model)?)
        }
        LlmVendor::Anthropic => {
            let api_key = cli
                .llm
                .anthropic_api_key
                .as_deref()
                .context("ANTHROPIC_API_KEY is required for the anthropic provider")?;
            Ok(CompletionProvider::anthropic(api_key, model)?)
        }
    }
}
