//! Command-line and environment configuration.

use clap::{Args, Parser, ValueEnum};
use voltra_postgres::PgConfig;

/// Voltra platform server.
#[derive(Debug, Parser)]
#[command(name = "voltra", version, about)]
pub struct Cli {
    /// HTTP server settings.
    #[command(flatten)]
    pub server: ServerConfig,

    /// Database settings.
    #[command(flatten)]
    pub postgres: PgConfig,

    /// Vector store settings.
    #[command(flatten)]
    pub vector: VectorConfig,

    /// LLM provider settings.
    #[command(flatten)]
    pub llm: LlmConfig,

    /// Query router settings.
    #[command(flatten)]
    pub router: RouterConfig,

    /// Sandbox executor settings.
    #[command(flatten)]
    pub sandbox: SandboxConfig,

    /// API token registry: `orgId:token,orgId:token`.
    #[arg(long = "api-tokens", env = "VOLTRA_API_TOKENS")]
    pub api_tokens: String,
}

/// HTTP server settings.
#[derive(Debug, Clone, Args)]
pub struct ServerConfig {
    /// Bind address.
    #[arg(long = "host", env = "VOLTRA_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Bind port.
    #[arg(long = "port", env = "VOLTRA_PORT", default_value = "8080")]
    pub port: u16,
}

impl ServerConfig {
    /// Returns the socket address string to bind.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Which vector backend serves tier-1 retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum VectorBackend {
    /// Qdrant over gRPC.
    Qdrant,
    /// pgvector tables in the main database.
    Pgvector,
}

/// Vector store settings.
#[derive(Debug, Clone, Args)]
pub struct VectorConfig {
    /// Vector backend to use.
    #[arg(
        long = "vector-backend",
        env = "VECTOR_BACKEND",
        value_enum,
        default_value = "qdrant"
    )]
    pub backend: VectorBackend,

    /// Qdrant gRPC URL.
    #[arg(
        long = "qdrant-url",
        env = "QDRANT_URL",
        default_value = "http://localhost:6334"
    )]
    pub qdrant_url: String,

    /// Qdrant API key.
    #[arg(long = "qdrant-api-key", env = "QDRANT_API_KEY")]
    pub qdrant_api_key: Option<String>,
}

/// Which vendor serves completions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LlmVendor {
    /// OpenAI models.
    Openai,
    /// Anthropic models.
    Anthropic,
}

/// LLM provider settings.
#[derive(Debug, Clone, Args)]
pub struct LlmConfig {
    /// Completion vendor.
    #[arg(
        long = "llm-provider",
        env = "LLM_PROVIDER",
        value_enum,
        default_value = "openai"
    )]
    pub vendor: LlmVendor,

    /// Completion model for answers and code generation.
    #[arg(long = "llm-model", env = "LLM_MODEL", default_value = "gpt-4o")]
    pub model: String,

    /// OpenAI API key (also used for embeddings).
    #[arg(long = "openai-api-key", env = "OPENAI_API_KEY")]
    pub openai_api_key: Option<String>,

    /// Anthropic API key.
    #[arg(long = "anthropic-api-key", env = "ANTHROPIC_API_KEY")]
    pub anthropic_api_key: Option<String>,
}

/// Query router settings.
#[derive(Debug, Clone, Args)]
pub struct RouterConfig {
    /// Spell-correct queries during preprocessing.
    #[arg(
        long = "router-spellcheck",
        env = "ROUTER_SPELLCHECK",
        action = clap::ArgAction::Set,
        default_value = "false"
    )]
    pub spellcheck: bool,

    /// Use the LLM classifier (falls back to the heuristic on failure).
    #[arg(
        long = "router-use-llm",
        env = "ROUTER_USE_LLM",
        action = clap::ArgAction::Set,
        default_value = "true"
    )]
    pub use_llm: bool,

    /// Model for routing classification.
    #[arg(long = "router-model", env = "ROUTER_MODEL", default_value = "gpt-4o-mini")]
    pub model: String,
}

/// Sandbox executor settings.
#[derive(Debug, Clone, Args)]
pub struct SandboxConfig {
    /// Sandbox base URL.
    #[arg(
        long = "sandbox-url",
        env = "SANDBOX_URL",
        default_value = "http://localhost:8000"
    )]
    pub url: String,

    /// Sandbox bearer token.
    #[arg(long = "sandbox-token", env = "SANDBOX_TOKEN")]
    pub token: Option<String>,

    /// Per-execution memory limit in megabytes.
    #[arg(
        long = "sandbox-memory-limit-mb",
        env = "SANDBOX_MEMORY_LIMIT_MB",
        default_value = "512"
    )]
    pub memory_limit_mb: u64,
}
