//! The analytical code-execution pipeline.
//!
//! Resolves data-file descriptors, classifies the query into a
//! code-generation category, generates Python, executes it in the sandbox,
//! and selects one produced visualization. Every failure inside the
//! pipeline is captured into a structured result with `success: false`; the
//! only hard error is invalid input.

mod select;

pub use select::select_visualization;

use std::collections::HashMap;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use voltra_postgres::PgClient;
use voltra_postgres::query::DataSourceRepository;
use voltra_rig::codegen::{CodeCategory, CodeGenerator, DataFileContext, GeneratedCode};
use voltra_sandbox::{
    ExecuteOptions, ExecutionResult, SandboxClient, VisualizationArtifact, VisualizationFormat,
};

use crate::{EngineError, EngineResult, TRACING_TARGET, parse_data_source_ids};

/// Output truncation applied unless raw output is requested.
const MAX_OUTPUT_CHARS: usize = 1000;

/// Resolves the files backing a set of data sources.
#[async_trait]
pub trait SourceCatalog: Send + Sync {
    /// Returns one descriptor per file-backed data source, organization
    /// scoped.
    async fn resolve_files(
        &self,
        organization_id: i64,
        data_source_ids: &[i64],
    ) -> EngineResult<Vec<DataFileContext>>;
}

/// Generates analysis code for a query.
#[async_trait]
pub trait GeneratesCode: Send + Sync {
    /// Generates Python source for the query over the given files.
    async fn generate(
        &self,
        query: &str,
        category: CodeCategory,
        files: &[DataFileContext],
    ) -> EngineResult<GeneratedCode>;
}

/// Executes code in a sandboxed environment.
#[async_trait]
pub trait ExecutesCode: Send + Sync {
    /// Runs the code and returns its captured result.
    async fn execute(&self, code: &str, options: ExecuteOptions) -> EngineResult<ExecutionResult>;
}

/// Caller options for a pipeline run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Preferred visualization format, matched exactly before the default
    /// priority order applies.
    pub preferred_format: Option<VisualizationFormat>,
    /// Skip the 1000-character output truncation.
    pub return_raw_output: bool,
    /// Execution timeout override in seconds.
    pub timeout_secs: Option<u64>,
    /// Memory limit override in megabytes.
    pub memory_limit_mb: Option<u64>,
}

/// The structured outcome of a pipeline run.
///
/// Ephemeral: not persisted beyond the response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineResult {
    /// The generated code, when generation succeeded.
    pub generated_code: Option<GeneratedCode>,
    /// Captured stdout (truncated unless raw output was requested).
    pub stdout: String,
    /// Captured stderr (truncated unless raw output was requested).
    pub stderr: String,
    /// The selected visualization, if any were produced.
    pub visualization: Option<VisualizationArtifact>,
    /// Natural-language explanation; carries the error message on failure.
    pub explanation: String,
    /// Whether the full pipeline succeeded.
    pub success: bool,
    /// Wall-clock pipeline time in seconds.
    pub elapsed_secs: f64,
    /// The data sources the pipeline ran over.
    pub data_source_ids: Vec<i64>,
}

impl PipelineResult {
    fn failure(explanation: String, data_source_ids: Vec<i64>, started: Instant) -> Self {
        Self {
            generated_code: None,
            stdout: String::new(),
            stderr: String::new(),
            visualization: None,
            explanation,
            success: false,
            elapsed_secs: started.elapsed().as_secs_f64(),
            data_source_ids,
        }
    }
}

/// Orchestrates the analytical path.
pub struct ExecutionPipeline {
    catalog: Box<dyn SourceCatalog>,
    generator: Box<dyn GeneratesCode>,
    executor: Box<dyn ExecutesCode>,
}

impl ExecutionPipeline {
    /// Creates a pipeline over its three collaborators.
    pub fn new(
        catalog: Box<dyn SourceCatalog>,
        generator: Box<dyn GeneratesCode>,
        executor: Box<dyn ExecutesCode>,
    ) -> Self {
        Self {
            catalog,
            generator,
            executor,
        }
    }

    /// Runs the pipeline for a query.
    ///
    /// Invalid data-source ids are the only hard error; everything after
    /// input validation is captured into the result.
    pub async fn execute(
        &self,
        organization_id: i64,
        query: &str,
        raw_data_source_ids: &[String],
        options: PipelineOptions,
    ) -> EngineResult<PipelineResult> {
        let started = Instant::now();
        let data_source_ids = parse_data_source_ids(raw_data_source_ids)?;

        match self
            .run_inner(organization_id, query, &data_source_ids, &options, started)
            .await
        {
            Ok(result) => Ok(result),
            Err(e) if e.is_invalid_input() => Err(e),
            Err(e) => {
                tracing::warn!(
                    target: TRACING_TARGET,
                    error = %e,
                    "Pipeline failed, returning structured failure"
                );
                Ok(PipelineResult::failure(
                    format!("Analysis failed: {e}"),
                    data_source_ids,
                    started,
                ))
            }
        }
    }

    async fn run_inner(
        &self,
        organization_id: i64,
        query: &str,
        data_source_ids: &[i64],
        options: &PipelineOptions,
        started: Instant,
    ) -> EngineResult<PipelineResult> {
        let files = self
            .catalog
            .resolve_files(organization_id, data_source_ids)
            .await?;

        let category = CodeCategory::classify(&query.to_lowercase());

        tracing::debug!(
            target: TRACING_TARGET,
            category = %category,
            files = files.len(),
            "Starting code-execution pipeline"
        );

        let generated = self.generator.generate(query, category, &files).await?;

        let mut environment = HashMap::new();
        for (index, file) in files.iter().enumerate() {
            environment.insert(format!("DATA_FILE_{index}"), file.path.clone());
        }

        let mut execute_options = ExecuteOptions {
            environment,
            save_visualization: true,
            ..ExecuteOptions::default()
        };
        if let Some(timeout_secs) = options.timeout_secs {
            execute_options.timeout_secs = timeout_secs;
        }
        if let Some(memory_limit_mb) = options.memory_limit_mb {
            execute_options.memory_limit_mb = Some(memory_limit_mb);
        }

        let execution = self
            .executor
            .execute(&generated.source, execute_options)
            .await?;

        let visualization =
            select_visualization(execution.visualizations, options.preferred_format);

        let (stdout, stderr) = if options.return_raw_output {
            (execution.stdout, execution.stderr)
        } else {
            (
                truncate_output(&execution.stdout),
                truncate_output(&execution.stderr),
            )
        };

        let explanation = if execution.success {
            match &visualization {
                Some(artifact) => format!(
                    "Ran {} analysis over {} file(s); produced a {} visualization.",
                    generated.category,
                    files.len(),
                    artifact.format
                ),
                None => format!(
                    "Ran {} analysis over {} file(s).",
                    generated.category,
                    files.len()
                ),
            }
        } else {
            format!(
                "Generated code failed to execute: {}",
                execution.error.as_deref().unwrap_or("unknown error")
            )
        };

        Ok(PipelineResult {
            generated_code: Some(generated),
            stdout,
            stderr,
            visualization,
            explanation,
            success: execution.success,
            elapsed_secs: started.elapsed().as_secs_f64(),
            data_source_ids: data_source_ids.to_vec(),
        })
    }
}

/// Truncates captured output to [`MAX_OUTPUT_CHARS`] characters.
fn truncate_output(output: &str) -> String {
    if output.chars().count() <= MAX_OUTPUT_CHARS {
        return output.to_string();
    }

    let truncated: String = output.chars().take(MAX_OUTPUT_CHARS).collect();
    format!("{truncated}… [truncated]")
}

/// Production catalog backed by the data-sources table.
pub struct PgSourceCatalog {
    pg: PgClient,
}

impl PgSourceCatalog {
    /// Creates a catalog over a database client.
    pub fn new(pg: PgClient) -> Self {
        Self { pg }
    }
}

#[async_trait]
impl SourceCatalog for PgSourceCatalog {
    async fn resolve_files(
        &self,
        organization_id: i64,
        data_source_ids: &[i64],
    ) -> EngineResult<Vec<DataFileContext>> {
        let mut conn = self.pg.get_connection().await?;
        let sources = conn
            .find_data_sources_by_ids(organization_id, data_source_ids)
            .await?;

        if sources.is_empty() {
            let first = data_source_ids.first().copied().unwrap_or_default();
            return Err(EngineError::SourceNotFound(first));
        }

        Ok(sources
            .into_iter()
            .filter_map(|source| {
                source.file_path.clone().map(|path| DataFileContext {
                    path,
                    file_type: source.source_type.clone(),
                    collection: source.collection_name.clone(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl GeneratesCode for CodeGenerator {
    async fn generate(
        &self,
        query: &str,
        category: CodeCategory,
        files: &[DataFileContext],
    ) -> EngineResult<GeneratedCode> {
        CodeGenerator::generate(self, query, category, files)
            .await
            .map_err(EngineError::from)
    }
}

#[async_trait]
impl ExecutesCode for SandboxClient {
    async fn execute(&self, code: &str, options: ExecuteOptions) -> EngineResult<ExecutionResult> {
        self.execute_code(code, options)
            .await
            .map_err(EngineError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct StubCatalog;

    #[async_trait]
    impl SourceCatalog for StubCatalog {
        async fn resolve_files(
            &self,
            _organization_id: i64,
            data_source_ids: &[i64],
        ) -> EngineResult<Vec<DataFileContext>> {
            Ok(data_source_ids
                .iter()
                .map(|id| DataFileContext {
                    path: format!("/data/source_{id}.csv"),
                    file_type: "csv".into(),
                    collection: format!("datasource_{id}"),
                })
                .collect())
        }
    }

    struct StubGenerator;

    #[async_trait]
    impl GeneratesCode for StubGenerator {
        async fn generate(
            &self,
            _query: &str,
            category: CodeCategory,
            _files: &[DataFileContext],
        ) -> EngineResult<GeneratedCode> {
            Ok(GeneratedCode {
                source: "import pandas as pd".into(),
                category,
                model: "stub-model".into(),
            })
        }
    }

    struct StubExecutor {
        result: ExecutionResult,
    }

    #[async_trait]
    impl ExecutesCode for StubExecutor {
        async fn execute(
            &self,
            _code: &str,
            _options: ExecuteOptions,
        ) -> EngineResult<ExecutionResult> {
            Ok(self.result.clone())
        }
    }

    struct FailingExecutor;

    #[async_trait]
    impl ExecutesCode for FailingExecutor {
        async fn execute(
            &self,
            _code: &str,
            _options: ExecuteOptions,
        ) -> EngineResult<ExecutionResult> {
            Err(EngineError::Sandbox(
                voltra_sandbox::SandboxError::api_error(503, "sandbox down"),
            ))
        }
    }

    fn artifact(name: &str, format: VisualizationFormat) -> VisualizationArtifact {
        VisualizationArtifact {
            name: name.into(),
            format,
            mime_type: format.mime_type().into(),
            data: "payload".into(),
        }
    }

    fn pipeline(executor: Box<dyn ExecutesCode>) -> ExecutionPipeline {
        ExecutionPipeline::new(Box::new(StubCatalog), Box::new(StubGenerator), executor)
    }

    #[tokio::test]
    async fn test_visualization_query_prefers_html_over_png() {
        let executor = StubExecutor {
            result: ExecutionResult {
                stdout: "saved two plots".into(),
                stderr: String::new(),
                success: true,
                execution_time: 0.8,
                files: vec![],
                visualizations: vec![
                    artifact("plot.png", VisualizationFormat::Png),
                    artifact("plot.html", VisualizationFormat::Html),
                ],
                error: None,
            },
        };

        let result = pipeline(Box::new(executor))
            .execute(
                1,
                "Plot monthly usage per customer",
                &["7".into(), "8".into()],
                PipelineOptions::default(),
            )
            .await
            .unwrap();

        assert!(result.success);
        let generated = result.generated_code.expect("code present");
        assert_eq!(generated.category, CodeCategory::Visualization);

        let visualization = result.visualization.expect("visualization selected");
        assert_eq!(visualization.format, VisualizationFormat::Html);
        assert_eq!(result.data_source_ids, vec![7, 8]);
    }

    #[tokio::test]
    async fn test_invalid_id_is_hard_error() {
        let executor = StubExecutor {
            result: ExecutionResult {
                stdout: String::new(),
                stderr: String::new(),
                success: true,
                execution_time: 0.0,
                files: vec![],
                visualizations: vec![],
                error: None,
            },
        };

        let result = pipeline(Box::new(executor))
            .execute(1, "sum it", &["seven".into()], PipelineOptions::default())
            .await;

        assert!(matches!(result, Err(EngineError::InvalidDataSourceId(_))));
    }

    #[tokio::test]
    async fn test_sandbox_failure_becomes_structured_result() {
        let result = pipeline(Box::new(FailingExecutor))
            .execute(1, "sum usage", &["7".into()], PipelineOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.explanation.contains("Analysis failed"));
        assert_eq!(result.data_source_ids, vec![7]);
    }

    #[tokio::test]
    async fn test_failed_execution_embeds_error_in_explanation() {
        let executor = StubExecutor {
            result: ExecutionResult {
                stdout: String::new(),
                stderr: "Traceback ...".into(),
                success: false,
                execution_time: 0.1,
                files: vec![],
                visualizations: vec![],
                error: Some("KeyError: 'usage'".into()),
            },
        };

        let result = pipeline(Box::new(executor))
            .execute(1, "sum usage", &["7".into()], PipelineOptions::default())
            .await
            .unwrap();

        assert!(!result.success);
        assert!(result.explanation.contains("KeyError: 'usage'"));
    }

    #[tokio::test]
    async fn test_output_truncation() {
        let executor = StubExecutor {
            result: ExecutionResult {
                stdout: "x".repeat(5000),
                stderr: String::new(),
                success: true,
                execution_time: 0.1,
                files: vec![],
                visualizations: vec![],
                error: None,
            },
        };

        let result = pipeline(Box::new(executor))
            .execute(1, "sum usage", &["7".into()], PipelineOptions::default())
            .await
            .unwrap();

        assert!(result.stdout.chars().count() < 1100);
        assert!(result.stdout.ends_with("[truncated]"));
    }

    #[tokio::test]
    async fn test_raw_output_skips_truncation() {
        let executor = StubExecutor {
            result: ExecutionResult {
                stdout: "x".repeat(5000),
                stderr: String::new(),
                success: true,
                execution_time: 0.1,
                files: vec![],
                visualizations: vec![],
                error: None,
            },
        };

        let options = PipelineOptions {
            return_raw_output: true,
            ..Default::default()
        };

        let result = pipeline(Box::new(executor))
            .execute(1, "sum usage", &["7".into()], options)
            .await
            .unwrap();

        assert_eq!(result.stdout.len(), 5000);
    }

    #[test]
    fn test_truncate_respects_char_boundaries() {
        let output = "é".repeat(2000);
        let truncated = truncate_output(&output);
        assert!(truncated.ends_with("[truncated]"));
        assert!(truncated.chars().count() < 1100);
    }
}
