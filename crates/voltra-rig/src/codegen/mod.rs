//! Python code generation for the analytical path.
//!
//! The generator asks the completion provider for a self-contained script
//! that loads the data files directly (`pd.read_csv(path)`) and writes any
//! figures to the sandbox scratch directory.

use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, IntoStaticStr};

use crate::TRACING_TARGET;
use crate::provider::CompletionProvider;
use crate::text::strip_code_fences;
use crate::{Error, Result};

/// A data file available to generated code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DataFileContext {
    /// Absolute path of the file inside the sandbox.
    pub path: String,
    /// File kind ("csv", "spreadsheet", "database").
    pub file_type: String,
    /// The vector collection backing the same data source.
    pub collection: String,
}

/// The kind of code a query calls for.
///
/// Classified by keyword match; the first matching category wins and
/// everything else defaults to [`CodeCategory::Analysis`].
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, AsRefStr, Display, EnumString, IntoStaticStr,
    Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum CodeCategory {
    /// Chart or figure production.
    Visualization,
    /// Cleaning, reshaping, joining.
    DataPreparation,
    /// Hypothesis testing.
    StatisticalTest,
    /// Model fitting or prediction.
    MachineLearning,
    /// General computation.
    Analysis,
}

impl CodeCategory {
    /// Classifies a normalized query into a code-generation category.
    pub fn classify(normalized: &str) -> Self {
        const CATEGORIES: &[(CodeCategory, &[&str])] = &[
            (
                CodeCategory::Visualization,
                &[
                    "plot", "chart", "graph", "visualiz", "visualis", "histogram", "heatmap",
                    "scatter", "draw",
                ],
            ),
            (
                CodeCategory::DataPreparation,
                &[
                    "clean", "prepare", "transform", "merge", "join", "dedup", "normalize",
                    "pivot", "reshape",
                ],
            ),
            (
                CodeCategory::StatisticalTest,
                &[
                    "t-test", "hypothesis", "p-value", "significan", "anova", "chi-square",
                ],
            ),
            (
                CodeCategory::MachineLearning,
                &[
                    "predict", "forecast", "cluster", "classif", "regression", "train a model",
                ],
            ),
        ];

        for (category, keywords) in CATEGORIES {
            if keywords.iter().any(|keyword| normalized.contains(keyword)) {
                return *category;
            }
        }

        CodeCategory::Analysis
    }

    /// Category-specific generation instructions.
    fn instructions(&self) -> &'static str {
        match self {
            Self::Visualization => {
                "Produce exactly one figure answering the question. Save it with \
                 plt.savefig into the /scratch directory (or fig.write_html for \
                 interactive plotly output). Prefer HTML output for interactive \
                 charts."
            }
            Self::DataPreparation => {
                "Clean and reshape the data as requested, then print a concise \
                 summary of the resulting frame (shape, dtypes, head)."
            }
            Self::StatisticalTest => {
                "Run the appropriate statistical test with scipy and print the \
                 test statistic, p-value, and a one-line interpretation."
            }
            Self::MachineLearning => {
                "Fit the simplest adequate sklearn model, report its score on a \
                 holdout split, and print the key findings."
            }
            Self::Analysis => {
                "Compute the answer with pandas and print it, including any \
                 intermediate aggregates a reader would want to verify."
            }
        }
    }
}

/// Generated source with its classification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneratedCode {
    /// Python source text.
    pub source: String,
    /// The category the query was classified into.
    pub category: CodeCategory,
    /// The model that produced the code.
    pub model: String,
}

/// Generates analysis code via the completion provider.
#[derive(Debug, Clone)]
pub struct CodeGenerator {
    provider: CompletionProvider,
}

impl CodeGenerator {
    /// Creates a new generator.
    pub fn new(provider: CompletionProvider) -> Self {
        Self { provider }
    }

    /// Generates Python source for a query over the given files.
    pub async fn generate(
        &self,
        query: &str,
        category: CodeCategory,
        files: &[DataFileContext],
    ) -> Result<GeneratedCode> {
        if files.is_empty() {
            return Err(Error::codegen("no data files available for generation"));
        }

        let prompt = build_prompt(query, category, files);

        tracing::debug!(
            target: TRACING_TARGET,
            category = %category,
            files = files.len(),
            "Generating analysis code"
        );

        let content = self
            .provider
            .complete_with_temperature(&prompt, vec![], Some(0.0))
            .await?;

        let source = strip_code_fences(&content).to_string();

        if source.is_empty() {
            return Err(Error::codegen("model returned empty code"));
        }

        Ok(GeneratedCode {
            source,
            category,
            model: self.provider.model_name().to_string(),
        })
    }
}

/// Builds the generation prompt with the file context block.
fn build_prompt(query: &str, category: CodeCategory, files: &[DataFileContext]) -> String {
    let file_lines = files
        .iter()
        .map(|f| format!("- {} ({}), load it directly, e.g. pd.read_csv({:?})", f.path, f.file_type, f.path))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "You are a senior data analyst writing Python for a sandboxed runtime \
         with pandas, numpy, matplotlib, seaborn, plotly, scipy, and sklearn \
         preloaded.\n\n\
         Available data files:\n{file_lines}\n\n\
         Task category: {category}\n{instructions}\n\n\
         Rules: output only Python code, no prose and no markdown fences. Load \
         the files directly from the paths above. Write any produced files \
         into /scratch.\n\n\
         Question: {query}",
        instructions = category.instructions(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_visualization_first() {
        // "plot" and "predict" both match; visualization is checked first
        assert_eq!(
            CodeCategory::classify("plot the predicted usage"),
            CodeCategory::Visualization
        );
    }

    #[test]
    fn test_classify_machine_learning() {
        assert_eq!(
            CodeCategory::classify("forecast next quarter demand"),
            CodeCategory::MachineLearning
        );
    }

    #[test]
    fn test_classify_defaults_to_analysis() {
        assert_eq!(
            CodeCategory::classify("what is the sum of column b"),
            CodeCategory::Analysis
        );
    }

    #[test]
    fn test_prompt_lists_files() {
        let files = vec![DataFileContext {
            path: "/data/usage.csv".into(),
            file_type: "csv".into(),
            collection: "datasource_7".into(),
        }];

        let prompt = build_prompt("total usage", CodeCategory::Analysis, &files);
        assert!(prompt.contains("/data/usage.csv"));
        assert!(prompt.contains("pd.read_csv"));
    }
}
