//! CSV ingestion into the vector store and chunk table.
//!
//! Records are formatted as `key: value` text, embedded in batches, and
//! upserted into both the per-source vector collection and the relational
//! chunk table. A failed batch is logged and skipped so one bad batch
//! cannot abort a large import.

use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use voltra_core::emb::{DEFAULT_EMBEDDING_MODEL, EmbeddingProvider, EmbeddingRequest};
use voltra_postgres::PgClient;
use voltra_postgres::model::NewDocumentChunk;
use voltra_postgres::query::{DataSourceRepository, DocumentChunkRepository};
use voltra_vector::{VectorData, VectorStore};

use crate::{EngineError, EngineResult, TRACING_TARGET};

/// Records embedded per batch.
const BATCH_SIZE: usize = 50;

/// Outcome of an ingestion run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestReport {
    /// Records successfully processed.
    pub records_processed: usize,
    /// Chunks written to the stores.
    pub chunks_stored: usize,
    /// Total records found in the file.
    pub total_records: usize,
    /// Wall-clock ingestion time in seconds.
    pub elapsed_secs: f64,
}

/// Ingests CSV-backed data sources.
pub struct CsvIngestor {
    pg: PgClient,
    store: Arc<VectorStore>,
    embeddings: Arc<dyn EmbeddingProvider>,
}

impl CsvIngestor {
    /// Creates a new ingestor.
    pub fn new(
        pg: PgClient,
        store: Arc<VectorStore>,
        embeddings: Arc<dyn EmbeddingProvider>,
    ) -> Self {
        Self {
            pg,
            store,
            embeddings,
        }
    }

    /// Ingests the file backing a data source.
    pub async fn ingest(
        &self,
        organization_id: i64,
        data_source_id: i64,
    ) -> EngineResult<IngestReport> {
        let started = Instant::now();

        let mut conn = self.pg.get_connection().await?;
        let source = conn
            .find_data_source_by_id(organization_id, data_source_id)
            .await?
            .ok_or(EngineError::SourceNotFound(data_source_id))?;

        let file_path = source
            .file_path
            .clone()
            .ok_or(EngineError::MissingFile(data_source_id))?;

        tracing::info!(
            target: TRACING_TARGET,
            data_source_id,
            file_path = %file_path,
            "Starting CSV ingestion"
        );

        let texts = read_csv_as_texts(&file_path)?;
        let total_records = texts.len();

        let mut records_processed = 0usize;
        let mut chunks_stored = 0usize;

        for (batch_index, batch) in texts.chunks(BATCH_SIZE).enumerate() {
            let batch_start = batch_index * BATCH_SIZE;
            let progress = (batch_start * 100 / total_records.max(1)) as i64;

            conn.update_ingest_progress(data_source_id, progress, records_processed as i64)
                .await?;

            match self
                .ingest_batch(&source.collection_name, data_source_id, batch_start, batch)
                .await
            {
                Ok(stored) => {
                    records_processed += batch.len();
                    chunks_stored += stored;

                    tracing::debug!(
                        target: TRACING_TARGET,
                        data_source_id,
                        batch = batch_index + 1,
                        batches = total_records.div_ceil(BATCH_SIZE),
                        stored,
                        "Ingested batch"
                    );
                }
                Err(e) => {
                    // Skip the batch and continue; partial imports beat
                    // aborted ones for large files
                    tracing::warn!(
                        target: TRACING_TARGET,
                        data_source_id,
                        batch = batch_index + 1,
                        error = %e,
                        "Batch failed, continuing with next batch"
                    );
                }
            }
        }

        conn.mark_data_source_completed(
            data_source_id,
            records_processed as i32,
            chunks_stored as i32,
        )
        .await?;

        let report = IngestReport {
            records_processed,
            chunks_stored,
            total_records,
            elapsed_secs: started.elapsed().as_secs_f64(),
        };

        tracing::info!(
            target: TRACING_TARGET,
            data_source_id,
            records = report.records_processed,
            chunks = report.chunks_stored,
            elapsed_secs = report.elapsed_secs,
            "CSV ingestion completed"
        );

        Ok(report)
    }

    /// Embeds one batch and writes it to both stores.
    async fn ingest_batch(
        &self,
        collection: &str,
        data_source_id: i64,
        batch_start: usize,
        batch: &[String],
    ) -> EngineResult<usize> {
        let request = EmbeddingRequest::new(DEFAULT_EMBEDDING_MODEL).with_inputs(batch.to_vec());
        let response = self.embeddings.generate_embedding(&request).await?;
        let vectors = response.into_vectors();

        let mut vector_data = Vec::with_capacity(batch.len());
        let mut chunks = Vec::with_capacity(batch.len());

        for (offset, (text, embedding)) in batch.iter().zip(vectors).enumerate() {
            let record_index = batch_start + offset;

            vector_data.push(
                VectorData::new(format!("{data_source_id}_record_{record_index}"), embedding.clone())
                    .with_field("text", serde_json::json!(text))
                    .with_field("source", serde_json::json!("csv_ingest"))
                    .with_field("source_type", serde_json::json!("csv"))
                    .with_field("data_source_id", serde_json::json!(data_source_id))
                    .with_field("record_index", serde_json::json!(record_index)),
            );

            chunks.push(
                NewDocumentChunk::new(data_source_id, text.clone())
                    .with_embedding(embedding, DEFAULT_EMBEDDING_MODEL)
                    .with_metadata(serde_json::json!({
                        "source": "csv_ingest",
                        "source_type": "csv",
                        "record_index": record_index,
                    })),
            );
        }

        let stored = vector_data.len();
        self.store.upsert(collection, vector_data).await?;

        let mut conn = self.pg.get_connection().await?;
        conn.upsert_document_chunks(chunks).await?;

        Ok(stored)
    }
}

/// Reads a CSV file and formats each record as `key: value` lines.
///
/// Empty values are skipped, matching how records were originally
/// embedded; re-ingesting a file therefore reproduces identical chunk
/// hashes.
fn read_csv_as_texts(path: &str) -> EngineResult<Vec<String>> {
    let mut reader = csv::Reader::from_path(path)?;
    let headers = reader.headers()?.clone();

    let mut texts = Vec::new();

    for record in reader.records() {
        let record = record?;
        texts.push(format_record_as_text(&headers, &record));
    }

    Ok(texts)
}

/// Formats one CSV record as `key: value` lines.
fn format_record_as_text(headers: &csv::StringRecord, record: &csv::StringRecord) -> String {
    headers
        .iter()
        .zip(record.iter())
        .filter(|(_, value)| !value.trim().is_empty())
        .map(|(key, value)| format!("{key}: {value}"))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn test_format_record_skips_empty_values() {
        let headers = csv::StringRecord::from(vec!["meter_id", "usage_kwh", "note"]);
        let record = csv::StringRecord::from(vec!["M-100", "412", ""]);

        assert_eq!(
            format_record_as_text(&headers, &record),
            "meter_id: M-100\nusage_kwh: 412"
        );
    }

    #[test]
    fn test_read_csv_as_texts() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "meter_id,usage_kwh").unwrap();
        writeln!(file, "M-100,412").unwrap();
        writeln!(file, "M-101,9").unwrap();
        file.flush().unwrap();

        let texts = read_csv_as_texts(file.path().to_str().unwrap()).unwrap();
        assert_eq!(texts.len(), 2);
        assert_eq!(texts[0], "meter_id: M-100\nusage_kwh: 412");
    }

    #[test]
    fn test_batch_math() {
        // 120 records -> 3 batches of 50/50/20
        let texts: Vec<String> = (0..120).map(|i| format!("row: {i}")).collect();
        let batches: Vec<&[String]> = texts.chunks(BATCH_SIZE).collect();
        assert_eq!(batches.len(), 3);
        assert_eq!(batches[2].len(), 20);
    }
}
