//! Document chunks repository for text segments and embeddings.

use std::future::Future;

use diesel::prelude::*;
use diesel::upsert::excluded;
use diesel_async::RunQueryDsl;
use pgvector::Vector;

use crate::model::{DocumentChunk, NewDocumentChunk, ScoredDocumentChunk};
use crate::types::OffsetPagination;
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for document chunk database operations.
///
/// Handles chunk lifecycle management including creation, upsert
/// deduplication, embedding backfill, and semantic similarity search via
/// pgvector.
pub trait DocumentChunkRepository {
    /// Inserts a chunk, or updates the existing row when the same
    /// `(data_source_id, content_sha256)` pair already exists.
    ///
    /// Re-ingesting identical content refreshes the embedding in place
    /// instead of duplicating the row.
    fn upsert_document_chunk(
        &mut self,
        new_chunk: NewDocumentChunk,
    ) -> impl Future<Output = PgResult<DocumentChunk>> + Send;

    /// Upserts multiple chunks.
    fn upsert_document_chunks(
        &mut self,
        new_chunks: Vec<NewDocumentChunk>,
    ) -> impl Future<Output = PgResult<Vec<DocumentChunk>>> + Send;

    /// Finds a chunk by its unique identifier.
    fn find_document_chunk_by_id(
        &mut self,
        chunk_id: i64,
    ) -> impl Future<Output = PgResult<Option<DocumentChunk>>> + Send;

    /// Lists all chunks for a data source.
    fn list_source_chunks(
        &mut self,
        data_source_id: i64,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<DocumentChunk>>> + Send;

    /// Updates the embedding for a chunk (backfill).
    fn update_chunk_embedding(
        &mut self,
        chunk_id: i64,
        embedding: Vector,
        model: &str,
    ) -> impl Future<Output = PgResult<DocumentChunk>> + Send;

    /// Finds chunks without embeddings for backfill.
    fn find_chunks_without_embeddings(
        &mut self,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<DocumentChunk>>> + Send;

    /// Deletes all chunks for a data source, returning the number removed.
    fn delete_source_chunks(
        &mut self,
        data_source_id: i64,
    ) -> impl Future<Output = PgResult<usize>> + Send;

    /// Searches for similar chunks within specific data sources using
    /// cosine similarity.
    ///
    /// Returns chunks with their similarity scores, ordered most similar
    /// first. Chunks without embeddings are skipped.
    fn search_similar_chunks(
        &mut self,
        query_embedding: Vector,
        data_source_ids: &[i64],
        limit: i64,
    ) -> impl Future<Output = PgResult<Vec<ScoredDocumentChunk>>> + Send;

    /// Case-insensitive substring search over chunk content.
    ///
    /// The last retrieval fallback tier, used when no embedding search is
    /// possible.
    fn search_chunks_by_text(
        &mut self,
        pattern: &str,
        data_source_ids: &[i64],
        limit: i64,
    ) -> impl Future<Output = PgResult<Vec<DocumentChunk>>> + Send;

    /// Gets the total chunk count for a data source.
    fn get_source_chunk_count(
        &mut self,
        data_source_id: i64,
    ) -> impl Future<Output = PgResult<i64>> + Send;
}

impl DocumentChunkRepository for PgConnection {
    async fn upsert_document_chunk(
        &mut self,
        new_chunk: NewDocumentChunk,
    ) -> PgResult<DocumentChunk> {
        use schema::document_chunks::{self, dsl};

        let chunk = diesel::insert_into(document_chunks::table)
            .values(&new_chunk)
            .on_conflict((dsl::data_source_id, dsl::content_sha256))
            .do_update()
            .set((
                dsl::embedding.eq(excluded(dsl::embedding)),
                dsl::embedding_model.eq(excluded(dsl::embedding_model)),
                dsl::metadata.eq(excluded(dsl::metadata)),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .returning(DocumentChunk::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunk)
    }

    async fn upsert_document_chunks(
        &mut self,
        new_chunks: Vec<NewDocumentChunk>,
    ) -> PgResult<Vec<DocumentChunk>> {
        let mut chunks = Vec::with_capacity(new_chunks.len());

        // Batch upserts conflict-by-conflict; a multi-row VALUES list with
        // ON CONFLICT fails when the same content appears twice in one
        // batch, which duplicated CSV rows regularly trigger.
        for new_chunk in new_chunks {
            chunks.push(self.upsert_document_chunk(new_chunk).await?);
        }

        Ok(chunks)
    }

    async fn find_document_chunk_by_id(&mut self, chunk_id: i64) -> PgResult<Option<DocumentChunk>> {
        use schema::document_chunks::{self, dsl};

        let chunk = document_chunks::table
            .filter(dsl::id.eq(chunk_id))
            .select(DocumentChunk::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(chunk)
    }

    async fn list_source_chunks(
        &mut self,
        data_source_id: i64,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<DocumentChunk>> {
        use schema::document_chunks::{self, dsl};

        let chunks = document_chunks::table
            .filter(dsl::data_source_id.eq(data_source_id))
            .order(dsl::id.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(DocumentChunk::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunks)
    }

    async fn update_chunk_embedding(
        &mut self,
        chunk_id: i64,
        embedding: Vector,
        model: &str,
    ) -> PgResult<DocumentChunk> {
        use schema::document_chunks::{self, dsl};

        let chunk = diesel::update(document_chunks::table.filter(dsl::id.eq(chunk_id)))
            .set((
                dsl::embedding.eq(Some(embedding)),
                dsl::embedding_model.eq(Some(model)),
                dsl::updated_at.eq(diesel::dsl::now),
            ))
            .returning(DocumentChunk::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunk)
    }

    async fn find_chunks_without_embeddings(
        &mut self,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<DocumentChunk>> {
        use schema::document_chunks::{self, dsl};

        let chunks = document_chunks::table
            .filter(dsl::embedding.is_null())
            .order(dsl::created_at.asc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(DocumentChunk::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunks)
    }

    async fn delete_source_chunks(&mut self, data_source_id: i64) -> PgResult<usize> {
        use schema::document_chunks::{self, dsl};

        let affected =
            diesel::delete(document_chunks::table.filter(dsl::data_source_id.eq(data_source_id)))
                .execute(self)
                .await
                .map_err(PgError::from)?;

        Ok(affected)
    }

    async fn search_similar_chunks(
        &mut self,
        query_embedding: Vector,
        data_source_ids: &[i64],
        limit: i64,
    ) -> PgResult<Vec<ScoredDocumentChunk>> {
        use pgvector::VectorExpressionMethods;
        use schema::document_chunks::{self, dsl};

        if data_source_ids.is_empty() {
            return Ok(vec![]);
        }

        let rows: Vec<(DocumentChunk, Option<f64>)> = document_chunks::table
            .filter(dsl::data_source_id.eq_any(data_source_ids))
            .filter(dsl::embedding.is_not_null())
            .order(dsl::embedding.cosine_distance(query_embedding.clone()))
            .limit(limit)
            .select((
                DocumentChunk::as_select(),
                dsl::embedding.cosine_distance(query_embedding),
            ))
            .load(self)
            .await
            .map_err(PgError::from)?;

        let scored = rows
            .into_iter()
            .map(|(chunk, distance)| ScoredDocumentChunk {
                chunk,
                // Cosine distance in [0, 2] maps to similarity in [-1, 1]
                score: 1.0 - distance.unwrap_or(1.0),
            })
            .collect();

        Ok(scored)
    }

    async fn search_chunks_by_text(
        &mut self,
        pattern: &str,
        data_source_ids: &[i64],
        limit: i64,
    ) -> PgResult<Vec<DocumentChunk>> {
        use schema::document_chunks::{self, dsl};

        if data_source_ids.is_empty() {
            return Ok(vec![]);
        }

        let escaped = pattern.replace('%', "\\%").replace('_', "\\_");

        let chunks = document_chunks::table
            .filter(dsl::data_source_id.eq_any(data_source_ids))
            .filter(dsl::content.ilike(format!("%{escaped}%")))
            .order(dsl::id.asc())
            .limit(limit)
            .select(DocumentChunk::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(chunks)
    }

    async fn get_source_chunk_count(&mut self, data_source_id: i64) -> PgResult<i64> {
        use schema::document_chunks::{self, dsl};

        let count: i64 = document_chunks::table
            .filter(dsl::data_source_id.eq(data_source_id))
            .count()
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(count)
    }
}
