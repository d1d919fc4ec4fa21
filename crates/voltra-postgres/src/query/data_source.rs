//! Data sources repository.

use std::future::Future;

use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use crate::model::{DataSource, NewDataSource, UpdateDataSource};
use crate::types::{DataSourceStatus, OffsetPagination};
use crate::{PgConnection, PgError, PgResult, schema};

/// Repository for data source database operations.
///
/// All lookups are scoped by organization id; rows belonging to a foreign
/// organization behave as if they do not exist.
pub trait DataSourceRepository {
    /// Creates a new data source and assigns its `datasource_{id}`
    /// collection name.
    fn create_data_source(
        &mut self,
        new_source: NewDataSource,
    ) -> impl Future<Output = PgResult<DataSource>> + Send;

    /// Finds a data source by id within an organization.
    fn find_data_source_by_id(
        &mut self,
        organization_id: i64,
        data_source_id: i64,
    ) -> impl Future<Output = PgResult<Option<DataSource>>> + Send;

    /// Finds several data sources by id within an organization, excluding
    /// soft-deleted rows.
    fn find_data_sources_by_ids(
        &mut self,
        organization_id: i64,
        data_source_ids: &[i64],
    ) -> impl Future<Output = PgResult<Vec<DataSource>>> + Send;

    /// Lists an organization's data sources, excluding soft-deleted rows.
    fn list_data_sources(
        &mut self,
        organization_id: i64,
        pagination: OffsetPagination,
    ) -> impl Future<Output = PgResult<Vec<DataSource>>> + Send;

    /// Updates a data source with new data.
    fn update_data_source(
        &mut self,
        data_source_id: i64,
        updates: UpdateDataSource,
    ) -> impl Future<Output = PgResult<DataSource>> + Send;

    /// Records ingestion progress in the data source metadata.
    fn update_ingest_progress(
        &mut self,
        data_source_id: i64,
        progress_percent: i64,
        processed_records: i64,
    ) -> impl Future<Output = PgResult<()>> + Send;

    /// Marks ingestion as complete.
    fn mark_data_source_completed(
        &mut self,
        data_source_id: i64,
        record_count: i32,
        chunk_count: i32,
    ) -> impl Future<Output = PgResult<DataSource>> + Send;

    /// Soft-deletes a data source.
    ///
    /// The row is retained with status `deleted`; chunks are removed
    /// separately via
    /// [`DocumentChunkRepository::delete_source_chunks`].
    ///
    /// [`DocumentChunkRepository::delete_source_chunks`]: crate::query::DocumentChunkRepository::delete_source_chunks
    fn soft_delete_data_source(
        &mut self,
        organization_id: i64,
        data_source_id: i64,
    ) -> impl Future<Output = PgResult<()>> + Send;
}

impl DataSourceRepository for PgConnection {
    async fn create_data_source(&mut self, new_source: NewDataSource) -> PgResult<DataSource> {
        use schema::data_sources::{self, dsl};

        let source: DataSource = diesel::insert_into(data_sources::table)
            .values(&new_source)
            .returning(DataSource::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        // The collection name embeds the generated id, so it is assigned in
        // a second statement.
        let source = diesel::update(data_sources::table.filter(dsl::id.eq(source.id)))
            .set(dsl::collection_name.eq(format!("datasource_{}", source.id)))
            .returning(DataSource::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn find_data_source_by_id(
        &mut self,
        organization_id: i64,
        data_source_id: i64,
    ) -> PgResult<Option<DataSource>> {
        use schema::data_sources::{self, dsl};

        let source = data_sources::table
            .filter(dsl::id.eq(data_source_id))
            .filter(dsl::organization_id.eq(organization_id))
            .select(DataSource::as_select())
            .first(self)
            .await
            .optional()
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn find_data_sources_by_ids(
        &mut self,
        organization_id: i64,
        data_source_ids: &[i64],
    ) -> PgResult<Vec<DataSource>> {
        use schema::data_sources::{self, dsl};

        if data_source_ids.is_empty() {
            return Ok(vec![]);
        }

        let sources = data_sources::table
            .filter(dsl::id.eq_any(data_source_ids))
            .filter(dsl::organization_id.eq(organization_id))
            .filter(dsl::status.ne(DataSourceStatus::Deleted.as_ref()))
            .select(DataSource::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(sources)
    }

    async fn list_data_sources(
        &mut self,
        organization_id: i64,
        pagination: OffsetPagination,
    ) -> PgResult<Vec<DataSource>> {
        use schema::data_sources::{self, dsl};

        let sources = data_sources::table
            .filter(dsl::organization_id.eq(organization_id))
            .filter(dsl::status.ne(DataSourceStatus::Deleted.as_ref()))
            .order(dsl::created_at.desc())
            .limit(pagination.limit)
            .offset(pagination.offset)
            .select(DataSource::as_select())
            .load(self)
            .await
            .map_err(PgError::from)?;

        Ok(sources)
    }

    async fn update_data_source(
        &mut self,
        data_source_id: i64,
        updates: UpdateDataSource,
    ) -> PgResult<DataSource> {
        use schema::data_sources::{self, dsl};

        let source = diesel::update(data_sources::table.filter(dsl::id.eq(data_source_id)))
            .set(&updates)
            .returning(DataSource::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn update_ingest_progress(
        &mut self,
        data_source_id: i64,
        progress_percent: i64,
        processed_records: i64,
    ) -> PgResult<()> {
        use schema::data_sources::{self, dsl};

        let metadata: serde_json::Value = data_sources::table
            .filter(dsl::id.eq(data_source_id))
            .select(dsl::metadata)
            .first(self)
            .await
            .map_err(PgError::from)?;

        let mut metadata = match metadata {
            serde_json::Value::Object(map) => map,
            _ => serde_json::Map::new(),
        };
        metadata.insert("progress".into(), serde_json::json!(progress_percent));
        metadata.insert(
            "processed_records".into(),
            serde_json::json!(processed_records),
        );

        diesel::update(data_sources::table.filter(dsl::id.eq(data_source_id)))
            .set((
                dsl::status.eq(DataSourceStatus::Processing.as_ref()),
                dsl::metadata.eq(serde_json::Value::Object(metadata)),
            ))
            .execute(self)
            .await
            .map_err(PgError::from)?;

        Ok(())
    }

    async fn mark_data_source_completed(
        &mut self,
        data_source_id: i64,
        record_count: i32,
        chunk_count: i32,
    ) -> PgResult<DataSource> {
        use schema::data_sources::{self, dsl};

        let now = jiff_diesel::Timestamp::from(jiff::Timestamp::now());

        let source = diesel::update(data_sources::table.filter(dsl::id.eq(data_source_id)))
            .set((
                dsl::status.eq(DataSourceStatus::Connected.as_ref()),
                dsl::record_count.eq(record_count),
                dsl::chunk_count.eq(chunk_count),
                dsl::last_processed_at.eq(Some(now)),
            ))
            .returning(DataSource::as_returning())
            .get_result(self)
            .await
            .map_err(PgError::from)?;

        Ok(source)
    }

    async fn soft_delete_data_source(
        &mut self,
        organization_id: i64,
        data_source_id: i64,
    ) -> PgResult<()> {
        use schema::data_sources::{self, dsl};

        let affected = diesel::update(
            data_sources::table
                .filter(dsl::id.eq(data_source_id))
                .filter(dsl::organization_id.eq(organization_id)),
        )
        .set(dsl::status.eq(DataSourceStatus::Deleted.as_ref()))
        .execute(self)
        .await
        .map_err(PgError::from)?;

        if affected == 0 {
            return Err(PgError::Query(diesel::result::Error::NotFound));
        }

        Ok(())
    }
}
