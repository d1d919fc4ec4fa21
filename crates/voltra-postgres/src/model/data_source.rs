//! Data source model.

use std::str::FromStr;

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::data_sources;
use crate::types::{DataSourceStatus, DataSourceType};

/// An ingested document or connection (file, database, spreadsheet).
///
/// Created on upload, updated on (re)processing, soft-deleted on removal.
/// Each data source owns a dedicated vector collection named
/// `datasource_{id}`.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = data_sources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct DataSource {
    /// Unique data source identifier.
    pub id: i64,
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// Kind of source, stored as its snake_case string form.
    pub source_type: String,
    /// Vector collection owned by this source.
    pub collection_name: String,
    /// Lifecycle status, stored as its snake_case string form.
    pub status: String,
    /// Backing file path for file-based sources.
    pub file_path: Option<String>,
    /// Number of records ingested.
    pub record_count: i32,
    /// Number of chunks stored.
    pub chunk_count: i32,
    /// When the last (re)processing completed.
    pub last_processed_at: Option<Timestamp>,
    /// Additional metadata (JSON), including ingestion progress.
    pub metadata: serde_json::Value,
    /// Timestamp when the data source was created.
    pub created_at: Timestamp,
    /// Timestamp when the data source was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new data source.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = data_sources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDataSource {
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// Kind of source.
    pub source_type: String,
    /// Vector collection owned by this source.
    pub collection_name: String,
    /// Backing file path for file-based sources.
    pub file_path: Option<String>,
}

/// Data for updating a data source.
#[derive(Debug, Clone, Default, AsChangeset)]
#[diesel(table_name = data_sources)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UpdateDataSource {
    /// Lifecycle status.
    pub status: Option<String>,
    /// Number of records ingested.
    pub record_count: Option<i32>,
    /// Number of chunks stored.
    pub chunk_count: Option<i32>,
    /// When the last (re)processing completed.
    pub last_processed_at: Option<Timestamp>,
    /// Metadata replacement.
    pub metadata: Option<serde_json::Value>,
}

impl DataSource {
    /// Returns the typed source kind, if the stored value is recognized.
    pub fn source_type(&self) -> Option<DataSourceType> {
        DataSourceType::from_str(&self.source_type).ok()
    }

    /// Returns the typed lifecycle status, if the stored value is recognized.
    pub fn status(&self) -> Option<DataSourceStatus> {
        DataSourceStatus::from_str(&self.status).ok()
    }

    /// Returns whether the source is searchable.
    pub fn is_connected(&self) -> bool {
        self.status() == Some(DataSourceStatus::Connected)
    }

    /// Returns whether the source has been soft-deleted.
    pub fn is_deleted(&self) -> bool {
        self.status() == Some(DataSourceStatus::Deleted)
    }
}

impl NewDataSource {
    /// Creates a new data source record with a placeholder collection name.
    ///
    /// The final `datasource_{id}` collection name is only known after
    /// insertion; callers update it via
    /// [`DataSourceRepository::set_data_source_collection`].
    ///
    /// [`DataSourceRepository::set_data_source_collection`]: crate::query::DataSourceRepository::set_data_source_collection
    pub fn new(
        organization_id: i64,
        name: impl Into<String>,
        source_type: DataSourceType,
    ) -> Self {
        Self {
            organization_id,
            name: name.into(),
            source_type: source_type.as_ref().to_owned(),
            collection_name: String::new(),
            file_path: None,
        }
    }

    /// Sets the backing file path.
    pub fn with_file_path(mut self, file_path: impl Into<String>) -> Self {
        self.file_path = Some(file_path.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_data_source_serializes_type() {
        let new = NewDataSource::new(1, "usage-2025", DataSourceType::Csv);
        assert_eq!(new.source_type, "csv");
        assert!(new.collection_name.is_empty());
    }
}
