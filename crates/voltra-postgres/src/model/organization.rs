//! Organization model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::organizations;

/// A tenant of the platform. Every data source, dashboard, and chat session
/// belongs to exactly one organization.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Organization {
    /// Unique organization identifier.
    pub id: i64,
    /// Display name.
    pub name: String,
    /// Timestamp when the organization was created.
    pub created_at: Timestamp,
    /// Timestamp when the organization was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new organization.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = organizations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewOrganization {
    /// Display name.
    pub name: String,
}
