//! Dashboard model.

use diesel::prelude::*;
use jiff_diesel::Timestamp;

use crate::schema::dashboards;

/// A dashboard within an organization. Chat sessions may optionally be
/// attached to one.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = dashboards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Dashboard {
    /// Unique dashboard identifier.
    pub id: i64,
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
    /// Timestamp when the dashboard was created.
    pub created_at: Timestamp,
    /// Timestamp when the dashboard was last updated.
    pub updated_at: Timestamp,
}

/// Data for creating a new dashboard.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = dashboards)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewDashboard {
    /// Owning organization.
    pub organization_id: i64,
    /// Display name.
    pub name: String,
}
